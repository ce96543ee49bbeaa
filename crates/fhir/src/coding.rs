//! NAMASTE + ICD-11 dual-coding rule.
//!
//! A Condition is dual coded when its `code.coding` list carries at least one traditional
//! medicine (NAMASTE) coding and at least one biomedical (ICD-11) coding. Code systems are
//! recognised by case-sensitive match on `system`; nothing is trimmed or folded.
//!
//! - NAMASTE: `system` contains `namaste`
//! - ICD-11: `system` contains `icd-11`, equals [`ICD11_SYSTEM`], or starts with
//!   [`WHO_ICD11_RELEASE_PREFIX`]

use crate::model::{Coding, Condition};

/// Canonical FHIR system URI for ICD-11.
pub const ICD11_SYSTEM: &str = "http://hl7.org/fhir/sid/icd-11";

/// Prefix of the WHO ICD-11 release URIs, e.g. `http://id.who.int/icd/release/11/mms`.
pub const WHO_ICD11_RELEASE_PREFIX: &str = "http://id.who.int/icd/release/11/";

const NAMASTE_MARKER: &str = "namaste";
const ICD11_MARKER: &str = "icd-11";

/// Why a Condition is not dual coded.
///
/// When both systems are missing only NAMASTE is reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CodingError {
    #[error("Missing coding information")]
    MissingCoding,

    #[error("Missing NAMASTE coding")]
    MissingNamaste,

    #[error("Missing ICD-11 coding")]
    MissingIcd11,
}

impl Coding {
    /// True if this coding belongs to the NAMASTE terminology.
    pub fn is_traditional(&self) -> bool {
        self.system
            .as_deref()
            .is_some_and(|s| s.contains(NAMASTE_MARKER))
    }

    /// True if this coding belongs to ICD-11.
    pub fn is_biomedical(&self) -> bool {
        self.system
            .as_deref()
            .is_some_and(|s| {
                s.contains(ICD11_MARKER)
                    || s == ICD11_SYSTEM
                    || s.starts_with(WHO_ICD11_RELEASE_PREFIX)
            })
    }
}

/// Checks that `condition` carries both a NAMASTE and an ICD-11 coding.
///
/// The caller is responsible for only passing Condition resources.
///
/// # Errors
///
/// - [`CodingError::MissingCoding`] if `code` or `code.coding` is absent or not a list
/// - [`CodingError::MissingNamaste`] if no NAMASTE coding is present (also when ICD-11 is
///   missing too)
/// - [`CodingError::MissingIcd11`] if NAMASTE is present but ICD-11 is not
pub fn has_dual_coding(condition: &Condition) -> Result<(), CodingError> {
    let coding = condition
        .code
        .as_ref()
        .and_then(|c| c.coding.as_deref())
        .ok_or(CodingError::MissingCoding)?;

    let (traditional, biomedical) =
        coding
            .iter()
            .fold((false, false), |(traditional, biomedical), c| {
                (
                    traditional || c.is_traditional(),
                    biomedical || c.is_biomedical(),
                )
            });

    match (traditional, biomedical) {
        (true, true) => Ok(()),
        (false, _) => Err(CodingError::MissingNamaste),
        (true, false) => Err(CodingError::MissingIcd11),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CodeableConcept;

    fn coding(system: &str) -> Coding {
        Coding {
            system: Some(system.to_owned()),
            code: Some("X".to_owned()),
            display: None,
        }
    }

    fn condition(codings: Vec<Coding>) -> Condition {
        Condition {
            id: None,
            code: Some(CodeableConcept {
                coding: Some(codings),
                text: None,
            }),
        }
    }

    #[test]
    fn both_systems_pass() {
        let c = condition(vec![
            coding("http://x/namaste"),
            coding("http://id.who.int/icd/release/11/mms/icd-11"),
        ]);
        assert_eq!(has_dual_coding(&c), Ok(()));
    }

    #[test]
    fn canonical_icd11_uri_counts_as_biomedical() {
        let c = condition(vec![coding("http://x/namaste"), coding(ICD11_SYSTEM)]);
        assert_eq!(has_dual_coding(&c), Ok(()));
    }

    #[test]
    fn who_release_uri_counts_as_biomedical() {
        let c = condition(vec![
            coding("http://x/namaste"),
            coding("http://id.who.int/icd/release/11/mms"),
        ]);
        assert_eq!(has_dual_coding(&c), Ok(()));

        let older = condition(vec![
            coding("http://x/namaste"),
            coding("http://id.who.int/icd/release/10"),
        ]);
        assert_eq!(has_dual_coding(&older), Err(CodingError::MissingIcd11));
    }

    #[test]
    fn namaste_only_reports_icd11_missing() {
        let c = condition(vec![coding("http://x/namaste")]);
        assert_eq!(has_dual_coding(&c), Err(CodingError::MissingIcd11));
        assert_eq!(
            CodingError::MissingIcd11.to_string(),
            "Missing ICD-11 coding"
        );
    }

    #[test]
    fn icd11_only_reports_namaste_missing() {
        for system in [ICD11_SYSTEM, "urn:who:icd-11:tm2"] {
            let c = condition(vec![coding(system)]);
            assert_eq!(has_dual_coding(&c), Err(CodingError::MissingNamaste));
        }
    }

    #[test]
    fn neither_system_names_namaste_only() {
        let c = condition(vec![coding("http://snomed.info/sct")]);
        assert_eq!(has_dual_coding(&c), Err(CodingError::MissingNamaste));

        let empty = condition(Vec::new());
        assert_eq!(has_dual_coding(&empty), Err(CodingError::MissingNamaste));
    }

    #[test]
    fn matching_is_case_sensitive() {
        let c = condition(vec![coding("http://x/NAMASTE"), coding("http://x/ICD-11")]);
        assert_eq!(has_dual_coding(&c), Err(CodingError::MissingNamaste));
    }

    #[test]
    fn missing_code_or_coding_list() {
        let no_code = Condition::default();
        assert_eq!(has_dual_coding(&no_code), Err(CodingError::MissingCoding));

        let no_list = Condition {
            id: None,
            code: Some(CodeableConcept::default()),
        };
        assert_eq!(has_dual_coding(&no_list), Err(CodingError::MissingCoding));
    }

    #[test]
    fn codings_without_system_are_ignored() {
        let c = condition(vec![
            Coding::default(),
            coding("http://x/namaste"),
            coding(ICD11_SYSTEM),
        ]);
        assert_eq!(has_dual_coding(&c), Ok(()));
    }
}

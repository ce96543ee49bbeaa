use clap::{Parser, Subcommand};
use dualcode_core::{
    BundleId, BundleProcessor, BundleStore, CoreConfig, CoreError, ProcessingOutcome,
};
use fhir::{is_json_upload, precheck_text, validate_bundle, PrecheckError, ValidationResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "dualcode")]
#[command(about = "Dual-coded (NAMASTE + ICD-11) FHIR Bundle tools")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarise a bundle file and report every Condition that is not dual coded
    Precheck {
        /// Path to a `.json` bundle file
        file: PathBuf,
    },
    /// Check the structure of a bundle file
    Validate {
        /// Path to a bundle file
        file: PathBuf,
    },
    /// Validate and store a bundle file
    Process {
        /// Path to a bundle file
        file: PathBuf,
        /// Directory to store accepted bundles in (nothing is kept if omitted)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// List stored bundles, newest first
    List {
        /// Bundle data directory
        #[arg(long)]
        data_dir: PathBuf,
    },
    /// Print a stored bundle
    Export {
        /// Bundle id
        id: String,
        /// Bundle data directory
        #[arg(long)]
        data_dir: PathBuf,
    },
    /// Delete a stored bundle
    Delete {
        /// Bundle id
        id: String,
        /// Bundle data directory
        #[arg(long)]
        data_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Precheck { file }) => {
            let name = file.file_name().and_then(|n| n.to_str());
            if !is_json_upload(name, None) {
                return Err(PrecheckError::NotJsonFile.into());
            }
            let report = precheck_text(&std::fs::read_to_string(&file)?)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.dual_coding_valid {
                return Err(format!(
                    "{} Condition(s) are not dual coded",
                    report.dual_coding_errors.len()
                )
                .into());
            }
        }
        Some(Commands::Validate { file }) => {
            let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&file)?)
                .map_err(fhir::FhirError::from)?;
            let result = validate_bundle(&value);
            println!(
                "{}",
                serde_json::to_string_pretty(&ValidationResult::from(&result))?
            );
            result?;
        }
        Some(Commands::Process { file, data_dir }) => {
            let bundle = fhir::parse_bundle(&std::fs::read_to_string(&file)?)?;
            let note = persistence_note(data_dir.as_deref());
            let processor = BundleProcessor::new(open_store(data_dir)?);
            let file_name = file.file_name().and_then(|n| n.to_str()).map(str::to_owned);
            let result = processor.process_upload(&bundle, file_name).await;
            println!(
                "{}",
                serde_json::to_string_pretty(&ProcessingOutcome::from(&result))?
            );
            if let Some(error) = result.error() {
                return Err(error.into());
            }
            if let Some(note) = note {
                eprintln!("{}", note);
            }
        }
        Some(Commands::List { data_dir }) => {
            let bundles = open_store(Some(data_dir))?.list().await?;
            if bundles.is_empty() {
                println!("No bundles found.");
            } else {
                for b in bundles {
                    println!(
                        "ID: {}, Type: {}, Resources: {}, Received: {}, File: {}",
                        b.id,
                        b.bundle_type,
                        b.resource_count,
                        b.received_at,
                        b.file_name.as_deref().unwrap_or("-")
                    );
                }
            }
        }
        Some(Commands::Export { id, data_dir }) => {
            let id = BundleId::parse(&id).map_err(CoreError::from)?;
            match open_store(Some(data_dir))?.get(&id).await? {
                Some(stored) => println!("{}", serde_json::to_string_pretty(&stored.bundle)?),
                None => return Err(format!("Bundle not found: {}", id).into()),
            }
        }
        Some(Commands::Delete { id, data_dir }) => {
            let id = BundleId::parse(&id).map_err(CoreError::from)?;
            if open_store(Some(data_dir))?.delete(&id).await? {
                println!("Deleted bundle {}", id);
            } else {
                return Err(format!("Bundle not found: {}", id).into());
            }
        }
        None => {
            println!("Use --help for available commands");
        }
    }

    Ok(())
}

fn open_store(data_dir: Option<PathBuf>) -> Result<Arc<dyn BundleStore>, CoreError> {
    CoreConfig::new(data_dir, dualcode_core::DEFAULT_MAX_BUNDLE_BYTES)?.open_store()
}

// Without a data dir the bundle lands in a memory store that dies with the process.
fn persistence_note(data_dir: Option<&Path>) -> Option<&'static str> {
    match data_dir {
        Some(_) => None,
        None => Some("Note: no --data-dir given; the bundle was checked but not persisted"),
    }
}

use api_rest::{router, AppState};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use dualcode_core::{BundleStore, CoreConfig, FileBundleStore, MemoryBundleStore};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt as _;

const BOUNDARY: &str = "dualcode-test-boundary";

fn app_with(cfg: CoreConfig, store: Arc<dyn BundleStore>) -> Router {
    router(AppState::new(&cfg, store))
}

fn app() -> Router {
    app_with(CoreConfig::default(), Arc::new(MemoryBundleStore::new()))
}

fn multipart_body(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/fhir/bundle")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(field, file_name, content_type, data)))
        .unwrap()
}

fn upload_json(bundle: &Value) -> Request<Body> {
    upload_request(
        "bundle",
        "patient.json",
        "application/json",
        bundle.to_string().as_bytes(),
    )
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn condition(id: &str, systems: &[&str]) -> Value {
    let coding: Vec<Value> = systems
        .iter()
        .map(|s| json!({"system": s, "code": "X1"}))
        .collect();
    json!({"resourceType": "Condition", "id": id, "code": {"coding": coding}})
}

fn dual_coded_bundle() -> Value {
    json!({
        "resourceType": "Bundle",
        "type": "collection",
        "entry": [
            {"resource": {"resourceType": "Patient", "id": "p1"}},
            {"resource": condition("c1", &["http://namaste.gov.in/codes", "http://id.who.int/icd/release/11/mms"])}
        ]
    })
}

#[tokio::test]
async fn health_reports_alive() {
    let (status, body) = send(&app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
}

#[tokio::test]
async fn valid_bundle_is_accepted_with_id() {
    let (status, body) = send(&app(), upload_json(&dual_coded_bundle())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Bundle processed successfully"));
    let id = body["bundleId"].as_str().unwrap();
    assert_eq!(id.len(), 32);
    assert!(id.bytes().all(|b| b.is_ascii_hexdigit()));
}

#[tokio::test]
async fn missing_file_is_rejected() {
    let req = upload_request("other", "patient.json", "application/json", b"{}");
    let (status, body) = send(&app(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("No file provided"));
}

#[tokio::test]
async fn wrong_mime_type_is_rejected() {
    let data = dual_coded_bundle().to_string();
    let req = upload_request("bundle", "patient.txt", "text/plain", data.as_bytes());
    let (status, body) = send(&app(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Only JSON files are accepted"));
}

#[tokio::test]
async fn unparsable_json_is_rejected() {
    let req = upload_request("bundle", "patient.json", "application/json", b"{not json");
    let (status, body) = send(&app(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Invalid JSON format"));
}

#[tokio::test]
async fn structural_violation_is_rejected() {
    let bundle = json!({"resourceType": "Bundle", "type": "collection"});
    let (status, body) = send(&app(), upload_json(&bundle)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        json!("Invalid FHIR Bundle: Bundle missing entries array")
    );

    let bundle = json!({"resourceType": "Patient"});
    let (status, body) = send(&app(), upload_json(&bundle)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        json!("Invalid FHIR Bundle: Not a FHIR Bundle (missing or incorrect resourceType)")
    );
}

#[tokio::test]
async fn condition_without_icd11_is_unprocessable() {
    let bundle = json!({
        "resourceType": "Bundle",
        "type": "collection",
        "entry": [
            {"resource": {"resourceType": "Patient", "id": "p1"}},
            {"resource": condition("c9", &["http://namaste.gov.in/codes"])}
        ]
    });
    let (status, body) = send(&app(), upload_json(&bundle)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["error"],
        json!("Condition c9 validation failed: Missing ICD-11 coding")
    );
}

#[tokio::test]
async fn bundle_without_patient_is_unprocessable() {
    let bundle = json!({"resourceType": "Bundle", "type": "collection", "entry": []});
    let (status, body) = send(&app(), upload_json(&bundle)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["error"],
        json!("Bundle must contain at least one Patient resource")
    );
}

#[tokio::test]
async fn rejected_bundles_are_not_stored() {
    let app = app();
    let bundle = json!({"resourceType": "Bundle", "type": "collection", "entry": []});
    send(&app, upload_json(&bundle)).await;

    let (status, body) = send(&app, get("/api/fhir/bundles")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bundles"], json!([]));
}

#[tokio::test]
async fn precheck_reports_every_dual_coding_error() {
    let bundle = json!({
        "resourceType": "Bundle",
        "type": "collection",
        "entry": [
            {"resource": {"resourceType": "Patient", "id": "p1"}},
            {"resource": condition("c1", &["http://namaste.gov.in/codes"])},
            {"resource": condition("c2", &["http://hl7.org/fhir/sid/icd-11"])},
            {"resource": {"resourceType": "Observation", "id": "o1"}}
        ]
    });
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/fhir/bundle/validate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(bundle.to_string()))
        .unwrap();

    let (status, body) = send(&app(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalResources"], json!(4));
    assert_eq!(body["conditionCount"], json!(2));
    assert_eq!(body["observationCount"], json!(1));
    assert_eq!(body["dualCodingValid"], json!(false));
    assert_eq!(
        body["dualCodingErrors"],
        json!([
            "Condition 1: Missing ICD-11 coding",
            "Condition 2: Missing NAMASTE coding"
        ])
    );
}

#[tokio::test]
async fn precheck_rejects_empty_entries() {
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/fhir/bundle/validate")
        .header(header::CONTENT_TYPE, "application/json; charset=utf-8")
        .body(Body::from(
            json!({"resourceType": "Bundle", "type": "collection", "entry": []}).to_string(),
        ))
        .unwrap();
    let (status, body) = send(&app(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Bundle missing entries array"));
}

#[tokio::test]
async fn precheck_requires_json_content_type() {
    let bundle = dual_coded_bundle().to_string();
    for content_type in [Some("text/plain"), None] {
        let mut req = Request::builder()
            .method(Method::POST)
            .uri("/api/fhir/bundle/validate");
        if let Some(ct) = content_type {
            req = req.header(header::CONTENT_TYPE, ct);
        }
        let (status, body) = send(&app(), req.body(Body::from(bundle.clone())).unwrap()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("Only JSON files are accepted"));
    }
}

#[tokio::test]
async fn stored_bundle_can_be_listed_exported_and_deleted() {
    let app = app();
    let (_, body) = send(&app, upload_json(&dual_coded_bundle())).await;
    let id = body["bundleId"].as_str().unwrap().to_owned();

    let (status, body) = send(&app, get("/api/fhir/bundles")).await;
    assert_eq!(status, StatusCode::OK);
    let bundles = body["bundles"].as_array().unwrap();
    assert_eq!(bundles.len(), 1);
    assert_eq!(bundles[0]["id"], json!(id));
    assert_eq!(bundles[0]["bundleType"], json!("collection"));
    assert_eq!(bundles[0]["resourceCount"], json!(2));
    assert_eq!(bundles[0]["fileName"], json!("patient.json"));

    let res = app
        .clone()
        .oneshot(get(&format!("/api/fhir/bundle/{id}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"patient-export.json\""
    );
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let exported: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(exported, dual_coded_bundle());

    let delete = |id: &str| {
        Request::builder()
            .method(Method::DELETE)
            .uri(format!("/api/fhir/bundle/{id}"))
            .body(Body::empty())
            .unwrap()
    };
    let (status, _) = send(&app, delete(&id)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, delete(&id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("Bundle not found"));

    let (status, _) = send(&app, get(&format!("/api/fhir/bundle/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_bundle_id_is_rejected() {
    let (status, body) = send(&app(), get("/api/fhir/bundle/not-an-id")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Invalid bundle id"));
}

#[tokio::test]
async fn oversized_upload_is_refused() {
    let cfg = CoreConfig::new(None, 64).unwrap();
    let app = app_with(cfg, Arc::new(MemoryBundleStore::new()));
    let res = app.oneshot(upload_json(&dual_coded_bundle())).await.unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn file_store_survives_a_new_router() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = CoreConfig::new(Some(dir.path().to_path_buf()), 1024 * 1024).unwrap();

    let first = app_with(cfg.clone(), cfg.open_store().unwrap());
    let (status, body) = send(&first, upload_json(&dual_coded_bundle())).await;
    assert_eq!(status, StatusCode::OK);
    let id = body["bundleId"].as_str().unwrap().to_owned();

    let second = app_with(
        cfg,
        Arc::new(FileBundleStore::open(dir.path().to_path_buf()).unwrap()),
    );
    let (status, body) = send(&second, get(&format!("/api/fhir/bundle/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, dual_coded_bundle());
}

#[tokio::test]
async fn unreadable_data_dir_is_a_server_error() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("bundles");
    let cfg = CoreConfig::new(Some(data_dir.clone()), 1024 * 1024).unwrap();
    let app = app_with(cfg.clone(), cfg.open_store().unwrap());

    std::fs::remove_dir_all(&data_dir).unwrap();
    std::fs::write(&data_dir, "not a directory").unwrap();

    let (status, body) = send(&app, get("/api/fhir/bundles")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], json!("Internal server error"));
}

#[tokio::test]
async fn openapi_document_lists_bundle_routes() {
    let (status, body) = send(&app(), get("/api-docs/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"].get("/api/fhir/bundle").is_some());
    assert!(body["paths"].get("/api/fhir/bundle/validate").is_some());
}

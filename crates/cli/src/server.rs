//! HTTP surface for issuing and verifying certificates.

use anyhow::{Context, Result};
use axum::Json;
use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use certproof_core::{
    CertificateFields, INVALID_MESSAGE, IssueOptions, Ledger, ProofExtractor, ProofRecord,
    draft_proof_text, issue_certificate, verify_document,
};
use certproof_qr::{RenderOptions, ensure_fits, render_data_url};
use serde::Serialize;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Multipart field carrying the document to verify.
pub const UPLOAD_FIELD: &str = "pdfFile";

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<dyn Ledger>,
    pub extractor: Arc<dyn ProofExtractor>,
    pub issue_options: IssueOptions,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Certificate already issued")]
    AlreadyIssued,
    #[error("ledger unavailable: {0}")]
    Ledger(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<certproof_core::Error> for ApiError {
    fn from(err: certproof_core::Error) -> Self {
        match err {
            certproof_core::Error::AlreadyIssued => ApiError::AlreadyIssued,
            certproof_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            certproof_core::Error::Ledger(msg) => ApiError::Ledger(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::AlreadyIssued => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Ledger(msg) => {
                tracing::error!(error = %msg, "Ledger request failed");
                (StatusCode::BAD_GATEWAY, "ledger unavailable".to_string())
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };

        let body = serde_json::json!({ "message": message });
        (status, Json(body)).into_response()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueResponse {
    pub qr_code_image: String,
    pub polygon_link: String,
    pub details: ProofRecord,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub message: String,
    #[serde(rename = "detailsQR")]
    pub details_qr: Option<String>,
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/api-docs") }))
        .route("/api-docs", get(api_docs))
        .route("/health", get(health))
        .route("/api/issue", post(issue))
        .route("/api/verify", post(verify))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// OpenAPI description of the issue and verify routes.
async fn api_docs() -> Json<Value> {
    let message = serde_json::json!({
        "type": "object",
        "properties": { "message": { "type": "string" } }
    });
    Json(serde_json::json!({
        "openapi": "3.0.3",
        "info": { "title": "certproof API", "version": env!("CARGO_PKG_VERSION") },
        "paths": {
            "/api/issue": {
                "post": {
                    "summary": "Issue a certificate",
                    "tags": ["Issuer"],
                    "requestBody": {
                        "required": true,
                        "content": { "application/json": { "schema": {
                            "type": "object",
                            "required": ["Certificate_Number", "name", "courseName", "Grant_Date", "Expiration_Date"],
                            "properties": {
                                "Certificate_Number": { "type": "string" },
                                "name": { "type": "string" },
                                "courseName": { "type": "string" },
                                "Grant_Date": { "type": "string" },
                                "Expiration_Date": { "type": "string" }
                            }
                        } } }
                    },
                    "responses": {
                        "200": {
                            "description": "Certificate issued",
                            "content": { "application/json": { "schema": {
                                "type": "object",
                                "properties": {
                                    "qrCodeImage": { "type": "string" },
                                    "polygonLink": { "type": "string" },
                                    "details": { "type": "object" }
                                }
                            } } }
                        },
                        "400": {
                            "description": "Invalid input or certificate already issued",
                            "content": { "application/json": { "schema": message.clone() } }
                        },
                        "502": {
                            "description": "Ledger unavailable",
                            "content": { "application/json": { "schema": message } }
                        }
                    }
                }
            },
            "/api/verify": {
                "post": {
                    "summary": "Verify a certificate",
                    "tags": ["Verifier"],
                    "requestBody": {
                        "required": true,
                        "content": { "multipart/form-data": { "schema": {
                            "type": "object",
                            "properties": {
                                UPLOAD_FIELD: {
                                    "type": "string",
                                    "format": "binary",
                                    "description": "PDF with an embedded proof, or a PNG/JPEG of the QR code"
                                }
                            }
                        } } }
                    },
                    "responses": {
                        "200": { "description": "Certificate is valid" },
                        "400": { "description": "Certificate is not valid" }
                    }
                }
            }
        }
    }))
}

async fn issue(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<IssueResponse>, ApiError> {
    let Json(body) = body?;
    let fields = CertificateFields::from_json(&body)?;

    // Nothing may fail after the ledger write, so the QR check runs first.
    let draft = draft_proof_text(&fields)?;
    ensure_fits(&draft).map_err(|_| {
        ApiError::BadRequest("Certificate details are too long to fit in a QR code".into())
    })?;

    let issued = issue_certificate(&fields, state.ledger.as_ref(), &state.issue_options).await?;
    let qr_code_image = render_data_url(&issued.proof_text, &RenderOptions::default())
        .map_err(|e| ApiError::Internal(format!("{:#}", e)))?;

    tracing::info!(
        certificate_number = %issued.proof.certificate_number,
        transaction_hash = %issued.proof.transaction_hash,
        "Certificate issued"
    );
    Ok(Json(IssueResponse {
        qr_code_image,
        polygon_link: issued.ledger_link,
        details: issued.proof,
    }))
}

async fn verify(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let upload = match read_upload(&mut multipart).await {
        Ok(Some(data)) => data,
        Ok(None) => {
            tracing::warn!("Verify request without {} field", UPLOAD_FIELD);
            return not_valid();
        }
        Err(e) => {
            tracing::warn!(error = %e, "Malformed multipart upload");
            return not_valid();
        }
    };

    let report = verify_document(&upload, state.extractor.as_ref(), state.ledger.as_ref()).await;
    tracing::info!(valid = report.result.valid, failure = ?report.result.failure, "Verification finished");

    let status = if report.result.valid {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    let body = VerifyResponse {
        message: report.result.reason,
        details_qr: report.details_qr,
    };
    (status, Json(body)).into_response()
}

async fn read_upload(
    multipart: &mut Multipart,
) -> Result<Option<Vec<u8>>, axum::extract::multipart::MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(UPLOAD_FIELD) {
            return Ok(Some(field.bytes().await?.to_vec()));
        }
    }
    Ok(None)
}

fn not_valid() -> Response {
    let body = VerifyResponse {
        message: INVALID_MESSAGE.to_string(),
        details_qr: None,
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

pub async fn serve(bind: &str, state: AppState, max_upload_bytes: usize) -> Result<()> {
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("Invalid bind address: {}", bind))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(%addr, "Listening");
    eprintln!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state, max_upload_bytes))
        .await
        .context("HTTP server failed")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use certproof_core::{
        ChainExtractor, LedgerEntry, MemoryLedger, TrailerExtractor, VALID_MESSAGE, embed_proof,
    };

    fn certificate() -> Value {
        serde_json::json!({
            "Certificate_Number": "123",
            "name": "Alice",
            "courseName": "Go101",
            "Grant_Date": "2024-01-01",
            "Expiration_Date": "2025-01-01",
        })
    }

    async fn spawn(ledger: Arc<dyn Ledger>) -> String {
        let state = AppState {
            ledger,
            extractor: Arc::new(ChainExtractor::new().with(TrailerExtractor)),
            issue_options: IssueOptions::default(),
        };
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state, 1024 * 1024)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn post_pdf(base: &str, data: Vec<u8>) -> reqwest::Response {
        let part = reqwest::multipart::Part::bytes(data).file_name("certificate.pdf");
        let form = reqwest::multipart::Form::new().part(UPLOAD_FIELD, part);
        reqwest::Client::new()
            .post(format!("{}/api/verify", base))
            .multipart(form)
            .send()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn root_redirects_to_api_docs() {
        let base = spawn(Arc::new(MemoryLedger::new())).await;
        let resp = reqwest::get(format!("{}/", base)).await.unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.url().path(), "/api-docs");
        let docs: Value = resp.json().await.unwrap();
        assert!(docs["paths"]["/api/issue"]["post"].is_object());
        assert!(docs["paths"]["/api/verify"]["post"]["requestBody"]["content"]["multipart/form-data"]["schema"]["properties"][UPLOAD_FIELD].is_object());

        let health = reqwest::get(format!("{}/health", base)).await.unwrap();
        assert_eq!(health.status(), 200);
    }

    #[tokio::test]
    async fn cors_preflight_is_allowed() {
        let base = spawn(Arc::new(MemoryLedger::new())).await;
        let resp = reqwest::Client::new()
            .request(reqwest::Method::OPTIONS, format!("{}/api/verify", base))
            .header("Origin", "https://verifier.example")
            .header("Access-Control-Request-Method", "POST")
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_success());
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn oversized_certificate_is_declined_before_ledger_write() {
        let ledger = Arc::new(MemoryLedger::new());
        let base = spawn(ledger.clone()).await;
        let mut fields = certificate();
        fields["name"] = Value::String("A".repeat(1500));
        let client = reqwest::Client::new();

        for _ in 0..2 {
            let resp = client
                .post(format!("{}/api/issue", base))
                .json(&fields)
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), 400);
            let body: Value = resp.json().await.unwrap();
            assert!(
                body["message"].as_str().unwrap().contains("too long"),
                "unexpected body: {body}"
            );
        }
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn malformed_issue_body_gets_json_message() {
        let base = spawn(Arc::new(MemoryLedger::new())).await;
        let resp = reqwest::Client::new()
            .post(format!("{}/api/issue", base))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert!(body["message"].is_string());

        let resp = reqwest::Client::new()
            .post(format!("{}/api/issue", base))
            .body("Certificate_Number=123")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn second_issue_is_declined() {
        let base = spawn(Arc::new(MemoryLedger::new())).await;
        let client = reqwest::Client::new();

        let first = client
            .post(format!("{}/api/issue", base))
            .json(&certificate())
            .send()
            .await
            .unwrap();
        assert_eq!(first.status(), 200);
        let body: Value = first.json().await.unwrap();
        assert!(
            body["qrCodeImage"]
                .as_str()
                .unwrap()
                .starts_with("data:image/png;base64,")
        );
        assert!(
            body["polygonLink"]
                .as_str()
                .unwrap()
                .starts_with("https://polygonscan.com/tx/0x")
        );
        assert_eq!(body["details"]["Certificate_Number"], "123");
        assert_eq!(body["details"]["Course_Name"], "Go101");

        let second = client
            .post(format!("{}/api/issue", base))
            .json(&certificate())
            .send()
            .await
            .unwrap();
        assert_eq!(second.status(), 400);
        let body: Value = second.json().await.unwrap();
        assert_eq!(body["message"], "Certificate already issued");
    }

    #[tokio::test]
    async fn issue_with_missing_field_is_bad_request() {
        let base = spawn(Arc::new(MemoryLedger::new())).await;
        let mut fields = certificate();
        fields.as_object_mut().unwrap().remove("Grant_Date");
        let resp = reqwest::Client::new()
            .post(format!("{}/api/issue", base))
            .json(&fields)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert!(body["message"].as_str().unwrap().contains("Grant_Date"));
    }

    #[tokio::test]
    async fn issued_certificate_verifies_from_embedded_proof() {
        let base = spawn(Arc::new(MemoryLedger::new())).await;
        let body: Value = reqwest::Client::new()
            .post(format!("{}/api/issue", base))
            .json(&certificate())
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let hash = body["details"]["Certificate_Hash"].as_str().unwrap();
        let proof = format!("Certificate Hash: {}\nCertificate Number: 123", hash);
        let pdf = embed_proof(b"%PDF-1.4\n%%EOF\n", &proof).unwrap();

        let resp = post_pdf(&base, pdf).await;
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["message"], VALID_MESSAGE);
        assert_eq!(body["detailsQR"], proof.as_str());
    }

    #[tokio::test]
    async fn unreadable_document_is_not_valid() {
        let base = spawn(Arc::new(MemoryLedger::new())).await;
        let resp = post_pdf(&base, b"definitely not a pdf".to_vec()).await;
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["message"], "Certificate is not valid");
        assert!(body["detailsQR"].is_null());
    }

    #[tokio::test]
    async fn missing_upload_field_is_not_valid() {
        let base = spawn(Arc::new(MemoryLedger::new())).await;
        let form = reqwest::multipart::Form::new().text("other", "value");
        let resp = reqwest::Client::new()
            .post(format!("{}/api/verify", base))
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["message"], "Certificate is not valid");
    }

    struct DownLedger;

    #[async_trait]
    impl Ledger for DownLedger {
        async fn verify_certificate(&self, _hash: &str) -> certproof_core::Result<LedgerEntry> {
            Err(certproof_core::Error::Ledger("connection refused".into()))
        }

        async fn issue_certificate(
            &self,
            _number: u64,
            _hash: &str,
        ) -> certproof_core::Result<String> {
            Err(certproof_core::Error::Ledger("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn ledger_failure_on_issue_is_bad_gateway() {
        let base = spawn(Arc::new(DownLedger)).await;
        let resp = reqwest::Client::new()
            .post(format!("{}/api/issue", base))
            .json(&certificate())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 502);
    }
}

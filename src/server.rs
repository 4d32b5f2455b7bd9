//! HTTP surface: upload form, merge endpoint, liveness probe.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::pipeline::{Pipeline, UploadedFile};
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Static upload form served at `GET /`.
const UPLOAD_FORM: &str = r#"<!doctype html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Merge presentations into one PDF</title>
  </head>
  <body>
    <h1>Merge presentations into one PDF</h1>
    <p>
      Pick your presentation and PDF files and press <strong>Merge</strong>.
      They are converted and concatenated in the order given, and the
      merged PDF comes back as a download.
    </p>
    <form method="post" enctype="multipart/form-data">
      <input type="file" name="files" multiple accept=".pdf,.pptx,.ppt,.odp">
      <br><br>
      <button type="submit">Merge</button>
    </form>
  </body>
</html>
"#;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Arc<Pipeline>,
}

/// Builds the service router with tracing and body-limit layers applied.
pub fn router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/", get(upload_form).post(merge))
        .route("/healthz", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(body_limit),
        )
        .with_state(state)
}

async fn upload_form() -> Html<&'static str> {
    Html(UPLOAD_FORM)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// `POST /`: collects the ordered `files` multipart field and runs the
/// merge pipeline, answering with the merged PDF as an attachment.
async fn merge(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut files: Vec<UploadedFile> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::BadUpload(format!("failed to parse multipart data: {e}")))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "files" => {
                // A no-selection browser submit arrives as a single part
                // with an empty filename; skip those.
                let filename = field.file_name().unwrap_or("").to_string();
                if filename.is_empty() {
                    continue;
                }

                let content = field
                    .bytes()
                    .await
                    .map_err(|e| Error::BadUpload(format!("failed to read {filename}: {e}")))?
                    .to_vec();

                files.push(UploadedFile { filename, content });
            }
            _ => {
                // Ignore unknown fields (forward compatibility)
            }
        }
    }

    let output = state.pipeline.run(files).await?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", output.filename),
        ),
    ];
    Ok((StatusCode::OK, headers, output.bytes))
}

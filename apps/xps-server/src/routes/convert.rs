//! Conversion Routes
//!
//! Endpoints:
//! - POST /convert/:conversion_type - XPS to pdf, images (ZIP) or docx
//! - POST /read-xps - Text and metadata as JSON
//! - POST /preview-all - PNG previews of every page (ZIP)
//! - POST /edit-xps - Replace text, return the result as PDF
//!
//! Every endpoint takes a multipart form with the document in `file`.

use std::collections::HashMap;

use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};

use crate::convert::{Artifact, ConversionKind, Operation, Upload};
use crate::error::ServiceError;
use crate::state::AppState;

/// Fields of a submitted form
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<Upload>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    fn take_file(&mut self) -> Result<Upload, ServiceError> {
        self.file
            .take()
            .ok_or_else(|| ServiceError::Validation("Missing form field: file".to_string()))
    }

    fn take_field(&mut self, name: &str) -> Result<String, ServiceError> {
        self.fields
            .remove(name)
            .ok_or_else(|| ServiceError::Validation(format!("Missing form field: {}", name)))
    }
}

/// Read every part of the form; the `file` part is kept as raw bytes
async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ServiceError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::debug!("Failed to read multipart field: {}", e);
        ServiceError::Validation(format!("Invalid multipart body: {}", e))
    })? {
        let name = field.name().unwrap_or("").to_string();

        if name == "file" {
            let filename = field.file_name().unwrap_or("").to_string();
            let bytes = field.bytes().await.map_err(|e| {
                ServiceError::Validation(format!("Failed to read file data: {}", e))
            })?;
            form.file = Some(Upload { filename, bytes });
        } else {
            let value = field.text().await.map_err(|e| {
                ServiceError::Validation(format!("Failed to read field {}: {}", name, e))
            })?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

/// Turn an artifact into a download or JSON response
async fn respond(operation: Operation, artifact: Artifact) -> Result<Response, ServiceError> {
    let media_type = artifact.media_type();

    let (bytes, filename) = match artifact {
        Artifact::Json(summary) => return Ok(Json(summary).into_response()),
        Artifact::Archive { bytes, filename } => (bytes, filename),
        Artifact::File { path, filename, .. } => {
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|source| ServiceError::Storage { operation, source })?;
            (bytes, filename)
        }
    };

    tracing::debug!("{}: sending {} ({} bytes)", operation, filename, bytes.len());

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, media_type)
        .header(header::CONTENT_LENGTH, bytes.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from(bytes))
        .map_err(|e| ServiceError::Worker {
            operation,
            message: e.to_string(),
        })
}

/// POST /convert/:conversion_type
async fn convert_document(
    State(state): State<AppState>,
    Path(conversion_type): Path<String>,
    multipart: Multipart,
) -> Result<Response, ServiceError> {
    let kind: ConversionKind = conversion_type.parse().map_err(ServiceError::Validation)?;
    let upload = read_form(multipart).await?.take_file()?;

    let artifact = state.service().convert(kind, upload).await?;
    respond(Operation::Convert(kind), artifact).await
}

/// POST /read-xps
async fn read_xps(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ServiceError> {
    let upload = read_form(multipart).await?.take_file()?;

    let summary = state.service().read(upload).await?;
    respond(Operation::Read, Artifact::Json(summary)).await
}

/// POST /preview-all
async fn preview_all(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ServiceError> {
    let upload = read_form(multipart).await?.take_file()?;

    let artifact = state.service().preview(upload).await?;
    respond(Operation::Preview, artifact).await
}

/// POST /edit-xps
async fn edit_xps(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ServiceError> {
    let mut form = read_form(multipart).await?;
    let upload = form.take_file()?;
    let old_text = form.take_field("old_text")?;
    let new_text = form.take_field("new_text")?;

    let artifact = state.service().edit(upload, old_text, new_text).await?;
    respond(Operation::Edit, artifact).await
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/convert/:conversion_type", post(convert_document))
        .route("/read-xps", post(read_xps))
        .route("/preview-all", post(preview_all))
        .route("/edit-xps", post(edit_xps))
}

//! Request orchestration
//!
//! Every request runs the same pipeline: validate the upload, store it,
//! wait for a job slot, then open the document and run one engine function
//! inside a blocking job. The stored upload and the document handle are both
//! released when that job ends, however it ends.

use std::sync::Arc;

use axum::body::Bytes;

use crate::document::{DocumentBackend, DocumentHandle, DocumentResult, JobPool};
use crate::error::ServiceError;
use crate::storage::StorageManager;

use super::artifact::{Artifact, ConversionKind, DocumentSummary, Operation};
use super::engine::{self, IMAGES_ARCHIVE_NAME, PREVIEW_ARCHIVE_NAME};

/// Extension every upload must carry
pub const ACCEPTED_EXTENSION: &str = ".xps";

/// An uploaded file as received from the client
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Bytes,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// Reject anything not named `*.xps` (case-insensitive)
pub fn validate_filename(filename: &str) -> Result<(), ServiceError> {
    if filename.to_lowercase().ends_with(ACCEPTED_EXTENSION) {
        Ok(())
    } else {
        Err(ServiceError::Validation(
            "Only .xps files are allowed".to_string(),
        ))
    }
}

/// Runs conversion pipelines against a document backend
#[derive(Clone)]
pub struct ConversionService {
    backend: Arc<dyn DocumentBackend>,
    storage: StorageManager,
    pool: JobPool,
}

impl ConversionService {
    pub fn new(backend: Arc<dyn DocumentBackend>, storage: StorageManager, pool: JobPool) -> Self {
        Self {
            backend,
            storage,
            pool,
        }
    }

    pub fn storage(&self) -> &StorageManager {
        &self.storage
    }

    pub fn pool(&self) -> &JobPool {
        &self.pool
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// `POST /convert/{conversion_type}`
    pub async fn convert(
        &self,
        kind: ConversionKind,
        upload: Upload,
    ) -> Result<Artifact, ServiceError> {
        self.run(Operation::Convert(kind), upload, move |doc, storage| match kind {
            ConversionKind::Pdf => engine::to_pdf(doc, storage),
            ConversionKind::Images => engine::to_images(doc, IMAGES_ARCHIVE_NAME),
            ConversionKind::Docx => engine::to_docx(doc, storage),
        })
        .await
    }

    /// `POST /read-xps`
    pub async fn read(&self, upload: Upload) -> Result<DocumentSummary, ServiceError> {
        self.run(Operation::Read, upload, |doc, _| {
            engine::extract_text_and_metadata(doc)
        })
        .await
    }

    /// `POST /preview-all`
    pub async fn preview(&self, upload: Upload) -> Result<Artifact, ServiceError> {
        self.run(Operation::Preview, upload, |doc, _| {
            engine::to_images(doc, PREVIEW_ARCHIVE_NAME)
        })
        .await
    }

    /// `POST /edit-xps`
    pub async fn edit(
        &self,
        upload: Upload,
        old_text: String,
        new_text: String,
    ) -> Result<Artifact, ServiceError> {
        self.run(Operation::Edit, upload, move |doc, storage| {
            engine::replace_text(doc, &old_text, &new_text, storage)
        })
        .await
    }

    async fn run<T, F>(&self, operation: Operation, upload: Upload, job: F) -> Result<T, ServiceError>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn DocumentHandle, &StorageManager) -> DocumentResult<T> + Send + 'static,
    {
        validate_filename(&upload.filename)?;
        tracing::debug!(
            "{}: received {} ({} bytes)",
            operation,
            upload.filename,
            upload.bytes.len()
        );

        let input = self
            .storage
            .store_upload(ACCEPTED_EXTENSION, &upload.bytes)
            .await
            .map_err(|source| ServiceError::Storage { operation, source })?;
        drop(upload);

        let permit = self
            .pool
            .acquire()
            .await
            .map_err(|e| ServiceError::Worker {
                operation,
                message: e.to_string(),
            })?;

        let backend = Arc::clone(&self.backend);
        let storage = self.storage.clone();

        // The guard and the permit move into the job: both are released when
        // it finishes, including when it panics.
        let outcome = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let result = backend.open(input.path()).and_then(|mut doc| {
                let output = job(doc.as_mut(), &storage);
                doc.close();
                output
            });
            drop(input);
            result
        })
        .await;

        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => Err(ServiceError::Backend { operation, source }),
            Err(e) => Err(ServiceError::Worker {
                operation,
                message: format!("job failed: {}", e),
            }),
        }
    }
}

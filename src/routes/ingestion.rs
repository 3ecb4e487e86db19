use axum::extract::multipart::{Field, MultipartError, MultipartRejection};
use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tracing::{debug, info, warn};

use super::{success, ApiSuccess};
use crate::models::{AppState, DatasetRecord, DatasetStatus, IngestionQuery, ListFilter, NewUpload, UploadMetadata};
use crate::types::{AppError, AppResult};

/// Stored name for a file part that arrives without one
const DEFAULT_UPLOAD_NAME: &str = "upload";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/ingestion", get(query_datasets).post(upload_dataset))
        .with_state(state)
}

fn multipart_error(e: MultipartError) -> AppError {
    AppError::Validation(format!("Failed to read multipart field: {}", e))
}

async fn field_text(field: Field<'_>) -> AppResult<String> {
    field.text().await.map_err(multipart_error)
}

async fn upload_dataset(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<(StatusCode, Json<ApiSuccess<DatasetRecord>>)> {
    let mut multipart = multipart?;
    let mut upload = NewUpload::default();
    let mut has_file = false;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "file" => {
                upload.original_filename = field
                    .file_name()
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or(DEFAULT_UPLOAD_NAME)
                    .to_string();
                upload.bytes = field.bytes().await.map_err(multipart_error)?.to_vec();
                has_file = true;
            }
            "title" => upload.title = Some(field_text(field).await?),
            "description" => upload.description = Some(field_text(field).await?),
            "metadata" => {
                let raw = field_text(field).await?;
                let metadata = UploadMetadata::parse(&raw).unwrap_or_else(|e| {
                    warn!(error = %e, "Ignoring unparseable upload metadata");
                    UploadMetadata::default()
                });
                upload.columns = metadata.columns;
                upload.row_count = metadata.row_count;
            }
            other => debug!(field = %other, "Ignoring unknown multipart field"),
        }
    }

    if !has_file {
        return Err(AppError::Validation("File is required".to_string()));
    }

    info!(filename = %upload.original_filename, size = upload.bytes.len(), "Upload received");
    let record = state.store.ingest(upload).await?;
    info!(dataset_id = %record.id, "Upload accepted");

    Ok((StatusCode::CREATED, success(record)))
}

async fn query_datasets(
    State(state): State<AppState>,
    Query(query): Query<IngestionQuery>,
) -> AppResult<Response> {
    if let Some(id) = query.id.as_deref().filter(|id| !id.is_empty()) {
        let record = state.store.get(id).await?;
        return Ok(success(record).into_response());
    }

    let status = match query.status.as_deref().filter(|s| !s.is_empty()) {
        None => None,
        Some(raw) => match raw.parse::<DatasetStatus>() {
            Ok(status) => Some(status),
            // No record can carry an unknown status
            Err(_) => return Ok(success(Vec::<()>::new()).into_response()),
        },
    };

    let filter = ListFilter {
        status,
        filename_contains: query.filename.filter(|f| !f.is_empty()),
    };
    let records = state.store.list(&filter).await?;

    Ok(success(records).into_response())
}

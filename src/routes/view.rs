use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tracing::debug;

use crate::models::{AppState, ViewQuery};
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/view", get(view_file))
        .with_state(state)
}

fn content_type_for(file_type: &str) -> mime::Mime {
    match file_type {
        "csv" => mime::TEXT_CSV,
        "json" => mime::APPLICATION_JSON,
        _ => mime::TEXT_PLAIN,
    }
}

async fn view_file(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> AppResult<impl IntoResponse> {
    let file_id = query
        .file_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("File ID is required".to_string()))?;

    let record = state.store.get(&file_id).await?;
    let content = state.store.read_content(&record).await?;
    debug!(dataset_id = %file_id, bytes = content.len(), "Serving file content");

    Ok((
        [(header::CONTENT_TYPE, content_type_for(&record.file_type).to_string())],
        content,
    ))
}

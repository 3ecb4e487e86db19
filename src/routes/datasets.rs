//! Dataset detail page payload and the assistant chat behind it

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::info;

use super::{success, ApiSuccess};
use crate::agents::DatasetAssistant;
use crate::keywords::keywords_for;
use crate::models::{AppState, ChatRequest, ChatResponse, DatasetDetail};
use crate::types::{AppError, AppResult};
use crate::utils::format_file_size;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/datasets/{id}", get(dataset_detail))
        .route("/api/datasets/{id}/chat", post(dataset_chat))
        .with_state(state)
}

async fn dataset_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiSuccess<DatasetDetail>>> {
    let mut record = state.store.get(&id).await?;

    let keywords = keywords_for(&record);
    // Reported once, at the top level of the payload
    record.keywords = None;

    let detail = DatasetDetail {
        formatted_size: format_file_size(record.file_size),
        greeting: DatasetAssistant::greeting(&record.title),
        keywords,
        record,
    };

    Ok(success(detail))
}

async fn dataset_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    request: Result<Json<ChatRequest>, JsonRejection>,
) -> AppResult<Json<ApiSuccess<ChatResponse>>> {
    let Json(request) = request?;
    if request.message.trim().is_empty() {
        return Err(AppError::Validation("Message is required".to_string()));
    }

    let record = state.store.get(&id).await?;
    let topic = DatasetAssistant::classify_topic(&request.message);
    info!(dataset_id = %id, topic = ?topic, "Answering dataset question");

    let response = ChatResponse {
        role: "assistant".to_string(),
        content: DatasetAssistant::reply(&record, &request.message),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    Ok(success(response))
}

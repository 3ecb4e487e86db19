use std::sync::Arc;

use crate::config::Config;
use crate::store::MetadataStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<MetadataStore>,
}

/// Lifecycle of an ingested dataset. Ingestion is synchronous, so stored records
/// are always `Completed`; `Processing` only appears in imported seed data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetStatus {
    Processing,
    #[default]
    Completed,
}

impl DatasetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetStatus::Processing => "processing",
            DatasetStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for DatasetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DatasetStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(DatasetStatus::Processing),
            "completed" => Ok(DatasetStatus::Completed),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}

/// One catalogued dataset, persisted as its own sidecar file.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetRecord {
    pub id: String,
    pub filename: String,
    #[serde(default)]
    pub original_filename: String,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub row_count: u64,
    #[serde(default)]
    pub status: DatasetStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default)]
    pub upload_date: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub file_type: String,
    #[serde(default)]
    pub ai_generated: bool,
    #[serde(default)]
    pub insights: Vec<String>,
    #[serde(default)]
    pub image_prompt: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
}

impl DatasetRecord {
    /// Fill fields that older sidecars may lack
    pub(crate) fn normalized(mut self) -> Self {
        if self.original_filename.is_empty() {
            self.original_filename = self.filename.clone();
        }
        self
    }
}

/// Everything a caller hands to ingestion.
#[derive(Debug, Clone, Default)]
pub struct NewUpload {
    pub bytes: Vec<u8>,
    pub original_filename: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub columns: Option<Vec<String>>,
    pub row_count: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub status: Option<DatasetStatus>,
    pub filename_contains: Option<String>,
}

impl ListFilter {
    pub fn matches(&self, record: &DatasetRecord) -> bool {
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        if let Some(needle) = &self.filename_contains {
            if !record.filename.contains(needle.as_str()) {
                return false;
            }
        }
        true
    }
}

// API Request/Response types

/// The `metadata` multipart field sent by upload clients
#[derive(Debug, Default, PartialEq)]
pub struct UploadMetadata {
    pub columns: Option<Vec<String>>,
    pub row_count: Option<u64>,
}

impl UploadMetadata {
    /// Read `columns` and `rowCount` independently; an off-type field is
    /// dropped without affecting its sibling.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(raw)?;

        let columns = value.get("columns").and_then(|c| c.as_array()).map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        });

        let row_count = value.get("rowCount").and_then(|n| {
            n.as_u64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                    .map(|f| f as u64)
            })
        });

        Ok(Self { columns, row_count })
    }
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct IngestionQuery {
    pub status: Option<String>,
    pub filename: Option<String>,
    pub id: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewQuery {
    pub file_id: Option<String>,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetDetail {
    #[serde(flatten)]
    pub record: DatasetRecord,
    pub keywords: Vec<String>,
    pub formatted_size: String,
    pub greeting: String,
}

#[derive(Debug, serde::Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub role: String,
    pub content: String,
    pub timestamp: String,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub storage: String,
}

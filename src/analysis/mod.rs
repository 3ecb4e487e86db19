//! Content Analyzer
//!
//! Best-effort AI metadata for uploaded datasets. The analyzer is an external
//! collaborator: every failure is absorbed by the caller and replaced with the
//! static fallback set, so ingestion never fails because of it.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::LLMConfig;
use crate::llm::{LLMAdapter, OpenAIAdapter};
use crate::types::{AppResult, LLMMessage, LLMRequest};

/// Number of leading lines sent to the model
const SAMPLE_LINES: usize = 20;

const SYSTEM_PROMPT: &str = "You are a data analysis assistant. Analyze the provided dataset sample and extract useful metadata.
Format your response as JSON with these fields:
- description: A detailed paragraph describing what this dataset contains and its potential use cases
- summary: A brief one-sentence summary of the dataset content
- columns: An analysis of each column's data type and purpose
- insights: 2-3 initial insights about patterns or noteworthy aspects of this data
- suggestedImageTerms: 3 search terms that would yield relevant images to represent this dataset visually (single words or short phrases)";

/// File types whose content is decoded and sent for analysis
pub const ANALYZABLE_TYPES: [&str; 3] = ["csv", "txt", "json"];

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DatasetAnalysis {
    pub description: String,
    pub summary: String,
    pub suggested_image_terms: Vec<String>,
    pub columns: Vec<String>,
    pub insights: Vec<String>,
}

impl DatasetAnalysis {
    /// Values used for files that were never analyzed
    pub fn not_analyzed() -> Self {
        Self {
            suggested_image_terms: terms(&["data", "analytics", "visualization"]),
            ..Default::default()
        }
    }

    /// Values used when analysis was attempted but produced nothing usable
    pub fn fallback(filename: &str) -> Self {
        Self {
            description: format!("Dataset extracted from {}", filename),
            summary: filename.to_string(),
            suggested_image_terms: terms(&["data", "analytics", "chart"]),
            columns: Vec::new(),
            insights: Vec::new(),
        }
    }

    pub fn image_prompt(&self) -> String {
        format!(
            "abstract data visualization of {}, professional, minimalist, business analytics dashboard",
            self.suggested_image_terms.join(", ")
        )
    }
}

fn terms(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[async_trait]
pub trait ContentAnalyzer: Send + Sync {
    async fn analyze(&self, content: &str, filename: &str, file_type: &str) -> AppResult<DatasetAnalysis>;
}

/// Analyze text, absorbing any analyzer failure into the fallback set
pub async fn analyze_or_fallback(
    analyzer: &dyn ContentAnalyzer,
    content: &str,
    filename: &str,
    file_type: &str,
) -> DatasetAnalysis {
    match analyzer.analyze(content, filename, file_type).await {
        Ok(analysis) => analysis,
        Err(e) => {
            warn!(error = %e, filename = %filename, "Content analysis failed, using defaults");
            DatasetAnalysis::fallback(filename)
        }
    }
}

/// Pick the analyzer for the current configuration
pub fn analyzer_from_config(config: &LLMConfig) -> AppResult<Box<dyn ContentAnalyzer>> {
    match config.active_api_key() {
        Some(key) => {
            let adapter = OpenAIAdapter::with_base_url(
                key,
                &config.base_url,
                Duration::from_secs(config.timeout_secs),
            )?;
            Ok(Box::new(LlmContentAnalyzer::new(Box::new(adapter), &config.model)))
        }
        None => Ok(Box::new(FallbackAnalyzer)),
    }
}

/// Used when no API key is configured
pub struct FallbackAnalyzer;

#[async_trait]
impl ContentAnalyzer for FallbackAnalyzer {
    async fn analyze(&self, _content: &str, filename: &str, _file_type: &str) -> AppResult<DatasetAnalysis> {
        warn!("OpenAI API key is not configured. Using default values.");
        Ok(DatasetAnalysis::fallback(filename))
    }
}

pub struct LlmContentAnalyzer {
    adapter: Box<dyn LLMAdapter>,
    model: String,
}

impl LlmContentAnalyzer {
    pub fn new(adapter: Box<dyn LLMAdapter>, model: &str) -> Self {
        Self {
            adapter,
            model: model.to_string(),
        }
    }

    fn sample(content: &str) -> String {
        content.lines().take(SAMPLE_LINES).collect::<Vec<_>>().join("\n")
    }

    /// Turn the model's reply into an analysis, defaulting field by field
    fn parse_reply(reply: &str, filename: &str) -> DatasetAnalysis {
        let fallback = DatasetAnalysis::fallback(filename);
        let value: Value = match serde_json::from_str(reply) {
            Ok(Value::Object(map)) => Value::Object(map),
            Ok(_) | Err(_) => {
                warn!(filename = %filename, "Analyzer reply is not a JSON object");
                return fallback;
            }
        };

        let text = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let image_terms = string_list(value.get("suggestedImageTerms"));

        DatasetAnalysis {
            description: text("description").unwrap_or(fallback.description),
            summary: text("summary").unwrap_or(fallback.summary),
            suggested_image_terms: if image_terms.is_empty() {
                fallback.suggested_image_terms
            } else {
                image_terms
            },
            columns: column_names(value.get("columns")),
            insights: string_list(value.get("insights")),
        }
    }
}

/// Strings out of a JSON array; anything else yields nothing
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Object(_) => item
                    .get("insight")
                    .or_else(|| item.get("text"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Models describe columns as names, as objects with a name, or as an object keyed by name
fn column_names(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Object(_) => item
                    .get("name")
                    .or_else(|| item.get("column"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            })
            .collect(),
        Some(Value::Object(map)) => map.keys().cloned().collect(),
        _ => Vec::new(),
    }
}

#[async_trait]
impl ContentAnalyzer for LlmContentAnalyzer {
    async fn analyze(&self, content: &str, filename: &str, file_type: &str) -> AppResult<DatasetAnalysis> {
        let request = LLMRequest {
            model: self.model.clone(),
            messages: vec![
                LLMMessage::system(SYSTEM_PROMPT),
                LLMMessage::user(format!(
                    "Analyze this {} file named \"{}\":\n\n{}",
                    file_type,
                    filename,
                    Self::sample(content)
                )),
            ],
            max_tokens: None,
            temperature: None,
            json_response: true,
        };

        let response = self.adapter.create_chat_completion(&request).await?;
        debug!(
            filename = %filename,
            total_tokens = response.usage.total_tokens,
            "Analyzer reply received"
        );

        let reply = if response.content.trim().is_empty() {
            "{}"
        } else {
            response.content.as_str()
        };
        Ok(Self::parse_reply(reply, filename))
    }
}

//! Keyword Deriver
//!
//! Descriptive tags for a dataset detail page, derived from the record when the
//! sidecar carries no stored keywords.

use crate::models::DatasetRecord;

const MAX_KEYWORDS: usize = 5;
const MIN_KEYWORDS: usize = 3;
const LARGE_DATASET_BYTES: u64 = 10 * 1024 * 1024;
const SMALL_DATASET_BYTES: u64 = 1024 * 1024;
const HIGH_DIMENSIONAL_COLUMNS: usize = 20;

const DOMAIN_KEYWORDS: [&str; 15] = [
    "engineering",
    "science",
    "business",
    "finance",
    "healthcare",
    "education",
    "marketing",
    "sales",
    "logistics",
    "manufacturing",
    "retail",
    "technology",
    "ai",
    "machine-learning",
    "statistics",
];

/// Appended in order, skipping duplicates, until the minimum is reached
const FILLER_KEYWORDS: [&str; 3] = ["data-analysis", "dataset", "general"];

/// Derive up to five tags for a record, never fewer than three
pub fn derive_keywords(record: &DatasetRecord) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();

    let file_type = record.file_type.trim().to_lowercase();
    if !file_type.is_empty() {
        keywords.push(file_type);
    }

    if record.file_size > LARGE_DATASET_BYTES {
        keywords.push("large-dataset".to_string());
    } else if record.file_size < SMALL_DATASET_BYTES {
        keywords.push("small-dataset".to_string());
    }

    let combined = format!("{} {}", record.title, record.description).to_lowercase();
    keywords.extend(
        DOMAIN_KEYWORDS
            .iter()
            .filter(|term| combined.contains(*term))
            .map(|term| term.to_string()),
    );

    if !record.columns.is_empty() {
        keywords.push("tabular-data".to_string());
        if record.columns.len() > HIGH_DIMENSIONAL_COLUMNS {
            keywords.push("high-dimensional".to_string());
        }
    }

    for filler in FILLER_KEYWORDS {
        if keywords.len() >= MIN_KEYWORDS {
            break;
        }
        if !keywords.iter().any(|k| k == filler) {
            keywords.push(filler.to_string());
        }
    }

    keywords.truncate(MAX_KEYWORDS);
    keywords
}

/// Stored keywords win; otherwise derive them
pub fn keywords_for(record: &DatasetRecord) -> Vec<String> {
    match &record.keywords {
        Some(stored) if !stored.is_empty() => stored.clone(),
        _ => derive_keywords(record),
    }
}

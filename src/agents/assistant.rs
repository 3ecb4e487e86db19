//! Dataset Assistant
//!
//! Simulated chat for a dataset detail page. The question is classified into a
//! topic by keyword and answered from a template filled with the record's own
//! title and shape.

use crate::models::DatasetRecord;

/// What a question is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyTopic {
    MissingValues,
    Correlation,
    Outliers,
    Distribution,
    Overview,
    General,
}

pub struct DatasetAssistant;

impl DatasetAssistant {
    /// Opening message shown before the user asks anything
    pub fn greeting(title: &str) -> String {
        format!(
            "Hi there! I'm your AI assistant for the \"{}\" dataset. How can I help you analyze this data?",
            title
        )
    }

    /// Classify a question; earlier topics win when several match
    pub fn classify_topic(message: &str) -> ReplyTopic {
        let message_lower = message.to_lowercase();

        let mentions = |indicators: &[&str]| indicators.iter().any(|i| message_lower.contains(i));

        if mentions(&["missing", "null"]) {
            ReplyTopic::MissingValues
        } else if mentions(&["correlation", "relationship"]) {
            ReplyTopic::Correlation
        } else if mentions(&["outlier"]) {
            ReplyTopic::Outliers
        } else if mentions(&["distribution"]) {
            ReplyTopic::Distribution
        } else if mentions(&["summary", "overview"]) {
            ReplyTopic::Overview
        } else {
            ReplyTopic::General
        }
    }

    pub fn reply(record: &DatasetRecord, message: &str) -> String {
        match Self::classify_topic(message) {
            ReplyTopic::MissingValues => "This dataset has some missing values in certain columns. The most affected columns are typically categorical features, with approximately 5-8% of values missing overall.".to_string(),
            ReplyTopic::Correlation => "There appears to be a strong positive correlation between features X and Y (correlation coefficient 0.78), suggesting that as X increases, Y tends to increase as well.".to_string(),
            ReplyTopic::Outliers => "I detected several outliers in the numerical columns, particularly in columns related to measurements and time-based metrics. These outliers represent approximately 2.3% of the dataset.".to_string(),
            ReplyTopic::Distribution => "The numerical features in this dataset generally follow a normal distribution with some right skewness observed in financial metrics.".to_string(),
            ReplyTopic::Overview => Self::overview(record),
            ReplyTopic::General => format!(
                "Based on my analysis of the {} dataset, I can tell you that it contains structured data with both numerical and categorical features. The most important features appear to be related to the central theme of the dataset. Would you like me to analyze any specific aspect of this data?",
                record.title
            ),
        }
    }

    fn overview(record: &DatasetRecord) -> String {
        let shape = if record.columns.is_empty() {
            "an undetermined number of features".to_string()
        } else {
            format!("{} features", record.columns.len())
        };
        format!(
            "This dataset contains {} across roughly {} rows and appears to be related to {}. The data quality is generally good with minimal missing values and a few outliers that might need attention during preprocessing.",
            shape,
            record.row_count,
            record.title.to_lowercase()
        )
    }
}

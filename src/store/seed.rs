// Built-in demo records, imported into an empty catalogue on first start

use crate::models::{DatasetRecord, DatasetStatus};

pub fn demo_records() -> Vec<DatasetRecord> {
    let now = chrono::Utc::now();

    vec![
        DatasetRecord {
            id: "mock-1".to_string(),
            filename: "sample_data.csv".to_string(),
            original_filename: "sample_data.csv".to_string(),
            file_size: 2_048_576,
            title: "Sample User Data".to_string(),
            description: "A dataset containing user information for testing purposes".to_string(),
            columns: ["id", "name", "email", "age"].map(String::from).to_vec(),
            row_count: 1500,
            status: DatasetStatus::Completed,
            file_path: None,
            upload_date: Some(now),
            file_type: "csv".to_string(),
            ai_generated: false,
            insights: Vec::new(),
            image_prompt: String::new(),
            summary: String::new(),
            keywords: None,
        },
        DatasetRecord {
            id: "mock-2".to_string(),
            filename: "sales_q1.csv".to_string(),
            original_filename: "sales_q1.csv".to_string(),
            file_size: 4_096_000,
            title: "Q1 Sales Data".to_string(),
            description: "First quarter sales data by product and date".to_string(),
            columns: ["date", "product_id", "quantity", "price"].map(String::from).to_vec(),
            row_count: 3200,
            status: DatasetStatus::Processing,
            file_path: None,
            upload_date: Some(now),
            file_type: "csv".to_string(),
            ai_generated: false,
            insights: Vec::new(),
            image_prompt: String::new(),
            summary: String::new(),
            keywords: None,
        },
    ]
}

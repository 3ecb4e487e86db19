//! Command-line interface: run the server, or sniff and upload files to one

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use reqwest::multipart::{Form, Part};
use tracing::{info, warn};

use crate::models::DatasetRecord;
use crate::sniff::{sniff, SniffResult};

pub const DEFAULT_SERVER: &str = "http://localhost:3000";

#[derive(Parser, Debug)]
#[command(
    name = "dataset-dashboard",
    version,
    about = "Upload, catalogue and annotate tabular datasets"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server (the default)
    Serve,
    /// Print the columns and row count inferred for a file
    Sniff {
        /// File to inspect
        path: PathBuf,
    },
    /// Sniff a file and send it to a running server
    Upload {
        /// File to upload
        path: PathBuf,
        /// Defaults to the file name
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Base URL of the server
        #[arg(long, default_value = DEFAULT_SERVER)]
        server: String,
    },
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string())
}

pub async fn sniff_file(path: &Path) -> Result<SniffResult> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(sniff(&file_name_of(path), &bytes)?)
}

pub async fn upload_file(
    server: &str,
    path: &Path,
    title: Option<String>,
    description: Option<String>,
) -> Result<DatasetRecord> {
    let filename = file_name_of(path);
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let metadata = match sniff(&filename, &bytes) {
        Ok(result) => Some(result),
        Err(e) => {
            warn!(filename = %filename, error = %e, "Could not sniff file, uploading without metadata");
            None
        }
    };

    let mut form = Form::new()
        .part("file", Part::bytes(bytes).file_name(filename.clone()))
        .text("title", title.unwrap_or_else(|| filename.clone()))
        .text("description", description.unwrap_or_default());
    if let Some(metadata) = &metadata {
        form = form.text("metadata", serde_json::to_string(metadata)?);
    }

    let url = format!("{}/api/ingestion", server.trim_end_matches('/'));
    info!(url = %url, filename = %filename, "Uploading dataset");

    let response = reqwest::Client::new()
        .post(&url)
        .multipart(form)
        .send()
        .await
        .with_context(|| format!("Failed to reach {}", url))?;

    let status = response.status();
    let body: serde_json::Value = response
        .json()
        .await
        .context("Server returned a non-JSON response")?;

    if !status.is_success() {
        let message = body["error"].as_str().unwrap_or("Upload failed");
        return Err(anyhow!("{} ({})", message, status));
    }

    let record = serde_json::from_value(body["data"].clone())
        .context("Server response did not contain a dataset record")?;
    Ok(record)
}

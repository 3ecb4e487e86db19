//! Metadata Store
//!
//! Local-disk dataset catalogue. Every upload is kept as `<id>.<ext>` next to a
//! `<id>.meta.json` sidecar holding its [`DatasetRecord`]. The sidecar directory
//! is the only source of truth: seed records are imported into it once when the
//! store is opened and never consulted again.
//!
//! Each file is written to a hidden temporary sibling and renamed into place, so
//! readers never see a partial sidecar. If the sidecar cannot be written the
//! already-stored content file is removed again.

pub mod seed;

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analysis::{analyze_or_fallback, ContentAnalyzer, DatasetAnalysis, ANALYZABLE_TYPES};
use crate::models::{DatasetRecord, DatasetStatus, ListFilter, NewUpload};
use crate::sniff::{count_rows, RowCounting};
use crate::types::{AppError, AppResult};

pub const SIDECAR_SUFFIX: &str = ".meta.json";
pub const UNKNOWN_FILE_TYPE: &str = "unknown";
/// URL prefix under which stored files are served
pub const PUBLIC_PREFIX: &str = "/uploads/";

/// File types whose row count can be estimated by counting lines
const LINE_DELIMITED_TYPES: [&str; 1] = ["csv"];

pub struct MetadataStore {
    upload_dir: PathBuf,
    analyzer: Box<dyn ContentAnalyzer>,
}

/// Lower-cased extension of `filename`, or `unknown` when there is none
pub fn file_type_of(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            ext.to_ascii_lowercase()
        }
        _ => UNKNOWN_FILE_TYPE.to_string(),
    }
}

/// Ids double as file-name stems, so only a conservative alphabet is accepted
fn is_safe_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn not_found() -> AppError {
    AppError::NotFound("File not found".to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Write `data` to a hidden sibling of `path`, then rename it into place
async fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = path.with_file_name(format!(".{}.tmp", file_name));

    if let Err(e) = fs::write(&tmp_path, data).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(e);
    }
    if let Err(e) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(e);
    }
    Ok(())
}

/// Content first, then sidecar; a failed sidecar write removes the content again
async fn persist_pair(
    content_path: &Path,
    content: &[u8],
    sidecar_path: &Path,
    sidecar: &[u8],
) -> std::io::Result<()> {
    write_atomic(content_path, content).await?;

    if let Err(e) = write_atomic(sidecar_path, sidecar).await {
        if let Err(cleanup) = fs::remove_file(content_path).await {
            warn!(
                path = %content_path.display(),
                error = %cleanup,
                "Failed to remove orphaned content file"
            );
        }
        return Err(e);
    }
    Ok(())
}

impl MetadataStore {
    /// Open (creating if needed) the store at `upload_dir` and import `seeds`
    /// that have no sidecar yet.
    pub async fn open(
        upload_dir: impl Into<PathBuf>,
        analyzer: Box<dyn ContentAnalyzer>,
        seeds: Vec<DatasetRecord>,
    ) -> AppResult<Self> {
        let store = Self {
            upload_dir: upload_dir.into(),
            analyzer,
        };
        fs::create_dir_all(&store.upload_dir).await?;
        store.import_seeds(seeds).await?;
        info!(upload_dir = %store.upload_dir.display(), "Metadata store ready");
        Ok(store)
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    fn sidecar_path(&self, id: &str) -> PathBuf {
        self.upload_dir.join(format!("{}{}", id, SIDECAR_SUFFIX))
    }

    async fn import_seeds(&self, seeds: Vec<DatasetRecord>) -> AppResult<()> {
        let mut imported = 0usize;
        for seed in seeds {
            if !is_safe_id(&seed.id) {
                warn!(dataset_id = %seed.id, "Skipping seed record with unusable id");
                continue;
            }
            let path = self.sidecar_path(&seed.id);
            if fs::try_exists(&path).await? {
                debug!(dataset_id = %seed.id, "Sidecar already present, seed ignored");
                continue;
            }
            let content = serde_json::to_vec_pretty(&seed.normalized())?;
            write_atomic(&path, &content).await?;
            imported += 1;
        }
        if imported > 0 {
            info!(count = imported, "Imported seed records");
        }
        Ok(())
    }

    /// Store an uploaded file and its metadata record
    pub async fn ingest(&self, upload: NewUpload) -> AppResult<DatasetRecord> {
        let id = Uuid::new_v4().to_string();
        let original_filename = upload.original_filename;
        let file_type = file_type_of(&original_filename);

        info!(
            dataset_id = %id,
            filename = %original_filename,
            file_type = %file_type,
            size = upload.bytes.len(),
            "Ingesting dataset"
        );

        let text = ANALYZABLE_TYPES
            .contains(&file_type.as_str())
            .then(|| String::from_utf8_lossy(&upload.bytes).into_owned());

        let analysis = match &text {
            Some(content) => {
                analyze_or_fallback(self.analyzer.as_ref(), content, &original_filename, &file_type).await
            }
            None => DatasetAnalysis::not_analyzed(),
        };
        let image_prompt = analysis.image_prompt();

        let columns = match upload.columns.filter(|c| !c.is_empty()) {
            Some(columns) => columns,
            None => analysis.columns,
        };

        let row_count = match (upload.row_count, &text) {
            (Some(count), _) => count,
            (None, Some(content)) if LINE_DELIMITED_TYPES.contains(&file_type.as_str()) => {
                count_rows(content, RowCounting::ExcludeHeader)
            }
            _ => 0,
        };

        let user_title = non_blank(upload.title);
        let user_description = non_blank(upload.description);
        let ai_generated = user_title.is_none() || user_description.is_none();

        let title = user_title
            .or_else(|| Some(analysis.summary.clone()).filter(|s| !s.is_empty()))
            .unwrap_or_else(|| original_filename.clone());
        let description = user_description.unwrap_or(analysis.description);

        let stored_name = format!("{}.{}", id, file_type);
        let record = DatasetRecord {
            id: id.clone(),
            filename: original_filename.clone(),
            original_filename,
            file_size: upload.bytes.len() as u64,
            title,
            description,
            columns,
            row_count,
            status: DatasetStatus::Completed,
            file_path: Some(format!("{}{}", PUBLIC_PREFIX, stored_name)),
            upload_date: Some(chrono::Utc::now()),
            file_type,
            ai_generated,
            insights: analysis.insights,
            image_prompt,
            summary: analysis.summary,
            keywords: None,
        };

        let sidecar = serde_json::to_vec_pretty(&record)?;
        persist_pair(
            &self.upload_dir.join(&stored_name),
            &upload.bytes,
            &self.sidecar_path(&id),
            &sidecar,
        )
        .await?;

        info!(dataset_id = %id, rows = record.row_count, "Dataset stored");
        Ok(record)
    }

    /// All stored records matching `filter`, ordered by upload date then id
    pub async fn list(&self, filter: &ListFilter) -> AppResult<Vec<DatasetRecord>> {
        let mut entries = match fs::read_dir(&self.upload_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.ends_with(SIDECAR_SUFFIX) || name.starts_with('.') {
                continue;
            }

            let content = match fs::read_to_string(entry.path()).await {
                Ok(content) => content,
                Err(e) => {
                    warn!(sidecar = %name, error = %e, "Error reading metadata, skipping");
                    continue;
                }
            };
            match serde_json::from_str::<DatasetRecord>(&content) {
                Ok(record) => {
                    let record = record.normalized();
                    if filter.matches(&record) {
                        records.push(record);
                    }
                }
                Err(e) => warn!(sidecar = %name, error = %e, "Invalid metadata, skipping"),
            }
        }

        records.sort_by(|a, b| a.upload_date.cmp(&b.upload_date).then_with(|| a.id.cmp(&b.id)));
        debug!(count = records.len(), "Listed datasets");
        Ok(records)
    }

    pub async fn get(&self, id: &str) -> AppResult<DatasetRecord> {
        if !is_safe_id(id) {
            return Err(not_found());
        }

        let content = match fs::read_to_string(self.sidecar_path(id)).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(e.into()),
        };
        let record: DatasetRecord = serde_json::from_str(&content)?;
        Ok(record.normalized())
    }

    /// Raw bytes of the stored file behind `record`
    pub async fn read_content(&self, record: &DatasetRecord) -> AppResult<Vec<u8>> {
        let stored_name = record
            .file_path
            .as_deref()
            .and_then(|p| Path::new(p).file_name())
            .ok_or_else(not_found)?;

        match fs::read(self.upload_dir.join(stored_name)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(not_found()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use tempfile::TempDir;

    struct FailingAnalyzer;

    #[async_trait]
    impl ContentAnalyzer for FailingAnalyzer {
        async fn analyze(&self, _: &str, _: &str, _: &str) -> AppResult<DatasetAnalysis> {
            Err(AppError::LLMApi("service unavailable".to_string()))
        }
    }

    struct FixedAnalyzer;

    #[async_trait]
    impl ContentAnalyzer for FixedAnalyzer {
        async fn analyze(&self, _: &str, _: &str, _: &str) -> AppResult<DatasetAnalysis> {
            Ok(DatasetAnalysis {
                description: "Monthly retail sales".to_string(),
                summary: "Retail sales".to_string(),
                suggested_image_terms: vec!["shop".to_string()],
                columns: vec!["month".to_string(), "total".to_string()],
                insights: vec!["December peaks".to_string()],
            })
        }
    }

    async fn store_with(dir: &TempDir, analyzer: Box<dyn ContentAnalyzer>) -> MetadataStore {
        MetadataStore::open(dir.path(), analyzer, Vec::new()).await.unwrap()
    }

    fn csv_upload(bytes: &str) -> NewUpload {
        NewUpload {
            bytes: bytes.as_bytes().to_vec(),
            original_filename: "ab.csv".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_file_type_of() {
        assert_eq!(file_type_of("Sales.CSV"), "csv");
        assert_eq!(file_type_of("archive.tar.gz"), "gz");
        assert_eq!(file_type_of("README"), "unknown");
        assert_eq!(file_type_of("trailing."), "unknown");
        assert_eq!(file_type_of("odd.a/b"), "unknown");
    }

    #[tokio::test]
    async fn test_ingest_then_get_is_equal() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, Box::new(FixedAnalyzer)).await;

        let record = store.ingest(csv_upload("a,b\n1,2\n3,4")).await.unwrap();
        let loaded = store.get(&record.id).await.unwrap();

        assert_eq!(loaded, record);
        assert_eq!(record.status, DatasetStatus::Completed);
        assert_eq!(record.file_type, "csv");
        assert_eq!(record.file_size, 11);
        assert_eq!(record.file_path, Some(format!("/uploads/{}.csv", record.id)));
        assert!(dir.path().join(format!("{}.csv", record.id)).exists());
        assert!(dir.path().join(format!("{}.meta.json", record.id)).exists());
    }

    #[tokio::test]
    async fn test_row_count_fallback_excludes_header() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, Box::new(FixedAnalyzer)).await;

        let record = store.ingest(csv_upload("a,b\n1,2\n3,4")).await.unwrap();
        assert_eq!(record.row_count, 2);

        let record = store.ingest(csv_upload("")).await.unwrap();
        assert_eq!(record.row_count, 0);

        let mut upload = csv_upload("a,b\n1,2\n3,4");
        upload.row_count = Some(3);
        assert_eq!(store.ingest(upload).await.unwrap().row_count, 3);

        let mut upload = csv_upload("a,b\n1,2\n3,4");
        upload.row_count = Some(0);
        assert_eq!(store.ingest(upload).await.unwrap().row_count, 0);
    }

    #[tokio::test]
    async fn test_row_count_not_estimated_for_json() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, Box::new(FixedAnalyzer)).await;

        let upload = NewUpload {
            bytes: br#"[{"a":1},{"a":2}]"#.to_vec(),
            original_filename: "rows.json".to_string(),
            ..Default::default()
        };
        assert_eq!(store.ingest(upload).await.unwrap().row_count, 0);
    }

    #[tokio::test]
    async fn test_user_fields_win_over_analysis() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, Box::new(FixedAnalyzer)).await;

        let mut upload = csv_upload("x,y\n1,2");
        upload.title = Some("My title".to_string());
        upload.description = Some("Mine".to_string());
        upload.columns = Some(vec!["x".to_string(), "y".to_string()]);
        let record = store.ingest(upload).await.unwrap();

        assert_eq!(record.title, "My title");
        assert_eq!(record.description, "Mine");
        assert_eq!(record.columns, vec!["x", "y"]);
        assert!(!record.ai_generated);
        assert_eq!(record.summary, "Retail sales");
        assert_eq!(record.insights, vec!["December peaks"]);
    }

    #[tokio::test]
    async fn test_analysis_fills_missing_fields() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, Box::new(FixedAnalyzer)).await;

        let mut upload = csv_upload("x,y\n1,2");
        upload.title = Some("Given".to_string());
        upload.description = Some("   ".to_string());
        upload.columns = Some(Vec::new());
        let record = store.ingest(upload).await.unwrap();

        assert_eq!(record.title, "Given");
        assert_eq!(record.description, "Monthly retail sales");
        assert_eq!(record.columns, vec!["month", "total"]);
        assert!(record.ai_generated);
        assert_eq!(
            record.image_prompt,
            "abstract data visualization of shop, professional, minimalist, business analytics dashboard"
        );
    }

    #[tokio::test]
    async fn test_analyzer_failure_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, Box::new(FailingAnalyzer)).await;

        let record = store.ingest(csv_upload("a,b\n1,2")).await.unwrap();

        assert_eq!(record.description, "Dataset extracted from ab.csv");
        assert_eq!(record.summary, "ab.csv");
        assert_eq!(record.title, "ab.csv");
        assert!(record.ai_generated);
        assert!(record.insights.is_empty());
        assert!(record.columns.is_empty());
        assert!(record.image_prompt.contains("data, analytics, chart"));
    }

    #[tokio::test]
    async fn test_binary_types_skip_analysis() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, Box::new(FixedAnalyzer)).await;

        let upload = NewUpload {
            bytes: vec![0x50, 0x4b, 0x03, 0x04],
            original_filename: "bundle".to_string(),
            ..Default::default()
        };
        let record = store.ingest(upload).await.unwrap();

        assert_eq!(record.file_type, "unknown");
        assert_eq!(record.title, "bundle");
        assert_eq!(record.description, "");
        assert_eq!(record.summary, "");
        assert!(record.image_prompt.contains("data, analytics, visualization"));
        assert!(dir.path().join(format!("{}.unknown", record.id)).exists());
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, Box::new(FixedAnalyzer)).await;

        let mut ids = HashSet::new();
        for _ in 0..20 {
            let record = store.ingest(csv_upload("a\n1")).await.unwrap();
            assert!(ids.insert(record.id));
        }
        assert_eq!(store.list(&ListFilter::default()).await.unwrap().len(), 20);
    }

    #[tokio::test]
    async fn test_list_skips_invalid_sidecars() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, Box::new(FixedAnalyzer)).await;
        let record = store.ingest(csv_upload("a\n1")).await.unwrap();

        std::fs::write(dir.path().join("broken.meta.json"), "{not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let records = store.list(&ListFilter::default()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, record.id);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let dir = TempDir::new().unwrap();
        let store = MetadataStore::open(dir.path(), Box::new(FixedAnalyzer), seed::demo_records())
            .await
            .unwrap();
        store.ingest(csv_upload("a\n1")).await.unwrap();

        let all = store.list(&ListFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);

        let processing = store
            .list(&ListFilter { status: Some(DatasetStatus::Processing), filename_contains: None })
            .await
            .unwrap();
        assert_eq!(processing.len(), 1);
        assert_eq!(processing[0].id, "mock-2");

        let completed_csv = store
            .list(&ListFilter {
                status: Some(DatasetStatus::Completed),
                filename_contains: Some("sample".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(completed_csv.len(), 1);
        assert_eq!(completed_csv[0].id, "mock-1");
    }

    #[tokio::test]
    async fn test_sidecar_wins_over_seed() {
        let dir = TempDir::new().unwrap();
        let mut edited = seed::demo_records().remove(0);
        edited.title = "Edited on disk".to_string();
        std::fs::write(
            dir.path().join(format!("{}.meta.json", edited.id)),
            serde_json::to_string(&edited).unwrap(),
        )
        .unwrap();

        let store = MetadataStore::open(dir.path(), Box::new(FixedAnalyzer), seed::demo_records())
            .await
            .unwrap();

        assert_eq!(store.get("mock-1").await.unwrap().title, "Edited on disk");
        let listed = store.list(&ListFilter::default()).await.unwrap();
        let mock_1: Vec<_> = listed.iter().filter(|r| r.id == "mock-1").collect();
        assert_eq!(mock_1.len(), 1);
        assert_eq!(mock_1[0].title, "Edited on disk");
    }

    #[tokio::test]
    async fn test_get_unknown_and_unsafe_ids() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, Box::new(FixedAnalyzer)).await;

        assert!(matches!(store.get("missing").await, Err(AppError::NotFound(_))));
        assert!(matches!(store.get("../etc/passwd").await, Err(AppError::NotFound(_))));
        assert!(matches!(store.get("").await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_read_content() {
        let dir = TempDir::new().unwrap();
        let store = MetadataStore::open(dir.path(), Box::new(FixedAnalyzer), seed::demo_records())
            .await
            .unwrap();

        let record = store.ingest(csv_upload("a,b\n1,2")).await.unwrap();
        assert_eq!(store.read_content(&record).await.unwrap(), b"a,b\n1,2");

        let seeded = store.get("mock-1").await.unwrap();
        assert!(matches!(store.read_content(&seeded).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_sidecar_failure_removes_content() {
        let dir = TempDir::new().unwrap();
        let content_path = dir.path().join("x.csv");
        let sidecar_path = dir.path().join("x.meta.json");
        // A non-empty directory at the sidecar path makes the final rename fail
        std::fs::create_dir(&sidecar_path).unwrap();
        std::fs::write(sidecar_path.join("occupied"), "").unwrap();

        let result = persist_pair(&content_path, b"a\n1", &sidecar_path, b"{}").await;

        assert!(result.is_err());
        assert!(!content_path.exists());
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_list_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, Box::new(FixedAnalyzer)).await;
        std::fs::remove_dir_all(dir.path()).unwrap();

        assert!(store.list(&ListFilter::default()).await.unwrap().is_empty());
    }
}

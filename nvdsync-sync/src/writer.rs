//! Record extraction and atomic writes.
//!
//! ## `save_document`
//!
//! 1. Walk the document's records in order.
//! 2. Extract `/cve/CVE_data_meta/ID`; a bad identifier skips the record.
//! 3. Serialize the record with two-space indentation.
//! 4. Compare with the file on disk; skip if byte-identical.
//! 5. Write to `<path>.tmp`, then rename over `<path>`.
//!
//! The first write failure stops the document and is returned to the caller.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use nvdsync_core::{FeedPartition, RecordId, RecordIdError};
use nvdsync_feed::FeedDocument;

use crate::error::{io_err, SyncError};

/// JSON pointer of the identifier inside each record.
pub const RECORD_ID_POINTER: &str = "/cve/CVE_data_meta/ID";

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Why a single record was left out. Never fatal to the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("record has no /cve/CVE_data_meta/ID")]
    MissingId,

    #[error("record /cve/CVE_data_meta/ID is not a string")]
    NotAString,

    #[error(transparent)]
    Malformed(#[from] RecordIdError),
}

/// Pull the identifier out of one record.
pub fn extract_id(record: &Value) -> Result<RecordId, SkipReason> {
    let value = record.pointer(RECORD_ID_POINTER).ok_or(SkipReason::MissingId)?;
    let raw = value.as_str().ok_or(SkipReason::NotAString)?;
    Ok(RecordId::parse(raw)?)
}

/// `<cves_root>/<year>/<ID>.json`. Pure, no I/O.
pub fn record_path(cves_root: &Path, id: &RecordId) -> PathBuf {
    cves_root.join(id.year()).join(id.file_name())
}

/// Stable on-disk form of a record: sorted keys, two-space indent, no
/// trailing newline.
pub fn render_record(record: &Value) -> Result<Vec<u8>, SyncError> {
    Ok(serde_json::to_vec_pretty(record)?)
}

// ---------------------------------------------------------------------------
// Write result
// ---------------------------------------------------------------------------

/// Outcome of an individual record write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// File was written (content changed or did not previously exist).
    Written { path: PathBuf },
    /// File already held exactly this content.
    Unchanged { path: PathBuf },
    /// Dry-run mode: the file *would* have been written.
    WouldWrite { path: PathBuf },
}

/// Per-document tally returned to the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub partition: Option<FeedPartition>,
    pub records: usize,
    pub written: usize,
    pub unchanged: usize,
    pub skipped: usize,
}

impl DocumentSummary {
    fn record(&mut self, result: &WriteResult) {
        match result {
            WriteResult::Written { .. } | WriteResult::WouldWrite { .. } => self.written += 1,
            WriteResult::Unchanged { .. } => self.unchanged += 1,
        }
    }
}

// ---------------------------------------------------------------------------
// atomic_write
// ---------------------------------------------------------------------------

/// Atomically replace `path` with `content`, creating parent directories.
///
/// Returns [`WriteResult::Unchanged`] without touching the file when it
/// already holds `content`.
pub fn atomic_write(path: &Path, content: &[u8], dry_run: bool) -> Result<WriteResult, SyncError> {
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    atomic_write_with_tmp(path, content, dry_run, &path.with_file_name(tmp_name))
}

fn atomic_write_with_tmp(
    path: &Path,
    content: &[u8],
    dry_run: bool,
    tmp: &Path,
) -> Result<WriteResult, SyncError> {
    match std::fs::read(path) {
        Ok(existing) if existing == content => {
            tracing::trace!("unchanged: {}", path.display());
            return Ok(WriteResult::Unchanged {
                path: path.to_path_buf(),
            });
        }
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(io_err(path, e)),
    }

    if dry_run {
        tracing::debug!("[dry-run] would write: {}", path.display());
        return Ok(WriteResult::WouldWrite {
            path: path.to_path_buf(),
        });
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    std::fs::write(tmp, content).map_err(|e| io_err(tmp, e))?;

    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }

    tracing::trace!("wrote: {}", path.display());
    Ok(WriteResult::Written {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// save_document
// ---------------------------------------------------------------------------

/// Write every record of `document` under `cves_root`.
///
/// Records with a bad identifier are logged and counted as skipped. The
/// first write error aborts the remaining records.
pub fn save_document(
    cves_root: &Path,
    partition: Option<FeedPartition>,
    document: &FeedDocument,
    dry_run: bool,
) -> Result<DocumentSummary, SyncError> {
    let mut summary = DocumentSummary {
        partition,
        records: document.items.len(),
        ..DocumentSummary::default()
    };

    for (index, record) in document.items.iter().enumerate() {
        let id = match extract_id(record) {
            Ok(id) => id,
            Err(reason) => {
                tracing::warn!("skipping record #{index}: {reason}");
                summary.skipped += 1;
                continue;
            }
        };
        let content = render_record(record)?;
        let result = atomic_write(&record_path(cves_root, &id), &content, dry_run)?;
        summary.record(&result);
    }

    Ok(summary)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn record(id: &str) -> Value {
        json!({
            "cve": {
                "CVE_data_meta": { "ID": id, "ASSIGNER": "cve@mitre.org" },
                "description": { "description_data": [{ "lang": "en", "value": "x" }] }
            },
            "publishedDate": "2023-01-01T00:00Z"
        })
    }

    #[test]
    fn extract_id_reports_each_skip_reason() {
        assert_eq!(extract_id(&json!({})), Err(SkipReason::MissingId));
        assert_eq!(
            extract_id(&json!({"cve": {"CVE_data_meta": {"ID": 7}}})),
            Err(SkipReason::NotAString)
        );
        assert!(matches!(
            extract_id(&record("CVE-2023")),
            Err(SkipReason::Malformed(RecordIdError::ComponentCount { found: 2, .. }))
        ));
        assert_eq!(extract_id(&record("CVE-2023-1234")).unwrap().year(), "2023");
    }

    #[test]
    fn record_lands_in_year_directory() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("cves");
        let doc = FeedDocument::new(vec![record("CVE-2023-1234")]);
        let summary = save_document(&root, None, &doc, false).unwrap();

        assert_eq!(summary.written, 1);
        let path = root.join("2023").join("CVE-2023-1234.json");
        let back: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(back, record("CVE-2023-1234"));
    }

    #[test]
    fn rendered_record_is_indented_with_sorted_keys() {
        let rendered = render_record(&json!({"b": 1, "a": {"c": true}})).unwrap();
        assert_eq!(
            String::from_utf8(rendered).unwrap(),
            "{\n  \"a\": {\n    \"c\": true\n  },\n  \"b\": 1\n}"
        );
    }

    #[test]
    fn malformed_ids_are_skipped_and_siblings_written() {
        let tmp = TempDir::new().unwrap();
        let doc = FeedDocument::new(vec![
            record("CVE-2023"),
            json!({"no": "id"}),
            record("CVE-2022-0002"),
        ]);
        let summary = save_document(tmp.path(), None, &doc, false).unwrap();
        assert_eq!(summary.records, 3);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.written, 1);
        assert!(tmp.path().join("2022").join("CVE-2022-0002.json").exists());
        assert!(!tmp.path().join("2023").exists());
    }

    #[test]
    fn second_save_same_content_is_unchanged_and_byte_identical() {
        let tmp = TempDir::new().unwrap();
        let doc = FeedDocument::new(vec![record("CVE-2021-0001"), record("CVE-2021-0002")]);
        save_document(tmp.path(), None, &doc, false).unwrap();
        let path = tmp.path().join("2021").join("CVE-2021-0001.json");
        let first = fs::read(&path).unwrap();

        let summary = save_document(tmp.path(), None, &doc, false).unwrap();
        assert_eq!(summary.unchanged, 2);
        assert_eq!(summary.written, 0);
        assert_eq!(fs::read(&path).unwrap(), first);
    }

    #[test]
    fn changed_content_replaces_file_entirely() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("2020").join("CVE-2020-0001.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "x".repeat(10_000)).unwrap();

        let doc = FeedDocument::new(vec![record("CVE-2020-0001")]);
        let summary = save_document(tmp.path(), None, &doc, false).unwrap();
        assert_eq!(summary.written, 1);
        assert_eq!(
            fs::read(&path).unwrap(),
            render_record(&record("CVE-2020-0001")).unwrap()
        );
    }

    #[test]
    fn dry_run_does_not_write_file() {
        let tmp = TempDir::new().unwrap();
        let doc = FeedDocument::new(vec![record("CVE-2019-0001")]);
        let summary = save_document(tmp.path(), None, &doc, true).unwrap();
        assert_eq!(summary.written, 1);
        assert!(!tmp.path().join("2019").exists(), "dry-run must not create files");
    }

    #[test]
    fn tmp_file_removed_after_write() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a").join("CVE-2018-0001.json");
        atomic_write(&path, b"data", false).unwrap();
        assert!(path.exists());
        assert!(!tmp.path().join("a").join("CVE-2018-0001.json.tmp").exists());
    }

    #[test]
    fn write_failure_aborts_remaining_records() {
        let tmp = TempDir::new().unwrap();
        // A regular file where the year directory should be.
        fs::write(tmp.path().join("2017"), "blocker").unwrap();
        let doc = FeedDocument::new(vec![record("CVE-2017-0001"), record("CVE-2016-0001")]);

        let err = save_document(tmp.path(), None, &doc, false).unwrap_err();
        assert!(matches!(err, SyncError::Io { .. }), "got: {err}");
        assert!(
            !tmp.path().join("2016").exists(),
            "records after the failure must not be written"
        );
    }

    #[test]
    #[cfg(unix)]
    fn rename_failure_leaves_original_and_cleans_tmp() {
        use std::os::unix::fs::PermissionsExt;

        let root = TempDir::new().unwrap();
        let readonly_dir = root.path().join("readonly");
        fs::create_dir_all(&readonly_dir).unwrap();

        let path = readonly_dir.join("CVE-2015-0001.json");
        fs::write(&path, "original").unwrap();

        let mut perms = fs::metadata(&readonly_dir).unwrap().permissions();
        perms.set_mode(0o555);
        fs::set_permissions(&readonly_dir, perms).unwrap();

        let tmp_dir = TempDir::new().unwrap();
        let tmp_path = tmp_dir.path().join("CVE-2015-0001.json.tmp");

        let result = atomic_write_with_tmp(&path, b"new content", false, &tmp_path);

        let mut perms = fs::metadata(&readonly_dir).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&readonly_dir, perms).unwrap();

        // Running as root ignores directory permissions; nothing to observe then.
        if result.is_ok() {
            return;
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), "original");
        assert!(!tmp_path.exists(), ".tmp should be cleaned up");
    }
}

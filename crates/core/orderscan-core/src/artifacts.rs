//! Writing summaries and field rows to disk

use crate::fields::StructuredFields;
use crate::outcome::{Stage, StageFailure};
use crate::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Persists analysis artifacts. Every write creates missing parent directories.
pub struct ArtifactWriter;

impl ArtifactWriter {
    /// Write `text` as UTF-8
    pub fn write_summary(path: impl AsRef<Path>, text: &str) -> Result<PathBuf> {
        let path = path.as_ref();
        ensure_parent(path)?;
        fs::write(path, text.as_bytes())?;
        info!("ARTIFACT_WRITTEN kind=summary path={} bytes={}", path.display(), text.len());
        Ok(path.to_path_buf())
    }

    /// Write the CSV header and the single field row
    pub fn write_fields_csv(path: impl AsRef<Path>, fields: &StructuredFields) -> Result<PathBuf> {
        let path = path.as_ref();
        ensure_parent(path)?;
        let file = fs::File::create(path)?;
        fields.write_csv(file)?;
        info!("ARTIFACT_WRITTEN kind=fields_csv path={}", path.display());
        Ok(path.to_path_buf())
    }

    /// Write `text`, reporting an IO error as a saving failure
    pub fn save_text(path: impl AsRef<Path>, text: &str) -> SaveResult {
        let path = path.as_ref();
        saved(path, Self::write_summary(path, text))
    }

    /// Write the field row, reporting an IO error as a saving failure
    pub fn save_fields_csv(path: impl AsRef<Path>, fields: &StructuredFields) -> SaveResult {
        let path = path.as_ref();
        saved(path, Self::write_fields_csv(path, fields))
    }

    /// Status line shown for a save, e.g. `File saved successfully at: out/a.txt`
    pub fn save_status(result: &SaveResult) -> String {
        match result {
            Ok(written) => format!("File saved successfully at: {}", written.display()),
            Err(failure) => failure.to_string(),
        }
    }
}

/// Where an artifact landed, or why it could not be written
pub type SaveResult = std::result::Result<PathBuf, StageFailure>;

fn saved(path: &Path, result: Result<PathBuf>) -> SaveResult {
    result.map_err(|e| {
        let failure = StageFailure::from_error(Stage::Saving, &e);
        warn!("ARTIFACT_WRITE_FAILED path={} reason={}", path.display(), failure.reason);
        failure
    })
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_summary_round_trip_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/summary.txt");
        let text = "Bestellung 4711\r\n\nMenge: 12 Stück\tPreis: 3,50 €\n";

        ArtifactWriter::write_summary(&path, text).unwrap();
        assert_eq!(fs::read(&path).unwrap(), text.as_bytes());
    }

    #[test]
    fn test_fields_csv_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/fields.csv");
        let fields = StructuredFields::parse("CURRENCY: EUR");

        ArtifactWriter::write_fields_csv(&path, &fields).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("Order date,Order number,"));
        assert!(written.contains("EUR"));
    }

    #[test]
    fn test_save_text_status_lines() {
        let dir = TempDir::new().unwrap();
        let ok_path = dir.path().join("a.txt");
        let saved = ArtifactWriter::save_text(&ok_path, "hello");
        assert_eq!(saved.as_ref().unwrap(), &ok_path);
        assert!(ArtifactWriter::save_status(&saved).starts_with("File saved successfully at: "));

        // A regular file where a directory is needed
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        let failed = ArtifactWriter::save_text(blocker.join("b.txt"), "hello");
        assert_eq!(failed.as_ref().unwrap_err().stage, Stage::Saving);
        assert!(ArtifactWriter::save_status(&failed).starts_with("Error saving file: "));
    }

    #[test]
    fn test_save_fields_csv_reports_saving_failure() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();

        let failed = ArtifactWriter::save_fields_csv(blocker.join("f.csv"), &StructuredFields::new());
        let failure = failed.unwrap_err();
        assert_eq!(failure.stage, Stage::Saving);
        assert!(!failure.reason.is_empty());
    }
}

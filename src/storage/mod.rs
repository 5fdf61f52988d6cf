pub mod credentials;
pub mod csv;

use std::fs;
use std::path::{Path, PathBuf};

use crate::article::ContentKind;
use crate::records::PriceRecord;
use crate::utils::error::StorageError;

pub use credentials::{CredentialStore, GoogleCreds};

/// UTC calendar date used in export file names and default titles.
pub fn today_iso() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self { base_dir: base_path })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Writes `hog_prices_<date>.csv`. Returns `None` (and writes nothing) for an empty view.
    pub fn save_csv(&self, records: &[&PriceRecord]) -> Result<Option<PathBuf>, StorageError> {
        let Some(content) = csv::to_csv(records) else {
            return Ok(None);
        };

        let file_path = self.base_dir.join(csv::csv_file_name(&today_iso()));
        fs::write(&file_path, content.as_bytes()).map_err(StorageError::IoError)?;

        tracing::info!("Exported {} records to {}", records.len(), file_path.display());
        Ok(Some(file_path))
    }

    /// Saves the accepted extraction (summary plus records) as JSON next to the CSV exports.
    pub fn save_extraction_snapshot(
        &self,
        summary: Option<&str>,
        records: &[PriceRecord],
        source: ContentKind,
    ) -> Result<PathBuf, StorageError> {
        let file_path = self
            .base_dir
            .join(format!("hog_prices_{}_meta.json", today_iso()));

        let snapshot = serde_json::json!({
            "source": source,
            "price_movement_summary": summary,
            "record_count": records.len(),
            "records": records,
            "extraction_timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let snapshot_str = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(&file_path, snapshot_str).map_err(StorageError::IoError)?;

        tracing::info!("Saved extraction snapshot to {}", file_path.display());
        Ok(file_path)
    }
}

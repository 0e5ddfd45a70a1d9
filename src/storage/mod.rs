// src/storage/mod.rs
use std::fs;
use std::path::{Path, PathBuf};
use crate::extractors::rounding::RoundingTerms;
use crate::utils::error::StorageError;

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path)
                .map_err(StorageError::IoError)?;
        }

        Ok(Self { base_dir: base_path })
    }

    /// Saves the extracted terms, with metadata about their source, as JSON
    pub fn save_terms(&self, document: &Path, terms: &RoundingTerms) -> Result<PathBuf, StorageError> {
        let stem = document
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        let file_path = self.base_dir.join(format!("{}_rounding.json", stem));

        let record = serde_json::json!({
            "document": document.display().to_string(),
            "status": terms.status,
            "terms": terms.terms,
            "extraction_timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let record_str = serde_json::to_string_pretty(&record)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        fs::write(&file_path, record_str)
            .map_err(StorageError::IoError)?;

        tracing::info!("Saved Rounding terms to {}", file_path.display());

        Ok(file_path)
    }
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::rounding::ClauseExtractor;
    use crate::nlp::{LexiconTagger, PosTagger};

    #[test]
    fn test_save_terms_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path().join("out")).unwrap();

        let tokens = LexiconTagger::new()
            .tag("The Delivery Amount and the Return Amount, rounded up, shall each be USD 100.");
        let terms = ClauseExtractor::new().extract(&tokens).unwrap();

        let path = storage.save_terms(Path::new("/data/csa_2019.pdf"), &terms).unwrap();
        assert_eq!(path.file_name().unwrap(), "csa_2019_rounding.json");

        let saved: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["document"], "/data/csa_2019.pdf");
        assert_eq!(saved["status"], "complete");
        assert_eq!(saved["terms"][0]["side"], "delivery");
        assert_eq!(saved["terms"][1]["amount_type"], "Return Amount");
        assert_eq!(saved["terms"][1]["currency"], "USD");
        assert_eq!(saved["terms"][1]["rounding"], "up");
        assert!(saved["extraction_timestamp"].is_string());
    }
}

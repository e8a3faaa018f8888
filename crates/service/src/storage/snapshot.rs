use std::path::{Path, PathBuf};

use models::PriceCategory;
use tokio::fs;

use crate::errors::PriceError;

/// Write-only JSON backup of the last fetched price set.
///
/// Mirrors the category → items structure with two-space indentation. The
/// file is replaced atomically (temp file + rename) so a reader never sees a
/// half-written document. Nothing in this crate reads it back.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    file_path: PathBuf,
}

impl SnapshotWriter {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { file_path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Persist `data`, creating the parent directory if needed.
    pub async fn write(&self, data: &PriceCategory) -> Result<(), PriceError> {
        if let Some(parent) = self.file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(PriceError::local_io)?;
        }
        let bytes = serde_json::to_vec_pretty(data).map_err(PriceError::local_io)?;
        let tmp = self.file_path.with_extension("json.tmp");
        fs::write(&tmp, bytes).await.map_err(PriceError::local_io)?;
        fs::rename(&tmp, &self.file_path).await.map_err(PriceError::local_io)?;
        Ok(())
    }
}

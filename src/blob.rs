//! Storage for employee photos and supporting documents.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Folder for employee photos.
pub const PHOTO_FOLDER: &str = "karyawan";
/// Folder for status supporting documents.
pub const DOCUMENT_FOLDER: &str = "karyawan_docs";

/// An uploaded file as received from the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub trait BlobStore: Send + Sync {
    /// Store `upload` under `folder` and return the relative path to persist.
    /// `None` in, `None` out.
    fn save(&self, upload: Option<&Upload>, folder: &str) -> std::io::Result<Option<String>>;
}

/// Writes files below a root directory, one random name per upload.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Keep a short alphanumeric extension from the original name, if any.
fn safe_extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
    if !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        Some(ext)
    } else {
        None
    }
}

fn safe_folder(folder: &str) -> String {
    folder
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

impl BlobStore for FsBlobStore {
    fn save(&self, upload: Option<&Upload>, folder: &str) -> std::io::Result<Option<String>> {
        let Some(upload) = upload else {
            return Ok(None);
        };
        if upload.bytes.is_empty() {
            return Ok(None);
        }

        let folder = safe_folder(folder);
        let dir = self.root.join(&folder);
        std::fs::create_dir_all(&dir)?;

        let name = match safe_extension(&upload.file_name) {
            Some(ext) => format!("{}.{}", Uuid::new_v4().simple(), ext),
            None => Uuid::new_v4().simple().to_string(),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&upload.bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(dir.join(&name)).map_err(|e| e.error)?;

        log::debug!("Stored {} ({} bytes) as {}/{}", upload.file_name, upload.bytes.len(), folder, name);
        Ok(Some(format!("{}/{}", folder, name)))
    }
}

//! File-system-backed store for uploaded thumbnail images
//!
//! Files are named `{unix_millis}-{random}{ext}` and addressed through
//! `/uploads/{filename}` URLs. Validation is content-based: the image header
//! is decoded to read the actual pixel geometry, so a mislabeled or truncated
//! file is rejected even if its extension looks fine.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct UploadStore {
    dir: PathBuf,
    max_dimension: u32,
}

impl UploadStore {
    /// Create the store, ensuring the upload directory exists
    pub fn new(dir: impl Into<PathBuf>, max_dimension: u32) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create upload directory {}", dir.display()))?;
        Ok(Self { dir, max_dimension })
    }

    /// Write an uploaded file to disk under a generated name. Returns the
    /// stored filename; the caller is responsible for removing it if
    /// validation fails.
    pub fn store(&self, bytes: &[u8], original_name: &str) -> Result<String> {
        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default();

        let filename = format!(
            "{}-{}{}",
            chrono::Utc::now().timestamp_millis(),
            rand::random::<u32>(),
            ext
        );

        let path = self.dir.join(&filename);
        std::fs::write(&path, bytes)
            .with_context(|| format!("Failed to write upload {}", path.display()))?;

        debug!(filename = %filename, bytes = bytes.len(), "Stored upload");
        Ok(filename)
    }

    /// Check the pixel geometry of a stored file. Accepts only when both
    /// dimensions are positive and neither exceeds the configured maximum.
    /// Any decode failure rejects the file.
    pub fn validate(&self, filename: &str) -> bool {
        let path = self.dir.join(filename);
        match image::image_dimensions(&path) {
            Ok((width, height)) => {
                width > 0
                    && height > 0
                    && width <= self.max_dimension
                    && height <= self.max_dimension
            }
            Err(e) => {
                debug!(filename = %filename, error = %e, "Upload failed to decode");
                false
            }
        }
    }

    /// Served path for a stored filename
    pub fn url_for(&self, filename: &str) -> String {
        format!("/uploads/{}", filename)
    }

    /// Delete the file behind an image URL, if any. Only the basename is
    /// used, so a stored URL can never point outside the upload directory.
    pub fn remove(&self, image_url: &str) {
        let Some(filename) = Path::new(image_url).file_name() else {
            return;
        };
        let path = self.dir.join(filename);
        if let Err(e) = std::fs::remove_file(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "Failed to remove upload");
            }
        }
    }

    /// Read a stored file for serving. Returns `None` when it does not exist
    /// or the name tries to escape the upload directory.
    pub fn read(&self, filename: &str) -> Result<Option<Vec<u8>>> {
        if filename.is_empty() || filename.contains('/') || filename.contains("..") {
            return Ok(None);
        }
        let path = self.dir.join(filename);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read upload {}", path.display())),
        }
    }

    /// Whether a file with this name currently exists in the store
    pub fn exists(&self, filename: &str) -> bool {
        self.dir.join(filename).exists()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Content type for a stored image, by extension
pub fn content_type_for(filename: &str) -> &'static str {
    match Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

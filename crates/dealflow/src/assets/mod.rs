//! Asset store — content-addressed upload storage on the local filesystem.
//!
//! Each category maps to a fixed subfolder under the upload directory and
//! carries a static extension allow-list and size ceiling. Storage keys are
//! assigned by the store (`<subfolder>/<uuid>.<ext>`), never derived from the
//! declared filename, so hostile names cannot escape the upload root.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::StorageError;
use crate::submission::{AssetCategory, AssetRef};

/// Per-category upload limits in megabytes.
fn max_size_mb(category: AssetCategory) -> u64 {
    match category {
        AssetCategory::PitchDeck => 50,
        AssetCategory::VideoPitch => 500,
        AssetCategory::AudioPitch => 100,
        AssetCategory::FinancialModel => 10,
        AssetCategory::ProductDemo => 500,
        AssetCategory::FounderUpdate => 20,
        AssetCategory::SupportingDocument => 25,
        AssetCategory::Image => 10,
        AssetCategory::Document => 20,
    }
}

/// Per-category extension allow-list, matched case-insensitively.
fn allowed_extensions(category: AssetCategory) -> &'static [&'static str] {
    match category {
        AssetCategory::PitchDeck => &["pdf", "ppt", "pptx"],
        AssetCategory::VideoPitch => &["mp4", "avi", "mov", "wmv", "webm"],
        AssetCategory::AudioPitch => &["mp3", "wav", "m4a", "aac"],
        AssetCategory::FinancialModel => &["xlsx", "xls", "csv"],
        AssetCategory::ProductDemo => &["mp4", "avi", "mov", "wmv", "webm"],
        AssetCategory::FounderUpdate => &["docx", "doc", "pdf", "txt", "ppt", "pptx"],
        AssetCategory::SupportingDocument => &[
            "pdf", "doc", "docx", "txt", "rtf", "xlsx", "xls", "csv", "ppt", "pptx",
        ],
        AssetCategory::Image => &["jpg", "jpeg", "png", "gif", "webp"],
        AssetCategory::Document => &["pdf", "doc", "docx", "txt", "rtf", "ppt", "pptx"],
    }
}

/// Storage subfolder for a category.
fn subfolder(category: AssetCategory) -> &'static str {
    match category {
        AssetCategory::PitchDeck => "pitch_decks",
        AssetCategory::VideoPitch => "videos",
        AssetCategory::AudioPitch => "audio",
        AssetCategory::FinancialModel => "financials",
        AssetCategory::ProductDemo => "demos",
        AssetCategory::FounderUpdate => "updates",
        AssetCategory::SupportingDocument => "supporting",
        AssetCategory::Image => "images",
        AssetCategory::Document => "documents",
    }
}

/// Filesystem-backed asset store rooted at the configured upload directory.
pub struct AssetStore {
    upload_directory: PathBuf,
}

impl AssetStore {
    pub fn new<P: AsRef<Path>>(upload_directory: P) -> Self {
        Self {
            upload_directory: upload_directory.as_ref().to_path_buf(),
        }
    }

    pub fn upload_directory(&self) -> &Path {
        &self.upload_directory
    }

    /// Validates and stores an uploaded file, returning the reference the
    /// caller attaches to its submission. Rejects disallowed extensions and
    /// oversized content before touching the filesystem.
    pub fn store(
        &self,
        category: AssetCategory,
        declared_name: &str,
        content: &[u8],
    ) -> Result<AssetRef, StorageError> {
        let extension = extract_extension(declared_name).ok_or_else(|| {
            StorageError::DisallowedType {
                category: category.to_string(),
                extension: String::new(),
            }
        })?;
        if !allowed_extensions(category).contains(&extension.as_str()) {
            return Err(StorageError::DisallowedType {
                category: category.to_string(),
                extension,
            });
        }

        let max = max_size_mb(category) * 1024 * 1024;
        if content.len() as u64 > max {
            return Err(StorageError::TooLarge {
                category: category.to_string(),
                size: content.len() as u64,
                max,
            });
        }

        let dir = self.upload_directory.join(subfolder(category));
        ensure_directory(&dir)?;

        let filename = format!("{}.{}", uuid::Uuid::new_v4(), extension);
        let path = dir.join(&filename);

        // create_new gives O_EXCL semantics; a uuid collision surfaces as an
        // error instead of silently overwriting another upload.
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| StorageError::WriteAsset {
                path: path.clone(),
                source: e,
            })?;
        file.write_all(content).map_err(|e| StorageError::WriteAsset {
            path: path.clone(),
            source: e,
        })?;

        let storage_key = format!("{}/{}", subfolder(category), filename);
        let content_type = mime_guess::from_path(declared_name)
            .first_or_octet_stream()
            .to_string();

        log::debug!(
            "Stored {} asset '{}' as {} ({} bytes)",
            category,
            declared_name,
            storage_key,
            content.len()
        );

        Ok(AssetRef {
            category,
            storage_key,
            declared_name: declared_name.to_string(),
            size: content.len() as u64,
            content_type,
            uploaded_at: Utc::now(),
        })
    }

    /// Reads an asset back by its storage key.
    pub fn fetch(&self, storage_key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(storage_key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(e) => Err(StorageError::ReadAsset { path, source: e }),
        }
    }

    /// Removes an asset. Deleting a missing key is a no-op.
    pub fn delete(&self, storage_key: &str) -> Result<(), StorageError> {
        let path = self.resolve(storage_key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::ReadAsset { path, source: e }),
        }
    }

    /// Maps a storage key to an absolute path, rejecting traversal segments.
    fn resolve(&self, storage_key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(storage_key);
        let escapes = relative.components().any(|c| {
            !matches!(c, std::path::Component::Normal(_))
        });
        if escapes || relative.as_os_str().is_empty() {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }
        Ok(self.upload_directory.join(relative))
    }
}

fn ensure_directory(path: &Path) -> Result<(), StorageError> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

fn extract_extension(name: &str) -> Option<String> {
    let dot = name.rfind('.')?;
    let ext = &name[dot + 1..];
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_store_and_fetch() {
        let dir = TempDir::new().unwrap();
        let store = AssetStore::new(dir.path());

        let asset = store
            .store(AssetCategory::PitchDeck, "deck.pdf", b"pdf bytes")
            .unwrap();

        assert!(asset.storage_key.starts_with("pitch_decks/"));
        assert!(asset.storage_key.ends_with(".pdf"));
        assert_eq!(asset.declared_name, "deck.pdf");
        assert_eq!(asset.size, 9);
        assert_eq!(asset.content_type, "application/pdf");

        let bytes = store.fetch(&asset.storage_key).unwrap();
        assert_eq!(bytes, b"pdf bytes");
    }

    #[test]
    fn test_storage_key_is_not_declared_name() {
        let dir = TempDir::new().unwrap();
        let store = AssetStore::new(dir.path());

        let asset = store
            .store(AssetCategory::PitchDeck, "../../etc/passwd.pdf", b"x")
            .unwrap();
        assert!(!asset.storage_key.contains(".."));
        assert!(dir
            .path()
            .join(&asset.storage_key)
            .starts_with(dir.path()));
    }

    #[test]
    fn test_disallowed_extension_rejected() {
        let dir = TempDir::new().unwrap();
        let store = AssetStore::new(dir.path());

        let err = store
            .store(AssetCategory::PitchDeck, "malware.exe", b"x")
            .unwrap_err();
        assert!(matches!(err, StorageError::DisallowedType { .. }));

        let err = store
            .store(AssetCategory::Image, "no_extension", b"x")
            .unwrap_err();
        assert!(matches!(err, StorageError::DisallowedType { .. }));
    }

    #[test]
    fn test_extension_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let store = AssetStore::new(dir.path());

        let asset = store
            .store(AssetCategory::Image, "PHOTO.JPG", b"x")
            .unwrap();
        assert!(asset.storage_key.ends_with(".jpg"));
    }

    #[test]
    fn test_size_limit_enforced() {
        let dir = TempDir::new().unwrap();
        let store = AssetStore::new(dir.path());

        // Financial models cap at 10 MB.
        let oversized = vec![0u8; 10 * 1024 * 1024 + 1];
        let err = store
            .store(AssetCategory::FinancialModel, "model.xlsx", &oversized)
            .unwrap_err();
        assert!(matches!(err, StorageError::TooLarge { .. }));
    }

    #[test]
    fn test_fetch_missing_key() {
        let dir = TempDir::new().unwrap();
        let store = AssetStore::new(dir.path());

        let err = store.fetch("pitch_decks/nope.pdf").unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn test_fetch_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let store = AssetStore::new(dir.path());

        let err = store.fetch("../outside.pdf").unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = AssetStore::new(dir.path());

        let asset = store
            .store(AssetCategory::Document, "notes.txt", b"hello")
            .unwrap();
        store.delete(&asset.storage_key).unwrap();
        assert!(matches!(
            store.fetch(&asset.storage_key),
            Err(StorageError::NotFound(_))
        ));
        // Second delete is fine.
        store.delete(&asset.storage_key).unwrap();
    }

    #[test]
    fn test_unique_keys_for_same_name() {
        let dir = TempDir::new().unwrap();
        let store = AssetStore::new(dir.path());

        let a = store
            .store(AssetCategory::Document, "doc.pdf", b"1")
            .unwrap();
        let b = store
            .store(AssetCategory::Document, "doc.pdf", b"2")
            .unwrap();
        assert_ne!(a.storage_key, b.storage_key);
        assert_eq!(store.fetch(&a.storage_key).unwrap(), b"1");
        assert_eq!(store.fetch(&b.storage_key).unwrap(), b"2");
    }
}

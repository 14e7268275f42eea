// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared upload directory management
//!
//! One directory holds the uploaded source, the segmented image, and both
//! 3D artifacts; names are derived only from the uploaded file's base
//! name. Concurrent uploads with the same name race on the same paths:
//! the policy is last-writer-wins, with no locking and no per-request
//! namespace.

use std::path::{Path, PathBuf};

use tracing::debug;

/// Paths and naming for the shared output directory.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Create the directory if it does not exist yet.
    pub fn ensure_root(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reduce an uploaded name to a bare file name.
    ///
    /// Strips any path components a client smuggled in; an empty result
    /// falls back to `"upload"`.
    pub fn sanitize_filename(name: &str) -> String {
        let cleaned = Path::new(name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
            "upload".to_string()
        } else {
            cleaned
        }
    }

    /// Persist an uploaded file unchanged. Overwrites any previous upload
    /// with the same name (last-writer-wins).
    pub fn save_upload(&self, filename: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
        let path = self.path_for(filename);
        std::fs::write(&path, bytes)?;
        debug!("Saved upload: {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    /// Absolute path of a file in the shared directory.
    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    /// Base name without extension, used to derive artifact names.
    pub fn base_name(filename: &str) -> String {
        Path::new(filename)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename.to_string())
    }

    /// Name of the segmented-image artifact for a source file
    /// (`{base}_segmented.{ext}`, same extension as the source).
    pub fn segmented_filename(filename: &str) -> String {
        let base = Self::base_name(filename);
        match Path::new(filename).extension() {
            Some(ext) => format!("{}_segmented.{}", base, ext.to_string_lossy()),
            None => format!("{}_segmented.png", base),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_path_components() {
        assert_eq!(UploadStore::sanitize_filename("photo.png"), "photo.png");
        assert_eq!(
            UploadStore::sanitize_filename("../../etc/passwd"),
            "passwd"
        );
        assert_eq!(UploadStore::sanitize_filename("a/b/c.jpg"), "c.jpg");
    }

    #[test]
    fn test_sanitize_empty_falls_back() {
        assert_eq!(UploadStore::sanitize_filename(""), "upload");
        assert_eq!(UploadStore::sanitize_filename(".."), "upload");
    }

    #[test]
    fn test_base_name() {
        assert_eq!(UploadStore::base_name("photo.png"), "photo");
        assert_eq!(UploadStore::base_name("archive.tar.gz"), "archive.tar");
        assert_eq!(UploadStore::base_name("noext"), "noext");
    }

    #[test]
    fn test_segmented_filename_keeps_extension() {
        assert_eq!(
            UploadStore::segmented_filename("photo.jpg"),
            "photo_segmented.jpg"
        );
        assert_eq!(
            UploadStore::segmented_filename("scan.png"),
            "scan_segmented.png"
        );
        assert_eq!(
            UploadStore::segmented_filename("noext"),
            "noext_segmented.png"
        );
    }

    #[test]
    fn test_save_upload_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());
        store.ensure_root().unwrap();

        store.save_upload("photo.png", b"first").unwrap();
        let path = store.save_upload("photo.png", b"second").unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"second");
    }

    #[test]
    fn test_ensure_root_creates_nested_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().join("static/uploads"));
        store.ensure_root().unwrap();
        assert!(store.root().is_dir());
    }
}

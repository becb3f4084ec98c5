//! Scratch artifacts: transient on-disk copies of uploaded files.
//!
//! ## Why a temp directory per upload?
//!
//! The extraction libraries want a file-system path — they cannot all
//! stream from a byte buffer. Writing each upload into its own `TempDir`
//! gives the pipeline a path to open while ensuring cleanup happens
//! automatically when the [`ScratchFile`] is dropped, on every exit path
//! including panics. Because the directory is unique per upload, two
//! concurrent requests carrying the same filename can never race on a
//! shared scratch path, while the artifact itself keeps the original
//! filename the extractors dispatch on.

use crate::error::ConvertError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// A scratch artifact that lives exactly as long as one conversion call.
///
/// The backing directory (and the file inside it) is removed when this
/// value is dropped.
pub struct ScratchFile {
    path: PathBuf,
    // Held only for its Drop impl, which removes the directory.
    _dir: TempDir,
}

impl ScratchFile {
    /// Write `bytes` to a fresh scratch location under `root`, named by
    /// the original `filename`.
    ///
    /// `root = None` uses the system temp directory. The filename is
    /// reduced to its final path component so a crafted name cannot
    /// escape the scratch directory.
    pub async fn write(
        root: Option<&Path>,
        filename: &str,
        bytes: &[u8],
    ) -> Result<Self, ConvertError> {
        let dir = match root {
            Some(root) => TempDir::with_prefix_in("docmill-", root),
            None => TempDir::with_prefix("docmill-"),
        }
        .map_err(|e| ConvertError::ScratchIo {
            path: root.map(Path::to_path_buf).unwrap_or_else(std::env::temp_dir),
            source: e,
        })?;

        let path = dir.path().join(sanitize_filename(filename));
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| ConvertError::ScratchIo {
                path: path.clone(),
                source: e,
            })?;

        debug!("Wrote scratch artifact: {}", path.display());
        Ok(Self { path, _dir: dir })
    }

    /// Path of the scratch artifact, valid until this value is dropped.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Reduce a client-supplied filename to a safe final path component.
fn sanitize_filename(filename: &str) -> String {
    Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty() && *n != "." && *n != "..")
        .unwrap_or("upload.bin")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn artifact_exists_while_held_and_is_removed_on_drop() {
        let scratch = ScratchFile::write(None, "notes.txt", b"hello")
            .await
            .unwrap();
        let path = scratch.path().to_path_buf();
        let dir = path.parent().unwrap().to_path_buf();

        assert!(path.exists());
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");

        drop(scratch);
        assert!(!path.exists());
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn same_filename_gets_distinct_paths() {
        let root = tempfile::tempdir().unwrap();
        let a = ScratchFile::write(Some(root.path()), "report.pdf", b"a")
            .await
            .unwrap();
        let b = ScratchFile::write(Some(root.path()), "report.pdf", b"b")
            .await
            .unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[tokio::test]
    async fn artifact_is_created_under_the_given_root() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchFile::write(Some(root.path()), "doc.md", b"# hi")
            .await
            .unwrap();
        assert!(scratch.path().starts_with(root.path()));
    }

    #[test]
    fn sanitize_strips_directory_components() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("plain.txt"), "plain.txt");
        assert_eq!(sanitize_filename(""), "upload.bin");
        assert_eq!(sanitize_filename(".."), "upload.bin");
    }
}

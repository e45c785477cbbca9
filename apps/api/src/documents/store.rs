//! Local filesystem store for the CV, cover letters and other documents.
//!
//! Layout under the upload root:
//!   cv.<pdf|doc|docx>
//!   cover_letters/<name>
//!   other_docs/<name>
//!
//! No locking: two uploads with the same name race and the last write wins.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

const CV_STEM: &str = "cv";
pub const CV_EXTENSIONS: &[&str] = &["pdf", "doc", "docx"];
pub const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "txt"];

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid filename '{0}'")]
    InvalidFilename(String),

    #[error("Invalid file type '{extension}'. Allowed: {allowed}")]
    UnsupportedExtension { extension: String, allowed: String },

    #[error("No CV uploaded yet")]
    MissingCv,

    #[error("File '{0}' not found")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    CoverLetter,
    Other,
}

impl DocumentKind {
    /// `cover_letter` (or `cover_letters`) selects cover letters; anything else is "other".
    pub fn from_segment(segment: &str) -> Self {
        match segment {
            "cover_letter" | "cover_letters" => DocumentKind::CoverLetter,
            _ => DocumentKind::Other,
        }
    }

    fn dir_name(&self) -> &'static str {
        match self {
            DocumentKind::CoverLetter => "cover_letters",
            DocumentKind::Other => "other_docs",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    pub filename: String,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn ensure_dirs(&self) -> Result<(), StorageError> {
        for kind in [DocumentKind::CoverLetter, DocumentKind::Other] {
            fs::create_dir_all(self.root.join(kind.dir_name())).await?;
        }
        info!("Document store ready at {}", self.root.display());
        Ok(())
    }

    /// Saves the CV as `cv.<ext>`, taking the extension from `original_name`,
    /// and removes any CV stored under another extension.
    pub async fn save_cv(&self, original_name: &str, bytes: &[u8]) -> Result<StoredFile, StorageError> {
        let extension = allowed_extension(original_name, CV_EXTENSIONS)?;
        fs::create_dir_all(&self.root).await?;

        for other in CV_EXTENSIONS.iter().filter(|e| **e != extension) {
            remove_if_exists(&self.root.join(format!("{CV_STEM}.{other}"))).await?;
        }

        let filename = format!("{CV_STEM}.{extension}");
        let path = self.root.join(&filename);
        fs::write(&path, bytes).await?;
        info!("Saved CV as {}", path.display());
        stored_file(&path, filename).await
    }

    /// Path of the current CV, whichever extension it was saved with.
    pub async fn find_cv(&self) -> Result<PathBuf, StorageError> {
        for extension in CV_EXTENSIONS {
            let path = self.root.join(format!("{CV_STEM}.{extension}"));
            if fs::try_exists(&path).await? {
                return Ok(path);
            }
        }
        Err(StorageError::MissingCv)
    }

    pub async fn read_cv(&self) -> Result<(String, Vec<u8>), StorageError> {
        let path = self.find_cv().await?;
        let filename = file_name(&path);
        Ok((filename, fs::read(&path).await?))
    }

    pub async fn save_document(
        &self,
        kind: DocumentKind,
        filename: &str,
        bytes: &[u8],
    ) -> Result<StoredFile, StorageError> {
        let filename = validate_filename(filename)?;
        allowed_extension(filename, DOCUMENT_EXTENSIONS)?;

        let dir = self.root.join(kind.dir_name());
        fs::create_dir_all(&dir).await?;
        let path = dir.join(filename);
        fs::write(&path, bytes).await?;
        debug!("Saved {} ({} bytes)", path.display(), bytes.len());
        stored_file(&path, filename.to_string()).await
    }

    /// Sorted by filename. A missing directory is an empty listing.
    pub async fn list_documents(&self, kind: DocumentKind) -> Result<Vec<StoredFile>, StorageError> {
        let dir = self.root.join(kind.dir_name());
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let path = entry.path();
            let filename = file_name(&path);
            files.push(stored_file(&path, filename).await?);
        }
        files.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(files)
    }

    pub async fn read_document(&self, kind: DocumentKind, filename: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.document_path(kind, filename)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(filename.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete_document(&self, kind: DocumentKind, filename: &str) -> Result<(), StorageError> {
        let path = self.document_path(kind, filename)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(filename.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    fn document_path(&self, kind: DocumentKind, filename: &str) -> Result<PathBuf, StorageError> {
        let filename = validate_filename(filename)?;
        Ok(self.root.join(kind.dir_name()).join(filename))
    }
}

/// Rejects names that could escape the target directory.
fn validate_filename(name: &str) -> Result<&str, StorageError> {
    let trimmed = name.trim();
    let invalid = trimmed.is_empty()
        || trimmed.contains(['/', '\\', '\0'])
        || trimmed.contains("..")
        || trimmed.starts_with('.');
    if invalid {
        return Err(StorageError::InvalidFilename(name.to_string()));
    }
    Ok(trimmed)
}

/// Lower-cased extension of `name`, if it is in `allowed`.
fn allowed_extension(name: &str, allowed: &[&str]) -> Result<String, StorageError> {
    let extension = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    if allowed.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(StorageError::UnsupportedExtension {
            extension,
            allowed: allowed.join(", "),
        })
    }
}

/// MIME type used when serving a stored file back.
pub fn content_type_for(filename: &str) -> &'static str {
    match Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .as_deref()
    {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

async fn stored_file(path: &Path, filename: String) -> Result<StoredFile, StorageError> {
    let metadata = fs::metadata(path).await?;
    Ok(StoredFile {
        filename,
        size: metadata.len(),
        modified: metadata.modified().ok().map(DateTime::<Utc>::from),
    })
}

async fn remove_if_exists(path: &Path) -> Result<(), StorageError> {
    match fs::remove_file(path).await {
        Ok(()) => {
            debug!("Removed previous {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, DocumentStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn test_missing_cv_is_reported() {
        let (_dir, store) = store();
        assert!(matches!(store.find_cv().await, Err(StorageError::MissingCv)));
    }

    #[tokio::test]
    async fn test_saving_cv_replaces_other_extensions() {
        let (dir, store) = store();
        store.save_cv("My Resume.PDF", b"pdf bytes").await.unwrap();
        assert!(dir.path().join("cv.pdf").exists());

        let saved = store.save_cv("resume.docx", b"docx bytes").await.unwrap();
        assert_eq!(saved.filename, "cv.docx");
        assert_eq!(saved.size, 10);
        assert!(!dir.path().join("cv.pdf").exists());

        let (name, bytes) = store.read_cv().await.unwrap();
        assert_eq!(name, "cv.docx");
        assert_eq!(bytes, b"docx bytes");
    }

    #[tokio::test]
    async fn test_cv_rejects_unsupported_extension() {
        let (_dir, store) = store();
        let err = store.save_cv("resume.txt", b"x").await.unwrap_err();
        assert!(matches!(err, StorageError::UnsupportedExtension { .. }));
    }

    #[tokio::test]
    async fn test_document_lifecycle() {
        let (_dir, store) = store();
        store
            .save_document(DocumentKind::CoverLetter, "acme.txt", b"Dear ACME")
            .await
            .unwrap();
        store
            .save_document(DocumentKind::CoverLetter, "globex.pdf", b"%PDF")
            .await
            .unwrap();

        let listed = store.list_documents(DocumentKind::CoverLetter).await.unwrap();
        let names: Vec<_> = listed.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["acme.txt", "globex.pdf"]);
        assert!(store.list_documents(DocumentKind::Other).await.unwrap().is_empty());

        let bytes = store
            .read_document(DocumentKind::CoverLetter, "acme.txt")
            .await
            .unwrap();
        assert_eq!(bytes, b"Dear ACME");

        store
            .delete_document(DocumentKind::CoverLetter, "acme.txt")
            .await
            .unwrap();
        let err = store
            .read_document(DocumentKind::CoverLetter, "acme.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_path_traversal_is_rejected() {
        let (_dir, store) = store();
        for name in ["../secret.txt", "a/b.txt", "..\\x.txt", "", ".hidden.txt"] {
            let err = store
                .save_document(DocumentKind::Other, name, b"x")
                .await
                .unwrap_err();
            assert!(matches!(err, StorageError::InvalidFilename(_)), "{name}");
        }
        let err = store
            .delete_document(DocumentKind::Other, "../cv.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidFilename(_)));
    }

    #[test]
    fn test_kind_from_segment() {
        assert_eq!(DocumentKind::from_segment("cover_letter"), DocumentKind::CoverLetter);
        assert_eq!(DocumentKind::from_segment("anything"), DocumentKind::Other);
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("cv.PDF"), "application/pdf");
        assert_eq!(content_type_for("notes"), "application/octet-stream");
    }
}

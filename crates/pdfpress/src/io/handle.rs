//! Ingested document handles.
//!
//! A [`DocumentHandle`] is what the pipeline knows about one uploaded file:
//! its display name, where its bytes live, and the size the uploader
//! declared. Handles are immutable; repair produces a new handle instead of
//! rewriting an existing one.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where the bytes of a document live.
#[derive(Clone)]
pub enum DocumentSource {
    /// Bytes held in memory (an upload, or the output of a repair).
    Memory(Arc<[u8]>),
    /// A file on disk, read again every time the content is needed.
    File(PathBuf),
}

impl fmt::Debug for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory(bytes) => write!(f, "Memory({} bytes)", bytes.len()),
            Self::File(path) => write!(f, "File({})", path.display()),
        }
    }
}

/// An ingested document: name, content reference and declared size.
#[derive(Debug, Clone)]
pub struct DocumentHandle {
    name: String,
    source: DocumentSource,
    declared_size: u64,
}

impl DocumentHandle {
    /// Create a handle from its parts.
    pub fn new(name: impl Into<String>, source: DocumentSource, declared_size: u64) -> Self {
        Self {
            name: name.into(),
            source,
            declared_size,
        }
    }

    /// Create a handle over in-memory bytes; the declared size is their length.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        let declared_size = bytes.len() as u64;
        Self::new(name, DocumentSource::Memory(bytes.into()), declared_size)
    }

    /// Create a handle referencing a file on disk.
    ///
    /// The display name is the file name and the declared size is taken from
    /// the file's metadata at ingestion time.
    ///
    /// # Errors
    ///
    /// Returns an error if the file metadata cannot be read.
    pub async fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Not a file: {}", path.display()),
            ));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self::new(
            name,
            DocumentSource::File(path.to_path_buf()),
            metadata.len(),
        ))
    }

    /// Display name of the document.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where the content lives.
    pub fn source(&self) -> &DocumentSource {
        &self.source
    }

    /// Size in bytes as declared at ingestion.
    pub fn declared_size(&self) -> u64 {
        self.declared_size
    }

    /// Read the full content.
    ///
    /// In-memory content is shared, file content is read from disk on every
    /// call so a file that disappeared since ingestion is reported here.
    ///
    /// # Errors
    ///
    /// Returns an error if a file-backed source cannot be read.
    pub async fn read(&self) -> io::Result<Arc<[u8]>> {
        match &self.source {
            DocumentSource::Memory(bytes) => Ok(Arc::clone(bytes)),
            DocumentSource::File(path) => Ok(tokio::fs::read(path).await?.into()),
        }
    }
}

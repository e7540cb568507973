//! File attachments.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// An attachment: display filename plus raw content held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    filename: String,
    content: Vec<u8>,
}

impl Attachment {
    /// Creates an attachment from in-memory bytes.
    #[must_use]
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }

    /// Reads a file fully into memory.
    ///
    /// The display filename is the final component of `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceNotFound`] if the file cannot be read.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read(path).map_err(|source| Error::ResourceNotFound {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            filename: base_name(path),
            content,
        })
    }

    /// Returns the display filename.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Returns the raw content.
    #[must_use]
    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

/// Where an attachment comes from: a file still to be read, or bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentSource {
    /// Read from disk when the message is built.
    Path(PathBuf),
    /// Already in memory.
    Memory(Attachment),
}

impl AttachmentSource {
    /// Loads the attachment, reading the file if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceNotFound`] if a path cannot be read.
    pub fn load(&self) -> Result<Attachment> {
        match self {
            Self::Path(path) => Attachment::from_file(path),
            Self::Memory(attachment) => Ok(attachment.clone()),
        }
    }
}

impl From<Attachment> for AttachmentSource {
    fn from(attachment: Attachment) -> Self {
        Self::Memory(attachment)
    }
}

impl From<PathBuf> for AttachmentSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&PathBuf> for AttachmentSource {
    fn from(path: &PathBuf) -> Self {
        Self::Path(path.clone())
    }
}

impl From<&Path> for AttachmentSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<&str> for AttachmentSource {
    fn from(path: &str) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

impl From<String> for AttachmentSource {
    fn from(path: String) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

/// Strips the directory portion of a path.
fn base_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.to_string_lossy().into_owned(),
        |name| name.to_string_lossy().into_owned(),
    )
}

//! Encoded output and the file sink that persists it.

use async_trait::async_trait;
use tagreel_common::error::TagreelResult;

/// Bytes produced by a recorder, before a name is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedMedia {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl RecordedMedia {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Attach the suggested filename.
    pub fn into_blob(self, filename: impl Into<String>) -> EncodedBlob {
        EncodedBlob {
            bytes: self.bytes,
            mime_type: self.mime_type,
            filename: filename.into(),
        }
    }
}

/// A finished export: bytes, declared MIME type, and suggested filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBlob {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub filename: String,
}

/// Destination for finished exports (download, directory, upload...).
#[async_trait]
pub trait FileSink: Send {
    /// Persist a finished blob under its suggested filename.
    async fn persist(&mut self, blob: EncodedBlob) -> TagreelResult<()>;
}

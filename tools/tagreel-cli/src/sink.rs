//! File sink writing exports below an output directory.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tagreel_common::error::{TagreelError, TagreelResult};
use tagreel_media_core::{EncodedBlob, FileSink};

/// Writes each blob to `root/<filename>`, creating folders in the name.
pub struct DirectorySink {
    root: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            written: Vec::new(),
        }
    }

    /// Paths written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn target(&self, filename: &str) -> TagreelResult<PathBuf> {
        let relative = Path::new(filename);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if filename.is_empty() || escapes {
            return Err(TagreelError::export(format!(
                "Refusing to write outside the output directory: {filename}"
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FileSink for DirectorySink {
    async fn persist(&mut self, blob: EncodedBlob) -> TagreelResult<()> {
        let path = self.target(&blob.filename)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &blob.bytes).await?;
        tracing::info!(
            path = %path.display(),
            bytes = blob.bytes.len(),
            mime_type = %blob.mime_type,
            "Export written"
        );
        self.written.push(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(filename: &str) -> EncodedBlob {
        EncodedBlob {
            bytes: b"data".to_vec(),
            mime_type: "video/webm".to_string(),
            filename: filename.to_string(),
        }
    }

    #[tokio::test]
    async fn test_writes_nested_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::new(dir.path());

        sink.persist(blob("MatchA/clips/clip_1_Scoring_Goal_00:10.webm"))
            .await
            .unwrap();

        let path = dir
            .path()
            .join("MatchA/clips/clip_1_Scoring_Goal_00:10.webm");
        assert_eq!(std::fs::read(&path).unwrap(), b"data");
        assert_eq!(sink.written(), &[path]);
    }

    #[tokio::test]
    async fn test_rejects_escaping_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::new(dir.path());
        assert!(sink.persist(blob("../outside.webm")).await.is_err());
        assert!(sink.persist(blob("/tmp/abs.webm")).await.is_err());
        assert!(sink.written().is_empty());
    }
}

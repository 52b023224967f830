//! Clip recorder.
//!
//! Wraps a [`CaptureBackend`] and owns the single encoder slot: at most one
//! [`RecorderHandle`] may be open per recorder. Encoded chunks are pushed by
//! the backend through a [`ChunkSink`] and concatenated in capture order when
//! the handle is stopped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tagreel_common::error::{TagreelError, TagreelResult};
use tagreel_media_core::{MediaStream, RecordedMedia};
use tagreel_tag_model::EncodingConfig;
use tokio::sync::mpsc;

/// Encoder parameters handed to a backend. `None` fields mean "backend
/// default".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncoderOptions {
    pub mime_type: Option<String>,
    pub bitrate_bps: Option<u64>,
}

impl EncoderOptions {
    /// Options exactly as requested by the job.
    pub fn requested(config: &EncodingConfig) -> Self {
        Self {
            mime_type: Some(config.mime_type.clone()),
            bitrate_bps: Some(config.target_bitrate_bps),
        }
    }

    /// Let the backend choose everything.
    pub fn backend_default() -> Self {
        Self::default()
    }
}

/// Where a backend delivers encoded bytes. Order of `push` calls is the
/// order of the final output.
#[derive(Debug, Clone)]
pub struct ChunkSink {
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl ChunkSink {
    /// Append a chunk. Returns `false` once the owning handle is gone.
    pub fn push(&self, bytes: Vec<u8>) -> bool {
        if bytes.is_empty() {
            return true;
        }
        self.tx.send(bytes).is_ok()
    }
}

/// A running encoder opened by a backend.
#[async_trait]
pub trait EncoderSession: Send {
    /// Stop capturing and flush. Every chunk must have been pushed to the
    /// session's [`ChunkSink`] by the time this resolves.
    async fn stop(&mut self) -> TagreelResult<()>;
}

/// Something that can encode a live media stream.
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Backend name.
    fn name(&self) -> &str;

    /// Whether the backend can produce the given MIME type.
    fn is_mime_supported(&self, mime_type: &str) -> bool;

    /// Start encoding `stream`. Returns [`TagreelError::Unsupported`] when
    /// the requested options cannot be honoured.
    async fn open(
        &self,
        stream: MediaStream,
        options: &EncoderOptions,
        chunks: ChunkSink,
    ) -> TagreelResult<Box<dyn EncoderSession>>;
}

/// The one encoder slot of a process.
pub struct ClipRecorder {
    backend: Arc<dyn CaptureBackend>,
    slot: Arc<AtomicBool>,
}

impl ClipRecorder {
    pub fn new(backend: Arc<dyn CaptureBackend>) -> Self {
        Self {
            backend,
            slot: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Whether a handle is currently open.
    pub fn is_recording(&self) -> bool {
        self.slot.load(Ordering::Acquire)
    }

    /// Start capturing `stream`.
    ///
    /// Fails immediately if another handle is open. If the backend rejects
    /// the requested MIME type the recorder falls back to the backend's
    /// default encoding and logs a warning.
    pub async fn start(
        &self,
        stream: MediaStream,
        config: &EncodingConfig,
    ) -> TagreelResult<RecorderHandle> {
        let slot = RecorderSlot::claim(&self.slot)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let label = stream.label().to_string();

        let mut used_fallback = false;
        let session = if self.backend.is_mime_supported(&config.mime_type) {
            let requested = EncoderOptions::requested(config);
            match self
                .backend
                .open(stream.clone(), &requested, ChunkSink { tx: tx.clone() })
                .await
            {
                Ok(session) => session,
                Err(TagreelError::Unsupported { message }) => {
                    tracing::warn!(
                        backend = self.backend.name(),
                        mime_type = %config.mime_type,
                        reason = %message,
                        "Could not create recorder with requested mime type. Falling back to default."
                    );
                    used_fallback = true;
                    self.open_default(stream, tx).await?
                }
                Err(e) => return Err(e),
            }
        } else {
            tracing::warn!(
                backend = self.backend.name(),
                mime_type = %config.mime_type,
                "Mime type not supported by backend. Falling back to default."
            );
            used_fallback = true;
            self.open_default(stream, tx).await?
        };

        tracing::info!(
            backend = self.backend.name(),
            stream = %label,
            mime_type = %config.mime_type,
            bitrate_bps = config.target_bitrate_bps,
            used_fallback,
            "Recorder started"
        );

        Ok(RecorderHandle {
            session: Some(session),
            chunks: rx,
            mime_type: config.mime_type.clone(),
            used_fallback,
            started: Instant::now(),
            _slot: slot,
        })
    }

    async fn open_default(
        &self,
        stream: MediaStream,
        tx: mpsc::UnboundedSender<Vec<u8>>,
    ) -> TagreelResult<Box<dyn EncoderSession>> {
        self.backend
            .open(stream, &EncoderOptions::backend_default(), ChunkSink { tx })
            .await
    }
}

/// An open capture. Call [`stop`](Self::stop) to get the encoded bytes;
/// dropping the handle instead discards the capture and frees the slot.
pub struct RecorderHandle {
    session: Option<Box<dyn EncoderSession>>,
    chunks: mpsc::UnboundedReceiver<Vec<u8>>,
    mime_type: String,
    used_fallback: bool,
    started: Instant,
    _slot: RecorderSlot,
}

impl RecorderHandle {
    /// MIME type the output will be tagged with.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Whether the backend default encoding replaced the requested one.
    pub fn used_fallback(&self) -> bool {
        self.used_fallback
    }

    /// Stop capture and return every chunk concatenated in capture order.
    pub async fn stop(mut self) -> TagreelResult<RecordedMedia> {
        let mut session = self
            .session
            .take()
            .ok_or_else(|| TagreelError::recorder("Recorder already stopped"))?;
        session.stop().await?;
        drop(session);

        let mut bytes = Vec::new();
        let mut chunk_count = 0usize;
        while let Ok(chunk) = self.chunks.try_recv() {
            bytes.extend_from_slice(&chunk);
            chunk_count += 1;
        }

        tracing::info!(
            chunks = chunk_count,
            bytes = bytes.len(),
            elapsed_secs = self.started.elapsed().as_secs_f64(),
            "Recorder stopped"
        );

        Ok(RecordedMedia {
            bytes,
            mime_type: std::mem::take(&mut self.mime_type),
        })
    }
}

impl Drop for RecorderHandle {
    fn drop(&mut self) {
        if self.session.is_some() {
            tracing::warn!("Recorder dropped while capturing; discarding encoded data");
        }
    }
}

/// Claim on the recorder's slot, released on drop.
struct RecorderSlot {
    busy: Arc<AtomicBool>,
}

impl RecorderSlot {
    fn claim(busy: &Arc<AtomicBool>) -> TagreelResult<Self> {
        busy.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| TagreelError::recorder("A recorder is already capturing"))?;
        Ok(Self { busy: busy.clone() })
    }
}

impl Drop for RecorderSlot {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

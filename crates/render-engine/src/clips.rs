//! Clip exporter: one recording per selected event, taken straight from the
//! playback surface.

use std::sync::Arc;
use std::time::Duration;

use tagreel_capture_engine::{seek_to, ClipRecorder};
use tagreel_common::config::PipelineTimings;
use tagreel_common::error::{TagreelError, TagreelResult};
use tagreel_common::{dwell, CancellationToken, JobClock, JobLock};
use tagreel_media_core::{FileSink, PlaybackSurface, RecordedMedia};
use tagreel_tag_model::{plan_clips, ClipWindow, EncodingConfig};

use crate::finalizer::{
    clip_filename, deliver, derive_filename, quick_clip_filename, ExportKind,
};
use crate::montage::{ensure_video, percent, restore_cursor, ExportReport, MontageRequest};

/// Length of a quick clip around the cursor.
pub const QUICK_CLIP_SECS: f64 = 4.0;

/// Callback receiving batch progress in percent.
pub type PercentCallback = Box<dyn Fn(u8) + Send + Sync>;

/// Exports each selected event as its own clip.
pub struct ClipExporter {
    recorder: Arc<ClipRecorder>,
    lock: JobLock,
    timings: PipelineTimings,
    progress: Option<PercentCallback>,
}

impl ClipExporter {
    pub fn new(recorder: Arc<ClipRecorder>, lock: JobLock, timings: PipelineTimings) -> Self {
        Self {
            recorder,
            lock,
            timings,
            progress: None,
        }
    }

    pub fn with_progress(mut self, callback: PercentCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    fn emit(&self, percent: u8) {
        if let Some(cb) = &self.progress {
            cb(percent);
        }
    }

    /// Record every selected event and deliver one blob per clip, named
    /// with its 1-based position. Stops at the first failing clip.
    pub async fn run(
        &self,
        request: &MontageRequest,
        playback: &mut dyn PlaybackSurface,
        sink: &mut dyn FileSink,
        cancel: &CancellationToken,
    ) -> TagreelResult<ExportReport> {
        ensure_video(playback)?;
        let selected = request.selected_events();
        if selected.is_empty() {
            return Err(TagreelError::validation("No clips match the current filters"));
        }

        let _guard = self.lock.try_acquire("clips")?;
        let saved_cursor = playback.current_time();
        let clock = JobClock::start();
        let clips = plan_clips(&selected, playback.duration(), self.timings.pad_secs);
        let batch = derive_filename(
            &request.dataset_name,
            &request.criteria,
            request.encoding.extension(),
            ExportKind::ClipBatch,
        );
        tracing::info!(
            dataset = %request.dataset_name,
            batch = %batch,
            clips = clips.len(),
            started_at = clock.epoch_wall(),
            "Clip export started"
        );

        let mut report = ExportReport {
            filenames: Vec::with_capacity(clips.len()),
            clip_count: clips.len(),
            total_bytes: 0,
            elapsed_secs: 0.0,
        };

        let mut result = Ok(());
        for clip in &clips {
            self.emit(percent(clip.index, clips.len()));
            tracing::info!(
                clip = clip.index,
                start = clip.window.start,
                end = clip.window.end,
                "Recording clip"
            );
            let recorded = self
                .capture_window(playback, clip.window, &request.encoding, cancel)
                .await;
            let media = match recorded {
                Ok(media) => media,
                Err(e) => {
                    result = Err(e);
                    break;
                }
            };
            let filename = clip_filename(
                &request.dataset_name,
                clip.index + 1,
                &clip.event,
                request.encoding.extension(),
            );
            match deliver(sink, media, &filename).await {
                Ok(blob) => {
                    report.total_bytes += blob.bytes.len();
                    report.filenames.push(blob.filename);
                }
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }

        restore_cursor(playback, saved_cursor, &self.timings).await;
        self.emit(0);

        match result {
            Ok(()) => {
                report.elapsed_secs = clock.elapsed_secs();
                tracing::info!(
                    clips = report.filenames.len(),
                    elapsed_secs = report.elapsed_secs,
                    "Clip export complete"
                );
                Ok(report)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    delivered = report.filenames.len(),
                    "Clip export stopped"
                );
                Err(e)
            }
        }
    }

    /// Record a short clip centred on the current cursor.
    pub async fn run_at_cursor(
        &self,
        dataset_name: &str,
        encoding: &EncodingConfig,
        playback: &mut dyn PlaybackSurface,
        sink: &mut dyn FileSink,
        cancel: &CancellationToken,
    ) -> TagreelResult<ExportReport> {
        ensure_video(playback)?;
        let _guard = self.lock.try_acquire("quick clip")?;
        let clock = JobClock::start();
        let center = playback.current_time();
        let duration = playback.duration();
        let start = (center - QUICK_CLIP_SECS / 2.0).clamp(0.0, duration);
        let window = ClipWindow {
            start,
            end: (start + QUICK_CLIP_SECS).min(duration),
        };

        let recorded = self
            .capture_window(playback, window, encoding, cancel)
            .await;
        let delivered = match recorded {
            Ok(media) => {
                let filename = quick_clip_filename(dataset_name, center, encoding.extension());
                deliver(sink, media, &filename).await
            }
            Err(e) => Err(e),
        };
        restore_cursor(playback, center, &self.timings).await;

        let blob = delivered?;
        Ok(ExportReport {
            total_bytes: blob.bytes.len(),
            filenames: vec![blob.filename],
            clip_count: 1,
            elapsed_secs: clock.elapsed_secs(),
        })
    }

    /// Seek, play through `window` while recording the playback stream,
    /// pause, and return the encoded bytes.
    async fn capture_window(
        &self,
        playback: &mut dyn PlaybackSurface,
        window: ClipWindow,
        encoding: &EncodingConfig,
        cancel: &CancellationToken,
    ) -> TagreelResult<RecordedMedia> {
        seek_to(playback, window.start, self.timings.seek_timeout(), cancel).await?;
        let handle = self
            .recorder
            .start(playback.capture_stream(), encoding)
            .await?;

        playback.play()?;
        let span = Duration::from_secs_f64(window.duration().max(0.0));
        let waited = dwell(span, cancel).await;
        playback.pause()?;
        waited?;

        let media = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TagreelError::Cancelled),
            media = handle.stop() => media?,
        };
        if media.is_empty() {
            return Err(TagreelError::export("Recorder produced no data"));
        }
        Ok(media)
    }
}

//! Montage orchestrator.
//!
//! Sequences seek, title card, live capture and transition for every
//! selected clip into a single recording of the canvas, then closes with an
//! end card:
//!
//! ```text
//! Idle ─▶ Seeking(i) ─▶ TitleCard(i) ─▶ LiveCapture(i) ─▶ Transition(i) ─┐
//!            ▲                                                           │
//!            └──────────────────────── i + 1 < N ◀───────────────────────┘
//!                                          │ i + 1 == N
//!                                          ▼
//!                          EndCard ─▶ Finalizing ─▶ Done
//! ```
//!
//! Any failure or cancellation ends in `Aborted` after the same cleanup:
//! the recorder is discarded, playback paused, canvas alpha reset and the
//! playback cursor restored.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tagreel_capture_engine::{seek_to, ClipRecorder};
use tagreel_common::config::PipelineTimings;
use tagreel_common::error::{TagreelError, TagreelResult};
use tagreel_common::{dwell, CancellationToken, FrameClock, JobClock, JobLock};
use tagreel_media_core::{DrawSurface, FileSink, PlaybackSurface};
use tagreel_tag_model::{
    plan_clips, EncodingConfig, FilterCriteria, TagDocument, TaggedEvent, TeamNames,
};

use crate::compositor::{EndCard, FrameCompositor, TitleCard};
use crate::finalizer::{deliver, derive_filename, ExportKind};

/// Where a montage job currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MontageState {
    Idle,
    Seeking(usize),
    TitleCard(usize),
    LiveCapture(usize),
    Transition(usize),
    EndCard,
    Finalizing,
    Done,
    Aborted,
}

impl fmt::Display for MontageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Seeking(i) => write!(f, "seeking clip {}", i + 1),
            Self::TitleCard(i) => write!(f, "title card {}", i + 1),
            Self::LiveCapture(i) => write!(f, "capturing clip {}", i + 1),
            Self::Transition(i) => write!(f, "transition after clip {}", i + 1),
            Self::EndCard => write!(f, "end card"),
            Self::Finalizing => write!(f, "finalizing"),
            Self::Done => write!(f, "done"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

/// Progress update emitted on every state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MontageProgress {
    pub state: MontageState,
    /// 0-100.
    pub percent: u8,
}

/// Callback receiving job progress.
pub type ProgressCallback = Box<dyn Fn(MontageProgress) + Send + Sync>;

/// Everything a montage or clip batch needs besides the surfaces.
#[derive(Debug, Clone)]
pub struct MontageRequest {
    pub events: Vec<TaggedEvent>,
    pub criteria: FilterCriteria,
    pub teams: TeamNames,
    pub dataset_name: String,
    pub encoding: EncodingConfig,
}

impl MontageRequest {
    pub fn from_document(
        document: &TagDocument,
        criteria: FilterCriteria,
        encoding: EncodingConfig,
    ) -> Self {
        Self {
            events: document.events.clone(),
            criteria,
            teams: document.teams.clone(),
            dataset_name: document.dataset_name().to_string(),
            encoding,
        }
    }

    /// Events selected by the criteria, ascending by timestamp.
    pub fn selected_events(&self) -> Vec<TaggedEvent> {
        self.criteria.apply(&self.events)
    }
}

/// Outcome of a finished export job.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    /// Suggested names of every delivered blob, in delivery order.
    pub filenames: Vec<String>,
    pub clip_count: usize,
    pub total_bytes: usize,
    pub elapsed_secs: f64,
}

/// Percent of `done` out of `total`, rounded.
pub(crate) fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((done as f64 / total as f64) * 100.0).round().min(100.0) as u8
}

/// Fails unless a video is loaded.
pub(crate) fn ensure_video(playback: &dyn PlaybackSurface) -> TagreelResult<()> {
    if !playback.has_video() {
        return Err(TagreelError::validation("No source video loaded"));
    }
    Ok(())
}

/// Put the playback surface back where the user left it.
///
/// Uses its own token so a cancelled job can still restore, and a bounded
/// wait so a surface that stopped answering cannot hold the job open.
pub(crate) async fn restore_cursor(
    playback: &mut dyn PlaybackSurface,
    cursor: f64,
    timings: &PipelineTimings,
) {
    if let Err(e) = playback.pause() {
        tracing::warn!(error = %e, "Failed to pause playback during cleanup");
    }
    let restore = CancellationToken::new();
    let limit = Some(timings.restore_timeout());
    if let Err(e) = seek_to(playback, cursor, limit, &restore).await {
        tracing::warn!(error = %e, cursor_secs = cursor, "Failed to restore playback cursor");
    }
}

/// Runs montage jobs. One job at a time per [`JobLock`].
pub struct MontageOrchestrator {
    recorder: Arc<ClipRecorder>,
    lock: JobLock,
    timings: PipelineTimings,
    compositor: FrameCompositor,
    progress: Option<ProgressCallback>,
}

impl MontageOrchestrator {
    pub fn new(recorder: Arc<ClipRecorder>, lock: JobLock, timings: PipelineTimings) -> Self {
        let compositor = FrameCompositor::new(&timings);
        Self {
            recorder,
            lock,
            timings,
            compositor,
            progress: None,
        }
    }

    /// Receive a [`MontageProgress`] on every state change.
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    fn emit(&self, state: MontageState, percent: u8) {
        tracing::debug!(%state, percent, "Montage state");
        if let Some(cb) = &self.progress {
            cb(MontageProgress { state, percent });
        }
    }

    /// Record a montage of every event selected by `request` and deliver it
    /// to `sink`.
    ///
    /// Fails before touching any surface when no video is loaded or no event
    /// matches, and with [`TagreelError::Busy`] while another job holds the
    /// lock.
    pub async fn run(
        &self,
        request: &MontageRequest,
        playback: &mut dyn PlaybackSurface,
        canvas: &mut dyn DrawSurface,
        sink: &mut dyn FileSink,
        cancel: &CancellationToken,
    ) -> TagreelResult<ExportReport> {
        ensure_video(playback)?;
        let selected = request.selected_events();
        if selected.is_empty() {
            return Err(TagreelError::validation("No clips match the current filters"));
        }

        let _guard = self.lock.try_acquire("montage")?;
        let saved_cursor = playback.current_time();
        let clock = JobClock::start();
        tracing::info!(
            dataset = %request.dataset_name,
            clips = selected.len(),
            mime_type = %request.encoding.mime_type,
            started_at = clock.epoch_wall(),
            "Montage started"
        );

        let result = self
            .record(request, &selected, playback, canvas, sink, cancel)
            .await;

        canvas.set_global_alpha(1.0);
        restore_cursor(playback, saved_cursor, &self.timings).await;

        match result {
            Ok((filename, total_bytes)) => {
                self.emit(MontageState::Done, 0);
                tracing::info!(
                    filename = %filename,
                    elapsed_secs = clock.elapsed_secs(),
                    "Montage complete"
                );
                Ok(ExportReport {
                    filenames: vec![filename],
                    clip_count: selected.len(),
                    total_bytes,
                    elapsed_secs: clock.elapsed_secs(),
                })
            }
            Err(e) => {
                self.emit(MontageState::Aborted, 0);
                if e.is_cancelled() {
                    tracing::warn!("Montage cancelled");
                } else {
                    tracing::error!(error = %e, "Montage failed");
                }
                Err(e)
            }
        }
    }

    /// The recording itself. Returns the delivered filename and size. The
    /// recorder handle lives in this frame, so any early return discards it.
    async fn record(
        &self,
        request: &MontageRequest,
        selected: &[TaggedEvent],
        playback: &mut dyn PlaybackSurface,
        canvas: &mut dyn DrawSurface,
        sink: &mut dyn FileSink,
        cancel: &CancellationToken,
    ) -> TagreelResult<(String, usize)> {
        let clips = plan_clips(selected, playback.duration(), self.timings.pad_secs);
        let total = clips.len();

        let handle = self
            .recorder
            .start(canvas.capture_stream(), &request.encoding)
            .await?;

        for clip in &clips {
            let i = clip.index;
            self.emit(MontageState::Seeking(i), percent(i, total));
            tracing::info!(
                clip = i,
                start = clip.window.start,
                end = clip.window.end,
                category = %clip.event.category,
                action = %clip.event.action,
                "Seeking"
            );
            seek_to(playback, clip.window.start, self.timings.seek_timeout(), cancel).await?;

            self.emit(MontageState::TitleCard(i), percent(i, total));
            self.compositor
                .render_title_card(canvas, &TitleCard::for_event(&clip.event, &request.teams));
            dwell(self.timings.title_dwell(), cancel).await?;

            self.emit(MontageState::LiveCapture(i), percent(i, total));
            playback.play()?;
            let span = Duration::from_secs_f64(clip.window.duration().max(0.0));
            let compositor = &self.compositor;
            let frames = FrameClock::start(self.timings.frame_interval())
                .drive_for(span, cancel, |_| {
                    let frame = playback.current_frame();
                    compositor.draw_live_frame(&mut *canvas, frame.as_ref());
                    Ok(())
                })
                .await?;
            playback.pause()?;
            tracing::debug!(clip = i, frames, "Live capture finished");

            self.emit(MontageState::Transition(i), percent(i, total));
            let last_frame = playback.current_frame();
            self.compositor
                .cross_fade(canvas, last_frame.as_ref(), cancel)
                .await?;
        }

        self.emit(MontageState::EndCard, 100);
        self.compositor
            .render_end_card(canvas, &EndCard::new(&request.criteria, total));
        dwell(self.timings.end_card_dwell(), cancel).await?;

        self.emit(MontageState::Finalizing, 100);
        let media = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TagreelError::Cancelled),
            media = handle.stop() => media?,
        };
        if media.is_empty() {
            return Err(TagreelError::export("Recorder produced no data"));
        }

        let filename = derive_filename(
            &request.dataset_name,
            &request.criteria,
            request.encoding.extension(),
            ExportKind::Montage,
        );
        let blob = deliver(sink, media, &filename).await?;
        Ok((blob.filename, blob.bytes.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_rounds() {
        assert_eq!(percent(0, 2), 0);
        assert_eq!(percent(1, 2), 50);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(3, 3), 100);
        assert_eq!(percent(1, 0), 0);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(MontageState::Seeking(0).to_string(), "seeking clip 1");
        assert_eq!(MontageState::EndCard.to_string(), "end card");
    }
}

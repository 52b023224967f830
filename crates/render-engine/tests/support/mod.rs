//! In-memory surfaces, recorder backend and sink for pipeline tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tagreel_capture_engine::{CaptureBackend, ChunkSink, EncoderOptions, EncoderSession};
use tagreel_common::error::{TagreelError, TagreelResult};
use tagreel_media_core::{
    Color, EncodedBlob, FileSink, FrameFeed, MediaStream, PlaybackSurface, VideoFrame,
};
use tagreel_tag_model::{
    ContainerFormat, EncodingConfig, FilterCriteria, QualityTier, TaggedEvent, Team, TeamNames,
};
use tagreel_render_engine::MontageRequest;
use tokio::time::Instant;

pub const WIDTH: u32 = 8;
pub const HEIGHT: u32 = 6;

/// Playback surface whose seeks complete immediately and whose clock runs
/// on tokio time.
pub struct FakeSurface {
    duration: f64,
    cursor: f64,
    playing_since: Option<Instant>,
    feed: FrameFeed,
    /// Seeks after this many never signal arrival.
    stall_after: Option<usize>,
    pub seeks: Vec<f64>,
    pub plays: usize,
}

impl FakeSurface {
    pub fn new(duration: f64, cursor: f64) -> Self {
        let feed = FrameFeed::new("playback", WIDTH, HEIGHT);
        feed.publish(VideoFrame::solid(WIDTH, HEIGHT, Color::rgb(0, 128, 0)));
        Self {
            duration,
            cursor,
            playing_since: None,
            feed,
            stall_after: None,
            seeks: Vec::new(),
            plays: 0,
        }
    }

    /// A surface that answers `answered` seeks and then hangs forever.
    pub fn stalling_after(duration: f64, cursor: f64, answered: usize) -> Self {
        let mut surface = Self::new(duration, cursor);
        surface.stall_after = Some(answered);
        surface
    }

    /// A surface with nothing loaded.
    pub fn empty() -> Self {
        let mut surface = Self::new(0.0, 0.0);
        surface.feed = FrameFeed::new("playback", 0, 0);
        surface
    }
}

#[async_trait]
impl PlaybackSurface for FakeSurface {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn current_time(&self) -> f64 {
        match self.playing_since {
            Some(since) => (self.cursor + since.elapsed().as_secs_f64()).min(self.duration),
            None => self.cursor,
        }
    }

    fn dimensions(&self) -> (u32, u32) {
        if self.duration > 0.0 {
            (WIDTH, HEIGHT)
        } else {
            (0, 0)
        }
    }

    fn set_current_time(&mut self, secs: f64) -> TagreelResult<()> {
        self.playing_since = None;
        self.cursor = secs.clamp(0.0, self.duration);
        self.seeks.push(secs);
        Ok(())
    }

    async fn seeked(&mut self) -> TagreelResult<()> {
        if self.stall_after.is_some_and(|n| self.seeks.len() > n) {
            std::future::pending::<()>().await;
        }
        let shade = (self.cursor as u32 % 256) as u8;
        self.feed
            .publish(VideoFrame::solid(WIDTH, HEIGHT, Color::rgb(shade, 128, 0)));
        Ok(())
    }

    fn play(&mut self) -> TagreelResult<()> {
        if self.playing_since.is_none() {
            self.playing_since = Some(Instant::now());
            self.plays += 1;
        }
        Ok(())
    }

    fn pause(&mut self) -> TagreelResult<()> {
        self.cursor = self.current_time();
        self.playing_since = None;
        Ok(())
    }

    fn is_paused(&self) -> bool {
        self.playing_since.is_none()
    }

    fn current_frame(&self) -> Option<VideoFrame> {
        self.feed.latest()
    }

    fn capture_stream(&self) -> MediaStream {
        self.feed.stream()
    }
}

/// What the fake backend saw.
#[derive(Debug, Default)]
pub struct BackendLog {
    /// Label of the stream each session captured.
    pub opened: Vec<String>,
    pub stopped: usize,
    pub discarded: usize,
}

/// Capture backend that emits `"<label>#<n>"` when a session stops.
#[derive(Clone, Default)]
pub struct FakeBackend {
    pub log: Arc<Mutex<BackendLog>>,
    /// Fail the n-th open (0-based).
    pub fail_open_at: Option<usize>,
}

impl FakeBackend {
    pub fn failing_at(n: usize) -> Self {
        Self {
            fail_open_at: Some(n),
            ..Default::default()
        }
    }

    pub fn opened(&self) -> Vec<String> {
        self.log.lock().unwrap().opened.clone()
    }

    pub fn stopped(&self) -> usize {
        self.log.lock().unwrap().stopped
    }

    pub fn discarded(&self) -> usize {
        self.log.lock().unwrap().discarded
    }
}

struct FakeSession {
    payload: Vec<u8>,
    chunks: ChunkSink,
    log: Arc<Mutex<BackendLog>>,
    stopped: bool,
}

#[async_trait]
impl EncoderSession for FakeSession {
    async fn stop(&mut self) -> TagreelResult<()> {
        self.chunks.push(self.payload.clone());
        self.stopped = true;
        self.log.lock().unwrap().stopped += 1;
        Ok(())
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        if !self.stopped {
            self.log.lock().unwrap().discarded += 1;
        }
    }
}

#[async_trait]
impl CaptureBackend for FakeBackend {
    fn name(&self) -> &str {
        "fake"
    }

    fn is_mime_supported(&self, _mime_type: &str) -> bool {
        true
    }

    async fn open(
        &self,
        stream: MediaStream,
        _options: &EncoderOptions,
        chunks: ChunkSink,
    ) -> TagreelResult<Box<dyn EncoderSession>> {
        let mut log = self.log.lock().unwrap();
        let n = log.opened.len();
        if self.fail_open_at == Some(n) {
            return Err(TagreelError::recorder("encoder crashed"));
        }
        log.opened.push(stream.label().to_string());
        Ok(Box::new(FakeSession {
            payload: format!("{}#{n}", stream.label()).into_bytes(),
            chunks,
            log: self.log.clone(),
            stopped: false,
        }))
    }
}

/// Sink that keeps every blob in memory.
#[derive(Default)]
pub struct MemorySink {
    pub blobs: Vec<EncodedBlob>,
}

#[async_trait]
impl FileSink for MemorySink {
    async fn persist(&mut self, blob: EncodedBlob) -> TagreelResult<()> {
        self.blobs.push(blob);
        Ok(())
    }
}

impl MemorySink {
    pub fn filenames(&self) -> Vec<&str> {
        self.blobs.iter().map(|b| b.filename.as_str()).collect()
    }
}

/// Goal at 10s for the home side, tackle at 40s for the away side.
pub fn match_events() -> Vec<TaggedEvent> {
    vec![
        TaggedEvent::new("e2", 40.0, "Defense", "Tackle", Team::Away),
        TaggedEvent::new("e1", 10.0, "Scoring", "Goal", Team::Home).with_player("Nine"),
    ]
}

pub fn request(criteria: FilterCriteria) -> MontageRequest {
    MontageRequest {
        events: match_events(),
        criteria,
        teams: TeamNames::default(),
        dataset_name: "MatchA".to_string(),
        encoding: EncodingConfig::new(ContainerFormat::Webm, QualityTier::High),
    }
}

//! File-backed playback surface.
//!
//! Decodes a video file with ffmpeg. Seeking decodes the single frame at
//! the new cursor; playing streams raw frames in real time (`-re`) and
//! publishes each one to the surface's capture stream.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tagreel_common::config::FfmpegConfig;
use tagreel_common::error::{TagreelError, TagreelResult};
use tagreel_media_core::{FrameFeed, MediaStream, PlaybackSurface, VideoFrame};
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::task::JoinHandle;

/// Stream properties reported by ffprobe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub duration_secs: f64,
}

/// Parse `key=value` lines from
/// `ffprobe -show_entries stream=width,height,r_frame_rate:format=duration`.
pub fn parse_probe_output(raw: &str) -> Option<VideoInfo> {
    let mut width = None;
    let mut height = None;
    let mut fps = None;
    let mut duration = None;

    for line in raw.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        match key {
            "width" => width = value.parse::<u32>().ok(),
            "height" => height = value.parse::<u32>().ok(),
            "r_frame_rate" => fps = parse_rate(value),
            "duration" => duration = value.parse::<f64>().ok(),
            _ => {}
        }
    }

    let width = width.filter(|w| *w > 0)?;
    let height = height.filter(|h| *h > 0)?;
    let duration_secs = duration.filter(|d| d.is_finite() && *d > 0.0)?;
    Some(VideoInfo {
        width,
        height,
        fps: fps.unwrap_or(30.0),
        duration_secs,
    })
}

fn parse_rate(value: &str) -> Option<f64> {
    let rate = match value.split_once('/') {
        Some((num, den)) => {
            let num = num.parse::<f64>().ok()?;
            let den = den.parse::<f64>().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => value.parse::<f64>().ok()?,
    };
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

/// Probe a video file.
pub async fn probe_video(ffprobe_bin: &Path, path: &Path) -> TagreelResult<VideoInfo> {
    let output = Command::new(ffprobe_bin)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate:format=duration",
            "-of",
            "default=noprint_wrappers=1",
        ])
        .arg(path)
        .output()
        .await
        .map_err(|e| TagreelError::playback(format!("Failed to run ffprobe: {e}")))?;

    if !output.status.success() {
        return Err(TagreelError::playback(format!(
            "ffprobe failed for {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let raw = String::from_utf8_lossy(&output.stdout);
    parse_probe_output(&raw).ok_or_else(|| {
        TagreelError::playback(format!("{} has no usable video stream", path.display()))
    })
}

struct PlaybackTask {
    handle: JoinHandle<()>,
    /// Current position as `f64` bits.
    position: Arc<AtomicU64>,
}

impl PlaybackTask {
    fn position(&self) -> f64 {
        f64::from_bits(self.position.load(Ordering::Acquire))
    }
}

/// A [`PlaybackSurface`] over a video file on disk.
pub struct FfmpegPlaybackSurface {
    path: PathBuf,
    ffmpeg_bin: PathBuf,
    info: VideoInfo,
    cursor: f64,
    pending_seek: Option<f64>,
    feed: Arc<FrameFeed>,
    playing: Option<PlaybackTask>,
}

impl FfmpegPlaybackSurface {
    /// Probe `path` and open it paused at 0s.
    pub async fn open(path: impl Into<PathBuf>, config: &FfmpegConfig) -> TagreelResult<Self> {
        let path = path.into();
        if !path.exists() {
            return Err(TagreelError::FileNotFound { path });
        }
        let info = probe_video(&config.ffprobe_bin, &path).await?;
        tracing::info!(
            path = %path.display(),
            width = info.width,
            height = info.height,
            fps = info.fps,
            duration_secs = info.duration_secs,
            "Opened video"
        );

        let mut surface = Self {
            path,
            ffmpeg_bin: config.ffmpeg_bin.clone(),
            info,
            cursor: 0.0,
            pending_seek: Some(0.0),
            feed: Arc::new(FrameFeed::new("playback", info.width, info.height)),
            playing: None,
        };
        surface.seeked().await?;
        Ok(surface)
    }

    pub fn info(&self) -> VideoInfo {
        self.info
    }

    async fn decode_frame_at(&self, secs: f64) -> TagreelResult<Option<VideoFrame>> {
        let output = Command::new(&self.ffmpeg_bin)
            .args(["-hide_banner", "-loglevel", "error", "-ss"])
            .arg(format!("{secs:.3}"))
            .arg("-i")
            .arg(&self.path)
            .args(["-frames:v", "1", "-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1"])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| TagreelError::playback(format!("Failed to start ffmpeg: {e}")))?;

        if !output.status.success() {
            return Err(TagreelError::playback(format!(
                "Frame decode at {secs:.3}s failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(VideoFrame::from_rgba(
            self.info.width,
            self.info.height,
            output.stdout,
        ))
    }

    fn stop_playback(&mut self) {
        if let Some(task) = self.playing.take() {
            self.cursor = task.position().min(self.info.duration_secs);
            task.handle.abort();
        }
    }
}

#[async_trait]
impl PlaybackSurface for FfmpegPlaybackSurface {
    fn duration(&self) -> f64 {
        self.info.duration_secs
    }

    fn current_time(&self) -> f64 {
        match &self.playing {
            Some(task) => task.position().min(self.info.duration_secs),
            None => self.cursor,
        }
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.info.width, self.info.height)
    }

    fn set_current_time(&mut self, secs: f64) -> TagreelResult<()> {
        if !secs.is_finite() {
            return Err(TagreelError::seek(format!("Invalid seek target {secs}")));
        }
        self.stop_playback();
        self.cursor = secs.clamp(0.0, self.info.duration_secs);
        self.pending_seek = Some(self.cursor);
        Ok(())
    }

    async fn seeked(&mut self) -> TagreelResult<()> {
        let Some(target) = self.pending_seek.take() else {
            return Ok(());
        };
        match self.decode_frame_at(target).await? {
            Some(frame) => self.feed.publish(frame),
            // Past the last decodable frame; keep showing the previous one.
            None => tracing::debug!(target_secs = target, "No frame at seek target"),
        }
        Ok(())
    }

    fn play(&mut self) -> TagreelResult<()> {
        if self.playing.is_some() {
            return Ok(());
        }

        let start = self.cursor;
        let mut child = Command::new(&self.ffmpeg_bin)
            .args(["-hide_banner", "-loglevel", "error", "-re", "-ss"])
            .arg(format!("{start:.3}"))
            .arg("-i")
            .arg(&self.path)
            .args(["-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TagreelError::playback(format!("Failed to start ffmpeg: {e}")))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| TagreelError::playback("Failed to capture ffmpeg stdout"))?;

        let position = Arc::new(AtomicU64::new(start.to_bits()));
        let feed = self.feed.clone();
        let (width, height, fps, duration) = (
            self.info.width,
            self.info.height,
            self.info.fps,
            self.info.duration_secs,
        );
        let task_position = position.clone();

        let handle = tokio::spawn(async move {
            // The child is owned here so aborting the task kills ffmpeg.
            let _child = child;
            let frame_len = VideoFrame::byte_len(width, height);
            let mut decoded = 0u64;
            loop {
                let mut buf = vec![0u8; frame_len];
                if stdout.read_exact(&mut buf).await.is_err() {
                    break;
                }
                if let Some(frame) = VideoFrame::from_rgba(width, height, buf) {
                    feed.publish(frame);
                }
                decoded += 1;
                let now = (start + decoded as f64 / fps).min(duration);
                task_position.store(now.to_bits(), Ordering::Release);
            }
            tracing::debug!(frames = decoded, "Playback reached end of stream");
        });

        tracing::debug!(start_secs = start, "Playback started");
        self.playing = Some(PlaybackTask { handle, position });
        Ok(())
    }

    fn pause(&mut self) -> TagreelResult<()> {
        self.stop_playback();
        Ok(())
    }

    fn is_paused(&self) -> bool {
        self.playing
            .as_ref()
            .map_or(true, |task| task.handle.is_finished())
    }

    fn current_frame(&self) -> Option<VideoFrame> {
        self.feed.latest()
    }

    fn capture_stream(&self) -> MediaStream {
        self.feed.stream()
    }
}

impl Drop for FfmpegPlaybackSurface {
    fn drop(&mut self) {
        if let Some(task) = self.playing.take() {
            task.handle.abort();
        }
    }
}

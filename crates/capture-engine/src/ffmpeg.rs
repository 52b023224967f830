//! ffmpeg capture backend.
//!
//! Samples a [`MediaStream`] at a fixed rate and pipes raw RGBA frames into
//! an ffmpeg child process. The encoded container is read back from ffmpeg's
//! stdout in chunks and handed to the recorder's [`ChunkSink`].

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tagreel_common::config::FfmpegConfig;
use tagreel_common::error::{TagreelError, TagreelResult};
use tagreel_common::{CancellationToken, FrameClock};
use tagreel_media_core::{Color, MediaStream, VideoFrame};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use crate::recorder::{CaptureBackend, ChunkSink, EncoderOptions, EncoderSession};

/// Output chunk size read from ffmpeg's stdout.
const CHUNK_SIZE: usize = 64 * 1024;

/// Encoding used when the caller leaves the choice to the backend.
pub const DEFAULT_MIME: &str = "video/webm";

const SUPPORTED_MIME: &[&str] = &[
    "video/webm",
    "video/webm;codecs=vp9",
    "video/webm;codecs=vp8",
    "video/mp4",
    "video/mp4;codecs=avc1",
];

/// Capture backend that encodes through an ffmpeg subprocess.
#[derive(Debug, Clone)]
pub struct FfmpegCaptureBackend {
    ffmpeg_bin: PathBuf,
    fps: u32,
}

impl FfmpegCaptureBackend {
    pub fn new(config: &FfmpegConfig) -> Self {
        Self {
            ffmpeg_bin: config.ffmpeg_bin.clone(),
            fps: config.capture_fps.max(1),
        }
    }

    /// Whether the configured ffmpeg binary can be executed.
    pub async fn is_available(&self) -> bool {
        Command::new(&self.ffmpeg_bin)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }
}

fn normalize_mime(mime_type: &str) -> String {
    mime_type
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Build the ffmpeg argument list for encoding raw RGBA frames of the given
/// size into `mime_type`, written to stdout.
pub fn build_encoder_args(
    width: u32,
    height: u32,
    fps: u32,
    mime_type: &str,
    bitrate_bps: Option<u64>,
) -> TagreelResult<Vec<String>> {
    let mime = normalize_mime(mime_type);
    if !SUPPORTED_MIME.contains(&mime.as_str()) {
        return Err(TagreelError::unsupported(format!(
            "ffmpeg backend cannot encode {mime_type}"
        )));
    }

    let mut args: Vec<String> = vec![
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-f".into(),
        "rawvideo".into(),
        "-pix_fmt".into(),
        "rgba".into(),
        "-s".into(),
        format!("{width}x{height}"),
        "-r".into(),
        fps.to_string(),
        "-i".into(),
        "pipe:0".into(),
        // yuv420p needs even dimensions
        "-vf".into(),
        "scale=trunc(iw/2)*2:trunc(ih/2)*2".into(),
        "-pix_fmt".into(),
        "yuv420p".into(),
    ];

    if mime.starts_with("video/mp4") {
        args.extend(
            [
                "-c:v",
                "libx264",
                "-preset",
                "veryfast",
                "-movflags",
                "frag_keyframe+empty_moov+default_base_moof",
            ]
            .map(String::from),
        );
    } else if mime.ends_with("codecs=vp8") {
        args.extend(["-c:v", "libvpx", "-deadline", "realtime"].map(String::from));
    } else {
        args.extend(
            [
                "-c:v",
                "libvpx-vp9",
                "-deadline",
                "realtime",
                "-cpu-used",
                "8",
                "-row-mt",
                "1",
            ]
            .map(String::from),
        );
    }

    if let Some(bps) = bitrate_bps {
        args.push("-b:v".into());
        args.push(bps.to_string());
    }

    let container = if mime.starts_with("video/mp4") {
        "mp4"
    } else {
        "webm"
    };
    args.extend(["-f".to_string(), container.to_string(), "pipe:1".to_string()]);
    Ok(args)
}

#[async_trait]
impl CaptureBackend for FfmpegCaptureBackend {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn is_mime_supported(&self, mime_type: &str) -> bool {
        SUPPORTED_MIME.contains(&normalize_mime(mime_type).as_str())
    }

    async fn open(
        &self,
        stream: MediaStream,
        options: &EncoderOptions,
        chunks: ChunkSink,
    ) -> TagreelResult<Box<dyn EncoderSession>> {
        let (width, height) = stream.dimensions();
        if width == 0 || height == 0 {
            return Err(TagreelError::recorder(format!(
                "Stream '{}' has no picture to capture",
                stream.label()
            )));
        }

        let mime = options.mime_type.as_deref().unwrap_or(DEFAULT_MIME);
        let args = build_encoder_args(width, height, self.fps, mime, options.bitrate_bps)?;
        tracing::debug!(args = ?args, "Starting ffmpeg encoder");

        let mut child = Command::new(&self.ffmpeg_bin)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TagreelError::recorder(format!("Failed to start ffmpeg: {e}")))?;

        tracing::info!(
            pid = child.id(),
            width,
            height,
            fps = self.fps,
            mime_type = mime,
            "ffmpeg encoder started"
        );

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TagreelError::recorder("Failed to capture ffmpeg stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TagreelError::recorder("Failed to capture ffmpeg stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| TagreelError::recorder("Failed to capture ffmpeg stderr"))?;

        let stop = CancellationToken::new();
        let writer = tokio::spawn(write_frames(stream, stdin, self.fps, stop.clone()));
        let reader = tokio::spawn(read_chunks(stdout, chunks));
        // Drain stderr concurrently so ffmpeg never blocks on a full pipe.
        let stderr_task = tokio::spawn(async move {
            let mut stderr = stderr;
            let mut output = String::new();
            match stderr.read_to_string(&mut output).await {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        Ok(Box::new(FfmpegSession {
            child,
            stop,
            writer: Some(writer),
            reader: Some(reader),
            stderr_task: Some(stderr_task),
        }))
    }
}

async fn write_frames(
    stream: MediaStream,
    mut stdin: tokio::process::ChildStdin,
    fps: u32,
    stop: CancellationToken,
) -> u64 {
    let (width, height) = stream.dimensions();
    let blank = VideoFrame::solid(width, height, Color::BLACK);
    let mut clock = FrameClock::from_hz(fps);

    loop {
        tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            _ = clock.tick() => {
                let frame = match stream.latest_frame() {
                    Some(frame) => frame.resized(width, height),
                    None => blank.clone(),
                };
                if let Err(e) = stdin.write_all(frame.data()).await {
                    tracing::warn!(error = %e, "ffmpeg stdin closed early");
                    break;
                }
            }
        }
    }

    let _ = stdin.shutdown().await;
    clock.stop()
}

async fn read_chunks(
    mut stdout: tokio::process::ChildStdout,
    chunks: ChunkSink,
) -> std::io::Result<u64> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        let n = stdout.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        total += n as u64;
        if !chunks.push(buf[..n].to_vec()) {
            break;
        }
    }
    Ok(total)
}

struct FfmpegSession {
    child: Child,
    stop: CancellationToken,
    writer: Option<JoinHandle<u64>>,
    reader: Option<JoinHandle<std::io::Result<u64>>>,
    stderr_task: Option<JoinHandle<String>>,
}

#[async_trait]
impl EncoderSession for FfmpegSession {
    async fn stop(&mut self) -> TagreelResult<()> {
        self.stop.cancel();

        let frames = match self.writer.take() {
            Some(handle) => handle
                .await
                .map_err(|e| TagreelError::recorder(format!("Frame writer failed: {e}")))?,
            None => 0,
        };
        let bytes = match self.reader.take() {
            Some(handle) => handle
                .await
                .map_err(|e| TagreelError::recorder(format!("Chunk reader failed: {e}")))?
                .map_err(|e| TagreelError::recorder(format!("Failed reading ffmpeg output: {e}")))?,
            None => 0,
        };

        let status = self
            .child
            .wait()
            .await
            .map_err(|e| TagreelError::recorder(format!("Failed to wait on ffmpeg: {e}")))?;
        let stderr_output = match self.stderr_task.take() {
            Some(handle) => handle
                .await
                .unwrap_or_else(|_| "<failed to join stderr reader>".to_string()),
            None => String::new(),
        };

        if !status.success() {
            return Err(TagreelError::recorder(format!(
                "ffmpeg encoder failed (status {}): {}",
                status,
                stderr_output.trim()
            )));
        }

        tracing::debug!(frames, bytes, "ffmpeg encoder finished");
        Ok(())
    }
}

impl Drop for FfmpegSession {
    fn drop(&mut self) {
        self.stop.cancel();
        if let Some(handle) = self.writer.take() {
            handle.abort();
        }
        if let Some(handle) = self.reader.take() {
            handle.abort();
        }
        if let Some(handle) = self.stderr_task.take() {
            handle.abort();
        }
    }
}

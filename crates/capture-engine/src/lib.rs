//! Tagreel Capture Engine
//!
//! Moves a playback surface to the right place and records what a surface
//! shows. The pipeline crates drive these pieces; nothing here knows about
//! title cards or montages.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────┐  seek_to   ┌───────────────────────┐
//! │ PlaybackSurface   │◀───────────│ render pipeline       │
//! │ (FfmpegPlayback)  │            └──────────┬────────────┘
//! └───────────────────┘                       │ start / stop
//!                                             ▼
//! ┌───────────────────┐  MediaStream ┌──────────────────────┐
//! │ DrawSurface       │─────────────▶│ ClipRecorder         │
//! └───────────────────┘              │  └ CaptureBackend    │
//!                                    │     (ffmpeg)         │
//!                                    └──────────┬───────────┘
//!                                               ▼
//!                                        RecordedMedia
//! ```

pub mod ffmpeg;
pub mod playback;
pub mod recorder;
pub mod seek;

pub use ffmpeg::FfmpegCaptureBackend;
pub use playback::{FfmpegPlaybackSurface, VideoInfo};
pub use recorder::*;
pub use seek::seek_to;

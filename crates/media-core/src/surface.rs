//! Playback and drawing surface contracts.
//!
//! The pipeline never discovers surfaces from ambient state: callers own a
//! playback surface and a drawing surface and lend them to each job.

use async_trait::async_trait;
use tagreel_common::error::TagreelResult;

use crate::frame::{Color, VideoFrame};
use crate::stream::MediaStream;

/// A seekable, playable video source.
///
/// Seeking is split in two: [`set_current_time`](Self::set_current_time)
/// moves the time cursor and [`seeked`](Self::seeked) resolves once the
/// surface has a frame for the new position.
#[async_trait]
pub trait PlaybackSurface: Send {
    /// Video duration in seconds.
    fn duration(&self) -> f64;

    /// Current time cursor in seconds.
    fn current_time(&self) -> f64;

    /// Frame size in pixels. `(0, 0)` means no video is loaded.
    fn dimensions(&self) -> (u32, u32);

    /// Move the time cursor. Arrival is signalled through `seeked`.
    fn set_current_time(&mut self, secs: f64) -> TagreelResult<()>;

    /// Resolve once the last requested seek has completed.
    async fn seeked(&mut self) -> TagreelResult<()>;

    /// Start advancing the time cursor in real time.
    fn play(&mut self) -> TagreelResult<()>;

    /// Stop advancing the time cursor.
    fn pause(&mut self) -> TagreelResult<()>;

    fn is_paused(&self) -> bool;

    /// The frame currently shown.
    fn current_frame(&self) -> Option<VideoFrame>;

    /// A live stream of the frames this surface shows.
    fn capture_stream(&self) -> MediaStream;

    /// Whether a video with a usable picture is loaded.
    fn has_video(&self) -> bool {
        let (width, height) = self.dimensions();
        width > 0 && height > 0 && self.duration() > 0.0
    }
}

/// An axis-aligned rectangle in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    /// The whole surface.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

/// Horizontal anchoring of a text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    Left,
    #[default]
    Center,
}

/// Font settings for a text run.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    /// Font size in pixels.
    pub size_px: f32,
    pub bold: bool,
    pub color: Color,
    pub align: TextAlign,
}

impl TextStyle {
    pub fn regular(size_px: f32) -> Self {
        Self {
            size_px,
            bold: false,
            color: Color::WHITE,
            align: TextAlign::Center,
        }
    }

    pub fn bold(size_px: f32) -> Self {
        Self {
            bold: true,
            ..Self::regular(size_px)
        }
    }
}

/// A 2D drawable surface with a global alpha, like a canvas context.
///
/// Drawing calls blend with the current global alpha. Nothing reaches the
/// capture stream until [`present`](Self::present) is called.
pub trait DrawSurface: Send {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn global_alpha(&self) -> f32;

    /// Set the alpha applied to subsequent draws, clamped to `[0, 1]`.
    fn set_global_alpha(&mut self, alpha: f32);

    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Draw a frame over the whole surface.
    fn draw_frame(&mut self, frame: &VideoFrame);

    /// Draw a line of text with its baseline at `y`.
    fn fill_text(&mut self, text: &str, style: &TextStyle, x: f32, y: f32);

    /// Publish the current contents to the capture stream.
    fn present(&mut self);

    /// A live stream of presented frames.
    fn capture_stream(&self) -> MediaStream;

    /// Fill the whole surface.
    fn fill(&mut self, color: Color) {
        let rect = Rect::full(self.width(), self.height());
        self.fill_rect(rect, color);
    }
}

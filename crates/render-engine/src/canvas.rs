//! In-memory raster canvas.
//!
//! An RGBA drawing surface with canvas-style global alpha. Presented frames
//! are published to a [`FrameFeed`] so a recorder can capture the canvas.

use std::path::Path;

use image::{Rgba, RgbaImage};
use rusttype::{point, Font, PositionedGlyph, Scale};
use tagreel_common::error::{TagreelError, TagreelResult};
use tagreel_media_core::{
    Color, DrawSurface, FrameFeed, MediaStream, Rect, TextAlign, TextStyle, VideoFrame,
};

/// A line of text drawn on the canvas, kept for inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub size_px: f32,
    pub bold: bool,
    pub x: f32,
    pub y: f32,
}

/// Load a TrueType font from disk.
pub fn load_font(path: &Path) -> TagreelResult<Font<'static>> {
    let bytes = std::fs::read(path).map_err(|e| {
        TagreelError::config(format!("Failed to read font {}: {e}", path.display()))
    })?;
    Font::try_from_vec(bytes)
        .ok_or_else(|| TagreelError::config(format!("{} is not a usable font", path.display())))
}

/// Software canvas backing title cards, end cards and live frames.
pub struct RasterCanvas {
    image: RgbaImage,
    alpha: f32,
    font: Option<Font<'static>>,
    feed: FrameFeed,
    text_runs: Vec<TextRun>,
    presented: u64,
    warned_no_font: bool,
}

impl RasterCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])),
            alpha: 1.0,
            font: None,
            feed: FrameFeed::new("canvas", width, height),
            text_runs: Vec::new(),
            presented: 0,
            warned_no_font: false,
        }
    }

    /// Rasterize text with `font`.
    pub fn with_font(mut self, font: Font<'static>) -> Self {
        self.font = Some(font);
        self
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Text drawn since the canvas was last fully cleared.
    pub fn text_runs(&self) -> &[TextRun] {
        &self.text_runs
    }

    /// Number of times the canvas has been presented.
    pub fn presented_frames(&self) -> u64 {
        self.presented
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.image.get_pixel_checked(x, y).map(|p| p.0)
    }

    /// Current contents as a frame.
    pub fn snapshot(&self) -> VideoFrame {
        let (width, height) = self.image.dimensions();
        VideoFrame::from_rgba(width, height, self.image.as_raw().clone())
            .unwrap_or_else(|| VideoFrame::solid(width, height, Color::BLACK))
    }

    fn blend(&mut self, x: u32, y: u32, src: [u8; 3], coverage: f32) {
        let a = (self.alpha * coverage).clamp(0.0, 1.0);
        if a <= 0.0 {
            return;
        }
        let px = self.image.get_pixel_mut(x, y);
        for c in 0..3 {
            let blended = src[c] as f32 * a + px.0[c] as f32 * (1.0 - a);
            px.0[c] = blended.round().clamp(0.0, 255.0) as u8;
        }
        px.0[3] = 255;
    }

    fn covers_canvas(&self, rect: Rect) -> bool {
        rect.x <= 0
            && rect.y <= 0
            && rect.x as i64 + rect.width as i64 >= self.image.width() as i64
            && rect.y as i64 + rect.height as i64 >= self.image.height() as i64
    }

    fn layout_width(font: &Font<'static>, text: &str, scale: Scale) -> f32 {
        font.layout(text, scale, point(0.0, 0.0))
            .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
            .fold(0.0, f32::max)
    }

    fn draw_glyphs(&mut self, glyphs: Vec<PositionedGlyph<'static>>, color: Color) {
        let (width, height) = self.image.dimensions();
        let src = [color.r, color.g, color.b];
        for glyph in glyphs {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            let mut coverage = Vec::new();
            glyph.draw(|gx, gy, v| {
                coverage.push((bb.min.x + gx as i32, bb.min.y + gy as i32, v));
            });
            for (px, py, v) in coverage {
                if px >= 0 && py >= 0 && (px as u32) < width && (py as u32) < height {
                    self.blend(px as u32, py as u32, src, v);
                }
            }
        }
    }
}

impl DrawSurface for RasterCanvas {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn global_alpha(&self) -> f32 {
        self.alpha
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        self.alpha = if alpha.is_finite() {
            alpha.clamp(0.0, 1.0)
        } else {
            1.0
        };
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let (width, height) = self.image.dimensions();
        let x0 = rect.x.max(0) as i64;
        let y0 = rect.y.max(0) as i64;
        let x1 = (rect.x as i64 + rect.width as i64).min(width as i64);
        let y1 = (rect.y as i64 + rect.height as i64).min(height as i64);
        if self.alpha >= 1.0 && self.covers_canvas(rect) {
            self.text_runs.clear();
        }
        let src = [color.r, color.g, color.b];
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend(x as u32, y as u32, src, 1.0);
            }
        }
    }

    fn draw_frame(&mut self, frame: &VideoFrame) {
        let (width, height) = self.image.dimensions();
        let frame = frame.resized(width, height);
        if self.alpha >= 1.0 {
            let dst: &mut [u8] = &mut self.image;
            if dst.len() == frame.data().len() {
                dst.copy_from_slice(frame.data());
                self.text_runs.clear();
                return;
            }
        }
        for y in 0..height {
            for x in 0..width {
                if let Some(p) = frame.pixel(x, y) {
                    self.blend(x, y, [p[0], p[1], p[2]], 1.0);
                }
            }
        }
    }

    fn fill_text(&mut self, text: &str, style: &TextStyle, x: f32, y: f32) {
        self.text_runs.push(TextRun {
            text: text.to_string(),
            size_px: style.size_px,
            bold: style.bold,
            x,
            y,
        });

        let Some(font) = self.font.clone() else {
            if !self.warned_no_font {
                tracing::warn!("No font configured; card text is not rasterized");
                self.warned_no_font = true;
            }
            return;
        };

        let scale = Scale::uniform(style.size_px);
        let start_x = match style.align {
            TextAlign::Left => x,
            TextAlign::Center => x - Self::layout_width(&font, text, scale) / 2.0,
        };
        let glyphs: Vec<_> = font.layout(text, scale, point(start_x, y)).collect();
        if style.bold {
            // Overstrike one pixel to the right.
            let shifted: Vec<_> = font
                .layout(text, scale, point(start_x + 1.0, y))
                .collect();
            self.draw_glyphs(shifted, style.color);
        }
        self.draw_glyphs(glyphs, style.color);
    }

    fn present(&mut self) {
        self.feed.publish(self.snapshot());
        self.presented += 1;
    }

    fn capture_stream(&self) -> MediaStream {
        self.feed.stream()
    }
}

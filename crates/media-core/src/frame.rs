//! Raw RGBA video frames and colors.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

/// A single decoded frame in tightly packed RGBA8 layout.
///
/// Pixel data is shared, so cloning a frame is cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    width: u32,
    height: u32,
    data: Arc<Vec<u8>>,
}

impl VideoFrame {
    /// Wrap RGBA pixel data. Returns `None` if the buffer length does not
    /// match `width * height * 4`.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() != Self::byte_len(width, height) {
            return None;
        }
        Some(Self {
            width,
            height,
            data: Arc::new(data),
        })
    }

    /// A frame filled with one color.
    pub fn solid(width: u32, height: u32, color: Color) -> Self {
        let rgba = color.to_rgba();
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(Self::byte_len(width, height))
            .collect();
        Self {
            width,
            height,
            data: Arc::new(data),
        }
    }

    /// Number of bytes an RGBA frame of the given size occupies.
    pub fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 4
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// RGBA value at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let px = &self.data[offset..offset + 4];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Nearest-neighbour resample to `width x height`. Returns a cheap clone
    /// when the size already matches.
    pub fn resized(&self, width: u32, height: u32) -> Self {
        if (width, height) == self.dimensions() {
            return self.clone();
        }
        if self.width == 0 || self.height == 0 {
            return Self::solid(width, height, Color::BLACK);
        }

        let mut data = Vec::with_capacity(Self::byte_len(width, height));
        for y in 0..height {
            let sy = (y as u64 * self.height as u64 / height.max(1) as u64) as usize;
            let row = sy * self.width as usize;
            for x in 0..width {
                let sx = (x as u64 * self.width as u64 / width.max(1) as u64) as usize;
                let offset = (row + sx) * 4;
                data.extend_from_slice(&self.data[offset..offset + 4]);
            }
        }
        Self {
            width,
            height,
            data: Arc::new(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgba_checks_length() {
        assert!(VideoFrame::from_rgba(2, 2, vec![0; 16]).is_some());
        assert!(VideoFrame::from_rgba(2, 2, vec![0; 15]).is_none());
    }

    #[test]
    fn test_solid_frame() {
        let frame = VideoFrame::solid(3, 2, Color::rgb(10, 20, 30));
        assert_eq!(frame.data().len(), 24);
        assert_eq!(frame.pixel(2, 1), Some([10, 20, 30, 255]));
        assert_eq!(frame.pixel(3, 0), None);
    }

    #[test]
    fn test_resize_nearest() {
        // 2x1: left red, right blue.
        let data = vec![255, 0, 0, 255, 0, 0, 255, 255];
        let frame = VideoFrame::from_rgba(2, 1, data).unwrap();
        let scaled = frame.resized(4, 2);
        assert_eq!(scaled.dimensions(), (4, 2));
        assert_eq!(scaled.pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(scaled.pixel(1, 1), Some([255, 0, 0, 255]));
        assert_eq!(scaled.pixel(2, 0), Some([0, 0, 255, 255]));
        assert_eq!(scaled.pixel(3, 1), Some([0, 0, 255, 255]));
    }

    #[test]
    fn test_resize_same_size_shares_data() {
        let frame = VideoFrame::solid(4, 4, Color::WHITE);
        let same = frame.resized(4, 4);
        assert!(Arc::ptr_eq(&frame.data, &same.data));
    }
}

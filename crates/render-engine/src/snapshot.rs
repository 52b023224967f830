//! Still frame export.

use std::io::Cursor;

use image::{ImageFormat, RgbaImage};
use tagreel_common::error::{TagreelError, TagreelResult};
use tagreel_media_core::{EncodedBlob, FileSink, PlaybackSurface, RecordedMedia, VideoFrame};

use crate::finalizer::{deliver, snapshot_filename};
use crate::montage::ensure_video;

/// Encode a frame as PNG.
pub fn encode_png(frame: &VideoFrame) -> TagreelResult<Vec<u8>> {
    let (width, height) = frame.dimensions();
    let image = RgbaImage::from_raw(width, height, frame.data().to_vec())
        .ok_or_else(|| TagreelError::export("Frame buffer does not match its dimensions"))?;
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .map_err(|e| TagreelError::export(format!("PNG encoding failed: {e}")))?;
    Ok(bytes.into_inner())
}

/// Save the frame currently shown by `playback` as
/// `{dataset}/frames/action_{t}s.png`.
pub async fn export_snapshot(
    dataset_name: &str,
    playback: &dyn PlaybackSurface,
    sink: &mut dyn FileSink,
) -> TagreelResult<EncodedBlob> {
    ensure_video(playback)?;
    let at = playback.current_time();
    let frame = playback
        .current_frame()
        .ok_or_else(|| TagreelError::playback(format!("No frame available at {at:.2}s")))?;

    let media = RecordedMedia {
        bytes: encode_png(&frame)?,
        mime_type: "image/png".to_string(),
    };
    deliver(sink, media, &snapshot_filename(dataset_name, at)).await
}

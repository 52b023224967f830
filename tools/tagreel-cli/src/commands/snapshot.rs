//! Save a single frame as PNG.

use std::path::PathBuf;

use tagreel_common::config::AppConfig;
use tagreel_media_core::PlaybackSurface;
use tagreel_render_engine::export_snapshot;

use super::{open_video, resolve_output_dir};
use crate::sink::DirectorySink;

pub async fn run(
    config: AppConfig,
    video: PathBuf,
    at: f64,
    output: Option<PathBuf>,
    dataset: Option<String>,
) -> anyhow::Result<()> {
    let mut playback = open_video(&video, &config).await?;
    playback.set_current_time(at)?;
    playback.seeked().await?;

    let mut sink = DirectorySink::new(resolve_output_dir(output, &config));
    let blob = export_snapshot(dataset.as_deref().unwrap_or_default(), &playback, &mut sink).await?;
    for path in sink.written() {
        println!("Snapshot saved: {} ({} bytes)", path.display(), blob.bytes.len());
    }
    Ok(())
}

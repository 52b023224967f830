//! Record a montage of the selected events.

use std::io::Write;
use std::path::PathBuf;

use tagreel_common::config::{AppConfig, TransitionStyle};
use tagreel_common::JobLock;
use tagreel_media_core::PlaybackSurface;
use tagreel_render_engine::canvas::load_font;
use tagreel_render_engine::{MontageOrchestrator, MontageProgress, MontageRequest, RasterCanvas};

use super::{
    cancel_on_ctrl_c, ffmpeg_recorder, load_tags, open_video, ExportArgs, FilterArgs,
};
use crate::sink::DirectorySink;

pub async fn run(
    mut config: AppConfig,
    video: PathBuf,
    tags: PathBuf,
    filter: FilterArgs,
    export: ExportArgs,
    font: Option<PathBuf>,
    transition: Option<String>,
) -> anyhow::Result<()> {
    if let Some(style) = transition {
        config.pipeline.transition = match style.as_str() {
            "dissolve" => TransitionStyle::Dissolve,
            "overlay" => TransitionStyle::Overlay,
            _ => {
                return Err(anyhow::anyhow!(
                    "Unknown transition: {style}. Use: dissolve, overlay"
                ));
            }
        };
    }

    let mut document = load_tags(&tags)?;
    if let Some(name) = export.dataset.clone() {
        document.dataset_name = name;
    }
    let request =
        MontageRequest::from_document(&document, filter.criteria()?, export.encoding(&config)?);
    let output_dir = export.output_dir(&config);

    let mut playback = open_video(&video, &config).await?;
    let (width, height) = playback.dimensions();
    let mut canvas = RasterCanvas::new(width, height);
    if let Some(path) = font.or_else(|| config.compositor.font_path.clone()) {
        canvas = canvas.with_font(load_font(&path)?);
    }

    println!("Recording montage from: {}", video.display());
    println!("  Clips: {}", request.selected_events().len());
    if let Some(desc) = request.criteria.describe() {
        println!("  Filter: {desc}");
    }
    println!("  Format: {}", request.encoding.mime_type);
    println!("  Output: {}", output_dir.display());

    let orchestrator = MontageOrchestrator::new(
        ffmpeg_recorder(&config),
        JobLock::new(),
        config.pipeline.clone(),
    )
    .with_progress(Box::new(|p: MontageProgress| {
        print!("\r  Progress: {:>3}% ({})            ", p.percent, p.state);
        let _ = std::io::stdout().flush();
    }));

    let mut sink = DirectorySink::new(output_dir);
    let cancel = cancel_on_ctrl_c();
    match orchestrator
        .run(&request, &mut playback, &mut canvas, &mut sink, &cancel)
        .await
    {
        Ok(report) => {
            println!();
            for path in sink.written() {
                println!("Montage complete: {}", path.display());
            }
            println!(
                "  {} clips, {} bytes in {:.1}s",
                report.clip_count, report.total_bytes, report.elapsed_secs
            );
            Ok(())
        }
        Err(e) => {
            println!();
            Err(anyhow::anyhow!("Montage failed: {e}"))
        }
    }
}

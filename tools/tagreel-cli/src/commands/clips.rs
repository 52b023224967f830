//! Record one clip per selected event, or a single clip around a moment.

use std::io::Write;
use std::path::PathBuf;

use tagreel_common::config::AppConfig;
use tagreel_common::JobLock;
use tagreel_media_core::PlaybackSurface;
use tagreel_render_engine::{
    derive_filename, ClipExporter, ExportKind, ExportReport, MontageRequest,
};

use super::{
    cancel_on_ctrl_c, ffmpeg_recorder, load_tags, open_video, ExportArgs, FilterArgs,
};
use crate::sink::DirectorySink;

pub async fn run(
    config: AppConfig,
    video: PathBuf,
    tags: PathBuf,
    filter: FilterArgs,
    export: ExportArgs,
) -> anyhow::Result<()> {
    let mut document = load_tags(&tags)?;
    if let Some(name) = export.dataset.clone() {
        document.dataset_name = name;
    }
    let request =
        MontageRequest::from_document(&document, filter.criteria()?, export.encoding(&config)?);
    let output_dir = export.output_dir(&config);
    let mut playback = open_video(&video, &config).await?;

    println!("Recording clips from: {}", video.display());
    println!(
        "  Batch: {}",
        derive_filename(
            &request.dataset_name,
            &request.criteria,
            request.encoding.extension(),
            ExportKind::ClipBatch,
        )
    );
    println!("  Clips: {}", request.selected_events().len());
    println!("  Output: {}", output_dir.display());

    let exporter = ClipExporter::new(
        ffmpeg_recorder(&config),
        JobLock::new(),
        config.pipeline.clone(),
    )
    .with_progress(Box::new(|percent| {
        print!("\r  Progress: {percent:>3}%  ");
        let _ = std::io::stdout().flush();
    }));

    let mut sink = DirectorySink::new(output_dir);
    let cancel = cancel_on_ctrl_c();
    let result = exporter
        .run(&request, &mut playback, &mut sink, &cancel)
        .await;
    println!();
    report(result, &sink)
}

pub async fn run_at(
    config: AppConfig,
    video: PathBuf,
    at: f64,
    export: ExportArgs,
) -> anyhow::Result<()> {
    let encoding = export.encoding(&config)?;
    let dataset = export.dataset.clone().unwrap_or_default();
    let mut playback = open_video(&video, &config).await?;
    playback.set_current_time(at)?;
    playback.seeked().await?;

    let exporter = ClipExporter::new(
        ffmpeg_recorder(&config),
        JobLock::new(),
        config.pipeline.clone(),
    );
    let mut sink = DirectorySink::new(export.output_dir(&config));
    let cancel = cancel_on_ctrl_c();
    let result = exporter
        .run_at_cursor(&dataset, &encoding, &mut playback, &mut sink, &cancel)
        .await;
    report(result, &sink)
}

fn report(
    result: tagreel_common::error::TagreelResult<ExportReport>,
    sink: &DirectorySink,
) -> anyhow::Result<()> {
    for path in sink.written() {
        println!("  Wrote {}", path.display());
    }
    match result {
        Ok(report) => {
            println!(
                "Export complete: {} clip(s), {} bytes in {:.1}s",
                report.filenames.len(),
                report.total_bytes,
                report.elapsed_secs
            );
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!("Clip export failed: {e}")),
    }
}

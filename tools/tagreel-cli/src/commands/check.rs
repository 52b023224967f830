//! Check ffmpeg availability and configuration.

use tagreel_capture_engine::FfmpegCaptureBackend;
use tagreel_common::config::{config_file_path, AppConfig};
use tagreel_render_engine::canvas::load_font;

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    println!("Tagreel System Check");
    println!("{}", "=".repeat(50));

    let config_path = config_file_path();
    if config_path.exists() {
        println!("[OK] Config: {}", config_path.display());
    } else {
        println!("[--] Config: defaults ({} not found)", config_path.display());
    }

    let backend = FfmpegCaptureBackend::new(&config.ffmpeg);
    let ffmpeg_ok = backend.is_available().await;
    if ffmpeg_ok {
        println!("[OK] ffmpeg: {}", config.ffmpeg.ffmpeg_bin.display());
    } else {
        println!(
            "[FAIL] ffmpeg not runnable: {}",
            config.ffmpeg.ffmpeg_bin.display()
        );
    }

    let ffprobe_ok = tokio::process::Command::new(&config.ffmpeg.ffprobe_bin)
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false);
    if ffprobe_ok {
        println!("[OK] ffprobe: {}", config.ffmpeg.ffprobe_bin.display());
    } else {
        println!(
            "[FAIL] ffprobe not runnable: {}",
            config.ffmpeg.ffprobe_bin.display()
        );
    }

    match &config.compositor.font_path {
        Some(path) => match load_font(path) {
            Ok(_) => println!("[OK] Card font: {}", path.display()),
            Err(e) => println!("[WARN] Card font unusable: {e}"),
        },
        None => println!("[WARN] No card font configured; title and end cards render without text"),
    }

    println!(
        "[--] Defaults: {} / {} quality, {} fps capture, {:?} transition",
        config.export.format,
        config.export.quality,
        config.ffmpeg.capture_fps,
        config.pipeline.transition
    );

    println!();
    if ffmpeg_ok && ffprobe_ok {
        println!("All required tools are available. Tagreel is ready.");
    } else {
        println!(
            "Some required tools are missing. Install ffmpeg or set ffmpeg.ffmpeg_bin in the config."
        );
    }
    Ok(())
}

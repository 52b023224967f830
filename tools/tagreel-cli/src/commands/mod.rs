//! Subcommand implementations and the arguments they share.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use tagreel_capture_engine::{ClipRecorder, FfmpegCaptureBackend, FfmpegPlaybackSurface};
use tagreel_common::config::AppConfig;
use tagreel_common::CancellationToken;
use tagreel_tag_model::{
    ContainerFormat, EncodingConfig, FilterCriteria, QualityTier, TagDocument, Team,
};

pub mod check;
pub mod clips;
pub mod filter;
pub mod montage;
pub mod snapshot;

/// Event filter flags. Unset flags match everything.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only events by this player
    #[arg(long)]
    pub player: Option<String>,

    /// Only events for this side: home|away
    #[arg(long)]
    pub team: Option<String>,

    /// Only events in this category
    #[arg(long)]
    pub category: Option<String>,

    /// Only events with this action
    #[arg(long)]
    pub action: Option<String>,

    /// Only events with this outcome
    #[arg(long)]
    pub outcome: Option<String>,
}

impl FilterArgs {
    pub fn criteria(&self) -> anyhow::Result<FilterCriteria> {
        let team = match self.team.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Some(raw.parse::<Team>()?),
            _ => None,
        };
        Ok(FilterCriteria {
            player: self.player.clone(),
            team,
            category: self.category.clone(),
            action: self.action.clone(),
            outcome: self.outcome.clone(),
        })
    }
}

/// Output flags shared by recording commands.
#[derive(Args, Debug, Clone, Default)]
pub struct ExportArgs {
    /// Container format: mp4|webm (default from config)
    #[arg(long)]
    pub format: Option<String>,

    /// Quality tier: high|medium|low (default from config)
    #[arg(long)]
    pub quality: Option<String>,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Dataset name used as the file name prefix
    #[arg(long)]
    pub dataset: Option<String>,
}

impl ExportArgs {
    pub fn encoding(&self, config: &AppConfig) -> anyhow::Result<EncodingConfig> {
        let format = self.format.as_deref().unwrap_or(&config.export.format);
        let quality = self.quality.as_deref().unwrap_or(&config.export.quality);
        let container: ContainerFormat = format.parse()?;
        let tier: QualityTier = quality.parse()?;
        Ok(EncodingConfig::new(container, tier))
    }

    pub fn output_dir(&self, config: &AppConfig) -> PathBuf {
        resolve_output_dir(self.output.clone(), config)
    }
}

pub fn resolve_output_dir(output: Option<PathBuf>, config: &AppConfig) -> PathBuf {
    output
        .or_else(|| {
            (!config.output_dir.as_os_str().is_empty()).then(|| config.output_dir.clone())
        })
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Load and validate a tag document.
pub fn load_tags(path: &PathBuf) -> anyhow::Result<TagDocument> {
    Ok(TagDocument::load(path)?)
}

/// Open `video` for playback.
pub async fn open_video(
    video: &PathBuf,
    config: &AppConfig,
) -> anyhow::Result<FfmpegPlaybackSurface> {
    let surface = FfmpegPlaybackSurface::open(video, &config.ffmpeg)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open video {}: {e}", video.display()))?;
    Ok(surface)
}

/// The process-wide recorder backed by ffmpeg.
pub fn ffmpeg_recorder(config: &AppConfig) -> Arc<ClipRecorder> {
    Arc::new(ClipRecorder::new(Arc::new(FfmpegCaptureBackend::new(
        &config.ffmpeg,
    ))))
}

/// A token cancelled on Ctrl-C.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling export");
            trigger.cancel();
        }
    });
    token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_args_to_criteria() {
        let args = FilterArgs {
            team: Some("Home".to_string()),
            action: Some("Goal".to_string()),
            ..Default::default()
        };
        let criteria = args.criteria().unwrap();
        assert_eq!(criteria.team, Some(Team::Home));
        assert_eq!(criteria.describe().unwrap(), "team: home, action: Goal");

        let bad = FilterArgs {
            team: Some("visitors".to_string()),
            ..Default::default()
        };
        assert!(bad.criteria().is_err());
    }

    #[test]
    fn test_export_args_fall_back_to_config() {
        let config = AppConfig::default();
        let encoding = ExportArgs::default().encoding(&config).unwrap();
        assert_eq!(encoding.mime_type, "video/mp4");
        assert_eq!(encoding.target_bitrate_bps, 5_000_000);

        let args = ExportArgs {
            format: Some("webm".to_string()),
            quality: Some("low".to_string()),
            ..Default::default()
        };
        let encoding = args.encoding(&config).unwrap();
        assert_eq!(encoding.mime_type, "video/webm");
        assert_eq!(encoding.target_bitrate_bps, 1_000_000);

        assert_eq!(ExportArgs::default().output_dir(&config), PathBuf::from("."));
    }
}

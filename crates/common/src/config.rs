//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory where exported clips and montages are written.
    pub output_dir: PathBuf,

    /// Default export settings.
    pub export: ExportDefaults,

    /// Timings of the clip and montage pipeline.
    pub pipeline: PipelineTimings,

    /// Title and end card rendering.
    pub compositor: CompositorConfig,

    /// External ffmpeg tooling.
    pub ffmpeg: FfmpegConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default export parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportDefaults {
    /// Container format ("mp4" or "webm").
    pub format: String,

    /// Quality tier ("high", "medium" or "low").
    pub quality: String,
}

/// How consecutive montage clips are blended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionStyle {
    /// Clear to black, then draw the fading frame: a clean dissolve.
    #[default]
    Dissolve,
    /// Draw the fading frame, then a rising black rect over whatever is
    /// already on the canvas. Produces a double exposure.
    Overlay,
}

/// Fixed timings and constants of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineTimings {
    /// Seconds captured on each side of an event timestamp.
    pub pad_secs: f64,

    /// How long a clip title card is held.
    pub title_dwell_ms: u64,

    /// How long the closing card is held.
    pub end_card_dwell_ms: u64,

    /// Live frame redraw period (about 30 Hz).
    pub frame_interval_ms: u64,

    /// Number of cross-fade steps.
    pub fade_steps: u32,

    /// Duration of a single cross-fade step.
    pub fade_step_ms: u64,

    /// Cross-fade style.
    pub transition: TransitionStyle,

    /// Give up on a seek that never completes. `None` waits forever.
    pub seek_timeout_ms: Option<u64>,

    /// Upper bound on the cursor restore after a job ends, used when no
    /// seek timeout is configured.
    pub restore_timeout_ms: u64,
}

/// Title and end card rendering settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositorConfig {
    /// TrueType font used for card text. Cards render without text when unset.
    pub font_path: Option<PathBuf>,
}

/// External ffmpeg binaries and capture rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FfmpegConfig {
    pub ffmpeg_bin: PathBuf,
    pub ffprobe_bin: PathBuf,

    /// Frame rate at which capture streams are sampled into the encoder.
    pub capture_fps: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "tagreel=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            format: "mp4".to_string(),
            quality: "high".to_string(),
        }
    }
}

impl Default for PipelineTimings {
    fn default() -> Self {
        Self {
            pad_secs: 2.0,
            title_dwell_ms: 1500,
            end_card_dwell_ms: 3000,
            frame_interval_ms: 1000 / 30,
            fade_steps: 10,
            fade_step_ms: 50,
            transition: TransitionStyle::Dissolve,
            seek_timeout_ms: None,
            restore_timeout_ms: 2000,
        }
    }
}

impl PipelineTimings {
    pub fn title_dwell(&self) -> Duration {
        Duration::from_millis(self.title_dwell_ms)
    }

    pub fn end_card_dwell(&self) -> Duration {
        Duration::from_millis(self.end_card_dwell_ms)
    }

    /// Frame clock period, never shorter than 1ms.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }

    pub fn fade_step(&self) -> Duration {
        Duration::from_millis(self.fade_step_ms)
    }

    pub fn seek_timeout(&self) -> Option<Duration> {
        self.seek_timeout_ms.map(Duration::from_millis)
    }

    /// Timeout for the cleanup seek. Always bounded, so a stalled surface
    /// cannot hold a finished job open.
    pub fn restore_timeout(&self) -> Duration {
        self.seek_timeout()
            .unwrap_or(Duration::from_millis(self.restore_timeout_ms))
    }
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            ffmpeg_bin: PathBuf::from("ffmpeg"),
            ffprobe_bin: PathBuf::from("ffprobe"),
            capture_fps: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("tagreel").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_defaults_match_observed_timings() {
        let timings = PipelineTimings::default();
        assert_eq!(timings.pad_secs, 2.0);
        assert_eq!(timings.title_dwell(), Duration::from_millis(1500));
        assert_eq!(timings.end_card_dwell(), Duration::from_secs(3));
        assert_eq!(timings.frame_interval(), Duration::from_millis(33));
        assert_eq!(timings.fade_steps, 10);
        assert_eq!(timings.fade_step(), Duration::from_millis(50));
        assert_eq!(timings.transition, TransitionStyle::Dissolve);
        assert!(timings.seek_timeout().is_none());
        assert_eq!(timings.restore_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let raw = r#"{ "pipeline": { "transition": "overlay", "seek_timeout_ms": 5000 } }"#;
        let config: AppConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.pipeline.transition, TransitionStyle::Overlay);
        assert_eq!(
            config.pipeline.seek_timeout(),
            Some(Duration::from_secs(5))
        );
        assert_eq!(config.pipeline.restore_timeout(), Duration::from_secs(5));
        assert_eq!(config.pipeline.title_dwell_ms, 1500);
        assert_eq!(config.export.format, "mp4");
        assert_eq!(config.ffmpeg.capture_fps, 30);
    }

    #[test]
    fn test_frame_interval_never_zero() {
        let timings = PipelineTimings {
            frame_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(timings.frame_interval(), Duration::from_millis(1));
    }
}

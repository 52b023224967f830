//! Output encoding settings, chosen once per export job.

use serde::{Deserialize, Serialize};

use crate::event::TagError;

/// Output container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    /// MP4 with H.264 video.
    #[default]
    Mp4,
    /// WebM with VP9 video.
    Webm,
}

impl ContainerFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ContainerFormat::Mp4 => "video/mp4",
            ContainerFormat::Webm => "video/webm",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ContainerFormat::Mp4 => "mp4",
            ContainerFormat::Webm => "webm",
        }
    }

    /// Container for a MIME type, ignoring codec parameters.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence {
            "video/mp4" => Some(ContainerFormat::Mp4),
            "video/webm" => Some(ContainerFormat::Webm),
            _ => None,
        }
    }
}

impl std::str::FromStr for ContainerFormat {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp4" => Ok(ContainerFormat::Mp4),
            "webm" => Ok(ContainerFormat::Webm),
            other => Err(TagError::ValidationError {
                message: format!("Unknown format: {other}. Use: mp4, webm"),
            }),
        }
    }
}

/// Quality tier selecting the target video bitrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    #[default]
    High,
    Medium,
    Low,
}

impl QualityTier {
    pub fn bitrate_bps(&self) -> u64 {
        match self {
            QualityTier::High => 5_000_000,
            QualityTier::Medium => 2_500_000,
            QualityTier::Low => 1_000_000,
        }
    }
}

impl std::str::FromStr for QualityTier {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(QualityTier::High),
            "medium" => Ok(QualityTier::Medium),
            "low" => Ok(QualityTier::Low),
            other => Err(TagError::ValidationError {
                message: format!("Unknown quality: {other}. Use: high, medium, low"),
            }),
        }
    }
}

/// Encoding requested from the clip recorder. Immutable for a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingConfig {
    pub container: ContainerFormat,
    pub mime_type: String,
    pub target_bitrate_bps: u64,
}

impl EncodingConfig {
    pub fn new(container: ContainerFormat, quality: QualityTier) -> Self {
        Self {
            container,
            mime_type: container.mime_type().to_string(),
            target_bitrate_bps: quality.bitrate_bps(),
        }
    }

    /// File extension of the container.
    pub fn extension(&self) -> &'static str {
        self.container.extension()
    }
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self::new(ContainerFormat::default(), QualityTier::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_bitrates() {
        assert_eq!(QualityTier::High.bitrate_bps(), 5_000_000);
        assert_eq!(QualityTier::Medium.bitrate_bps(), 2_500_000);
        assert_eq!(QualityTier::Low.bitrate_bps(), 1_000_000);
    }

    #[test]
    fn test_config_from_parts() {
        let config = EncodingConfig::new(ContainerFormat::Webm, QualityTier::Medium);
        assert_eq!(config.mime_type, "video/webm");
        assert_eq!(config.extension(), "webm");
        assert_eq!(config.target_bitrate_bps, 2_500_000);
    }

    #[test]
    fn test_default_is_high_quality_mp4() {
        let config = EncodingConfig::default();
        assert_eq!(config.container, ContainerFormat::Mp4);
        assert_eq!(config.target_bitrate_bps, 5_000_000);
    }

    #[test]
    fn test_parse_format_and_quality() {
        assert_eq!("WEBM".parse::<ContainerFormat>().unwrap(), ContainerFormat::Webm);
        assert_eq!("low".parse::<QualityTier>().unwrap(), QualityTier::Low);
        assert!("gif".parse::<ContainerFormat>().is_err());
        assert!("ultra".parse::<QualityTier>().is_err());
    }

    #[test]
    fn test_from_mime_ignores_codecs() {
        assert_eq!(
            ContainerFormat::from_mime("video/webm;codecs=vp9"),
            Some(ContainerFormat::Webm)
        );
        assert_eq!(ContainerFormat::from_mime("video/ogg"), None);
    }
}

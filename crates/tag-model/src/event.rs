//! Tagged event types supplied by the event store.
//!
//! A tag document is a JSON file holding the dataset name, the display
//! names of both teams, and the events tagged on the match video.
//! Timestamps are seconds from the start of the video.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Dataset name used when a document or request does not carry one.
pub const DEFAULT_DATASET_NAME: &str = "game";

/// Which side an event is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Home,
    Away,
}

impl Team {
    /// Lowercase key used in filters and filenames.
    pub fn as_str(&self) -> &'static str {
        match self {
            Team::Home => "home",
            Team::Away => "away",
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Team {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "home" => Ok(Team::Home),
            "away" => Ok(Team::Away),
            other => Err(TagError::ValidationError {
                message: format!("Unknown team '{other}'. Use: home, away"),
            }),
        }
    }
}

/// A single tagged moment in the match video. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedEvent {
    /// Unique identifier assigned by the event store.
    pub id: String,

    /// Seconds from the start of the video.
    pub timestamp: f64,

    /// Event category (e.g., "Scoring", "Defense").
    pub category: String,

    /// Action within the category (e.g., "Goal", "Tackle").
    pub action: String,

    pub team: Team,

    #[serde(default)]
    pub player: Option<String>,

    #[serde(default)]
    pub outcome: Option<String>,

    #[serde(default)]
    pub notes: String,
}

impl TaggedEvent {
    /// Create an event with no player, outcome, or notes.
    pub fn new(
        id: impl Into<String>,
        timestamp: f64,
        category: impl Into<String>,
        action: impl Into<String>,
        team: Team,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp,
            category: category.into(),
            action: action.into(),
            team,
            player: None,
            outcome: None,
            notes: String::new(),
        }
    }

    pub fn with_player(mut self, player: impl Into<String>) -> Self {
        self.player = Some(player.into());
        self
    }

    pub fn with_outcome(mut self, outcome: impl Into<String>) -> Self {
        self.outcome = Some(outcome.into());
        self
    }

    /// Order two events by timestamp. NaN sorts last.
    pub fn cmp_timestamp(&self, other: &Self) -> Ordering {
        self.timestamp.total_cmp(&other.timestamp)
    }
}

/// Sort events ascending by timestamp. Equal timestamps keep input order.
pub fn sort_by_timestamp(events: &mut [TaggedEvent]) {
    events.sort_by(TaggedEvent::cmp_timestamp);
}

/// Display names for the two sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamNames {
    pub home: String,
    pub away: String,
}

impl Default for TeamNames {
    fn default() -> Self {
        Self {
            home: "Home Team".to_string(),
            away: "Away Team".to_string(),
        }
    }
}

impl TeamNames {
    pub fn name(&self, team: Team) -> &str {
        match team {
            Team::Home => &self.home,
            Team::Away => &self.away,
        }
    }
}

/// A dataset of tagged events as exported by the event store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagDocument {
    #[serde(default = "default_dataset_name")]
    pub dataset_name: String,

    #[serde(default)]
    pub teams: TeamNames,

    pub events: Vec<TaggedEvent>,
}

fn default_dataset_name() -> String {
    DEFAULT_DATASET_NAME.to_string()
}

impl TagDocument {
    /// Load and validate a tag document from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TagError> {
        let path = path.as_ref().to_path_buf();
        let json = std::fs::read_to_string(&path).map_err(|e| TagError::IoError {
            path: path.clone(),
            source: e,
        })?;
        let document: TagDocument =
            serde_json::from_str(&json).map_err(|e| TagError::ParseError {
                path: path.clone(),
                source: e,
            })?;
        document.validate()?;
        Ok(document)
    }

    /// Reject events the pipeline cannot place on the video timeline.
    pub fn validate(&self) -> Result<(), TagError> {
        for event in &self.events {
            if !event.timestamp.is_finite() || event.timestamp < 0.0 {
                return Err(TagError::ValidationError {
                    message: format!(
                        "Event {} has invalid timestamp {}",
                        event.id, event.timestamp
                    ),
                });
            }
        }
        Ok(())
    }

    /// Dataset name, falling back to [`DEFAULT_DATASET_NAME`] when blank.
    pub fn dataset_name(&self) -> &str {
        if self.dataset_name.trim().is_empty() {
            DEFAULT_DATASET_NAME
        } else {
            &self.dataset_name
        }
    }
}

/// Errors that can occur when loading tagged events.
#[derive(Debug, thiserror::Error)]
pub enum TagError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid tags: {message}")]
    ValidationError { message: String },
}

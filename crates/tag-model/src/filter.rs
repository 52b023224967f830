//! Filter engine: reduces the event list to the subset a user asked for.

use serde::{Deserialize, Serialize};

use crate::event::{sort_by_timestamp, TaggedEvent, Team};

/// User-chosen criteria. Unset (or blank) fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub player: Option<String>,
    pub team: Option<Team>,
    pub category: Option<String>,
    pub action: Option<String>,
    pub outcome: Option<String>,
}

impl FilterCriteria {
    /// Criteria matching every event.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn team(team: Team) -> Self {
        Self {
            team: Some(team),
            ..Self::default()
        }
    }

    /// Whether `event` satisfies every active criterion.
    pub fn matches(&self, event: &TaggedEvent) -> bool {
        if let Some(player) = active(&self.player) {
            if event.player.as_deref() != Some(player) {
                return false;
            }
        }
        if let Some(team) = self.team {
            if event.team != team {
                return false;
            }
        }
        if let Some(category) = active(&self.category) {
            if event.category != category {
                return false;
            }
        }
        if let Some(action) = active(&self.action) {
            if event.action != action {
                return false;
            }
        }
        if let Some(outcome) = active(&self.outcome) {
            if event.outcome.as_deref() != Some(outcome) {
                return false;
            }
        }
        true
    }

    /// Matching events, sorted ascending by timestamp.
    pub fn apply(&self, events: &[TaggedEvent]) -> Vec<TaggedEvent> {
        let mut matching: Vec<TaggedEvent> = events
            .iter()
            .filter(|event| self.matches(event))
            .cloned()
            .collect();
        sort_by_timestamp(&mut matching);
        matching
    }

    /// Number of matching events.
    pub fn count(&self, events: &[TaggedEvent]) -> usize {
        events.iter().filter(|event| self.matches(event)).count()
    }

    /// Active `(key, value)` pairs in the fixed order
    /// player, team, category, action, outcome.
    pub fn active_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(player) = active(&self.player) {
            pairs.push(("player", player.to_string()));
        }
        if let Some(team) = self.team {
            pairs.push(("team", team.as_str().to_string()));
        }
        if let Some(category) = active(&self.category) {
            pairs.push(("category", category.to_string()));
        }
        if let Some(action) = active(&self.action) {
            pairs.push(("action", action.to_string()));
        }
        if let Some(outcome) = active(&self.outcome) {
            pairs.push(("outcome", outcome.to_string()));
        }
        pairs
    }

    pub fn is_empty(&self) -> bool {
        self.active_pairs().is_empty()
    }

    /// Human-readable description such as `"team: home, action: Goal"`.
    pub fn describe(&self) -> Option<String> {
        let pairs = self.active_pairs();
        if pairs.is_empty() {
            return None;
        }
        Some(
            pairs
                .iter()
                .map(|(key, value)| format!("{key}: {value}"))
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}

fn active(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_events() -> Vec<TaggedEvent> {
        vec![
            TaggedEvent::new("3", 40.0, "Defense", "Tackle", Team::Away).with_player("Player 8"),
            TaggedEvent::new("1", 10.0, "Scoring", "Goal", Team::Home)
                .with_player("Player 7")
                .with_outcome("Successful"),
            TaggedEvent::new("2", 25.0, "Scoring", "Point", Team::Home),
        ]
    }

    #[test]
    fn test_empty_criteria_match_all_sorted() {
        let events = sample_events();
        let matching = FilterCriteria::all().apply(&events);
        let stamps: Vec<f64> = matching.iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![10.0, 25.0, 40.0]);
    }

    #[test]
    fn test_team_filter() {
        let events = sample_events();
        let matching = FilterCriteria::team(Team::Home).apply(&events);
        assert_eq!(matching.len(), 2);
        assert!(matching.iter().all(|e| e.team == Team::Home));
    }

    #[test]
    fn test_player_filter_excludes_events_without_player() {
        let events = sample_events();
        let criteria = FilterCriteria {
            player: Some("Player 7".to_string()),
            ..Default::default()
        };
        let matching = criteria.apply(&events);
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].id, "1");
    }

    #[test]
    fn test_blank_values_are_inactive() {
        let criteria = FilterCriteria {
            category: Some("  ".to_string()),
            outcome: Some(String::new()),
            ..Default::default()
        };
        assert!(criteria.is_empty());
        assert_eq!(criteria.count(&sample_events()), 3);
    }

    #[test]
    fn test_no_match() {
        let criteria = FilterCriteria {
            action: Some("Free Kick".to_string()),
            ..Default::default()
        };
        assert!(criteria.apply(&sample_events()).is_empty());
    }

    #[test]
    fn test_pairs_follow_fixed_key_order() {
        let criteria = FilterCriteria {
            outcome: Some("Successful".to_string()),
            team: Some(Team::Away),
            player: Some("Player 8".to_string()),
            ..Default::default()
        };
        let keys: Vec<_> = criteria.active_pairs().iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["player", "team", "outcome"]);
        assert_eq!(
            criteria.describe().as_deref(),
            Some("player: Player 8, team: away, outcome: Successful")
        );
    }

    #[test]
    fn test_describe_empty() {
        assert_eq!(FilterCriteria::all().describe(), None);
    }
}

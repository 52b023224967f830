//! Export finalizer: output names and delivery to a file sink.

use tagreel_common::error::TagreelResult;
use tagreel_media_core::{EncodedBlob, FileSink, RecordedMedia};
use tagreel_tag_model::{format_time, FilterCriteria, TaggedEvent, DEFAULT_DATASET_NAME};

/// What kind of output a name is derived for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    /// A single continuous montage.
    Montage,
    /// A batch of separately recorded clips.
    ClipBatch,
}

/// Active filters rendered as `key-value` pairs joined by `_`.
///
/// Whitespace runs in values collapse to `_`. Literal `%`, `_`, `-` and `/`
/// in values are percent-escaped, so a value can never read as a pair
/// separator and different filters never share a suffix.
pub fn filter_suffix(criteria: &FilterCriteria) -> Option<String> {
    let pairs = criteria.active_pairs();
    if pairs.is_empty() {
        return None;
    }
    Some(
        pairs
            .iter()
            .map(|(key, value)| format!("{key}-{}", encode_value(value)))
            .collect::<Vec<_>>()
            .join("_"),
    )
}

fn encode_value(value: &str) -> String {
    value
        .split_whitespace()
        .map(escape_separators)
        .collect::<Vec<_>>()
        .join("_")
}

fn escape_separators(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    for ch in word.chars() {
        match ch {
            '%' => out.push_str("%25"),
            '-' => out.push_str("%2D"),
            '/' => out.push_str("%2F"),
            '_' => out.push_str("%5F"),
            other => out.push(other),
        }
    }
    out
}

fn base_or_default(base: &str) -> &str {
    if base.trim().is_empty() {
        DEFAULT_DATASET_NAME
    } else {
        base
    }
}

/// Suggested filename for a montage or clip batch.
pub fn derive_filename(
    base: &str,
    criteria: &FilterCriteria,
    extension: &str,
    kind: ExportKind,
) -> String {
    let base = base_or_default(base);
    match (kind, filter_suffix(criteria)) {
        (ExportKind::Montage, Some(desc)) => format!("{base}_montage_{desc}.{extension}"),
        (ExportKind::Montage, None) => format!("{base}_montage.{extension}"),
        (ExportKind::ClipBatch, Some(desc)) => format!("{base}_{desc}_clips.{extension}"),
        (ExportKind::ClipBatch, None) => format!("{base}_selected_clips.{extension}"),
    }
}

/// Name of one clip in a batch. `index` is 1-based.
pub fn clip_filename(base: &str, index: usize, event: &TaggedEvent, extension: &str) -> String {
    format!(
        "{}/clips/clip_{index}_{}_{}_{}.{extension}",
        base_or_default(base),
        event.category,
        event.action,
        format_time(event.timestamp)
    )
}

/// Name of a quick clip centred on `center_secs`.
pub fn quick_clip_filename(base: &str, center_secs: f64, extension: &str) -> String {
    format!(
        "{}/clips/clip_{center_secs:.2}s.{extension}",
        base_or_default(base)
    )
}

/// Name of a still frame captured at `secs`.
pub fn snapshot_filename(base: &str, secs: f64) -> String {
    format!("{}/frames/action_{secs:.2}s.png", base_or_default(base))
}

/// Attach `filename` to `media` and hand it to the sink.
pub async fn deliver(
    sink: &mut dyn FileSink,
    media: RecordedMedia,
    filename: &str,
) -> TagreelResult<EncodedBlob> {
    let blob = media.into_blob(filename);
    tracing::info!(
        filename = %blob.filename,
        mime_type = %blob.mime_type,
        bytes = blob.bytes.len(),
        "Delivering export"
    );
    sink.persist(blob.clone()).await?;
    Ok(blob)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use proptest::prelude::*;
    use tagreel_tag_model::Team;

    #[test]
    fn test_montage_name_with_team_filter() {
        let name = derive_filename(
            "MatchA",
            &FilterCriteria::team(Team::Home),
            "webm",
            ExportKind::Montage,
        );
        assert_eq!(name, "MatchA_montage_team-home.webm");
    }

    #[test]
    fn test_names_without_filters() {
        let all = FilterCriteria::all();
        assert_eq!(
            derive_filename("MatchA", &all, "mp4", ExportKind::Montage),
            "MatchA_montage.mp4"
        );
        assert_eq!(
            derive_filename("MatchA", &all, "mp4", ExportKind::ClipBatch),
            "MatchA_selected_clips.mp4"
        );
        assert_eq!(
            derive_filename("  ", &all, "mp4", ExportKind::Montage),
            "game_montage.mp4"
        );
    }

    #[test]
    fn test_suffix_order_and_whitespace() {
        let criteria = FilterCriteria {
            outcome: Some("On Target".to_string()),
            player: Some("Jane  Doe".to_string()),
            category: Some("Scoring".to_string()),
            ..Default::default()
        };
        assert_eq!(
            derive_filename("cup final", &criteria, "webm", ExportKind::ClipBatch),
            "cup final_player-Jane_Doe_category-Scoring_outcome-On_Target_clips.webm"
        );
    }

    #[test]
    fn test_separators_in_values_are_escaped() {
        let spoofed = FilterCriteria {
            player: Some("x_team-home".to_string()),
            ..Default::default()
        };
        let genuine = FilterCriteria {
            player: Some("x".to_string()),
            team: Some(Team::Home),
            ..Default::default()
        };
        let spoofed_name = derive_filename("MatchA", &spoofed, "webm", ExportKind::Montage);
        let genuine_name = derive_filename("MatchA", &genuine, "webm", ExportKind::Montage);
        assert_eq!(spoofed_name, "MatchA_montage_player-x%5Fteam%2Dhome.webm");
        assert_eq!(genuine_name, "MatchA_montage_player-x_team-home.webm");

        let action = FilterCriteria {
            action: Some("Free-kick 50/50 %".to_string()),
            ..Default::default()
        };
        assert_eq!(
            filter_suffix(&action).unwrap(),
            "action-Free%2Dkick_50%2F50_%25"
        );
    }

    #[test]
    fn test_clip_and_frame_names() {
        let event = TaggedEvent::new("e1", 75.4, "Scoring", "Goal", Team::Home);
        assert_eq!(
            clip_filename("MatchA", 1, &event, "mp4"),
            "MatchA/clips/clip_1_Scoring_Goal_01:15.mp4"
        );
        assert_eq!(
            quick_clip_filename("MatchA", 12.345, "webm"),
            "MatchA/clips/clip_12.35s.webm"
        );
        assert_eq!(snapshot_filename("", 3.0), "game/frames/action_3.00s.png");
    }

    #[derive(Default)]
    struct MemorySink {
        blobs: Vec<EncodedBlob>,
    }

    #[async_trait]
    impl FileSink for MemorySink {
        async fn persist(&mut self, blob: EncodedBlob) -> TagreelResult<()> {
            self.blobs.push(blob);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_deliver_persists_named_blob() {
        let mut sink = MemorySink::default();
        let media = RecordedMedia {
            bytes: vec![7; 16],
            mime_type: "video/webm".to_string(),
        };
        let blob = deliver(&mut sink, media, "MatchA_montage.webm").await.unwrap();
        assert_eq!(blob.filename, "MatchA_montage.webm");
        assert_eq!(sink.blobs, vec![blob]);
    }

    /// Values drawn from an alphabet rich in separators and whitespace.
    fn value() -> impl Strategy<Value = Option<String>> {
        prop::option::of("[a-z_/% -]{1,8}|team-home|x_team")
    }

    /// Active pairs as the name sees them: whitespace runs are one gap.
    fn normalized_pairs(criteria: &FilterCriteria) -> Vec<(&'static str, String)> {
        criteria
            .active_pairs()
            .into_iter()
            .map(|(key, value)| (key, value.split_whitespace().collect::<Vec<_>>().join(" ")))
            .collect()
    }

    fn criteria() -> impl Strategy<Value = FilterCriteria> {
        (
            value(),
            prop::option::of(prop_oneof![Just(Team::Home), Just(Team::Away)]),
            value(),
            value(),
            value(),
        )
            .prop_map(|(player, team, category, action, outcome)| FilterCriteria {
                player,
                team,
                category,
                action,
                outcome,
            })
    }

    proptest! {
        #[test]
        fn prop_distinct_filters_give_distinct_names(a in criteria(), b in criteria()) {
            let name_a = derive_filename("MatchA", &a, "mp4", ExportKind::Montage);
            let name_b = derive_filename("MatchA", &b, "mp4", ExportKind::Montage);
            prop_assert_eq!(
                normalized_pairs(&a) == normalized_pairs(&b),
                name_a == name_b
            );
        }

        #[test]
        fn prop_names_are_deterministic(c in criteria()) {
            prop_assert_eq!(
                derive_filename("MatchA", &c, "webm", ExportKind::ClipBatch),
                derive_filename("MatchA", &c, "webm", ExportKind::ClipBatch)
            );
        }
    }
}

use std::path::PathBuf;

use tagreel_tag_model::{format_time, plan_clips, FilterCriteria, TagDocument, Team, CLIP_PAD_SECS};

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join("sample-match")
        .join("tags.json")
}

fn load_fixture() -> TagDocument {
    TagDocument::load(fixture_path()).expect("fixture tags should load")
}

#[test]
fn sample_match_loads_with_team_names() {
    let document = load_fixture();
    assert_eq!(document.dataset_name(), "MatchA");
    assert_eq!(document.events.len(), 5);
    assert_eq!(document.teams.name(Team::Home), "Rovers");
    assert_eq!(document.teams.name(Team::Away), "United");
}

#[test]
fn sample_match_away_scoring_windows() {
    let document = load_fixture();
    let criteria = FilterCriteria {
        team: Some(Team::Away),
        category: Some("Scoring".to_string()),
        ..Default::default()
    };
    let selected = criteria.apply(&document.events);
    let clips = plan_clips(&selected, 90.0, CLIP_PAD_SECS);

    let summary: Vec<_> = clips
        .iter()
        .map(|clip| {
            (
                clip.event.id.as_str(),
                format_time(clip.event.timestamp),
                clip.window.start,
                clip.window.end,
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("ev-03", "00:22".to_string(), 20.25, 24.25),
            ("ev-05", "01:29".to_string(), 87.0, 90.0),
        ]
    );
}

#[test]
fn sample_match_all_events_run_in_time_order() {
    let document = load_fixture();
    let clips = plan_clips(&FilterCriteria::all().apply(&document.events), 90.0, CLIP_PAD_SECS);
    let ids: Vec<_> = clips.iter().map(|clip| clip.event.id.as_str()).collect();
    assert_eq!(ids, vec!["ev-02", "ev-01", "ev-03", "ev-04", "ev-05"]);
    assert_eq!((clips[0].window.start, clips[0].window.end), (0.0, 2.5));
}

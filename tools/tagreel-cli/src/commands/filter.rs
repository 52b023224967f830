//! Preview which events a filter selects.

use std::path::PathBuf;

use serde::Serialize;
use tagreel_tag_model::{format_time, plan_clips, TagDocument, CLIP_PAD_SECS};

use super::{load_tags, FilterArgs};

#[derive(Debug, Serialize)]
struct PreviewRow {
    index: usize,
    id: String,
    time: String,
    timestamp: f64,
    team: String,
    category: String,
    action: String,
    player: Option<String>,
    start: f64,
    end: f64,
}

fn preview(
    document: &TagDocument,
    filter: &FilterArgs,
    duration: f64,
) -> anyhow::Result<Vec<PreviewRow>> {
    let selected = filter.criteria()?.apply(&document.events);
    Ok(plan_clips(&selected, duration, CLIP_PAD_SECS)
        .into_iter()
        .map(|clip| PreviewRow {
            index: clip.index + 1,
            time: format_time(clip.event.timestamp),
            timestamp: clip.event.timestamp,
            team: document.teams.name(clip.event.team).to_string(),
            id: clip.event.id,
            category: clip.event.category,
            action: clip.event.action,
            player: clip.event.player,
            start: clip.window.start,
            end: clip.window.end,
        })
        .collect())
}

pub fn run(
    tags: PathBuf,
    filter: FilterArgs,
    duration: Option<f64>,
    json: bool,
) -> anyhow::Result<()> {
    let document = load_tags(&tags)?;
    // Without a known duration, windows are only clamped at zero.
    let duration = duration.unwrap_or(f64::MAX);
    let rows = preview(&document, &filter, duration)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let description = filter
        .criteria()?
        .describe()
        .unwrap_or_else(|| "all events".to_string());
    println!("Dataset: {}", document.dataset_name());
    println!("Filter: {description}");
    println!("{} of {} events selected", rows.len(), document.events.len());
    println!("{}", "=".repeat(50));
    for row in &rows {
        println!(
            "{:>3}. [{}] {}: {} ({}{}) clip {:.2}s-{:.2}s",
            row.index,
            row.time,
            row.category,
            row.action,
            row.team,
            row.player
                .as_deref()
                .map(|p| format!(", {p}"))
                .unwrap_or_default(),
            row.start,
            row.end
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagreel_tag_model::{TaggedEvent, Team, TeamNames};

    #[test]
    fn test_preview_lists_windows_in_order() {
        let document = TagDocument {
            dataset_name: "MatchA".to_string(),
            teams: TeamNames::default(),
            events: vec![
                TaggedEvent::new("b", 40.0, "Defense", "Tackle", Team::Away),
                TaggedEvent::new("a", 1.0, "Scoring", "Goal", Team::Home),
            ],
        };
        let rows = preview(&document, &FilterArgs::default(), 90.0).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "a");
        assert_eq!((rows[0].start, rows[0].end), (0.0, 3.0));
        assert_eq!(rows[1].team, "Away Team");
        assert_eq!((rows[1].start, rows[1].end), (38.0, 42.0));

        let home = FilterArgs {
            team: Some("home".to_string()),
            ..Default::default()
        };
        assert_eq!(preview(&document, &home, 90.0).unwrap().len(), 1);
    }
}

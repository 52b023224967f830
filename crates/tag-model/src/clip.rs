//! Clip windows: the padded time range captured around an event.

use crate::event::TaggedEvent;

/// Seconds captured on each side of an event timestamp.
pub const CLIP_PAD_SECS: f64 = 2.0;

/// A `[start, end]` range on the video timeline, in seconds.
///
/// Always satisfies `0 <= start <= end <= duration` for the duration it was
/// derived against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipWindow {
    pub start: f64,
    pub end: f64,
}

impl ClipWindow {
    /// Window of `pad` seconds either side of `timestamp`, clamped to
    /// `[0, duration]`.
    ///
    /// Timestamps outside the video collapse to an empty window at the
    /// nearest edge. Negative or non-finite durations are treated as zero.
    pub fn around(timestamp: f64, duration: f64, pad: f64) -> Self {
        let duration = if duration.is_finite() {
            duration.max(0.0)
        } else {
            0.0
        };
        let pad = if pad.is_finite() { pad.abs() } else { 0.0 };

        let start = (timestamp - pad).max(0.0).min(duration);
        let end = (timestamp + pad).min(duration).max(start);
        Self { start, end }
    }

    /// Window with the default pad.
    pub fn for_event(event: &TaggedEvent, duration: f64) -> Self {
        Self::around(event.timestamp, duration, CLIP_PAD_SECS)
    }

    /// Length of the window in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.duration() <= 0.0
    }
}

/// An event paired with its window, ready to be captured.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedClip {
    /// 0-based position in capture order.
    pub index: usize,
    pub event: TaggedEvent,
    pub window: ClipWindow,
}

/// Pair each event with its window, in ascending timestamp order.
pub fn plan_clips(events: &[TaggedEvent], duration: f64, pad: f64) -> Vec<PlannedClip> {
    let mut sorted = events.to_vec();
    crate::event::sort_by_timestamp(&mut sorted);
    sorted
        .into_iter()
        .enumerate()
        .map(|(index, event)| PlannedClip {
            index,
            window: ClipWindow::around(event.timestamp, duration, pad),
            event,
        })
        .collect()
}

/// Format seconds as zero-padded `MM:SS`, flooring both parts.
///
/// Negative or non-finite values render as `00:00`.
pub fn format_time(secs: f64) -> String {
    if !secs.is_finite() || secs < 0.0 {
        return "00:00".to_string();
    }
    let total = secs.floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

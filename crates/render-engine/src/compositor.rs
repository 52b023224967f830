//! Frame compositor: title cards, end cards, live frames and transitions.
//!
//! Every operation draws on a borrowed [`DrawSurface`] and presents the
//! result, so whatever recorder is attached to the surface's capture stream
//! sees exactly what was drawn.

use std::time::Duration;

use tagreel_common::config::{PipelineTimings, TransitionStyle};
use tagreel_common::error::TagreelResult;
use tagreel_common::{dwell, CancellationToken};
use tagreel_media_core::{Color, DrawSurface, TextStyle, VideoFrame};
use tagreel_tag_model::{format_time, FilterCriteria, TaggedEvent, TeamNames};

/// Static card shown before each montage clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleCard {
    /// `"<category>: <action>"`
    pub title: String,
    /// `"<team name> - <player>"`
    pub subtitle: String,
    /// `"Time: MM:SS"`
    pub time_line: String,
}

impl TitleCard {
    pub fn for_event(event: &TaggedEvent, teams: &TeamNames) -> Self {
        let player = event
            .player
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or("No player");
        Self {
            title: format!("{}: {}", event.category, event.action),
            subtitle: format!("{} - {}", teams.name(event.team), player),
            time_line: format!("Time: {}", format_time(event.timestamp)),
        }
    }
}

/// Closing card of a montage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndCard {
    pub title: String,
    pub count_line: String,
}

impl EndCard {
    pub fn new(criteria: &FilterCriteria, clip_count: usize) -> Self {
        let title = match criteria.describe() {
            Some(desc) => format!("Montage: {desc}"),
            None => "Clip Montage".to_string(),
        };
        Self {
            title,
            count_line: format!("{clip_count} clips"),
        }
    }
}

/// Draws pipeline frames onto a canvas.
#[derive(Debug, Clone)]
pub struct FrameCompositor {
    fade_steps: u32,
    fade_step: Duration,
    transition: TransitionStyle,
}

impl FrameCompositor {
    pub fn new(timings: &PipelineTimings) -> Self {
        Self {
            fade_steps: timings.fade_steps,
            fade_step: timings.fade_step(),
            transition: timings.transition,
        }
    }

    pub fn transition(&self) -> TransitionStyle {
        self.transition
    }

    /// Alpha of the fading frame at each transition step, from 1.0 down to
    /// 0.0 inclusive.
    pub fn fade_alphas(&self) -> Vec<f32> {
        match self.fade_steps {
            0 => Vec::new(),
            1 => vec![0.0],
            n => (0..n)
                .map(|i| 1.0 - i as f32 / (n - 1) as f32)
                .collect(),
        }
    }

    pub fn render_title_card(&self, canvas: &mut dyn DrawSurface, card: &TitleCard) {
        let (cx, cy) = center(canvas);
        canvas.set_global_alpha(1.0);
        canvas.fill(Color::BLACK);
        canvas.fill_text(&card.title, &TextStyle::bold(32.0), cx, cy - 40.0);
        let line = TextStyle::regular(24.0);
        canvas.fill_text(&card.subtitle, &line, cx, cy);
        canvas.fill_text(&card.time_line, &line, cx, cy + 30.0);
        canvas.present();
    }

    pub fn render_end_card(&self, canvas: &mut dyn DrawSurface, card: &EndCard) {
        let (cx, cy) = center(canvas);
        canvas.set_global_alpha(1.0);
        canvas.fill(Color::BLACK);
        canvas.fill_text(&card.title, &TextStyle::bold(36.0), cx, cy - 20.0);
        canvas.fill_text(&card.count_line, &TextStyle::regular(24.0), cx, cy + 20.0);
        canvas.present();
    }

    /// Copy the current playback frame onto the canvas. Returns `false` when
    /// there was no frame to draw.
    pub fn draw_live_frame(
        &self,
        canvas: &mut dyn DrawSurface,
        frame: Option<&VideoFrame>,
    ) -> bool {
        let Some(frame) = frame else {
            return false;
        };
        canvas.draw_frame(frame);
        canvas.present();
        true
    }

    /// Fade `frame` out to black over the configured steps.
    ///
    /// Global alpha is back at 1.0 when this returns, whatever the outcome.
    pub async fn cross_fade(
        &self,
        canvas: &mut dyn DrawSurface,
        frame: Option<&VideoFrame>,
        cancel: &CancellationToken,
    ) -> TagreelResult<()> {
        let result = self.fade_steps_inner(canvas, frame, cancel).await;
        canvas.set_global_alpha(1.0);
        result
    }

    async fn fade_steps_inner(
        &self,
        canvas: &mut dyn DrawSurface,
        frame: Option<&VideoFrame>,
        cancel: &CancellationToken,
    ) -> TagreelResult<()> {
        for alpha in self.fade_alphas() {
            match self.transition {
                TransitionStyle::Dissolve => {
                    canvas.set_global_alpha(1.0);
                    canvas.fill(Color::BLACK);
                    if let Some(frame) = frame {
                        canvas.set_global_alpha(alpha);
                        canvas.draw_frame(frame);
                    }
                }
                TransitionStyle::Overlay => {
                    if let Some(frame) = frame {
                        canvas.set_global_alpha(alpha);
                        canvas.draw_frame(frame);
                    }
                    canvas.set_global_alpha(1.0 - alpha);
                    canvas.fill(Color::BLACK);
                }
            }
            canvas.present();
            dwell(self.fade_step, cancel).await?;
        }
        Ok(())
    }
}

fn center(canvas: &dyn DrawSurface) -> (f32, f32) {
    (canvas.width() as f32 / 2.0, canvas.height() as f32 / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::RasterCanvas;
    use tagreel_tag_model::Team;

    fn compositor(transition: TransitionStyle) -> FrameCompositor {
        FrameCompositor::new(&PipelineTimings {
            transition,
            ..Default::default()
        })
    }

    #[test]
    fn test_title_card_text() {
        let event = TaggedEvent::new("e1", 70.0, "Scoring", "Goal", Team::Home).with_player("Nine");
        let card = TitleCard::for_event(&event, &TeamNames::default());
        assert_eq!(card.title, "Scoring: Goal");
        assert_eq!(card.subtitle, "Home Team - Nine");
        assert_eq!(card.time_line, "Time: 01:10");

        let anonymous = TaggedEvent::new("e2", 5.0, "Defense", "Tackle", Team::Away);
        let card = TitleCard::for_event(&anonymous, &TeamNames::default());
        assert_eq!(card.subtitle, "Away Team - No player");
    }

    #[test]
    fn test_end_card_text() {
        let card = EndCard::new(&FilterCriteria::team(Team::Home), 2);
        assert_eq!(card.title, "Montage: team: home");
        assert_eq!(card.count_line, "2 clips");
        assert_eq!(EndCard::new(&FilterCriteria::all(), 0).title, "Clip Montage");
    }

    #[test]
    fn test_title_card_layout() {
        let mut canvas = RasterCanvas::new(640, 360);
        canvas.fill(Color::WHITE);
        let event = TaggedEvent::new("e1", 10.0, "Scoring", "Goal", Team::Home);
        compositor(TransitionStyle::Dissolve)
            .render_title_card(&mut canvas, &TitleCard::for_event(&event, &TeamNames::default()));

        let runs = canvas.text_runs();
        assert_eq!(runs.len(), 3);
        assert_eq!((runs[0].x, runs[0].y), (320.0, 140.0));
        assert!(runs[0].bold && runs[0].size_px == 32.0);
        assert_eq!(runs[1].y, 180.0);
        assert_eq!(runs[2].y, 210.0);
        assert_eq!(canvas.pixel(0, 0), Some([0, 0, 0, 255]));
        assert_eq!(canvas.presented_frames(), 1);
    }

    #[test]
    fn test_fade_alphas_span_one_to_zero() {
        let alphas = compositor(TransitionStyle::Dissolve).fade_alphas();
        assert_eq!(alphas.len(), 10);
        assert_eq!(alphas[0], 1.0);
        assert_eq!(alphas[9], 0.0);
        assert!(alphas.windows(2).all(|w| w[0] > w[1]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dissolve_ends_black_with_alpha_reset() {
        let mut canvas = RasterCanvas::new(4, 4);
        let frame = VideoFrame::solid(4, 4, Color::WHITE);
        let cancel = CancellationToken::new();
        let start = tokio::time::Instant::now();

        compositor(TransitionStyle::Dissolve)
            .cross_fade(&mut canvas, Some(&frame), &cancel)
            .await
            .unwrap();

        assert_eq!(start.elapsed(), Duration::from_millis(500));
        assert_eq!(canvas.global_alpha(), 1.0);
        assert_eq!(canvas.pixel(2, 2), Some([0, 0, 0, 255]));
        assert_eq!(canvas.presented_frames(), 10);
    }

    #[test]
    fn test_single_step_fade_goes_straight_to_black() {
        let timings = PipelineTimings {
            fade_steps: 1,
            ..Default::default()
        };
        assert_eq!(FrameCompositor::new(&timings).fade_alphas(), vec![0.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_dissolve_step_shows_full_frame() {
        let mut canvas = RasterCanvas::new(4, 4);
        let stream = canvas.capture_stream();
        let frame = VideoFrame::solid(4, 4, Color::WHITE);
        let cancel = CancellationToken::new();
        let fade = compositor(TransitionStyle::Dissolve);

        let task = fade.cross_fade(&mut canvas, Some(&frame), &cancel);
        tokio::pin!(task);
        tokio::select! {
            _ = &mut task => panic!("fade finished before its first step elapsed"),
            _ = tokio::time::sleep(Duration::from_millis(10)) => {}
        }
        assert_eq!(
            stream.latest_frame().unwrap().pixel(0, 0),
            Some([255, 255, 255, 255])
        );

        cancel.cancel();
        assert!(task.await.unwrap_err().is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_fade_resets_alpha() {
        let mut canvas = RasterCanvas::new(4, 4);
        let frame = VideoFrame::solid(4, 4, Color::WHITE);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = compositor(TransitionStyle::Overlay)
            .cross_fade(&mut canvas, Some(&frame), &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(canvas.global_alpha(), 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlay_blends_over_previous_content() {
        let mut canvas = RasterCanvas::new(4, 4);
        canvas.fill(Color::WHITE);
        let frame = VideoFrame::solid(4, 4, Color::WHITE);
        let timings = PipelineTimings {
            transition: TransitionStyle::Overlay,
            fade_steps: 3,
            ..Default::default()
        };

        FrameCompositor::new(&timings)
            .cross_fade(&mut canvas, Some(&frame), &CancellationToken::new())
            .await
            .unwrap();

        // Final step: frame at alpha 0, opaque black rect.
        assert_eq!(canvas.pixel(0, 0), Some([0, 0, 0, 255]));
        assert_eq!(canvas.global_alpha(), 1.0);
    }

    #[test]
    fn test_live_frame_without_source_is_skipped() {
        let mut canvas = RasterCanvas::new(4, 4);
        let compositor = compositor(TransitionStyle::Dissolve);
        assert!(!compositor.draw_live_frame(&mut canvas, None));
        assert_eq!(canvas.presented_frames(), 0);

        let frame = VideoFrame::solid(2, 2, Color::rgb(1, 2, 3));
        assert!(compositor.draw_live_frame(&mut canvas, Some(&frame)));
        assert_eq!(canvas.pixel(3, 0), Some([1, 2, 3, 255]));
    }
}

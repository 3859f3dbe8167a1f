//! Grade selection shared by the slider, keys and the info panel.

use ratatui::layout::Rect;
use tracing::debug;

use crate::data::{Grade, GRADE_COUNT};
use crate::info::InfoPanel;
use crate::map::MapRenderer;

/// Cells per grade stop on the slider track
pub const SLIDER_STOP_WIDTH: u16 = 4;

/// Full slider track width in cells
pub const SLIDER_WIDTH: u16 = SLIDER_STOP_WIDTH * GRADE_COUNT as u16;

/// Owns the current grade and pushes changes to the markers and info panel
pub struct SequenceController {
    grade: Grade,
}

impl Default for SequenceController {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceController {
    pub fn new() -> Self {
        Self { grade: Grade::FIRST }
    }

    pub fn grade(&self) -> Grade {
        self.grade
    }

    /// Resize every marker for `grade`, then refresh the info panel
    pub fn set_grade(&mut self, grade: Grade, renderer: &mut MapRenderer, info: &mut InfoPanel) {
        self.grade = grade;
        renderer.resize_markers(grade);
        info.refresh(renderer, grade);
        debug!(grade = grade.level(), "grade applied");
    }

    pub fn next(&mut self, renderer: &mut MapRenderer, info: &mut InfoPanel) {
        self.set_grade(self.grade.next(), renderer, info);
    }

    pub fn prev(&mut self, renderer: &mut MapRenderer, info: &mut InfoPanel) {
        self.set_grade(self.grade.prev(), renderer, info);
    }
}

/// Grade stop under column `col` of the slider `track`
pub fn slider_grade_at(track: Rect, col: u16) -> Option<Grade> {
    if track.width == 0 || col < track.x || col >= track.x + track.width {
        return None;
    }
    let offset = usize::from(col - track.x);
    let index = (offset * GRADE_COUNT / usize::from(track.width)).min(GRADE_COUNT - 1);
    Grade::new(index as u8 + 1)
}

/// Column range `[start, end)` of the stop for `grade` on `track`
pub fn slider_stop(track: Rect, grade: Grade) -> (u16, u16) {
    let width = usize::from(track.width);
    let start = grade.index() * width / GRADE_COUNT;
    let end = (grade.index() + 1) * width / GRADE_COUNT;
    (track.x + start as u16, track.x + end as u16)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, ChartConfig};
    use crate::data::{Population, SchoolRecord};
    use crate::map::Viewport;
    use crate::scale::radius_for;

    fn setup() -> (MapRenderer, InfoPanel) {
        let config = AppConfig::default();
        let mut renderer = MapRenderer::new(config.map.dots_per_px);
        let mut vp = Viewport::new(37.8, -0.23, 6.0, 200, 120, config.map.limits());
        let mut g = [Some(100); GRADE_COUNT];
        g[2] = Some(1200);
        let mut b = [Some(80); GRADE_COUNT];
        b[2] = Some(900);
        renderer.build_layers(
            vec![SchoolRecord::new("Nairobi", 36.82, -1.29, g, b)],
            |_| ratatui::style::Color::Blue,
            &mut vp,
            12,
        );
        let palette = config.palette.resolve().unwrap();
        let info = InfoPanel::new(&palette, ChartConfig::default(), 100);
        (renderer, info)
    }

    fn radius(renderer: &MapRenderer, population: Population) -> f64 {
        renderer.layer(population).unwrap().markers()[0].radius
    }

    #[test]
    fn test_set_grade_resizes_both_layers() {
        let (mut renderer, mut info) = setup();
        let mut sequence = SequenceController::new();
        assert_eq!(sequence.grade(), Grade::FIRST);

        sequence.set_grade(Grade::new(3).unwrap(), &mut renderer, &mut info);
        assert_eq!(sequence.grade().level(), 3);
        assert_eq!(radius(&renderer, Population::Girls), radius_for(1200.0));
        assert_eq!(radius(&renderer, Population::Boys), radius_for(900.0));
    }

    #[test]
    fn test_repeating_a_grade_is_stable() {
        let (mut renderer, mut info) = setup();
        let mut sequence = SequenceController::new();
        let g3 = Grade::new(3).unwrap();
        sequence.set_grade(g3, &mut renderer, &mut info);
        let first = (radius(&renderer, Population::Girls), radius(&renderer, Population::Boys));
        sequence.set_grade(g3, &mut renderer, &mut info);
        assert_eq!(first, (radius(&renderer, Population::Girls), radius(&renderer, Population::Boys)));
    }

    #[test]
    fn test_set_grade_refreshes_visible_panel() {
        let (mut renderer, mut info) = setup();
        let mut sequence = SequenceController::new();
        info.hover(Some(0), &mut renderer, sequence.grade());
        sequence.set_grade(Grade::new(3).unwrap(), &mut renderer, &mut info);
        let content = info.content().unwrap();
        assert_eq!((content.girls, content.boys), (Some(1200), Some(900)));
    }

    #[test]
    fn test_next_and_prev_saturate() {
        let (mut renderer, mut info) = setup();
        let mut sequence = SequenceController::new();
        sequence.prev(&mut renderer, &mut info);
        assert_eq!(sequence.grade(), Grade::FIRST);
        for _ in 0..10 {
            sequence.next(&mut renderer, &mut info);
        }
        assert_eq!(sequence.grade(), Grade::LAST);
    }

    #[test]
    fn test_slider_hit_testing() {
        let track = Rect::new(10, 20, SLIDER_WIDTH, 1);
        assert_eq!(slider_grade_at(track, 9), None);
        assert_eq!(slider_grade_at(track, 10), Grade::new(1));
        assert_eq!(slider_grade_at(track, 13), Grade::new(1));
        assert_eq!(slider_grade_at(track, 14), Grade::new(2));
        assert_eq!(slider_grade_at(track, 10 + SLIDER_WIDTH - 1), Grade::new(8));
        assert_eq!(slider_grade_at(track, 10 + SLIDER_WIDTH), None);

        for grade in Grade::all() {
            let (start, end) = slider_stop(track, grade);
            assert_eq!(slider_grade_at(track, start), Some(grade));
            assert_eq!(slider_grade_at(track, end - 1), Some(grade));
        }
    }
}

//! Hover tooltip: county counts for the active grade plus two trend charts.

use ratatui::layout::Rect;

use crate::chart::{ChartStyle, TrendChart};
use crate::config::{ChartConfig, Palette};
use crate::data::{Grade, Population};
use crate::map::{MapRenderer, HOVER_FILL_OPACITY};

/// Narrowest panel regardless of chart size
const MIN_PANEL_WIDTH: u16 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoState {
    Hidden,
    Visible { record: usize },
}

/// Text shown above the charts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoContent {
    pub county: String,
    pub grade: Grade,
    pub girls: Option<u32>,
    pub boys: Option<u32>,
}

impl InfoContent {
    pub fn value(&self, population: Population) -> Option<u32> {
        match population {
            Population::Girls => self.girls,
            Population::Boys => self.boys,
        }
    }
}

pub struct InfoPanel {
    state: InfoState,
    content: Option<InfoContent>,
    /// Top-left cell; `None` until the pointer moves after a resize
    position: Option<(u16, u16)>,
    girls_chart: TrendChart,
    boys_chart: TrendChart,
    narrow_breakpoint: u16,
}

impl InfoPanel {
    pub fn new(palette: &Palette, chart: ChartConfig, narrow_breakpoint: u16) -> Self {
        let style = |population| ChartStyle {
            color: palette.color(population),
            width: chart.width,
            height: chart.height,
        };
        Self {
            state: InfoState::Hidden,
            content: None,
            position: None,
            girls_chart: TrendChart::new(style(Population::Girls)),
            boys_chart: TrendChart::new(style(Population::Boys)),
            narrow_breakpoint,
        }
    }

    pub fn state(&self) -> InfoState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        matches!(self.state, InfoState::Visible { .. })
    }

    pub fn content(&self) -> Option<&InfoContent> {
        self.content.as_ref()
    }

    pub fn chart(&self, population: Population) -> &TrendChart {
        match population {
            Population::Girls => &self.girls_chart,
            Population::Boys => &self.boys_chart,
        }
    }

    /// Panel size in cells: border, county line, then label and chart per population
    pub fn size(&self) -> (u16, u16) {
        let style = self.girls_chart.style();
        let width = (style.width + 2).max(MIN_PANEL_WIDTH);
        let height = 2 + 1 + 2 * (1 + style.height);
        (width, height)
    }

    /// Track the boys marker under the pointer, entering or leaving as it changes
    pub fn hover(&mut self, target: Option<usize>, renderer: &mut MapRenderer, grade: Grade) {
        let current = match self.state {
            InfoState::Visible { record } => Some(record),
            InfoState::Hidden => None,
        };
        if current == target {
            return;
        }
        if let Some(record) = current {
            self.leave(record, renderer);
        }
        if let Some(record) = target {
            self.enter(record, renderer, grade);
        }
    }

    fn enter(&mut self, record: usize, renderer: &mut MapRenderer, grade: Grade) {
        renderer.set_fill_opacity(Population::Boys, record, HOVER_FILL_OPACITY);
        self.state = InfoState::Visible { record };
        self.populate(renderer, grade);
    }

    fn leave(&mut self, record: usize, renderer: &mut MapRenderer) {
        renderer.set_fill_opacity(Population::Boys, record, 0.0);
        self.state = InfoState::Hidden;
        self.content = None;
        self.girls_chart.clear();
        self.boys_chart.clear();
    }

    /// Rebuild content and charts for a new grade; nothing to do while hidden
    pub fn refresh(&mut self, renderer: &MapRenderer, grade: Grade) {
        if self.is_visible() {
            self.populate(renderer, grade);
        }
    }

    fn populate(&mut self, renderer: &MapRenderer, grade: Grade) {
        let InfoState::Visible { record } = self.state else {
            return;
        };
        let Some(record) = renderer.record(record) else {
            return;
        };
        self.content = Some(InfoContent {
            county: record.county.clone(),
            grade,
            girls: record.value(Population::Girls, grade),
            boys: record.value(Population::Boys, grade),
        });
        self.girls_chart.draw(&record.series(Population::Girls), grade.index());
        self.boys_chart.draw(&record.series(Population::Boys), grade.index());
    }

    /// Reposition for a pointer at (col, row); independent of hover state
    pub fn pointer_moved(&mut self, col: u16, row: u16, screen: Rect) {
        self.position = Some(place_panel((col, row), self.size(), screen, self.narrow_breakpoint));
    }

    pub fn position(&self) -> Option<(u16, u16)> {
        self.position
    }

    /// Forget the position; the next pointer move recomputes it
    pub fn viewport_resized(&mut self) {
        self.position = None;
    }

    /// Where to draw the panel, `None` while hidden
    pub fn rect(&self, screen: Rect) -> Option<Rect> {
        if !self.is_visible() {
            return None;
        }
        let (w, h) = self.size();
        let (width, height) = (w.min(screen.width), h.min(screen.height));
        let (x, y) = self.position.unwrap_or((screen.x + screen.width - width, screen.y));
        // A stale position may be past the edge after a shrink
        let x = x.min(screen.x + screen.width - width);
        let y = y.min(screen.y + screen.height - height);
        Some(Rect { x, y, width, height })
    }
}

/// Top-left cell for a `panel` (w, h) near `cursor` that stays on `screen`.
///
/// Wide screens place it up and to the right of the cursor, flipping left
/// when it would run off the right edge and below when it would run off the
/// top. Narrow screens pin it near the top-right corner.
pub fn place_panel(cursor: (u16, u16), panel: (u16, u16), screen: Rect, narrow_breakpoint: u16) -> (u16, u16) {
    let (w, h) = (i32::from(panel.0), i32::from(panel.1));
    let (sw, sh) = (i32::from(screen.width), i32::from(screen.height));
    let x = i32::from(cursor.0) - i32::from(screen.x);
    let y = i32::from(cursor.1) - i32::from(screen.y);

    let (left, top) = if screen.width >= narrow_breakpoint {
        let left = if x + 1 + w > sw { x - w - 1 } else { x + 1 };
        let top = y - h - 2;
        let top = if top < 0 { y + 1 } else { top };
        (left, top)
    } else {
        (sw - w - 1, sh / 4 + 1)
    };

    let left = left.clamp(0, (sw - w).max(0));
    let top = top.clamp(0, (sh - h).max(0));
    (screen.x + left as u16, screen.y + top as u16)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, PaletteConfig};
    use crate::data::{SchoolRecord, GRADE_COUNT};
    use crate::map::Viewport;
    use proptest::prelude::*;

    fn panel() -> InfoPanel {
        let palette = PaletteConfig::default().resolve().unwrap();
        InfoPanel::new(&palette, ChartConfig::default(), 100)
    }

    fn renderer() -> MapRenderer {
        let config = AppConfig::default();
        let mut renderer = MapRenderer::new(config.map.dots_per_px);
        let mut vp = Viewport::new(37.8, -0.23, 6.0, 200, 120, config.map.limits());
        let mut g = [Some(100); GRADE_COUNT];
        g[2] = Some(1200);
        let mut b = [Some(80); GRADE_COUNT];
        b[2] = None;
        renderer.build_layers(
            vec![
                SchoolRecord::new("Nairobi", 36.82, -1.29, g, b),
                SchoolRecord::new("Mombasa", 39.67, -4.04, g, g),
            ],
            |_| ratatui::style::Color::Blue,
            &mut vp,
            12,
        );
        renderer
    }

    fn boys_opacity(renderer: &MapRenderer, record: usize) -> f64 {
        renderer.layer(Population::Boys).unwrap().markers()[record].fill_opacity
    }

    #[test]
    fn test_enter_and_leave() {
        let mut renderer = renderer();
        let mut info = panel();
        let g3 = Grade::new(3).unwrap();

        info.hover(Some(0), &mut renderer, g3);
        assert_eq!(info.state(), InfoState::Visible { record: 0 });
        let content = info.content().unwrap();
        assert_eq!(content.county, "Nairobi");
        assert_eq!(content.girls, Some(1200));
        assert_eq!(content.boys, None);
        assert_eq!(boys_opacity(&renderer, 0), HOVER_FILL_OPACITY);
        assert!(!info.chart(Population::Girls).line().is_blank());

        info.hover(None, &mut renderer, g3);
        assert_eq!(info.state(), InfoState::Hidden);
        assert!(info.content().is_none());
        assert_eq!(boys_opacity(&renderer, 0), 0.0);
    }

    #[test]
    fn test_moving_between_markers_restores_previous() {
        let mut renderer = renderer();
        let mut info = panel();
        info.hover(Some(0), &mut renderer, Grade::FIRST);
        info.hover(Some(1), &mut renderer, Grade::FIRST);
        assert_eq!(boys_opacity(&renderer, 0), 0.0);
        assert_eq!(boys_opacity(&renderer, 1), HOVER_FILL_OPACITY);
        assert_eq!(info.content().unwrap().county, "Mombasa");
    }

    #[test]
    fn test_refresh_follows_grade_and_ignores_hidden() {
        let mut renderer = renderer();
        let mut info = panel();
        info.refresh(&renderer, Grade::new(3).unwrap());
        assert!(info.content().is_none());

        info.hover(Some(0), &mut renderer, Grade::FIRST);
        assert_eq!(info.content().unwrap().girls, Some(100));
        info.refresh(&renderer, Grade::new(3).unwrap());
        assert_eq!(info.content().unwrap().girls, Some(1200));
        assert_eq!(info.content().unwrap().grade.level(), 3);
    }

    #[test]
    fn test_wide_placement_flips_at_right_edge() {
        let screen = Rect::new(0, 0, 120, 40);
        assert_eq!(place_panel((10, 30), (32, 11), screen, 100), (11, 17));
        // Near the right edge the panel moves to the cursor's left
        assert_eq!(place_panel((110, 30), (32, 11), screen, 100), (77, 17));
        // Near the top it drops below the cursor
        assert_eq!(place_panel((10, 3), (32, 11), screen, 100), (11, 4));
    }

    #[test]
    fn test_narrow_placement_is_pinned() {
        let screen = Rect::new(0, 0, 80, 40);
        assert_eq!(place_panel((5, 5), (32, 11), screen, 100), (47, 11));
        assert_eq!(place_panel((70, 35), (32, 11), screen, 100), (47, 11));
    }

    #[test]
    fn test_resize_clears_position_and_defaults_top_right() {
        let mut renderer = renderer();
        let mut info = panel();
        let screen = Rect::new(0, 0, 120, 40);
        assert!(info.rect(screen).is_none());

        info.hover(Some(0), &mut renderer, Grade::FIRST);
        info.pointer_moved(10, 30, screen);
        assert_eq!(info.rect(screen).map(|r| (r.x, r.y)), Some((11, 17)));

        info.viewport_resized();
        assert_eq!(info.position(), None);
        assert_eq!(info.rect(screen).map(|r| (r.x, r.y)), Some((120 - 32, 0)));
    }

    proptest! {
        #[test]
        fn prop_panel_stays_on_screen(
            sw in 40u16..240,
            sh in 20u16..80,
            cx in 0u16..240,
            cy in 0u16..80,
        ) {
            let screen = Rect::new(0, 0, sw, sh);
            let (w, h) = (32u16, 11u16);
            let (cx, cy) = (cx.min(sw - 1), cy.min(sh - 1));
            let (left, top) = place_panel((cx, cy), (w, h), screen, 100);
            prop_assert!(left + w <= sw);
            prop_assert!(top + h <= sh);
        }
    }
}

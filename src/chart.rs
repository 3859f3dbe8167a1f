//! Small per-population trend chart shown inside the info panel.

use ratatui::style::Color;

use crate::braille::BrailleCanvas;
use crate::data::GRADE_COUNT;
use crate::map::{draw_line, draw_ring, fill_column};
use crate::scale::LinearScale;

/// Inset in dots on every side
const MARGIN: i32 = 1;

/// Radius in dots of the active-grade marker
const POINT_RADIUS: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartStyle {
    pub color: Color,
    /// Size in character cells
    pub width: u16,
    pub height: u16,
}

/// Filled line chart over the eight grades with the active one ringed.
///
/// Each `draw` replaces the previous output entirely.
#[derive(Clone)]
pub struct TrendChart {
    style: ChartStyle,
    area: BrailleCanvas,
    line: BrailleCanvas,
    point: BrailleCanvas,
}

impl TrendChart {
    pub fn new(style: ChartStyle) -> Self {
        let (w, h) = (style.width as usize, style.height as usize);
        Self {
            style,
            area: BrailleCanvas::new(w, h),
            line: BrailleCanvas::new(w, h),
            point: BrailleCanvas::new(w, h),
        }
    }

    pub fn style(&self) -> &ChartStyle {
        &self.style
    }

    /// Filled region under the series
    pub fn area(&self) -> &BrailleCanvas {
        &self.area
    }

    pub fn line(&self) -> &BrailleCanvas {
        &self.line
    }

    /// Ring around the active grade's point
    pub fn point(&self) -> &BrailleCanvas {
        &self.point
    }

    pub fn clear(&mut self) {
        self.area.clear();
        self.line.clear();
        self.point.clear();
    }

    pub fn draw(&mut self, series: &[f64; GRADE_COUNT], active_index: usize) {
        self.clear();

        let inner_w = (self.area.dot_width() as i32 - 2 * MARGIN).max(1);
        let inner_h = (self.area.dot_height() as i32 - 2 * MARGIN).max(1);

        let (min, max) = series
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let x = LinearScale::new((0.0, (GRADE_COUNT - 1) as f64), (0.0, (inner_w - 1) as f64));
        // Inverted: larger values nearer the top
        let y = LinearScale::new((min, max), ((inner_h - 1) as f64, 0.0));

        let points: Vec<(f64, f64)> = series
            .iter()
            .enumerate()
            .map(|(i, &v)| (x.apply(i as f64) + MARGIN as f64, y.apply(v) + MARGIN as f64))
            .collect();
        let baseline = MARGIN + inner_h - 1;

        for pair in points.windows(2) {
            let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
            let (start, end) = (x0.round() as i32, x1.round() as i32);
            for px in start..=end {
                let t = if end > start { (px - start) as f64 / (end - start) as f64 } else { 0.0 };
                let py = (y0 + (y1 - y0) * t).round() as i32;
                fill_column(&mut self.area, px, py, baseline);
            }
            draw_line(&mut self.line, x0.round() as i32, y0.round() as i32, x1.round() as i32, y1.round() as i32);
        }

        if let Some(&(px, py)) = points.get(active_index) {
            draw_ring(&mut self.point, px.round() as i32, py.round() as i32, POINT_RADIUS);
        }
    }
}

//! Two-circle size legend keyed to the dataset maximum.

use ratatui::layout::Rect;

use crate::braille::BrailleCanvas;
use crate::data::SchoolRecord;
use crate::map::{dot_radius, draw_line, draw_ring};
use crate::scale::{format_thousands, legend_diameters, legend_max_value, LegendDiameters};

/// Gap in dots between the large circle and the label column
const CONNECTOR_DOTS: i32 = 4;

pub const LEGEND_TITLE: &str = " Enrollment ";

/// Legend layout derived once from the loaded records
#[derive(Debug, Clone, PartialEq)]
pub struct LegendGeometry {
    pub max_value: f64,
    /// CSS px
    pub diameters: LegendDiameters,
    /// Circle radii in dots
    pub large_radius: i32,
    pub small_radius: i32,
    pub large_label: String,
    pub small_label: String,
    /// Character rows of the two labels inside the canvas
    pub large_label_row: u16,
    pub small_label_row: u16,
}

impl LegendGeometry {
    pub fn compute(max_value: f64, dots_per_px: f64) -> Self {
        let diameters = legend_diameters(max_value);
        let large_radius = dot_radius(diameters.large / 2.0, dots_per_px).unwrap_or(1);
        let small_radius = dot_radius(diameters.small / 2.0, dots_per_px).unwrap_or(1).min(large_radius);

        // Small circle sits on the large circle's bottom edge
        let small_top = 2 * (large_radius - small_radius);

        Self {
            max_value,
            diameters,
            large_radius,
            small_radius,
            large_label: format_thousands(max_value),
            small_label: format_thousands(max_value / 2.0),
            large_label_row: 0,
            small_label_row: (small_top / 4) as u16,
        }
    }

    /// Canvas size in characters (circles plus connectors)
    pub fn canvas_size(&self) -> (u16, u16) {
        let dots_w = 2 * self.large_radius + 1 + CONNECTOR_DOTS;
        let dots_h = 2 * self.large_radius + 1;
        (((dots_w + 1) / 2) as u16, ((dots_h + 3) / 4) as u16)
    }

    /// Circles and label connectors drawn in Braille
    pub fn draw(&self) -> BrailleCanvas {
        let (w, h) = self.canvas_size();
        let mut canvas = BrailleCanvas::new(w as usize, h as usize);
        let (lr, sr) = (self.large_radius, self.small_radius);
        let right = canvas.dot_width() as i32 - 1;

        draw_ring(&mut canvas, lr, lr, lr);
        draw_ring(&mut canvas, lr, 2 * lr - sr, sr);

        // Connectors from each circle's top to the label column
        draw_line(&mut canvas, lr, 0, right, 0);
        let small_top = 2 * (lr - sr);
        draw_line(&mut canvas, lr, small_top, right, small_top);
        canvas
    }
}

/// Legend overlay state
pub struct Legend {
    geometry: Option<LegendGeometry>,
    visible: bool,
    dots_per_px: f64,
}

impl Legend {
    pub fn new(dots_per_px: f64) -> Self {
        Self {
            geometry: None,
            visible: true,
            dots_per_px,
        }
    }

    /// Size the legend from the dataset maximum; an empty dataset leaves it empty
    pub fn build(&mut self, records: &[SchoolRecord]) {
        self.geometry = legend_max_value(records).map(|max| LegendGeometry::compute(max, self.dots_per_px));
    }

    pub fn geometry(&self) -> Option<&LegendGeometry> {
        self.geometry.as_ref()
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Bordered overlay rect anchored to the bottom-right of `map`
    pub fn rect(&self, map: Rect) -> Option<Rect> {
        if !self.visible {
            return None;
        }
        let geometry = self.geometry.as_ref()?;
        let (canvas_w, canvas_h) = geometry.canvas_size();
        let label_w = geometry.large_label.len().max(geometry.small_label.len()) as u16;

        let title_w = LEGEND_TITLE.len() as u16 + 2;
        let width = (canvas_w + 1 + label_w + 2).max(title_w).min(map.width);
        let height = (canvas_h + 2).min(map.height);
        Some(Rect {
            x: map.x + map.width - width,
            y: map.y + map.height - height,
            width,
            height,
        })
    }

    /// Whether the cell is covered by the legend overlay
    pub fn contains(&self, map: Rect, col: u16, row: u16) -> bool {
        self.rect(map).is_some_and(|r| col >= r.x && col < r.x + r.width && row >= r.y && row < r.y + r.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::GRADE_COUNT;

    fn record(max: u32) -> SchoolRecord {
        let mut g = [None; GRADE_COUNT];
        g[4] = Some(max);
        SchoolRecord::new("Kakamega", 34.75, 0.28, g, [Some(10); GRADE_COUNT])
    }

    #[test]
    fn test_geometry_labels_and_ratio() {
        let geometry = LegendGeometry::compute(16_000.0, 0.25);
        assert_eq!(geometry.large_label, "16,000");
        assert_eq!(geometry.small_label, "8,000");
        assert_eq!(geometry.diameters.large, 2.0 * geometry.diameters.small);
        assert!(geometry.small_radius <= geometry.large_radius);
    }

    #[test]
    fn test_small_circle_is_bottom_aligned() {
        let geometry = LegendGeometry::compute(16_000.0, 0.25);
        let canvas = geometry.draw();
        let (_, h) = geometry.canvas_size();
        assert_eq!(canvas.height(), h as usize);
        // Bottom of both circles lands on the last dot row used
        let bottom = 2 * geometry.large_radius;
        assert_ne!(canvas.char_at(geometry.large_radius as usize / 2, bottom as usize / 4), crate::braille::BLANK);
        assert!(geometry.small_label_row >= geometry.large_label_row);
    }

    #[test]
    fn test_build_from_records() {
        let mut legend = Legend::new(0.25);
        legend.build(&[record(15_600)]);
        assert_eq!(legend.geometry().map(|g| g.max_value), Some(16_000.0));
        assert_eq!(
            legend.geometry().map(|g| g.diameters.large),
            Some(legend_diameters(16_000.0).large)
        );
    }

    #[test]
    fn test_empty_dataset_has_no_legend() {
        let mut legend = Legend::new(0.25);
        legend.build(&[]);
        assert!(legend.geometry().is_none());
        assert!(legend.rect(Rect::new(0, 0, 80, 24)).is_none());
    }

    #[test]
    fn test_rect_anchored_bottom_right_and_toggle() {
        let mut legend = Legend::new(0.25);
        legend.build(&[record(15_600)]);
        let map = Rect::new(1, 1, 78, 20);
        let rect = legend.rect(map).unwrap();
        assert_eq!(rect.x + rect.width, 79);
        assert_eq!(rect.y + rect.height, 21);
        assert!(legend.contains(map, 78, 20));
        assert!(!legend.contains(map, 1, 1));

        legend.toggle();
        assert!(legend.rect(map).is_none());
        assert!(!legend.contains(map, 78, 20));
    }
}

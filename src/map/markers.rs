use rayon::prelude::*;
use ratatui::style::Color;

use crate::braille::BrailleCanvas;
use crate::data::{Grade, Population, SchoolRecord};
use crate::map::geometry::{draw_disc, draw_ring};
use crate::map::projection::{GeoBounds, Viewport};
use crate::scale::radius_for;

/// Fill opacity of a hovered marker
pub const HOVER_FILL_OPACITY: f64 = 0.6;

/// A proportional circle bound to one record and one population
#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    /// Index into the renderer's record list
    pub record: usize,
    pub lon: f64,
    pub lat: f64,
    /// Radius in CSS px, always `radius_for` of the current grade's count
    pub radius: f64,
    pub fill_opacity: f64,
}

/// All markers of one population
pub struct MarkerLayer {
    pub population: Population,
    pub color: Color,
    markers: Vec<Marker>,
}

impl MarkerLayer {
    pub fn build(population: Population, color: Color, records: &[SchoolRecord]) -> Self {
        let markers = records
            .iter()
            .enumerate()
            .map(|(record, r)| Marker {
                record,
                lon: r.lon,
                lat: r.lat,
                radius: 0.0,
                fill_opacity: 0.0,
            })
            .collect();
        Self {
            population,
            color,
            markers,
        }
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub(crate) fn len(&self) -> usize {
        self.markers.len()
    }

    /// Re-derive every radius from the given grade's counts
    pub fn resize(&mut self, records: &[SchoolRecord], grade: Grade) {
        let population = self.population;
        self.markers.par_iter_mut().for_each(|marker| {
            let value = records[marker.record].value(population, grade).unwrap_or(0);
            marker.radius = radius_for(f64::from(value));
        });
    }

    pub fn set_fill_opacity(&mut self, record: usize, opacity: f64) {
        if let Some(marker) = self.markers.iter_mut().find(|m| m.record == record) {
            marker.fill_opacity = opacity;
        }
    }

    pub fn bounds(&self) -> Option<GeoBounds> {
        GeoBounds::from_points(self.markers.iter().map(|m| (m.lon, m.lat)))
    }

    /// Topmost marker whose circle covers dot (px, py)
    pub fn hit_test(&self, viewport: &Viewport, dots_per_px: f64, px: i32, py: i32) -> Option<usize> {
        // Later markers draw over earlier ones
        self.markers.iter().rev().find_map(|m| {
            let r = dot_radius(m.radius, dots_per_px)?;
            let (cx, cy) = viewport.project(m.lon, m.lat);
            let (dx, dy) = (px - cx, py - cy);
            // One dot of slack so thin outlines stay easy to hover
            (dx * dx + dy * dy <= (r + 1) * (r + 1)).then_some(m.record)
        })
    }

    /// Draw outlines, and discs for markers with a visible fill
    pub fn render(&self, viewport: &Viewport, dots_per_px: f64, outline: &mut BrailleCanvas, fill: &mut BrailleCanvas) {
        for m in &self.markers {
            let Some(r) = dot_radius(m.radius, dots_per_px) else {
                continue;
            };
            let (cx, cy) = viewport.project(m.lon, m.lat);
            if !viewport.is_visible(cx, cy, r) {
                continue;
            }
            if m.fill_opacity > 0.0 {
                draw_disc(fill, cx, cy, r);
            }
            draw_ring(outline, cx, cy, r);
        }
    }
}

/// Marker radius in dots; `None` for markers with nothing to show
pub fn dot_radius(radius_px: f64, dots_per_px: f64) -> Option<i32> {
    (radius_px > 0.0).then(|| (radius_px * dots_per_px).round().max(1.0) as i32)
}

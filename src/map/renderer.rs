use rayon::prelude::*;
use ratatui::style::Color;
use tracing::debug;

use crate::braille::BrailleCanvas;
use crate::data::{Grade, Population, SchoolRecord};
use crate::map::geometry::draw_line;
use crate::map::markers::MarkerLayer;
use crate::map::projection::Viewport;

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<(f64, f64)>;

/// Basemap line categories, drawn back to front
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BasemapLayer {
    Coastline,
    Border,
    County,
}

/// Display settings for basemap layers
#[derive(Clone)]
pub struct DisplaySettings {
    pub show_borders: bool,
    pub show_counties: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_borders: true,
            show_counties: true,
        }
    }
}

/// Rendered canvases for one marker population
pub struct MarkerCanvases {
    pub color: Color,
    pub outline: BrailleCanvas,
    pub fill: BrailleCanvas,
}

/// One frame of the map, composited back to front by the UI
pub struct MapLayers {
    pub coastlines: BrailleCanvas,
    pub borders: BrailleCanvas,
    pub counties: BrailleCanvas,
    /// Girls first, boys on top
    pub markers: Vec<MarkerCanvases>,
}

/// Basemap lines plus the two enrollment marker layers
pub struct MapRenderer {
    coastlines: Vec<LineString>,
    borders: Vec<LineString>,
    counties: Vec<LineString>,
    records: Vec<SchoolRecord>,
    /// Empty until data has loaded
    layers: Vec<MarkerLayer>,
    /// Braille dots per CSS px of marker radius
    pub dots_per_px: f64,
    pub settings: DisplaySettings,
}

impl MapRenderer {
    pub fn new(dots_per_px: f64) -> Self {
        Self {
            coastlines: Vec::new(),
            borders: Vec::new(),
            counties: Vec::new(),
            records: Vec::new(),
            layers: Vec::new(),
            dots_per_px,
            settings: DisplaySettings::default(),
        }
    }

    pub fn add_line(&mut self, line: LineString, layer: BasemapLayer) {
        if line.len() < 2 {
            return;
        }
        match layer {
            BasemapLayer::Coastline => self.coastlines.push(line),
            BasemapLayer::Border => self.borders.push(line),
            BasemapLayer::County => self.counties.push(line),
        }
    }

    pub fn has_basemap(&self) -> bool {
        !self.coastlines.is_empty() || !self.borders.is_empty() || !self.counties.is_empty()
    }

    /// Take ownership of the records and build one marker layer per population.
    ///
    /// The view is fitted to the markers; radii stay zero until a grade is applied.
    pub fn build_layers(
        &mut self,
        records: Vec<SchoolRecord>,
        palette: impl Fn(Population) -> Color,
        viewport: &mut Viewport,
        padding: usize,
    ) {
        self.layers = Population::ALL
            .into_iter()
            .map(|population| MarkerLayer::build(population, palette(population), &records))
            .collect();
        self.records = records;

        if let Some(bounds) = self.layers.first().and_then(MarkerLayer::bounds) {
            viewport.fit_bounds(&bounds, padding);
            debug!(zoom = viewport.zoom, "fitted view to markers");
        }
    }

    pub fn fit_to_markers(&self, viewport: &mut Viewport, padding: usize) -> bool {
        match self.layers.first().and_then(MarkerLayer::bounds) {
            Some(bounds) => {
                viewport.fit_bounds(&bounds, padding);
                true
            }
            None => false,
        }
    }

    pub fn records(&self) -> &[SchoolRecord] {
        &self.records
    }

    pub fn record(&self, idx: usize) -> Option<&SchoolRecord> {
        self.records.get(idx)
    }

    pub fn layer(&self, population: Population) -> Option<&MarkerLayer> {
        self.layers.iter().find(|l| l.population == population)
    }

    fn layer_mut(&mut self, population: Population) -> Option<&mut MarkerLayer> {
        self.layers.iter_mut().find(|l| l.population == population)
    }

    pub fn marker_count(&self) -> usize {
        self.layers.iter().map(MarkerLayer::len).sum()
    }

    /// Apply `grade` to every marker of both layers
    pub fn resize_markers(&mut self, grade: Grade) {
        for layer in &mut self.layers {
            layer.resize(&self.records, grade);
        }
    }

    pub fn set_fill_opacity(&mut self, population: Population, record: usize, opacity: f64) {
        if let Some(layer) = self.layer_mut(population) {
            layer.set_fill_opacity(record, opacity);
        }
    }

    /// Record under dot (px, py) in the topmost (boys) layer
    pub fn marker_at(&self, viewport: &Viewport, px: i32, py: i32) -> Option<usize> {
        self.layers.last()?.hit_test(viewport, self.dots_per_px, px, py)
    }

    /// Render every layer into canvases of `width` x `height` characters
    pub fn render(&self, width: usize, height: usize, viewport: &Viewport) -> MapLayers {
        let mut coastlines = BrailleCanvas::new(width, height);
        let mut borders = BrailleCanvas::new(width, height);
        let mut counties = BrailleCanvas::new(width, height);

        draw_lines(&mut coastlines, &self.coastlines, viewport);
        if self.settings.show_borders {
            draw_lines(&mut borders, &self.borders, viewport);
        }
        if self.settings.show_counties {
            draw_lines(&mut counties, &self.counties, viewport);
        }

        let markers = self
            .layers
            .iter()
            .map(|layer| {
                let mut outline = BrailleCanvas::new(width, height);
                let mut fill = BrailleCanvas::new(width, height);
                layer.render(viewport, self.dots_per_px, &mut outline, &mut fill);
                MarkerCanvases {
                    color: layer.color,
                    outline,
                    fill,
                }
            })
            .collect();

        MapLayers {
            coastlines,
            borders,
            counties,
            markers,
        }
    }

    pub fn toggle_borders(&mut self) {
        self.settings.show_borders = !self.settings.show_borders;
    }

    pub fn toggle_counties(&mut self) {
        self.settings.show_counties = !self.settings.show_counties;
    }
}

/// Project lines in parallel, then rasterize with viewport culling
fn draw_lines(canvas: &mut BrailleCanvas, lines: &[LineString], viewport: &Viewport) {
    let projected: Vec<Vec<(i32, i32)>> = lines
        .par_iter()
        .map(|line| line.iter().map(|&(lon, lat)| viewport.project(lon, lat)).collect())
        .collect();

    for points in &projected {
        for pair in points.windows(2) {
            let (p0, p1) = (pair[0], pair[1]);
            let dist = ((p1.0 - p0.0).abs() + (p1.1 - p0.1).abs()) as usize;
            // Skip antimeridian-style jumps
            if dist < viewport.width.max(viewport.height) * 2 && viewport.line_might_be_visible(p0, p1) {
                draw_line(canvas, p0.0, p0.1, p1.0, p1.1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::GRADE_COUNT;
    use crate::map::projection::tests::kenya_limits;
    use crate::scale::radius_for;

    fn palette(population: Population) -> Color {
        match population {
            Population::Girls => Color::Magenta,
            Population::Boys => Color::Blue,
        }
    }

    fn nairobi() -> SchoolRecord {
        let mut g = [None; GRADE_COUNT];
        g[0] = Some(100);
        let mut b = [None; GRADE_COUNT];
        b[0] = Some(80);
        SchoolRecord::new("Nairobi", 36.82, -1.29, g, b)
    }

    #[test]
    fn test_build_layers_single_record() {
        let mut renderer = MapRenderer::new(0.25);
        let mut vp = Viewport::new(37.8, -0.23, 6.0, 200, 120, kenya_limits());
        renderer.build_layers(vec![nairobi()], palette, &mut vp, 12);
        renderer.resize_markers(Grade::FIRST);

        assert_eq!(renderer.marker_count(), 2);
        let girls = &renderer.layer(Population::Girls).unwrap().markers()[0];
        let boys = &renderer.layer(Population::Boys).unwrap().markers()[0];
        assert_eq!((girls.lon, girls.lat), (36.82, -1.29));
        assert_eq!((boys.lon, boys.lat), (36.82, -1.29));
        assert_eq!(girls.radius, radius_for(100.0));
        assert_eq!(boys.radius, radius_for(80.0));
        assert_eq!(vp.zoom, 9.0);
    }

    #[test]
    fn test_empty_records_skip_fit() {
        let mut renderer = MapRenderer::new(0.25);
        let mut vp = Viewport::new(37.8, -0.23, 6.0, 200, 120, kenya_limits());
        renderer.build_layers(Vec::new(), palette, &mut vp, 12);
        assert_eq!(renderer.marker_count(), 0);
        assert_eq!((vp.center_lon, vp.center_lat, vp.zoom), (37.8, -0.23, 6.0));
        assert!(!renderer.fit_to_markers(&mut vp, 12));
    }

    #[test]
    fn test_marker_at_uses_boys_layer() {
        let mut renderer = MapRenderer::new(0.25);
        let mut vp = Viewport::new(37.8, -0.23, 6.0, 200, 120, kenya_limits());
        let record = SchoolRecord::new("Nairobi", 36.82, -1.29, [Some(5000); GRADE_COUNT], [None; GRADE_COUNT]);
        renderer.build_layers(vec![record], palette, &mut vp, 12);
        renderer.resize_markers(Grade::FIRST);

        // Girls marker is large but boys has no count, so nothing is hoverable
        let (cx, cy) = vp.project(36.82, -1.29);
        assert_eq!(renderer.marker_at(&vp, cx, cy), None);
    }

    #[test]
    fn test_render_draws_basemap_and_markers() {
        let mut renderer = MapRenderer::new(0.25);
        let mut vp = Viewport::new(37.8, -0.23, 6.0, 200, 120, kenya_limits());
        crate::data::generate_kenya_outline(&mut renderer);
        renderer.build_layers(vec![nairobi()], palette, &mut vp, 12);
        renderer.resize_markers(Grade::FIRST);

        // Whole country in view
        let vp = Viewport::new(37.8, 0.0, 6.0, 200, 120, kenya_limits());
        let layers = renderer.render(100, 30, &vp);
        assert!(!layers.borders.is_blank());
        assert_eq!(layers.markers.len(), 2);
        assert_eq!(layers.markers[1].color, Color::Blue);
        assert!(!layers.markers[1].outline.is_blank());

        renderer.toggle_borders();
        assert!(renderer.render(100, 30, &vp).borders.is_blank());

        renderer.add_line(vec![(36.0, -1.0), (37.5, 0.5)], BasemapLayer::County);
        assert!(!renderer.render(100, 30, &vp).counties.is_blank());
        renderer.toggle_counties();
        assert!(renderer.render(100, 30, &vp).counties.is_blank());
    }
}

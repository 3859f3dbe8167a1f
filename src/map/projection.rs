use glam::DVec2;
use std::f64::consts::PI;

/// Braille dots spanned by the whole world at zoom level 0
/// (a 256 px tile at 4 px per dot)
pub const WORLD_DOTS_AT_ZOOM0: f64 = 64.0;

/// Mercator breaks down at the poles
const MAX_LATITUDE: f64 = 85.051_128_78;

/// Web Mercator in normalized [0, 1] world units, y growing southwards
#[inline]
pub fn mercator(lon: f64, lat: f64) -> DVec2 {
    let lat_rad = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    DVec2::new(
        (lon + 180.0) / 360.0,
        (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0,
    )
}

/// Inverse of [`mercator`], returning (lon, lat)
#[inline]
pub fn inverse_mercator(p: DVec2) -> (f64, f64) {
    let lon = p.x * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * p.y)).sinh().atan().to_degrees();
    (lon, lat)
}

/// Geographic bounding box; `min` is (west, south), `max` is (east, north)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min: DVec2,
    pub max: DVec2,
}

impl GeoBounds {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            min: DVec2::new(west.min(east), south.min(north)),
            max: DVec2::new(west.max(east), south.max(north)),
        }
    }

    /// Smallest box holding every (lon, lat) point, `None` when empty
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut iter = points.into_iter();
        let (lon, lat) = iter.next()?;
        let start = DVec2::new(lon, lat);
        let (min, max) = iter.fold((start, start), |(min, max), (lon, lat)| {
            let p = DVec2::new(lon, lat);
            (min.min(p), max.max(p))
        });
        Some(Self { min, max })
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        let p = DVec2::new(lon, lat);
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }
}

/// Zoom range, snapping and the box the view may not leave
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewLimits {
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Zoom levels are multiples of this
    pub zoom_snap: f64,
    /// Zoom change per key press or wheel notch
    pub zoom_step: f64,
    pub max_bounds: GeoBounds,
}

impl ViewLimits {
    fn snap(&self, zoom: f64) -> f64 {
        if self.zoom_snap <= 0.0 {
            return zoom;
        }
        // Epsilon keeps 6.3 from snapping to 6.299999
        (zoom / self.zoom_snap + 1e-9).floor() * self.zoom_snap
    }

    fn clamp(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }
}

/// Visible map area at a fractional zoom level, in Braille dots
#[derive(Clone, Debug)]
pub struct Viewport {
    /// Center longitude
    pub center_lon: f64,
    /// Center latitude
    pub center_lat: f64,
    /// Zoom level; the world is `64 * 2^zoom` dots wide
    pub zoom: f64,
    /// Canvas dot width
    pub width: usize,
    /// Canvas dot height
    pub height: usize,
    pub limits: ViewLimits,
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize, limits: ViewLimits) -> Self {
        let mut vp = Self {
            center_lon,
            center_lat,
            zoom: limits.clamp(zoom),
            width,
            height,
            limits,
        };
        vp.clamp_center();
        vp
    }

    /// Dots per normalized world unit
    #[inline]
    pub fn scale(&self) -> f64 {
        WORLD_DOTS_AT_ZOOM0 * self.zoom.exp2()
    }

    #[inline]
    fn center_world(&self) -> DVec2 {
        mercator(self.center_lon, self.center_lat)
    }

    #[inline]
    fn half_size(&self) -> DVec2 {
        DVec2::new(self.width as f64, self.height as f64) * 0.5
    }

    fn set_center_world(&mut self, world: DVec2) {
        let (lon, lat) = inverse_mercator(world);
        self.center_lon = lon;
        self.center_lat = lat;
        self.clamp_center();
    }

    /// Keep the center inside the max bounds box
    fn clamp_center(&mut self) {
        let b = self.limits.max_bounds;
        self.center_lon = self.center_lon.clamp(b.min.x, b.max.x);
        self.center_lat = self.center_lat.clamp(b.min.y, b.max.y);
    }

    /// Pan the viewport by a dot delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let delta = DVec2::new(dx as f64, dy as f64) / self.scale();
        self.set_center_world(self.center_world() + delta);
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + self.limits.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - self.limits.zoom_step);
    }

    /// Set zoom, snapped to the increment and clamped to the range
    pub fn set_zoom(&mut self, zoom: f64) {
        let snap = self.limits.zoom_snap;
        let zoom = if snap > 0.0 { (zoom / snap).round() * snap } else { zoom };
        self.zoom = self.limits.clamp(zoom);
    }

    /// Zoom in keeping the point under (px, py) fixed
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, self.limits.zoom_step);
    }

    /// Zoom out keeping the point under (px, py) fixed
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, -self.limits.zoom_step);
    }

    fn zoom_at(&mut self, px: i32, py: i32, delta: f64) {
        let anchor = self.unproject_world(px, py);
        self.set_zoom(self.zoom + delta);

        // Put the anchor back under the cursor
        let offset = DVec2::new(px as f64, py as f64) - self.half_size();
        self.set_center_world(anchor - offset / self.scale());
    }

    /// Center on `bounds` at the highest snapped zoom that keeps it inside
    /// the viewport minus `padding` dots on each side
    pub fn fit_bounds(&mut self, bounds: &GeoBounds, padding: usize) {
        let nw = mercator(bounds.min.x, bounds.max.y);
        let se = mercator(bounds.max.x, bounds.min.y);
        let size = se - nw;

        let avail = DVec2::new(
            self.width.saturating_sub(padding * 2).max(1) as f64,
            self.height.saturating_sub(padding * 2).max(1) as f64,
        );
        let ratio = |avail: f64, size: f64| if size > 0.0 { avail / size } else { f64::INFINITY };
        let dots_per_unit = ratio(avail.x, size.x).min(ratio(avail.y, size.y));

        self.zoom = if dots_per_unit.is_finite() {
            self.limits.clamp(self.limits.snap((dots_per_unit / WORLD_DOTS_AT_ZOOM0).log2()))
        } else {
            self.limits.max_zoom
        };
        self.set_center_world((nw + se) * 0.5);
    }

    fn unproject_world(&self, px: i32, py: i32) -> DVec2 {
        let offset = DVec2::new(px as f64, py as f64) - self.half_size();
        self.center_world() + offset / self.scale()
    }

    /// Project a geographic coordinate (lon, lat) to dot coordinates
    #[inline]
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let p = (mercator(lon, lat) - self.center_world()) * self.scale() + self.half_size();
        (p.x.round() as i32, p.y.round() as i32)
    }

    /// Check if a projected point is near enough to the canvas to draw
    pub fn is_visible(&self, px: i32, py: i32, margin: i32) -> bool {
        px >= -margin && px < self.width as i32 + margin && py >= -margin && py < self.height as i32 + margin
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;

    pub(crate) fn kenya_limits() -> ViewLimits {
        ViewLimits {
            min_zoom: 6.0,
            max_zoom: 9.0,
            zoom_snap: 0.1,
            zoom_step: 0.5,
            max_bounds: GeoBounds::new(27.72, -6.22, 47.83, 5.76),
        }
    }

    #[test]
    fn test_project_center() {
        let vp = Viewport::new(37.8, -0.23, 6.0, 100, 100, kenya_limits());
        assert_eq!(vp.project(37.8, -0.23), (50, 50));
    }

    #[test]
    fn test_unproject_roundtrip_center() {
        let vp = Viewport::new(37.8, -0.23, 7.0, 160, 96, kenya_limits());
        let (lon, lat) = inverse_mercator(vp.unproject_world(80, 48));
        assert_relative_eq!(lon, 37.8, epsilon = 1e-9);
        assert_relative_eq!(lat, -0.23, epsilon = 1e-9);
    }

    #[test]
    fn test_zoom_clamped_and_snapped() {
        let mut vp = Viewport::new(37.8, -0.23, 16.0, 100, 100, kenya_limits());
        assert_eq!(vp.zoom, 9.0);
        vp.set_zoom(6.34);
        assert_relative_eq!(vp.zoom, 6.3, epsilon = 1e-9);
        vp.set_zoom(2.0);
        assert_eq!(vp.zoom, 6.0);
    }

    #[test]
    fn test_pan_stays_inside_max_bounds() {
        let mut vp = Viewport::new(37.8, -0.23, 6.0, 100, 100, kenya_limits());
        vp.pan(10, 0);
        assert!(vp.center_lon > 37.8);
        for _ in 0..200 {
            vp.pan(500, -500);
        }
        assert!(vp.limits.max_bounds.contains(vp.center_lon, vp.center_lat));
        assert_relative_eq!(vp.center_lon, 47.83, epsilon = 1e-9);
        assert_relative_eq!(vp.center_lat, 5.76, epsilon = 1e-9);
    }

    #[test]
    fn test_zoom_at_keeps_anchor() {
        let mut vp = Viewport::new(37.8, -0.23, 6.0, 160, 96, kenya_limits());
        let before = inverse_mercator(vp.unproject_world(40, 30));
        vp.zoom_in_at(40, 30);
        assert_relative_eq!(vp.zoom, 6.5, epsilon = 1e-9);
        let after = inverse_mercator(vp.unproject_world(40, 30));
        assert_relative_eq!(before.0, after.0, epsilon = 1e-6);
        assert_relative_eq!(before.1, after.1, epsilon = 1e-6);
    }

    #[test]
    fn test_fit_bounds_contains_corners() {
        let mut vp = Viewport::new(37.8, -0.23, 6.0, 200, 120, kenya_limits());
        let bounds = GeoBounds::new(34.0, -4.0, 41.0, 4.0);
        vp.fit_bounds(&bounds, 12);

        for (lon, lat) in [(34.0, -4.0), (41.0, 4.0)] {
            let (x, y) = vp.project(lon, lat);
            assert!(x >= 11 && x <= 189, "x={x}");
            assert!(y >= 11 && y <= 109, "y={y}");
        }
        let snapped = (vp.zoom / 0.1).round() * 0.1;
        assert_relative_eq!(vp.zoom, snapped, epsilon = 1e-9);
    }

    #[test]
    fn test_fit_bounds_single_point_uses_max_zoom() {
        let mut vp = Viewport::new(37.8, -0.23, 6.0, 200, 120, kenya_limits());
        let bounds = GeoBounds::from_points([(36.82, -1.29)]).unwrap();
        vp.fit_bounds(&bounds, 12);
        assert_eq!(vp.zoom, 9.0);
        assert_eq!(vp.project(36.82, -1.29), (100, 60));
    }

    #[test]
    fn test_bounds_from_points() {
        assert!(GeoBounds::from_points(std::iter::empty()).is_none());
        let b = GeoBounds::from_points([(36.0, 1.0), (34.0, -2.0), (40.0, 0.0)]).unwrap();
        assert_eq!(b.min, DVec2::new(34.0, -2.0));
        assert_eq!(b.max, DVec2::new(40.0, 1.0));
    }
}

mod enrollment;
mod record;

pub use enrollment::{
    csv_to_features, export_geojson, load_enrollment, records_from_features, spawn_load, Conversion, Dataset,
    LoadError, LoadOutcome,
};
pub use record::{coerce_count, Grade, Population, SchoolRecord, GRADE_COUNT};

use crate::map::{BasemapLayer, LineString, MapRenderer};
use anyhow::{Context, Result};
use geojson::{GeoJson, Geometry, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Basemap files looked up in the basemap directory
const BASEMAP_FILES: [(&str, BasemapLayer); 5] = [
    ("ne_10m_coastline.json", BasemapLayer::Coastline),
    ("ne_10m_lakes.json", BasemapLayer::Coastline),
    ("ne_10m_borders.json", BasemapLayer::Border),
    ("ne_50m_borders.json", BasemapLayer::Border),
    ("kenya_counties.json", BasemapLayer::County),
];

/// Load every basemap GeoJSON file found in `dir`; returns how many loaded
pub fn load_basemap(renderer: &mut MapRenderer, dir: &Path) -> usize {
    let mut loaded = 0;
    for (filename, layer) in BASEMAP_FILES {
        let path = dir.join(filename);
        if !path.exists() {
            continue;
        }
        match read_geojson(&path) {
            Ok(geojson) => {
                let mut lines = 0;
                process_geojson_lines(&geojson, |line| {
                    renderer.add_line(line, layer);
                    lines += 1;
                });
                debug!(file = filename, lines, "loaded basemap layer");
                loaded += 1;
            }
            Err(e) => warn!("Failed to load {}: {:#}", filename, e),
        }
    }
    loaded
}

/// Parse a GeoJSON file with simd-json
fn read_geojson(path: &Path) -> Result<GeoJson> {
    let mut bytes = fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    let geojson: GeoJson =
        simd_json::serde::from_slice(&mut bytes).with_context(|| format!("Invalid GeoJSON in {:?}", path))?;
    Ok(geojson)
}

/// Walk a GeoJSON document and hand every line or ring to `add_line`
fn process_geojson_lines<F>(geojson: &GeoJson, mut add_line: F)
where
    F: FnMut(LineString),
{
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for geometry in fc.features.iter().filter_map(|f| f.geometry.as_ref()) {
                process_geometry_lines(geometry, &mut add_line);
            }
        }
        GeoJson::Feature(f) => {
            if let Some(ref geometry) = f.geometry {
                process_geometry_lines(geometry, &mut add_line);
            }
        }
        GeoJson::Geometry(geometry) => process_geometry_lines(geometry, &mut add_line),
    }
}

fn process_geometry_lines<F>(geometry: &Geometry, add_line: &mut F)
where
    F: FnMut(LineString),
{
    fn to_line(coords: &[Vec<f64>]) -> LineString {
        coords.iter().map(|c| (c[0], c[1])).collect()
    }

    match &geometry.value {
        Value::LineString(coords) => add_line(to_line(coords)),
        Value::MultiLineString(lines) => lines.iter().for_each(|coords| add_line(to_line(coords))),
        // All rings, so lakes and islands keep their outlines
        Value::Polygon(rings) => rings.iter().for_each(|ring| add_line(to_line(ring))),
        Value::MultiPolygon(polygons) => polygons
            .iter()
            .flatten()
            .for_each(|ring| add_line(to_line(ring))),
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                process_geometry_lines(g, add_line);
            }
        }
        _ => {}
    }
}

/// Coarse Kenya outline for when no basemap file is available
pub fn generate_kenya_outline(renderer: &mut MapRenderer) {
    renderer.add_line(
        vec![
            (33.91, -1.00), (33.95, 0.10), (34.40, 1.00), (34.80, 1.90),
            (34.90, 2.60), (34.00, 4.20), (35.30, 5.00), (35.90, 4.60),
            (36.90, 4.40), (38.10, 3.60), (39.50, 3.40), (40.00, 4.00),
            (41.20, 3.90), (41.90, 3.98), (41.00, 2.80), (41.00, -0.90),
            (41.50, -1.60), (40.90, -2.10), (40.20, -2.80), (39.60, -4.40),
            (39.20, -4.70), (37.70, -3.60), (37.60, -3.00), (33.91, -1.00),
        ],
        BasemapLayer::Border,
    );

    // Lake Victoria shoreline inside Kenya
    renderer.add_line(
        vec![
            (33.95, 0.10), (34.10, -0.10), (34.50, -0.20), (34.80, -0.30),
            (34.40, -0.50), (34.20, -0.90), (33.91, -1.00),
        ],
        BasemapLayer::Coastline,
    );

    // Lake Turkana
    renderer.add_line(
        vec![
            (35.90, 4.50), (36.10, 4.00), (36.30, 3.20), (36.60, 2.50),
            (36.70, 2.40), (36.40, 3.00), (36.20, 3.80), (36.00, 4.40),
            (35.90, 4.50),
        ],
        BasemapLayer::Coastline,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {},
             "geometry": {"type": "LineString", "coordinates": [[36.0, -1.0], [37.0, -1.5]]}},
            {"type": "Feature", "properties": {},
             "geometry": {"type": "Polygon", "coordinates": [
                [[34.0, 0.0], [35.0, 0.0], [35.0, 1.0], [34.0, 0.0]],
                [[34.2, 0.1], [34.4, 0.1], [34.2, 0.3], [34.2, 0.1]]
             ]}},
            {"type": "Feature", "properties": {},
             "geometry": {"type": "Point", "coordinates": [36.8, -1.3]}}
        ]
    }"#;

    #[test]
    fn test_process_geojson_lines_collects_lines_and_rings() {
        let geojson: GeoJson = LINES.parse().unwrap();
        let mut lines = Vec::new();
        process_geojson_lines(&geojson, |line| lines.push(line));
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], vec![(36.0, -1.0), (37.0, -1.5)]);
    }

    #[test]
    fn test_load_basemap_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("kenya_counties.json"), LINES).unwrap();
        fs::write(dir.path().join("ne_10m_borders.json"), "{ not json").unwrap();

        let mut renderer = MapRenderer::new(0.25);
        assert_eq!(load_basemap(&mut renderer, dir.path()), 1);
        assert!(renderer.has_basemap());
    }

    #[test]
    fn test_kenya_outline_fallback() {
        let mut renderer = MapRenderer::new(0.25);
        assert!(!renderer.has_basemap());
        generate_kenya_outline(&mut renderer);
        assert!(renderer.has_basemap());
    }
}

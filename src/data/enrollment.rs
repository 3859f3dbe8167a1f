use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread;

use anyhow::Context;
use csv::{ReaderBuilder, StringRecord, Trim};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, JsonValue, Value};
use thiserror::Error;
use tracing::{info, warn};

use super::record::{coerce_count, coerce_number, Grade, Population, SchoolRecord, GRADE_COUNT};

const COUNTY_COLUMN: &str = "county";
const LAT_COLUMNS: [&str; 2] = ["lat", "latitude"];
const LON_COLUMNS: [&str; 4] = ["lon", "lng", "long", "longitude"];

/// Why the enrollment dataset could not be produced
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("required column '{0}' not found in header")]
    MissingColumn(&'static str),
}

/// Records ready for the map and legend
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<SchoolRecord>,
    /// Rows dropped for lacking usable coordinates
    pub skipped_rows: usize,
}

/// Single-shot result of the background load
pub type LoadOutcome = Result<Dataset, LoadError>;

/// Point features converted from tabular rows
pub struct Conversion {
    pub features: FeatureCollection,
    pub skipped_rows: usize,
}

fn find_column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|name| h.eq_ignore_ascii_case(name)))
}

/// Convert CSV rows into GeoJSON point features.
///
/// Every non-coordinate column becomes a string property. Rows whose
/// coordinates are missing or unparseable are skipped.
pub fn csv_to_features<R: Read>(reader: R) -> Result<Conversion, LoadError> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).flexible(true).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let lat_idx = find_column(&headers, &LAT_COLUMNS).ok_or(LoadError::MissingColumn("latitude"))?;
    let lon_idx = find_column(&headers, &LON_COLUMNS).ok_or(LoadError::MissingColumn("longitude"))?;
    find_column(&headers, &[COUNTY_COLUMN]).ok_or(LoadError::MissingColumn("COUNTY"))?;

    let mut features = Vec::new();
    let mut skipped_rows = 0;

    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        let coord = |idx: usize| record.get(idx).and_then(|s| s.parse::<f64>().ok()).filter(|v| v.is_finite());

        let (Some(lat), Some(lon)) = (coord(lat_idx), coord(lon_idx)) else {
            // Header is line 1
            warn!(line = row + 2, "skipping row without usable coordinates");
            skipped_rows += 1;
            continue;
        };

        let properties: JsonObject = headers
            .iter()
            .zip(record.iter())
            .enumerate()
            .filter(|(idx, _)| *idx != lat_idx && *idx != lon_idx)
            .map(|(_, (key, value))| (key.to_string(), JsonValue::String(value.to_string())))
            .collect();

        features.push(Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Point(vec![lon, lat]))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        });
    }

    Ok(Conversion {
        features: FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        },
        skipped_rows,
    })
}

fn property<'a>(properties: &'a JsonObject, key: &str) -> Option<&'a JsonValue> {
    properties.get(key).or_else(|| {
        properties
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

fn coerce_property(value: Option<&JsonValue>) -> Option<u32> {
    match value? {
        JsonValue::String(s) => coerce_count(s),
        JsonValue::Number(n) => n.as_f64().and_then(coerce_number),
        _ => None,
    }
}

/// Build school records from point features, coercing each grade column
pub fn records_from_features(collection: &FeatureCollection) -> Vec<SchoolRecord> {
    collection
        .features
        .iter()
        .filter_map(|feature| {
            let Value::Point(coords) = &feature.geometry.as_ref()?.value else {
                return None;
            };
            if coords.len() < 2 {
                return None;
            }

            let empty = JsonObject::new();
            let props = feature.properties.as_ref().unwrap_or(&empty);
            let county = property(props, COUNTY_COLUMN)
                .and_then(JsonValue::as_str)
                .unwrap_or_default();

            let counts = |population: Population| {
                let mut out = [None; GRADE_COUNT];
                for grade in Grade::all() {
                    out[grade.index()] = coerce_property(property(props, &population.column(grade)));
                }
                out
            };

            Some(SchoolRecord::new(
                county,
                coords[0],
                coords[1],
                counts(Population::Girls),
                counts(Population::Boys),
            ))
        })
        .collect()
}

/// Read and convert the enrollment CSV at `path`
pub fn load_enrollment(path: &Path) -> LoadOutcome {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let conversion = csv_to_features(file)?;
    let records = records_from_features(&conversion.features);

    info!(
        path = %path.display(),
        records = records.len(),
        skipped = conversion.skipped_rows,
        "loaded enrollment dataset"
    );

    Ok(Dataset {
        records,
        skipped_rows: conversion.skipped_rows,
    })
}

/// Load the dataset on a worker thread; the outcome arrives exactly once
pub fn spawn_load(path: PathBuf) -> std::io::Result<Receiver<LoadOutcome>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("enrollment-loader".into())
        .spawn(move || {
            // Receiver is gone if the UI already quit
            let _ = tx.send(load_enrollment(&path));
        })?;
    Ok(rx)
}

/// Write the converted point features of `csv_path` as GeoJSON
pub fn export_geojson(csv_path: &Path, out: &Path) -> anyhow::Result<usize> {
    let file = File::open(csv_path).with_context(|| format!("Failed to open CSV file: {:?}", csv_path))?;
    let conversion = csv_to_features(file).with_context(|| format!("Failed to convert {:?}", csv_path))?;
    let count = conversion.features.features.len();
    fs::write(out, GeoJson::FeatureCollection(conversion.features).to_string())
        .with_context(|| format!("Failed to write GeoJSON: {:?}", out))?;
    Ok(count)
}

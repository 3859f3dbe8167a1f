use anyhow::{anyhow, Context, Result};
use ratatui::style::Color;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::data::Population;
use crate::map::{GeoBounds, ViewLimits};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub palette: PaletteConfig,
    pub map: MapConfig,
    pub info: InfoConfig,
    pub chart: ChartConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DataConfig {
    pub enrollment_csv: PathBuf,
    /// Directory searched for basemap GeoJSON files
    pub basemap_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            enrollment_csv: PathBuf::from("data/kenya_education_2014.csv"),
            basemap_dir: PathBuf::from("data"),
        }
    }
}

/// Population colors as names or `#rrggbb`
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PaletteConfig {
    pub girls: String,
    pub boys: String,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            girls: "#e377c2".into(),
            boys: "#1f77b4".into(),
        }
    }
}

impl PaletteConfig {
    pub fn resolve(&self) -> Result<Palette> {
        let parse = |s: &str| Color::from_str(s).map_err(|_| anyhow!("invalid color {:?}", s));
        Ok(Palette {
            girls: parse(&self.girls)?,
            boys: parse(&self.boys)?,
        })
    }
}

/// Resolved population colors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub girls: Color,
    pub boys: Color,
}

impl Palette {
    pub fn color(&self, population: Population) -> Color {
        match population {
            Population::Girls => self.girls,
            Population::Boys => self.boys,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct MapConfig {
    pub center_lat: f64,
    pub center_lon: f64,
    pub initial_zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub zoom_snap: f64,
    pub zoom_step: f64,
    /// South-west corner as [lat, lon]
    pub max_bounds_sw: [f64; 2],
    /// North-east corner as [lat, lon]
    pub max_bounds_ne: [f64; 2],
    /// Dots kept clear around the markers when fitting the view
    pub fit_padding: usize,
    /// Braille dots per CSS px of marker radius
    pub dots_per_px: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center_lat: -0.23,
            center_lon: 37.8,
            initial_zoom: 6.0,
            min_zoom: 6.0,
            max_zoom: 9.0,
            zoom_snap: 0.1,
            zoom_step: 0.5,
            max_bounds_sw: [-6.22, 27.72],
            max_bounds_ne: [5.76, 47.83],
            fit_padding: 12,
            dots_per_px: 0.25,
        }
    }
}

impl MapConfig {
    pub fn limits(&self) -> ViewLimits {
        let [south, west] = self.max_bounds_sw;
        let [north, east] = self.max_bounds_ne;
        ViewLimits {
            min_zoom: self.min_zoom,
            max_zoom: self.max_zoom.max(self.min_zoom),
            zoom_snap: self.zoom_snap,
            zoom_step: self.zoom_step,
            max_bounds: GeoBounds::new(west, south, east, north),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct InfoConfig {
    /// Below this many columns the panel is pinned instead of following the cursor
    pub narrow_breakpoint: u16,
}

impl Default for InfoConfig {
    fn default() -> Self {
        Self { narrow_breakpoint: 100 }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct ChartConfig {
    /// Character cells
    pub width: u16,
    pub height: u16,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self { width: 28, height: 3 }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}

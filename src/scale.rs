//! Value-to-size mapping shared by markers, the legend and trend charts.

use std::f64::consts::PI;

use crate::data::{Grade, Population, SchoolRecord};

/// Multiplier applied to the area-preserving radius
pub const RADIUS_SCALE: f64 = 0.5;

/// Legend maximum is rounded to this step
const LEGEND_ROUNDING: f64 = 1000.0;

/// Circle radius (CSS px) whose area is proportional to `value`.
///
/// Counts are never negative; negative or non-finite input yields 0.
#[inline]
pub fn radius_for(value: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return 0.0;
    }
    (value / PI).sqrt() * RADIUS_SCALE
}

/// Large and small legend circle diameters (CSS px)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegendDiameters {
    pub large: f64,
    pub small: f64,
}

pub fn legend_diameters(max_value: f64) -> LegendDiameters {
    let large = radius_for(max_value) * 2.0;
    LegendDiameters {
        large,
        small: large / 2.0,
    }
}

/// Largest enrollment count across every grade of both populations,
/// rounded to the nearest thousand.
///
/// Returns `None` when no record carries a numeric count. A dataset whose
/// maximum rounds down to zero still gets a legend keyed to one thousand.
pub fn legend_max_value(records: &[SchoolRecord]) -> Option<f64> {
    let max = records
        .iter()
        .flat_map(|record| {
            Population::ALL.into_iter().flat_map(move |population| {
                Grade::all().filter_map(move |grade| record.value(population, grade))
            })
        })
        .filter(|&v| v > 0)
        .max()?;

    let rounded = (max as f64 / LEGEND_ROUNDING).round() * LEGEND_ROUNDING;
    Some(rounded.max(LEGEND_ROUNDING))
}

/// Linear map from a numeric domain onto a pixel range.
///
/// A degenerate domain (both ends equal) maps every input to the middle of
/// the range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn apply(&self, value: f64) -> f64 {
        let span = self.domain.1 - self.domain.0;
        let t = if span == 0.0 || !span.is_finite() {
            0.5
        } else {
            (value - self.domain.0) / span
        };
        self.range.0 + t * (self.range.1 - self.range.0)
    }
}

/// Format a count with comma thousands separators (`12345` -> `12,345`)
pub fn format_thousands(value: f64) -> String {
    let rounded = value.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if negative {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

//! Proportional-symbol map of Kenyan primary school enrollment, rendered
//! in the terminal with Braille characters.

pub mod app;
pub mod braille;
pub mod chart;
pub mod config;
pub mod data;
pub mod info;
pub mod legend;
pub mod map;
pub mod scale;
pub mod sequence;
pub mod telemetry;
pub mod ui;

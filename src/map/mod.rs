mod geometry;
mod markers;
mod projection;
mod renderer;

pub use geometry::{draw_disc, draw_line, draw_ring, fill_column};
pub use markers::{dot_radius, Marker, MarkerLayer, HOVER_FILL_OPACITY};
pub use projection::{GeoBounds, ViewLimits, Viewport};
pub use renderer::{BasemapLayer, LineString, MapLayers, MapRenderer, MarkerCanvases};

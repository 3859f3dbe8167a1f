use anyhow::Result;
use ratatui::layout::{Position, Rect};
use tracing::{error, info};

use crate::config::{AppConfig, MapConfig, Palette};
use crate::data::{Grade, LoadOutcome};
use crate::info::InfoPanel;
use crate::legend::Legend;
use crate::map::{MapRenderer, Viewport};
use crate::sequence::{slider_grade_at, SequenceController};
use crate::ui::{layout, ScreenLayout};

/// Progress of the background dataset load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Loading,
    Ready { records: usize, skipped: usize },
    /// Diagnostic shown in the status bar; the map runs without data layers
    Failed(String),
}

/// Application state
pub struct App {
    pub viewport: Viewport,
    pub map_renderer: MapRenderer,
    pub legend: Legend,
    pub sequence: SequenceController,
    pub info: InfoPanel,
    pub palette: Palette,
    pub load_status: LoadStatus,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Current mouse position for hover tracking
    pub mouse_pos: Option<(u16, u16)>,
    /// Left button went down on the grade slider
    slider_drag: bool,
    screen: Rect,
    map_config: MapConfig,
}

impl App {
    pub fn new(width: u16, height: u16, config: &AppConfig) -> Result<Self> {
        let palette = config.palette.resolve()?;
        let screen = Rect::new(0, 0, width, height);
        let inner = layout(screen).map_inner;
        let map = config.map;

        Ok(Self {
            // Braille gives 2x4 resolution per character
            viewport: Viewport::new(
                map.center_lon,
                map.center_lat,
                map.initial_zoom,
                inner.width as usize * 2,
                inner.height as usize * 4,
                map.limits(),
            ),
            map_renderer: MapRenderer::new(map.dots_per_px),
            legend: Legend::new(map.dots_per_px),
            sequence: SequenceController::new(),
            info: InfoPanel::new(&palette, config.chart, config.info.narrow_breakpoint),
            palette,
            load_status: LoadStatus::Loading,
            should_quit: false,
            last_mouse: None,
            mouse_pos: None,
            slider_drag: false,
            screen,
            map_config: map,
        })
    }

    pub fn layout(&self) -> ScreenLayout {
        layout(self.screen)
    }

    /// Build the marker layers and legend from the background load
    pub fn on_data_loaded(&mut self, outcome: LoadOutcome) {
        match outcome {
            Ok(dataset) => {
                let records = dataset.records.len();
                let palette = self.palette;
                self.map_renderer.build_layers(
                    dataset.records,
                    move |population| palette.color(population),
                    &mut self.viewport,
                    self.map_config.fit_padding,
                );
                self.legend.build(self.map_renderer.records());
                self.sequence
                    .set_grade(Grade::FIRST, &mut self.map_renderer, &mut self.info);
                self.load_status = LoadStatus::Ready {
                    records,
                    skipped: dataset.skipped_rows,
                };
                info!(records, markers = self.map_renderer.marker_count(), "data layers ready");
                self.refresh_hover();
            }
            Err(e) => self.load_failed(e.to_string()),
        }
    }

    /// Run without data layers, keeping a diagnostic for the status bar
    pub fn load_failed(&mut self, message: String) {
        error!("Failed to load enrollment data: {}", message);
        self.load_status = LoadStatus::Failed(message);
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: u16, height: u16) {
        self.screen = Rect::new(0, 0, width, height);
        let inner = self.layout().map_inner;
        self.viewport.width = inner.width as usize * 2;
        self.viewport.height = inner.height as usize * 4;
        self.info.viewport_resized();
        // Markers shift with the new half-size
        self.refresh_hover();
    }

    /// Pan the map
    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
        self.refresh_hover();
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
        self.refresh_hover();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
        self.refresh_hover();
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.map_dot(col, row) {
            self.viewport.zoom_in_at(px, py);
            self.refresh_hover();
        }
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.map_dot(col, row) {
            self.viewport.zoom_out_at(px, py);
            self.refresh_hover();
        }
    }

    /// Back to the configured view, refitted to the markers once loaded
    pub fn reset_view(&mut self) {
        let map = self.map_config;
        self.viewport = Viewport::new(
            map.center_lon,
            map.center_lat,
            map.initial_zoom,
            self.viewport.width,
            self.viewport.height,
            map.limits(),
        );
        self.map_renderer.fit_to_markers(&mut self.viewport, map.fit_padding);
        self.refresh_hover();
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn set_grade(&mut self, grade: Grade) {
        self.sequence.set_grade(grade, &mut self.map_renderer, &mut self.info);
        self.refresh_hover();
    }

    pub fn grade_up(&mut self) {
        self.set_grade(self.sequence.grade().next());
    }

    pub fn grade_down(&mut self) {
        self.set_grade(self.sequence.grade().prev());
    }

    pub fn toggle_legend(&mut self) {
        self.legend.toggle();
        self.refresh_hover();
    }

    /// Get current zoom level as a string
    pub fn zoom_level(&self) -> String {
        format!("{:.1}", self.viewport.zoom)
    }

    /// Get current center coordinates as a string
    pub fn center_coords(&self) -> String {
        format!(
            "{:.2}°{}, {:.2}°{}",
            self.viewport.center_lat.abs(),
            if self.viewport.center_lat >= 0.0 { "N" } else { "S" },
            self.viewport.center_lon.abs(),
            if self.viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }

    /// Braille dot under a terminal cell, `None` outside the map or under an overlay
    pub fn map_dot(&self, col: u16, row: u16) -> Option<(i32, i32)> {
        let inner = self.layout().map_inner;
        if !inner.contains(Position::new(col, row)) || self.legend.contains(inner, col, row) {
            return None;
        }
        // Center of the cell's 2x4 dot block
        let px = (col - inner.x) as i32 * 2 + 1;
        let py = (row - inner.y) as i32 * 4 + 2;
        Some((px, py))
    }

    /// Pointer moved: place the info panel and update the hovered marker
    pub fn pointer_moved(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
        self.info.pointer_moved(col, row, self.screen);
        self.refresh_hover();
    }

    /// Re-run the hover hit test at the last pointer position
    fn refresh_hover(&mut self) {
        let target = self
            .mouse_pos
            .and_then(|(col, row)| self.map_dot(col, row))
            .and_then(|(px, py)| self.map_renderer.marker_at(&self.viewport, px, py));
        self.info.hover(target, &mut self.map_renderer, self.sequence.grade());
    }

    /// Left button pressed: legend button, slider, or start of a map drag
    pub fn mouse_down(&mut self, col: u16, row: u16) {
        let screen = self.layout();
        let pos = Position::new(col, row);
        if screen.legend_button.contains(pos) {
            self.toggle_legend();
        } else if screen.slider_track.contains(pos) {
            self.slider_drag = true;
            if let Some(grade) = slider_grade_at(screen.slider_track, col) {
                self.set_grade(grade);
            }
        } else if self.map_dot(col, row).is_some() {
            self.last_mouse = Some((col, row));
        }
    }

    /// Handle mouse drag: slider scrub or map pan
    pub fn drag(&mut self, col: u16, row: u16) {
        if self.slider_drag {
            let track = self.layout().slider_track;
            let col = col.clamp(track.x, track.x + track.width.max(1) - 1);
            if let Some(grade) = slider_grade_at(track, col) {
                if grade != self.sequence.grade() {
                    self.set_grade(grade);
                }
            }
        } else if let Some((last_x, last_y)) = self.last_mouse {
            // One cell is 2x4 dots, so the map follows the pointer
            let dx = (last_x as i32 - col as i32) * 2;
            let dy = (last_y as i32 - row as i32) * 4;
            self.viewport.pan(dx, dy);
            self.last_mouse = Some((col, row));
        }
        self.pointer_moved(col, row);
    }

    /// Reset drag state when mouse button released
    pub fn mouse_up(&mut self) {
        self.last_mouse = None;
        self.slider_drag = false;
    }
}

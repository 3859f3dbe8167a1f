use crate::app::{App, LoadStatus};
use crate::braille::BrailleCanvas;
use crate::chart::TrendChart;
use crate::data::{Grade, Population};
use crate::legend::LEGEND_TITLE;
use crate::map::MapLayers;
use crate::scale::format_thousands;
use crate::sequence::{slider_stop, SLIDER_WIDTH};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
    Frame,
};

const GRADE_LABEL: &str = " Grade ";
const LEGEND_BUTTON: &str = " [g] Legend ";

/// Screen regions shared by rendering and mouse hit-testing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenLayout {
    /// Bordered map block
    pub map: Rect,
    /// Drawable map area inside the border
    pub map_inner: Rect,
    /// Grade slider and legend button row
    pub controls: Rect,
    pub slider_track: Rect,
    pub legend_button: Rect,
    pub status: Rect,
}

pub fn layout(area: Rect) -> ScreenLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Controls
            Constraint::Length(1), // Status bar
        ])
        .split(area);
    let (map, controls, status) = (chunks[0], chunks[1], chunks[2]);

    let button_w = (LEGEND_BUTTON.len() as u16).min(controls.width);
    let legend_button = Rect {
        x: controls.x + controls.width - button_w,
        y: controls.y,
        width: button_w,
        height: controls.height,
    };

    let track_x = controls.x + GRADE_LABEL.len() as u16;
    // Room for the track plus the value readout before the button
    let room = legend_button.x.saturating_sub(track_x + 4);
    let slider_track = Rect {
        x: track_x,
        y: controls.y,
        width: SLIDER_WIDTH.min(room),
        height: controls.height,
    };

    ScreenLayout {
        map,
        map_inner: Block::default().borders(Borders::ALL).inner(map),
        controls,
        slider_track,
        legend_button,
        status,
    }
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let screen = layout(area);

    render_map(frame, app, &screen);
    render_legend(frame, app, screen.map_inner);
    render_controls(frame, app, &screen);
    render_status_bar(frame, app, screen.status);
    render_info(frame, app, area);
}

fn render_map(frame: &mut Frame, app: &App, screen: &ScreenLayout) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Kenya Primary School Enrollment ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));
    frame.render_widget(block, screen.map);

    let inner = screen.map_inner;
    let mut viewport = app.viewport.clone();
    // Braille gives 2x4 resolution per character
    viewport.width = inner.width as usize * 2;
    viewport.height = inner.height as usize * 4;

    let layers = app.map_renderer.render(inner.width as usize, inner.height as usize, &viewport);
    frame.render_widget(MapWidget { layers }, inner);
}

/// Copy the non-blank cells of a Braille canvas into the buffer
fn draw_canvas(buf: &mut Buffer, canvas: &BrailleCanvas, area: Rect, style: Style) {
    for (col, row, ch) in canvas.cells() {
        if col >= area.width as usize || row >= area.height as usize {
            continue;
        }
        let (x, y) = (area.x + col as u16, area.y + row as u16);
        buf[(x, y)].set_char(ch).set_style(style);
    }
}

/// Composites the map layers back to front
struct MapWidget {
    layers: MapLayers,
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        draw_canvas(buf, &self.layers.coastlines, area, Style::default().fg(Color::Cyan));
        draw_canvas(buf, &self.layers.counties, area, Style::default().fg(Color::DarkGray));
        draw_canvas(buf, &self.layers.borders, area, Style::default().fg(Color::Gray));

        // Girls first so the boys layer ends up on top
        for markers in &self.layers.markers {
            let style = Style::default().fg(markers.color);
            draw_canvas(buf, &markers.fill, area, style.add_modifier(Modifier::DIM));
            draw_canvas(buf, &markers.outline, area, style);
        }
    }
}

fn render_legend(frame: &mut Frame, app: &App, map_inner: Rect) {
    let (Some(rect), Some(geometry)) = (app.legend.rect(map_inner), app.legend.geometry()) else {
        return;
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(LEGEND_TITLE, Style::default().fg(Color::White)));
    let inner = block.inner(rect);
    frame.render_widget(Clear, rect);
    frame.render_widget(block, rect);

    let canvas = geometry.draw();
    let buf = frame.buffer_mut();
    draw_canvas(buf, &canvas, inner, Style::default().fg(Color::Gray));

    let label_x = inner.x + canvas.width() as u16 + 1;
    let label_style = Style::default().fg(Color::White);
    for (row, label) in [
        (geometry.large_label_row, &geometry.large_label),
        (geometry.small_label_row, &geometry.small_label),
    ] {
        if row < inner.height && label_x < inner.x + inner.width {
            let width = (inner.x + inner.width - label_x) as usize;
            buf.set_stringn(label_x, inner.y + row, label, width, label_style);
        }
    }
}

fn render_controls(frame: &mut Frame, app: &App, screen: &ScreenLayout) {
    // Very short terminals leave no row for the controls
    if screen.controls.height == 0 || screen.controls.width == 0 {
        return;
    }
    let grade = app.sequence.grade();
    let buf = frame.buffer_mut();
    let dim = Style::default().fg(Color::DarkGray);

    buf.set_string(screen.controls.x, screen.controls.y, GRADE_LABEL, Style::default().fg(Color::White));

    let track = screen.slider_track;
    if track.width > 0 {
        for x in track.x..track.x + track.width {
            buf[(x, track.y)].set_char('─').set_style(dim);
        }
        let (start, end) = slider_stop(track, grade);
        if end > start {
            buf[(start, track.y)].set_char('●').set_fg(Color::Yellow);
        }
        // Current value right after the track
        buf.set_string(
            track.x + track.width + 1,
            track.y,
            grade.to_string(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        );
    }

    let button_style = if app.legend.is_visible() {
        Style::default().fg(Color::Green)
    } else {
        dim
    };
    let button = screen.legend_button;
    buf.set_stringn(button.x, button.y, LEGEND_BUTTON, button.width as usize, button_style);
}

fn render_info(frame: &mut Frame, app: &App, screen: Rect) {
    let (Some(rect), Some(content)) = (app.info.rect(screen), app.info.content()) else {
        return;
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White));
    let inner = block.inner(rect);
    frame.render_widget(Clear, rect);
    frame.render_widget(block, rect);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let buf = frame.buffer_mut();
    let mut y = inner.y;
    let bottom = inner.y + inner.height;
    buf.set_stringn(
        inner.x,
        y,
        &content.county,
        inner.width as usize,
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    );
    y += 1;

    for population in Population::ALL {
        if y >= bottom {
            break;
        }
        let chart = app.info.chart(population);
        let color = chart.style().color;
        let line = population_line(population, content.grade, content.value(population));
        buf.set_stringn(inner.x, y, line, inner.width as usize, Style::default().fg(color));
        y += 1;

        let chart_area = Rect {
            x: inner.x,
            y,
            width: inner.width,
            height: chart.style().height.min(bottom.saturating_sub(y)),
        };
        render_chart(buf, chart, chart_area);
        y += chart.style().height;
    }
}

fn population_line(population: Population, grade: Grade, value: Option<u32>) -> String {
    let value = value.map_or_else(|| "n/a".to_string(), |v| format_thousands(f64::from(v)));
    format!("{} (grade {}): {}", population.label(), grade, value)
}

fn render_chart(buf: &mut Buffer, chart: &TrendChart, area: Rect) {
    let color = chart.style().color;
    draw_canvas(buf, chart.area(), area, Style::default().fg(color).add_modifier(Modifier::DIM));
    draw_canvas(buf, chart.line(), area, Style::default().fg(color));
    draw_canvas(buf, chart.point(), area, Style::default().fg(Color::White));
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if area.height == 0 || area.width == 0 {
        return;
    }
    let settings = &app.map_renderer.settings;

    let load = match &app.load_status {
        LoadStatus::Loading => Span::styled("loading data… ", Style::default().fg(Color::Yellow)),
        LoadStatus::Ready { records, skipped } if *skipped > 0 => Span::styled(
            format!("counties: {} ({} skipped) ", records, skipped),
            Style::default().fg(Color::Green),
        ),
        LoadStatus::Ready { records, .. } => {
            Span::styled(format!("counties: {} ", records), Style::default().fg(Color::Green))
        }
        LoadStatus::Failed(message) => Span::styled(format!("no data: {} ", message), Style::default().fg(Color::Red)),
    };

    let status = Line::from(vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        load,
        Span::styled(
            if settings.show_borders { "[B]order " } else { "[b]order " },
            Style::default().fg(if settings.show_borders { Color::Green } else { Color::DarkGray }),
        ),
        Span::styled(
            if settings.show_counties { "[Y]county " } else { "[y]county " },
            Style::default().fg(if settings.show_counties { Color::Green } else { Color::DarkGray }),
        ),
        Span::styled(
            "| hjkl:pan +/-:zoom [ ]/1-8:grade r:reset q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(status), area);
}

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent,
    MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;
use tracing::{info, warn};

use kenya_enrollment_map::app::App;
use kenya_enrollment_map::config::AppConfig;
use kenya_enrollment_map::data::{self, Grade, LoadOutcome};
use kenya_enrollment_map::telemetry::{init_tracing, LogTarget};
use kenya_enrollment_map::ui;

#[derive(Parser, Debug)]
#[command(author, version, about = "Kenya primary school enrollment by county, in the terminal", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enrollment CSV (overrides the config file)
    #[arg(long, value_name = "CSV")]
    data: Option<PathBuf>,

    /// Directory holding basemap GeoJSON files
    #[arg(long, value_name = "DIR")]
    basemap: Option<PathBuf>,

    /// Write logs to this file while the map is open
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Convert the CSV to GeoJSON point features and exit
    #[arg(long, value_name = "OUT")]
    export_geojson: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::default(),
    };
    if let Some(csv) = cli.data {
        config.data.enrollment_csv = csv;
    }
    if let Some(dir) = cli.basemap {
        config.data.basemap_dir = dir;
    }

    if let Some(out) = &cli.export_geojson {
        init_tracing(&LogTarget::Stderr, cli.verbose)?;
        let count = data::export_geojson(&config.data.enrollment_csv, out)?;
        println!("Wrote {} features to {}", count, out.display());
        return Ok(());
    }

    // The terminal belongs to the map, so logs only go to a file
    let target = cli.log_file.map_or(LogTarget::Disabled, LogTarget::File);
    init_tracing(&target, cli.verbose)?;

    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, &config);

    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Handle mouse events for hover, panning, zooming and the controls
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Moved => app.pointer_moved(mouse.column, mouse.row),
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        MouseEventKind::Down(MouseButton::Left) => {
            app.pointer_moved(mouse.column, mouse.row);
            app.mouse_down(mouse.column, mouse.row);
        }
        MouseEventKind::Drag(MouseButton::Left) => app.drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.mouse_up(),
        _ => {}
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Only handle key press events (not release)
    if key.kind != KeyEventKind::Press {
        return;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),

        // Pan with hjkl or arrow keys
        KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
        KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
        KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
        KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

        // Zoom
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

        // Grade
        KeyCode::Char(']') => app.grade_up(),
        KeyCode::Char('[') => app.grade_down(),
        KeyCode::Char(c @ '1'..='8') => {
            if let Some(grade) = c.to_digit(10).and_then(|d| Grade::new(d as u8)) {
                app.set_grade(grade);
            }
        }

        // Overlays and layer toggles
        KeyCode::Char('g') | KeyCode::Char('G') => app.toggle_legend(),
        KeyCode::Char('b') | KeyCode::Char('B') => app.map_renderer.toggle_borders(),
        KeyCode::Char('y') | KeyCode::Char('Y') => app.map_renderer.toggle_counties(),

        KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),

        _ => {}
    }
}

/// Deliver the load outcome once it arrives; returns false when the channel is done
fn poll_load(app: &mut App, rx: &Receiver<LoadOutcome>) -> bool {
    match rx.try_recv() {
        Ok(outcome) => {
            app.on_data_loaded(outcome);
            false
        }
        Err(TryRecvError::Empty) => true,
        Err(TryRecvError::Disconnected) => {
            app.load_failed("loader exited without a result".to_string());
            false
        }
    }
}

fn run(terminal: &mut DefaultTerminal, config: &AppConfig) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(size.width, size.height, config)?;

    let loaded = data::load_basemap(&mut app.map_renderer, &config.data.basemap_dir);
    // Fall back to a built-in outline if no basemap files were found
    if !app.map_renderer.has_basemap() {
        warn!(dir = %config.data.basemap_dir.display(), "no basemap files, using built-in outline");
        data::generate_kenya_outline(&mut app.map_renderer);
    }
    info!(layers = loaded, "basemap ready");

    let mut pending = Some(
        data::spawn_load(config.data.enrollment_csv.clone()).context("Failed to start the enrollment loader")?,
    );

    // Main loop
    loop {
        terminal.draw(|frame| ui::render(frame, &app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) => handle_key(&mut app, key),
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }

        if let Some(rx) = &pending {
            if !poll_load(&mut app, rx) {
                pending = None;
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

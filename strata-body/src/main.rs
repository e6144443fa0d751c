//! Strata Body - The Interface
//!
//! Paint a starting pattern with the mouse, step the automaton, and scrub
//! back through every generation it has computed.
//!
//! Configuration comes from the JSON file named by `STRATA_CONFIG`, or from
//! `STRATA_*` environment variables. Logs go to `STRATA_LOG_FILE` if set
//! (the terminal itself belongs to the UI).

mod visualizer;

use std::io;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crossterm::{
    cursor::{Hide, Show},
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use tracing::{info, Level};

use strata_compute::DynSession;
use strata_core::config::StrataConfig;
use strata_core::error::StrataResult;

use visualizer::{RunView, StrataVisualizer};

/// Brush radius change per `[` / `]`
const RADIUS_STEP: f32 = 0.5;

fn init_logging() {
    let Ok(path) = std::env::var("STRATA_LOG_FILE") else {
        return;
    };
    match std::fs::File::create(&path) {
        Ok(file) => {
            tracing_subscriber::fmt()
                .with_max_level(Level::DEBUG)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        Err(e) => eprintln!("Cannot open log file {}: {}", path, e),
    }
}

fn load_config() -> StrataResult<StrataConfig> {
    match std::env::var("STRATA_CONFIG") {
        Ok(path) => StrataConfig::load(&path),
        Err(_) => {
            let config = StrataConfig::from_env();
            config.validate()?;
            Ok(config)
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = load_config()?;
    let session = strata_compute::open_session(&config)?;
    info!("▦ Strata body starting ({})", session.backend().name());

    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture, Hide)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let result = run(&mut terminal, session, &config);

    // Cleanup
    disable_raw_mode()?;
    execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen, Show)?;

    result
}

/// Viewed generation and grid panel size a frame was composited for
type RenderKey = (u32, u16, u16);

/// Per-run input state
struct App {
    session: DynSession,
    visualizer: StrataVisualizer,
    max_radius: f32,
    grid: Rect,
    painting: bool,
    /// What `visualizer.pixels` and `population` currently show
    rendered: Option<RenderKey>,
    population: usize,
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    session: DynSession,
    config: &StrataConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = App::new(session, config.brush.max_radius);

    loop {
        let size = terminal.size()?;
        app.grid = StrataVisualizer::grid_inner(Rect::new(0, 0, size.width, size.height));
        app.refresh();

        terminal.draw(|f| app.visualizer.draw(f))?;

        // Handle input (with timeout)
        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Esc | KeyCode::Char('q') => break,
                    code => app.on_key(code),
                }
            }
            Event::Mouse(mouse) => app.on_mouse(mouse),
            _ => {}
        }
    }

    info!("▦ Strata body exiting at generation {}", app.session.current_generation());
    Ok(())
}

impl App {
    fn new(session: DynSession, max_radius: f32) -> Self {
        Self {
            session,
            visualizer: StrataVisualizer::new(),
            max_radius,
            grid: Rect::default(),
            painting: false,
            rendered: None,
            population: 0,
        }
    }

    /// The viewed generation changed in place (paint, seed, step)
    fn invalidate(&mut self) {
        self.rendered = None;
    }

    /// Refresh the header, compositing only when the view is stale.
    ///
    /// Generations below the current one never change, so a cached frame
    /// stays valid until the cursor moves, the panel resizes, or the
    /// current generation is written.
    fn refresh(&mut self) {
        let viewed = self.session.viewed_generation();
        let key = (viewed, self.grid.width, self.grid.height);
        if self.rendered != Some(key) {
            match self.redraw(viewed) {
                Ok(population) => {
                    self.population = population;
                    self.rendered = Some(key);
                }
                Err(e) => self.visualizer.error(&e),
            }
        }

        let state = self.session.state();
        self.visualizer.view = RunView {
            current_generation: state.current_generation(),
            viewed_generation: viewed,
            capacity: self.session.shape().capacity(),
            brush_radius: state.brush_radius(),
            population: self.population,
            backend: self.session.backend().name(),
        };
    }

    fn redraw(&mut self, viewed: u32) -> StrataResult<usize> {
        self.visualizer.fit_pixels(self.grid);
        self.session.render(&mut self.visualizer.pixels)?;
        self.session.population(viewed)
    }

    fn on_key(&mut self, code: KeyCode) {
        let current = self.session.current_generation();
        let viewed = self.session.viewed_generation();

        let result = match code {
            KeyCode::Char(' ') => self.session.step().map(|g| {
                self.invalidate();
                self.visualizer.info(format!("Stepped to generation {}", g));
            }),
            KeyCode::Left => self.session.set_viewed_generation(viewed.saturating_sub(1)),
            KeyCode::Right => self.session.set_viewed_generation((viewed + 1).min(current)),
            KeyCode::Home => self.session.set_viewed_generation(0),
            KeyCode::End => self.session.set_viewed_generation(current),
            KeyCode::Char('[') => self.adjust_radius(-RADIUS_STEP),
            KeyCode::Char(']') => self.adjust_radius(RADIUS_STEP),
            KeyCode::Char('r') => {
                let seed = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_nanos() as u64)
                    .unwrap_or(0);
                self.session.seed_random(0.5, seed).map(|_| {
                    self.invalidate();
                    self.visualizer
                        .info(format!("Seeded generation {} with a random soup", current));
                })
            }
            KeyCode::Char('e') => self.export(),
            _ => Ok(()),
        };

        if let Err(e) = result {
            self.visualizer.error(&e);
        }
    }

    fn adjust_radius(&mut self, delta: f32) -> StrataResult<()> {
        let radius = (self.session.state().brush_radius() + delta).clamp(0.0, self.max_radius);
        self.session.set_brush_radius(radius)
    }

    fn export(&mut self) -> StrataResult<()> {
        let history = self.session.export_all()?;
        let cells = self.session.shape().cells_per_layer();
        let threshold = self.session.rule().threshold;
        let populations: Vec<usize> = history
            .chunks_exact(cells)
            .map(|layer| strata_core::cell::population(layer, threshold))
            .collect();
        self.visualizer
            .info(visualizer::summarize_export(&populations, history.len()));
        Ok(())
    }

    fn on_mouse(&mut self, mouse: MouseEvent) {
        let position = visualizer::pointer_position(self.grid, mouse.column, mouse.row);
        let result = match (mouse.kind, position) {
            (MouseEventKind::Down(MouseButton::Left), Some((x, y))) => {
                self.painting = true;
                self.invalidate();
                let radius = self.session.state().brush_radius();
                self.session.begin_stroke(x, y, radius)
            }
            (MouseEventKind::Drag(MouseButton::Left), Some((x, y))) if self.painting => {
                self.invalidate();
                self.session.continue_stroke(x, y)
            }
            (MouseEventKind::Up(MouseButton::Left), _) => {
                self.painting = false;
                self.session.end_stroke();
                Ok(())
            }
            _ => Ok(()),
        };

        if let Err(e) = result {
            self.visualizer.error(&e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use strata_core::config::BackendKind;

    fn app() -> App {
        let mut config = StrataConfig::with_grid(8, 8, 3);
        config.compute.backend = BackendKind::Cpu;
        let mut app = App::new(strata_compute::open_session(&config).unwrap(), 10.0);
        app.grid = Rect::new(1, 3, 8, 4);
        app
    }

    fn bytes_read(app: &App) -> u64 {
        app.session.stats().bytes_read_back
    }

    fn left_button(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_idle_refresh_does_not_read_back() {
        let mut app = app();
        app.refresh();
        let after_first = bytes_read(&app);
        assert!(after_first > 0);

        app.refresh();
        app.refresh();
        assert_eq!(bytes_read(&app), after_first);
    }

    #[test]
    fn test_step_and_scrub_redraw() {
        let mut app = app();
        app.refresh();
        let idle = bytes_read(&app);

        app.on_key(KeyCode::Char(' '));
        app.refresh();
        let stepped = bytes_read(&app);
        assert!(stepped > idle);
        assert_eq!(app.visualizer.view.viewed_generation, 1);

        app.on_key(KeyCode::Left);
        app.refresh();
        assert!(bytes_read(&app) > stepped);
        assert_eq!(app.visualizer.view.viewed_generation, 0);
    }

    #[test]
    fn test_painting_updates_population() {
        let mut app = app();
        app.refresh();
        assert_eq!(app.visualizer.view.population, 0);

        app.on_mouse(left_button(MouseEventKind::Down(MouseButton::Left), 4, 5));
        app.on_mouse(left_button(MouseEventKind::Up(MouseButton::Left), 4, 5));
        app.refresh();
        assert!(app.visualizer.view.population > 0);
    }

    #[test]
    fn test_resize_recomposites() {
        let mut app = app();
        app.refresh();
        assert_eq!(app.visualizer.pixels.width(), 8);

        app.grid = Rect::new(1, 3, 12, 4);
        app.refresh();
        assert_eq!(app.visualizer.pixels.width(), 12);
        assert_eq!(app.visualizer.pixels.height(), 8);
    }
}

//! Use the tui crate to play the animation directly on the terminal
use super::{DisplayService, IdleEventReceiver, Viewport};
use crate::layers::{Layer, PolygonLayer, Rgb, TripsLayer};
use crate::view::{Frame, IdleEventState, ViewState};
use crate::Error;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use log::{debug, info, warn};
use std::io::{self, Stdout};
use std::sync::mpsc::TryRecvError;
use std::time::{Duration, Instant};
use trip_playback_derive::FromServiceConfig;
use tui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Span, Spans},
    widgets::canvas::{Canvas, Context, Line, Points},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame as TermFrame, Terminal,
};

/// Defines how the terminal playback behaves
#[derive(Debug, FromServiceConfig)]
pub struct TerminalDisplay {
    /// milliseconds between two animation frames
    frame_interval_ms: u64,
    /// minutes moved by one press of the arrow keys
    scrub_step: f64,
}

impl Default for TerminalDisplay {
    fn default() -> Self {
        TerminalDisplay {
            frame_interval_ms: 16,
            scrub_step: 10.0,
        }
    }
}

/// What the event loop should do after a key press
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum KeyAction {
    Continue,
    Quit,
}

impl TerminalDisplay {
    fn handle_key(&self, view: &mut ViewState, key: KeyEvent) -> KeyAction {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return KeyAction::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return KeyAction::Quit
            }
            KeyCode::Left => {
                view.scrub(view.time() - self.scrub_step);
            }
            KeyCode::Right => {
                view.scrub(view.time() + self.scrub_step);
            }
            KeyCode::Home => {
                view.scrub(view.settings().min_time);
            }
            KeyCode::End => {
                view.scrub(view.settings().max_time);
            }
            KeyCode::Char(' ') => view.toggle_pause(),
            _ => {}
        }
        KeyAction::Continue
    }

    fn event_loop<B: Backend>(
        &self,
        terminal: &mut Terminal<B>,
        view: &mut ViewState,
        idle_events: &IdleEventReceiver,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let interval = Duration::from_millis(self.frame_interval_ms.max(1));
        let mut last_frame = Instant::now();
        loop {
            match idle_events.try_recv() {
                Ok(result) => {
                    view.commit_idle_events(result);
                }
                Err(TryRecvError::Disconnected) => {
                    // the loader went away without a result, settle on the empty state
                    if let IdleEventState::Loading = view.idle_events() {
                        view.commit_idle_events(Err(Error::Other(
                            "the dataset loader stopped without a result".to_string(),
                        )));
                    }
                }
                Err(TryRecvError::Empty) => {}
            }

            let frame = view.frame();
            terminal.draw(|f| draw(f, view, &frame))?;

            let timeout = interval
                .checked_sub(last_frame.elapsed())
                .unwrap_or_default();
            if event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    if self.handle_key(view, key) == KeyAction::Quit {
                        info!("Playback stopped by the user at {}", frame.clock_label);
                        return Ok(());
                    }
                }
            }
            if last_frame.elapsed() >= interval {
                view.advance();
                last_frame = Instant::now();
            }
        }
    }
}

impl DisplayService for TerminalDisplay {
    fn run(
        &self,
        view: &mut ViewState,
        idle_events: IdleEventReceiver,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut stdout = io::stdout();
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal, view, &idle_events);

        // restore the terminal even when the loop failed
        view.dispose();
        debug!("View disposed, restoring terminal");
        let restored = restore_terminal(&mut terminal);
        result?;
        restored
    }
}

/// Run every restore step, the first failure is returned after all of them ran.
///
/// The steps are evaluated eagerly so a failed `disable_raw_mode` still leaves the
/// alternate screen.
fn restore_terminal(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let steps: Vec<(&str, Result<(), Box<dyn std::error::Error>>)> = vec![
        ("disable raw mode", disable_raw_mode().map_err(Into::into)),
        (
            "leave the alternate screen",
            execute!(terminal.backend_mut(), LeaveAlternateScreen).map_err(Into::into),
        ),
        ("show the cursor", terminal.show_cursor().map_err(Into::into)),
    ];
    first_error(steps)
}

/// Log every failed step and keep the first error
fn first_error(
    steps: Vec<(&str, Result<(), Box<dyn std::error::Error>>)>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut first_error = None;
    for (step, result) in steps {
        if let Err(e) = result {
            warn!("Could not {} while restoring the terminal: {}", step, e);
            first_error.get_or_insert(e);
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn draw<B: Backend>(f: &mut TermFrame<B>, view: &ViewState, frame: &Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Min(5),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(f.size());

    draw_map(f, chunks[0], view, frame);

    let readout = Paragraph::new(Spans::from(vec![Span::styled(
        format!("TIME : {}", frame.clock_label.replace(':', " : ")),
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    )]));
    f.render_widget(readout, chunks[1]);

    let state = if view.is_running() { "playing" } else { "paused" };
    let status = Paragraph::new(Spans::from(vec![Span::raw(format!(
        "{} | {} | {} active | {} trips",
        state,
        view.idle_events().describe(),
        frame.markers().len(),
        view.trips().len()
    ))]));
    f.render_widget(status, chunks[2]);

    let settings = view.settings();
    let range = settings.max_time - settings.min_time;
    let ratio = if range > 0.0 {
        ((frame.time - settings.min_time) / range).max(0.0).min(1.0)
    } else {
        0.0
    };
    let label = format!("{:.1}", frame.time);
    let slider = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("scrub: \u{2190}/\u{2192} home/end | pause: space | quit: q"),
        )
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
        .ratio(ratio)
        .label(label.as_str());
    f.render_widget(slider, chunks[3]);
}

fn draw_map<B: Backend>(f: &mut TermFrame<B>, area: Rect, view: &ViewState, frame: &Frame) {
    // terminal cells are roughly twice as tall as they are wide
    let aspect = f64::from(area.width) / (2.0 * f64::from(area.height.max(1)));
    let viewport = Viewport::new(view.pose(), aspect);
    let markers: Vec<(f64, f64)> = frame
        .markers()
        .iter()
        .map(|m| viewport.project(m))
        .collect();

    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title("Trips"))
        .marker(symbols::Marker::Braille)
        .x_bounds(viewport.x_bounds())
        .y_bounds(viewport.y_bounds())
        .paint(|ctx| {
            for layer in &frame.layers {
                match layer {
                    Layer::Polygon(ground) => {
                        draw_ground(ctx, &viewport, ground, frame.effects.building_color)
                    }
                    Layer::Trips(trips) => draw_trails(ctx, &viewport, trips),
                    Layer::Scatterplot(_) => {
                        ctx.layer();
                        ctx.draw(&Points {
                            coords: &markers,
                            color: Color::White,
                        });
                    }
                }
            }
        });
    f.render_widget(canvas, area);
}

/// The ground polygon is fully transparent, only its outline is drawn when it is stroked
fn draw_ground(ctx: &mut Context, viewport: &Viewport, ground: &PolygonLayer, color: Rgb) {
    if !ground.stroked {
        return;
    }
    for polygon in &ground.polygons {
        let points: Vec<(f64, f64)> = polygon.iter().map(|p| viewport.project(p)).collect();
        for (idx, &(x1, y1)) in points.iter().enumerate() {
            let (x2, y2) = points[(idx + 1) % points.len()];
            ctx.draw(&Line {
                x1,
                y1,
                x2,
                y2,
                color: Color::Rgb(color[0], color[1], color[2]),
            });
        }
    }
}

fn draw_trails(ctx: &mut Context, viewport: &Viewport, trips: &TripsLayer) {
    for trip in trips.trips.iter() {
        let [r, g, b] = trips.color(trip);
        let color = Color::Rgb(r, g, b);
        let trail: Vec<(f64, f64)> = trips
            .trail(trip)
            .iter()
            .map(|p| viewport.project(p))
            .collect();
        for pair in trail.windows(2) {
            ctx.draw(&Line {
                x1: pair[0].0,
                y1: pair[0].1,
                x2: pair[1].0,
                y2: pair[1].1,
                color,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::PlaybackSettings;
    use crate::config::{FromServiceConfig, ServiceConfig};
    use crate::layers::Theme;
    use crate::view::ViewPose;

    fn view() -> ViewState {
        ViewState::new(
            PlaybackSettings::default(),
            Vec::new(),
            Theme::default(),
            ViewPose::default(),
        )
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn arrow_keys_scrub_within_bounds() {
        let display = TerminalDisplay::default();
        let mut view = view();

        display.handle_key(&mut view, key(KeyCode::Right));
        assert_eq!(view.time(), 430.0);
        display.handle_key(&mut view, key(KeyCode::Left));
        display.handle_key(&mut view, key(KeyCode::Left));
        assert_eq!(view.time(), 420.0);
        display.handle_key(&mut view, key(KeyCode::End));
        assert_eq!(view.time(), 1440.0);
        display.handle_key(&mut view, key(KeyCode::Right));
        assert_eq!(view.time(), 1440.0);
        display.handle_key(&mut view, key(KeyCode::Home));
        assert_eq!(view.time(), 420.0);
    }

    #[test]
    fn space_pauses_and_q_quits() {
        let display = TerminalDisplay::default();
        let mut view = view();

        assert_eq!(
            display.handle_key(&mut view, key(KeyCode::Char(' '))),
            KeyAction::Continue
        );
        assert!(!view.is_running());
        assert_eq!(
            display.handle_key(&mut view, key(KeyCode::Char('q'))),
            KeyAction::Quit
        );
        assert_eq!(
            display.handle_key(
                &mut view,
                KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)
            ),
            KeyAction::Quit
        );
        assert_eq!(
            display.handle_key(&mut view, key(KeyCode::Char('c'))),
            KeyAction::Continue
        );
    }

    #[test]
    fn restore_keeps_going_after_a_failed_step() {
        let failed = |msg: &str| -> Result<(), Box<dyn std::error::Error>> {
            Err(Box::new(Error::Other(msg.to_string())))
        };
        let result = first_error(vec![
            ("disable raw mode", failed("raw")),
            ("leave the alternate screen", Ok(())),
            ("show the cursor", failed("cursor")),
        ]);
        assert_eq!(
            result.unwrap_err().to_string(),
            Error::Other("raw".to_string()).to_string()
        );

        assert!(first_error(vec![("show the cursor", Ok(()))]).is_ok());
    }

    #[test]
    fn negative_frame_interval_is_rejected() {
        let mut config = ServiceConfig::new("tui");
        config.set_parameter("frame_interval_ms", serde_yaml::Value::from(-1));
        assert!(TerminalDisplay::from_config(&config).is_err());

        config.set_parameter("frame_interval_ms", serde_yaml::Value::from(40));
        config.set_parameter("scrub_step", serde_yaml::Value::from(2.5));
        let display = TerminalDisplay::from_config(&config).unwrap();
        assert_eq!(display.frame_interval_ms, 40);
        assert_eq!(display.scrub_step, 2.5);
    }
}

//! Define the interactive play subcommand
use super::{seek, DatasetOpts};
use crate::clock::parse_clock_time;
use crate::config::Config;
use crate::dataset::load_idle_events;
use crate::view::ViewState;
use log::{debug, info};
use std::sync::mpsc;
use std::thread;
use structopt::StructOpt;

/// Animate trips and idle vehicle markers in the terminal
#[derive(Debug, StructOpt)]
pub struct PlayOpts {
    #[structopt(flatten)]
    datasets: DatasetOpts,
    /// Clock time to start the playback at (HH:MM or minutes since midnight)
    #[structopt(long, parse(try_from_str = parse_clock_time))]
    start: Option<f64>,
    /// Multiplier applied to the per frame clock increment
    #[structopt(long)]
    speed: Option<f64>,
}

/// Implementation of the `play` subcommand
pub fn play_command(config: Config, opts: PlayOpts) -> Result<(), Box<dyn std::error::Error>> {
    let display = config.get_display_handler()?;
    let idle_source = opts.datasets.idle_events_source(&config)?;
    let trips = opts.datasets.load_trips_or_empty(&config)?;

    let mut settings = *config.playback();
    if let Some(speed) = opts.speed {
        settings.speed = speed;
    }
    let mut view = ViewState::new(settings, trips, config.theme().clone(), *config.view());
    if let Some(start) = opts.start {
        seek(&mut view, start);
    }

    // download idle events off the UI thread, the result is committed by the display loop
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let result = load_idle_events(&idle_source);
        if tx.send(result).is_err() {
            debug!("Playback ended before the idle events finished loading");
        }
    });

    info!("Starting playback at {}", view.frame().clock_label);
    display.run(&mut view, rx)
}

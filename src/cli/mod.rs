//! Define the application's command line interface
use crate::clock::format_clock;
use crate::config::Config;
use crate::dataset::{load_trips, DatasetSource, TripRecord};
use crate::view::ViewState;
use crate::Error;
use log::{error, warn};
use simplelog::LevelFilter;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use structopt::StructOpt;

mod frame_image;
use frame_image::{frame_image_command, FrameImageOpts};
mod play;
use play::{play_command, PlayOpts};
mod snapshot;
use snapshot::{snapshot_command, SnapshotOpts};

/// Play back taxi trips and empty vehicle markers over a city map
#[derive(Debug, StructOpt)]
#[structopt(name = "trip-playback")]
pub struct Cli {
    /// Set logging level to debug, use a second time (e.g. -vv) to set logging to trace
    #[structopt(short, long, parse(from_occurrences))]
    verbose: i32,
    /// Suppress info logging messages use a second time (e.g. -qq) to hide warnings
    #[structopt(short, long, parse(from_occurrences))]
    quiet: i32,
    /// Read configuration from this file instead of the default location
    #[structopt(short, long, parse(from_os_str))]
    config: Option<PathBuf>,
    #[structopt(subcommand)]
    cmd: Command,
}

impl Cli {
    /// Return the verbose flag counts as a log level filter
    pub fn verbosity(&self, default: LevelFilter) -> LevelFilter {
        if self.quiet == 1 {
            LevelFilter::Warn
        } else if self.quiet > 1 {
            LevelFilter::Error
        } else if self.verbose == 1 {
            LevelFilter::Debug
        } else if self.verbose > 1 {
            LevelFilter::Trace
        } else {
            default
        }
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config.as_deref()
    }

    /// True when the command takes over the terminal, so log lines must go elsewhere
    pub fn is_interactive(&self) -> bool {
        matches!(self.cmd, Command::Play(_))
    }

    /// Consume options struct and return the result of subcommand execution
    pub fn execute_subcommand(self, config: Config) -> Result<(), Box<dyn std::error::Error>> {
        self.cmd.execute(config)
    }
}

#[derive(Debug, StructOpt)]
pub enum Command {
    /// Animate the playback in the terminal
    #[structopt(name = "play")]
    Play(PlayOpts),
    /// Print the layers composed for a single point in time as JSON
    #[structopt(name = "snapshot")]
    Snapshot(SnapshotOpts),
    /// Render a single point in time over the MapBox basemap
    #[structopt(name = "frame-image")]
    FrameImage(FrameImageOpts),
}

impl Command {
    /// Consume enum variant and return the result of the command's execution
    fn execute(self, config: Config) -> Result<(), Box<dyn std::error::Error>> {
        match self {
            Command::Play(opts) => play_command(config, opts),
            Command::Snapshot(opts) => snapshot_command(config, opts),
            Command::FrameImage(opts) => frame_image_command(config, opts),
        }
    }
}

/// Dataset locations that override the config file
#[derive(Debug, StructOpt)]
pub struct DatasetOpts {
    /// URL or file path of the idle event dataset
    #[structopt(long)]
    idle_events: Option<String>,
    /// URL or file path of the trip dataset
    #[structopt(long)]
    trips: Option<String>,
    /// Don't load trips at all, only idle event markers are shown
    #[structopt(long)]
    no_trips: bool,
}

impl DatasetOpts {
    pub fn idle_events_source(&self, config: &Config) -> Result<DatasetSource, Error> {
        match &self.idle_events {
            Some(src) => src.parse(),
            None => config.datasets().idle_events(),
        }
    }

    pub fn trips_source(&self, config: &Config) -> Result<DatasetSource, Error> {
        match &self.trips {
            Some(src) => src.parse(),
            None => config.datasets().trips(),
        }
    }

    /// Load the trips, a failed download leaves the map without trails
    pub fn load_trips_or_empty(&self, config: &Config) -> Result<Vec<TripRecord>, Error> {
        if self.no_trips {
            return Ok(Vec::new());
        }
        let source = self.trips_source(config)?;
        match load_trips(&source) {
            Ok(trips) => Ok(trips),
            Err(e) => {
                error!("Could not load the trip dataset from {}: {}", source, e);
                Ok(Vec::new())
            }
        }
    }
}

/// Move the view to a time given on the command line, times outside the playback range are clamped
fn seek(view: &mut ViewState, time: f64) -> f64 {
    let applied = view.scrub(time);
    if applied != time {
        warn!(
            "{} ({} minutes) is outside the playback range, showing {} instead",
            format_clock(time),
            time,
            format_clock(applied)
        );
    }
    applied
}

/// Write to the file at `path`, or stdout when no path or "-" is given
fn write_output(path: Option<PathBuf>, data: &[u8]) -> io::Result<()> {
    match path {
        Some(path) if path.to_string_lossy() != "-" => {
            let mut fp = File::create(path)?;
            fp.write_all(data)
        }
        _ => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(data)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_flags() {
        let cli = Cli::from_iter(&["trip-playback", "-vv", "snapshot", "08:00"]);
        assert_eq!(cli.verbosity(LevelFilter::Info), LevelFilter::Trace);
        assert!(!cli.is_interactive());

        let cli = Cli::from_iter(&["trip-playback", "-q", "play"]);
        assert_eq!(cli.verbosity(LevelFilter::Info), LevelFilter::Warn);
        assert!(cli.is_interactive());

        let cli = Cli::from_iter(&["trip-playback", "-c", "my.yml", "play"]);
        assert_eq!(cli.verbosity(LevelFilter::Info), LevelFilter::Info);
        assert_eq!(cli.config_path(), Some(Path::new("my.yml")));
    }

    #[test]
    fn bad_times_are_rejected() {
        assert!(Cli::from_iter_safe(&["trip-playback", "snapshot", "noon"]).is_err());
        assert!(Cli::from_iter_safe(&["trip-playback", "play", "--start", "25:99"]).is_err());
    }

    #[test]
    fn seek_clamps_into_playback_range() {
        let mut view = ViewState::new(
            Default::default(),
            Vec::new(),
            Default::default(),
            Default::default(),
        );
        assert_eq!(seek(&mut view, 30.0), 420.0);
        assert_eq!(view.frame().clock_label, "07:00");
        assert_eq!(seek(&mut view, 600.0), 600.0);
        assert_eq!(seek(&mut view, 1500.0), 1440.0);
    }

    #[test]
    fn dataset_overrides() {
        let config = Config::default();
        let opts = DatasetOpts {
            idle_events: Some("local.json".to_string()),
            trips: None,
            no_trips: true,
        };
        assert_eq!(
            opts.idle_events_source(&config).unwrap(),
            DatasetSource::File(PathBuf::from("local.json"))
        );
        assert!(matches!(
            opts.trips_source(&config).unwrap(),
            DatasetSource::Url(_)
        ));
        assert!(opts.load_trips_or_empty(&config).unwrap().is_empty());
    }
}

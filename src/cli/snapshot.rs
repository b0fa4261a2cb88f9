//! Define the snapshot subcommand
use super::{seek, write_output, DatasetOpts};
use crate::clock::parse_clock_time;
use crate::config::Config;
use crate::dataset::load_idle_events;
use crate::filter::active_event_ids;
use crate::view::ViewState;
use log::info;
use serde::Serialize;
use std::path::PathBuf;
use structopt::StructOpt;

/// Print the frame composed for a single clock time as JSON
#[derive(Debug, StructOpt)]
pub struct SnapshotOpts {
    /// Clock time of the frame (HH:MM or minutes since midnight)
    #[structopt(name = "TIME", parse(try_from_str = parse_clock_time))]
    time: f64,
    #[structopt(flatten)]
    datasets: DatasetOpts,
    /// Only list the keys of the idle events active at TIME
    #[structopt(long)]
    ids_only: bool,
    /// name of file to output JSON to, if not provided or "-" is used data is written to stdout
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ActiveIds {
    time: f64,
    clock_label: String,
    ids: Vec<usize>,
}

/// Implementation of the `snapshot` subcommand
pub fn snapshot_command(
    config: Config,
    opts: SnapshotOpts,
) -> Result<(), Box<dyn std::error::Error>> {
    let idle_source = opts.datasets.idle_events_source(&config)?;
    let trips = if opts.ids_only {
        Vec::new()
    } else {
        opts.datasets.load_trips_or_empty(&config)?
    };

    let mut view = ViewState::new(
        *config.playback(),
        trips,
        config.theme().clone(),
        *config.view(),
    );
    view.commit_idle_events(load_idle_events(&idle_source));
    seek(&mut view, opts.time);
    let frame = view.frame();
    info!(
        "Frame at {} has {} active idle markers",
        frame.clock_label,
        frame.markers().len()
    );

    let json = if opts.ids_only {
        serde_json::to_string_pretty(&ActiveIds {
            time: frame.time,
            clock_label: frame.clock_label.clone(),
            ids: active_event_ids(view.idle_events().events(), frame.time),
        })?
    } else {
        serde_json::to_string_pretty(&frame)?
    };
    write_output(opts.output, format!("{}\n", json).as_bytes())?;
    Ok(())
}

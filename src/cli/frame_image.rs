//! Define frame image subcommand
use super::{seek, write_output, DatasetOpts};
use crate::clock::parse_clock_time;
use crate::config::{Config, ServiceType};
use crate::dataset::load_idle_events;
use crate::view::ViewState;
use log::info;
use std::path::PathBuf;
use structopt::StructOpt;

/// Generate an image of the map at a single clock time, trails and markers included
#[derive(Debug, StructOpt)]
pub struct FrameImageOpts {
    /// Clock time of the frame (HH:MM or minutes since midnight)
    #[structopt(name = "TIME", parse(try_from_str = parse_clock_time))]
    time: f64,
    #[structopt(flatten)]
    datasets: DatasetOpts,
    /// Access token for the basemap provider, overrides the config file
    #[structopt(long, env = "MAPBOX_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,
    /// name of file to output image data to, if not provided or "-" is used data is written to stdout
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,
}

pub fn frame_image_command(
    config: Config,
    opts: FrameImageOpts,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = config;
    if let Some(token) = opts.access_token {
        config.set_service_parameter(
            ServiceType::Basemap,
            "mapbox",
            "access_token",
            serde_yaml::Value::String(token),
        );
    }
    let basemap = config.get_basemap_handler()?;

    let idle_source = opts.datasets.idle_events_source(&config)?;
    let trips = opts.datasets.load_trips_or_empty(&config)?;
    let mut view = ViewState::new(
        *config.playback(),
        trips,
        config.theme().clone(),
        *config.view(),
    );
    view.commit_idle_events(load_idle_events(&idle_source));
    seek(&mut view, opts.time);

    let frame = view.frame();
    let image_data = basemap.render_frame(view.pose(), &frame)?;
    info!(
        "Rendered frame at {} ({} bytes)",
        frame.clock_label,
        image_data.len()
    );
    write_output(opts.output, &image_data)?;

    Ok(())
}

//! Animated playback of taxi trips and empty vehicle markers over a city map.
//!
//! The playback clock counts minutes since midnight. Every frame the idle events
//! whose time window contains the clock value are selected and composed, together
//! with the trip trails, into layers that a display or basemap service draws.
use std::path::PathBuf;

pub mod animation;
pub mod cli;
pub mod clock;
pub mod config;
pub mod dataset;
mod error;
pub mod filter;
pub mod gps;
pub mod layers;
pub mod services;
pub mod view;

pub use error::Error;
pub use gps::Location;

static DATA_DIR_NAME: &str = "trip-playback";
static LOG_FILE_NAME: &str = "trip-playback.log";

/// Directory for files written by the application, e.g. the playback log
pub fn data_dir() -> PathBuf {
    dirs::data_dir().unwrap_or_default().join(DATA_DIR_NAME)
}

/// Log file used while the terminal is taken over by the playback
pub fn log_file_path() -> PathBuf {
    data_dir().join(LOG_FILE_NAME)
}

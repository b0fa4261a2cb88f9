use log::trace;
use simplelog::{Config as LogConfig, TermLogger, TerminalMode, WriteLogger};
use std::fs::{create_dir_all, File};
use structopt::StructOpt;
use trip_playback::cli::Cli;
use trip_playback::config::Config;
use trip_playback::{data_dir, log_file_path};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opt = Cli::from_args();
    let config = Config::load_or_default(opt.config_path())?;
    let level_filter = opt.verbosity(config.log_level());

    // the interactive display owns the terminal, send log lines to a file instead
    if opt.is_interactive() {
        if !data_dir().exists() {
            create_dir_all(data_dir())?;
        }
        WriteLogger::init(
            level_filter,
            LogConfig::default(),
            File::create(log_file_path())?,
        )?;
    } else {
        TermLogger::init(level_filter, LogConfig::default(), TerminalMode::Stderr)?;
    }
    trace!("Loaded configuration: {:?}", config);

    // execute the requested subcommand
    opt.execute_subcommand(config)
}

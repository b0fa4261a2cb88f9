//! Store application configuration that gets read from disk
use crate::clock::PlaybackSettings;
use crate::dataset::DatasetSource;
use crate::layers::Theme;
use crate::services::{
    new_basemap_handler, new_display_handler, BasemapService, DisplayService,
};
use crate::view::ViewPose;
use crate::Error;
use log::debug;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_yaml::Value;
use simplelog::LevelFilter;
use std::collections::HashMap;
use std::fs::File;
use std::io::prelude::*;
use std::path::{Path, PathBuf};
use std::str::FromStr;

static CONFIG_DIR_NAME: &str = "trip-playback";
static CONFIG_FILE_NAME: &str = "config.yml";

static DEFAULT_TRIPS_URL: &str = "https://raw.githubusercontent.com/jihoyeo/mobilty-for-disabled/a7fe772f36fd19f37968511759305b79f4d36e7d/src/trips.json";
static DEFAULT_IDLE_EVENTS_URL: &str = "https://raw.githubusercontent.com/jihoyeo/mobilty-for-disabled/a7fe772f36fd19f37968511759305b79f4d36e7d/src/empty.json";

/// Defines the allowed keys under the services map
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Basemap,
    Display,
}

/// Type alias for clarity
pub type ServiceParameters = HashMap<String, Value>;

/// Configuration options for a single service of any type
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    handler: String,
    #[serde(default)]
    configuration: ServiceParameters,
}

impl ServiceConfig {
    /// Configuration for a handler with every parameter left at its default
    pub fn new(handler: &str) -> Self {
        ServiceConfig {
            handler: handler.to_string(),
            configuration: ServiceParameters::new(),
        }
    }

    pub fn handler(&self) -> &str {
        &self.handler
    }

    pub fn parameters(&self) -> impl Iterator<Item = &String> + '_ {
        self.configuration.keys()
    }

    pub fn get_parameter(&self, key: &str) -> Option<&Value> {
        self.configuration.get(key)
    }

    /// Override a single parameter, e.g. with a value given on the command line
    pub fn set_parameter(&mut self, key: &str, value: Value) {
        self.configuration.insert(key.to_string(), value);
    }

    fn invalid_value(&self, key: &str, expected: &str, value: &Value) -> Error {
        Error::InvalidConfigurationValue(format!(
            "invalid value for {}.{}, expected {}: {:?}",
            &self.handler, key, expected, value
        ))
    }

    pub fn get_parameter_as_string(&self, key: &str) -> Option<Result<String, Error>> {
        self.configuration.get(key).map(|value| {
            value
                .as_str()
                .map(|v| v.to_string())
                .ok_or_else(|| self.invalid_value(key, "a string", value))
        })
    }

    pub fn get_parameter_as_i64(&self, key: &str) -> Option<Result<i64, Error>> {
        self.configuration.get(key).map(|value| {
            value
                .as_i64()
                .ok_or_else(|| self.invalid_value(key, "an integer", value))
        })
    }

    pub fn get_parameter_as_f64(&self, key: &str) -> Option<Result<f64, Error>> {
        self.configuration.get(key).map(|value| {
            value
                .as_f64()
                .ok_or_else(|| self.invalid_value(key, "a floating point value", value))
        })
    }

    pub fn get_parameter_as_bool(&self, key: &str) -> Option<Result<bool, Error>> {
        self.configuration.get(key).map(|value| {
            value
                .as_bool()
                .ok_or_else(|| self.invalid_value(key, "true or false", value))
        })
    }
}

/// Build a service from its configuration block, usually through `#[derive(FromServiceConfig)]`
pub trait FromServiceConfig: Sized {
    fn from_config(config: &ServiceConfig) -> Result<Self, Error>;
}

/// Locations of the two datasets, URLs or local file paths
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    trips: String,
    idle_events: String,
}

impl DatasetConfig {
    pub fn trips(&self) -> Result<DatasetSource, Error> {
        self.trips.parse()
    }

    pub fn idle_events(&self) -> Result<DatasetSource, Error> {
        self.idle_events.parse()
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        DatasetConfig {
            trips: DEFAULT_TRIPS_URL.to_string(),
            idle_events: DEFAULT_IDLE_EVENTS_URL.to_string(),
        }
    }
}

/// Configuration struct that we can create from the config file used
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(
        deserialize_with = "deserialize_level_filter",
        serialize_with = "serialize_level_filter"
    )]
    log_level: LevelFilter,
    playback: PlaybackSettings,
    datasets: DatasetConfig,
    view: ViewPose,
    theme: Theme,
    services: HashMap<ServiceType, ServiceConfig>,
}

impl Config {
    pub fn load<T: Read>(source: &mut T) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_reader(source)
    }

    /// Read the given file, or the default config file when it exists, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let path = default_config_path();
                if !path.exists() {
                    debug!("No config file at {:?}, using defaults", path);
                    return Ok(Config::default());
                }
                path
            }
        };
        debug!("Reading config file {:?}", path);
        let mut fp = File::open(&path)?;
        Ok(Config::load(&mut fp)?)
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn playback(&self) -> &PlaybackSettings {
        &self.playback
    }

    pub fn datasets(&self) -> &DatasetConfig {
        &self.datasets
    }

    pub fn view(&self) -> &ViewPose {
        &self.view
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// The configured block for a service type, if any
    pub fn service_config(&self, service: ServiceType) -> Option<&ServiceConfig> {
        self.services.get(&service)
    }

    /// Override one service parameter, the service block is created for `handler` when missing
    pub fn set_service_parameter(
        &mut self,
        service: ServiceType,
        handler: &str,
        key: &str,
        value: Value,
    ) {
        self.services
            .entry(service)
            .or_insert_with(|| ServiceConfig::new(handler))
            .set_parameter(key, value);
    }

    /// Basemap renderer, Mapbox with default parameters when nothing is configured
    pub fn get_basemap_handler(&self) -> Result<Box<dyn BasemapService>, Error> {
        match self.services.get(&ServiceType::Basemap) {
            Some(cfg) => new_basemap_handler(cfg),
            None => new_basemap_handler(&ServiceConfig::new("mapbox")),
        }
    }

    pub fn get_display_handler(&self) -> Result<Box<dyn DisplayService>, Error> {
        match self.services.get(&ServiceType::Display) {
            Some(cfg) => new_display_handler(cfg),
            // use terminal as default display since we always have that
            None => new_display_handler(&ServiceConfig::new("tui")),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: default_level_filter(),
            playback: PlaybackSettings::default(),
            datasets: DatasetConfig::default(),
            view: ViewPose::default(),
            theme: Theme::default(),
            services: HashMap::new(),
        }
    }
}

/// `<config dir>/trip-playback/config.yml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_default()
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

fn deserialize_level_filter<'de, D>(deserializer: D) -> Result<LevelFilter, D::Error>
where
    D: Deserializer<'de>,
{
    let buf = String::deserialize(deserializer)?;
    LevelFilter::from_str(&buf)
        .map_err(|_| serde::de::Error::custom(format!("invalid level value: {}", buf)))
}

fn serialize_level_filter<S>(level: &LevelFilter, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&level.to_string())
}

fn default_level_filter() -> LevelFilter {
    LevelFilter::Info
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = Config::load(&mut "{}".as_bytes()).unwrap();
        assert_eq!(config.log_level(), LevelFilter::Info);
        assert_eq!(config.playback(), &PlaybackSettings::default());
        assert_eq!(config.view(), &ViewPose::default());
        assert_eq!(
            config.datasets().idle_events().unwrap(),
            DatasetSource::Url(DEFAULT_IDLE_EVENTS_URL.to_string())
        );
        assert!(config.service_config(ServiceType::Basemap).is_none());
    }

    #[test]
    fn partial_sections_are_merged_with_defaults() {
        let yaml = "
log_level: debug
playback:
  speed: 20
datasets:
  idle_events: ./empty.json
view:
  zoom: 11
services:
  basemap:
    handler: mapbox
    configuration:
      access_token: pk.test
      image_width: 640
";
        let config = Config::load(&mut yaml.as_bytes()).unwrap();
        assert_eq!(config.log_level(), LevelFilter::Debug);
        assert_eq!(config.playback().speed, 20.0);
        assert_eq!(config.playback().min_time, 420.0);
        assert_eq!(config.view().zoom, 11.0);
        assert_eq!(config.view().longitude, 126.9779692);
        assert_eq!(
            config.datasets().idle_events().unwrap(),
            DatasetSource::File(PathBuf::from("./empty.json"))
        );

        let basemap = config.service_config(ServiceType::Basemap).unwrap();
        assert_eq!(basemap.handler(), "mapbox");
        assert_eq!(
            basemap.get_parameter_as_string("access_token").unwrap().unwrap(),
            "pk.test"
        );
        assert_eq!(basemap.get_parameter_as_i64("image_width").unwrap().unwrap(), 640);
        assert!(basemap.get_parameter_as_bool("image_width").unwrap().is_err());
        assert!(basemap.get_parameter_as_f64("missing").is_none());
    }

    #[test]
    fn invalid_log_level_is_rejected() {
        assert!(Config::load(&mut "log_level: loud".as_bytes()).is_err());
    }

    #[test]
    fn unknown_handlers_are_errors() {
        let yaml = "
services:
  display:
    handler: web
";
        let config = Config::load(&mut yaml.as_bytes()).unwrap();
        assert!(config.get_display_handler().is_err());
        assert!(config.get_basemap_handler().is_ok());
    }

    #[test]
    fn service_parameters_can_be_overridden() {
        let mut config = Config::default();
        config.set_service_parameter(
            ServiceType::Basemap,
            "mapbox",
            "access_token",
            Value::String("pk.cli".to_string()),
        );
        let basemap = config.service_config(ServiceType::Basemap).unwrap();
        assert_eq!(basemap.handler(), "mapbox");
        assert_eq!(
            basemap.get_parameter_as_string("access_token").unwrap().unwrap(),
            "pk.cli"
        );
    }
}

//! Load the idle event and trip datasets from a URL or a local JSON file
use crate::gps::Location;
use crate::Error;
use log::{debug, info, warn};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

/// Idle events keyed by their position in the source array
pub type IdleEventMap = BTreeMap<usize, IdleEvent>;

/// Where a dataset is read from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatasetSource {
    Url(String),
    File(PathBuf),
}

impl DatasetSource {
    /// Read the whole document as text
    fn read_to_string(&self) -> Result<String, Error> {
        match self {
            DatasetSource::Url(url) => {
                let client = Client::new();
                let resp = client.get(url).send()?;
                if resp.status().is_success() {
                    Ok(resp.text()?)
                } else {
                    Err(Error::RequestError(
                        resp.status(),
                        format!("could not fetch dataset from {}", url),
                    ))
                }
            }
            DatasetSource::File(path) => Ok(fs::read_to_string(path)?),
        }
    }
}

impl FromStr for DatasetSource {
    type Err = Error;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        let src = src.trim();
        if src.is_empty() {
            Err(Error::InvalidInput("empty dataset location".to_string()))
        } else if src.starts_with("http://") || src.starts_with("https://") {
            Ok(DatasetSource::Url(src.to_string()))
        } else {
            Ok(DatasetSource::File(PathBuf::from(src)))
        }
    }
}

impl fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetSource::Url(url) => write!(f, "{}", url),
            DatasetSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Inclusive range of minutes since midnight
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TimeWindow {
    start: f64,
    end: f64,
}

impl TimeWindow {
    pub fn new(start: f64, end: f64) -> Result<Self, Error> {
        if !start.is_finite() || !end.is_finite() {
            return Err(Error::InvalidRecord(format!(
                "non-finite time window [{}, {}]",
                start, end
            )));
        }
        if start > end {
            return Err(Error::InvalidRecord(format!(
                "time window ends before it starts [{}, {}]",
                start, end
            )));
        }
        Ok(TimeWindow { start, end })
    }

    /// Zero width window that only matches `time` itself
    pub fn instant(time: f64) -> Result<Self, Error> {
        TimeWindow::new(time, time)
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    /// True when `time` falls inside the window, both ends included
    pub fn contains(&self, time: f64) -> bool {
        self.start <= time && time <= self.end
    }
}

/// An interval during which an unoccupied vehicle waits at a fixed location
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct IdleEvent {
    location: Location,
    window: TimeWindow,
}

impl IdleEvent {
    pub fn new(location: Location, window: TimeWindow) -> Self {
        IdleEvent { location, window }
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }
}

/// The `timestamp` field is either a bare number or a list of one or two numbers
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Single(f64),
    Many(Vec<f64>),
}

#[derive(Debug, Deserialize)]
struct RawIdleEvent {
    path: Location,
    timestamp: RawTimestamp,
}

impl TryFrom<RawIdleEvent> for IdleEvent {
    type Error = Error;

    fn try_from(raw: RawIdleEvent) -> Result<Self, Self::Error> {
        let window = match raw.timestamp {
            RawTimestamp::Single(time) => TimeWindow::instant(time)?,
            RawTimestamp::Many(times) => match times.as_slice() {
                [] => return Err(Error::InvalidRecord("empty timestamp".to_string())),
                [time] => TimeWindow::instant(*time)?,
                [start, end, ..] => TimeWindow::new(*start, *end)?,
            },
        };
        Ok(IdleEvent::new(raw.path, window))
    }
}

/// Vehicle operator flag, selects the trail color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Vendor {
    Primary,
    Secondary,
}

impl TryFrom<u8> for Vendor {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Vendor::Primary),
            1 => Ok(Vendor::Secondary),
            _ => Err(format!("unknown vendor {}, expected 0 or 1", value)),
        }
    }
}

impl From<Vendor> for u8 {
    fn from(vendor: Vendor) -> u8 {
        match vendor {
            Vendor::Primary => 0,
            Vendor::Secondary => 1,
        }
    }
}

/// A single trip trajectory, `timestamps[i]` is the minute the vehicle passed `path[i]`
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TripRecord {
    path: Vec<Location>,
    timestamps: Vec<f64>,
    vendor: Vendor,
}

impl TripRecord {
    pub fn new(path: Vec<Location>, timestamps: Vec<f64>, vendor: Vendor) -> Result<Self, Error> {
        if path.is_empty() {
            return Err(Error::InvalidRecord("trip has an empty path".to_string()));
        }
        if path.len() != timestamps.len() {
            return Err(Error::InvalidRecord(format!(
                "trip has {} locations but {} timestamps",
                path.len(),
                timestamps.len()
            )));
        }
        if timestamps.iter().any(|t| !t.is_finite()) {
            return Err(Error::InvalidRecord(
                "trip has non-finite timestamps".to_string(),
            ));
        }
        if timestamps.windows(2).any(|w| w[1] < w[0]) {
            return Err(Error::InvalidRecord(
                "trip timestamps are not in ascending order".to_string(),
            ));
        }
        Ok(TripRecord {
            path,
            timestamps,
            vendor,
        })
    }

    pub fn path(&self) -> &[Location] {
        &self.path
    }

    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    pub fn vendor(&self) -> Vendor {
        self.vendor
    }
}

#[derive(Debug, Deserialize)]
struct RawTrip {
    path: Vec<Location>,
    timestamps: Vec<f64>,
    vendor: Vendor,
}

/// Deserialize each array element on its own so one bad record doesn't sink the dataset
fn parse_records<T, F>(data: &str, kind: &str, mut accept: F) -> Result<usize, Error>
where
    T: serde::de::DeserializeOwned,
    F: FnMut(usize, T) -> Result<(), Error>,
{
    let items: Vec<Value> = serde_json::from_str(data)?;
    let mut skipped = 0;
    for (idx, item) in items.into_iter().enumerate() {
        let result = serde_json::from_value::<T>(item)
            .map_err(Error::from)
            .and_then(|raw| accept(idx, raw));
        if let Err(e) = result {
            warn!("skipping {} record #{}: {}", kind, idx, e);
            skipped += 1;
        }
    }
    Ok(skipped)
}

/// Build the idle event map from a JSON array of `{path, timestamp}` objects
pub fn parse_idle_events(data: &str) -> Result<IdleEventMap, Error> {
    let mut events = IdleEventMap::new();
    let skipped = parse_records(data, "idle event", |idx, raw: RawIdleEvent| {
        events.insert(idx, IdleEvent::try_from(raw)?);
        Ok(())
    })?;
    debug!(
        "parsed {} idle events, skipped {} malformed records",
        events.len(),
        skipped
    );
    Ok(events)
}

/// Build the trip list from a JSON array of `{path, timestamps, vendor}` objects
pub fn parse_trips(data: &str) -> Result<Vec<TripRecord>, Error> {
    let mut trips = Vec::new();
    let skipped = parse_records(data, "trip", |_, raw: RawTrip| {
        trips.push(TripRecord::new(raw.path, raw.timestamps, raw.vendor)?);
        Ok(())
    })?;
    debug!(
        "parsed {} trips, skipped {} malformed records",
        trips.len(),
        skipped
    );
    Ok(trips)
}

/// Read the idle event dataset once, no retries or caching
pub fn load_idle_events(source: &DatasetSource) -> Result<IdleEventMap, Error> {
    info!("Loading idle events from {}", source);
    let events = parse_idle_events(&source.read_to_string()?)?;
    info!("Loaded {} idle events from {}", events.len(), source);
    Ok(events)
}

/// Read the trip dataset once, no retries or caching
pub fn load_trips(source: &DatasetSource) -> Result<Vec<TripRecord>, Error> {
    info!("Loading trips from {}", source);
    let trips = parse_trips(&source.read_to_string()?)?;
    info!("Loaded {} trips from {}", trips.len(), source);
    Ok(trips)
}

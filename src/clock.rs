//! Playback clock measured in minutes since midnight
use crate::Error;
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Bounds and speed of the playback clock
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// first minute of the loop, 07:00 by default
    pub min_time: f64,
    /// last minute of the loop, 24:00 by default
    pub max_time: f64,
    /// base increment applied each frame
    pub increment: f64,
    /// multiplier applied to the base increment
    pub speed: f64,
}

impl PlaybackSettings {
    /// Minutes the clock advances per frame
    pub fn step(&self) -> f64 {
        self.increment * self.speed
    }

    /// Clamp a value into the playback bounds
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min_time).min(self.max_time)
    }
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        PlaybackSettings {
            min_time: 420.0,
            max_time: 1440.0,
            increment: 0.01,
            speed: 10.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PlaybackClock {
    settings: PlaybackSettings,
    current: f64,
}

impl PlaybackClock {
    /// Create a clock positioned at the start of the loop
    pub fn new(settings: PlaybackSettings) -> Self {
        PlaybackClock {
            current: settings.min_time,
            settings,
        }
    }

    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    /// Advance one frame, a clock already past `max_time` restarts at exactly `min_time`
    pub fn tick(&mut self) {
        self.current = if self.current > self.settings.max_time {
            self.settings.min_time
        } else {
            self.current + self.settings.step()
        };
    }

    /// Replace the current time, the value is not validated against the bounds
    pub fn set_time(&mut self, value: f64) {
        self.current = value;
    }
}

/// Format minutes since midnight as a zero padded `HH:MM` readout.
///
/// The value is rounded to the nearest minute first, hours wrap at 24 so the
/// end of the day reads `00:00`.
pub fn format_clock(time: f64) -> String {
    let rounded = time.round() as i64;
    let hours = rounded.div_euclid(60).rem_euclid(24);
    let minutes = rounded.rem_euclid(60);
    format!("{:02}:{:02}", hours, minutes)
}

/// Parse either a `HH:MM` clock time or a plain number of minutes since midnight
pub fn parse_clock_time(src: &str) -> Result<f64, Error> {
    let src = src.trim();
    if let Ok(time) = NaiveTime::parse_from_str(src, "%H:%M") {
        return Ok(f64::from(time.hour() * 60 + time.minute()));
    }
    // chrono has no notion of 24:00 but it is the natural end of the playback loop
    if src == "24:00" {
        return Ok(1440.0);
    }
    match src.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(Error::InvalidInput(format!(
            "expected HH:MM or minutes since midnight, found '{}'",
            src
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_step_is_a_tenth_of_a_minute() {
        let settings = PlaybackSettings::default();
        assert!((settings.step() - 0.1).abs() < 1e-12);
        assert_eq!(PlaybackClock::new(settings).current(), 420.0);
    }

    #[test]
    fn tick_advances_by_step() {
        let mut clock = PlaybackClock::new(PlaybackSettings::default());
        clock.tick();
        clock.tick();
        assert!((clock.current() - 420.2).abs() < 1e-9);
    }

    #[test]
    fn tick_wraps_to_min_time_without_remainder() {
        let settings = PlaybackSettings::default();
        let mut clock = PlaybackClock::new(settings);

        // exactly at the bound still advances, the comparison is strict
        clock.set_time(settings.max_time);
        clock.tick();
        assert!((clock.current() - (settings.max_time + settings.step())).abs() < 1e-9);

        clock.tick();
        assert_eq!(clock.current(), settings.min_time);
    }

    #[test]
    fn set_time_is_unconditional() {
        let mut clock = PlaybackClock::new(PlaybackSettings::default());
        clock.set_time(10.0);
        assert_eq!(clock.current(), 10.0);
        clock.set_time(5000.0);
        assert_eq!(clock.current(), 5000.0);
        clock.tick();
        assert_eq!(clock.current(), 420.0);
    }

    #[test]
    fn clock_readout() {
        assert_eq!(format_clock(420.0), "07:00");
        assert_eq!(format_clock(65.0), "01:05");
        assert_eq!(format_clock(64.6), "01:05");
        assert_eq!(format_clock(1439.4), "23:59");
        assert_eq!(format_clock(1439.96), "00:00");
        assert_eq!(format_clock(0.0), "00:00");
    }

    #[test]
    fn parse_clock_values() {
        assert_eq!(parse_clock_time("07:30").unwrap(), 450.0);
        assert_eq!(parse_clock_time(" 600 ").unwrap(), 600.0);
        assert_eq!(parse_clock_time("612.5").unwrap(), 612.5);
        assert_eq!(parse_clock_time("24:00").unwrap(), 1440.0);
        assert!(parse_clock_time("noon").is_err());
        assert!(parse_clock_time("NaN").is_err());
    }
}

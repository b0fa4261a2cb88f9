//! The single owned state behind every rendered frame
use crate::animation::Animation;
use crate::clock::{format_clock, PlaybackClock, PlaybackSettings};
use crate::dataset::{IdleEventMap, TripRecord};
use crate::filter::active_markers;
use crate::gps::Location;
use crate::layers::{compose_layers, Effects, Layer, ScatterplotLayer, Theme, TripsLayer};
use crate::Error;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Initial camera position over the map
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewPose {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
}

impl Default for ViewPose {
    fn default() -> Self {
        // central Seoul
        ViewPose {
            longitude: 126.9779692,
            latitude: 37.566535,
            zoom: 9.5,
            pitch: 30.0,
            bearing: 0.0,
        }
    }
}

/// Progress of the idle event download
#[derive(Clone, Debug)]
pub enum IdleEventState {
    Loading,
    Ready(IdleEventMap),
    Failed(String),
}

impl IdleEventState {
    /// The loaded events, `None` while loading or after a failure
    pub fn events(&self) -> Option<&IdleEventMap> {
        match self {
            IdleEventState::Ready(events) => Some(events),
            _ => None,
        }
    }

    /// Short human readable status
    pub fn describe(&self) -> String {
        match self {
            IdleEventState::Loading => "loading idle events...".to_string(),
            IdleEventState::Ready(events) => format!("{} idle events", events.len()),
            IdleEventState::Failed(msg) => format!("idle events unavailable: {}", msg),
        }
    }
}

/// Everything a host needs to draw one frame
#[derive(Clone, Debug, Serialize)]
pub struct Frame {
    pub time: f64,
    pub clock_label: String,
    pub layers: Vec<Layer>,
    pub effects: Effects,
}

impl Frame {
    pub fn trips(&self) -> Option<&TripsLayer> {
        self.layers.iter().find_map(|l| match l {
            Layer::Trips(trips) => Some(trips),
            _ => None,
        })
    }

    pub fn idle_markers(&self) -> Option<&ScatterplotLayer> {
        self.layers.iter().find_map(|l| match l {
            Layer::Scatterplot(markers) => Some(markers),
            _ => None,
        })
    }

    /// Positions of the active idle markers
    pub fn markers(&self) -> &[Location] {
        self.idle_markers()
            .map(|l| l.positions.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug)]
pub struct ViewState {
    animation: Animation,
    idle_events: IdleEventState,
    trips: Rc<[TripRecord]>,
    theme: Theme,
    pose: ViewPose,
    disposed: bool,
}

impl ViewState {
    /// Create the view with a running clock and idle events still loading
    pub fn new(
        settings: PlaybackSettings,
        trips: Vec<TripRecord>,
        theme: Theme,
        pose: ViewPose,
    ) -> Self {
        ViewState {
            animation: Animation::start(PlaybackClock::new(settings)),
            idle_events: IdleEventState::Loading,
            trips: trips.into(),
            theme,
            pose,
            disposed: false,
        }
    }

    pub fn settings(&self) -> &PlaybackSettings {
        self.animation.clock().settings()
    }

    pub fn time(&self) -> f64 {
        self.animation.clock().current()
    }

    pub fn pose(&self) -> &ViewPose {
        &self.pose
    }

    pub fn idle_events(&self) -> &IdleEventState {
        &self.idle_events
    }

    pub fn trips(&self) -> &[TripRecord] {
        &self.trips
    }

    pub fn is_running(&self) -> bool {
        self.animation.is_running()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Store the result of the idle event download, failures leave no markers.
    ///
    /// Returns false when the result arrived after the view was disposed and was dropped.
    pub fn commit_idle_events(&mut self, result: Result<IdleEventMap, Error>) -> bool {
        if self.disposed {
            debug!("view already disposed, dropping idle event result");
            return false;
        }
        self.idle_events = match result {
            Ok(events) => {
                info!("{} idle events ready", events.len());
                IdleEventState::Ready(events)
            }
            Err(e) => {
                error!("Could not load the idle event dataset: {}", e);
                IdleEventState::Failed(e.to_string())
            }
        };
        true
    }

    /// Service the pending animation frame, false when the animation is stopped
    pub fn advance(&mut self) -> bool {
        match self.animation.pending() {
            Some(handle) => self.animation.on_frame(handle),
            None => false,
        }
    }

    /// Move the clock to a value taken from a bounded scrub control, returns the time set
    pub fn scrub(&mut self, value: f64) -> f64 {
        let value = self.settings().clamp(value);
        self.animation.clock_mut().set_time(value);
        value
    }

    /// Parse a raw control value as minutes and scrub to it
    pub fn scrub_input(&mut self, raw: &str) -> Result<(), Error> {
        match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => {
                self.scrub(value);
                Ok(())
            }
            _ => Err(Error::InvalidInput(format!(
                "scrub value must be a number, found '{}'",
                raw
            ))),
        }
    }

    /// Stop or restart the animation, a disposed view stays stopped
    pub fn toggle_pause(&mut self) {
        if self.animation.is_running() {
            self.animation.cancel();
        } else if !self.disposed {
            self.animation.resume();
        }
    }

    /// Tear the view down, no frame is serviced and no dataset committed afterwards
    pub fn dispose(&mut self) {
        self.animation.cancel();
        self.disposed = true;
    }

    /// Compose the layers for the current time
    pub fn frame(&self) -> Frame {
        let time = self.time();
        let markers = active_markers(self.idle_events.events(), time);
        Frame {
            time,
            clock_label: format_clock(time),
            layers: compose_layers(time, markers, &self.trips, &self.theme),
            effects: self.theme.effects(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::parse_idle_events;

    fn view() -> ViewState {
        ViewState::new(
            PlaybackSettings::default(),
            Vec::new(),
            Theme::default(),
            ViewPose::default(),
        )
    }

    fn events() -> IdleEventMap {
        parse_idle_events(
            r#"[
                {"path": [126.9, 37.5], "timestamp": [420, 421]},
                {"path": [127.0, 37.6], "timestamp": [600]}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn no_markers_while_loading() {
        let view = view();
        assert!(view.frame().markers().is_empty());
        assert_eq!(view.frame().clock_label, "07:00");
    }

    #[test]
    fn committed_events_become_markers() {
        let mut view = view();
        assert!(view.commit_idle_events(Ok(events())));
        assert_eq!(view.frame().markers(), &[Location::new(126.9, 37.5)]);

        view.scrub(600.0);
        assert_eq!(view.frame().markers(), &[Location::new(127.0, 37.6)]);
        assert_eq!(view.frame().clock_label, "10:00");
    }

    #[test]
    fn failed_load_shows_nothing() {
        let mut view = view();
        view.commit_idle_events(Err(Error::Other("offline".to_string())));
        assert!(view.idle_events().events().is_none());
        assert!(view.idle_events().describe().contains("offline"));
        assert!(view.frame().markers().is_empty());
    }

    #[test]
    fn scrub_input_parses_and_clamps() {
        let mut view = view();
        view.scrub_input("600").unwrap();
        assert_eq!(view.time(), 600.0);

        assert!(view.scrub_input("abc").is_err());
        assert_eq!(view.time(), 600.0);

        assert_eq!(view.scrub(5000.0), 1440.0);
        assert_eq!(view.time(), 1440.0);
        view.scrub_input("-3").unwrap();
        assert_eq!(view.time(), 420.0);
    }

    #[test]
    fn advance_ticks_until_disposed() {
        let mut view = view();
        assert!(view.advance());
        assert!((view.time() - 420.1).abs() < 1e-9);

        view.dispose();
        view.dispose();
        assert!(!view.advance());
        assert!((view.time() - 420.1).abs() < 1e-9);

        // a disposed view can't be restarted
        view.toggle_pause();
        assert!(!view.is_running());
    }

    #[test]
    fn late_results_are_dropped_after_dispose() {
        let mut view = view();
        view.dispose();
        assert!(!view.commit_idle_events(Ok(events())));
        assert!(matches!(view.idle_events(), IdleEventState::Loading));
    }

    #[test]
    fn pause_and_resume() {
        let mut view = view();
        view.toggle_pause();
        assert!(!view.advance());
        assert_eq!(view.time(), 420.0);
        view.toggle_pause();
        assert!(view.advance());
    }

    #[test]
    fn theme_effects_are_part_of_the_frame() {
        let mut theme = Theme::default();
        theme.building_color = [1, 2, 3];
        theme.material.shininess = 99.0;
        theme.point_light.intensity = 7.0;
        let view = ViewState::new(
            PlaybackSettings::default(),
            Vec::new(),
            theme,
            ViewPose::default(),
        );

        let json = serde_json::to_value(&view.frame()).unwrap();
        let effects = &json["effects"];
        assert_eq!(effects["building_color"], serde_json::json!([1, 2, 3]));
        assert_eq!(effects["material"]["shininess"], 99.0);
        assert_eq!(effects["point_light"]["intensity"], 7.0);
        assert_eq!(
            effects["point_light"]["position"],
            serde_json::json!([-74.05, 40.7, 8000.0])
        );
        assert!(effects["ambient_light"].get("position").is_none());
    }
}

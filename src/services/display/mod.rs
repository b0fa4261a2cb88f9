//! Interactive hosts that play the animation for a user
use crate::config::{FromServiceConfig, ServiceConfig};
use crate::dataset::IdleEventMap;
use crate::gps::Location;
use crate::view::{ViewPose, ViewState};
use crate::Error;
use std::sync::mpsc::Receiver;
mod tui;
pub use self::tui::TerminalDisplay;

/// Delivers the idle event dataset once the background download finishes
pub type IdleEventReceiver = Receiver<Result<IdleEventMap, Error>>;

/// trait that defines how the playback is presented to the user
pub trait DisplayService {
    /// Drive the view until the user quits, the view is disposed on return
    fn run(
        &self,
        view: &mut ViewState,
        idle_events: IdleEventReceiver,
    ) -> Result<(), Box<dyn std::error::Error>>;
}

pub fn new_display_handler(config: &ServiceConfig) -> Result<Box<dyn DisplayService>, Error> {
    match config.handler() {
        "tui" => Ok(Box::new(TerminalDisplay::from_config(config)?)),
        _ => Err(Error::UnknownServiceHandler(format!(
            "no display handler exists for: {}",
            config.handler()
        ))),
    }
}

/// Flat projection of the area around the camera onto screen coordinates.
///
/// Longitudes are scaled by the cosine of the center latitude and the result is
/// rotated by the camera bearing. Pitch is ignored.
#[derive(Clone, Copy, Debug)]
pub struct Viewport {
    center: Location,
    cos_lat: f64,
    sin_bearing: f64,
    cos_bearing: f64,
    half_width: f64,
    half_height: f64,
}

impl Viewport {
    /// `aspect` is the width / height ratio of the drawing area
    pub fn new(pose: &ViewPose, aspect: f64) -> Self {
        let cos_lat = pose.latitude.to_radians().cos();
        let bearing = pose.bearing.to_radians();
        // a 512 pixel wide mercator view spans two tiles, 720 / 2^zoom degrees of longitude
        let half_width = 360.0 / 2f64.powf(pose.zoom) * cos_lat;
        let aspect = if aspect.is_finite() && aspect > 0.0 {
            aspect
        } else {
            1.0
        };
        Viewport {
            center: Location::new(pose.longitude, pose.latitude),
            cos_lat,
            sin_bearing: bearing.sin(),
            cos_bearing: bearing.cos(),
            half_width,
            half_height: half_width / aspect,
        }
    }

    pub fn x_bounds(&self) -> [f64; 2] {
        [-self.half_width, self.half_width]
    }

    pub fn y_bounds(&self) -> [f64; 2] {
        [-self.half_height, self.half_height]
    }

    /// Screen coordinates of a location, the camera center maps to the origin
    pub fn project(&self, location: &Location) -> (f64, f64) {
        let x = (location.longitude() - self.center.longitude()) * self.cos_lat;
        let y = location.latitude() - self.center.latitude();
        (
            x * self.cos_bearing - y * self.sin_bearing,
            x * self.sin_bearing + y * self.cos_bearing,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_projects_to_origin() {
        let pose = ViewPose::default();
        let viewport = Viewport::new(&pose, 2.0);
        let (x, y) = viewport.project(&Location::new(pose.longitude, pose.latitude));
        assert!(x.abs() < 1e-12 && y.abs() < 1e-12);

        let [xmin, xmax] = viewport.x_bounds();
        let [ymin, ymax] = viewport.y_bounds();
        assert!((xmax - xmin - 2.0 * (ymax - ymin)).abs() < 1e-9);
    }

    #[test]
    fn bearing_rotates_the_map() {
        let pose = ViewPose {
            longitude: 0.0,
            latitude: 0.0,
            bearing: 90.0,
            ..ViewPose::default()
        };
        let viewport = Viewport::new(&pose, 1.0);
        // facing east, a point east of the center shows up above it
        let (x, y) = viewport.project(&Location::new(0.01, 0.0));
        assert!(x.abs() < 1e-9);
        assert!((y - 0.01).abs() < 1e-9);
    }

    #[test]
    fn unknown_display_handler() {
        assert!(new_display_handler(&ServiceConfig::new("tui")).is_ok());
        assert!(new_display_handler(&ServiceConfig::new("browser")).is_err());
    }
}

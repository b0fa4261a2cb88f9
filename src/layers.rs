//! Compose the declarative layers drawn for a single frame
use crate::dataset::{TripRecord, Vendor};
use crate::gps::Location;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// RGB color
pub type Rgb = [u8; 3];
/// RGBA color
pub type Rgba = [u8; 4];

/// Background shape drawn under everything else, only needed for shadow effects
pub const LAND_COVER: [[f64; 2]; 4] = [
    [-74.0, 40.7],
    [-74.02, 40.7],
    [-74.02, 40.72],
    [-74.0, 40.72],
];

/// Minutes of history drawn behind the head of each trip
pub const TRAIL_LENGTH: f64 = 2.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub ambient: f64,
    pub diffuse: f64,
    pub shininess: f64,
    pub specular_color: Rgb,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub color: Rgb,
    pub intensity: f64,
    /// only point lights have a position, `[longitude, latitude, altitude]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<[f64; 3]>,
}

/// Colors and lighting shared by every layer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub building_color: Rgb,
    pub trail_color0: Rgb,
    pub trail_color1: Rgb,
    pub material: Material,
    pub ambient_light: Light,
    pub point_light: Light,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            building_color: [74, 80, 87],
            trail_color0: [253, 128, 93],
            trail_color1: [23, 184, 190],
            material: Material {
                ambient: 0.1,
                diffuse: 0.6,
                shininess: 32.0,
                specular_color: [60, 64, 70],
            },
            ambient_light: Light {
                color: [255, 255, 255],
                intensity: 1.0,
                position: None,
            },
            point_light: Light {
                color: [255, 255, 255],
                intensity: 2.0,
                position: Some([-74.05, 40.7, 8000.0]),
            },
        }
    }
}

impl Theme {
    /// Map wide shading, shared by every layer of a frame
    pub fn effects(&self) -> Effects {
        Effects {
            building_color: self.building_color,
            material: self.material.clone(),
            ambient_light: self.ambient_light.clone(),
            point_light: self.point_light.clone(),
        }
    }
}

/// Lighting and surface material a renderer applies on top of the layers
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Effects {
    pub building_color: Rgb,
    pub material: Material,
    pub ambient_light: Light,
    pub point_light: Light,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PolygonLayer {
    pub id: &'static str,
    pub polygons: Vec<Vec<Location>>,
    pub stroked: bool,
    pub fill_color: Rgba,
    pub pickable: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct TripsLayer {
    pub id: &'static str,
    #[serde(skip)]
    pub trips: Rc<[TripRecord]>,
    pub trip_count: usize,
    pub trail_color0: Rgb,
    pub trail_color1: Rgb,
    pub opacity: f64,
    pub width_min_pixels: f64,
    pub joint_rounded: bool,
    pub trail_length: f64,
    pub current_time: f64,
    pub shadow_enabled: bool,
}

impl TripsLayer {
    /// Trail color for the trip's vendor
    pub fn color(&self, trip: &TripRecord) -> Rgb {
        match trip.vendor() {
            Vendor::Primary => self.trail_color0,
            Vendor::Secondary => self.trail_color1,
        }
    }

    /// The part of a trip traveled during the last `trail_length` minutes.
    ///
    /// The first and last points are interpolated at the window edges. A trip
    /// that hasn't started yet, or finished more than `trail_length` ago, has
    /// no trail.
    pub fn trail(&self, trip: &TripRecord) -> Vec<Location> {
        let times = trip.timestamps();
        let (first, last) = match (times.first(), times.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => return Vec::new(),
        };
        let head = self.current_time;
        let tail = head - self.trail_length;
        if head < first || tail > last {
            return Vec::new();
        }

        let (tail, head) = (tail.max(first), head.min(last));
        let mut trail = vec![position_at(trip, tail)];
        trail.extend(
            times
                .iter()
                .zip(trip.path())
                .filter(|&(&t, _)| t > tail && t < head)
                .map(|(_, &loc)| loc),
        );
        trail.push(position_at(trip, head));
        trail
    }
}

/// Interpolated position of a trip at `time`, which must lie within the trip's timestamps
fn position_at(trip: &TripRecord, time: f64) -> Location {
    let times = trip.timestamps();
    let path = trip.path();
    match times.iter().position(|&t| t >= time) {
        Some(0) => path[0],
        Some(idx) => {
            let (t0, t1) = (times[idx - 1], times[idx]);
            let frac = if t1 > t0 { (time - t0) / (t1 - t0) } else { 1.0 };
            path[idx - 1].lerp(&path[idx], frac)
        }
        None => path[path.len() - 1],
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScatterplotLayer {
    pub id: &'static str,
    pub positions: Vec<Location>,
    pub fill_color: Rgb,
    pub radius: f64,
    pub opacity: f64,
    pub pickable: bool,
    pub radius_min_pixels: f64,
    pub radius_max_pixels: f64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type")]
pub enum Layer {
    Polygon(PolygonLayer),
    Trips(TripsLayer),
    Scatterplot(ScatterplotLayer),
}

impl Layer {
    pub fn id(&self) -> &'static str {
        match self {
            Layer::Polygon(l) => l.id,
            Layer::Trips(l) => l.id,
            Layer::Scatterplot(l) => l.id,
        }
    }
}

/// Build the ground, trip trail and idle marker layers for the given time
pub fn compose_layers(
    time: f64,
    markers: Vec<Location>,
    trips: &Rc<[TripRecord]>,
    theme: &Theme,
) -> Vec<Layer> {
    let ground = PolygonLayer {
        id: "ground",
        polygons: vec![LAND_COVER
            .iter()
            .map(|&[lng, lat]| Location::new(lng, lat))
            .collect()],
        stroked: false,
        fill_color: [0, 0, 0, 0],
        pickable: false,
    };
    let trails = TripsLayer {
        id: "trips",
        trips: Rc::clone(trips),
        trip_count: trips.len(),
        trail_color0: theme.trail_color0,
        trail_color1: theme.trail_color1,
        opacity: 0.3,
        width_min_pixels: 5.0,
        joint_rounded: false,
        trail_length: TRAIL_LENGTH,
        current_time: time,
        shadow_enabled: false,
    };
    let idle = ScatterplotLayer {
        id: "scatterplot",
        positions: markers,
        fill_color: [255, 255, 255],
        radius: 25.0,
        opacity: 0.9,
        pickable: false,
        radius_min_pixels: 3.0,
        radius_max_pixels: 30.0,
    };
    vec![
        Layer::Polygon(ground),
        Layer::Trips(trails),
        Layer::Scatterplot(idle),
    ]
}

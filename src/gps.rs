//! Module with GPS specific structures
use serde::{Deserialize, Serialize};
use std::char;
use std::convert::TryFrom;

/// Stores a single geospatial point, serialized as a `[longitude, latitude]` pair
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "[f64; 2]")]
pub struct Location {
    /// longitude coordinate in degrees
    longitude: f64,
    /// latitude coordinate in degrees
    latitude: f64,
}

impl Location {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Location {
            longitude,
            latitude,
        }
    }

    /// Return longitude in degrees
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Return latitude in degrees
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Linear interpolation towards `other`, `frac` of 0 returns self and 1 returns other
    pub fn lerp(&self, other: &Location, frac: f64) -> Location {
        Location {
            longitude: self.longitude + (other.longitude - self.longitude) * frac,
            latitude: self.latitude + (other.latitude - self.latitude) * frac,
        }
    }
}

impl TryFrom<Vec<f64>> for Location {
    type Error = String;

    /// Extra trailing values such as altitude are ignored
    fn try_from(coords: Vec<f64>) -> Result<Self, Self::Error> {
        match coords.as_slice() {
            [lng, lat, ..] if lng.is_finite() && lat.is_finite() => Ok(Location::new(*lng, *lat)),
            [_, _, ..] => Err(format!("non-finite coordinates: {:?}", coords)),
            _ => Err(format!(
                "expected a [longitude, latitude] pair, found {} value(s)",
                coords.len()
            )),
        }
    }
}

impl From<Location> for [f64; 2] {
    fn from(loc: Location) -> [f64; 2] {
        [loc.longitude, loc.latitude]
    }
}

/// Encodes a slice of coordinates into Google Encoded Polyline format.
///
/// This code was extracted and simplified for our use case from:
/// https://github.com/georust/polyline
/// https://developers.google.com/maps/documentation/utilities/polylinealgorithm
pub fn encode_coordinates(coordinates: &[Location]) -> Result<String, String> {
    let mut output = String::new();
    let mut b = (0, 0);

    for a in coordinates {
        let a = (scale(a.latitude), scale(a.longitude));
        output += &encode(a.0, b.0)?;
        output += &encode(a.1, b.1)?;
        b = a;
    }

    Ok(output)
}

/// Scale a floating point value into an integer at the given precision
#[inline]
fn scale(n: f64) -> i64 {
    static FACTOR: f64 = 100_000.0; // use 5 digits of precision
    (FACTOR * n).round() as i64
}

/// Encode a single latitude or longitude value into the polyline format
fn encode(current: i64, previous: i64) -> Result<String, String> {
    let mut coordinate = (current - previous) << 1;
    if (current - previous) < 0 {
        coordinate = !coordinate;
    }
    let mut output = String::new();
    while coordinate >= 0x20 {
        let from_char = char::from_u32(((0x20 | (coordinate & 0x1f)) + 63) as u32)
            .ok_or("Couldn't convert character")?;
        output.push(from_char);
        coordinate >>= 5;
    }
    let from_char = char::from_u32((coordinate + 63) as u32).ok_or("Couldn't convert character")?;
    output.push(from_char);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_from_json_pair() {
        let loc: Location = serde_json::from_str("[126.97, 37.56]").unwrap();
        assert_eq!(loc.longitude(), 126.97);
        assert_eq!(loc.latitude(), 37.56);

        // altitude is dropped
        let loc: Location = serde_json::from_str("[1.0, 2.0, 30.0]").unwrap();
        assert_eq!(loc, Location::new(1.0, 2.0));

        assert!(serde_json::from_str::<Location>("[1.0]").is_err());
        assert!(serde_json::from_str::<Location>("\"1,2\"").is_err());
    }

    #[test]
    fn location_serializes_as_pair() {
        let json = serde_json::to_string(&Location::new(3.5, 4.0)).unwrap();
        assert_eq!(json, "[3.5,4.0]");
    }

    #[test]
    fn polyline_encoding() {
        // reference example from the polyline algorithm documentation
        let coords = [
            Location::new(-120.2, 38.5),
            Location::new(-120.95, 40.7),
            Location::new(-126.453, 43.252),
        ];
        assert_eq!(
            encode_coordinates(&coords).unwrap(),
            "_p~iF~ps|U_ulLnnqC_mqNvxq`@"
        );
    }
}

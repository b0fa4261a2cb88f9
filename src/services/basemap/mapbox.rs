//! Use the MapBox static images API to draw a frame over a styled basemap
use super::BasemapService;
use crate::gps::{encode_coordinates, Location};
use crate::layers::Rgb;
use crate::view::{Frame, ViewPose};
use crate::Error;
use log::{debug, warn};
use reqwest::blocking::Client;
use trip_playback_derive::FromServiceConfig;

/// Defines parameters to interact with the MapBox API
#[derive(Debug, FromServiceConfig)]
pub struct MapBox {
    base_url: String,
    api_version: String,
    username: String,
    style: String,
    image_width: u32,
    image_height: u32,
    marker_color: String,
    marker_style: String,
    trail_width: u32,
    trail_opacity: f32,
    /// request a double resolution image
    retina: bool,
    access_token: String,
    #[service_config(skip)]
    client: Client,
}

impl MapBox {
    /// Overlay list for the static API, trails first so markers are drawn on top
    fn overlays(&self, frame: &Frame) -> Result<Vec<String>, Error> {
        let mut overlays = Vec::new();
        if let Some(trips) = frame.trips() {
            for trip in trips.trips.iter() {
                let trail = trips.trail(trip);
                if trail.len() < 2 {
                    continue;
                }
                let encoded = encode_coordinates(&trail).map_err(Error::Other)?;
                overlays.push(format!(
                    "path-{}+{}-{}({})",
                    self.trail_width,
                    hex_color(trips.color(trip)),
                    self.trail_opacity,
                    form_urlencoded::byte_serialize(encoded.as_bytes()).collect::<String>()
                ));
            }
        }
        overlays.extend(frame.markers().iter().map(|m| self.marker(m)));
        Ok(overlays)
    }

    fn marker(&self, location: &Location) -> String {
        format!(
            "pin-{}+{}({},{})",
            self.marker_style,
            self.marker_color,
            location.longitude(),
            location.latitude()
        )
    }

    fn request_url(&self, pose: &ViewPose, frame: &Frame) -> Result<String, Error> {
        let overlays = self.overlays(frame)?;
        let overlays = if overlays.is_empty() {
            String::new()
        } else {
            format!("{}/", overlays.join(","))
        };
        let url = format!(
            "{}/styles/{}/{}/{}/static/{}{},{},{},{},{}/{}x{}{}",
            self.base_url,
            self.api_version,
            self.username,
            self.style,
            overlays,
            pose.longitude,
            pose.latitude,
            pose.zoom,
            pose.bearing.rem_euclid(360.0),
            pose.pitch.max(0.0).min(60.0),
            self.image_width,
            self.image_height,
            if self.retina { "@2x" } else { "" },
        );

        // mapbox has a URL limit of 8192 bytes, the access_token=[..] part in the query takes up
        // around 100 bytes by itself
        if url.len() > 8192 {
            warn!(
                "URL length exceeds 8KB due to many active trips or markers, request may fail (size={:.2}KB).",
                url.len() as f32 / 1024.0
            );
        }

        Ok(url)
    }
}

fn hex_color(color: Rgb) -> String {
    format!("{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}

impl Default for MapBox {
    fn default() -> Self {
        MapBox {
            base_url: "https://api.mapbox.com".to_string(),
            api_version: "v1".to_string(),
            username: "spear5306".to_string(),
            style: "ckzcz5m8w002814o2coz02sjc".to_string(),
            image_width: 1280,
            image_height: 1280,
            marker_color: "ffffff".to_string(),
            marker_style: "s".to_string(),
            trail_width: 5,
            trail_opacity: 0.3,
            retina: false,
            access_token: String::new(),
            client: Client::new(),
        }
    }
}

impl BasemapService for MapBox {
    fn render_frame(
        &self,
        pose: &ViewPose,
        frame: &Frame,
    ) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        if self.access_token.is_empty() {
            return Err(Box::new(Error::InvalidConfigurationValue(
                "a MapBox access token is required to render the basemap".to_string(),
            )));
        }

        // request image data
        let request_url = self.request_url(pose, frame)?;
        debug!("Requesting MapBox static image: {}", request_url);
        let resp = self
            .client
            .get(&request_url)
            .query(&[("access_token", &self.access_token)])
            .send()?;
        if resp.status().is_success() {
            // return image data
            match resp.bytes() {
                Ok(data) => Ok(data.into_iter().collect()),
                Err(e) => Err(Box::new(e)),
            }
        } else {
            let code = resp.status();
            Err(Box::new(Error::RequestError(
                code,
                "MapBox drawing failed".to_string(),
            )))
        }
    }
}

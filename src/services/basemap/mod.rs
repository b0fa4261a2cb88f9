//! Render a frame on top of a basemap provided by an external mapping service
use crate::config::{FromServiceConfig, ServiceConfig};
use crate::view::{Frame, ViewPose};
use crate::Error;
mod mapbox;
pub use mapbox::MapBox;

/// trait that defines how a composed frame is drawn over a basemap
pub trait BasemapService {
    /// Render the frame as seen from the camera pose and return the encoded image
    fn render_frame(
        &self,
        pose: &ViewPose,
        frame: &Frame,
    ) -> Result<Vec<u8>, Box<dyn std::error::Error>>;
}

pub fn new_basemap_handler(config: &ServiceConfig) -> Result<Box<dyn BasemapService>, Error> {
    match config.handler() {
        "mapbox" => Ok(Box::new(MapBox::from_config(config)?)),
        _ => Err(Error::UnknownServiceHandler(format!(
            "no basemap handler exists for: {}",
            config.handler()
        ))),
    }
}

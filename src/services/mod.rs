//! Service module that exports interfaces to external applications, APIs, etc.

pub mod basemap;
pub mod display;

// rexport some traits and utilty functions
pub use basemap::{new_basemap_handler, BasemapService};
pub use display::{new_display_handler, DisplayService};

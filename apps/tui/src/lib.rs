// Export our modules for use in the binary and tests
pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod event;
pub mod logging;
pub mod map;
pub mod terminal;
pub mod timeseries;
pub mod ui;

pub use domain::{GeoPoint, LayerQuery, PointQuery};

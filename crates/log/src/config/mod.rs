//! Configuration types
//!
//! - `base`: [`Config`] and [`Format`]
//! - `display`: [`DisplayConfig`]
//! - `presets`: environment parsing and development/production/test setups

mod base;
mod display;
mod presets;

pub use base::{Config, Format};
pub use display::DisplayConfig;
pub use presets::{LOG_ENV, LOG_FORMAT_ENV};

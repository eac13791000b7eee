//! # Display Module
//!
//! Hardware description of the target e-paper panel: canvas size, native
//! palette and accent color identity.
//!
//! ## Modules
//!
//! - [`config`]: Panel dimensions and color scheme presets

pub mod config;

pub use config::{AccentColor, ColorScheme, DisplayConfig, Palette, PaletteColor};

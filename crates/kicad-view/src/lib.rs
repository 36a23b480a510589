//! Renderer-agnostic viewing pipeline for parsed KiCad documents.
//!
//! [`painter`] turns a parsed board or schematic into retained per-layer
//! graphics behind the [`renderer::Renderer`] trait, [`layers`] manage
//! display order, highlighting and hit-testing, and [`viewer::Viewer`]
//! ties it all to a [`camera::Camera`] and a host event loop.

pub mod camera;
pub mod error;
pub mod layers;
pub mod math;
pub mod painter;
pub mod renderer;
pub mod viewer;

pub use camera::{Camera, CameraOptions};
pub use error::ViewerError;
pub use layers::{ItemId, ViewLayer, ViewLayerSet};
pub use renderer::{RecordingRenderer, Renderer};
pub use viewer::{Viewer, ViewerEvent, ViewerState};

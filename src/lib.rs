//! Hand-landmark driven map control.
//!
//! Per frame: raw landmarks are smoothed, classified into gestures, debounced
//! into a [`ControlMode`], and turned into pan/zoom vectors. A flick integrator
//! keeps the map gliding after fast pans. [`pipeline`] runs a session on its
//! own thread against a [`pipeline::MapActuator`].

pub mod config;
pub mod control;
pub mod controller;
pub mod fireworks;
pub mod geometry;
pub mod gesture;
pub mod momentum;
pub mod pipeline;
pub mod simulator;
pub mod smoothing;
pub mod types;
pub mod vector;

pub use config::{ConfigError, ControlConfig};
pub use controller::GestureController;
pub use types::{
    ControlMode, FrameOutput, HandFrame, Landmark, MapCommand, PanVector, ZoomDirection,
    ZoomVector,
};

//! Engine systems.
//!
//! Submodules overview
//! - [`rotationanimation`] – advance rotation animations, propagate values to
//!   bound targets, and spawn/drive animations from host code
//! - [`time`] – update simulation time and delta

pub mod rotationanimation;
pub mod time;

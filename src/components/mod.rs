//! ECS components for entities.
//!
//! Submodules overview:
//! - [`rotation`] – rotation angle in degrees and the binding marker that
//!   hands it over to an animation
//! - [`rotationanimation`] – timed rotation animation with its lifecycle state
//!   machine, value cell and bus subscriptions
//! - [`timeline`] – keyframed value timeline with delay and repeat count

pub mod rotation;
pub mod rotationanimation;
pub mod timeline;

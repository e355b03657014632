//! rotanim library.
//!
//! Timed rotation animations for a `bevy_ecs` world: a keyframed timeline
//! drives an interpolated angle into the [`Rotation`](components::rotation::Rotation)
//! of bound entities, with a play/pause/finish lifecycle that also follows
//! global pause and resume broadcasts.

pub mod builder;
pub mod components;
pub mod events;
pub mod resources;
pub mod systems;

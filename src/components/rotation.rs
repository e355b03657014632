//! Rotation property and its binding marker.
//!
//! [`Rotation`] is the animatable property exposed by any entity that can be
//! spun. When a [`RotationAnimation`](super::rotationanimation::RotationAnimation)
//! drives it, the entity also carries a [`RotationBinding`] naming the
//! animation entity; the rotation then tracks the animation's interpolated
//! value and must not be written from anywhere else.

use bevy_ecs::prelude::{Component, Entity};

#[derive(Component, Clone, Debug, Copy, Default, PartialEq)]
pub struct Rotation {
    pub degrees: f32,
}

impl Rotation {
    pub fn new(degrees: f32) -> Self {
        Rotation { degrees }
    }
}

/// One-way binding from an animation's value into this entity's [`Rotation`].
///
/// A rotation can only be bound to one source at a time. Binding it again
/// replaces the previous source.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RotationBinding {
    /// The animation entity whose value this rotation follows.
    pub source: Entity,
}

impl RotationBinding {
    pub fn new(source: Entity) -> Self {
        RotationBinding { source }
    }

    /// Whether `animation` is the current owner of this binding.
    pub fn is_bound_to(&self, animation: Entity) -> bool {
        self.source == animation
    }
}

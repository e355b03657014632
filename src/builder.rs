//! Fluent configuration for rotation animations.
//!
//! ```ignore
//! let anim = AnimationBuilder::new()
//!     .with_delay(0.5)
//!     .with_duration(2.0)
//!     .with_times(3)
//!     .with_target(ship)
//!     .rotate(&mut world, 0.0, 360.0);
//! play_rotation_animation(&mut world, anim);
//! ```
//!
//! The builder is only read while the animation is constructed; changing it
//! afterwards has no effect on animations already spawned.

use crate::components::timeline::RepeatCount;
use crate::resources::animationsettings::AnimationSettings;
use crate::systems::rotationanimation::spawn_rotation_animation;
use bevy_ecs::prelude::{Entity, World};
use smallvec::SmallVec;

#[derive(Clone, Debug)]
pub struct AnimationBuilder {
    delay: f32,
    times: RepeatCount,
    duration: f32,
    targets: SmallVec<[Entity; 4]>,
    despawn_on_finish: bool,
}

impl Default for AnimationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationBuilder {
    /// No delay, one cycle of one second, no targets.
    pub fn new() -> Self {
        AnimationBuilder {
            delay: 0.0,
            times: RepeatCount::default(),
            duration: 1.0,
            targets: SmallVec::new(),
            despawn_on_finish: false,
        }
    }

    /// Seed delay, duration and repeat count from loaded settings.
    pub fn from_settings(settings: &AnimationSettings) -> Self {
        Self::new()
            .with_delay(settings.delay)
            .with_duration(settings.duration)
            .with_repeat(settings.times)
    }

    pub fn with_delay(mut self, seconds: f32) -> Self {
        self.delay = seconds.max(0.0);
        self
    }

    pub fn with_duration(mut self, seconds: f32) -> Self {
        self.duration = seconds.max(0.0);
        self
    }

    /// Play `n` cycles. Zero is raised to one.
    pub fn with_times(mut self, n: u32) -> Self {
        self.times = RepeatCount::times(n);
        self
    }

    pub fn with_indefinite_repeat(mut self) -> Self {
        self.times = RepeatCount::Indefinite;
        self
    }

    pub fn with_repeat(mut self, times: RepeatCount) -> Self {
        self.times = match times {
            RepeatCount::Times(n) => RepeatCount::times(n),
            RepeatCount::Indefinite => RepeatCount::Indefinite,
        };
        self
    }

    pub fn with_target(mut self, target: Entity) -> Self {
        self.targets.push(target);
        self
    }

    pub fn with_targets(mut self, targets: impl IntoIterator<Item = Entity>) -> Self {
        self.targets.extend(targets);
        self
    }

    /// Despawn the animation entity once it has been torn down.
    pub fn with_despawn_on_finish(mut self) -> Self {
        self.despawn_on_finish = true;
        self
    }

    pub fn delay(&self) -> f32 {
        self.delay
    }

    pub fn times(&self) -> RepeatCount {
        self.times
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn targets(&self) -> &[Entity] {
        &self.targets
    }

    pub fn despawns_on_finish(&self) -> bool {
        self.despawn_on_finish
    }

    /// Spawn a rotation animation from `start` to `end` degrees.
    pub fn rotate(&self, world: &mut World, start: f32, end: f32) -> Entity {
        spawn_rotation_animation(world, self, start, end)
    }
}

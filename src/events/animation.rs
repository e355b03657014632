//! Animation control and completion events.
//!
//! - [`AnimationControlEvent`] asks a specific animation to play, pause or
//!   finish. [`animation_control_observer`] applies it and, when the
//!   animation ends, runs the same teardown as natural completion.
//! - [`AnimationFinishedEvent`] is triggered once per animation after its
//!   teardown, whichever path ended it.

use crate::components::rotation::RotationBinding;
use crate::components::rotationanimation::RotationAnimation;
use crate::resources::eventbus::EventBus;
use crate::systems::rotationanimation::release_teardown;
use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::{debug, warn};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AnimationCommand {
    Play,
    Pause,
    Finish,
}

/// Request a lifecycle operation on the animation entity `animation`.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationControlEvent {
    pub animation: Entity,
    pub command: AnimationCommand,
}

/// Emitted after an animation has been torn down.
///
/// `natural` is `true` when the timeline ran to the end of its last cycle,
/// `false` when it was stopped early with `finish`.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationFinishedEvent {
    pub animation: Entity,
    pub natural: bool,
}

/// Observer that applies an [`AnimationControlEvent`].
pub fn animation_control_observer(
    trigger: On<AnimationControlEvent>,
    mut commands: Commands,
    mut bus: ResMut<EventBus>,
    mut animations: Query<&mut RotationAnimation>,
    bindings: Query<&RotationBinding>,
) {
    let event = trigger.event();
    let Ok(mut animation) = animations.get_mut(event.animation) else {
        warn!(
            "{:?} sent to {:?}, which has no RotationAnimation",
            event.command, event.animation
        );
        return;
    };

    let transition = match event.command {
        AnimationCommand::Play => animation.play(),
        AnimationCommand::Pause => animation.pause(),
        AnimationCommand::Finish => animation.finish(),
    };
    debug!("{:?} on {:?}: {:?}", event.command, event.animation, transition);

    if event.command == AnimationCommand::Finish && transition.is_applied() {
        let teardown = animation.take_teardown();
        release_teardown(
            event.animation,
            teardown,
            animation.despawn_on_finish(),
            false,
            &mut bus,
            |target| bindings.get(target).ok().map(|b| b.source),
            &mut commands,
        );
    }
}

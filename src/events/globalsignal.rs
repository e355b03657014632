//! Global pause/resume broadcast.
//!
//! Triggering a [`GlobalSignalEvent`] delivers the signal to every entity
//! subscribed to that [`SignalKind`] on the [`EventBus`]. The receiving
//! [`RotationAnimation`] decides whether the signal applies:
//! - `Pause` pauses animations that are playing
//! - `Resume` resumes animations that are paused
//!
//! Anything else is ignored, so delivering the same signal twice, or in any
//! order across animations, is harmless.
//!
//! # Example
//!
//! ```ignore
//! world.add_observer(global_signal_observer);
//! world.flush();
//! world.trigger(GlobalSignalEvent::pause());
//! ```

use crate::components::rotationanimation::RotationAnimation;
use crate::resources::eventbus::{EventBus, SignalKind};
use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::{debug, warn};

/// A pause or resume broadcast.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalSignalEvent {
    pub signal: SignalKind,
}

impl GlobalSignalEvent {
    pub fn pause() -> Self {
        GlobalSignalEvent {
            signal: SignalKind::Pause,
        }
    }

    pub fn resume() -> Self {
        GlobalSignalEvent {
            signal: SignalKind::Resume,
        }
    }
}

/// Hand a broadcast signal to each subscribed animation.
pub fn global_signal_observer(
    trigger: On<GlobalSignalEvent>,
    bus: Option<Res<EventBus>>,
    mut animations: Query<&mut RotationAnimation>,
) {
    let signal = trigger.event().signal;
    let Some(bus) = bus else {
        warn!("{:?} broadcast without an EventBus resource", signal);
        return;
    };

    let subscribers = bus.subscribers(signal);
    debug!("Broadcasting {:?} to {} subscriber(s)", signal, subscribers.len());

    for entity in subscribers {
        match animations.get_mut(entity) {
            Ok(mut animation) => {
                if let Some(transition) = animation.on_signal(signal) {
                    debug!("{:?} on {:?}: {:?}", signal, entity, transition);
                }
            }
            Err(_) => debug!("Subscriber {:?} has no RotationAnimation", entity),
        }
    }
}

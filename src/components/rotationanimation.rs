//! Timed rotation animation component.
//!
//! A [`RotationAnimation`] lives on its own entity and drives the
//! [`Rotation`](super::rotation::Rotation) of one or more target entities from
//! a start angle to an end angle over a fixed duration.
//!
//! # Lifecycle
//!
//! ```text
//! Init ──play──▶ Playing ──pause / pause signal──▶ Paused
//!                   ▲                                 │
//!                   └─────play / resume signal────────┘
//! Playing ──natural completion──▶ Finished
//! Init | Playing | Paused ──finish──▶ Finished
//! ```
//!
//! `Finished` is terminal. Every operation attempted there is rejected with a
//! warning and leaves the animation untouched. Pausing before the first play
//! is rejected the same way.
//!
//! # Ownership
//!
//! The component owns its [`Timeline`], its [`InterpolatedValue`] and its two
//! bus [`Subscription`]s. It never owns the targets: it only binds to them.
//! When the animation finishes (either path), [`RotationAnimation::take_teardown`]
//! hands back everything the ECS side must release. See
//! [`crate::systems::rotationanimation`] for the systems that apply it.

use crate::builder::AnimationBuilder;
use crate::components::timeline::{KeyFrame, RepeatCount, Timeline, TimelineTick};
use crate::resources::eventbus::{EventBus, SignalKind, Subscription};
use bevy_ecs::prelude::{Component, Entity};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Discrete lifecycle states of an animation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AnimationState {
    #[default]
    Init,
    Playing,
    Paused,
    Finished,
}

/// Why an operation was refused.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Rejection {
    PlayFinished,
    PauseBeforePlay,
    PauseFinished,
    FinishFinished,
}

impl Rejection {
    pub fn message(&self) -> &'static str {
        match self {
            Rejection::PlayFinished => "Attempted to play finished animation",
            Rejection::PauseBeforePlay => "Attempted to pause animation that was never played",
            Rejection::PauseFinished => "Attempted to pause finished animation",
            Rejection::FinishFinished => "Attempted to finish already finished animation",
        }
    }
}

/// Outcome of a lifecycle operation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    Applied {
        from: AnimationState,
        to: AnimationState,
    },
    Rejected(Rejection),
}

impl Transition {
    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Transition::Rejected(_))
    }
}

/// Current animated value plus the entities observing it.
#[derive(Clone, Debug, Default)]
pub struct InterpolatedValue {
    value: f32,
    observers: SmallVec<[Entity; 4]>,
}

impl InterpolatedValue {
    pub fn new(value: f32) -> Self {
        InterpolatedValue {
            value,
            observers: SmallVec::new(),
        }
    }

    pub fn get(&self) -> f32 {
        self.value
    }

    pub fn set(&mut self, value: f32) {
        self.value = value;
    }

    /// Register an observer. Returns `false` if it was already bound.
    pub fn bind(&mut self, observer: Entity) -> bool {
        if self.observers.contains(&observer) {
            return false;
        }
        self.observers.push(observer);
        true
    }

    /// Deregister an observer. Returns `false` if it was not bound.
    pub fn unbind(&mut self, observer: Entity) -> bool {
        let before = self.observers.len();
        self.observers.retain(|e| *e != observer);
        self.observers.len() != before
    }

    pub fn is_bound(&self, observer: Entity) -> bool {
        self.observers.contains(&observer)
    }

    pub fn observers(&self) -> &[Entity] {
        &self.observers
    }

    fn unbind_all(&mut self) -> SmallVec<[Entity; 4]> {
        std::mem::take(&mut self.observers)
    }
}

/// Resources to release once an animation has finished.
#[derive(Debug, Default)]
pub struct Teardown {
    pub subscriptions: SmallVec<[Subscription; 2]>,
    pub targets: SmallVec<[Entity; 4]>,
}

impl Teardown {
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty() && self.targets.is_empty()
    }
}

/// Serializable snapshot of an animation, for reports and debugging.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationReport {
    pub state: AnimationState,
    pub value: f32,
    pub start: f32,
    pub end: f32,
    pub elapsed: f32,
    pub cycle: u32,
    pub repeat: RepeatCount,
    pub bound_targets: usize,
    pub keyframes: usize,
    pub live_subscriptions: usize,
}

#[derive(Component, Debug)]
pub struct RotationAnimation {
    owner: Entity,
    start: f32,
    end: f32,
    state: AnimationState,
    timeline: Timeline,
    value: InterpolatedValue,
    pause_subscription: Option<Subscription>,
    resume_subscription: Option<Subscription>,
    despawn_on_finish: bool,
}

impl RotationAnimation {
    /// Build an animation owned by `owner`, rotating from `start` to `end`.
    ///
    /// Subscribes `owner` to pause and resume on `bus` and binds every target
    /// in `builder` to the value cell. Inserting the matching
    /// [`RotationBinding`](super::rotation::RotationBinding) components is left
    /// to the caller; [`crate::systems::rotationanimation::spawn_rotation_animation`]
    /// does both.
    pub fn new(
        owner: Entity,
        builder: &AnimationBuilder,
        start: f32,
        end: f32,
        bus: &mut EventBus,
    ) -> Self {
        let mut timeline = Timeline::new(builder.delay(), builder.times());

        let pause_subscription = bus.subscribe(SignalKind::Pause, owner);
        let resume_subscription = bus.subscribe(SignalKind::Resume, owner);

        let mut value = InterpolatedValue::new(start);
        timeline.add_keyframe(KeyFrame::new(builder.duration(), end));

        for &target in builder.targets() {
            if !value.bind(target) {
                debug!("Target {:?} listed twice, binding once", target);
            }
        }

        debug!(
            "Rotation animation {:?}: {} -> {} over {}s, delay {}s, {:?}, {} target(s)",
            owner,
            start,
            end,
            builder.duration(),
            builder.delay(),
            builder.times(),
            value.observers().len()
        );

        RotationAnimation {
            owner,
            start,
            end,
            state: AnimationState::Init,
            timeline,
            value,
            pause_subscription: Some(pause_subscription),
            resume_subscription: Some(resume_subscription),
            despawn_on_finish: builder.despawns_on_finish(),
        }
    }

    pub fn owner(&self) -> Entity {
        self.owner
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn start(&self) -> f32 {
        self.start
    }

    pub fn end(&self) -> f32 {
        self.end
    }

    /// Current interpolated angle in degrees.
    pub fn value(&self) -> f32 {
        self.value.get()
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Entities currently bound to this animation's value.
    pub fn targets(&self) -> &[Entity] {
        self.value.observers()
    }

    pub fn is_bound(&self, target: Entity) -> bool {
        self.value.is_bound(target)
    }

    /// Drop a single target from the value cell without finishing.
    pub fn unbind_target(&mut self, target: Entity) -> bool {
        self.value.unbind(target)
    }

    pub fn live_subscriptions(&self) -> usize {
        self.pause_subscription.is_some() as usize + self.resume_subscription.is_some() as usize
    }

    pub fn despawn_on_finish(&self) -> bool {
        self.despawn_on_finish
    }

    pub fn is_finished(&self) -> bool {
        self.state == AnimationState::Finished
    }

    fn apply(&mut self, to: AnimationState) -> Transition {
        let from = self.state;
        self.state = to;
        debug!("Animation {:?}: {:?} -> {:?}", self.owner, from, to);
        Transition::Applied { from, to }
    }

    fn reject(&self, reason: Rejection) -> Transition {
        warn!("{} ({:?})", reason.message(), self.owner);
        Transition::Rejected(reason)
    }

    /// Start or resume playback.
    pub fn play(&mut self) -> Transition {
        match self.state {
            AnimationState::Finished => self.reject(Rejection::PlayFinished),
            _ => {
                self.timeline.play(self.value.get());
                self.apply(AnimationState::Playing)
            }
        }
    }

    /// Pause playback. Only valid once the animation has been played.
    pub fn pause(&mut self) -> Transition {
        match self.state {
            AnimationState::Finished => self.reject(Rejection::PauseFinished),
            AnimationState::Init => self.reject(Rejection::PauseBeforePlay),
            _ => {
                self.timeline.pause();
                self.apply(AnimationState::Paused)
            }
        }
    }

    /// Stop early and mark the animation finished.
    ///
    /// Only the state changes here; follow up with [`Self::take_teardown`] to
    /// release bindings and subscriptions.
    pub fn finish(&mut self) -> Transition {
        match self.state {
            AnimationState::Finished => self.reject(Rejection::FinishFinished),
            _ => {
                self.timeline.stop();
                self.apply(AnimationState::Finished)
            }
        }
    }

    /// React to a global signal. Returns `None` when the signal does not
    /// apply to the current state.
    pub fn on_signal(&mut self, signal: SignalKind) -> Option<Transition> {
        match signal {
            SignalKind::Pause => self.on_pause_signal(),
            SignalKind::Resume => self.on_resume_signal(),
        }
    }

    pub fn on_pause_signal(&mut self) -> Option<Transition> {
        (self.state == AnimationState::Playing).then(|| self.pause())
    }

    pub fn on_resume_signal(&mut self) -> Option<Transition> {
        (self.state == AnimationState::Paused).then(|| self.play())
    }

    /// Advance the timeline by `dt` seconds and update the value cell.
    ///
    /// Only moves while playing. On [`TimelineTick::Completed`] the caller is
    /// expected to run the teardown.
    pub fn advance(&mut self, dt: f32) -> TimelineTick {
        if self.state != AnimationState::Playing {
            return TimelineTick::Idle;
        }
        let tick = self.timeline.tick(dt);
        match tick {
            TimelineTick::Advanced(v) | TimelineTick::Completed(v) => self.value.set(v),
            TimelineTick::Idle | TimelineTick::Delayed => {}
        }
        tick
    }

    /// Enter `Finished` and hand back everything that must be released.
    ///
    /// Clears the keyframes, empties the observer set and gives up both
    /// subscriptions. Calling it again returns an empty [`Teardown`].
    pub fn take_teardown(&mut self) -> Teardown {
        if self.state != AnimationState::Finished {
            self.timeline.stop();
            self.apply(AnimationState::Finished);
        }
        self.timeline.clear_keyframes();

        let subscriptions = [
            self.pause_subscription.take(),
            self.resume_subscription.take(),
        ]
        .into_iter()
        .flatten()
        .collect();

        Teardown {
            subscriptions,
            targets: self.value.unbind_all(),
        }
    }

    /// Whether nothing is left to release.
    pub fn is_torn_down(&self) -> bool {
        self.live_subscriptions() == 0
            && self.value.observers().is_empty()
            && self.timeline.keyframes().is_empty()
    }

    pub fn report(&self) -> AnimationReport {
        AnimationReport {
            state: self.state,
            value: self.value.get(),
            start: self.start,
            end: self.end,
            elapsed: self.timeline.elapsed(),
            cycle: self.timeline.current_cycle(),
            repeat: self.timeline.repeat(),
            bound_targets: self.value.observers().len(),
            keyframes: self.timeline.keyframes().len(),
            live_subscriptions: self.live_subscriptions(),
        }
    }
}

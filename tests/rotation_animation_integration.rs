//! Rotation animation integration tests.
//!
//! Each test builds a `World` with the resources and observers the host
//! registers, drives frames through a `Schedule`, and checks the resulting
//! state, bound rotations and bus subscriptions.

use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use std::sync::{Arc, Mutex};

use rotanim::builder::AnimationBuilder;
use rotanim::components::rotation::{Rotation, RotationBinding};
use rotanim::components::rotationanimation::{
    AnimationState, Rejection, RotationAnimation, Transition,
};
use rotanim::events::animation::{
    AnimationCommand, AnimationControlEvent, AnimationFinishedEvent, animation_control_observer,
};
use rotanim::events::globalsignal::{GlobalSignalEvent, global_signal_observer};
use rotanim::resources::eventbus::{EventBus, SignalKind};
use rotanim::resources::worldtime::WorldTime;
use rotanim::systems::rotationanimation::{
    finish_rotation_animation, pause_rotation_animation, play_rotation_animation,
    rotation_animation_system,
};
use rotanim::systems::time::update_world_time;

const EPSILON: f32 = 1e-4;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn make_world() -> World {
    let mut world = World::new();
    world.insert_resource(WorldTime::default());
    world.insert_resource(EventBus::new());
    world.add_observer(global_signal_observer);
    world.add_observer(animation_control_observer);
    world.flush();
    world
}

fn advance(world: &mut World, dt: f32) {
    update_world_time(world, dt);
    let mut schedule = Schedule::default();
    schedule.add_systems(rotation_animation_system);
    schedule.run(world);
}

fn state_of(world: &World, animation: Entity) -> AnimationState {
    world.get::<RotationAnimation>(animation).unwrap().state()
}

fn degrees(world: &World, target: Entity) -> f32 {
    world.get::<Rotation>(target).unwrap().degrees
}

fn record_finished(world: &mut World) -> Arc<Mutex<Vec<AnimationFinishedEvent>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    world.add_observer(move |trigger: On<AnimationFinishedEvent>| {
        seen_clone.lock().unwrap().push(*trigger.event());
    });
    world.flush();
    seen
}

fn spawn_quarter_turn(world: &mut World) -> (Entity, Entity) {
    let target = world.spawn(Rotation::default()).id();
    let animation = AnimationBuilder::new()
        .with_duration(1.0)
        .with_times(1)
        .with_target(target)
        .rotate(world, 0.0, 90.0);
    (animation, target)
}

// =============================================================================
// Natural completion
// =============================================================================

#[test]
fn quarter_turn_reaches_end_and_finishes() {
    let mut world = make_world();
    let (animation, target) = spawn_quarter_turn(&mut world);

    play_rotation_animation(&mut world, animation);
    advance(&mut world, 1.0);

    assert!(approx_eq(degrees(&world, target), 90.0));
    assert_eq!(state_of(&world, animation), AnimationState::Finished);
}

#[test]
fn quarter_turn_in_small_steps_passes_through_midpoint() {
    let mut world = make_world();
    let (animation, target) = spawn_quarter_turn(&mut world);
    play_rotation_animation(&mut world, animation);

    advance(&mut world, 0.25);
    assert!(approx_eq(degrees(&world, target), 22.5));
    advance(&mut world, 0.25);
    assert!(approx_eq(degrees(&world, target), 45.0));
    assert_eq!(state_of(&world, animation), AnimationState::Playing);

    advance(&mut world, 0.6);
    assert!(approx_eq(degrees(&world, target), 90.0));
    assert_eq!(state_of(&world, animation), AnimationState::Finished);
}

#[test]
fn quarter_turn_finishes_after_one_second_of_sixtieth_frames() {
    let mut world = make_world();
    let (animation, target) = spawn_quarter_turn(&mut world);
    play_rotation_animation(&mut world, animation);

    for _ in 0..59 {
        advance(&mut world, 1.0 / 60.0);
    }
    assert_eq!(state_of(&world, animation), AnimationState::Playing);

    advance(&mut world, 1.0 / 60.0);
    assert_eq!(degrees(&world, target), 90.0);
    assert_eq!(state_of(&world, animation), AnimationState::Finished);
    assert!(world.get::<RotationBinding>(target).is_none());
}

#[test]
fn natural_completion_tears_everything_down() {
    let mut world = make_world();
    let finished = record_finished(&mut world);
    let a = world.spawn(Rotation::default()).id();
    let b = world.spawn(Rotation::default()).id();
    let animation = AnimationBuilder::new()
        .with_targets([a, b])
        .rotate(&mut world, 0.0, 45.0);

    play_rotation_animation(&mut world, animation);
    advance(&mut world, 1.0);

    let component = world.get::<RotationAnimation>(animation).unwrap();
    assert!(component.is_torn_down());
    assert!(component.timeline().keyframes().is_empty());
    assert_eq!(component.live_subscriptions(), 0);

    let bus = world.resource::<EventBus>();
    assert!(!bus.is_subscribed(SignalKind::Pause, animation));
    assert!(!bus.is_subscribed(SignalKind::Resume, animation));

    assert!(world.get::<RotationBinding>(a).is_none());
    assert!(world.get::<RotationBinding>(b).is_none());
    // Unbinding leaves the last value in place.
    assert!(approx_eq(degrees(&world, a), 45.0));

    assert_eq!(
        finished.lock().unwrap().as_slice(),
        &[AnimationFinishedEvent {
            animation,
            natural: true
        }]
    );
}

#[test]
fn broadcasts_after_completion_have_no_effect() {
    let mut world = make_world();
    let (animation, target) = spawn_quarter_turn(&mut world);
    play_rotation_animation(&mut world, animation);
    advance(&mut world, 1.0);

    world.trigger(GlobalSignalEvent::pause());
    world.trigger(GlobalSignalEvent::resume());

    assert_eq!(state_of(&world, animation), AnimationState::Finished);
    assert!(approx_eq(degrees(&world, target), 90.0));
}

#[test]
fn delay_and_repeats_are_honoured() {
    let mut world = make_world();
    let target = world.spawn(Rotation::default()).id();
    let animation = AnimationBuilder::new()
        .with_delay(0.5)
        .with_duration(1.0)
        .with_times(2)
        .with_target(target)
        .rotate(&mut world, 0.0, 100.0);
    play_rotation_animation(&mut world, animation);

    advance(&mut world, 0.5);
    assert!(approx_eq(degrees(&world, target), 0.0));

    advance(&mut world, 0.5);
    assert!(approx_eq(degrees(&world, target), 50.0));

    // Second cycle restarts from the start angle.
    advance(&mut world, 0.75);
    assert!(approx_eq(degrees(&world, target), 25.0));
    assert_eq!(state_of(&world, animation), AnimationState::Playing);

    advance(&mut world, 0.75);
    assert!(approx_eq(degrees(&world, target), 100.0));
    assert_eq!(state_of(&world, animation), AnimationState::Finished);
}

#[test]
fn indefinite_animation_keeps_subscriptions_until_finished() {
    let mut world = make_world();
    let target = world.spawn(Rotation::default()).id();
    let animation = AnimationBuilder::new()
        .with_indefinite_repeat()
        .with_target(target)
        .rotate(&mut world, 0.0, 360.0);
    play_rotation_animation(&mut world, animation);

    for _ in 0..50 {
        advance(&mut world, 0.3);
    }
    assert_eq!(state_of(&world, animation), AnimationState::Playing);
    assert_eq!(world.resource::<EventBus>().subscription_count(SignalKind::Pause), 1);

    finish_rotation_animation(&mut world, animation);
    assert_eq!(world.resource::<EventBus>().subscription_count(SignalKind::Pause), 0);
}

#[test]
fn time_scale_slows_the_animation() {
    let mut world = make_world();
    world.resource_mut::<WorldTime>().time_scale = 0.5;
    let (animation, target) = spawn_quarter_turn(&mut world);
    play_rotation_animation(&mut world, animation);

    advance(&mut world, 1.0);
    assert!(approx_eq(degrees(&world, target), 45.0));
    assert_eq!(state_of(&world, animation), AnimationState::Playing);
}

// =============================================================================
// Global pause / resume
// =============================================================================

#[test]
fn pause_signal_then_resume_signal() {
    let mut world = make_world();
    let (animation, target) = spawn_quarter_turn(&mut world);
    play_rotation_animation(&mut world, animation);
    advance(&mut world, 0.25);

    world.trigger(GlobalSignalEvent::pause());
    assert_eq!(state_of(&world, animation), AnimationState::Paused);

    // Frozen while paused.
    advance(&mut world, 0.5);
    assert!(approx_eq(degrees(&world, target), 22.5));
    let elapsed = world
        .get::<RotationAnimation>(animation)
        .unwrap()
        .timeline()
        .elapsed();
    assert!(approx_eq(elapsed, 0.25));

    world.trigger(GlobalSignalEvent::resume());
    assert_eq!(state_of(&world, animation), AnimationState::Playing);
    advance(&mut world, 0.25);
    assert!(approx_eq(degrees(&world, target), 45.0));
}

#[test]
fn pause_signal_while_paused_is_ignored() {
    let mut world = make_world();
    let (animation, _target) = spawn_quarter_turn(&mut world);
    play_rotation_animation(&mut world, animation);
    pause_rotation_animation(&mut world, animation);

    world.trigger(GlobalSignalEvent::pause());
    world.trigger(GlobalSignalEvent::pause());
    assert_eq!(state_of(&world, animation), AnimationState::Paused);

    // A single resume is enough: the extra pauses did not stack.
    world.trigger(GlobalSignalEvent::resume());
    assert_eq!(state_of(&world, animation), AnimationState::Playing);
}

#[test]
fn signals_before_play_are_ignored() {
    let mut world = make_world();
    let (animation, _target) = spawn_quarter_turn(&mut world);

    world.trigger(GlobalSignalEvent::pause());
    world.trigger(GlobalSignalEvent::resume());
    assert_eq!(state_of(&world, animation), AnimationState::Init);
}

#[test]
fn broadcast_reaches_every_subscribed_animation() {
    let mut world = make_world();
    let (playing_a, _) = spawn_quarter_turn(&mut world);
    let (playing_b, _) = spawn_quarter_turn(&mut world);
    let (idle, _) = spawn_quarter_turn(&mut world);
    play_rotation_animation(&mut world, playing_a);
    play_rotation_animation(&mut world, playing_b);

    world.trigger(GlobalSignalEvent::pause());
    assert_eq!(state_of(&world, playing_a), AnimationState::Paused);
    assert_eq!(state_of(&world, playing_b), AnimationState::Paused);
    assert_eq!(state_of(&world, idle), AnimationState::Init);

    world.trigger(GlobalSignalEvent::resume());
    assert_eq!(state_of(&world, playing_a), AnimationState::Playing);
    assert_eq!(state_of(&world, playing_b), AnimationState::Playing);
    assert_eq!(state_of(&world, idle), AnimationState::Init);
}

// =============================================================================
// Explicit finish
// =============================================================================

#[test]
fn finish_midway_releases_binding_immediately() {
    // An early finish runs the same teardown as natural completion: the
    // binding is gone at once and the rotation keeps the value reached.
    let mut world = make_world();
    let finished = record_finished(&mut world);
    let (animation, target) = spawn_quarter_turn(&mut world);
    play_rotation_animation(&mut world, animation);
    advance(&mut world, 0.3);

    let transition = finish_rotation_animation(&mut world, animation).unwrap();
    assert_eq!(
        transition,
        Transition::Applied {
            from: AnimationState::Playing,
            to: AnimationState::Finished
        }
    );
    assert_eq!(state_of(&world, animation), AnimationState::Finished);
    assert!(world.get::<RotationBinding>(target).is_none());
    assert!(world.get::<RotationAnimation>(animation).unwrap().is_torn_down());
    assert!(approx_eq(degrees(&world, target), 27.0));

    // No further movement.
    advance(&mut world, 1.0);
    assert!(approx_eq(degrees(&world, target), 27.0));

    assert_eq!(
        finished.lock().unwrap().as_slice(),
        &[AnimationFinishedEvent {
            animation,
            natural: false
        }]
    );
}

#[test]
fn finish_twice_rejects_the_second_call() {
    let mut world = make_world();
    let finished = record_finished(&mut world);
    let (animation, _target) = spawn_quarter_turn(&mut world);
    play_rotation_animation(&mut world, animation);

    assert!(finish_rotation_animation(&mut world, animation).unwrap().is_applied());
    assert_eq!(
        finish_rotation_animation(&mut world, animation),
        Some(Transition::Rejected(Rejection::FinishFinished))
    );
    assert_eq!(state_of(&world, animation), AnimationState::Finished);
    assert_eq!(finished.lock().unwrap().len(), 1);
}

#[test]
fn every_operation_after_finish_is_rejected() {
    let mut world = make_world();
    let (animation, _target) = spawn_quarter_turn(&mut world);
    finish_rotation_animation(&mut world, animation);

    assert_eq!(
        play_rotation_animation(&mut world, animation),
        Some(Transition::Rejected(Rejection::PlayFinished))
    );
    assert_eq!(
        pause_rotation_animation(&mut world, animation),
        Some(Transition::Rejected(Rejection::PauseFinished))
    );
    assert_eq!(state_of(&world, animation), AnimationState::Finished);
}

#[test]
fn pause_before_play_is_rejected() {
    let mut world = make_world();
    let (animation, _target) = spawn_quarter_turn(&mut world);
    assert_eq!(
        pause_rotation_animation(&mut world, animation),
        Some(Transition::Rejected(Rejection::PauseBeforePlay))
    );
    assert_eq!(state_of(&world, animation), AnimationState::Init);
}

// =============================================================================
// Control events
// =============================================================================

#[test]
fn control_events_drive_the_lifecycle() {
    let mut world = make_world();
    let finished = record_finished(&mut world);
    let (animation, target) = spawn_quarter_turn(&mut world);

    world.trigger(AnimationControlEvent {
        animation,
        command: AnimationCommand::Play,
    });
    assert_eq!(state_of(&world, animation), AnimationState::Playing);

    world.trigger(AnimationControlEvent {
        animation,
        command: AnimationCommand::Pause,
    });
    assert_eq!(state_of(&world, animation), AnimationState::Paused);

    world.trigger(AnimationControlEvent {
        animation,
        command: AnimationCommand::Finish,
    });
    world.flush();
    assert_eq!(state_of(&world, animation), AnimationState::Finished);
    assert!(world.get::<RotationBinding>(target).is_none());
    assert_eq!(finished.lock().unwrap().len(), 1);
    assert!(!finished.lock().unwrap()[0].natural);
}

#[test]
fn despawn_on_finish_removes_the_animation_entity() {
    let mut world = make_world();
    let target = world.spawn(Rotation::default()).id();
    let animation = AnimationBuilder::new()
        .with_target(target)
        .with_despawn_on_finish()
        .rotate(&mut world, 0.0, 10.0);
    play_rotation_animation(&mut world, animation);
    advance(&mut world, 1.0);

    assert!(world.get_entity(animation).is_err());
    assert!(world.get_entity(target).is_ok());
    assert!(approx_eq(degrees(&world, target), 10.0));
    assert!(world.get::<RotationBinding>(target).is_none());
}

// =============================================================================
// Binding ownership
// =============================================================================

#[test]
fn rebinding_transfers_the_target() {
    let mut world = make_world();
    let target = world.spawn(Rotation::default()).id();
    let first = AnimationBuilder::new()
        .with_target(target)
        .rotate(&mut world, 0.0, 100.0);
    let second = AnimationBuilder::new()
        .with_duration(2.0)
        .with_target(target)
        .rotate(&mut world, 200.0, 300.0);

    assert_eq!(
        world.get::<RotationBinding>(target),
        Some(&RotationBinding::new(second))
    );

    play_rotation_animation(&mut world, first);
    play_rotation_animation(&mut world, second);
    advance(&mut world, 1.0);

    // Only the current owner writes; the first animation finishing does not
    // release a binding it no longer owns.
    assert_eq!(state_of(&world, first), AnimationState::Finished);
    assert!(approx_eq(degrees(&world, target), 250.0));
    assert_eq!(
        world.get::<RotationBinding>(target),
        Some(&RotationBinding::new(second))
    );
}

#[test]
fn despawned_target_does_not_break_the_animation() {
    let mut world = make_world();
    let kept = world.spawn(Rotation::default()).id();
    let dropped = world.spawn(Rotation::default()).id();
    let animation = AnimationBuilder::new()
        .with_targets([kept, dropped])
        .rotate(&mut world, 0.0, 90.0);
    play_rotation_animation(&mut world, animation);

    world.despawn(dropped);
    advance(&mut world, 0.5);
    assert!(approx_eq(degrees(&world, kept), 45.0));

    advance(&mut world, 0.5);
    assert_eq!(state_of(&world, animation), AnimationState::Finished);
    assert!(world.get::<RotationBinding>(kept).is_none());
}

//! Rotation animation systems and world helpers.
//!
//! - [`rotation_animation_system`] advances every playing
//!   [`RotationAnimation`] by the frame delta, pushes the new value into each
//!   bound [`Rotation`], and tears the animation down when its last cycle ends.
//! - [`spawn_rotation_animation`] builds an animation entity and binds its
//!   targets.
//! - [`play_rotation_animation`], [`pause_rotation_animation`] and
//!   [`finish_rotation_animation`] drive one animation from host code.
//! - [`set_rotation`] writes a rotation directly, refusing bound targets.
//!
//! Natural completion and an explicit finish both end in
//! [`release_teardown`], so bindings and subscriptions are released the same
//! way on either path.

use crate::builder::AnimationBuilder;
use crate::components::rotation::{Rotation, RotationBinding};
use crate::components::rotationanimation::{RotationAnimation, Teardown, Transition};
use crate::components::timeline::TimelineTick;
use crate::events::animation::AnimationFinishedEvent;
use crate::resources::eventbus::EventBus;
use crate::resources::worldtime::WorldTime;
use bevy_ecs::prelude::*;
use bevy_ecs::system::SystemState;
use log::{debug, info, warn};
use smallvec::SmallVec;

/// Advance playing animations and propagate their values to bound targets.
pub fn rotation_animation_system(
    world_time: Res<WorldTime>,
    mut commands: Commands,
    mut bus: ResMut<EventBus>,
    mut animations: Query<(Entity, &mut RotationAnimation)>,
    mut targets: Query<(&mut Rotation, &RotationBinding)>,
) {
    let dt = world_time.delta.max(0.0);
    for (entity, mut animation) in animations.iter_mut() {
        let tick = animation.advance(dt);
        if !matches!(tick, TimelineTick::Advanced(_) | TimelineTick::Completed(_)) {
            continue;
        }

        let value = animation.value();
        for &target in animation.targets() {
            // Despawned targets and targets rebound elsewhere are skipped.
            if let Ok((mut rotation, binding)) = targets.get_mut(target) {
                if binding.is_bound_to(entity) {
                    rotation.degrees = value;
                }
            }
        }

        if let TimelineTick::Completed(final_value) = tick {
            info!(
                "Animation {:?} completed at {} degrees",
                entity, final_value
            );
            let despawn = animation.despawn_on_finish();
            let teardown = animation.take_teardown();
            release_teardown(
                entity,
                teardown,
                despawn,
                true,
                &mut bus,
                |target| targets.get(target).ok().map(|(_, b)| b.source),
                &mut commands,
            );
        }
    }
}

/// Release what a finished animation handed back.
///
/// Cancels the subscriptions on `bus` and removes the [`RotationBinding`] of
/// every target still bound to `animation`. A target that has since been
/// rebound to another animation is left alone. `binding_source` reports the
/// current binding source of a target, if any.
pub fn release_teardown(
    animation: Entity,
    teardown: Teardown,
    despawn: bool,
    natural: bool,
    bus: &mut EventBus,
    binding_source: impl Fn(Entity) -> Option<Entity>,
    commands: &mut Commands,
) {
    for subscription in teardown.subscriptions {
        if !subscription.cancel(bus) {
            debug!("Subscription of {:?} was already gone", animation);
        }
    }

    for target in teardown.targets {
        match binding_source(target) {
            Some(source) if source == animation => {
                commands.entity(target).try_remove::<RotationBinding>();
            }
            Some(source) => debug!("{:?} was rebound to {:?}, leaving it", target, source),
            None => debug!("{:?} is no longer bound", target),
        }
    }

    commands.trigger(AnimationFinishedEvent { animation, natural });
    if despawn {
        commands.entity(animation).try_despawn();
    }
    debug!(
        "Animation {:?} torn down ({})",
        animation,
        if natural { "completed" } else { "finished early" }
    );
}

/// Spawn an animation entity rotating the builder's targets from `start` to
/// `end` degrees, and bind every target.
///
/// Targets get a [`Rotation`] if they lack one and are set to `start`
/// immediately. Targets that do not exist are skipped with a warning.
pub fn spawn_rotation_animation(
    world: &mut World,
    builder: &AnimationBuilder,
    start: f32,
    end: f32,
) -> Entity {
    world.init_resource::<EventBus>();
    let owner = world.spawn_empty().id();
    let mut animation = {
        let mut bus = world.resource_mut::<EventBus>();
        RotationAnimation::new(owner, builder, start, end, &mut bus)
    };

    let targets: SmallVec<[Entity; 4]> = animation.targets().into();
    for target in targets {
        let Ok(mut entity) = world.get_entity_mut(target) else {
            warn!("Animation target {:?} does not exist, skipping", target);
            animation.unbind_target(target);
            continue;
        };
        let previous = entity.get::<RotationBinding>().map(|b| b.source);
        if let Some(previous) = previous {
            debug!("Rebinding {:?} from {:?} to {:?}", target, previous, owner);
        }
        entity.insert(RotationBinding::new(owner));
        match entity.get_mut::<Rotation>() {
            Some(mut rotation) => rotation.degrees = start,
            None => {
                entity.insert(Rotation::new(start));
            }
        }
    }

    world.entity_mut(owner).insert(animation);
    owner
}

pub fn play_rotation_animation(world: &mut World, animation: Entity) -> Option<Transition> {
    let mut component = world.get_mut::<RotationAnimation>(animation)?;
    Some(component.play())
}

pub fn pause_rotation_animation(world: &mut World, animation: Entity) -> Option<Transition> {
    let mut component = world.get_mut::<RotationAnimation>(animation)?;
    Some(component.pause())
}

/// Finish an animation early and tear it down right away.
///
/// Returns `None` if `animation` has no [`RotationAnimation`].
pub fn finish_rotation_animation(world: &mut World, animation: Entity) -> Option<Transition> {
    let (transition, teardown, despawn) = {
        let mut component = world.get_mut::<RotationAnimation>(animation)?;
        let transition = component.finish();
        if !transition.is_applied() {
            return Some(transition);
        }
        (
            transition,
            component.take_teardown(),
            component.despawn_on_finish(),
        )
    };

    world.init_resource::<EventBus>();
    let mut state =
        SystemState::<(Commands, ResMut<EventBus>, Query<&RotationBinding>)>::new(world);
    {
        let (mut commands, mut bus, bindings) = state.get_mut(world);
        release_teardown(
            animation,
            teardown,
            despawn,
            false,
            &mut bus,
            |target| bindings.get(target).ok().map(|b| b.source),
            &mut commands,
        );
    }
    state.apply(world);

    Some(transition)
}

/// Write `degrees` into `entity`'s rotation unless it is bound.
///
/// A binding whose source no longer holds a [`RotationAnimation`] (for
/// example an animation entity despawned without finishing) is stale: it is
/// removed and the write goes through.
///
/// Returns `false` (with a warning) for bound or missing entities.
pub fn set_rotation(world: &mut World, entity: Entity, degrees: f32) -> bool {
    let Ok(entity_ref) = world.get_entity(entity) else {
        warn!("Cannot set rotation of missing entity {:?}", entity);
        return false;
    };
    let source = entity_ref.get::<RotationBinding>().map(|b| b.source);
    let live_source = source.filter(|s| world.get::<RotationAnimation>(*s).is_some());

    let Ok(mut entity_mut) = world.get_entity_mut(entity) else {
        return false;
    };
    if let Some(source) = live_source {
        warn!(
            "Rotation of {:?} is bound to {:?}, refusing direct write",
            entity, source
        );
        return false;
    }
    if let Some(stale) = source {
        debug!("Dropping stale binding of {:?} to {:?}", entity, stale);
        entity_mut.remove::<RotationBinding>();
    }
    match entity_mut.get_mut::<Rotation>() {
        Some(mut rotation) => rotation.degrees = degrees,
        None => {
            entity_mut.insert(Rotation::new(degrees));
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::rotationanimation::AnimationState;
    use crate::resources::eventbus::SignalKind;

    const EPSILON: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn make_world() -> World {
        let mut world = World::new();
        world.insert_resource(WorldTime::default());
        world.insert_resource(EventBus::new());
        world
    }

    fn tick(world: &mut World, dt: f32) {
        world.resource_mut::<WorldTime>().delta = dt;
        let mut schedule = Schedule::default();
        schedule.add_systems(rotation_animation_system);
        schedule.run(world);
    }

    #[test]
    fn test_spawn_binds_targets_and_sets_start() {
        let mut world = make_world();
        let with_rotation = world.spawn(Rotation::new(10.0)).id();
        let without_rotation = world.spawn_empty().id();
        let builder = AnimationBuilder::new()
            .with_target(with_rotation)
            .with_target(without_rotation);

        let anim = spawn_rotation_animation(&mut world, &builder, 30.0, 60.0);

        for target in [with_rotation, without_rotation] {
            assert!(approx_eq(world.get::<Rotation>(target).unwrap().degrees, 30.0));
            assert_eq!(
                world.get::<RotationBinding>(target),
                Some(&RotationBinding::new(anim))
            );
        }
        let bus = world.resource::<EventBus>();
        assert!(bus.is_subscribed(SignalKind::Pause, anim));
        assert!(bus.is_subscribed(SignalKind::Resume, anim));
    }

    #[test]
    fn test_spawn_skips_missing_targets() {
        let mut world = make_world();
        let gone = world.spawn_empty().id();
        world.despawn(gone);
        let builder = AnimationBuilder::new().with_target(gone);

        let anim = spawn_rotation_animation(&mut world, &builder, 0.0, 1.0);
        let component = world.get::<RotationAnimation>(anim).unwrap();
        assert!(component.targets().is_empty());
    }

    #[test]
    fn test_system_propagates_value() {
        let mut world = make_world();
        let target = world.spawn_empty().id();
        let anim = AnimationBuilder::new()
            .with_duration(2.0)
            .with_target(target)
            .rotate(&mut world, 0.0, 100.0);

        tick(&mut world, 0.5);
        assert!(approx_eq(world.get::<Rotation>(target).unwrap().degrees, 0.0));

        play_rotation_animation(&mut world, anim);
        tick(&mut world, 0.5);
        assert!(approx_eq(world.get::<Rotation>(target).unwrap().degrees, 25.0));
    }

    #[test]
    fn test_set_rotation_refuses_bound_targets() {
        let mut world = make_world();
        let free = world.spawn_empty().id();
        let bound = world.spawn_empty().id();
        AnimationBuilder::new()
            .with_target(bound)
            .rotate(&mut world, 5.0, 10.0);

        assert!(set_rotation(&mut world, free, 42.0));
        assert!(approx_eq(world.get::<Rotation>(free).unwrap().degrees, 42.0));

        assert!(!set_rotation(&mut world, bound, 42.0));
        assert!(approx_eq(world.get::<Rotation>(bound).unwrap().degrees, 5.0));
    }

    #[test]
    fn test_set_rotation_drops_binding_of_despawned_animation() {
        let mut world = make_world();
        let target = world.spawn_empty().id();
        let anim = AnimationBuilder::new()
            .with_target(target)
            .rotate(&mut world, 5.0, 10.0);
        world.despawn(anim);

        assert!(set_rotation(&mut world, target, 42.0));
        assert!(approx_eq(world.get::<Rotation>(target).unwrap().degrees, 42.0));
        assert!(world.get::<RotationBinding>(target).is_none());
    }

    #[test]
    fn test_helpers_on_missing_animation() {
        let mut world = make_world();
        let nothing = world.spawn_empty().id();
        assert_eq!(play_rotation_animation(&mut world, nothing), None);
        assert_eq!(pause_rotation_animation(&mut world, nothing), None);
        assert_eq!(finish_rotation_animation(&mut world, nothing), None);
    }

    #[test]
    fn test_finish_releases_immediately() {
        let mut world = make_world();
        let target = world.spawn_empty().id();
        let anim = AnimationBuilder::new()
            .with_target(target)
            .rotate(&mut world, 0.0, 90.0);
        play_rotation_animation(&mut world, anim);

        assert!(finish_rotation_animation(&mut world, anim).unwrap().is_applied());
        let component = world.get::<RotationAnimation>(anim).unwrap();
        assert_eq!(component.state(), AnimationState::Finished);
        assert!(component.is_torn_down());
        assert!(world.get::<RotationBinding>(target).is_none());
    }
}

//! rotanim host entry point.
//!
//! Runs rotation animations in a headless, fixed-step frame loop on top of
//! `bevy_ecs`. There is no window: each frame advances [`WorldTime`], runs
//! the animation system and logs the bound rotations.
//!
//! # Developer actions
//!
//! Pause, resume and finish can be scripted at given simulation times
//! (`--pause-at`, `--resume-at`, `--finish-at`) or typed on stdin with
//! `--interactive`. Pause and resume are global broadcasts that reach every
//! subscribed animation; finish targets the spawned animation.
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --targets 3 --end 360 --duration 2 --pause-at 0.5 --resume-at 1.5
//! ```

use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use clap::Parser;
use crossbeam_channel::{Receiver, unbounded};
use log::{debug, error, info, warn};
use rotanim::builder::AnimationBuilder;
use rotanim::components::rotation::Rotation;
use rotanim::components::rotationanimation::{AnimationReport, RotationAnimation};
use rotanim::components::timeline::RepeatCount;
use rotanim::events::animation::{
    AnimationCommand, AnimationControlEvent, AnimationFinishedEvent, animation_control_observer,
};
use rotanim::events::globalsignal::{GlobalSignalEvent, global_signal_observer};
use rotanim::resources::animationsettings::{AnimationSettings, parse_times};
use rotanim::resources::eventbus::EventBus;
use rotanim::resources::worldtime::WorldTime;
use rotanim::systems::rotationanimation::rotation_animation_system;
use rotanim::systems::time::update_world_time;
use serde::Serialize;
use std::io::BufRead;
use std::path::PathBuf;
use std::time::Duration;

/// Headless rotation animation runner
#[derive(Parser)]
#[command(version, about = "Runs a timed rotation animation in a headless frame loop")]
struct Cli {
    /// INI file with clock and animation defaults.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Number of target entities to rotate.
    #[arg(long, default_value_t = 1)]
    targets: usize,

    /// Start angle in degrees.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    start: f32,

    /// End angle in degrees.
    #[arg(long, default_value_t = 90.0, allow_negative_numbers = true)]
    end: f32,

    /// Cycle duration in seconds; overrides the config file.
    #[arg(long)]
    duration: Option<f32>,

    /// Start delay in seconds; overrides the config file.
    #[arg(long)]
    delay: Option<f32>,

    /// Repeat count, a positive number or "indefinite"; overrides the config file.
    #[arg(long, value_parser = parse_times_arg)]
    times: Option<RepeatCount>,

    /// Give up after this many frames.
    #[arg(long, default_value_t = 600)]
    frames: u64,

    /// Broadcast a pause signal at this simulation time.
    #[arg(long, value_name = "SECONDS")]
    pause_at: Option<f32>,

    /// Broadcast a resume signal at this simulation time.
    #[arg(long, value_name = "SECONDS")]
    resume_at: Option<f32>,

    /// Finish the animation early at this simulation time.
    #[arg(long, value_name = "SECONDS")]
    finish_at: Option<f32>,

    /// Read pause/resume/finish/quit from stdin and run in real time.
    #[arg(long)]
    interactive: bool,

    /// Print the final report as JSON.
    #[arg(long)]
    json: bool,
}

fn parse_times_arg(value: &str) -> Result<RepeatCount, String> {
    parse_times(value).ok_or_else(|| format!("invalid repeat count '{}'", value))
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum DevCommand {
    Pause,
    Resume,
    Finish,
    Quit,
}

impl DevCommand {
    fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "pause" | "p" => Some(DevCommand::Pause),
            "resume" | "r" => Some(DevCommand::Resume),
            "finish" | "f" => Some(DevCommand::Finish),
            "quit" | "q" | "exit" => Some(DevCommand::Quit),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct RunReport {
    frames: u64,
    elapsed: f32,
    animation: Option<AnimationReport>,
    target_degrees: Vec<f32>,
}

/// Forward stdin commands to the frame loop.
fn spawn_console_reader() -> Receiver<DevCommand> {
    let (tx, rx) = unbounded();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match DevCommand::parse(&line) {
                Some(cmd) => {
                    // Receiver gone means the loop has ended
                    if tx.send(cmd).is_err() {
                        break;
                    }
                    if cmd == DevCommand::Quit {
                        break;
                    }
                }
                None => warn!("Unknown command '{}' (pause, resume, finish, quit)", line.trim()),
            }
        }
    });
    rx
}

/// Apply a developer command. Returns `false` when the loop should stop.
fn apply_command(world: &mut World, animation: Entity, cmd: DevCommand) -> bool {
    info!("Developer command: {:?}", cmd);
    match cmd {
        DevCommand::Pause => world.trigger(GlobalSignalEvent::pause()),
        DevCommand::Resume => world.trigger(GlobalSignalEvent::resume()),
        DevCommand::Finish => world.trigger(AnimationControlEvent {
            animation,
            command: AnimationCommand::Finish,
        }),
        DevCommand::Quit => return false,
    }
    true
}

fn load_settings(path: Option<PathBuf>) -> AnimationSettings {
    let mut settings = match path {
        Some(path) => AnimationSettings::with_path(path),
        None => AnimationSettings::new(),
    };
    if let Err(e) = settings.load_from_file() {
        warn!("{}; using defaults", e);
    }
    settings
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings = load_settings(cli.config.clone());
    let frame_delta = settings.frame_delta;

    // --------------- ECS world + resources ---------------
    let mut world = World::new();
    world.insert_resource(WorldTime::default().with_time_scale(settings.time_scale));
    world.insert_resource(EventBus::new());
    world.add_observer(global_signal_observer);
    world.add_observer(animation_control_observer);
    world.add_observer(|trigger: On<AnimationFinishedEvent>| {
        let event = trigger.event();
        info!(
            "Animation {:?} finished ({})",
            event.animation,
            if event.natural { "completed" } else { "stopped early" }
        );
    });
    world.flush();

    let targets: Vec<Entity> = (0..cli.targets)
        .map(|_| world.spawn(Rotation::default()).id())
        .collect();

    let mut builder = AnimationBuilder::from_settings(&settings).with_targets(targets.iter().copied());
    if let Some(duration) = cli.duration {
        builder = builder.with_duration(duration);
    }
    if let Some(delay) = cli.delay {
        builder = builder.with_delay(delay);
    }
    if let Some(times) = cli.times {
        builder = builder.with_repeat(times);
    }
    world.insert_resource(settings);

    let animation = builder.rotate(&mut world, cli.start, cli.end);
    info!(
        "Rotating {} target(s) from {} to {} over {}s ({:?}, delay {}s)",
        targets.len(),
        cli.start,
        cli.end,
        builder.duration(),
        builder.times(),
        builder.delay()
    );

    let mut script: Vec<(f32, DevCommand)> = [
        cli.pause_at.map(|t| (t, DevCommand::Pause)),
        cli.resume_at.map(|t| (t, DevCommand::Resume)),
        cli.finish_at.map(|t| (t, DevCommand::Finish)),
    ]
    .into_iter()
    .flatten()
    .collect();
    script.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut script = script.into_iter().peekable();

    let console = cli.interactive.then(spawn_console_reader);

    let mut schedule = Schedule::default();
    schedule.add_systems(rotation_animation_system);

    world.trigger(AnimationControlEvent {
        animation,
        command: AnimationCommand::Play,
    });

    // --------------- Main loop ---------------
    'frames: while world.resource::<WorldTime>().frame_count < cli.frames {
        if let Some(rx) = &console {
            for cmd in rx.try_iter() {
                if !apply_command(&mut world, animation, cmd) {
                    break 'frames;
                }
            }
        }

        update_world_time(&mut world, frame_delta);
        let now = world.resource::<WorldTime>().elapsed;
        while let Some((_, cmd)) = script.next_if(|(at, _)| now >= *at) {
            apply_command(&mut world, animation, cmd);
        }

        schedule.run(&mut world);

        if let Some(&first) = targets.first() {
            if let Some(rotation) = world.get::<Rotation>(first) {
                debug!("t={:.3}s rotation={:.3}", now, rotation.degrees);
            }
        }

        let finished = world
            .get::<RotationAnimation>(animation)
            .is_none_or(|a| a.is_finished());
        if finished {
            break;
        }
        if cli.interactive {
            std::thread::sleep(Duration::from_secs_f32(frame_delta));
        }
    }

    let world_time = *world.resource::<WorldTime>();
    let report = RunReport {
        frames: world_time.frame_count,
        elapsed: world_time.elapsed,
        animation: world.get::<RotationAnimation>(animation).map(|a| a.report()),
        target_degrees: targets
            .iter()
            .filter_map(|t| world.get::<Rotation>(*t).map(|r| r.degrees))
            .collect(),
    };

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Failed to serialize report: {}", e),
        }
    } else {
        println!("frames: {}, elapsed: {:.3}s", report.frames, report.elapsed);
        if let Some(a) = &report.animation {
            println!(
                "state: {:?}, value: {:.3}, cycle: {}, bound targets: {}",
                a.state, a.value, a.cycle, a.bound_targets
            );
        }
        for (i, degrees) in report.target_degrees.iter().enumerate() {
            println!("target {}: {:.3} degrees", i, degrees);
        }
    }
}

//! Animation and clock settings resource.
//!
//! Loaded from an INI file. Every key is optional; missing keys keep the
//! defaults below so the host can always start.
//!
//! # Configuration File Format
//!
//! ```ini
//! [time]
//! time_scale = 1.0
//! frame_delta = 0.016666
//!
//! [animation]
//! delay = 0.0
//! duration = 1.0
//! ; a positive count or "indefinite"
//! times = 1
//! ```

use crate::components::timeline::RepeatCount;
use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::{info, warn};
use std::path::PathBuf;

const DEFAULT_TIME_SCALE: f32 = 1.0;
const DEFAULT_FRAME_DELTA: f32 = 1.0 / 60.0;
const DEFAULT_DELAY: f32 = 0.0;
const DEFAULT_DURATION: f32 = 1.0;
const DEFAULT_CONFIG_PATH: &str = "./rotanim.ini";
const INDEFINITE: &str = "indefinite";

#[derive(Resource, Debug, Clone)]
pub struct AnimationSettings {
    /// Multiplier applied to every frame delta.
    pub time_scale: f32,
    /// Fixed step, in seconds, used by the headless host loop.
    pub frame_delta: f32,
    /// Default start delay for new animations, in seconds.
    pub delay: f32,
    /// Default length of one cycle, in seconds.
    pub duration: f32,
    /// Default repeat count.
    pub times: RepeatCount,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationSettings {
    pub fn new() -> Self {
        Self {
            time_scale: DEFAULT_TIME_SCALE,
            frame_delta: DEFAULT_FRAME_DELTA,
            delay: DEFAULT_DELAY,
            duration: DEFAULT_DURATION,
            times: RepeatCount::default(),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load settings from the INI file at `config_path`.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;
        self.apply(&config);
        Ok(())
    }

    /// Load settings from INI text.
    pub fn load_from_str(&mut self, text: &str) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .read(text.to_string())
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        self.apply(&config);
        Ok(())
    }

    fn apply(&mut self, config: &Ini) {
        // [time] section
        if let Some(scale) = finite_float(config, "time", "time_scale") {
            self.time_scale = scale.max(0.0);
        }
        if let Some(delta) = finite_float(config, "time", "frame_delta") {
            if delta > 0.0 {
                self.frame_delta = delta;
            } else {
                warn!("Ignoring non-positive frame_delta {}", delta);
            }
        }

        // [animation] section
        if let Some(delay) = finite_float(config, "animation", "delay") {
            self.delay = delay.max(0.0);
        }
        if let Some(duration) = finite_float(config, "animation", "duration") {
            self.duration = duration.max(0.0);
        }
        if let Some(times) = config.get("animation", "times") {
            match parse_times(&times) {
                Some(times) => self.times = times,
                None => warn!("Ignoring invalid times value '{}'", times),
            }
        }

        info!(
            "Loaded settings: time_scale={}, frame_delta={}, delay={}, duration={}, times={:?}",
            self.time_scale, self.frame_delta, self.delay, self.duration, self.times
        );
    }

    /// Save settings to the INI file at `config_path`.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        config.set("time", "time_scale", Some(self.time_scale.to_string()));
        config.set("time", "frame_delta", Some(self.frame_delta.to_string()));

        config.set("animation", "delay", Some(self.delay.to_string()));
        config.set("animation", "duration", Some(self.duration.to_string()));
        config.set("animation", "times", Some(format_times(self.times)));

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved settings to {:?}", self.config_path);

        Ok(())
    }
}

/// Read `section.key` as a float that is finite once narrowed to `f32`.
fn finite_float(config: &Ini, section: &str, key: &str) -> Option<f32> {
    let value = config.getfloat(section, key).ok().flatten()? as f32;
    if value.is_finite() {
        Some(value)
    } else {
        warn!("Ignoring non-finite {} value {}", key, value);
        None
    }
}

/// Parse a repeat count: a positive integer or `indefinite`.
pub fn parse_times(value: &str) -> Option<RepeatCount> {
    let value = value.trim();
    if value.eq_ignore_ascii_case(INDEFINITE) {
        return Some(RepeatCount::Indefinite);
    }
    match value.parse::<u32>() {
        Ok(0) | Err(_) => None,
        Ok(n) => Some(RepeatCount::Times(n)),
    }
}

fn format_times(times: RepeatCount) -> String {
    match times {
        RepeatCount::Times(n) => n.to_string(),
        RepeatCount::Indefinite => INDEFINITE.to_string(),
    }
}

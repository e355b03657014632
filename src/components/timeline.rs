//! Keyframed value timeline.
//!
//! A [`Timeline`] maps elapsed playback time to a single `f32` value. It holds
//! a short list of [`KeyFrame`]s, an optional start delay and a
//! [`RepeatCount`]. Time only moves when the owner calls [`Timeline::tick`]
//! from the frame loop; there is no internal clock.
//!
//! # Interpolation
//!
//! The value at `t = 0` of every cycle is the value captured by
//! [`Timeline::play`] when playback starts from [`TimelineStatus::Stopped`].
//! Between keyframes the value is interpolated linearly. A keyframe placed at
//! `t = 0` overrides the captured value.
//!
//! # Delay and repeats
//!
//! The delay is waited out once, before the first cycle. Each further cycle
//! restarts from the captured value. [`RepeatCount::Indefinite`] never
//! completes; its position is wrapped back into the current cycle on every
//! tick so long runs keep full precision.
//!
//! Playback time is accumulated in `f64`. A finite timeline completes once
//! the accumulated time is within a few `f32` ulps of its total length, so a
//! run of rounded frame steps such as `1.0 / 60.0` ends on the expected frame.

use arrayvec::ArrayVec;
use log::warn;
use serde::{Deserialize, Serialize};

/// Maximum number of keyframes a timeline can hold.
pub const MAX_KEYFRAMES: usize = 4;

/// Relative slack allowed when deciding that the last cycle has ended.
const COMPLETION_TOLERANCE: f64 = 4.0 * f32::EPSILON as f64;

/// How many cycles a timeline plays before completing.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepeatCount {
    /// Play this many cycles (always at least one).
    Times(u32),
    /// Cycle until stopped.
    Indefinite,
}

impl RepeatCount {
    /// Finite repeat count, raised to one if zero.
    pub fn times(n: u32) -> Self {
        if n == 0 {
            warn!("Repeat count of 0 is not allowed, using 1");
        }
        RepeatCount::Times(n.max(1))
    }

    /// Number of cycles, or `None` when indefinite.
    pub fn cycles(&self) -> Option<u32> {
        match self {
            RepeatCount::Times(n) => Some((*n).max(1)),
            RepeatCount::Indefinite => None,
        }
    }
}

impl Default for RepeatCount {
    fn default() -> Self {
        RepeatCount::Times(1)
    }
}

/// Target value reached at `time` seconds into a cycle.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct KeyFrame {
    pub time: f32,
    pub value: f32,
}

impl KeyFrame {
    pub fn new(time: f32, value: f32) -> Self {
        KeyFrame {
            time: time.max(0.0),
            value,
        }
    }
}

/// Playback status of a [`Timeline`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum TimelineStatus {
    #[default]
    Stopped,
    Running,
    Paused,
}

/// Result of advancing a timeline by one frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TimelineTick {
    /// Not running; nothing changed.
    Idle,
    /// Still inside the start delay.
    Delayed,
    /// Playback moved; carries the new value.
    Advanced(f32),
    /// The last cycle ended on this frame; carries the final value.
    Completed(f32),
}

#[derive(Clone, Debug)]
pub struct Timeline {
    delay: f32,
    repeat: RepeatCount,
    keyframes: ArrayVec<KeyFrame, MAX_KEYFRAMES>,
    status: TimelineStatus,
    /// Seconds accumulated since the last start from stopped, delay included.
    /// Indefinite timelines keep this inside the current cycle.
    position: f64,
    /// Whole cycles dropped from `position` by wrapping.
    wrapped_cycles: u64,
    /// Value captured when playback last started from stopped.
    origin: f32,
}

impl Timeline {
    pub fn new(delay: f32, repeat: RepeatCount) -> Self {
        Timeline {
            delay: delay.max(0.0),
            repeat,
            keyframes: ArrayVec::new(),
            status: TimelineStatus::Stopped,
            position: 0.0,
            wrapped_cycles: 0,
            origin: 0.0,
        }
    }

    /// Insert a keyframe, keeping the list ordered by time.
    ///
    /// Returns `false` if the timeline is already full.
    pub fn add_keyframe(&mut self, frame: KeyFrame) -> bool {
        if self.keyframes.is_full() {
            warn!(
                "Timeline already holds {} keyframes, dropping {:?}",
                MAX_KEYFRAMES, frame
            );
            return false;
        }
        let idx = self
            .keyframes
            .iter()
            .position(|k| k.time > frame.time)
            .unwrap_or(self.keyframes.len());
        self.keyframes.insert(idx, frame);
        true
    }

    pub fn clear_keyframes(&mut self) {
        self.keyframes.clear();
    }

    pub fn keyframes(&self) -> &[KeyFrame] {
        &self.keyframes
    }

    pub fn delay(&self) -> f32 {
        self.delay
    }

    pub fn repeat(&self) -> RepeatCount {
        self.repeat
    }

    pub fn status(&self) -> TimelineStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == TimelineStatus::Running
    }

    /// Length of one cycle: the time of the last keyframe.
    pub fn cycle_duration(&self) -> f32 {
        self.keyframes.last().map(|k| k.time).unwrap_or(0.0)
    }

    /// Length of all cycles, or `None` when repeating indefinitely.
    pub fn total_duration(&self) -> Option<f32> {
        self.repeat
            .cycles()
            .map(|n| self.cycle_duration() * n as f32)
    }

    /// Playback time after the delay, across all cycles.
    pub fn elapsed(&self) -> f32 {
        let wrapped = self.wrapped_cycles as f64 * f64::from(self.cycle_duration());
        (wrapped + self.played()) as f32
    }

    /// Playback time after the delay within the unwrapped part of `position`.
    fn played(&self) -> f64 {
        (self.position - f64::from(self.delay)).max(0.0)
    }

    /// Zero-based index of the cycle currently playing.
    pub fn current_cycle(&self) -> u32 {
        let cycle = self.cycle_duration();
        if cycle <= 0.0 {
            return 0;
        }
        let index = self.wrapped_cycles + (self.played() / f64::from(cycle)) as u64;
        match self.repeat.cycles() {
            Some(n) => index.min(u64::from(n - 1)) as u32,
            None => index.min(u64::from(u32::MAX)) as u32,
        }
    }

    /// Start or resume playback.
    ///
    /// Starting from stopped rewinds to the beginning of the delay and
    /// captures `current` as the value at `t = 0`. Resuming from paused keeps
    /// the position. Playing while already running does nothing.
    pub fn play(&mut self, current: f32) {
        if self.status == TimelineStatus::Stopped {
            self.position = 0.0;
            self.wrapped_cycles = 0;
            self.origin = current;
        }
        self.status = TimelineStatus::Running;
    }

    pub fn pause(&mut self) {
        if self.status == TimelineStatus::Running {
            self.status = TimelineStatus::Paused;
        }
    }

    /// Stop playback and rewind. The last produced value is left untouched.
    pub fn stop(&mut self) {
        self.status = TimelineStatus::Stopped;
        self.position = 0.0;
        self.wrapped_cycles = 0;
    }

    /// Value at `t` seconds into a cycle.
    pub fn sample(&self, t: f32) -> f32 {
        let mut prev = KeyFrame::new(0.0, self.origin);
        for frame in &self.keyframes {
            if t < frame.time {
                let span = frame.time - prev.time;
                if span <= 0.0 {
                    return frame.value;
                }
                let f = ((t - prev.time) / span).clamp(0.0, 1.0);
                return prev.value + (frame.value - prev.value) * f;
            }
            prev = *frame;
        }
        prev.value
    }

    /// Advance playback by `dt` seconds.
    pub fn tick(&mut self, dt: f32) -> TimelineTick {
        if self.status != TimelineStatus::Running {
            return TimelineTick::Idle;
        }
        self.position += f64::from(dt.max(0.0));
        let delay = f64::from(self.delay);
        if self.position < delay {
            return TimelineTick::Delayed;
        }

        let played = self.position - delay;
        let cycle = self.cycle_duration();
        if let Some(total) = self.total_duration() {
            let total = f64::from(total);
            if played >= total - total * COMPLETION_TOLERANCE {
                self.status = TimelineStatus::Stopped;
                self.position = delay + total;
                return TimelineTick::Completed(self.sample(cycle));
            }
        }

        if cycle <= 0.0 {
            return TimelineTick::Advanced(self.sample(cycle));
        }
        let cycle = f64::from(cycle);
        let t = played % cycle;
        if self.repeat == RepeatCount::Indefinite && played >= cycle {
            self.wrapped_cycles = self
                .wrapped_cycles
                .saturating_add((played / cycle) as u64);
            self.position = delay + t;
        }
        TimelineTick::Advanced(self.sample(t as f32))
    }
}

//! ECS resources made available to systems.
//!
//! Overview
//! - `animationsettings` – clock and animation defaults loaded from INI
//! - `eventbus` – subscription registry for global pause/resume signals
//! - `worldtime` – simulation time and delta
pub mod animationsettings;
pub mod eventbus;
pub mod worldtime;

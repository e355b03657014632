//! Event types and observers.
//!
//! Submodules:
//! - [`animation`] – per-animation control requests and completion notices
//! - [`globalsignal`] – world-wide pause/resume broadcast delivered through
//!   the [`EventBus`](crate::resources::eventbus::EventBus)
pub mod animation;
pub mod globalsignal;

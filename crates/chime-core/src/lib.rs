//! Chime Core - Scene time for the chime audio helper
//!
//! This crate provides:
//! - The per-frame scene clock
//! - The delayed-call timer used to schedule playback steps

pub mod time;

pub use time::{ClockConfig, Fired, SceneClock, Timer, MAX_TIME_SCALE};

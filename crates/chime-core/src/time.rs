//! Scene time for the chime audio helper
//!
//! Provides the per-frame scene clock and the delayed-call timer the host drives
//! from its update loop.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the scene clock
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// How many scene seconds pass per real second
    #[serde(deserialize_with = "finite_scale")]
    pub time_scale: f32,
    /// Maximum frame delta, longer frames are clamped to this
    #[serde(with = "secs_f32")]
    pub max_delta: Duration,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            max_delta: Duration::from_millis(250),
        }
    }
}

/// Upper bound for the time scale. Larger scales, including infinity, are clamped to it.
pub const MAX_TIME_SCALE: f32 = 100.0;

/// Clamp a time scale into `0.0..=MAX_TIME_SCALE`. NaN freezes the clock.
fn sanitize_scale(scale: f32) -> f32 {
    if scale.is_nan() {
        0.0
    } else {
        scale.clamp(0.0, MAX_TIME_SCALE)
    }
}

fn finite_scale<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
    let scale = f32::deserialize(deserializer)?;
    if !scale.is_finite() {
        return Err(serde::de::Error::custom(format!(
            "time_scale must be finite, got {}",
            scale
        )));
    }
    Ok(sanitize_scale(scale))
}

mod secs_f32 {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f32(value.as_secs_f32())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f32::deserialize(deserializer)?;
        Duration::try_from_secs_f32(secs.max(0.0)).map_err(serde::de::Error::custom)
    }
}

/// Frame clock for a scene
#[derive(Debug, Clone, Default)]
pub struct SceneClock {
    /// Configuration
    pub config: ClockConfig,
    /// Scene time since the clock started
    pub total: Duration,
    /// Delta for this frame (clamped and scaled)
    pub delta: Duration,
    /// Frame counter
    pub frame_count: u64,
    /// Whether the scene is paused
    pub paused: bool,
}

impl SceneClock {
    pub fn new(config: ClockConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Update the clock with the raw delta from the previous frame
    pub fn update(&mut self, raw_delta: Duration) {
        let clamped = raw_delta.min(self.config.max_delta);
        self.frame_count += 1;

        if self.paused {
            self.delta = Duration::ZERO;
            return;
        }

        let nanos = clamped.as_nanos() as f64 * sanitize_scale(self.config.time_scale) as f64;
        self.delta = if nanos >= u64::MAX as f64 {
            Duration::MAX
        } else {
            Duration::from_nanos(nanos.round() as u64)
        };
        self.total = self.total.saturating_add(self.delta);
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Set the time scale (0.0 = frozen, 1.0 = normal, 2.0 = double speed)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.config.time_scale = sanitize_scale(scale);
    }
}

/// An entry popped from a [`Timer`] once its due time has been reached.
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<T> {
    /// The scene time the entry was scheduled for
    pub due: Duration,
    pub payload: T,
}

struct Entry<T> {
    due: Duration,
    seq: u64,
    payload: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due
            .cmp(&other.due)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Delayed-call queue advanced by the scene's frame loop.
///
/// Entries become due once the timer's clock reaches their due time. Entries with
/// the same due time pop in the order they were scheduled.
pub struct Timer<T> {
    now: Duration,
    next_seq: u64,
    pending: BinaryHeap<Reverse<Entry<T>>>,
}

impl<T> Timer<T> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            pending: BinaryHeap::new(),
        }
    }

    /// Current timer time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Schedule `payload` to become due `delay` from now. Returns the due time.
    pub fn schedule(&mut self, delay: Duration, payload: T) -> Duration {
        let due = self.now.saturating_add(delay);
        self.schedule_at(due, payload);
        due
    }

    /// Schedule `payload` at an absolute timer time. A time in the past is due immediately.
    pub fn schedule_at(&mut self, due: Duration, payload: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Reverse(Entry { due, seq, payload }));
    }

    /// Move the clock forward. Due entries are collected with [`Timer::pop_due`].
    pub fn advance(&mut self, delta: Duration) {
        self.now = self.now.saturating_add(delta);
    }

    /// Pop the earliest entry whose due time has been reached.
    pub fn pop_due(&mut self) -> Option<Fired<T>> {
        let due = self.pending.peek().map(|Reverse(entry)| entry.due)?;
        if due > self.now {
            return None;
        }
        self.pending.pop().map(|Reverse(entry)| Fired {
            due: entry.due,
            payload: entry.payload,
        })
    }

    /// Drop every pending entry matching the predicate. Returns how many were removed.
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> usize {
        let before = self.pending.len();
        self.pending.retain(|Reverse(entry)| !pred(&entry.payload));
        before - self.pending.len()
    }

    /// Whether any pending entry matches the predicate.
    pub fn any_pending(&self, mut pred: impl FnMut(&T) -> bool) -> bool {
        self.pending.iter().any(|Reverse(entry)| pred(&entry.payload))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop all pending entries. The clock keeps its current time.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

impl<T> Default for Timer<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn clock_update() {
        let mut clock = SceneClock::default();
        clock.update(ms(16));

        assert_eq!(clock.delta, ms(16));
        assert_eq!(clock.frame_count, 1);

        clock.pause();
        clock.update(ms(16));
        assert_eq!(clock.delta, Duration::ZERO);
        assert_eq!(clock.total, ms(16));
        assert_eq!(clock.frame_count, 2);
    }

    #[test]
    fn clock_clamps_long_frames() {
        let mut clock = SceneClock::default();
        clock.update(Duration::from_secs(3));
        assert_eq!(clock.delta, ms(250));
    }

    #[test]
    fn clock_time_scale() {
        let mut clock = SceneClock::default();
        clock.set_time_scale(2.0);
        clock.update(ms(10));
        assert_eq!(clock.delta, ms(20));

        clock.set_time_scale(-1.0);
        assert_eq!(clock.config.time_scale, 0.0);
    }

    #[test]
    fn clock_survives_extreme_scales() {
        let mut clock = SceneClock::new(ClockConfig {
            time_scale: f32::INFINITY,
            ..Default::default()
        });
        clock.update(ms(16));
        assert_eq!(clock.delta, ms(1600));

        clock.config.time_scale = f32::NAN;
        clock.update(ms(16));
        assert_eq!(clock.delta, Duration::ZERO);

        clock.set_time_scale(f32::INFINITY);
        assert_eq!(clock.config.time_scale, MAX_TIME_SCALE);

        clock.config.max_delta = Duration::MAX;
        clock.update(Duration::MAX);
        assert_eq!(clock.delta, Duration::MAX);
        clock.update(ms(16));
        assert_eq!(clock.total, Duration::MAX);
    }

    #[derive(Debug, Deserialize)]
    struct Wrapper {
        clock: ClockConfig,
    }

    #[test]
    fn config_rejects_unrepresentable_values() {
        assert!(toml::from_str::<Wrapper>("[clock]\nmax_delta = inf\n").is_err());
        assert!(toml::from_str::<Wrapper>("[clock]\nmax_delta = 1e30\n").is_err());
        assert!(toml::from_str::<Wrapper>("[clock]\ntime_scale = inf\n").is_err());
        assert!(toml::from_str::<Wrapper>("[clock]\ntime_scale = nan\n").is_err());
    }

    #[test]
    fn config_clamps_scale_and_delta() {
        let wrapper: Wrapper =
            toml::from_str("[clock]\ntime_scale = 1000.0\nmax_delta = -1.0\n").unwrap();
        assert_eq!(wrapper.clock.time_scale, MAX_TIME_SCALE);
        assert_eq!(wrapper.clock.max_delta, Duration::ZERO);
    }

    #[test]
    fn timer_saturates_far_deadlines() {
        let mut timer = Timer::new();
        timer.advance(ms(10));
        assert_eq!(timer.schedule(Duration::MAX, "never"), Duration::MAX);
        timer.advance(Duration::MAX);
        assert_eq!(timer.now(), Duration::MAX);
        assert_eq!(timer.pop_due().unwrap().payload, "never");
    }

    #[test]
    fn timer_fires_in_due_order() {
        let mut timer = Timer::new();
        timer.schedule(ms(300), "late");
        timer.schedule(ms(100), "early");
        timer.schedule(ms(100), "early-second");

        timer.advance(ms(99));
        assert!(timer.pop_due().is_none());

        timer.advance(ms(1));
        assert_eq!(timer.pop_due().unwrap().payload, "early");
        assert_eq!(timer.pop_due().unwrap().payload, "early-second");
        assert!(timer.pop_due().is_none());

        timer.advance(ms(500));
        let fired = timer.pop_due().unwrap();
        assert_eq!(fired.payload, "late");
        assert_eq!(fired.due, ms(300));
        assert!(timer.is_empty());
    }

    #[test]
    fn timer_reschedule_from_due_time() {
        let mut timer = Timer::new();
        timer.schedule(ms(200), 1);
        timer.advance(ms(1000));

        let fired = timer.pop_due().unwrap();
        timer.schedule_at(fired.due + ms(200), 2);
        assert_eq!(timer.pop_due().unwrap().due, ms(400));
    }

    #[test]
    fn timer_cancel_where() {
        let mut timer = Timer::new();
        timer.schedule(ms(10), 1);
        timer.schedule(ms(20), 2);
        timer.schedule(ms(30), 1);

        assert!(timer.any_pending(|v| *v == 1));
        assert_eq!(timer.cancel_where(|v| *v == 1), 2);
        assert!(!timer.any_pending(|v| *v == 1));
        assert_eq!(timer.len(), 1);
    }
}

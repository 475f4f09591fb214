//! Time utilities for the client simulation

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Tick rate configuration
pub const DEFAULT_TICK_RATE: u32 = 30; // 30 ticks per second

/// How long a locally built action may wait in a queue before it is
/// force-completed
pub const DEFAULT_ACTION_EXPIRATION_SECS: i64 = 10;

/// Duration of a single step between neighboring cells
pub const MOVE_DURATION_S: f32 = 0.2;

/// Duration of a 60° turn
pub const TURN_DURATION_S: f32 = 0.2;

/// Wall time between ticks at `tick_rate` ticks per second
pub fn tick_interval(tick_rate: u32) -> Duration {
    Duration::from_micros(1_000_000 / tick_rate.max(1) as u64)
}

/// Expiration for an action built at `now`
pub fn default_expiration(now: DateTime<Utc>) -> DateTime<Utc> {
    now + chrono::Duration::seconds(DEFAULT_ACTION_EXPIRATION_SECS)
}

/// Seconds from `from` to `to`, negative if `to` is earlier
pub fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f32 {
    match (to - from).num_microseconds() {
        Some(micros) => micros as f32 / 1_000_000.0,
        None if to > from => f32::MAX,
        None => f32::MIN,
    }
}

//! # Jitter for retry delays.
//!
//! When many tasks in one batch fail together (a shared dependency goes down),
//! identical backoff makes them retry in lockstep. [`JitterPolicy`] spreads them out.
//!
//! - [`JitterPolicy::None`] exact delay
//! - [`JitterPolicy::Full`] uniform in `[0, delay]`
//! - [`JitterPolicy::Equal`] `delay/2 + uniform[0, delay/2]`
//! - [`JitterPolicy::Decorrelated`] uniform in `[base, prev * 3]`, capped

use rand::Rng;
use std::time::Duration;

/// Randomization applied to a computed backoff delay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// Use the delay as computed.
    #[default]
    None,
    /// Uniform in `[0, delay]`.
    Full,
    /// Half the delay plus uniform in `[0, delay/2]`.
    Equal,
    /// Uniform in `[base, prev * 3]`, capped at `max`.
    ///
    /// Needs extra context, see [`apply_decorrelated`](Self::apply_decorrelated).
    Decorrelated,
}

impl JitterPolicy {
    /// Applies jitter to `delay`.
    ///
    /// `Decorrelated` returns `delay` unchanged here.
    pub fn apply(&self, delay: Duration) -> Duration {
        match self {
            JitterPolicy::None | JitterPolicy::Decorrelated => delay,
            JitterPolicy::Full => uniform_ms(0, millis_u64(delay)),
            JitterPolicy::Equal => {
                let half = millis_u64(delay) / 2;
                Duration::from_millis(half) + uniform_ms(0, half)
            }
        }
    }

    /// Decorrelated jitter: uniform in `[base, min(prev * 3, max)]`.
    ///
    /// Other variants fall back to [`apply`](Self::apply) on `prev`.
    pub fn apply_decorrelated(&self, base: Duration, prev: Duration, max: Duration) -> Duration {
        if !matches!(self, JitterPolicy::Decorrelated) {
            return self.apply(prev);
        }
        let base_ms = millis_u64(base);
        let upper = millis_u64(prev)
            .saturating_mul(3)
            .min(millis_u64(max))
            .max(base_ms);

        if base_ms >= upper {
            return base;
        }
        uniform_ms(base_ms, upper)
    }
}

fn millis_u64(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn uniform_ms(lo: u64, hi: u64) -> Duration {
    if hi <= lo {
        return Duration::from_millis(lo);
    }
    Duration::from_millis(rand::rng().random_range(lo..=hi))
}

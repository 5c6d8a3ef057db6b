//! Iteration timing for the batch progress bar (feature `progress`).
//!
//! [`IterTimer`] keeps an exponential moving average of the loop period,
//! `ema ← α·dt + (1–α)·ema`, seeded with the first sample. [`fmt_dur`] renders a
//! [`Duration`] as `"253µs"`, `"42ms"` or `"3.14s"`.
use std::time::{Duration, Instant};

pub(crate) struct IterTimer {
    last: Instant,
    ema_ns: f64,
    alpha: f64,
    count: u64,
}

impl IterTimer {
    /// `alpha ∈ (0, 1]`; `1.0` disables smoothing.
    pub(crate) fn new(alpha: f64) -> Self {
        Self {
            last: Instant::now(),
            ema_ns: 0.0,
            alpha,
            count: 0,
        }
    }

    /// Close the current iteration and return its duration.
    #[inline]
    pub(crate) fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let dt = now.duration_since(self.last);
        self.last = now;
        self.count += 1;

        let dt_ns = dt.as_nanos() as f64;
        self.ema_ns = if self.count == 1 {
            dt_ns
        } else {
            self.alpha * dt_ns + (1.0 - self.alpha) * self.ema_ns
        };
        dt
    }

    #[inline]
    pub(crate) fn avg(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(self.ema_ns as u64)
        }
    }
}

#[inline]
pub(crate) fn fmt_dur(d: Duration) -> String {
    let us = d.as_micros();
    if us < 1_000 {
        return format!("{us}µs");
    }
    let ms = d.as_millis();
    if ms < 1_000 {
        format!("{ms}ms")
    } else {
        format!("{:.2}s", d.as_secs_f32())
    }
}

#[cfg(test)]
mod progress_bar_test {
    use super::*;

    #[test]
    fn test_fmt_dur() {
        assert_eq!(fmt_dur(Duration::from_micros(253)), "253µs");
        assert_eq!(fmt_dur(Duration::from_millis(42)), "42ms");
        assert_eq!(fmt_dur(Duration::from_millis(3140)), "3.14s");
    }

    #[test]
    fn test_timer_counts() {
        let mut timer = IterTimer::new(0.5);
        assert_eq!(timer.avg(), Duration::ZERO);
        let first = timer.tick();
        assert_eq!(timer.avg().as_nanos(), first.as_nanos());
    }
}

use std::time::Duration;

use crate::error::{EngineError, Result};

use super::{FrameClock, FramePacer, FrameTime};

/// Scheduler tuning shared by a window's cadences.
#[derive(Debug, Clone)]
pub struct PacingConfig {
    /// Granularity of the sleep primitive.
    pub sleep_unit: Duration,
    /// Update ticks allowed per loop iteration before the schedule is
    /// resynced to the current time.
    pub max_catch_up: u32,
    /// Lower clamp for reported deltas. Never above one cadence interval.
    pub dt_min: Duration,
    /// Upper clamp for reported deltas. Never below one cadence interval.
    pub dt_max: Duration,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            sleep_unit: Duration::from_millis(1),
            max_catch_up: 5,
            dt_min: Duration::from_micros(100),
            dt_max: Duration::from_millis(250),
        }
    }
}

/// One fixed-rate schedule (draw or update) with its own pacer and clock.
///
/// Due times are absolute, so oversleeping one tick shortens the wait for
/// the next instead of shifting the whole schedule.
#[derive(Debug, Clone)]
pub struct Cadence {
    name: &'static str,
    interval: Duration,
    next_due: Duration,
    pacer: FramePacer,
    clock: FrameClock,
}

impl Cadence {
    /// Schedule of `rate` ticks per second, first tick due one interval
    /// after `start`.
    pub fn new(name: &'static str, rate: f64, start: Duration, config: &PacingConfig) -> Result<Self> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(EngineError::InvalidRate { name, rate });
        }
        let interval = Duration::try_from_secs_f64(1.0 / rate)
            .map_err(|_| EngineError::InvalidRate { name, rate })?
            .max(Duration::from_nanos(1));

        Ok(Self {
            name,
            interval,
            next_due: start + interval,
            pacer: FramePacer::new(config.sleep_unit),
            clock: FrameClock::with_clamps(
                start,
                config.dt_min.min(interval),
                config.dt_max.max(interval),
            ),
        })
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[inline]
    pub fn next_due(&self) -> Duration {
        self.next_due
    }

    #[inline]
    pub fn is_due(&self, now: Duration) -> bool {
        now >= self.next_due
    }

    /// Consumes the due tick. The reported delta is measured between
    /// scheduled times, so catch-up ticks each see one interval.
    pub fn tick(&mut self) -> FrameTime {
        let ft = self.clock.tick(self.next_due);
        self.next_due += self.interval;
        ft
    }

    /// Like [`tick`](Self::tick) but measures the delta up to `now`.
    pub fn tick_at(&mut self, now: Duration) -> FrameTime {
        let ft = self.clock.tick(now);
        self.next_due += self.interval;
        ft
    }

    /// Drops missed ticks: the next one is due one interval after `now`.
    pub fn resync(&mut self, now: Duration) {
        self.next_due = now + self.interval;
    }

    /// Index the next tick will report.
    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.clock.frame_index()
    }

    #[inline]
    pub fn pacer_mut(&mut self) -> &mut FramePacer {
        &mut self.pacer
    }
}

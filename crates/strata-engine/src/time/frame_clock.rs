use std::time::Duration;

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTime {
    /// Time elapsed since the previous tick, in seconds.
    pub dt: f32,

    /// Timer timestamp the tick was taken at.
    pub now: Duration,

    /// Monotonic tick counter.
    pub frame_index: u64,
}

/// Clock producing `FrameTime` snapshots for one cadence.
///
/// Each cadence owns its clock so draw and update deltas never share state.
///
/// Delta time is clamped to avoid pathological values when the loop is paused
/// by the debugger or stalls.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Duration,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    /// Creates a clock starting at `start` with default clamps
    /// (100µs..250ms).
    pub fn new(start: Duration) -> Self {
        Self::with_clamps(start, Duration::from_micros(100), Duration::from_millis(250))
    }

    /// Creates a clock with custom delta-time clamps.
    pub fn with_clamps(start: Duration, dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: start,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Advances the clock to `now` and returns a new `FrameTime`.
    pub fn tick(&mut self, now: Duration) -> FrameTime {
        let dt = now.saturating_sub(self.last).clamp(self.dt_min, self.dt_max);
        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

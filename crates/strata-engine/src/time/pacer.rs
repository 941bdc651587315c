use std::time::Duration;

use super::Timer;

/// Drift-corrected sleeper for a coarse sleep primitive.
///
/// Requests are converted to whole primitive units; the fractional remainder
/// accumulates in `skew` and is paid out as an extra unit once it reaches 1.
/// Over any number of calls, requested and slept totals differ by less than
/// one unit.
#[derive(Debug, Clone)]
pub struct FramePacer {
    unit_ns: u64,
    skew: f64,

    requested_ns: u128,
    slept_units: u64,
}

impl FramePacer {
    /// Pacer for a primitive that sleeps in multiples of `unit`.
    pub fn new(unit: Duration) -> Self {
        Self {
            unit_ns: (unit.as_nanos() as u64).max(1),
            skew: 0.0,
            requested_ns: 0,
            slept_units: 0,
        }
    }

    #[inline]
    pub fn unit(&self) -> Duration {
        Duration::from_nanos(self.unit_ns)
    }

    /// Banked fraction of a unit, always in `[0, 1)`.
    #[inline]
    pub fn skew(&self) -> f64 {
        self.skew
    }

    /// Total nanoseconds requested so far.
    pub fn requested_ns(&self) -> u128 {
        self.requested_ns
    }

    /// Total units handed to the primitive so far.
    pub fn slept_units(&self) -> u64 {
        self.slept_units
    }

    /// Number of whole units to sleep for a request of `ns` nanoseconds.
    pub fn plan(&mut self, ns: u64) -> u64 {
        let mut whole = ns / self.unit_ns;
        self.skew += ns as f64 / self.unit_ns as f64 - whole as f64;
        if self.skew >= 1.0 {
            let extra = self.skew.floor();
            whole += extra as u64;
            self.skew -= extra;
        }

        self.requested_ns += ns as u128;
        self.slept_units += whole;
        whole
    }

    /// Sleeps for `duration` through `timer`, skipping the call entirely when
    /// no whole unit is due yet. Returns the units slept.
    pub fn sleep(&mut self, duration: Duration, timer: &mut dyn Timer) -> u64 {
        let ns = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        let units = self.plan(ns);
        if units > 0 {
            timer.sleep(Duration::from_nanos(units.saturating_mul(self.unit_ns)));
        }
        units
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ManualTimer;

    #[test]
    fn fractional_requests_converge() {
        let mut p = FramePacer::new(Duration::from_millis(1));
        let mut prev = 0;
        for n in 1..=1000u64 {
            let units = p.plan(300_000);
            assert!(units <= 1, "call {n} slept {units} units");
            prev += units;
            let expected = (0.3 * n as f64).round() as i64;
            assert!((prev as i64 - expected).abs() <= 1, "call {n}: {prev} vs {expected}");
            assert!((0.0..1.0).contains(&p.skew()));
        }
    }

    #[test]
    fn first_small_requests_do_not_sleep() {
        let mut p = FramePacer::new(Duration::from_millis(1));
        assert_eq!(p.plan(300_000), 0);
        assert_eq!(p.plan(300_000), 0);
        assert_eq!(p.plan(300_000), 0);
        assert_eq!(p.plan(300_000), 1);
    }

    #[test]
    fn whole_units_pass_straight_through() {
        let mut p = FramePacer::new(Duration::from_millis(1));
        assert_eq!(p.plan(16_000_000), 16);
        assert_eq!(p.skew(), 0.0);
    }

    #[test]
    fn totals_stay_within_one_unit() {
        let mut p = FramePacer::new(Duration::from_millis(1));
        for _ in 0..500 {
            p.plan(16_666_667);
        }
        let requested_units = p.requested_ns() as f64 / 1_000_000.0;
        assert!((requested_units - p.slept_units() as f64).abs() < 1.0);
    }

    #[test]
    fn sleep_skips_the_primitive_below_one_unit() {
        let mut timer = ManualTimer::new();
        let mut p = FramePacer::new(Duration::from_millis(1));
        assert_eq!(p.sleep(Duration::from_micros(400), &mut timer), 0);
        assert_eq!(timer.sleeps(), 0);
        assert_eq!(p.sleep(Duration::from_micros(700), &mut timer), 1);
        assert_eq!(timer.total_slept(), Duration::from_millis(1));
    }
}

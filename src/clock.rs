//! Sample clock
//!
//! A wrapping 32-bit microsecond time base. All comparisons go through unsigned wrapping
//! arithmetic, so a burst straddling the counter overflow keeps its cadence.

/// Half of the counter range. A deadline is considered reached when `now` is less than this far
/// past it.
const HALF_RANGE: u32 = 1 << 31;

/// Longest single wait `has_reached` can tell apart from an already-passed deadline.
const MAX_WAIT_US: u32 = HALF_RANGE - 1;

/// Microsecond counter with busy-wait scheduling.
pub trait SampleClock {
    /// Current counter value. Wraps after ~71.6 minutes.
    fn now_us(&mut self) -> u32;

    /// Spin until the counter reaches or passes `deadline`.
    fn wait_until(&mut self, deadline: u32) {
        while !has_reached(self.now_us(), deadline) {
            core::hint::spin_loop();
        }
    }

    /// Waits longer than half the counter range are split into chunks.
    fn delay_us(&mut self, us: u32) {
        let mut remaining = us;
        while remaining > 0 {
            let step = remaining.min(MAX_WAIT_US);
            let deadline = self.now_us().wrapping_add(step);
            self.wait_until(deadline);
            remaining -= step;
        }
    }

    /// Saturates at `u32::MAX` microseconds.
    fn delay_ms(&mut self, ms: u32) {
        self.delay_us(ms.saturating_mul(1_000));
    }
}

#[inline]
pub fn has_reached(now: u32, deadline: u32) -> bool {
    now.wrapping_sub(deadline) < HALF_RANGE
}

/// Fixed period for a sample rate, in microseconds.
pub const fn period_us(rate_hz: u32) -> u32 {
    1_000_000 / rate_hz
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockClock, SimTime};

    #[test]
    fn test_has_reached_plain() {
        assert!(has_reached(100, 100));
        assert!(has_reached(101, 100));
        assert!(!has_reached(99, 100));
    }

    #[test]
    fn test_has_reached_across_wrap() {
        let deadline = 5u32;
        assert!(!has_reached(u32::MAX - 10, deadline));
        assert!(has_reached(5, deadline));
        assert!(has_reached(20, deadline));

        let deadline = u32::MAX - 2;
        assert!(has_reached(3, deadline));
        assert!(!has_reached(u32::MAX - 3, deadline));
    }

    #[test]
    fn test_wait_until_spins_to_deadline() {
        let time = SimTime::starting_at(1_000);
        let mut clock = MockClock::new(time.clone(), 3);
        clock.wait_until(1_100);
        assert!(has_reached(time.now(), 1_100));
        assert!(time.now() < 1_110);
    }

    #[test]
    fn test_wait_until_past_deadline_returns_immediately() {
        let time = SimTime::starting_at(50_000);
        let mut clock = MockClock::new(time.clone(), 1);
        clock.wait_until(10_000);
        assert_eq!(time.now(), 50_001);
    }

    #[test]
    fn test_delay_across_wrap() {
        let time = SimTime::starting_at(u32::MAX - 500);
        let mut clock = MockClock::new(time.clone(), 7);
        clock.delay_us(1_000);
        let elapsed = time.now().wrapping_sub(u32::MAX - 500);
        assert!(elapsed >= 1_000 && elapsed < 1_020);
    }

    #[test]
    fn test_delay_beyond_half_range_waits_full_duration() {
        let start = 1_000;
        let time = SimTime::starting_at(start);
        let mut clock = MockClock::new(time.clone(), 1 << 26);
        clock.delay_us(3_000_000_000);
        let elapsed = time.now().wrapping_sub(start);
        assert!(elapsed >= 3_000_000_000, "elapsed {elapsed}");
        assert!(elapsed < 3_000_000_000 + (8 << 26));
    }

    #[test]
    fn test_period_us() {
        assert_eq!(period_us(100), 10_000);
        assert_eq!(period_us(1_000), 1_000);
    }
}

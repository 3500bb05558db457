use crate::sensor::ImuReading;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "stm32", derive(defmt::Format))]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// A reading stamped with the deadline it was scheduled for.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "stm32", derive(defmt::Format))]
pub struct Sample {
    pub timestamp_us: u32,
    pub accel: Vector3,
    pub gyro: Vector3,
}

impl Sample {
    pub const ZERO: Self = Self {
        timestamp_us: 0,
        accel: Vector3::ZERO,
        gyro: Vector3::ZERO,
    };

    pub fn new(timestamp_us: u32, reading: ImuReading) -> Self {
        Self {
            timestamp_us,
            accel: reading.accel,
            gyro: reading.gyro,
        }
    }

    /// Identical motion data, ignoring the timestamp. A run of these points at a stuck sensor.
    pub fn is_duplicate_of(&self, other: &Self) -> bool {
        const EPS: f32 = 1e-5;
        (self.accel.x - other.accel.x).abs() < EPS
            && (self.accel.y - other.accel.y).abs() < EPS
            && (self.accel.z - other.accel.z).abs() < EPS
            && (self.gyro.x - other.gyro.x).abs() < EPS
            && (self.gyro.y - other.gyro.y).abs() < EPS
            && (self.gyro.z - other.gyro.z).abs() < EPS
    }
}

/// Timing and health figures for one burst. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "stm32", derive(defmt::Format))]
pub struct BurstStats {
    pub max_lateness_us: u32,
    pub overruns: u32,
    pub duplicates: u32,
}

impl BurstStats {
    pub(crate) fn record_lateness(&mut self, lateness_us: u32, period_us: u32) {
        self.max_lateness_us = self.max_lateness_us.max(lateness_us);
        if lateness_us > period_us {
            self.overruns += 1;
        }
    }
}

/// Exactly `N` samples in chronological order.
#[derive(Debug, Clone)]
pub struct CaptureBurst<const N: usize> {
    samples: [Sample; N],
    stats: BurstStats,
}

impl<const N: usize> CaptureBurst<N> {
    pub(crate) fn new(samples: [Sample; N], stats: BurstStats) -> Self {
        Self { samples, stats }
    }

    pub fn samples(&self) -> &[Sample; N] {
        &self.samples
    }

    pub fn stats(&self) -> BurstStats {
        self.stats
    }

    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(v: f32) -> ImuReading {
        ImuReading {
            accel: Vector3::new(v, v + 1.0, v + 2.0),
            gyro: Vector3::new(-v, 0.5, 0.25),
        }
    }

    #[test]
    fn test_sample_keeps_reading_values() {
        let s = Sample::new(42, reading(1.5));
        assert_eq!(s.timestamp_us, 42);
        assert_eq!(s.accel, Vector3::new(1.5, 2.5, 3.5));
        assert_eq!(s.gyro, Vector3::new(-1.5, 0.5, 0.25));
    }

    #[test]
    fn test_duplicate_ignores_timestamp() {
        let a = Sample::new(0, reading(1.0));
        let b = Sample::new(10_000, reading(1.0));
        let c = Sample::new(20_000, reading(1.1));
        assert!(a.is_duplicate_of(&b));
        assert!(!b.is_duplicate_of(&c));
    }

    #[test]
    fn test_stats_overrun_threshold() {
        let mut stats = BurstStats::default();
        stats.record_lateness(3, 10_000);
        stats.record_lateness(10_000, 10_000);
        stats.record_lateness(12_000, 10_000);
        assert_eq!(stats.max_lateness_us, 12_000);
        assert_eq!(stats.overruns, 1);
    }
}

use anyhow::anyhow;
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// A range between two `f64` values, inclusive on both ends. Used for the
/// geographic coordinate bounds, zoom extents, and animation progress.
#[derive(Copy, Clone, Debug, Display, PartialEq, Serialize, Deserialize)]
#[display(fmt = "[{}, {}]", min, max)]
pub struct NumRange {
    pub min: f64,
    pub max: f64,
}

impl NumRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// The range [0, 1]
    pub const fn normal_range() -> Self {
        Self::new(0.0, 1.0)
    }

    /// Max minus min
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Check if a value is in this range. Ranges are inclusive on both ends.
    /// `NaN` is never contained.
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    /// Checks if the value is in this range. If it isn't, return an error.
    pub fn ensure_contains(&self, value: f64) -> anyhow::Result<()> {
        if self.contains(value) {
            Ok(())
        } else {
            Err(anyhow!("value {} is not in range {}", value, self))
        }
    }

    /// Map a value from this range to the target range. If the span of this
    /// range is zero we can't tell where the value falls, so we return the
    /// **minimum** of the target range.
    pub fn map_to(&self, dest_range: &Self, value: f64) -> f64 {
        let span = self.span();
        if span > 0.0 {
            let normalized = (value - self.min) / span;
            dest_range.min + normalized * dest_range.span()
        } else {
            dest_range.min
        }
    }

    /// Linear interpolation from min (`t = 0`) to max (`t = 1`)
    pub fn lerp(&self, t: f64) -> f64 {
        Self::normal_range().map_to(self, t)
    }

    /// Force a value into this range. If it's outside the range, return the
    /// bound that's closest to the value.
    pub fn clamp(&self, value: f64) -> f64 {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }

    /// Wrap a value into `[min, max)`, treating the range as cyclic. Useful
    /// for angles.
    pub fn wrap(&self, value: f64) -> f64 {
        let wrapped = self.min + (value - self.min).rem_euclid(self.span());
        // rem_euclid of a tiny negative offset can round up to the full span
        if wrapped >= self.max {
            self.min
        } else {
            wrapped
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_contains() {
        let range = NumRange::new(1.0, 3.0);
        assert!(!range.contains(0.9));
        assert!(range.contains(1.0));
        assert!(range.contains(2.0));
        assert!(range.contains(3.0));
        assert!(!range.contains(3.1));
        assert!(!range.contains(f64::NAN));

        // A zero-length span contains exactly one value
        let range = NumRange::new(1.0, 1.0);
        assert!(!range.contains(0.9));
        assert!(range.contains(1.0));
        assert!(!range.contains(1.1));
    }

    #[test]
    fn test_map_to() {
        let input_range = NumRange::new(1.0, 3.0);
        let output_range = NumRange::new(20.0, 40.0);
        assert_approx_eq!(input_range.map_to(&output_range, 0.0), 10.0);
        assert_approx_eq!(input_range.map_to(&output_range, 2.0), 30.0);
        assert_approx_eq!(input_range.map_to(&output_range, 6.0), 70.0);

        let input_range = NumRange::new(1.0, 1.0);
        assert_approx_eq!(input_range.map_to(&output_range, 1.5), 20.0);
    }

    #[test]
    fn test_lerp() {
        let range = NumRange::new(0.7, 3.0);
        assert_approx_eq!(range.lerp(0.0), 0.7);
        assert_approx_eq!(range.lerp(1.0), 3.0);
        assert_approx_eq!(range.lerp(0.5), 1.85);
    }

    #[test]
    fn test_clamp() {
        let range = NumRange::new(1.0, 3.0);
        assert_approx_eq!(range.clamp(0.0), 1.0);
        assert_approx_eq!(range.clamp(2.0), 2.0);
        assert_approx_eq!(range.clamp(6.0), 3.0);
    }

    #[test]
    fn test_wrap() {
        let range = NumRange::new(0.0, 360.0);
        assert_approx_eq!(range.wrap(360.5), 0.5);
        assert_approx_eq!(range.wrap(-0.5), 359.5);
        assert_approx_eq!(range.wrap(23.0), 23.0);
        assert_approx_eq!(range.wrap(360.0), 0.0);
        // Rounds to the span, which has to wrap back to the start
        assert_eq!(range.wrap(-1e-15), 0.0);
        assert!(range.wrap(-1e-300) < 360.0);

        let range = NumRange::new(-180.0, 180.0);
        assert_approx_eq!(range.wrap(190.0), -170.0);
    }
}

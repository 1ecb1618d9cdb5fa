use std::f64::{INFINITY, NEG_INFINITY};

/// Closed range `[min, max]` over `f64`.
///
/// The empty interval is `min = +inf, max = -inf`; any other `min > max`
/// state is not produced by this type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Default for Interval {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Interval {
    pub const EMPTY: Interval = Interval {
        min: INFINITY,
        max: NEG_INFINITY,
    };

    pub const UNIVERSE: Interval = Interval {
        min: NEG_INFINITY,
        max: INFINITY,
    };

    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    pub fn length(&self) -> f64 {
        self.max - self.min
    }

    /// Smallest interval covering both `self` and `other`.
    pub fn merge(&self, other: &Interval) -> Interval {
        Interval {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn overlap(&self, other: &Interval) -> bool {
        self.min <= other.max && other.min <= self.max
    }

    pub fn contains(&self, x: f64) -> bool {
        self.min <= x && x <= self.max
    }

    pub fn surrounds(&self, x: f64) -> bool {
        self.min < x && x < self.max
    }

    /// Pads both ends outward by `delta`.
    pub fn expand(&self, delta: f64) -> Interval {
        Interval::new(self.min - delta, self.max + delta)
    }
}

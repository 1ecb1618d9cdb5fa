use std::ops::Index;

use glam::DVec3;

use crate::{interval::Interval, ray::Ray};

/// Padding applied by [`AABB::thicken`] when a scene does not override it.
pub const DEFAULT_THICKEN_EPSILON: f64 = 1e-4;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AABB {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl AABB {
    pub const EMPTY: AABB = AABB {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };

    /// Box spanned by two corners given in any order.
    pub fn new(a: DVec3, b: DVec3) -> Self {
        Self {
            x: Interval::new(a.x.min(b.x), a.x.max(b.x)),
            y: Interval::new(a.y.min(b.y), a.y.max(b.y)),
            z: Interval::new(a.z.min(b.z), a.z.max(b.z)),
        }
    }

    pub fn union(box0: &AABB, box1: &AABB) -> Self {
        Self {
            x: box0.x.merge(&box1.x),
            y: box0.y.merge(&box1.y),
            z: box0.z.merge(&box1.z),
        }
    }

    pub fn grow(&self, point: DVec3) -> AABB {
        AABB::union(self, &AABB::new(point, point))
    }

    /// Pads every axis by `epsilon` so flat boxes keep a non-zero slab.
    pub fn thicken(&self, epsilon: f64) -> AABB {
        Self {
            x: self.x.expand(epsilon),
            y: self.y.expand(epsilon),
            z: self.z.expand(epsilon),
        }
    }

    /// Interval for axis 0, 1 or 2. Any other index is a caller bug.
    pub fn axis(&self, n: usize) -> &Interval {
        match n {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("Axis out of range: {n} (expected 0, 1 or 2)"),
        }
    }

    pub fn min_bounds(&self) -> DVec3 {
        DVec3::new(self.x.min, self.y.min, self.z.min)
    }

    pub fn max_bounds(&self) -> DVec3 {
        DVec3::new(self.x.max, self.y.max, self.z.max)
    }

    pub fn contains_box(&self, other: &AABB) -> bool {
        (0..3).all(|a| {
            let outer = self.axis(a);
            let inner = other.axis(a);
            outer.min <= inner.min && inner.max <= outer.max
        })
    }

    /// Slab test against the open parameter range `ray_t`.
    pub fn hit(&self, ray: &Ray, mut ray_t: Interval) -> bool {
        let ray_orig = ray.origin();
        let ray_dir = ray.direction();

        for axis in 0..3 {
            let ax = self.axis(axis);

            // A ray parallel to the slab never enters or leaves it.
            if ray_dir[axis] == 0.0 {
                if !ax.contains(ray_orig[axis]) {
                    return false;
                }
                continue;
            }

            let adinv = 1.0 / ray_dir[axis];
            let t0 = (ax.min - ray_orig[axis]) * adinv;
            let t1 = (ax.max - ray_orig[axis]) * adinv;
            let (t0, t1) = if adinv < 0.0 { (t1, t0) } else { (t0, t1) };

            if t0 > ray_t.min {
                ray_t.min = t0;
            }
            if t1 < ray_t.max {
                ray_t.max = t1;
            }

            if ray_t.max <= ray_t.min {
                return false;
            }
        }

        true
    }
}

impl Index<usize> for AABB {
    type Output = Interval;

    fn index(&self, idx: usize) -> &Self::Output {
        self.axis(idx)
    }
}

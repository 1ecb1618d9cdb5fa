use glam::DVec3;

use crate::{aabb::AABB, interval::Interval, ray::Ray};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRecord {
    pub p: DVec3,
    pub normal: DVec3,
    pub material_id: u32,
    pub t: f64,
    pub front_face: bool,
}

impl HitRecord {
    /// Stores the normal facing against the ray and remembers which side was hit.
    pub fn set_face_normal(&mut self, ray: &Ray, outward_normal: DVec3) {
        self.front_face = ray.direction().dot(outward_normal) < 0.0;
        self.normal = if self.front_face {
            outward_normal
        } else {
            -outward_normal
        };
    }

    /// Keeps whichever of two optional hits is closer along the ray.
    pub fn closest(a: Option<HitRecord>, b: Option<HitRecord>) -> Option<HitRecord> {
        match (a, b) {
            (Some(a), Some(b)) => Some(if a.t < b.t { a } else { b }),
            (a, None) => a,
            (None, b) => b,
        }
    }
}

/// Anything a ray can be tested against.
///
/// Implementors are immutable once built so traversal can run from many
/// threads at once.
pub trait Hittable: Send + Sync {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord>;
    fn bounding_box(&self) -> &AABB;
}

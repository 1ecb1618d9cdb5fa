use glam::DVec3;

use crate::{
    aabb::AABB,
    hittable::{HitRecord, Hittable},
    interval::Interval,
    ray::Ray,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    center: DVec3,
    radius: f64,
    material_id: u32,
    bbox: AABB,
}

impl Sphere {
    pub fn new(center: DVec3, radius: f64, material_id: u32) -> Self {
        let rvec = DVec3::splat(radius);
        Self {
            center,
            radius,
            material_id,
            bbox: AABB::new(center - rvec, center + rvec),
        }
    }

    pub fn center(&self) -> DVec3 {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn material_id(&self) -> u32 {
        self.material_id
    }
}

impl Hittable for Sphere {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        let oc = self.center - ray.origin();
        let a = ray.direction().length_squared();
        let h = ray.direction().dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();

        // Nearest root that lies in the acceptable range.
        let mut root = (h - sqrtd) / a;
        if !ray_t.surrounds(root) {
            root = (h + sqrtd) / a;
            if !ray_t.surrounds(root) {
                return None;
            }
        }

        let p = ray.at(root);
        let mut rec = HitRecord {
            p,
            normal: DVec3::ZERO,
            material_id: self.material_id,
            t: root,
            front_face: false,
        };
        rec.set_face_normal(ray, (p - self.center) / self.radius);
        Some(rec)
    }

    fn bounding_box(&self) -> &AABB {
        &self.bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_t() -> Interval {
        Interval::new(0.001, f64::INFINITY)
    }

    #[test]
    fn test_hit_in_front() {
        let sphere = Sphere::new(DVec3::new(0.0, 0.0, -1.0), 0.5, 0);
        let ray = Ray::new(DVec3::ZERO, DVec3::new(0.0, 0.0, -1.0));
        let rec = sphere.hit(&ray, unit_t()).expect("ray should hit the sphere");
        assert!((rec.t - 0.5).abs() < 1e-12);
        assert!(rec.front_face);
        assert_eq!(rec.normal, DVec3::new(0.0, 0.0, 1.0));
        assert_eq!(rec.material_id, 0);
    }

    #[test]
    fn test_miss_sideways() {
        let sphere = Sphere::new(DVec3::new(0.0, 0.0, -1.0), 0.5, 0);
        let ray = Ray::new(DVec3::ZERO, DVec3::new(0.0, 1.0, 0.0));
        assert!(sphere.hit(&ray, unit_t()).is_none());
    }

    #[test]
    fn test_inside_uses_far_root() {
        let sphere = Sphere::new(DVec3::ZERO, 2.0, 3);
        let ray = Ray::new(DVec3::ZERO, DVec3::new(1.0, 0.0, 0.0));
        let rec = sphere.hit(&ray, unit_t()).unwrap();
        assert!((rec.t - 2.0).abs() < 1e-12);
        assert!(!rec.front_face);
        assert_eq!(rec.normal, DVec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_rejects_hits_outside_range() {
        let sphere = Sphere::new(DVec3::new(0.0, 0.0, -5.0), 1.0, 0);
        let ray = Ray::new(DVec3::ZERO, DVec3::new(0.0, 0.0, -1.0));
        assert!(sphere.hit(&ray, Interval::new(0.001, 3.0)).is_none());
    }

    #[test]
    fn test_bounding_box() {
        let sphere = Sphere::new(DVec3::new(1.0, 2.0, 3.0), 0.5, 0);
        let bbox = sphere.bounding_box();
        assert_eq!(bbox.min_bounds(), DVec3::new(0.5, 1.5, 2.5));
        assert_eq!(bbox.max_bounds(), DVec3::new(1.5, 2.5, 3.5));
    }
}

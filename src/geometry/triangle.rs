use glam::DVec3;

use crate::{
    aabb::{AABB, DEFAULT_THICKEN_EPSILON},
    hittable::{HitRecord, Hittable},
    interval::Interval,
    ray::Ray,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    vertices: [DVec3; 3],
    material_id: u32,
    bbox: AABB,
}

impl Triangle {
    pub fn new(vertices: [DVec3; 3], material_id: u32) -> Self {
        Self::with_epsilon(vertices, material_id, DEFAULT_THICKEN_EPSILON)
    }

    /// Builds the triangle with its box thickened by `epsilon`, so
    /// axis-aligned triangles still get a usable slab.
    pub fn with_epsilon(vertices: [DVec3; 3], material_id: u32, epsilon: f64) -> Self {
        let bbox = AABB::new(vertices[0], vertices[1])
            .grow(vertices[2])
            .thicken(epsilon);
        Self {
            vertices,
            material_id,
            bbox,
        }
    }

    pub fn vertices(&self) -> &[DVec3; 3] {
        &self.vertices
    }

    pub fn material_id(&self) -> u32 {
        self.material_id
    }
}

impl Hittable for Triangle {
    // Möller–Trumbore
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        let [v0, v1, v2] = self.vertices;
        let e1 = v1 - v0;
        let e2 = v2 - v0;

        let pvec = ray.direction().cross(e2);
        let det = e1.dot(pvec);
        // Parallel to the plane, or degenerate. The cutoff scales with the
        // edge and direction lengths so tiny triangles still hit.
        let scale = e1.length() * e2.length() * ray.direction().length();
        if det.abs() <= f64::EPSILON * scale {
            return None;
        }
        let inv_det = 1.0 / det;

        let tvec = ray.origin() - v0;
        let u = tvec.dot(pvec) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let qvec = tvec.cross(e1);
        let v = ray.direction().dot(qvec) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = e2.dot(qvec) * inv_det;
        if !ray_t.surrounds(t) {
            return None;
        }

        let mut rec = HitRecord {
            p: ray.at(t),
            normal: DVec3::ZERO,
            material_id: self.material_id,
            t,
            front_face: false,
        };
        rec.set_face_normal(ray, e1.cross(e2).normalize());
        Some(rec)
    }

    fn bounding_box(&self) -> &AABB {
        &self.bbox
    }
}

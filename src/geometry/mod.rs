pub mod sphere;
pub mod triangle;

pub use sphere::Sphere;
pub use triangle::Triangle;

use crate::{
    aabb::AABB,
    hittable::{HitRecord, Hittable},
    interval::Interval,
    ray::Ray,
};

/// Every shape the BVH and the GPU kernel understand.
///
/// Adding a variant here makes every exhaustive `match` over primitives
/// (bounding boxes, intersection, flattening) fail to compile until it is
/// handled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Sphere(Sphere),
    Triangle(Triangle),
}

impl Hittable for Primitive {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        match self {
            Primitive::Sphere(sphere) => sphere.hit(ray, ray_t),
            Primitive::Triangle(triangle) => triangle.hit(ray, ray_t),
        }
    }

    fn bounding_box(&self) -> &AABB {
        match self {
            Primitive::Sphere(sphere) => sphere.bounding_box(),
            Primitive::Triangle(triangle) => triangle.bounding_box(),
        }
    }
}

impl From<Sphere> for Primitive {
    fn from(sphere: Sphere) -> Self {
        Primitive::Sphere(sphere)
    }
}

impl From<Triangle> for Primitive {
    fn from(triangle: Triangle) -> Self {
        Primitive::Triangle(triangle)
    }
}

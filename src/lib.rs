//! BVH construction over spheres and triangles, and flattening of the tree
//! into pointer-free arrays for a GPU ray tracing kernel.

pub mod aabb;
pub mod accelerators;
pub mod buffers;
pub mod error;
pub mod geometry;
pub mod hittable;
pub mod interval;
pub mod ray;
pub mod scene;
pub mod types;

pub use aabb::AABB;
pub use accelerators::{Bvh, BvhNode, FlatBvh, flatten, flatten_parallel};
pub use error::{Error, Result};
pub use geometry::{Primitive, Sphere, Triangle};
pub use hittable::{HitRecord, Hittable};
pub use interval::Interval;
pub use ray::Ray;
pub use scene::{SceneBuffers, SceneContext, SceneDescription};

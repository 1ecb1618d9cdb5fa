//! Fixed-layout records shared with the GPU kernel.
//!
//! Every record is `#[repr(C)]` with explicit padding so it matches std430
//! storage buffer rules and can be cast to bytes with `bytemuck`.

use bytemuck::{Pod, Zeroable};
use glam::{DVec3, Vec3, Vec4};

use crate::aabb::AABB;
use crate::geometry::{Primitive, Sphere, Triangle};

/// Sentinel for "no child" / "no primitive".
pub const NO_INDEX: i32 = -1;

#[repr(i32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PrimitiveKind {
    Triangle = 0,
    Sphere = 1,
}

impl PrimitiveKind {
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(PrimitiveKind::Triangle),
            1 => Some(PrimitiveKind::Sphere),
            _ => None,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuBvhNode {
    pub min_bounds: Vec3,
    pub left_child: i32,
    pub max_bounds: Vec3,
    pub right_child: i32,
    pub primitive_index: i32,
    pub pad: [f32; 3],
}

/// Nearest `f32` that is not above `x`.
fn round_down(x: f64) -> f32 {
    let f = x as f32;
    if f as f64 > x { f.next_down() } else { f }
}

/// Nearest `f32` that is not below `x`.
fn round_up(x: f64) -> f32 {
    let f = x as f32;
    if (f as f64) < x { f.next_up() } else { f }
}

/// Narrows `bbox` to `f32` corners, rounding outward so the result still
/// encloses every point of the original box.
fn f32_bounds(bbox: &AABB) -> (Vec3, Vec3) {
    let min = bbox.min_bounds();
    let max = bbox.max_bounds();
    (
        Vec3::new(round_down(min.x), round_down(min.y), round_down(min.z)),
        Vec3::new(round_up(max.x), round_up(max.y), round_up(max.z)),
    )
}

impl GpuBvhNode {
    pub fn branch(bbox: &AABB, left_child: i32, right_child: i32) -> Self {
        let (min_bounds, max_bounds) = f32_bounds(bbox);
        Self {
            min_bounds,
            max_bounds,
            left_child,
            right_child,
            primitive_index: NO_INDEX,
            pad: [0.0; 3],
        }
    }

    pub fn leaf(bbox: &AABB, primitive_index: i32) -> Self {
        let (min_bounds, max_bounds) = f32_bounds(bbox);
        Self {
            min_bounds,
            max_bounds,
            left_child: NO_INDEX,
            right_child: NO_INDEX,
            primitive_index,
            pad: [0.0; 3],
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.primitive_index != NO_INDEX
    }

    pub fn bounding_box(&self) -> AABB {
        AABB::new(self.min_bounds.as_dvec3(), self.max_bounds.as_dvec3())
    }
}

// For Triangle: vertex_data holds the three vertices.
// For Sphere: vertex_data[0].xyz is the center, vertex_data[1].x the radius.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuPrimitive {
    pub vertex_data: [Vec4; 3],
    pub material_id: i32,
    pub kind: i32,
    pub pad: [f32; 2],
}

impl GpuPrimitive {
    pub fn from_sphere(sphere: &Sphere) -> Self {
        Self {
            vertex_data: [
                sphere.center().as_vec3().extend(0.0),
                Vec4::new(sphere.radius() as f32, 0.0, 0.0, 0.0),
                Vec4::ZERO,
            ],
            material_id: sphere.material_id() as i32,
            kind: PrimitiveKind::Sphere as i32,
            pad: [0.0; 2],
        }
    }

    pub fn from_triangle(triangle: &Triangle) -> Self {
        let [v0, v1, v2] = triangle.vertices().map(|v| v.as_vec3().extend(0.0));
        Self {
            vertex_data: [v0, v1, v2],
            material_id: triangle.material_id() as i32,
            kind: PrimitiveKind::Triangle as i32,
            pad: [0.0; 2],
        }
    }

    pub fn kind(&self) -> Option<PrimitiveKind> {
        PrimitiveKind::from_raw(self.kind)
    }

    /// Rebuilds the CPU shape this record was written from, in `f64`.
    /// Returns `None` for an unknown `kind` tag.
    pub fn to_primitive(&self) -> Option<Primitive> {
        let material_id = self.material_id as u32;
        let vertex = |i: usize| -> DVec3 { self.vertex_data[i].truncate().as_dvec3() };
        match self.kind()? {
            PrimitiveKind::Sphere => Some(
                Sphere::new(vertex(0), self.vertex_data[1].x as f64, material_id).into(),
            ),
            PrimitiveKind::Triangle => {
                Some(Triangle::new([vertex(0), vertex(1), vertex(2)], material_id).into())
            }
        }
    }
}

impl From<&Primitive> for GpuPrimitive {
    fn from(primitive: &Primitive) -> Self {
        match primitive {
            Primitive::Sphere(sphere) => GpuPrimitive::from_sphere(sphere),
            Primitive::Triangle(triangle) => GpuPrimitive::from_triangle(triangle),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuMaterial {
    pub ambient: Vec4,
    pub diffuse: Vec4,
    pub specular: Vec4,
    pub mirror: Vec4,
    pub phong_exponent: f32,
    pub is_mirror: i32,
    pub pad: [f32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuLight {
    pub position: Vec3,
    /// Total number of lights, repeated in every record.
    pub lights_size: i32,
    pub intensity: Vec3,
    pub pad: f32,
}

const _: () = assert!(std::mem::size_of::<GpuBvhNode>() == 48);
const _: () = assert!(std::mem::size_of::<GpuPrimitive>() == 64);
const _: () = assert!(std::mem::size_of::<GpuMaterial>() == 80);
const _: () = assert!(std::mem::size_of::<GpuLight>() == 32);

use std::time::Instant;

use glam::{DVec3, Vec3};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::accelerators::{Bvh, FlatBvh, flatten, flatten_parallel};
use crate::aabb::DEFAULT_THICKEN_EPSILON;
use crate::buffers::{BindingPoint, BufferBuilder, DeviceBufferSink};
use crate::error::{Error, Result};
use crate::geometry::{Primitive, Sphere, Triangle};
use crate::types::{GpuBvhNode, GpuLight, GpuMaterial, GpuPrimitive};

pub mod extract;
pub mod loader;

pub use extract::{extract_lights, extract_materials};

/// Knobs for building and flattening, read from the `build:` section of a
/// scene file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Seed for split axis selection. Unseeded builds differ run to run.
    pub seed: Option<u64>,
    /// Padding added around triangle boxes.
    pub thicken_epsilon: f64,
    pub parallel_flatten: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            seed: None,
            thicken_epsilon: DEFAULT_THICKEN_EPSILON,
            parallel_flatten: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialDesc {
    #[serde(default)]
    pub is_mirror: bool,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    #[serde(default)]
    pub mirror: Vec3,
    #[serde(default = "default_phong_exponent")]
    pub phong_exponent: f32,
}

fn default_phong_exponent() -> f32 {
    1.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub position: Vec3,
    pub intensity: Vec3,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SphereDesc {
    pub material_id: u32,
    pub center_vertex_id: u32,
    pub radius: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriangleDesc {
    pub material_id: u32,
    pub indices: [u32; 3],
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshDesc {
    pub material_id: u32,
    pub faces: Vec<[u32; 3]>,
}

/// Already-parsed scene contents. All ids are 0-based indices into
/// `vertex_data` and `materials`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDescription {
    pub build: BuildOptions,
    pub materials: Vec<MaterialDesc>,
    pub point_lights: Vec<PointLight>,
    pub vertex_data: Vec<Vec3>,
    pub spheres: Vec<SphereDesc>,
    pub triangles: Vec<TriangleDesc>,
    pub meshes: Vec<MeshDesc>,
}

/// Everything the kernel needs, ready to upload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneBuffers {
    pub nodes: Vec<GpuBvhNode>,
    pub primitives: Vec<GpuPrimitive>,
    pub materials: Vec<GpuMaterial>,
    pub lights: Vec<GpuLight>,
}

impl SceneBuffers {
    /// Packs each array into its own 16-byte aligned byte buffer.
    pub fn pack(&self) -> Vec<(BindingPoint, Vec<u8>)> {
        fn packed<T: bytemuck::Pod>(records: &[T]) -> Vec<u8> {
            let mut builder = BufferBuilder::new();
            builder.append_slice(records);
            builder.align_to_16();
            builder.into_bytes()
        }

        vec![
            (BindingPoint::BvhNodes, packed(&self.nodes)),
            (BindingPoint::Primitives, packed(&self.primitives)),
            (BindingPoint::Materials, packed(&self.materials)),
            (BindingPoint::Lights, packed(&self.lights)),
        ]
    }

    pub fn upload(&self, sink: &mut dyn DeviceBufferSink) -> Result<()> {
        for (binding, bytes) in self.pack() {
            sink.create_buffer(binding.name(), binding as u32, bytes.len())?;
            if !bytes.is_empty() {
                sink.update_buffer(binding.name(), 0, &bytes)?;
            }
            debug!("uploaded {} ({} bytes)", binding.name(), bytes.len());
        }
        Ok(())
    }
}

/// One loaded scene: its description plus the primitives derived from it.
#[derive(Clone, Debug)]
pub struct SceneContext {
    description: SceneDescription,
    primitives: Vec<Primitive>,
}

impl SceneContext {
    /// Resolves vertex references and checks material ids.
    ///
    /// Primitives are ordered spheres, standalone triangles, then mesh faces.
    pub fn new(description: SceneDescription) -> Result<Self> {
        let epsilon = description.build.thicken_epsilon;
        let mut primitives = Vec::with_capacity(
            description.spheres.len()
                + description.triangles.len()
                + description.meshes.iter().map(|m| m.faces.len()).sum::<usize>(),
        );

        for (i, sphere) in description.spheres.iter().enumerate() {
            let owner = || format!("sphere {i}");
            check_material(&description, sphere.material_id, owner)?;
            let center = vertex(&description, sphere.center_vertex_id, owner)?;
            primitives.push(Sphere::new(center, sphere.radius as f64, sphere.material_id).into());
        }

        for (i, triangle) in description.triangles.iter().enumerate() {
            let owner = || format!("triangle {i}");
            check_material(&description, triangle.material_id, owner)?;
            let vertices = face(&description, triangle.indices, owner)?;
            primitives.push(Triangle::with_epsilon(vertices, triangle.material_id, epsilon).into());
        }

        for (m, mesh) in description.meshes.iter().enumerate() {
            check_material(&description, mesh.material_id, || format!("mesh {m}"))?;
            for (f, indices) in mesh.faces.iter().enumerate() {
                let vertices = face(&description, *indices, || format!("mesh {m} face {f}"))?;
                primitives.push(Triangle::with_epsilon(vertices, mesh.material_id, epsilon).into());
            }
        }

        if description.point_lights.is_empty() {
            warn!("scene has no point lights");
        }

        Ok(Self {
            description,
            primitives,
        })
    }

    pub fn options(&self) -> &BuildOptions {
        &self.description.build
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    /// Builds the hierarchy. The primitive list is reordered by the build.
    pub fn build_bvh(&mut self) -> Result<Bvh> {
        if self.primitives.is_empty() {
            return Err(Error::EmptyScene);
        }

        info!("building BVH over {} primitives...", self.primitives.len());
        let start = Instant::now();
        let seed = self.options().seed;
        let bvh = Bvh::build_seeded(&mut self.primitives, seed);
        info!(
            "BVH built in {:.4}s ({} nodes, depth {})",
            start.elapsed().as_secs_f32(),
            bvh.node_count(),
            bvh.depth()
        );
        Ok(bvh)
    }

    pub fn flatten(&self, bvh: &Bvh) -> FlatBvh {
        let start = Instant::now();
        let flat = if self.options().parallel_flatten {
            flatten_parallel(bvh)
        } else {
            flatten(bvh)
        };
        info!(
            "flattened {} nodes / {} primitives in {:.4}s",
            flat.nodes.len(),
            flat.primitives.len(),
            start.elapsed().as_secs_f32()
        );
        flat
    }

    /// Build, flatten and extract in one go.
    pub fn gpu_buffers(&mut self) -> Result<SceneBuffers> {
        let bvh = self.build_bvh()?;
        let FlatBvh { nodes, primitives } = self.flatten(&bvh);
        Ok(SceneBuffers {
            nodes,
            primitives,
            materials: extract_materials(&self.description),
            lights: extract_lights(&self.description),
        })
    }
}

fn vertex(scene: &SceneDescription, id: u32, owner: impl Fn() -> String) -> Result<DVec3> {
    scene
        .vertex_data
        .get(id as usize)
        .map(|v| v.as_dvec3())
        .ok_or_else(|| Error::InvalidVertex {
            owner: owner(),
            vertex_id: id,
            vertex_count: scene.vertex_data.len(),
        })
}

fn face(scene: &SceneDescription, ids: [u32; 3], owner: impl Fn() -> String) -> Result<[DVec3; 3]> {
    Ok([
        vertex(scene, ids[0], &owner)?,
        vertex(scene, ids[1], &owner)?,
        vertex(scene, ids[2], &owner)?,
    ])
}

fn check_material(scene: &SceneDescription, id: u32, owner: impl Fn() -> String) -> Result<()> {
    if id as usize >= scene.materials.len() {
        return Err(Error::InvalidMaterial {
            owner: owner(),
            material_id: id,
            material_count: scene.materials.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffers::MemorySink;
    use crate::hittable::Hittable;
    use crate::interval::Interval;
    use crate::ray::Ray;

    fn material() -> MaterialDesc {
        MaterialDesc {
            is_mirror: false,
            ambient: Vec3::splat(0.1),
            diffuse: Vec3::splat(0.5),
            specular: Vec3::splat(0.2),
            mirror: Vec3::ZERO,
            phong_exponent: 10.0,
        }
    }

    fn small_scene() -> SceneDescription {
        SceneDescription {
            build: BuildOptions {
                seed: Some(3),
                ..Default::default()
            },
            materials: vec![material()],
            point_lights: vec![PointLight {
                position: Vec3::new(0.0, 5.0, 0.0),
                intensity: Vec3::splat(1000.0),
            }],
            vertex_data: vec![
                Vec3::new(0.0, 0.0, -1.0),
                Vec3::new(-1.0, -1.0, -2.0),
                Vec3::new(1.0, -1.0, -2.0),
                Vec3::new(0.0, 1.0, -2.0),
            ],
            spheres: vec![SphereDesc {
                material_id: 0,
                center_vertex_id: 0,
                radius: 0.5,
            }],
            triangles: vec![TriangleDesc {
                material_id: 0,
                indices: [1, 2, 3],
            }],
            meshes: vec![MeshDesc {
                material_id: 0,
                faces: vec![[0, 1, 2], [0, 2, 3]],
            }],
        }
    }

    #[test]
    fn test_primitive_order() {
        let ctx = SceneContext::new(small_scene()).unwrap();
        let kinds: Vec<bool> = ctx
            .primitives()
            .iter()
            .map(|p| matches!(p, Primitive::Sphere(_)))
            .collect();
        assert_eq!(kinds, vec![true, false, false, false]);
    }

    #[test]
    fn test_invalid_vertex() {
        let mut scene = small_scene();
        scene.meshes[0].faces[1] = [0, 2, 9];
        let err = SceneContext::new(scene).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidVertex { vertex_id: 9, vertex_count: 4, ref owner } if owner == "mesh 0 face 1"
        ));
    }

    #[test]
    fn test_invalid_material() {
        let mut scene = small_scene();
        scene.spheres[0].material_id = 2;
        assert!(matches!(
            SceneContext::new(scene),
            Err(Error::InvalidMaterial { material_id: 2, .. })
        ));
    }

    #[test]
    fn test_empty_scene_is_an_error() {
        let mut ctx = SceneContext::new(SceneDescription::default()).unwrap();
        assert!(matches!(ctx.build_bvh(), Err(Error::EmptyScene)));
    }

    #[test]
    fn test_gpu_buffers_and_upload() {
        let mut ctx = SceneContext::new(small_scene()).unwrap();
        let buffers = ctx.gpu_buffers().unwrap();
        assert_eq!(buffers.primitives.len(), 4);
        assert_eq!(buffers.nodes.len(), 7);
        assert_eq!(buffers.materials.len(), 1);
        assert_eq!(buffers.lights.len(), 1);

        let mut sink = MemorySink::new();
        buffers.upload(&mut sink).unwrap();
        assert_eq!(sink.len(), 4);
        assert_eq!(sink.get("BVHNodes").unwrap().data.len(), 7 * 48);
        assert_eq!(sink.get("Primitives").unwrap().binding, 3);
        assert_eq!(sink.get("Materials").unwrap().data.len(), 80);
        assert_eq!(sink.get("Lights").unwrap().data.len(), 32);
        assert_eq!(
            sink.get("BVHNodes").unwrap().data,
            bytemuck::cast_slice::<GpuBvhNode, u8>(&buffers.nodes)
        );
    }

    fn floor_scene(thicken_epsilon: f64) -> SceneDescription {
        SceneDescription {
            build: BuildOptions {
                seed: Some(1),
                thicken_epsilon,
                ..Default::default()
            },
            materials: vec![material()],
            vertex_data: vec![
                Vec3::new(-1.0, 0.0, -1.0),
                Vec3::new(1.0, 0.0, -1.0),
                Vec3::new(0.0, 0.0, 1.0),
            ],
            triangles: vec![TriangleDesc {
                material_id: 0,
                indices: [0, 1, 2],
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_thicken_epsilon_controls_flat_triangle_hits() {
        let ray = Ray::new(DVec3::new(0.0, 2.0, 0.0), DVec3::new(0.0, -1.0, 0.0));
        let t = Interval::new(0.001, f64::INFINITY);

        // The triangle itself is hit, but its unpadded box has a zero-width
        // y slab that the box test rejects.
        let mut thin = SceneContext::new(floor_scene(0.0)).unwrap();
        assert!(thin.primitives()[0].hit(&ray, t).is_some());
        let bvh = thin.build_bvh().unwrap();
        assert_eq!(bvh.bounding_box().y.length(), 0.0);
        assert!(bvh.hit(&ray, t).is_none());
        assert!(thin.flatten(&bvh).hit(&ray, t).is_none());

        let mut padded = SceneContext::new(floor_scene(DEFAULT_THICKEN_EPSILON)).unwrap();
        let bvh = padded.build_bvh().unwrap();
        let rec = bvh.hit(&ray, t).expect("padded box should let the ray through");
        assert!((rec.t - 2.0).abs() < 1e-12);
        let flat_rec = padded.flatten(&bvh).hit(&ray, t).unwrap();
        assert!((flat_rec.t - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_parallel_option_gives_same_buffers() {
        let mut sequential = SceneContext::new(small_scene()).unwrap();
        let mut scene = small_scene();
        scene.build.parallel_flatten = true;
        let mut parallel = SceneContext::new(scene).unwrap();
        assert_eq!(
            sequential.gpu_buffers().unwrap(),
            parallel.gpu_buffers().unwrap()
        );
    }
}

use super::SceneDescription;
use crate::types::{GpuLight, GpuMaterial};

/// One GPU record per scene material, same order.
pub fn extract_materials(scene: &SceneDescription) -> Vec<GpuMaterial> {
    scene
        .materials
        .iter()
        .map(|mat| GpuMaterial {
            ambient: mat.ambient.extend(0.0),
            diffuse: mat.diffuse.extend(0.0),
            specular: mat.specular.extend(0.0),
            mirror: mat.mirror.extend(0.0),
            phong_exponent: mat.phong_exponent,
            is_mirror: mat.is_mirror as i32,
            pad: [0.0; 2],
        })
        .collect()
}

/// One GPU record per point light, each carrying the total light count.
pub fn extract_lights(scene: &SceneDescription) -> Vec<GpuLight> {
    let lights_size = scene.point_lights.len() as i32;
    scene
        .point_lights
        .iter()
        .map(|light| GpuLight {
            position: light.position,
            lights_size,
            intensity: light.intensity,
            pad: 0.0,
        })
        .collect()
}

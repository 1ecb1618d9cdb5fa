use std::fs;
use std::path::Path;

use log::info;

use super::{SceneContext, SceneDescription};
use crate::error::{Error, Result};

impl SceneDescription {
    /// Loads a scene file, picking the format from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        let scene = match extension.as_deref() {
            Some("yaml" | "yml") => Self::from_yaml_str(&contents)?,
            Some("json") => Self::from_json_str(&contents)?,
            _ => return Err(Error::UnsupportedFormat(path.to_path_buf())),
        };

        info!(
            "loaded {}: {} vertices, {} spheres, {} triangles, {} meshes, {} materials, {} lights",
            path.display(),
            scene.vertex_data.len(),
            scene.spheres.len(),
            scene.triangles.len(),
            scene.meshes.len(),
            scene.materials.len(),
            scene.point_lights.len()
        );
        Ok(scene)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }
}

impl SceneContext {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(SceneDescription::from_path(path)?)
    }
}

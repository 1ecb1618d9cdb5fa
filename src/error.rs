use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read scene file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML scene")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to parse JSON scene")]
    Json(#[from] serde_json::Error),

    #[error("unsupported scene format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("{owner} references vertex {vertex_id}, but the scene only has {vertex_count} vertices")]
    InvalidVertex {
        owner: String,
        vertex_id: u32,
        vertex_count: usize,
    },

    #[error("{owner} references material {material_id}, but the scene only has {material_count} materials")]
    InvalidMaterial {
        owner: String,
        material_id: u32,
        material_count: usize,
    },

    #[error("scene has no primitives to build a BVH from")]
    EmptyScene,

    #[error("flattened BVH is inconsistent at index {index}: {reason}")]
    InvalidFlatBvh { index: usize, reason: &'static str },

    #[error("device buffer `{0}` was never created")]
    UnknownBuffer(String),

    #[error("write of {len} bytes at offset {offset} overflows device buffer `{name}` ({size} bytes)")]
    BufferOverflow {
        name: String,
        offset: usize,
        len: usize,
        size: usize,
    },

    #[error("device buffer i/o failed for `{name}`")]
    Device {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

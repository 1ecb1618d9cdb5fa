//! Hand-off of packed scene buffers to whatever owns device memory.

pub mod bufferbuilder;

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::debug;

pub use bufferbuilder::BufferBuilder;

use crate::error::{Error, Result};

/// Storage buffer binding points the kernel declares.
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BindingPoint {
    BvhNodes = 2,
    Primitives = 3,
    Materials = 4,
    Lights = 5,
}

impl BindingPoint {
    pub const ALL: [BindingPoint; 4] = [
        BindingPoint::BvhNodes,
        BindingPoint::Primitives,
        BindingPoint::Materials,
        BindingPoint::Lights,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BindingPoint::BvhNodes => "BVHNodes",
            BindingPoint::Primitives => "Primitives",
            BindingPoint::Materials => "Materials",
            BindingPoint::Lights => "Lights",
        }
    }
}

/// Destination for packed buffers, e.g. GPU storage buffers.
///
/// A buffer is created once with its final size, then filled with one or
/// more `update_buffer` calls.
pub trait DeviceBufferSink {
    fn create_buffer(&mut self, name: &str, binding: u32, size: usize) -> Result<()>;
    fn update_buffer(&mut self, name: &str, offset: usize, data: &[u8]) -> Result<()>;
}

fn check_range(name: &str, size: usize, offset: usize, len: usize) -> Result<()> {
    if offset.checked_add(len).is_none_or(|end| end > size) {
        return Err(Error::BufferOverflow {
            name: name.to_string(),
            offset,
            len,
            size,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryBuffer {
    pub binding: u32,
    pub data: Vec<u8>,
}

/// Keeps every buffer in host memory, keyed by name.
#[derive(Debug, Default)]
pub struct MemorySink {
    buffers: HashMap<String, MemoryBuffer>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&MemoryBuffer> {
        self.buffers.get(name)
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

impl DeviceBufferSink for MemorySink {
    fn create_buffer(&mut self, name: &str, binding: u32, size: usize) -> Result<()> {
        self.buffers.insert(
            name.to_string(),
            MemoryBuffer {
                binding,
                data: vec![0; size],
            },
        );
        Ok(())
    }

    fn update_buffer(&mut self, name: &str, offset: usize, data: &[u8]) -> Result<()> {
        let buffer = self
            .buffers
            .get_mut(name)
            .ok_or_else(|| Error::UnknownBuffer(name.to_string()))?;
        check_range(name, buffer.data.len(), offset, data.len())?;
        buffer.data[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }
}

/// Writes each buffer to `<dir>/<name>.bin`.
#[derive(Debug)]
pub struct FileSink {
    dir: PathBuf,
    sizes: HashMap<String, usize>,
}

impl FileSink {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            sizes: HashMap::new(),
        }
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.bin"))
    }
}

impl DeviceBufferSink for FileSink {
    fn create_buffer(&mut self, name: &str, binding: u32, size: usize) -> Result<()> {
        let device_err = |source| Error::Device {
            name: name.to_string(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(device_err)?;
        let file = File::create(self.path_of(name)).map_err(device_err)?;
        file.set_len(size as u64).map_err(device_err)?;
        debug!("created {name} (binding {binding}, {size} bytes)");
        self.sizes.insert(name.to_string(), size);
        Ok(())
    }

    fn update_buffer(&mut self, name: &str, offset: usize, data: &[u8]) -> Result<()> {
        let size = *self
            .sizes
            .get(name)
            .ok_or_else(|| Error::UnknownBuffer(name.to_string()))?;
        check_range(name, size, offset, data.len())?;

        let device_err = |source| Error::Device {
            name: name.to_string(),
            source,
        };
        let mut file = OpenOptions::new()
            .write(true)
            .open(self.path_of(name))
            .map_err(device_err)?;
        file.seek(SeekFrom::Start(offset as u64)).map_err(device_err)?;
        file.write_all(data).map_err(device_err)?;
        Ok(())
    }
}

use bytemuck::Pod;

const INITIAL_SIZE: usize = 16;

/// Byte buffer that records are appended to before upload.
#[derive(Debug, Default, Clone)]
pub struct BufferBuilder {
    buffer: Vec<u8>,
}

impl BufferBuilder {
    pub fn new() -> Self {
        BufferBuilder {
            buffer: Vec::with_capacity(INITIAL_SIZE),
        }
    }

    pub fn align_to_16(&mut self) {
        let remainder = self.buffer.len() % 16;
        if remainder != 0 {
            let pad_size = 16 - remainder;
            self.pad(pad_size);
        }
    }

    pub fn get_offset(&self) -> usize {
        self.buffer.len()
    }

    pub fn pad(&mut self, amt: usize) {
        self.buffer.resize(self.buffer.len() + amt, 0);
    }

    pub fn append<T: Pod>(&mut self, value: T) {
        self.buffer.extend_from_slice(bytemuck::bytes_of(&value));
    }

    pub fn append_slice<T: Pod>(&mut self, values: &[T]) {
        self.buffer.extend_from_slice(bytemuck::cast_slice(values));
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_to_16() {
        let mut builder = BufferBuilder::new();
        builder.append(1u32);
        assert_eq!(builder.get_offset(), 4);
        builder.align_to_16();
        assert_eq!(builder.get_offset(), 16);
        builder.align_to_16();
        assert_eq!(builder.get_offset(), 16);
    }

    #[test]
    fn test_append_slice_little_endian() {
        let mut builder = BufferBuilder::new();
        builder.append_slice(&[1i32, -1]);
        assert_eq!(builder.as_bytes(), &[1, 0, 0, 0, 0xff, 0xff, 0xff, 0xff][..]);
    }
}

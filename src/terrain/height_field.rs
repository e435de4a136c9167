//! GPU-resident height field storage

use std::sync::Arc;

/// Number of scalar samples a field of the given dimensions holds
pub fn sample_count(samples: [u32; 2]) -> u64 {
    samples[0] as u64 * samples[1] as u64
}

/// A storage buffer of `samples.x * samples.y` f32 elevation samples.
///
/// Dimensions are fixed at creation; regeneration only overwrites the
/// contents. The compute stage is the single writer and the draw the
/// single reader, ordered by the dispatch barrier.
pub struct HeightFieldBuffer {
    buffer: wgpu::Buffer,
    samples: [u32; 2],
}

impl HeightFieldBuffer {
    pub fn new(device: &Arc<wgpu::Device>, samples: [u32; 2]) -> Self {
        let size = sample_count(samples) * std::mem::size_of::<f32>() as u64;
        log::info!(
            "[HeightFieldBuffer] allocating {}x{} samples ({} bytes)",
            samples[0],
            samples[1],
            size
        );
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Height Field Buffer"),
            size,
            usage: wgpu::BufferUsages::STORAGE,
            mapped_at_creation: false,
        });
        Self { buffer, samples }
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn samples(&self) -> [u32; 2] {
        self.samples
    }

    pub fn byte_size(&self) -> u64 {
        sample_count(self.samples) * std::mem::size_of::<f32>() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::sample_count;

    #[test]
    fn sample_count_multiplies_axes() {
        assert_eq!(sample_count([1000, 4000]), 4_000_000);
        assert_eq!(sample_count([1, 1]), 1);
    }
}

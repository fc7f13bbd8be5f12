mod readback;

pub use readback::{compute_padded_bytes_per_row, copy_padded_readback_rows};

use crate::error::{Error, Result};
use crate::format::PixelFormat;
use tracing::{debug, error};
use wgpu::InstanceDescriptor;

pub struct GpuContext {
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl GpuContext {
    /// Creates a context without any window surface.
    ///
    /// Returns `None` if no suitable GPU adapter is available. This is useful
    /// in environments without a GPU (e.g. CI), where tests can skip gracefully
    /// instead of failing.
    pub async fn try_new_headless() -> Option<Self> {
        match Self::new_headless().await {
            Ok(context) => Some(context),
            Err(err) => {
                debug!("headless GPU context unavailable: {err}");
                None
            }
        }
    }

    pub async fn new_headless() -> Result<Self> {
        let instance = wgpu::Instance::new(&InstanceDescriptor::default());

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| Error::AdapterNotFound)?;

        let info = adapter.get_info();
        debug!(
            "using adapter {} ({:?}, {:?})",
            info.name, info.device_type, info.backend
        );

        // Packed 11-11-10 float is only renderable behind a feature flag.
        let required_features =
            adapter.features() & wgpu::Features::RG11B10UFLOAT_RENDERABLE;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("fragcheck_device"),
                required_features,
                required_limits: adapter.limits(),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await?;

        device.on_uncaptured_error(Box::new(|err| {
            error!("uncaptured wgpu error: {err}");
        }));

        Ok(Self {
            adapter,
            device,
            queue,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Whether `format` can be used as a color attachment on this device.
    pub fn supports_render_format(&self, format: PixelFormat) -> bool {
        let texture_format = format.to_wgpu();
        if !self
            .device
            .features()
            .contains(texture_format.required_features())
        {
            return false;
        }
        if format == PixelFormat::Rg11b10Float
            && !self
                .device
                .features()
                .contains(wgpu::Features::RG11B10UFLOAT_RENDERABLE)
        {
            return false;
        }

        self.adapter
            .get_texture_format_features(texture_format)
            .allowed_usages
            .contains(wgpu::TextureUsages::RENDER_ATTACHMENT)
    }

    pub fn max_color_attachments(&self) -> u32 {
        self.device.limits().max_color_attachments
    }

    pub fn max_color_attachment_bytes_per_sample(&self) -> u32 {
        self.device.limits().max_color_attachment_bytes_per_sample
    }

    /// Runs `f` inside a validation error scope. Anything the scope catches is
    /// returned as [`Error::Validation`] labelled with `context`.
    pub fn with_validation<T>(&self, context: &str, f: impl FnOnce(&wgpu::Device) -> T) -> Result<T> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = f(&self.device);
        match futures::executor::block_on(self.device.pop_error_scope()) {
            Some(err) => Err(Error::Validation {
                context: context.to_string(),
                message: err.to_string(),
            }),
            None => Ok(value),
        }
    }

    /// Copies the whole of `texture` back to the CPU. The bytes are tightly
    /// packed rows of `format` texels.
    pub fn read_texture(&self, texture: &wgpu::Texture, format: PixelFormat) -> Result<Vec<u8>> {
        let (width, height) = (texture.width(), texture.height());
        let bytes_per_pixel = crate::codec::bytes_per_pixel(format) as u32;
        let (unpadded_bytes_per_row, padded_bytes_per_row) =
            compute_padded_bytes_per_row(width, bytes_per_pixel);

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback_buffer"),
            size: padded_bytes_per_row as u64 * height as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("readback_encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let mut mapped_bytes = Vec::new();
        readback::map_readback_buffer_into(&self.device, &buffer, &mut mapped_bytes)?;

        let required_len = height as usize * padded_bytes_per_row as usize;
        if mapped_bytes.len() < required_len {
            return Err(Error::Readback(format!(
                "mapped {} bytes, expected at least {required_len}",
                mapped_bytes.len()
            )));
        }

        let mut output = Vec::new();
        copy_padded_readback_rows(
            &mapped_bytes,
            height,
            unpadded_bytes_per_row,
            padded_bytes_per_row,
            &mut output,
        );
        Ok(output)
    }

    /// Blocks until all submitted work has completed.
    pub fn finish(&self) -> Result<()> {
        self.device.poll(wgpu::PollType::Wait)?;
        Ok(())
    }
}

/// Color attachment bytes one sample occupies for `formats`, laid out in
/// order with each target aligned to its component size.
pub fn color_attachment_bytes_per_sample(formats: &[PixelFormat]) -> u32 {
    formats.iter().fold(0, |total, format| {
        let texture_format = format.to_wgpu();
        let alignment = texture_format.target_component_alignment().unwrap_or(1);
        let cost = texture_format.target_pixel_byte_cost().unwrap_or(0);
        total.next_multiple_of(alignment) + cost
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_byte_cost_accumulates_with_alignment() {
        assert_eq!(color_attachment_bytes_per_sample(&[]), 0);
        assert_eq!(
            color_attachment_bytes_per_sample(&[PixelFormat::R8Unorm, PixelFormat::R32Float]),
            8
        );
        let four_rgba32 = [PixelFormat::Rgba32Float; 4];
        assert_eq!(color_attachment_bytes_per_sample(&four_rgba32), 64);
    }
}

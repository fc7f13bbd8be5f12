use crate::compare::{compare_images, compute_threshold, ComparisonResult};
use crate::error::{Error, Result};
use crate::format::PixelFormat;
use crate::gpu::{color_attachment_bytes_per_sample, GpuContext};
use crate::grid::VertexGrid;
use crate::harness::{IterateResult, TestCase, Verdict};
use crate::image::PixelBuffer;
use crate::output::{FragmentOutputSpec, Precision};
use crate::reference::render_reference;
use crate::shader::{generate_shader, pack_vertices, write_mask, VertexLayout};
use crate::values::{generate_inputs, GeneratedInput};
use smallvec::SmallVec;
use tracing::{debug, info, warn};
use wgpu::util::DeviceExt;

/// Color attachment slots a render pass can bind.
const MAX_COLOR_TARGETS: usize = 8;

/// GPU objects and inputs that live from `init` to `deinit`.
struct PreparedDraw {
    grid: VertexGrid,
    inputs: Vec<GeneratedInput>,
    pipeline: wgpu::RenderPipeline,
}

/// Per-attachment bookkeeping for one iteration.
struct AttachmentState {
    location: u32,
    format: PixelFormat,
    reference_format: PixelFormat,
    read_format: PixelFormat,
    /// Index into the prepared inputs, `None` for an attachment no output writes.
    input: Option<usize>,
    written_channels: usize,
    precision: Precision,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

pub struct FragmentOutputCase {
    name: String,
    description: String,
    spec: FragmentOutputSpec,
    prepared: Option<PreparedDraw>,
}

impl FragmentOutputCase {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        spec: FragmentOutputSpec,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            spec,
            prepared: None,
        }
    }

    pub fn spec(&self) -> &FragmentOutputSpec {
        &self.spec
    }

    fn check_support(&self, gpu: &GpuContext) -> Result<()> {
        let mut formats = Vec::new();
        for attachment in self.spec.attachments.iter().flatten() {
            if attachment.samples > 1 {
                return Err(Error::NotSupported(format!(
                    "{} samples per pixel",
                    attachment.samples
                )));
            }
            if !gpu.supports_render_format(attachment.format) {
                return Err(Error::NotSupported(format!(
                    "{} is not color-renderable",
                    attachment.format
                )));
            }
            formats.push(attachment.format);
        }

        let max_attachments = gpu.max_color_attachments();
        if self.spec.attachments.len() as u32 > max_attachments {
            return Err(Error::NotSupported(format!(
                "{} color attachments, device allows {max_attachments}",
                self.spec.attachments.len()
            )));
        }

        let bytes_per_sample = color_attachment_bytes_per_sample(&formats);
        let max_bytes = gpu.max_color_attachment_bytes_per_sample();
        if bytes_per_sample > max_bytes {
            return Err(Error::NotSupported(format!(
                "{bytes_per_sample} color attachment bytes per sample, device allows {max_bytes}"
            )));
        }

        Ok(())
    }

    fn create_pipeline(&self, gpu: &GpuContext, inputs: &[GeneratedInput]) -> Result<wgpu::RenderPipeline> {
        let source = generate_shader(inputs);
        debug!("[{}] generated shader:\n{source}", self.name);

        let layout = VertexLayout::new(inputs);
        let mut targets: SmallVec<[Option<wgpu::ColorTargetState>; MAX_COLOR_TARGETS]> =
            SmallVec::new();
        for (location, attachment) in self.spec.attachments.iter().enumerate() {
            let target = attachment.map(|attachment| {
                let mask = inputs
                    .iter()
                    .find(|input| input.location == location as u32)
                    .map(|input| {
                        write_mask(input.component_count(), attachment.format.channel_count())
                    })
                    .unwrap_or(wgpu::ColorWrites::empty());
                wgpu::ColorTargetState {
                    format: attachment.format.to_wgpu(),
                    blend: None,
                    write_mask: mask,
                }
            });
            targets.push(target);
        }

        gpu.with_validation(&self.name, |device| {
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("fragment_output_shader"),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });

            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("fragment_output_pipeline_layout"),
                bind_group_layouts: &[],
                push_constant_ranges: &[],
            });

            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("fragment_output_pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[layout.buffer_layout()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &targets,
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        })
    }

    fn create_attachment_states(
        &self,
        gpu: &GpuContext,
        inputs: &[GeneratedInput],
    ) -> Result<Vec<AttachmentState>> {
        let mut states = Vec::new();
        for (location, attachment) in self.spec.attachments.iter().enumerate() {
            let Some(attachment) = attachment else {
                continue;
            };
            let location = location as u32;
            let format = attachment.format;
            let input = inputs.iter().position(|input| input.location == location);
            let (written_channels, precision) = match input {
                Some(index) => (
                    inputs[index].component_count().min(format.channel_count()),
                    inputs[index].precision,
                ),
                None => (0, Precision::Highp),
            };

            let texture = gpu.with_validation(&self.name, |device| {
                device.create_texture(&wgpu::TextureDescriptor {
                    label: Some("fragment_output_attachment"),
                    size: wgpu::Extent3d {
                        width: attachment.width,
                        height: attachment.height,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: format.to_wgpu(),
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
                    view_formats: &[],
                })
            })?;
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

            states.push(AttachmentState {
                location,
                format,
                reference_format: format.reference_format(),
                read_format: format.read_format(),
                input,
                written_channels,
                precision,
                texture,
                view,
            });
        }
        Ok(states)
    }

    fn draw(&self, gpu: &GpuContext, prepared: &PreparedDraw, states: &[AttachmentState]) -> Result<()> {
        let words = pack_vertices(&prepared.grid, &prepared.inputs);
        let index_count = prepared.grid.indices().len() as u32;

        gpu.with_validation(&self.name, |device| {
            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("fragment_output_vertices"),
                contents: bytemuck::cast_slice(&words),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("fragment_output_indices"),
                contents: bytemuck::cast_slice(prepared.grid.indices()),
                usage: wgpu::BufferUsages::INDEX,
            });

            let mut color_attachments: SmallVec<
                [Option<wgpu::RenderPassColorAttachment>; MAX_COLOR_TARGETS],
            > = SmallVec::from_elem(None, self.spec.attachments.len());
            for state in states {
                color_attachments[state.location as usize] = Some(wgpu::RenderPassColorAttachment {
                    view: &state.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                });
            }

            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("fragment_output_encoder"),
            });
            {
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("fragment_output_pass"),
                    color_attachments: &color_attachments,
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
                pass.set_pipeline(&prepared.pipeline);
                pass.set_vertex_buffer(0, vertex_buffer.slice(..));
                pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                pass.draw_indexed(0..index_count, 0, 0..1);
            }
            gpu.queue().submit(std::iter::once(encoder.finish()));
        })
    }

    fn verify(
        &self,
        gpu: &GpuContext,
        prepared: &PreparedDraw,
        states: &[AttachmentState],
    ) -> Result<Vec<ComparisonResult>> {
        let mut results = Vec::new();
        for state in states {
            let Some(input) = state.input.map(|index| &prepared.inputs[index]) else {
                continue;
            };

            let (width, height) = (state.texture.width(), state.texture.height());
            let bytes = gpu.read_texture(&state.texture, state.format)?;
            let rendered = PixelBuffer::from_bytes(state.format, width, height, &bytes)?
                .convert(state.read_format);

            let mut reference = PixelBuffer::new(state.reference_format, width, height);
            render_reference(&mut reference, &prepared.grid, input, state.format.is_srgb());

            let threshold = compute_threshold(state.format, state.precision, state.written_channels)?;
            let name = format!("attachment{}", state.location);
            let result = compare_images(&name, &reference, &rendered, threshold)?;

            if result.is_ok() {
                info!(
                    "[{}] {name} ({}): ok, max difference {:?}",
                    self.name, state.format, result.max_difference
                );
            } else {
                warn!(
                    "[{}] {name} ({}): {} of {} pixels over threshold {:?}, max difference {:?}",
                    self.name,
                    state.format,
                    result.mismatched_pixels,
                    result.total_pixels,
                    result.threshold,
                    result.max_difference
                );
                if let Some((x, y)) = result.first_mismatch {
                    warn!(
                        "[{}] {name} first mismatch at ({x}, {y}): expected {:?}, got {:?}",
                        self.name,
                        reference.get(x, y),
                        rendered.get(x, y)
                    );
                }
            }

            results.push(result);
        }
        Ok(results)
    }
}

impl TestCase for FragmentOutputCase {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn init(&mut self, gpu: &GpuContext) -> Result<()> {
        self.spec.validate()?;
        self.check_support(gpu)?;

        let (width, height) = self.spec.render_size();
        let grid = VertexGrid::for_size(width, height);
        let inputs = generate_inputs(&grid, &self.spec)?;
        let pipeline = self.create_pipeline(gpu, &inputs)?;

        debug!(
            "[{}] {}x{} vertex grid, {} inputs",
            self.name,
            grid.width(),
            grid.height(),
            inputs.len()
        );
        self.prepared = Some(PreparedDraw {
            grid,
            inputs,
            pipeline,
        });
        Ok(())
    }

    fn iterate(&mut self, gpu: &GpuContext) -> Result<IterateResult> {
        let prepared = self
            .prepared
            .as_ref()
            .ok_or_else(|| Error::InvalidOutput("case iterated before init".into()))?;

        let states = self.create_attachment_states(gpu, &prepared.inputs)?;
        self.draw(gpu, prepared, &states)?;
        let results = self.verify(gpu, prepared, &states)?;

        let failures: Vec<String> = results
            .iter()
            .filter(|result| !result.is_ok())
            .map(|result| {
                format!(
                    "{}: {} of {} pixels mismatched",
                    result.name, result.mismatched_pixels, result.total_pixels
                )
            })
            .collect();

        if failures.is_empty() {
            Ok(IterateResult::Done(Verdict::Pass))
        } else {
            Ok(IterateResult::Done(Verdict::Fail(failures.join("; "))))
        }
    }

    fn deinit(&mut self) {
        self.prepared = None;
    }
}

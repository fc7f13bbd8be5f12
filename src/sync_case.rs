use crate::error::{Error, Result};
use crate::format::PixelFormat;
use crate::gpu::GpuContext;
use crate::harness::{IterateResult, TestCase, Verdict};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Wall-clock ceiling on a single submission.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(1);
const TARGET_SIZE: u32 = 32;
const TARGET_FORMAT: PixelFormat = PixelFormat::Rgba8Unorm;

/// Color drawn in `round`, as 8-bit channels.
pub fn round_color(round: u32) -> [u8; 4] {
    [
        (round.wrapping_mul(53).wrapping_add(17) % 256) as u8,
        (round.wrapping_mul(101).wrapping_add(211) % 256) as u8,
        (round.wrapping_mul(29).wrapping_add(90) % 256) as u8,
        255,
    ]
}

fn solid_color_wgsl(color: [u8; 4]) -> String {
    let [r, g, b, a] = color.map(|channel| channel as f32 / 255.0);
    format!(
        r#"
@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> @builtin(position) vec4<f32> {{
    let x = f32(i32(index & 1u) * 4 - 1);
    let y = f32(i32(index >> 1u) * 4 - 1);
    return vec4<f32>(x, y, 0.0, 1.0);
}}

@fragment
fn fs_main() -> @location(0) vec4<f32> {{
    return vec4<f32>({r:?}, {g:?}, {b:?}, {a:?});
}}
"#
    )
}

enum SyncState {
    Draw,
    Verify {
        submitted_at: Instant,
        done: Arc<AtomicBool>,
    },
    Finish,
}

struct SyncTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

pub struct SubmissionSyncCase {
    name: String,
    description: String,
    rounds: u32,
    timeout: Duration,
    round: u32,
    state: SyncState,
    target: Option<SyncTarget>,
}

impl SubmissionSyncCase {
    pub fn new(name: impl Into<String>, description: impl Into<String>, rounds: u32) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            rounds: rounds.max(1),
            timeout: DEFAULT_WAIT_TIMEOUT,
            round: 0,
            state: SyncState::Draw,
            target: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    fn target(&self) -> Result<&SyncTarget> {
        self.target
            .as_ref()
            .ok_or_else(|| Error::InvalidOutput("case iterated before init".into()))
    }

    fn submit_draw(&self, gpu: &GpuContext) -> Result<Arc<AtomicBool>> {
        let target = self.target()?;
        let source = solid_color_wgsl(round_color(self.round));

        gpu.with_validation(&self.name, |device| {
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("sync_shader"),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
            let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("sync_pipeline"),
                layout: None,
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: TARGET_FORMAT.to_wgpu(),
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sync_encoder"),
            });
            {
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("sync_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &target.view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
                pass.set_pipeline(&pipeline);
                pass.draw(0..3, 0..1);
            }
            gpu.queue().submit(std::iter::once(encoder.finish()));

            let done = Arc::new(AtomicBool::new(false));
            let signal = done.clone();
            gpu.queue().on_submitted_work_done(move || {
                signal.store(true, Ordering::Release);
            });
            done
        })
    }

    fn check_target(&self, gpu: &GpuContext) -> Result<Verdict> {
        let target = self.target()?;
        let pixels = gpu.read_texture(&target.texture, TARGET_FORMAT)?;
        let expected = round_color(self.round);

        let mismatched = pixels
            .chunks_exact(4)
            .filter(|texel| {
                texel
                    .iter()
                    .zip(expected.iter())
                    .any(|(actual, expected)| actual.abs_diff(*expected) > 1)
            })
            .count();

        if mismatched == 0 {
            Ok(Verdict::Pass)
        } else {
            Ok(Verdict::Fail(format!(
                "round {}: {mismatched} pixels differ from {expected:?}",
                self.round
            )))
        }
    }
}

impl TestCase for SubmissionSyncCase {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn init(&mut self, gpu: &GpuContext) -> Result<()> {
        let texture = gpu.device().create_texture(&wgpu::TextureDescriptor {
            label: Some("sync_target"),
            size: wgpu::Extent3d {
                width: TARGET_SIZE,
                height: TARGET_SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT.to_wgpu(),
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.target = Some(SyncTarget { texture, view });
        self.round = 0;
        self.state = SyncState::Draw;
        Ok(())
    }

    fn iterate(&mut self, gpu: &GpuContext) -> Result<IterateResult> {
        match &self.state {
            SyncState::Draw => {
                let done = self.submit_draw(gpu)?;
                debug!("[{}] round {} submitted", self.name, self.round);
                self.state = SyncState::Verify {
                    submitted_at: Instant::now(),
                    done,
                };
                Ok(IterateResult::Continue)
            }
            SyncState::Verify { submitted_at, done } => {
                // Callbacks only fire from a poll, so the first check always
                // sees the submission as pending.
                if done.load(Ordering::Acquire) {
                    debug!(
                        "[{}] round {} done after {:?}",
                        self.name,
                        self.round,
                        submitted_at.elapsed()
                    );
                    self.state = SyncState::Finish;
                } else if submitted_at.elapsed() >= self.timeout {
                    return Err(Error::Timeout(self.timeout));
                } else {
                    gpu.device().poll(wgpu::PollType::Poll)?;
                    std::thread::sleep(POLL_INTERVAL);
                }
                Ok(IterateResult::Continue)
            }
            SyncState::Finish => {
                let verdict = self.check_target(gpu)?;
                if verdict != Verdict::Pass {
                    return Ok(IterateResult::Done(verdict));
                }

                self.round += 1;
                if self.round < self.rounds {
                    self.state = SyncState::Draw;
                    Ok(IterateResult::Continue)
                } else {
                    info!("[{}] {} rounds completed", self.name, self.rounds);
                    Ok(IterateResult::Done(Verdict::Pass))
                }
            }
        }
    }

    fn deinit(&mut self) {
        self.target = None;
        self.state = SyncState::Draw;
    }
}

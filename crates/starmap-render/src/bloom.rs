//! Bloom chain: an HDR scene target plus a downsample/upsample mip chain.
//!
//! The glow subset of the scene is rendered into [`BloomChain::scene_view`].
//! [`BloomChain::execute`] then extracts bright pixels into the first mip,
//! blurs them down the chain and accumulates them back up. The blurred result
//! in [`BloomChain::output_view`] is never displayed directly; the combine
//! pass reads it.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

/// Upper bound on mip levels.
pub const MAX_BLOOM_ITERATIONS: u32 = 8;

/// Bloom parameters. Strength lives in the combine pass.
#[derive(Clone, Debug, PartialEq)]
pub struct BloomConfig {
    /// Luminance threshold. Pixels below it do not glow. 0 lets everything through.
    pub threshold: f32,
    /// Soft knee as a fraction of the threshold. Range \[0, 1\].
    pub soft_knee: f32,
    /// Scales the blur tap offset.
    pub radius: f32,
    /// Number of mip levels. Clamped to \[1, [`MAX_BLOOM_ITERATIONS`]\].
    pub iterations: u32,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            soft_knee: 0.5,
            radius: 1.0,
            iterations: 5,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(crate) struct BloomParams {
    pub threshold: f32,
    pub knee: f32,
    pub radius: f32,
    pub _padding: f32,
}

impl BloomParams {
    fn from_config(config: &BloomConfig) -> Self {
        Self {
            threshold: config.threshold.max(0.0),
            knee: config.threshold.max(0.0) * config.soft_knee.clamp(0.0, 1.0),
            radius: config.radius.max(0.0),
            _padding: 0.0,
        }
    }
}

/// WGSL for the extract, downsample and upsample passes.
pub const BLOOM_SHADER_SOURCE: &str = r#"
struct BloomParams {
    threshold: f32,
    knee: f32,
    radius: f32,
    _padding: f32,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@group(0) @binding(0) var<uniform> params: BloomParams;
@group(1) @binding(0) var input_tex: texture_2d<f32>;
@group(1) @binding(1) var input_sampler: sampler;

@vertex
fn vs_fullscreen(@builtin(vertex_index) idx: u32) -> VertexOutput {
    let uv = vec2<f32>(f32((idx << 1u) & 2u), f32(idx & 2u));
    var out: VertexOutput;
    out.position = vec4<f32>(uv * 2.0 - 1.0, 0.0, 1.0);
    out.uv = vec2<f32>(uv.x, 1.0 - uv.y);
    return out;
}

fn soft_threshold(color: vec3<f32>) -> vec3<f32> {
    let luminance = dot(color, vec3<f32>(0.2126, 0.7152, 0.0722));
    let soft = clamp(luminance - params.threshold + params.knee, 0.0, 2.0 * params.knee);
    let contribution = soft * soft / (4.0 * params.knee + 0.0001);
    let factor = max(luminance - params.threshold, contribution) / max(luminance, 0.0001);
    return color * max(factor, 0.0);
}

fn tent(uv: vec2<f32>) -> vec3<f32> {
    let texel = params.radius / vec2<f32>(textureDimensions(input_tex));
    let a = textureSample(input_tex, input_sampler, uv + vec2(-texel.x, -texel.y)).rgb;
    let b = textureSample(input_tex, input_sampler, uv + vec2( texel.x, -texel.y)).rgb;
    let c = textureSample(input_tex, input_sampler, uv + vec2(-texel.x,  texel.y)).rgb;
    let d = textureSample(input_tex, input_sampler, uv + vec2( texel.x,  texel.y)).rgb;
    return (a + b + c + d) * 0.25;
}

@fragment
fn fs_extract(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(input_tex, input_sampler, in.uv).rgb;
    return vec4<f32>(soft_threshold(color), 1.0);
}

@fragment
fn fs_downsample(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(tent(in.uv), 1.0);
}

@fragment
fn fs_upsample(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(tent(in.uv), 1.0);
}
"#;

/// Sizes of each mip level, starting at half resolution.
pub fn mip_chain_sizes(width: u32, height: u32, iterations: u32) -> Vec<(u32, u32)> {
    let mut sizes = Vec::new();
    let mut w = (width / 2).max(1);
    let mut h = (height / 2).max(1);
    for _ in 0..iterations.clamp(1, MAX_BLOOM_ITERATIONS) {
        sizes.push((w, h));
        w = (w / 2).max(1);
        h = (h / 2).max(1);
    }
    sizes
}

/// Luminance-threshold factor matching `soft_threshold` in the shader.
pub fn soft_threshold_factor(luminance: f32, config: &BloomConfig) -> f32 {
    let p = BloomParams::from_config(config);
    let soft = (luminance - p.threshold + p.knee).clamp(0.0, 2.0 * p.knee);
    let contribution = soft * soft / (4.0 * p.knee + 0.0001);
    ((luminance - p.threshold).max(contribution) / luminance.max(0.0001)).max(0.0)
}

struct Target {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
}

/// Owns the glow-subset HDR target, the mip chain and the blur pipelines.
pub struct BloomChain {
    config: BloomConfig,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
    texture_bgl: wgpu::BindGroupLayout,
    extract_pipeline: wgpu::RenderPipeline,
    downsample_pipeline: wgpu::RenderPipeline,
    upsample_pipeline: wgpu::RenderPipeline,
    sampler: wgpu::Sampler,
    params_buffer: wgpu::Buffer,
    params_bind_group: wgpu::BindGroup,
    scene: Target,
    mips: Vec<Target>,
}

impl BloomChain {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        config: BloomConfig,
    ) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("bloom-shader"),
            source: wgpu::ShaderSource::Wgsl(BLOOM_SHADER_SOURCE.into()),
        });

        let params_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("bloom-params-bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: std::num::NonZeroU64::new(16),
                },
                count: None,
            }],
        });
        let texture_bgl = create_texture_bgl(device, "bloom-texture-bgl");

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("bloom-layout"),
            bind_group_layouts: &[&params_bgl, &texture_bgl],
            immediate_size: 0,
        });

        let extract_pipeline = create_fullscreen_pipeline(
            device,
            &shader,
            &layout,
            "fs_extract",
            format,
            None,
            "bloom-extract",
        );
        let downsample_pipeline = create_fullscreen_pipeline(
            device,
            &shader,
            &layout,
            "fs_downsample",
            format,
            None,
            "bloom-downsample",
        );
        let upsample_pipeline = create_fullscreen_pipeline(
            device,
            &shader,
            &layout,
            "fs_upsample",
            format,
            Some(ADDITIVE_BLEND),
            "bloom-upsample",
        );

        let sampler = create_linear_sampler(device, "bloom-sampler");

        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("bloom-params"),
            contents: bytemuck::cast_slice(&[BloomParams::from_config(&config)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let params_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("bloom-params-bg"),
            layout: &params_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: params_buffer.as_entire_binding(),
            }],
        });

        let scene = create_target(
            device,
            &texture_bgl,
            &sampler,
            format,
            width,
            height,
            "bloom-scene",
        );
        let mips = create_mip_chain(
            device,
            &texture_bgl,
            &sampler,
            format,
            width,
            height,
            config.iterations,
        );

        Self {
            config,
            format,
            width,
            height,
            texture_bgl,
            extract_pipeline,
            downsample_pipeline,
            upsample_pipeline,
            sampler,
            params_buffer,
            params_bind_group,
            scene,
            mips,
        }
    }

    /// Target the glow subset is rendered into.
    pub fn scene_view(&self) -> &wgpu::TextureView {
        &self.scene.view
    }

    /// Blurred bloom texture, valid after [`execute`](Self::execute).
    pub fn output_view(&self) -> &wgpu::TextureView {
        // mip_chain_sizes always yields at least one level
        &self.mips[0].view
    }

    pub fn config(&self) -> &BloomConfig {
        &self.config
    }

    /// Size of the glow-subset scene target.
    pub fn scene_dimensions(&self) -> (u32, u32) {
        (self.scene.texture.width(), self.scene.texture.height())
    }

    /// Viewport size the chain was built for.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn mip_dimensions(&self) -> Vec<(u32, u32)> {
        self.mips
            .iter()
            .map(|m| (m.texture.width(), m.texture.height()))
            .collect()
    }

    /// Recreate every target for a new viewport size. Returns `false` when the
    /// size is unchanged and nothing was done.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) -> bool {
        let (width, height) = (width.max(1), height.max(1));
        if width == self.width && height == self.height {
            return false;
        }
        self.destroy_targets();
        self.width = width;
        self.height = height;
        self.scene = create_target(
            device,
            &self.texture_bgl,
            &self.sampler,
            self.format,
            width,
            height,
            "bloom-scene",
        );
        self.mips = create_mip_chain(
            device,
            &self.texture_bgl,
            &self.sampler,
            self.format,
            width,
            height,
            self.config.iterations,
        );
        true
    }

    /// Upload new threshold, knee or radius. The iteration count is fixed at
    /// construction.
    pub fn update_config(&mut self, queue: &wgpu::Queue, config: BloomConfig) {
        queue.write_buffer(
            &self.params_buffer,
            0,
            bytemuck::cast_slice(&[BloomParams::from_config(&config)]),
        );
        self.config = BloomConfig {
            iterations: self.config.iterations,
            ..config
        };
    }

    /// Extract, downsample, then additively upsample back into mip 0.
    ///
    /// A black scene target yields a black output.
    pub fn execute(&self, encoder: &mut wgpu::CommandEncoder) {
        self.run_pass(
            encoder,
            &self.extract_pipeline,
            &self.scene.bind_group,
            &self.mips[0].view,
            wgpu::LoadOp::Clear(wgpu::Color::BLACK),
            "bloom-extract",
        );

        for i in 1..self.mips.len() {
            self.run_pass(
                encoder,
                &self.downsample_pipeline,
                &self.mips[i - 1].bind_group,
                &self.mips[i].view,
                wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                "bloom-downsample",
            );
        }

        for i in (0..self.mips.len().saturating_sub(1)).rev() {
            self.run_pass(
                encoder,
                &self.upsample_pipeline,
                &self.mips[i + 1].bind_group,
                &self.mips[i].view,
                wgpu::LoadOp::Load,
                "bloom-upsample",
            );
        }
    }

    fn run_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        pipeline: &wgpu::RenderPipeline,
        texture_bind_group: &wgpu::BindGroup,
        target_view: &wgpu::TextureView,
        load_op: wgpu::LoadOp<wgpu::Color>,
        label: &str,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: load_op,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.params_bind_group, &[]);
        pass.set_bind_group(1, texture_bind_group, &[]);
        pass.draw(0..3, 0..1);
    }

    fn destroy_targets(&mut self) {
        self.scene.texture.destroy();
        for mip in &self.mips {
            mip.texture.destroy();
        }
    }
}

pub(crate) const ADDITIVE_BLEND: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent::OVER,
};

/// Layout for a sampled texture plus its sampler.
pub(crate) fn create_texture_bgl(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

pub(crate) fn create_linear_sampler(device: &wgpu::Device, label: &str) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

/// Fullscreen-triangle pipeline sharing `vs_fullscreen` from `shader`.
pub(crate) fn create_fullscreen_pipeline(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    fragment_entry: &str,
    target_format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_fullscreen"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format: target_format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview_mask: None,
        cache: None,
    })
}

fn create_target(
    device: &wgpu::Device,
    texture_bgl: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
    label: &str,
) -> Target {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout: texture_bgl,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });
    Target {
        texture,
        view,
        bind_group,
    }
}

fn create_mip_chain(
    device: &wgpu::Device,
    texture_bgl: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
    iterations: u32,
) -> Vec<Target> {
    mip_chain_sizes(width, height, iterations)
        .into_iter()
        .enumerate()
        .map(|(i, (w, h))| {
            log::trace!("Bloom mip {i}: {w}x{h}");
            create_target(device, texture_bgl, sampler, format, w, h, "bloom-mip")
        })
        .collect()
}

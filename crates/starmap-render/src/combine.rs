//! Fullscreen combine pass: base image plus scaled bloom, tone mapped to the
//! display surface.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::bloom::{create_fullscreen_pipeline, create_linear_sampler};

/// Combine-pass scalars.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CombineSettings {
    /// Scene brightness multiplier applied before tone mapping.
    pub exposure: f32,
    /// Multiplier on the bloom texture.
    pub bloom_strength: f32,
}

impl Default for CombineSettings {
    fn default() -> Self {
        Self {
            exposure: 2.0,
            bloom_strength: 10.0,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct CombineParams {
    exposure: f32,
    bloom_strength: f32,
    _padding: [f32; 2],
}

impl From<CombineSettings> for CombineParams {
    fn from(settings: CombineSettings) -> Self {
        Self {
            exposure: settings.exposure.max(0.0),
            bloom_strength: settings.bloom_strength.max(0.0),
            _padding: [0.0; 2],
        }
    }
}

/// WGSL for the combine pass.
pub const COMBINE_SHADER_SOURCE: &str = r#"
struct CombineParams {
    exposure: f32,
    bloom_strength: f32,
    _padding: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@group(0) @binding(0) var<uniform> params: CombineParams;
@group(1) @binding(0) var base_tex: texture_2d<f32>;
@group(1) @binding(1) var bloom_tex: texture_2d<f32>;
@group(1) @binding(2) var tex_sampler: sampler;

@vertex
fn vs_fullscreen(@builtin(vertex_index) idx: u32) -> VertexOutput {
    let uv = vec2<f32>(f32((idx << 1u) & 2u), f32(idx & 2u));
    var out: VertexOutput;
    out.position = vec4<f32>(uv * 2.0 - 1.0, 0.0, 1.0);
    out.uv = vec2<f32>(uv.x, 1.0 - uv.y);
    return out;
}

@fragment
fn fs_combine(in: VertexOutput) -> @location(0) vec4<f32> {
    let base = textureSample(base_tex, tex_sampler, in.uv).rgb;
    let bloom = textureSample(bloom_tex, tex_sampler, in.uv).rgb;
    let hdr = (base + params.bloom_strength * bloom) * params.exposure;
    let mapped = clamp(hdr / (vec3<f32>(1.0) + hdr), vec3<f32>(0.0), vec3<f32>(1.0));
    return vec4<f32>(mapped, 1.0);
}
"#;

/// CPU mirror of `fs_combine` for one linear RGB pixel.
pub fn combine_pixel(base: [f32; 3], bloom: [f32; 3], settings: CombineSettings) -> [f32; 3] {
    let params = CombineParams::from(settings);
    std::array::from_fn(|i| {
        let hdr = (base[i] + params.bloom_strength * bloom[i]) * params.exposure;
        (hdr / (1.0 + hdr)).clamp(0.0, 1.0)
    })
}

/// Owns the combine pipeline and the bind group over the base and bloom images.
pub struct CombinePass {
    pipeline: wgpu::RenderPipeline,
    inputs_bgl: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    params_buffer: wgpu::Buffer,
    params_bind_group: wgpu::BindGroup,
    inputs_bind_group: wgpu::BindGroup,
    settings: CombineSettings,
}

impl CombinePass {
    pub fn new(
        device: &wgpu::Device,
        output_format: wgpu::TextureFormat,
        base_view: &wgpu::TextureView,
        bloom_view: &wgpu::TextureView,
        settings: CombineSettings,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("combine-shader"),
            source: wgpu::ShaderSource::Wgsl(COMBINE_SHADER_SOURCE.into()),
        });

        let params_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("combine-params-bgl"),
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

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let inputs_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("combine-inputs-bgl"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("combine-layout"),
            bind_group_layouts: &[&params_bgl, &inputs_bgl],
            immediate_size: 0,
        });

        let pipeline = create_fullscreen_pipeline(
            device,
            &shader,
            &layout,
            "fs_combine",
            output_format,
            None,
            "combine",
        );

        let sampler = create_linear_sampler(device, "combine-sampler");

        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("combine-params"),
            contents: bytemuck::cast_slice(&[CombineParams::from(settings)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let params_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("combine-params-bg"),
            layout: &params_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: params_buffer.as_entire_binding(),
            }],
        });

        let inputs_bind_group =
            create_inputs_bind_group(device, &inputs_bgl, &sampler, base_view, bloom_view);

        Self {
            pipeline,
            inputs_bgl,
            sampler,
            params_buffer,
            params_bind_group,
            inputs_bind_group,
            settings,
        }
    }

    /// Point the pass at new input views after a resize.
    pub fn rebind(
        &mut self,
        device: &wgpu::Device,
        base_view: &wgpu::TextureView,
        bloom_view: &wgpu::TextureView,
    ) {
        self.inputs_bind_group = create_inputs_bind_group(
            device,
            &self.inputs_bgl,
            &self.sampler,
            base_view,
            bloom_view,
        );
    }

    pub fn settings(&self) -> CombineSettings {
        self.settings
    }

    pub fn update_settings(&mut self, queue: &wgpu::Queue, settings: CombineSettings) {
        queue.write_buffer(
            &self.params_buffer,
            0,
            bytemuck::cast_slice(&[CombineParams::from(settings)]),
        );
        self.settings = settings;
    }

    /// Draw the fullscreen combine into `target`, clearing it first.
    pub fn execute(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("combine"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.params_bind_group, &[]);
        pass.set_bind_group(1, &self.inputs_bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

fn create_inputs_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    base_view: &wgpu::TextureView,
    bloom_view: &wgpu::TextureView,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("combine-inputs-bg"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(base_view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(bloom_view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_black_bloom_leaves_base_unchanged() {
        let settings = CombineSettings::default();
        let base = [0.8, 0.4, 0.1];
        let with_black_bloom = combine_pixel(base, [0.0; 3], settings);
        let without_bloom = combine_pixel(
            base,
            [0.0; 3],
            CombineSettings {
                bloom_strength: 0.0,
                ..settings
            },
        );
        assert_eq!(with_black_bloom, without_bloom);
    }

    #[test]
    fn test_bloom_adds_energy() {
        let settings = CombineSettings::default();
        let base = [0.1, 0.1, 0.1];
        let plain = combine_pixel(base, [0.0; 3], settings);
        let glowing = combine_pixel(base, [0.05; 3], settings);
        assert!(glowing.iter().zip(&plain).all(|(g, p)| g > p));
    }

    #[test]
    fn test_reinhard_with_exposure() {
        let settings = CombineSettings {
            exposure: 2.0,
            bloom_strength: 0.0,
        };
        // 0.5 * 2 = 1 maps to 1 / (1 + 1)
        let out = combine_pixel([0.5, 0.0, 0.0], [0.0; 3], settings);
        assert!((out[0] - 0.5).abs() < 1e-6);
        assert_eq!(out[1], 0.0);
    }

    #[test]
    fn test_output_stays_below_one() {
        let out = combine_pixel([100.0; 3], [100.0; 3], CombineSettings::default());
        assert!(out.iter().all(|&c| c < 1.0 && c > 0.99));
    }

    #[test]
    fn test_params_uniform_size() {
        assert_eq!(std::mem::size_of::<CombineParams>(), 16);
    }
}

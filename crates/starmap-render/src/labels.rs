//! Label overlay drawn last, straight onto the display surface.
//!
//! Each label anchor is projected to screen space and drawn as a small square
//! marker of fixed pixel size. Because it runs after the combine pass, labels
//! never pass through the bloom chain.

use bytemuck::{Pod, Zeroable};
use starmap_scene::SceneGraph;

use crate::camera::Camera;

/// Marker edge length in physical pixels.
pub const MARKER_SIZE_PX: f32 = 4.0;

/// One on-screen marker.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct LabelMarker {
    /// Center in normalized device coordinates.
    pub center: [f32; 2],
    /// Half extent in normalized device coordinates.
    pub half_size: [f32; 2],
    /// Linear RGBA color.
    pub color: [f32; 4],
}

impl LabelMarker {
    fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
            wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2, 2 => Float32x4];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Project every label anchor in `scene`, dropping anchors behind the camera
/// or outside the clip volume.
pub fn collect_markers(
    camera: &Camera,
    scene: &SceneGraph,
    width: u32,
    height: u32,
) -> Vec<LabelMarker> {
    let half_size = [
        MARKER_SIZE_PX / width.max(1) as f32,
        MARKER_SIZE_PX / height.max(1) as f32,
    ];
    scene
        .iter()
        .filter_map(|proxy| {
            let ndc = camera.project_to_ndc(proxy.label_anchor())?;
            let [r, g, b] = proxy.label().color().to_linear();
            Some(LabelMarker {
                center: [ndc.x, ndc.y],
                half_size,
                color: [r, g, b, 1.0],
            })
        })
        .collect()
}

const LABEL_SHADER_SOURCE: &str = r#"
struct MarkerInput {
    @location(0) center: vec2<f32>,
    @location(1) half_size: vec2<f32>,
    @location(2) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) idx: u32, marker: MarkerInput) -> VertexOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
    );
    var out: VertexOutput;
    out.position = vec4<f32>(marker.center + corners[idx] * marker.half_size, 0.0, 1.0);
    out.color = marker.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

/// GPU side of the label pass.
pub struct LabelOverlay {
    pipeline: wgpu::RenderPipeline,
    buffer: Option<wgpu::Buffer>,
    capacity: usize,
    count: u32,
    width: u32,
    height: u32,
}

impl LabelOverlay {
    pub fn new(
        device: &wgpu::Device,
        output_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("label-shader"),
            source: wgpu::ShaderSource::Wgsl(LABEL_SHADER_SOURCE.into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("label-layout"),
            bind_group_layouts: &[],
            immediate_size: 0,
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("label-pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[LabelMarker::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: output_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        Self {
            pipeline,
            buffer: None,
            capacity: 0,
            count: 0,
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Track the surface size markers are laid out against.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of markers drawn by the next [`execute`](Self::execute).
    pub fn marker_count(&self) -> u32 {
        self.count
    }

    /// Rebuild marker data for this frame. The buffer only grows; it is
    /// replaced when the marker count exceeds its capacity.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        camera: &Camera,
        scene: &SceneGraph,
    ) {
        let markers = collect_markers(camera, scene, self.width, self.height);
        self.count = markers.len() as u32;
        if markers.is_empty() {
            return;
        }

        if markers.len() > self.capacity {
            if let Some(old) = self.buffer.take() {
                old.destroy();
            }
            let capacity = markers.len().next_power_of_two();
            self.buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("label-markers"),
                size: (capacity * std::mem::size_of::<LabelMarker>()) as wgpu::BufferAddress,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.capacity = capacity;
            log::debug!("Label marker buffer grown to {capacity}");
        }

        if let Some(buffer) = &self.buffer {
            queue.write_buffer(buffer, 0, bytemuck::cast_slice(&markers));
        }
    }

    /// Draw markers over whatever `target` already holds.
    pub fn execute(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        let Some(buffer) = self.buffer.as_ref().filter(|_| self.count > 0) else {
            return;
        };
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("labels"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
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
        pass.set_vertex_buffer(0, buffer.slice(..));
        pass.draw(0..6, 0..self.count);
    }
}

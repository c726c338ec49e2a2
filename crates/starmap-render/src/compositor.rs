//! Dual-pass selective bloom compositor.
//!
//! Each frame renders the scene twice. The glow subset goes into the bloom
//! chain and gets blurred; the full scene goes into the base target unblurred.
//! A combine pass adds the two and tone maps onto the output, and labels are
//! drawn on top last.

use starmap_scene::{GLOW_LAYER, Layers, PROXY_SUBDIVISIONS, SceneGraph, generate_icosphere};
use wgpu::util::DeviceExt;

use crate::bloom::{BloomChain, BloomConfig};
use crate::buffer::{BufferAllocator, InstanceBuffer, MeshBuffer, StarInstance};
use crate::camera::Camera;
use crate::combine::{CombinePass, CombineSettings};
use crate::depth::DepthBuffer;
use crate::labels::LabelOverlay;
use crate::pass::RenderPassBuilder;
use crate::star_pipeline::StarPipeline;

/// Format of the bloom-scene and base targets.
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Everything tunable about the composite.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompositorSettings {
    pub bloom: BloomConfig,
    pub combine: CombineSettings,
}

/// Sizes of every viewport-sized target, for checking lockstep resizes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetDimensions {
    pub bloom_scene: (u32, u32),
    pub bloom_mips: Vec<(u32, u32)>,
    pub base: (u32, u32),
    pub depth: (u32, u32),
    pub labels: (u32, u32),
}

impl TargetDimensions {
    /// Whether every full-resolution target is `width` x `height`.
    pub fn all_match(&self, width: u32, height: u32) -> bool {
        let size = (width, height);
        self.bloom_scene == size && self.base == size && self.depth == size && self.labels == size
    }
}

struct HdrTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl HdrTarget {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("base-hdr"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: HDR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

/// Owns every render target and pipeline involved in producing a frame.
pub struct Compositor {
    width: u32,
    height: u32,
    star_pipeline: StarPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    proxy_mesh: MeshBuffer,
    glow_instances: InstanceBuffer,
    all_instances: InstanceBuffer,
    synced_generation: Option<u64>,
    depth: DepthBuffer,
    base: HdrTarget,
    bloom: BloomChain,
    combine: CombinePass,
    labels: LabelOverlay,
}

impl Compositor {
    /// `output_format` is the format of the view passed to [`render`](Self::render).
    pub fn new(
        device: &wgpu::Device,
        output_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        settings: CompositorSettings,
    ) -> Self {
        let (width, height) = (width.max(1), height.max(1));

        let star_pipeline = StarPipeline::new(device, HDR_FORMAT);
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera-uniform"),
            contents: bytemuck::cast_slice(&[Camera::default().to_uniform()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera-bg"),
            layout: &star_pipeline.camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let proxy_mesh = BufferAllocator::new(device)
            .create_icosphere("star-proxy", &generate_icosphere(PROXY_SUBDIVISIONS));

        let depth = DepthBuffer::new(device, width, height);
        let base = HdrTarget::new(device, width, height);
        let bloom = BloomChain::new(device, HDR_FORMAT, width, height, settings.bloom);
        let combine = CombinePass::new(
            device,
            output_format,
            &base.view,
            bloom.output_view(),
            settings.combine,
        );
        let labels = LabelOverlay::new(device, output_format, width, height);

        log::info!("Compositor created at {width}x{height}");

        Self {
            width,
            height,
            star_pipeline,
            camera_buffer,
            camera_bind_group,
            proxy_mesh,
            glow_instances: InstanceBuffer::empty(),
            all_instances: InstanceBuffer::empty(),
            synced_generation: None,
            depth,
            base,
            bloom,
            combine,
            labels,
        }
    }

    /// Resize every target together. Zero is clamped to 1; an unchanged size
    /// returns `false` without touching anything.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) -> bool {
        let (width, height) = (width.max(1), height.max(1));
        if width == self.width && height == self.height {
            return false;
        }

        self.width = width;
        self.height = height;
        self.depth.resize(device, width, height);
        self.base.texture.destroy();
        self.base = HdrTarget::new(device, width, height);
        self.bloom.resize(device, width, height);
        self.combine.rebind(device, &self.base.view, self.bloom.output_view());
        self.labels.resize(width, height);

        log::debug!("Compositor resized to {width}x{height}");
        true
    }

    pub fn dimensions(&self) -> TargetDimensions {
        TargetDimensions {
            bloom_scene: self.bloom.scene_dimensions(),
            bloom_mips: self.bloom.mip_dimensions(),
            base: (self.base.texture.width(), self.base.texture.height()),
            depth: self.depth.dimensions(),
            labels: self.labels.dimensions(),
        }
    }

    /// Instances currently uploaded for the glow pass and the base pass.
    pub fn instance_counts(&self) -> (u32, u32) {
        (self.glow_instances.count(), self.all_instances.count())
    }

    pub fn settings(&self) -> CompositorSettings {
        CompositorSettings {
            bloom: self.bloom.config().clone(),
            combine: self.combine.settings(),
        }
    }

    pub fn update_settings(&mut self, queue: &wgpu::Queue, settings: CompositorSettings) {
        self.bloom.update_config(queue, settings.bloom);
        self.combine.update_settings(queue, settings.combine);
    }

    /// Re-upload instance data if the scene changed since the last sync.
    /// The previous buffers are destroyed first. Returns whether anything was
    /// uploaded.
    pub fn sync_scene(&mut self, device: &wgpu::Device, scene: &SceneGraph) -> bool {
        if self.synced_generation == Some(scene.generation()) {
            return false;
        }

        self.glow_instances.destroy();
        self.all_instances.destroy();

        let glow: Vec<StarInstance> = scene
            .visible_in(Layers::only(GLOW_LAYER))
            .map(StarInstance::from_proxy)
            .collect();
        let all: Vec<StarInstance> = scene.iter().map(StarInstance::from_proxy).collect();

        let allocator = BufferAllocator::new(device);
        self.glow_instances = allocator.create_instances("glow-instances", &glow);
        self.all_instances = allocator.create_instances("all-instances", &all);
        self.synced_generation = Some(scene.generation());

        log::debug!(
            "Uploaded {} glow / {} total star instances (generation {})",
            glow.len(),
            all.len(),
            scene.generation()
        );
        true
    }

    /// Record the whole frame into `encoder`, ending on `target`.
    ///
    /// An empty scene produces a cleared frame.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        camera: &Camera,
        scene: &SceneGraph,
        target: &wgpu::TextureView,
    ) {
        self.sync_scene(device, scene);
        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[camera.to_uniform()]),
        );
        self.labels.prepare(device, queue, camera, scene);

        {
            let mut pass = RenderPassBuilder::new()
                .label("bloom-scene")
                .depth(self.depth.view.clone(), DepthBuffer::CLEAR_VALUE)
                .begin(encoder, self.bloom.scene_view());
            self.star_pipeline.draw(
                &mut pass,
                &self.camera_bind_group,
                &self.proxy_mesh,
                &self.glow_instances,
            );
        }
        self.bloom.execute(encoder);

        {
            let mut pass = RenderPassBuilder::new()
                .label("base")
                .depth(self.depth.view.clone(), DepthBuffer::CLEAR_VALUE)
                .begin(encoder, &self.base.view);
            self.star_pipeline.draw(
                &mut pass,
                &self.camera_bind_group,
                &self.proxy_mesh,
                &self.all_instances,
            );
        }

        self.combine.execute(encoder, target);
        self.labels.execute(encoder, target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_gpu::{TARGET_FORMAT, create_target, create_test_device, read_rgba8};
    use glam::Vec3;
    use starmap_scene::{SceneBuilder, StarProxyBuilder, StarRecord};

    fn close_camera(width: u32, height: u32) -> Camera {
        let mut camera = Camera::default();
        camera.set_aspect_ratio(width, height);
        camera.position = Vec3::new(0.0, 0.0, 3.0);
        camera.look_at(Vec3::ZERO);
        camera
    }

    fn render_frame(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        compositor: &mut Compositor,
        camera: &Camera,
        scene: &SceneGraph,
        size: u32,
    ) -> Vec<u8> {
        let (texture, view) = create_target(device, size, size);
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("test-frame"),
        });
        compositor.render(device, queue, &mut encoder, camera, scene, &view);
        queue.submit([encoder.finish()]);
        read_rgba8(device, queue, &texture)
    }

    fn has_color(pixels: &[u8]) -> bool {
        pixels.chunks_exact(4).any(|p| p[0] > 0 || p[1] > 0 || p[2] > 0)
    }

    #[test]
    fn test_dimensions_all_match_after_resize() {
        let Some((device, _queue)) = create_test_device() else {
            return;
        };
        let mut compositor =
            Compositor::new(&device, TARGET_FORMAT, 320, 240, CompositorSettings::default());
        assert!(compositor.dimensions().all_match(320, 240));

        assert!(compositor.resize(&device, 1280, 720));
        let dims = compositor.dimensions();
        assert!(dims.all_match(1280, 720));
        assert_eq!(dims.bloom_mips[0], (640, 360));

        assert!(!compositor.resize(&device, 1280, 720));
        assert!(compositor.resize(&device, 0, 0));
        assert!(compositor.dimensions().all_match(1, 1));
    }

    #[test]
    fn test_empty_scene_renders_black_frame() {
        let Some((device, queue)) = create_test_device() else {
            return;
        };
        let mut compositor =
            Compositor::new(&device, TARGET_FORMAT, 64, 64, CompositorSettings::default());
        let scene = SceneGraph::new();
        let camera = close_camera(64, 64);
        let pixels = render_frame(&device, &queue, &mut compositor, &camera, &scene, 64);
        assert_eq!(pixels.len(), 64 * 64 * 4);
        assert!(!has_color(&pixels));
    }

    #[test]
    fn test_single_star_renders_nonempty_frame() {
        let Some((device, queue)) = create_test_device() else {
            return;
        };
        let mut compositor =
            Compositor::new(&device, TARGET_FORMAT, 128, 128, CompositorSettings::default());
        let mut scene = SceneGraph::new();
        let record = StarRecord {
            spectral_class: "G".to_string(),
            position: Vec3::ZERO,
            display_name: None,
            abs_mag: None,
        };
        SceneBuilder::new().build(&[record], &mut scene);

        let camera = close_camera(128, 128);
        let pixels = render_frame(&device, &queue, &mut compositor, &camera, &scene, 128);
        assert!(has_color(&pixels));
        assert_eq!(compositor.instance_counts(), (1, 1));
    }

    #[test]
    fn test_no_glow_subset_adds_no_energy() {
        let Some((device, queue)) = create_test_device() else {
            return;
        };
        let mut scene = SceneGraph::new();
        let ledger = scene.ledger().clone();
        scene.add(StarProxyBuilder::new(Vec3::ZERO).glow(false).build(&ledger));
        let camera = close_camera(96, 96);

        let mut compositor =
            Compositor::new(&device, TARGET_FORMAT, 96, 96, CompositorSettings::default());
        assert_eq!(compositor.settings().combine.bloom_strength, 10.0);
        let with_bloom = render_frame(&device, &queue, &mut compositor, &camera, &scene, 96);
        assert_eq!(compositor.instance_counts(), (0, 1));

        let mut settings = compositor.settings();
        settings.combine.bloom_strength = 0.0;
        compositor.update_settings(&queue, settings);
        let base_only = render_frame(&device, &queue, &mut compositor, &camera, &scene, 96);

        assert!(has_color(&base_only));
        assert_eq!(with_bloom, base_only);
    }

    #[test]
    fn test_rebuild_replaces_instance_buffers() {
        let Some((device, _queue)) = create_test_device() else {
            return;
        };
        let mut compositor =
            Compositor::new(&device, TARGET_FORMAT, 32, 32, CompositorSettings::default());
        let mut scene = SceneGraph::new();
        let builder = SceneBuilder::new();
        let records: Vec<StarRecord> = (0..6)
            .map(|i| StarRecord {
                spectral_class: "k".to_string(),
                position: Vec3::splat(i as f32),
                display_name: None,
                abs_mag: None,
            })
            .collect();

        builder.build(&records, &mut scene);
        assert!(compositor.sync_scene(&device, &scene));
        assert!(!compositor.sync_scene(&device, &scene));
        assert_eq!(compositor.instance_counts(), (6, 6));

        builder.build(&records[..2], &mut scene);
        assert!(compositor.sync_scene(&device, &scene));
        assert_eq!(compositor.instance_counts(), (2, 2));
    }
}

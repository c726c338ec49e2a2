//! Vertex, index and per-instance buffers for star rendering.

use bytemuck::{Pod, Zeroable};
use starmap_scene::{IcosphereMesh, StarProxy};
use wgpu::util::DeviceExt;

/// Indexed mesh resident on the GPU.
pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl MeshBuffer {
    /// Bind vertex slot 0 and the index buffer.
    pub fn bind(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
    }
}

/// Creates GPU buffers from CPU data.
pub struct BufferAllocator<'a> {
    device: &'a wgpu::Device,
}

impl<'a> BufferAllocator<'a> {
    pub fn new(device: &'a wgpu::Device) -> Self {
        Self { device }
    }

    /// Upload an icosphere as a position/normal mesh.
    pub fn create_icosphere(&self, label: &str, mesh: &IcosphereMesh) -> MeshBuffer {
        let vertices: Vec<VertexPositionNormal> = mesh
            .positions
            .iter()
            .zip(&mesh.normals)
            .map(|(p, n)| VertexPositionNormal {
                position: p.to_array(),
                normal: n.to_array(),
            })
            .collect();
        self.create_mesh(label, bytemuck::cast_slice(&vertices), &mesh.indices)
    }

    pub fn create_mesh(&self, label: &str, vertices: &[u8], indices: &[u32]) -> MeshBuffer {
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label}-vertices")),
                contents: vertices,
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label}-indices")),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        MeshBuffer {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }

    /// Upload per-star instance data. An empty slice yields an empty buffer.
    pub fn create_instances(&self, label: &str, instances: &[StarInstance]) -> InstanceBuffer {
        if instances.is_empty() {
            return InstanceBuffer::empty();
        }
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(instances),
                usage: wgpu::BufferUsages::VERTEX,
            });
        InstanceBuffer {
            buffer: Some(buffer),
            count: instances.len() as u32,
        }
    }
}

/// Mesh vertex: position and normal on the unit sphere.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct VertexPositionNormal {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl VertexPositionNormal {
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
            wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Per-star instance data: model matrix columns and linear color.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct StarInstance {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl StarInstance {
    pub fn from_proxy(proxy: &StarProxy) -> Self {
        let [r, g, b] = proxy.color().to_linear();
        Self {
            model: proxy.model_matrix().to_cols_array_2d(),
            color: [r, g, b, 1.0],
        }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
            2 => Float32x4,
            3 => Float32x4,
            4 => Float32x4,
            5 => Float32x4,
            6 => Float32x4,
        ];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Instance data for one pass's subset of the scene.
pub struct InstanceBuffer {
    buffer: Option<wgpu::Buffer>,
    count: u32,
}

impl InstanceBuffer {
    pub fn empty() -> Self {
        Self {
            buffer: None,
            count: 0,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }

    /// Free the GPU allocation now rather than when the handle is dropped.
    pub fn destroy(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            buffer.destroy();
        }
        self.count = 0;
    }
}

impl Drop for InstanceBuffer {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_gpu::create_test_device;
    use glam::Vec3;
    use starmap_scene::{MaterialLedger, StarColor, StarProxyBuilder, generate_icosphere};

    #[test]
    fn test_vertex_layout_stride() {
        let layout = VertexPositionNormal::layout();
        assert_eq!(layout.array_stride, 24);
        assert_eq!(layout.attributes.len(), 2);
        assert_eq!(layout.step_mode, wgpu::VertexStepMode::Vertex);
    }

    #[test]
    fn test_instance_layout_stride() {
        let layout = StarInstance::layout();
        assert_eq!(layout.array_stride, 80);
        assert_eq!(layout.step_mode, wgpu::VertexStepMode::Instance);
        assert_eq!(layout.attributes[0].shader_location, 2);
    }

    #[test]
    fn test_instance_from_proxy() {
        let ledger = MaterialLedger::new();
        let proxy = StarProxyBuilder::new(Vec3::new(1.0, 2.0, 3.0))
            .color(Some(StarColor(0xffffff)))
            .build(&ledger);
        let instance = StarInstance::from_proxy(&proxy);
        assert_eq!(instance.model[3][..3], [1.0, 2.0, 3.0]);
        assert_eq!(instance.color, [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_empty_instances_allocate_nothing() {
        let Some((device, _queue)) = create_test_device() else {
            return;
        };
        let instances = BufferAllocator::new(&device).create_instances("empty", &[]);
        assert_eq!(instances.count(), 0);
        assert!(instances.buffer().is_none());
    }

    #[test]
    fn test_icosphere_upload_counts() {
        let Some((device, _queue)) = create_test_device() else {
            return;
        };
        let mesh = generate_icosphere(2);
        let buffer = BufferAllocator::new(&device).create_icosphere("proxy", &mesh);
        assert_eq!(buffer.index_count as usize, mesh.indices.len());
    }

    #[test]
    fn test_destroy_releases_buffer() {
        let Some((device, _queue)) = create_test_device() else {
            return;
        };
        let data = [StarInstance::zeroed(); 3];
        let mut instances = BufferAllocator::new(&device).create_instances("three", &data);
        assert_eq!(instances.count(), 3);
        instances.destroy();
        assert!(instances.buffer().is_none());
        assert_eq!(instances.count(), 0);
    }
}

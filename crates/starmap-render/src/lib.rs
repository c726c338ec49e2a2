//! wgpu rendering for the starmap viewer: surface management, the star
//! pipeline, the selective bloom chain, the combine pass and the label overlay.

pub mod bloom;
pub mod buffer;
pub mod camera;
pub mod combine;
pub mod compositor;
pub mod depth;
pub mod gpu;
pub mod labels;
pub mod pass;
pub mod star_pipeline;
pub mod surface;

#[cfg(test)]
mod test_gpu;

pub use bloom::{BloomChain, BloomConfig, MAX_BLOOM_ITERATIONS, mip_chain_sizes};
pub use buffer::{BufferAllocator, InstanceBuffer, MeshBuffer, StarInstance, VertexPositionNormal};
pub use camera::{Camera, CameraUniform};
pub use combine::{CombinePass, CombineSettings, combine_pixel};
pub use compositor::{Compositor, CompositorSettings, HDR_FORMAT, TargetDimensions};
pub use depth::DepthBuffer;
pub use gpu::{GpuContext, GpuContextError, SurfaceError, init_gpu_context_blocking};
pub use labels::{LabelMarker, LabelOverlay, MARKER_SIZE_PX, collect_markers};
pub use pass::{FrameEncoder, RenderPassBuilder, SPACE_BLACK};
pub use star_pipeline::{STAR_SHADER_SOURCE, StarPipeline};
pub use surface::{PhysicalSize, SurfaceResizeEvent, SurfaceWrapper};

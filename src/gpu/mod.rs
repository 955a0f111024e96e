// ============================================================================
// GPU MODULE - wgpu backend for the on-screen scene
// ============================================================================
//
// Architecture:
//   context.rs - wgpu Device, Queue, adapter init (hardware, then fallback)
//   shaders.rs - WGSL source for the line and sprite programs
//   target.rs  - GpuTarget: offscreen RenderTarget + readback
//
// The canvas itself always lives in software framebuffers; only the scene
// pass (canvas quad + overlays) is rendered here.
// ============================================================================

pub mod context;
pub mod shaders;
pub mod target;

pub use context::GpuContext;
pub use target::GpuTarget;

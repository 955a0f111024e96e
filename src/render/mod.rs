// ============================================================================
// RENDER MODULE - backend-neutral 2D draw pipeline
// ============================================================================
//
// Architecture:
//   camera.rs      - Camera2D (orthographic projection + pan/zoom view)
//   transform.rs   - Transform2D model matrix (pivot around geometry centre)
//   texture.rs     - shared, generation-tracked RGBA textures
//   framebuffer.rs - software render target + triangle rasteriser
//   resources.rs   - get-or-create cache for per-primitive shared resources
//   primitives/    - Line, TriangleFan, Quad, Circle, Rectangle
//   scene.rs       - ordered list of renderables, one render pass
//
// Every primitive turns itself into one or more `DrawCall`s against a
// `RenderTarget`.  The software `Framebuffer` and the wgpu `GpuTarget`
// implement the same contract, so a primitive never knows where it lands.
// ============================================================================

pub mod camera;
pub mod framebuffer;
pub mod primitives;
pub mod resources;
pub mod scene;
pub mod texture;
pub mod transform;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, UVec2};

use crate::colour::Colour;

pub use camera::Camera2D;
pub use framebuffer::Framebuffer;
pub use resources::{PrimitiveKind, PrimitiveResources, ResourceCache};
pub use scene::Scene;
pub use texture::Texture;
pub use transform::Transform2D;

/// One vertex as consumed by both shader programs.
///
/// `normal` and `miter` are only meaningful for [`ShaderKind::Line`]: the
/// vertex stage offsets `position` by `normal * thickness / 2 * miter`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub normal: [f32; 2],
    pub miter: f32,
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            position: [x, y],
            ..Default::default()
        }
    }

    pub fn textured(x: f32, y: f32, u: f32, v: f32) -> Self {
        Self {
            position: [x, y],
            uv: [u, v],
            ..Default::default()
        }
    }
}

/// Indexed triangle list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn is_empty(&self) -> bool {
        self.indices.len() < 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// The two shader programs every primitive picks from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    /// Thick polyline: applies the normal/miter offset in the vertex stage.
    Line,
    /// Flat geometry, solid colour or textured depending on the material.
    Sprite,
}

/// How fragments combine with what is already in the target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Overwrite the destination (blending disabled).  Canvas default, so
    /// drawing a transparent colour erases.
    #[default]
    Replace,
    /// Straight-alpha "source over".
    AlphaOver,
}

/// Per-draw uniforms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub colour: [f32; 4],
    pub thickness: f32,
    pub textured: bool,
}

impl Material {
    pub fn solid(colour: Colour) -> Self {
        Self {
            colour: colour.normalized(),
            thickness: 0.0,
            textured: false,
        }
    }

    pub fn line(colour: Colour, thickness: f32) -> Self {
        Self {
            thickness,
            ..Self::solid(colour)
        }
    }

    pub fn textured() -> Self {
        Self {
            colour: [1.0; 4],
            thickness: 0.0,
            textured: true,
        }
    }
}

/// Everything a target needs to draw one mesh.
pub struct DrawCall<'a> {
    pub mesh: &'a Mesh,
    pub shader: ShaderKind,
    pub model: Mat4,
    pub view_proj: Mat4,
    pub material: Material,
    pub texture: Option<&'a Texture>,
}

/// Something that can receive draw calls: an offscreen framebuffer or the
/// GPU scene target.
pub trait RenderTarget {
    fn size(&self) -> UVec2;

    fn blend_mode(&self) -> BlendMode;

    fn set_blend_mode(&mut self, mode: BlendMode);

    /// Fill the whole target with `colour`, ignoring the blend mode.
    fn clear(&mut self, colour: Colour);

    fn draw(&mut self, call: &DrawCall<'_>);
}

/// An object that knows how to draw itself through a camera.
pub trait Renderable {
    fn render(&self, target: &mut dyn RenderTarget, camera: &Camera2D);
}

impl<T: Renderable + ?Sized> Renderable for Box<T> {
    fn render(&self, target: &mut dyn RenderTarget, camera: &Camera2D) {
        (**self).render(target, camera)
    }
}

// ============================================================================
// FRAMEBUFFER - software render target with a triangle rasteriser
// ============================================================================
//
// Pipeline per draw call:
//   1. vertex stage   - line offset (position + normal * thickness/2 * miter),
//                       then view_proj * model, then viewport mapping
//   2. rasterise      - edge functions at pixel centres, top-left fill rule
//   3. fragment stage - solid colour or nearest texture sample
//   4. output merge   - Replace or straight-alpha AlphaOver
//
// Row 0 of the backing image is the top of the target (y down), matching
// canvas-local pixel coordinates.
// ============================================================================

use glam::{UVec2, Vec2, Vec4};
use image::RgbaImage;

use super::{BlendMode, DrawCall, RenderTarget, ShaderKind, Texture};
use crate::colour::Colour;

/// An offscreen colour target backed by a [`Texture`].
#[derive(Clone, Debug)]
pub struct Framebuffer {
    texture: Texture,
    blend: BlendMode,
}

#[derive(Clone, Copy, Debug)]
struct ScreenVertex {
    pos: Vec2,
    uv: Vec2,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32, fill: Colour) -> Self {
        Self {
            texture: Texture::filled(width, height, fill),
            blend: BlendMode::Replace,
        }
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self {
            texture: Texture::from_image(image),
            blend: BlendMode::Replace,
        }
    }

    pub fn width(&self) -> u32 {
        self.texture.width()
    }

    pub fn height(&self) -> u32 {
        self.texture.height()
    }

    /// The colour attachment.  Cloning it is cheap and shares pixels.
    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    pub fn image(&self) -> &RgbaImage {
        self.texture.image()
    }

    pub fn image_mut(&mut self) -> &mut RgbaImage {
        self.texture.image_mut()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Colour> {
        let img = self.texture.image();
        (x < img.width() && y < img.height()).then(|| Colour::from(*img.get_pixel(x, y)))
    }

    /// Blit: make this framebuffer's content identical to `other`'s.
    pub fn copy_from(&mut self, other: &Framebuffer) {
        self.texture.assign(&other.texture);
    }

    pub fn replace_image(&mut self, image: RgbaImage) {
        self.texture.replace_image(image);
    }

    fn vertex_stage(call: &DrawCall<'_>, size: Vec2) -> Vec<ScreenVertex> {
        let mvp = call.view_proj * call.model;
        let half_thickness = call.material.thickness * 0.5;
        call.mesh
            .vertices
            .iter()
            .map(|v| {
                let mut local = Vec2::from(v.position);
                if call.shader == ShaderKind::Line {
                    local += Vec2::from(v.normal) * half_thickness * v.miter;
                }
                let clip = mvp * Vec4::new(local.x, local.y, 0.0, 1.0);
                let ndc = Vec2::new(clip.x, clip.y) / clip.w;
                ScreenVertex {
                    pos: Vec2::new((ndc.x + 1.0) * 0.5 * size.x, (1.0 - ndc.y) * 0.5 * size.y),
                    uv: Vec2::from(v.uv),
                }
            })
            .collect()
    }

    fn rasterise_triangle(
        &mut self,
        a: ScreenVertex,
        mut b: ScreenVertex,
        mut c: ScreenVertex,
        call: &DrawCall<'_>,
    ) {
        let mut area = edge(a.pos, b.pos, c.pos);
        if area.abs() < f32::EPSILON {
            return;
        }
        if area < 0.0 {
            std::mem::swap(&mut b, &mut c);
            area = -area;
        }

        let w = self.width() as f32;
        let h = self.height() as f32;
        let min = a.pos.min(b.pos).min(c.pos);
        let max = a.pos.max(b.pos).max(c.pos);
        let x0 = min.x.floor().max(0.0) as u32;
        let y0 = min.y.floor().max(0.0) as u32;
        let x1 = max.x.ceil().min(w) as u32;
        let y1 = max.y.ceil().min(h) as u32;
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let bc_top_left = is_top_left(b.pos, c.pos);
        let ca_top_left = is_top_left(c.pos, a.pos);
        let ab_top_left = is_top_left(a.pos, b.pos);
        let solid = Colour::from_normalized(call.material.colour).to_array();
        let textured = call.material.textured && call.texture.is_some();
        let blend = self.blend;
        let image = self.texture.image_mut();

        for y in y0..y1 {
            for x in x0..x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let w0 = edge(b.pos, c.pos, p);
                let w1 = edge(c.pos, a.pos, p);
                let w2 = edge(a.pos, b.pos, p);
                if !covers(w0, bc_top_left) || !covers(w1, ca_top_left) || !covers(w2, ab_top_left) {
                    continue;
                }
                let src = match (textured, call.texture) {
                    (true, Some(tex)) => {
                        let uv = (a.uv * w0 + b.uv * w1 + c.uv * w2) / area;
                        tex.sample_nearest(uv.x, uv.y)
                    }
                    _ => solid,
                };
                let dst = image.get_pixel_mut(x, y);
                dst.0 = match blend {
                    BlendMode::Replace => src,
                    BlendMode::AlphaOver => alpha_over(src, dst.0),
                };
            }
        }
    }
}

impl RenderTarget for Framebuffer {
    fn size(&self) -> UVec2 {
        UVec2::new(self.width(), self.height())
    }

    fn blend_mode(&self) -> BlendMode {
        self.blend
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend = mode;
    }

    fn clear(&mut self, colour: Colour) {
        let px = colour.to_array();
        for p in self.texture.image_mut().pixels_mut() {
            p.0 = px;
        }
    }

    fn draw(&mut self, call: &DrawCall<'_>) {
        if call.mesh.is_empty() || self.width() == 0 || self.height() == 0 {
            return;
        }
        let size = Vec2::new(self.width() as f32, self.height() as f32);
        let verts = Self::vertex_stage(call, size);
        for tri in call.mesh.indices.chunks_exact(3) {
            let (Some(a), Some(b), Some(c)) = (
                verts.get(tri[0] as usize),
                verts.get(tri[1] as usize),
                verts.get(tri[2] as usize),
            ) else {
                log::warn!("mesh index out of range, triangle skipped");
                continue;
            };
            self.rasterise_triangle(*a, *b, *c, call);
        }
    }
}

/// Twice the signed area of (a, b, p); positive when p is on the interior
/// side of a→b for the winding we normalise to.
#[inline]
fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Top-left rule in y-down screen space: a pixel centre exactly on a shared
/// edge belongs to only one of the two triangles.
#[inline]
fn is_top_left(a: Vec2, b: Vec2) -> bool {
    let d = b - a;
    (d.y == 0.0 && d.x > 0.0) || d.y < 0.0
}

#[inline]
fn covers(w: f32, top_left: bool) -> bool {
    w > 0.0 || (w == 0.0 && top_left)
}

fn alpha_over(src: [u8; 4], dst: [u8; 4]) -> [u8; 4] {
    let sa = src[3] as f32 / 255.0;
    if sa >= 1.0 {
        return src;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return [0; 4];
    }
    let mut out = [0u8; 4];
    for i in 0..3 {
        let s = src[i] as f32;
        let d = dst[i] as f32;
        out[i] = ((s * sa + d * da * (1.0 - sa)) / out_a).round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round() as u8;
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Material, Mesh, Vertex};
    use glam::Mat4;

    fn pixel_camera(w: f32, h: f32) -> Mat4 {
        Mat4::orthographic_rh(0.0, w, h, 0.0, -1.0, 1.0)
    }

    fn quad_mesh(x0: f32, y0: f32, x1: f32, y1: f32) -> Mesh {
        Mesh {
            vertices: vec![
                Vertex::textured(x0, y0, 0.0, 0.0),
                Vertex::textured(x1, y0, 1.0, 0.0),
                Vertex::textured(x1, y1, 1.0, 1.0),
                Vertex::textured(x0, y1, 0.0, 1.0),
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    #[test]
    fn axis_aligned_quad_fills_exact_pixels() {
        let mut fb = Framebuffer::new(4, 4, Colour::WHITE);
        let mesh = quad_mesh(1.0, 1.0, 3.0, 3.0);
        fb.draw(&DrawCall {
            mesh: &mesh,
            shader: ShaderKind::Sprite,
            model: Mat4::IDENTITY,
            view_proj: pixel_camera(4.0, 4.0),
            material: Material::solid(Colour::BLACK),
            texture: None,
        });
        for y in 0..4 {
            for x in 0..4 {
                let inside = (1..3).contains(&x) && (1..3).contains(&y);
                let expected = if inside { Colour::BLACK } else { Colour::WHITE };
                assert_eq!(fb.pixel(x, y), Some(expected), "pixel {x},{y}");
            }
        }
    }

    #[test]
    fn shared_diagonal_is_blended_once() {
        let mut fb = Framebuffer::new(4, 4, Colour::rgba(0, 0, 0, 0));
        fb.set_blend_mode(BlendMode::AlphaOver);
        let mesh = quad_mesh(0.0, 0.0, 4.0, 4.0);
        fb.draw(&DrawCall {
            mesh: &mesh,
            shader: ShaderKind::Sprite,
            model: Mat4::IDENTITY,
            view_proj: pixel_camera(4.0, 4.0),
            material: Material::solid(Colour::rgba(255, 0, 0, 128)),
            texture: None,
        });
        let alphas: Vec<u8> = fb.image().pixels().map(|p| p.0[3]).collect();
        assert!(alphas.iter().all(|a| *a == 128), "{alphas:?}");
    }

    #[test]
    fn textured_quad_copies_texels() {
        let mut src = RgbaImage::new(2, 2);
        src.put_pixel(0, 0, image::Rgba([10, 20, 30, 255]));
        src.put_pixel(1, 1, image::Rgba([40, 50, 60, 255]));
        let tex = Texture::from_image(src.clone());
        let mut fb = Framebuffer::new(2, 2, Colour::WHITE);
        let mesh = quad_mesh(0.0, 0.0, 2.0, 2.0);
        fb.draw(&DrawCall {
            mesh: &mesh,
            shader: ShaderKind::Sprite,
            model: Mat4::IDENTITY,
            view_proj: pixel_camera(2.0, 2.0),
            material: Material::textured(),
            texture: Some(&tex),
        });
        assert_eq!(fb.image(), &src);
    }

    #[test]
    fn alpha_over_keeps_opaque_source() {
        assert_eq!(alpha_over([1, 2, 3, 255], [9, 9, 9, 9]), [1, 2, 3, 255]);
        assert_eq!(alpha_over([0, 0, 0, 0], [9, 9, 9, 255]), [9, 9, 9, 255]);
    }
}

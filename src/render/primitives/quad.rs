use std::rc::Rc;

use glam::Vec2;

use crate::colour::Colour;
use crate::render::{
    Camera2D, DrawCall, Material, Mesh, PrimitiveKind, PrimitiveResources, RenderTarget,
    Renderable, ShaderKind, Texture, Transform2D,
};

/// Axis-aligned rectangle (before rotation) with an optional texture.
///
/// All quads share one unit-square mesh from [`PrimitiveResources`]; the
/// transform's size scales it to pixels.
#[derive(Clone, Debug)]
pub struct Quad {
    pub transform: Transform2D,
    colour: Colour,
    texture: Option<Texture>,
    mesh: Rc<Mesh>,
}

impl Quad {
    pub fn new(resources: &mut PrimitiveResources, position: Vec2, size: Vec2) -> Self {
        Self {
            transform: Transform2D::new(position, size),
            colour: Colour::WHITE,
            texture: None,
            mesh: resources.mesh(PrimitiveKind::Quad),
        }
    }

    pub fn with_colour(mut self, colour: Colour) -> Self {
        self.colour = colour;
        self
    }

    pub fn with_texture(mut self, texture: Texture) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn colour(&self) -> Colour {
        self.colour
    }

    pub fn set_colour(&mut self, colour: Colour) {
        self.colour = colour;
    }

    pub fn texture(&self) -> Option<&Texture> {
        self.texture.as_ref()
    }

    pub fn set_texture(&mut self, texture: Option<Texture>) {
        self.texture = texture;
    }
}

impl Renderable for Quad {
    fn render(&self, target: &mut dyn RenderTarget, camera: &Camera2D) {
        let material = match self.texture {
            Some(_) => Material::textured(),
            None => Material::solid(self.colour),
        };
        target.draw(&DrawCall {
            mesh: &self.mesh,
            shader: ShaderKind::Sprite,
            model: self.transform.model_matrix(Vec2::splat(0.5)),
            view_proj: camera.view_projection(),
            material,
            texture: self.texture.as_ref(),
        });
    }
}

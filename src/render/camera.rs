//! Orthographic 2D camera with pan and anchored zoom.
//!
//! Screen (device pixel) space has its origin at the top-left with y down.
//! The view transform is `screen = pan + zoom * (world - position)`; the
//! projection maps view space `[left, left + width] x [top, top + height]`
//! onto clip space.  Both matrices are recomputed eagerly on every mutation,
//! so they are always consistent when a frame is rendered.

use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};

pub const MIN_ZOOM: f32 = 0.05;
pub const MAX_ZOOM: f32 = 64.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Camera2D {
    screen: Vec2,
    left: f32,
    top: f32,
    near: f32,
    far: f32,
    zoom: f32,
    /// World point pinned by the most recent anchored zoom.
    zoom_center: Vec2,
    pan: Vec2,
    position: Vec2,
    projection: Mat4,
    view: Mat4,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

impl Camera2D {
    pub fn new(screen_width: f32, screen_height: f32) -> Self {
        let mut camera = Self {
            screen: Vec2::ONE,
            left: 0.0,
            top: 0.0,
            near: -1.0,
            far: 1.0,
            zoom: 1.0,
            zoom_center: Vec2::ZERO,
            pan: Vec2::ZERO,
            position: Vec2::ZERO,
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
        };
        camera.project(screen_width, screen_height);
        camera.update_view();
        camera
    }

    /// Orthographic projection with the default origin and depth range.
    pub fn project(&mut self, screen_width: f32, screen_height: f32) {
        self.project_with(screen_width, screen_height, 0.0, 0.0, -1.0, 1.0);
    }

    pub fn project_with(
        &mut self,
        screen_width: f32,
        screen_height: f32,
        left: f32,
        top: f32,
        near: f32,
        far: f32,
    ) {
        self.screen = Vec2::new(screen_width.max(1.0), screen_height.max(1.0));
        self.left = left;
        self.top = top;
        self.near = near;
        self.far = far;
        self.projection = Mat4::orthographic_rh(
            left,
            left + self.screen.x,
            top + self.screen.y,
            top,
            near,
            far,
        );
    }

    pub fn screen_size(&self) -> Vec2 {
        self.screen
    }

    pub fn zoom_level(&self) -> f32 {
        self.zoom
    }

    pub fn zoom_center(&self) -> Vec2 {
        self.zoom_center
    }

    pub fn pan_offset(&self) -> Vec2 {
        self.pan
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.update_view();
    }

    /// Accumulate a pan offset, in screen pixels.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.pan += Vec2::new(dx, dy);
        self.update_view();
    }

    /// Change the zoom by `delta` (additive) while keeping the world point
    /// under `screen_anchor` fixed on screen.
    pub fn zoom(&mut self, delta: f32, screen_anchor: Vec2) {
        let anchor_view = self.screen_to_view(screen_anchor);
        let world = self.view_to_world(anchor_view);
        self.zoom_center = world;
        self.zoom = (self.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan = anchor_view - (world - self.position) * self.zoom;
        self.update_view();
    }

    /// Set an absolute zoom around the anchor.
    pub fn set_zoom(&mut self, zoom: f32, screen_anchor: Vec2) {
        let delta = zoom - self.zoom;
        self.zoom(delta, screen_anchor);
    }

    pub fn reset(&mut self) {
        self.zoom = 1.0;
        self.zoom_center = Vec2::ZERO;
        self.pan = Vec2::ZERO;
        self.position = Vec2::ZERO;
        self.update_view();
    }

    /// Pan so that `world_point` sits in the middle of the screen.
    pub fn center_on(&mut self, world_point: Vec2) {
        let middle = Vec2::new(self.left, self.top) + self.screen * 0.5;
        self.pan = middle - (world_point - self.position) * self.zoom;
        self.update_view();
    }

    /// Map device pixel coordinates to world coordinates by inverting the
    /// projection and view.
    pub fn world_from_screen(&self, x: f32, y: f32, screen_width: f32, screen_height: f32) -> Vec2 {
        let ndc_x = 2.0 * x / screen_width.max(1.0) - 1.0;
        let ndc_y = 1.0 - 2.0 * y / screen_height.max(1.0);
        let inverse = self.view_projection().inverse();
        let p = inverse * glam::Vec4::new(ndc_x, ndc_y, 0.0, 1.0);
        p.xy() / p.w
    }

    /// Inverse of [`Camera2D::world_from_screen`] for this camera's own
    /// screen size.
    pub fn screen_from_world(&self, world: Vec2) -> Vec2 {
        self.pan + (world - self.position) * self.zoom - Vec2::new(self.left, self.top)
    }

    fn screen_to_view(&self, screen: Vec2) -> Vec2 {
        Vec2::new(self.left, self.top) + screen
    }

    fn view_to_world(&self, view: Vec2) -> Vec2 {
        (view - self.pan) / self.zoom + self.position
    }

    fn update_view(&mut self) {
        self.view = Mat4::from_translation(self.pan.extend(0.0))
            * Mat4::from_scale(Vec3::new(self.zoom, self.zoom, 1.0))
            * Mat4::from_translation((-self.position).extend(0.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn identity_camera_maps_pixels_to_world() {
        let cam = Camera2D::new(800.0, 600.0);
        let w = cam.world_from_screen(100.0, 50.0, 800.0, 600.0);
        assert!(close(w, Vec2::new(100.0, 50.0)), "{w:?}");
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let mut cam = Camera2D::new(800.0, 600.0);
        let anchor = Vec2::new(100.0, 100.0);
        let before = cam.world_from_screen(anchor.x, anchor.y, 800.0, 600.0);
        cam.zoom(0.5, anchor);
        let after = cam.world_from_screen(anchor.x, anchor.y, 800.0, 600.0);
        assert!((cam.zoom_level() - 1.5).abs() < 1e-6);
        assert!(close(before, after), "{before:?} vs {after:?}");
    }

    #[test]
    fn pan_moves_content_in_screen_pixels() {
        let mut cam = Camera2D::new(400.0, 400.0);
        cam.zoom(1.0, Vec2::ZERO);
        cam.pan(10.0, -20.0);
        let w = cam.world_from_screen(10.0, -20.0, 400.0, 400.0);
        assert!(close(w, Vec2::ZERO), "{w:?}");
        assert!(close(cam.screen_from_world(Vec2::ZERO), Vec2::new(10.0, -20.0)));
    }

    #[test]
    fn zoom_is_clamped() {
        let mut cam = Camera2D::new(100.0, 100.0);
        cam.zoom(-10.0, Vec2::ZERO);
        assert_eq!(cam.zoom_level(), MIN_ZOOM);
    }

    #[test]
    fn center_on_puts_point_mid_screen() {
        let mut cam = Camera2D::new(200.0, 100.0);
        cam.center_on(Vec2::new(40.0, 30.0));
        assert!(close(cam.screen_from_world(Vec2::new(40.0, 30.0)), Vec2::new(100.0, 50.0)));
    }
}

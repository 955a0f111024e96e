// ============================================================================
// PAINT SESSION - windowing-independent application core
// ============================================================================
//
// Owns the paint context, the main camera, the tool manager, the async image
// loader and the scene backend.  The shell (eframe window or headless CLI)
// feeds it device-pixel input and calls `update` / `render` once per frame.
//
// Coordinate pipeline for every pointer event:
//   device pixels → world (main camera) → canvas-local (canvas surface)
// ============================================================================

use std::path::PathBuf;

use glam::{UVec2, Vec2};
use image::RgbaImage;

use crate::canvas::{check_size, Anchor};
use crate::colour::{Colour, ColourSlot};
use crate::context::PaintContext;
use crate::error::Result;
use crate::events::{AppEvent, EventBus};
use crate::gpu::{GpuContext, GpuTarget};
use crate::io::{self, ImageLoader, IoResult};
use crate::ops::effects;
use crate::render::{Camera2D, Framebuffer, Scene, Texture};
use crate::settings::AppSettings;
use crate::tools::{Key, OptionValue, PointerButton, PointerEvent, Tool, ToolBehaviour, ToolManager};

/// Screen-space margin kept around the canvas by [`PaintSession::fit_canvas`].
const FIT_MARGIN: f32 = 24.0;

/// Where the on-screen scene is rendered.
pub enum SceneBackend {
    Gpu(GpuTarget),
    Software(Framebuffer),
}

impl SceneBackend {
    pub fn name(&self) -> String {
        match self {
            SceneBackend::Gpu(target) => format!("wgpu ({})", target.adapter_name()),
            SceneBackend::Software(_) => "software".to_string(),
        }
    }

    fn resize(&mut self, size: UVec2) -> Result<()> {
        match self {
            SceneBackend::Gpu(target) => target.resize(size.x, size.y),
            SceneBackend::Software(fb) => {
                if fb.width() != size.x || fb.height() != size.y {
                    *fb = Framebuffer::new(size.x, size.y, Colour::TRANSPARENT);
                }
                Ok(())
            }
        }
    }
}

pub struct PaintSession {
    ctx: PaintContext,
    camera: Camera2D,
    tools: ToolManager,
    loader: ImageLoader,
    backend: SceneBackend,
    /// Last GPU frame read back for display.
    frame: RgbaImage,
    viewport: UVec2,
    /// Button held since the last press, reported with moves.
    held: Option<PointerButton>,
    elapsed: f64,
    frames: u64,
}

impl PaintSession {
    /// Build the core: canvas, tools (pen selected), camera and scene
    /// backend.  A missing GPU falls back to software rendering.
    pub fn new(settings: &AppSettings, viewport: UVec2) -> Result<Self> {
        let viewport = viewport.max(UVec2::ONE);
        let mut ctx = PaintContext::new(
            settings.canvas_width,
            settings.canvas_height,
            settings.background.colour(),
        )?;

        let mut tools = ToolManager::new();
        for tool in Tool::defaults(settings.default_thickness) {
            tools.register(tool)?;
        }
        tools.set_selected_tool("pen", &mut ctx)?;

        let backend = if settings.gpu_acceleration {
            match GpuContext::new(settings.preferred_gpu)
                .and_then(|gpu| GpuTarget::new(gpu, viewport.x, viewport.y))
            {
                Ok(target) => SceneBackend::Gpu(target),
                Err(e) => {
                    log::warn!("GPU scene unavailable, rendering in software: {e}");
                    SceneBackend::Software(Framebuffer::new(viewport.x, viewport.y, Colour::TRANSPARENT))
                }
            }
        } else {
            SceneBackend::Software(Framebuffer::new(viewport.x, viewport.y, Colour::TRANSPARENT))
        };
        log::info!(
            "session started: canvas {}x{}, viewport {}x{}, backend {}",
            settings.canvas_width,
            settings.canvas_height,
            viewport.x,
            viewport.y,
            backend.name()
        );

        let mut session = Self {
            ctx,
            camera: Camera2D::new(viewport.x as f32, viewport.y as f32),
            tools,
            loader: ImageLoader::new(),
            backend,
            frame: RgbaImage::new(viewport.x, viewport.y),
            viewport,
            held: None,
            elapsed: 0.0,
            frames: 0,
        };
        session.refresh_cursor(None);
        Ok(session)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn context(&self) -> &PaintContext {
        &self.ctx
    }

    pub fn events(&self) -> &EventBus {
        &self.ctx.events
    }

    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    pub fn tools(&self) -> &ToolManager {
        &self.tools
    }

    pub fn backend(&self) -> &SceneBackend {
        &self.backend
    }

    pub fn viewport(&self) -> UVec2 {
        self.viewport
    }

    /// Seconds accumulated through [`PaintSession::update`].
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    pub fn pending_loads(&self) -> usize {
        self.loader.pending()
    }

    // ------------------------------------------------------------------
    // Frame loop
    // ------------------------------------------------------------------

    /// Advance the clock and apply finished background loads.
    pub fn update(&mut self, dt: f32) {
        self.elapsed += dt.max(0.0) as f64;
        for result in self.loader.poll() {
            match result {
                IoResult::ImageLoaded { request, image, source } => {
                    log::info!("load #{request} finished: {source}");
                    if let Err(e) = self.load_image(image) {
                        self.report_load_failure(&source, &e.to_string());
                    }
                }
                IoResult::LoadFailed { request, source, error } => {
                    log::debug!("load #{request} failed");
                    self.report_load_failure(&source, &error);
                }
            }
        }
    }

    /// Render the scene (canvas quad, tool overlays, brush cursor) through
    /// the main camera and return the finished frame.
    pub fn render(&mut self) -> Result<&RgbaImage> {
        let scene = self.build_scene();
        self.frames += 1;
        match &mut self.backend {
            SceneBackend::Gpu(target) => {
                scene.render(target, &self.camera);
                self.frame = target.read_pixels()?;
                Ok(&self.frame)
            }
            SceneBackend::Software(fb) => {
                scene.render(fb, &self.camera);
                Ok(fb.image())
            }
        }
    }

    fn build_scene(&self) -> Scene {
        let zoom = self.camera.zoom_level();
        let mut scene = Scene::default();
        scene.push(self.ctx.canvas.screen_quad());
        for overlay in self.tools.overlays(self.ctx.canvas.position(), zoom) {
            scene.push_boxed(overlay);
        }
        if let Some(cursor) = self.ctx.cursor.overlay(zoom) {
            scene.push(cursor);
        }
        scene
    }

    /// New window size in device pixels.
    pub fn resize_viewport(&mut self, width: u32, height: u32) -> Result<()> {
        let size = UVec2::new(width, height).max(UVec2::ONE);
        if size == self.viewport {
            return Ok(());
        }
        self.backend.resize(size)?;
        self.camera.project(size.x as f32, size.y as f32);
        self.viewport = size;
        log::debug!("viewport resized to {}x{}", size.x, size.y);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    pub fn pointer_down(&mut self, screen: Vec2, button: PointerButton) {
        if button == PointerButton::Middle {
            return;
        }
        self.held = Some(button);
        let (world, local, inside) = self.locate(screen);
        if inside || self.active_tracks_outside() {
            self.tools.on_mouse_down(&mut self.ctx, &PointerEvent::new(local, button));
        }
        self.refresh_cursor(inside.then_some(world));
    }

    /// Releases always reach the tool so strokes that leave the canvas end.
    pub fn pointer_up(&mut self, screen: Vec2, button: PointerButton) {
        if button == PointerButton::Middle {
            return;
        }
        self.held = None;
        let (world, local, inside) = self.locate(screen);
        self.tools.on_mouse_up(&mut self.ctx, &PointerEvent::new(local, button));
        self.refresh_cursor(inside.then_some(world));
    }

    pub fn pointer_move(&mut self, screen: Vec2) {
        let (world, local, inside) = self.locate(screen);
        if inside || self.active_tracks_outside() {
            let button = self.held.unwrap_or(PointerButton::Primary);
            self.tools.on_mouse_move(&mut self.ctx, &PointerEvent::new(local, button));
        }
        self.ctx
            .events
            .publish(AppEvent::PointerMoved(inside.then_some(local)));
        self.refresh_cursor(inside.then_some(world));
    }

    /// Pointer left the window.
    pub fn pointer_left(&mut self) {
        self.ctx.events.publish(AppEvent::PointerMoved(None));
        self.refresh_cursor(None);
    }

    pub fn key_press(&mut self, key: Key) {
        self.tools.on_key_press(&mut self.ctx, key);
    }

    /// Device pixels → (world, canvas-local, inside canvas).
    fn locate(&self, screen: Vec2) -> (Vec2, Vec2, bool) {
        let world = self.camera.world_from_screen(
            screen.x,
            screen.y,
            self.viewport.x as f32,
            self.viewport.y as f32,
        );
        let local = self.ctx.canvas.mouse_to_canvas_coordinates(world);
        (world, local, self.ctx.canvas.is_mouse_in_canvas(world))
    }

    fn active_tracks_outside(&self) -> bool {
        self.tools.active().is_some_and(|t| t.tracks_outside_canvas())
    }

    fn refresh_cursor(&mut self, world: Option<Vec2>) {
        let diameter = self.tools.active().and_then(|t| t.brush_diameter());
        match diameter {
            Some(d) => {
                self.ctx.cursor.set_diameter(d);
                self.ctx.cursor.set_position(world);
            }
            None => self.ctx.cursor.set_position(None),
        }
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    pub fn set_tool(&mut self, id: &str) -> Result<()> {
        self.tools.set_selected_tool(id, &mut self.ctx)?;
        let position = self.ctx.cursor.position();
        self.refresh_cursor(position);
        Ok(())
    }

    pub fn set_option(&mut self, tool_id: &str, name: &str, value: OptionValue) -> Result<()> {
        self.tools.set_option(tool_id, name, value, &mut self.ctx)?;
        let position = self.ctx.cursor.position();
        self.refresh_cursor(position);
        Ok(())
    }

    pub fn get_option(&self, tool_id: &str, name: &str) -> Result<OptionValue> {
        self.tools.get_option(tool_id, name)
    }

    pub fn set_colour(&mut self, slot: ColourSlot, colour: Colour) {
        self.ctx.colours.set(slot, colour);
        self.tools.sync_colours(&mut self.ctx);
    }

    pub fn swap_colours(&mut self) {
        self.ctx.colours.swap();
        self.tools.sync_colours(&mut self.ctx);
    }

    /// Replace the canvas with a decoded image.  The canvas takes the
    /// image's size first, so the pixels land 1:1.
    pub fn load_image(&mut self, image: RgbaImage) -> Result<()> {
        self.tools.commit_active(&mut self.ctx);
        let size = UVec2::new(image.width(), image.height());
        if size != self.ctx.canvas.size() {
            self.ctx.canvas.resize(size.x, size.y, Anchor::TopLeft)?;
            self.ctx.events.publish(AppEvent::CanvasResized(size));
        }
        self.ctx
            .canvas
            .draw_fullscreen_texture_on_canvas(&Texture::from_image(image));
        log::info!("image loaded onto canvas ({}x{})", size.x, size.y);
        Ok(())
    }

    /// Decode in the background; the result is applied by a later `update`.
    pub fn load_image_async(&mut self, path: PathBuf) -> u64 {
        self.loader.load_path(path)
    }

    pub fn load_bytes_async(&mut self, bytes: Vec<u8>, label: &str) -> u64 {
        self.loader.load_bytes(bytes, label)
    }

    /// Committed canvas as PNG bytes.
    pub fn export_png(&self) -> Result<Vec<u8>> {
        io::encode_png(self.ctx.canvas.committed_image())
    }

    /// Commit the active tool's work, then resize.
    pub fn resize_canvas(&mut self, width: u32, height: u32, anchor: Anchor) -> Result<()> {
        check_size(width, height)?;
        self.tools.commit_active(&mut self.ctx);
        self.ctx.canvas.resize(width, height, anchor)?;
        self.ctx
            .events
            .publish(AppEvent::CanvasResized(UVec2::new(width, height)));
        Ok(())
    }

    /// Commit the active tool's work, then apply a named effect to the
    /// committed canvas.  Unknown names are an error and leave both the
    /// canvas and any pending preview untouched.
    pub fn apply_effect(&mut self, name: &str) -> Result<()> {
        let effect: effects::Effect = name.parse()?;
        self.tools.commit_active(&mut self.ctx);
        let result = effect.apply(self.ctx.canvas.committed_image());
        self.ctx
            .canvas
            .draw_fullscreen_texture_on_canvas(&Texture::from_image(result));
        log::info!("applied effect '{name}'");
        Ok(())
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.camera.pan(dx, dy);
    }

    pub fn zoom(&mut self, delta: f32, screen_anchor: Vec2) {
        self.camera.zoom(delta, screen_anchor);
    }

    /// Reset the view and fit the whole canvas on screen (never above 100%).
    pub fn fit_canvas(&mut self) {
        let view = self.viewport.as_vec2();
        let size = self.ctx.canvas.size().as_vec2();
        let room = (view - Vec2::splat(2.0 * FIT_MARGIN)).max(Vec2::ONE);
        let fit = (room.x / size.x).min(room.y / size.y).min(1.0);
        self.camera.reset();
        self.camera.set_zoom(fit, Vec2::ZERO);
        self.camera.center_on(self.ctx.canvas.position() + size * 0.5);
    }

    fn report_load_failure(&mut self, source: &str, error: &str) {
        log::warn!("image load failed for {source}: {error}");
        self.ctx
            .events
            .publish(AppEvent::ImageLoadFailed(format!("{source}: {error}")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PaintError;
    use crate::events::EventKind;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    fn session(w: u32, h: u32) -> PaintSession {
        let settings = AppSettings {
            gpu_acceleration: false,
            canvas_width: w,
            canvas_height: h,
            default_thickness: 2.0,
            ..AppSettings::default()
        };
        match PaintSession::new(&settings, UVec2::new(w, h)) {
            Ok(s) => s,
            Err(e) => panic!("{e}"),
        }
    }

    #[test]
    fn starts_with_pen_on_software_backend() {
        let s = session(8, 8);
        assert_eq!(s.tools().active_id(), Some("pen"));
        assert!(matches!(s.backend(), SceneBackend::Software(_)));
    }

    #[test]
    fn pointer_moves_report_canvas_position() {
        let mut s = session(10, 10);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        s.events().subscribe_to(EventKind::PointerMoved, move |e| {
            if let AppEvent::PointerMoved(p) = e {
                sink.borrow_mut().push(*p);
            }
        });
        s.pan(2.0, 0.0);
        s.pointer_move(Vec2::new(5.0, 3.0));
        s.pointer_move(Vec2::new(1.0, 3.0));
        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].is_some_and(|p| (p - Vec2::new(3.0, 3.0)).length() < 1e-3));
        assert_eq!(seen[1], None);
    }

    #[test]
    fn rendered_frame_shows_the_canvas() {
        let mut s = session(4, 4);
        s.set_colour(ColourSlot::Primary, Colour::rgba(255, 0, 0, 255));
        assert!(s.set_tool("fill").is_ok());
        s.pointer_down(Vec2::new(1.5, 1.5), PointerButton::Primary);
        s.pointer_up(Vec2::new(1.5, 1.5), PointerButton::Primary);
        let frame = match s.render() {
            Ok(f) => f.clone(),
            Err(e) => panic!("{e}"),
        };
        assert_eq!(frame.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(s.frames_rendered(), 1);
    }

    #[test]
    fn failed_async_load_keeps_canvas_and_publishes() {
        let mut s = session(4, 4);
        let failures = Rc::new(RefCell::new(0));
        let sink = failures.clone();
        s.events().subscribe_to(EventKind::ImageLoadFailed, move |_| *sink.borrow_mut() += 1);
        let before = s.context().canvas.get_canvas_image();
        s.load_bytes_async(b"garbage".to_vec(), "garbage");
        for _ in 0..200 {
            s.update(0.016);
            if s.pending_loads() == 0 {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(*failures.borrow(), 1);
        assert_eq!(s.context().canvas.get_canvas_image(), before);
    }

    #[test]
    fn unknown_effect_leaves_canvas_untouched() {
        let mut s = session(4, 4);
        let before = s.context().canvas.get_canvas_image();
        assert!(matches!(s.apply_effect("sepia"), Err(PaintError::UnknownEffect(_))));
        assert_eq!(s.context().canvas.get_canvas_image(), before);
    }

    #[test]
    fn loading_a_different_size_resizes_the_canvas() {
        let mut s = session(4, 4);
        let image = RgbaImage::from_pixel(6, 3, image::Rgba([0, 0, 255, 255]));
        assert!(s.load_image(image.clone()).is_ok());
        assert_eq!(s.context().canvas.size(), UVec2::new(6, 3));
        assert_eq!(s.context().canvas.get_canvas_image(), image);
    }
}

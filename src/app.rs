// ============================================================================
// PAINT APP - eframe shell around the paint session
// ============================================================================
//
// The window owns nothing but presentation state.  Every frame it:
//   1. advances the session clock (applies finished image loads)
//   2. draws the toolbar and forwards commands
//   3. feeds pointer / scroll / key input from the canvas area
//   4. renders the scene and shows it as one egui texture
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use eframe::egui;
use egui::{Color32, ColorImage, Pos2, Rect, Sense, TextureHandle, TextureOptions, Vec2 as EVec2};
use glam::Vec2;

use crate::canvas::{Anchor, MAX_CANVAS_DIM};
use crate::colour::{Colour, ColourSlot};
use crate::events::AppEvent;
use crate::io;
use crate::ops::Effect;
use crate::session::PaintSession;
use crate::settings::AppSettings;
use crate::tools::{Key, OptionSpec, OptionValue, PointerButton, ToolBehaviour};

pub struct PaintApp {
    session: PaintSession,
    settings: AppSettings,
    display: Option<TextureHandle>,
    /// Events published by the core since the last frame.
    inbox: Rc<RefCell<Vec<AppEvent>>>,
    pointer: Option<Vec2>,
    /// Last pointer position handed to the session, device pixels.
    last_hover: Option<Vec2>,
    /// Last position the pointer was seen at, kept after it leaves.
    last_seen: Option<Vec2>,
    status: String,
    resize_width: u32,
    resize_height: u32,
    resize_anchor: Anchor,
    needs_fit: bool,
}

impl PaintApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, session: PaintSession, settings: AppSettings) -> Self {
        let inbox = Rc::new(RefCell::new(Vec::new()));
        let sink = inbox.clone();
        session.events().subscribe(move |event| sink.borrow_mut().push(event.clone()));
        let size = session.context().canvas.size();
        Self {
            status: format!("Rendering: {}", session.backend().name()),
            session,
            display: None,
            inbox,
            pointer: None,
            last_hover: None,
            last_seen: None,
            resize_width: size.x,
            resize_height: size.y,
            resize_anchor: settings.resize_anchor,
            settings,
            needs_fit: true,
        }
    }

    fn drain_events(&mut self) {
        let events = std::mem::take(&mut *self.inbox.borrow_mut());
        for event in events {
            match event {
                AppEvent::PointerMoved(p) => self.pointer = p,
                AppEvent::CanvasResized(size) => {
                    self.resize_width = size.x;
                    self.resize_height = size.y;
                    self.needs_fit = true;
                    self.status = format!("Canvas resized to {}x{}", size.x, size.y);
                }
                AppEvent::ToolChanged(id) => self.status = format!("Tool: {id}"),
                AppEvent::ImageLoadFailed(message) => self.status = format!("Load failed: {message}"),
                AppEvent::ColourSelectionChanged(_) => {}
            }
        }
    }

    fn report(&mut self, what: &str, result: crate::error::Result<()>) {
        if let Err(e) = result {
            log::error!("{what}: {e}");
            self.status = format!("{what}: {e}");
        }
    }

    // ------------------------------------------------------------------
    // Toolbar
    // ------------------------------------------------------------------

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            if ui.button("Open…").clicked()
                && let Some(path) = io::pick_open_path()
            {
                self.status = format!("Loading {}", path.display());
                self.session.load_image_async(path);
            }
            if ui.button("Export PNG…").clicked()
                && let Some(path) = io::pick_save_path()
            {
                match io::save_png(self.session.context().canvas.committed_image(), &path) {
                    Ok(()) => self.status = format!("Exported {}", path.display()),
                    Err(e) => self.report("Export failed", Err(e)),
                }
            }
            ui.menu_button("Effects", |ui| {
                for effect in Effect::ALL {
                    if ui.button(effect.name()).clicked() {
                        let result = self.session.apply_effect(effect.name());
                        self.report("Effect failed", result);
                        ui.close_menu();
                    }
                }
            });
            ui.separator();

            let ids: Vec<(String, &'static str)> = self
                .session
                .tools()
                .tools()
                .iter()
                .map(|t| (t.id().to_string(), t.label()))
                .collect();
            let active = self.session.tools().active_id().map(str::to_string);
            for (id, label) in ids {
                if ui.selectable_label(active.as_deref() == Some(id.as_str()), label).clicked() {
                    let result = self.session.set_tool(&id);
                    self.report("Tool switch failed", result);
                }
            }
            ui.separator();

            self.colour_button(ui, ColourSlot::Primary);
            self.colour_button(ui, ColourSlot::Secondary);
            if ui.small_button("⇄").on_hover_text("Swap colours").clicked() {
                self.session.swap_colours();
            }
        });

        ui.horizontal_wrapped(|ui| {
            self.tool_options(ui);
            ui.separator();
            self.resize_controls(ui);
        });
    }

    fn colour_button(&mut self, ui: &mut egui::Ui, slot: ColourSlot) {
        let [r, g, b, a] = self.session.context().colours.get(slot).to_array();
        let mut colour = Color32::from_rgba_unmultiplied(r, g, b, a);
        if ui.color_edit_button_srgba(&mut colour).changed() {
            let [r, g, b, a] = colour.to_srgba_unmultiplied();
            self.session.set_colour(slot, Colour::rgba(r, g, b, a));
        }
    }

    fn tool_options(&mut self, ui: &mut egui::Ui) {
        let Some(tool) = self.session.tools().active() else { return };
        let tool_id = tool.id().to_string();
        let specs: Vec<OptionSpec> = tool.options().specs().to_vec();
        for spec in specs {
            let changed = match &spec.value {
                OptionValue::Number(n) => {
                    let mut v = *n;
                    let (min, max) = spec.range.unwrap_or((0.0, 100.0));
                    ui.add(egui::Slider::new(&mut v, min..=max).text(spec.name))
                        .changed()
                        .then_some(OptionValue::Number(v))
                }
                OptionValue::Flag(b) => {
                    let mut v = *b;
                    ui.checkbox(&mut v, spec.name).changed().then_some(OptionValue::Flag(v))
                }
                OptionValue::Choice(current) => {
                    let mut picked = current.clone();
                    egui::ComboBox::from_id_source(("tool_option", spec.name))
                        .selected_text(picked.clone())
                        .show_ui(ui, |ui| {
                            for choice in spec.choices {
                                ui.selectable_value(&mut picked, choice.to_string(), *choice);
                            }
                        });
                    (picked != *current).then_some(OptionValue::Choice(picked))
                }
                OptionValue::Text(current) => {
                    let mut text = current.clone();
                    ui.label(spec.name);
                    ui.text_edit_singleline(&mut text)
                        .changed()
                        .then_some(OptionValue::Text(text))
                }
            };
            if let Some(value) = changed {
                let result = self.session.set_option(&tool_id, spec.name, value);
                self.report("Option rejected", result);
            }
        }
    }

    fn resize_controls(&mut self, ui: &mut egui::Ui) {
        ui.label("Canvas");
        ui.add(egui::DragValue::new(&mut self.resize_width).clamp_range(1..=MAX_CANVAS_DIM));
        ui.label("×");
        ui.add(egui::DragValue::new(&mut self.resize_height).clamp_range(1..=MAX_CANVAS_DIM));
        egui::ComboBox::from_id_source("resize_anchor")
            .selected_text(self.resize_anchor.name())
            .show_ui(ui, |ui| {
                for anchor in Anchor::ALL {
                    ui.selectable_value(&mut self.resize_anchor, anchor, anchor.name());
                }
            });
        if ui.button("Resize").clicked() {
            let result = self
                .session
                .resize_canvas(self.resize_width, self.resize_height, self.resize_anchor);
            self.report("Resize failed", result);
            if self.settings.resize_anchor != self.resize_anchor {
                self.settings.resize_anchor = self.resize_anchor;
                self.settings.save();
            }
        }
    }

    // ------------------------------------------------------------------
    // Canvas area
    // ------------------------------------------------------------------

    fn canvas_area(&mut self, ui: &mut egui::Ui) {
        let ctx = ui.ctx().clone();
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let rect = response.rect;
        let ppp = ctx.pixels_per_point();

        let width = (rect.width() * ppp).round().max(1.0) as u32;
        let height = (rect.height() * ppp).round().max(1.0) as u32;
        let result = self.session.resize_viewport(width, height);
        self.report("Viewport resize failed", result);
        if self.needs_fit {
            self.session.fit_canvas();
            self.needs_fit = false;
        }

        self.handle_input(&ctx, rect, ppp, response.hovered());

        match self.session.render() {
            Ok(frame) => {
                let image = ColorImage::from_rgba_unmultiplied(
                    [frame.width() as usize, frame.height() as usize],
                    frame.as_raw(),
                );
                match &mut self.display {
                    Some(handle) => handle.set(image, TextureOptions::NEAREST),
                    None => {
                        self.display = Some(ctx.load_texture("paintgl_scene", image, TextureOptions::NEAREST));
                    }
                }
            }
            Err(e) => {
                log::error!("render failed: {e}");
                self.status = format!("Render failed: {e}");
            }
        }
        if let Some(handle) = &self.display {
            let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
            painter.image(handle.id(), rect, uv, Color32::WHITE);
        }
    }

    fn handle_input(&mut self, ctx: &egui::Context, rect: Rect, ppp: f32, hovered: bool) {
        let to_device = |p: Pos2| -> Vec2 {
            let local: EVec2 = p - rect.min;
            Vec2::new(local.x * ppp, local.y * ppp)
        };

        let (hover, pressed, released, middle_drag, scroll) = ctx.input(|i| {
            let buttons = [
                (egui::PointerButton::Primary, PointerButton::Primary),
                (egui::PointerButton::Secondary, PointerButton::Secondary),
            ];
            let pressed: Vec<PointerButton> = buttons
                .iter()
                .filter(|(b, _)| i.pointer.button_pressed(*b))
                .map(|(_, p)| *p)
                .collect();
            let released: Vec<PointerButton> = buttons
                .iter()
                .filter(|(b, _)| i.pointer.button_released(*b))
                .map(|(_, p)| *p)
                .collect();
            let middle_drag = i
                .pointer
                .button_down(egui::PointerButton::Middle)
                .then(|| i.pointer.delta());
            (i.pointer.hover_pos(), pressed, released, middle_drag, i.scroll_delta.y)
        });

        let tracking = hovered || self.session.tools().active().is_some_and(|t| t.tracks_outside_canvas());
        let device = hover.map(to_device);
        if let Some(device) = device {
            self.last_seen = Some(device);
            if tracking && self.last_hover != Some(device) {
                self.session.pointer_move(device);
                self.last_hover = Some(device);
            }
            if hovered {
                for button in &pressed {
                    self.session.pointer_down(device, *button);
                }
            }
        }

        // Releases always reach the session, even outside the window.
        if let Some(at) = release_point(device, self.last_seen) {
            for button in &released {
                self.session.pointer_up(at, *button);
            }
        }
        if device.is_none() || !tracking {
            self.leave();
        }

        if hovered {
            if let Some(delta) = middle_drag {
                self.session.pan(delta.x * ppp, delta.y * ppp);
            }
            if scroll != 0.0
                && let Some(pos) = hover
            {
                let step = self.settings.zoom_step * scroll.signum();
                let anchor = to_device(pos);
                self.session.zoom(step * self.session.camera().zoom_level(), anchor);
            }
        }

        if !ctx.wants_keyboard_input() {
            let keys = ctx.input(|i| {
                [
                    (egui::Key::Enter, Key::Enter),
                    (egui::Key::Escape, Key::Escape),
                    (egui::Key::Delete, Key::Delete),
                    (egui::Key::Backspace, Key::Backspace),
                ]
                .into_iter()
                .filter(|(k, _)| i.key_pressed(*k))
                .map(|(_, key)| key)
                .collect::<Vec<_>>()
            });
            for key in keys {
                self.session.key_press(key);
            }
            if ctx.input(|i| i.key_pressed(egui::Key::Num0) && i.modifiers.command) {
                self.needs_fit = true;
            }
        }
    }

    fn leave(&mut self) {
        if self.last_hover.take().is_some() {
            self.session.pointer_left();
        }
    }

    fn status_bar(&self, ui: &mut egui::Ui) {
        let canvas = self.session.context().canvas.size();
        ui.horizontal(|ui| {
            ui.label(format!("{}x{}", canvas.x, canvas.y));
            ui.separator();
            ui.label(format!("{:.0}%", self.session.camera().zoom_level() * 100.0));
            ui.separator();
            match self.pointer {
                Some(p) => ui.label(format!("{:.0}, {:.0}", p.x.floor(), p.y.floor())),
                None => ui.label("–"),
            };
            ui.separator();
            ui.label(&self.status);
        });
    }
}

/// Where to report a button release: the current pointer position, or the
/// last one seen when the pointer is outside the window.
fn release_point(current: Option<Vec2>, last_seen: Option<Vec2>) -> Option<Vec2> {
    current.or(last_seen)
}

impl eframe::App for PaintApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let dt = ctx.input(|i| i.stable_dt);
        self.session.update(dt);
        self.drain_events();

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.toolbar(ui));
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| self.status_bar(ui));
        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| self.canvas_area(ui));

        self.drain_events();
        ctx.request_repaint();
    }
}

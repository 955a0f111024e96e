// End-to-end flows through a software-rendered paint session.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use glam::{UVec2, Vec2};
use pretty_assertions::assert_eq;

use paintgl::colour::{Colour, ColourSlot};
use paintgl::events::{AppEvent, EventKind};
use paintgl::tools::{Key, OptionValue, PointerButton};
use paintgl::{AppSettings, PaintError, PaintSession};

const RED: Colour = Colour::rgba(255, 0, 0, 255);

fn session(canvas: UVec2, viewport: UVec2) -> PaintSession {
    let settings = AppSettings {
        gpu_acceleration: false,
        canvas_width: canvas.x,
        canvas_height: canvas.y,
        default_thickness: 2.0,
        ..AppSettings::default()
    };
    match PaintSession::new(&settings, viewport) {
        Ok(s) => s,
        Err(e) => panic!("{e}"),
    }
}

fn click(s: &mut PaintSession, at: Vec2, button: PointerButton) {
    s.pointer_down(at, button);
    s.pointer_up(at, button);
}

fn colour_at(s: &PaintSession, x: f32, y: f32) -> Option<Colour> {
    s.context().canvas.get_colour_at(x, y).ok()
}

#[test]
fn fill_turns_a_white_canvas_red() {
    let mut s = session(UVec2::new(4, 4), UVec2::new(4, 4));
    s.set_colour(ColourSlot::Primary, RED);
    assert!(s.set_tool("fill").is_ok());
    click(&mut s, Vec2::new(2.5, 2.5), PointerButton::Primary);
    let image = s.context().canvas.get_canvas_image();
    assert!(image.pixels().all(|p| p.0 == [255, 0, 0, 255]));
}

#[test]
fn pen_stroke_leaving_the_canvas_still_commits() {
    let mut s = session(UVec2::new(10, 10), UVec2::new(20, 20));
    s.pointer_down(Vec2::new(2.5, 5.5), PointerButton::Primary);
    s.pointer_move(Vec2::new(8.5, 5.5));
    s.pointer_move(Vec2::new(15.0, 5.5));
    assert!(s.context().canvas.has_pending_preview());
    s.pointer_up(Vec2::new(15.0, 5.5), PointerButton::Primary);
    assert!(!s.context().canvas.has_pending_preview());
    assert_eq!(colour_at(&s, 5.0, 5.0), Some(Colour::BLACK));
    assert_eq!(colour_at(&s, 5.0, 1.0), Some(Colour::WHITE));
}

#[test]
fn shape_started_outside_the_canvas_is_clipped() {
    let mut s = session(UVec2::new(10, 10), UVec2::new(20, 20));
    assert!(s.set_tool("shape").is_ok());
    assert!(s.set_option("shape", "outlined", OptionValue::Flag(false)).is_ok());
    s.pan(5.0, 5.0);
    // Screen (0, 0) is canvas (-5, -5) after the pan.
    s.pointer_down(Vec2::new(0.0, 0.0), PointerButton::Primary);
    s.pointer_move(Vec2::new(9.0, 9.0));
    s.pointer_up(Vec2::new(9.0, 9.0), PointerButton::Primary);
    s.key_press(Key::Enter);
    assert!(!s.context().canvas.has_pending_preview());
    assert_eq!(colour_at(&s, 1.0, 1.0), Some(Colour::BLACK));
    assert_eq!(colour_at(&s, 6.0, 6.0), Some(Colour::WHITE));
}

#[test]
fn escape_restores_the_exact_pixels() {
    let mut s = session(UVec2::new(12, 12), UVec2::new(12, 12));
    s.set_colour(ColourSlot::Primary, RED);
    assert!(s.set_tool("fill").is_ok());
    click(&mut s, Vec2::new(1.0, 1.0), PointerButton::Primary);
    let before = s.context().canvas.get_canvas_image();

    assert!(s.set_tool("shape").is_ok());
    s.pointer_down(Vec2::new(2.0, 2.0), PointerButton::Primary);
    s.pointer_move(Vec2::new(9.0, 9.0));
    s.pointer_up(Vec2::new(9.0, 9.0), PointerButton::Primary);
    assert!(s.context().canvas.has_pending_preview());
    s.key_press(Key::Escape);

    assert!(!s.context().canvas.has_pending_preview());
    assert_eq!(s.context().canvas.get_canvas_image(), before);
    assert_eq!(s.context().canvas.preview_texture().image(), &before);
}

#[test]
fn switching_tools_twice_commits_only_once() {
    let mut s = session(UVec2::new(12, 12), UVec2::new(12, 12));
    for tool in ["shape", "select", "spline"] {
        assert!(s.set_tool(tool).is_ok());
        s.pointer_down(Vec2::new(2.0, 2.0), PointerButton::Primary);
        s.pointer_move(Vec2::new(8.0, 8.0));
        s.pointer_up(Vec2::new(8.0, 8.0), PointerButton::Primary);
        assert!(s.set_tool("picker").is_ok());
        let once = s.context().canvas.get_canvas_image();
        assert!(!s.context().canvas.has_pending_preview(), "{tool}");
        assert!(s.set_tool(tool).is_ok());
        assert!(s.set_tool("picker").is_ok());
        assert_eq!(s.context().canvas.get_canvas_image(), once, "{tool}");
    }
}

#[test]
fn unknown_tool_is_rejected_and_active_tool_kept() {
    let mut s = session(UVec2::new(4, 4), UVec2::new(4, 4));
    assert!(s.set_tool("eraser").is_ok());
    assert!(matches!(s.set_tool("lasso"), Err(PaintError::UnknownTool(id)) if id == "lasso"));
    assert_eq!(s.tools().active_id(), Some("eraser"));
}

#[test]
fn zoom_keeps_the_canvas_point_under_the_pointer() {
    let mut s = session(UVec2::new(32, 32), UVec2::new(64, 64));
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    s.events().subscribe_to(EventKind::PointerMoved, move |e| {
        if let AppEvent::PointerMoved(Some(p)) = e {
            sink.borrow_mut().push(*p);
        }
    });
    let anchor = Vec2::new(12.0, 20.0);
    s.pointer_move(anchor);
    s.zoom(1.5, anchor);
    s.pointer_move(anchor);
    s.zoom(-2.0, anchor);
    s.pointer_move(anchor);

    let seen = seen.borrow();
    assert_eq!(seen.len(), 3);
    for p in seen.iter() {
        assert!((*p - Vec2::new(12.0, 20.0)).length() < 1e-3, "{p:?}");
    }
}

#[test]
fn swapping_colours_notifies_subscribers() {
    let mut s = session(UVec2::new(4, 4), UVec2::new(4, 4));
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    s.events().subscribe_to(EventKind::ColourSelectionChanged, move |e| {
        if let AppEvent::ColourSelectionChanged(pair) = e {
            sink.borrow_mut().push(pair.primary);
        }
    });
    s.set_colour(ColourSlot::Secondary, RED);
    s.swap_colours();
    assert_eq!(*seen.borrow(), vec![Colour::BLACK, RED]);
    assert_eq!(s.context().colours.secondary(), Colour::BLACK);
}

#[test]
fn exported_png_loads_back_in_the_background() {
    let mut s = session(UVec2::new(5, 3), UVec2::new(8, 8));
    s.set_colour(ColourSlot::Primary, RED);
    assert!(s.set_tool("fill").is_ok());
    click(&mut s, Vec2::new(0.5, 0.5), PointerButton::Primary);
    assert!(s.apply_effect("invert").is_ok());
    let painted = s.context().canvas.get_canvas_image();
    let bytes = match s.export_png() {
        Ok(b) => b,
        Err(e) => panic!("{e}"),
    };

    assert!(s.resize_canvas(2, 2, paintgl::Anchor::Center).is_ok());
    s.load_bytes_async(bytes, "export.png");
    for _ in 0..200 {
        s.update(0.016);
        if s.pending_loads() == 0 {
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(s.context().canvas.size(), UVec2::new(5, 3));
    assert_eq!(s.context().canvas.get_canvas_image(), painted);
}

fn drag_shape(s: &mut PaintSession) {
    assert!(s.set_tool("shape").is_ok());
    s.pointer_down(Vec2::new(2.0, 2.0), PointerButton::Primary);
    s.pointer_move(Vec2::new(12.0, 12.0));
    s.pointer_up(Vec2::new(12.0, 12.0), PointerButton::Primary);
    assert!(s.context().canvas.has_pending_preview());
}

#[test]
fn rejected_effect_keeps_pending_shape() {
    let mut s = session(UVec2::new(16, 16), UVec2::new(16, 16));
    let before = s.context().canvas.get_canvas_image();
    drag_shape(&mut s);

    assert!(matches!(s.apply_effect("sepia"), Err(PaintError::UnknownEffect(name)) if name == "sepia"));
    assert!(s.context().canvas.has_pending_preview());
    assert_eq!(s.context().canvas.get_canvas_image(), before);
}

#[test]
fn rejected_resize_keeps_pending_shape() {
    let mut s = session(UVec2::new(16, 16), UVec2::new(16, 16));
    let before = s.context().canvas.get_canvas_image();
    drag_shape(&mut s);

    for (w, h) in [(0, 8), (8, 0), (u32::MAX, u32::MAX)] {
        assert!(matches!(s.resize_canvas(w, h, paintgl::Anchor::TopLeft), Err(PaintError::InvalidSize { .. })));
    }
    assert_eq!(s.context().canvas.size(), UVec2::new(16, 16));
    assert!(s.context().canvas.has_pending_preview());
    assert_eq!(s.context().canvas.get_canvas_image(), before);
}

#[test]
fn stroke_ends_when_released_after_leaving_the_window() {
    let mut s = session(UVec2::new(10, 10), UVec2::new(10, 10));
    s.pointer_down(Vec2::new(2.5, 5.5), PointerButton::Primary);
    s.pointer_move(Vec2::new(8.5, 5.5));
    s.pointer_left();
    s.pointer_up(Vec2::new(8.5, 5.5), PointerButton::Primary);
    assert!(!s.context().canvas.has_pending_preview());
    let committed = s.context().canvas.get_canvas_image();
    assert_eq!(colour_at(&s, 5.0, 5.0), Some(Colour::BLACK));

    // Coming back without a press must not keep drawing.
    s.pointer_move(Vec2::new(5.5, 1.5));
    s.pointer_move(Vec2::new(5.5, 8.5));
    assert!(!s.context().canvas.has_pending_preview());
    assert_eq!(s.context().canvas.get_canvas_image(), committed);
}

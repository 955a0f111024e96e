// ============================================================================
// COLOUR - RGBA8 colour value and the shared primary/secondary selection
// ============================================================================

use crate::observer::{SubscriptionId, Subscribers};

/// An 8-bit-per-channel RGBA colour (straight alpha).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Colour {
    pub const BLACK: Colour = Colour::rgba(0, 0, 0, 255);
    pub const WHITE: Colour = Colour::rgba(255, 255, 255, 255);
    pub const TRANSPARENT: Colour = Colour::rgba(0, 0, 0, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Build from arbitrary integer channels, clamping each to `[0, 255]`.
    pub fn from_channels_clamped(r: i32, g: i32, b: i32, a: i32) -> Self {
        let c = |v: i32| v.clamp(0, 255) as u8;
        Self::rgba(c(r), c(g), c(b), c(a))
    }

    /// Build from normalized floats, clamping each to `[0, 1]` first.
    pub fn from_normalized(v: [f32; 4]) -> Self {
        let c = |f: f32| (f.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::rgba(c(v[0]), c(v[1]), c(v[2]), c(v[3]))
    }

    /// The `[0, 1]` float form handed to shaders as a uniform.
    pub fn normalized(&self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_array(v: [u8; 4]) -> Self {
        Self::rgba(v[0], v[1], v[2], v[3])
    }

    /// Largest per-channel difference, used for flood-fill tolerance.
    pub fn max_channel_distance(&self, other: &Colour) -> u8 {
        let d = |a: u8, b: u8| a.abs_diff(b);
        d(self.r, other.r)
            .max(d(self.g, other.g))
            .max(d(self.b, other.b))
            .max(d(self.a, other.a))
    }
}

impl From<image::Rgba<u8>> for Colour {
    fn from(p: image::Rgba<u8>) -> Self {
        Self::from_array(p.0)
    }
}

impl From<Colour> for image::Rgba<u8> {
    fn from(c: Colour) -> Self {
        image::Rgba(c.to_array())
    }
}

/// Payload sent to colour-selection subscribers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColourPair {
    pub primary: Colour,
    pub secondary: Colour,
}

/// Which slot of the selection a tool reads or writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColourSlot {
    Primary,
    Secondary,
}

/// The session-wide primary/secondary colour pair.
///
/// Every mutation bumps `generation` and notifies subscribers with the new
/// pair.  The tool manager compares generations to forward changes to the
/// active tool.
pub struct ColourSelection {
    primary: Colour,
    secondary: Colour,
    generation: u64,
    subscribers: Subscribers<ColourPair>,
}

impl Default for ColourSelection {
    fn default() -> Self {
        Self::new(Colour::BLACK, Colour::WHITE)
    }
}

impl ColourSelection {
    pub fn new(primary: Colour, secondary: Colour) -> Self {
        Self {
            primary,
            secondary,
            generation: 0,
            subscribers: Subscribers::new(),
        }
    }

    pub fn primary(&self) -> Colour {
        self.primary
    }

    pub fn secondary(&self) -> Colour {
        self.secondary
    }

    pub fn get(&self, slot: ColourSlot) -> Colour {
        match slot {
            ColourSlot::Primary => self.primary,
            ColourSlot::Secondary => self.secondary,
        }
    }

    pub fn pair(&self) -> ColourPair {
        ColourPair {
            primary: self.primary,
            secondary: self.secondary,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn set_primary(&mut self, colour: Colour) {
        self.set(ColourSlot::Primary, colour);
    }

    pub fn set(&mut self, slot: ColourSlot, colour: Colour) {
        match slot {
            ColourSlot::Primary => self.primary = colour,
            ColourSlot::Secondary => self.secondary = colour,
        }
        self.changed();
    }

    pub fn swap(&mut self) {
        std::mem::swap(&mut self.primary, &mut self.secondary);
        self.changed();
    }

    pub fn subscribe(&self, handler: impl Fn(&ColourPair) + 'static) -> SubscriptionId {
        self.subscribers.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    fn changed(&mut self) {
        self.generation += 1;
        self.subscribers.notify(&self.pair());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn channels_clamp_on_write() {
        let c = Colour::from_channels_clamped(-20, 300, 128, 255);
        assert_eq!(c, Colour::rgba(0, 255, 128, 255));
        let n = Colour::from_normalized([1.5, -0.2, 0.5, 1.0]);
        assert_eq!(n, Colour::rgba(255, 0, 128, 255));
    }

    #[test]
    fn selection_notifies_with_new_pair() {
        let mut sel = ColourSelection::default();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        sel.subscribe(move |pair| sink.borrow_mut().push(*pair));

        sel.set_primary(Colour::rgba(255, 0, 0, 255));
        sel.swap();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].primary, Colour::WHITE);
        assert_eq!(seen[1].secondary, Colour::rgba(255, 0, 0, 255));
        assert_eq!(sel.generation(), 2);
    }
}

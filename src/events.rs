// ============================================================================
// EVENTS - outbound notifications from the paint core to the UI
// ============================================================================

use glam::{UVec2, Vec2};

use crate::colour::ColourPair;
use crate::observer::{SubscriptionId, Subscribers};

/// Names of the events the core publishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    ToolChanged,
    PointerMoved,
    CanvasResized,
    ColourSelectionChanged,
    ImageLoadFailed,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::ToolChanged => "toolChanged",
            EventKind::PointerMoved => "pointerMoved",
            EventKind::CanvasResized => "canvasResized",
            EventKind::ColourSelectionChanged => "colourSelectionChanged",
            EventKind::ImageLoadFailed => "imageLoadFailed",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum AppEvent {
    /// Payload: the id of the newly active tool.
    ToolChanged(String),
    /// Canvas-local pointer position, `None` while outside the canvas.
    PointerMoved(Option<Vec2>),
    CanvasResized(UVec2),
    ColourSelectionChanged(ColourPair),
    ImageLoadFailed(String),
}

impl AppEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            AppEvent::ToolChanged(_) => EventKind::ToolChanged,
            AppEvent::PointerMoved(_) => EventKind::PointerMoved,
            AppEvent::CanvasResized(_) => EventKind::CanvasResized,
            AppEvent::ColourSelectionChanged(_) => EventKind::ColourSelectionChanged,
            AppEvent::ImageLoadFailed(_) => EventKind::ImageLoadFailed,
        }
    }
}

/// Publish/subscribe channel for [`AppEvent`]s.  Same iteration guarantees
/// as [`Subscribers`].
#[derive(Default)]
pub struct EventBus {
    subscribers: Subscribers<AppEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive every event.
    pub fn subscribe(&self, handler: impl Fn(&AppEvent) + 'static) -> SubscriptionId {
        self.subscribers.subscribe(handler)
    }

    /// Receive only events of `kind`.
    pub fn subscribe_to(
        &self,
        kind: EventKind,
        handler: impl Fn(&AppEvent) + 'static,
    ) -> SubscriptionId {
        self.subscribers.subscribe(move |event| {
            if event.kind() == kind {
                handler(event);
            }
        })
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    pub fn publish(&self, event: AppEvent) {
        log::trace!("event {}", event.kind().name());
        self.subscribers.notify(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn filtered_subscription_only_sees_its_kind() {
        let bus = EventBus::new();
        let tools = Rc::new(RefCell::new(Vec::new()));
        let sink = tools.clone();
        bus.subscribe_to(EventKind::ToolChanged, move |e| {
            if let AppEvent::ToolChanged(id) = e {
                sink.borrow_mut().push(id.clone());
            }
        });

        bus.publish(AppEvent::PointerMoved(None));
        bus.publish(AppEvent::ToolChanged("pen".into()));
        assert_eq!(*tools.borrow(), vec!["pen".to_string()]);
    }
}

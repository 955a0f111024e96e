// ============================================================================
// OBSERVER - snapshot-safe publish/subscribe list
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Handle returned by [`Subscribers::subscribe`], used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler<T> = Rc<dyn Fn(&T)>;

/// A list of callbacks notified with a `&T` payload.
///
/// Notification iterates over a snapshot of the list, so a handler may
/// subscribe or unsubscribe (itself or others) while being called:
/// * handlers added during a notification are first called on the next one;
/// * handlers removed during a notification are not called again, even if
///   they were still pending in the current snapshot.
///
/// Single-threaded by construction (`Rc`/`RefCell`): all mutation happens on
/// the UI thread.
pub struct Subscribers<T> {
    handlers: RefCell<Vec<(SubscriptionId, Handler<T>)>>,
    next_id: Cell<u64>,
}

impl<T> Default for Subscribers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Subscribers<T> {
    pub fn new() -> Self {
        Self {
            handlers: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
        }
    }

    pub fn subscribe(&self, handler: impl Fn(&T) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.handlers.borrow_mut().push((id, Rc::new(handler)));
        id
    }

    /// Returns `false` when `id` was not (or no longer) subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let before = handlers.len();
        handlers.retain(|(hid, _)| *hid != id);
        handlers.len() != before
    }

    pub fn len(&self) -> usize {
        self.handlers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.borrow().is_empty()
    }

    pub fn notify(&self, payload: &T) {
        let snapshot: Vec<(SubscriptionId, Handler<T>)> = self.handlers.borrow().clone();
        for (id, handler) in snapshot {
            let still_subscribed = self.handlers.borrow().iter().any(|(hid, _)| *hid == id);
            if still_subscribed {
                handler(payload);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handlers_can_unsubscribe_during_notify() {
        let subs: Rc<Subscribers<u32>> = Rc::new(Subscribers::new());
        let calls = Rc::new(Cell::new(0));

        let first_id = Rc::new(Cell::new(None));
        let (s, c, f) = (subs.clone(), calls.clone(), first_id.clone());
        let id = subs.subscribe(move |_| {
            c.set(c.get() + 1);
            if let Some(id) = f.get() {
                s.unsubscribe(id);
            }
        });
        first_id.set(Some(id));

        subs.notify(&1);
        subs.notify(&2);
        assert_eq!(calls.get(), 1);
        assert!(subs.is_empty());
    }

    #[test]
    fn handlers_added_during_notify_wait_for_next_round() {
        let subs: Rc<Subscribers<u32>> = Rc::new(Subscribers::new());
        let late_calls = Rc::new(Cell::new(0));

        let (s, l) = (subs.clone(), late_calls.clone());
        subs.subscribe(move |v| {
            if *v == 1 {
                let l = l.clone();
                s.subscribe(move |_| l.set(l.get() + 1));
            }
        });

        subs.notify(&1);
        assert_eq!(late_calls.get(), 0);
        subs.notify(&2);
        assert_eq!(late_calls.get(), 1);
    }

    #[test]
    fn removing_a_later_handler_skips_it() {
        let subs: Rc<Subscribers<u32>> = Rc::new(Subscribers::new());
        let second_calls = Rc::new(Cell::new(0));
        let victim = Rc::new(Cell::new(None));

        let (s, v) = (subs.clone(), victim.clone());
        subs.subscribe(move |_| {
            if let Some(id) = v.get() {
                s.unsubscribe(id);
            }
        });
        let c = second_calls.clone();
        victim.set(Some(subs.subscribe(move |_| c.set(c.get() + 1))));

        subs.notify(&0);
        assert_eq!(second_calls.get(), 0);
        assert_eq!(subs.len(), 1);
    }
}

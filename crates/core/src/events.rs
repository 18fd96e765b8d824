//! Event bus
//!
//! Typed publish/subscribe for [`GameEvent`]s. Handlers run synchronously in
//! subscription order. The bus is owned by the session and cleared when the
//! session is destroyed, so no handler outlives its game.

use std::fmt;

use crate::types::GameEvent;

pub type SubscriptionId = u64;

type Handler = Box<dyn FnMut(&GameEvent)>;

#[derive(Default)]
pub struct EventBus {
    next_id: SubscriptionId,
    handlers: Vec<(SubscriptionId, Handler)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&GameEvent) + 'static,
    {
        self.next_id += 1;
        self.handlers.push((self.next_id, Box::new(handler)));
        self.next_id
    }

    /// Returns false when `id` was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(sid, _)| *sid != id);
        self.handlers.len() != before
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn publish(&mut self, event: &GameEvent) {
        log::trace!("event {}", event.name());
        for (_, handler) in self.handlers.iter_mut() {
            handler(event);
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn publish_reaches_subscribers_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        for tag in ["a", "b"] {
            let log = Rc::clone(&log);
            bus.subscribe(move |e| log.borrow_mut().push(format!("{}:{}", tag, e.name())));
        }
        bus.publish(&GameEvent::SessionOver { is_win: true });
        assert_eq!(*log.borrow(), vec!["a:session_over", "b:session_over"]);
    }

    #[test]
    fn unsubscribe_and_clear_detach_handlers() {
        let hits = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();
        let h = Rc::clone(&hits);
        let first = bus.subscribe(move |_| *h.borrow_mut() += 1);
        let h = Rc::clone(&hits);
        bus.subscribe(move |_| *h.borrow_mut() += 10);

        assert!(bus.unsubscribe(first));
        assert!(!bus.unsubscribe(first));
        bus.publish(&GameEvent::SessionOver { is_win: false });
        assert_eq!(*hits.borrow(), 10);

        bus.clear();
        assert!(bus.is_empty());
        bus.publish(&GameEvent::SessionOver { is_win: false });
        assert_eq!(*hits.borrow(), 10);
    }
}

//! Per-model typed publish/subscribe
//!
//! Every model owns one `EventChannel`. Events form a closed set
//! (`ModelEvent`), and subscribers pick what they hear with a `Topic`.
//!
//! # Invariants
//!
//! - Subscribers are notified in registration order.
//! - No internal borrow is held while a listener runs: listeners may
//!   subscribe, unsubscribe or mutate the model that is publishing.
//! - A listener registered during a publish does not receive that event;
//!   one removed during a publish still does.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::Value;

use crate::errors::ModelError;
use crate::model::Model;
use crate::sync::SyncOp;

/// Notification published by a model
#[derive(Debug, Clone, PartialEq)]
pub enum ModelEvent {
    /// One attribute changed; `value` is its current state (`None` when unset)
    AttributeChanged { attr: String, value: Option<Value> },
    /// Coarse notification, once per flush iteration
    Changed,
    /// A validation or transport failure not handled by a callback
    Error(ModelError),
    /// The model was destroyed and should be dropped by its owners
    Destroyed,
    /// The server confirmed an operation
    Synced { op: SyncOp, response: Value },
}

impl ModelEvent {
    /// Stable display name, e.g. `changed:title`
    pub fn name(&self) -> String {
        match self {
            ModelEvent::AttributeChanged { attr, .. } => format!("changed:{attr}"),
            ModelEvent::Changed => "changed".to_string(),
            ModelEvent::Error(_) => "error".to_string(),
            ModelEvent::Destroyed => "destroyed".to_string(),
            ModelEvent::Synced { op, .. } => format!("synced:{}", op.as_str()),
        }
    }
}

/// Subscription filter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// `AttributeChanged` for one named attribute
    Attribute(String),
    /// `AttributeChanged` for any attribute
    AnyAttribute,
    Changed,
    Error,
    Destroyed,
    Synced,
    /// Every event
    All,
}

impl Topic {
    pub fn attribute(name: impl Into<String>) -> Self {
        Topic::Attribute(name.into())
    }

    pub fn matches(&self, event: &ModelEvent) -> bool {
        match (self, event) {
            (Topic::All, _) => true,
            (Topic::Attribute(name), ModelEvent::AttributeChanged { attr, .. }) => name == attr,
            (Topic::AnyAttribute, ModelEvent::AttributeChanged { .. }) => true,
            (Topic::Changed, ModelEvent::Changed) => true,
            (Topic::Error, ModelEvent::Error(_)) => true,
            (Topic::Destroyed, ModelEvent::Destroyed) => true,
            (Topic::Synced, ModelEvent::Synced { .. }) => true,
            _ => false,
        }
    }
}

/// Callback invoked with the publishing model and the event
pub type Listener = Rc<dyn Fn(&Model, &ModelEvent)>;

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    topic: Topic,
    listener: Listener,
}

/// Listener registry for a single model
#[derive(Default)]
pub struct EventChannel {
    next_id: Cell<u64>,
    subscribers: RefCell<Vec<Subscriber>>,
}

impl EventChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for every event matching `topic`
    pub fn subscribe<F>(&self, topic: Topic, listener: F) -> SubscriptionId
    where
        F: Fn(&Model, &ModelEvent) + 'static,
    {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        self.subscribers.borrow_mut().push(Subscriber {
            id,
            topic,
            listener: Rc::new(listener),
        });
        id
    }

    /// Remove a listener; returns `false` if it was already gone
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        subscribers.len() != before
    }

    /// Deliver `event` to every matching listener
    pub fn publish(&self, model: &Model, event: &ModelEvent) {
        let listeners: Vec<Listener> = self
            .subscribers
            .borrow()
            .iter()
            .filter(|s| s.topic.matches(event))
            .map(|s| s.listener.clone())
            .collect();

        tracing::trace!(
            client_id = %model.client_id(),
            event_name = %event.name(),
            listeners = listeners.len(),
            "publish"
        );

        for listener in listeners {
            listener(model, event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.subscribers.borrow().len()
    }
}

impl std::fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventChannel")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_matching() {
        let event = ModelEvent::AttributeChanged {
            attr: "title".to_string(),
            value: None,
        };
        assert!(Topic::attribute("title").matches(&event));
        assert!(!Topic::attribute("body").matches(&event));
        assert!(Topic::AnyAttribute.matches(&event));
        assert!(Topic::All.matches(&event));
        assert!(!Topic::Changed.matches(&event));
        assert!(Topic::Changed.matches(&ModelEvent::Changed));
    }

    #[test]
    fn test_event_names() {
        let event = ModelEvent::AttributeChanged {
            attr: "title".to_string(),
            value: None,
        };
        assert_eq!(event.name(), "changed:title");
        assert_eq!(ModelEvent::Changed.name(), "changed");
        assert_eq!(
            ModelEvent::Synced {
                op: SyncOp::Create,
                response: Value::Null
            }
            .name(),
            "synced:create"
        );
    }

    #[test]
    fn test_subscribe_unsubscribe() {
        let model = Model::new(crate::Attributes::new());
        let hits = Rc::new(Cell::new(0));

        let counter = hits.clone();
        let id = model
            .events()
            .subscribe(Topic::Changed, move |_, _| counter.set(counter.get() + 1));

        model.events().publish(&model, &ModelEvent::Changed);
        model.events().publish(&model, &ModelEvent::Destroyed);
        assert_eq!(hits.get(), 1);

        assert!(model.events().unsubscribe(id));
        assert!(!model.events().unsubscribe(id));
        model.events().publish(&model, &ModelEvent::Changed);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_listener_may_subscribe_during_publish() {
        let model = Model::new(crate::Attributes::new());
        let late_hits = Rc::new(Cell::new(0));

        let late = late_hits.clone();
        model.events().subscribe(Topic::Changed, move |m, _| {
            let late = late.clone();
            m.events()
                .subscribe(Topic::Changed, move |_, _| late.set(late.get() + 1));
        });

        model.events().publish(&model, &ModelEvent::Changed);
        assert_eq!(late_hits.get(), 0);
        assert_eq!(model.events().listener_count(), 2);

        model.events().publish(&model, &ModelEvent::Changed);
        assert_eq!(late_hits.get(), 1);
    }
}

use attrix_core::{Attributes, MemoryTransport, Model, ModelEvent, Topic, ValidationError};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// Build attributes from a JSON object literal
#[allow(dead_code)]
pub fn attrs(value: Value) -> Attributes {
    Attributes::try_from(value).unwrap()
}

/// Records every event a model publishes
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<ModelEvent>>>,
}

#[allow(dead_code)]
impl EventLog {
    pub fn attach(model: &Model) -> Self {
        let log = Self::default();
        let sink = log.events.clone();
        model.on(Topic::All, move |_, event| sink.borrow_mut().push(event.clone()));
        log
    }

    pub fn names(&self) -> Vec<String> {
        self.events.borrow().iter().map(ModelEvent::name).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.names().iter().filter(|n| *n == name).count()
    }

    pub fn events(&self) -> Vec<ModelEvent> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

/// Model rooted at `/items` and wired to `backend`
#[allow(dead_code)]
pub fn persisted_model(backend: &Rc<MemoryTransport>, initial: Value) -> Model {
    Model::builder()
        .url_root("/items")
        .transport(backend.clone())
        .attributes(attrs(initial))
        .build()
        .unwrap()
}

/// Rejects any mapping whose `age` is negative
#[allow(dead_code)]
pub fn non_negative_age(attributes: &Attributes) -> Result<(), ValidationError> {
    match attributes.get("age").and_then(Value::as_i64) {
        Some(age) if age < 0 => Err(ValidationError::for_attribute("age", "must not be negative")),
        _ => Ok(()),
    }
}

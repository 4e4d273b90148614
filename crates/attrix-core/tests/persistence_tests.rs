//! Persistence Tests
//!
//! fetch / save / destroy against the in-memory transport.
//!
//! ## Scenarios Covered
//!
//! 1. fetch replaces local state with the server's and confirms with Synced
//! 2. save creates new models and updates persisted ones
//! 3. Optimistic save applies locally before the server answers
//! 4. Wait save stays invisible until confirmed and rolls back on failure
//! 5. Invalid models are never sent
//! 6. destroy skips the transport for new models, honours wait otherwise
//! 7. Transport failures reach both the callback and the error event

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use attrix_core::{
    Attributes, MemoryTransport, Model, ModelError, ModelEvent, Options, SyncOp, Topic,
    TransportError,
};
use common::{attrs, non_negative_age, persisted_model, EventLog};
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

fn counter() -> (Rc<Cell<usize>>, impl Fn(&Model, &Value) + 'static) {
    let hits = Rc::new(Cell::new(0));
    let sink = hits.clone();
    (hits, move |_: &Model, _: &Value| sink.set(sink.get() + 1))
}

// ===== fetch =====

#[test]
fn test_fetch_applies_server_state() {
    // GIVEN a stored record that differs from the local copy
    let backend = Rc::new(MemoryTransport::new());
    backend.insert("/items/1", json!({"id": 1, "name": "server", "extra": true}));
    let model = persisted_model(&backend, json!({"id": 1, "name": "local"}));
    let log = EventLog::attach(&model);
    let (successes, on_success) = counter();

    // WHEN the model is fetched
    model.fetch(Options::new().on_success(on_success)).unwrap();

    // THEN server state wins and the read is confirmed
    assert_eq!(model.to_json(), json!({"id": 1, "name": "server", "extra": true}));
    assert_eq!(
        log.names(),
        vec!["changed:extra", "changed:name", "changed", "synced:read"]
    );
    assert_eq!(successes.get(), 1);
    assert_eq!(backend.requests(), vec![(SyncOp::Read, "/items/1".to_string())]);
}

#[test]
fn test_fetch_not_found_reports_error() {
    // GIVEN no stored record
    let backend = Rc::new(MemoryTransport::new());
    let model = persisted_model(&backend, json!({"id": 2, "name": "local"}));
    let log = EventLog::attach(&model);
    let failures = Rc::new(RefCell::new(Vec::new()));
    let sink = failures.clone();

    // WHEN fetched with an error callback
    model
        .fetch(Options::new().on_error(move |_, err| sink.borrow_mut().push(err.clone())))
        .unwrap();

    // THEN the callback and the error event both saw the 404
    assert_eq!(failures.borrow().len(), 1);
    assert!(failures.borrow()[0].as_transport().unwrap().is_not_found());
    assert_eq!(log.names(), vec!["error"]);
    assert_eq!(model.get("name"), Some(json!("local")));
}

#[test]
fn test_fetch_rejected_by_validator_stops_quietly() {
    // GIVEN a stored record the validator would reject
    let backend = Rc::new(MemoryTransport::new());
    backend.insert("/items/3", json!({"id": 3, "age": -1}));
    let model = Model::builder()
        .url_root("/items")
        .transport(backend.clone())
        .validator(non_negative_age)
        .attributes(attrs(json!({"id": 3, "age": 4})))
        .build()
        .unwrap();
    let log = EventLog::attach(&model);
    let (successes, on_success) = counter();

    // WHEN fetched
    model.fetch(Options::new().on_success(on_success)).unwrap();

    // THEN nothing was applied, no success and no Synced
    assert_eq!(model.get("age"), Some(json!(4)));
    assert_eq!(successes.get(), 0);
    assert_eq!(log.names(), vec!["error"]);
}

// ===== save =====

#[test]
fn test_save_new_model_creates() {
    // GIVEN a new model
    let backend = Rc::new(MemoryTransport::new());
    let model = persisted_model(&backend, json!({"name": "a"}));
    let log = EventLog::attach(&model);
    assert!(model.is_new());

    // WHEN saved
    model.save(None, Options::new()).unwrap();

    // THEN it was created and took the server id
    assert_eq!(backend.requests(), vec![(SyncOp::Create, "/items".to_string())]);
    assert_eq!(model.id(), Some(json!(1)));
    assert!(!model.is_new());
    assert_eq!(model.url().unwrap(), "/items/1");
    assert_eq!(log.names(), vec!["changed:id", "changed", "synced:create"]);
}

#[test]
fn test_save_persisted_model_updates() {
    let backend = Rc::new(MemoryTransport::new());
    let model = persisted_model(&backend, json!({"id": 8, "name": "a"}));

    model.save_attr("name", "b", Options::new()).unwrap();

    assert_eq!(backend.requests(), vec![(SyncOp::Update, "/items/8".to_string())]);
    assert_eq!(backend.record("/items/8"), Some(json!({"id": 8, "name": "b"})));
}

#[test]
fn test_optimistic_save_is_visible_before_confirmation() {
    // GIVEN a deferred backend
    let backend = Rc::new(MemoryTransport::deferred());
    let model = persisted_model(&backend, json!({"id": 5, "name": "a"}));
    let log = EventLog::attach(&model);

    // WHEN saved without wait
    model.save_attr("name", "b", Options::new()).unwrap();

    // THEN the change is already applied and announced
    assert_eq!(model.get("name"), Some(json!("b")));
    assert_eq!(log.names(), vec!["changed:name", "changed"]);

    // WHEN the server confirms with the same state
    backend.complete_all();

    // THEN only the confirmation follows
    assert_eq!(
        log.names(),
        vec!["changed:name", "changed", "synced:update"]
    );
}

#[test]
fn test_optimistic_save_takes_server_state_last() {
    // GIVEN a server that normalizes names
    let backend = Rc::new(MemoryTransport::deferred());
    let model = Model::builder()
        .url_root("/items")
        .transport(backend.clone())
        .parser(|payload: Value| -> attrix_core::Result<Attributes> {
            let mut parsed = Attributes::try_from(payload)?;
            if let Some(Value::String(name)) = parsed.get("name").cloned() {
                parsed.insert("name", name.to_uppercase());
            }
            Ok(parsed)
        })
        .attributes(attrs(json!({"id": 1, "name": "a"})))
        .build()
        .unwrap();

    // WHEN a save is confirmed after a further local edit
    model.save_attr("name", "b", Options::new()).unwrap();
    model.set_attr("name", "c", &Options::new()).unwrap();
    backend.complete_all();

    // THEN the server's answer overwrites the local edit
    assert_eq!(model.get("name"), Some(json!("B")));
}

#[test]
fn test_wait_save_is_invisible_until_confirmed() {
    // GIVEN a deferred backend and a new model
    let backend = Rc::new(MemoryTransport::deferred());
    let model = persisted_model(&backend, json!({"name": "a"}));
    let log = EventLog::attach(&model);

    // WHEN saved with wait
    model.save_attr("name", "b", Options::new().wait()).unwrap();

    // THEN the request carried the proposal but the model shows the baseline
    assert_eq!(backend.record("/items/1"), Some(json!({"id": 1, "name": "b"})));
    assert_eq!(model.get("name"), Some(json!("a")));
    assert!(log.names().is_empty());
    assert!(!model.has_changed_attr("name"));

    // WHEN the server confirms
    backend.complete_all();

    // THEN proposal and server state are applied with events
    assert_eq!(model.to_json(), json!({"id": 1, "name": "b"}));
    assert_eq!(
        log.names(),
        vec!["changed:id", "changed:name", "changed", "synced:create"]
    );
}

#[test]
fn test_wait_save_confirmed_synchronously_keeps_proposal() {
    let backend = Rc::new(MemoryTransport::new());
    let model = persisted_model(&backend, json!({"name": "a"}));

    model.save_attr("name", "b", Options::new().wait()).unwrap();

    assert_eq!(model.to_json(), json!({"id": 1, "name": "b"}));
    assert!(!model.has_changed());
}

#[test]
fn test_wait_save_failure_restores_baseline() {
    // GIVEN a backend that fails the next request
    let backend = Rc::new(MemoryTransport::new());
    backend.fail_next(TransportError::with_status(500, "boom"));
    let model = persisted_model(&backend, json!({"id": 4, "name": "a", "n": 1}));
    let baseline = model.attributes();
    let log = EventLog::attach(&model);
    let failures = Rc::new(Cell::new(0));
    let count = failures.clone();

    // WHEN a wait save adds and changes attributes
    model
        .save(
            Some(attrs(json!({"name": "b", "fresh": true}))),
            Options::new()
                .wait()
                .on_error(move |_, _| count.set(count.get() + 1)),
        )
        .unwrap();

    // THEN the model is exactly the baseline, with nothing recorded as changed
    assert_eq!(model.attributes(), baseline);
    assert_eq!(model.changed_attributes(), None);
    assert_eq!(failures.get(), 1);
    assert_eq!(log.names(), vec!["error"]);
}

#[test]
fn test_invalid_model_is_not_sent() {
    // GIVEN a model made invalid silently
    let backend = Rc::new(MemoryTransport::new());
    let model = Model::builder()
        .url_root("/items")
        .transport(backend.clone())
        .validator(non_negative_age)
        .build()
        .unwrap();
    model.set_attr("age", -3, &Options::new().silent()).unwrap();
    let log = EventLog::attach(&model);

    // WHEN saved without attributes
    let result = model.save(None, Options::new());

    // THEN it fails without callbacks, events or requests
    assert!(matches!(result, Err(ModelError::Invalid(_))));
    assert!(log.names().is_empty());
    assert!(backend.requests().is_empty());
}

#[test]
fn test_invalid_proposal_is_not_sent() {
    let backend = Rc::new(MemoryTransport::new());
    let model = Model::builder()
        .url_root("/items")
        .transport(backend.clone())
        .validator(non_negative_age)
        .attributes(attrs(json!({"age": 1})))
        .build()
        .unwrap();

    for options in [Options::new(), Options::new().wait()] {
        let result = model.save_attr("age", -1, options.on_error(|_, _| {}));
        assert!(matches!(result, Err(ModelError::Invalid(_))));
    }

    assert!(backend.requests().is_empty());
    assert_eq!(model.get("age"), Some(json!(1)));
}

// ===== destroy =====

#[test]
fn test_destroy_new_model_skips_transport() {
    // GIVEN a model that was never saved
    let backend = Rc::new(MemoryTransport::new());
    let model = persisted_model(&backend, json!({"name": "draft"}));
    let log = EventLog::attach(&model);
    let responses = Rc::new(RefCell::new(Vec::new()));
    let sink = responses.clone();

    // WHEN destroyed
    let handle = model
        .destroy(Options::new().on_success(move |_, resp| sink.borrow_mut().push(resp.clone())))
        .unwrap();

    // THEN no request was made and removal was announced at once
    assert!(handle.is_none());
    assert!(backend.requests().is_empty());
    assert_eq!(log.names(), vec!["destroyed"]);
    assert_eq!(*responses.borrow(), vec![Value::Null]);
}

#[test]
fn test_optimistic_destroy_fires_before_confirmation() {
    let backend = Rc::new(MemoryTransport::deferred());
    backend.insert("/items/7", json!({"id": 7}));
    let model = persisted_model(&backend, json!({"id": 7}));
    let log = EventLog::attach(&model);

    let handle = model.destroy(Options::new()).unwrap().unwrap();
    assert_eq!(handle.op, SyncOp::Delete);
    assert_eq!(handle.url, "/items/7");
    assert_eq!(log.names(), vec!["destroyed"]);

    backend.complete_all();
    assert_eq!(log.names(), vec!["destroyed", "synced:delete"]);
    assert_eq!(backend.record("/items/7"), None);
}

#[test]
fn test_wait_destroy_fires_on_confirmation() {
    // GIVEN a persisted model and a deferred backend
    let backend = Rc::new(MemoryTransport::deferred());
    backend.insert("/items/7", json!({"id": 7}));
    let model = persisted_model(&backend, json!({"id": 7}));
    let log = EventLog::attach(&model);

    // WHEN destroyed with wait
    model.destroy(Options::new().wait()).unwrap();

    // THEN removal waits for the server
    assert!(log.names().is_empty());
    backend.complete_all();
    assert_eq!(log.names(), vec!["destroyed", "synced:delete"]);
}

#[test]
fn test_failed_destroy_reports_after_optimistic_removal() {
    let backend = Rc::new(MemoryTransport::deferred());
    let model = persisted_model(&backend, json!({"id": 99}));
    let log = EventLog::attach(&model);

    model.destroy(Options::new()).unwrap();
    backend.complete_all();

    assert_eq!(log.names(), vec!["destroyed", "error"]);
    match &log.events()[1] {
        ModelEvent::Error(err) => assert!(err.as_transport().unwrap().is_not_found()),
        other => panic!("unexpected event {other:?}"),
    }
}

// ===== location =====

#[test]
fn test_collection_url_is_used_without_root() {
    let backend = Rc::new(MemoryTransport::new());
    let model = Model::builder()
        .collection_url("/lists/3/items")
        .transport(backend.clone())
        .build()
        .unwrap();

    model.save(None, Options::new()).unwrap();

    assert_eq!(
        backend.requests(),
        vec![(SyncOp::Create, "/lists/3/items".to_string())]
    );
    assert_eq!(model.url().unwrap(), "/lists/3/items/1");
}

#[test]
fn test_synced_event_carries_response() {
    let backend = Rc::new(MemoryTransport::new());
    let model = persisted_model(&backend, json!({"name": "a"}));
    let responses = Rc::new(RefCell::new(Vec::new()));
    let sink = responses.clone();
    model.on(Topic::Synced, move |_, event| {
        if let ModelEvent::Synced { op, response } = event {
            sink.borrow_mut().push((*op, response.clone()));
        }
    });

    model.save(None, Options::new()).unwrap();

    assert_eq!(
        *responses.borrow(),
        vec![(SyncOp::Create, json!({"id": 1, "name": "a"}))]
    );
}

//! In-memory transport
//!
//! A REST-like resource table keyed by location. Records are written when
//! a request is issued; the outcome is delivered either right away
//! (immediate mode) or when the owner drives the queue (deferred mode),
//! which lets callers observe a model while its request is in flight.

use serde_json::Value;
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};

use super::transport::{Completion, Outcome, RequestHandle, Transport};
use super::SyncOp;
use crate::errors::{Result, TransportError};
use crate::model::Model;

struct InFlight {
    handle: RequestHandle,
    outcome: Outcome,
    completion: Completion,
}

#[derive(Default)]
struct MemoryState {
    records: BTreeMap<String, Value>,
    next_id: u64,
    failures: VecDeque<TransportError>,
    in_flight: VecDeque<InFlight>,
    log: Vec<(SyncOp, String)>,
}

/// Transport backed by a map of location to JSON record
///
/// ```
/// use std::rc::Rc;
/// use attrix_core::{Attributes, MemoryTransport, Model, Options};
///
/// let backend = Rc::new(MemoryTransport::new());
/// let model = Model::builder()
///     .url_root("/notes")
///     .transport(backend.clone())
///     .attributes(Attributes::new().with("title", "hello"))
///     .build()
///     .unwrap();
///
/// model.save(None, Options::new()).unwrap();
/// assert_eq!(model.url().unwrap(), "/notes/1");
/// assert!(backend.record("/notes/1").is_some());
/// ```
#[derive(Default)]
pub struct MemoryTransport {
    deferred: bool,
    state: RefCell<MemoryState>,
}

impl MemoryTransport {
    /// Completes every request before `sync` returns
    pub fn new() -> Self {
        Self::default()
    }

    /// Holds completions until `complete_next`/`complete_all`
    pub fn deferred() -> Self {
        Self {
            deferred: true,
            ..Self::default()
        }
    }

    /// Seed a record at `url`
    pub fn insert(&self, url: impl Into<String>, record: Value) {
        self.state.borrow_mut().records.insert(url.into(), record);
    }

    pub fn record(&self, url: &str) -> Option<Value> {
        self.state.borrow().records.get(url).cloned()
    }

    pub fn record_count(&self) -> usize {
        self.state.borrow().records.len()
    }

    /// Fail the next issued request with `error` instead of touching records
    pub fn fail_next(&self, error: TransportError) {
        self.state.borrow_mut().failures.push_back(error);
    }

    /// Every request issued so far, oldest first
    pub fn requests(&self) -> Vec<(SyncOp, String)> {
        self.state.borrow().log.clone()
    }

    pub fn in_flight(&self) -> usize {
        self.state.borrow().in_flight.len()
    }

    /// Deliver the oldest queued outcome; `false` when nothing is queued
    pub fn complete_next(&self) -> bool {
        let next = self.state.borrow_mut().in_flight.pop_front();
        match next {
            Some(request) => {
                tracing::trace!(
                    request_id = %request.handle.request_id,
                    sync_op = request.handle.op.as_str(),
                    ok = request.outcome.is_ok(),
                    "completing deferred request"
                );
                (request.completion)(request.outcome);
                true
            }
            None => false,
        }
    }

    /// Deliver queued outcomes until the queue is empty, including any
    /// requests issued by the completions themselves
    pub fn complete_all(&self) -> usize {
        let mut delivered = 0;
        while self.complete_next() {
            delivered += 1;
        }
        delivered
    }

    fn execute(&self, op: SyncOp, url: &str, model: &Model) -> Outcome {
        let mut state = self.state.borrow_mut();
        if let Some(error) = state.failures.pop_front() {
            return Err(error);
        }

        match op {
            SyncOp::Create => {
                state.next_id += 1;
                let id = state.next_id;
                let mut record = model.attributes();
                record.insert(model.id_attribute(), id);
                let separator = if url.ends_with('/') { "" } else { "/" };
                let location = format!("{url}{separator}{id}");
                let body = record.to_value();
                state.records.insert(location, body.clone());
                Ok(body)
            }
            SyncOp::Read => state
                .records
                .get(url)
                .cloned()
                .ok_or_else(|| TransportError::not_found(url)),
            SyncOp::Update => {
                let body = model.to_json();
                state.records.insert(url.to_string(), body.clone());
                Ok(body)
            }
            SyncOp::Delete => state
                .records
                .remove(url)
                .map(|_| Value::Null)
                .ok_or_else(|| TransportError::not_found(url)),
        }
    }
}

impl Transport for MemoryTransport {
    fn sync(&self, op: SyncOp, model: &Model, completion: Completion) -> Result<RequestHandle> {
        let url = model.url()?;
        let handle = RequestHandle::new(op, url.clone());
        self.state.borrow_mut().log.push((op, url.clone()));

        let outcome = self.execute(op, &url, model);
        tracing::trace!(
            request_id = %handle.request_id,
            client_id = %model.client_id(),
            sync_op = op.as_str(),
            url = %url,
            ok = outcome.is_ok(),
            deferred = self.deferred,
            "memory transport request"
        );

        if self.deferred {
            self.state.borrow_mut().in_flight.push_back(InFlight {
                handle: handle.clone(),
                outcome,
                completion,
            });
        } else {
            completion(outcome);
        }
        Ok(handle)
    }
}

impl std::fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("MemoryTransport")
            .field("deferred", &self.deferred)
            .field("records", &state.records.len())
            .field("in_flight", &state.in_flight.len())
            .finish()
    }
}

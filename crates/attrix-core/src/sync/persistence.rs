//! fetch / save / destroy
//!
//! Each operation issues one transport request and merges the server's
//! answer back into the model from the completion. Transport failures are
//! routed through `report_transport_error`, which notifies the caller's
//! error callback and always publishes an `Error` event.
//!
//! # Wait semantics
//!
//! `save` with `wait` applies the proposal silently only for the duration of
//! the transport call (so the request carries it), then restores the prior
//! attributes unless the server already answered. The proposal becomes
//! visible, with events, once the server confirms it.

use serde_json::Value;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use super::transport::{Completion, Outcome, RequestHandle};
use super::SyncOp;
use crate::errors::{ModelError, Result};
use crate::events::ModelEvent;
use crate::model::store::Proposal;
use crate::model::{validation, Attributes, Model, Options};
use crate::{log_op_end, log_op_error, log_op_start};

/// Shared failure path for transport-backed operations
///
/// Calls the error callback in `options`, if any, then publishes
/// `ModelEvent::Error` so a single subscriber can observe every failure.
pub fn report_transport_error(model: &Model, error: impl Into<ModelError>, options: &Options) {
    let error = error.into();
    tracing::warn!(
        client_id = %model.client_id(),
        error = %error,
        "sync failed"
    );
    if let Some(callback) = &options.error {
        callback(model, &error);
    }
    model.publish(ModelEvent::Error(error));
}

/// Options for the completion side, with the error callback routed through
/// `report_transport_error`
fn with_reporting(options: &Options) -> Options {
    let original = options.clone();
    let mut wrapped = options.clone();
    wrapped.error = Some(Rc::new(move |model: &Model, error: &ModelError| {
        report_transport_error(model, error.clone(), &original)
    }));
    wrapped
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

impl Model {
    /// Replace local state with the server's representation
    ///
    /// The response is parsed and applied with `set`; if validation rejects
    /// it, the operation stops without calling `success` or publishing
    /// `Synced`.
    ///
    /// # Errors
    ///
    /// Returns `MissingTransport`, or the transport's error when the request
    /// cannot be issued.
    pub fn fetch(&self, options: Options) -> Result<RequestHandle> {
        let started = Instant::now();
        log_op_start!("fetch", client_id = %self.client_id());

        let result = self.issue(SyncOp::Read, self.fetch_completion(options));
        self.log_outcome("fetch", &result, started);
        result
    }

    /// Persist the model, optionally applying `attrs` first
    ///
    /// Issues `Create` for new models and `Update` otherwise. Without
    /// `wait` the attributes are applied immediately, with events, and the
    /// server's response is applied again on success.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` when the proposal (or, without attributes, the
    /// current state) fails validation; nothing is sent in that case.
    /// Returns `MissingTransport` or the transport's error when the request
    /// cannot be issued.
    pub fn save(&self, attrs: Option<Attributes>, options: Options) -> Result<RequestHandle> {
        let started = Instant::now();
        log_op_start!("save", client_id = %self.client_id(), wait = options.wait);

        let result = self.save_inner(attrs, options);
        self.log_outcome("save", &result, started);
        result
    }

    /// Single key/value form of `save`
    ///
    /// # Errors
    ///
    /// Same as `save`.
    pub fn save_attr(
        &self,
        key: impl Into<String>,
        value: impl Into<Value>,
        options: Options,
    ) -> Result<RequestHandle> {
        self.save(Some(Attributes::new().with(key, value)), options)
    }

    /// Remove the model on the server
    ///
    /// A new model is never sent: `Destroyed` fires at once and `Ok(None)`
    /// is returned. Otherwise `Destroyed` fires right after the request is
    /// issued, or on server confirmation with `wait`.
    ///
    /// # Errors
    ///
    /// Returns `MissingTransport` or the transport's error when the request
    /// cannot be issued.
    pub fn destroy(&self, options: Options) -> Result<Option<RequestHandle>> {
        let started = Instant::now();
        log_op_start!("destroy", client_id = %self.client_id(), wait = options.wait);

        if self.is_new() {
            self.publish(ModelEvent::Destroyed);
            if let Some(callback) = &options.success {
                callback(self, &Value::Null);
            }
            log_op_end!("destroy", duration_ms = elapsed_ms(started), sent = false);
            return Ok(None);
        }

        let wait = options.wait;
        let result = self.issue(SyncOp::Delete, self.destroy_completion(options));
        if result.is_ok() && !wait {
            self.publish(ModelEvent::Destroyed);
        }
        self.log_outcome("destroy", &result, started);
        result.map(Some)
    }

    fn save_inner(&self, attrs: Option<Attributes>, options: Options) -> Result<RequestHandle> {
        let transport = self.transport()?;
        let mut quiet = options.clone();
        quiet.silent = true;

        let baseline = if options.wait {
            let proposal = Proposal::new(attrs.clone().unwrap_or_default(), false);
            validation::gate(self, &proposal, &options)?;
            Some(self.attributes())
        } else {
            None
        };

        match &attrs {
            Some(proposed) => {
                let apply_with = if options.wait { &quiet } else { &options };
                self.set(proposed.clone(), apply_with)?;
            }
            None => {
                if let Some(rejection) = self.validation_error() {
                    return Err(ModelError::Invalid(rejection));
                }
            }
        }

        let op = if self.is_new() {
            SyncOp::Create
        } else {
            SyncOp::Update
        };
        let done = Rc::new(Cell::new(false));
        let completion = self.save_completion(op, attrs, options, done.clone());
        let issued = transport.sync(op, self, completion);

        if let Some(baseline) = baseline {
            if !done.get() {
                tracing::debug!(client_id = %self.client_id(), "restoring attributes until save confirms");
                self.clear(&quiet)?;
                self.set(baseline, &quiet)?;
            }
        }
        issued
    }

    fn issue(&self, op: SyncOp, completion: Completion) -> Result<RequestHandle> {
        self.transport()?.sync(op, self, completion)
    }

    fn fetch_completion(&self, options: Options) -> Completion {
        let model = self.clone();
        let reporting = with_reporting(&options);
        Box::new(move |outcome: Outcome| match outcome {
            Ok(response) => {
                let parsed = match model.parse(response.clone()) {
                    Ok(parsed) => parsed,
                    Err(err) => return report_transport_error(&model, err, &options),
                };
                if model.set(parsed, &reporting).is_err() {
                    return;
                }
                if let Some(callback) = &options.success {
                    callback(&model, &response);
                }
                model.publish(ModelEvent::Synced {
                    op: SyncOp::Read,
                    response,
                });
            }
            Err(err) => report_transport_error(&model, err, &options),
        })
    }

    fn save_completion(
        &self,
        op: SyncOp,
        proposed: Option<Attributes>,
        options: Options,
        done: Rc<Cell<bool>>,
    ) -> Completion {
        let model = self.clone();
        let reporting = with_reporting(&options);
        Box::new(move |outcome: Outcome| match outcome {
            Ok(response) => {
                done.set(true);
                let parsed = match model.parse(response.clone()) {
                    Ok(parsed) => parsed,
                    Err(err) => return report_transport_error(&model, err, &options),
                };
                let server_state = if options.wait {
                    proposed.unwrap_or_default().merged(&parsed)
                } else {
                    parsed
                };
                if model.set(server_state, &reporting).is_err() {
                    return;
                }
                if let Some(callback) = &options.success {
                    callback(&model, &response);
                }
                model.publish(ModelEvent::Synced { op, response });
            }
            Err(err) => report_transport_error(&model, err, &options),
        })
    }

    fn destroy_completion(&self, options: Options) -> Completion {
        let model = self.clone();
        Box::new(move |outcome: Outcome| match outcome {
            Ok(response) => {
                if options.wait {
                    model.publish(ModelEvent::Destroyed);
                }
                if let Some(callback) = &options.success {
                    callback(&model, &response);
                }
                if !model.is_new() {
                    model.publish(ModelEvent::Synced {
                        op: SyncOp::Delete,
                        response,
                    });
                }
            }
            Err(err) => report_transport_error(&model, err, &options),
        })
    }

    fn log_outcome<T>(&self, op: &'static str, result: &Result<T>, started: Instant) {
        match result {
            Ok(_) => {
                log_op_end!(op, duration_ms = elapsed_ms(started), client_id = %self.client_id());
            }
            Err(err) => {
                log_op_error!(
                    op,
                    err.clone(),
                    duration_ms = elapsed_ms(started),
                    client_id = %self.client_id()
                );
            }
        }
    }
}

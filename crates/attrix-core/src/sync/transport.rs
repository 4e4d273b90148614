use attrix_core_types::RequestId;
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::SyncOp;
use crate::errors::{Result, TransportError};
use crate::model::Model;

/// Server response or failure for one request
pub type Outcome = std::result::Result<Value, TransportError>;

/// Receives the outcome of one request; called exactly once
pub type Completion = Box<dyn FnOnce(Outcome)>;

/// Performs create/read/update/delete against a remote resource
///
/// `sync` returns once the request has been issued. The outcome arrives
/// through `completion`, either before `sync` returns or later, when the
/// transport drives it.
pub trait Transport {
    /// # Errors
    ///
    /// Returns an error when the request cannot be issued at all (for
    /// example an unresolvable location). `completion` is dropped uncalled
    /// in that case.
    fn sync(&self, op: SyncOp, model: &Model, completion: Completion) -> Result<RequestHandle>;
}

/// Receipt for an issued request
#[derive(Debug, Clone, PartialEq)]
pub struct RequestHandle {
    pub request_id: RequestId,
    pub op: SyncOp,
    pub url: String,
    pub issued_at: DateTime<Utc>,
}

impl RequestHandle {
    pub fn new(op: SyncOp, url: impl Into<String>) -> Self {
        Self {
            request_id: RequestId::new(),
            op,
            url: url.into(),
            issued_at: Utc::now(),
        }
    }
}

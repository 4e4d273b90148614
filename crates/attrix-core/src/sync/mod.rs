//! Persistence plumbing
//!
//! The seams a model uses to talk to a remote resource (`Transport`,
//! `PayloadParser`, `LocationResolver`), their default implementations, and
//! the fetch/save/destroy lifecycle built on them.

pub mod location;
pub mod memory;
pub mod parse;
pub mod persistence;
pub mod transport;

pub use location::{LocationResolver, RestLocation};
pub use memory::MemoryTransport;
pub use parse::{IdentityParser, PayloadParser};
pub use persistence::report_transport_error;
pub use transport::{Completion, Outcome, RequestHandle, Transport};

use serde::{Deserialize, Serialize};

/// Kind of request sent to a transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncOp {
    Create,
    Read,
    Update,
    Delete,
}

impl SyncOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncOp::Create => "create",
            SyncOp::Read => "read",
            SyncOp::Update => "update",
            SyncOp::Delete => "delete",
        }
    }
}

impl std::fmt::Display for SyncOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Attrix Core - observable, validated attribute models
//!
//! This crate provides a single-threaded model abstraction with:
//! - Attribute storage with per-attribute change tracking against the last
//!   stabilized snapshot
//! - A reentrancy-safe flush loop that coalesces notifications into typed
//!   per-instance events
//! - An atomic validation gate over the complete prospective mapping
//! - fetch/save/destroy against a pluggable transport, with optimistic and
//!   wait-for-server semantics and rollback
//!
//! ```
//! use attrix_core::{Attributes, Model, Options, Topic};
//!
//! let model = Model::new(Attributes::new().with("name", "a"));
//! model.on(Topic::Changed, |m, _| {
//!     assert!(m.has_changed());
//! });
//! model.set(Attributes::new().with("name", "b"), &Options::new()).unwrap();
//! ```

pub mod config;
pub mod errors;
pub mod events;
pub mod logging_facility;
pub mod model;
pub mod sync;

// Re-export commonly used types
pub use attrix_core_types::{ClientId, RequestId};
pub use config::ModelConfig;
pub use errors::{ExError, ExErrorKind, ModelError, Result, TransportError, ValidationError};
pub use events::{EventChannel, ModelEvent, SubscriptionId, Topic};
pub use model::{Attributes, Changes, Model, ModelBuilder, Options, Validator};
pub use sync::{
    IdentityParser, LocationResolver, MemoryTransport, PayloadParser, RequestHandle,
    RestLocation, SyncOp, Transport,
};

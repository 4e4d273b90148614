//! Core types shared across Attrix facilities
//!
//! This crate provides foundational types used by the model engine, the
//! error facility and the logging facility:
//!
//! - **Identity types**: ClientId, RequestId
//! - **Schema constants**: Canonical field keys and event names

pub mod identity;
pub mod schema;

pub use identity::{ClientId, RequestId};

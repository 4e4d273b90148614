//! Identity types for models and sync requests
//!
//! A `ClientId` names a model locally before the server has assigned it an
//! id. A `RequestId` correlates one transport request with its log events.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Locally generated model identity
///
/// Assigned once when a model is constructed and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientId(String);

impl ClientId {
    /// Generate a fresh client id (`c` followed by a UUIDv7)
    pub fn new() -> Self {
        Self(format!("c{}", Uuid::now_v7().simple()))
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create from an existing string (for deserialization)
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a single transport request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a new random RequestId using UUIDv7
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create from an existing string (for deserialization)
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_id_generation() {
        let id1 = ClientId::new();
        let id2 = ClientId::new();

        assert_ne!(id1, id2);
        assert!(id1.as_str().starts_with('c'));
        assert!(id1.as_str().len() > 1);
    }

    #[test]
    fn test_client_id_display() {
        let id = ClientId::from_string("c42".to_string());
        assert_eq!(format!("{}", id), "c42");
    }

    #[test]
    fn test_request_id_generation() {
        let id1 = RequestId::new();
        let id2 = RequestId::new();

        assert_ne!(id1, id2);
        assert!(!id1.as_str().is_empty());
    }

    #[test]
    fn test_request_id_display() {
        let id = RequestId::new();
        let display_str = format!("{}", id);
        assert_eq!(display_str, id.as_str());
    }

    #[test]
    fn test_serialization() {
        let id = ClientId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: ClientId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}

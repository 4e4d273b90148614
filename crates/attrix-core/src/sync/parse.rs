use serde_json::Value;

use crate::errors::Result;
use crate::model::Attributes;

/// Turns a transport payload into an attribute mapping
pub trait PayloadParser {
    /// # Errors
    ///
    /// Returns an error when the payload has no attribute mapping form.
    fn parse(&self, payload: Value) -> Result<Attributes>;
}

/// Takes the payload as-is: objects become mappings, `null` is empty
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityParser;

impl PayloadParser for IdentityParser {
    fn parse(&self, payload: Value) -> Result<Attributes> {
        Attributes::try_from(payload)
    }
}

impl<F> PayloadParser for F
where
    F: Fn(Value) -> Result<Attributes>,
{
    fn parse(&self, payload: Value) -> Result<Attributes> {
        self(payload)
    }
}

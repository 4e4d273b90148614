use serde_json::Value;

use crate::errors::{ModelError, Result};
use crate::model::Model;

/// Computes where a model lives on the remote side
pub trait LocationResolver {
    /// # Errors
    ///
    /// Returns `UrlUnresolvable` when no location can be derived.
    fn resolve(&self, model: &Model) -> Result<String>;
}

/// `<base>` for new models, `<base>/<encoded id>` otherwise
///
/// The base is the model's `url_root`, falling back to its collection url.
#[derive(Debug, Clone, Copy, Default)]
pub struct RestLocation;

impl LocationResolver for RestLocation {
    fn resolve(&self, model: &Model) -> Result<String> {
        let config = model.config();
        let base = config
            .url_root
            .as_deref()
            .or(config.collection_url.as_deref())
            .ok_or_else(|| ModelError::UrlUnresolvable {
                client_id: model.client_id().to_string(),
            })?;

        if model.is_new() {
            return Ok(base.to_string());
        }
        let id = match model.id() {
            Some(Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => String::new(),
        };
        let separator = if base.ends_with('/') { "" } else { "/" };
        Ok(format!("{base}{separator}{}", urlencoding::encode(&id)))
    }
}

impl<F> LocationResolver for F
where
    F: Fn(&Model) -> Result<String>,
{
    fn resolve(&self, model: &Model) -> Result<String> {
        self(model)
    }
}

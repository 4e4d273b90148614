//! Declarative model configuration
//!
//! A `ModelConfig` captures everything about a model kind that is plain
//! data (id attribute, locations, defaults). Strategies such as validators
//! and transports are code and are attached through `ModelBuilder`.
//!
//! ```
//! use attrix_core::ModelConfig;
//!
//! let config = ModelConfig::from_toml_str(r#"
//! id_attribute = "_id"
//! url_root = "/api/notes"
//!
//! [defaults]
//! title = "untitled"
//! "#).unwrap();
//! assert_eq!(config.id_attribute, "_id");
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::model::Attributes;

pub const DEFAULT_ID_ATTRIBUTE: &str = "id";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Attribute mirrored into the model id
    pub id_attribute: String,
    /// Resource root; takes precedence over `collection_url`
    pub url_root: Option<String>,
    /// Location of the owning collection, used when `url_root` is unset
    pub collection_url: Option<String>,
    /// Merged under the initial attributes at construction
    pub defaults: Attributes,
    /// Run the payload parser over the initial attributes
    pub parse: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            id_attribute: DEFAULT_ID_ATTRIBUTE.to_string(),
            url_root: None,
            collection_url: None,
            defaults: Attributes::new(),
            parse: false,
        }
    }
}

impl ModelConfig {
    /// # Errors
    ///
    /// Returns `Serialization` when `text` is not a valid JSON configuration.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// # Errors
    ///
    /// Returns `InvalidConfig` when `text` is not a valid TOML configuration.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

use std::rc::Rc;

use super::attributes::Attributes;
use super::validation::Validator;
use super::Model;
use crate::config::ModelConfig;
use crate::errors::Result;
use crate::sync::{IdentityParser, LocationResolver, PayloadParser, RestLocation, Transport};

/// Behaviour plugged into a model at construction
#[derive(Clone)]
pub(crate) struct Strategies {
    pub(crate) validator: Option<Rc<dyn Validator>>,
    pub(crate) parser: Rc<dyn PayloadParser>,
    pub(crate) location: Rc<dyn LocationResolver>,
    pub(crate) transport: Option<Rc<dyn Transport>>,
}

impl Default for Strategies {
    fn default() -> Self {
        Self {
            validator: None,
            parser: Rc::new(IdentityParser),
            location: Rc::new(RestLocation),
            transport: None,
        }
    }
}

/// Assembles a `Model` from configuration, strategies and initial attributes
///
/// ```
/// use attrix_core::{Attributes, Model, ValidationError};
///
/// let model = Model::builder()
///     .url_root("/api/notes")
///     .defaults(Attributes::new().with("title", "untitled"))
///     .validator(|attrs: &Attributes| match attrs.get("title") {
///         Some(t) if t == "" => Err(ValidationError::for_attribute("title", "empty")),
///         _ => Ok(()),
///     })
///     .build()
///     .unwrap();
///
/// assert_eq!(model.url().unwrap(), "/api/notes");
/// ```
#[derive(Default)]
pub struct ModelBuilder {
    config: ModelConfig,
    strategies: Strategies,
    attributes: Attributes,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration (e.g. loaded from TOML)
    pub fn config(mut self, config: ModelConfig) -> Self {
        self.config = config;
        self
    }

    pub fn attributes(mut self, attrs: impl Into<Attributes>) -> Self {
        self.attributes = attrs.into();
        self
    }

    pub fn defaults(mut self, defaults: impl Into<Attributes>) -> Self {
        self.config.defaults = defaults.into();
        self
    }

    pub fn id_attribute(mut self, name: impl Into<String>) -> Self {
        self.config.id_attribute = name.into();
        self
    }

    pub fn url_root(mut self, root: impl Into<String>) -> Self {
        self.config.url_root = Some(root.into());
        self
    }

    pub fn collection_url(mut self, url: impl Into<String>) -> Self {
        self.config.collection_url = Some(url.into());
        self
    }

    /// Run the payload parser over the initial attributes
    pub fn parse(mut self, enabled: bool) -> Self {
        self.config.parse = enabled;
        self
    }

    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.strategies.validator = Some(Rc::new(validator));
        self
    }

    pub fn parser(mut self, parser: impl PayloadParser + 'static) -> Self {
        self.strategies.parser = Rc::new(parser);
        self
    }

    pub fn location(mut self, resolver: impl LocationResolver + 'static) -> Self {
        self.strategies.location = Rc::new(resolver);
        self
    }

    /// Transports are shared, so several models can talk to one backend
    pub fn transport(mut self, transport: Rc<dyn Transport>) -> Self {
        self.strategies.transport = Some(transport);
        self
    }

    /// # Errors
    ///
    /// Returns the parser's error when `parse` is enabled and the initial
    /// attributes are rejected.
    pub fn build(self) -> Result<Model> {
        let attributes = if self.config.parse {
            self.strategies.parser.parse(self.attributes.to_value())?
        } else {
            self.attributes
        };
        Ok(Model::assemble(self.config, self.strategies, attributes))
    }
}

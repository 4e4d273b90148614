use attrix_core_types::ClientId;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::attributes::{Attributes, Changes};
use super::builder::{ModelBuilder, Strategies};
use super::escape::escape_html;
use super::options::Options;
use super::store::{AttributeStore, Proposal};
use super::validation::{self, Validator};
use crate::config::ModelConfig;
use crate::errors::{ModelError, Result, ValidationError};
use crate::events::{EventChannel, ModelEvent, SubscriptionId, Topic};
use crate::sync::Transport;

struct ModelInner {
    client_id: ClientId,
    config: ModelConfig,
    strategies: Strategies,
    state: RefCell<AttributeStore>,
    changing: Cell<bool>,
    events: EventChannel,
}

/// Observable, validated attribute container
///
/// `Model` is a cheap handle: clones share the same state and listeners.
/// It is single-threaded; listeners receive the handle and may mutate the
/// model re-entrantly while it is publishing.
///
/// ```
/// use attrix_core::{Attributes, Model, Options, Topic};
///
/// let model = Model::new(Attributes::new().with("title", "draft"));
/// model.on(Topic::attribute("title"), |m, _| {
///     println!("title is now {:?}", m.get("title"));
/// });
/// model.set_attr("title", "final", &Options::new()).unwrap();
/// assert_eq!(model.previous("title"), Some("final".into()));
/// ```
#[derive(Clone)]
pub struct Model {
    inner: Rc<ModelInner>,
}

impl Model {
    /// Model with default configuration and strategies
    pub fn new(attrs: impl Into<Attributes>) -> Self {
        Self::assemble(ModelConfig::default(), Strategies::default(), attrs.into())
    }

    pub fn builder() -> ModelBuilder {
        ModelBuilder::new()
    }

    /// Defaults first, explicit attributes over them, committed silently
    /// and taken as the initial stabilized state.
    pub(crate) fn assemble(config: ModelConfig, strategies: Strategies, attrs: Attributes) -> Self {
        let initial = config.defaults.merged(&attrs);
        let mut store = AttributeStore::default();
        store.apply(&Proposal::new(initial, false), true, &config.id_attribute);
        store.reset_tracking();

        let model = Model {
            inner: Rc::new(ModelInner {
                client_id: ClientId::new(),
                config,
                strategies,
                state: RefCell::new(store),
                changing: Cell::new(false),
                events: EventChannel::new(),
            }),
        };
        tracing::trace!(client_id = %model.client_id(), "model created");
        model
    }

    // ===== Identity =====

    pub fn client_id(&self) -> &ClientId {
        &self.inner.client_id
    }

    /// Server id, mirrored from the id attribute
    pub fn id(&self) -> Option<Value> {
        self.with_store(|s| s.id.clone())
    }

    pub fn id_attribute(&self) -> &str {
        &self.inner.config.id_attribute
    }

    /// A model is new until it has a non-null id
    pub fn is_new(&self) -> bool {
        matches!(self.id(), None | Some(Value::Null))
    }

    pub fn config(&self) -> &ModelConfig {
        &self.inner.config
    }

    // ===== Reading =====

    pub fn get(&self, attr: &str) -> Option<Value> {
        self.with_store(|s| s.attributes.get(attr).cloned())
    }

    /// Present and not `null`
    pub fn has(&self, attr: &str) -> bool {
        !matches!(self.get(attr), None | Some(Value::Null))
    }

    /// HTML-escaped string form of an attribute, memoized until it changes
    ///
    /// Absent and `null` attributes escape to the empty string.
    pub fn escape(&self, attr: &str) -> String {
        if let Some(hit) = self.with_store(|s| s.escaped.get(attr).cloned()) {
            return hit;
        }
        let raw = match self.get(attr) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s,
            Some(other) => other.to_string(),
        };
        let escaped = escape_html(&raw);
        self.with_store_mut(|s| s.escaped.insert(attr.to_string(), escaped.clone()));
        escaped
    }

    /// Copy of the current attributes
    pub fn attributes(&self) -> Attributes {
        self.with_store(|s| s.attributes.clone())
    }

    /// Current attributes as a JSON object
    pub fn to_json(&self) -> Value {
        self.with_store(|s| s.attributes.to_value())
    }

    // ===== Mutation =====

    /// Apply a mapping of attributes
    ///
    /// The merged result is validated first (unless silent); a rejection
    /// mutates nothing. Non-silent changes are flushed to listeners before
    /// this returns.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` when the validator rejects the prospective mapping.
    pub fn set(&self, attrs: impl Into<Attributes>, options: &Options) -> Result<()> {
        let proposal = Proposal::new(attrs.into(), options.unset);
        validation::gate(self, &proposal, options)?;

        let changes = self.with_store_mut(|s| {
            s.apply(&proposal, options.silent, &self.inner.config.id_attribute)
        });
        tracing::trace!(
            client_id = %self.client_id(),
            proposed = proposal.len(),
            changes_len = changes.len(),
            silent = options.silent,
            unset = options.unset,
            "set applied"
        );

        if !options.silent {
            self.flush(changes);
        }
        Ok(())
    }

    /// Single key/value form of `set`
    ///
    /// # Errors
    ///
    /// Returns `Invalid` when the validator rejects the prospective mapping.
    pub fn set_attr(
        &self,
        key: impl Into<String>,
        value: impl Into<Value>,
        options: &Options,
    ) -> Result<()> {
        self.set(Attributes::new().with(key, value), options)
    }

    /// Remove one attribute; a no-op if it is absent
    ///
    /// # Errors
    ///
    /// Returns `Invalid` when the validator rejects the remaining mapping.
    pub fn unset(&self, attr: &str, options: &Options) -> Result<()> {
        self.set(Attributes::new().with(attr, Value::Null), &unsetting(options))
    }

    /// Remove every attribute
    ///
    /// # Errors
    ///
    /// Returns `Invalid` when the validator rejects an empty mapping.
    pub fn clear(&self, options: &Options) -> Result<()> {
        self.set(self.attributes(), &unsetting(options))
    }

    // ===== Change inspection =====

    /// Anything changed since the last stabilized flush
    pub fn has_changed(&self) -> bool {
        self.with_store(|s| !s.changed.is_empty())
    }

    pub fn has_changed_attr(&self, attr: &str) -> bool {
        self.with_store(|s| s.changed.contains_key(attr))
    }

    /// Copy of the changed attributes, or `None` when nothing changed
    pub fn changed_attributes(&self) -> Option<Changes> {
        self.with_store(|s| (!s.changed.is_empty()).then(|| s.changed.clone()))
    }

    /// Entries of `diff` that differ from the previous snapshot
    ///
    /// Tells whether applying `diff` *would* be a change, without applying it.
    pub fn diff_against_previous(&self, diff: &Attributes) -> Option<Attributes> {
        self.with_store(|s| {
            let changed: Attributes = diff
                .iter()
                .filter(|(k, v)| s.previous.get(k) != Some(*v))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            (!changed.is_empty()).then_some(changed)
        })
    }

    /// Value of `attr` as of the last stabilized flush
    pub fn previous(&self, attr: &str) -> Option<Value> {
        self.with_store(|s| s.previous.get(attr).cloned())
    }

    pub fn previous_attributes(&self) -> Attributes {
        self.with_store(|s| s.previous.clone())
    }

    // ===== Validation =====

    /// Whether the current attributes pass the validator (no side effects)
    pub fn is_valid(&self) -> bool {
        self.validation_error().is_none()
    }

    pub fn validation_error(&self) -> Option<ValidationError> {
        let validator = self.validator()?;
        let current = self.attributes();
        validator.validate(&current).err()
    }

    // ===== Events =====

    pub fn events(&self) -> &EventChannel {
        &self.inner.events
    }

    pub fn on<F>(&self, topic: Topic, listener: F) -> SubscriptionId
    where
        F: Fn(&Model, &ModelEvent) + 'static,
    {
        self.inner.events.subscribe(topic, listener)
    }

    pub fn off(&self, id: SubscriptionId) -> bool {
        self.inner.events.unsubscribe(id)
    }

    // ===== Misc =====

    /// New model with the same configuration, strategies and attributes
    ///
    /// The copy gets its own client id, listeners and change tracking.
    pub fn duplicate(&self) -> Model {
        Model::assemble(
            self.inner.config.clone(),
            self.inner.strategies.clone(),
            self.attributes(),
        )
    }

    /// Resource location, computed by the configured resolver
    ///
    /// # Errors
    ///
    /// Returns `UrlUnresolvable` when no location can be derived.
    pub fn url(&self) -> Result<String> {
        let location = self.inner.strategies.location.clone();
        location.resolve(self)
    }

    /// Turn a transport payload into attributes with the configured parser
    ///
    /// # Errors
    ///
    /// Returns the parser's error, `InvalidPayload` for the default parser.
    pub fn parse(&self, payload: Value) -> Result<Attributes> {
        let parser = self.inner.strategies.parser.clone();
        parser.parse(payload)
    }

    // ===== Crate internals =====

    pub(crate) fn with_store<R>(&self, f: impl FnOnce(&AttributeStore) -> R) -> R {
        f(&self.inner.state.borrow())
    }

    pub(crate) fn with_store_mut<R>(&self, f: impl FnOnce(&mut AttributeStore) -> R) -> R {
        f(&mut self.inner.state.borrow_mut())
    }

    pub(crate) fn changing(&self) -> &Cell<bool> {
        &self.inner.changing
    }

    pub(crate) fn validator(&self) -> Option<Rc<dyn Validator>> {
        self.inner.strategies.validator.clone()
    }

    pub(crate) fn transport(&self) -> Result<Rc<dyn Transport>> {
        self.inner
            .strategies
            .transport
            .clone()
            .ok_or_else(|| ModelError::MissingTransport {
                client_id: self.client_id().to_string(),
            })
    }

    pub(crate) fn publish(&self, event: ModelEvent) {
        self.inner.events.publish(self, &event);
    }
}

fn unsetting(options: &Options) -> Options {
    let mut options = options.clone();
    options.unset = true;
    options
}

impl From<&Model> for Attributes {
    fn from(model: &Model) -> Self {
        model.attributes()
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("client_id", self.client_id())
            .field("id", &self.id())
            .field("attributes", &self.attributes())
            .finish()
    }
}

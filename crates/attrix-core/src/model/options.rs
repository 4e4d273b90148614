use serde_json::Value;
use std::rc::Rc;

use super::Model;
use crate::errors::ModelError;

/// Called with the model and the raw server response
pub type SuccessCallback = Rc<dyn Fn(&Model, &Value)>;

/// Called with the model and the failure, instead of (validation) or in
/// addition to (transport) the `Error` event
pub type ErrorCallback = Rc<dyn Fn(&Model, &ModelError)>;

/// Per-call options for mutation and persistence operations
///
/// - `silent`: record changes without firing events (also skips validation)
/// - `unset`: remove the named attributes instead of assigning them
/// - `wait`: `save`/`destroy` only; defer local effects until the server confirms
#[derive(Clone, Default)]
pub struct Options {
    pub silent: bool,
    pub unset: bool,
    pub wait: bool,
    pub(crate) success: Option<SuccessCallback>,
    pub(crate) error: Option<ErrorCallback>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    pub fn unset(mut self) -> Self {
        self.unset = true;
        self
    }

    pub fn wait(mut self) -> Self {
        self.wait = true;
        self
    }

    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Model, &Value) + 'static,
    {
        self.success = Some(Rc::new(callback));
        self
    }

    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Model, &ModelError) + 'static,
    {
        self.error = Some(Rc::new(callback));
        self
    }

    pub fn has_error_callback(&self) -> bool {
        self.error.is_some()
    }
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("silent", &self.silent)
            .field("unset", &self.unset)
            .field("wait", &self.wait)
            .field("success", &self.success.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

use attrix_core_types::RequestId;
use thiserror::Error;

/// Result type alias using ModelError
pub type Result<T> = std::result::Result<T, ModelError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling, log assertions and external reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Local validation
    ValidationFailed,
    InvalidPayload,

    // Configuration
    UrlUnresolvable,
    MissingTransport,
    InvalidConfig,

    // Transport
    NotFound,
    ExternalService,

    // Generic
    Serialization,
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::ValidationFailed => "ERR_VALIDATION_FAILED",
            ExErrorKind::InvalidPayload => "ERR_INVALID_PAYLOAD",
            ExErrorKind::UrlUnresolvable => "ERR_URL_UNRESOLVABLE",
            ExErrorKind::MissingTransport => "ERR_MISSING_TRANSPORT",
            ExErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::ExternalService => "ERR_EXTERNAL_SERVICE",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Classification fields for programmatic handling plus the context needed
/// to find the failing model and request in the logs.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    client_id: Option<String>,
    attribute: Option<String>,
    status: Option<u16>,
    request_id: Option<RequestId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            client_id: None,
            attribute: None,
            status: None,
            request_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add model client id context
    pub fn with_client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    /// Add attribute context
    pub fn with_attribute(mut self, attr: impl Into<String>) -> Self {
        self.attribute = Some(attr.into());
        self
    }

    /// Add transport status context
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn attribute(&self) -> Option<&str> {
        self.attribute.as_deref()
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(client_id) = &self.client_id {
            write!(f, " (client_id: {})", client_id)?;
        }
        if let Some(attribute) = &self.attribute {
            write!(f, " (attribute: {})", attribute)?;
        }
        if let Some(status) = self.status {
            write!(f, " (status: {})", status)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Rejection produced by a model validator
///
/// `attribute` optionally names the offending attribute; the validator always
/// judges the whole prospective mapping.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    pub attribute: Option<String>,
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            attribute: None,
            message: message.into(),
        }
    }

    pub fn for_attribute(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            attribute: Some(attribute.into()),
            message: message.into(),
        }
    }
}

/// Failure reported by a transport for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub status: Option<u16>,
    pub message: String,
}

impl TransportError {
    /// Failure without a status (connection refused, timeout, ...)
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn not_found(url: &str) -> Self {
        Self::with_status(404, format!("no resource at {url}"))
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "status {}: {}", status, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for TransportError {}

/// Error taxonomy for model operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    // ===== Local Errors =====
    /// The validator rejected the prospective attributes
    #[error("Validation failed: {0}")]
    Invalid(#[from] ValidationError),

    /// A payload could not be turned into an attribute mapping
    #[error("Invalid payload: {reason}")]
    InvalidPayload { reason: String },

    // ===== Configuration Errors =====
    /// Neither a root location nor an owning collection location is set
    #[error("Model {client_id} has no url_root and no collection url")]
    UrlUnresolvable { client_id: String },

    /// A persistence operation was requested without a transport
    #[error("Model {client_id} has no transport configured")]
    MissingTransport { client_id: String },

    /// Configuration text could not be decoded
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    // ===== Transport Errors =====
    /// The transport reported a failure
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    // ===== Generic Errors =====
    /// Serialization error (JSON encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl ModelError {
    /// The validation error, when this is a validation rejection
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            ModelError::Invalid(err) => Some(err),
            _ => None,
        }
    }

    /// The transport error, when this is a transport failure
    pub fn as_transport(&self) -> Option<&TransportError> {
        match self {
            ModelError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

/// Conversion from ModelError to ExError
impl From<ModelError> for ExError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Invalid(validation) => {
                let ex = ExError::new(ExErrorKind::ValidationFailed)
                    .with_message(validation.message.clone());
                match validation.attribute {
                    Some(attribute) => ex.with_attribute(attribute),
                    None => ex,
                }
            }

            ModelError::InvalidPayload { reason } => {
                ExError::new(ExErrorKind::InvalidPayload).with_message(reason)
            }

            ModelError::UrlUnresolvable { client_id } => ExError::new(ExErrorKind::UrlUnresolvable)
                .with_client_id(client_id)
                .with_message("No url_root and no collection url"),

            ModelError::MissingTransport { client_id } => {
                ExError::new(ExErrorKind::MissingTransport)
                    .with_client_id(client_id)
                    .with_message("No transport configured")
            }

            ModelError::InvalidConfig { message } => {
                ExError::new(ExErrorKind::InvalidConfig).with_message(message)
            }

            ModelError::Transport(transport) => {
                let kind = if transport.is_not_found() {
                    ExErrorKind::NotFound
                } else {
                    ExErrorKind::ExternalService
                };
                let ex = ExError::new(kind).with_message(transport.message.clone());
                match transport.status {
                    Some(status) => ex.with_status(status),
                    None => ex,
                }
            }

            ModelError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
        }
    }
}

/// Conversion from serde_json::Error to ModelError
impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Conversion from toml::de::Error to ModelError
impl From<toml::de::Error> for ModelError {
    fn from(err: toml::de::Error) -> Self {
        ModelError::InvalidConfig {
            message: err.to_string(),
        }
    }
}

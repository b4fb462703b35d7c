use thiserror::Error;

// ---------------------------------------------------------------------------
// TransportError: what collaborators reject with
// ---------------------------------------------------------------------------

/// Failure reported by an external collaborator (list fetch, bulk action,
/// field update, delete, metric endpoint).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    /// Field-scoped rejection. `field` is `None` when the server did not say
    /// which field it objected to.
    #[error("Validation failed{}: {message}", field_suffix(.field))]
    Validation {
        field: Option<String>,
        message: String,
    },

    #[error("Server error{}: {message}", status_suffix(.status))]
    Server {
        status: Option<u16>,
        message: String,
    },

    /// 401-class rejection. Never retried locally.
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("{operation} timed out after {after_ms} ms")]
    Timeout { operation: String, after_ms: u64 },
}

fn field_suffix(field: &Option<String>) -> String {
    field
        .as_deref()
        .map(|f| format!(" for \"{f}\""))
        .unwrap_or_default()
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

impl TransportError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::Server {
            status: None,
            message: message.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// The field named by a validation rejection, if any.
    pub fn validation_field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => field.as_deref(),
            _ => None,
        }
    }

    /// Server-supplied message without the variant prefix, suitable for
    /// showing to the operator.
    pub fn message(&self) -> String {
        match self {
            Self::Validation { message, .. }
            | Self::Server { message, .. }
            | Self::Auth { message } => message.clone(),
            Self::Timeout { .. } => self.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// AdminError: top-level rollup
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Bulk action requires at least one selected record")]
    EmptyTarget,

    #[error("Bulk action request contains no actions")]
    NoActions,

    #[error(
        "Server rejected {field} = {original:?} after {attempts} attempt(s): {message}"
    )]
    FieldRejected {
        field: String,
        original: String,
        attempts: usize,
        message: String,
    },

    #[error("Unexpected {what} response shape: {message}")]
    Decode { what: &'static str, message: String },

    #[error("No records are loaded for local recomputation")]
    NoResidentData,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl AdminError {
    pub fn decode(what: &'static str, message: impl Into<String>) -> Self {
        Self::Decode {
            what,
            message: message.into(),
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_auth())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }

    pub fn validation_field(&self) -> Option<&str> {
        match self {
            Self::Transport(e) => e.validation_field(),
            _ => None,
        }
    }
}

/// Convenience alias; the default error type is `AdminError`.
pub type Result<T, E = AdminError> = std::result::Result<T, E>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

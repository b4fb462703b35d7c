//! Authentication collaborators. The core never authenticates; it attaches
//! whatever credential the supplier hands out and reports 401-class
//! rejections to the terminator.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::TransportError;

/// Opaque bearer token. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }

    /// Value for an `Authorization` header.
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Handed to every collaborator call.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    pub credential: Option<Credential>,
}

pub trait CredentialSupplier: Send + Sync {
    fn bearer(&self) -> Option<Credential>;
}

/// Global logout. Implemented by the host application.
pub trait SessionTerminator: Send + Sync {
    fn terminate(&self, reason: &str);
}

/// Pairs the credential supplier with the terminator and makes sure the
/// terminator fires at most once per view.
#[derive(Clone, Default)]
pub struct SessionGuard {
    credentials: Option<Arc<dyn CredentialSupplier>>,
    terminator: Option<Arc<dyn SessionTerminator>>,
    terminated: Arc<AtomicBool>,
}

impl SessionGuard {
    pub fn new(
        credentials: Option<Arc<dyn CredentialSupplier>>,
        terminator: Option<Arc<dyn SessionTerminator>>,
    ) -> Self {
        Self {
            credentials,
            terminator,
            terminated: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn context(&self) -> CallContext {
        CallContext {
            credential: self.credentials.as_ref().and_then(|c| c.bearer()),
        }
    }

    /// Inspect a collaborator failure. Returns `true` when it was an auth
    /// failure (and the session has been terminated).
    pub fn observe(&self, err: &TransportError) -> bool {
        if !err.is_auth() {
            return false;
        }
        if !self.terminated.swap(true, Ordering::SeqCst) {
            tracing::warn!(error = %err, "authentication rejected; terminating session");
            if let Some(terminator) = &self.terminator {
                terminator.terminate(&err.message());
            }
        }
        true
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }
}

//! Cooperative request cancellation

use crate::error::Error;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

const DEFAULT_CANCEL_MESSAGE: &str = "Request canceled";

/// Reason a request was cancelled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cancel {
    pub message: Option<String>,
}

impl Cancel {
    pub fn new(message: Option<&str>) -> Self {
        Self {
            message: message.map(str::to_string),
        }
    }
}

impl fmt::Display for Cancel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message.as_deref().unwrap_or(DEFAULT_CANCEL_MESSAGE))
    }
}

impl std::error::Error for Cancel {}

/// Returns true when the error is a cancellation rather than a request failure.
pub fn is_cancel(err: &Error) -> bool {
    err.is_cancel()
}

type CancelState = Arc<watch::Sender<Option<Cancel>>>;

/// Shared cancellation handle.
///
/// Clones observe the same state. Once cancelled, the token stays cancelled
/// and keeps the reason given by the first cancellation.
#[derive(Clone)]
pub struct CancelToken {
    state: CancelState,
}

/// The function handed to a [`CancelToken`] executor.
#[derive(Clone)]
pub struct Canceler {
    state: CancelState,
}

/// A token together with the canceler that controls it.
#[derive(Debug, Clone)]
pub struct CancelTokenSource {
    pub token: CancelToken,
    pub cancel: Canceler,
}

impl CancelToken {
    /// Create a token and immediately hand its canceler to `executor`.
    pub fn new<F>(executor: F) -> Self
    where
        F: FnOnce(Canceler),
    {
        let (sender, _) = watch::channel(None);
        let token = Self {
            state: Arc::new(sender),
        };
        executor(Canceler {
            state: token.state.clone(),
        });
        token
    }

    pub fn source() -> CancelTokenSource {
        let mut cancel = None;
        let token = CancelToken::new(|c| cancel = Some(c));
        // The executor runs synchronously inside `new`, so the slot is always filled.
        let cancel = cancel.unwrap_or_else(|| Canceler {
            state: token.state.clone(),
        });
        CancelTokenSource { token, cancel }
    }

    pub fn reason(&self) -> Option<Cancel> {
        self.state.borrow().clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.borrow().is_some()
    }

    pub fn throw_if_requested(&self) -> Result<(), Cancel> {
        match self.reason() {
            Some(reason) => Err(reason),
            None => Ok(()),
        }
    }

    /// Resolves with the cancellation reason once the token is cancelled.
    pub async fn cancelled(&self) -> Cancel {
        let mut receiver = self.state.subscribe();
        let reason = match receiver.wait_for(Option::is_some).await {
            Ok(reason) => reason.clone(),
            // The sender lives as long as this token, so the channel cannot close here.
            Err(_) => None,
        };
        match reason {
            Some(reason) => reason,
            None => std::future::pending().await,
        }
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("reason", &self.reason())
            .finish()
    }
}

impl Canceler {
    /// Cancel the token. Only the first call has any effect.
    pub fn cancel(&self, message: Option<&str>) {
        let applied = self.state.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(Cancel::new(message));
            true
        });
        if applied {
            tracing::debug!(message = ?message, "cancel token triggered");
        }
    }
}

impl fmt::Debug for Canceler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canceler").finish_non_exhaustive()
    }
}

//! # Loadable
//!
//! Wraps a value that arrives asynchronously. Every resource in the app
//! state is a `Loadable<T>` so the presentation layer can render all four
//! phases from one field:
//!
//! ```text
//! NotRequested ──▶ Loading { last, token } ──┬──▶ Loaded(T)
//!                        ▲                   └──▶ Failed(LoadError)
//!                        └──── re-trigger ◀──────────┘
//! ```
//!
//! `Loading` keeps the last good value around so stale data stays on screen
//! while a refresh is in flight.

use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Why a resource failed to load.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// Transport-level failure (DNS, refused connection, timeout).
    #[error("network error: {0}")]
    Network(String),
    /// Response body was not the JSON we expected.
    #[error("decoding error: {0}")]
    Decoding(String),
    /// The server answered with an empty result where one item was expected.
    #[error("unexpected response")]
    UnexpectedResponse,
    /// Non-2xx status code.
    #[error("HTTP error {status}")]
    Http { status: u16 },
    #[error("cancelled")]
    Cancelled,
}

#[derive(Debug, Clone)]
pub enum Loadable<T> {
    NotRequested,
    Loading {
        last: Option<T>,
        token: CancellationToken,
    },
    Loaded(T),
    Failed(LoadError),
}

impl<T> Loadable<T> {
    pub fn is_loading(last: Option<T>, token: CancellationToken) -> Self {
        Loadable::Loading { last, token }
    }

    pub fn loaded(value: T) -> Self {
        Loadable::Loaded(value)
    }

    pub fn failed(error: LoadError) -> Self {
        Loadable::Failed(error)
    }

    /// The freshest value available: the loaded payload, or the value carried
    /// through a refresh.
    pub fn value(&self) -> Option<&T> {
        match self {
            Loadable::Loaded(value) => Some(value),
            Loadable::Loading { last, .. } => last.as_ref(),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Loadable::Loaded(value) => Some(value),
            Loadable::Loading { last, .. } => last,
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&LoadError> {
        match self {
            Loadable::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, Loadable::Loading { .. })
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, Loadable::Loaded(_) | Loadable::Failed(_))
    }

    /// Token of the in-flight load, if any.
    pub fn token(&self) -> Option<&CancellationToken> {
        match self {
            Loadable::Loading { token, .. } => Some(token),
            _ => None,
        }
    }

    /// Cancels an in-flight load and settles into `Failed(Cancelled)`.
    ///
    /// Anything other than `Loading` is left untouched, so calling this twice
    /// is harmless.
    pub fn cancel_loading(&mut self) {
        if let Loadable::Loading { token, .. } = self {
            token.cancel();
            *self = Loadable::Failed(LoadError::Cancelled);
        }
    }

    /// Transforms the `Loaded` payload. `f` is never called for other
    /// variants; a `Loading` keeps its token but cannot carry an
    /// untransformed value across, so its `last` becomes `None`.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Loadable<U> {
        match self {
            Loadable::NotRequested => Loadable::NotRequested,
            Loadable::Loading { token, .. } => Loadable::Loading { last: None, token },
            Loadable::Loaded(value) => Loadable::Loaded(f(value)),
            Loadable::Failed(error) => Loadable::Failed(error),
        }
    }
}

impl<T: Default> Loadable<T> {
    /// Reads an observed value for combination with a fresh response:
    /// a failure propagates, anything else yields the value or an empty one.
    pub fn into_result(self) -> Result<T, LoadError> {
        match self {
            Loadable::Failed(error) => Err(error),
            other => Ok(other.into_value().unwrap_or_default()),
        }
    }
}

impl<T> Default for Loadable<T> {
    fn default() -> Self {
        Loadable::NotRequested
    }
}

impl<T> From<Result<T, LoadError>> for Loadable<T> {
    fn from(result: Result<T, LoadError>) -> Self {
        match result {
            Ok(value) => Loadable::Loaded(value),
            Err(error) => Loadable::Failed(error),
        }
    }
}

// Tokens are identity handles, not data: two loads showing the same stale
// value are equal for rendering purposes.
impl<T: PartialEq> PartialEq for Loadable<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Loadable::NotRequested, Loadable::NotRequested) => true,
            (Loadable::Loading { last: a, .. }, Loadable::Loading { last: b, .. }) => a == b,
            (Loadable::Loaded(a), Loadable::Loaded(b)) => a == b,
            (Loadable::Failed(a), Loadable::Failed(b)) => a == b,
            _ => false,
        }
    }
}

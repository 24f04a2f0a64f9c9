//! Client-held session lifecycle.
//!
//! The session store is the only writer of the two durable entries
//! ([`TOKEN_ENTRY`](crate::storage::TOKEN_ENTRY) and
//! [`IDENTITY_ENTRY`](crate::storage::IDENTITY_ENTRY)); every mutating
//! operation keeps memory and storage consistent.

use crate::error::Error;
use crate::storage::{Storage, IDENTITY_ENTRY, TOKEN_ENTRY};
use crate::types::{AuthToken, Identity};

/// An authenticated session: credential plus the identity it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: AuthToken,
    pub identity: Identity,
}

/// Owns the current session and its durable persistence.
///
/// Create one per client process, [`restore`](Self::restore) it at startup,
/// and hand it to the [`Gateway`](crate::gateway::Gateway) for the rest of
/// its life. Consumers receive it by reference; there is no ambient global.
#[derive(Debug)]
pub struct SessionStore<S: Storage> {
    storage: S,
    session: Option<Session>,
}

impl<S: Storage> SessionStore<S> {
    /// An empty store over `storage`. Call [`restore`](Self::restore) to pick
    /// up a persisted session.
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            session: None,
        }
    }

    /// Repopulate the session from durable storage.
    ///
    /// The session is restored only when both entries are present and the
    /// identity entry parses. Anything else (missing entries, unreadable
    /// storage, corrupt identity) leaves the store unauthenticated; this
    /// never fails.
    pub fn restore(&mut self) {
        let token = match self.storage.get(TOKEN_ENTRY) {
            Ok(Some(token)) if !token.is_empty() => token,
            Ok(_) => return,
            Err(e) => {
                tracing::debug!(error = %e, "could not read stored credential");
                return;
            }
        };
        let identity_raw = match self.storage.get(IDENTITY_ENTRY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(e) => {
                tracing::debug!(error = %e, "could not read stored identity");
                return;
            }
        };
        let identity: Identity = match serde_json::from_str(&identity_raw) {
            Ok(identity) => identity,
            Err(e) => {
                tracing::debug!(error = %e, "stored identity does not parse, ignoring");
                return;
            }
        };
        self.session = Some(Session {
            token: AuthToken(token),
            identity,
        });
    }

    /// Install a freshly verified session and persist it.
    ///
    /// On a storage failure nothing is installed and the error is returned.
    pub fn establish(&mut self, token: AuthToken, identity: Identity) -> Result<(), Error> {
        let identity_raw = serde_json::to_string(&identity)
            .map_err(|e| Error::Storage(e.to_string()))?;
        self.storage
            .put(TOKEN_ENTRY, token.as_str())
            .map_err(|e| Error::Storage(e.to_string()))?;
        self.storage
            .put(IDENTITY_ENTRY, &identity_raw)
            .map_err(|e| Error::Storage(e.to_string()))?;

        tracing::debug!(user = %identity.id, "session established");
        self.session = Some(Session { token, identity });
        Ok(())
    }

    /// Drop the session and remove both durable entries. Idempotent.
    ///
    /// The in-memory session is gone even when entry removal fails, so a
    /// rejected credential can never linger as an authenticated state.
    pub fn clear(&mut self) -> Result<(), Error> {
        self.session = None;
        let token_result = self.storage.remove(TOKEN_ENTRY);
        let identity_result = self.storage.remove(IDENTITY_ENTRY);
        token_result
            .and(identity_result)
            .map_err(|e| Error::Storage(e.to_string()))
    }

    /// True iff a session is currently held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn current(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn token(&self) -> Option<&AuthToken> {
        self.session.as_ref().map(|s| &s.token)
    }

    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.session.as_ref().map(|s| &s.identity)
    }
}

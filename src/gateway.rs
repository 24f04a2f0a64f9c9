//! Bearer-authenticated access to protected endpoints.
//!
//! All protected traffic funnels through [`Gateway`], which attaches the
//! current session credential and reacts uniformly when the backend rejects
//! it: the session is cleared and [`Error::SessionExpired`] is surfaced for
//! the view to redirect to login. This is the only path back to anonymous
//! besides [`Gateway::logout`].

use crate::account::{UserFiles, UserLinks, UserStats};
use crate::api::Backend;
use crate::error::Error;
use crate::links::{IssuedLink, LinkRequest};
use crate::quota::QuotaSnapshot;
use crate::session::SessionStore;
use crate::storage::Storage;
use crate::types::AuthToken;

/// Owns the backend handle and the session store for one client.
pub struct Gateway<B: Backend, S: Storage> {
    backend: B,
    session: SessionStore<S>,
}

impl<B: Backend, S: Storage> Gateway<B, S> {
    #[must_use]
    pub fn new(backend: B, session: SessionStore<S>) -> Self {
        Self { backend, session }
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore<S> {
        &self.session
    }

    #[must_use]
    pub fn session_mut(&mut self) -> &mut SessionStore<S> {
        &mut self.session
    }

    /// Explicit logout: tear down the session and its durable entries.
    pub fn logout(&mut self) -> Result<(), Error> {
        tracing::info!("logging out");
        self.session.clear()
    }

    /// Fetch a fresh quota snapshot for the current session.
    ///
    /// Always a read-through: quota windows roll over on the server clock,
    /// so there is nothing worth caching here.
    ///
    /// # Errors
    ///
    /// [`Error::Unauthenticated`] with no session, [`Error::SessionExpired`]
    /// if the credential was rejected (the session is cleared first), or
    /// [`Error::RequestFailed`].
    pub async fn fetch_quota(&mut self) -> Result<QuotaSnapshot, Error> {
        let token = self.require_token()?.clone();
        let result = self.backend.fetch_quota(&token).await;
        self.expire_on_rejection(result)
    }

    /// Ask the backend to create a shareable link.
    ///
    /// # Errors
    ///
    /// As for [`fetch_quota`](Self::fetch_quota); server-side refusals
    /// (including quota rejections) arrive as [`Error::RequestFailed`] with
    /// the server's message.
    pub async fn generate_link(&mut self, request: &LinkRequest) -> Result<IssuedLink, Error> {
        let token = self.require_token()?.clone();
        let result = self.backend.generate_link(&token, request).await;
        self.expire_on_rejection(result)
    }

    /// Fetch the dashboard's per-user aggregates.
    pub async fn user_stats(&mut self) -> Result<UserStats, Error> {
        let token = self.require_token()?.clone();
        let result = self.backend.user_stats(&token).await;
        self.expire_on_rejection(result)
    }

    /// Fetch the files owned by the current user.
    pub async fn user_files(&mut self) -> Result<UserFiles, Error> {
        let token = self.require_token()?.clone();
        let result = self.backend.user_files(&token).await;
        self.expire_on_rejection(result)
    }

    /// Fetch the current user's previously generated links.
    pub async fn user_links(&mut self) -> Result<UserLinks, Error> {
        let token = self.require_token()?.clone();
        let result = self.backend.user_links(&token).await;
        self.expire_on_rejection(result)
    }

    fn require_token(&self) -> Result<&AuthToken, Error> {
        self.session.token().ok_or(Error::Unauthenticated)
    }

    fn expire_on_rejection<T>(&mut self, result: Result<T, Error>) -> Result<T, Error> {
        if let Err(Error::SessionExpired) = &result {
            tracing::warn!("session credential rejected by the backend, logging out");
            if let Err(e) = self.session.clear() {
                tracing::warn!(error = %e, "failed to remove stored session entries");
            }
        }
        result
    }
}

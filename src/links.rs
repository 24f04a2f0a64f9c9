//! Quota-gated share-link issuance.
//!
//! One [`LinkIssuer`] backs one link-generator view. It holds the most
//! recently fetched quota snapshot, refuses issuance client-side when that
//! snapshot forbids it, and refetches the quota immediately after every
//! successful issuance so the displayed numbers include the just-consumed
//! unit.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use url::Url;

use crate::api::Backend;
use crate::error::Error;
use crate::gateway::Gateway;
use crate::quota::QuotaSnapshot;
use crate::storage::Storage;
use crate::types::FileId;

/// Default link lifetime offered by the UI.
pub const DEFAULT_EXPIRY_DAYS: u32 = 7;

/// Link lifetimes offered by the UI, in days.
pub const EXPIRY_CHOICES_DAYS: [u32; 4] = [1, 7, 14, 30];

/// Body of a link-creation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkRequest {
    pub file_id: FileId,
    pub expiry_days: u32,
}

impl LinkRequest {
    #[must_use]
    pub fn new(file_id: FileId, expiry_days: u32) -> Self {
        Self {
            file_id,
            expiry_days,
        }
    }
}

/// A freshly signed share link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct IssuedLink {
    pub link: Url,
    #[serde(with = "time::serde::rfc3339")]
    pub expiry_date: OffsetDateTime,
}

/// Result of a successful issuance.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct IssueOutcome {
    pub link: IssuedLink,
    /// Set when the post-issuance quota refresh failed. The link itself is
    /// valid; the caller should show this as a warning next to it.
    pub quota_refresh_error: Option<String>,
}

/// The link-issuance workflow.
#[derive(Debug, Default)]
pub struct LinkIssuer {
    snapshot: Option<QuotaSnapshot>,
    issued: Option<IssuedLink>,
    busy: bool,
}

impl LinkIssuer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a fresh quota snapshot and hold it for gating and display.
    ///
    /// # Errors
    ///
    /// Propagates the gateway error; the previously held snapshot is kept
    /// on failure.
    pub async fn refresh_quota<B: Backend, S: Storage>(
        &mut self,
        gateway: &mut Gateway<B, S>,
    ) -> Result<&QuotaSnapshot, Error> {
        let snapshot = gateway.fetch_quota().await?;
        Ok(self.snapshot.insert(snapshot))
    }

    /// The snapshot gating and feeding the quota display, if one is held.
    #[must_use]
    pub fn quota(&self) -> Option<&QuotaSnapshot> {
        self.snapshot.as_ref()
    }

    /// True when a held snapshot permits issuance. No snapshot means no:
    /// the generate button stays disabled until the quota has loaded.
    #[must_use]
    pub fn can_generate(&self) -> bool {
        self.snapshot
            .as_ref()
            .is_some_and(|s| s.can_generate_link)
    }

    /// The most recently issued link, kept until superseded.
    #[must_use]
    pub fn issued(&self) -> Option<&IssuedLink> {
        self.issued.as_ref()
    }

    /// True while an issuance call is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Generate a share link for `file_id`.
    ///
    /// Refused client-side, without a network call, while busy or while the
    /// held snapshot forbids issuance. On success the held snapshot is
    /// invalidated and refetched exactly once; a failed refetch is reported
    /// on the outcome, never as an error, and leaves no snapshot held (so
    /// issuance stays disabled until a later refresh succeeds). On failure
    /// the previously issued link is untouched.
    ///
    /// # Errors
    ///
    /// [`Error::Busy`], [`Error::QuotaExceeded`], or the gateway error from
    /// the issuance call itself.
    pub async fn generate<B: Backend, S: Storage>(
        &mut self,
        gateway: &mut Gateway<B, S>,
        file_id: FileId,
        expiry_days: u32,
    ) -> Result<IssueOutcome, Error> {
        if self.busy {
            return Err(Error::Busy);
        }
        if !self.can_generate() {
            return Err(Error::QuotaExceeded);
        }

        self.busy = true;
        let request = LinkRequest::new(file_id, expiry_days);
        let result = gateway.generate_link(&request).await;

        let outcome = match result {
            Ok(link) => {
                tracing::info!(file = %request.file_id, expiry_days, "share link generated");
                self.issued = Some(link.clone());
                // The consumed unit makes the held snapshot stale.
                self.snapshot = None;
                let quota_refresh_error = match gateway.fetch_quota().await {
                    Ok(snapshot) => {
                        self.snapshot = Some(snapshot);
                        None
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "quota refresh after issuance failed");
                        Some(e.to_string())
                    }
                };
                Ok(IssueOutcome {
                    link,
                    quota_refresh_error,
                })
            }
            Err(e) => Err(e),
        };
        self.busy = false;
        outcome
    }
}

//! Authenticated dashboard data: per-user stats, files, and active links.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::catalog::FileEntry;
use crate::types::FileId;

/// Per-user aggregates for the dashboard header (`GET /api/user/stats`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct UserStats {
    pub total_files: u64,
    pub total_links: u64,
    pub total_views: u64,
    pub total_bandwidth_formatted: String,
}

/// Files owned by the authenticated user (`GET /api/user/files`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct UserFiles {
    pub files: Vec<FileEntry>,
}

/// A previously generated share link (`GET /api/user/links`).
///
/// `expiry_date` in the past means the link is no longer served; the
/// dashboard greys it out rather than hiding it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct UserLink {
    pub unique_file_id: FileId,
    pub file_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expiry_date: OffsetDateTime,
}

impl UserLink {
    /// True while the link has not yet expired.
    #[must_use]
    pub fn is_active(&self, now: OffsetDateTime) -> bool {
        self.expiry_date > now
    }
}

/// Wire wrapper for the links listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct UserLinks {
    pub links: Vec<UserLink>,
}

//! Public catalog data: file listings, file detail, and service stats.
//!
//! These endpoints need no session; the types mirror the backend's JSON
//! verbatim, including server-formatted display strings (`*_formatted`),
//! which the client shows as-is rather than re-deriving.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::FileId;

/// A stored file as listed by `GET /api/files`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct FileEntry {
    pub id: FileId,
    pub file_name: String,
    pub file_size: u64,
    /// Server-formatted size, e.g. `"1.4 GB"`.
    pub file_size_formatted: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub upload_date: OffsetDateTime,
    pub total_views: u64,
    pub total_downloads: u64,
    pub total_bandwidth: u64,
}

/// One page of catalog results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct FilePage {
    pub files: Vec<FileEntry>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
}

/// Sort keys accepted by the file listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    UploadDate,
    FileName,
    FileSize,
    TotalViews,
}

impl SortKey {
    pub(crate) fn as_query(self) -> &'static str {
        match self {
            Self::UploadDate => "upload_date",
            Self::FileName => "file_name",
            Self::FileSize => "file_size",
            Self::TotalViews => "total_views",
        }
    }
}

/// Sort direction; the catalog defaults to newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub(crate) fn as_query(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Query parameters for `GET /api/files`.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct FileQuery {
    pub search: Option<String>,
    pub sort: SortKey,
    pub order: SortOrder,
    pub limit: u32,
    pub offset: u32,
}

impl FileQuery {
    /// A query for the first `limit` files, newest first.
    #[must_use]
    pub fn first(limit: u32) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    #[must_use]
    pub fn with_sort(mut self, sort: SortKey, order: SortOrder) -> Self {
        self.sort = sort;
        self.order = order;
        self
    }

    #[must_use]
    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub(crate) fn as_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("sort", self.sort.as_query().to_owned()),
            ("order", self.order.as_query().to_owned()),
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
        ];
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        pairs
    }
}

/// Service-wide stats shown on the landing page (`GET /api/stats`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct ServiceStats {
    pub total_files: u64,
    pub total_users: u64,
    pub total_views: u64,
    pub total_downloads: u64,
    pub total_bandwidth_formatted: String,
    pub active_links: u64,
    pub active_bots: u32,
    pub uptime: String,
}

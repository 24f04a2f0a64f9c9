//! Link-generation quota snapshots.
//!
//! Quotas are counted server-side over three fixed windows. The client only
//! ever deserializes a point-in-time snapshot from `GET /api/user/quota`;
//! nothing here is recomputed locally, because the windows roll over on the
//! server's clock.

use serde::{Deserialize, Serialize};

/// Usage within a single rate-limit window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct QuotaWindow {
    pub used: u32,
    pub limit: u32,
    pub remaining: u32,
    pub can_generate: bool,
}

/// The three rate-limit windows tracked by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct QuotaWindows {
    #[serde(rename = "5min")]
    pub five_minutes: QuotaWindow,
    pub hour: QuotaWindow,
    pub day: QuotaWindow,
}

/// Window identifiers, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    FiveMinutes,
    Hour,
    Day,
}

impl WindowKind {
    /// Human-readable window label, as shown in the quota cards.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::FiveMinutes => "5 Minutes",
            Self::Hour => "1 Hour",
            Self::Day => "24 Hours",
        }
    }
}

/// Point-in-time read of the caller's quota across all windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct QuotaSnapshot {
    #[serde(rename = "quotas")]
    pub windows: QuotaWindows,
    /// Server-side conjunction of every window's `can_generate`.
    pub can_generate_link: bool,
}

impl QuotaSnapshot {
    /// Windows in display order, paired with their kind.
    pub fn windows(&self) -> impl Iterator<Item = (WindowKind, &QuotaWindow)> {
        [
            (WindowKind::FiveMinutes, &self.windows.five_minutes),
            (WindowKind::Hour, &self.windows.hour),
            (WindowKind::Day, &self.windows.day),
        ]
        .into_iter()
    }
}

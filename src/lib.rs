#![doc = include_str!("../README.md")]

pub mod account;
pub mod api;
pub mod catalog;
pub mod error;
pub mod gateway;
pub mod links;
pub mod login;
pub mod quota;
pub mod session;
pub mod storage;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenient access
pub use api::{ApiClient, ApiConfig, Backend, LoginGrant, OtpRequested};
pub use error::Error;
pub use gateway::Gateway;
pub use links::{
    IssueOutcome, IssuedLink, LinkIssuer, LinkRequest, DEFAULT_EXPIRY_DAYS, EXPIRY_CHOICES_DAYS,
};
pub use login::{LoginPhase, OtpLogin};
pub use quota::{QuotaSnapshot, QuotaWindow, QuotaWindows, WindowKind};
pub use session::{Session, SessionStore};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
pub use types::{AuthToken, FileId, Identity, OtpCode, TelegramId};

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Telegram user identifier, the login subject of the CDN.
///
/// Guaranteed non-empty by construction. The backend treats it as an opaque
/// string, so no digit-only restriction is imposed here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(try_from = "String", into = "String")]
pub struct TelegramId(String);

impl TelegramId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for TelegramId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_owned())
    }
}

impl TryFrom<String> for TelegramId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::validation("Telegram ID is required"));
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl From<TelegramId> for String {
    fn from(id: TelegramId) -> Self {
        id.0
    }
}

/// Six-digit one-time passcode, valid by construction.
///
/// Use [`OtpCode::sanitize`] to mirror the login form's input filter (strip
/// everything that is not a digit), then parse the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(try_from = "String", into = "String")]
pub struct OtpCode(String);

/// Number of digits in a one-time passcode.
pub const OTP_CODE_LEN: usize = 6;

impl OtpCode {
    /// Strips non-digit characters, as the login form does on each keystroke.
    #[must_use]
    pub fn sanitize(input: &str) -> String {
        input.chars().filter(char::is_ascii_digit).collect()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for OtpCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_owned())
    }
}

impl TryFrom<String> for OtpCode {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s.len() == OTP_CODE_LEN && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(s))
        } else {
            Err(Error::validation("OTP code must be exactly 6 digits"))
        }
    }
}

impl From<OtpCode> for String {
    fn from(code: OtpCode) -> Self {
        code.0
    }
}

/// Opaque session credential issued by `verify-otp`.
///
/// Sent as a bearer token on every protected call. No `Display` impl: the
/// token must not end up in log output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, From, Into)]
#[serde(transparent)]
pub struct AuthToken(pub String);

impl AuthToken {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Backend file identifier (the `unique_file_id` of the stored file).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct FileId(pub String);

impl FileId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Authenticated user identity as returned by `verify-otp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Identity {
    pub id: TelegramId,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
}

impl Identity {
    /// Create an `Identity` with only the required id.
    #[must_use]
    pub fn new(id: TelegramId) -> Self {
        Self {
            id,
            username: None,
            first_name: None,
        }
    }

    /// Set the username.
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the first name.
    #[must_use]
    pub fn with_first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self
    }

    /// Name shown in the navbar: username, else first name, else the id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .or(self.first_name.as_deref())
            .unwrap_or_else(|| self.id.as_str())
    }
}

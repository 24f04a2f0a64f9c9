//! Test doubles shared by the unit tests: a scripted [`Backend`] plus
//! fixture builders.

use std::collections::VecDeque;
use std::sync::Mutex;

use time::macros::datetime;

use crate::account::{UserFiles, UserLinks, UserStats};
use crate::api::{Backend, LoginGrant, OtpRequested};
use crate::error::Error;
use crate::links::{IssuedLink, LinkRequest};
use crate::quota::{QuotaSnapshot, QuotaWindow, QuotaWindows};
use crate::session::SessionStore;
use crate::storage::Storage;
use crate::types::{AuthToken, Identity, OtpCode, TelegramId};

/// Scripted backend: every endpoint pops the next queued response and
/// panics when called unexpectedly. Calls are recorded so tests can assert
/// that an operation did (or did not) reach the network.
#[derive(Default)]
pub(crate) struct FakeBackend {
    request_otp_responses: Mutex<VecDeque<Result<OtpRequested, Error>>>,
    verify_otp_responses: Mutex<VecDeque<Result<LoginGrant, Error>>>,
    quota_responses: Mutex<VecDeque<Result<QuotaSnapshot, Error>>>,
    link_responses: Mutex<VecDeque<Result<IssuedLink, Error>>>,
    user_stats_responses: Mutex<VecDeque<Result<UserStats, Error>>>,
    user_files_responses: Mutex<VecDeque<Result<UserFiles, Error>>>,
    user_links_responses: Mutex<VecDeque<Result<UserLinks, Error>>>,
    calls: Mutex<Vec<&'static str>>,
    tokens_seen: Mutex<Vec<String>>,
    codes_seen: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_request_otp(&self, response: Result<OtpRequested, Error>) {
        self.request_otp_responses.lock().unwrap().push_back(response);
    }

    pub(crate) fn push_verify_otp(&self, response: Result<LoginGrant, Error>) {
        self.verify_otp_responses.lock().unwrap().push_back(response);
    }

    pub(crate) fn push_quota(&self, response: Result<QuotaSnapshot, Error>) {
        self.quota_responses.lock().unwrap().push_back(response);
    }

    pub(crate) fn push_link(&self, response: Result<IssuedLink, Error>) {
        self.link_responses.lock().unwrap().push_back(response);
    }

    pub(crate) fn push_user_links(&self, response: Result<UserLinks, Error>) {
        self.user_links_responses.lock().unwrap().push_back(response);
    }

    /// Endpoints hit so far, in order.
    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    /// Bearer tokens presented to protected endpoints, in order.
    pub(crate) fn tokens_seen(&self) -> Vec<String> {
        self.tokens_seen.lock().unwrap().clone()
    }

    /// Codes submitted to `verify-otp`, in order.
    pub(crate) fn codes_seen(&self) -> Vec<String> {
        self.codes_seen.lock().unwrap().clone()
    }

    fn record(&self, op: &'static str) {
        self.calls.lock().unwrap().push(op);
    }

    fn record_token(&self, token: &AuthToken) {
        self.tokens_seen.lock().unwrap().push(token.as_str().to_owned());
    }

    fn pop<T>(queue: &Mutex<VecDeque<Result<T, Error>>>, op: &'static str) -> Result<T, Error> {
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected {op} call"))
    }
}

impl Backend for FakeBackend {
    async fn request_otp(&self, _subject: &TelegramId) -> Result<OtpRequested, Error> {
        self.record("request-otp");
        Self::pop(&self.request_otp_responses, "request-otp")
    }

    async fn verify_otp(
        &self,
        _subject: &TelegramId,
        code: &OtpCode,
    ) -> Result<LoginGrant, Error> {
        self.record("verify-otp");
        self.codes_seen.lock().unwrap().push(code.as_str().to_owned());
        Self::pop(&self.verify_otp_responses, "verify-otp")
    }

    async fn fetch_quota(&self, token: &AuthToken) -> Result<QuotaSnapshot, Error> {
        self.record("quota");
        self.record_token(token);
        Self::pop(&self.quota_responses, "quota")
    }

    async fn generate_link(
        &self,
        token: &AuthToken,
        _request: &LinkRequest,
    ) -> Result<IssuedLink, Error> {
        self.record("generate-link");
        self.record_token(token);
        Self::pop(&self.link_responses, "generate-link")
    }

    async fn user_stats(&self, token: &AuthToken) -> Result<UserStats, Error> {
        self.record("user-stats");
        self.record_token(token);
        Self::pop(&self.user_stats_responses, "user-stats")
    }

    async fn user_files(&self, token: &AuthToken) -> Result<UserFiles, Error> {
        self.record("user-files");
        self.record_token(token);
        Self::pop(&self.user_files_responses, "user-files")
    }

    async fn user_links(&self, token: &AuthToken) -> Result<UserLinks, Error> {
        self.record("user-links");
        self.record_token(token);
        Self::pop(&self.user_links_responses, "user-links")
    }
}

// ── Fixtures ───────────────────────────────────────────────────────

pub(crate) fn otp_requested(echoed_code: Option<&str>) -> OtpRequested {
    OtpRequested {
        message: Some("OTP sent successfully".into()),
        echoed_code: echoed_code.map(str::to_owned),
    }
}

pub(crate) fn grant(token: &str, subject: &str) -> LoginGrant {
    LoginGrant {
        token: AuthToken(token.to_owned()),
        identity: Identity::new(subject.parse().unwrap()),
    }
}

fn window(can_generate: bool, limit: u32) -> QuotaWindow {
    let used = if can_generate { 0 } else { limit };
    QuotaWindow {
        used,
        limit,
        remaining: limit - used,
        can_generate,
    }
}

/// Snapshot with the original backend's default limits (1/5/20).
pub(crate) fn snapshot(five_minutes: bool, hour: bool, day: bool) -> QuotaSnapshot {
    QuotaSnapshot {
        windows: QuotaWindows {
            five_minutes: window(five_minutes, 1),
            hour: window(hour, 5),
            day: window(day, 20),
        },
        can_generate_link: five_minutes && hour && day,
    }
}

pub(crate) fn issued_link(url: &str) -> IssuedLink {
    IssuedLink {
        link: url.parse().unwrap(),
        expiry_date: datetime!(2024-11-09 10:15 UTC),
    }
}

/// Puts a `tok_abc` / `123456789` session into `store`.
pub(crate) fn established_session<S: Storage>(store: &mut SessionStore<S>) {
    store
        .establish(
            AuthToken("tok_abc".into()),
            Identity::new("123456789".parse().unwrap()),
        )
        .expect("test session");
}

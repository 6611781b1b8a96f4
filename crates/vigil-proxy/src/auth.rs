//! Proxy-authentication responder.
//!
//! Answers proxy-auth challenges from stored credentials. Credentials are
//! supplied only when all gates pass: proxying enabled, credentials
//! present, the challenge is proxy-originated, and the requested host (or
//! the challenger) matches the configured targets. Anything else declines,
//! which leaves the platform's default prompt/deny behavior in charge.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use vigil_core::{is_target_host, mask_secret, ProxyConfig};

use crate::diagnostics::{AuthAudit, DiagPatch, DiagnosticsRecorder};
use crate::error::{ProxyError, Result};

/// An authentication challenge as observed on the wire.
#[derive(Debug, Clone)]
pub struct AuthChallenge {
    /// Full URL of the request that triggered the challenge.
    pub url: String,
    /// Host of the challenging endpoint.
    pub challenger_host: String,
    /// Challenge scheme (e.g. "basic").
    pub scheme: String,
    /// Challenge realm.
    pub realm: String,
    /// Whether the challenge came from a proxy rather than the origin.
    pub is_proxy: bool,
}

/// Credentials supplied in response to a challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCredentials {
    pub username: String,
    pub password: String,
}

/// Source of the stored proxy configuration.
///
/// Lookup errors are caught by the responder and recorded; they never
/// propagate to the platform.
pub trait CredentialSource: Send + Sync {
    fn proxy_config(&self) -> Result<ProxyConfig>;
}

impl CredentialSource for vigil_storage::Database {
    fn proxy_config(&self) -> Result<ProxyConfig> {
        self.load_proxy_config()
            .map_err(|e| ProxyError::Credentials(e.to_string()))
    }
}

/// Answers proxy-auth challenges.
pub struct AuthResponder {
    source: Arc<dyn CredentialSource>,
    diagnostics: DiagnosticsRecorder,
}

impl AuthResponder {
    pub fn new(source: Arc<dyn CredentialSource>, diagnostics: DiagnosticsRecorder) -> Self {
        Self {
            source,
            diagnostics,
        }
    }

    /// Decides whether to answer `challenge`. Returns the credentials to
    /// supply, or `None` to decline.
    pub fn respond(&self, challenge: &AuthChallenge) -> Option<AuthCredentials> {
        let url_host = host_of(&challenge.url);
        debug!(
            is_proxy = challenge.is_proxy,
            url_host = %url_host,
            challenger = %challenge.challenger_host,
            scheme = %challenge.scheme,
            realm = %challenge.realm,
            "Auth challenge"
        );

        let config = match self.source.proxy_config() {
            Ok(c) => c,
            Err(e) => {
                warn!("Credential lookup failed: {}", e);
                self.diagnostics.record(
                    DiagPatch {
                        last_auth: Some(AuthAudit::failure(e.to_string())),
                        ..DiagPatch::default()
                    },
                    None,
                );
                return None;
            }
        };

        if !config.enabled || !config.has_credentials() {
            return None;
        }

        if !self.should_handle(challenge, &url_host, &config) {
            return None;
        }

        info!(
            username = %config.username,
            password = %mask_secret(&config.password),
            "Supplying proxy credentials"
        );
        self.diagnostics.record(
            DiagPatch {
                last_auth: Some(AuthAudit {
                    ts: Utc::now(),
                    is_proxy: challenge.is_proxy,
                    url_host: url_host.clone(),
                    challenger_host: challenge.challenger_host.clone(),
                    scheme: challenge.scheme.clone(),
                    realm: challenge.realm.clone(),
                    provided: true,
                    error: None,
                }),
                ..DiagPatch::default()
            },
            None,
        );

        Some(AuthCredentials {
            username: config.username,
            password: config.password,
        })
    }

    fn should_handle(&self, challenge: &AuthChallenge, url_host: &str, config: &ProxyConfig) -> bool {
        if !challenge.is_proxy {
            return false;
        }
        if is_target_host(url_host) {
            return true;
        }
        // Challenger naming the configured proxy also qualifies.
        !config.host.is_empty()
            && challenge
                .challenger_host
                .to_lowercase()
                .contains(&config.host.to_lowercase())
    }
}

/// Extracts the lowercased host from a URL, or empty on parse failure.
fn host_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::diagnostics::MemoryStore;

    struct FakeSource {
        config: Mutex<Result<ProxyConfig>>,
    }

    impl FakeSource {
        fn with(config: ProxyConfig) -> Arc<Self> {
            Arc::new(Self {
                config: Mutex::new(Ok(config)),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                config: Mutex::new(Err(ProxyError::Credentials("db unavailable".into()))),
            })
        }
    }

    impl CredentialSource for FakeSource {
        fn proxy_config(&self) -> Result<ProxyConfig> {
            match &*self.config.lock().unwrap() {
                Ok(c) => Ok(c.clone()),
                Err(e) => Err(ProxyError::Credentials(e.to_string())),
            }
        }
    }

    fn full_config() -> ProxyConfig {
        ProxyConfig {
            host: "proxy.internal".into(),
            port: 3128,
            username: "user".into(),
            password: "hunter2".into(),
            enabled: true,
        }
    }

    fn proxy_challenge() -> AuthChallenge {
        AuthChallenge {
            url: "https://chat.chatgpt.com/backend-api/conversation".into(),
            challenger_host: "proxy.internal".into(),
            scheme: "basic".into(),
            realm: "proxy".into(),
            is_proxy: true,
        }
    }

    fn responder(source: Arc<dyn CredentialSource>) -> (AuthResponder, DiagnosticsRecorder) {
        let rec = DiagnosticsRecorder::new(Arc::new(MemoryStore::new()));
        (AuthResponder::new(source, rec.clone()), rec)
    }

    #[test]
    fn supplies_credentials_when_all_gates_pass() {
        let (resp, rec) = responder(FakeSource::with(full_config()));

        let creds = resp.respond(&proxy_challenge()).unwrap();
        assert_eq!(creds.username, "user");
        assert_eq!(creds.password, "hunter2");

        let audit = rec.snapshot().last_auth.unwrap();
        assert!(audit.provided);
        assert!(audit.is_proxy);
        assert_eq!(audit.url_host, "chat.chatgpt.com");
        assert!(audit.error.is_none());
    }

    #[test]
    fn declines_when_disabled() {
        let mut cfg = full_config();
        cfg.enabled = false;
        let (resp, _) = responder(FakeSource::with(cfg));
        assert!(resp.respond(&proxy_challenge()).is_none());
    }

    #[test]
    fn declines_without_credentials() {
        let mut cfg = full_config();
        cfg.password = String::new();
        let (resp, _) = responder(FakeSource::with(cfg));
        assert!(resp.respond(&proxy_challenge()).is_none());

        let mut cfg = full_config();
        cfg.username = String::new();
        let (resp, _) = responder(FakeSource::with(cfg));
        assert!(resp.respond(&proxy_challenge()).is_none());
    }

    #[test]
    fn declines_non_proxy_challenges() {
        let (resp, _) = responder(FakeSource::with(full_config()));
        let mut ch = proxy_challenge();
        ch.is_proxy = false;
        assert!(resp.respond(&ch).is_none());
    }

    #[test]
    fn declines_unrelated_hosts_and_challengers() {
        let (resp, _) = responder(FakeSource::with(full_config()));
        let mut ch = proxy_challenge();
        ch.url = "https://example.com/".into();
        ch.challenger_host = "some.other.proxy".into();
        assert!(resp.respond(&ch).is_none());
    }

    #[test]
    fn challenger_substring_match_is_case_insensitive() {
        let (resp, _) = responder(FakeSource::with(full_config()));
        let mut ch = proxy_challenge();
        ch.url = "https://example.com/".into();
        ch.challenger_host = "gw.PROXY.Internal".into();
        assert!(resp.respond(&ch).is_some());
    }

    #[test]
    fn target_host_alone_is_sufficient() {
        let (resp, _) = responder(FakeSource::with(full_config()));
        let mut ch = proxy_challenge();
        ch.challenger_host = "unrelated".into();
        // URL host is a chatgpt.com subdomain
        assert!(resp.respond(&ch).is_some());
    }

    #[test]
    fn lookup_error_is_audited_and_declined() {
        let (resp, rec) = responder(FakeSource::failing());

        assert!(resp.respond(&proxy_challenge()).is_none());

        let audit = rec.snapshot().last_auth.unwrap();
        assert!(!audit.provided);
        assert!(audit.error.as_deref().unwrap().contains("db unavailable"));
    }

    #[test]
    fn unparseable_url_yields_empty_host() {
        assert_eq!(host_of("not a url"), "");
        assert_eq!(host_of("https://ChatGPT.com/x"), "chatgpt.com");
    }
}

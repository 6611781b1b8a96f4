//! Target domain filtering.
//!
//! Defines which hostnames the PAC policy, diagnostics, and auth responder
//! apply to. The list is a compile-time constant; all other hosts go DIRECT
//! and are never counted.

/// Chat-service domains routed through the proxy.
///
/// Matching is suffix-based: a host matches an entry when it is equal to it
/// or is a subdomain of it. Order is preserved in the generated PAC script.
pub const PROXY_TARGETS: &[&str] = &["chatgpt.com", "chat.openai.com", "www.myip.com"];

/// Checks whether `host` equals `domain` or is a subdomain of it.
///
/// Case-insensitive. Superstring hosts do not match: `evilchatgpt.com` is
/// not a match for `chatgpt.com`.
///
/// # Examples
///
/// ```
/// use vigil_core::host_matches;
///
/// assert!(host_matches("chatgpt.com", "chatgpt.com"));
/// assert!(host_matches("chat.chatgpt.com", "chatgpt.com"));
/// assert!(!host_matches("evilchatgpt.com", "chatgpt.com"));
/// ```
pub fn host_matches(host: &str, domain: &str) -> bool {
    if host.is_empty() || domain.is_empty() {
        return false;
    }
    let h = host.to_ascii_lowercase();
    let d = domain.to_ascii_lowercase();
    h == d || h.ends_with(&format!(".{}", d))
}

/// Checks whether `host` matches any of the fixed proxy targets.
///
/// A trailing `:port` is stripped before matching.
pub fn is_target_host(host: &str) -> bool {
    let host = host.split(':').next().unwrap_or(host);
    PROXY_TARGETS.iter().any(|d| host_matches(host, d))
}

//! PAC script generation.
//!
//! Builds the proxy auto-config script installed as the active proxy
//! policy. The output is consumed by the platform's PAC interpreter, so the
//! returned-string grammar is fixed: the matching branch yields
//! `"PROXY host:port; DIRECT"` (try the proxy, fall back to direct) and
//! everything else yields `"DIRECT"`.

use std::fmt::Write as _;

/// PAC scheme token. The proxy protocol is fixed to plain HTTP.
const PAC_TOKEN: &str = "PROXY";

/// Builds a PAC script routing `targets` (and their subdomains) through
/// `host:port`.
///
/// Pure and deterministic: identical inputs produce byte-identical output.
/// The caller guarantees a non-empty host and a non-zero port; there are no
/// error cases here.
///
/// # Examples
///
/// ```
/// use vigil_core::build_pac_script;
///
/// let pac = build_pac_script("proxy.local", 8080, &["chatgpt.com"]);
/// assert!(pac.contains(r#"return "PROXY proxy.local:8080; DIRECT";"#));
/// ```
pub fn build_pac_script(host: &str, port: u16, targets: &[&str]) -> String {
    let mut out = String::with_capacity(256 + targets.iter().map(|d| d.len() + 24).sum::<usize>());

    out.push_str("function FindProxyForURL(url, host) {\n");
    // Helper visible to the PAC interpreter: exact or subdomain match.
    out.push_str("  function isMatch(h, d) {\n");
    out.push_str("    return (h === d) || dnsDomainIs(h, \".\" + d);\n");
    out.push_str("  }\n");

    let cond = targets
        .iter()
        .map(|d| format!("isMatch(host, \"{}\")", d))
        .collect::<Vec<_>>()
        .join(" || ");
    let _ = writeln!(
        out,
        "  if ({}) {{ return \"{} {}:{}; DIRECT\"; }}",
        cond, PAC_TOKEN, host, port
    );

    out.push_str("  return \"DIRECT\";\n");
    out.push('}');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::targets::PROXY_TARGETS;

    #[test]
    fn deterministic_output() {
        let a = build_pac_script("proxy.local", 8080, PROXY_TARGETS);
        let b = build_pac_script("proxy.local", 8080, PROXY_TARGETS);
        assert_eq!(a, b);
    }

    #[test]
    fn exact_text_for_single_target() {
        let pac = build_pac_script("proxy.local", 8080, &["chatgpt.com"]);
        let expected = "function FindProxyForURL(url, host) {\n\
                        \x20 function isMatch(h, d) {\n\
                        \x20   return (h === d) || dnsDomainIs(h, \".\" + d);\n\
                        \x20 }\n\
                        \x20 if (isMatch(host, \"chatgpt.com\")) { return \"PROXY proxy.local:8080; DIRECT\"; }\n\
                        \x20 return \"DIRECT\";\n\
                        }";
        assert_eq!(pac, expected);
    }

    #[test]
    fn matching_branch_and_fallback_strings() {
        let pac = build_pac_script("proxy.local", 8080, &["chatgpt.com"]);
        assert!(pac.contains(r#"return "PROXY proxy.local:8080; DIRECT";"#));
        assert!(pac.contains(r#"return "DIRECT";"#));
    }

    #[test]
    fn all_targets_listed_in_order() {
        let pac = build_pac_script("10.0.0.1", 3128, PROXY_TARGETS);
        let mut last = 0;
        for d in PROXY_TARGETS {
            let needle = format!("isMatch(host, \"{}\")", d);
            let pos = pac.find(&needle).expect("target missing from PAC");
            assert!(pos >= last, "targets out of order");
            last = pos;
        }
    }

    #[test]
    fn condition_joined_with_or() {
        let pac = build_pac_script("p", 1, &["a.com", "b.com"]);
        assert!(pac.contains(r#"isMatch(host, "a.com") || isMatch(host, "b.com")"#));
    }
}

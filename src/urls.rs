//! Server URL helpers
//!
//! Users type server addresses in many shapes (`erp.acme.example`,
//! `https://erp.acme.example/`, `http://10.0.0.5:8080/app`).  Everything
//! downstream works on a canonical origin without a trailing slash, so the
//! helpers here are applied before any URL is concatenated.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

fn scheme_regex() -> &'static Regex {
    static SCHEME: OnceLock<Regex> = OnceLock::new();
    SCHEME.get_or_init(|| {
        // Valid pattern; compiled once.
        Regex::new(r"^[a-zA-Z][a-zA-Z\d+\-.]*:").expect("scheme regex is valid")
    })
}

/// Normalizes free-form user input into an `http`/`https` origin.
///
/// Leading and trailing whitespace is ignored.  Input without a scheme is
/// assumed to be `https`.  Any path, query, or fragment is discarded.
///
/// Returns `None` for empty input, unparseable URLs, and schemes other than
/// `http` and `https`.
///
/// # Examples
///
/// ```
/// use bpnr::urls::normalize_server_url;
///
/// assert_eq!(
///     normalize_server_url("  erp.acme.example/app/ ").as_deref(),
///     Some("https://erp.acme.example")
/// );
/// assert_eq!(normalize_server_url("ftp://erp.acme.example"), None);
/// assert_eq!(normalize_server_url("   "), None);
/// ```
pub fn normalize_server_url(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let with_scheme = if scheme_regex().is_match(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&with_scheme).ok()?;
    match url.scheme() {
        "http" | "https" => {}
        _ => return None,
    }

    let origin = url.origin();
    if !origin.is_tuple() {
        return None;
    }
    Some(origin.ascii_serialization())
}

/// Strips every trailing `/` from `url`.
///
/// # Examples
///
/// ```
/// use bpnr::urls::trim_trailing_slash;
///
/// assert_eq!(trim_trailing_slash("https://a.example///"), "https://a.example");
/// assert_eq!(trim_trailing_slash("https://a.example"), "https://a.example");
/// ```
pub fn trim_trailing_slash(url: &str) -> &str {
    url.trim_end_matches('/')
}

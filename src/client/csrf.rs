//! CSRF handling
//!
//! Mutating requests carry the CSRF token in a header, but only when the
//! request URL belongs to the site's own origin.

use crate::config::CsrfConfig;
use reqwest::{Method, Url};

/// Methods that do not require CSRF protection
pub fn csrf_safe_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

/// Whether `url` targets `origin`.
///
/// `url` is resolved against `origin` first, so relative URLs are always
/// same-origin. Scheme, host and port must all match.
pub fn same_origin(origin: &Url, url: &str) -> bool {
    match origin.join(url) {
        Ok(resolved) => resolved.origin() == origin.origin(),
        Err(_) => false,
    }
}

/// Read a cookie value out of a raw `Cookie` header, percent-decoded
pub fn token_from_cookie_header(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|cookie| cookie.strip_prefix(name)?.strip_prefix('='))
        .map(|value| {
            urlencoding::decode(value)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| value.to_string())
        })
}

/// Decides which requests get the CSRF header
#[derive(Debug, Clone)]
pub struct CsrfPolicy {
    origin: Url,
    header_name: String,
    token: Option<String>,
}

impl CsrfPolicy {
    pub fn new(origin: Url, header_name: impl Into<String>, token: Option<String>) -> Self {
        Self {
            origin,
            header_name: header_name.into(),
            token,
        }
    }

    /// Build the policy from configuration; the embedded token wins over the
    /// cookie value.
    pub fn from_config(origin: Url, config: &CsrfConfig) -> Self {
        let token = config.token.clone().or_else(|| {
            config
                .cookie
                .as_deref()
                .and_then(|cookie| token_from_cookie_header(cookie, &config.cookie_name))
        });

        if token.is_none() {
            tracing::debug!("No CSRF token configured, mutating requests may be rejected");
        }

        Self::new(origin, config.header_name.clone(), token)
    }

    /// Whether `url` belongs to the site this policy protects
    pub fn is_same_origin(&self, url: &str) -> bool {
        same_origin(&self.origin, url)
    }

    /// Header to attach to a request, if any
    pub fn header_for(&self, method: &Method, url: &str) -> Option<(&str, &str)> {
        if csrf_safe_method(method) {
            return None;
        }
        if !self.is_same_origin(url) {
            tracing::debug!(url = %url, "Cross-origin request, CSRF token withheld");
            return None;
        }
        self.token
            .as_deref()
            .map(|token| (self.header_name.as_str(), token))
    }
}

//! Anti-forgery token handling.
//!
//! The token is read from a cookie header and handed to the request client as
//! an explicit value. Nothing here caches it; callers refresh it by building a
//! new [`CsrfToken`] and installing it.

use percent_encoding::percent_decode_str;

/// Header the prediction server checks the token against.
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Looks up a cookie by name in a `Cookie` header value.
///
/// Pairs are separated by `;`, surrounding whitespace is ignored, and the
/// first pair whose name matches exactly wins. The value is percent-decoded;
/// a value that does not decode to UTF-8 is returned lossily.
pub fn get_cookie(cookie_header: &str, name: &str) -> Option<String> {
    if cookie_header.is_empty() {
        return None;
    }

    cookie_header
        .split(';')
        .map(str::trim)
        .find_map(|cookie| {
            cookie
                .strip_prefix(name)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .map(|raw| percent_decode_str(raw).decode_utf8_lossy().into_owned())
}

/// The anti-forgery token sent with every request.
///
/// An absent token is still sent, as an empty header value; the server is
/// expected to reject mutating requests in that case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsrfToken(Option<String>);

impl CsrfToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Some(value.into()))
    }

    pub fn absent() -> Self {
        Self(None)
    }

    /// Reads the token from a cookie header.
    pub fn from_cookie_header(cookie_header: &str, cookie_name: &str) -> Self {
        let token = get_cookie(cookie_header, cookie_name);
        if token.is_none() {
            tracing::warn!("Cookie '{}' not present; CSRF token is empty", cookie_name);
        }
        Self(token)
    }

    pub fn is_present(&self) -> bool {
        self.0.is_some()
    }

    /// Value to place in the [`CSRF_HEADER`] header.
    pub fn header_value(&self) -> &str {
        self.0.as_deref().unwrap_or("")
    }
}

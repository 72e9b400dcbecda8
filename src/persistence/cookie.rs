//! `document.cookie` string handling
//!
//! Values are percent-encoded with `encodeURIComponent` so JSON survives the
//! `;`-separated cookie header. The codec is passed in: the browser build
//! hands over `js_sys::encode_uri_component` / `decode_uri_component`.

/// Ten years; the identity has no natural expiry
pub const COOKIE_MAX_AGE_SECS: u64 = 315_360_000;

/// Find `key` in a `document.cookie` string and decode its value
pub fn parse_cookie(
    header: &str,
    key: &str,
    decode: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == key)
        .and_then(|(_, value)| decode(value))
}

/// Assignment string for `document.cookie`
pub fn format_cookie(key: &str, value: &str, encode: impl Fn(&str) -> String) -> String {
    format!(
        "{key}={}; max-age={COOKIE_MAX_AGE_SECS}; path=/; SameSite=Lax",
        encode(value)
    )
}

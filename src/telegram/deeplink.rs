//! `/start` payload parsing
//!
//! QR codes printed on certificates link to `t.me/<bot>?start=gc_<code>`.

use lazy_regex::regex_captures;

use crate::api::CertCode;

/// What a `/start` payload asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartTarget {
    /// Look up the certificate with this code
    Lookup(CertCode),
    /// Plain start: show the main menu
    Menu,
}

/// Resolves a `/start` payload. Unrecognized payloads fall back to the menu.
pub fn resolve(payload: &str) -> StartTarget {
    regex_captures!(r"^gc[_-]([0-9]+)$", payload.trim())
        .and_then(|(_, digits)| CertCode::parse(digits))
        .map(StartTarget::Lookup)
        .unwrap_or(StartTarget::Menu)
}

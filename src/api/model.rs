//! Wire types of the gift-certificate API
//!
//! The shop module is loose about JSON types: ids and amounts arrive either
//! as numbers or as strings depending on the OpenCart version, and optional
//! fields are sometimes `null`, sometimes missing. Everything here decodes
//! leniently and exposes plain Rust types to the rest of the crate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use strum::EnumString;

/// Public certificate code.
///
/// Only ASCII digits, kept as the original string: `012345` and `12345`
/// are different certificates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CertCode(String);

impl CertCode {
    /// Longest accepted code; `del_yes:<code>` must fit a 64-byte callback payload
    pub const MAX_LEN: usize = 32;

    /// Validates a trimmed digit string
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw.len() > Self::MAX_LEN || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CertCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to a certificate as accepted by every per-certificate endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertRef {
    /// Internal row id (`giftcert_id`)
    Id(u64),
    /// Public certificate code (`code`)
    Code(CertCode),
}

impl CertRef {
    /// Parameter name and value as sent in a query string.
    pub fn param(&self) -> (&'static str, String) {
        match self {
            CertRef::Id(id) => ("giftcert_id", id.to_string()),
            CertRef::Code(code) => ("code", code.to_string()),
        }
    }

    /// Value for JSON bodies: ids as numbers, codes as strings.
    pub fn json_value(&self) -> Value {
        match self {
            CertRef::Id(id) => Value::from(*id),
            CertRef::Code(code) => Value::from(code.as_str()),
        }
    }
}

impl fmt::Display for CertRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CertRef::Id(id) => write!(f, "#{}", id),
            CertRef::Code(code) => write!(f, "{}", code),
        }
    }
}

/// Certificate status as reported by the shop.
///
/// `Used` and `Annulled` are terminal; everything else (including values
/// this bot does not know about) counts as active.
#[derive(Debug, Clone, PartialEq, Eq, Default, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum CertificateStatus {
    #[default]
    Active,
    Sent,
    Manual,
    SendError,
    Used,
    Annulled,
    #[strum(default)]
    Other(String),
}

impl CertificateStatus {
    pub fn is_active(&self) -> bool {
        !matches!(self, CertificateStatus::Used | CertificateStatus::Annulled)
    }
}

impl<'de> Deserialize<'de> for CertificateStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(CertificateStatus::Active);
        }
        // EnumString with a default variant never fails
        Ok(CertificateStatus::from_str(trimmed).unwrap_or(CertificateStatus::Other(trimmed.to_string())))
    }
}

/// One gift certificate, as returned by `get` and `list`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CertificateRecord {
    #[serde(deserialize_with = "lenient_u64")]
    pub giftcert_id: u64,
    #[serde(deserialize_with = "lenient_string")]
    pub code: String,
    #[serde(deserialize_with = "lenient_string")]
    pub amount: String,
    #[serde(deserialize_with = "lenient_string")]
    pub recipient_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub recipient_email: String,
    #[serde(deserialize_with = "lenient_string")]
    pub firstname: String,
    #[serde(deserialize_with = "lenient_string")]
    pub lastname: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub order_id: u64,
    pub status: CertificateStatus,
    #[serde(deserialize_with = "lenient_string")]
    pub source: String,
    #[serde(deserialize_with = "lenient_string")]
    pub created_at: String,
    #[serde(deserialize_with = "lenient_string")]
    pub sent_at: String,
    #[serde(deserialize_with = "lenient_string")]
    pub used_at: String,
    #[serde(deserialize_with = "lenient_string")]
    pub annulled_at: String,
    #[serde(deserialize_with = "lenient_string")]
    pub pdf_path: String,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub error: Option<String>,
}

impl CertificateRecord {
    /// Validated code, if the server returned one.
    pub fn cert_code(&self) -> Option<CertCode> {
        CertCode::parse(&self.code)
    }

    /// Donor display name ("Lastname Firstname"), empty if neither is set.
    pub fn donor(&self) -> String {
        format!("{} {}", self.lastname.trim(), self.firstname.trim())
            .trim()
            .to_string()
    }
}

/// Rows returned by the `list` endpoint, in server order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JournalPage {
    pub start: u32,
    pub limit: u32,
    pub rows: Vec<CertificateRecord>,
}

/// Payload of the `create` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewCertificate {
    pub amount: u64,
    pub recipient_name: String,
    pub firstname: String,
    pub lastname: String,
    pub recipient_email: String,
    pub send_email: bool,
}

/// Identifiers of a freshly created certificate.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CreatedCertificate {
    #[serde(deserialize_with = "lenient_u64")]
    pub giftcert_id: u64,
    #[serde(deserialize_with = "lenient_string")]
    pub code: String,
    #[serde(deserialize_with = "lenient_string")]
    pub amount: String,
}

/// Result of a mutating call (`use`, `annul`, `resend`, `delete`).
///
/// Some module versions echo the updated record back as `cert`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mutation {
    pub cert: Option<CertificateRecord>,
    pub message: Option<String>,
}

/// Parses a strictly numeric string (ASCII digits only) as `u64`.
pub fn parse_numeric(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Str(String),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Bool(bool),
}

impl Loose {
    fn into_string(self) -> String {
        match self {
            Loose::Str(s) => s,
            Loose::Unsigned(n) => n.to_string(),
            Loose::Signed(n) => n.to_string(),
            Loose::Float(n) => n.to_string(),
            Loose::Bool(b) => b.to_string(),
        }
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<Loose>::deserialize(deserializer)?
        .map(Loose::into_string)
        .unwrap_or_default())
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Loose>::deserialize(deserializer)?
        .map(Loose::into_string)
        .filter(|s| !s.trim().is_empty()))
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Unsigned(n)) => n,
        Some(Loose::Signed(n)) => u64::try_from(n).unwrap_or(0),
        Some(Loose::Float(n)) if n >= 0.0 => n as u64,
        Some(Loose::Str(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

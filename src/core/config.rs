use std::collections::HashSet;
use std::env;
use std::path::Path;
use std::time::Duration;

use indoc::indoc;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Default text shown to non-admins who scan a certificate code
pub const DEFAULT_SCAN_INVITE_TEXT: &str = indoc! {"
    Чтобы воспользоваться 🎁 Подарочным сертификатом, приглашаем вас в нашу виртуальную арену VRPOINT.BY 🕶✨
    Забронировать услугу можно на сайте: https://vrpoint.by 🌐

    📍 Наши адреса в Минске:
    • Я. Коласа, 37
    • Маяковского, 6 (ТЦ «Червенский»)

    📞 Телефон для связи: +375291419921

    До встречи в VR 🚀🎮"};

/// Network configuration
pub mod network {
    use super::Duration;

    /// Timeout for JSON calls to the certificate API (in seconds)
    pub const API_TIMEOUT_SECS: u64 = 40;

    /// Timeout for PDF downloads (in seconds)
    pub const PDF_TIMEOUT_SECS: u64 = 60;

    /// Timeout for Telegram Bot API requests (in seconds)
    pub const BOT_TIMEOUT_SECS: u64 = 60;

    /// Telegram request timeout duration
    pub fn bot_timeout() -> Duration {
        Duration::from_secs(BOT_TIMEOUT_SECS)
    }
}

/// Journal configuration
pub mod journal {
    /// Rows requested by /journal
    pub const DEFAULT_LIMIT: u32 = 10;

    /// Upper bound accepted from JOURNAL_LIMIT
    pub const MAX_LIMIT: u32 = 50;
}

/// Configuration errors detected at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{var} is not a valid URL ({value}): {source}")]
    InvalidUrl {
        var: &'static str,
        value: String,
        source: url::ParseError,
    },

    #[error("{var} must be an http(s) URL, got {value}")]
    NotHttp { var: &'static str, value: String },

    #[error("OC_BASE_URL looks like a template ({0}); set the real shop domain")]
    Placeholder(String),

    #[error("{var} must be a positive number, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("Failed to load {path}: {source}")]
    EnvFile { path: String, source: dotenvy::Error },
}

/// Immutable bot configuration, built once at startup.
#[derive(Debug)]
pub struct Config {
    pub bot_token: SecretString,
    pub admin_ids: HashSet<i64>,
    /// Shop base URL, always ending with `/`
    pub api_base: Url,
    pub api_token: SecretString,
    pub sheet_url: Option<Url>,
    pub api_timeout: Duration,
    pub pdf_timeout: Duration,
    pub journal_limit: u32,
    pub scan_invite_text: String,
}

impl Config {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bot_token = get("TG_BOT_TOKEN").ok_or(ConfigError::Missing("TG_BOT_TOKEN"))?;
        let api_token = get("OC_API_TOKEN").ok_or(ConfigError::Missing("OC_API_TOKEN"))?;
        let base_raw = get("OC_BASE_URL").ok_or(ConfigError::Missing("OC_BASE_URL"))?;
        let api_base = parse_base_url(&base_raw)?;

        let sheet_url = get("SHEET_URL").map(|raw| parse_http_url("SHEET_URL", &raw)).transpose()?;

        Ok(Self {
            bot_token: SecretString::from(bot_token),
            admin_ids: get("TG_ADMIN_IDS").map(|raw| parse_admin_ids(&raw)).unwrap_or_default(),
            api_base,
            api_token: SecretString::from(api_token),
            sheet_url,
            api_timeout: Duration::from_secs(parse_positive(
                "API_TIMEOUT_SECS",
                get("API_TIMEOUT_SECS"),
                network::API_TIMEOUT_SECS,
            )?),
            pdf_timeout: Duration::from_secs(parse_positive(
                "PDF_TIMEOUT_SECS",
                get("PDF_TIMEOUT_SECS"),
                network::PDF_TIMEOUT_SECS,
            )?),
            journal_limit: parse_positive(
                "JOURNAL_LIMIT",
                get("JOURNAL_LIMIT"),
                u64::from(journal::DEFAULT_LIMIT),
            )?
            .min(u64::from(journal::MAX_LIMIT)) as u32,
            scan_invite_text: get("SCAN_INVITE_TEXT")
                .map(|text| text.replace("\\n", "\n"))
                .unwrap_or_else(|| DEFAULT_SCAN_INVITE_TEXT.to_string()),
        })
    }

    /// Whether `user_id` may manage certificates.
    ///
    /// An empty admin list admits everyone.
    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_ids.is_empty() || self.admin_ids.contains(&user_id)
    }

    /// Logs the effective configuration without secrets
    pub fn log_summary(&self) {
        log::info!("Certificate API: {}", self.api_base);
        if self.admin_ids.is_empty() {
            log::warn!("TG_ADMIN_IDS is empty: every Telegram user has admin access");
        } else {
            log::info!("Admins: {:?}", self.admin_ids);
        }
        match &self.sheet_url {
            Some(url) => log::info!("Sheet URL: {}", url),
            None => log::info!("Sheet URL: not set"),
        }
        log::info!(
            "Timeouts: api={}s pdf={}s, journal limit: {}",
            self.api_timeout.as_secs(),
            self.pdf_timeout.as_secs(),
            self.journal_limit
        );
    }
}

/// Loads a dotenv file into the process environment.
///
/// Priority: explicit path (CLI `--env-file` or `ENV_FILE`), then
/// `.env.example`, then `.env`. Variables already set are not overridden.
/// Returns the file that was loaded, if any. Runs before logging is set up,
/// so a broken file is returned to the caller instead of being logged here.
pub fn load_env_file(explicit: Option<&str>) -> Result<Option<String>, ConfigError> {
    let explicit = explicit
        .map(str::to_string)
        .or_else(|| env::var("ENV_FILE").ok())
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());

    let candidates: Vec<String> = match explicit {
        Some(path) => vec![path],
        None => vec![".env.example".to_string(), ".env".to_string()],
    };

    for candidate in candidates {
        if !Path::new(&candidate).exists() {
            continue;
        }
        return match dotenvy::from_filename(&candidate) {
            Ok(_) => Ok(Some(candidate)),
            Err(source) => Err(ConfigError::EnvFile {
                path: candidate,
                source,
            }),
        };
    }
    Ok(None)
}

fn parse_admin_ids(raw: &str) -> HashSet<i64> {
    raw.split([',', ' ', '\n', '\t'])
        .filter_map(|part| part.trim().parse::<i64>().ok())
        .collect()
}

fn parse_http_url(var: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
        var,
        value: raw.to_string(),
        source,
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::NotHttp {
            var,
            value: raw.to_string(),
        });
    }
    Ok(url)
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    if raw.contains("your-domain") {
        return Err(ConfigError::Placeholder(raw.to_string()));
    }
    let mut url = parse_http_url("OC_BASE_URL", raw)?;
    url.set_query(None);
    url.set_fragment(None);
    // Url::join replaces the last segment unless the path ends with '/'
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_positive(var: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => match value.parse::<u64>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(ConfigError::InvalidNumber { var, value }),
        },
    }
}

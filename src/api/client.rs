//! HTTP client for the OpenCart `giftcert_pdf_api` module

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, ClientBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use strum::IntoStaticStr;
use url::Url;

use super::error::{ApiError, ApiResult};
use super::model::{CertRef, CertificateRecord, CreatedCertificate, JournalPage, Mutation, NewCertificate};
use crate::core::config::Config;

/// Header carrying the static API token
pub const TOKEN_HEADER: &str = "X-Giftcert-Token";

/// OpenCart route prefix; the operation name is appended
pub const ROUTE_PREFIX: &str = "extension/module/giftcert_pdf_api";

/// How much of an unexpected body is kept for error messages
const BODY_SNIPPET_CHARS: usize = 200;

/// Remote operations exposed by the shop module
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Endpoint {
    Create,
    Pdf,
    List,
    Resend,
    Annul,
    Delete,
    Get,
    Use,
}

impl Endpoint {
    /// Value of the `route` query parameter for this operation
    pub fn route(self) -> String {
        let op: &'static str = self.into();
        format!("{}/{}", ROUTE_PREFIX, op)
    }
}

/// Operations of the certificate API.
///
/// Every method issues exactly one HTTP request and never retries.
#[async_trait]
pub trait CertificateApi: Send + Sync {
    async fn create(&self, new: &NewCertificate) -> ApiResult<CreatedCertificate>;
    async fn get(&self, cert: CertRef) -> ApiResult<CertificateRecord>;
    async fn list(&self, start: u32, limit: u32) -> ApiResult<JournalPage>;
    async fn pdf(&self, cert: CertRef) -> ApiResult<Vec<u8>>;
    async fn resend(&self, cert: CertRef) -> ApiResult<Mutation>;
    async fn mark_used(&self, cert: CertRef, note: &str) -> ApiResult<Mutation>;
    async fn annul(&self, cert: CertRef, reason: &str) -> ApiResult<Mutation>;
    async fn delete(&self, cert: CertRef) -> ApiResult<Mutation>;
}

/// [`CertificateApi`] over reqwest
pub struct HttpCertificateApi {
    client: Client,
    base: Url,
    token: SecretString,
    pdf_timeout: Duration,
}

impl HttpCertificateApi {
    /// Creates a client for the shop at `base`.
    ///
    /// `base` must end with a slash when it carries a path (see
    /// [`Config`], which normalizes it).
    pub fn new(base: Url, token: SecretString, timeout: Duration, pdf_timeout: Duration) -> ApiResult<Self> {
        let client = ClientBuilder::new().timeout(timeout).build()?;
        Ok(Self {
            client,
            base,
            token,
            pdf_timeout,
        })
    }

    pub fn from_config(config: &Config) -> ApiResult<Self> {
        Self::new(
            config.api_base.clone(),
            SecretString::from(config.api_token.expose_secret().to_string()),
            config.api_timeout,
            config.pdf_timeout,
        )
    }

    /// Full URL of an operation, without call parameters.
    pub fn endpoint_url(&self, endpoint: Endpoint) -> ApiResult<Url> {
        let mut url = self.base.join("index.php")?;
        url.set_query(Some(&format!("route={}", endpoint.route())));
        Ok(url)
    }

    async fn get_envelope(&self, endpoint: Endpoint, params: &[(&str, String)]) -> ApiResult<Envelope> {
        let url = self.endpoint_url(endpoint)?;
        log::debug!("GET {} {:?}", url, params);
        let resp = self
            .client
            .get(url)
            .header(TOKEN_HEADER, self.token.expose_secret())
            .query(params)
            .send()
            .await?;
        Envelope::from_response(resp).await
    }

    async fn post_envelope(&self, endpoint: Endpoint, body: &Value) -> ApiResult<Envelope> {
        let url = self.endpoint_url(endpoint)?;
        log::debug!("POST {} {}", url, body);
        let resp = self
            .client
            .post(url)
            .header(TOKEN_HEADER, self.token.expose_secret())
            .json(body)
            .send()
            .await?;
        Envelope::from_response(resp).await
    }

    async fn mutate(&self, endpoint: Endpoint, mut body: Map<String, Value>, cert: CertRef) -> ApiResult<Mutation> {
        body.insert(cert.param().0.to_string(), cert.json_value());
        let mut envelope = self.post_envelope(endpoint, &Value::Object(body)).await?;
        log::info!("{:?} succeeded for certificate {}", endpoint, cert);
        Ok(Mutation {
            // a malformed echo is dropped, the mutation itself succeeded
            cert: envelope.take::<CertificateRecord>("cert").ok().flatten(),
            message: envelope.message(),
        })
    }
}

#[async_trait]
impl CertificateApi for HttpCertificateApi {
    async fn create(&self, new: &NewCertificate) -> ApiResult<CreatedCertificate> {
        let body = serde_json::to_value(new).map_err(|e| ApiError::Decode(e.to_string()))?;
        let envelope = self.post_envelope(Endpoint::Create, &body).await?;
        let created: CreatedCertificate = envelope.decode()?;
        log::info!(
            "Certificate created: id={} code={} amount={}",
            created.giftcert_id,
            created.code,
            created.amount
        );
        Ok(created)
    }

    async fn get(&self, cert: CertRef) -> ApiResult<CertificateRecord> {
        let (key, value) = cert.param();
        let mut envelope = self.get_envelope(Endpoint::Get, &[(key, value)]).await?;
        envelope
            .take("cert")?
            .ok_or_else(|| ApiError::Decode("response has no `cert` object".to_string()))
    }

    async fn list(&self, start: u32, limit: u32) -> ApiResult<JournalPage> {
        let params = [("start", start.to_string()), ("limit", limit.to_string())];
        let mut envelope = self.get_envelope(Endpoint::List, &params).await?;
        let mut rows: Vec<CertificateRecord> = envelope.take("rows")?.unwrap_or_default();
        rows.truncate(limit as usize);
        Ok(JournalPage { start, limit, rows })
    }

    async fn pdf(&self, cert: CertRef) -> ApiResult<Vec<u8>> {
        let (key, value) = cert.param();
        let url = self.endpoint_url(Endpoint::Pdf)?;
        log::debug!("GET {} {}={}", url, key, value);
        let resp = self
            .client
            .get(url)
            .header(TOKEN_HEADER, self.token.expose_secret())
            .query(&[(key, value.as_str())])
            .timeout(self.pdf_timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status,
                body: snippet(&body),
            });
        }

        let is_json = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("json"))
            .unwrap_or(false);
        let bytes = resp.bytes().await?;

        if is_json {
            // The module answers JSON only on errors
            let raw = String::from_utf8_lossy(&bytes);
            Envelope::parse(&raw)?;
            return Err(ApiError::Decode(format!("expected a PDF, got JSON: {}", snippet(&raw))));
        }

        Ok(bytes.to_vec())
    }

    async fn resend(&self, cert: CertRef) -> ApiResult<Mutation> {
        self.mutate(Endpoint::Resend, Map::new(), cert).await
    }

    async fn mark_used(&self, cert: CertRef, note: &str) -> ApiResult<Mutation> {
        let mut body = Map::new();
        body.insert("note".to_string(), json!(note));
        self.mutate(Endpoint::Use, body, cert).await
    }

    async fn annul(&self, cert: CertRef, reason: &str) -> ApiResult<Mutation> {
        let mut body = Map::new();
        body.insert("reason".to_string(), json!(reason));
        self.mutate(Endpoint::Annul, body, cert).await
    }

    async fn delete(&self, cert: CertRef) -> ApiResult<Mutation> {
        let mut body = Map::new();
        body.insert("confirm".to_string(), json!(true));
        self.mutate(Endpoint::Delete, body, cert).await
    }
}

/// Decoded `{"success": ..., ...}` response object
#[derive(Debug)]
struct Envelope(Map<String, Value>);

impl Envelope {
    async fn from_response(resp: Response) -> ApiResult<Self> {
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            log::warn!("Certificate API returned {}: {}", status, snippet(&body));
            return Err(ApiError::Status {
                status,
                body: snippet(&body),
            });
        }
        Self::parse(&body)
    }

    /// Parses a body and fails with [`ApiError::Remote`] unless it reports success.
    fn parse(body: &str) -> ApiResult<Self> {
        let map = match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) => map,
            _ => return Err(ApiError::Decode(snippet(body))),
        };
        let envelope = Envelope(map);
        if envelope.success() {
            Ok(envelope)
        } else {
            let message = envelope
                .error_text()
                .unwrap_or_else(|| if body.trim().is_empty() { "Unknown error".to_string() } else { snippet(body) });
            log::warn!("Certificate API reported failure: {}", message);
            Err(ApiError::Remote(message))
        }
    }

    fn success(&self) -> bool {
        match self.0.get("success") {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_i64() == Some(1),
            Some(Value::String(s)) => matches!(s.trim(), "1" | "true"),
            _ => false,
        }
    }

    fn text_field(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Null => None,
            Value::String(_) => None,
            other => Some(other.to_string()),
        }
    }

    fn error_text(&self) -> Option<String> {
        self.text_field("error").or_else(|| self.text_field("message"))
    }

    fn message(&self) -> Option<String> {
        self.text_field("message")
    }

    fn take<T: DeserializeOwned>(&mut self, key: &str) -> ApiResult<Option<T>> {
        match self.0.remove(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| ApiError::Decode(format!("`{}`: {}", key, e))),
        }
    }

    fn decode<T: DeserializeOwned>(self) -> ApiResult<T> {
        serde_json::from_value(Value::Object(self.0)).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

fn snippet(body: &str) -> String {
    body.chars().take(BODY_SNIPPET_CHARS).collect()
}

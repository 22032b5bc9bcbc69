//! Common test utilities
//!
//! Shared by the dispatch and handler integration tests.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use teloxide::types::{InlineKeyboardButtonKind, InlineKeyboardMarkup};

use giftcert_bot::api::{
    ApiError, ApiResult, CertCode, CertRef, CertificateApi, CertificateRecord, CertificateStatus, CreatedCertificate,
    JournalPage, Mutation, NewCertificate,
};
use giftcert_bot::core::Config;

/// How the fake answers
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Ok,
    Remote,
    Transport,
}

/// [`CertificateApi`] that records every call instead of talking to a shop
pub struct RecordingApi {
    mode: Mode,
    rows: Vec<CertificateRecord>,
    echo_cert: bool,
    message: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl RecordingApi {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            rows: Vec::new(),
            echo_cert: false,
            message: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_rows(mut self, rows: Vec<CertificateRecord>) -> Self {
        self.rows = rows;
        self
    }

    pub fn echoing_cert(mut self) -> Self {
        self.echo_cert = true;
        self
    }

    /// Mutations answer with this `message`
    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn record(&self, call: String) -> ApiResult<()> {
        self.calls.lock().unwrap().push(call);
        match self.mode {
            Mode::Ok => Ok(()),
            Mode::Remote => Err(ApiError::Remote("Certificate not found".to_string())),
            // A real connection error from a port nobody listens on
            Mode::Transport => Err(reqwest::get("http://127.0.0.1:1/").await.unwrap_err().into()),
        }
    }

    fn mutation(&self, cert: Option<CertificateRecord>) -> Mutation {
        Mutation {
            cert,
            message: self.message.clone(),
        }
    }
}

pub fn record(code: &str, status: CertificateStatus) -> CertificateRecord {
    CertificateRecord {
        giftcert_id: 1,
        code: code.to_string(),
        amount: "50.00".to_string(),
        status,
        ..Default::default()
    }
}

#[async_trait]
impl CertificateApi for RecordingApi {
    async fn create(&self, new: &NewCertificate) -> ApiResult<CreatedCertificate> {
        self.record(format!("create amount={} email={}", new.amount, new.send_email)).await?;
        Ok(CreatedCertificate {
            giftcert_id: 9,
            code: "777777".to_string(),
            amount: format!("{}.00", new.amount),
        })
    }

    async fn get(&self, cert: CertRef) -> ApiResult<CertificateRecord> {
        let (key, value) = cert.param();
        self.record(format!("get {}={}", key, value)).await?;
        Ok(record(&value, CertificateStatus::Active))
    }

    async fn list(&self, start: u32, limit: u32) -> ApiResult<JournalPage> {
        self.record(format!("list start={} limit={}", start, limit)).await?;
        Ok(JournalPage {
            start,
            limit,
            rows: self.rows.clone(),
        })
    }

    async fn pdf(&self, cert: CertRef) -> ApiResult<Vec<u8>> {
        let (key, value) = cert.param();
        self.record(format!("pdf {}={}", key, value)).await?;
        Ok(b"%PDF".to_vec())
    }

    async fn resend(&self, cert: CertRef) -> ApiResult<Mutation> {
        self.record(format!("resend {}", cert)).await?;
        Ok(self.mutation(None))
    }

    async fn mark_used(&self, cert: CertRef, note: &str) -> ApiResult<Mutation> {
        self.record(format!("use {} note={}", cert, note)).await?;
        let echo = self.echo_cert.then(|| record(&cert.param().1, CertificateStatus::Used));
        Ok(self.mutation(echo))
    }

    async fn annul(&self, cert: CertRef, reason: &str) -> ApiResult<Mutation> {
        self.record(format!("annul {} reason={}", cert, reason)).await?;
        Ok(self.mutation(None))
    }

    async fn delete(&self, cert: CertRef) -> ApiResult<Mutation> {
        self.record(format!("delete {}", cert)).await?;
        Ok(self.mutation(None))
    }
}

/// Config for a shop at `shop.example` with the given admin list
pub fn config_with_admins(admin_ids: &str) -> Config {
    let admin_ids = admin_ids.to_string();
    Config::from_lookup(move |key| {
        match key {
            "TG_BOT_TOKEN" => Some("123:abc".to_string()),
            "OC_API_TOKEN" => Some("secret".to_string()),
            "OC_BASE_URL" => Some("https://shop.example".to_string()),
            "TG_ADMIN_IDS" => Some(admin_ids.clone()),
            "SCAN_INVITE_TEXT" => Some("Приходите к нам!".to_string()),
            _ => None,
        }
    })
    .unwrap()
}

pub fn by_code(raw: &str) -> CertRef {
    CertRef::Code(CertCode::parse(raw).unwrap())
}

pub fn callback_data(kb: &InlineKeyboardMarkup) -> Vec<String> {
    kb.inline_keyboard
        .iter()
        .flatten()
        .filter_map(|b| match &b.kind {
            InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
            _ => None,
        })
        .collect()
}

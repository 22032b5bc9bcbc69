//! Chat rendering: certificate cards, keyboards and user-facing messages
//!
//! Cards use Telegram HTML; everything that came from the shop or from a
//! user goes through [`esc_html`] first.

use indoc::indoc;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, KeyboardRemove, ReplyMarkup,
};
use url::Url;

use super::router::{CallbackAction, CallbackToken, Rejection, Viewer};
use crate::api::{ApiError, CertCode, CertificateRecord, CertificateStatus, CreatedCertificate, JournalPage};

pub const MENU_CREATE: &str = "➕ Создать сертификат";
pub const MENU_JOURNAL: &str = "📒 Журнал";
pub const MENU_SHEET: &str = "🔗 Открыть Google-таблицу";

pub const SERVICE_UNAVAILABLE: &str = "⚠️ Сервис сертификатов временно недоступен. Попробуйте ещё раз позже.";
pub const ACCESS_DENIED: &str = "Доступ ограничен.";
pub const JOURNAL_EMPTY: &str = "Журнал пуст.";
pub const JOURNAL_HEADER: &str = "Последние сертификаты (действия под каждым):";
/// The PDF is not sent on creation, the admin asks for it with the card button
pub const PDF_BUTTON_HINT: &str = "Файл придёт после нажатия кнопки «📄 PDF» под сертификатом.";

/// Remote error messages are cut to this many characters
pub const MAX_ERROR_CHARS: usize = 300;

pub const HELP_TEXT: &str = indoc! {"
    Подарочные сертификаты:

    /new — создать сертификат
    /journal — последние сертификаты
    /pdf 123456 — PDF по коду
    /scan 123456 — карточка по коду
    /cert 17 — карточка по номеру в магазине
    /sheet — Google-таблица журнала
    /cancel — отменить создание
    /help — эта справка"};

/// One message to send back to the chat
#[derive(Debug, Clone)]
pub enum Outgoing {
    Text {
        text: String,
        /// Send with `ParseMode::Html`
        html: bool,
        markup: Option<ReplyMarkup>,
    },
    Document {
        bytes: Vec<u8>,
        file_name: String,
        caption: String,
    },
}

impl Outgoing {
    pub fn plain(text: impl Into<String>) -> Self {
        Outgoing::Text {
            text: text.into(),
            html: false,
            markup: None,
        }
    }

    pub fn html(text: impl Into<String>) -> Self {
        Outgoing::Text {
            text: text.into(),
            html: true,
            markup: None,
        }
    }

    /// Attaches a keyboard; no-op for documents.
    pub fn with_markup(self, reply_markup: impl Into<ReplyMarkup>) -> Self {
        match self {
            Outgoing::Text { text, html, .. } => Outgoing::Text {
                text,
                html,
                markup: Some(reply_markup.into()),
            },
            doc => doc,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Outgoing::Text { text, .. } => Some(text),
            Outgoing::Document { .. } => None,
        }
    }

    pub fn inline_keyboard(&self) -> Option<&InlineKeyboardMarkup> {
        match self {
            Outgoing::Text {
                markup: Some(ReplyMarkup::InlineKeyboard(kb)),
                ..
            } => Some(kb),
            _ => None,
        }
    }
}

/// Escapes `&`, `<` and `>` for Telegram HTML
pub fn esc_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

pub fn status_emoji(status: &CertificateStatus) -> &'static str {
    match status {
        CertificateStatus::Used => "♻️",
        CertificateStatus::Annulled => "🚫",
        CertificateStatus::SendError => "⚠️",
        CertificateStatus::Other(s) if s.to_lowercase().contains("error") => "⚠️",
        _ => "✅",
    }
}

pub fn status_label(status: &CertificateStatus) -> &str {
    match status {
        CertificateStatus::Active => "Активен",
        CertificateStatus::Sent => "Отправлен",
        CertificateStatus::Manual => "Создан вручную",
        CertificateStatus::SendError => "Ошибка отправки",
        CertificateStatus::Used => "Использован",
        CertificateStatus::Annulled => "Аннулирован",
        CertificateStatus::Other(s) => s,
    }
}

fn or_dash(s: &str) -> &str {
    if s.trim().is_empty() {
        "—"
    } else {
        s.trim()
    }
}

/// HTML text of a certificate card
pub fn certificate_text(cert: &CertificateRecord) -> String {
    let mut lines = vec![
        "🎟 <b>Сертификат</b>".to_string(),
        format!("ID: <b>{}</b>", cert.giftcert_id),
        format!("Код: <b>{}</b>", esc_html(or_dash(&cert.code))),
        format!("Сумма: <b>{} BYN</b>", esc_html(or_dash(&cert.amount))),
        format!(
            "Статус: {} <b>{}</b>",
            status_emoji(&cert.status),
            esc_html(status_label(&cert.status))
        ),
        format!("Источник: <code>{}</code>", esc_html(or_dash(&cert.source))),
    ];

    let recipient = cert.recipient_name.trim();
    let email = cert.recipient_email.trim();
    if !recipient.is_empty() || !email.is_empty() {
        lines.push(format!(
            "Получатель: <b>{}</b> — {}",
            esc_html(or_dash(recipient)),
            esc_html(or_dash(email))
        ));
    }

    let donor = cert.donor();
    if !donor.is_empty() {
        lines.push(format!("Даритель: <b>{}</b>", esc_html(&donor)));
    }

    let timestamps = [
        ("Создан", &cert.created_at),
        ("Отправлен", &cert.sent_at),
        ("Использован", &cert.used_at),
        ("Аннулирован", &cert.annulled_at),
    ];
    for (title, value) in timestamps {
        if !value.trim().is_empty() {
            lines.push(format!("{}: <code>{}</code>", title, esc_html(value.trim())));
        }
    }

    if cert.order_id > 0 {
        lines.push(format!("Заказ: <code>#{}</code>", cert.order_id));
    }

    if let Some(error) = &cert.error {
        lines.push(format!("Ошибка: <i>{}</i>", esc_html(&truncate(error, MAX_ERROR_CHARS))));
    }

    lines.join("\n")
}

fn button(text: &str, action: CallbackAction, code: &CertCode) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, CallbackToken::new(action, code.clone()).to_string())
}

/// Action keyboard bound to one certificate code
pub fn certificate_keyboard(code: &CertCode, active: bool, viewer: &Viewer) -> InlineKeyboardMarkup {
    let mut rows = vec![vec![
        button("📄 PDF", CallbackAction::Pdf, code),
        button("✉️ Email", CallbackAction::Email, code),
    ]];

    if active {
        rows.push(vec![
            button("✅ Использовать", CallbackAction::Use, code),
            button("🚫 Аннулировать", CallbackAction::Annul, code),
        ]);
    }

    if viewer.is_admin {
        rows.push(vec![button("🗑 Удалить", CallbackAction::Del, code)]);
    }

    InlineKeyboardMarkup::new(rows)
}

/// Card plus its keyboard. Records without a numeric code get no keyboard.
pub fn certificate_card(cert: &CertificateRecord, viewer: &Viewer) -> Outgoing {
    let card = Outgoing::html(certificate_text(cert));
    match cert.cert_code() {
        Some(code) => card.with_markup(certificate_keyboard(&code, cert.status.is_active(), viewer)),
        None => card,
    }
}

/// Header plus one card per row, or a single "empty" message
pub fn journal(page: &JournalPage, viewer: &Viewer, sheet_url: Option<&Url>) -> Vec<Outgoing> {
    if page.rows.is_empty() {
        return vec![Outgoing::plain(JOURNAL_EMPTY)];
    }

    let mut out = Vec::with_capacity(page.rows.len() + 2);
    out.push(Outgoing::plain(JOURNAL_HEADER));
    out.extend(page.rows.iter().map(|cert| certificate_card(cert, viewer)));
    if let Some(url) = sheet_url {
        out.push(Outgoing::plain("Дополнительно:").with_markup(sheet_keyboard(MENU_SHEET, url)));
    }
    out
}

/// Confirmation card for a freshly created certificate
pub fn created(cert: &CreatedCertificate, recipient_email: Option<&str>, viewer: &Viewer) -> Outgoing {
    let delivery = match recipient_email {
        Some(email) => format!("email на {}", esc_html(email)),
        None => format!("PDF в Telegram. {}", PDF_BUTTON_HINT),
    };
    let text = format!(
        "Сертификат создан ✅\nКод: <b>{}</b>\nСумма: <b>{} BYN</b>\nДоставка: {}\nИсточник: <code>telegram</code>",
        esc_html(or_dash(&cert.code)),
        esc_html(or_dash(&cert.amount)),
        delivery
    );

    let card = Outgoing::html(text);
    match CertCode::parse(&cert.code) {
        Some(code) => card.with_markup(certificate_keyboard(&code, true, viewer)),
        None => card,
    }
}

pub fn delete_confirmation(code: &CertCode) -> Outgoing {
    let keyboard = InlineKeyboardMarkup::new(vec![vec![
        button("✅ Да, удалить", CallbackAction::DelYes, code),
        button("↩️ Отмена", CallbackAction::DelNo, code),
    ]]);
    Outgoing::plain(format!("Удалить сертификат {}? Код станет доступен снова.", code)).with_markup(keyboard)
}

/// Main reply keyboard; the sheet row only when a sheet URL is configured
pub fn main_menu_keyboard(sheet_configured: bool) -> KeyboardMarkup {
    let mut rows = vec![vec![KeyboardButton::new(MENU_CREATE), KeyboardButton::new(MENU_JOURNAL)]];
    if sheet_configured {
        rows.push(vec![KeyboardButton::new(MENU_SHEET)]);
    }
    KeyboardMarkup::new(rows).resize_keyboard()
}

pub fn main_menu(sheet_configured: bool) -> Outgoing {
    Outgoing::plain("Выберите действие:").with_markup(main_menu_keyboard(sheet_configured))
}

pub fn sheet_keyboard(label: &str, url: &Url) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::url(label, url.clone())]])
}

pub fn sheet(sheet_url: Option<&Url>) -> Outgoing {
    match sheet_url {
        Some(url) => Outgoing::plain("Журнал сертификатов:").with_markup(sheet_keyboard("Открыть журнал", url)),
        None => Outgoing::plain("Ссылка на таблицу не настроена."),
    }
}

/// Removes the reply keyboard left over from the menu or the wizard
pub fn remove_keyboard(text: &str) -> Outgoing {
    Outgoing::plain(text).with_markup(ReplyMarkup::KeyboardRemove(KeyboardRemove::new()))
}

/// User-facing text for a failed API call.
///
/// `context` prefixes remote errors, e.g. "Ошибка удаления".
pub fn api_error(context: &str, err: &ApiError) -> String {
    match err {
        ApiError::Transport(_) => SERVICE_UNAVAILABLE.to_string(),
        ApiError::Status { status, .. } => format!("❌ Ошибка API: HTTP {}", status.as_u16()),
        ApiError::Remote(message) => format!("❌ {}: {}", context, truncate(message, MAX_ERROR_CHARS)),
        ApiError::Decode(_) | ApiError::Url(_) => format!("❌ {}: некорректный ответ сервиса.", context),
    }
}

pub fn rejection(rejection: &Rejection) -> &'static str {
    match rejection {
        Rejection::Validation(message) | Rejection::Usage(message) => *message,
        Rejection::Unauthorized => ACCESS_DENIED,
        Rejection::NotUnderstood => "Не понимаю. /help — список команд.",
    }
}

/// Cuts `s` to at most `max` characters
pub fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use teloxide::types::InlineKeyboardButtonKind;

    const ADMIN: Viewer = Viewer {
        user_id: 1,
        is_admin: true,
    };
    const GUEST: Viewer = Viewer {
        user_id: 2,
        is_admin: false,
    };

    fn cert(code: &str, status: CertificateStatus) -> CertificateRecord {
        CertificateRecord {
            giftcert_id: 17,
            code: code.to_string(),
            amount: "70.00".to_string(),
            status,
            source: "telegram".to_string(),
            ..Default::default()
        }
    }

    fn callback_data(kb: &InlineKeyboardMarkup) -> Vec<String> {
        kb.inline_keyboard
            .iter()
            .flatten()
            .filter_map(|b| match &b.kind {
                InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_esc_html() {
        assert_eq!(esc_html("<b>Tom & Jerry</b>"), "&lt;b&gt;Tom &amp; Jerry&lt;/b&gt;");
    }

    #[test]
    fn test_card_escapes_user_text() {
        let mut record = cert("555555", CertificateStatus::Active);
        record.recipient_name = "<script>".to_string();
        record.firstname = "A&B".to_string();

        let text = certificate_text(&record);
        assert!(text.contains("Получатель: <b>&lt;script&gt;</b> — —"));
        assert!(text.contains("Даритель: <b>A&amp;B</b>"));
        assert!(text.contains("Сумма: <b>70.00 BYN</b>"));
        assert!(text.contains("Статус: ✅ <b>Активен</b>"));
        assert!(!text.contains("Заказ"));
    }

    #[test]
    fn test_active_card_has_use_and_annul() {
        let card = certificate_card(&cert("555555", CertificateStatus::Sent), &ADMIN);
        let data = callback_data(card.inline_keyboard().unwrap());
        assert_eq!(
            data,
            vec!["pdf:555555", "email:555555", "use:555555", "annul:555555", "del:555555"]
        );
    }

    #[test]
    fn test_terminal_card_has_no_use_or_annul() {
        for status in [CertificateStatus::Used, CertificateStatus::Annulled] {
            let card = certificate_card(&cert("555555", status), &ADMIN);
            let data = callback_data(card.inline_keyboard().unwrap());
            assert_eq!(data, vec!["pdf:555555", "email:555555", "del:555555"]);
        }
    }

    #[test]
    fn test_leading_zero_code_is_kept_in_every_button() {
        let card = certificate_card(&cert("012345", CertificateStatus::Active), &ADMIN);
        let data = callback_data(card.inline_keyboard().unwrap());
        assert_eq!(data.len(), 5);
        assert!(data.iter().all(|d| d.ends_with(":012345")), "{:?}", data);
    }

    #[test]
    fn test_created_pdf_delivery_points_to_button() {
        let cert = CreatedCertificate {
            giftcert_id: 17,
            code: "012345".to_string(),
            amount: "70".to_string(),
        };
        let out = created(&cert, None, &ADMIN);
        assert!(out.text().unwrap().contains(PDF_BUTTON_HINT));
        assert_eq!(callback_data(out.inline_keyboard().unwrap())[0], "pdf:012345");

        let out = created(&cert, Some("a@b.by"), &ADMIN);
        assert!(!out.text().unwrap().contains(PDF_BUTTON_HINT));
    }

    #[test]
    fn test_delete_button_only_for_admins() {
        let card = certificate_card(&cert("1", CertificateStatus::Active), &GUEST);
        let data = callback_data(card.inline_keyboard().unwrap());
        assert!(!data.iter().any(|d| d.starts_with("del")));
    }

    #[test]
    fn test_card_without_numeric_code_has_no_keyboard() {
        let card = certificate_card(&cert("", CertificateStatus::Active), &ADMIN);
        assert!(card.inline_keyboard().is_none());
    }

    #[test]
    fn test_journal_renders_one_card_per_row() {
        let page = JournalPage {
            start: 0,
            limit: 10,
            rows: vec![
                cert("111", CertificateStatus::Active),
                cert("222", CertificateStatus::Used),
                cert("333", CertificateStatus::Annulled),
            ],
        };

        let out = journal(&page, &ADMIN, None);
        assert_eq!(out.len(), 4);
        assert_eq!(out[0].text(), Some(JOURNAL_HEADER));
        for (message, code) in out[1..].iter().zip(["111", "222", "333"]) {
            let data = callback_data(message.inline_keyboard().unwrap());
            assert!(data.iter().all(|d| d.ends_with(&format!(":{}", code))));
        }
    }

    #[test]
    fn test_empty_journal() {
        let out = journal(&JournalPage::default(), &ADMIN, None);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text(), Some(JOURNAL_EMPTY));
    }

    #[test]
    fn test_main_menu_sheet_row() {
        assert_eq!(main_menu_keyboard(false).keyboard.len(), 1);
        assert_eq!(main_menu_keyboard(true).keyboard.len(), 2);
    }

    #[test]
    fn test_api_error_texts() {
        let status = ApiError::Status {
            status: reqwest::StatusCode::BAD_GATEWAY,
            body: String::new(),
        };
        assert_eq!(api_error("Ошибка", &status), "❌ Ошибка API: HTTP 502");

        let long = "x".repeat(500);
        let text = api_error("Ошибка", &ApiError::Remote(long));
        assert_eq!(text.chars().count(), "❌ Ошибка: ".chars().count() + MAX_ERROR_CHARS);

        assert_eq!(
            api_error("Ошибка удаления", &ApiError::Remote("Certificate not found".into())),
            "❌ Ошибка удаления: Certificate not found"
        );
    }

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("привет", 3), "при");
        assert_eq!(truncate("ok", 10), "ok");
    }

    #[test]
    fn test_delete_confirmation_buttons() {
        let out = delete_confirmation(&CertCode::parse("0555").unwrap());
        assert_eq!(callback_data(out.inline_keyboard().unwrap()), vec!["del_yes:0555", "del_no:0555"]);
        assert!(out.text().unwrap().contains("Удалить сертификат 0555?"));
    }
}

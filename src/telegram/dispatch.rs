//! Executes a resolved [`Route`]
//!
//! Each route costs at most one call to the certificate API. The result is a
//! list of messages; sending them is the handlers' job.

use super::create;
use super::render::{self, Outgoing};
use super::router::{Action, Route, Viewer};
use crate::api::{CertRef, CertificateApi, Mutation};
use crate::core::Config;

pub const USED_NOTE: &str = "Использован через Telegram";
pub const ANNUL_REASON: &str = "Аннулирован через Telegram";

/// Produces the replies for `route`
pub async fn execute(route: Route, api: &dyn CertificateApi, config: &Config, viewer: &Viewer) -> Vec<Outgoing> {
    match route {
        Route::Menu => vec![render::main_menu(config.sheet_url.is_some())],
        Route::Help => vec![Outgoing::plain(render::HELP_TEXT)],
        Route::Invitation => vec![Outgoing::plain(config.scan_invite_text.clone())],
        Route::Sheet => vec![render::sheet(config.sheet_url.as_ref())],
        Route::StartCreate => vec![create::start().1],
        Route::CancelCreate => vec![create::cancelled()],
        Route::ConfirmDelete(code) => vec![render::delete_confirmation(&code)],
        // The callback answer already says it all
        Route::KeepCertificate(_) => Vec::new(),
        Route::Remote(action) => perform(action, api, config, viewer).await,
    }
}

/// Runs one remote action and renders its outcome
pub async fn perform(action: Action, api: &dyn CertificateApi, config: &Config, viewer: &Viewer) -> Vec<Outgoing> {
    match action {
        Action::Create(new) => match api.create(&new).await {
            Ok(created) => {
                log::info!("User {} created certificate {}", viewer.user_id, created.code);
                let email = new.send_email.then_some(new.recipient_email.as_str());
                vec![render::created(&created, email, viewer)]
            }
            Err(e) => failure("Ошибка создания", &e),
        },
        Action::Get(cert) => match api.get(cert.clone()).await {
            Ok(record) => vec![render::certificate_card(&record, viewer)],
            Err(e) => failure(&format!("Сертификат {} не найден", cert), &e),
        },
        Action::ListRecent { start, limit } => match api.list(start, limit).await {
            Ok(page) => render::journal(&page, viewer, config.sheet_url.as_ref()),
            Err(e) => failure("Ошибка журнала", &e),
        },
        Action::SendPdf(cert) => match api.pdf(cert.clone()).await {
            Ok(bytes) => vec![Outgoing::Document {
                bytes,
                file_name: format!("Certificate_{}.pdf", cert.param().1),
                caption: pdf_caption(&cert),
            }],
            Err(e) => failure("Ошибка PDF", &e),
        },
        Action::ResendEmail(cert) => match api.resend(cert.clone()).await {
            Ok(mutation) => vec![Outgoing::plain(with_server_note(
                format!("Email отправлен ✅ (сертификат {})", cert),
                mutation.message,
            ))],
            Err(e) => failure("Ошибка отправки", &e),
        },
        Action::MarkUsed(cert) => match api.mark_used(cert.clone(), USED_NOTE).await {
            Ok(mutation) => updated(mutation, viewer, || {
                format!("♻️ Готово ✅ (сертификат {} отмечен как использованный)", cert)
            }),
            Err(e) => failure("Не получилось", &e),
        },
        Action::Annul(cert) => match api.annul(cert.clone(), ANNUL_REASON).await {
            Ok(mutation) => updated(mutation, viewer, || format!("🚫 Аннулирован ✅ (сертификат {})", cert)),
            Err(e) => failure("Ошибка аннулирования", &e),
        },
        Action::Delete(cert) => match api.delete(cert.clone()).await {
            Ok(mutation) => {
                log::info!("User {} deleted certificate {}", viewer.user_id, cert);
                vec![Outgoing::plain(with_server_note(
                    format!("Удалён ✅ (сертификат {}). Код стал доступен снова.", cert),
                    mutation.message,
                ))]
            }
            Err(e) => failure("Ошибка удаления", &e),
        },
    }
}

fn pdf_caption(cert: &CertRef) -> String {
    match cert {
        CertRef::Code(code) => format!("PDF по коду {}", code),
        CertRef::Id(id) => format!("PDF сертификата #{}", id),
    }
}

/// Card of the returned record when the server echoed one, a short confirmation otherwise
fn updated(mutation: Mutation, viewer: &Viewer, confirmation: impl FnOnce() -> String) -> Vec<Outgoing> {
    match mutation.cert {
        Some(record) => vec![render::certificate_card(&record, viewer)],
        None => vec![Outgoing::plain(with_server_note(confirmation(), mutation.message))],
    }
}

/// Appends the shop's own `message` to a confirmation, when it sent one
fn with_server_note(text: String, message: Option<String>) -> String {
    match message.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
        Some(note) => format!("{}\n{}", text, render::truncate(note, render::MAX_ERROR_CHARS)),
        None => text,
    }
}

fn failure(context: &str, err: &crate::api::ApiError) -> Vec<Outgoing> {
    log::warn!("{}: {}", context, err);
    vec![Outgoing::plain(render::api_error(context, err))]
}

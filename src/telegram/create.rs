//! `/new` wizard: collects certificate fields one message at a time
//!
//! The state lives in teloxide's dialogue storage; transitions here are pure
//! so the handler only has to persist the next state and send the reply.

use teloxide::types::{KeyboardButton, KeyboardMarkup};

use super::render::{self, Outgoing};
use crate::api::{parse_numeric, NewCertificate};

pub const DELIVERY_PDF: &str = "📄 PDF в Telegram";
pub const DELIVERY_EMAIL: &str = "✉️ На email";
pub const CANCEL: &str = "❌ Отмена";
pub const SKIP: &str = "-";

/// Fields collected so far
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Draft {
    pub amount: u64,
    pub recipient_name: String,
    pub firstname: String,
    pub lastname: String,
    pub recipient_email: String,
}

impl Draft {
    fn into_request(self, send_email: bool) -> NewCertificate {
        NewCertificate {
            amount: self.amount,
            recipient_name: self.recipient_name,
            firstname: self.firstname,
            lastname: self.lastname,
            recipient_email: self.recipient_email,
            send_email,
        }
    }

    fn summary(&self) -> String {
        let donor = format!("{} {}", self.firstname, self.lastname);
        format!(
            "Проверьте данные:\n• Сумма: {} BYN\n• Получатель: {}\n• Даритель: {}\n• Email: {}\n\n\
             Как отправить?\n{}: {}\n{}: письмо с PDF уйдёт получателю.",
            self.amount,
            dash(&self.recipient_name),
            dash(donor.trim()),
            dash(&self.recipient_email),
            DELIVERY_PDF,
            render::PDF_BUTTON_HINT,
            DELIVERY_EMAIL
        )
    }
}

fn dash(s: &str) -> &str {
    if s.is_empty() {
        "—"
    } else {
        s
    }
}

/// Wizard position; `Idle` means no wizard is running for the chat
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CreateState {
    #[default]
    Idle,
    Amount,
    RecipientName(Draft),
    DonorFirstName(Draft),
    DonorLastName(Draft),
    RecipientEmail(Draft),
    Delivery(Draft),
}

/// Outcome of feeding one message to the wizard
#[derive(Debug, Clone)]
pub enum Step {
    /// Store `next` and send `reply`
    Continue { next: CreateState, reply: Outgoing },
    /// All fields collected: issue the create request
    Submit(NewCertificate),
    Cancel,
}

/// Enters the wizard
pub fn start() -> (CreateState, Outgoing) {
    (
        CreateState::Amount,
        render::remove_keyboard("Введите сумму (BYN), только цифры. Например: 70\n\n/cancel — отмена"),
    )
}

pub fn cancelled() -> Outgoing {
    render::remove_keyboard("Отменено.")
}

/// Message sent right before the create request
pub fn submitting() -> Outgoing {
    render::remove_keyboard("Генерирую сертификат…")
}

fn optional(text: &str) -> String {
    if text == SKIP {
        String::new()
    } else {
        text.to_string()
    }
}

fn ask(next: CreateState, text: &str) -> Step {
    Step::Continue {
        next,
        reply: Outgoing::plain(text),
    }
}

fn delivery_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![KeyboardButton::new(DELIVERY_PDF), KeyboardButton::new(DELIVERY_EMAIL)],
        vec![KeyboardButton::new(CANCEL)],
    ])
    .resize_keyboard()
}

/// Applies one user message to the current state.
pub fn advance(state: CreateState, text: &str) -> Step {
    let text = text.trim();
    if text == CANCEL {
        return Step::Cancel;
    }

    match state {
        CreateState::Idle => Step::Cancel,
        CreateState::Amount => match parse_numeric(text).filter(|amount| *amount > 0) {
            Some(amount) => ask(
                CreateState::RecipientName(Draft {
                    amount,
                    ..Draft::default()
                }),
                "Имя получателя (опционально). Или напишите '-' чтобы пропустить.",
            ),
            None => ask(CreateState::Amount, "Нужно число > 0. Пример: 70"),
        },
        CreateState::RecipientName(mut draft) => {
            draft.recipient_name = optional(text);
            ask(
                CreateState::DonorFirstName(draft),
                "Имя дарителя (опционально). Или '-' чтобы пропустить.",
            )
        }
        CreateState::DonorFirstName(mut draft) => {
            draft.firstname = optional(text);
            ask(
                CreateState::DonorLastName(draft),
                "Фамилия дарителя (опционально). Или '-' чтобы пропустить.",
            )
        }
        CreateState::DonorLastName(mut draft) => {
            draft.lastname = optional(text);
            ask(
                CreateState::RecipientEmail(draft),
                "Email получателя (опционально). Или '-' чтобы пропустить.",
            )
        }
        CreateState::RecipientEmail(mut draft) => {
            draft.recipient_email = optional(text);
            let reply = Outgoing::plain(draft.summary()).with_markup(delivery_keyboard());
            Step::Continue {
                next: CreateState::Delivery(draft),
                reply,
            }
        }
        CreateState::Delivery(draft) => match text {
            DELIVERY_PDF => Step::Submit(draft.into_request(false)),
            DELIVERY_EMAIL if draft.recipient_email.is_empty() => ask(
                CreateState::Delivery(draft),
                "Вы выбрали email, но email не указан. Выберите PDF в Telegram или отмените и начните заново.",
            ),
            DELIVERY_EMAIL => Step::Submit(draft.into_request(true)),
            _ => ask(CreateState::Delivery(draft), "Выберите вариант на клавиатуре."),
        },
    }
}

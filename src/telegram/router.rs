//! Input → route resolution
//!
//! Every update (slash command, inline-button callback, reply-keyboard text)
//! resolves to exactly one [`Route`] or a [`Rejection`]. Resolution is pure:
//! validation and authorization happen here, before anything touches the
//! certificate API.

use std::fmt;
use std::str::FromStr;

use strum::{EnumString, IntoStaticStr};

use super::deeplink::{self, StartTarget};
use super::render;
use crate::api::{parse_numeric, CertCode, CertRef, NewCertificate};
use crate::core::Config;

pub const USAGE_PDF: &str = "Использование: /pdf 123456 (где 123456 — код сертификата)";
pub const USAGE_SCAN: &str = "Использование: /scan 123456";
pub const USAGE_CERT: &str = "Использование: /cert 17 (где 17 — номер сертификата в магазине)";

/// Who sent the update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: i64,
    pub is_admin: bool,
}

impl Viewer {
    pub fn new(user_id: i64, config: &Config) -> Self {
        Self {
            user_id,
            is_admin: config.is_admin(user_id),
        }
    }
}

/// Operations that need the certificate API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Create(NewCertificate),
    /// Lookup by code (scan, deep link) or by id (`/cert`)
    Get(CertRef),
    ListRecent { start: u32, limit: u32 },
    SendPdf(CertRef),
    ResendEmail(CertRef),
    MarkUsed(CertRef),
    Annul(CertRef),
    Delete(CertRef),
}

/// Resolved meaning of one update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Main reply keyboard
    Menu,
    Help,
    /// Non-admin scanned a certificate: show the venue invitation
    Invitation,
    /// Spreadsheet link
    Sheet,
    StartCreate,
    CancelCreate,
    /// Ask before deleting the certificate with this code
    ConfirmDelete(CertCode),
    /// Delete declined
    KeepCertificate(CertCode),
    Remote(Action),
}

impl Route {
    pub fn requires_admin(&self) -> bool {
        !matches!(self, Route::Help | Route::Invitation | Route::CancelCreate)
    }

    /// Short text for answering the callback query that triggered this route
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            Route::KeepCertificate(_) => Some("Ок, не удаляю."),
            Route::Remote(Action::SendPdf(_)) => Some("Готовлю PDF…"),
            Route::Remote(Action::ResendEmail(_)) => Some("Отправляю email…"),
            Route::Remote(Action::MarkUsed(_)) => Some("Отмечаю как использованный…"),
            Route::Remote(Action::Annul(_)) => Some("Аннулирую…"),
            Route::Remote(Action::Delete(_)) => Some("Удаляю…"),
            _ => None,
        }
    }
}

/// Why an update was not turned into a route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Malformed argument; the message is shown as is
    Validation(&'static str),
    /// Missing argument; the message is a usage hint
    Usage(&'static str),
    /// Viewer is not an admin
    Unauthorized,
    NotUnderstood,
}

/// Callback button kinds. The wire form is `<action>:<code>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum CallbackAction {
    Pdf,
    Email,
    Use,
    Annul,
    Del,
    DelYes,
    DelNo,
}

/// Inline-button payload bound to one certificate code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackToken {
    pub action: CallbackAction,
    pub code: CertCode,
}

impl CallbackToken {
    pub fn new(action: CallbackAction, code: CertCode) -> Self {
        Self { action, code }
    }
}

impl fmt::Display for CallbackToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action: &'static str = self.action.into();
        write!(f, "{}:{}", action, self.code)
    }
}

impl FromStr for CallbackToken {
    type Err = Rejection;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let (action, code) = data.split_once(':').ok_or(Rejection::Validation("Некорректная команда."))?;
        let action = CallbackAction::from_str(action).map_err(|_| Rejection::NotUnderstood)?;
        let code = CertCode::parse(code).ok_or(Rejection::Validation("Некорректная команда."))?;
        Ok(Self { action, code })
    }
}

/// A slash command split into its name and argument string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInput<'a> {
    /// Lowercased, without the leading `/` and any `@botname` suffix
    pub name: String,
    pub args: &'a str,
}

/// Splits `/name@bot args` into parts; `None` if `text` is not a command.
pub fn parse_command(text: &str) -> Option<CommandInput<'_>> {
    let text = text.trim();
    let rest = text.strip_prefix('/')?;
    let (head, args) = match rest.split_once(char::is_whitespace) {
        Some((head, args)) => (head, args.trim()),
        None => (rest, ""),
    };
    let name = head.split('@').next().unwrap_or_default();
    if name.is_empty() {
        return None;
    }
    Some(CommandInput {
        name: name.to_lowercase(),
        args,
    })
}

/// Resolves a slash command.
pub fn route_command(text: &str, viewer: &Viewer, journal_limit: u32) -> Result<Route, Rejection> {
    let cmd = parse_command(text).ok_or(Rejection::NotUnderstood)?;

    let route = match cmd.name.as_str() {
        "start" => return route_start(cmd.args, viewer),
        "scan" => return route_scan(cmd.args, viewer),
        "help" => Route::Help,
        "cancel" => Route::CancelCreate,
        "new" => Route::StartCreate,
        "journal" => Route::Remote(Action::ListRecent {
            start: 0,
            limit: journal_limit,
        }),
        "sheet" => Route::Sheet,
        "pdf" => {
            require_admin(viewer)?;
            Route::Remote(Action::SendPdf(CertRef::Code(code_arg(cmd.args, USAGE_PDF)?)))
        }
        "cert" => {
            require_admin(viewer)?;
            Route::Remote(Action::Get(CertRef::Id(numeric_arg(cmd.args, USAGE_CERT)?)))
        }
        _ => return Err(Rejection::NotUnderstood),
    };

    authorize(route, viewer)
}

/// Resolves an inline-button callback payload.
pub fn route_callback(data: &str, viewer: &Viewer) -> Result<Route, Rejection> {
    require_admin(viewer)?;

    let token: CallbackToken = data.parse()?;
    let cert = CertRef::Code(token.code.clone());
    let route = match token.action {
        CallbackAction::Pdf => Route::Remote(Action::SendPdf(cert)),
        CallbackAction::Email => Route::Remote(Action::ResendEmail(cert)),
        CallbackAction::Use => Route::Remote(Action::MarkUsed(cert)),
        CallbackAction::Annul => Route::Remote(Action::Annul(cert)),
        CallbackAction::Del => Route::ConfirmDelete(token.code),
        CallbackAction::DelYes => Route::Remote(Action::Delete(cert)),
        CallbackAction::DelNo => Route::KeepCertificate(token.code),
    };

    authorize(route, viewer)
}

/// Resolves a reply-keyboard button press (plain text outside the create wizard).
pub fn route_menu_text(text: &str, viewer: &Viewer, journal_limit: u32) -> Result<Route, Rejection> {
    let route = match text.trim() {
        render::MENU_CREATE => Route::StartCreate,
        render::MENU_JOURNAL => Route::Remote(Action::ListRecent {
            start: 0,
            limit: journal_limit,
        }),
        render::MENU_SHEET => Route::Sheet,
        _ => return Err(Rejection::NotUnderstood),
    };

    authorize(route, viewer)
}

fn route_start(payload: &str, viewer: &Viewer) -> Result<Route, Rejection> {
    match deeplink::resolve(payload) {
        StartTarget::Lookup(code) => Ok(lookup_or_invite(code, viewer)),
        StartTarget::Menu => authorize(Route::Menu, viewer),
    }
}

fn route_scan(args: &str, viewer: &Viewer) -> Result<Route, Rejection> {
    let code = code_arg(args, USAGE_SCAN)?;
    Ok(lookup_or_invite(code, viewer))
}

fn lookup_or_invite(code: CertCode, viewer: &Viewer) -> Route {
    if viewer.is_admin {
        Route::Remote(Action::Get(CertRef::Code(code)))
    } else {
        Route::Invitation
    }
}

fn first_arg<'a>(args: &'a str, usage: &'static str) -> Result<&'a str, Rejection> {
    args.split_whitespace().next().ok_or(Rejection::Usage(usage))
}

/// Certificate code argument, leading zeros included
fn code_arg(args: &str, usage: &'static str) -> Result<CertCode, Rejection> {
    CertCode::parse(first_arg(args, usage)?).ok_or(Rejection::Validation("Нужен числовой код."))
}

fn numeric_arg(args: &str, usage: &'static str) -> Result<u64, Rejection> {
    parse_numeric(first_arg(args, usage)?).ok_or(Rejection::Validation("Нужен числовой код."))
}

fn require_admin(viewer: &Viewer) -> Result<(), Rejection> {
    if viewer.is_admin {
        Ok(())
    } else {
        Err(Rejection::Unauthorized)
    }
}

fn authorize(route: Route, viewer: &Viewer) -> Result<Route, Rejection> {
    if route.requires_admin() {
        require_admin(viewer)?;
    }
    Ok(route)
}

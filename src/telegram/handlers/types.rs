//! Handler types and dependencies

use std::sync::Arc;

use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};
use teloxide::types::User;

use crate::api::CertificateApi;
use crate::core::Config;
use crate::telegram::create::CreateState;
use crate::telegram::router::Viewer;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Per-chat state of the `/new` wizard
pub type CreateDialogue = Dialogue<CreateState, InMemStorage<CreateState>>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub api: Arc<dyn CertificateApi>,
    pub config: Arc<Config>,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(api: Arc<dyn CertificateApi>, config: Arc<Config>) -> Self {
        Self { api, config }
    }

    /// Viewer for the sender of an update; anonymous senders are never admins
    pub fn viewer(&self, user: Option<&User>) -> Viewer {
        match user.and_then(|u| i64::try_from(u.id.0).ok()) {
            Some(user_id) => Viewer::new(user_id, &self.config),
            None => Viewer {
                user_id: 0,
                is_admin: false,
            },
        }
    }
}

//! Profile screen actions.
//!
//! # Design
//! The user type is read from the session once and then kept in step by
//! `UserTypeChanged` events, so the screen never polls storage.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::events::SessionEvent;
use crate::role::Role;
use crate::services::{Api, ProfileService};
use crate::session::Session;

/// Profile screen actions and the user type they are shown for.
pub struct ProfileActions {
    profile: ProfileService,
    session: Arc<Session>,
    user_type: RwLock<Role>,
}

impl ProfileActions {
    pub fn new(api: Api) -> Self {
        let session = api.session().clone();
        let actions = Self {
            profile: ProfileService::new(api),
            user_type: RwLock::new(Role::Client),
            session,
        };
        actions.refresh_from_session();
        actions
    }

    pub fn user_type(&self) -> Role {
        *self.user_type.read()
    }

    /// Re-read the user type from the stored profile; client when absent.
    pub fn refresh_from_session(&self) -> Role {
        let role = self.session.role().unwrap_or_default();
        *self.user_type.write() = role;
        role
    }

    pub fn handle_event(&self, event: &SessionEvent) {
        match event {
            SessionEvent::UserTypeChanged { user_type, .. } => {
                *self.user_type.write() = *user_type;
            }
            SessionEvent::LoginSuccess => {
                *self.user_type.write() = self.session.user_type();
            }
            SessionEvent::LoggedOut => {}
        }
    }

    pub fn listen(self: &Arc<Self>, mut rx: broadcast::Receiver<SessionEvent>) -> JoinHandle<()> {
        let actions = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => actions.handle_event(&event),
                    Err(broadcast::error::RecvError::Lagged(_)) => {
                        actions.refresh_from_session();
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Revoke the token on the server if possible, then clear the session.
    ///
    /// Subscribers see `LoggedOut` followed by a `UserTypeChanged` with
    /// `logout` set.
    pub async fn logout(&self) {
        self.profile.logout_remote().await;
        *self.user_type.write() = self.session.user_type();
    }
}

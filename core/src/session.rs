//! Session context: token, cached user profile, preferences and the current
//! user type, plus the event bus that announces changes to them.
//!
//! A `Session` is created once and handed to every service and store as an
//! `Arc<Session>`. Getters degrade to "absent" when storage fails, logging
//! the failure.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::{ClientConfig, MAX_SEARCH_RADIUS_KM};
use crate::events::{EventBus, SessionEvent};
use crate::role::Role;
use crate::storage::{
    KeyValueStore, StorageError, KEY_APP_CONFIG, KEY_LOGGED_IN, KEY_SEARCH_RADIUS, KEY_TOKEN,
    KEY_USER_INFO,
};
use crate::types::UserInfo;

pub struct Session {
    store: Arc<dyn KeyValueStore>,
    events: EventBus,
    user_type: RwLock<Role>,
    default_search_radius_km: u32,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_type", &*self.user_type.read())
            .field("default_search_radius_km", &self.default_search_radius_km)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(store: Arc<dyn KeyValueStore>, events: EventBus, config: &ClientConfig) -> Self {
        let session = Self {
            store,
            events,
            user_type: RwLock::new(Role::Client),
            default_search_radius_km: config.default_search_radius_km,
        };
        if let Some(info) = session.user_info() {
            *session.user_type.write() = info.role();
        }
        session
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    fn read(&self, key: &str) -> Option<String> {
        self.store.get(key).unwrap_or_else(|e| {
            tracing::warn!(key, error = %e, "failed to read preference");
            None
        })
    }

    fn remove(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            tracing::warn!(key, error = %e, "failed to remove preference");
        }
    }

    // --- token ---

    pub fn token(&self) -> Option<String> {
        self.read(KEY_TOKEN).filter(|t| !t.is_empty())
    }

    pub fn set_token(&self, token: &str) -> Result<(), StorageError> {
        self.store.set(KEY_TOKEN, token)
    }

    pub fn is_logged_in(&self) -> bool {
        self.token().is_some()
    }

    // --- user info ---

    pub fn try_user_info(&self) -> Result<Option<UserInfo>, StorageError> {
        match self.store.get(KEY_USER_INFO)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn user_info(&self) -> Option<UserInfo> {
        self.try_user_info().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to read cached user info");
            None
        })
    }

    pub fn set_user_info(&self, info: &UserInfo) -> Result<(), StorageError> {
        let raw = serde_json::to_string(info)?;
        self.store.set(KEY_USER_INFO, &raw)
    }

    pub fn user_id(&self) -> Option<u64> {
        self.user_info().and_then(|info| info.id)
    }

    /// Role of the stored user, `None` when nobody is stored.
    pub fn role(&self) -> Option<Role> {
        self.user_info().map(|info| info.role())
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.user_info().is_some_and(|info| info.has_role(role))
    }

    // --- preferences ---

    pub fn app_config(&self) -> Option<serde_json::Value> {
        let raw = self.read(KEY_APP_CONFIG)?;
        serde_json::from_str(&raw)
            .map_err(|e| tracing::warn!(error = %e, "stored app config is not valid JSON"))
            .ok()
    }

    pub fn set_app_config(&self, config: &serde_json::Value) -> Result<(), StorageError> {
        self.store.set(KEY_APP_CONFIG, &serde_json::to_string(config)?)
    }

    /// Saved search radius in km; the configured default when unset or invalid.
    pub fn search_radius(&self) -> u32 {
        self.read(KEY_SEARCH_RADIUS)
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .filter(|km| *km > 0)
            .unwrap_or(self.default_search_radius_km)
    }

    /// Radii outside `1..=100` are ignored. Returns whether it was stored.
    pub fn set_search_radius(&self, km: u32) -> Result<bool, StorageError> {
        if !(1..=MAX_SEARCH_RADIUS_KM).contains(&km) {
            tracing::debug!(km, "ignoring out-of-range search radius");
            return Ok(false);
        }
        self.store.set(KEY_SEARCH_RADIUS, &km.to_string())?;
        Ok(true)
    }

    // --- lifecycle ---

    /// Current user type signal.
    pub fn user_type(&self) -> Role {
        *self.user_type.read()
    }

    /// Recompute the user type from storage and announce it.
    pub fn refresh_user_type(&self) -> Role {
        let (role, event) = match self.try_user_info() {
            Ok(Some(info)) => {
                let role = info.role();
                (
                    role,
                    SessionEvent::UserTypeChanged {
                        user_type: role,
                        logout: false,
                        error: false,
                    },
                )
            }
            Ok(None) => (
                Role::Client,
                SessionEvent::UserTypeChanged {
                    user_type: Role::Client,
                    logout: true,
                    error: false,
                },
            ),
            Err(e) => {
                tracing::warn!(error = %e, "failed to resolve user type");
                (
                    Role::Client,
                    SessionEvent::UserTypeChanged {
                        user_type: Role::Client,
                        logout: false,
                        error: true,
                    },
                )
            }
        };
        *self.user_type.write() = role;
        self.events.publish(event);
        role
    }

    /// Persist a fresh login and announce it with `LoginSuccess`.
    ///
    /// The event goes out after the token and profile are stored, so
    /// listeners may reload straight away.
    pub fn complete_login(&self, token: &str, info: &UserInfo) -> Result<Role, StorageError> {
        self.set_token(token)?;
        self.set_user_info(info)?;
        self.store.set(KEY_LOGGED_IN, "true")?;
        let role = info.role();
        *self.user_type.write() = role;
        tracing::info!(user_id = ?info.id, %role, "login completed");
        self.events.publish(SessionEvent::LoginSuccess);
        Ok(role)
    }

    /// Clear local session data without announcing it.
    pub fn logout(&self) {
        for key in [KEY_TOKEN, KEY_USER_INFO, KEY_LOGGED_IN, KEY_SEARCH_RADIUS] {
            self.remove(key);
        }
        tracing::info!("session cleared");
    }

    /// Clear local session data, publish `LoggedOut`, then refresh the
    /// user type.
    pub fn sign_out(&self) {
        self.logout();
        self.events.publish(SessionEvent::LoggedOut);
        self.refresh_user_type();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn session() -> Session {
        Session::new(
            Arc::new(MemoryStore::new()),
            EventBus::new(),
            &ClientConfig::default(),
        )
    }

    fn user(id: u64, roles: &[&str]) -> UserInfo {
        UserInfo {
            id: Some(id),
            first_name: "Ana".into(),
            last_name: "Mora".into(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            ..UserInfo::default()
        }
    }

    #[test]
    fn empty_session() {
        let s = session();
        assert!(s.token().is_none());
        assert!(!s.is_logged_in());
        assert!(s.user_info().is_none());
        assert!(s.role().is_none());
        assert_eq!(s.user_type(), Role::Client);
    }

    #[test]
    fn empty_token_is_not_logged_in() {
        let s = session();
        s.set_token("").unwrap();
        assert!(!s.is_logged_in());
    }

    #[tokio::test]
    async fn complete_login_persists_then_publishes() {
        let s = session();
        let mut rx = s.events().subscribe();
        let role = s.complete_login("tok", &user(5, &["Provider"])).unwrap();

        assert_eq!(role, Role::Provider);
        assert_eq!(s.user_type(), Role::Provider);
        assert_eq!(s.token().as_deref(), Some("tok"));
        assert_eq!(s.user_id(), Some(5));
        assert_eq!(rx.recv().await.unwrap(), SessionEvent::LoginSuccess);
    }

    #[tokio::test]
    async fn sign_out_clears_and_announces() {
        let s = session();
        s.complete_login("tok", &user(5, &["Admin"])).unwrap();
        s.set_search_radius(50).unwrap();
        let mut rx = s.events().subscribe();

        s.sign_out();

        assert!(s.token().is_none());
        assert!(s.user_info().is_none());
        assert_eq!(s.search_radius(), 30);
        assert_eq!(rx.recv().await.unwrap(), SessionEvent::LoggedOut);
        assert_eq!(
            rx.recv().await.unwrap(),
            SessionEvent::UserTypeChanged {
                user_type: Role::Client,
                logout: true,
                error: false
            }
        );
    }

    #[test]
    fn corrupt_user_info_flags_error() {
        let s = session();
        s.store().set(KEY_USER_INFO, "{broken").unwrap();
        let mut rx = s.events().subscribe();
        assert!(s.user_info().is_none());
        assert_eq!(s.refresh_user_type(), Role::Client);
        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::UserTypeChanged {
                user_type: Role::Client,
                logout: false,
                error: true
            }
        );
    }

    #[test]
    fn search_radius_bounds() {
        let s = session();
        assert_eq!(s.search_radius(), 30);
        assert!(s.set_search_radius(45).unwrap());
        assert_eq!(s.search_radius(), 45);
        assert!(!s.set_search_radius(0).unwrap());
        assert!(!s.set_search_radius(101).unwrap());
        assert_eq!(s.search_radius(), 45);

        s.store().set(KEY_SEARCH_RADIUS, "far").unwrap();
        assert_eq!(s.search_radius(), 30);

        // reads only reject unparsable or zero values
        s.store().set(KEY_SEARCH_RADIUS, "150").unwrap();
        assert_eq!(s.search_radius(), 150);
        s.store().set(KEY_SEARCH_RADIUS, "0").unwrap();
        assert_eq!(s.search_radius(), 30);
    }

    #[test]
    fn app_config_roundtrip() {
        let s = session();
        assert!(s.app_config().is_none());
        let config = serde_json::json!({"theme": "dark", "notifications": true});
        s.set_app_config(&config).unwrap();
        assert_eq!(s.app_config().unwrap(), config);
    }

    #[test]
    fn user_type_is_restored_from_storage() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store
            .set(KEY_USER_INFO, r#"{"id":3,"roles":["Client","Admin"]}"#)
            .unwrap();
        let s = Session::new(store, EventBus::new(), &ClientConfig::default());
        assert_eq!(s.user_type(), Role::Admin);
        assert!(s.has_role("Admin"));
    }
}

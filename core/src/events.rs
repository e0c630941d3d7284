//! Typed in-process session event channel.
//!
//! Every subscriber receives every event published after it subscribed, in
//! publish order. Events are published only once the state change they
//! announce has been persisted, so a listener can act on them immediately.

use tokio::sync::broadcast;

use crate::role::Role;

const CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedOut,
    /// The resolved user type was recomputed. `logout` is set when no user
    /// is stored, `error` when the stored user could not be read.
    UserTypeChanged {
        user_type: Role,
        logout: bool,
        error: bool,
    },
    LoginSuccess,
}

impl SessionEvent {
    /// A user type change that names a real, readable user.
    pub fn is_valid_user_change(&self) -> bool {
        matches!(
            self,
            SessionEvent::UserTypeChanged {
                logout: false,
                error: false,
                ..
            }
        )
    }
}

#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Returns the number of subscribers the event reached.
    pub fn publish(&self, event: SessionEvent) -> usize {
        tracing::debug!(?event, "publishing session event");
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_in_publish_order_to_every_subscriber() {
        let bus = EventBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.publish(SessionEvent::LoginSuccess);
        bus.publish(SessionEvent::LoggedOut);

        for rx in [&mut a, &mut b] {
            assert_eq!(rx.recv().await.unwrap(), SessionEvent::LoginSuccess);
            assert_eq!(rx.recv().await.unwrap(), SessionEvent::LoggedOut);
        }
    }

    #[test]
    fn publish_without_subscribers_is_harmless() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(SessionEvent::LoggedOut), 0);
    }

    #[test]
    fn valid_user_change() {
        let ok = SessionEvent::UserTypeChanged {
            user_type: Role::Provider,
            logout: false,
            error: false,
        };
        let logout = SessionEvent::UserTypeChanged {
            user_type: Role::Client,
            logout: true,
            error: false,
        };
        assert!(ok.is_valid_user_change());
        assert!(!logout.is_valid_user_change());
        assert!(!SessionEvent::LoginSuccess.is_valid_user_change());
    }
}

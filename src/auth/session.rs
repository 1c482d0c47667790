use serde::Serialize;
use tokio::sync::watch;
use uuid::Uuid;

/// Who the current session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UserIdentity {
    pub id: Uuid,
}

impl From<Uuid> for UserIdentity {
    fn from(id: Uuid) -> Self {
        Self { id }
    }
}

/// Publishes sign-in / sign-out transitions to whoever subscribed.
///
/// Subscribers see the current value first and then every change after it;
/// dropping the receiver is the unsubscribe.
#[derive(Debug)]
pub struct SessionNotifier {
    tx: watch::Sender<Option<UserIdentity>>,
}

impl SessionNotifier {
    pub fn new(initial: Option<UserIdentity>) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<UserIdentity>> {
        self.tx.subscribe()
    }

    #[cfg(test)]
    pub fn current(&self) -> Option<UserIdentity> {
        *self.tx.borrow()
    }

    /// Returns true when the session actually changed.
    pub fn publish(&self, session: Option<UserIdentity>) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == session {
                return false;
            }
            *current = session;
            true
        })
    }
}

impl Default for SessionNotifier {
    fn default() -> Self {
        Self::new(None)
    }
}

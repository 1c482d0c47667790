use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Weak,
    },
    time::Duration,
};

use tokio::{
    sync::{Mutex, OwnedMutexGuard, RwLock},
    task::JoinHandle,
    time::Instant,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    guest::GuestSlotFactory,
    model::CartSnapshot,
    repo::SessionStore,
    sync::{CartSubscription, CartSynchronizer},
};
use crate::auth::session::{SessionNotifier, UserIdentity};

const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// One browser's cart: its auth notifier, the synchronizer following it and
/// the subscription tying them together.
pub struct ClientCart {
    pub notifier: SessionNotifier,
    pub sync: Arc<CartSynchronizer>,
    turn: Arc<Mutex<()>>,
    last_seen_ms: AtomicU64,
    _subscription: CartSubscription,
}

/// Exclusive use of a client's cart for one request. Requests from the same
/// browser run one after another, each under its own auth.
pub struct CartTurn {
    pub snapshot: CartSnapshot,
    _guard: OwnedMutexGuard<()>,
}

impl ClientCart {
    /// Wait for this client's turn, publish the caller's auth and bring the
    /// cart in line with it. `None` if that took too long.
    pub async fn attach(&self, user: Option<UserIdentity>) -> Option<CartTurn> {
        let settle = async {
            let guard = Arc::clone(&self.turn).lock_owned().await;
            if self.notifier.publish(user) {
                debug!(user_id = ?user.map(|u| u.id), "client session changed");
            }
            let snapshot = self.sync.ensure_session(user).await;
            CartTurn {
                snapshot,
                _guard: guard,
            }
        };
        match tokio::time::timeout(SETTLE_TIMEOUT, settle).await {
            Ok(turn) => Some(turn),
            Err(_) => {
                warn!(user_id = ?user.map(|u| u.id), "cart did not settle in time");
                None
            }
        }
    }
}

/// Carts keyed by client session id. Clients idle for longer than
/// `idle_timeout` are dropped by [`CartSessions::sweep`].
pub struct CartSessions {
    store: Arc<dyn SessionStore>,
    guest_slots: Arc<GuestSlotFactory>,
    clients: RwLock<HashMap<Uuid, Arc<ClientCart>>>,
    epoch: Instant,
    idle_timeout: Duration,
}

impl CartSessions {
    pub fn new(
        store: Arc<dyn SessionStore>,
        guest_slots: Arc<GuestSlotFactory>,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            store,
            guest_slots,
            clients: RwLock::new(HashMap::new()),
            epoch: Instant::now(),
            idle_timeout,
        }
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    pub async fn get_or_create(&self, client_id: Uuid) -> Arc<ClientCart> {
        let now = self.now_ms();
        if let Some(client) = self.clients.read().await.get(&client_id) {
            client.last_seen_ms.store(now, Ordering::Relaxed);
            return Arc::clone(client);
        }

        let mut clients = self.clients.write().await;
        let client = clients.entry(client_id).or_insert_with(|| {
            info!(%client_id, "cart session opened");
            let sync = Arc::new(CartSynchronizer::new(
                Arc::clone(&self.store),
                (self.guest_slots)(client_id),
            ));
            let notifier = SessionNotifier::default();
            let subscription = sync.initialize(&notifier);
            Arc::new(ClientCart {
                notifier,
                sync,
                turn: Arc::new(Mutex::new(())),
                last_seen_ms: AtomicU64::new(now),
                _subscription: subscription,
            })
        });
        client.last_seen_ms.store(now, Ordering::Relaxed);
        Arc::clone(client)
    }

    /// Forget a client. Its synchronizer stops following auth changes once
    /// the last in-flight request lets go of it.
    pub async fn close(&self, client_id: Uuid) -> bool {
        let removed = self.clients.write().await.remove(&client_id).is_some();
        if removed {
            info!(%client_id, "cart session closed");
        }
        removed
    }

    /// Drop clients untouched for longer than the idle timeout and not in use
    /// by a request. Returns how many went.
    pub async fn sweep(&self) -> usize {
        let idle_ms = self.idle_timeout.as_millis() as u64;
        let now = self.now_ms();
        let mut clients = self.clients.write().await;
        let before = clients.len();
        clients.retain(|_, client| {
            Arc::strong_count(client) > 1
                || now.saturating_sub(client.last_seen_ms.load(Ordering::Relaxed)) < idle_ms
        });
        let evicted = before - clients.len();
        if evicted > 0 {
            info!(evicted, remaining = clients.len(), "idle cart sessions dropped");
        }
        evicted
    }

    /// Sweep on a fixed interval for as long as the registry is alive.
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let sessions: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticks = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                ticks.tick().await;
                let Some(sessions) = sessions.upgrade() else {
                    break;
                };
                sessions.sweep().await;
            }
        })
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::{
        cart::{
            guest::{memory::MemoryGuestSlot, GuestSlot},
            repo::memory::MemorySessionStore,
        },
        menu::CatalogItem,
    };

    fn sessions_with_idle(idle: Duration) -> (CartSessions, Arc<MemorySessionStore>) {
        let store = Arc::new(MemorySessionStore::default());
        let factory: Arc<GuestSlotFactory> =
            Arc::new(|_: Uuid| -> Box<dyn GuestSlot> { Box::new(MemoryGuestSlot::default()) });
        (CartSessions::new(store.clone(), factory, idle), store)
    }

    fn sessions() -> (CartSessions, Arc<MemorySessionStore>) {
        sessions_with_idle(Duration::from_secs(1800))
    }

    fn spring_rolls() -> CatalogItem {
        CatalogItem {
            id: 1,
            category: "Appetizers".into(),
            name: "Crispy Spring Rolls".into(),
            description: String::new(),
            price: Decimal::new(699, 2),
            image: "/menu-images/crispy-spring-rolls.jpg".into(),
            is_meat: false,
            allergens: vec![],
        }
    }

    #[tokio::test]
    async fn same_client_gets_same_cart() {
        let (sessions, _) = sessions();
        let id = Uuid::new_v4();
        let a = sessions.get_or_create(id).await;
        let b = sessions.get_or_create(id).await;
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(sessions.len().await, 1);

        sessions.get_or_create(Uuid::new_v4()).await;
        assert_eq!(sessions.len().await, 2);
    }

    #[tokio::test]
    async fn attach_switches_between_guest_and_session() {
        let (sessions, store) = sessions();
        let client = sessions.get_or_create(Uuid::new_v4()).await;

        let guest = client.attach(None).await.expect("settles").snapshot;
        assert_eq!(guest.user_id, None);
        client.sync.add_item(Some(&spring_rolls()), 1).await;

        let user = UserIdentity::from(Uuid::new_v4());
        let signed_in = client.attach(Some(user)).await.expect("settles").snapshot;
        assert_eq!(signed_in.user_id, Some(user.id));
        assert!(signed_in.items.is_empty());

        client.sync.add_item(Some(&spring_rolls()), 2).await;
        assert_eq!(store.rows_for(user.id)[0].quantity, 2);

        let back = client.attach(None).await.expect("settles").snapshot;
        assert_eq!(back.user_id, None);
        assert!(back.items.is_empty());
    }

    #[tokio::test]
    async fn close_forgets_client() {
        let (sessions, _) = sessions();
        let id = Uuid::new_v4();
        sessions.get_or_create(id).await;
        assert!(sessions.close(id).await);
        assert!(!sessions.close(id).await);
        assert_eq!(sessions.len().await, 0);
    }

    #[tokio::test]
    async fn overlapping_requests_with_opposite_auth_both_settle() {
        let (sessions, _) = sessions();
        let client = sessions.get_or_create(Uuid::new_v4()).await;
        let user = UserIdentity::from(Uuid::new_v4());

        let started = Instant::now();
        let signed_in = {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.attach(Some(user)).await.map(|t| t.snapshot) })
        };
        let guest = {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.attach(None).await.map(|t| t.snapshot) })
        };

        let signed_in = signed_in.await.unwrap().expect("signed-in request settles");
        let guest = guest.await.unwrap().expect("guest request settles");
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(signed_in.user_id, Some(user.id));
        assert_eq!(guest.user_id, None);
    }

    #[tokio::test]
    async fn requests_from_one_client_take_turns() {
        let (sessions, store) = sessions();
        let client = sessions.get_or_create(Uuid::new_v4()).await;
        let user = UserIdentity::from(Uuid::new_v4());

        let turn = client.attach(Some(user)).await.expect("settles");
        let guest = {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.attach(None).await.map(|t| t.snapshot) })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Still signed in while the first request holds its turn.
        client.sync.add_item(Some(&spring_rolls()), 1).await;
        assert_eq!(store.rows_for(user.id).len(), 1);
        drop(turn);

        assert_eq!(guest.await.unwrap().expect("settles").user_id, None);
    }

    #[tokio::test]
    async fn sweep_drops_idle_clients_not_in_use() {
        let (sessions, _) = sessions_with_idle(Duration::ZERO);
        for _ in 0..200 {
            let client = sessions.get_or_create(Uuid::new_v4()).await;
            client.attach(None).await.expect("settles");
        }
        let busy = sessions.get_or_create(Uuid::new_v4()).await;
        assert_eq!(sessions.len().await, 201);

        assert_eq!(sessions.sweep().await, 200);
        assert_eq!(sessions.len().await, 1);
        drop(busy);
        assert_eq!(sessions.sweep().await, 1);
        assert_eq!(sessions.len().await, 0);
    }

    #[tokio::test]
    async fn sweep_keeps_recent_clients() {
        let (sessions, _) = sessions();
        sessions.get_or_create(Uuid::new_v4()).await;
        assert_eq!(sessions.sweep().await, 0);
        assert_eq!(sessions.len().await, 1);
    }
}

//! Cart state for one client, reconciled against either the guest slot or the
//! session store depending on who is signed in.
//!
//! Exactly one backend is the source of truth at a time. Signing in reloads
//! from the session store and drops the guest slot without merging it.
//! Every operation runs under the cart lock for its full duration, store
//! round-trip included, so two overlapping changes to the same line cannot
//! both read the old quantity.

use std::{future::Future, sync::Arc};

use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use super::{
    guest::GuestSlot,
    model::{decode_guest_cart, encode_guest_cart, CartSnapshot, LineItem, NewCartRow, Outcome},
    repo::SessionStore,
};
use crate::{
    auth::session::{SessionNotifier, UserIdentity},
    menu::CatalogItem,
};

#[derive(Debug, Default)]
struct CartState {
    items: Vec<LineItem>,
    active_user: Option<UserIdentity>,
    is_loading: bool,
}

impl CartState {
    fn position(&self, item_id: i64) -> Option<usize> {
        self.items.iter().position(|item| item.item_id() == item_id)
    }

    fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            user_id: self.active_user.map(|u| u.id),
            items: self.items.clone(),
            is_loading: self.is_loading,
        }
    }
}

pub struct CartSynchronizer {
    state: Mutex<CartState>,
    snapshots: watch::Sender<CartSnapshot>,
    store: Arc<dyn SessionStore>,
    guest: Box<dyn GuestSlot>,
}

/// Keeps a synchronizer following a [`SessionNotifier`]. Dropping it
/// unsubscribes.
#[derive(Debug)]
pub struct CartSubscription {
    task: JoinHandle<()>,
}

impl Drop for CartSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl CartSynchronizer {
    pub fn new(store: Arc<dyn SessionStore>, guest: Box<dyn GuestSlot>) -> Self {
        let state = CartState {
            is_loading: true,
            ..CartState::default()
        };
        let (snapshots, _rx) = watch::channel(state.snapshot());
        Self {
            state: Mutex::new(state),
            snapshots,
            store,
            guest,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> CartSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Follow `notifier`: apply its current session now and every change after.
    pub fn initialize(self: &Arc<Self>, notifier: &SessionNotifier) -> CartSubscription {
        let mut rx = notifier.subscribe();
        let this = Arc::clone(self);
        let task = tokio::spawn(async move {
            loop {
                let _ = rx.borrow_and_update();
                this.follow(&rx).await;
                if rx.changed().await.is_err() {
                    debug!("session notifier dropped; cart stops following");
                    break;
                }
            }
        });
        CartSubscription { task }
    }

    /// Switch to `user` under the cart lock unless the cart already shows it,
    /// then return what the cart holds.
    pub async fn ensure_session(&self, user: Option<UserIdentity>) -> CartSnapshot {
        let mut st = self.state.lock().await;
        if st.active_user != user || st.is_loading {
            self.switch_locked(&mut st, user).await;
        }
        st.snapshot()
    }

    /// Catch up with the newest value on `rx`, read once the cart lock is held
    /// so an older value can never land after a newer one.
    async fn follow(&self, rx: &watch::Receiver<Option<UserIdentity>>) {
        let mut st = self.state.lock().await;
        let user = *rx.borrow();
        if st.active_user != user || st.is_loading {
            self.switch_locked(&mut st, user).await;
        }
    }

    #[cfg(test)]
    pub async fn apply_session(&self, user: Option<UserIdentity>) {
        let mut st = self.state.lock().await;
        self.switch_locked(&mut st, user).await;
    }

    async fn switch_locked(&self, st: &mut CartState, user: Option<UserIdentity>) {
        if st.active_user != user {
            info!(
                from = ?st.active_user.map(|u| u.id),
                to = ?user.map(|u| u.id),
                "cart session changed"
            );
        }
        st.active_user = user;
        self.reload_locked(st).await;
    }

    pub async fn reload(&self) {
        let mut st = self.state.lock().await;
        self.reload_locked(&mut st).await;
    }

    async fn reload_locked(&self, st: &mut CartState) {
        st.is_loading = true;
        self.publish(st);

        match st.active_user {
            Some(user) => {
                st.items = match self.store.select_rows(user.id).await {
                    Ok(rows) => rows.into_iter().map(LineItem::from).collect(),
                    Err(e) => {
                        error!(error = %e, user_id = %user.id, "fetch user cart failed");
                        Vec::new()
                    }
                };
                // The session store is authoritative now.
                self.guest.remove();
            }
            None => {
                let raw = self.guest.read();
                st.items = decode_guest_cart(raw.as_deref()).unwrap_or_else(|e| {
                    warn!(error = %e, "guest cart unreadable; starting empty");
                    Vec::new()
                });
                if raw.is_none() && st.items.is_empty() {
                    // Nothing to keep; leave no slot behind.
                    st.is_loading = false;
                    debug!("guest cart empty");
                    self.publish(st);
                    return;
                }
            }
        }

        st.is_loading = false;
        debug!(items = st.items.len(), signed_in = st.active_user.is_some(), "cart loaded");
        self.commit(st);
    }

    pub async fn add_item(&self, item: Option<&CatalogItem>, quantity: i32) -> Outcome {
        let Some(item) = item.filter(|item| item.id > 0) else {
            warn!("add to cart without a catalog id; ignored");
            return Outcome::Skipped;
        };
        if quantity < 1 {
            warn!(item_id = item.id, quantity, "add to cart with non-positive quantity; ignored");
            return Outcome::Skipped;
        }

        let mut st = self.state.lock().await;
        let existing = st.position(item.id);

        let Some(user) = st.active_user else {
            match existing {
                Some(idx) => {
                    let line = &mut st.items[idx];
                    line.quantity = line.quantity.saturating_add(quantity);
                }
                None => st.items.push(LineItem::from_catalog(item, quantity)),
            }
            self.commit(&st);
            return Outcome::Applied;
        };

        match existing {
            Some(idx) => {
                let line = &st.items[idx];
                let Some(row_id) = line.key.row_id else {
                    warn!(item_id = item.id, "session line without row id; ignored");
                    return Outcome::Skipped;
                };
                let new_quantity = line.quantity.saturating_add(quantity);
                if let Err(e) = self.store.update_quantity(user.id, row_id, new_quantity).await {
                    error!(error = %e, user_id = %user.id, item_id = item.id, "update cart quantity failed");
                    return Outcome::WriteFailed;
                }
                st.items[idx].quantity = new_quantity;
            }
            None => {
                let row = NewCartRow::from_catalog(user.id, item, quantity);
                match self.store.insert_row(row).await {
                    Ok(row) => st.items.push(LineItem::from(row)),
                    Err(e) => {
                        error!(error = %e, user_id = %user.id, item_id = item.id, "add cart item failed");
                        return Outcome::WriteFailed;
                    }
                }
            }
        }
        self.commit(&st);
        Outcome::Applied
    }

    /// A quantity below 1 removes the line.
    pub async fn set_quantity(&self, item_id: i64, quantity: i32) -> Outcome {
        let mut st = self.state.lock().await;
        if quantity < 1 {
            return self.remove_locked(&mut st, item_id).await;
        }
        let Some(idx) = st.position(item_id) else {
            debug!(item_id, "quantity change for item not in cart");
            return Outcome::Skipped;
        };

        if let Some(user) = st.active_user {
            let Some(row_id) = st.items[idx].key.row_id else {
                warn!(item_id, "session line without row id; ignored");
                return Outcome::Skipped;
            };
            if let Err(e) = self.store.update_quantity(user.id, row_id, quantity).await {
                error!(error = %e, user_id = %user.id, item_id, "update quantity failed");
                return Outcome::WriteFailed;
            }
        }

        st.items[idx].quantity = quantity;
        self.commit(&st);
        Outcome::Applied
    }

    pub async fn remove_item(&self, item_id: i64) -> Outcome {
        let mut st = self.state.lock().await;
        self.remove_locked(&mut st, item_id).await
    }

    async fn remove_locked(&self, st: &mut CartState, item_id: i64) -> Outcome {
        let Some(idx) = st.position(item_id) else {
            debug!(item_id, "remove for item not in cart");
            return Outcome::Skipped;
        };

        if let Some(user) = st.active_user {
            let Some(row_id) = st.items[idx].key.row_id else {
                warn!(item_id, "session line without row id; ignored");
                return Outcome::Skipped;
            };
            if let Err(e) = self.store.delete_row(user.id, row_id).await {
                error!(error = %e, user_id = %user.id, item_id, "remove cart item failed");
                return Outcome::WriteFailed;
            }
        }

        st.items.remove(idx);
        self.commit(st);
        Outcome::Applied
    }

    pub async fn clear_cart(&self) -> Outcome {
        let mut st = self.state.lock().await;
        self.clear_locked(&mut st).await
    }

    /// Hand the current lines to `place` and empty the cart once it succeeds,
    /// all under one hold of the cart lock. Nothing added meanwhile is lost.
    pub async fn check_out<F, Fut, T, E>(&self, place: F) -> Result<(T, Outcome), E>
    where
        F: FnOnce(Vec<LineItem>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut st = self.state.lock().await;
        let placed = place(st.items.clone()).await?;
        let cleared = self.clear_locked(&mut st).await;
        Ok((placed, cleared))
    }

    async fn clear_locked(&self, st: &mut CartState) -> Outcome {
        if let Some(user) = st.active_user {
            if let Err(e) = self.store.delete_all(user.id).await {
                error!(error = %e, user_id = %user.id, "clear cart failed");
                return Outcome::WriteFailed;
            }
        }
        st.items.clear();
        self.commit(st);
        Outcome::Applied
    }

    /// Persist guest carts locally, then tell observers.
    fn commit(&self, st: &CartState) {
        if st.active_user.is_none() {
            self.guest.write(&encode_guest_cart(&st.items));
        }
        self.publish(st);
    }

    fn publish(&self, st: &CartState) {
        self.snapshots.send_replace(st.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rust_decimal::Decimal;
    use tokio::task::JoinSet;
    use uuid::Uuid;

    use super::*;
    use crate::cart::{
        guest::memory::MemoryGuestSlot,
        model::{CartKey, CartScope, CartTotals},
        repo::memory::MemorySessionStore,
    };

    fn dish(id: i64, cents: i64) -> CatalogItem {
        CatalogItem {
            id,
            category: "Main Dishes".into(),
            name: format!("dish {id}"),
            description: String::new(),
            price: Decimal::new(cents, 2),
            image: format!("/menu-images/{id}.jpg"),
            is_meat: false,
            allergens: Vec::new(),
        }
    }

    struct Fixture {
        sync: Arc<CartSynchronizer>,
        store: Arc<MemorySessionStore>,
        slot: MemoryGuestSlot,
    }

    async fn fixture(user: Option<UserIdentity>, slot: MemoryGuestSlot) -> Fixture {
        let store = Arc::new(MemorySessionStore::default());
        let sync = Arc::new(CartSynchronizer::new(store.clone(), Box::new(slot.clone())));
        sync.apply_session(user).await;
        Fixture { sync, store, slot }
    }

    fn user() -> UserIdentity {
        UserIdentity::from(Uuid::new_v4())
    }

    async fn settled(sync: &CartSynchronizer, user: Option<UserIdentity>) -> CartSnapshot {
        let want = user.map(|u| u.id);
        let mut rx = sync.subscribe();
        let snapshot = rx
            .wait_for(|s| s.user_id == want && !s.is_loading)
            .await
            .expect("sender lives in sync")
            .clone();
        snapshot
    }

    fn quantities(snapshot: &CartSnapshot) -> Vec<(i64, i32)> {
        snapshot.items.iter().map(|i| (i.item_id(), i.quantity)).collect()
    }

    #[tokio::test]
    async fn starts_loading_until_first_session() {
        let store = Arc::new(MemorySessionStore::default());
        let sync = CartSynchronizer::new(store, Box::new(MemoryGuestSlot::default()));
        assert!(sync.snapshot().is_loading);
        sync.reload().await;
        assert!(!sync.snapshot().is_loading);
    }

    #[tokio::test]
    async fn guest_adding_same_item_twice_bumps_quantity() {
        let f = fixture(None, MemoryGuestSlot::default()).await;
        let item = dish(1, 1000);

        assert_eq!(f.sync.add_item(Some(&item), 1).await, Outcome::Applied);
        assert_eq!(f.sync.add_item(Some(&item), 1).await, Outcome::Applied);

        let snap = f.sync.snapshot();
        assert_eq!(quantities(&snap), vec![(1, 2)]);
        assert_eq!(snap.items[0].key, CartKey::guest(1));

        let totals = CartTotals::compute(&snap.items, Decimal::new(13, 2));
        assert_eq!(totals.subtotal, Decimal::new(2000, 2));
        assert_eq!(totals.tax, Decimal::new(260, 2));
        assert_eq!(totals.total, Decimal::new(2260, 2));
    }

    #[tokio::test]
    async fn distinct_adds_make_one_line_each() {
        for signed_in in [false, true] {
            let f = fixture(signed_in.then(user), MemoryGuestSlot::default()).await;
            for id in [3, 1, 3, 2, 3, 1] {
                f.sync.add_item(Some(&dish(id, 500)), 1).await;
            }
            assert_eq!(quantities(&f.sync.snapshot()), vec![(3, 3), (1, 2), (2, 1)]);
        }
    }

    #[tokio::test]
    async fn guest_changes_are_written_to_the_slot() {
        let f = fixture(None, MemoryGuestSlot::default()).await;
        f.sync.add_item(Some(&dish(5, 599)), 2).await;

        let saved = decode_guest_cart(f.slot.contents().as_deref()).unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].quantity, 2);

        f.sync.clear_cart().await;
        assert_eq!(f.slot.contents().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn guest_reload_reads_slot_and_tolerates_garbage() {
        let raw = r#"[{"id":9,"item_id":9,"name":"Mapo Tofu","price":13.5,"image":"/m.jpg","quantity":1}]"#;
        let f = fixture(None, MemoryGuestSlot::with(raw)).await;
        assert_eq!(quantities(&f.sync.snapshot()), vec![(9, 1)]);

        let f = fixture(None, MemoryGuestSlot::with("{{{")).await;
        assert!(f.sync.snapshot().items.is_empty());
        assert!(!f.sync.snapshot().is_loading);
    }

    #[tokio::test]
    async fn add_without_catalog_item_or_with_bad_quantity_is_ignored() {
        let f = fixture(None, MemoryGuestSlot::default()).await;
        assert_eq!(f.sync.add_item(None, 1).await, Outcome::Skipped);
        assert_eq!(f.sync.add_item(Some(&dish(0, 100)), 1).await, Outcome::Skipped);
        assert_eq!(f.sync.add_item(Some(&dish(4, 100)), 0).await, Outcome::Skipped);
        assert!(f.sync.snapshot().items.is_empty());
    }

    #[tokio::test]
    async fn set_quantity_zero_is_remove() {
        for signed_in in [false, true] {
            let a = fixture(signed_in.then(user), MemoryGuestSlot::default()).await;
            let b = fixture(signed_in.then(user), MemoryGuestSlot::default()).await;
            for f in [&a, &b] {
                f.sync.add_item(Some(&dish(1, 100)), 2).await;
                f.sync.add_item(Some(&dish(2, 100)), 1).await;
            }

            assert_eq!(a.sync.set_quantity(1, 0).await, Outcome::Applied);
            assert_eq!(b.sync.remove_item(1).await, Outcome::Applied);
            assert_eq!(quantities(&a.sync.snapshot()), quantities(&b.sync.snapshot()));
            assert_eq!(quantities(&a.sync.snapshot()), vec![(2, 1)]);
        }
    }

    #[tokio::test]
    async fn set_quantity_updates_store_for_session_cart() {
        let u = user();
        let f = fixture(Some(u), MemoryGuestSlot::default()).await;
        f.sync.add_item(Some(&dish(7, 1000)), 1).await;

        assert_eq!(f.sync.set_quantity(7, 4).await, Outcome::Applied);
        assert_eq!(f.store.rows_for(u.id)[0].quantity, 4);
        assert_eq!(f.sync.set_quantity(99, 4).await, Outcome::Skipped);
    }

    #[tokio::test]
    async fn clear_then_reload_is_empty() {
        for signed_in in [false, true] {
            let f = fixture(signed_in.then(user), MemoryGuestSlot::default()).await;
            f.sync.add_item(Some(&dish(1, 100)), 1).await;
            f.sync.add_item(Some(&dish(2, 100)), 3).await;

            assert_eq!(f.sync.clear_cart().await, Outcome::Applied);
            f.sync.reload().await;
            assert!(f.sync.snapshot().items.is_empty());
        }
    }

    #[tokio::test]
    async fn signing_in_discards_guest_cart() {
        let f = fixture(None, MemoryGuestSlot::default()).await;
        f.sync.add_item(Some(&dish(1, 1000)), 2).await;
        assert!(f.slot.contents().is_some());

        let u = user();
        f.sync.apply_session(Some(u)).await;

        let snap = f.sync.snapshot();
        assert_eq!(snap.user_id, Some(u.id));
        assert!(snap.items.is_empty());
        assert_eq!(f.slot.contents(), None);
        assert!(f.store.rows_for(u.id).is_empty());
        assert_eq!(f.store.selects.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn session_lines_carry_row_ids() {
        let u = user();
        let f = fixture(Some(u), MemoryGuestSlot::default()).await;
        f.sync.add_item(Some(&dish(3, 900)), 1).await;

        let key = f.sync.snapshot().items[0].key;
        assert_eq!(key.scope, CartScope::Session);
        assert_eq!(key.row_id, Some(f.store.rows_for(u.id)[0].id));
    }

    #[tokio::test]
    async fn failed_session_writes_leave_cart_untouched() {
        let u = user();
        let f = fixture(Some(u), MemoryGuestSlot::default()).await;
        f.sync.add_item(Some(&dish(1, 1000)), 1).await;
        let before = f.sync.snapshot();

        f.store.fail_writes(true);
        assert_eq!(f.sync.add_item(Some(&dish(2, 500)), 1).await, Outcome::WriteFailed);
        assert_eq!(f.sync.add_item(Some(&dish(1, 1000)), 1).await, Outcome::WriteFailed);
        assert_eq!(f.sync.set_quantity(1, 5).await, Outcome::WriteFailed);
        assert_eq!(f.sync.remove_item(1).await, Outcome::WriteFailed);
        assert_eq!(f.sync.clear_cart().await, Outcome::WriteFailed);

        assert_eq!(f.sync.snapshot(), before);
        assert_eq!(f.store.rows_for(u.id).len(), 1);
    }

    #[tokio::test]
    async fn failed_fetch_yields_empty_cart_and_still_drops_guest_slot() {
        let f = fixture(None, MemoryGuestSlot::default()).await;
        f.sync.add_item(Some(&dish(1, 1000)), 1).await;

        f.store.fail_reads(true);
        f.sync.apply_session(Some(user())).await;

        let snap = f.sync.snapshot();
        assert!(snap.items.is_empty());
        assert!(!snap.is_loading);
        assert_eq!(f.slot.contents(), None);
    }

    #[tokio::test]
    async fn overlapping_adds_do_not_lose_updates() {
        let u = user();
        let f = fixture(Some(u), MemoryGuestSlot::default()).await;
        let item = dish(11, 1450);
        f.sync.add_item(Some(&item), 1).await;

        let mut set = JoinSet::new();
        for _ in 0..10 {
            let sync = Arc::clone(&f.sync);
            let item = item.clone();
            set.spawn(async move { sync.add_item(Some(&item), 1).await });
        }
        while let Some(res) = set.join_next().await {
            assert_eq!(res.unwrap(), Outcome::Applied);
        }

        assert_eq!(quantities(&f.sync.snapshot()), vec![(11, 11)]);
        assert_eq!(f.store.rows_for(u.id)[0].quantity, 11);
    }

    #[tokio::test]
    async fn follows_notifier_until_unsubscribed() {
        let store = Arc::new(MemorySessionStore::default());
        let sync = Arc::new(CartSynchronizer::new(
            store.clone(),
            Box::new(MemoryGuestSlot::default()),
        ));
        let notifier = SessionNotifier::default();
        let subscription = sync.initialize(&notifier);

        settled(&sync, None).await;

        let u = user();
        notifier.publish(Some(u));
        let snap = settled(&sync, Some(u)).await;
        assert_eq!(snap.user_id, Some(u.id));
        let selects = store.selects.load(std::sync::atomic::Ordering::SeqCst);

        drop(subscription);
        notifier.publish(Some(user()));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(sync.snapshot().user_id, Some(u.id));
        assert_eq!(store.selects.load(std::sync::atomic::Ordering::SeqCst), selects);
    }

    #[tokio::test]
    async fn observers_see_each_change() {
        let f = fixture(None, MemoryGuestSlot::default()).await;
        let mut rx = f.sync.subscribe();
        let _ = rx.borrow_and_update();

        f.sync.add_item(Some(&dish(2, 300)), 1).await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(quantities(&rx.borrow_and_update()), vec![(2, 1)]);
    }

    #[tokio::test]
    async fn empty_guest_load_leaves_no_slot() {
        let f = fixture(None, MemoryGuestSlot::default()).await;
        assert!(!f.sync.snapshot().is_loading);
        assert_eq!(f.slot.contents(), None);

        let dir = std::env::temp_dir().join(format!("menucart-sync-{}", Uuid::new_v4()));
        let sync = CartSynchronizer::new(
            Arc::new(MemorySessionStore::default()),
            Box::new(crate::cart::guest::FileGuestSlot::new(&dir, Uuid::new_v4())),
        );
        sync.apply_session(None).await;
        let files = std::fs::read_dir(&dir).map(|d| d.count()).unwrap_or(0);
        assert_eq!(files, 0);

        sync.add_item(Some(&dish(3, 450)), 1).await;
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 1);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn ensure_session_switches_once() {
        let f = fixture(None, MemoryGuestSlot::default()).await;
        let u = user();

        let snap = f.sync.ensure_session(Some(u)).await;
        assert_eq!(snap.user_id, Some(u.id));
        assert!(!snap.is_loading);
        f.sync.ensure_session(Some(u)).await;
        assert_eq!(f.store.selects.load(std::sync::atomic::Ordering::SeqCst), 1);

        let snap = f.sync.ensure_session(None).await;
        assert_eq!(snap.user_id, None);
    }

    #[tokio::test]
    async fn add_during_checkout_survives_the_clear() {
        let u = user();
        let f = fixture(Some(u), MemoryGuestSlot::default()).await;
        f.sync.add_item(Some(&dish(1, 1000)), 1).await;

        let (started_tx, started_rx) = tokio::sync::oneshot::channel();
        let sync = Arc::clone(&f.sync);
        let placing = tokio::spawn(async move {
            sync.check_out(|items| async move {
                let _ = started_tx.send(());
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok::<_, ()>(quantities(&CartSnapshot {
                    items,
                    ..CartSnapshot::default()
                }))
            })
            .await
        });

        started_rx.await.unwrap();
        let added = f.sync.add_item(Some(&dish(2, 300)), 1).await;
        let (ordered, cleared) = placing.await.unwrap().unwrap();

        assert_eq!(added, Outcome::Applied);
        assert_eq!(cleared, Outcome::Applied);
        assert_eq!(ordered, vec![(1, 1)]);
        assert_eq!(quantities(&f.sync.snapshot()), vec![(2, 1)]);
        assert_eq!(f.store.rows_for(u.id).len(), 1);
    }

    #[tokio::test]
    async fn failed_checkout_keeps_lines() {
        let f = fixture(None, MemoryGuestSlot::default()).await;
        f.sync.add_item(Some(&dish(1, 1000)), 2).await;

        let res = f
            .sync
            .check_out(|_| async { Err::<(), _>("store down") })
            .await;
        assert_eq!(res.unwrap_err(), "store down");
        assert_eq!(quantities(&f.sync.snapshot()), vec![(1, 2)]);
    }
}

//! Cross-tab propagation channel.
//!
//! [`SharedStorage`] is the origin-wide durable key-value map shared by
//! every tab. Each tab holds a [`TabStore`] handle; a write through one
//! tab's handle dispatches a [`StorageEvent`] to listeners registered by
//! *other* tabs only. Same-tab writes never re-fire into the writer's own
//! listeners, which is the platform rule that prevents feedback loops.
//!
//! The shared map is treated as message passing, not shared memory: a
//! receiving tab never patches its state from the event payload, it
//! re-reads and re-validates storage (see the provider's reconcile path).

use crate::store::{SettingsStore, StoreError};
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, trace, warn};

/// Identifies one simulated tab within a [`SharedStorage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabId(u64);

/// Identifier for a registered storage listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A change made to shared storage by some tab.
#[derive(Debug, Clone)]
pub struct StorageEvent {
    pub key: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

type StorageCallback = Arc<dyn Fn(&StorageEvent) + Send + Sync>;

struct StorageListener {
    tab: TabId,
    keys: Vec<String>,
    callback: StorageCallback,
}

struct StorageInner {
    values: RwLock<HashMap<String, String>>,
    listeners: RwLock<HashMap<ListenerId, StorageListener>>,
    next_listener_id: AtomicU64,
    next_tab_id: AtomicU64,
}

/// Origin-wide storage shared across all tabs. Cheap to clone.
#[derive(Clone)]
pub struct SharedStorage {
    inner: Arc<StorageInner>,
}

impl Default for SharedStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedStorage {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StorageInner {
                values: RwLock::new(HashMap::new()),
                listeners: RwLock::new(HashMap::new()),
                next_listener_id: AtomicU64::new(1),
                next_tab_id: AtomicU64::new(1),
            }),
        }
    }

    /// Open a new tab onto this storage.
    pub fn tab(&self) -> TabStore {
        let id = TabId(self.inner.next_tab_id.fetch_add(1, Ordering::Relaxed));
        debug!(tab.id = id.0, "Tab opened on shared storage");
        TabStore {
            storage: self.clone(),
            id,
        }
    }

    fn register(&self, tab: TabId, keys: &[&str], callback: StorageCallback) -> ListenerId {
        let id = ListenerId(self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed));
        self.inner
            .listeners
            .write()
            .expect("storage listener lock poisoned")
            .insert(
                id,
                StorageListener {
                    tab,
                    keys: keys.iter().map(|k| (*k).to_string()).collect(),
                    callback,
                },
            );
        debug!(tab.id = tab.0, storage.listener_id = id.0, "Storage listener registered");
        id
    }

    fn unregister(&self, id: ListenerId) {
        let mut listeners = self
            .inner
            .listeners
            .write()
            .expect("storage listener lock poisoned");
        if listeners.remove(&id).is_some() {
            debug!(storage.listener_id = id.0, "Storage listener removed");
        }
    }

    /// Dispatch an event to every listener on `event.key` except those
    /// registered by the originating tab.
    fn dispatch(&self, origin: TabId, event: &StorageEvent) {
        let targets: Vec<(ListenerId, StorageCallback)> = {
            let listeners = self
                .inner
                .listeners
                .read()
                .expect("storage listener lock poisoned");
            listeners
                .iter()
                .filter(|(_, l)| l.tab != origin && l.keys.iter().any(|k| *k == event.key))
                .map(|(id, l)| (*id, Arc::clone(&l.callback)))
                .collect()
        };

        trace!(
            storage.key = %event.key,
            storage.origin_tab = origin.0,
            storage.targets = targets.len(),
            "Storage event dispatch"
        );

        for (id, callback) in targets {
            let result = catch_unwind(AssertUnwindSafe(|| callback(event)));
            if result.is_err() {
                warn!(
                    storage.listener_id = id.0,
                    storage.key = %event.key,
                    "Storage listener panicked"
                );
            }
        }
    }
}

impl std::fmt::Debug for SharedStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self.inner.listeners.read().map(|l| l.len()).unwrap_or(0);
        f.debug_struct("SharedStorage")
            .field("listeners", &listeners)
            .finish()
    }
}

/// One tab's handle onto [`SharedStorage`].
///
/// Implements [`SettingsStore`], so a tab's `Settings` facade persists
/// straight into the shared map and other tabs observe the change.
#[derive(Clone)]
pub struct TabStore {
    storage: SharedStorage,
    id: TabId,
}

impl TabStore {
    pub fn id(&self) -> TabId {
        self.id
    }

    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    /// Listen for foreign-tab changes to any of `keys`.
    ///
    /// The returned [`Subscription`] unsubscribes on drop; callers keep it
    /// alive for exactly as long as the owning component is mounted.
    pub fn subscribe(
        &self,
        keys: &[&str],
        callback: impl Fn(&StorageEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.storage.register(self.id, keys, Arc::new(callback));
        Subscription {
            storage: self.storage.clone(),
            id,
        }
    }
}

impl SettingsStore for TabStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self
            .storage
            .inner
            .values
            .read()
            .map_err(|_| StoreError::Unavailable)?;
        Ok(values.get(key).cloned())
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let old_value = {
            let mut values = self
                .storage
                .inner
                .values
                .write()
                .map_err(|_| StoreError::Unavailable)?;
            values.insert(key.to_string(), value.to_string())
        };

        if old_value.as_deref() != Some(value) {
            self.storage.dispatch(
                self.id,
                &StorageEvent {
                    key: key.to_string(),
                    old_value,
                    new_value: Some(value.to_string()),
                },
            );
        }
        Ok(())
    }

    fn remove_raw(&self, key: &str) -> Result<(), StoreError> {
        let old_value = {
            let mut values = self
                .storage
                .inner
                .values
                .write()
                .map_err(|_| StoreError::Unavailable)?;
            values.remove(key)
        };

        if old_value.is_some() {
            self.storage.dispatch(
                self.id,
                &StorageEvent {
                    key: key.to_string(),
                    old_value,
                    new_value: None,
                },
            );
        }
        Ok(())
    }
}

impl std::fmt::Debug for TabStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TabStore").field("id", &self.id.0).finish()
    }
}

/// Live storage subscription; unsubscribes when dropped.
pub struct Subscription {
    storage: SharedStorage,
    id: ListenerId,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.storage.unregister(self.id);
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id.0).finish()
    }
}

//! Context provider / consumer boundary.
//!
//! [`ThemeProvider`] exclusively owns the authoritative in-memory
//! [`ThemeSettings`] for one tab. Every mutation flows through its
//! mutators, which run validate → update state → persist → apply as one
//! logical unit: a caller observing state after a mutator returns always
//! sees storage and document consistent with the new in-memory value.
//!
//! Consumers reach the provider through [`use_theme`] inside a scope
//! opened by [`ThemeProvider::enter`]. Calling [`use_theme`] outside any
//! scope is a programming-contract violation and panics; it is the one
//! failure in this subsystem allowed to throw.
//!
//! # Example
//!
//! ```rust
//! use aero_theme::channel::SharedStorage;
//! use aero_theme::document::{MemoryDocument, shared};
//! use aero_theme::provider::{ThemeProvider, use_theme};
//!
//! let storage = SharedStorage::new();
//! let provider = ThemeProvider::mount(&storage.tab(), shared(MemoryDocument::new()));
//!
//! provider.enter(|| {
//!     let theme = use_theme();
//!     theme.set_accent_color("OCEAN");
//!     assert_eq!(theme.accent().name(), "OCEAN");
//! });
//! ```

use crate::channel::{StorageEvent, Subscription, TabStore};
use crate::document::{self, SharedDocument};
use crate::settings::{
    AccentColor, BackgroundPattern, FontChoice, THEME_KEYS, ThemeSettings,
};
use crate::store::{Settings, SettingsStore};
use std::cell::RefCell;
use std::collections::HashMap;
use std::ops::Deref;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};
use tracing::{debug, info, warn};

/// Identifier for a registered change listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChangeListenerId(u64);

type ChangeCallback = Arc<dyn Fn(&ThemeSettings) + Send + Sync>;

struct ProviderInner {
    state: RwLock<ThemeSettings>,
    settings: Settings,
    document: SharedDocument,
    listeners: RwLock<HashMap<ChangeListenerId, ChangeCallback>>,
    next_listener_id: AtomicU64,
}

impl ProviderInner {
    fn apply_to_document(&self, settings: &ThemeSettings) {
        let mut root = self.document.lock().expect("document lock poisoned");
        document::apply(settings, &mut *root);
    }

    fn notify(&self, settings: &ThemeSettings) {
        let listeners: Vec<(ChangeListenerId, ChangeCallback)> = {
            let listeners = self.listeners.read().expect("theme listener lock poisoned");
            listeners
                .iter()
                .map(|(id, cb)| (*id, Arc::clone(cb)))
                .collect()
        };

        for (id, callback) in listeners {
            let result = catch_unwind(AssertUnwindSafe(|| callback(settings)));
            if result.is_err() {
                warn!(theme.listener_id = id.0, "Theme change listener panicked");
            }
        }
    }

    /// Foreign-tab reconciliation: re-read the whole snapshot from
    /// storage instead of patching the changed key, so consumers never
    /// observe one fresh field combined with stale others.
    fn reconcile(&self, event: &StorageEvent) {
        debug!(
            storage.key = %event.key,
            storage.new_value = event.new_value.as_deref().unwrap_or(""),
            "Reconciling theme from foreign tab write"
        );
        let next = ThemeSettings::load(&self.settings);
        {
            let mut state = self.state.write().expect("theme state lock poisoned");
            *state = next;
        }
        self.apply_to_document(&next);
        self.notify(&next);
    }
}

/// Provider-scoped owner of the tab's theme state.
pub struct ThemeProvider {
    inner: Arc<ProviderInner>,
    // Keeps the cross-tab listener alive for the provider's lifetime;
    // dropped (and thereby unsubscribed) on unmount.
    _subscription: Option<Subscription>,
}

impl ThemeProvider {
    /// Mount a provider on a tab: load initial settings, project them
    /// onto the document, and start listening for foreign tab writes to
    /// the theme keys.
    pub fn mount(tab: &TabStore, document: SharedDocument) -> Arc<Self> {
        let settings = Settings::new(Arc::new(tab.clone()));
        let inner = Self::build(settings, document);

        let inner_ref = Arc::clone(&inner);
        let subscription = tab.subscribe(&THEME_KEYS, move |event| {
            inner_ref.reconcile(event);
        });

        Arc::new(Self {
            inner,
            _subscription: Some(subscription),
        })
    }

    /// Mount a provider over a plain backend with no cross-tab channel
    /// (file-backed or degraded in-memory sessions).
    pub fn mount_with_store(store: Arc<dyn SettingsStore>, document: SharedDocument) -> Arc<Self> {
        let inner = Self::build(Settings::new(store), document);
        Arc::new(Self {
            inner,
            _subscription: None,
        })
    }

    fn build(settings: Settings, document: SharedDocument) -> Arc<ProviderInner> {
        let initial = ThemeSettings::load(&settings);
        info!(
            theme.mode = initial.mode_name(),
            theme.accent = initial.accent.name(),
            theme.background = initial.background.id(),
            theme.font = initial.font.id(),
            "Theme provider mounted"
        );

        let inner = Arc::new(ProviderInner {
            state: RwLock::new(initial),
            settings,
            document,
            listeners: RwLock::new(HashMap::new()),
            next_listener_id: AtomicU64::new(1),
        });
        inner.apply_to_document(&initial);
        inner
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    /// Snapshot of the current settings.
    pub fn settings(&self) -> ThemeSettings {
        *self.inner.state.read().expect("theme state lock poisoned")
    }

    pub fn dark_mode(&self) -> bool {
        self.settings().dark_mode
    }

    pub fn accent(&self) -> AccentColor {
        self.settings().accent
    }

    pub fn background(&self) -> BackgroundPattern {
        self.settings().background
    }

    pub fn font(&self) -> FontChoice {
        self.settings().font
    }

    // ---------------------------------------------------------------------
    // Mutators
    // ---------------------------------------------------------------------

    pub fn toggle_dark_mode(&self) {
        let mut next = self.settings();
        next.dark_mode = !next.dark_mode;
        info!(theme.mode = next.mode_name(), "Dark mode toggled");
        self.commit(next);
    }

    /// Select an accent color by name; unknown names normalize to the
    /// default palette entry, and the normalized value is what persists.
    pub fn set_accent_color(&self, name: &str) {
        let mut next = self.settings();
        next.accent = AccentColor::from_name(name);
        info!(theme.accent = next.accent.name(), "Accent color set");
        self.commit(next);
    }

    /// Select a background pattern by id; unknown ids normalize to none.
    pub fn set_background_pattern(&self, id: &str) {
        let mut next = self.settings();
        next.background = BackgroundPattern::from_id(id);
        info!(theme.background = next.background.id(), "Background pattern set");
        self.commit(next);
    }

    /// Select a font by id; unknown ids normalize to the default font.
    pub fn set_font(&self, id: &str) {
        let mut next = self.settings();
        next.font = FontChoice::from_id(id);
        info!(theme.font = next.font.id(), "Font set");
        self.commit(next);
    }

    /// Update state, persist, project, notify — in that order. Runs the
    /// full pipeline even for value-equal updates so a normalized value
    /// always replaces whatever raw string storage held.
    fn commit(&self, next: ThemeSettings) {
        {
            let mut state = self.inner.state.write().expect("theme state lock poisoned");
            *state = next;
        }
        next.persist(&self.inner.settings);
        self.inner.apply_to_document(&next);
        self.inner.notify(&next);
    }

    // ---------------------------------------------------------------------
    // Projection helpers (used by the route-transition hook)
    // ---------------------------------------------------------------------

    /// Re-project the current settings onto the document. Idempotent.
    pub fn apply_current(&self) {
        let snapshot = self.settings();
        self.inner.apply_to_document(&snapshot);
    }

    /// Whether the shared document is ready for attribute writes.
    pub fn document_ready(&self) -> bool {
        self.inner
            .document
            .lock()
            .expect("document lock poisoned")
            .is_ready()
    }

    // ---------------------------------------------------------------------
    // Change listeners
    // ---------------------------------------------------------------------

    /// Register a callback invoked with each new settings snapshot after
    /// a mutation or a cross-tab reconcile.
    pub fn on_change<F>(&self, callback: F) -> ChangeListenerId
    where
        F: Fn(&ThemeSettings) + Send + Sync + 'static,
    {
        let id = ChangeListenerId(self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed));
        self.inner
            .listeners
            .write()
            .expect("theme listener lock poisoned")
            .insert(id, Arc::new(callback));
        debug!(theme.listener_id = id.0, "Theme change listener registered");
        id
    }

    /// Remove a change listener by id.
    pub fn remove_change_listener(&self, id: ChangeListenerId) {
        let mut listeners = self
            .inner
            .listeners
            .write()
            .expect("theme listener lock poisoned");
        if listeners.remove(&id).is_some() {
            debug!(theme.listener_id = id.0, "Theme change listener removed");
        }
    }

    // ---------------------------------------------------------------------
    // Consumer scope
    // ---------------------------------------------------------------------

    /// Run `f` with this provider installed as the current scope, so
    /// code inside may call [`use_theme`]. Scopes nest; the innermost
    /// provider wins.
    pub fn enter<R>(self: &Arc<Self>, f: impl FnOnce() -> R) -> R {
        PROVIDER_SCOPE.with(|scope| scope.borrow_mut().push(Arc::downgrade(self)));
        let _guard = ScopeGuard;
        f()
    }
}

impl std::fmt::Debug for ThemeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeProvider")
            .field("settings", &self.settings())
            .field("cross_tab", &self._subscription.is_some())
            .finish()
    }
}

thread_local! {
    static PROVIDER_SCOPE: RefCell<Vec<Weak<ThemeProvider>>> = const { RefCell::new(Vec::new()) };
}

struct ScopeGuard;

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        PROVIDER_SCOPE.with(|scope| {
            scope.borrow_mut().pop();
        });
    }
}

/// Handle to the provider for the current scope.
///
/// Derefs to [`ThemeProvider`], so consumers read and mutate through it
/// directly.
#[derive(Clone)]
pub struct ThemeHandle(Arc<ThemeProvider>);

impl Deref for ThemeHandle {
    type Target = ThemeProvider;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Debug for ThemeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ThemeHandle").field(&*self.0).finish()
    }
}

/// Resolve the provider for the current scope.
///
/// # Panics
/// Panics when called outside [`ThemeProvider::enter`] — a consumer
/// without a provider ancestor is a programming error, not a runtime
/// condition, and fails fast.
pub fn use_theme() -> ThemeHandle {
    let provider = PROVIDER_SCOPE.with(|scope| {
        scope
            .borrow()
            .last()
            .and_then(std::sync::Weak::upgrade)
    });
    match provider {
        Some(provider) => ThemeHandle(provider),
        None => panic!(
            "use_theme() called outside a ThemeProvider scope; \
             every theme consumer needs a provider ancestor"
        ),
    }
}

//! Route-transition reapplication hook.
//!
//! Some navigations mount a page without remounting the theme provider —
//! pre-authentication routes in particular used to render with a blank
//! background instead of the user's chosen pattern. The hook closes that
//! gap: on every navigation boundary it re-projects the current settings
//! onto the document, uniformly for authenticated and pre-auth routes.
//! Projection is idempotent, so overlapping with the provider's own
//! apply costs nothing but an attribute comparison.

use crate::provider::ThemeProvider;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};
use tracing::{debug, trace, warn};

/// Which side of a navigation the event marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationPhase {
    Start,
    Finish,
}

/// A navigation lifecycle event.
#[derive(Debug, Clone)]
pub struct NavigationEvent {
    pub phase: NavigationPhase,
    pub path: String,
}

/// Page group relative to the authentication boundary.
///
/// The hook treats both groups identically; the distinction exists for
/// logging and for tests asserting theme parity across the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGroup {
    PreAuth,
    Authenticated,
}

const PRE_AUTH_ROUTES: [&str; 4] = ["/login", "/register", "/forgot-password", "/reset-password"];

impl RouteGroup {
    /// Classify a path; pre-auth routes and their subpaths are `PreAuth`.
    pub fn of(path: &str) -> Self {
        let pre_auth = PRE_AUTH_ROUTES
            .iter()
            .any(|route| path == *route || path.strip_prefix(route).is_some_and(|r| r.starts_with('/')));
        if pre_auth {
            Self::PreAuth
        } else {
            Self::Authenticated
        }
    }
}

/// Identifier for a registered navigation listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NavListenerId(u64);

type NavCallback = Arc<dyn Fn(&NavigationEvent) + Send + Sync>;

struct NavigatorInner {
    listeners: RwLock<HashMap<NavListenerId, NavCallback>>,
    next_listener_id: AtomicU64,
}

/// Navigation event source. Cheap to clone; the routing layer owns one
/// and emits begin/finish around each transition.
#[derive(Clone)]
pub struct Navigator {
    inner: Arc<NavigatorInner>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(NavigatorInner {
                listeners: RwLock::new(HashMap::new()),
                next_listener_id: AtomicU64::new(1),
            }),
        }
    }

    /// Emit a navigation-start event for `path`.
    pub fn begin(&self, path: &str) {
        self.emit(&NavigationEvent {
            phase: NavigationPhase::Start,
            path: path.to_string(),
        });
    }

    /// Emit a navigation-finish event for `path`.
    pub fn finish(&self, path: &str) {
        self.emit(&NavigationEvent {
            phase: NavigationPhase::Finish,
            path: path.to_string(),
        });
    }

    /// Subscribe to navigation events; unsubscribes when the returned
    /// handle drops.
    pub fn subscribe(
        &self,
        callback: impl Fn(&NavigationEvent) + Send + Sync + 'static,
    ) -> NavSubscription {
        let id = NavListenerId(self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed));
        self.inner
            .listeners
            .write()
            .expect("navigation listener lock poisoned")
            .insert(id, Arc::new(callback));
        debug!(nav.listener_id = id.0, "Navigation listener registered");
        NavSubscription {
            navigator: self.clone(),
            id,
        }
    }

    fn emit(&self, event: &NavigationEvent) {
        trace!(nav.phase = ?event.phase, nav.path = %event.path, "Navigation event");
        let listeners: Vec<(NavListenerId, NavCallback)> = {
            let listeners = self
                .inner
                .listeners
                .read()
                .expect("navigation listener lock poisoned");
            listeners
                .iter()
                .map(|(id, cb)| (*id, Arc::clone(cb)))
                .collect()
        };

        for (id, callback) in listeners {
            let result = catch_unwind(AssertUnwindSafe(|| callback(event)));
            if result.is_err() {
                warn!(
                    nav.listener_id = id.0,
                    nav.path = %event.path,
                    "Navigation listener panicked"
                );
            }
        }
    }

    fn unregister(&self, id: NavListenerId) {
        let mut listeners = self
            .inner
            .listeners
            .write()
            .expect("navigation listener lock poisoned");
        if listeners.remove(&id).is_some() {
            debug!(nav.listener_id = id.0, "Navigation listener removed");
        }
    }
}

impl std::fmt::Debug for Navigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self.inner.listeners.read().map(|l| l.len()).unwrap_or(0);
        f.debug_struct("Navigator")
            .field("listeners", &listeners)
            .finish()
    }
}

/// Live navigation subscription; unsubscribes when dropped.
pub struct NavSubscription {
    navigator: Navigator,
    id: NavListenerId,
}

impl Drop for NavSubscription {
    fn drop(&mut self) {
        self.navigator.unregister(self.id);
    }
}

/// Schedules a deferred task for the next animation frame.
pub trait FrameScheduler: Send + Sync {
    fn schedule(&self, task: Box<dyn FnOnce() + Send>);
}

/// Runs scheduled tasks immediately. The production choice when frames
/// are not meaningfully deferred.
#[derive(Debug, Default)]
pub struct InlineScheduler;

impl FrameScheduler for InlineScheduler {
    fn schedule(&self, task: Box<dyn FnOnce() + Send>) {
        task();
    }
}

/// Queues tasks until [`DeferredScheduler::run_frame`] is called. Lets
/// tests step the not-ready-document retry deterministically.
#[derive(Default)]
pub struct DeferredScheduler {
    queue: Mutex<Vec<Box<dyn FnOnce() + Send>>>,
}

impl DeferredScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every queued task; returns how many ran.
    pub fn run_frame(&self) -> usize {
        let tasks: Vec<_> = {
            let mut queue = self.queue.lock().expect("frame queue lock poisoned");
            queue.drain(..).collect()
        };
        let count = tasks.len();
        for task in tasks {
            task();
        }
        count
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().expect("frame queue lock poisoned").len()
    }
}

impl FrameScheduler for DeferredScheduler {
    fn schedule(&self, task: Box<dyn FnOnce() + Send>) {
        self.queue
            .lock()
            .expect("frame queue lock poisoned")
            .push(task);
    }
}

impl std::fmt::Debug for DeferredScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

/// Re-applies the current theme on every navigation boundary.
pub struct ReapplyHook {
    _subscription: NavSubscription,
}

impl ReapplyHook {
    /// Install the hook. Holds the provider weakly: an unmounted
    /// provider turns the hook into a no-op rather than a leak.
    pub fn install(
        navigator: &Navigator,
        provider: &Arc<ThemeProvider>,
        scheduler: Arc<dyn FrameScheduler>,
    ) -> Self {
        let provider = Arc::downgrade(provider);
        let subscription = navigator.subscribe(move |event| {
            Self::reapply(&provider, &scheduler, event);
        });
        Self {
            _subscription: subscription,
        }
    }

    fn reapply(provider: &Weak<ThemeProvider>, scheduler: &Arc<dyn FrameScheduler>, event: &NavigationEvent) {
        let Some(provider) = provider.upgrade() else {
            return;
        };

        debug!(
            nav.phase = ?event.phase,
            nav.path = %event.path,
            nav.group = ?RouteGroup::of(&event.path),
            "Reapplying theme on navigation"
        );

        if provider.document_ready() {
            Self::apply_guarded(&provider);
            return;
        }

        // Single-shot retry on the next frame; never a polling loop.
        let retry = Arc::downgrade(&provider);
        trace!(nav.path = %event.path, "Document not ready, retrying next frame");
        scheduler.schedule(Box::new(move || {
            if let Some(provider) = retry.upgrade() {
                Self::apply_guarded(&provider);
            }
        }));
    }

    // A projection failure must never reach the navigation layer.
    fn apply_guarded(provider: &Arc<ThemeProvider>) {
        let result = catch_unwind(AssertUnwindSafe(|| provider.apply_current()));
        if result.is_err() {
            warn!("Theme reapplication panicked; navigation unaffected");
        }
    }
}

impl std::fmt::Debug for ReapplyHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReapplyHook").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_route_group_classification() {
        assert_eq!(RouteGroup::of("/login"), RouteGroup::PreAuth);
        assert_eq!(RouteGroup::of("/reset-password/token123"), RouteGroup::PreAuth);
        assert_eq!(RouteGroup::of("/dashboard"), RouteGroup::Authenticated);
        assert_eq!(RouteGroup::of("/"), RouteGroup::Authenticated);
        // Prefix without a path separator is not pre-auth.
        assert_eq!(RouteGroup::of("/login-help"), RouteGroup::Authenticated);
    }

    #[test]
    fn test_navigator_emits_both_phases() {
        let navigator = Navigator::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_ref = Arc::clone(&seen);
        let _sub = navigator.subscribe(move |event| {
            seen_ref.lock().unwrap().push((event.phase, event.path.clone()));
        });

        navigator.begin("/dashboard");
        navigator.finish("/dashboard");

        let events = seen.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                (NavigationPhase::Start, "/dashboard".to_string()),
                (NavigationPhase::Finish, "/dashboard".to_string()),
            ]
        );
    }

    #[test]
    fn test_subscription_drop_unsubscribes() {
        let navigator = Navigator::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_ref = Arc::clone(&hits);
        let sub = navigator.subscribe(move |_| {
            hits_ref.fetch_add(1, Ordering::SeqCst);
        });

        navigator.begin("/a");
        drop(sub);
        navigator.begin("/b");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_nav_listener_is_contained() {
        let navigator = Navigator::new();
        let _bad = navigator.subscribe(|_| panic!("listener bug"));
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_ref = Arc::clone(&hits);
        let _good = navigator.subscribe(move |_| {
            hits_ref.fetch_add(1, Ordering::SeqCst);
        });

        navigator.begin("/dashboard");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_deferred_scheduler_runs_queued() {
        let scheduler = DeferredScheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_ref = Arc::clone(&hits);
        scheduler.schedule(Box::new(move || {
            hits_ref.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.run_frame(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.run_frame(), 0);
    }
}

#![forbid(unsafe_code)]
// Allow these clippy lints for API ergonomics
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::use_self)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::uninlined_format_args)]

//! # Aero Theme
//!
//! Theme state, persistence, and cross-tab synchronization for Aero HR.
//!
//! One [`ThemeSettings`] value — dark mode, accent color, background
//! pattern, font — is authoritative per tab. It lives in a
//! [`ThemeProvider`], mirrors into durable key-value storage on every
//! mutation, and projects onto the document root as a fixed set of data
//! attributes consumed by CSS. Writes from other tabs arrive as storage
//! events and reconcile back through the same pipeline, so all tabs of
//! an origin converge on the same theme.
//!
//! ## Quick Start
//!
//! ```rust
//! use aero_theme::channel::SharedStorage;
//! use aero_theme::document::{ATTR_THEME, DocumentRoot, MemoryDocument, shared};
//! use aero_theme::provider::ThemeProvider;
//!
//! let storage = SharedStorage::new();
//! let doc = shared(MemoryDocument::new());
//! let provider = ThemeProvider::mount(&storage.tab(), doc.clone());
//!
//! provider.set_accent_color("OCEAN");
//! provider.toggle_dark_mode();
//!
//! let root = doc.lock().unwrap();
//! assert_eq!(root.attribute(ATTR_THEME).as_deref(), Some("OCEAN"));
//! ```
//!
//! ## Failure posture
//!
//! Cosmetic state never blocks the page. Unavailable storage degrades to
//! an in-memory session; corrupt or unknown persisted values normalize
//! to defaults at load time; the only permitted throw is the
//! development-time contract violation of consuming the theme outside a
//! provider scope ([`provider::use_theme`]).
//!
//! ## Modules
//!
//! - [`store`] — best-effort key-value persistence boundary
//! - [`settings`] — the typed theme state model and its storage framing
//! - [`document`] — idempotent projection onto the document root
//! - [`channel`] — cross-tab storage events
//! - [`provider`] — the sole in-process mutation entry point
//! - [`router`] — theme reapplication across navigations
//! - [`color`] — hex/HSL helpers for mode-dependent accent rendering

pub mod channel;
pub mod color;
pub mod document;
pub mod provider;
pub mod router;
pub mod settings;
pub mod store;

pub use channel::{SharedStorage, StorageEvent, Subscription, TabStore};
pub use document::{
    ATTR_BACKGROUND, ATTR_FONT, ATTR_THEME, ATTR_THEME_MODE, DocumentRoot, MemoryDocument,
    SharedDocument, THEME_ATTRIBUTES, apply, shared,
};
pub use provider::{ThemeHandle, ThemeProvider, use_theme};
pub use router::{
    DeferredScheduler, FrameScheduler, InlineScheduler, NavigationEvent, NavigationPhase,
    Navigator, ReapplyHook, RouteGroup,
};
pub use settings::{
    ACCENT_KEY, AccentColor, BACKGROUND_KEY, BackgroundPattern, DARK_MODE_KEY, FONT_KEY,
    FontChoice, THEME_KEYS, StoredAccent, ThemeSettings,
};
pub use store::{FileStore, MemoryStore, Settings, SettingsStore, StoreError, UnavailableStore};

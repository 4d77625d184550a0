//! Document attribute synchronizer.
//!
//! The document root's theme attributes are a pure, total function of the
//! current [`ThemeSettings`] and are produced only by [`apply`]. The
//! projection owns exactly four attributes and touches nothing else, so
//! it cannot interfere with other libraries annotating the same root.
//! [`apply`] writes only values that actually differ, which makes it safe
//! to call on every render and every navigation.

use crate::settings::ThemeSettings;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::trace;

/// Root attribute carrying `light` | `dark`.
pub const ATTR_THEME_MODE: &str = "data-theme-mode";
/// Root attribute carrying the accent color name.
pub const ATTR_THEME: &str = "data-theme";
/// Root attribute carrying the background pattern id (absent when none).
pub const ATTR_BACKGROUND: &str = "data-background";
/// Root attribute carrying the font id.
pub const ATTR_FONT: &str = "data-font";

/// The fixed attribute set owned by the synchronizer.
pub const THEME_ATTRIBUTES: [&str; 4] = [ATTR_THEME_MODE, ATTR_THEME, ATTR_BACKGROUND, ATTR_FONT];

/// The mutable document root the theme projects onto.
pub trait DocumentRoot: Send {
    /// Current value of an attribute, if set.
    fn attribute(&self, name: &str) -> Option<String>;

    /// Set an attribute to a value.
    fn set_attribute(&mut self, name: &str, value: &str);

    /// Remove an attribute if present.
    fn remove_attribute(&mut self, name: &str);

    /// Whether the root is ready to receive attributes. A navigation may
    /// observe a not-yet-ready document; the route hook retries once on
    /// the next frame.
    fn is_ready(&self) -> bool {
        true
    }

    /// Change the root's readiness. No-op for roots that are always ready.
    fn set_ready(&mut self, _ready: bool) {}
}

/// A document root shared between the provider and the route hook.
pub type SharedDocument = Arc<Mutex<dyn DocumentRoot>>;

/// Wrap a root for sharing.
pub fn shared(root: impl DocumentRoot + 'static) -> SharedDocument {
    Arc::new(Mutex::new(root))
}

/// Project `settings` onto the document root, idempotently.
///
/// A second call with equal input performs zero mutations. Attributes
/// outside [`THEME_ATTRIBUTES`] are never read or written.
pub fn apply(settings: &ThemeSettings, root: &mut dyn DocumentRoot) {
    sync_attribute(root, ATTR_THEME_MODE, settings.mode_name());
    sync_attribute(root, ATTR_THEME, settings.accent.name());

    let background = settings.background.id();
    if background.is_empty() {
        if root.attribute(ATTR_BACKGROUND).is_some() {
            root.remove_attribute(ATTR_BACKGROUND);
            trace!(document.attr = ATTR_BACKGROUND, "Attribute removed");
        }
    } else {
        sync_attribute(root, ATTR_BACKGROUND, background);
    }

    sync_attribute(root, ATTR_FONT, settings.font.id());
}

fn sync_attribute(root: &mut dyn DocumentRoot, name: &str, value: &str) {
    if root.attribute(name).as_deref() != Some(value) {
        root.set_attribute(name, value);
        trace!(document.attr = name, document.value = value, "Attribute set");
    }
}

/// In-memory document root with a mutation counter.
///
/// Backs the tests and the demo; the counter is how idempotence is
/// observed from outside.
#[derive(Debug)]
pub struct MemoryDocument {
    attributes: HashMap<String, String>,
    mutations: usize,
    ready: bool,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self {
            attributes: HashMap::new(),
            mutations: 0,
            ready: true,
        }
    }

    /// Total set/remove calls observed so far.
    pub fn mutation_count(&self) -> usize {
        self.mutations
    }

    /// Snapshot of all attributes, for assertions.
    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }
}

impl DocumentRoot for MemoryDocument {
    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.get(name).cloned()
    }

    fn set_attribute(&mut self, name: &str, value: &str) {
        self.attributes.insert(name.to_string(), value.to_string());
        self.mutations += 1;
    }

    fn remove_attribute(&mut self, name: &str) {
        if self.attributes.remove(name).is_some() {
            self.mutations += 1;
        }
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    /// Simulate a document that is not yet ready for attribute writes.
    fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{AccentColor, BackgroundPattern, FontChoice};

    fn sample() -> ThemeSettings {
        ThemeSettings {
            dark_mode: true,
            accent: AccentColor::Ocean,
            background: BackgroundPattern::Glass2,
            font: FontChoice::Roboto,
        }
    }

    #[test]
    fn test_apply_sets_all_attributes() {
        let mut doc = MemoryDocument::new();
        apply(&sample(), &mut doc);

        assert_eq!(doc.attribute(ATTR_THEME_MODE).as_deref(), Some("dark"));
        assert_eq!(doc.attribute(ATTR_THEME).as_deref(), Some("OCEAN"));
        assert_eq!(
            doc.attribute(ATTR_BACKGROUND).as_deref(),
            Some("pattern-glass-2")
        );
        assert_eq!(doc.attribute(ATTR_FONT).as_deref(), Some("roboto"));
    }

    #[test]
    fn test_apply_twice_is_idempotent() {
        let mut doc = MemoryDocument::new();
        apply(&sample(), &mut doc);
        let after_first = doc.mutation_count();
        apply(&sample(), &mut doc);
        assert_eq!(doc.mutation_count(), after_first);
    }

    #[test]
    fn test_apply_empty_background_removes_attribute() {
        let mut doc = MemoryDocument::new();
        apply(&sample(), &mut doc);

        let mut cleared = sample();
        cleared.background = BackgroundPattern::None;
        apply(&cleared, &mut doc);
        assert_eq!(doc.attribute(ATTR_BACKGROUND), None);

        // Removing an already-absent attribute is a no-op.
        let count = doc.mutation_count();
        apply(&cleared, &mut doc);
        assert_eq!(doc.mutation_count(), count);
    }

    #[test]
    fn test_apply_leaves_foreign_attributes_alone() {
        let mut doc = MemoryDocument::new();
        doc.set_attribute("data-portal-root", "true");
        apply(&sample(), &mut doc);
        apply(&ThemeSettings::default(), &mut doc);
        assert_eq!(doc.attribute("data-portal-root").as_deref(), Some("true"));
    }

    #[test]
    fn test_dark_toggle_changes_mode_only() {
        let mut doc = MemoryDocument::new();
        let mut settings = sample();
        settings.dark_mode = false;
        apply(&settings, &mut doc);
        assert_eq!(doc.attribute(ATTR_THEME_MODE).as_deref(), Some("light"));
        assert_eq!(doc.attribute(ATTR_THEME).as_deref(), Some("OCEAN"));

        settings.dark_mode = true;
        let before = doc.mutation_count();
        apply(&settings, &mut doc);
        assert_eq!(doc.attribute(ATTR_THEME_MODE).as_deref(), Some("dark"));
        assert_eq!(doc.attribute(ATTR_THEME).as_deref(), Some("OCEAN"));
        // Exactly one attribute changed.
        assert_eq!(doc.mutation_count(), before + 1);
    }
}

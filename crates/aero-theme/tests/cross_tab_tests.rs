//! Two simulated tabs sharing one storage backend must converge on the
//! same theme without feedback loops or cross-field tearing.

use aero_theme::{
    ATTR_BACKGROUND, ATTR_THEME, ATTR_THEME_MODE, AccentColor, BackgroundPattern, MemoryDocument,
    SharedDocument, SharedStorage, ThemeProvider, ThemeSettings, shared,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

struct Tab {
    provider: Arc<ThemeProvider>,
    document: SharedDocument,
}

fn open_tab(storage: &SharedStorage) -> Tab {
    let document = shared(MemoryDocument::new());
    let provider = ThemeProvider::mount(&storage.tab(), Arc::clone(&document));
    Tab { provider, document }
}

fn attr(document: &SharedDocument, name: &str) -> Option<String> {
    document.lock().unwrap().attribute(name)
}

#[test]
fn test_accent_converges_across_tabs() {
    let storage = SharedStorage::new();
    let tab_a = open_tab(&storage);
    let tab_b = open_tab(&storage);

    tab_a.provider.set_accent_color("FOREST");

    assert_eq!(tab_b.provider.accent(), AccentColor::Forest);
    assert_eq!(attr(&tab_b.document, ATTR_THEME).as_deref(), Some("FOREST"));
}

#[test]
fn test_convergence_without_cross_field_tearing() {
    let storage = SharedStorage::new();
    let tab_a = open_tab(&storage);
    let tab_b = open_tab(&storage);

    tab_a.provider.set_background_pattern("pattern-glass-3");

    // Capture every snapshot B observes while A changes the accent.
    let snapshots = Arc::new(Mutex::new(Vec::new()));
    let snapshots_ref = Arc::clone(&snapshots);
    let listener = tab_b.provider.on_change(move |s: &ThemeSettings| {
        snapshots_ref.lock().unwrap().push(*s);
    });

    tab_a.provider.set_accent_color("FOREST");

    for snapshot in snapshots.lock().unwrap().iter() {
        if snapshot.accent == AccentColor::Forest {
            // The new accent never appears with A's old background.
            assert_eq!(snapshot.background, BackgroundPattern::Glass3);
        }
    }
    assert_eq!(tab_b.provider.accent(), AccentColor::Forest);
    assert_eq!(tab_b.provider.background(), BackgroundPattern::Glass3);
    tab_b.provider.remove_change_listener(listener);
}

#[test]
fn test_dark_mode_propagates_both_directions() {
    let storage = SharedStorage::new();
    let tab_a = open_tab(&storage);
    let tab_b = open_tab(&storage);

    tab_a.provider.toggle_dark_mode();
    assert!(tab_b.provider.dark_mode());
    assert_eq!(attr(&tab_b.document, ATTR_THEME_MODE).as_deref(), Some("dark"));

    tab_b.provider.toggle_dark_mode();
    assert!(!tab_a.provider.dark_mode());
    assert_eq!(attr(&tab_a.document, ATTR_THEME_MODE).as_deref(), Some("light"));
}

#[test]
fn test_no_feedback_loop_between_tabs() {
    let storage = SharedStorage::new();
    let tab_a = open_tab(&storage);
    let tab_b = open_tab(&storage);

    // Seed storage so the write below changes exactly one key.
    tab_a.provider.set_font("poppins");

    let a_changes = Arc::new(AtomicUsize::new(0));
    let a_ref = Arc::clone(&a_changes);
    let _a_listener = tab_a.provider.on_change(move |_| {
        a_ref.fetch_add(1, Ordering::SeqCst);
    });
    let b_changes = Arc::new(AtomicUsize::new(0));
    let b_ref = Arc::clone(&b_changes);
    let _b_listener = tab_b.provider.on_change(move |_| {
        b_ref.fetch_add(1, Ordering::SeqCst);
    });

    tab_a.provider.set_font("lato");

    // A notifies once for its own mutation; B once for the reconcile.
    // If B's reconcile echoed back into storage, the counts would keep
    // climbing instead.
    assert_eq!(a_changes.load(Ordering::SeqCst), 1);
    assert_eq!(b_changes.load(Ordering::SeqCst), 1);
}

#[test]
fn test_third_tab_mounts_with_converged_state() {
    let storage = SharedStorage::new();
    let tab_a = open_tab(&storage);
    let _tab_b = open_tab(&storage);

    tab_a.provider.set_accent_color("PURPLE");
    tab_a.provider.set_background_pattern("pattern-glass-1");

    let tab_c = open_tab(&storage);
    assert_eq!(tab_c.provider.accent(), AccentColor::Purple);
    assert_eq!(
        attr(&tab_c.document, ATTR_BACKGROUND).as_deref(),
        Some("pattern-glass-1")
    );
}

#[test]
fn test_closed_tab_stops_receiving() {
    let storage = SharedStorage::new();
    let tab_a = open_tab(&storage);
    let tab_b = open_tab(&storage);

    let document_b = Arc::clone(&tab_b.document);
    drop(tab_b.provider);

    tab_a.provider.set_accent_color("RED");
    // B's document keeps whatever it had at unmount.
    assert_eq!(attr(&document_b, ATTR_THEME).as_deref(), Some("DEFAULT"));
}

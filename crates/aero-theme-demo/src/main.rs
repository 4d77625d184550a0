#![forbid(unsafe_code)]

//! # Aero Theme Demo
//!
//! Simulates two browser tabs sharing one storage backend: tab A mutates
//! the theme, tab B converges via storage events, and a navigation into
//! a pre-auth route shows the reapplication hook keeping the document
//! themed.
//!
//! ```bash
//! aero-theme-demo                      # run the scripted walkthrough
//! aero-theme-demo --accent FOREST      # pick the accent tab A selects
//! RUST_LOG=aero_theme=debug aero-theme-demo
//! ```

use aero_theme::{
    ATTR_BACKGROUND, ATTR_FONT, ATTR_THEME, ATTR_THEME_MODE, DocumentRoot, InlineScheduler,
    MemoryDocument, Navigator, ReapplyHook, SharedDocument, SharedStorage, ThemeProvider, shared,
};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "aero-theme-demo", about = "Two-tab theme synchronization walkthrough")]
struct Cli {
    /// Accent color tab A selects.
    #[arg(long, default_value = "OCEAN")]
    accent: String,

    /// Background pattern tab A selects.
    #[arg(long, default_value = "pattern-glass-3")]
    background: String,

    /// Start in dark mode.
    #[arg(long)]
    dark: bool,
}

fn print_document(label: &str, document: &SharedDocument) {
    let root = document.lock().expect("document lock poisoned");
    println!("  {label}:");
    for name in [ATTR_THEME_MODE, ATTR_THEME, ATTR_BACKGROUND, ATTR_FONT] {
        match root.attribute(name) {
            Some(value) => println!("    {name}={value}"),
            None => println!("    {name}=(absent)"),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    tracing::info!(accent = %cli.accent, background = %cli.background, "Demo starting");

    let storage = SharedStorage::new();
    let doc_a = shared(MemoryDocument::new());
    let doc_b = shared(MemoryDocument::new());
    let tab_a = ThemeProvider::mount(&storage.tab(), Arc::clone(&doc_a));
    let tab_b = ThemeProvider::mount(&storage.tab(), Arc::clone(&doc_b));

    let _listener = tab_b.on_change(|settings| {
        println!(
            "  [tab B] reconciled: mode={} accent={} background={:?} font={}",
            settings.mode_name(),
            settings.accent,
            settings.background.id(),
            settings.font
        );
    });

    println!("== Both tabs mounted with defaults");
    print_document("tab A", &doc_a);
    print_document("tab B", &doc_b);

    println!("\n== Tab A selects the theme");
    tab_a.set_accent_color(&cli.accent);
    tab_a.set_background_pattern(&cli.background);
    if cli.dark {
        tab_a.toggle_dark_mode();
    }
    print_document("tab A", &doc_a);
    print_document("tab B (converged via storage events)", &doc_b);

    println!("\n== Tab B navigates to a pre-auth route");
    let navigator = Navigator::new();
    let _hook = ReapplyHook::install(&navigator, &tab_b, Arc::new(InlineScheduler));
    navigator.begin("/login");
    navigator.finish("/login");
    print_document("tab B on /login", &doc_b);

    println!("\n== Tab B toggles dark mode back");
    tab_b.toggle_dark_mode();
    print_document("tab A (converged)", &doc_a);
}

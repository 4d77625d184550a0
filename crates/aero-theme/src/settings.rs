//! Theme state model: the typed settings value and its storage framing.
//!
//! [`ThemeSettings`] is the one authoritative in-memory value per tab.
//! Everything outside storage operates on it, never on raw strings: the
//! validate-on-read boundary lives in the `from_*` constructors here, so
//! any malformed or unknown persisted value normalizes to a default at
//! load time and is never surfaced as a user-facing error.

use crate::color;
use crate::store::Settings;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Storage key for the dark mode flag (`"true"` / `"false"`).
pub const DARK_MODE_KEY: &str = "darkMode";
/// Storage key for the accent color JSON blob.
pub const ACCENT_KEY: &str = "selectedTheme";
/// Storage key for the background pattern id.
pub const BACKGROUND_KEY: &str = "aero-hr-background";
/// Storage key for the font id.
pub const FONT_KEY: &str = "selectedFont";

/// Every storage key owned by the theme engine, in load order.
pub const THEME_KEYS: [&str; 4] = [DARK_MODE_KEY, ACCENT_KEY, BACKGROUND_KEY, FONT_KEY];

/// The enumerated accent palette.
///
/// The selected name is what persists and what CSS selects on; the hex
/// pair is its light-mode rendering. Dark mode derives darker variants
/// via [`AccentColor::rendered_primary`] without changing the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AccentColor {
    #[default]
    Default,
    Ocean,
    Teal,
    Forest,
    Green,
    Purple,
    Red,
    Orange,
}

impl AccentColor {
    /// All palette members, `Default` first.
    pub const ALL: [Self; 8] = [
        Self::Default,
        Self::Ocean,
        Self::Teal,
        Self::Forest,
        Self::Green,
        Self::Purple,
        Self::Red,
        Self::Orange,
    ];

    /// The persisted/displayed name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Default => "DEFAULT",
            Self::Ocean => "OCEAN",
            Self::Teal => "TEAL",
            Self::Forest => "FOREST",
            Self::Green => "GREEN",
            Self::Purple => "PURPLE",
            Self::Red => "RED",
            Self::Orange => "ORANGE",
        }
    }

    /// Light-mode primary hex.
    pub fn primary_hex(self) -> &'static str {
        match self {
            Self::Default => "#6366f1",
            Self::Ocean => "#0ea5e9",
            Self::Teal => "#14b8a6",
            Self::Forest => "#15803d",
            Self::Green => "#22c55e",
            Self::Purple => "#a855f7",
            Self::Red => "#ef4444",
            Self::Orange => "#f97316",
        }
    }

    /// Light-mode secondary hex.
    pub fn secondary_hex(self) -> &'static str {
        match self {
            Self::Default => "#8b5cf6",
            Self::Ocean => "#0369a1",
            Self::Teal => "#0f766e",
            Self::Forest => "#166534",
            Self::Green => "#16a34a",
            Self::Purple => "#7c3aed",
            Self::Red => "#b91c1c",
            Self::Orange => "#c2410c",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Default => "Indigo and violet",
            Self::Ocean => "Deep sky blues",
            Self::Teal => "Calm teal tones",
            Self::Forest => "Deep forest greens",
            Self::Green => "Fresh greens",
            Self::Purple => "Vivid purples",
            Self::Red => "Warm reds",
            Self::Orange => "Bright oranges",
        }
    }

    /// Normalize a persisted or user-supplied name to a palette member.
    ///
    /// Unknown names fall back to `Default`; matching is case- and
    /// whitespace-insensitive to tolerate hand-edited storage.
    pub fn from_name(name: &str) -> Self {
        let normalized = name.trim().to_ascii_uppercase();
        let found = Self::ALL
            .iter()
            .copied()
            .find(|accent| accent.name() == normalized);
        match found {
            Some(accent) => accent,
            None => {
                debug!(accent.name = name, "Unknown accent color, falling back to DEFAULT");
                Self::Default
            }
        }
    }

    /// Primary hex as rendered for the given mode.
    ///
    /// Dark mode darkens the hue; the selected color name is unaffected.
    pub fn rendered_primary(self, dark_mode: bool) -> String {
        if dark_mode {
            color::darken(self.primary_hex(), 0.12)
        } else {
            self.primary_hex().to_string()
        }
    }

    /// Secondary hex as rendered for the given mode.
    pub fn rendered_secondary(self, dark_mode: bool) -> String {
        if dark_mode {
            color::darken(self.secondary_hex(), 0.12)
        } else {
            self.secondary_hex().to_string()
        }
    }

    /// CSS gradient built from the hex pair, as stored alongside it.
    pub fn gradient(self) -> String {
        format!(
            "linear-gradient(135deg, {} 0%, {} 100%)",
            self.primary_hex(),
            self.secondary_hex()
        )
    }
}

impl fmt::Display for AccentColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Wire form of the accent color under [`ACCENT_KEY`].
///
/// The hex fields are denormalized copies for CSS consumers that read
/// storage directly; on load only `name` is trusted and the rest is
/// re-derived from the palette.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredAccent {
    pub name: String,
    pub primary: String,
    pub secondary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<AccentColor> for StoredAccent {
    fn from(accent: AccentColor) -> Self {
        Self {
            name: accent.name().to_string(),
            primary: accent.primary_hex().to_string(),
            secondary: accent.secondary_hex().to_string(),
            gradient: Some(accent.gradient()),
            description: Some(accent.description().to_string()),
        }
    }
}

/// The fixed set of CSS background patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackgroundPattern {
    /// No pattern; the document carries no `data-background` attribute.
    #[default]
    None,
    Glass1,
    Glass2,
    Glass3,
    Glass4,
    Glass5,
}

impl BackgroundPattern {
    pub const ALL: [Self; 6] = [
        Self::None,
        Self::Glass1,
        Self::Glass2,
        Self::Glass3,
        Self::Glass4,
        Self::Glass5,
    ];

    /// The persisted id; empty string for `None`.
    pub fn id(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Glass1 => "pattern-glass-1",
            Self::Glass2 => "pattern-glass-2",
            Self::Glass3 => "pattern-glass-3",
            Self::Glass4 => "pattern-glass-4",
            Self::Glass5 => "pattern-glass-5",
        }
    }

    /// Normalize a persisted or user-supplied id.
    ///
    /// Empty means no pattern; unknown ids also fall back to `None`.
    pub fn from_id(id: &str) -> Self {
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Self::None;
        }
        let found = Self::ALL.iter().copied().find(|p| p.id() == trimmed);
        match found {
            Some(pattern) => pattern,
            None => {
                debug!(background.id = id, "Unknown background pattern, falling back to none");
                Self::None
            }
        }
    }
}

impl fmt::Display for BackgroundPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// The fixed set of loaded font families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontChoice {
    #[default]
    Inter,
    Roboto,
    Poppins,
    Lato,
    JetBrainsMono,
}

impl FontChoice {
    pub const ALL: [Self; 5] = [
        Self::Inter,
        Self::Roboto,
        Self::Poppins,
        Self::Lato,
        Self::JetBrainsMono,
    ];

    /// The persisted id.
    pub fn id(self) -> &'static str {
        match self {
            Self::Inter => "inter",
            Self::Roboto => "roboto",
            Self::Poppins => "poppins",
            Self::Lato => "lato",
            Self::JetBrainsMono => "jetbrains-mono",
        }
    }

    /// CSS font-family stack for this choice.
    pub fn family(self) -> &'static str {
        match self {
            Self::Inter => "'Inter', sans-serif",
            Self::Roboto => "'Roboto', sans-serif",
            Self::Poppins => "'Poppins', sans-serif",
            Self::Lato => "'Lato', sans-serif",
            Self::JetBrainsMono => "'JetBrains Mono', monospace",
        }
    }

    /// Normalize a persisted or user-supplied id; unknown ids fall back
    /// to the default font.
    pub fn from_id(id: &str) -> Self {
        let normalized = id.trim().to_ascii_lowercase();
        let found = Self::ALL.iter().copied().find(|f| f.id() == normalized);
        match found {
            Some(font) => font,
            None => {
                debug!(font.id = id, "Unknown font id, falling back to default");
                Self::default()
            }
        }
    }
}

impl fmt::Display for FontChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// The complete theme state for one tab. Immutable per update cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThemeSettings {
    pub dark_mode: bool,
    pub accent: AccentColor,
    pub background: BackgroundPattern,
    pub font: FontChoice,
}

impl ThemeSettings {
    /// Load the current settings from storage.
    ///
    /// Each field is read independently with its own default, so a
    /// corrupt accent blob does not discard a valid dark mode flag.
    /// Total: always returns a fully-defined value.
    pub fn load(settings: &Settings) -> Self {
        let dark_mode = settings.get_bool(DARK_MODE_KEY, false);
        let accent = settings
            .get_json(ACCENT_KEY, StoredAccent::from(AccentColor::default()));
        let accent = AccentColor::from_name(&accent.name);
        let background = BackgroundPattern::from_id(&settings.get_string(BACKGROUND_KEY, ""));
        let font = FontChoice::from_id(&settings.get_string(FONT_KEY, FontChoice::default().id()));

        Self {
            dark_mode,
            accent,
            background,
            font,
        }
    }

    /// Write every field to storage, best-effort and per-key.
    ///
    /// There is no multi-key transaction; last write wins per key. A
    /// partial write is safe because each key loads and validates
    /// independently.
    pub fn persist(&self, settings: &Settings) {
        settings.set_bool(DARK_MODE_KEY, self.dark_mode);
        settings.set_json(ACCENT_KEY, &StoredAccent::from(self.accent));
        settings.set_string(BACKGROUND_KEY, self.background.id());
        settings.set_string(FONT_KEY, self.font.id());
    }

    /// The value reflected into `data-theme-mode`.
    pub fn mode_name(&self) -> &'static str {
        if self.dark_mode { "dark" } else { "light" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn memory_settings() -> Settings {
        Settings::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_accent_from_name_known() {
        assert_eq!(AccentColor::from_name("OCEAN"), AccentColor::Ocean);
        assert_eq!(AccentColor::from_name(" forest "), AccentColor::Forest);
    }

    #[test]
    fn test_accent_from_name_unknown_falls_back() {
        assert_eq!(AccentColor::from_name("MAGENTA-999"), AccentColor::Default);
        assert_eq!(AccentColor::from_name(""), AccentColor::Default);
    }

    #[test]
    fn test_accent_rendered_dark_keeps_name() {
        let accent = AccentColor::Ocean;
        let light = accent.rendered_primary(false);
        let dark = accent.rendered_primary(true);
        assert_eq!(light, accent.primary_hex());
        assert_ne!(light, dark);
        // Mode changes the rendering only; the selection is unaffected.
        assert_eq!(accent.name(), "OCEAN");
    }

    #[test]
    fn test_background_from_id() {
        assert_eq!(
            BackgroundPattern::from_id("pattern-glass-3"),
            BackgroundPattern::Glass3
        );
        assert_eq!(BackgroundPattern::from_id(""), BackgroundPattern::None);
        assert_eq!(
            BackgroundPattern::from_id("pattern-marble-9"),
            BackgroundPattern::None
        );
    }

    #[test]
    fn test_font_from_id() {
        assert_eq!(FontChoice::from_id("roboto"), FontChoice::Roboto);
        assert_eq!(FontChoice::from_id("JETBRAINS-MONO"), FontChoice::JetBrainsMono);
        assert_eq!(FontChoice::from_id("comic-sans"), FontChoice::Inter);
    }

    #[test]
    fn test_load_defaults_on_empty_store() {
        let settings = memory_settings();
        assert_eq!(ThemeSettings::load(&settings), ThemeSettings::default());
    }

    #[test]
    fn test_persist_load_round_trip() {
        let settings = memory_settings();
        let state = ThemeSettings {
            dark_mode: true,
            accent: AccentColor::Purple,
            background: BackgroundPattern::Glass5,
            font: FontChoice::Poppins,
        };
        state.persist(&settings);
        assert_eq!(ThemeSettings::load(&settings), state);
    }

    #[test]
    fn test_load_tolerates_partial_corruption() {
        let settings = memory_settings();
        settings.set_bool(DARK_MODE_KEY, true);
        settings.set_string(ACCENT_KEY, "{broken json");
        settings.set_string(BACKGROUND_KEY, "pattern-unknown");

        let state = ThemeSettings::load(&settings);
        assert!(state.dark_mode);
        assert_eq!(state.accent, AccentColor::Default);
        assert_eq!(state.background, BackgroundPattern::None);
        assert_eq!(state.font, FontChoice::Inter);
    }

    #[test]
    fn test_stored_accent_trusts_name_only() {
        let settings = memory_settings();
        // Hex fields lie; the palette name wins on load.
        settings.set_json(
            ACCENT_KEY,
            &StoredAccent {
                name: "TEAL".into(),
                primary: "#ff0000".into(),
                secondary: "#00ff00".into(),
                gradient: None,
                description: None,
            },
        );
        assert_eq!(ThemeSettings::load(&settings).accent, AccentColor::Teal);
    }

    #[test]
    fn test_mode_name() {
        let mut state = ThemeSettings::default();
        assert_eq!(state.mode_name(), "light");
        state.dark_mode = true;
        assert_eq!(state.mode_name(), "dark");
    }
}

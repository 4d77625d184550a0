//! Hex color helpers for mode-dependent accent rendering.
//!
//! Dark mode re-derives the *rendering* of the selected accent (a darker
//! variant of the same named color); it never changes which accent is
//! selected. The HSL round-trip here backs that derivation.

use tracing::trace;

/// Parse a `#rrggbb` hex string into RGB components.
///
/// Returns `None` for anything that is not exactly `#` plus six hex digits.
pub fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
    let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
    let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Darken a hex color by reducing HSL lightness by `amount` (0.0–1.0).
///
/// Unparseable input is returned unchanged; cosmetic derivation must never
/// fail louder than that.
pub fn darken(hex: &str, amount: f32) -> String {
    let Some((r, g, b)) = parse_hex(hex) else {
        trace!(color.hex = %hex, "darken: unparseable hex, returning input");
        return hex.to_string();
    };

    let (h, s, l) = rgb_to_hsl(r, g, b);
    let l = (l - amount.clamp(0.0, 1.0)).max(0.0);
    let (nr, ng, nb) = hsl_to_rgb(h, s, l);
    format!("#{nr:02x}{ng:02x}{nb:02x}")
}

#[allow(clippy::many_single_char_names)]
fn rgb_to_hsl(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = f32::midpoint(max, min);

    if (max - min).abs() < f32::EPSILON {
        return (0.0, 0.0, l);
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };

    let mut h = if (max - r).abs() < f32::EPSILON {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if (max - g).abs() < f32::EPSILON {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    h /= 6.0;
    (h * 360.0, s, l)
}

#[allow(clippy::many_single_char_names, clippy::suboptimal_flops)]
fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (u8, u8, u8) {
    if s == 0.0 {
        let v = (l * 255.0).round() as u8;
        return (v, v, v);
    }

    let h = h / 360.0;
    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;

    fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 1.0 / 2.0 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    }

    let r = hue_to_rgb(p, q, h + 1.0 / 3.0);
    let g = hue_to_rgb(p, q, h);
    let b = hue_to_rgb(p, q, h - 1.0 / 3.0);

    (
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_valid() {
        assert_eq!(parse_hex("#ff8800"), Some((0xff, 0x88, 0x00)));
        assert_eq!(parse_hex("#000000"), Some((0, 0, 0)));
    }

    #[test]
    fn test_parse_hex_invalid() {
        assert_eq!(parse_hex("ff8800"), None);
        assert_eq!(parse_hex("#fff"), None);
        assert_eq!(parse_hex("#gggggg"), None);
        assert_eq!(parse_hex(""), None);
    }

    #[test]
    fn test_darken_reduces_lightness() {
        let darker = darken("#8080ff", 0.2);
        let (_, _, l_before) = rgb_to_hsl(0x80, 0x80, 0xff);
        let (r, g, b) = parse_hex(&darker).unwrap();
        let (_, _, l_after) = rgb_to_hsl(r, g, b);
        assert!(l_after < l_before);
    }

    #[test]
    fn test_darken_zero_is_near_identity() {
        // One HSL round trip may shift a component by a rounding step.
        let (r, g, b) = parse_hex(&darken("#22d3ee", 0.0)).unwrap();
        assert!((i16::from(r) - 0x22).abs() <= 1);
        assert!((i16::from(g) - 0xd3).abs() <= 1);
        assert!((i16::from(b) - 0xee).abs() <= 1);
    }

    #[test]
    fn test_darken_unparseable_passthrough() {
        assert_eq!(darken("not-a-color", 0.3), "not-a-color");
    }

    #[test]
    fn test_darken_floor_at_black() {
        assert_eq!(darken("#101010", 1.0), "#000000");
    }
}

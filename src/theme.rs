//! Color palette for Pipsea's TUI.
//!
//! A single opinionated dark palette used by all rendering code: neutral
//! background layers, two text emphasis levels, and a handful of accents
//! for semantic states (ok/warn/error) and focus highlights.

use ratatui::style::Color;

/// Palette consumed by the rendering code in [`crate::ui`].
pub struct Theme {
    /// Primary background color for the whole canvas.
    pub base: Color,
    /// Border color for unfocused panes.
    pub surface1: Color,
    /// Border color for secondary chrome.
    pub surface2: Color,
    /// Muted foreground for titles and captions.
    pub overlay1: Color,
    /// Primary foreground text color.
    pub text: Color,
    /// Secondary text for de-emphasized content.
    pub subtext0: Color,
    /// Focus/selection accent.
    pub mauve: Color,
    /// Informational accent for interactive hints.
    pub sapphire: Color,
    /// Success/positive state color.
    pub green: Color,
    /// Warning/attention state color.
    pub yellow: Color,
    /// Error/danger state color.
    pub red: Color,
    /// Row highlight accent.
    pub lavender: Color,
}

/// Build a [`Color::Rgb`] from an 8-bit triplet; keeps the palette terse.
const fn hex(rgb: (u8, u8, u8)) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

/// Return the application palette.
pub const fn theme() -> Theme {
    Theme {
        base: hex((0x1e, 0x1e, 0x2e)),
        surface1: hex((0x45, 0x47, 0x5a)),
        surface2: hex((0x58, 0x5b, 0x70)),
        overlay1: hex((0x7f, 0x84, 0x9c)),
        text: hex((0xcd, 0xd6, 0xf4)),
        subtext0: hex((0xa6, 0xad, 0xc8)),
        mauve: hex((0xcb, 0xa6, 0xf7)),
        sapphire: hex((0x74, 0xc7, 0xec)),
        green: hex((0xa6, 0xe3, 0xa1)),
        yellow: hex((0xf9, 0xe2, 0xaf)),
        red: hex((0xf3, 0x8b, 0xa8)),
        lavender: hex((0xb4, 0xbe, 0xfe)),
    }
}

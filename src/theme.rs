//! Terminal theme for tour overlays
//!
//! Colors and pre-built styles for the step bubble, plus conversion from the
//! CSS-style highlight maps tours apply to page elements into ratatui styles.
//!
//! # Usage
//! ```rust
//! use guided_tour::theme::{css_color, Styles};
//! use ratatui::style::Color;
//!
//! assert_eq!(css_color("#fff"), Some(Color::Rgb(255, 255, 255)));
//! let title = Styles::title();
//! ```

use ratatui::style::{Color, Modifier, Style};
use std::collections::BTreeMap;
use std::str::FromStr;

// =============================================================================
// COLOR PALETTE
// =============================================================================

/// Core color palette
pub struct Colors;

impl Colors {
    /// Bubble background
    pub const BG_BUBBLE: Color = Color::Rgb(20, 20, 30);

    /// Default foreground text color
    pub const FG_PRIMARY: Color = Color::White;

    /// Disabled/inactive text color
    pub const FG_MUTED: Color = Color::DarkGray;

    /// Accent used for borders, titles and the arrow
    pub const PRIMARY: Color = Color::Cyan;

    /// Secondary accent (step counter)
    pub const SECONDARY: Color = Color::Yellow;

    /// Selected button background
    pub const SELECTED_BG: Color = Color::Rgb(50, 136, 230);

    /// Selected button text
    pub const SELECTED_FG: Color = Color::White;

    /// Cancel link
    pub const CANCEL: Color = Color::LightRed;
}

// =============================================================================
// PRE-BUILT STYLES
// =============================================================================

/// Pre-built styles for the overlay and demo screens
pub struct Styles;

impl Styles {
    /// Default text style
    pub fn text() -> Style {
        Style::default().fg(Colors::FG_PRIMARY)
    }

    /// Muted/secondary text
    pub fn text_muted() -> Style {
        Style::default().fg(Colors::FG_MUTED)
    }

    /// Bubble title (cyan, bold)
    pub fn title() -> Style {
        Style::default()
            .fg(Colors::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    /// Bubble border
    pub fn border() -> Style {
        Style::default().fg(Colors::PRIMARY)
    }

    /// Bubble background
    pub fn bubble() -> Style {
        Style::default().bg(Colors::BG_BUBBLE)
    }

    /// Step counter ("2/5")
    pub fn counter() -> Style {
        Style::default().fg(Colors::SECONDARY)
    }

    /// Selected button
    pub fn button_active() -> Style {
        Style::default()
            .fg(Colors::SELECTED_FG)
            .bg(Colors::SELECTED_BG)
            .add_modifier(Modifier::BOLD)
    }

    /// Unselected primary button
    pub fn button_primary() -> Style {
        Style::default()
            .fg(Colors::FG_PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    /// Unselected secondary button
    pub fn button_secondary() -> Style {
        Style::default().fg(Colors::FG_MUTED)
    }

    /// Cancel link
    pub fn cancel_link() -> Style {
        Style::default().fg(Colors::CANCEL)
    }
}

// =============================================================================
// CSS CONVERSION
// =============================================================================

/// Parse a CSS color: `#rgb`, `#rrggbb`, or a named color
pub fn css_color(value: &str) -> Option<Color> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        if hex.len() == 3 && hex.is_ascii() {
            let channel = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|v| v * 17);
            return Some(Color::Rgb(channel(0)?, channel(1)?, channel(2)?));
        }
    }
    Color::from_str(value).ok()
}

/// Style for an element given its inline CSS.
///
/// `background`/`background-color` map to the background, `color` to the
/// foreground and `font-weight: bold` to bold; other properties are ignored.
pub fn inline_style(css: &BTreeMap<String, String>) -> Style {
    let mut style = Style::default();
    for (property, value) in css {
        match property.as_str() {
            "background" | "background-color" => {
                if let Some(color) = css_color(value) {
                    style = style.bg(color);
                }
            }
            "color" => {
                if let Some(color) = css_color(value) {
                    style = style.fg(color);
                }
            }
            "font-weight" if value == "bold" => {
                style = style.add_modifier(Modifier::BOLD);
            }
            _ => {}
        }
    }
    style
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_color_forms() {
        assert_eq!(css_color("#3288e6"), Some(Color::Rgb(0x32, 0x88, 0xe6)));
        assert_eq!(css_color("#fff"), Some(Color::Rgb(255, 255, 255)));
        assert_eq!(css_color("red"), Some(Color::Red));
        assert_eq!(css_color("#zzz"), None);
    }

    #[test]
    fn test_inline_style_maps_highlight() {
        let mut css = BTreeMap::new();
        css.insert("background".to_string(), "#3288e6".to_string());
        css.insert("color".to_string(), "#fff".to_string());
        css.insert("outline".to_string(), "1px".to_string());

        let style = inline_style(&css);
        assert_eq!(style.bg, Some(Color::Rgb(0x32, 0x88, 0xe6)));
        assert_eq!(style.fg, Some(Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_empty_css_is_default_style() {
        assert_eq!(inline_style(&BTreeMap::new()), Style::default());
    }
}

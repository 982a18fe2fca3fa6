//! Theme colors, with optional hex overrides from the `[theme]` config table

use ratatui::style::Color;

use crate::config::ThemeConfig;

/// Theme colors for the UI
#[derive(Debug, Clone)]
pub struct Theme {
    pub accent: Color,      // Active borders, focused field
    pub danger: Color,      // Field errors, failed saves
    pub success: Color,     // Saved, in stock
    pub warning: Color,     // Status line, low stock
    pub text: Color,        // Primary text
    pub text_dim: Color,    // Hints, empty values
    pub bg_selected: Color, // Selected row / focused input
    pub inactive: Color,    // Inactive borders
    pub header: Color,      // Table headers, section titles
}

impl Default for Theme {
    fn default() -> Self {
        // Catppuccin-inspired
        Self {
            accent: Color::Rgb(250, 179, 135),
            danger: Color::Rgb(243, 139, 168),
            success: Color::Rgb(166, 218, 149),
            warning: Color::Rgb(249, 226, 175),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            bg_selected: Color::Rgb(69, 71, 90),
            inactive: Color::Rgb(88, 91, 112),
            header: Color::Rgb(137, 180, 250),
        }
    }
}

impl Theme {
    /// Default palette with any valid config overrides applied
    pub fn from_config(config: &ThemeConfig) -> Self {
        let mut theme = Self::default();

        let pick = |value: &Option<String>, fallback: Color| {
            value.as_deref().and_then(parse_hex_color).unwrap_or(fallback)
        };

        theme.accent = pick(&config.accent, theme.accent);
        theme.danger = pick(&config.danger, theme.danger);
        theme.success = pick(&config.success, theme.success);
        theme.warning = pick(&config.warning, theme.warning);
        theme.text = pick(&config.text, theme.text);
        theme
    }
}

/// Parse a hex color string (#RRGGBB or #RGB)
pub fn parse_hex_color(s: &str) -> Option<Color> {
    let s = s.trim().trim_start_matches('#');
    if !s.is_ascii() {
        return None;
    }

    if s.len() == 6 {
        let r = u8::from_str_radix(&s[0..2], 16).ok()?;
        let g = u8::from_str_radix(&s[2..4], 16).ok()?;
        let b = u8::from_str_radix(&s[4..6], 16).ok()?;
        Some(Color::Rgb(r, g, b))
    } else if s.len() == 3 {
        let r = u8::from_str_radix(&s[0..1], 16).ok()? * 17;
        let g = u8::from_str_radix(&s[1..2], 16).ok()? * 17;
        let b = u8::from_str_radix(&s[2..3], 16).ok()? * 17;
        Some(Color::Rgb(r, g, b))
    } else {
        None
    }
}

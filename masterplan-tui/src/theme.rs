//! Kanagawa Dragon theme module.
//!
//! Low-contrast, warm, dark palette for the chrome; chart bars keep the
//! plan's own phase colours.

use ratatui::style::Color;

use crate::goals::RatioBand;
use crate::models::PhaseColor;

/// Opacity of rows outside the highlighted dependency chain
pub const DIMMED_OPACITY: f32 = 0.25;

/// Kanagawa Dragon color palette
pub mod colors {
    use super::Color;

    // === Background Colors ===
    /// Dragon Black - Primary background
    pub const BG_DARK: Color = Color::Rgb(0x18, 0x16, 0x16);
    /// Slightly lighter background for panels
    pub const BG_MEDIUM: Color = Color::Rgb(0x1D, 0x1C, 0x19);
    /// Background for highlighted/selected areas
    pub const BG_HIGHLIGHT: Color = Color::Rgb(0x28, 0x27, 0x27);

    // === Foreground Colors ===
    /// Old White - Primary text color
    pub const FG_PRIMARY: Color = Color::Rgb(0xC5, 0xC9, 0xC5);
    /// Dimmed text for secondary information
    pub const FG_DIM: Color = Color::Rgb(0x72, 0x71, 0x69);
    /// Very dim text for hints and placeholders
    pub const FG_HINT: Color = Color::Rgb(0x54, 0x54, 0x54);

    // === Accent Colors ===
    pub const RED: Color = Color::Rgb(0xC4, 0x74, 0x6E);
    pub const GREEN: Color = Color::Rgb(0x8A, 0x9A, 0x7B);
    pub const YELLOW: Color = Color::Rgb(0xC4, 0xB2, 0x8A);
    pub const BLUE: Color = Color::Rgb(0x8B, 0xA4, 0xB0);
    pub const PURPLE: Color = Color::Rgb(0x95, 0x7F, 0xB8);

    // === UI Element Colors ===
    /// Wall Gray - For borders and separators
    pub const BORDER: Color = Color::Rgb(0x72, 0x71, 0x69);
    /// Dim border for less important separators
    pub const BORDER_DIM: Color = Color::Rgb(0x3A, 0x3A, 0x3A);
    /// Accent border for focused elements
    pub const BORDER_ACCENT: Color = Color::Rgb(0x8B, 0xA4, 0xB0);

    // === Timeline Colors ===
    /// Today marker line
    pub const TODAY_MARKER: Color = RED;
    /// Milestone reference lines
    pub const MILESTONE: Color = Color::Rgb(0x94, 0xA3, 0xB8);
}

/// Terminal colour of a phase
pub fn phase_color(color: PhaseColor) -> Color {
    Color::Rgb(color.0, color.1, color.2)
}

/// Blend `color` over the chart background at `opacity`
pub fn fade(color: Color, opacity: f32) -> Color {
    match (color, colors::BG_DARK) {
        (Color::Rgb(r1, g1, b1), Color::Rgb(r2, g2, b2)) => {
            let a = opacity.clamp(0.0, 1.0);
            let mix = |fg: u8, bg: u8| (fg as f32 * a + bg as f32 * (1.0 - a)).round() as u8;
            Color::Rgb(mix(r1, r2), mix(g1, g2), mix(b1, b2))
        }
        _ => color,
    }
}

/// Colour of the salary balance figure
pub fn ratio_color(band: RatioBand) -> Color {
    match band {
        RatioBand::Healthy => Color::Rgb(0x22, 0xC5, 0x5E),
        RatioBand::Caution => Color::Rgb(0xF5, 0x9E, 0x0B),
        RatioBand::Alert => Color::Rgb(0xEF, 0x44, 0x44),
        RatioBand::Unknown => Color::Rgb(0xE2, 0xE8, 0xF0),
    }
}

/// Semantic styling helpers
pub mod styles {
    use ratatui::style::{Modifier, Style};
    use super::colors;

    /// Style for primary text
    pub fn text() -> Style {
        Style::default().fg(colors::FG_PRIMARY)
    }

    /// Style for dimmed/secondary text
    pub fn text_dim() -> Style {
        Style::default().fg(colors::FG_DIM)
    }

    /// Style for hint text
    pub fn text_hint() -> Style {
        Style::default().fg(colors::FG_HINT)
    }

    pub fn info() -> Style {
        Style::default().fg(colors::BLUE)
    }

    /// Style for selected/highlighted items
    pub fn selected() -> Style {
        Style::default()
            .fg(colors::BG_DARK)
            .bg(colors::BLUE)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for focused borders
    pub fn border_focused() -> Style {
        Style::default().fg(colors::BORDER_ACCENT)
    }

    /// Style for unfocused borders
    pub fn border() -> Style {
        Style::default().fg(colors::BORDER)
    }

    /// Style for dim borders
    pub fn border_dim() -> Style {
        Style::default().fg(colors::BORDER_DIM)
    }

    /// Style for block titles
    pub fn title() -> Style {
        Style::default()
            .fg(colors::FG_PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for accent titles (tabs, headers)
    pub fn title_accent() -> Style {
        Style::default()
            .fg(colors::BLUE)
            .add_modifier(Modifier::BOLD)
    }

    pub fn tab_active() -> Style {
        Style::default()
            .fg(colors::BLUE)
            .add_modifier(Modifier::BOLD)
    }

    pub fn tab_inactive() -> Style {
        Style::default().fg(colors::FG_DIM)
    }

    /// Style for form labels
    pub fn form_label() -> Style {
        Style::default().fg(colors::FG_DIM)
    }

    /// Style for form input (focused)
    pub fn form_input_focused() -> Style {
        Style::default()
            .fg(colors::FG_PRIMARY)
            .bg(colors::BG_HIGHLIGHT)
    }

    /// Style for form input (unfocused)
    pub fn form_input() -> Style {
        Style::default()
            .fg(colors::FG_PRIMARY)
            .bg(colors::BG_MEDIUM)
    }

    /// Style for filter chips that are switched off
    pub fn chip_off() -> Style {
        Style::default()
            .fg(colors::FG_HINT)
            .add_modifier(Modifier::CROSSED_OUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_extremes() {
        let sky = phase_color(PhaseColor(0x0E, 0xA5, 0xE9));
        assert_eq!(fade(sky, 1.0), sky);
        assert_eq!(fade(sky, 0.0), colors::BG_DARK);
        assert_eq!(fade(Color::Reset, 0.25), Color::Reset);
    }

    #[test]
    fn test_fade_quarter() {
        // 0.25 * 0xEF + 0.75 * 0x18 = 77.75
        let faded = fade(Color::Rgb(0xEF, 0xEF, 0xEF), DIMMED_OPACITY);
        assert_eq!(faded, Color::Rgb(78, 76, 76));
    }
}

// src/ui.rs
use iced::{Color, Theme};
use once_cell::sync::Lazy;

/// Accent colours drawn on top of the built-in iced theme.
pub struct Styles {
    pub theme: Theme,
    pub muted: Color,
    pub accent: Color,
    pub error: Color,
    pub notice: Color,
    pub connected: Color,
}

pub static DARK_THEME: Lazy<Styles> = Lazy::new(|| Styles {
    theme: Theme::Dark,
    muted: Color::from_rgb(0.6, 0.6, 0.6),
    accent: Color::from_rgb(0.0078, 0.325, 0.6118), // #02539c
    error: Color::from_rgb(0.95, 0.4, 0.4),
    notice: Color::from_rgb(0.95, 0.75, 0.3),
    connected: Color::from_rgb(0.4, 0.85, 0.5),
});

pub static LIGHT_THEME: Lazy<Styles> = Lazy::new(|| Styles {
    theme: Theme::Light,
    muted: Color::from_rgb(0.4, 0.4, 0.4),
    accent: Color::from_rgb(0.0078, 0.325, 0.6118), // #02539c
    error: Color::from_rgb(0.75, 0.1, 0.1),
    notice: Color::from_rgb(0.7, 0.45, 0.0),
    connected: Color::from_rgb(0.1, 0.55, 0.2),
});

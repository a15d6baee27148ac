//! Report palette, built on owo-colors.

use owo_colors::{OwoColorize, Style};

/// Semantic styles used by the report; plain text when colors are off.
pub trait SemanticStyle {
    /// Green bold, for the completion line.
    fn success(&self) -> String;
    /// Dimmed, for field labels.
    fn muted(&self) -> String;
    /// Cyan bold, for the headline numbers.
    fn metric(&self) -> String;
    /// Blue, for paths.
    fn code(&self) -> String;
}

fn paint<T: std::fmt::Display>(value: &T, style: Style) -> String {
    if super::no_color() {
        value.to_string()
    } else {
        value.style(style).to_string()
    }
}

impl<T: std::fmt::Display> SemanticStyle for T {
    fn success(&self) -> String {
        paint(self, Style::new().green().bold())
    }

    fn muted(&self) -> String {
        paint(self, Style::new().dimmed())
    }

    fn metric(&self) -> String {
        paint(self, Style::new().cyan().bold())
    }

    fn code(&self) -> String {
        paint(self, Style::new().blue())
    }
}

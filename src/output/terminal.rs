//! ANSI terminal styling

use std::io::IsTerminal;

pub mod colors {
    pub const GREY: u8 = 102;      // #7D7D7D - Punctuation, secondary
    pub const AQUA: u8 = 109;      // #7A9EB5 - Numbers, info
    pub const ORANGE: u8 = 208;    // #F2913D - Warnings, PUT/PATCH
    pub const RED: u8 = 167;       // #E34F45 - Errors, DELETE
    pub const BLUE: u8 = 68;       // #426BD1 - Names, labels
    pub const GREEN: u8 = 71;      // #63C27A - Success, GET
    pub const YELLOW: u8 = 185;    // #CCCC3D - POST, redirects
}

/// ANSI escape code constants
pub const RESET: &str = "\x1b[0m";

/// Generate foreground color escape code
#[inline]
pub fn fg(color: u8) -> String {
    format!("\x1b[38;5;{}m", color)
}

/// Generate bold foreground color escape code
#[inline]
pub fn bold_fg(color: u8) -> String {
    format!("\x1b[1;38;5;{}m", color)
}

/// Styling that can be switched off for pipes and `NO_COLOR`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    enabled: bool,
}

impl Style {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// No escape codes at all
    pub fn plain() -> Self {
        Self::new(false)
    }

    /// Colors only when stdout is a terminal and `NO_COLOR` is unset
    pub fn detect() -> Self {
        Self::new(std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none())
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    fn paint(&self, text: &str, color: u8, bold: bool) -> String {
        if !self.enabled {
            return text.to_string();
        }
        let code = if bold { bold_fg(color) } else { fg(color) };
        format!("{}{}{}", code, text, RESET)
    }

    /// Success message (bold green)
    pub fn success(&self, text: &str) -> String {
        self.paint(text, colors::GREEN, true)
    }

    /// Error message (bold red)
    pub fn error(&self, text: &str) -> String {
        self.paint(text, colors::RED, true)
    }

    /// Warning message (bold orange)
    pub fn warning(&self, text: &str) -> String {
        self.paint(text, colors::ORANGE, true)
    }

    /// Label/name (blue)
    pub fn label(&self, text: &str) -> String {
        self.paint(text, colors::BLUE, false)
    }

    /// Number (aqua)
    pub fn number(&self, text: &str) -> String {
        self.paint(text, colors::AQUA, false)
    }

    /// Secondary/muted text (grey)
    pub fn muted(&self, text: &str) -> String {
        self.paint(text, colors::GREY, false)
    }

    /// HTTP status code, colored by class
    pub fn http_status(&self, code: u16, text: &str) -> String {
        let color = match code / 100 {
            1 => colors::AQUA,   // Informational
            2 => colors::GREEN,  // Success
            3 => colors::YELLOW, // Redirect
            4 => colors::ORANGE, // Client error
            5 => colors::RED,    // Server error
            _ => colors::GREY,
        };
        self.paint(text, color, true)
    }

    /// HTTP method, colored by verb
    pub fn http_method(&self, method: &str) -> String {
        let color = match method.to_uppercase().as_str() {
            "GET" | "HEAD" | "OPTIONS" => colors::GREEN,
            "POST" => colors::YELLOW,
            "PUT" | "PATCH" => colors::ORANGE,
            "DELETE" => colors::RED,
            _ => colors::GREY,
        };
        self.paint(method, color, true)
    }
}

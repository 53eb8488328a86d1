use ratatui::style::Color;
use std::fmt;

use crate::view::{ExitStyle, Severity};

/// 24-bit true color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrueColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl TrueColor {
    /// Create a new true color from RGB values
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Convert to hex string
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for TrueColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<TrueColor> for Color {
    fn from(c: TrueColor) -> Self {
        Color::Rgb(c.r, c.g, c.b)
    }
}

/// Colors used by the page
#[derive(Debug, Clone)]
pub struct Palette {
    pub background: TrueColor,
    pub text: TrueColor,
    pub muted: TrueColor,
    pub accent: TrueColor,
    pub command: TrueColor,

    pub safe: TrueColor,
    pub info: TrueColor,
    pub warning: TrueColor,
    pub danger: TrueColor,
}

impl Palette {
    /// Dark palette with muted severity colors
    #[must_use]
    pub fn default_dark() -> Self {
        Self {
            background: TrueColor::new(0x00, 0x00, 0x00), // #000000
            text: TrueColor::new(0xC0, 0xB0, 0xB0),       // #C0B0B0 - reddish gray
            muted: TrueColor::new(0x5A, 0x4A, 0x4A),      // #5A4A4A
            accent: TrueColor::new(0x7A, 0x8A, 0xAA),     // #7A8AAA - cool light blue
            command: TrueColor::new(0x6A, 0x9A, 0x7A),    // #6A9A7A - muted green

            safe: TrueColor::new(0x5A, 0x8A, 0x6A),    // #5A8A6A
            info: TrueColor::new(0x5A, 0x8A, 0x8A),    // #5A8A8A - dark teal
            warning: TrueColor::new(0xC8, 0xA8, 0x70), // #C8A870 - muted gold
            danger: TrueColor::new(0xDD, 0x66, 0x66),  // #DD6666
        }
    }

    #[must_use]
    pub fn severity(&self, severity: Severity) -> TrueColor {
        match severity {
            Severity::Safe => self.safe,
            Severity::Info => self.info,
            Severity::Warning => self.warning,
            Severity::Danger => self.danger,
        }
    }

    #[must_use]
    pub fn exit_code(&self, style: ExitStyle) -> TrueColor {
        match style {
            ExitStyle::Success => self.safe,
            ExitStyle::Failure => self.danger,
            ExitStyle::Neutral => self.text,
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::default_dark()
    }
}

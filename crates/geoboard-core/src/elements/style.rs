//! Element styling and attribute maps.

use std::collections::BTreeMap;
use std::fmt;

use peniko::Color;
use serde::{Deserialize, Serialize};

/// An 8-bit RGBA color, serialized as `#rrggbb` or `#rrggbbaa`.
///
/// The string `none` parses as fully transparent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// A color from 8-bit channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Fully transparent black.
    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Whether the alpha channel is zero.
    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Parse a hex color string.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("none") {
            return Some(Self::transparent());
        }
        let hex = s.strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            6 => Some(Self::new(byte(0)?, byte(2)?, byte(4)?, 255)),
            8 => Some(Self::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl TryFrom<String> for Rgba {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid color: {}", value))
    }
}

impl From<Rgba> for String {
    fn from(color: Rgba) -> Self {
        color.to_string()
    }
}

impl From<Color> for Rgba {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self::new(rgba.r, rgba.g, rgba.b, rgba.a)
    }
}

impl From<Rgba> for Color {
    fn from(color: Rgba) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Visual properties of an element. Passed through to renderers untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementStyle {
    pub visible: bool,
    pub stroke_color: Rgba,
    pub fill_color: Rgba,
    pub highlight_stroke_color: Rgba,
    pub highlight_fill_color: Rgba,
    pub stroke_width: f64,
    /// Point radius in pixels.
    pub size: f64,
}

impl Default for ElementStyle {
    fn default() -> Self {
        Self {
            visible: true,
            stroke_color: Rgba::new(0x00, 0x00, 0xff, 255),
            fill_color: Rgba::transparent(),
            highlight_stroke_color: Rgba::new(0xc3, 0xd9, 0xff, 255),
            highlight_fill_color: Rgba::transparent(),
            stroke_width: 2.0,
            size: 3.0,
        }
    }
}

impl ElementStyle {
    /// Default style for point-like elements.
    pub fn point() -> Self {
        Self {
            stroke_color: Rgba::new(0xff, 0x00, 0x00, 255),
            fill_color: Rgba::new(0xff, 0x00, 0x00, 255),
            highlight_fill_color: Rgba::new(0xee, 0xee, 0xee, 255),
            ..Default::default()
        }
    }
}

/// Attributes accepted by element creation and `set_attributes`.
///
/// Recognized keys are typed. Anything else lands in `extra` so serialized
/// constructions survive a load/save cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<Rgba>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<Rgba>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight_stroke_color: Option<Rgba>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight_fill_color: Option<Rgba>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs_regular_update: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_infobox: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub straight_first: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub straight_last: Option<bool>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Attributes {
    /// Parse attributes from a JSON object.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Attributes that only set the display name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Apply the style keys to `style`.
    pub fn apply_style(&self, style: &mut ElementStyle) {
        if let Some(v) = self.visible {
            style.visible = v;
        }
        if let Some(c) = self.stroke_color {
            style.stroke_color = c;
        }
        if let Some(c) = self.fill_color {
            style.fill_color = c;
        }
        if let Some(c) = self.highlight_stroke_color {
            style.highlight_stroke_color = c;
        }
        if let Some(c) = self.highlight_fill_color {
            style.highlight_fill_color = c;
        }
        if let Some(w) = self.stroke_width {
            style.stroke_width = w;
        }
        if let Some(s) = self.size {
            style.size = s;
        }
    }
}

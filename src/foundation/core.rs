use crate::foundation::error::{SpliceError, SpliceResult};

/// Tolerance used when comparing resolved timeline seconds.
pub const TIME_EPSILON: f64 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Pixel dimensions of a box.
pub struct Size {
    /// Width in pixels.
    pub w: u32,
    /// Height in pixels.
    pub h: u32,
}

impl Size {
    /// Build a size from width and height.
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    /// `WxH` as used by generator filters (`color=s=...`).
    pub fn to_filter_arg(self) -> String {
        format!("{}x{}", self.w, self.h)
    }
}

/// A colour literal accepted by the document and rendered into filter params.
///
/// Accepts `#rrggbb`, `#rrggbbaa` and bare colour names (`black`, `white`, ...).
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Color {
    /// Straight RGBA components.
    Rgba([u8; 4]),
    /// A named colour passed through to the engine.
    Named(String),
}

impl Color {
    /// Opaque black.
    pub fn black() -> Self {
        Self::Rgba([0, 0, 0, 255])
    }

    /// Parse a colour literal.
    pub fn parse(s: &str) -> SpliceResult<Self> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            let byte = |i: usize| {
                u8::from_str_radix(&hex[i..i + 2], 16)
                    .map_err(|_| SpliceError::validation(format!("invalid colour '{s}'")))
            };
            return match hex.len() {
                6 if hex.is_ascii() => Ok(Self::Rgba([byte(0)?, byte(2)?, byte(4)?, 255])),
                8 if hex.is_ascii() => Ok(Self::Rgba([byte(0)?, byte(2)?, byte(4)?, byte(6)?])),
                _ => Err(SpliceError::validation(format!(
                    "colour '{s}' must be #rrggbb or #rrggbbaa"
                ))),
            };
        }
        if s.is_empty() || !s.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(SpliceError::validation(format!("invalid colour '{s}'")));
        }
        Ok(Self::Named(s.to_ascii_lowercase()))
    }

    /// Render as an ffmpeg colour argument (`0xRRGGBB`, `0xRRGGBB@0.5`, or a name).
    pub fn to_filter_arg(&self) -> String {
        match self {
            Self::Rgba([r, g, b, 255]) => format!("0x{r:02x}{g:02x}{b:02x}"),
            Self::Rgba([r, g, b, a]) => {
                format!("0x{r:02x}{g:02x}{b:02x}@{}", fmt_num(f64::from(*a) / 255.0))
            }
            Self::Named(name) => name.clone(),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = SpliceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        match c {
            Color::Rgba([r, g, b, 255]) => format!("#{r:02x}{g:02x}{b:02x}"),
            Color::Rgba([r, g, b, a]) => format!("#{r:02x}{g:02x}{b:02x}{a:02x}"),
            Color::Named(name) => name,
        }
    }
}

/// Format a number for filter parameters: at most three decimals, no trailing zeros.
///
/// Output is stable for equal inputs, which keeps compiled programs byte-identical.
pub fn fmt_num(v: f64) -> String {
    let v = if v.abs() < 0.0005 { 0.0 } else { v };
    let s = format!("{v:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

/// Seconds to whole milliseconds, as used by `adelay`.
pub fn secs_to_millis(secs: f64) -> u64 {
    (secs.max(0.0) * 1000.0).round() as u64
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;

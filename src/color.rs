//! Small RGB helper shared by the canvas, shader and graph renderers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An 8-bit-per-channel color, parsed from `#RRGGBB` strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid hex color `{0}`")]
pub struct ParseColorError(pub String);

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels in `0.0..=1.0`, the layout GL uniforms expect.
    pub fn to_unit(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }

    /// Multiply every channel, saturating at white.
    pub fn scaled(self, gain: f32) -> Self {
        let ch = |c: u8| (c as f32 * gain).round().clamp(0.0, 255.0) as u8;
        Self::new(ch(self.r), ch(self.g), ch(self.b))
    }

    /// CSS `rgba(...)` with the given alpha, for 2D canvas stroke styles.
    pub fn css_rgba(self, alpha: f32) -> String {
        format!(
            "rgba({}, {}, {}, {})",
            self.r,
            self.g,
            self.b,
            alpha.clamp(0.0, 1.0)
        )
    }
}

impl FromStr for Rgb {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseColorError(s.to_owned()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| ParseColorError(s.to_owned()))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_and_without_hash() {
        assert_eq!("#5227FF".parse::<Rgb>().unwrap(), Rgb::new(0x52, 0x27, 0xFF));
        assert_eq!("b19eef".parse::<Rgb>().unwrap(), Rgb::new(0xB1, 0x9E, 0xEF));
    }

    #[test]
    fn rejects_short_and_non_hex() {
        assert!("#FFF".parse::<Rgb>().is_err());
        assert!("#GG0000".parse::<Rgb>().is_err());
        assert!("#ÿÿÿ".parse::<Rgb>().is_err());
        assert!("#+F+F+F".parse::<Rgb>().is_err());
    }

    #[test]
    fn css_matches_link_style() {
        let c = Rgb::new(177, 158, 239);
        assert_eq!(c.css_rgba(0.25), "rgba(177, 158, 239, 0.25)");
    }

    #[test]
    fn scaled_saturates() {
        assert_eq!(Rgb::new(200, 10, 0).scaled(1.5), Rgb::new(255, 15, 0));
    }
}

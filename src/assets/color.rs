use serde::{Deserialize, Serialize};

use crate::foundation::core::Rgb8;

/// Named colours of the visual style.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    /// Canvas background and letterbox fill.
    pub background: Rgb8,
    /// Outer waveform pass.
    pub waveform_light: Rgb8,
    /// Middle waveform passes.
    pub waveform_mid: Rgb8,
    /// Baseline and frame gradient end.
    pub waveform_dark: Rgb8,
    /// Neutral text.
    pub text: Rgb8,
    /// Title, inner waveform passes, glow and orbiting light.
    pub accent: Rgb8,
    /// Podcast name.
    pub podcast: Rgb8,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Rgb8::new(20, 25, 35),
            waveform_light: Rgb8::new(245, 230, 200),
            waveform_mid: Rgb8::new(220, 190, 150),
            waveform_dark: Rgb8::new(180, 140, 100),
            text: Rgb8::new(240, 235, 220),
            accent: Rgb8::new(255, 200, 120),
            podcast: Rgb8::new(180, 190, 200),
        }
    }
}

impl Serialize for Rgb8 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b))
    }
}

impl<'de> Deserialize<'de> for Rgb8 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Hex(String),
            Arr([u8; 3]),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Hex(s) => parse_hex(&s).map_err(serde::de::Error::custom),
            Repr::Arr([r, g, b]) => Ok(Rgb8::new(r, g, b)),
        }
    }
}

fn parse_hex(s: &str) -> Result<Rgb8, String> {
    let s = s.trim();
    let s = s.strip_prefix('#').unwrap_or(s);

    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    if s.len() != 6 || !s.is_ascii() {
        return Err("hex color must be #RRGGBB (case-insensitive)".to_owned());
    }
    Ok(Rgb8::new(
        hex_byte(&s[0..2])?,
        hex_byte(&s[2..4])?,
        hex_byte(&s[4..6])?,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/color.rs"]
mod tests;

use serde::{Deserialize, Serialize};

use crate::foundation::core::Argb;

impl Serialize for Argb {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&format!("#{:08X}", self.0))
    }
}

impl<'de> Deserialize<'de> for Argb {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Hex(String),
            // Persisted colour ints are signed 32-bit (e.g. -14876368 for #FF1D0130).
            Int(i64),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Hex(s) => parse_hex(&s).map_err(serde::de::Error::custom),
            Repr::Int(v) => {
                if v < i64::from(i32::MIN) || v > i64::from(u32::MAX) {
                    return Err(serde::de::Error::custom(format!(
                        "colour integer {v} does not fit in 32 bits"
                    )));
                }
                Ok(Argb(v as u32))
            }
        }
    }
}

/// Parse `#RRGGBB` (opaque) or `#AARRGGBB`; the leading `#` is optional.
pub fn parse_hex(s: &str) -> Result<Argb, String> {
    let s = s.trim();
    let s = s.strip_prefix('#').unwrap_or(s);

    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    if !s.is_ascii() {
        return Err("hex colour must be ASCII".to_owned());
    }

    let (a, r, g, b) = match s.len() {
        6 => (
            255,
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
        ),
        8 => (
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
            hex_byte(&s[6..8])?,
        ),
        _ => {
            return Err("hex colour must be #RRGGBB or #AARRGGBB (case-insensitive)".to_owned());
        }
    };

    Ok(Argb::from_channels(a, r, g, b))
}

#[cfg(test)]
#[path = "../../tests/unit/config/color.rs"]
mod tests;

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// `#rrggbb` or `#rrggbbaa` colour as sent by the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor([u8; 4]);

impl HexColor {
    pub const WHITE: HexColor = HexColor([255, 255, 255, 255]);
    pub const BLACK: HexColor = HexColor([0, 0, 0, 255]);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let digits = s.trim().trim_start_matches('#');
        if !(digits.len() == 6 || digits.len() == 8) || !digits.is_ascii() {
            return Err(DomainError::InvalidColor(s.to_string()));
        }

        let mut out = [255u8; 4];
        for (i, slot) in out.iter_mut().take(digits.len() / 2).enumerate() {
            *slot = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16)
                .map_err(|_| DomainError::InvalidColor(s.to_string()))?;
        }
        Ok(Self(out))
    }

    pub fn channels(&self) -> [u8; 4] {
        self.0
    }
}

impl TryFrom<String> for HexColor {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.to_string()
    }
}

impl std::fmt::Display for HexColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [r, g, b, a] = self.0;
        if a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", r, g, b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", r, g, b, a)
        }
    }
}

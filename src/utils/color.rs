use serde::{Deserialize, Serialize};

use crate::utils::clamp::Clamp;

/// An sRGB color with 8-bit channels and a `0.0..=1.0` alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: f64,
}

impl Rgba {
    /// Channels outside `0..=255` and alpha outside `0.0..=1.0` are clamped.
    pub fn new(red: i32, green: i32, blue: i32, alpha: f64) -> Self {
        let channel = |value: i32| Clamp::new(value, 0..=255).get() as u8;
        let alpha = if alpha.is_nan() { 1.0 } else { alpha };
        Self {
            red: channel(red),
            green: channel(green),
            blue: channel(blue),
            alpha: Clamp::new(alpha, 0.0..=1.0).get(),
        }
    }

    /// `0xRRGGBB`; bits above the low 24 are ignored.
    pub fn from_hex(hex: u32, alpha: f64) -> Self {
        Self::new(
            ((hex >> 16) & 0xFF) as i32,
            ((hex >> 8) & 0xFF) as i32,
            (hex & 0xFF) as i32,
            alpha,
        )
    }

    pub fn to_hex(&self) -> u32 {
        ((self.red as u32) << 16) | ((self.green as u32) << 8) | self.blue as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_channels_are_split() {
        let color = Rgba::from_hex(0x52A3EE, 1.0);
        assert_eq!((color.red, color.green, color.blue), (0x52, 0xA3, 0xEE));
        assert_eq!(color.to_hex(), 0x52A3EE);
    }

    #[test]
    fn out_of_range_input_is_clamped() {
        let color = Rgba::new(-20, 300, 128, 4.0);
        assert_eq!((color.red, color.green, color.blue), (0, 255, 128));
        assert_eq!(color.alpha, 1.0);
    }
}

//! Choropleth color scales.

use crate::stats::Statistics;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// CSS hex notation, e.g. `#0078d4`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Discrete blue scale, lightest to darkest.
pub const BLUES: [Color; 9] = [
    Color::from_rgb(0xe6, 0xf2, 0xff), // lightest
    Color::from_rgb(0xcc, 0xe5, 0xff),
    Color::from_rgb(0x99, 0xcb, 0xff),
    Color::from_rgb(0x66, 0xb0, 0xff),
    Color::from_rgb(0x33, 0x95, 0xff),
    Color::from_rgb(0x00, 0x78, 0xd4),
    Color::from_rgb(0x00, 0x5a, 0x9e),
    Color::from_rgb(0x00, 0x45, 0x78),
    Color::from_rgb(0x00, 0x2b, 0x49), // darkest
];

/// Green/blue channel of the red gradient at the low and high end.
const RED_LOW: f64 = 200.0;
const RED_HIGH: f64 = 50.0;

/// Which color scale a choropleth uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Palette {
    /// Nine discrete blue buckets.
    #[default]
    Blues,
    /// Continuous light pink to bright red.
    Red,
}

impl Palette {
    /// Color for the normalized position `t` in `[0, 1]`.
    pub fn at(self, t: f64) -> Color {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Palette::Blues => {
                let index = (t * (BLUES.len() - 1) as f64).floor() as usize;
                BLUES[index.min(BLUES.len() - 1)]
            }
            Palette::Red => {
                let channel = (RED_LOW - (RED_LOW - RED_HIGH) * t).round() as u8;
                Color::from_rgb(255, channel, channel)
            }
        }
    }

    /// Representative swatches from low to high, for legends.
    pub fn swatches(self) -> Vec<Color> {
        match self {
            Palette::Blues => BLUES.to_vec(),
            Palette::Red => (0..9).map(|i| self.at(i as f64 / 8.0)).collect(),
        }
    }
}

/// Map `value` within `[min, max]` onto `palette`. Out-of-range values are clamped.
///
/// A degenerate range (`min == max`) always yields the mid-scale color.
pub fn color_for_value(value: f64, min: f64, max: f64, palette: Palette) -> Color {
    if min == max {
        return palette.at(0.5);
    }
    palette.at((value - min) / (max - min))
}

/// Color key for a slice: domain bounds, midpoint and the palette swatches.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub min: f64,
    pub mid: f64,
    pub max: f64,
    pub swatches: Vec<Color>,
}

impl Legend {
    /// `None` when the slice has no valid values.
    pub fn new(stats: &Statistics, palette: Palette) -> Option<Self> {
        let (min, max) = (stats.min?, stats.max?);
        Some(Self {
            min,
            mid: (min + max) / 2.0,
            max,
            swatches: palette.swatches(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_range_is_constant() {
        for palette in [Palette::Blues, Palette::Red] {
            let c = color_for_value(1.0, 5.0, 5.0, palette);
            assert_eq!(color_for_value(-1e9, 5.0, 5.0, palette), c);
            assert_eq!(color_for_value(5.0, 5.0, 5.0, palette), c);
        }
        assert_eq!(color_for_value(3.0, 5.0, 5.0, Palette::Blues), BLUES[4]);
    }

    #[test]
    fn test_range_ends_map_to_palette_ends() {
        assert_eq!(color_for_value(10.0, 10.0, 90.0, Palette::Blues), BLUES[0]);
        assert_eq!(color_for_value(90.0, 10.0, 90.0, Palette::Blues), BLUES[8]);
        assert_eq!(
            color_for_value(10.0, 10.0, 90.0, Palette::Red),
            Color::from_rgb(255, 200, 200)
        );
        assert_eq!(
            color_for_value(90.0, 10.0, 90.0, Palette::Red),
            Color::from_rgb(255, 50, 50)
        );
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        assert_eq!(color_for_value(-50.0, 0.0, 100.0, Palette::Blues), BLUES[0]);
        assert_eq!(color_for_value(500.0, 0.0, 100.0, Palette::Blues), BLUES[8]);
        assert_eq!(color_for_value(f64::NAN, 0.0, 100.0, Palette::Blues), BLUES[0]);
    }

    #[test]
    fn test_discrete_buckets_floor() {
        // 0.49 * 8 = 3.92 -> bucket 3
        assert_eq!(color_for_value(49.0, 0.0, 100.0, Palette::Blues), BLUES[3]);
        assert_eq!(color_for_value(50.0, 0.0, 100.0, Palette::Blues), BLUES[4]);
    }

    #[test]
    fn test_hex() {
        assert_eq!(BLUES[5].to_hex(), "#0078d4");
        assert_eq!(serde_json::to_string(&BLUES[0]).unwrap(), "\"#e6f2ff\"");
        assert_eq!(Palette::Red.swatches().len(), 9);
    }

    #[test]
    fn test_legend() {
        let stats = Statistics {
            min: Some(100.0),
            max: Some(300.0),
            avg: Some(200.0),
            median: Some(150.0),
        };
        let legend = Legend::new(&stats, Palette::Blues).unwrap();
        assert_eq!(legend.mid, 200.0);
        assert_eq!(legend.swatches.first(), Some(&BLUES[0]));
        assert!(Legend::new(&Statistics::default(), Palette::Red).is_none());
    }
}

//! Sequential colormaps (ColorBrewer 9-class ramps).

use crate::domain::ColormapName;
use image::Rgba;

const BLUES: [[u8; 3]; 9] = [
    [0xf7, 0xfb, 0xff],
    [0xde, 0xeb, 0xf7],
    [0xc6, 0xdb, 0xef],
    [0x9e, 0xca, 0xe1],
    [0x6b, 0xae, 0xd6],
    [0x42, 0x92, 0xc6],
    [0x21, 0x71, 0xb5],
    [0x08, 0x51, 0x9c],
    [0x08, 0x30, 0x6b],
];

const GREENS: [[u8; 3]; 9] = [
    [0xf7, 0xfc, 0xf5],
    [0xe5, 0xf5, 0xe0],
    [0xc7, 0xe9, 0xc0],
    [0xa1, 0xd9, 0x9b],
    [0x74, 0xc4, 0x76],
    [0x41, 0xab, 0x5d],
    [0x23, 0x8b, 0x45],
    [0x00, 0x6d, 0x2c],
    [0x00, 0x44, 0x1b],
];

const GREYS: [[u8; 3]; 9] = [
    [0xff, 0xff, 0xff],
    [0xf0, 0xf0, 0xf0],
    [0xd9, 0xd9, 0xd9],
    [0xbd, 0xbd, 0xbd],
    [0x96, 0x96, 0x96],
    [0x73, 0x73, 0x73],
    [0x52, 0x52, 0x52],
    [0x25, 0x25, 0x25],
    [0x00, 0x00, 0x00],
];

const REDS: [[u8; 3]; 9] = [
    [0xff, 0xf5, 0xf0],
    [0xfe, 0xe0, 0xd2],
    [0xfc, 0xbb, 0xa1],
    [0xfc, 0x92, 0x72],
    [0xfb, 0x6a, 0x4a],
    [0xef, 0x3b, 0x2c],
    [0xcb, 0x18, 0x1d],
    [0xa5, 0x0f, 0x15],
    [0x67, 0x00, 0x0d],
];

/// Piecewise-linear colour ramp over evenly spaced stops.
#[derive(Debug, Clone, Copy)]
pub struct Colormap {
    stops: &'static [[u8; 3]],
}

impl Colormap {
    pub fn named(name: ColormapName) -> Self {
        let stops: &'static [[u8; 3]] = match name {
            ColormapName::Blues => &BLUES,
            ColormapName::Greens => &GREENS,
            ColormapName::Greys => &GREYS,
            ColormapName::Reds => &REDS,
        };
        Self { stops }
    }

    /// Colour at position `t` in `[0, 1]`; values outside are clamped.
    pub fn at(&self, t: f64) -> Rgba<u8> {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let scaled = t * (self.stops.len() - 1) as f64;
        let i = (scaled.floor() as usize).min(self.stops.len() - 2);
        let f = scaled - i as f64;
        let (a, b) = (self.stops[i], self.stops[i + 1]);
        let mix = |c0: u8, c1: u8| (c0 as f64 + (c1 as f64 - c0 as f64) * f).round() as u8;
        Rgba([mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2]), 255])
    }
}

/// Maps data values onto a colormap over a fixed value range.
#[derive(Debug, Clone, Copy)]
pub struct Normalize {
    pub min: f64,
    pub max: f64,
}

impl Normalize {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Position of `v` in `[0, 1]`, or `None` for a missing value.
    pub fn position(&self, v: f64) -> Option<f64> {
        if !v.is_finite() {
            return None;
        }
        let span = self.max - self.min;
        if span <= 0.0 {
            return Some(0.0);
        }
        Some(((v - self.min) / span).clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_match_stops() {
        let blues = Colormap::named(ColormapName::Blues);
        assert_eq!(blues.at(0.0), Rgba([0xf7, 0xfb, 0xff, 255]));
        assert_eq!(blues.at(1.0), Rgba([0x08, 0x30, 0x6b, 255]));
        assert_eq!(blues.at(7.5), blues.at(1.0));
    }

    #[test]
    fn ramp_darkens_monotonically() {
        let greens = Colormap::named(ColormapName::Greens);
        let luminance = |c: Rgba<u8>| c.0[0] as u32 + c.0[1] as u32 + c.0[2] as u32;
        let samples: Vec<u32> = (0..=20).map(|i| luminance(greens.at(i as f64 / 20.0))).collect();
        assert!(samples.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn normalize_handles_missing_and_flat_ranges() {
        let norm = Normalize::new(0.0, 4.0);
        assert_eq!(norm.position(1.0), Some(0.25));
        assert_eq!(norm.position(f64::NAN), None);
        assert_eq!(norm.position(9.0), Some(1.0));
        assert_eq!(Normalize::new(2.0, 2.0).position(2.0), Some(0.0));
    }
}

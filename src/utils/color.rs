// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Color conversion and two-color colormaps
//!
//! A colormap string names two colors separated by `-`, e.g. `"red-blue"` or
//! `"#ff0000-#0000ff"`. Values are mapped by clipping to `[vmin, vmax]`,
//! remapping to `[0, 1]` and interpolating the HSV channels of the two
//! endpoints linearly.

use crate::error::ColormapError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// RGB color with channels in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn from_f64(rgb: [f64; 3]) -> Self {
        Self::new(rgb[0] as f32, rgb[1] as f32, rgb[2] as f32)
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    pub fn to_f64(self) -> [f64; 3] {
        [self.r as f64, self.g as f64, self.b as f64]
    }

    /// Clamp every channel into `[0, 1]`
    pub fn clamped(self) -> Self {
        Self::new(
            self.r.clamp(0.0, 1.0),
            self.g.clamp(0.0, 1.0),
            self.b.clamp(0.0, 1.0),
        )
    }

    /// Random color drawn from a caller-supplied RNG
    pub fn random<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(rng.gen(), rng.gen(), rng.gen())
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::new(0.6, 0.6, 0.6)
    }
}

/// HSV color with all channels in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsv {
    pub h: f64,
    pub s: f64,
    pub v: f64,
}

impl Hsv {
    pub const fn new(h: f64, s: f64, v: f64) -> Self {
        Self { h, s, v }
    }
}

/// Convert RGB to HSV using the standard max/min formulation
pub fn rgb_to_hsv(rgb: [f64; 3]) -> Hsv {
    let [r, g, b] = rgb;
    let maxc = r.max(g).max(b);
    let minc = r.min(g).min(b);
    let v = maxc;
    if minc == maxc {
        return Hsv::new(0.0, 0.0, v);
    }
    let range = maxc - minc;
    let s = range / maxc;
    let rc = (maxc - r) / range;
    let gc = (maxc - g) / range;
    let bc = (maxc - b) / range;
    let h = if r == maxc {
        bc - gc
    } else if g == maxc {
        2.0 + rc - bc
    } else {
        4.0 + gc - rc
    };
    Hsv::new((h / 6.0).rem_euclid(1.0), s, v)
}

/// Convert HSV to RGB with the six-sector formula
pub fn hsv_to_rgb(hsv: Hsv) -> [f64; 3] {
    let Hsv { h, s, v } = hsv;
    if s == 0.0 {
        return [v, v, v];
    }
    let sector = (h * 6.0).floor();
    let f = h * 6.0 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match (sector as i64).rem_euclid(6) {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    }
}

/// Convert HSL (all channels in `[0, 1]`) to HSV
pub fn hsl_to_hsv(h: f64, s: f64, l: f64) -> Hsv {
    let v = l + s * l.min(1.0 - l);
    let sv = if v == 0.0 { 0.0 } else { 2.0 * (1.0 - l / v) };
    Hsv::new(h, sv, v)
}

const NAMED_COLORS: &[(&str, [u8; 3])] = &[
    ("black", [0, 0, 0]),
    ("white", [255, 255, 255]),
    ("red", [255, 0, 0]),
    ("lime", [0, 255, 0]),
    ("green", [0, 128, 0]),
    ("blue", [0, 0, 255]),
    ("yellow", [255, 255, 0]),
    ("cyan", [0, 255, 255]),
    ("aqua", [0, 255, 255]),
    ("magenta", [255, 0, 255]),
    ("fuchsia", [255, 0, 255]),
    ("orange", [255, 165, 0]),
    ("purple", [128, 0, 128]),
    ("brown", [165, 42, 42]),
    ("pink", [255, 192, 203]),
    ("gray", [128, 128, 128]),
    ("grey", [128, 128, 128]),
    ("silver", [192, 192, 192]),
    ("gold", [255, 215, 0]),
    ("navy", [0, 0, 128]),
    ("teal", [0, 128, 128]),
    ("olive", [128, 128, 0]),
    ("maroon", [128, 0, 0]),
    ("violet", [238, 130, 238]),
    ("indigo", [75, 0, 130]),
];

fn parse_hex(hex: &str) -> Option<[f64; 3]> {
    let digits = hex.strip_prefix('#').filter(|d| d.is_ascii())?;
    let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|c| c as f64 / 255.0);
    match digits.len() {
        6 => Some([
            channel(&digits[0..2])?,
            channel(&digits[2..4])?,
            channel(&digits[4..6])?,
        ]),
        3 => {
            let short = |i: usize| {
                u8::from_str_radix(&digits[i..i + 1], 16)
                    .ok()
                    .map(|c| (c * 17) as f64 / 255.0)
            };
            Some([short(0)?, short(1)?, short(2)?])
        }
        _ => None,
    }
}

/// Parse `hsl(h, s, l)` with hue in degrees and s/l in `[0, 1]`
fn parse_hsl(text: &str) -> Option<Hsv> {
    let inner = text.strip_prefix("hsl(")?.strip_suffix(')')?;
    let parts: Vec<f64> = inner
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [h, s, l] => Some(hsl_to_hsv((h / 360.0).rem_euclid(1.0), *s, *l)),
        _ => None,
    }
}

/// Parse a single color (name, `#rrggbb`, `#rgb` or `hsl(...)`) into HSV
pub fn parse_color(text: &str) -> Result<Hsv, ColormapError> {
    let name = text.trim().to_ascii_lowercase();
    if let Some(hsv) = parse_hsl(&name) {
        return Ok(hsv);
    }
    if let Some(rgb) = parse_hex(&name) {
        return Ok(rgb_to_hsv(rgb));
    }
    NAMED_COLORS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, c)| rgb_to_hsv([c[0] as f64 / 255.0, c[1] as f64 / 255.0, c[2] as f64 / 255.0]))
        .ok_or_else(|| ColormapError::UnknownColor(text.trim().to_string()))
}

/// Two-endpoint gradient in HSV space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Colormap {
    spec: String,
    start: Hsv,
    end: Hsv,
}

impl Colormap {
    /// Parse a `"<color>-<color>"` specification
    pub fn parse(spec: &str) -> Result<Self, ColormapError> {
        let parts: Vec<&str> = spec.split('-').collect();
        let [first, second] = parts.as_slice() else {
            return Err(ColormapError::Separator(spec.to_string()));
        };
        if first.trim().is_empty() || second.trim().is_empty() {
            return Err(ColormapError::Separator(spec.to_string()));
        }
        Ok(Self {
            spec: spec.to_string(),
            start: parse_color(first)?,
            end: parse_color(second)?,
        })
    }

    pub fn spec(&self) -> &str {
        &self.spec
    }

    pub fn endpoints(&self) -> (Hsv, Hsv) {
        (self.start, self.end)
    }

    /// Color at position `t` in `[0, 1]`
    pub fn at(&self, t: f64) -> [f64; 3] {
        hsv_to_rgb(Hsv::new(
            super::math::lerp(self.start.h, self.end.h, t),
            super::math::lerp(self.start.s, self.end.s, t),
            super::math::lerp(self.start.v, self.end.v, t),
        ))
    }
}

impl FromStr for Colormap {
    type Err = ColormapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Colormap {
    type Error = ColormapError;

    fn try_from(spec: String) -> Result<Self, Self::Error> {
        Self::parse(&spec)
    }
}

impl From<Colormap> for String {
    fn from(colormap: Colormap) -> Self {
        colormap.spec
    }
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spec)
    }
}

/// Remap a value into `[0, 1]`.
///
/// The value is clipped to `[vmin, vmax]` first. A collapsed range
/// (`vmax <= vmin`) and NaN values both map to 0.
pub fn normalize_value(value: f64, vmin: f64, vmax: f64) -> f64 {
    let range = vmax - vmin;
    if !(range > 0.0) || value.is_nan() {
        return 0.0;
    }
    (super::math::clamp(value, vmin, vmax) - vmin) / range
}

/// Map scalar values to RGB through a colormap
pub fn values_to_rgb(values: &[f64], vmin: f64, vmax: f64, colormap: &Colormap) -> Vec<Rgb> {
    values
        .iter()
        .map(|&v| Rgb::from_f64(colormap.at(normalize_value(v, vmin, vmax))))
        .collect()
}

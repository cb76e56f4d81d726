//! Colour-bucket palettes.
//!
//! A [`Palette`] is an ordered list of `(lower_bound, colour)` buckets. A
//! value takes the colour of the greatest bucket whose lower bound it reaches;
//! values below the first bound are transparent.
//!
//! Palettes load from JSON or YAML:
//!
//! ```yaml
//! name: reflectivity
//! stops:
//!   - { value: 10, color: "rgb(62, 160, 239)" }
//!   - { value: 15, color: "#6ce1ee" }
//! ```

use std::path::Path;

use grid_extract::{DataPoint, PointValue};
use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};

/// Largest bucket count that still fits an indexed PNG next to the
/// transparent background entry.
pub const MAX_BUCKETS: usize = 255;

/// An opaque or transparent RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Parse `rgb(r, g, b)`, `rgba(r, g, b, a)` or `#rrggbb`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();

        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                return None;
            }
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            return Some(Self::rgb(r, g, b));
        }

        let (body, want) = if let Some(rest) = s.strip_prefix("rgba(") {
            (rest, 4)
        } else if let Some(rest) = s.strip_prefix("rgb(") {
            (rest, 3)
        } else {
            return None;
        };

        let parts: Vec<u8> = body
            .strip_suffix(')')?
            .split(',')
            .map(|p| p.trim().parse::<u8>())
            .collect::<Result<_, _>>()
            .ok()?;

        match (want, parts.as_slice()) {
            (3, [r, g, b]) => Some(Self::rgb(*r, *g, *b)),
            (4, [r, g, b, a]) => Some(Self::rgba(*r, *g, *b, *a)),
            _ => None,
        }
    }
}

/// One palette bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket {
    pub lower_bound: f64,
    pub color: Color,
}

/// Serialized palette stop.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaletteStop {
    pub value: f64,
    pub color: String,
}

/// Serialized palette.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaletteConfig {
    pub name: String,
    pub stops: Vec<PaletteStop>,
}

/// Count of values that fell into one histogram bin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistogramBin {
    pub label: String,
    pub count: usize,
}

/// An immutable, validated list of colour buckets.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    name: String,
    buckets: Vec<Bucket>,
}

impl Palette {
    /// Build a palette; bounds must be finite and strictly ascending.
    pub fn new(name: impl Into<String>, buckets: Vec<Bucket>) -> RenderResult<Self> {
        if buckets.is_empty() {
            return Err(RenderError::InvalidPalette("palette has no buckets".into()));
        }
        if buckets.len() > MAX_BUCKETS {
            return Err(RenderError::InvalidPalette(format!(
                "palette has {} buckets, at most {} are supported",
                buckets.len(),
                MAX_BUCKETS
            )));
        }
        if let Some(b) = buckets.iter().find(|b| !b.lower_bound.is_finite()) {
            return Err(RenderError::InvalidPalette(format!(
                "bucket bound {} is not finite",
                b.lower_bound
            )));
        }
        if let Some(w) = buckets
            .windows(2)
            .find(|w| w[1].lower_bound <= w[0].lower_bound)
        {
            return Err(RenderError::InvalidPalette(format!(
                "bucket bounds must be strictly ascending ({} then {})",
                w[0].lower_bound, w[1].lower_bound
            )));
        }

        Ok(Self {
            name: name.into(),
            buckets,
        })
    }

    /// The composite-reflectivity table: 13 buckets of 5 dBZ from 10 dBZ.
    pub fn reflectivity() -> Self {
        const TABLE: [(f64, Color); 13] = [
            (10.0, Color::rgb(62, 160, 239)),
            (15.0, Color::rgb(108, 225, 238)),
            (20.0, Color::rgb(96, 214, 63)),
            (25.0, Color::rgb(70, 137, 37)),
            (30.0, Color::rgb(252, 251, 74)),
            (35.0, Color::rgb(223, 195, 73)),
            (40.0, Color::rgb(239, 147, 47)),
            (45.0, Color::rgb(231, 53, 31)),
            (50.0, Color::rgb(184, 43, 41)),
            (55.0, Color::rgb(183, 36, 28)),
            (60.0, Color::rgb(236, 62, 237)),
            (65.0, Color::rgb(132, 39, 179)),
            (70.0, Color::rgb(174, 148, 237)),
        ];

        Self {
            name: "reflectivity".to_string(),
            buckets: TABLE
                .iter()
                .map(|&(lower_bound, color)| Bucket { lower_bound, color })
                .collect(),
        }
    }

    pub fn from_config(config: &PaletteConfig) -> RenderResult<Self> {
        let buckets = config
            .stops
            .iter()
            .map(|stop| {
                Color::parse(&stop.color)
                    .map(|color| Bucket {
                        lower_bound: stop.value,
                        color,
                    })
                    .ok_or_else(|| {
                        RenderError::InvalidPalette(format!("bad colour '{}'", stop.color))
                    })
            })
            .collect::<RenderResult<Vec<_>>>()?;
        Self::new(config.name.clone(), buckets)
    }

    pub fn from_json(content: &str) -> RenderResult<Self> {
        let config: PaletteConfig = serde_json::from_str(content)
            .map_err(|e| RenderError::InvalidPalette(e.to_string()))?;
        Self::from_config(&config)
    }

    pub fn from_yaml(content: &str) -> RenderResult<Self> {
        let config: PaletteConfig = serde_yaml::from_str(content)
            .map_err(|e| RenderError::InvalidPalette(e.to_string()))?;
        Self::from_config(&config)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> RenderResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    /// Index of the bucket `value` falls into, `None` below the first bound
    /// or for non-finite values.
    pub fn bucket_index(&self, value: f64) -> Option<usize> {
        if !value.is_finite() {
            return None;
        }
        // Buckets are sorted, so the count of bounds <= value is one past
        // the matching bucket.
        let above = self.buckets.partition_point(|b| b.lower_bound <= value);
        above.checked_sub(1)
    }

    /// Colour for `value`; `None` means transparent.
    pub fn classify(&self, value: f64) -> Option<Color> {
        self.bucket_index(value).map(|i| self.buckets[i].color)
    }

    pub fn classify_value(&self, value: PointValue) -> Option<Color> {
        value.as_f64().and_then(|v| self.classify(v))
    }

    /// Bin labels: `<first`, `lo-hi` per inner bucket, `>last`.
    pub fn labels(&self) -> Vec<String> {
        let mut labels = Vec::with_capacity(self.buckets.len() + 1);
        labels.push(format!("<{}", fmt_bound(self.buckets[0].lower_bound)));
        for w in self.buckets.windows(2) {
            labels.push(format!(
                "{}-{}",
                fmt_bound(w[0].lower_bound),
                fmt_bound(w[1].lower_bound)
            ));
        }
        if let Some(last) = self.buckets.last() {
            labels.push(format!(">{}", fmt_bound(last.lower_bound)));
        }
        labels
    }

    /// Distribution of present values over the palette's bins, in bin order.
    ///
    /// Absent points are not counted.
    pub fn histogram(&self, points: &[DataPoint]) -> Vec<HistogramBin> {
        let mut counts = vec![0usize; self.buckets.len() + 1];
        for v in points.iter().filter_map(|p| p.value.as_f64()) {
            match self.bucket_index(v) {
                Some(i) => counts[i + 1] += 1,
                None if v.is_finite() => counts[0] += 1,
                None => {}
            }
        }

        self.labels()
            .into_iter()
            .zip(counts)
            .map(|(label, count)| HistogramBin { label, count })
            .collect()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::reflectivity()
    }
}

fn fmt_bound(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

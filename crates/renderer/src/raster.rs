//! Point rasterization.
//!
//! Each present point becomes a square marker in its bucket colour on a
//! transparent canvas covering the points' bounding box plus a margin. Row 0
//! of the raster is the northern edge.

use std::path::Path;

use grid_extract::{DataPoint, ExtractionResult};
use tracing::debug;

use crate::error::{RenderError, RenderResult};
use crate::palette::{Color, Palette};
use crate::png;

/// Canvas and marker geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    pub width: usize,
    pub height: usize,
    /// Margin added on each side, as a fraction of the data span.
    pub margin_fraction: f64,
    /// Marker side length in degrees.
    pub marker_size: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
            margin_fraction: 0.05,
            marker_size: 0.02,
        }
    }
}

/// Geographic extent of a raster, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

/// A palette-indexed raster.
///
/// Index 0 is transparent; index `k + 1` is bucket `k` of the palette.
#[derive(Debug, Clone)]
pub struct Raster {
    width: usize,
    height: usize,
    bounds: GeoBounds,
    colors: Vec<[u8; 4]>,
    indices: Vec<u8>,
}

impl Raster {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bounds(&self) -> GeoBounds {
        self.bounds
    }

    /// RGBA at `(x, y)`; `None` outside the canvas.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.colors[self.indices[y * self.width + x] as usize])
    }

    /// Number of non-transparent pixels.
    pub fn painted_pixels(&self) -> usize {
        self.indices.iter().filter(|&&i| i != 0).count()
    }

    pub fn to_rgba(&self) -> Vec<u8> {
        self.indices
            .iter()
            .flat_map(|&i| self.colors[i as usize])
            .collect()
    }

    pub fn to_png(&self) -> RenderResult<Vec<u8>> {
        png::encode_indexed(self.width, self.height, &self.colors, &self.indices)
    }

    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> RenderResult<()> {
        std::fs::write(path, self.to_png()?)?;
        Ok(())
    }
}

/// Draw `points` with `palette`.
///
/// Absent points and values below the first bucket are not drawn, but every
/// present point counts toward the extent. Later points paint over earlier
/// ones.
pub fn render_points(
    points: &[DataPoint],
    palette: &Palette,
    options: &RenderOptions,
) -> RenderResult<Raster> {
    let RenderOptions {
        width,
        height,
        margin_fraction,
        marker_size,
    } = *options;

    if width == 0 || height == 0 {
        return Err(RenderError::InvalidSize { width, height });
    }

    let present: Vec<(f64, f64, f64)> = points
        .iter()
        .filter_map(|p| p.value.as_f64().map(|v| (p.latitude, p.longitude, v)))
        .filter(|(lat, lon, _)| lat.is_finite() && lon.is_finite())
        .collect();
    if present.is_empty() {
        return Err(RenderError::NoData);
    }

    let bounds = extent(&present, margin_fraction, marker_size);
    let deg_per_px_x = (bounds.east - bounds.west) / width as f64;
    let deg_per_px_y = (bounds.north - bounds.south) / height as f64;
    let half = marker_size / 2.0;

    let mut indices = vec![0u8; width * height];
    let mut drawn = 0usize;

    for &(lat, lon, value) in &present {
        let Some(bucket) = palette.bucket_index(value) else {
            continue;
        };
        let index = (bucket + 1) as u8;

        let (x0, x1) = pixel_span(
            (lon - half - bounds.west) / deg_per_px_x,
            (lon + half - bounds.west) / deg_per_px_x,
            width,
        );
        let (y0, y1) = pixel_span(
            (bounds.north - (lat + half)) / deg_per_px_y,
            (bounds.north - (lat - half)) / deg_per_px_y,
            height,
        );

        for y in y0..y1 {
            indices[y * width + x0..y * width + x1].fill(index);
        }
        drawn += 1;
    }

    let mut colors = Vec::with_capacity(palette.buckets().len() + 1);
    colors.push(Color::TRANSPARENT.to_array());
    colors.extend(palette.buckets().iter().map(|b| b.color.to_array()));

    debug!(
        points = points.len(),
        present = present.len(),
        drawn = drawn,
        width = width,
        height = height,
        palette = palette.name(),
        "Rendered points"
    );

    Ok(Raster {
        width,
        height,
        bounds,
        colors,
        indices,
    })
}

/// Render the points of an extraction result.
pub fn render_result(
    result: &ExtractionResult,
    palette: &Palette,
    options: &RenderOptions,
) -> RenderResult<Raster> {
    render_points(&result.data_points, palette, options)
}

/// Bounding box of the points plus margin. A zero span is widened by one
/// marker so a single point still has an extent.
fn extent(points: &[(f64, f64, f64)], margin_fraction: f64, marker_size: f64) -> GeoBounds {
    let (mut south, mut north) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut west, mut east) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(lat, lon, _) in points {
        south = south.min(lat);
        north = north.max(lat);
        west = west.min(lon);
        east = east.max(lon);
    }

    let margin = |span: f64| {
        if span > 0.0 {
            span * margin_fraction
        } else {
            marker_size.max(f64::EPSILON)
        }
    };
    let lat_margin = margin(north - south);
    let lon_margin = margin(east - west);

    GeoBounds {
        west: west - lon_margin,
        east: east + lon_margin,
        south: south - lat_margin,
        north: north + lat_margin,
    }
}

/// Clamp a fractional pixel interval to `[0, limit)`, at least one pixel wide.
fn pixel_span(start: f64, end: f64, limit: usize) -> (usize, usize) {
    let max = limit as f64;
    let centre = ((start + end) / 2.0).floor().clamp(0.0, max - 1.0);
    let lo = start.floor().clamp(0.0, max);
    let hi = end.ceil().clamp(0.0, max);

    if hi > lo {
        (lo as usize, hi as usize)
    } else {
        (centre as usize, centre as usize + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_extract::PointValue;

    fn pt(lat: f64, lon: f64, value: Option<f64>) -> DataPoint {
        DataPoint {
            latitude: lat,
            longitude: lon,
            value: PointValue::from(value),
        }
    }

    fn opts(width: usize, height: usize) -> RenderOptions {
        RenderOptions {
            width,
            height,
            ..Default::default()
        }
    }

    #[test]
    fn test_no_data() {
        let palette = Palette::reflectivity();
        assert!(matches!(
            render_points(&[], &palette, &opts(10, 10)),
            Err(RenderError::NoData)
        ));
        assert!(matches!(
            render_points(&[pt(0.0, 0.0, None)], &palette, &opts(10, 10)),
            Err(RenderError::NoData)
        ));
    }

    #[test]
    fn test_invalid_size() {
        let palette = Palette::reflectivity();
        assert!(matches!(
            render_points(&[pt(0.0, 0.0, Some(20.0))], &palette, &opts(0, 10)),
            Err(RenderError::InvalidSize { .. })
        ));
    }

    #[test]
    fn test_marker_placement_and_margin() {
        let palette = Palette::reflectivity();
        let points = [pt(0.0, 0.0, Some(12.0)), pt(1.0, 1.0, Some(72.0))];
        let raster = render_points(&points, &palette, &opts(100, 100)).unwrap();

        let b = raster.bounds();
        assert!((b.west + 0.05).abs() < 1e-9);
        assert!((b.north - 1.05).abs() < 1e-9);

        // South-west point lands bottom-left, north-east point top-right.
        assert_eq!(raster.pixel(4, 95), Some([62, 160, 239, 255]));
        assert_eq!(raster.pixel(95, 4), Some([174, 148, 237, 255]));
        assert_eq!(raster.pixel(50, 50), Some([0, 0, 0, 0]));
        assert_eq!(raster.pixel(100, 0), None);
    }

    #[test]
    fn test_below_first_bucket_is_transparent() {
        let palette = Palette::reflectivity();
        let points = [pt(0.0, 0.0, Some(5.0)), pt(1.0, 1.0, Some(30.0))];
        let raster = render_points(&points, &palette, &opts(100, 100)).unwrap();

        assert_eq!(raster.pixel(4, 95), Some([0, 0, 0, 0]));
        assert_eq!(raster.pixel(95, 4), Some([252, 251, 74, 255]));
    }

    #[test]
    fn test_single_point_is_visible() {
        let palette = Palette::reflectivity();
        let raster =
            render_points(&[pt(30.0, 110.0, Some(40.0))], &palette, &opts(100, 100)).unwrap();

        assert_eq!(raster.pixel(50, 50), Some([239, 147, 47, 255]));
        assert_eq!(raster.pixel(0, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_tiny_marker_paints_one_pixel() {
        let palette = Palette::reflectivity();
        let points = [pt(0.0, 0.0, Some(20.0)), pt(100.0, 100.0, Some(20.0))];
        let raster = render_points(
            &points,
            &palette,
            &RenderOptions {
                marker_size: 0.0,
                ..opts(50, 50)
            },
        )
        .unwrap();

        assert_eq!(raster.painted_pixels(), 2);
    }

    #[test]
    fn test_png_output() {
        let palette = Palette::reflectivity();
        let raster = render_points(&[pt(1.0, 2.0, Some(50.0))], &palette, &opts(8, 4)).unwrap();
        let bytes = raster.to_png().unwrap();
        assert_eq!(&bytes[..8], &png::PNG_SIGNATURE);
        assert_eq!(raster.to_rgba().len(), 8 * 4 * 4);
    }
}

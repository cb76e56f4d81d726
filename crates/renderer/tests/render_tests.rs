//! Rendering an extraction result read back from its JSON form.

use grid_extract::{ExtractionResult, PointValue};
use renderer::{png::PNG_SIGNATURE, render_result, Palette, RenderOptions};

const RESULT_JSON: &str = r#"[
  {
    "file_info": {
      "filename": "mosaic.nc",
      "variables": ["lat", "lon", "CR"],
      "dimensions": { "lat": 2, "lon": 2 },
      "global_attributes": { "title": "mosaic" }
    },
    "coordinate_system": {
      "latitude_variable": "lat",
      "longitude_variable": "lon",
      "latitude_range": [30.0, 31.0],
      "longitude_range": [110.0, 111.0]
    },
    "data_variable": { "name": "CR", "units": "dBZ", "long_name": "CR" },
    "data_points": [
      { "latitude": 30.0, "longitude": 110.0, "value": 22.5 },
      { "latitude": 30.0, "longitude": 111.0, "value": null },
      { "latitude": 31.0, "longitude": 110.0, "value": 8.0 },
      { "latitude": 31.0, "longitude": 111.0, "value": 66.0 }
    ]
  }
]"#;

fn load() -> ExtractionResult {
    let mut results: Vec<ExtractionResult> = serde_json::from_str(RESULT_JSON).unwrap();
    results.remove(0)
}

#[test]
fn test_json_nulls_are_absent() {
    let result = load();
    assert_eq!(result.data_points[1].value, PointValue::Absent);
    assert_eq!(result.present_count(), 3);
}

#[test]
fn test_render_result_to_png() {
    let result = load();
    let raster = render_result(
        &result,
        &Palette::reflectivity(),
        &RenderOptions {
            width: 200,
            height: 200,
            ..Default::default()
        },
    )
    .unwrap();

    // South-west cell (22.5 dBZ) and north-east cell (66 dBZ) are painted;
    // the 8 dBZ cell in the north-west corner is not.
    let sw = raster.pixel(9, 190).unwrap();
    let ne = raster.pixel(190, 9).unwrap();
    let nw = raster.pixel(9, 9).unwrap();
    assert_eq!(sw, [96, 214, 63, 255]);
    assert_eq!(ne, [132, 39, 179, 255]);
    assert_eq!(nw[3], 0);

    let png = raster.to_png().unwrap();
    assert_eq!(&png[..8], &PNG_SIGNATURE);
}

#[test]
fn test_histogram_of_result() {
    let result = load();
    let hist = Palette::reflectivity().histogram(&result.data_points);
    let nonzero: Vec<(&str, usize)> = hist
        .iter()
        .filter(|b| b.count > 0)
        .map(|b| (b.label.as_str(), b.count))
        .collect();
    assert_eq!(nonzero, vec![("<10", 1), ("20-25", 1), ("65-70", 1)]);
}

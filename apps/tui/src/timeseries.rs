use serde_json::Value;

use crate::api::TimeSeriesPayload;
use crate::domain::{GeoPoint, PointQuery};

/// Placeholder the climate API uses for "no data"
pub const NO_DATA_SENTINEL: f64 = -9999.0;

/// Key holding the date label in each time series record
const DATE_KEY: &str = "Date";

#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesPoint {
    pub label: String,
    pub value: f64,
}

/// Everything the chart modal needs to draw one series
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesChart {
    pub dataset: String,
    pub variable: String,
    pub location: GeoPoint,
    pub points: Vec<TimeSeriesPoint>,
}

impl TimeSeriesChart {
    pub fn new(query: &PointQuery, points: Vec<TimeSeriesPoint>) -> Self {
        Self {
            dataset: query.layer.dataset.clone(),
            variable: query.layer.variable.clone(),
            location: query.point,
            points,
        }
    }

    pub fn title(&self) -> String {
        format!(
            "{} {} at {}",
            self.dataset,
            self.variable,
            self.location.label()
        )
    }

    /// Min and max value, widened so a flat series still has a visible range
    pub fn value_bounds(&self) -> [f64; 2] {
        let (min, max) = self
            .points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), point| {
                (lo.min(point.value), hi.max(point.value))
            });

        if !min.is_finite() || !max.is_finite() {
            return [0.0, 1.0];
        }
        if (max - min).abs() < f64::EPSILON {
            return [min - 1.0, max + 1.0];
        }
        [min, max]
    }
}

/// Missing values and the sentinel are both charted as zero
pub fn normalize_value(value: Option<f64>) -> f64 {
    match value {
        Some(v) if (v - NO_DATA_SENTINEL).abs() > f64::EPSILON => v,
        _ => 0.0,
    }
}

/// Builds the ordered label/value series for `variable`.
///
/// Returns `None` when the payload is not a list of points, which callers
/// report as "no points found".
pub fn build_series(payload: &TimeSeriesPayload, variable: &str) -> Option<Vec<TimeSeriesPoint>> {
    let TimeSeriesPayload::Points(rows) = payload else {
        return None;
    };

    let points = rows
        .iter()
        .flatten()
        .map(|record| TimeSeriesPoint {
            label: record
                .get(DATE_KEY)
                .map(label_text)
                .unwrap_or_default(),
            value: normalize_value(record.get(variable).and_then(Value::as_f64)),
        })
        .collect();

    Some(points)
}

fn label_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> TimeSeriesPayload {
        serde_json::from_str(json).unwrap_or(TimeSeriesPayload::Other(Value::Null))
    }

    #[test]
    fn test_sentinel_becomes_zero() {
        let series = build_series(
            &payload(
                r#"[[
                    {"Date": "2020-01-01", "NDVI": 0.42},
                    {"Date": "2020-01-17", "NDVI": -9999},
                    {"Date": "2020-02-02", "NDVI": -9999.0},
                    {"Date": "2020-02-18", "NDVI": 0.51}
                ]]"#,
            ),
            "NDVI",
        );

        let values: Vec<f64> = series
            .unwrap_or_default()
            .iter()
            .map(|point| point.value)
            .collect();
        assert_eq!(values, vec![0.42, 0.0, 0.0, 0.51]);
    }

    #[test]
    fn test_labels_keep_response_order() {
        let series = build_series(
            &payload(
                r#"[[{"Date": "2021-03-01", "tmmx": 280.1}, {"Date": "2021-01-01", "tmmx": 270.4}]]"#,
            ),
            "tmmx",
        )
        .unwrap_or_default();
        assert_eq!(series[0].label, "2021-03-01");
        assert_eq!(series[1].label, "2021-01-01");
    }

    #[test]
    fn test_null_or_missing_value_is_no_data() {
        let series = build_series(
            &payload(r#"[[{"Date": "2021-03-01", "NDWI": null}, {"Date": "2021-03-17"}]]"#),
            "NDWI",
        )
        .unwrap_or_default();
        assert!(series.iter().all(|point| point.value == 0.0));
    }

    #[test]
    fn test_non_list_payload_has_no_series() {
        assert_eq!(
            build_series(&payload(r#"{"detail": "Point outside dataset"}"#), "NDVI"),
            None
        );
        assert_eq!(build_series(&payload(r#""oops""#), "NDVI"), None);
    }

    #[test]
    fn test_flat_series_gets_visible_bounds() {
        let chart = TimeSeriesChart {
            dataset: "GRIDMET".to_string(),
            variable: "pr".to_string(),
            location: GeoPoint::new(40.0, -105.0),
            points: vec![TimeSeriesPoint {
                label: "2020-01-01".to_string(),
                value: 3.0,
            }],
        };
        assert_eq!(chart.value_bounds(), [2.0, 4.0]);
    }
}

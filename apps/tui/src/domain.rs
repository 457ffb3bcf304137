use chrono::NaiveDate;

/// Dataset selected when the explorer is first mounted
pub const DEFAULT_DATASET: &str = "LANDSAT8_SR";

/// Dates are exchanged with the climate API as plain calendar dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Datasets offered by the picker when `DATASETS` is not configured
pub const DEFAULT_DATASETS: &[&str] = &[
    "LANDSAT8_SR",
    "SENTINEL2_SR",
    "MODIS_TERRA",
    "GRIDMET",
    "PRISM_MONTHLY",
    "ERA5_DAILY",
    "CHIRPS_DAILY",
    "TERRACLIMATE",
];

/// Temporal coverage a dataset supports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateBounds {
    pub min: NaiveDate,
    pub max: NaiveDate,
}

impl DateBounds {
    pub fn new(a: NaiveDate, b: NaiveDate) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn parse(min: &str, max: &str) -> Option<Self> {
        Some(Self::new(parse_api_date(min)?, parse_api_date(max)?))
    }

    pub fn clamp(&self, date: NaiveDate) -> NaiveDate {
        date.clamp(self.min, self.max)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.min <= date && date <= self.max
    }
}

/// Parses a date as returned by the API, ignoring any time suffix
pub fn parse_api_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, DATE_FORMAT).ok()
}

pub fn format_api_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// A geographic position in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn label(&self) -> String {
        let ns = if self.lat >= 0.0 { 'N' } else { 'S' };
        let ew = if self.lng >= 0.0 { 'E' } else { 'W' };
        format!(
            "{:.4}°{ns} {:.4}°{ew}",
            self.lat.abs(),
            self.lng.abs()
        )
    }
}

/// Everything the API needs to render a tile layer for the current selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerQuery {
    pub dataset: String,
    pub variable: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl LayerQuery {
    pub fn describe(&self) -> String {
        format!(
            "{} {} {} to {}",
            self.dataset,
            self.variable,
            format_api_date(self.start),
            format_api_date(self.end)
        )
    }
}

/// A layer query evaluated at a single point
#[derive(Debug, Clone, PartialEq)]
pub struct PointQuery {
    pub point: GeoPoint,
    pub layer: LayerQuery,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
    }

    #[test]
    fn test_parse_api_date_drops_time_suffix() {
        assert_eq!(parse_api_date("2013-04-11"), Some(date(2013, 4, 11)));
        assert_eq!(
            parse_api_date("2023-01-01T00:00:00Z"),
            Some(date(2023, 1, 1))
        );
        assert_eq!(parse_api_date("not a date"), None);
    }

    #[test]
    fn test_bounds_are_ordered_and_clamp() {
        let bounds = DateBounds::new(date(2023, 1, 1), date(2013, 1, 1));
        assert_eq!(bounds.min, date(2013, 1, 1));
        assert_eq!(bounds.clamp(date(2001, 5, 5)), date(2013, 1, 1));
        assert_eq!(bounds.clamp(date(2030, 5, 5)), date(2023, 1, 1));
        assert!(bounds.contains(date(2018, 6, 30)));
    }

    #[test]
    fn test_geo_point_label() {
        assert_eq!(GeoPoint::new(-33.5, 151.25).label(), "33.5000°S 151.2500°E");
    }
}

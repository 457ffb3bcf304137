use std::f64::consts::PI;

use crate::domain::GeoPoint;

/// WGS84 semi-major axis used by Web Mercator
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Latitude where Web Mercator tiles are clipped
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

/// A point in a map's native coordinate system
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapPoint {
    pub x: f64,
    pub y: f64,
}

impl MapPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapProjection {
    /// EPSG:4326, x is longitude and y is latitude
    Geographic,
    /// EPSG:3857, metres
    WebMercator,
}

impl MapProjection {
    pub const fn epsg(self) -> u32 {
        match self {
            Self::Geographic => 4326,
            Self::WebMercator => 3857,
        }
    }

    pub fn to_geographic(self, point: MapPoint) -> GeoPoint {
        match self {
            Self::Geographic => GeoPoint::new(point.y, point.x),
            Self::WebMercator => GeoPoint::new(
                mercator_y_to_lat(point.y / EARTH_RADIUS_M),
                (point.x / EARTH_RADIUS_M).to_degrees(),
            ),
        }
    }

    pub fn from_geographic(self, point: GeoPoint) -> MapPoint {
        match self {
            Self::Geographic => MapPoint::new(point.lng, point.lat),
            Self::WebMercator => MapPoint::new(
                point.lng.to_radians() * EARTH_RADIUS_M,
                lat_to_mercator_y(point.lat) * EARTH_RADIUS_M,
            ),
        }
    }
}

/// Convert latitude to (unit sphere) Mercator Y.
#[inline]
fn lat_to_mercator_y(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    lat_rad.tan().asinh()
}

/// Convert (unit sphere) Mercator Y to latitude.
#[inline]
fn mercator_y_to_lat(merc_y: f64) -> f64 {
    merc_y.sinh().atan().to_degrees()
}

/// Slippy-map tile column and row containing `point` at `zoom`
pub fn tile_for(point: GeoPoint, zoom: u8) -> (u32, u32) {
    let tiles = f64::from(1_u32 << zoom.min(30));
    let x = ((point.lng + 180.0) / 360.0 * tiles).floor();
    let y = ((1.0 - lat_to_mercator_y(point.lat) / PI) / 2.0 * tiles).floor();
    let max = tiles - 1.0;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    (x.clamp(0.0, max) as u32, y.clamp(0.0, max) as u32)
}

/// Fills the `{z}`, `{x}` and `{y}` placeholders of a tile URL template
pub fn resolve_tile_url(template: &str, zoom: u8, x: u32, y: u32) -> String {
    template
        .replace("{z}", &zoom.to_string())
        .replace("{x}", &x.to_string())
        .replace("{y}", &y.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "{a} != {b}");
    }

    #[test]
    fn test_web_mercator_to_geographic() {
        // Ottawa, as reported by EPSG:3857 map clicks
        let point = MapPoint::new(-8_411_233.5, 5_700_582.9);
        let geo = MapProjection::WebMercator.to_geographic(point);
        assert!((geo.lng - -75.559).abs() < 1e-3, "lng {}", geo.lng);
        assert!((geo.lat - 45.5).abs() < 1e-3, "lat {}", geo.lat);

        let back = MapProjection::WebMercator.from_geographic(geo);
        assert_close(back.x, point.x);
        assert!((back.y - point.y).abs() < 1e-3);
    }

    #[test]
    fn test_geographic_projection_swaps_axes() {
        let geo = MapProjection::Geographic.to_geographic(MapPoint::new(-100.0, 60.0));
        assert_close(geo.lat, 60.0);
        assert_close(geo.lng, -100.0);
        assert_eq!(MapProjection::Geographic.epsg(), 4326);
    }

    #[test]
    fn test_tile_for_known_location() {
        // Null Island sits on the corner of the four central tiles
        assert_eq!(tile_for(GeoPoint::new(0.0, 0.0), 1), (1, 1));
        assert_eq!(tile_for(GeoPoint::new(51.5, -0.12), 10), (511, 340));
        assert_eq!(tile_for(GeoPoint::new(89.9, 179.99), 2), (3, 0));
    }

    #[test]
    fn test_resolve_tile_url() {
        assert_eq!(
            resolve_tile_url("https://earthengine.googleapis.com/v1/maps/abc/tiles/{z}/{x}/{y}", 3, 2, 5),
            "https://earthengine.googleapis.com/v1/maps/abc/tiles/3/2/5"
        );
    }
}

use super::geodesy::{LonLat, WGS84_A};
use crate::bounds::{Aabb2, GeoExtent};

/// Latitude limit of the square Web Mercator world.
pub const WEB_MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

/// Spherical Web Mercator (EPSG:3857) forward projection, meters.
pub fn lon_lat_to_web_mercator(p: LonLat) -> [f64; 2] {
    let lat = p.lat.clamp(-WEB_MERCATOR_MAX_LAT, WEB_MERCATOR_MAX_LAT);
    let x = WGS84_A * p.lon.to_radians();
    let y = WGS84_A * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
    [x, y]
}

pub fn web_mercator_to_lon_lat(xy: [f64; 2]) -> LonLat {
    let lon = (xy[0] / WGS84_A).to_degrees();
    let lat = (2.0 * (xy[1] / WGS84_A).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
    LonLat::new(lon, lat)
}

/// Projects a lon/lat extent into an EPSG:3857 box.
///
/// Corner-wise projection is exact here: the projection is monotonic in
/// each axis independently.
pub fn extent_to_web_mercator(extent: &GeoExtent) -> Aabb2 {
    let min = lon_lat_to_web_mercator(LonLat::new(extent.min_lon, extent.min_lat));
    let max = lon_lat_to_web_mercator(LonLat::new(extent.max_lon, extent.max_lat));
    Aabb2::new(min, max)
}

#[cfg(test)]
mod tests {
    use super::{extent_to_web_mercator, lon_lat_to_web_mercator, web_mercator_to_lon_lat};
    use crate::bounds::GeoExtent;
    use crate::math::geodesy::LonLat;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn origin_and_antimeridian() {
        let o = lon_lat_to_web_mercator(LonLat::new(0.0, 0.0));
        assert_close(o[0], 0.0, 1e-9);
        assert_close(o[1], 0.0, 1e-9);

        let am = lon_lat_to_web_mercator(LonLat::new(180.0, 0.0));
        assert_close(am[0], 20_037_508.342_789_244, 1e-6);
    }

    #[test]
    fn inverse_recovers_region_center() {
        let p = LonLat::new(134.0, 44.6);
        let back = web_mercator_to_lon_lat(lon_lat_to_web_mercator(p));
        assert_close(back.lon, 134.0, 1e-9);
        assert_close(back.lat, 44.6, 1e-9);
    }

    #[test]
    fn projected_extent_keeps_orientation() {
        let b = extent_to_web_mercator(&GeoExtent::new(131.5, 42.8, 132.5, 43.8));
        assert!(b.width() > 0.0);
        assert!(b.height() > 0.0);
        assert!(b.min[0] > 14_000_000.0);
    }
}

use crate::bounds::GeoExtent;

/// WGS84 semi-major axis (meters).
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// WGS84 semi-minor axis (meters).
pub const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);
/// WGS84 first eccentricity squared.
pub const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);
/// WGS84 second eccentricity squared.
pub const WGS84_EP2: f64 = (WGS84_A * WGS84_A - WGS84_B * WGS84_B) / (WGS84_B * WGS84_B);

/// UTM scale factor on the central meridian.
pub const UTM_K0: f64 = 0.9996;
const UTM_FALSE_EASTING: f64 = 500_000.0;
const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Longitude/latitude in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Hemisphere {
    North,
    South,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct UtmZone {
    pub number: u8,
    pub hemisphere: Hemisphere,
}

impl UtmZone {
    /// Returns `None` outside zones 1..=60.
    pub fn new(number: u8, hemisphere: Hemisphere) -> Option<Self> {
        (1..=60)
            .contains(&number)
            .then_some(Self { number, hemisphere })
    }

    pub fn central_meridian_deg(&self) -> f64 {
        (self.number as f64 - 1.0) * 6.0 - 180.0 + 3.0
    }
}

/// Inverse transverse Mercator (USGS series) from UTM easting/northing to WGS84.
pub fn utm_to_lon_lat(zone: UtmZone, easting: f64, northing: f64) -> LonLat {
    let x = easting - UTM_FALSE_EASTING;
    let y = match zone.hemisphere {
        Hemisphere::North => northing,
        Hemisphere::South => northing - UTM_FALSE_NORTHING_SOUTH,
    };

    let e2 = WGS84_E2;
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    let sqrt_1_e2 = (1.0 - e2).sqrt();
    let e1 = (1.0 - sqrt_1_e2) / (1.0 + sqrt_1_e2);

    let m = y / UTM_K0;
    let mu = m / (WGS84_A * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));

    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

    let sin_phi1 = phi1.sin();
    let cos_phi1 = phi1.cos();
    let tan_phi1 = phi1.tan();
    let w = 1.0 - e2 * sin_phi1 * sin_phi1;

    let n1 = WGS84_A / w.sqrt();
    let t1 = tan_phi1 * tan_phi1;
    let c1 = WGS84_EP2 * cos_phi1 * cos_phi1;
    let r1 = WGS84_A * (1.0 - e2) / w.powf(1.5);
    let d = x / (n1 * UTM_K0);

    let lat = phi1
        - (n1 * tan_phi1 / r1)
            * (d * d / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * WGS84_EP2) * d.powi(4)
                    / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                    - 252.0 * WGS84_EP2
                    - 3.0 * c1 * c1)
                    * d.powi(6)
                    / 720.0);

    let lon = (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
        + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * WGS84_EP2 + 24.0 * t1 * t1)
            * d.powi(5)
            / 120.0)
        / cos_phi1;

    LonLat::new(zone.central_meridian_deg() + lon.to_degrees(), lat.to_degrees())
}

/// Converts a UTM bounding box (SW and NE corners) to a lon/lat extent.
pub fn utm_box_to_extent(zone: UtmZone, min: [f64; 2], max: [f64; 2]) -> GeoExtent {
    let sw = utm_to_lon_lat(zone, min[0], min[1]);
    let ne = utm_to_lon_lat(zone, max[0], max[1]);
    GeoExtent::new(sw.lon, sw.lat, ne.lon, ne.lat)
}

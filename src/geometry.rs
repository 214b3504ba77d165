//! Angle normalisation and the equatorial/horizontal/ecliptic frame helpers
//! the ephemeris adapter needs on top of the RA/Dec it is handed.

use chrono::{DateTime, Utc};

const J2000_JD: f64 = 2_451_545.0;
const UNIX_EPOCH_JD: f64 = 2_440_587.5;

// ---------- Angles ----------

/// Wraps an angle into `[0, 360)`.
///
/// `rem_euclid` can round a tiny negative input up to exactly 360.0, which is
/// folded back to 0.0 so callers never see the open upper bound.
pub fn unwind_deg(x: f64) -> f64 {
    let wrapped = x.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

pub fn hms_to_deg(h: f64, m: f64, s: f64) -> f64 {
    (h + m / 60.0 + s / 3600.0) * 15.0
}

pub fn dms_to_deg(d: f64, m: f64, s: f64) -> f64 {
    // a declination in (-1°, 0°) arrives as -0.0 degrees
    let negative = d.is_sign_negative() || m < 0.0 || s < 0.0;
    let sign = if negative { -1.0 } else { 1.0 };
    sign * (d.abs() + m.abs() / 60.0 + s.abs() / 3600.0)
}

/// Rounds to one decimal place, the precision of every reported angle.
pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

// ---------- Time ----------

pub fn julian_date(t: DateTime<Utc>) -> f64 {
    let seconds = t.timestamp() as f64 + f64::from(t.timestamp_subsec_micros()) / 1.0e6;
    seconds / 86_400.0 + UNIX_EPOCH_JD
}

/// Greenwich mean sidereal time in degrees.
pub fn gmst_deg(t: DateTime<Utc>) -> f64 {
    let d = julian_date(t) - J2000_JD;
    let c = d / 36_525.0;
    let gmst = 280.46061837 + 360.98564736629 * d + 0.000387933 * c * c - c * c * c / 38_710_000.0;
    unwind_deg(gmst)
}

/// Mean obliquity of the ecliptic in degrees.
pub fn mean_obliquity_deg(t: DateTime<Utc>) -> f64 {
    let c = (julian_date(t) - J2000_JD) / 36_525.0;
    23.439_291 - 0.013_004_2 * c
}

// ---------- Frames ----------

/// Apparent altitude and azimuth (degrees, azimuth clockwise from north) of an
/// equatorial position for an observer at `lat_deg`/`lon_deg`. No refraction.
pub fn equatorial_to_horizontal(
    ra_deg: f64,
    dec_deg: f64,
    lat_deg: f64,
    lon_deg: f64,
    t: DateTime<Utc>,
) -> (f64, f64) {
    let lst = unwind_deg(gmst_deg(t) + lon_deg);

    let h = unwind_deg(lst - ra_deg).to_radians();
    let lat = lat_deg.to_radians();
    let dec = dec_deg.to_radians();

    let sin_alt = (lat.sin() * dec.sin() + lat.cos() * dec.cos() * h.cos()).clamp(-1.0, 1.0);
    let alt = sin_alt.asin().to_degrees();

    let az = (-dec.cos() * h.sin())
        .atan2(dec.sin() * lat.cos() - dec.cos() * lat.sin() * h.cos())
        .to_degrees();

    (alt, unwind_deg(az))
}

/// Ecliptic longitude (degrees) of an equatorial position.
pub fn ecliptic_longitude_deg(ra_deg: f64, dec_deg: f64, obliquity_deg: f64) -> f64 {
    let ra = ra_deg.to_radians();
    let dec = dec_deg.to_radians();
    let eps = obliquity_deg.to_radians();

    let lon = (ra.sin() * eps.cos() + dec.tan() * eps.sin()).atan2(ra.cos());
    unwind_deg(lon.to_degrees())
}

pub fn angular_separation_deg(ra1_deg: f64, dec1_deg: f64, ra2_deg: f64, dec2_deg: f64) -> f64 {
    let ra1 = ra1_deg.to_radians();
    let ra2 = ra2_deg.to_radians();
    let d1 = dec1_deg.to_radians();
    let d2 = dec2_deg.to_radians();

    let cos_sep = d1.sin() * d2.sin() + d1.cos() * d2.cos() * (ra1 - ra2).cos();
    cos_sep.clamp(-1.0, 1.0).acos().to_degrees()
}

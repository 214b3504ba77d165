//! Ephemeris provider backed by `practical-astronomy-rust`.
//!
//! The library hands back geocentric RA/Dec (as h/m/s and d/m/s) for a civil
//! date and time; this adapter feeds it UTC with a zero zone correction and
//! turns the result into horizontal coordinates for the observer.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use log::debug;
use practical_astronomy_rust::{moon as pa_moon, planet as pa_planet, sun as pa_sun};

use crate::ephemeris::{AngleSeries, Body, EphemerisProvider, Location, RiseSetEvent};
use crate::error::{SkyError, SkyResult};
use crate::geometry::{
    angular_separation_deg, dms_to_deg, ecliptic_longitude_deg, equatorial_to_horizontal, hms_to_deg,
    mean_obliquity_deg, unwind_deg,
};

// Geometric altitude of the body centre at the moment of rise/set.
const SUN_HORIZON_DEG: f64 = -0.8333;
const MOON_HORIZON_DEG: f64 = 0.125;
const PLANET_HORIZON_DEG: f64 = -0.5667;

const DEFAULT_SCAN_MINUTES: i64 = 10;
const CROSSING_RESOLUTION_S: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PracticalAstronomyEphemeris {
    scan_step: Duration,
}

impl Default for PracticalAstronomyEphemeris {
    fn default() -> Self {
        Self::new()
    }
}

impl PracticalAstronomyEphemeris {
    pub fn new() -> Self {
        Self {
            scan_step: Duration::minutes(DEFAULT_SCAN_MINUTES),
        }
    }

    /// Coarse sweep step for bracketing horizon crossings.
    pub fn with_scan_step(scan_step: Duration) -> SkyResult<Self> {
        if scan_step <= Duration::zero() {
            return Err(SkyError::InvalidConfig(format!(
                "rise/set scan step must be positive, got {scan_step}"
            )));
        }
        Ok(Self { scan_step })
    }

    fn altitude_above_horizon(&self, body: Body, location: &Location, t: DateTime<Utc>) -> SkyResult<f64> {
        let (ra, dec) = equatorial_position(body, t)?;
        let (alt, _) = equatorial_to_horizontal(ra, dec, location.latitude_deg(), location.longitude_deg(), t);
        Ok(alt - horizon_altitude_deg(body))
    }

    /// Bisects `[lo, hi]` down to a second; `lo_above` is the state at `lo`.
    fn refine_crossing(
        &self,
        body: Body,
        location: &Location,
        mut lo: DateTime<Utc>,
        mut hi: DateTime<Utc>,
        lo_above: bool,
    ) -> SkyResult<DateTime<Utc>> {
        let resolution = Duration::seconds(CROSSING_RESOLUTION_S);
        while hi - lo > resolution {
            let mid = lo + (hi - lo) / 2;
            let mid_above = self.altitude_above_horizon(body, location, mid)? >= 0.0;
            if mid_above == lo_above {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        Ok(hi)
    }
}

impl EphemerisProvider for PracticalAstronomyEphemeris {
    fn altaz(&self, body: Body, location: &Location, instants: &[DateTime<Utc>]) -> SkyResult<AngleSeries> {
        let mut series = AngleSeries::with_capacity(instants.len());
        for &t in instants {
            let (ra, dec) = equatorial_position(body, t)?;
            let (alt, az) = equatorial_to_horizontal(ra, dec, location.latitude_deg(), location.longitude_deg(), t);
            series.push(alt, az);
        }
        debug!("[altaz] {} sampled at {} instants", body.name(), instants.len());
        Ok(series)
    }

    fn moon_phase_angle(&self, instant: DateTime<Utc>) -> SkyResult<f64> {
        let (sun_ra, sun_dec) = equatorial_position(Body::Sun, instant)?;
        let (moon_ra, moon_dec) = equatorial_position(Body::Moon, instant)?;
        let eps = mean_obliquity_deg(instant);

        let sun_lon = ecliptic_longitude_deg(sun_ra, sun_dec, eps);
        let moon_lon = ecliptic_longitude_deg(moon_ra, moon_dec, eps);
        Ok(unwind_deg(moon_lon - sun_lon))
    }

    fn moon_illuminated_fraction(&self, instant: DateTime<Utc>) -> SkyResult<f64> {
        let (sun_ra, sun_dec) = equatorial_position(Body::Sun, instant)?;
        let (moon_ra, moon_dec) = equatorial_position(Body::Moon, instant)?;
        let elongation = angular_separation_deg(moon_ra, moon_dec, sun_ra, sun_dec).to_radians();
        Ok((1.0 - elongation.cos()) / 2.0)
    }

    fn rise_set_events(
        &self,
        body: Body,
        location: &Location,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> SkyResult<Vec<RiseSetEvent>> {
        let mut events = Vec::new();
        if end <= start {
            return Ok(events);
        }

        // Coarse sweep then refine
        let mut t0 = start;
        let mut above0 = self.altitude_above_horizon(body, location, t0)? >= 0.0;
        while t0 < end {
            let t1 = t0
                .checked_add_signed(self.scan_step)
                .ok_or_else(|| SkyError::InvalidConfig(format!("scan step {} overflows", self.scan_step)))?
                .min(end);
            let above1 = self.altitude_above_horizon(body, location, t1)? >= 0.0;
            if above1 != above0 {
                let at = self.refine_crossing(body, location, t0, t1, above0)?;
                events.push(RiseSetEvent { at, is_rise: above1 });
            }
            t0 = t1;
            above0 = above1;
        }

        debug!(
            "[rise_set_events] {}: {} crossings between {} and {}",
            body.name(),
            events.len(),
            start,
            end
        );
        Ok(events)
    }
}

fn horizon_altitude_deg(body: Body) -> f64 {
    match body {
        Body::Sun => SUN_HORIZON_DEG,
        Body::Moon => MOON_HORIZON_DEG,
        _ => PLANET_HORIZON_DEG,
    }
}

/// Geocentric apparent RA/Dec in degrees.
fn equatorial_position(body: Body, t: DateTime<Utc>) -> SkyResult<(f64, f64)> {
    let y = t.year() as u32;
    let mo = t.month();
    let d = f64::from(t.day());
    let hh = f64::from(t.hour());
    let mm = f64::from(t.minute());
    let ss = f64::from(t.second()) + f64::from(t.timestamp_subsec_micros()) / 1.0e6;

    let (ra_h, ra_m, ra_s, dec_d, dec_m, dec_s) = match body {
        Body::Sun => pa_sun::precise_position_of_sun(hh, mm, ss, d, mo, y, false, 0),
        Body::Moon => {
            let (ra_h, ra_m, ra_s, dec_d, dec_m, dec_s, _el, _par) =
                pa_moon::precise_position_of_moon(hh, mm, ss, false, 0, d, mo, y);
            (ra_h, ra_m, ra_s, dec_d, dec_m, dec_s)
        }
        planet => pa_planet::precise_position_of_planet(hh, mm, ss, false, 0, d, mo, y, planet.name().to_string()),
    };

    let ra = unwind_deg(hms_to_deg(ra_h, ra_m, ra_s));
    let dec = dms_to_deg(dec_d, dec_m, dec_s);
    if !ra.is_finite() || !dec.is_finite() || !(-90.0..=90.0).contains(&dec) {
        return Err(SkyError::EphemerisUnavailable(format!(
            "{} position at {t} is not usable (ra={ra}, dec={dec})",
            body.name()
        )));
    }
    Ok((ra, dec))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bratislava() -> Location {
        Location::new(48.15, 17.11, "Europe/Bratislava").unwrap()
    }

    #[test]
    fn sun_is_high_at_summer_noon_and_down_at_midnight() {
        let eph = PracticalAstronomyEphemeris::new();
        let noon = Utc.with_ymd_and_hms(2024, 6, 21, 10, 50, 0).unwrap();
        let midnight = Utc.with_ymd_and_hms(2024, 6, 21, 22, 50, 0).unwrap();
        let series = eph.altaz(Body::Sun, &bratislava(), &[noon, midnight]).unwrap();

        // solstice culmination: 90 - 48.15 + 23.44
        assert!((series.altitude_deg[0] - 65.3).abs() < 1.0, "{}", series.altitude_deg[0]);
        assert!((series.azimuth_deg[0] - 180.0).abs() < 5.0, "{}", series.azimuth_deg[0]);
        assert!(series.altitude_deg[1] < -15.0);
    }

    #[test]
    fn sun_rises_and_sets_once_per_day() {
        let eph = PracticalAstronomyEphemeris::new();
        let start = Utc.with_ymd_and_hms(2024, 6, 20, 22, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 6, 21, 22, 0, 0).unwrap();
        let events = eph.rise_set_events(Body::Sun, &bratislava(), start, end).unwrap();

        assert_eq!(events.len(), 2);
        assert!(events[0].is_rise);
        assert!(!events[1].is_rise);
        // local sunrise ~04:50 CEST, sunset ~20:50 CEST
        let rise = Utc.with_ymd_and_hms(2024, 6, 21, 2, 50, 0).unwrap();
        let set = Utc.with_ymd_and_hms(2024, 6, 21, 18, 50, 0).unwrap();
        assert!((events[0].at - rise).num_minutes().abs() < 15, "{}", events[0].at);
        assert!((events[1].at - set).num_minutes().abs() < 15, "{}", events[1].at);
    }

    #[test]
    fn full_moon_is_nearly_fully_lit() {
        // full moon 2024-06-22 01:08 UTC
        let eph = PracticalAstronomyEphemeris::new();
        let t = Utc.with_ymd_and_hms(2024, 6, 22, 1, 8, 0).unwrap();
        let phase = eph.moon_phase_angle(t).unwrap();
        let lit = eph.moon_illuminated_fraction(t).unwrap();
        assert!((phase - 180.0).abs() < 3.0, "{phase}");
        assert!(lit > 0.98, "{lit}");
    }

    #[test]
    fn new_moon_is_dark() {
        // new moon 2024-06-06 12:38 UTC
        let eph = PracticalAstronomyEphemeris::new();
        let t = Utc.with_ymd_and_hms(2024, 6, 6, 12, 38, 0).unwrap();
        let phase = eph.moon_phase_angle(t).unwrap();
        assert!(phase < 3.0 || phase > 357.0, "{phase}");
        assert!(eph.moon_illuminated_fraction(t).unwrap() < 0.02);
    }

    #[test]
    fn planets_produce_finite_aligned_series() {
        let eph = PracticalAstronomyEphemeris::new();
        let t0 = Utc.with_ymd_and_hms(2024, 6, 21, 16, 0, 0).unwrap();
        let instants: Vec<_> = (0..6).map(|i| t0 + Duration::minutes(10 * i)).collect();
        for body in Body::PLANETS {
            let series = eph.altaz(body, &bratislava(), &instants).unwrap();
            series.check_aligned(body, instants.len()).unwrap();
            assert!(series.azimuth_deg.iter().all(|az| (0.0..360.0).contains(az)));
        }
    }

    #[test]
    fn sun_declination_just_south_of_equator_keeps_its_sign() {
        // a day before the 2024 March equinox the sun sits about 0.25° south
        let t = Utc.with_ymd_and_hms(2024, 3, 19, 12, 0, 0).unwrap();
        let (_, dec) = equatorial_position(Body::Sun, t).unwrap();
        assert!(dec < 0.0 && dec > -1.0, "{dec}");
    }

    #[test]
    fn empty_interval_has_no_events() {
        let eph = PracticalAstronomyEphemeris::new();
        let t = Utc.with_ymd_and_hms(2024, 6, 21, 0, 0, 0).unwrap();
        assert!(eph.rise_set_events(Body::Moon, &bratislava(), t, t).unwrap().is_empty());
    }

    #[test]
    fn rejects_non_positive_scan_step() {
        assert!(PracticalAstronomyEphemeris::with_scan_step(Duration::zero()).is_err());
        assert!(PracticalAstronomyEphemeris::with_scan_step(Duration::minutes(5)).is_ok());
    }
}

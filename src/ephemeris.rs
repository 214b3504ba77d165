//! The ephemeris collaborator: bodies, observer location, and the position
//! queries the engine consumes without computing them itself.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::error::{SkyError, SkyResult};
use crate::grid::parse_timezone;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Body {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
}

impl Body {
    /// Planets in the order they are scanned.
    pub const PLANETS: [Body; 5] = [Body::Mercury, Body::Venus, Body::Mars, Body::Jupiter, Body::Saturn];

    pub fn key(&self) -> &'static str {
        match self {
            Body::Sun => "sun",
            Body::Moon => "moon",
            Body::Mercury => "mercury",
            Body::Venus => "venus",
            Body::Mars => "mars",
            Body::Jupiter => "jupiter",
            Body::Saturn => "saturn",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Body::Sun => "Sun",
            Body::Moon => "Moon",
            Body::Mercury => "Mercury",
            Body::Venus => "Venus",
            Body::Mars => "Mars",
            Body::Jupiter => "Jupiter",
            Body::Saturn => "Saturn",
        }
    }
}

/// Observer position and civil timezone, fixed for one request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    latitude_deg: f64,
    longitude_deg: f64,
    timezone: Tz,
}

impl Location {
    pub fn new(latitude_deg: f64, longitude_deg: f64, timezone: &str) -> SkyResult<Self> {
        if !latitude_deg.is_finite() || !(-90.0..=90.0).contains(&latitude_deg) {
            return Err(SkyError::InvalidLocation(format!(
                "latitude must be within [-90, 90], got {latitude_deg}"
            )));
        }
        if !longitude_deg.is_finite() || !(-180.0..=180.0).contains(&longitude_deg) {
            return Err(SkyError::InvalidLocation(format!(
                "longitude must be within [-180, 180], got {longitude_deg}"
            )));
        }
        Ok(Self {
            latitude_deg,
            longitude_deg,
            timezone: parse_timezone(timezone)?,
        })
    }

    pub fn latitude_deg(&self) -> f64 {
        self.latitude_deg
    }

    pub fn longitude_deg(&self) -> f64 {
        self.longitude_deg
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }
}

/// Altitude/azimuth samples of one body, index-aligned with an instant grid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AngleSeries {
    pub altitude_deg: Vec<f64>,
    pub azimuth_deg: Vec<f64>,
}

impl AngleSeries {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            altitude_deg: Vec::with_capacity(n),
            azimuth_deg: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, altitude_deg: f64, azimuth_deg: f64) {
        self.altitude_deg.push(altitude_deg);
        self.azimuth_deg.push(azimuth_deg);
    }

    pub fn len(&self) -> usize {
        self.altitude_deg.len()
    }

    pub fn is_empty(&self) -> bool {
        self.altitude_deg.is_empty()
    }

    /// Confirms the series lines up with `expected` instants and holds only finite angles.
    pub fn check_aligned(&self, body: Body, expected: usize) -> SkyResult<()> {
        if self.altitude_deg.len() != expected || self.azimuth_deg.len() != expected {
            return Err(SkyError::EphemerisUnavailable(format!(
                "{} series has {}/{} samples, expected {expected}",
                body.name(),
                self.altitude_deg.len(),
                self.azimuth_deg.len()
            )));
        }
        let finite = self
            .altitude_deg
            .iter()
            .chain(self.azimuth_deg.iter())
            .all(|v| v.is_finite());
        if !finite {
            return Err(SkyError::EphemerisUnavailable(format!(
                "{} series contains non-finite angles",
                body.name()
            )));
        }
        Ok(())
    }
}

/// A horizon crossing found by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiseSetEvent {
    pub at: DateTime<Utc>,
    pub is_rise: bool,
}

/// Source of apparent positions. Implementations are shared read-only across
/// concurrent requests.
pub trait EphemerisProvider: Send + Sync {
    /// Apparent altitude/azimuth of `body` from `location` at each instant, in order.
    fn altaz(&self, body: Body, location: &Location, instants: &[DateTime<Utc>]) -> SkyResult<AngleSeries>;

    /// Moon minus sun ecliptic longitude, degrees.
    fn moon_phase_angle(&self, instant: DateTime<Utc>) -> SkyResult<f64>;

    /// Illuminated fraction of the lunar disc in [0, 1].
    fn moon_illuminated_fraction(&self, instant: DateTime<Utc>) -> SkyResult<f64>;

    /// Rise and set crossings of `body` within `[start, end]`, chronological.
    fn rise_set_events(
        &self,
        body: Body,
        location: &Location,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> SkyResult<Vec<RiseSetEvent>>;
}

impl<E: EphemerisProvider + ?Sized> EphemerisProvider for &E {
    fn altaz(&self, body: Body, location: &Location, instants: &[DateTime<Utc>]) -> SkyResult<AngleSeries> {
        (**self).altaz(body, location, instants)
    }

    fn moon_phase_angle(&self, instant: DateTime<Utc>) -> SkyResult<f64> {
        (**self).moon_phase_angle(instant)
    }

    fn moon_illuminated_fraction(&self, instant: DateTime<Utc>) -> SkyResult<f64> {
        (**self).moon_illuminated_fraction(instant)
    }

    fn rise_set_events(
        &self,
        body: Body,
        location: &Location,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> SkyResult<Vec<RiseSetEvent>> {
        (**self).rise_set_events(body, location, start, end)
    }
}

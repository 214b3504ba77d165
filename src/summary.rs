//! Moon and planet summary for one location and local calendar date.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use log::{debug, info};
use serde::Serialize;

use crate::compass::CompassDirection;
use crate::config::SkyConfig;
use crate::ephemeris::{Body, EphemerisProvider, Location};
use crate::error::{SkyError, SkyResult};
use crate::geometry::{round1, unwind_deg};
use crate::grid::{build_grid, parse_date, ObservationInstant, TimeWindow};
use crate::phase::{phase_name, MoonPhase};
use crate::visibility::{select_best_window, VisibilityThresholds};

// ---------- Output model ----------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoonSummary {
    pub phase_deg: f64,
    pub phase_name: MoonPhase,
    /// Percent of the disc lit.
    pub illumination: f64,
    pub rise_local: Option<String>,
    pub set_local: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanetVisibility {
    pub key: &'static str,
    pub name: &'static str,
    pub best_from: String,
    pub best_to: String,
    pub direction: CompassDirection,
    pub alt_max_deg: f64,
    pub az_at_best_deg: f64,
    pub is_low: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkySummary {
    pub moon: MoonSummary,
    pub planets: Vec<PlanetVisibility>,
}

// ---------- Engine ----------

/// Composes the ephemeris provider with the grid, phase and visibility steps.
/// Holds no per-request state; every call recomputes from the provider.
pub struct SkySummaryEngine<E> {
    ephemeris: E,
    config: SkyConfig,
}

impl<E: EphemerisProvider> SkySummaryEngine<E> {
    pub fn new(ephemeris: E) -> Self {
        Self {
            ephemeris,
            config: SkyConfig::default(),
        }
    }

    pub fn with_config(ephemeris: E, config: SkyConfig) -> SkyResult<Self> {
        config.validate()?;
        Ok(Self { ephemeris, config })
    }

    pub fn config(&self) -> &SkyConfig {
        &self.config
    }

    /// Full summary for `date` ("YYYY-MM-DD", local to the location's zone).
    pub fn sky_summary(&self, location: &Location, date: &str) -> SkyResult<SkySummary> {
        let local_date = parse_date(date)?;
        let tz = location.timezone();
        info!(
            "[sky_summary] lat={} lon={} date={} tz={}",
            location.latitude_deg(),
            location.longitude_deg(),
            local_date,
            tz.name()
        );

        let moon = self.moon_summary(location, local_date)?;
        let planets = self.planet_visibility(location, local_date)?;

        info!(
            "[sky_summary] moon={} planets={}",
            moon.phase_name,
            planets.len()
        );
        Ok(SkySummary { moon, planets })
    }

    /// Phase at local noon and the first moonrise/moonset of the local day.
    pub fn moon_summary(&self, location: &Location, date: NaiveDate) -> SkyResult<MoonSummary> {
        let tz = location.timezone();
        let noon = NaiveTime::from_hms_opt(12, 0, 0)
            .ok_or_else(|| SkyError::InvalidConfig("local noon is not a valid time".to_string()))?;
        let noon_utc = first_instant(&build_grid(date, tz, &TimeWindow::at(noon))?)?.utc;

        let phase_deg = unwind_deg(self.ephemeris.moon_phase_angle(noon_utc)?);
        let fraction = self.ephemeris.moon_illuminated_fraction(noon_utc)?;
        if !phase_deg.is_finite() || !fraction.is_finite() {
            return Err(SkyError::EphemerisUnavailable(
                "non-finite moon phase or illumination".to_string(),
            ));
        }
        let illumination = fraction.clamp(0.0, 1.0) * 100.0;

        let day = build_grid(date, tz, &TimeWindow::full_day())?;
        let (start, end) = (first_instant(&day)?.utc, last_instant(&day)?.utc);
        let events = self.ephemeris.rise_set_events(Body::Moon, location, start, end)?;
        debug!("[moon_summary] {} rise/set events between {} and {}", events.len(), start, end);

        let rise_local = events.iter().find(|e| e.is_rise).map(|e| local_hhmm(e.at, tz));
        let set_local = events.iter().find(|e| !e.is_rise).map(|e| local_hhmm(e.at, tz));

        Ok(MoonSummary {
            phase_deg: round1(phase_deg),
            phase_name: phase_name(phase_deg),
            illumination: round1(illumination),
            rise_local,
            set_local,
        })
    }

    /// Planets with a viewing window tonight, highest peak first, capped at
    /// `max_planets`. Planets that never qualify are left out.
    pub fn planet_visibility(
        &self,
        location: &Location,
        date: NaiveDate,
    ) -> SkyResult<Vec<PlanetVisibility>> {
        let window = TimeWindow::dusk_to_dawn(&self.config)?;
        let grid = build_grid(date, location.timezone(), &window)?;
        let instants: Vec<DateTime<Utc>> = grid.iter().map(|i| i.utc).collect();
        let thresholds = VisibilityThresholds::from_config(&self.config);

        let sun = self.ephemeris.altaz(Body::Sun, location, &instants)?;
        sun.check_aligned(Body::Sun, instants.len())?;

        let mut visible = Vec::new();
        for body in Body::PLANETS {
            let series = self.ephemeris.altaz(body, location, &instants)?;
            series.check_aligned(body, instants.len())?;

            let Some(best) = select_best_window(&series, &sun, &thresholds) else {
                debug!("[planet_visibility] {} not visible", body.name());
                continue;
            };
            debug!(
                "[planet_visibility] {} peak {:.1}° at index {} ({} samples)",
                body.name(),
                best.peak_altitude_deg,
                best.peak_index,
                best.segment.sample_count()
            );

            visible.push(PlanetVisibility {
                key: body.key(),
                name: body.name(),
                best_from: grid[best.segment.first].local_hhmm(),
                best_to: grid[best.segment.last].local_hhmm(),
                direction: best.direction,
                alt_max_deg: round1(best.peak_altitude_deg),
                az_at_best_deg: round1(best.azimuth_at_peak_deg),
                is_low: best.is_low,
            });
        }

        // stable: equal peaks keep scan order
        visible.sort_by(|a, b| b.alt_max_deg.total_cmp(&a.alt_max_deg));
        visible.truncate(self.config.max_planets);
        Ok(visible)
    }
}

/// One-shot summary with the default configuration.
pub fn sky_summary<E: EphemerisProvider>(
    ephemeris: E,
    location: &Location,
    date: &str,
) -> SkyResult<SkySummary> {
    SkySummaryEngine::new(ephemeris).sky_summary(location, date)
}

fn first_instant(grid: &[ObservationInstant]) -> SkyResult<&ObservationInstant> {
    grid.first()
        .ok_or_else(|| SkyError::InvalidConfig("empty observation window".to_string()))
}

fn last_instant(grid: &[ObservationInstant]) -> SkyResult<&ObservationInstant> {
    grid.last()
        .ok_or_else(|| SkyError::InvalidConfig("empty observation window".to_string()))
}

fn local_hhmm(t: DateTime<Utc>, tz: Tz) -> String {
    t.with_timezone(&tz).format("%H:%M").to_string()
}

//! Tunable windows and thresholds.
//!
//! Defaults reproduce the production behaviour: a dusk-to-dawn scan from 18:00
//! to 03:00 local in 10 minute steps, planets must climb to 10° while the sun
//! is below civil twilight (-6°), anything peaking under 15° is flagged low,
//! and at most three planets are reported.

use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{SkyError, SkyResult};

/// Upper bound for either step; a longer step would skip whole nights.
const MAX_STEP_MINUTES: i64 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyConfig {
    /// Local "HH:MM" at which the planet scan starts.
    pub dusk_start: String,
    /// Local "HH:MM" at which the planet scan ends, on the following day.
    pub dawn_end: String,
    pub step_minutes: i64,
    pub min_altitude_deg: f64,
    pub darkness_sun_altitude_deg: f64,
    pub low_altitude_deg: f64,
    pub max_planets: usize,
    /// Coarse sweep step used by the ephemeris adapter when bracketing rise/set crossings.
    pub rise_set_scan_minutes: i64,
}

impl Default for SkyConfig {
    fn default() -> Self {
        Self {
            dusk_start: "18:00".to_string(),
            dawn_end: "03:00".to_string(),
            step_minutes: 10,
            min_altitude_deg: 10.0,
            darkness_sun_altitude_deg: -6.0,
            low_altitude_deg: 15.0,
            max_planets: 3,
            rise_set_scan_minutes: 10,
        }
    }
}

impl SkyConfig {
    /// Parses a JSON options document; missing keys keep their defaults.
    pub fn from_json_str(raw: &str) -> SkyResult<Self> {
        let config: SkyConfig = serde_json::from_str(raw)
            .map_err(|e| SkyError::InvalidConfig(format!("options JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SkyResult<()> {
        self.dusk_start_time()?;
        self.dawn_end_time()?;
        for (name, value) in [
            ("step_minutes", self.step_minutes),
            ("rise_set_scan_minutes", self.rise_set_scan_minutes),
        ] {
            if !(1..=MAX_STEP_MINUTES).contains(&value) {
                return Err(SkyError::InvalidConfig(format!(
                    "{name} must be within [1, {MAX_STEP_MINUTES}], got {value}"
                )));
            }
        }
        if self.max_planets == 0 {
            return Err(SkyError::InvalidConfig("max_planets must be at least 1".to_string()));
        }
        for (name, value) in [
            ("min_altitude_deg", self.min_altitude_deg),
            ("darkness_sun_altitude_deg", self.darkness_sun_altitude_deg),
            ("low_altitude_deg", self.low_altitude_deg),
        ] {
            if !value.is_finite() || !(-90.0..=90.0).contains(&value) {
                return Err(SkyError::InvalidConfig(format!("{name} out of range: {value}")));
            }
        }
        Ok(())
    }

    pub fn dusk_start_time(&self) -> SkyResult<NaiveTime> {
        parse_hhmm("dusk_start", &self.dusk_start)
    }

    pub fn dawn_end_time(&self) -> SkyResult<NaiveTime> {
        parse_hhmm("dawn_end", &self.dawn_end)
    }

    pub fn step(&self) -> Duration {
        Duration::minutes(self.step_minutes)
    }

    pub fn rise_set_scan_step(&self) -> Duration {
        Duration::minutes(self.rise_set_scan_minutes)
    }
}

fn parse_hhmm(field: &str, raw: &str) -> SkyResult<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|e| SkyError::InvalidConfig(format!("{field} must be HH:MM, got {raw:?}: {e}")))
}

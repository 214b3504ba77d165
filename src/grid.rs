//! Timezone-aware sampling grids over a local observation window.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use log::debug;

use crate::config::SkyConfig;
use crate::error::{SkyError, SkyResult};

/// How far back to look for the offset in force before a spring-forward gap.
const GAP_LOOKBACK_HOURS: i64 = 3;

/// One sample: the local wall-clock reading and the UTC instant it denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservationInstant {
    pub local: NaiveDateTime,
    pub utc: DateTime<Utc>,
}

impl ObservationInstant {
    pub fn local_hhmm(&self) -> String {
        self.local.format("%H:%M").to_string()
    }
}

/// A local time-of-day window, optionally ending on the next calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub end_next_day: bool,
    pub step: Duration,
}

impl TimeWindow {
    /// Evening-to-early-morning scan used for planet visibility.
    pub fn dusk_to_dawn(config: &SkyConfig) -> SkyResult<Self> {
        config.validate()?;
        let start = config.dusk_start_time()?;
        let end = config.dawn_end_time()?;
        Ok(Self {
            start,
            end,
            end_next_day: end <= start,
            step: config.step(),
        })
    }

    /// A window holding a single instant.
    pub fn at(time: NaiveTime) -> Self {
        Self {
            start: time,
            end: time,
            end_next_day: false,
            step: Duration::minutes(1),
        }
    }

    /// Local midnight to the following local midnight; yields the two bounds.
    pub fn full_day() -> Self {
        Self {
            start: NaiveTime::default(),
            end: NaiveTime::default(),
            end_next_day: true,
            step: Duration::days(1),
        }
    }
}

pub fn parse_timezone(name: &str) -> SkyResult<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| SkyError::InvalidTimezone(name.to_string()))
}

/// Parses a strict `YYYY-MM-DD` calendar date.
pub fn parse_date(raw: &str) -> SkyResult<NaiveDate> {
    let well_formed = raw.len() == 10
        && raw.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return Err(SkyError::InvalidDate(format!("{raw:?}, expected YYYY-MM-DD")));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| SkyError::InvalidDate(format!("{raw:?}: {e}")))
}

/// Builds the ordered sample grid from `window.start` to `window.end` inclusive.
///
/// Steps advance in local wall-clock time; each reading is converted to UTC on
/// its own, so a DST transition inside the window shifts the UTC spacing but
/// never the local labels.
pub fn build_grid(date: NaiveDate, tz: Tz, window: &TimeWindow) -> SkyResult<Vec<ObservationInstant>> {
    if window.step <= Duration::zero() {
        return Err(SkyError::InvalidConfig(format!(
            "grid step must be positive, got {}",
            window.step
        )));
    }

    let start = date.and_time(window.start);
    let end_date = if window.end_next_day {
        date.succ_opt()
            .ok_or_else(|| SkyError::InvalidDate(format!("{date} has no following day")))?
    } else {
        date
    };
    let end = end_date.and_time(window.end);

    let mut instants = Vec::new();
    let mut current = start;
    while current <= end {
        instants.push(ObservationInstant {
            local: current,
            utc: resolve_local(tz, current)?,
        });
        current = current.checked_add_signed(window.step).ok_or_else(|| {
            SkyError::InvalidConfig(format!("grid step {} overflows the calendar", window.step))
        })?;
    }

    debug!(
        "[build_grid] {} samples from {} to {} ({})",
        instants.len(),
        start,
        end,
        tz.name()
    );
    Ok(instants)
}

/// Local wall-clock reading to UTC. Repeated readings take the earlier
/// occurrence; readings inside a gap keep the offset from before the gap.
fn resolve_local(tz: Tz, naive: NaiveDateTime) -> SkyResult<DateTime<Utc>> {
    if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
        return Ok(dt.with_timezone(&Utc));
    }

    let before = tz
        .from_local_datetime(&(naive - Duration::hours(GAP_LOOKBACK_HOURS)))
        .earliest()
        .ok_or_else(|| {
            SkyError::InvalidDate(format!("local time {naive} cannot be resolved in {}", tz.name()))
        })?;
    let offset_s = i64::from(before.offset().fix().local_minus_utc());
    Ok(Utc.from_utc_datetime(&(naive - Duration::seconds(offset_s))))
}

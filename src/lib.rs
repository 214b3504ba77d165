//! Sky visibility and moon phase engine.
//!
//! Turns per-instant altitude/azimuth samples from an ephemeris provider into
//! "when and where to look" summaries: the moon's phase, illumination and
//! rise/set times for a local day, and the best evening window for each
//! naked-eye planet. The engine itself is exposed as a Rust API
//! ([`SkySummaryEngine`]) and, for non-Rust hosts, as JSON over a C ABI.

use std::ffi::{c_char, CStr, CString};
use std::sync::Once;

use log::{error, info};
use serde::Serialize;

pub mod compass;
pub mod config;
pub mod ephemeris;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod phase;
pub mod practical;
pub mod summary;
pub mod visibility;

pub use compass::{direction, CompassDirection};
pub use config::SkyConfig;
pub use ephemeris::{AngleSeries, Body, EphemerisProvider, Location, RiseSetEvent};
pub use error::{SkyError, SkyResult};
pub use grid::{build_grid, ObservationInstant, TimeWindow};
pub use phase::{phase_name, MoonPhase};
pub use practical::PracticalAstronomyEphemeris;
pub use summary::{sky_summary, MoonSummary, PlanetVisibility, SkySummary, SkySummaryEngine};
pub use visibility::{select_best_window, BestWindow, VisibilitySegment, VisibilityThresholds};

// ---------- Logging ----------

static INIT_LOGGER: Once = Once::new();

#[cfg(target_os = "android")]
fn init_logger() {
    use android_logger::Config;
    use log::LevelFilter;
    INIT_LOGGER.call_once(|| {
        android_logger::init_once(
            Config::default()
                .with_max_level(LevelFilter::Debug)
                .with_tag("skycore"),
        );
    });
}

#[cfg(not(target_os = "android"))]
fn init_logger() {
    INIT_LOGGER.call_once(|| {
        let _ = env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .parse_default_env()
            .try_init();
    });
}

// ---------- JSON envelopes ----------

#[derive(Serialize)]
struct ErrorBody<'a> {
    kind: &'a str,
    message: String,
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    error: ErrorBody<'a>,
}

#[derive(Serialize)]
struct Health {
    ok: bool,
    version: &'static str,
}

fn into_c_json(json: String) -> *mut c_char {
    // serde_json never emits interior NULs; fall back to an empty object just in case
    CString::new(json)
        .or_else(|_| CString::new("{}"))
        .map(CString::into_raw)
        .unwrap_or(std::ptr::null_mut())
}

fn error_json(err: &SkyError) -> String {
    let envelope = ErrorEnvelope {
        error: ErrorBody {
            kind: err.kind(),
            message: err.to_string(),
        },
    };
    serde_json::to_string(&envelope).unwrap_or_else(|_| r#"{"error":{"kind":"internal","message":""}}"#.to_string())
}

/// Reads an optional C string; null yields `None`.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string valid for the call.
unsafe fn read_c_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
}

fn summary_json(lat: f64, lon: f64, tz: Option<String>, date: Option<String>, options: Option<String>) -> String {
    let result = (|| -> SkyResult<SkySummary> {
        let tz = tz.ok_or_else(|| SkyError::InvalidTimezone("missing timezone".to_string()))?;
        let date = date.ok_or_else(|| SkyError::InvalidDate("missing date".to_string()))?;
        let config = match options.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => SkyConfig::from_json_str(raw)?,
            None => SkyConfig::default(),
        };

        let location = Location::new(lat, lon, &tz)?;
        let ephemeris = PracticalAstronomyEphemeris::with_scan_step(config.rise_set_scan_step())?;
        SkySummaryEngine::with_config(ephemeris, config)?.sky_summary(&location, &date)
    })();

    match result {
        Ok(summary) => serde_json::to_string(&summary).unwrap_or_else(|e| {
            error!("[sky_summary_json] Failed to serialize summary: {}", e);
            error_json(&SkyError::EphemerisUnavailable(e.to_string()))
        }),
        Err(e) => {
            error!("[sky_summary_json] {}", e);
            error_json(&e)
        }
    }
}

// ---------- C ABI ----------

#[no_mangle]
pub extern "C" fn free_json(ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }
    unsafe {
        let _ = CString::from_raw(ptr);
    }
}

/// Summary for `date` ("YYYY-MM-DD") at `lat`/`lon` in IANA zone `tz`, as JSON.
/// The returned string must be released with [`free_json`].
#[no_mangle]
pub extern "C" fn sky_summary_json(lat: f64, lon: f64, tz: *const c_char, date: *const c_char) -> *mut c_char {
    sky_summary_with_options_json(lat, lon, tz, date, std::ptr::null())
}

/// Like [`sky_summary_json`], with an optional JSON document overriding
/// [`SkyConfig`] fields. `options_json` may be null.
#[no_mangle]
pub extern "C" fn sky_summary_with_options_json(
    lat: f64,
    lon: f64,
    tz: *const c_char,
    date: *const c_char,
    options_json: *const c_char,
) -> *mut c_char {
    init_logger();
    let (tz, date, options) = unsafe { (read_c_str(tz), read_c_str(date), read_c_str(options_json)) };
    info!(
        "[sky_summary_json] lat={} lon={} tz={:?} date={:?} options={}",
        lat,
        lon,
        tz,
        date,
        options.is_some()
    );
    into_c_json(summary_json(lat, lon, tz, date, options))
}

#[no_mangle]
pub extern "C" fn sky_health_json() -> *mut c_char {
    let health = Health {
        ok: true,
        version: env!("CARGO_PKG_VERSION"),
    };
    into_c_json(serde_json::to_string(&health).unwrap_or_else(|_| r#"{"ok":true}"#.to_string()))
}

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::{CStr, CString};

use serde::Deserialize;
use skycore::{
    free_json, phase_name, sky_health_json, sky_summary_json, sky_summary_with_options_json, Location,
    PracticalAstronomyEphemeris, SkySummaryEngine,
};

fn call_summary(lat: f64, lon: f64, tz: &str, date: &str) -> serde_json::Value {
    let tz = CString::new(tz).unwrap();
    let date = CString::new(date).unwrap();
    let ptr = sky_summary_json(lat, lon, tz.as_ptr(), date.as_ptr());
    take_json(ptr)
}

fn take_json(ptr: *mut std::ffi::c_char) -> serde_json::Value {
    assert!(!ptr.is_null(), "FFI should return non-null pointer");
    let json_str = unsafe { CStr::from_ptr(ptr).to_string_lossy().into_owned() };
    free_json(ptr);
    serde_json::from_str(&json_str)
        .unwrap_or_else(|err| panic!("Expected valid JSON, got error: {err}\nPayload: {json_str}"))
}

fn minutes_of(hhmm: &str) -> u32 {
    let bytes = hhmm.as_bytes();
    assert!(
        bytes.len() == 5 && bytes[2] == b':' && hhmm[..2].chars().chain(hhmm[3..].chars()).all(|c| c.is_ascii_digit()),
        "not HH:MM: {hhmm}"
    );
    let h: u32 = hhmm[..2].parse().unwrap();
    let m: u32 = hhmm[3..].parse().unwrap();
    assert!(h < 24 && m < 60, "not a clock time: {hhmm}");
    h * 60 + m
}

/// Minutes since 18:00, so times after midnight sort after the evening.
fn night_minutes(hhmm: &str) -> u32 {
    (minutes_of(hhmm) + 24 * 60 - 18 * 60) % (24 * 60)
}

#[test]
fn test_sky_summary_bratislava() {
    let summary = call_summary(48.15, 17.11, "Europe/Bratislava", "2024-06-21");
    println!("Sky summary JSON: {summary}");

    let moon = &summary["moon"];
    let phase_deg = moon["phase_deg"].as_f64().expect("phase_deg should be a number");
    assert!((0.0..360.0).contains(&phase_deg));
    assert_eq!(moon["phase_name"], phase_name(phase_deg).label());
    // full moon fell at 2024-06-22 01:08 UTC, about 15 hours after local noon
    assert_eq!(moon["phase_name"], "Full moon");
    assert!(moon["illumination"].as_f64().unwrap() > 90.0);
    for key in ["rise_local", "set_local"] {
        if let Some(t) = moon[key].as_str() {
            minutes_of(t);
        }
    }

    let planets = summary["planets"].as_array().expect("planets should be an array");
    assert!(planets.len() <= 3, "at most three planets, got {}", planets.len());

    let mut previous_alt = f64::INFINITY;
    for planet in planets {
        let from = planet["best_from"].as_str().unwrap();
        let to = planet["best_to"].as_str().unwrap();
        assert!(night_minutes(from) <= night_minutes(to), "{from} should not be after {to}");

        let alt = planet["alt_max_deg"].as_f64().unwrap();
        assert!(alt >= 10.0 && alt <= 90.0, "peak altitude {alt}");
        assert!(alt <= previous_alt, "planets must be sorted by peak altitude");
        previous_alt = alt;

        let az = planet["az_at_best_deg"].as_f64().unwrap();
        assert!((0.0..=360.0).contains(&az));
        // alt_max_deg is rounded, the flag is not
        let is_low = planet["is_low"].as_bool().unwrap();
        if (alt - 15.0).abs() > 0.05 {
            assert_eq!(is_low, alt < 15.0);
        }
    }
}

#[derive(Debug, Deserialize)]
struct SchemaFixture {
    #[serde(rename = "version")]
    _version: u32,
    #[serde(rename = "description")]
    _description: String,
    moon_keys: Vec<String>,
    planet_keys: Vec<String>,
    field_types: BTreeMap<String, ExpectedType>,
    required_non_empty: Vec<String>,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum ExpectedType {
    String,
    OptionalString,
    Number,
    Boolean,
}

fn check_fields(
    obj: &serde_json::Map<String, serde_json::Value>,
    expected_keys: &[String],
    fixture: &SchemaFixture,
) {
    let actual: BTreeSet<_> = obj.keys().cloned().collect();
    let expected: BTreeSet<_> = expected_keys.iter().cloned().collect();
    assert_eq!(
        actual, expected,
        "JSON keys diverged from golden schema (update tests/fixtures/sky_summary_schema.json if intentional)"
    );

    for field in expected_keys {
        let value = &obj[field];
        let expected_type = fixture
            .field_types
            .get(field)
            .unwrap_or_else(|| panic!("Field '{field}' has no type in the schema fixture"));
        match expected_type {
            ExpectedType::String => {
                let s = value
                    .as_str()
                    .unwrap_or_else(|| panic!("Field '{field}' should be a string"));
                if fixture.required_non_empty.iter().any(|f| f == field) {
                    assert!(!s.trim().is_empty(), "Field '{field}' should not be empty");
                }
            }
            ExpectedType::OptionalString => {
                assert!(value.is_null() || value.is_string(), "Field '{field}' should be a string or null");
            }
            ExpectedType::Number => {
                value
                    .as_f64()
                    .unwrap_or_else(|| panic!("Field '{field}' should be a number, got {value}"));
            }
            ExpectedType::Boolean => {
                assert!(value.is_boolean(), "Field '{field}' should be a boolean, got {value}");
            }
        }
    }
}

#[test]
fn summary_schema_matches_fixture() {
    let fixture: SchemaFixture = serde_json::from_str(include_str!("fixtures/sky_summary_schema.json"))
        .expect("fixture JSON should parse");

    // several dates so at least one night has a visible planet
    let mut planets_seen = 0;
    for date in ["2024-06-21", "2024-12-21", "2025-01-15"] {
        let summary = call_summary(48.15, 17.11, "Europe/Bratislava", date);
        let top: BTreeSet<_> = summary.as_object().unwrap().keys().cloned().collect();
        assert_eq!(top, BTreeSet::from(["moon".to_string(), "planets".to_string()]));

        check_fields(summary["moon"].as_object().unwrap(), &fixture.moon_keys, &fixture);
        for planet in summary["planets"].as_array().unwrap() {
            check_fields(planet.as_object().unwrap(), &fixture.planet_keys, &fixture);
            planets_seen += 1;
        }
    }
    assert!(planets_seen > 0, "expected at least one visible planet across the sample nights");
}

#[test]
fn test_invalid_timezone_is_reported() {
    let summary = call_summary(48.15, 17.11, "Europe/Atlantis", "2024-06-21");
    assert_eq!(summary["error"]["kind"], "invalid_timezone");
    assert!(summary["error"]["message"].as_str().unwrap().contains("Europe/Atlantis"));
}

#[test]
fn test_invalid_date_is_reported() {
    for date in ["2024-13-01", "2024-6-1", "yesterday"] {
        let summary = call_summary(48.15, 17.11, "Europe/Bratislava", date);
        assert_eq!(summary["error"]["kind"], "invalid_date", "{date}");
    }
}

#[test]
fn test_out_of_range_location_is_reported() {
    let summary = call_summary(123.0, 17.11, "Europe/Bratislava", "2024-06-21");
    assert_eq!(summary["error"]["kind"], "invalid_location");
}

#[test]
fn test_null_pointers_are_reported() {
    let date = CString::new("2024-06-21").unwrap();
    let summary = take_json(sky_summary_json(48.15, 17.11, std::ptr::null(), date.as_ptr()));
    assert_eq!(summary["error"]["kind"], "invalid_timezone");

    let tz = CString::new("Europe/Bratislava").unwrap();
    let summary = take_json(sky_summary_json(48.15, 17.11, tz.as_ptr(), std::ptr::null()));
    assert_eq!(summary["error"]["kind"], "invalid_date");
}

#[test]
fn test_options_override_defaults() {
    let tz = CString::new("Europe/Bratislava").unwrap();
    let date = CString::new("2024-12-21").unwrap();

    let options = CString::new(r#"{"max_planets": 1}"#).unwrap();
    let summary = take_json(sky_summary_with_options_json(
        48.15,
        17.11,
        tz.as_ptr(),
        date.as_ptr(),
        options.as_ptr(),
    ));
    assert!(summary["planets"].as_array().unwrap().len() <= 1);

    let bad = CString::new(r#"{"step_minutes": -5}"#).unwrap();
    let summary = take_json(sky_summary_with_options_json(
        48.15,
        17.11,
        tz.as_ptr(),
        date.as_ptr(),
        bad.as_ptr(),
    ));
    assert_eq!(summary["error"]["kind"], "invalid_config");

    let huge = CString::new(r#"{"step_minutes": 1000000000000}"#).unwrap();
    let summary = take_json(sky_summary_with_options_json(
        48.15,
        17.11,
        tz.as_ptr(),
        date.as_ptr(),
        huge.as_ptr(),
    ));
    assert_eq!(summary["error"]["kind"], "invalid_config");
}

#[test]
fn test_library_api_matches_ffi_and_is_repeatable() {
    let ephemeris = PracticalAstronomyEphemeris::new();
    let engine = SkySummaryEngine::new(&ephemeris);
    let location = Location::new(48.15, 17.11, "Europe/Bratislava").unwrap();

    let first = engine.sky_summary(&location, "2024-06-21").unwrap();
    let second = engine.sky_summary(&location, "2024-06-21").unwrap();
    assert_eq!(first, second);

    let via_ffi = call_summary(48.15, 17.11, "Europe/Bratislava", "2024-06-21");
    assert_eq!(serde_json::to_value(&first).unwrap(), via_ffi);
}

#[test]
fn test_white_night_high_latitude() {
    // Svalbard at midsummer: the sun never drops below the darkness threshold
    let summary = call_summary(78.22, 15.65, "Arctic/Longyearbyen", "2024-06-21");
    assert!(summary.get("error").is_none(), "unexpected error: {summary}");
    for planet in summary["planets"].as_array().unwrap() {
        let alt = planet["alt_max_deg"].as_f64().unwrap();
        assert!(alt >= 10.0);
    }
}

#[test]
fn test_southern_hemisphere() {
    let summary = call_summary(-33.87, 151.21, "Australia/Sydney", "2024-06-21");
    assert!(summary.get("error").is_none(), "unexpected error: {summary}");
    assert!(summary["planets"].as_array().unwrap().len() <= 3);
}

#[test]
fn test_health() {
    let health = take_json(sky_health_json());
    assert_eq!(health["ok"], true);
    assert_eq!(health["version"], env!("CARGO_PKG_VERSION"));
}

//! Error taxonomy for the sky summary engine.

/// Result type for engine operations.
pub type SkyResult<T> = Result<T, SkyError>;

/// Input and environment failures surfaced to the caller.
///
/// A body that never clears the horizon, or a day without a moonrise, is not
/// an error; those outcomes are represented as absence in the summary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SkyError {
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Ephemeris unavailable: {0}")]
    EphemerisUnavailable(String),
}

impl SkyError {
    /// Stable identifier used in JSON error envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            SkyError::InvalidTimezone(_) => "invalid_timezone",
            SkyError::InvalidDate(_) => "invalid_date",
            SkyError::InvalidLocation(_) => "invalid_location",
            SkyError::InvalidConfig(_) => "invalid_config",
            SkyError::EphemerisUnavailable(_) => "ephemeris_unavailable",
        }
    }
}

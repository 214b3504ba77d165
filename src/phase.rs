//! Named lunar phases from the sun-moon phase angle.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::geometry::unwind_deg;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoonPhase {
    NewMoon,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    FullMoon,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

/// Strict upper bounds in ascending order; the trailing entry wraps back to new.
const PHASE_LIMITS: [(f64, MoonPhase); 9] = [
    (22.5, MoonPhase::NewMoon),
    (67.5, MoonPhase::WaxingCrescent),
    (112.5, MoonPhase::FirstQuarter),
    (157.5, MoonPhase::WaxingGibbous),
    (202.5, MoonPhase::FullMoon),
    (247.5, MoonPhase::WaningGibbous),
    (292.5, MoonPhase::LastQuarter),
    (337.5, MoonPhase::WaningCrescent),
    (360.0, MoonPhase::NewMoon),
];

impl MoonPhase {
    pub fn label(&self) -> &'static str {
        match self {
            MoonPhase::NewMoon => "New moon",
            MoonPhase::WaxingCrescent => "Waxing crescent",
            MoonPhase::FirstQuarter => "First quarter",
            MoonPhase::WaxingGibbous => "Waxing gibbous",
            MoonPhase::FullMoon => "Full moon",
            MoonPhase::WaningGibbous => "Waning gibbous",
            MoonPhase::LastQuarter => "Last quarter",
            MoonPhase::WaningCrescent => "Waning crescent",
        }
    }
}

impl fmt::Display for MoonPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for MoonPhase {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Classifies a phase angle (0 = new, 180 = full) after wrapping it into [0, 360).
pub fn phase_name(phase_deg: f64) -> MoonPhase {
    let normalized = unwind_deg(phase_deg);
    PHASE_LIMITS
        .iter()
        .find(|(limit, _)| normalized < *limit)
        .map(|(_, phase)| *phase)
        // only NaN gets here
        .unwrap_or(MoonPhase::NewMoon)
}

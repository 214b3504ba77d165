//! Eight-point compass labels for azimuths.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::unwind_deg;

const SECTOR_DEG: f64 = 45.0;
const HALF_SECTOR_DEG: f64 = SECTOR_DEG / 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompassDirection {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl CompassDirection {
    /// Clockwise from north.
    pub const ALL: [CompassDirection; 8] = [
        CompassDirection::N,
        CompassDirection::NE,
        CompassDirection::E,
        CompassDirection::SE,
        CompassDirection::S,
        CompassDirection::SW,
        CompassDirection::W,
        CompassDirection::NW,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CompassDirection::N => "N",
            CompassDirection::NE => "NE",
            CompassDirection::E => "E",
            CompassDirection::SE => "SE",
            CompassDirection::S => "S",
            CompassDirection::SW => "SW",
            CompassDirection::W => "W",
            CompassDirection::NW => "NW",
        }
    }
}

impl fmt::Display for CompassDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps an azimuth in degrees to the compass point whose sector contains it.
///
/// Sectors are centred on their label: the half-sector offset is added before
/// dividing, so N spans [337.5, 22.5) and an azimuth of exactly 22.5 is NE.
pub fn direction(azimuth_deg: f64) -> CompassDirection {
    let shifted = unwind_deg(azimuth_deg) + HALF_SECTOR_DEG;
    let index = (shifted / SECTOR_DEG) as usize % CompassDirection::ALL.len();
    CompassDirection::ALL[index]
}

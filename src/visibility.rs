//! Best viewing window selection for one body over a night's sample grid.
//!
//! Samples qualify through an ordered chain of predicates: first "high enough
//! and the sky is dark", then "high enough" alone. The first tier that
//! qualifies any sample wins. Within it the highest sample is the peak and the
//! reported window is the unbroken run of qualifying samples around it; other
//! runs the same night are dropped.

use crate::compass::{direction, CompassDirection};
use crate::config::SkyConfig;
use crate::ephemeris::AngleSeries;
use crate::geometry::unwind_deg;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityThresholds {
    pub min_altitude_deg: f64,
    pub darkness_sun_altitude_deg: f64,
    pub low_altitude_deg: f64,
}

impl Default for VisibilityThresholds {
    fn default() -> Self {
        Self::from_config(&SkyConfig::default())
    }
}

impl VisibilityThresholds {
    pub fn from_config(config: &SkyConfig) -> Self {
        Self {
            min_altitude_deg: config.min_altitude_deg,
            darkness_sun_altitude_deg: config.darkness_sun_altitude_deg,
            low_altitude_deg: config.low_altitude_deg,
        }
    }
}

/// Inclusive, non-empty run of consecutive sample indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilitySegment {
    pub first: usize,
    pub last: usize,
}

impl VisibilitySegment {
    pub fn contains(&self, index: usize) -> bool {
        (self.first..=self.last).contains(&index)
    }

    pub fn sample_count(&self) -> usize {
        self.last - self.first + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestWindow {
    pub segment: VisibilitySegment,
    pub peak_index: usize,
    pub peak_altitude_deg: f64,
    pub azimuth_at_peak_deg: f64,
    pub direction: CompassDirection,
    pub is_low: bool,
}

/// Picks the best viewing window for `body`, or `None` when it never
/// qualifies. `sun` must be sampled on the same instants as `body`.
pub fn select_best_window(
    body: &AngleSeries,
    sun: &AngleSeries,
    thresholds: &VisibilityThresholds,
) -> Option<BestWindow> {
    let n = body.len().min(body.azimuth_deg.len()).min(sun.len());
    let alt = &body.altitude_deg;

    let dark_and_high =
        |i: usize| alt[i] >= thresholds.min_altitude_deg && sun.altitude_deg[i] < thresholds.darkness_sun_altitude_deg;
    let high = |i: usize| alt[i] >= thresholds.min_altitude_deg;
    let tiers: [&dyn Fn(usize) -> bool; 2] = [&dark_and_high, &high];

    let indices = tiers
        .iter()
        .map(|predicate| qualifying_indices(n, *predicate))
        .find(|indices| !indices.is_empty())?;

    // strict comparison keeps the first of equal maxima
    let peak_index = indices
        .iter()
        .copied()
        .reduce(|best, i| if alt[i] > alt[best] { i } else { best })?;

    let segment = contiguous_segments(&indices)
        .into_iter()
        .find(|segment| segment.contains(peak_index))?;

    let peak_altitude_deg = alt[peak_index];
    let azimuth_at_peak_deg = unwind_deg(body.azimuth_deg[peak_index]);

    Some(BestWindow {
        segment,
        peak_index,
        peak_altitude_deg,
        azimuth_at_peak_deg,
        direction: direction(azimuth_at_peak_deg),
        is_low: peak_altitude_deg < thresholds.low_altitude_deg,
    })
}

fn qualifying_indices(n: usize, predicate: &dyn Fn(usize) -> bool) -> Vec<usize> {
    (0..n).filter(|&i| predicate(i)).collect()
}

/// Groups ascending indices into maximal runs of consecutive values.
pub fn contiguous_segments(indices: &[usize]) -> Vec<VisibilitySegment> {
    let mut segments: Vec<VisibilitySegment> = Vec::new();
    for &i in indices {
        match segments.last_mut() {
            Some(current) if current.last + 1 == i => current.last = i,
            _ => segments.push(VisibilitySegment { first: i, last: i }),
        }
    }
    segments
}

//! Piecewise-linear correction built from calibration points
//!
//! The engine keeps the subset of slots that may be used (enabled, strictly
//! positive, no duplicated actual or reference value) sorted by actual value,
//! and one straight-line segment between each pair of neighbours.
//!
//! ```text
//!   ref
//!    ^                      . (extrapolated along last segment)
//!    |                 p2 o
//!    |              .
//!    |       p1  o
//!    |     .
//!    |  .  (extrapolated along first segment)
//!    +-----------------------> act
//! ```

use heapless::Vec;

use super::CalibrationPoint;

/// One straight-line correction segment: `corrected = slope * raw + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Segment {
    /// Gain of the segment
    pub slope: f32,
    /// Value at a raw reading of zero
    pub intercept: f32,
}

impl Segment {
    /// Constant offset, used when only one point is available
    #[must_use]
    pub const fn offset(offset: f32) -> Self {
        Self {
            slope: 1.0,
            intercept: offset,
        }
    }

    /// Line through two points with distinct actual values
    #[must_use]
    pub fn through(lower: &CalibrationPoint, upper: &CalibrationPoint) -> Self {
        let d_ref = f32::from(upper.ref_value) - f32::from(lower.ref_value);
        let d_act = f32::from(upper.act_value) - f32::from(lower.act_value);
        let slope = d_ref / d_act;
        let intercept = f32::from(upper.ref_value) - slope * f32::from(upper.act_value);
        Self { slope, intercept }
    }

    /// Apply the segment to a raw reading, rounding to the nearest integer
    // Raw readings are at most a few tens of thousands, well inside f32 precision
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn apply(&self, raw: i32) -> i32 {
        libm::roundf(self.slope * raw as f32 + self.intercept) as i32
    }
}

/// Calibration points in use and the correction derived from them
///
/// `N` is the slot capacity. The engine never holds more used points than
/// there are slots, so neither list can overflow.
#[derive(Debug, Clone)]
pub struct CalibrationEngine<const N: usize> {
    used: Vec<CalibrationPoint, N>,
    segments: Vec<Segment, N>,
}

impl<const N: usize> Default for CalibrationEngine<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> CalibrationEngine<N> {
    /// Create an engine with no points (identity correction)
    #[must_use]
    pub const fn new() -> Self {
        Self {
            used: Vec::new(),
            segments: Vec::new(),
        }
    }

    /// Create an engine from a set of slots
    #[must_use]
    pub fn from_slots(slots: &[CalibrationPoint]) -> Self {
        let mut engine = Self::new();
        engine.rebuild(slots);
        engine
    }

    /// Recompute the used points and segments from the slots
    ///
    /// Slots are scanned in index order, so when two eligible points share an
    /// actual or reference value the one in the lower slot wins. Slots beyond
    /// the capacity `N` are ignored.
    pub fn rebuild(&mut self, slots: &[CalibrationPoint]) {
        self.used.clear();
        self.segments.clear();

        for point in slots.iter().take(N).filter(|point| point.is_eligible()) {
            let duplicate = self.used.iter().any(|used| {
                used.act_value == point.act_value || used.ref_value == point.ref_value
            });
            if duplicate {
                #[cfg(feature = "defmt")]
                defmt::debug!(
                    "Skipping duplicate calibration point ref={} act={}",
                    point.ref_value,
                    point.act_value
                );
                continue;
            }

            let position = self
                .used
                .iter()
                .position(|used| used.act_value > point.act_value)
                .unwrap_or(self.used.len());
            // At most `N` slots are scanned, so there is always room
            let _ = self.used.insert(position, *point);
        }

        match self.used.as_slice() {
            [] => {}
            [only] => {
                let offset = f32::from(only.ref_value) - f32::from(only.act_value);
                let _ = self.segments.push(Segment::offset(offset));
            }
            used => {
                for pair in used.windows(2) {
                    let _ = self.segments.push(Segment::through(&pair[0], &pair[1]));
                }
            }
        }

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "Calibration rebuilt: {} used points, {} segments",
            self.used.len(),
            self.segments.len()
        );
    }

    /// Used points, ascending by actual value
    #[must_use]
    pub fn used_points(&self) -> &[CalibrationPoint] {
        &self.used
    }

    /// Correction segments, one per adjacent pair of used points
    ///
    /// Holds a single constant-offset segment when only one point is used and
    /// nothing when no point is used.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of used points
    #[must_use]
    pub fn used_count(&self) -> usize {
        self.used.len()
    }

    /// Correct a raw reading
    ///
    /// - no used point: the reading is returned unchanged
    /// - one used point: the constant offset is added
    /// - otherwise the segment ending at the first used point at or above the
    ///   reading is applied, so readings below the first point extrapolate
    ///   along the first segment and readings at or above the last point
    ///   extrapolate along the last one
    #[must_use]
    pub fn evaluate(&self, raw: i32) -> i32 {
        match self.segment_for(raw) {
            Some(segment) => segment.apply(raw),
            None => raw,
        }
    }

    fn segment_for(&self, raw: i32) -> Option<&Segment> {
        let upper = self
            .used
            .iter()
            .skip(1)
            .position(|point| raw <= i32::from(point.act_value));

        match upper {
            Some(index) => self.segments.get(index),
            None => self.segments.last(),
        }
    }
}

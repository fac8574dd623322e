//! Linear value/index ranges
//!
//! Most PMIC register fields encode a physical quantity (microvolts,
//! samples, ...) as an index into an affine range: `value = min + step * (idx - min_idx)`.
//! [`LinearRange`] converts in both directions, [`LinearRangeGroup`] chains
//! several ranges for fields whose step changes across the index domain.

use thiserror::Error;

/// Conversion failures reported by [`LinearRange`] and [`LinearRangeGroup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RangeError {
    /// The index is not part of the range.
    #[error("index outside of range")]
    OutOfRange,
    /// No index produces a value inside the requested window.
    #[error("no value within the requested window")]
    Invalid,
    /// No range of a group brackets the requested value.
    #[error("value not covered by any range")]
    NotFound,
}

/// One affine segment mapping register indices to values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinearRange {
    min: i32,
    step: u32,
    min_idx: u16,
    max_idx: u16,
}

impl LinearRange {
    /// Create a range starting at `min` for `min_idx`, growing by `step` per index.
    ///
    /// Panics (at compile time for constants) if `min_idx > max_idx` or if
    /// the value at `max_idx` does not fit in an `i32`.
    pub const fn new(min: i32, step: u32, min_idx: u16, max_idx: u16) -> Self {
        assert!(min_idx <= max_idx, "min_idx must not exceed max_idx");
        let top = min as i64 + step as i64 * (max_idx - min_idx) as i64;
        assert!(top <= i32::MAX as i64, "range top value overflows i32");
        Self {
            min,
            step,
            min_idx,
            max_idx,
        }
    }

    /// Value at `min_idx`
    pub const fn min_value(&self) -> i32 {
        self.min
    }

    /// Value at `max_idx`. Never overflows, [`Self::new`] rejects such ranges.
    pub const fn max_value(&self) -> i32 {
        (self.min as i64 + self.step as i64 * (self.max_idx - self.min_idx) as i64) as i32
    }

    pub const fn step(&self) -> u32 {
        self.step
    }

    pub const fn min_index(&self) -> u16 {
        self.min_idx
    }

    pub const fn max_index(&self) -> u16 {
        self.max_idx
    }

    /// Number of indices covered by the range
    pub const fn values_count(&self) -> u32 {
        (self.max_idx - self.min_idx) as u32 + 1
    }

    pub const fn contains_index(&self, idx: u16) -> bool {
        idx >= self.min_idx && idx <= self.max_idx
    }

    pub const fn contains_value(&self, value: i32) -> bool {
        value >= self.min && value <= self.max_value()
    }

    /// Convert an index into its value.
    ///
    /// Returns [`RangeError::OutOfRange`] if `idx` is outside `[min_idx, max_idx]`.
    pub fn get_value(&self, idx: u16) -> Result<i32, RangeError> {
        if !self.contains_index(idx) {
            return Err(RangeError::OutOfRange);
        }

        Ok(self.value_unchecked(idx))
    }

    /// Convert a value into the index of the nearest representable value.
    ///
    /// Values exactly half-way between two indices round up to the higher index.
    /// Values outside the range clamp to `min_idx` or `max_idx`, and a flat
    /// range (`step == 0`) always yields `min_idx`.
    pub fn get_index(&self, value: i32) -> u16 {
        if self.step == 0 || value <= self.min {
            return self.min_idx;
        }
        if value >= self.max_value() {
            return self.max_idx;
        }

        let offset = value as i64 - self.min as i64;
        let step = self.step as i64;
        self.min_idx + ((offset + step / 2) / step) as u16
    }

    /// Find the index whose value is the highest one inside `[val_min, val_max]`.
    ///
    /// Returns [`RangeError::Invalid`] if the window is empty or no index of
    /// the range maps into it.
    pub fn get_win_index(&self, val_min: i32, val_max: i32) -> Result<u16, RangeError> {
        if val_min > val_max || val_max < self.min || val_min > self.max_value() {
            return Err(RangeError::Invalid);
        }

        if self.step == 0 {
            // Window overlaps the only value of a flat range
            return Ok(self.min_idx);
        }

        let idx = if val_max >= self.max_value() {
            self.max_idx
        } else {
            let offset = val_max as i64 - self.min as i64;
            self.min_idx + (offset / self.step as i64) as u16
        };

        if self.value_unchecked(idx) < val_min {
            return Err(RangeError::Invalid);
        }

        Ok(idx)
    }

    fn value_unchecked(&self, idx: u16) -> i32 {
        (self.min as i64 + self.step as i64 * (idx - self.min_idx) as i64) as i32
    }
}

/// Ordered set of ranges with disjoint, increasing index intervals.
#[derive(Debug, Clone, Copy)]
pub struct LinearRangeGroup<'a> {
    ranges: &'a [LinearRange],
}

impl<'a> LinearRangeGroup<'a> {
    pub const fn new(ranges: &'a [LinearRange]) -> Self {
        Self { ranges }
    }

    pub const fn ranges(&self) -> &'a [LinearRange] {
        self.ranges
    }

    /// Convert a group-wide index into its value using the range that contains it.
    pub fn get_value(&self, idx: u16) -> Result<i32, RangeError> {
        self.ranges
            .iter()
            .find(|r| r.contains_index(idx))
            .ok_or(RangeError::OutOfRange)?
            .get_value(idx)
    }

    /// Convert a value into an index using the first range whose values bracket it.
    pub fn get_index(&self, value: i32) -> Result<u16, RangeError> {
        self.ranges
            .iter()
            .find(|r| r.contains_value(value))
            .map(|r| r.get_index(value))
            .ok_or(RangeError::NotFound)
    }

    /// Window search across all ranges, keeping the highest matching value.
    pub fn get_win_index(&self, val_min: i32, val_max: i32) -> Result<u16, RangeError> {
        let mut best: Option<(i32, u16)> = None;

        for range in self.ranges {
            let Ok(idx) = range.get_win_index(val_min, val_max) else {
                continue;
            };
            let value = range.value_unchecked(idx);
            if best.is_none_or(|(best_value, _)| value > best_value) {
                best = Some((value, idx));
            }
        }

        best.map(|(_, idx)| idx).ok_or(RangeError::Invalid)
    }
}

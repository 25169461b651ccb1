// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-window collection state

use adleak_fixed::FixedPoint;
use heapless::Vec;

use crate::error::{PolicyError, Result};

/// Lifecycle of one measurement window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    /// Fewer than `seq_length` samples seen
    Collecting,
    /// All samples seen; the next call should be `encode`
    ReadyToEncode,
}

/// Retention outcome for one collected sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Retained,
    Skipped,
}

impl Decision {
    #[inline]
    pub const fn is_retained(self) -> bool {
        matches!(self, Decision::Retained)
    }
}

/// Retained samples of the current window
///
/// Holds at most `SEQ` retained vectors together with their sequence
/// indices, plus the counters that drive the skip rules.
#[derive(Debug, Clone)]
pub struct CollectedWindow<const SEQ: usize, const FEATURES: usize> {
    values: Vec<[FixedPoint; FEATURES], SEQ>,
    indices: Vec<usize, SEQ>,
    seen: usize,
    skip: usize,
}

impl<const SEQ: usize, const FEATURES: usize> Default for CollectedWindow<SEQ, FEATURES> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const SEQ: usize, const FEATURES: usize> CollectedWindow<SEQ, FEATURES> {
    pub const fn new() -> Self {
        Self {
            values: Vec::new(),
            indices: Vec::new(),
            seen: 0,
            skip: 0,
        }
    }

    /// Samples collected so far, retained or not
    #[inline]
    pub fn seen(&self) -> usize {
        self.seen
    }

    /// Consecutive skipped samples since the last retention
    #[inline]
    pub fn skip(&self) -> usize {
        self.skip
    }

    #[inline]
    pub fn retained_count(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.seen == 0
    }

    /// Sequence indices of retained samples, ascending
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Retained vectors in sequence order
    pub fn values(&self) -> &[[FixedPoint; FEATURES]] {
        &self.values
    }

    /// Reference vector for distance scoring
    pub fn last_retained(&self) -> Option<&[FixedPoint; FEATURES]> {
        self.values.last()
    }

    /// Retained `(index, vector)` pairs in sequence order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[FixedPoint; FEATURES])> + '_ {
        self.indices.iter().copied().zip(self.values.iter())
    }

    pub fn state(&self, seq_length: usize) -> WindowState {
        if self.seen >= seq_length {
            WindowState::ReadyToEncode
        } else {
            WindowState::Collecting
        }
    }

    /// Store `sample` as the next retained vector
    pub(crate) fn retain(&mut self, sample: &[FixedPoint]) -> Result<()> {
        let row: [FixedPoint; FEATURES] =
            sample.try_into().map_err(|_| PolicyError::ShapeMismatch {
                expected: FEATURES,
                actual: sample.len(),
            })?;

        let full = PolicyError::WindowComplete { seq_length: SEQ };
        self.indices.push(self.seen).map_err(|_| full)?;
        if self.values.push(row).is_err() {
            self.indices.pop();
            return Err(full);
        }

        self.seen += 1;
        self.skip = 0;
        Ok(())
    }

    /// Record a dropped sample
    pub(crate) fn skip_sample(&mut self) {
        self.seen += 1;
        self.skip += 1;
    }

    pub(crate) fn clear(&mut self) {
        self.values.clear();
        self.indices.clear();
        self.seen = 0;
        self.skip = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fx<const N: usize>(raw: [i16; N]) -> [FixedPoint; N] {
        raw.map(FixedPoint::from_raw)
    }

    #[test]
    fn test_retain_and_skip_counters() {
        let mut window: CollectedWindow<4, 2> = CollectedWindow::new();
        assert!(window.is_empty());
        assert_eq!(window.last_retained(), None);

        window.retain(&fx([1, 2])).unwrap();
        window.skip_sample();
        window.skip_sample();
        assert_eq!(window.skip(), 2);
        window.retain(&fx([3, 4])).unwrap();

        assert_eq!(window.seen(), 4);
        assert_eq!(window.skip(), 0);
        assert_eq!(window.indices(), &[0, 3]);
        assert_eq!(window.last_retained(), Some(&fx([3, 4])));
        assert_eq!(window.state(4), WindowState::ReadyToEncode);
        assert_eq!(window.state(5), WindowState::Collecting);

        let pairs: std::vec::Vec<_> = window.iter().collect();
        assert_eq!(pairs, [(0usize, &fx([1, 2])), (3usize, &fx([3, 4]))]);
    }

    #[test]
    fn test_retain_rejects_wrong_shape() {
        let mut window: CollectedWindow<4, 2> = CollectedWindow::new();
        assert_eq!(
            window.retain(&fx([1, 2, 3])),
            Err(PolicyError::ShapeMismatch {
                expected: 2,
                actual: 3
            })
        );
        assert!(window.is_empty());
    }

    #[test]
    fn test_capacity_is_enforced() {
        let mut window: CollectedWindow<2, 1> = CollectedWindow::new();
        window.retain(&fx([1])).unwrap();
        window.retain(&fx([2])).unwrap();
        assert_eq!(
            window.retain(&fx([3])),
            Err(PolicyError::WindowComplete { seq_length: 2 })
        );
        assert_eq!(window.retained_count(), 2);
        assert_eq!(window.indices().len(), 2);
    }

    #[test]
    fn test_clear() {
        let mut window: CollectedWindow<3, 1> = CollectedWindow::default();
        window.retain(&fx([7])).unwrap();
        window.skip_sample();
        window.clear();
        assert!(window.is_empty());
        assert_eq!(window.retained_count(), 0);
        assert_eq!(window.skip(), 0);
    }
}

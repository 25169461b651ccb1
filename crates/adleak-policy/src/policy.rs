// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Adaptive leakage policy
//!
//! One policy instance owns the state of the current window. Each call to
//! [`AdaptiveLeakPolicy::collect`] scores a sample and decides whether to keep
//! it; [`AdaptiveLeakPolicy::encode`] packs the kept samples into the
//! caller's buffer and starts the next window.
//!
//! Decision rule for every sample after the first:
//!
//! ```text
//! retained == max_collected  -> skip
//! skip >= max_skip           -> retain
//! skip <  min_skip           -> skip
//! score >= threshold         -> retain   (Uniform: always)
//! otherwise                  -> skip
//! ```

use adleak_fixed::{vector, FixedPoint};
use log::{debug, info, trace, warn};

use crate::codec;
use crate::config::{PolicyConfig, PolicyKind};
use crate::error::{PolicyError, Result};
use crate::window::{CollectedWindow, Decision, WindowState};

/// Running totals across windows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PolicyStats {
    pub windows_encoded: u32,
    pub samples_collected: u32,
    pub samples_retained: u32,
    pub bytes_encoded: u32,
}

impl PolicyStats {
    /// Retained share of collected samples, in percent
    pub fn retention_percent(&self) -> u32 {
        if self.samples_collected == 0 {
            return 0;
        }
        (u64::from(self.samples_retained) * 100 / u64::from(self.samples_collected)) as u32
    }
}

/// EMA mean and absolute deviation per feature
#[derive(Debug, Clone, Copy)]
struct DeviationTracker<const FEATURES: usize> {
    mean: [FixedPoint; FEATURES],
    deviation: [FixedPoint; FEATURES],
}

impl<const FEATURES: usize> DeviationTracker<FEATURES> {
    const fn new() -> Self {
        Self {
            mean: [FixedPoint::ZERO; FEATURES],
            deviation: [FixedPoint::ZERO; FEATURES],
        }
    }

    /// Averages with `sample` folded in, and the growth in total deviation
    ///
    /// `self` is left as is. The caller commits the returned state only for
    /// retained samples, so skipped samples never move the averages.
    fn advance(
        &self,
        sample: &[FixedPoint],
        config: &PolicyConfig,
    ) -> Result<(Self, FixedPoint)> {
        let precision = config.gate_precision;

        let mut mean = [FixedPoint::ZERO; FEATURES];
        vector::gated_add_scalar(&mut mean, sample, &self.mean, config.alpha, precision)?;

        let mut spread = [FixedPoint::ZERO; FEATURES];
        vector::absolute_diff(&mut spread, &mean, sample)?;

        let mut deviation = [FixedPoint::ZERO; FEATURES];
        vector::gated_add_scalar(&mut deviation, &spread, &self.deviation, config.beta, precision)?;

        let growth = deviation
            .iter()
            .zip(self.deviation.iter())
            .fold(FixedPoint::ZERO, |acc, (new, old)| {
                acc.saturating_add(new.saturating_sub(*old))
            });

        Ok((Self { mean, deviation }, growth))
    }
}

/// Sampling policy with compile-time window capacity
///
/// `SEQ` bounds `seq_length` and `FEATURES` must equal `num_features`; both
/// are checked once in [`AdaptiveLeakPolicy::new`].
///
/// # Example
/// ```
/// use adleak_fixed::FixedPoint;
/// use adleak_policy::{AdaptiveLeakPolicy, PolicyConfig};
///
/// let mut policy: AdaptiveLeakPolicy<23, 10> =
///     AdaptiveLeakPolicy::new(PolicyConfig::default()).unwrap();
///
/// for t in 0..23i16 {
///     let sample = [FixedPoint::from_raw(t * 40); 10];
///     policy.collect(&sample).unwrap();
/// }
///
/// let mut message = [0u8; 178];
/// let written = policy.encode(&mut message).unwrap();
/// assert!(written <= 178);
/// ```
#[derive(Debug, Clone)]
pub struct AdaptiveLeakPolicy<const SEQ: usize, const FEATURES: usize> {
    config: PolicyConfig,
    window: CollectedWindow<SEQ, FEATURES>,
    tracker: DeviationTracker<FEATURES>,
    stats: PolicyStats,
}

impl<const SEQ: usize, const FEATURES: usize> AdaptiveLeakPolicy<SEQ, FEATURES> {
    /// Build a policy from a validated configuration
    ///
    /// # Errors
    /// [`PolicyError::InvalidConfiguration`] with the first failed check.
    pub fn new(config: PolicyConfig) -> Result<Self> {
        config.validate(SEQ, FEATURES)?;

        info!(
            "Adaptive leak policy ready: {} over {}x{} window, threshold {}, skip {}..={}, {} encoding into {} bytes",
            config.policy.name(),
            config.seq_length,
            config.num_features,
            config.threshold,
            config.min_skip,
            config.max_skip,
            config.encoding.name(),
            config.target_bytes
        );

        Ok(Self {
            config,
            window: CollectedWindow::new(),
            tracker: DeviationTracker::new(),
            stats: PolicyStats::default(),
        })
    }

    #[inline]
    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    #[inline]
    pub fn window(&self) -> &CollectedWindow<SEQ, FEATURES> {
        &self.window
    }

    #[inline]
    pub fn state(&self) -> WindowState {
        self.window.state(self.config.seq_length)
    }

    #[inline]
    pub fn stats(&self) -> PolicyStats {
        self.stats
    }

    /// Offer the next sample of the window
    ///
    /// # Errors
    /// - [`PolicyError::WindowComplete`] once `seq_length` samples were seen
    /// - [`PolicyError::ShapeMismatch`] if `sample.len() != num_features`
    ///
    /// Neither error advances the window.
    pub fn collect(&mut self, sample: &[FixedPoint]) -> Result<Decision> {
        if self.state() == WindowState::ReadyToEncode {
            return Err(PolicyError::WindowComplete {
                seq_length: self.config.seq_length,
            });
        }
        if sample.len() != FEATURES {
            return Err(PolicyError::ShapeMismatch {
                expected: FEATURES,
                actual: sample.len(),
            });
        }

        let index = self.window.seen();
        let (score, pending) = self.score(sample)?;
        let decision = self.decide(score);

        match decision {
            Decision::Retained => {
                self.window.retain(sample)?;
                if let Some(tracker) = pending {
                    self.tracker = tracker;
                }
                self.stats.samples_retained = self.stats.samples_retained.saturating_add(1);
            }
            Decision::Skipped => self.window.skip_sample(),
        }
        self.stats.samples_collected = self.stats.samples_collected.saturating_add(1);

        trace!("Sample {} scored {}", index, score);
        debug!(
            "Sample {} {} ({} retained, skip {})",
            index,
            if decision.is_retained() { "retained" } else { "skipped" },
            self.window.retained_count(),
            self.window.skip()
        );

        Ok(decision)
    }

    /// Pack the window into `out` and start a new window
    ///
    /// Returns the number of bytes written. A partially collected window may
    /// be encoded; the bitmask then only covers the samples seen.
    ///
    /// # Errors
    /// - [`PolicyError::EmptyWindow`] if nothing was collected
    /// - [`PolicyError::BudgetExceeded`] if the message does not fit the
    ///   payload budget or `out`; the window is kept and `out` is untouched
    pub fn encode(&mut self, out: &mut [u8]) -> Result<usize> {
        if self.window.is_empty() {
            return Err(PolicyError::EmptyWindow);
        }

        let written = match codec::encode_window(&self.config, &self.window, out) {
            Ok(written) => written,
            Err(error) => {
                warn!(
                    "Encode rejected for window of {} retained samples: {}",
                    self.window.retained_count(),
                    error
                );
                return Err(error);
            }
        };

        debug!(
            "Encoded {} of {} samples into {} bytes",
            self.window.retained_count(),
            self.window.seen(),
            written
        );

        self.stats.windows_encoded = self.stats.windows_encoded.saturating_add(1);
        self.stats.bytes_encoded = self
            .stats
            .bytes_encoded
            .saturating_add(u32::try_from(written).unwrap_or(u32::MAX));
        self.window.clear();
        Ok(written)
    }

    /// Drop the current window without encoding it
    pub fn reset_window(&mut self) {
        self.window.clear();
    }

    /// Return to the freshly constructed state
    ///
    /// Clears the window, the deviation averages and the statistics.
    pub fn reset_all(&mut self) {
        self.window.clear();
        self.tracker = DeviationTracker::new();
        self.stats = PolicyStats::default();
    }

    fn score(
        &self,
        sample: &[FixedPoint],
    ) -> Result<(FixedPoint, Option<DeviationTracker<FEATURES>>)> {
        match self.config.policy {
            PolicyKind::Uniform => Ok((FixedPoint::ZERO, None)),
            PolicyKind::AdaptiveHeuristic => match self.window.last_retained() {
                Some(reference) => Ok((vector::diff_norm(sample, reference)?, None)),
                None => Ok((FixedPoint::MAX, None)),
            },
            PolicyKind::AdaptiveDeviation => {
                let (tracker, growth) = self.tracker.advance(sample, &self.config)?;
                Ok((growth, Some(tracker)))
            }
        }
    }

    fn decide(&self, score: FixedPoint) -> Decision {
        let config = &self.config;
        let skip = self.window.skip();

        let retain = if self.window.retained_count() == 0 {
            true
        } else if self.window.retained_count() >= config.max_collected {
            false
        } else if skip >= config.max_skip {
            true
        } else if skip < config.min_skip {
            false
        } else {
            match config.policy {
                PolicyKind::Uniform => true,
                PolicyKind::AdaptiveHeuristic | PolicyKind::AdaptiveDeviation => {
                    score >= config.threshold
                }
            }
        };

        if retain {
            Decision::Retained
        } else {
            Decision::Skipped
        }
    }
}

//! Sample aggregation — median over a partially invalid batch.
//!
//! The sampling loop produces N raw samples, some of which may be invalid
//! (framing error, timeout, implausible value).  The median of the *valid
//! subset* is the published concentration: a single order statistic rejects
//! the spikes the sensor produces right after power events far better than
//! a mean would.
//!
//! Policy: a median is only published when at least half the batch is valid
//! (`2·V ≥ N`).  A sparse valid subset is likely biased (e.g. only the
//! samples taken after the sensor recovered), so it degrades to the
//! "no data" sentinel instead.

use crate::clock::CalendarTime;

/// Upper bound on the configurable batch size.
pub const MAX_SAMPLES: usize = 63;

/// One raw reading from the sampling loop.  Invalid samples keep their
/// place in the batch for counting, but never enter the sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawSample {
    /// A concentration that passed framing and plausibility checks.
    Valid(u16),
    /// Anything else.  Never coerced to zero.
    Invalid,
}

/// The result of one full acquisition cycle.
#[derive(Debug, Clone, Copy)]
pub struct AggregatedReading {
    /// Median concentration, or `None` when fewer than half the samples
    /// were valid.
    pub concentration_median: Option<u16>,
    /// Number of samples that passed validation.
    pub valid_count: u16,
    /// Batch size N.
    pub total_count: u16,
    /// Climate fields; `None` when the climate read failed.
    pub temperature_c: Option<f32>,
    pub humidity_pct: Option<f32>,
    /// Wall-clock time at the start of the cycle.
    pub timestamp: CalendarTime,
}

/// Reduce a batch to its median, or `None` under the half-valid threshold.
///
/// Order-independent: the valid subset is sorted, and the element at index
/// `V/2` is returned (lower-middle for even V — a deterministic tie-break).
pub fn median_concentration(samples: &[RawSample]) -> Option<u16> {
    let mut valid: heapless::Vec<u16, MAX_SAMPLES> = heapless::Vec::new();
    for s in samples {
        if let RawSample::Valid(ppm) = s {
            // Capacity matches the config limit; a push can only fail if the
            // caller exceeded MAX_SAMPLES, in which case the extra samples
            // are ignored rather than panicking mid-cycle.
            let _ = valid.push(*ppm);
        }
    }

    if valid.is_empty() || 2 * valid.len() < samples.len() {
        return None;
    }

    valid.sort_unstable();
    Some(valid[valid.len() / 2])
}

/// Count the valid samples in a batch.
pub fn valid_count(samples: &[RawSample]) -> u16 {
    samples
        .iter()
        .filter(|s| matches!(s, RawSample::Valid(_)))
        .count() as u16
}

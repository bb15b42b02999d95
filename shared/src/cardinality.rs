//! Distinct-listener estimation
//!
//! Two interchangeable backings behind [`CardinalityEstimator`]:
//! - [`ExactEstimator`]: a membership set, exact, memory grows with the
//!   number of distinct ids.
//! - [`HyperLogLog`]: fixed memory (`2^p` bytes), relative standard error
//!   of about `1.04 / sqrt(2^p)`, i.e. ~1.6% at the default p=12.
//!
//! Both report a value that never decreases between resets and never exceeds
//! the number of `record` calls.

use std::collections::HashSet;
use std::fmt::Debug;

use crate::config::{EstimatorKind, ProcessorConfig};
use crate::hashing::{hash_key, top_bits};

/// Incremental distinct-count tracker
pub trait CardinalityEstimator: Debug + Send {
    /// Register one occurrence of `id`
    fn record(&mut self, id: &str);

    /// Current distinct-count estimate
    fn estimate(&self) -> u64;

    /// Forget everything recorded so far
    fn reset(&mut self);

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Build the estimator selected by the configuration
pub fn estimator_for(config: &ProcessorConfig) -> Box<dyn CardinalityEstimator> {
    new_estimator(config.estimator, config.hll_precision)
}

pub fn new_estimator(kind: EstimatorKind, hll_precision: u8) -> Box<dyn CardinalityEstimator> {
    match kind {
        EstimatorKind::Exact => Box::new(ExactEstimator::new()),
        EstimatorKind::HyperLogLog => Box::new(HyperLogLog::new(hll_precision)),
    }
}

/// Exact membership-set estimator
#[derive(Debug, Clone, Default)]
pub struct ExactEstimator {
    seen: HashSet<String>,
}

impl ExactEstimator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CardinalityEstimator for ExactEstimator {
    fn record(&mut self, id: &str) {
        if !self.seen.contains(id) {
            self.seen.insert(id.to_string());
        }
    }

    fn estimate(&self) -> u64 {
        self.seen.len() as u64
    }

    fn reset(&mut self) {
        self.seen.clear();
    }

    fn name(&self) -> &'static str {
        "exact"
    }
}

/// Smallest supported precision
pub const MIN_PRECISION: u8 = 4;
/// Largest supported precision (64 KB of registers)
pub const MAX_PRECISION: u8 = 16;

/// HyperLogLog cardinality estimator
///
/// The harmonic sum and the number of empty registers are maintained as
/// registers change, so `estimate` is O(1).
#[derive(Debug, Clone)]
pub struct HyperLogLog {
    precision: u8,
    registers: Vec<u8>,
    harmonic_sum: f64,
    zero_registers: usize,
    observations: u64,
    reported: u64,
}

impl HyperLogLog {
    /// Create a new HLL; precision is clamped to 4..=16
    pub fn new(precision: u8) -> Self {
        let p = precision.clamp(MIN_PRECISION, MAX_PRECISION);
        let m = 1usize << p;
        Self {
            precision: p,
            registers: vec![0u8; m],
            harmonic_sum: m as f64,
            zero_registers: m,
            observations: 0,
            reported: 0,
        }
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    /// Expected relative standard error for this precision
    pub fn standard_error(&self) -> f64 {
        1.04 / (self.registers.len() as f64).sqrt()
    }

    /// Register memory in bytes
    pub fn memory_bytes(&self) -> usize {
        self.registers.len()
    }

    /// Unclamped estimate from the current registers
    pub fn raw_estimate(&self) -> f64 {
        let m = self.registers.len() as f64;
        let raw = self.alpha_m() * m * m / self.harmonic_sum;

        // Small-range correction (linear counting)
        if raw <= 2.5 * m && self.zero_registers > 0 {
            return m * (m / self.zero_registers as f64).ln();
        }
        raw
    }

    fn insert_hash(&mut self, hash: u64) {
        let idx = top_bits(hash, self.precision);
        // Guard bit bounds rho at 64 - p + 1
        let w = (hash << self.precision) | (1u64 << (self.precision - 1));
        let rho = (w.leading_zeros() + 1) as u8;

        let current = self.registers[idx];
        if rho > current {
            if current == 0 {
                self.zero_registers -= 1;
            }
            self.harmonic_sum += 2f64.powi(-(rho as i32)) - 2f64.powi(-(current as i32));
            self.registers[idx] = rho;
        }
    }

    fn alpha_m(&self) -> f64 {
        let m = self.registers.len();
        match m {
            16 => 0.673,
            32 => 0.697,
            64 => 0.709,
            _ => 0.7213 / (1.0 + 1.079 / m as f64),
        }
    }
}

impl CardinalityEstimator for HyperLogLog {
    fn record(&mut self, id: &str) {
        self.insert_hash(hash_key(id));
        self.observations += 1;

        let estimate = (self.raw_estimate().round() as u64).min(self.observations);
        self.reported = self.reported.max(estimate);
    }

    fn estimate(&self) -> u64 {
        self.reported
    }

    fn reset(&mut self) {
        *self = Self::new(self.precision);
    }

    fn name(&self) -> &'static str {
        "hyperloglog"
    }
}

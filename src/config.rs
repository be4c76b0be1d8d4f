//! Default parameters and eager validation for coverage analysis.
//!
//! Mirrors the shape of the teacher's runtime-configuration module (a small
//! piece of cross-cutting state with a validating accessor) but adapted to
//! this crate's domain: rather than a global atomic flag, this is a plain
//! value type threaded through the analyzer and scanner, validated once at
//! the call boundary per spec §7 ("Invalid parameter ... Raised at call
//! boundary before work begins").

use crate::error::CoreError;

/// Default longest-common-factor threshold, in bp, below which a probe is
/// not considered to hybridize. Ported from `coverage_analysis.py`'s
/// `Analyzer.__init__(lcf_thres=100, ...)`.
pub const DEFAULT_LCF_THRES: usize = 100;

/// Default k-mer length used to index probes for candidate lookup.
/// Ported from `coverage_analysis.py`'s `Analyzer.__init__(kmer_size=10, ...)`.
pub const DEFAULT_KMER_SIZE: usize = 10;

/// Default number of k-mers sampled per probe when building the k-mer map.
/// Ported from `coverage_analysis.py`'s
/// `Analyzer.__init__(num_kmers_per_probe=20)`.
pub const DEFAULT_NUM_KMERS_PER_PROBE: usize = 20;

/// Default mismatch budget for the approximate-match predicate.
pub const DEFAULT_MISMATCHES: usize = 0;

/// Parameters shared by the k-mer map, the approximate match predicate, and
/// the coverage scanner/analyzer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisParams {
    /// Maximum number of mismatches tolerated within a covered stretch.
    pub mismatches: usize,
    /// Minimum length of a contiguous aligned stretch (with at most
    /// `mismatches` mismatches) for a probe to be judged to cover it.
    pub lcf_thres: usize,
    /// K-mer length used as the candidate filter.
    pub k: usize,
    /// Number of k-mers sampled (with replacement) per probe.
    pub num_kmers_per_probe: usize,
    /// Seed for the k-mer sampling RNG; fixing it makes a run reproducible
    /// (spec §4.3, testable property 8).
    pub seed: u64,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            mismatches: DEFAULT_MISMATCHES,
            lcf_thres: DEFAULT_LCF_THRES,
            k: DEFAULT_KMER_SIZE,
            num_kmers_per_probe: DEFAULT_NUM_KMERS_PER_PROBE,
            seed: 0,
        }
    }
}

impl AnalysisParams {
    pub fn new(
        mismatches: usize,
        lcf_thres: usize,
        k: usize,
        num_kmers_per_probe: usize,
        seed: u64,
    ) -> Self {
        Self {
            mismatches,
            lcf_thres,
            k,
            num_kmers_per_probe,
            seed,
        }
    }

    /// Raise [`CoreError::InvalidParameter`] eagerly, before any scanning or
    /// indexing begins, if this parameter set cannot produce a coherent
    /// predicate.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.k == 0 {
            return Err(CoreError::InvalidParameter {
                name: "k".to_string(),
                value: self.k.to_string(),
                reason: "k-mer length must be at least 1".to_string(),
            });
        }
        if self.lcf_thres == 0 {
            return Err(CoreError::InvalidParameter {
                name: "lcf_thres".to_string(),
                value: self.lcf_thres.to_string(),
                reason: "the minimum covered stretch must be at least 1bp".to_string(),
            });
        }
        if self.num_kmers_per_probe == 0 {
            return Err(CoreError::InvalidParameter {
                name: "num_kmers_per_probe".to_string(),
                value: self.num_kmers_per_probe.to_string(),
                reason: "at least one k-mer must be sampled per probe".to_string(),
            });
        }
        Ok(())
    }
}

/// Validate a coverage fraction `p` used by both solvers (spec §4.7/§4.8).
pub fn validate_fraction(name: &str, p: f64) -> Result<(), CoreError> {
    if !(0.0..=1.0).contains(&p) || p.is_nan() {
        return Err(CoreError::InvalidParameter {
            name: name.to_string(),
            value: p.to_string(),
            reason: "must be in [0, 1]".to_string(),
        });
    }
    Ok(())
}

/// Validate a cost used by both solvers: finite and nonnegative.
pub fn validate_cost(name: &str, cost: f64) -> Result<(), CoreError> {
    if !cost.is_finite() || cost < 0.0 {
        return Err(CoreError::InvalidParameter {
            name: name.to_string(),
            value: cost.to_string(),
            reason: "costs must be finite and nonnegative".to_string(),
        });
    }
    Ok(())
}

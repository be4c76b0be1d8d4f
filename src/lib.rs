// Clippy allows for the whole crate
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]

//! Hybrid-selection probe design core.
//!
//! Provides the analytical pieces of a probe design pipeline: a
//! reverse-complementable probe model, half-open interval algebra, a
//! randomized k-mer candidate index, an approximate-match predicate
//! deciding when a probe hybridizes, a coverage scanner and analyzer built
//! on top of those, and a greedy weighted set-cover solver (single- and
//! multi-universe) for choosing a probe set under a cost or rank budget.
//!
//! # Example
//!
//! ```rust
//! use probecover::{config::AnalysisParams, kmer_map::build_kmer_map, probe::Probe, scanner::find_probe_covers_in_sequence};
//!
//! let probes = vec![Probe::new("ACGTACGT")];
//! let params = AnalysisParams::new(0, 6, 4, 10, 1);
//! let kmer_map = build_kmer_map(&probes, params.k, params.num_kmers_per_probe, params.seed).unwrap();
//! let covers = find_probe_covers_in_sequence(b"TTACGTACGTTT", &kmer_map, &params, true).unwrap();
//! assert!(!covers.is_empty());
//! ```

pub mod analyzer;
pub mod config;
pub mod error;
pub mod genome;
pub mod interval;
pub mod kmer_map;
pub mod multi_solver;
pub mod predicate;
pub mod probe;
pub mod scanner;
pub mod solver;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::analyzer::{analyze_coverage, format_report, CoverageReport, GenomeCoverage, StrandMap};
    pub use crate::config::AnalysisParams;
    pub use crate::error::{CoreError, Result};
    pub use crate::genome::{Chromosome, Genome};
    pub use crate::interval::{Interval, IntervalSet};
    pub use crate::kmer_map::{build_kmer_map, KmerProbeMap};
    pub use crate::multi_solver::approx_cover_multi;
    pub use crate::probe::Probe;
    pub use crate::scanner::find_probe_covers_in_sequence;
    pub use crate::solver::approx_cover;
}

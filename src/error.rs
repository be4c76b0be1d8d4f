//! Error taxonomy for the probe design core.
//!
//! Every fallible operation in this crate returns [`CoreError`]. Nothing is
//! recovered internally (see spec §7): callers decide whether a coverage
//! shortfall or a bad parameter is fatal for their run.

use thiserror::Error;

/// Errors raised by the coverage and set-cover subsystems.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// A parameter was out of its documented domain, caught before any work
    /// began (e.g. `p` outside `[0,1]`, a negative cost).
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    /// The inputs to an operation were mutually inconsistent (a k-mer map
    /// built for a different `k`, a set referencing a probe with no cost
    /// entry, a `ranks`/`costs`/`universe_p` map missing an id).
    #[error("inconsistent input: {0}")]
    InconsistentInput(String),

    /// A universe's coverage target could not be met by the union of all
    /// available sets, even after exhausting every rank.
    #[error(
        "coverage infeasible for universe `{universe}`: needed {needed} more element(s), \
         but no remaining set covers any of them"
    )]
    CoverageInfeasible { universe: String, needed: u64 },

    /// A defensive check fired that should be unreachable on valid input.
    /// Treated as a programming bug, not a recoverable condition.
    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

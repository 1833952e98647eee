//! Per-unit outcome type for the degrade/skip policy.
//!
//! Work units that may fail without failing the request (a sentiment chunk,
//! one entity text, one ticker lookup) report an [`Outcome`] instead of a
//! `Result`, so a skipped unit is a value the caller can count and log rather
//! than an error that was swallowed somewhere.

use std::fmt;

/// Why a unit of work produced no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The classifier or recognizer could not process the unit.
    InferenceUnavailable(String),
    /// The lookup service has no symbol for the name.
    NotFound,
    /// The lookup call itself failed.
    LookupFailed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InferenceUnavailable(e) => write!(f, "inference unavailable: {e}"),
            SkipReason::NotFound => write!(f, "not found"),
            SkipReason::LookupFailed(e) => write!(f, "lookup failed: {e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Resolved(T),
    Skipped(SkipReason),
}

impl<T> Outcome<T> {
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Resolved(v) => Some(v),
            Outcome::Skipped(_) => None,
        }
    }

    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped(_))
    }

    /// Collapses the outcome, substituting `fallback` for a skipped unit.
    pub fn unwrap_or(self, fallback: T) -> T {
        match self {
            Outcome::Resolved(v) => v,
            Outcome::Skipped(_) => fallback,
        }
    }
}

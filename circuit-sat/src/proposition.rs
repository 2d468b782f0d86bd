//! Traits and types that describe what the circuit's inputs mean.
use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;

/// A `Proposition` is an atomic, caller-defined boolean input to a
/// circuit, e.g., "variable 3 denotes identifier `a`".
pub trait Proposition
where
    Self: Clone + Debug + Eq + Hash + Ord + Sized,
{
}

impl Proposition for String {}
impl Proposition for u32 {}

/// Outcome of a solve.  `Unknown` only happens when a resource limit
/// stopped the search; it is neither `Sat` nor `Unsat`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Status {
    Sat,
    Unsat,
    Unknown,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Status::Sat => "sat",
            Status::Unsat => "unsat",
            Status::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Knobs forwarded to CryptoMiniSat.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolverOptions {
    /// Wall-clock budget for each solve; `None` means unbounded.
    pub max_time: Option<Duration>,
    pub threads: u32,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_time: None,
            threads: 1,
        }
    }
}

#[test]
fn test_default_options() {
    let options = SolverOptions::default();
    assert_eq!(options.max_time, None);
    assert_eq!(options.threads, 1);
}

#[test]
fn test_status_display() {
    assert_eq!(Status::Sat.to_string(), "sat");
    assert_eq!(Status::Unsat.to_string(), "unsat");
    assert_eq!(Status::Unknown.to_string(), "unknown");
}

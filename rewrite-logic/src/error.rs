//! Errors surfaced by universe construction, formula grounding, and
//! query evaluation.  Construction errors never reach the oracle;
//! grounding errors are fatal for the query that raised them.
use crate::Status;
use thiserror::Error;

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    /// A graph or action mentions a name that was never declared.
    #[error("unknown identifier `{0}`")]
    UnknownIdentifier(String),

    /// An identifier was declared twice with different labels.
    #[error("identifier `{name}` already labeled `{existing}`, cannot relabel as `{requested}`")]
    LabelConflict {
        name: String,
        existing: String,
        requested: String,
    },

    /// A concrete rule id that the universe does not contain.
    #[error("rule #{0} is not part of the universe")]
    UnknownRule(usize),

    /// A quantified rule escaped the `model_has_rule` that bound it.
    #[error("rule variable {0} used outside of its quantifier")]
    UnboundRule(String),

    /// An atom observes the ambient rule, but the universe has none.
    #[error("formula observes the ambient rule, but the universe has no rules")]
    NoAmbientRule,

    /// A witness was requested from a query that is not satisfiable.
    #[error("model unavailable: query status is {status}")]
    ModelUnavailable { status: Status },
}

#[test]
fn test_messages() {
    assert_eq!(
        Error::UnknownIdentifier("a".into()).to_string(),
        "unknown identifier `a`"
    );
    assert_eq!(
        Error::ModelUnavailable {
            status: Status::Unsat
        }
        .to_string(),
        "model unavailable: query status is unsat"
    );
}

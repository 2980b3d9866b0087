// Core Layer: operator registry error types

use crate::engine::EngineError;
use crate::types::Domain;
use std::fmt;

use super::operator::OpKind;

/// Failures surfaced by the operator registry and builders
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpError {
    /// Operator has no specialization for the requested domain
    DomainNotSupported { op: String, domain: Domain },
    /// User function could not be specialized for any domain
    UdfCompilation { name: String },
    /// Composite builder given an operator of the wrong kind
    InvalidOperatorKind { expected: OpKind, found: String },
    /// Dotted registration path collides with an existing entry
    NameConflict { path: String },
    /// Parameterized components declare incompatible signatures
    SignatureMismatch { detail: String },
    /// Parameterized semiring built from two already-concrete components
    AmbiguousParameterization,
    /// Dispatch resolution given an object of unrecognized kind
    UnsupportedOperatorKind { detail: String },
    /// Failure reported by the native engine
    Engine(EngineError),
}

impl fmt::Display for OpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DomainNotSupported { op, domain } => {
                write!(f, "{} does not work with {}", op, domain)
            }
            Self::UdfCompilation { name } => {
                write!(f, "unable to specialize function {} for any domain", name)
            }
            Self::InvalidOperatorKind { expected, found } => {
                write!(f, "expected a {} operator, got {}", expected, found)
            }
            Self::NameConflict { path } => write!(f, "{} is already defined", path),
            Self::SignatureMismatch { detail } => {
                write!(f, "parameter signature mismatch: {}", detail)
            }
            Self::AmbiguousParameterization => write!(
                f,
                "at least one of monoid or binary operator must be parameterized"
            ),
            Self::UnsupportedOperatorKind { detail } => {
                write!(f, "unable to resolve a typed operator from {}", detail)
            }
            Self::Engine(err) => write!(f, "engine error: {}", err),
        }
    }
}

impl std::error::Error for OpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Engine(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EngineError> for OpError {
    fn from(err: EngineError) -> Self {
        Self::Engine(err)
    }
}

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, OpError>;

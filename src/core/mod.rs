// Core Layer: operator registry, builders and dispatch
//
// Everything above the engine boundary: the namespace-organized registry
// of operators, the builders that compile user functions and compose
// monoids and semirings, and dispatch resolution from loosely-typed
// operator references to executable specializations.

pub mod error;
pub mod monoid;
pub mod namespace;
pub mod operator;
pub mod parameterized;
pub mod registry;
pub mod resolve;
pub mod semiring;
pub mod udf;

pub use error::{OpError, Result};
pub use operator::{BinaryFn, OpKind, Operator, TypedSpec, UnaryFn};
pub use registry::Registry;

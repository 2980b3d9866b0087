// SparseOps: typed operator layer for a GraphBLAS-style sparse engine
//
// Operators (unary maps, binary maps, monoids, semirings) are named
// collections of per-domain specializations. Builtin specializations are
// discovered by scanning the engine's exported symbol table; user-defined
// functions are compiled into per-domain native callbacks by trial
// evaluation against each domain's sample value.
//
// Architecture:
// - Layer 1 (engine): native engine boundary with opaque handles
// - Layer 2 (types): domain catalog bridging runtime domains and values
// - Layer 3 (core): operator registry, UDF compiler, composite builders

pub mod core;
pub mod engine;
pub mod types;

// Re-export commonly used items for convenience
pub use crate::core::{OpError, OpKind, Operator, Registry, Result, TypedSpec};
pub use crate::types::{Domain, Value, ValueError};

// Core Layer: operators and their typed specializations
//
// An Operator is a named collection of per-domain specializations, tagged
// with its kind. A TypedSpec is the concrete, domain-bound realization the
// engine can actually execute, carrying the native handle and whatever the
// builder that produced it needs to keep alive.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::engine::Handle;
use crate::types::{Domain, Value, ValueError};

use super::error::{OpError, Result};

/// The four operator kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    UnaryOp,
    BinaryOp,
    Monoid,
    Semiring,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UnaryOp => "UnaryOp",
            Self::BinaryOp => "BinaryOp",
            Self::Monoid => "Monoid",
            Self::Semiring => "Semiring",
        };
        f.write_str(name)
    }
}

/// User-supplied unary function over dynamic scalars
pub type UnaryFn = Arc<dyn Fn(Value) -> std::result::Result<Value, ValueError> + Send + Sync>;
/// User-supplied binary function over dynamic scalars
pub type BinaryFn =
    Arc<dyn Fn(Value, Value) -> std::result::Result<Value, ValueError> + Send + Sync>;

/// Where a specialization came from, carrying only the fields that origin
/// needs. Composite origins reference their component specializations
/// rather than copying them.
#[derive(Clone)]
pub enum SpecOrigin {
    /// Discovered from the engine's exported symbol table
    Builtin,
    /// Compiled from a user unary function
    UserUnary { source: UnaryFn },
    /// Compiled from a user binary function
    UserBinary { source: BinaryFn },
    /// Composed from a binary specialization and an identity value
    UserMonoid {
        binary: Arc<TypedSpec>,
        identity: Value,
    },
    /// Composed from a monoid and a binary specialization
    UserSemiring {
        monoid: Arc<TypedSpec>,
        binary: Arc<TypedSpec>,
    },
}

impl fmt::Debug for SpecOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin => f.write_str("Builtin"),
            Self::UserUnary { .. } => f.write_str("UserUnary"),
            Self::UserBinary { .. } => f.write_str("UserBinary"),
            Self::UserMonoid { identity, .. } => {
                write!(f, "UserMonoid(identity={})", identity)
            }
            Self::UserSemiring { .. } => f.write_str("UserSemiring"),
        }
    }
}

/// Concrete, domain-bound realization of an operator. Immutable after
/// creation; the native handle stays valid for the process lifetime.
#[derive(Debug, Clone)]
pub struct TypedSpec {
    pub kind: OpKind,
    pub input_domain: Domain,
    pub return_domain: Domain,
    pub handle: Handle,
    pub origin: SpecOrigin,
}

#[derive(Debug, Default)]
struct OpTable {
    specs: BTreeMap<Domain, Arc<TypedSpec>>,
    returns: BTreeMap<Domain, Domain>,
}

/// Named, kind-tagged collection of typed specializations.
///
/// Specializations are added incrementally while a builder probes domains,
/// so the table sits behind a lock; an operator with zero specializations
/// is valid but every lookup on it fails.
#[derive(Debug)]
pub struct Operator {
    name: String,
    kind: OpKind,
    table: Mutex<OpTable>,
}

impl Operator {
    pub fn new(name: impl Into<String>, kind: OpKind) -> Self {
        Self {
            name: name.into(),
            kind,
            table: Mutex::new(OpTable::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> OpKind {
        self.kind
    }

    /// Specialization for `domain`, or `DomainNotSupported`
    pub fn lookup(&self, domain: Domain) -> Result<Arc<TypedSpec>> {
        self.table
            .lock()
            .unwrap()
            .specs
            .get(&domain)
            .cloned()
            .ok_or_else(|| OpError::DomainNotSupported {
                op: self.to_string(),
                domain,
            })
    }

    pub fn contains(&self, domain: Domain) -> bool {
        self.table.lock().unwrap().specs.contains_key(&domain)
    }

    /// Insert or overwrite the specialization for its input domain
    pub fn add(&self, spec: TypedSpec) {
        let mut table = self.table.lock().unwrap();
        table.returns.insert(spec.input_domain, spec.return_domain);
        table.specs.insert(spec.input_domain, Arc::new(spec));
    }

    /// Remove the specialization for `domain`; false if absent
    pub fn remove(&self, domain: Domain) -> bool {
        let mut table = self.table.lock().unwrap();
        table.returns.remove(&domain);
        table.specs.remove(&domain).is_some()
    }

    /// Input domains with a specialization, in catalog order
    pub fn domains(&self) -> Vec<Domain> {
        self.table.lock().unwrap().specs.keys().copied().collect()
    }

    /// Mapping from input domain to return domain
    pub fn return_domains(&self) -> BTreeMap<Domain, Domain> {
        self.table.lock().unwrap().returns.clone()
    }

    pub fn len(&self) -> usize {
        self.table.lock().unwrap().specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.kind, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine;

    fn builtin_spec(domain: Domain, ret: Domain) -> TypedSpec {
        TypedSpec {
            kind: OpKind::BinaryOp,
            input_domain: domain,
            return_domain: ret,
            handle: engine::symbol_handle("GrB_PLUS_INT32").unwrap(),
            origin: SpecOrigin::Builtin,
        }
    }

    #[test]
    fn test_lookup_missing_domain() {
        let op = Operator::new("plus", OpKind::BinaryOp);
        assert!(op.is_empty());
        let err = op.lookup(Domain::Fp32).unwrap_err();
        assert_eq!(
            err,
            OpError::DomainNotSupported {
                op: "BinaryOp.plus".to_string(),
                domain: Domain::Fp32,
            }
        );
    }

    #[test]
    fn test_add_remove_keeps_maps_aligned() {
        let op = Operator::new("eq", OpKind::BinaryOp);
        op.add(builtin_spec(Domain::Int32, Domain::Bool));
        assert!(op.contains(Domain::Int32));
        assert_eq!(
            op.return_domains().get(&Domain::Int32),
            Some(&Domain::Bool)
        );
        assert!(op.remove(Domain::Int32));
        assert!(op.return_domains().is_empty());
        assert!(!op.remove(Domain::Int32));
    }
}

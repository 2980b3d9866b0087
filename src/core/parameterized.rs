// Core Layer: parameterized operator factory
//
// Wraps a builder that produces an operator given configuration
// parameters. Instantiation is deferred until the factory is called and
// memoized by the exact argument tuple, so repeated identical
// parameterizations return the same operator instance.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use super::error::{OpError, Result};
use super::monoid::{self, Identity};
use super::operator::{BinaryFn, OpKind, Operator, UnaryFn};
use super::semiring;
use super::udf;

/// Upper bound on memoized instantiations per factory
const INSTANCE_CACHE_CAPACITY: usize = 1024;

/// A configuration argument. Floats compare and hash by bit pattern so
/// argument tuples can key the instance cache.
#[derive(Debug, Clone)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ParamValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Bool(b) => *b as u8 as f64,
            Self::Int(x) => *x as f64,
            Self::Float(x) => *x,
            Self::Str(_) => f64::NAN,
        }
    }

    pub fn as_i64(&self) -> i64 {
        match self {
            Self::Bool(b) => *b as i64,
            Self::Int(x) => *x,
            Self::Float(x) => *x as i64,
            Self::Str(_) => 0,
        }
    }
}

impl PartialEq for ParamValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Str(a), Self::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ParamValue {}

impl Hash for ParamValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Bool(b) => b.hash(state),
            Self::Int(x) => x.hash(state),
            Self::Float(x) => x.to_bits().hash(state),
            Self::Str(s) => s.hash(state),
        }
    }
}

/// A declared parameter: name plus the default used when a call omits it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub default: ParamValue,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, default: ParamValue) -> Self {
        Self {
            name: name.into(),
            default,
        }
    }

    pub fn float(name: impl Into<String>, default: f64) -> Self {
        Self::new(name, ParamValue::Float(default))
    }

    pub fn int(name: impl Into<String>, default: i64) -> Self {
        Self::new(name, ParamValue::Int(default))
    }
}

/// Builder producing a unary UDF for a given argument tuple
pub type UnaryBuilder = Arc<dyn Fn(&[ParamValue]) -> UnaryFn + Send + Sync>;
/// Builder producing a binary UDF for a given argument tuple
pub type BinaryBuilder = Arc<dyn Fn(&[ParamValue]) -> BinaryFn + Send + Sync>;
/// Builder producing a monoid identity for a given argument tuple
pub type IdentityBuilder = Arc<dyn Fn(&[ParamValue]) -> Identity + Send + Sync>;

/// Identity of a parameterized monoid
#[derive(Clone)]
pub enum MonoidIdentity {
    /// Fixed identity, independent of the factory's arguments
    Fixed(Identity),
    /// Identity derived from the same arguments as the binary operator;
    /// its declared signature must match the binary operator's exactly
    Parameterized {
        params: Vec<ParamSpec>,
        build: IdentityBuilder,
    },
}

/// Component of a parameterized semiring
#[derive(Clone)]
pub enum Component {
    Concrete(Arc<Operator>),
    Parameterized(Arc<ParameterizedOp>),
}

impl Component {
    fn name(&self) -> &str {
        match self {
            Self::Concrete(op) => op.name(),
            Self::Parameterized(factory) => factory.name(),
        }
    }

    fn op_kind(&self) -> OpKind {
        match self {
            Self::Concrete(op) => op.kind(),
            Self::Parameterized(factory) => factory.op_kind(),
        }
    }
}

enum FactoryKind {
    Unary(UnaryBuilder),
    Binary(BinaryBuilder),
    Monoid {
        binaryop: Arc<ParameterizedOp>,
        identity: MonoidIdentity,
    },
    Semiring {
        monoid: Component,
        binaryop: Component,
    },
}

struct CacheSlot {
    op: Arc<Operator>,
    last_used: u64,
}

/// Bounded memo table keyed by canonical argument tuples, least-recently
/// used entry evicted at capacity
struct InstanceCache {
    entries: HashMap<Vec<ParamValue>, CacheSlot>,
    capacity: usize,
    tick: u64,
}

impl InstanceCache {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
            tick: 0,
        }
    }

    fn get(&mut self, key: &[ParamValue]) -> Option<Arc<Operator>> {
        self.tick += 1;
        let tick = self.tick;
        self.entries.get_mut(key).map(|slot| {
            slot.last_used = tick;
            slot.op.clone()
        })
    }

    fn insert(&mut self, key: Vec<ParamValue>, op: Arc<Operator>) {
        while self.entries.len() >= self.capacity && !self.entries.is_empty() {
            self.evict_lru();
        }
        self.tick += 1;
        self.entries.insert(
            key,
            CacheSlot {
                op,
                last_used: self.tick,
            },
        );
    }

    fn evict_lru(&mut self) {
        if let Some(key) = self
            .entries
            .iter()
            .min_by_key(|(_, slot)| slot.last_used)
            .map(|(key, _)| key.clone())
        {
            self.entries.remove(&key);
        }
    }
}

/// Deferred, memoizing operator factory.
///
/// Calling with an argument tuple instantiates the underlying operator
/// (recursively instantiating parameterized sub-components with the same
/// arguments) and caches it by the exact tuple; a repeat call returns the
/// identical instance.
pub struct ParameterizedOp {
    name: String,
    params: Vec<ParamSpec>,
    kind: FactoryKind,
    cache: Mutex<InstanceCache>,
}

impl fmt::Debug for ParameterizedOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParameterizedOp({}.{})", self.op_kind(), self.name)
    }
}

impl ParameterizedOp {
    fn with_kind(name: String, params: Vec<ParamSpec>, kind: FactoryKind) -> Arc<Self> {
        Arc::new(Self {
            name,
            params,
            kind,
            cache: Mutex::new(InstanceCache::new(INSTANCE_CACHE_CAPACITY)),
        })
    }

    /// Parameterized unary operator
    pub fn new_unary(name: &str, params: Vec<ParamSpec>, build: UnaryBuilder) -> Arc<Self> {
        Self::with_kind(name.to_string(), params, FactoryKind::Unary(build))
    }

    /// Parameterized binary operator
    pub fn new_binary(name: &str, params: Vec<ParamSpec>, build: BinaryBuilder) -> Arc<Self> {
        Self::with_kind(name.to_string(), params, FactoryKind::Binary(build))
    }

    /// Parameterized monoid over a parameterized binary operator.
    ///
    /// A parameterized identity must declare exactly the binary
    /// operator's signature; checked here, before any call.
    pub fn new_monoid(
        name: Option<&str>,
        binaryop: Arc<ParameterizedOp>,
        identity: MonoidIdentity,
    ) -> Result<Arc<Self>> {
        if !matches!(binaryop.kind, FactoryKind::Binary(_)) {
            return Err(OpError::InvalidOperatorKind {
                expected: OpKind::BinaryOp,
                found: format!("{:?}", binaryop),
            });
        }
        if let MonoidIdentity::Parameterized { params, .. } = &identity {
            if *params != binaryop.params {
                return Err(OpError::SignatureMismatch {
                    detail: format!(
                        "identity of {} does not accept the binary operator's parameters",
                        binaryop.name
                    ),
                });
            }
        }
        let name = name.unwrap_or(&binaryop.name).to_string();
        let params = binaryop.params.clone();
        Ok(Self::with_kind(
            name,
            params,
            FactoryKind::Monoid { binaryop, identity },
        ))
    }

    /// Parameterized semiring. At least one component must itself be
    /// parameterized; two parameterized components must agree on their
    /// signature.
    pub fn new_semiring(
        name: Option<&str>,
        monoid: Component,
        binaryop: Component,
    ) -> Result<Arc<Self>> {
        if monoid.op_kind() != OpKind::Monoid {
            return Err(OpError::InvalidOperatorKind {
                expected: OpKind::Monoid,
                found: monoid.name().to_string(),
            });
        }
        if binaryop.op_kind() != OpKind::BinaryOp {
            return Err(OpError::InvalidOperatorKind {
                expected: OpKind::BinaryOp,
                found: binaryop.name().to_string(),
            });
        }
        let params = match (&monoid, &binaryop) {
            (Component::Concrete(_), Component::Concrete(_)) => {
                return Err(OpError::AmbiguousParameterization)
            }
            (Component::Parameterized(m), Component::Parameterized(b)) => {
                if m.params != b.params {
                    return Err(OpError::SignatureMismatch {
                        detail: format!(
                            "monoid {} and binary operator {} declare different parameters",
                            m.name, b.name
                        ),
                    });
                }
                b.params.clone()
            }
            (Component::Parameterized(m), Component::Concrete(_)) => m.params.clone(),
            (Component::Concrete(_), Component::Parameterized(b)) => b.params.clone(),
        };
        let name = match name {
            Some(n) => n.to_string(),
            None => format!("{}_{}", monoid.name(), binaryop.name()),
        };
        Ok(Self::with_kind(
            name,
            params,
            FactoryKind::Semiring { monoid, binaryop },
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Kind of the operators this factory produces
    pub fn op_kind(&self) -> OpKind {
        match &self.kind {
            FactoryKind::Unary(_) => OpKind::UnaryOp,
            FactoryKind::Binary(_) => OpKind::BinaryOp,
            FactoryKind::Monoid { .. } => OpKind::Monoid,
            FactoryKind::Semiring { .. } => OpKind::Semiring,
        }
    }

    /// Instantiate for an argument tuple, memoized by the exact tuple
    pub fn call(&self, args: &[ParamValue]) -> Result<Arc<Operator>> {
        let key = self.canonical_args(args)?;
        if let Some(op) = self.cache.lock().unwrap().get(&key) {
            return Ok(op);
        }
        let op = Arc::new(self.instantiate(&key)?);
        self.cache.lock().unwrap().insert(key, op.clone());
        Ok(op)
    }

    /// Instantiate with the declared defaults
    pub fn call_defaults(&self) -> Result<Arc<Operator>> {
        self.call(&[])
    }

    /// Positional arguments padded with declared defaults
    fn canonical_args(&self, args: &[ParamValue]) -> Result<Vec<ParamValue>> {
        if args.len() > self.params.len() {
            return Err(OpError::SignatureMismatch {
                detail: format!(
                    "{} takes at most {} arguments, got {}",
                    self.name,
                    self.params.len(),
                    args.len()
                ),
            });
        }
        let mut canonical = args.to_vec();
        canonical.extend(self.params[args.len()..].iter().map(|p| p.default.clone()));
        Ok(canonical)
    }

    fn instantiate(&self, args: &[ParamValue]) -> Result<Operator> {
        match &self.kind {
            FactoryKind::Unary(build) => udf::build_unary(Some(&self.name), build(args)),
            FactoryKind::Binary(build) => udf::build_binary(Some(&self.name), build(args)),
            FactoryKind::Monoid { binaryop, identity } => {
                let binary = binaryop.call(args)?;
                let identity = match identity {
                    MonoidIdentity::Fixed(identity) => identity.clone(),
                    MonoidIdentity::Parameterized { build, .. } => build(args),
                };
                monoid::build(Some(&self.name), &binary, identity)
            }
            FactoryKind::Semiring { monoid, binaryop } => {
                let mono = match monoid {
                    Component::Concrete(op) => op.clone(),
                    Component::Parameterized(factory) => factory.call(args)?,
                };
                let binary = match binaryop {
                    Component::Concrete(op) => op.clone(),
                    Component::Parameterized(factory) => factory.call(args)?,
                };
                semiring::build(Some(&self.name), &mono, &binary)
            }
        }
    }
}

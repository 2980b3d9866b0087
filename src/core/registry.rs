// Core Layer: operator registry
//
// One registry holds four namespaces, one per operator kind. Builtin
// dispatch tables are reverse-engineered from the engine's exported symbol
// names: each kind carries a parse configuration describing how its
// symbols decompose into prefix, operator name and domain token. User
// registrations land in the same namespaces under dotted paths.

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use std::sync::{Arc, Mutex};

use crate::engine;
use crate::types::{Domain, Value};

use super::error::Result;
use super::monoid::{self, Identity};
use super::namespace::{Entry, Namespace};
use super::operator::{BinaryFn, OpKind, Operator, SpecOrigin, TypedSpec, UnaryFn};
use super::parameterized::{
    BinaryBuilder, Component, MonoidIdentity, ParamSpec, ParameterizedOp, UnaryBuilder,
};
use super::semiring;
use super::udf;

const DOMAINS_RE: &str = "BOOL|INT8|INT16|INT32|INT64|UINT8|UINT16|UINT32|UINT64|FP32|FP64";
const NUMERIC_RE: &str = "INT8|INT16|INT32|INT64|UINT8|UINT16|UINT32|UINT64|FP32|FP64";

/// How one kind's builtin symbols decompose into an operator name and a
/// domain token
struct ParseConfig {
    /// Bytes stripped from the front of a matched symbol (the prefix)
    trim_from_front: usize,
    /// Bytes stripped from the back (trailing kind tag, if any)
    trim_from_back: usize,
    /// Underscores inside the operator name itself
    num_separators: usize,
    /// Patterns whose specializations return their input domain
    exprs: Vec<Regex>,
    /// Patterns whose specializations return bool regardless of input
    bool_exprs: Vec<Regex>,
}

impl ParseConfig {
    /// Operator name and input domain parsed from a trimmed symbol.
    ///
    /// A symbol with exactly `num_separators` underscores carries no
    /// domain token and is implicitly BOOL.
    fn parse(&self, symbol: &str) -> Option<(String, Domain)> {
        let trimmed = &symbol[self.trim_from_front..symbol.len() - self.trim_from_back];
        let tokens: Vec<&str> = trimmed.split('_').collect();
        if tokens.len() == self.num_separators + 1 {
            let domain = Domain::from_symbol(tokens[tokens.len() - 1])?;
            Some((tokens[..tokens.len() - 1].join("_").to_lowercase(), domain))
        } else if tokens.len() == self.num_separators {
            Some((trimmed.to_lowercase(), Domain::Bool))
        } else {
            None
        }
    }
}

fn re(pattern: String) -> Regex {
    Regex::new(&pattern).unwrap()
}

lazy_static! {
    static ref UNARY_PARSE: ParseConfig = ParseConfig {
        trim_from_front: 4,
        trim_from_back: 0,
        num_separators: 1,
        exprs: vec![
            re(format!("^GrB_(IDENTITY|AINV|MINV)_({})$", DOMAINS_RE)),
            re(format!("^GxB_(ABS|LNOT|ONE)_({})$", DOMAINS_RE)),
            re("^GrB_LNOT$".to_string()),
        ],
        bool_exprs: vec![],
    };
    static ref BINARY_PARSE: ParseConfig = ParseConfig {
        trim_from_front: 4,
        trim_from_back: 0,
        num_separators: 1,
        exprs: vec![
            re(format!(
                "^GrB_(FIRST|SECOND|MIN|MAX|PLUS|MINUS|TIMES|DIV)_({})$",
                DOMAINS_RE
            )),
            re(format!(
                "^GxB_(RMINUS|RDIV|PAIR|ANY|ISEQ|ISNE|ISGT|ISLT|ISLE|ISGE)_({})$",
                DOMAINS_RE
            )),
            re("^GrB_(LOR|LAND|LXOR)$".to_string()),
        ],
        bool_exprs: vec![
            re(format!("^GrB_(EQ|NE|GT|LT|GE|LE)_({})$", DOMAINS_RE)),
            re(format!("^GxB_(LOR|LAND|LXOR)_({})$", DOMAINS_RE)),
        ],
    };
    static ref MONOID_PARSE: ParseConfig = ParseConfig {
        trim_from_front: 4,
        trim_from_back: 7, // "_MONOID"
        num_separators: 1,
        exprs: vec![
            re(format!(
                "^GxB_(MAX|MIN|PLUS|TIMES|ANY)_({})_MONOID$",
                NUMERIC_RE
            )),
            re("^GxB_(EQ|LAND|LOR|LXOR|ANY)_BOOL_MONOID$".to_string()),
        ],
        bool_exprs: vec![],
    };
    static ref SEMIRING_PARSE: ParseConfig = ParseConfig {
        trim_from_front: 4,
        trim_from_back: 0,
        num_separators: 2,
        exprs: vec![
            re(format!(
                "^GxB_(MIN|MAX|PLUS|TIMES|ANY)_(FIRST|SECOND|PAIR|MIN|MAX|PLUS|MINUS|RMINUS|TIMES|DIV|RDIV|ISEQ|ISNE|ISGT|ISLT|ISGE|ISLE|LOR|LAND|LXOR)_({})$",
                NUMERIC_RE
            )),
            re("^GxB_(LOR|LAND|LXOR|EQ|ANY)_(FIRST|SECOND|PAIR|LOR|LAND|LXOR|EQ|GT|LT|GE|LE)_BOOL$".to_string()),
        ],
        bool_exprs: vec![re(format!(
            "^GxB_(LOR|LAND|LXOR|EQ|ANY)_(EQ|NE|GT|LT|GE|LE)_({})$",
            NUMERIC_RE
        ))],
    };
}

/// Registry of operators, one namespace per kind.
///
/// Each kind's builtin table is discovered on first initialization of that
/// kind; re-initialization is a no-op.
pub struct Registry {
    pub unary: Namespace,
    pub binary: Namespace,
    pub monoid: Namespace,
    pub semiring: Namespace,
    unary_ready: bool,
    binary_ready: bool,
    monoid_ready: bool,
    semiring_ready: bool,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            unary: Namespace::new(),
            binary: Namespace::new(),
            monoid: Namespace::new(),
            semiring: Namespace::new(),
            unary_ready: false,
            binary_ready: false,
            monoid_ready: false,
            semiring_ready: false,
        }
    }

    /// Discover the builtin operators of every kind
    pub fn initialize(&mut self) -> Result<()> {
        self.initialize_kind(OpKind::UnaryOp)?;
        self.initialize_kind(OpKind::BinaryOp)?;
        self.initialize_kind(OpKind::Monoid)?;
        self.initialize_kind(OpKind::Semiring)?;
        Ok(())
    }

    /// Discover the builtin operators of one kind. Idempotent; the kind
    /// only counts as initialized once discovery has fully succeeded, so
    /// a failed run can be retried.
    pub fn initialize_kind(&mut self, kind: OpKind) -> Result<()> {
        let ready = match kind {
            OpKind::UnaryOp => self.unary_ready,
            OpKind::BinaryOp => self.binary_ready,
            OpKind::Monoid => self.monoid_ready,
            OpKind::Semiring => self.semiring_ready,
        };
        if ready {
            return Ok(());
        }
        let (config, ns) = match kind {
            OpKind::UnaryOp => (&*UNARY_PARSE, &mut self.unary),
            OpKind::BinaryOp => (&*BINARY_PARSE, &mut self.binary),
            OpKind::Monoid => (&*MONOID_PARSE, &mut self.monoid),
            OpKind::Semiring => (&*SEMIRING_PARSE, &mut self.semiring),
        };
        discover(kind, config, ns)?;
        if kind == OpKind::BinaryOp {
            binary_extras(&mut self.binary)?;
        }
        match kind {
            OpKind::UnaryOp => self.unary_ready = true,
            OpKind::BinaryOp => self.binary_ready = true,
            OpKind::Monoid => self.monoid_ready = true,
            OpKind::Semiring => self.semiring_ready = true,
        }
        debug!("initialized {} builtins: {} names", kind, ns_len(self, kind));
        Ok(())
    }

    /// Register a unary user function under a dotted path
    pub fn register_new_unary(&mut self, path: &str, func: UnaryFn) -> Result<Arc<Operator>> {
        self.unary.check(path)?;
        let op = Arc::new(udf::build_unary(Some(path), func)?);
        self.unary.insert(path, Entry::Op(op.clone()))?;
        Ok(op)
    }

    /// Register a binary user function under a dotted path
    pub fn register_new_binary(&mut self, path: &str, func: BinaryFn) -> Result<Arc<Operator>> {
        self.binary.check(path)?;
        let op = Arc::new(udf::build_binary(Some(path), func)?);
        self.binary.insert(path, Entry::Op(op.clone()))?;
        Ok(op)
    }

    /// Register a monoid built from a binary operator and an identity
    pub fn register_new_monoid(
        &mut self,
        path: &str,
        binaryop: &Arc<Operator>,
        identity: Identity,
    ) -> Result<Arc<Operator>> {
        self.monoid.check(path)?;
        let op = Arc::new(monoid::build(Some(path), binaryop, identity)?);
        self.monoid.insert(path, Entry::Op(op.clone()))?;
        Ok(op)
    }

    /// Register a semiring built from a monoid and a binary operator
    pub fn register_new_semiring(
        &mut self,
        path: &str,
        monoid_op: &Arc<Operator>,
        binaryop: &Arc<Operator>,
    ) -> Result<Arc<Operator>> {
        self.semiring.check(path)?;
        let op = Arc::new(semiring::build(Some(path), monoid_op, binaryop)?);
        self.semiring.insert(path, Entry::Op(op.clone()))?;
        Ok(op)
    }

    /// Build a unary operator without entering it in any namespace.
    /// An omitted name falls back to the anonymous placeholder.
    pub fn register_anonymous_unary(
        &self,
        name: Option<&str>,
        func: UnaryFn,
    ) -> Result<Arc<Operator>> {
        Ok(Arc::new(udf::build_unary(name, func)?))
    }

    /// Build a binary operator without entering it in any namespace
    pub fn register_anonymous_binary(
        &self,
        name: Option<&str>,
        func: BinaryFn,
    ) -> Result<Arc<Operator>> {
        Ok(Arc::new(udf::build_binary(name, func)?))
    }

    /// Build a monoid without entering it in any namespace.
    /// An omitted name falls back to the binary operator's name.
    pub fn register_anonymous_monoid(
        &self,
        name: Option<&str>,
        binaryop: &Arc<Operator>,
        identity: Identity,
    ) -> Result<Arc<Operator>> {
        Ok(Arc::new(monoid::build(name, binaryop, identity)?))
    }

    /// Build a semiring without entering it in any namespace.
    /// An omitted name falls back to `<monoid>_<binary>`.
    pub fn register_anonymous_semiring(
        &self,
        name: Option<&str>,
        monoid_op: &Arc<Operator>,
        binaryop: &Arc<Operator>,
    ) -> Result<Arc<Operator>> {
        Ok(Arc::new(semiring::build(name, monoid_op, binaryop)?))
    }

    /// Register a parameterized unary factory under a dotted path
    pub fn register_new_unary_parameterized(
        &mut self,
        path: &str,
        params: Vec<ParamSpec>,
        build: UnaryBuilder,
    ) -> Result<Arc<ParameterizedOp>> {
        self.unary.check(path)?;
        let factory = ParameterizedOp::new_unary(path, params, build);
        self.unary.insert(path, Entry::Factory(factory.clone()))?;
        Ok(factory)
    }

    /// Register a parameterized binary factory under a dotted path
    pub fn register_new_binary_parameterized(
        &mut self,
        path: &str,
        params: Vec<ParamSpec>,
        build: BinaryBuilder,
    ) -> Result<Arc<ParameterizedOp>> {
        self.binary.check(path)?;
        let factory = ParameterizedOp::new_binary(path, params, build);
        self.binary.insert(path, Entry::Factory(factory.clone()))?;
        Ok(factory)
    }

    /// Register a parameterized monoid factory under a dotted path
    pub fn register_new_monoid_parameterized(
        &mut self,
        path: &str,
        binaryop: Arc<ParameterizedOp>,
        identity: MonoidIdentity,
    ) -> Result<Arc<ParameterizedOp>> {
        self.monoid.check(path)?;
        let factory = ParameterizedOp::new_monoid(Some(path), binaryop, identity)?;
        self.monoid.insert(path, Entry::Factory(factory.clone()))?;
        Ok(factory)
    }

    /// Register a parameterized semiring factory under a dotted path
    pub fn register_new_semiring_parameterized(
        &mut self,
        path: &str,
        monoid_op: Component,
        binaryop: Component,
    ) -> Result<Arc<ParameterizedOp>> {
        self.semiring.check(path)?;
        let factory = ParameterizedOp::new_semiring(Some(path), monoid_op, binaryop)?;
        self.semiring.insert(path, Entry::Factory(factory.clone()))?;
        Ok(factory)
    }
}

fn ns_len(reg: &Registry, kind: OpKind) -> usize {
    match kind {
        OpKind::UnaryOp => reg.unary.len(),
        OpKind::BinaryOp => reg.binary.len(),
        OpKind::Monoid => reg.monoid.len(),
        OpKind::Semiring => reg.semiring.len(),
    }
}

/// Scan the engine's exported symbols against one parse configuration,
/// accreting typed specializations onto named operators
fn discover(kind: OpKind, config: &ParseConfig, ns: &mut Namespace) -> Result<()> {
    for symbol in engine::exported_symbols() {
        let bool_tagged = if config.exprs.iter().any(|e| e.is_match(&symbol)) {
            false
        } else if config.bool_exprs.iter().any(|e| e.is_match(&symbol)) {
            true
        } else {
            continue;
        };
        let (name, domain) = match config.parse(&symbol) {
            Some(parsed) => parsed,
            None => continue,
        };
        let handle = match engine::symbol_handle(&symbol) {
            Some(h) => h,
            None => continue,
        };
        let ret = if bool_tagged { Domain::Bool } else { domain };
        let op = ns.get_or_insert_op(&name, kind)?;
        op.add(TypedSpec {
            kind,
            input_domain: domain,
            return_domain: ret,
            handle,
            origin: SpecOrigin::Builtin,
        });
    }
    Ok(())
}

/// Division cleanup after binary discovery.
///
/// The engine's DIV truncates like C; it is re-registered as `cdiv`, with
/// `truediv` always dividing in floating point and `floordiv` rounding
/// toward negative infinity. `isclose` is a parameterized tolerance
/// comparison with no engine counterpart.
fn binary_extras(ns: &mut Namespace) -> Result<()> {
    if let Some(Entry::Op(div)) = ns.remove("div") {
        let cdiv = Arc::new(Operator::new("cdiv", OpKind::BinaryOp));
        for domain in div.domains() {
            let spec = div.lookup(domain)?;
            cdiv.add(TypedSpec {
                kind: OpKind::BinaryOp,
                input_domain: domain,
                return_domain: spec.return_domain,
                handle: spec.handle,
                origin: SpecOrigin::Builtin,
            });
        }

        let truediv = Arc::new(Operator::new("truediv", OpKind::BinaryOp));
        for domain in cdiv.domains() {
            let float = if domain == Domain::Fp32 {
                Domain::Fp32
            } else {
                Domain::Fp64
            };
            let spec = cdiv.lookup(float)?;
            truediv.add(TypedSpec {
                kind: OpKind::BinaryOp,
                input_domain: domain,
                return_domain: float,
                handle: spec.handle,
                origin: SpecOrigin::Builtin,
            });
        }

        ns.insert("cdiv", Entry::Op(cdiv))?;
        ns.insert("truediv", Entry::Op(truediv))?;
    }

    // Integer division truncates toward zero; flooring means moving the
    // quotient down one when the signs differ and the division is inexact
    let floor_div: BinaryFn = Arc::new(|a, b| {
        let q = a.div(&b)?;
        if q.domain().is_float() {
            return Ok(q.floor());
        }
        let r = a.rem(&b)?;
        if r.truthy() && (a.as_f64() < 0.0) != (b.as_f64() < 0.0) {
            return Ok(q.sub(&Value::Int64(1))?.cast(q.domain()));
        }
        Ok(q)
    });
    let floordiv = Arc::new(udf::build_binary(Some("floordiv"), floor_div)?);
    ns.insert("floordiv", Entry::Op(floordiv))?;

    let build: BinaryBuilder = Arc::new(|args| {
        let rel_tol = args[0].as_f64();
        let abs_tol = args[1].as_f64();
        Arc::new(move |x, y| {
            let (a, b) = (x.as_f64(), y.as_f64());
            let bound = f64::max(rel_tol * f64::max(a.abs(), b.abs()), abs_tol);
            Ok(Value::Bool((a - b).abs() <= bound))
        })
    });
    let isclose = ParameterizedOp::new_binary(
        "isclose",
        vec![
            ParamSpec::float("rel_tol", 1e-7),
            ParamSpec::float("abs_tol", 0.0),
        ],
        build,
    );
    ns.insert("isclose", Entry::Factory(isclose))?;
    Ok(())
}

lazy_static! {
    static ref REGISTRY: Mutex<Registry> = Mutex::new(Registry::new());
}

/// Process-wide registry instance. Callers initialize the kinds they need.
pub fn global() -> &'static Mutex<Registry> {
    &REGISTRY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unary_discovery() {
        let mut reg = Registry::new();
        reg.initialize_kind(OpKind::UnaryOp).unwrap();
        let abs = reg.unary.op("abs").unwrap();
        assert_eq!(abs.kind(), OpKind::UnaryOp);
        assert_eq!(abs.len(), 11);
        // GrB_LNOT carries no domain token and lands on bool; the typed
        // GxB_LNOT_* symbols fill in the rest under the same name
        let lnot = reg.unary.op("lnot").unwrap();
        assert!(lnot.contains(Domain::Bool));
        assert!(lnot.contains(Domain::Fp64));
    }

    #[test]
    fn test_binary_discovery_marks_comparison_returns() {
        let mut reg = Registry::new();
        reg.initialize_kind(OpKind::BinaryOp).unwrap();
        let eq = reg.binary.op("eq").unwrap();
        let spec = eq.lookup(Domain::Int32).unwrap();
        assert_eq!(spec.return_domain, Domain::Bool);
        let plus = reg.binary.op("plus").unwrap();
        let spec = plus.lookup(Domain::Int32).unwrap();
        assert_eq!(spec.return_domain, Domain::Int32);
        // The typed logical symbols return bool; the untyped GrB_LOR is
        // the bool specialization of the same name
        let lor = reg.binary.op("lor").unwrap();
        assert_eq!(lor.lookup(Domain::Fp32).unwrap().return_domain, Domain::Bool);
        assert_eq!(lor.lookup(Domain::Bool).unwrap().return_domain, Domain::Bool);
    }

    #[test]
    fn test_division_family() {
        let mut reg = Registry::new();
        reg.initialize_kind(OpKind::BinaryOp).unwrap();
        assert!(reg.binary.op("div").is_none());
        let cdiv = reg.binary.op("cdiv").unwrap();
        assert_eq!(cdiv.lookup(Domain::Int32).unwrap().return_domain, Domain::Int32);
        let truediv = reg.binary.op("truediv").unwrap();
        assert_eq!(
            truediv.lookup(Domain::Int32).unwrap().return_domain,
            Domain::Fp64
        );
        assert_eq!(
            truediv.lookup(Domain::Fp32).unwrap().return_domain,
            Domain::Fp32
        );
        let floordiv = reg.binary.op("floordiv").unwrap();
        assert_eq!(
            floordiv.lookup(Domain::Int8).unwrap().return_domain,
            Domain::Int8
        );
        assert!(reg.binary.factory("isclose").is_some());
    }

    #[test]
    fn test_monoid_and_semiring_discovery() {
        let mut reg = Registry::new();
        reg.initialize_kind(OpKind::Monoid).unwrap();
        reg.initialize_kind(OpKind::Semiring).unwrap();
        let plus = reg.monoid.op("plus").unwrap();
        assert_eq!(plus.kind(), OpKind::Monoid);
        assert!(plus.contains(Domain::Fp64));
        assert!(!plus.contains(Domain::Bool));
        let land = reg.monoid.op("land").unwrap();
        assert_eq!(land.domains(), vec![Domain::Bool]);
        let plus_times = reg.semiring.op("plus_times").unwrap();
        assert_eq!(
            plus_times.lookup(Domain::Fp64).unwrap().return_domain,
            Domain::Fp64
        );
        let lor_eq = reg.semiring.op("lor_eq").unwrap();
        assert_eq!(
            lor_eq.lookup(Domain::Int32).unwrap().return_domain,
            Domain::Bool
        );
        assert_eq!(
            lor_eq.lookup(Domain::Bool).unwrap().return_domain,
            Domain::Bool
        );
    }

    #[test]
    fn test_floordiv_floors_negative_quotients() {
        let mut reg = Registry::new();
        reg.initialize_kind(OpKind::BinaryOp).unwrap();
        let floordiv = reg.binary.op("floordiv").unwrap();
        let spec = floordiv.lookup(Domain::Int32).unwrap();
        assert_eq!(spec.return_domain, Domain::Int32);

        let run = |a: i32, b: i32| {
            let mut out = 0i32;
            unsafe {
                engine::call_binary(
                    spec.handle,
                    &mut out as *mut i32 as *mut u8,
                    &a as *const i32 as *const u8,
                    &b as *const i32 as *const u8,
                )
                .unwrap();
            }
            out
        };
        assert_eq!(run(7, 2), 3);
        assert_eq!(run(-7, 2), -4);
        assert_eq!(run(7, -2), -4);
        assert_eq!(run(-7, -2), 3);
        assert_eq!(run(-6, 2), -3); // exact quotients are not adjusted
        assert_eq!(run(-7, 0), 0);
    }

    #[test]
    fn test_failed_initialization_can_be_retried() {
        let mut reg = Registry::new();
        // Occupy a builtin name with a factory so discovery conflicts
        let build: BinaryBuilder = Arc::new(|_| Arc::new(|x: Value, y: Value| x.add(&y)));
        reg.register_new_binary_parameterized("plus", vec![], build)
            .unwrap();
        assert!(reg.initialize_kind(OpKind::BinaryOp).is_err());

        // The failed run did not latch the ready flag
        reg.binary.remove("plus");
        reg.initialize_kind(OpKind::BinaryOp).unwrap();
        assert!(reg.binary.op("plus").is_some());
        assert!(reg.binary.op("cdiv").is_some());
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let mut reg = Registry::new();
        reg.initialize().unwrap();
        let before = (
            reg.unary.len(),
            reg.binary.len(),
            reg.monoid.len(),
            reg.semiring.len(),
        );
        reg.initialize().unwrap();
        let after = (
            reg.unary.len(),
            reg.binary.len(),
            reg.monoid.len(),
            reg.semiring.len(),
        );
        assert_eq!(before, after);
    }

    #[test]
    fn test_anonymous_registration_skips_namespaces() {
        let mut reg = Registry::new();
        reg.initialize_kind(OpKind::UnaryOp).unwrap();
        let before = reg.unary.len();
        let op = reg
            .register_anonymous_unary(None, Arc::new(|x| x.abs()))
            .unwrap();
        assert_eq!(op.name(), udf::ANONYMOUS_UNARY);
        assert_eq!(reg.unary.len(), before);

        // A named anonymous build may even shadow a builtin name without
        // conflict, since it never enters the namespace
        let op = reg
            .register_anonymous_unary(Some("abs"), Arc::new(|x| x.abs()))
            .unwrap();
        assert!(!Arc::ptr_eq(&op, &reg.unary.op("abs").unwrap()));
    }

    #[test]
    fn test_registration_path_conflicts() {
        let mut reg = Registry::new();
        reg.initialize_kind(OpKind::BinaryOp).unwrap();
        let err = reg
            .register_new_binary("plus", Arc::new(|x, y| x.add(&y)))
            .unwrap_err();
        assert!(matches!(err, super::super::error::OpError::NameConflict { .. }));
        let op = reg
            .register_new_binary("custom.plus", Arc::new(|x, y| x.add(&y)))
            .unwrap();
        assert_eq!(op.name(), "custom.plus");
        assert!(reg.binary.op("custom.plus").is_some());
    }
}

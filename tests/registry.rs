// Registry Integration Tests
//
// Tests builtin discovery end to end: symbol scan → parse → namespace →
// typed dispatch tables, plus the division cleanup and user registration
// through the registry surface.

use std::sync::Arc;

use sparseops::core::namespace::Entry;
use sparseops::core::registry::{self, Registry};
use sparseops::{Domain, OpKind};

#[test]
fn test_full_discovery_populates_all_kinds() {
    let mut reg = Registry::new();
    reg.initialize().unwrap();

    assert!(reg.unary.op("ainv").is_some());
    assert!(reg.binary.op("times").is_some());
    assert!(reg.monoid.op("max").is_some());
    assert!(reg.semiring.op("min_plus").is_some());

    // Every discovered operator carries its kind tag
    for (_, entry) in reg.semiring.entries() {
        if let Entry::Op(op) = entry {
            assert_eq!(op.kind(), OpKind::Semiring);
        }
    }
}

#[test]
fn test_discovery_is_idempotent() {
    let mut reg = Registry::new();
    reg.initialize().unwrap();
    let plus = reg.binary.op("plus").unwrap();
    let specs_before = plus.len();

    reg.initialize().unwrap();
    let plus_again = reg.binary.op("plus").unwrap();
    assert!(Arc::ptr_eq(&plus, &plus_again));
    assert_eq!(plus_again.len(), specs_before);
}

#[test]
fn test_division_cleanup() {
    let mut reg = Registry::new();
    reg.initialize_kind(OpKind::BinaryOp).unwrap();

    // The raw truncating division is only reachable as cdiv
    assert!(reg.binary.op("div").is_none());
    assert!(reg.binary.op("cdiv").is_some());

    // truediv computes in floating point for every input domain
    let truediv = reg.binary.op("truediv").unwrap();
    for domain in truediv.domains() {
        let ret = truediv.lookup(domain).unwrap().return_domain;
        assert!(ret.is_float(), "{} should divide in float, got {}", domain, ret);
    }

    // floordiv is a compiled function, so integer domains map onto
    // themselves
    let floordiv = reg.binary.op("floordiv").unwrap();
    assert_eq!(
        floordiv.lookup(Domain::Uint32).unwrap().return_domain,
        Domain::Uint32
    );
}

#[test]
fn test_isclose_is_parameterized() {
    let mut reg = Registry::new();
    reg.initialize_kind(OpKind::BinaryOp).unwrap();

    let isclose = reg.binary.factory("isclose").unwrap();
    assert_eq!(isclose.op_kind(), OpKind::BinaryOp);

    // Defaults: rel_tol 1e-7, abs_tol 0
    let op = isclose.call_defaults().unwrap();
    let spec = op.lookup(Domain::Fp64).unwrap();
    assert_eq!(spec.return_domain, Domain::Bool);
}

#[test]
fn test_user_registration_collides_with_builtins() {
    let mut reg = Registry::new();
    reg.initialize_kind(OpKind::UnaryOp).unwrap();

    assert!(reg
        .register_new_unary("abs", Arc::new(|x| x.abs()))
        .is_err());

    // A dotted path beside the builtins is fine
    let op = reg
        .register_new_unary("my.abs", Arc::new(|x| x.abs()))
        .unwrap();
    assert_eq!(op.name(), "my.abs");
    assert!(Arc::ptr_eq(&op, &reg.unary.op("my.abs").unwrap()));

    // The intermediate node now blocks a leaf at the same segment
    assert!(reg
        .register_new_unary("my", Arc::new(|x| x.abs()))
        .is_err());
}

#[test]
fn test_global_registry() {
    let reg = registry::global();
    let mut reg = reg.lock().unwrap();
    reg.initialize_kind(OpKind::BinaryOp).unwrap();
    let plus = reg.binary.op("plus").unwrap();
    assert!(plus.contains(Domain::Fp32));

    // A second initialization through the same global is a no-op
    reg.initialize_kind(OpKind::BinaryOp).unwrap();
    assert!(Arc::ptr_eq(&plus, &reg.binary.op("plus").unwrap()));
}

// Core Layer: dispatch resolution
//
// Callers hand dispatch whatever they have: a whole operator, an already
// typed specialization, a parameterized factory, or a bare engine handle.
// Resolution turns that plus the operand domains into one typed
// specialization the engine can execute.

use std::sync::Arc;

use crate::engine::Handle;
use crate::types::{self, Domain};

use super::error::{OpError, Result};
use super::operator::{OpKind, Operator, TypedSpec};
use super::parameterized::ParameterizedOp;

/// The forms an operator argument may arrive in
#[derive(Debug, Clone)]
pub enum OpRef {
    Op(Arc<Operator>),
    Spec(Arc<TypedSpec>),
    Factory(Arc<ParameterizedOp>),
    Handle(Handle),
}

/// Coarse classification of an operator argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpClass {
    UnaryOp,
    BinaryOp,
    Monoid,
    Semiring,
    /// A bare handle; the caller must know what it points at
    Unknown,
}

impl From<OpKind> for OpClass {
    fn from(kind: OpKind) -> Self {
        match kind {
            OpKind::UnaryOp => Self::UnaryOp,
            OpKind::BinaryOp => Self::BinaryOp,
            OpKind::Monoid => Self::Monoid,
            OpKind::Semiring => Self::Semiring,
        }
    }
}

/// Resolve an operator argument to a typed specialization.
///
/// Two operand domains are unified first; a factory is instantiated with
/// its defaults and the instance resolved. A typed specialization passes
/// through as-is regardless of the operand domains, and a bare handle
/// cannot be resolved at all.
pub fn resolve(op: &OpRef, domain: Domain, domain2: Option<Domain>) -> Result<Arc<TypedSpec>> {
    let domain = match domain2 {
        Some(d2) => types::unify(domain, d2),
        None => domain,
    };
    match op {
        OpRef::Op(op) => op.lookup(domain),
        OpRef::Spec(spec) => Ok(spec.clone()),
        OpRef::Factory(factory) => resolve(
            &OpRef::Op(factory.call_defaults()?),
            domain,
            None,
        ),
        OpRef::Handle(handle) => Err(OpError::UnsupportedOperatorKind {
            detail: format!("bare handle {:?}", handle),
        }),
    }
}

/// Classify an operator argument, instantiating factories with their
/// defaults so the returned reference is directly resolvable.
pub fn classify(op: OpRef) -> Result<(OpRef, OpClass)> {
    match op {
        OpRef::Op(ref inner) => {
            let class = inner.kind().into();
            Ok((op, class))
        }
        OpRef::Spec(ref spec) => {
            let class = spec.kind.into();
            Ok((op, class))
        }
        OpRef::Factory(factory) => {
            let instance = factory.call_defaults()?;
            let class = instance.kind().into();
            Ok((OpRef::Op(instance), class))
        }
        OpRef::Handle(_) => Ok((op, OpClass::Unknown)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::operator::UnaryFn;
    use crate::core::parameterized::{ParamSpec, ParamValue, UnaryBuilder};
    use crate::core::udf;
    use crate::types::Value;

    fn double_op() -> Arc<Operator> {
        let double: UnaryFn = Arc::new(|x| x.mul(&Value::Int64(2)));
        Arc::new(udf::build_unary(Some("double"), double).unwrap())
    }

    #[test]
    fn test_operand_domains_are_unified() {
        let plus: crate::core::operator::BinaryFn = Arc::new(|x, y| x.add(&y));
        let plus = Arc::new(udf::build_binary(Some("plus"), plus).unwrap());
        let spec = resolve(&OpRef::Op(plus), Domain::Int16, Some(Domain::Uint16)).unwrap();
        assert_eq!(spec.input_domain, Domain::Int32);
    }

    #[test]
    fn test_spec_passes_through() {
        let op = double_op();
        let spec = op.lookup(Domain::Int8).unwrap();
        let resolved = resolve(&OpRef::Spec(spec.clone()), Domain::Fp64, None).unwrap();
        assert_eq!(resolved.input_domain, Domain::Int8);
    }

    #[test]
    fn test_factory_resolves_through_defaults() {
        let build: UnaryBuilder = Arc::new(|args| {
            let factor = args[0].as_i64();
            Arc::new(move |x: Value| x.mul(&Value::Int64(factor)))
        });
        let factory =
            ParameterizedOp::new_unary("scale", vec![ParamSpec::int("factor", 2)], build);
        let spec = resolve(&OpRef::Factory(factory.clone()), Domain::Int32, None).unwrap();
        assert_eq!(spec.input_domain, Domain::Int32);
        let direct = factory.call(&[ParamValue::Int(2)]).unwrap();
        assert_eq!(spec.handle, direct.lookup(Domain::Int32).unwrap().handle);
    }

    #[test]
    fn test_bare_handle_is_rejected() {
        let handle = crate::engine::symbol_handle("GrB_PLUS_INT32").unwrap();
        let err = resolve(&OpRef::Handle(handle), Domain::Int32, None).unwrap_err();
        assert!(matches!(err, OpError::UnsupportedOperatorKind { .. }));
    }

    #[test]
    fn test_classify() {
        let op = double_op();
        let (_, class) = classify(OpRef::Op(op)).unwrap();
        assert_eq!(class, OpClass::UnaryOp);
        let handle = crate::engine::symbol_handle("GrB_PLUS_INT32").unwrap();
        let (_, class) = classify(OpRef::Handle(handle)).unwrap();
        assert_eq!(class, OpClass::Unknown);
    }
}

// Core Layer: monoid builder
//
// Combines an already-typed binary operator with an identity value into a
// monoid, one specialization per eligible domain.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::trace;

use crate::engine;
use crate::types::{Domain, Value};

use super::error::{OpError, Result};
use super::operator::{OpKind, Operator, SpecOrigin, TypedSpec};

/// Identity element supplied to the monoid builder
#[derive(Debug, Clone)]
pub enum Identity {
    /// One value applied to every domain of the binary operator. Domains
    /// whose binary specialization does not map back onto its own domain
    /// are silently skipped.
    Uniform(Value),
    /// Explicit per-domain identities. No skipping: a domain mismatch is
    /// handed to the engine, which may reject it. Explicit identities mean
    /// the caller knows what they are doing.
    PerDomain(BTreeMap<Domain, Value>),
}

/// Build a monoid operator from a binary operator and an identity.
///
/// Fails with `InvalidOperatorKind` when `binaryop` is not a binary map.
pub fn build(name: Option<&str>, binaryop: &Arc<Operator>, identity: Identity) -> Result<Operator> {
    if binaryop.kind() != OpKind::BinaryOp {
        return Err(OpError::InvalidOperatorKind {
            expected: OpKind::BinaryOp,
            found: binaryop.to_string(),
        });
    }
    let name = name.unwrap_or_else(|| binaryop.name());
    let op = Operator::new(name, OpKind::Monoid);
    let (pairs, explicit): (Vec<(Domain, Value)>, bool) = match identity {
        Identity::Uniform(value) => (
            binaryop.domains().into_iter().map(|d| (d, value)).collect(),
            false,
        ),
        Identity::PerDomain(map) => (map.into_iter().collect(), true),
    };
    for (domain, ident) in pairs {
        let binary = binaryop.lookup(domain)?;
        if domain != binary.return_domain && !explicit {
            trace!(
                "{}: skipping {} ({} returns {})",
                name,
                domain,
                binaryop.name(),
                binary.return_domain
            );
            continue;
        }
        let handle = engine::monoid_new(binary.handle, ident.cast(domain))?;
        op.add(TypedSpec {
            kind: OpKind::Monoid,
            input_domain: domain,
            return_domain: binary.return_domain,
            handle,
            origin: SpecOrigin::UserMonoid {
                binary: binary.clone(),
                identity: ident,
            },
        });
    }
    Ok(op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::operator::BinaryFn;
    use crate::core::udf;
    use crate::engine::EngineError;

    fn plus_op() -> Arc<Operator> {
        let plus: BinaryFn = Arc::new(|x, y| x.add(&y));
        Arc::new(udf::build_binary(Some("plus"), plus).unwrap())
    }

    #[test]
    fn test_uniform_identity_covers_round_trip_domains() {
        let plus = plus_op();
        let monoid = build(None, &plus, Identity::Uniform(Value::Int64(0))).unwrap();
        assert_eq!(monoid.name(), "plus");
        // Bool narrows to int8, so the bool domain is skipped
        assert!(!monoid.contains(Domain::Bool));
        assert!(monoid.contains(Domain::Int32));
        assert_eq!(monoid.len(), plus.len() - 1);
    }

    #[test]
    fn test_identity_cast_to_domain() {
        let plus = plus_op();
        let monoid = build(None, &plus, Identity::Uniform(Value::Int64(0))).unwrap();
        let spec = monoid.lookup(Domain::Fp32).unwrap();
        assert_eq!(
            engine::monoid_identity(spec.handle).unwrap(),
            Value::Fp32(0.0)
        );
    }

    #[test]
    fn test_explicit_identity_reaches_engine() {
        // cmp_lt maps every numeric domain to bool, a mismatch the
        // implicit path would skip; the explicit path passes it through
        // and the engine rejects it.
        let lt: BinaryFn = Arc::new(|x, y| x.cmp_lt(&y));
        let lt = Arc::new(udf::build_binary(Some("lt"), lt).unwrap());
        let mut identities = BTreeMap::new();
        identities.insert(Domain::Int32, Value::Int32(0));
        let err = build(Some("lt_monoid"), &lt, Identity::PerDomain(identities)).unwrap_err();
        assert_eq!(err, OpError::Engine(EngineError::DomainMismatch));

        // The implicit path keeps only the bool domain, where lt maps
        // bool to bool
        let skipped = build(None, &lt, Identity::Uniform(Value::Bool(false))).unwrap();
        assert_eq!(skipped.domains(), vec![Domain::Bool]);
    }

    #[test]
    fn test_wrong_kind_rejected() {
        let relu: crate::core::operator::UnaryFn = Arc::new(|x| x.abs());
        let unary = Arc::new(udf::build_unary(Some("relu"), relu).unwrap());
        let err = build(None, &unary, Identity::Uniform(Value::Int64(0))).unwrap_err();
        assert!(matches!(err, OpError::InvalidOperatorKind { .. }));
    }
}

// Core Layer: semiring builder
//
// Pairs a monoid with a binary "multiply" operator. Each binary domain is
// matched against the monoid through the binary operator's return domain;
// combinations without a matching monoid domain are expected and skipped.

use std::sync::Arc;

use log::trace;

use crate::engine;

use super::error::{OpError, Result};
use super::operator::{OpKind, Operator, SpecOrigin, TypedSpec};

/// Build a semiring operator from a monoid and a binary operator.
///
/// The resulting specialization keys on the binary operator's input
/// domain and returns the monoid's return domain. Fails with
/// `InvalidOperatorKind` when either component has the wrong kind.
pub fn build(name: Option<&str>, monoid: &Arc<Operator>, binaryop: &Arc<Operator>) -> Result<Operator> {
    if monoid.kind() != OpKind::Monoid {
        return Err(OpError::InvalidOperatorKind {
            expected: OpKind::Monoid,
            found: monoid.to_string(),
        });
    }
    if binaryop.kind() != OpKind::BinaryOp {
        return Err(OpError::InvalidOperatorKind {
            expected: OpKind::BinaryOp,
            found: binaryop.to_string(),
        });
    }
    let default_name;
    let name = match name {
        Some(n) => n,
        None => {
            default_name = format!("{}_{}", monoid.name(), binaryop.name());
            &default_name
        }
    };
    let op = Operator::new(name, OpKind::Semiring);
    for domain in binaryop.domains() {
        let binary = binaryop.lookup(domain)?;
        if !monoid.contains(binary.return_domain) {
            trace!(
                "{}: no monoid domain for {} output {}",
                name,
                domain,
                binary.return_domain
            );
            continue;
        }
        let mono = monoid.lookup(binary.return_domain)?;
        let handle = engine::semiring_new(mono.handle, binary.handle)?;
        op.add(TypedSpec {
            kind: OpKind::Semiring,
            input_domain: domain,
            return_domain: mono.return_domain,
            handle,
            origin: SpecOrigin::UserSemiring {
                monoid: mono,
                binary,
            },
        });
    }
    Ok(op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::monoid::{self, Identity};
    use crate::core::operator::BinaryFn;
    use crate::core::udf;
    use crate::types::{Domain, Value};

    fn binary(name: &str, f: BinaryFn) -> Arc<Operator> {
        Arc::new(udf::build_binary(Some(name), f).unwrap())
    }

    #[test]
    fn test_plus_times_full_grid() {
        let plus = binary("plus", Arc::new(|x, y| x.add(&y)));
        let times = binary("times", Arc::new(|x, y| x.mul(&y)));
        let plus_monoid =
            Arc::new(monoid::build(None, &plus, Identity::Uniform(Value::Int64(0))).unwrap());
        let semiring = build(None, &plus_monoid, &times).unwrap();
        assert_eq!(semiring.name(), "plus_times");
        // times maps bool to int8, which the plus monoid does carry, so
        // even bool input lands on a specialization
        assert_eq!(semiring.len(), times.len());
        let spec = semiring.lookup(Domain::Bool).unwrap();
        assert_eq!(spec.return_domain, Domain::Int8);
        let spec = semiring.lookup(Domain::Fp64).unwrap();
        assert_eq!(spec.return_domain, Domain::Fp64);
    }

    #[test]
    fn test_unmatched_output_domains_are_skipped() {
        // eq outputs bool everywhere, but the plus monoid has no bool
        // domain: every combination is skipped and the semiring is empty
        let plus = binary("plus", Arc::new(|x, y| x.add(&y)));
        let eq = binary("eq", Arc::new(|x, y| x.cmp_eq(&y)));
        let plus_monoid =
            Arc::new(monoid::build(None, &plus, Identity::Uniform(Value::Int64(0))).unwrap());
        let semiring = build(Some("plus_eq"), &plus_monoid, &eq).unwrap();
        assert!(semiring.is_empty());
    }

    #[test]
    fn test_wrong_kinds_rejected() {
        let plus = binary("plus", Arc::new(|x, y| x.add(&y)));
        let err = build(None, &plus, &plus).unwrap_err();
        assert!(matches!(
            err,
            OpError::InvalidOperatorKind {
                expected: OpKind::Monoid,
                ..
            }
        ));
    }
}

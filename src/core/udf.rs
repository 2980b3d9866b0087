// Core Layer: UDF compiler
//
// Turns an untyped user function into a typed dispatch table by trial
// execution: every catalog domain is probed with its sample value, the
// return domain is inferred from the probe result, and a native-callable
// thunk is generated and registered for each domain that works. Per-domain
// failures are skipped; the build only fails when no domain succeeds.

use std::collections::BTreeMap;

use log::trace;

use crate::engine;
use crate::types::{Domain, Value};

use super::error::{OpError, Result};
use super::operator::{BinaryFn, OpKind, Operator, SpecOrigin, TypedSpec, UnaryFn};

/// Fallback names for anonymous builds
pub const ANONYMOUS_UNARY: &str = "<anonymous_unary>";
pub const ANONYMOUS_BINARY: &str = "<anonymous_binary>";

/// Narrow a probe-inferred return domain toward the input domain.
///
/// Heuristics, not guarantees: users who map int32 to int64 almost always
/// meant "same width out as in", and the two cross-family special cases
/// depend on what earlier domains in this build already confirmed. The
/// result is order-dependent on the catalog iteration order.
fn narrow_return_domain(
    input: Domain,
    inferred: Domain,
    confirmed: &BTreeMap<Domain, Domain>,
) -> Domain {
    if inferred == input {
        return inferred;
    }
    let same_family = (inferred.is_integer() && input.is_integer())
        || (inferred.is_float() && input.is_float());
    let u64_roundtrip = input == Domain::Uint64
        && inferred == Domain::Fp64
        && confirmed.get(&Domain::Int64) == Some(&Domain::Int64);
    if same_family || u64_roundtrip {
        return input;
    }
    if input == Domain::Bool
        && inferred == Domain::Int64
        && confirmed.get(&Domain::Int8) == Some(&Domain::Int8)
    {
        return Domain::Int8;
    }
    inferred
}

/// Generate the unary thunk for one specialization.
///
/// Boolean domains use an 8-bit integer stand-in on the wire, so there are
/// four shapes depending on which side of the call needs an explicit cast.
fn unary_thunk(func: UnaryFn, input: Domain, ret: Domain) -> engine::UnaryThunk {
    match (input == Domain::Bool, ret == Domain::Bool) {
        (true, true) => Box::new(move |z, x| unsafe {
            let xv = Value::Bool(std::ptr::read_unaligned(x as *const i8) != 0);
            let out = func(xv).map(|v| v.truthy()).unwrap_or(false);
            std::ptr::write_unaligned(z as *mut i8, out as i8);
        }),
        (true, false) => Box::new(move |z, x| unsafe {
            let xv = Value::Bool(std::ptr::read_unaligned(x as *const i8) != 0);
            if let Ok(v) = func(xv) {
                ret.write(z, &v);
            }
        }),
        (false, true) => Box::new(move |z, x| unsafe {
            let xv = input.read(x);
            let out = func(xv).map(|v| v.truthy()).unwrap_or(false);
            std::ptr::write_unaligned(z as *mut i8, out as i8);
        }),
        (false, false) => Box::new(move |z, x| unsafe {
            let xv = input.read(x);
            if let Ok(v) = func(xv) {
                ret.write(z, &v);
            }
        }),
    }
}

/// Binary counterpart of `unary_thunk`, same four shapes
fn binary_thunk(func: BinaryFn, input: Domain, ret: Domain) -> engine::BinaryThunk {
    match (input == Domain::Bool, ret == Domain::Bool) {
        (true, true) => Box::new(move |z, x, y| unsafe {
            let xv = Value::Bool(std::ptr::read_unaligned(x as *const i8) != 0);
            let yv = Value::Bool(std::ptr::read_unaligned(y as *const i8) != 0);
            let out = func(xv, yv).map(|v| v.truthy()).unwrap_or(false);
            std::ptr::write_unaligned(z as *mut i8, out as i8);
        }),
        (true, false) => Box::new(move |z, x, y| unsafe {
            let xv = Value::Bool(std::ptr::read_unaligned(x as *const i8) != 0);
            let yv = Value::Bool(std::ptr::read_unaligned(y as *const i8) != 0);
            if let Ok(v) = func(xv, yv) {
                ret.write(z, &v);
            }
        }),
        (false, true) => Box::new(move |z, x, y| unsafe {
            let xv = input.read(x);
            let yv = input.read(y);
            let out = func(xv, yv).map(|v| v.truthy()).unwrap_or(false);
            std::ptr::write_unaligned(z as *mut i8, out as i8);
        }),
        (false, false) => Box::new(move |z, x, y| unsafe {
            let xv = input.read(x);
            let yv = input.read(y);
            if let Ok(v) = func(xv, yv) {
                ret.write(z, &v);
            }
        }),
    }
}

/// Compile a unary user function into a new operator.
///
/// Fails with `UdfCompilation` only when no catalog domain can be
/// specialized.
pub fn build_unary(name: Option<&str>, func: UnaryFn) -> Result<Operator> {
    let name = name.unwrap_or(ANONYMOUS_UNARY);
    let op = Operator::new(name, OpKind::UnaryOp);
    let mut confirmed: BTreeMap<Domain, Domain> = BTreeMap::new();
    for domain in Domain::ALL {
        let probe = match func(domain.sample()) {
            Ok(v) => v,
            Err(err) => {
                trace!("{}: probe failed for {}: {}", name, domain, err);
                continue;
            }
        };
        let ret = narrow_return_domain(domain, Domain::of_value(&probe), &confirmed);
        let thunk = unary_thunk(func.clone(), domain, ret);
        let handle = match engine::unary_op_new(thunk, ret, domain) {
            Ok(h) => h,
            Err(err) => {
                trace!("{}: registration failed for {}: {}", name, domain, err);
                continue;
            }
        };
        op.add(TypedSpec {
            kind: OpKind::UnaryOp,
            input_domain: domain,
            return_domain: ret,
            handle,
            origin: SpecOrigin::UserUnary {
                source: func.clone(),
            },
        });
        confirmed.insert(domain, ret);
    }
    if op.is_empty() {
        return Err(OpError::UdfCompilation {
            name: name.to_string(),
        });
    }
    Ok(op)
}

/// Compile a binary user function into a new operator; both operands are
/// probed with the same sample value.
pub fn build_binary(name: Option<&str>, func: BinaryFn) -> Result<Operator> {
    let name = name.unwrap_or(ANONYMOUS_BINARY);
    let op = Operator::new(name, OpKind::BinaryOp);
    let mut confirmed: BTreeMap<Domain, Domain> = BTreeMap::new();
    for domain in Domain::ALL {
        let sample = domain.sample();
        let probe = match func(sample, sample) {
            Ok(v) => v,
            Err(err) => {
                trace!("{}: probe failed for {}: {}", name, domain, err);
                continue;
            }
        };
        let ret = narrow_return_domain(domain, Domain::of_value(&probe), &confirmed);
        let thunk = binary_thunk(func.clone(), domain, ret);
        let handle = match engine::binary_op_new(thunk, ret, domain) {
            Ok(h) => h,
            Err(err) => {
                trace!("{}: registration failed for {}: {}", name, domain, err);
                continue;
            }
        };
        op.add(TypedSpec {
            kind: OpKind::BinaryOp,
            input_domain: domain,
            return_domain: ret,
            handle,
            origin: SpecOrigin::UserBinary {
                source: func.clone(),
            },
        });
        confirmed.insert(domain, ret);
    }
    if op.is_empty() {
        return Err(OpError::UdfCompilation {
            name: name.to_string(),
        });
    }
    Ok(op)
}

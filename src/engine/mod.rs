// Engine Layer: native object table and registration calls
//
// Models the operator-facing slice of the underlying sparse engine: a flat
// table of exported builtin symbols, opaque handles, and the synchronous
// calls that register user callbacks or compose monoids and semirings from
// existing handles. Handles live for the process; the engine has no
// operator-deletion primitive.

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use crate::core::operator::OpKind;
use crate::types::{Domain, Value};

mod symbols;

/// Opaque engine-side object token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(u64);

/// Kind and domain signature of an engine object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpInfo {
    pub kind: OpKind,
    pub input: Domain,
    pub ret: Domain,
}

/// Generated native callback, unary shape: `(output, input) -> void`
pub type UnaryThunk = Box<dyn Fn(*mut u8, *const u8) + Send + Sync>;
/// Generated native callback, binary shape: `(output, a, b) -> void`
pub type BinaryThunk = Box<dyn Fn(*mut u8, *const u8, *const u8) + Send + Sync>;

/// Engine-side failure codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// Handle does not reference a live object of the expected kind
    InvalidObject,
    /// Component domains are incompatible
    DomainMismatch,
    /// Operation exists but is not available for this object
    NotImplemented,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidObject => write!(f, "invalid or unknown engine object"),
            Self::DomainMismatch => write!(f, "domain mismatch between engine objects"),
            Self::NotImplemented => write!(f, "operation not implemented for this object"),
        }
    }
}

impl std::error::Error for EngineError {}

enum EngineObject {
    Builtin(OpInfo),
    UserUnary { info: OpInfo, thunk: UnaryThunk },
    UserBinary { info: OpInfo, thunk: BinaryThunk },
    UserMonoid { info: OpInfo, identity: Value },
    UserSemiring { info: OpInfo },
}

impl EngineObject {
    fn info(&self) -> OpInfo {
        match self {
            Self::Builtin(info) => *info,
            Self::UserUnary { info, .. } => *info,
            Self::UserBinary { info, .. } => *info,
            Self::UserMonoid { info, .. } => *info,
            Self::UserSemiring { info } => *info,
        }
    }
}

struct EngineState {
    objects: Vec<EngineObject>,
    names: Vec<String>,
    by_name: HashMap<String, Handle>,
}

impl EngineState {
    fn bootstrap() -> Self {
        let mut state = Self {
            objects: Vec::new(),
            names: Vec::new(),
            by_name: HashMap::new(),
        };
        for (name, info) in symbols::build() {
            if state.by_name.contains_key(&name) {
                continue;
            }
            let handle = state.alloc(EngineObject::Builtin(info));
            state.by_name.insert(name.clone(), handle);
            state.names.push(name);
        }
        state
    }

    fn alloc(&mut self, obj: EngineObject) -> Handle {
        let handle = Handle(self.objects.len() as u64);
        self.objects.push(obj);
        handle
    }

    fn get(&self, handle: Handle) -> Result<&EngineObject, EngineError> {
        self.objects
            .get(handle.0 as usize)
            .ok_or(EngineError::InvalidObject)
    }
}

lazy_static! {
    static ref STATE: Mutex<EngineState> = Mutex::new(EngineState::bootstrap());
}

/// Names of every exported builtin operator symbol
pub fn exported_symbols() -> Vec<String> {
    STATE.lock().unwrap().names.clone()
}

/// Handle of a builtin symbol by its exported name
pub fn symbol_handle(name: &str) -> Option<Handle> {
    STATE.lock().unwrap().by_name.get(name).copied()
}

/// Kind and domain signature of a live object
pub fn op_info(handle: Handle) -> Result<OpInfo, EngineError> {
    Ok(STATE.lock().unwrap().get(handle)?.info())
}

/// Register a compiled unary callback
pub fn unary_op_new(thunk: UnaryThunk, ret: Domain, input: Domain) -> Result<Handle, EngineError> {
    let mut state = STATE.lock().unwrap();
    let info = OpInfo {
        kind: OpKind::UnaryOp,
        input,
        ret,
    };
    Ok(state.alloc(EngineObject::UserUnary { info, thunk }))
}

/// Register a compiled binary callback (both operands share `input`)
pub fn binary_op_new(thunk: BinaryThunk, ret: Domain, input: Domain) -> Result<Handle, EngineError> {
    let mut state = STATE.lock().unwrap();
    let info = OpInfo {
        kind: OpKind::BinaryOp,
        input,
        ret,
    };
    Ok(state.alloc(EngineObject::UserBinary { info, thunk }))
}

/// Build a monoid from a binary operator handle and an identity value.
///
/// The binary operator must map its domain back onto itself; a differing
/// input and return domain is rejected with `DomainMismatch`.
pub fn monoid_new(binary: Handle, identity: Value) -> Result<Handle, EngineError> {
    let mut state = STATE.lock().unwrap();
    let binfo = state.get(binary)?.info();
    if binfo.kind != OpKind::BinaryOp {
        return Err(EngineError::InvalidObject);
    }
    if binfo.input != binfo.ret {
        return Err(EngineError::DomainMismatch);
    }
    let identity = identity.cast(binfo.input);
    let info = OpInfo {
        kind: OpKind::Monoid,
        input: binfo.input,
        ret: binfo.ret,
    };
    Ok(state.alloc(EngineObject::UserMonoid { info, identity }))
}

/// Identity value stored with a registered monoid
pub fn monoid_identity(handle: Handle) -> Result<Value, EngineError> {
    let state = STATE.lock().unwrap();
    match state.get(handle)? {
        EngineObject::UserMonoid { identity, .. } => Ok(*identity),
        _ => Err(EngineError::InvalidObject),
    }
}

/// Build a semiring from a monoid handle and a binary operator handle.
///
/// The binary operator's return domain must match the monoid's domain.
pub fn semiring_new(monoid: Handle, binary: Handle) -> Result<Handle, EngineError> {
    let mut state = STATE.lock().unwrap();
    let minfo = state.get(monoid)?.info();
    let binfo = state.get(binary)?.info();
    if minfo.kind != OpKind::Monoid || binfo.kind != OpKind::BinaryOp {
        return Err(EngineError::InvalidObject);
    }
    if binfo.ret != minfo.input {
        return Err(EngineError::DomainMismatch);
    }
    let info = OpInfo {
        kind: OpKind::Semiring,
        input: binfo.input,
        ret: minfo.ret,
    };
    Ok(state.alloc(EngineObject::UserSemiring { info }))
}

/// Invoke a registered unary callback through the native contract.
///
/// Builtin symbols are executed inside the engine's own kernels, not
/// through this entry point.
///
/// # Safety
/// `out` and `input` must point to storage of the callback's return and
/// input domain representations respectively.
pub unsafe fn call_unary(handle: Handle, out: *mut u8, input: *const u8) -> Result<(), EngineError> {
    let state = STATE.lock().unwrap();
    match state.get(handle)? {
        EngineObject::UserUnary { thunk, .. } => {
            thunk(out, input);
            Ok(())
        }
        _ => Err(EngineError::NotImplemented),
    }
}

/// Invoke a registered binary callback through the native contract.
///
/// # Safety
/// `out`, `a` and `b` must point to storage of the callback's return and
/// input domain representations respectively.
pub unsafe fn call_binary(
    handle: Handle,
    out: *mut u8,
    a: *const u8,
    b: *const u8,
) -> Result<(), EngineError> {
    let state = STATE.lock().unwrap();
    match state.get(handle)? {
        EngineObject::UserBinary { thunk, .. } => {
            thunk(out, a, b);
            Ok(())
        }
        _ => Err(EngineError::NotImplemented),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_table_exports() {
        let names = exported_symbols();
        assert!(names.iter().any(|n| n == "GrB_PLUS_INT32"));
        assert!(names.iter().any(|n| n == "GrB_LNOT"));
        assert!(names.iter().any(|n| n == "GxB_MAX_INT8_MONOID"));
        assert!(names.iter().any(|n| n == "GxB_PLUS_TIMES_FP64"));
        assert!(symbol_handle("GrB_PLUS_INT32").is_some());
        assert!(symbol_handle("GrB_PLUS_COMPLEX").is_none());
    }

    #[test]
    fn test_monoid_new_rejects_domain_mismatch() {
        // EQ_INT32 maps int32 to bool, so it cannot seed a monoid
        let eq = symbol_handle("GrB_EQ_INT32").unwrap();
        assert_eq!(
            monoid_new(eq, Value::Int32(0)),
            Err(EngineError::DomainMismatch)
        );
        let plus = symbol_handle("GrB_PLUS_INT32").unwrap();
        assert!(monoid_new(plus, Value::Int32(0)).is_ok());
    }

    #[test]
    fn test_semiring_new_checks_kinds() {
        let plus_monoid = {
            let plus = symbol_handle("GrB_PLUS_FP64").unwrap();
            monoid_new(plus, Value::Fp64(0.0)).unwrap()
        };
        let times = symbol_handle("GrB_TIMES_FP64").unwrap();
        assert!(semiring_new(plus_monoid, times).is_ok());
        assert_eq!(
            semiring_new(times, times),
            Err(EngineError::InvalidObject)
        );
    }

    #[test]
    fn test_call_unary_rejects_builtin() {
        let abs = symbol_handle("GxB_ABS_INT32").unwrap();
        let mut out = 0i32;
        let input = 5i32;
        let status = unsafe {
            call_unary(
                abs,
                &mut out as *mut i32 as *mut u8,
                &input as *const i32 as *const u8,
            )
        };
        assert_eq!(status, Err(EngineError::NotImplemented));
    }
}

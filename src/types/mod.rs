// Type System: runtime domain catalog
//
// Operators specialize over scalar domains (bool, integer widths, float
// widths). This module is the catalog the rest of the crate consumes:
// 1. Domain - runtime domain code with symbol-name parsing
// 2. Value - dynamic scalar used for probing UDFs and for thunk I/O
// 3. unify - domain coercion rule for mixed-domain dispatch
// 4. Sample probe values, one per domain

use std::fmt;

/// Runtime domain code enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Domain {
    /// Boolean
    Bool,
    /// Signed 8-bit integer
    Int8,
    /// Signed 16-bit integer
    Int16,
    /// Signed 32-bit integer
    Int32,
    /// Signed 64-bit integer
    Int64,
    /// Unsigned 8-bit integer
    Uint8,
    /// Unsigned 16-bit integer
    Uint16,
    /// Unsigned 32-bit integer
    Uint32,
    /// Unsigned 64-bit integer
    Uint64,
    /// 32-bit floating point
    Fp32,
    /// 64-bit floating point
    Fp64,
}

impl Domain {
    /// Catalog iteration order used by the UDF probing loop.
    ///
    /// The return-domain narrowing heuristics look at outcomes of domains
    /// probed earlier in the same build, so Int64 precedes Uint64 and Int8
    /// precedes Bool. The order is an implementation detail, not a
    /// contract; callers must not rely on it.
    pub const ALL: [Domain; 11] = [
        Domain::Int8,
        Domain::Int16,
        Domain::Int32,
        Domain::Int64,
        Domain::Uint8,
        Domain::Uint16,
        Domain::Uint32,
        Domain::Uint64,
        Domain::Fp32,
        Domain::Fp64,
        Domain::Bool,
    ];

    /// Get human-readable name for this domain
    pub fn name(&self) -> &'static str {
        match self {
            Domain::Bool => "bool",
            Domain::Int8 => "int8",
            Domain::Int16 => "int16",
            Domain::Int32 => "int32",
            Domain::Int64 => "int64",
            Domain::Uint8 => "uint8",
            Domain::Uint16 => "uint16",
            Domain::Uint32 => "uint32",
            Domain::Uint64 => "uint64",
            Domain::Fp32 => "float32",
            Domain::Fp64 => "float64",
        }
    }

    /// Token used for this domain in exported engine symbol names
    pub fn symbol_token(&self) -> &'static str {
        match self {
            Domain::Bool => "BOOL",
            Domain::Int8 => "INT8",
            Domain::Int16 => "INT16",
            Domain::Int32 => "INT32",
            Domain::Int64 => "INT64",
            Domain::Uint8 => "UINT8",
            Domain::Uint16 => "UINT16",
            Domain::Uint32 => "UINT32",
            Domain::Uint64 => "UINT64",
            Domain::Fp32 => "FP32",
            Domain::Fp64 => "FP64",
        }
    }

    /// Parse a symbol-name token back into a domain
    pub fn from_symbol(token: &str) -> Option<Domain> {
        match token {
            "BOOL" => Some(Domain::Bool),
            "INT8" => Some(Domain::Int8),
            "INT16" => Some(Domain::Int16),
            "INT32" => Some(Domain::Int32),
            "INT64" => Some(Domain::Int64),
            "UINT8" => Some(Domain::Uint8),
            "UINT16" => Some(Domain::Uint16),
            "UINT32" => Some(Domain::Uint32),
            "UINT64" => Some(Domain::Uint64),
            "FP32" => Some(Domain::Fp32),
            "FP64" => Some(Domain::Fp64),
            _ => None,
        }
    }

    /// Sample value used to probe whether a UDF supports this domain
    pub fn sample(&self) -> Value {
        match self {
            Domain::Bool => Value::Bool(true),
            Domain::Int8 => Value::Int8(3),
            Domain::Int16 => Value::Int16(3),
            Domain::Int32 => Value::Int32(3),
            Domain::Int64 => Value::Int64(3),
            Domain::Uint8 => Value::Uint8(3),
            Domain::Uint16 => Value::Uint16(3),
            Domain::Uint32 => Value::Uint32(3),
            Domain::Uint64 => Value::Uint64(3),
            Domain::Fp32 => Value::Fp32(2.5),
            Domain::Fp64 => Value::Fp64(2.5),
        }
    }

    /// Reverse lookup: domain of a runtime value
    pub fn of_value(value: &Value) -> Domain {
        value.domain()
    }

    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            Domain::Int8 | Domain::Int16 | Domain::Int32 | Domain::Int64
        )
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            Domain::Uint8 | Domain::Uint16 | Domain::Uint32 | Domain::Uint64
        )
    }

    /// Integer family (signed or unsigned; Bool is not an integer)
    pub fn is_integer(&self) -> bool {
        self.is_signed() || self.is_unsigned()
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Domain::Fp32 | Domain::Fp64)
    }

    /// Width in bytes of the native representation
    pub fn bytes(&self) -> usize {
        match self {
            Domain::Bool | Domain::Int8 | Domain::Uint8 => 1,
            Domain::Int16 | Domain::Uint16 => 2,
            Domain::Int32 | Domain::Uint32 | Domain::Fp32 => 4,
            Domain::Int64 | Domain::Uint64 | Domain::Fp64 => 8,
        }
    }

    fn signed_with_bytes(bytes: usize) -> Domain {
        match bytes {
            1 => Domain::Int8,
            2 => Domain::Int16,
            4 => Domain::Int32,
            _ => Domain::Int64,
        }
    }

    /// Read a value of this domain through a raw pointer.
    ///
    /// Bool uses an 8-bit integer stand-in: the native callback contract
    /// never passes a Rust `bool` across the boundary.
    ///
    /// # Safety
    /// `src` must point to a readable native representation of this domain
    /// (one byte for Bool).
    pub unsafe fn read(self, src: *const u8) -> Value {
        match self {
            Domain::Bool => Value::Bool(std::ptr::read_unaligned(src as *const i8) != 0),
            Domain::Int8 => Value::Int8(std::ptr::read_unaligned(src as *const i8)),
            Domain::Int16 => Value::Int16(std::ptr::read_unaligned(src as *const i16)),
            Domain::Int32 => Value::Int32(std::ptr::read_unaligned(src as *const i32)),
            Domain::Int64 => Value::Int64(std::ptr::read_unaligned(src as *const i64)),
            Domain::Uint8 => Value::Uint8(std::ptr::read_unaligned(src)),
            Domain::Uint16 => Value::Uint16(std::ptr::read_unaligned(src as *const u16)),
            Domain::Uint32 => Value::Uint32(std::ptr::read_unaligned(src as *const u32)),
            Domain::Uint64 => Value::Uint64(std::ptr::read_unaligned(src as *const u64)),
            Domain::Fp32 => Value::Fp32(std::ptr::read_unaligned(src as *const f32)),
            Domain::Fp64 => Value::Fp64(std::ptr::read_unaligned(src as *const f64)),
        }
    }

    /// Cast `value` to this domain and write it through a raw pointer.
    ///
    /// # Safety
    /// `dst` must point to writable storage for this domain's native
    /// representation (one byte for Bool).
    pub unsafe fn write(self, dst: *mut u8, value: &Value) {
        match value.cast(self) {
            Value::Bool(b) => std::ptr::write_unaligned(dst as *mut i8, b as i8),
            Value::Int8(x) => std::ptr::write_unaligned(dst as *mut i8, x),
            Value::Int16(x) => std::ptr::write_unaligned(dst as *mut i16, x),
            Value::Int32(x) => std::ptr::write_unaligned(dst as *mut i32, x),
            Value::Int64(x) => std::ptr::write_unaligned(dst as *mut i64, x),
            Value::Uint8(x) => std::ptr::write_unaligned(dst, x),
            Value::Uint16(x) => std::ptr::write_unaligned(dst as *mut u16, x),
            Value::Uint32(x) => std::ptr::write_unaligned(dst as *mut u32, x),
            Value::Uint64(x) => std::ptr::write_unaligned(dst as *mut u64, x),
            Value::Fp32(x) => std::ptr::write_unaligned(dst as *mut f32, x),
            Value::Fp64(x) => std::ptr::write_unaligned(dst as *mut f64, x),
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Domain coercion rule for mixed-domain dispatch.
///
/// Same domain is identity; Bool promotes to the other side; same-family
/// integers widen; mixed signed/unsigned widens to a signed domain able to
/// hold the unsigned side, except Uint64 mixed with a signed domain which
/// promotes to Fp64; floats win over integers at their own width.
pub fn unify(a: Domain, b: Domain) -> Domain {
    if a == b {
        return a;
    }
    if a == Domain::Bool {
        return b;
    }
    if b == Domain::Bool {
        return a;
    }
    if a.is_float() || b.is_float() {
        if a == Domain::Fp64 || b == Domain::Fp64 {
            return Domain::Fp64;
        }
        return Domain::Fp32;
    }
    // Both integers from here on
    if a.is_signed() == b.is_signed() {
        return if a.bytes() >= b.bytes() { a } else { b };
    }
    let (signed, unsigned) = if a.is_signed() { (a, b) } else { (b, a) };
    if unsigned == Domain::Uint64 {
        return Domain::Fp64;
    }
    Domain::signed_with_bytes(signed.bytes().max(unsigned.bytes() * 2))
}

/// Failure of a value-level operation. Probe loops treat this as "domain
/// not supported" for the domain under trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// Operation has no meaning for the operand domain(s)
    Unsupported(&'static str),
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported(what) => write!(f, "unsupported operation: {}", what),
        }
    }
}

impl std::error::Error for ValueError {}

/// Dynamic scalar carrying one value in some domain.
///
/// Arithmetic unifies operand domains first and then operates in the
/// unified domain. Numeric-exception conditions are suppressed by
/// construction: integer arithmetic wraps on overflow, integer division by
/// zero yields zero, and float arithmetic follows IEEE (inf/nan propagate).
/// Only a genuine type error surfaces as `ValueError`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Fp32(f32),
    Fp64(f64),
}

macro_rules! wrapping_binop {
    ($a:expr, $b:expr, $method:ident, $op:tt) => {
        match ($a, $b) {
            (Value::Int8(x), Value::Int8(y)) => Ok(Value::Int8(x.$method(y))),
            (Value::Int16(x), Value::Int16(y)) => Ok(Value::Int16(x.$method(y))),
            (Value::Int32(x), Value::Int32(y)) => Ok(Value::Int32(x.$method(y))),
            (Value::Int64(x), Value::Int64(y)) => Ok(Value::Int64(x.$method(y))),
            (Value::Uint8(x), Value::Uint8(y)) => Ok(Value::Uint8(x.$method(y))),
            (Value::Uint16(x), Value::Uint16(y)) => Ok(Value::Uint16(x.$method(y))),
            (Value::Uint32(x), Value::Uint32(y)) => Ok(Value::Uint32(x.$method(y))),
            (Value::Uint64(x), Value::Uint64(y)) => Ok(Value::Uint64(x.$method(y))),
            (Value::Fp32(x), Value::Fp32(y)) => Ok(Value::Fp32(x $op y)),
            (Value::Fp64(x), Value::Fp64(y)) => Ok(Value::Fp64(x $op y)),
            _ => Err(ValueError::Unsupported(stringify!($method))),
        }
    };
}

macro_rules! int_div_binop {
    ($a:expr, $b:expr) => {
        match ($a, $b) {
            (Value::Int8(x), Value::Int8(y)) => {
                Ok(Value::Int8(if y == 0 { 0 } else { x.wrapping_div(y) }))
            }
            (Value::Int16(x), Value::Int16(y)) => {
                Ok(Value::Int16(if y == 0 { 0 } else { x.wrapping_div(y) }))
            }
            (Value::Int32(x), Value::Int32(y)) => {
                Ok(Value::Int32(if y == 0 { 0 } else { x.wrapping_div(y) }))
            }
            (Value::Int64(x), Value::Int64(y)) => {
                Ok(Value::Int64(if y == 0 { 0 } else { x.wrapping_div(y) }))
            }
            (Value::Uint8(x), Value::Uint8(y)) => {
                Ok(Value::Uint8(if y == 0 { 0 } else { x / y }))
            }
            (Value::Uint16(x), Value::Uint16(y)) => {
                Ok(Value::Uint16(if y == 0 { 0 } else { x / y }))
            }
            (Value::Uint32(x), Value::Uint32(y)) => {
                Ok(Value::Uint32(if y == 0 { 0 } else { x / y }))
            }
            (Value::Uint64(x), Value::Uint64(y)) => {
                Ok(Value::Uint64(if y == 0 { 0 } else { x / y }))
            }
            (Value::Fp32(x), Value::Fp32(y)) => Ok(Value::Fp32(x / y)),
            (Value::Fp64(x), Value::Fp64(y)) => Ok(Value::Fp64(x / y)),
            _ => Err(ValueError::Unsupported("div")),
        }
    };
}

impl Value {
    /// Domain of this value
    pub fn domain(&self) -> Domain {
        match self {
            Value::Bool(_) => Domain::Bool,
            Value::Int8(_) => Domain::Int8,
            Value::Int16(_) => Domain::Int16,
            Value::Int32(_) => Domain::Int32,
            Value::Int64(_) => Domain::Int64,
            Value::Uint8(_) => Domain::Uint8,
            Value::Uint16(_) => Domain::Uint16,
            Value::Uint32(_) => Domain::Uint32,
            Value::Uint64(_) => Domain::Uint64,
            Value::Fp32(_) => Domain::Fp32,
            Value::Fp64(_) => Domain::Fp64,
        }
    }

    /// Lossy conversion to f64 (Bool becomes 0/1)
    pub fn as_f64(&self) -> f64 {
        match *self {
            Value::Bool(b) => b as u8 as f64,
            Value::Int8(x) => x as f64,
            Value::Int16(x) => x as f64,
            Value::Int32(x) => x as f64,
            Value::Int64(x) => x as f64,
            Value::Uint8(x) => x as f64,
            Value::Uint16(x) => x as f64,
            Value::Uint32(x) => x as f64,
            Value::Uint64(x) => x as f64,
            Value::Fp32(x) => x as f64,
            Value::Fp64(x) => x,
        }
    }

    /// Widening conversion to i128; floats truncate toward zero with
    /// saturation, NaN becomes zero
    fn wide_int(&self) -> i128 {
        match *self {
            Value::Bool(b) => b as i128,
            Value::Int8(x) => x as i128,
            Value::Int16(x) => x as i128,
            Value::Int32(x) => x as i128,
            Value::Int64(x) => x as i128,
            Value::Uint8(x) => x as i128,
            Value::Uint16(x) => x as i128,
            Value::Uint32(x) => x as i128,
            Value::Uint64(x) => x as i128,
            Value::Fp32(x) => x as i128,
            Value::Fp64(x) => x as i128,
        }
    }

    /// C-style cast into `target` (narrowing integer casts wrap)
    pub fn cast(&self, target: Domain) -> Value {
        if self.domain() == target {
            return *self;
        }
        match target {
            Domain::Bool => Value::Bool(self.truthy()),
            Domain::Fp32 => Value::Fp32(self.as_f64() as f32),
            Domain::Fp64 => Value::Fp64(self.as_f64()),
            Domain::Int8 => Value::Int8(self.wide_int() as i8),
            Domain::Int16 => Value::Int16(self.wide_int() as i16),
            Domain::Int32 => Value::Int32(self.wide_int() as i32),
            Domain::Int64 => Value::Int64(self.wide_int() as i64),
            Domain::Uint8 => Value::Uint8(self.wide_int() as u8),
            Domain::Uint16 => Value::Uint16(self.wide_int() as u16),
            Domain::Uint32 => Value::Uint32(self.wide_int() as u32),
            Domain::Uint64 => Value::Uint64(self.wide_int() as u64),
        }
    }

    /// Nonzero test (Bool reads its own truth value)
    pub fn truthy(&self) -> bool {
        match *self {
            Value::Bool(b) => b,
            Value::Fp32(x) => x != 0.0,
            Value::Fp64(x) => x != 0.0,
            _ => self.wide_int() != 0,
        }
    }

    /// Domain arithmetic operates in; Bool arithmetic promotes to Int64
    fn arith_domain(&self) -> Domain {
        match self.domain() {
            Domain::Bool => Domain::Int64,
            d => d,
        }
    }

    fn unified_pair(&self, other: &Value) -> (Value, Value) {
        let d = unify(self.arith_domain(), other.arith_domain());
        (self.cast(d), other.cast(d))
    }

    pub fn add(&self, other: &Value) -> Result<Value, ValueError> {
        let (a, b) = self.unified_pair(other);
        wrapping_binop!(a, b, wrapping_add, +)
    }

    pub fn sub(&self, other: &Value) -> Result<Value, ValueError> {
        let (a, b) = self.unified_pair(other);
        wrapping_binop!(a, b, wrapping_sub, -)
    }

    pub fn mul(&self, other: &Value) -> Result<Value, ValueError> {
        let (a, b) = self.unified_pair(other);
        wrapping_binop!(a, b, wrapping_mul, *)
    }

    pub fn div(&self, other: &Value) -> Result<Value, ValueError> {
        let (a, b) = self.unified_pair(other);
        int_div_binop!(a, b)
    }

    pub fn rem(&self, other: &Value) -> Result<Value, ValueError> {
        let (a, b) = self.unified_pair(other);
        match (a, b) {
            (Value::Int8(x), Value::Int8(y)) => {
                Ok(Value::Int8(if y == 0 { 0 } else { x.wrapping_rem(y) }))
            }
            (Value::Int16(x), Value::Int16(y)) => {
                Ok(Value::Int16(if y == 0 { 0 } else { x.wrapping_rem(y) }))
            }
            (Value::Int32(x), Value::Int32(y)) => {
                Ok(Value::Int32(if y == 0 { 0 } else { x.wrapping_rem(y) }))
            }
            (Value::Int64(x), Value::Int64(y)) => {
                Ok(Value::Int64(if y == 0 { 0 } else { x.wrapping_rem(y) }))
            }
            (Value::Uint8(x), Value::Uint8(y)) => {
                Ok(Value::Uint8(if y == 0 { 0 } else { x % y }))
            }
            (Value::Uint16(x), Value::Uint16(y)) => {
                Ok(Value::Uint16(if y == 0 { 0 } else { x % y }))
            }
            (Value::Uint32(x), Value::Uint32(y)) => {
                Ok(Value::Uint32(if y == 0 { 0 } else { x % y }))
            }
            (Value::Uint64(x), Value::Uint64(y)) => {
                Ok(Value::Uint64(if y == 0 { 0 } else { x % y }))
            }
            (Value::Fp32(x), Value::Fp32(y)) => Ok(Value::Fp32(x % y)),
            (Value::Fp64(x), Value::Fp64(y)) => Ok(Value::Fp64(x % y)),
            _ => Err(ValueError::Unsupported("rem")),
        }
    }

    pub fn neg(&self) -> Result<Value, ValueError> {
        Ok(Value::Int64(0).sub(self)?.cast(self.arith_domain()))
    }

    pub fn abs(&self) -> Result<Value, ValueError> {
        match *self {
            Value::Bool(b) => Ok(Value::Int64(b as i64)),
            Value::Int8(x) => Ok(Value::Int8(x.wrapping_abs())),
            Value::Int16(x) => Ok(Value::Int16(x.wrapping_abs())),
            Value::Int32(x) => Ok(Value::Int32(x.wrapping_abs())),
            Value::Int64(x) => Ok(Value::Int64(x.wrapping_abs())),
            Value::Fp32(x) => Ok(Value::Fp32(x.abs())),
            Value::Fp64(x) => Ok(Value::Fp64(x.abs())),
            v => Ok(v),
        }
    }

    /// Round toward negative infinity; identity for integer domains
    pub fn floor(&self) -> Value {
        match *self {
            Value::Fp32(x) => Value::Fp32(x.floor()),
            Value::Fp64(x) => Value::Fp64(x.floor()),
            v => v,
        }
    }

    fn ordering(&self, other: &Value) -> Option<std::cmp::Ordering> {
        let (a, b) = self.unified_pair(other);
        match (a, b) {
            (Value::Int8(x), Value::Int8(y)) => Some(x.cmp(&y)),
            (Value::Int16(x), Value::Int16(y)) => Some(x.cmp(&y)),
            (Value::Int32(x), Value::Int32(y)) => Some(x.cmp(&y)),
            (Value::Int64(x), Value::Int64(y)) => Some(x.cmp(&y)),
            (Value::Uint8(x), Value::Uint8(y)) => Some(x.cmp(&y)),
            (Value::Uint16(x), Value::Uint16(y)) => Some(x.cmp(&y)),
            (Value::Uint32(x), Value::Uint32(y)) => Some(x.cmp(&y)),
            (Value::Uint64(x), Value::Uint64(y)) => Some(x.cmp(&y)),
            (Value::Fp32(x), Value::Fp32(y)) => x.partial_cmp(&y),
            (Value::Fp64(x), Value::Fp64(y)) => x.partial_cmp(&y),
            _ => None,
        }
    }

    pub fn cmp_eq(&self, other: &Value) -> Result<Value, ValueError> {
        Ok(Value::Bool(
            self.ordering(other) == Some(std::cmp::Ordering::Equal),
        ))
    }

    pub fn cmp_ne(&self, other: &Value) -> Result<Value, ValueError> {
        Ok(Value::Bool(
            !matches!(self.ordering(other), Some(std::cmp::Ordering::Equal)),
        ))
    }

    pub fn cmp_lt(&self, other: &Value) -> Result<Value, ValueError> {
        Ok(Value::Bool(
            self.ordering(other) == Some(std::cmp::Ordering::Less),
        ))
    }

    pub fn cmp_le(&self, other: &Value) -> Result<Value, ValueError> {
        Ok(Value::Bool(matches!(
            self.ordering(other),
            Some(std::cmp::Ordering::Less) | Some(std::cmp::Ordering::Equal)
        )))
    }

    pub fn cmp_gt(&self, other: &Value) -> Result<Value, ValueError> {
        Ok(Value::Bool(
            self.ordering(other) == Some(std::cmp::Ordering::Greater),
        ))
    }

    pub fn cmp_ge(&self, other: &Value) -> Result<Value, ValueError> {
        Ok(Value::Bool(matches!(
            self.ordering(other),
            Some(std::cmp::Ordering::Greater) | Some(std::cmp::Ordering::Equal)
        )))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int8(x) => write!(f, "{}", x),
            Value::Int16(x) => write!(f, "{}", x),
            Value::Int32(x) => write!(f, "{}", x),
            Value::Int64(x) => write!(f, "{}", x),
            Value::Uint8(x) => write!(f, "{}", x),
            Value::Uint16(x) => write!(f, "{}", x),
            Value::Uint32(x) => write!(f, "{}", x),
            Value::Uint64(x) => write!(f, "{}", x),
            Value::Fp32(x) => write!(f, "{}", x),
            Value::Fp64(x) => write!(f, "{}", x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unify_same_and_bool() {
        assert_eq!(unify(Domain::Int32, Domain::Int32), Domain::Int32);
        assert_eq!(unify(Domain::Bool, Domain::Fp32), Domain::Fp32);
        assert_eq!(unify(Domain::Uint8, Domain::Bool), Domain::Uint8);
    }

    #[test]
    fn test_unify_widening() {
        assert_eq!(unify(Domain::Int8, Domain::Int64), Domain::Int64);
        assert_eq!(unify(Domain::Uint16, Domain::Uint32), Domain::Uint32);
        assert_eq!(unify(Domain::Int8, Domain::Uint8), Domain::Int16);
        assert_eq!(unify(Domain::Uint32, Domain::Int8), Domain::Int64);
        assert_eq!(unify(Domain::Uint64, Domain::Int64), Domain::Fp64);
        assert_eq!(unify(Domain::Fp32, Domain::Int64), Domain::Fp32);
        assert_eq!(unify(Domain::Fp32, Domain::Fp64), Domain::Fp64);
    }

    #[test]
    fn test_arithmetic_wraps() {
        let big = Value::Int8(i8::MAX);
        assert_eq!(big.add(&Value::Int8(1)).unwrap(), Value::Int8(i8::MIN));
        assert_eq!(
            Value::Int32(7).div(&Value::Int32(0)).unwrap(),
            Value::Int32(0)
        );
        assert_eq!(
            Value::Int32(7).rem(&Value::Int32(0)).unwrap(),
            Value::Int32(0)
        );
        assert_eq!(
            Value::Fp64(7.5).rem(&Value::Int64(2)).unwrap(),
            Value::Fp64(1.5)
        );
    }

    #[test]
    fn test_bool_arithmetic_promotes() {
        let v = Value::Bool(true).mul(&Value::Int64(2)).unwrap();
        assert_eq!(v, Value::Int64(2));
        assert_eq!(v.domain(), Domain::Int64);
    }

    #[test]
    fn test_cast() {
        assert_eq!(Value::Int64(300).cast(Domain::Uint8), Value::Uint8(44));
        assert_eq!(Value::Fp64(2.9).cast(Domain::Int32), Value::Int32(2));
        assert_eq!(Value::Int32(0).cast(Domain::Bool), Value::Bool(false));
        assert_eq!(Value::Bool(true).cast(Domain::Fp32), Value::Fp32(1.0));
    }

    #[test]
    fn test_pointer_round_trip() {
        let mut buf = [0u8; 8];
        unsafe {
            Domain::Fp64.write(buf.as_mut_ptr(), &Value::Fp64(2.5));
            assert_eq!(Domain::Fp64.read(buf.as_ptr()), Value::Fp64(2.5));
            Domain::Bool.write(buf.as_mut_ptr(), &Value::Int32(7));
            assert_eq!(buf[0], 1);
            assert_eq!(Domain::Bool.read(buf.as_ptr()), Value::Bool(true));
        }
    }
}

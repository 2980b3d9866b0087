// Engine Layer: exported operator symbol table
//
// The engine exports one symbol per builtin typed operator. Names follow
// the `<prefix>_<OPNAME>_<DOMAIN>` convention (`<prefix>` is `GrB` for the
// standard set and `GxB` for the extended set; a missing domain token means
// BOOL). The registry reverse-engineers its builtin dispatch tables from
// these names, so this list is the wire contract between the two layers.

use super::OpInfo;
use crate::core::operator::OpKind;
use crate::types::Domain;

/// Symbol-name domain order for the exported table
const DOMAINS: [Domain; 11] = [
    Domain::Bool,
    Domain::Int8,
    Domain::Uint8,
    Domain::Int16,
    Domain::Uint16,
    Domain::Int32,
    Domain::Uint32,
    Domain::Int64,
    Domain::Uint64,
    Domain::Fp32,
    Domain::Fp64,
];

fn numeric_domains() -> impl Iterator<Item = Domain> {
    DOMAINS.iter().copied().filter(|d| *d != Domain::Bool)
}

pub(super) fn build() -> Vec<(String, OpInfo)> {
    let mut out = Vec::new();
    let mut push = |name: String, kind: OpKind, input: Domain, ret: Domain| {
        out.push((name, OpInfo { kind, input, ret }));
    };

    // Unary: standard and extended sets, plus the untyped boolean negation
    for op in ["IDENTITY", "AINV", "MINV"] {
        for d in DOMAINS {
            push(
                format!("GrB_{}_{}", op, d.symbol_token()),
                OpKind::UnaryOp,
                d,
                d,
            );
        }
    }
    for op in ["ABS", "LNOT", "ONE"] {
        for d in DOMAINS {
            push(
                format!("GxB_{}_{}", op, d.symbol_token()),
                OpKind::UnaryOp,
                d,
                d,
            );
        }
    }
    push(
        "GrB_LNOT".to_string(),
        OpKind::UnaryOp,
        Domain::Bool,
        Domain::Bool,
    );

    // Binary: arithmetic, untyped logical, extended, and comparison sets
    for op in [
        "FIRST", "SECOND", "MIN", "MAX", "PLUS", "MINUS", "TIMES", "DIV",
    ] {
        for d in DOMAINS {
            push(
                format!("GrB_{}_{}", op, d.symbol_token()),
                OpKind::BinaryOp,
                d,
                d,
            );
        }
    }
    for op in ["LOR", "LAND", "LXOR"] {
        push(
            format!("GrB_{}", op),
            OpKind::BinaryOp,
            Domain::Bool,
            Domain::Bool,
        );
    }
    for op in [
        "RMINUS", "RDIV", "PAIR", "ANY", "ISEQ", "ISNE", "ISGT", "ISLT", "ISLE", "ISGE",
    ] {
        for d in DOMAINS {
            push(
                format!("GxB_{}_{}", op, d.symbol_token()),
                OpKind::BinaryOp,
                d,
                d,
            );
        }
    }
    for op in ["EQ", "NE", "GT", "LT", "GE", "LE"] {
        for d in DOMAINS {
            push(
                format!("GrB_{}_{}", op, d.symbol_token()),
                OpKind::BinaryOp,
                d,
                Domain::Bool,
            );
        }
    }
    for op in ["LOR", "LAND", "LXOR"] {
        for d in DOMAINS {
            push(
                format!("GxB_{}_{}", op, d.symbol_token()),
                OpKind::BinaryOp,
                d,
                Domain::Bool,
            );
        }
    }

    // Monoid: numeric reductions plus the boolean monoids
    for op in ["MAX", "MIN", "PLUS", "TIMES", "ANY"] {
        for d in numeric_domains() {
            push(
                format!("GxB_{}_{}_MONOID", op, d.symbol_token()),
                OpKind::Monoid,
                d,
                d,
            );
        }
    }
    for op in ["EQ", "LAND", "LOR", "LXOR", "ANY"] {
        push(
            format!("GxB_{}_BOOL_MONOID", op),
            OpKind::Monoid,
            Domain::Bool,
            Domain::Bool,
        );
    }

    // Semiring: numeric add/mul grid, boolean grid, comparison grid
    for add in ["MIN", "MAX", "PLUS", "TIMES", "ANY"] {
        for mul in [
            "FIRST", "SECOND", "PAIR", "MIN", "MAX", "PLUS", "MINUS", "RMINUS", "TIMES", "DIV",
            "RDIV", "ISEQ", "ISNE", "ISGT", "ISLT", "ISGE", "ISLE", "LOR", "LAND", "LXOR",
        ] {
            for d in numeric_domains() {
                push(
                    format!("GxB_{}_{}_{}", add, mul, d.symbol_token()),
                    OpKind::Semiring,
                    d,
                    d,
                );
            }
        }
    }
    for add in ["LOR", "LAND", "LXOR", "EQ", "ANY"] {
        for mul in [
            "FIRST", "SECOND", "PAIR", "LOR", "LAND", "LXOR", "EQ", "GT", "LT", "GE", "LE",
        ] {
            push(
                format!("GxB_{}_{}_BOOL", add, mul),
                OpKind::Semiring,
                Domain::Bool,
                Domain::Bool,
            );
        }
    }
    for add in ["LOR", "LAND", "LXOR", "EQ", "ANY"] {
        for mul in ["EQ", "NE", "GT", "LT", "GE", "LE"] {
            for d in numeric_domains() {
                push(
                    format!("GxB_{}_{}_{}", add, mul, d.symbol_token()),
                    OpKind::Semiring,
                    d,
                    Domain::Bool,
                );
            }
        }
    }

    out
}

//! Property-based tests for type resolution and assignability.

#[path = "../integration/common/mod.rs"]
mod common;

use common::*;
use proptest::prelude::*;

use jmmc::parser::ast::{BinOp, Expr, TypeExpr};
use jmmc::typeck::env::{MethodInfo, SymbolTable};
use jmmc::typeck::infer::infer_binop;
use jmmc::typeck::{JmmType, is_assignable, resolve};

fn table() -> SymbolTable {
    SymbolTable::new("Env")
        .with_import("io")
        .with_import("lib.Widget")
        .with_field("w", TypeExpr::named("Widget"))
        .with_method(
            MethodInfo::new("m", int())
                .param("n", int())
                .local("ok", boolean())
                .local("xs", array(int())),
        )
}

fn scalar() -> impl Strategy<Value = JmmType> {
    prop_oneof![
        Just(JmmType::Int),
        Just(JmmType::Boolean),
        Just(JmmType::String),
        Just(JmmType::Vararg),
        Just(JmmType::Class("Env".into())),
        Just(JmmType::Class("Other".into())),
        Just(JmmType::Opaque("Widget".into())),
    ]
}

fn resolved_type() -> impl Strategy<Value = JmmType> {
    prop_oneof![
        3 => scalar(),
        2 => scalar().prop_map(JmmType::array_of),
        1 => Just(JmmType::EmptyArray),
    ]
}

fn any_expr() -> impl Strategy<Value = Expr> {
    let leaf = prop_oneof![
        any::<i32>().prop_map(lit),
        any::<bool>().prop_map(boolean_lit),
        prop::sample::select(vec!["n", "ok", "xs", "w", "io", "Env", "ghost"]).prop_map(id),
        Just(Expr::This),
    ];
    leaf.prop_recursive(4, 20, 3, |inner| {
        prop_oneof![
            (
                prop::sample::select(vec![BinOp::Add, BinOp::Sub, BinOp::Mul, BinOp::Div, BinOp::Lt, BinOp::And]),
                inner.clone(),
                inner.clone()
            )
                .prop_map(|(op, l, r)| bin(op, l, r)),
            inner.clone().prop_map(not),
            inner.clone().prop_map(paren),
            (inner.clone(), inner.clone()).prop_map(|(a, i)| index(a, i)),
            inner.clone().prop_map(length),
            prop::collection::vec(inner.clone(), 0..3).prop_map(array_lit),
            (inner, prop::sample::select(vec!["m", "go"])).prop_map(|(o, name)| call(o, name, vec![])),
        ]
    })
}

proptest! {
    /// Property: resolution is a pure function of the expression and table
    #[test]
    fn resolution_is_deterministic(expr in any_expr()) {
        let t = table();
        prop_assert_eq!(resolve(&expr, &t, Some("m")), resolve(&expr, &t, Some("m")));
    }

    /// Property: parentheses never change a type
    #[test]
    fn parentheses_are_transparent(expr in any_expr()) {
        let t = table();
        prop_assert_eq!(resolve(&paren(expr.clone()), &t, Some("m")), resolve(&expr, &t, Some("m")));
    }

    /// Property: arithmetic yields int or nothing, comparisons and `&&` yield boolean or nothing
    #[test]
    fn operator_results(l in resolved_type(), r in resolved_type()) {
        for op in [BinOp::Add, BinOp::Sub, BinOp::Mul, BinOp::Div] {
            let t = infer_binop(op, &l, &r);
            prop_assert!(t == JmmType::Int || t.is_unresolved());
        }
        for op in [BinOp::Lt, BinOp::And] {
            let t = infer_binop(op, &l, &r);
            prop_assert!(t == JmmType::Boolean || t.is_unresolved());
        }
        prop_assert!(infer_binop(BinOp::Add, &l, &JmmType::Unresolved).is_unresolved());
    }

    /// Property: every resolved type is assignable to itself
    #[test]
    fn assignability_is_reflexive(t in resolved_type()) {
        prop_assert!(is_assignable(&t, &t));
    }

    /// Property: assignability does not depend on direction
    #[test]
    fn assignability_is_symmetric(a in resolved_type(), b in resolved_type()) {
        prop_assert_eq!(is_assignable(&a, &b), is_assignable(&b, &a));
    }

    /// Property: arrays and scalars never mix, and unresolved matches nothing
    #[test]
    fn arrays_and_scalars_do_not_mix(s in scalar(), a in resolved_type()) {
        if a.is_array() {
            prop_assert!(!is_assignable(&s, &a));
        }
        prop_assert!(!is_assignable(&JmmType::Unresolved, &a));
        prop_assert!(!is_assignable(&a, &JmmType::Unresolved));
    }

    /// Property: an empty literal fits any array
    #[test]
    fn empty_literal_fits_any_array(s in scalar()) {
        prop_assert!(is_assignable(&JmmType::EmptyArray, &JmmType::array_of(s)));
    }

    /// Property: a literal of ints is an int array
    #[test]
    fn int_literals_make_int_arrays(values in prop::collection::vec(any::<i32>(), 1..8)) {
        let expr = array_lit(values.into_iter().map(lit).collect());
        prop_assert_eq!(resolve(&expr, &table(), Some("m")), JmmType::array_of(JmmType::Int));
    }
}

mod common;
use common::*;

use jmmc::parser::ast::{BinOp, Expr, TypeExpr};
use jmmc::typeck::env::{MethodInfo, SymbolTable};
use jmmc::typeck::{IdentKind, JmmType, classify_ident, is_assignable, resolve};

fn table() -> SymbolTable {
    SymbolTable::new("Zoo")
        .with_import("io")
        .with_import("java.util.Scanner")
        .with_superclass("Scanner")
        .with_field("size", int())
        .with_field("open", boolean())
        .with_method(
            MethodInfo::new("feed", int())
                .param("amount", int())
                .param("open", int())
                .local("size", boolean())
                .local("cages", array(int()))
                .local("s", TypeExpr::named("Scanner")),
        )
        .with_method(MethodInfo::new("keeper", TypeExpr::named("Zoo")))
        .with_method(MethodInfo::new("counts", array(int())).varargs("xs"))
}

fn ty(expr: &Expr) -> JmmType {
    resolve(expr, &table(), Some("feed"))
}

fn int_array() -> JmmType {
    JmmType::array_of(JmmType::Int)
}

#[test]
fn identifier_precedence() {
    let t = table();
    assert_eq!(classify_ident("Zoo", &t, Some("feed")), IdentKind::ClassSelf);
    assert_eq!(classify_ident("Scanner", &t, Some("feed")), IdentKind::Import("Scanner".into()));
    assert_eq!(classify_ident("java.util.Scanner", &t, None), IdentKind::Import("Scanner".into()));
    assert_eq!(classify_ident("size", &t, Some("feed")), IdentKind::Local(JmmType::Boolean));
    assert_eq!(classify_ident("open", &t, Some("feed")), IdentKind::Param(JmmType::Int));
    assert_eq!(classify_ident("size", &t, Some("keeper")), IdentKind::Field(JmmType::Int));
    assert_eq!(classify_ident("nothing", &t, Some("feed")), IdentKind::Unknown);
    assert!(classify_ident("io", &t, None).is_static_qualifier());
    assert!(!classify_ident("cages", &t, Some("feed")).is_static_qualifier());
}

#[test]
fn partial_import_names_do_not_match() {
    let t = table();
    assert_eq!(classify_ident("Scan", &t, None), IdentKind::Unknown);
    assert_eq!(classify_ident("util", &t, None), IdentKind::Unknown);
}

#[test]
fn scalar_expressions() {
    assert_eq!(ty(&lit(1)), JmmType::Int);
    assert_eq!(ty(&boolean_lit(true)), JmmType::Boolean);
    assert_eq!(ty(&Expr::This), JmmType::Class("Zoo".into()));
    assert_eq!(ty(&bin(BinOp::Mul, id("amount"), paren(lit(3)))), JmmType::Int);
    assert_eq!(ty(&lt(id("amount"), id("open"))), JmmType::Boolean);
    assert_eq!(ty(&bin(BinOp::And, id("size"), not(id("size")))), JmmType::Boolean);
}

#[test]
fn ill_typed_operators_are_unresolved() {
    assert_eq!(ty(&add(id("size"), lit(1))), JmmType::Unresolved);
    assert_eq!(ty(&bin(BinOp::And, lit(1), boolean_lit(true))), JmmType::Unresolved);
    assert_eq!(ty(&not(lit(0))), JmmType::Unresolved);
    assert_eq!(ty(&add(id("cages"), lit(1))), JmmType::Unresolved);
    assert_eq!(ty(&id("ghost")), JmmType::Unresolved);
}

#[test]
fn opaque_operands_pass_through() {
    assert_eq!(ty(&add(id("s"), lit(1))), JmmType::Int);
    assert_eq!(ty(&not(id("s"))), JmmType::Boolean);
    assert_eq!(ty(&call(id("s"), "nextInt", vec![])), JmmType::Opaque("Scanner".into()));
    assert_eq!(ty(&index(id("s"), lit(0))), JmmType::Opaque("Scanner".into()));
    assert_eq!(ty(&length(id("s"))), JmmType::Int);
}

#[test]
fn arrays() {
    assert_eq!(ty(&id("cages")), int_array());
    assert_eq!(ty(&index(id("cages"), lit(0))), JmmType::Int);
    assert_eq!(ty(&index(id("cages"), boolean_lit(true))), JmmType::Unresolved);
    assert_eq!(ty(&index(id("amount"), lit(0))), JmmType::Unresolved);
    assert_eq!(ty(&length(id("cages"))), JmmType::Int);
    assert_eq!(ty(&new_array(int(), lit(4))), int_array());
    assert_eq!(ty(&array_lit(vec![lit(1), id("amount")])), int_array());
    assert_eq!(ty(&array_lit(vec![lit(1), boolean_lit(true)])), JmmType::Unresolved);
    assert_eq!(ty(&array_lit(vec![])), JmmType::EmptyArray);
}

#[test]
fn objects_and_calls() {
    assert_eq!(ty(&new_object("Zoo")), JmmType::Class("Zoo".into()));
    assert_eq!(ty(&new_object("Scanner")), JmmType::Opaque("Scanner".into()));
    assert_eq!(ty(&new_object("Elephant")), JmmType::Unresolved);
    assert_eq!(ty(&plain_call("keeper", vec![])), JmmType::Class("Zoo".into()));
    assert_eq!(ty(&call(Expr::This, "counts", vec![lit(1)])), int_array());
    assert_eq!(ty(&call(id("io"), "println", vec![])), JmmType::Opaque("io".into()));
    // Unknown methods on the class itself come from the imported superclass.
    assert_eq!(ty(&plain_call("nextLine", vec![])), JmmType::Opaque("Scanner".into()));
    assert_eq!(ty(&call(id("amount"), "foo", vec![])), JmmType::Unresolved);
}

#[test]
fn unknown_method_without_imported_superclass() {
    let t = SymbolTable::new("Plain").with_method(MethodInfo::new("f", int()));
    assert_eq!(resolve(&plain_call("g", vec![]), &t, Some("f")), JmmType::Unresolved);
}

#[test]
fn vararg_parameter_is_an_int_array() {
    let t = table();
    let xs = resolve(&id("xs"), &t, Some("counts"));
    assert!(xs.is_array());
    assert_eq!(resolve(&index(id("xs"), lit(0)), &t, Some("counts")), JmmType::Int);
    assert!(is_assignable(&xs, &int_array()));
    assert!(is_assignable(&int_array(), &xs));
}

#[test]
fn assignability() {
    let zoo = JmmType::Class("Zoo".into());
    let scanner = JmmType::Opaque("Scanner".into());
    assert!(is_assignable(&JmmType::Int, &JmmType::Int));
    assert!(!is_assignable(&JmmType::Int, &JmmType::Boolean));
    assert!(is_assignable(&zoo, &zoo));
    assert!(is_assignable(&scanner, &JmmType::Int));
    assert!(is_assignable(&zoo, &scanner));
    assert!(!is_assignable(&JmmType::Int, &int_array()));
    assert!(!is_assignable(&int_array(), &JmmType::array_of(JmmType::Boolean)));
    assert!(is_assignable(&JmmType::EmptyArray, &JmmType::array_of(JmmType::Boolean)));
    assert!(!is_assignable(&JmmType::EmptyArray, &JmmType::Int));
    assert!(!is_assignable(&JmmType::Unresolved, &JmmType::Unresolved));
    assert!(!is_assignable(&JmmType::Unresolved, &scanner));
}

mod common;
use common::*;

use jmmc::config::BackendConfig;
use jmmc::parser::ast::BinOp;
use jmmc::typeck::env::{MethodInfo, SymbolTable};

fn table() -> SymbolTable {
    SymbolTable::new("Expr")
        .with_import("io")
        .with_field("count", int())
        .with_method(
            MethodInfo::new("calc", int())
                .param("a", int())
                .param("b", int())
                .local("flag", boolean())
                .local("xs", array(int()))
                .local("r", int()),
        )
}

fn calc(stmts: Vec<jmmc::parser::ast::Stmt>) -> (String, Vec<String>) {
    let listing = emit(unit(table(), vec![("calc", stmts)]));
    let code = body(&listing, "calc");
    assert_limits_sound(&listing, "calc");
    (listing, code)
}

#[test]
fn integer_constants_use_shortest_form() {
    for (value, expected) in [
        (0, "iconst_0"),
        (5, "iconst_5"),
        (-1, "bipush -1"),
        (100, "bipush 100"),
        (1000, "sipush 1000"),
        (-40000, "ldc -40000"),
        (70000, "ldc 70000"),
    ] {
        let (_, code) = calc(vec![ret(lit(value))]);
        assert_eq!(code, [expected, "ireturn"], "constant {value}");
    }
}

#[test]
fn booleans_are_zero_and_one() {
    let (_, code) = calc(vec![assign("flag", boolean_lit(true)), assign("flag", boolean_lit(false)), ret(lit(0))]);
    assert_eq!(code, ["iconst_1", "istore_3", "iconst_0", "istore_3", "iconst_0", "ireturn"]);
}

#[test]
fn arithmetic_operators() {
    for (op, instr) in [(BinOp::Add, "iadd"), (BinOp::Sub, "isub"), (BinOp::Mul, "imul"), (BinOp::Div, "idiv")] {
        let (listing, code) = calc(vec![ret(bin(op, id("a"), id("b")))]);
        assert_eq!(code, ["iload_1", "iload_2", instr, "ireturn"]);
        assert_eq!(limits(&listing, "calc"), (2, 6));
    }
}

#[test]
fn nested_arithmetic_depth() {
    // a * (b - (a / b))
    let e = bin(BinOp::Mul, id("a"), paren(bin(BinOp::Sub, id("b"), paren(bin(BinOp::Div, id("a"), id("b"))))));
    let (listing, code) = calc(vec![ret(e)]);
    assert_eq!(code, ["iload_1", "iload_2", "iload_1", "iload_2", "idiv", "isub", "imul", "ireturn"]);
    assert_eq!(limits(&listing, "calc").0, 4);
}

#[test]
fn literal_sum_folds_through_parentheses() {
    let (_, code) = calc(vec![ret(add(paren(lit(100)), lit(27)))]);
    assert_eq!(code, ["bipush 127", "ireturn"]);
}

#[test]
fn mixed_sum_is_not_folded() {
    let (_, code) = calc(vec![ret(add(lit(1), add(lit(2), id("a"))))]);
    assert_eq!(code, ["iconst_1", "iconst_2", "iload_1", "iadd", "iadd", "ireturn"]);
}

#[test]
fn folding_wraps_on_overflow() {
    let (_, code) = calc(vec![ret(add(lit(i32::MAX), lit(1)))]);
    assert_eq!(code, ["ldc -2147483648", "ireturn"]);
}

#[test]
fn less_than_materializes_boolean() {
    let (listing, code) = calc(vec![assign("flag", lt(id("a"), id("b"))), ret(lit(0))]);
    assert_eq!(
        code,
        [
            "iload_1",
            "iload_2",
            "isub",
            "iflt cmp_label_true_0",
            "iconst_0",
            "goto cmp_label_end_0",
            "cmp_label_true_0:",
            "iconst_1",
            "cmp_label_end_0:",
            "istore_3",
            "iconst_0",
            "ireturn",
        ]
    );
    assert_eq!(simulate(&code), 2);
    assert_eq!(limits(&listing, "calc").0, 2);
}

#[test]
fn logical_and_and_not() {
    let e = bin(BinOp::And, not(id("flag")), lt(lit(1), id("a")));
    let (_, code) = calc(vec![assign("flag", e), ret(lit(0))]);
    assert_eq!(
        code[..6],
        ["iload_3", "iconst_1", "ixor", "iconst_1", "iload_1", "isub"]
    );
    assert!(code.contains(&"iand".to_string()));
}

#[test]
fn field_read_goes_through_this() {
    let (listing, code) = calc(vec![ret(add(id("count"), id("a")))]);
    assert_eq!(code, ["aload_0", "getfield Expr/count I", "iload_1", "iadd", "ireturn"]);
    assert_eq!(limits(&listing, "calc").0, 2);
}

#[test]
fn array_literal_layout() {
    let (listing, code) = calc(vec![assign("xs", array_lit(vec![lit(10), lit(20), lit(30)])), ret(lit(0))]);
    assert_eq!(
        code,
        [
            "bipush 10",
            "bipush 20",
            "bipush 30",
            "iconst_3",
            "newarray int",
            "astore 6",
            "istore 7",
            "aload 6",
            "iconst_2",
            "iload 7",
            "iastore",
            "istore 7",
            "aload 6",
            "iconst_1",
            "iload 7",
            "iastore",
            "istore 7",
            "aload 6",
            "iconst_0",
            "iload 7",
            "iastore",
            "aload 6",
            "astore 4",
            "iconst_0",
            "ireturn",
        ]
    );
    // Two pending elements plus array, index and value at the first store.
    assert_eq!(limits(&listing, "calc"), (5, 8));
}

#[test]
fn empty_array_literal() {
    let (listing, code) = calc(vec![assign("xs", array_lit(vec![])), ret(lit(0))]);
    assert_eq!(code, ["iconst_0", "newarray int", "astore 6", "aload 6", "astore 4", "iconst_0", "ireturn"]);
    assert_eq!(limits(&listing, "calc"), (1, 8));
}

#[test]
fn two_array_literals_take_distinct_temporaries() {
    let (listing, code) = calc(vec![
        assign("xs", array_lit(vec![lit(1)])),
        assign("xs", array_lit(vec![lit(2)])),
        ret(lit(0)),
    ]);
    assert!(code.contains(&"astore 6".to_string()));
    assert!(code.contains(&"astore 8".to_string()));
    assert_eq!(limits(&listing, "calc").1, 10);
}

#[test]
fn new_int_array_and_access() {
    let (_, code) = calc(vec![
        assign("xs", new_array(int(), add(id("a"), lit(1)))),
        index_assign(id("xs"), lit(0), id("b")),
        ret(add(index(id("xs"), lit(0)), length(id("xs")))),
    ]);
    assert_eq!(
        code,
        [
            "iload_1",
            "iconst_1",
            "iadd",
            "newarray int",
            "astore 4",
            "aload 4",
            "iconst_0",
            "iload_2",
            "iastore",
            "aload 4",
            "iconst_0",
            "iaload",
            "aload 4",
            "arraylength",
            "iadd",
            "ireturn",
        ]
    );
}

#[test]
fn object_allocation() {
    let (listing, code) = calc(vec![expr_stmt(new_object("Expr")), ret(lit(0))]);
    assert_eq!(code, ["new Expr", "dup", "invokespecial Expr/<init>()V", "pop", "iconst_0", "ireturn"]);
    assert_eq!(limits(&listing, "calc").0, 2);
}

#[test]
fn expression_statement_value_is_discarded() {
    let (_, code) = calc(vec![expr_stmt(add(id("a"), id("b"))), ret(lit(0))]);
    assert_eq!(code, ["iload_1", "iload_2", "iadd", "pop", "iconst_0", "ireturn"]);
}

#[test]
fn folding_disabled_by_config() {
    let mut config = BackendConfig::default();
    config.optimize.fold_constants = false;
    let listing = emit_with(unit(table(), vec![("calc", vec![ret(add(lit(1), lit(2)))])]), config);
    assert_eq!(body(&listing, "calc"), ["iconst_1", "iconst_2", "iadd", "ireturn"]);
}

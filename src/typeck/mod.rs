pub mod env;
pub mod infer;
pub mod types;

pub use env::SymbolTable;
pub use infer::{IdentKind, classify_ident, infer_expr};
pub use types::{JmmType, is_assignable};

use crate::parser::ast::Expr;

/// Static type of `expr` as seen from `method`.
///
/// `Unresolved` is a value here, not an error; codegen turns it into one
/// only when a decision depends on it.
pub fn resolve(expr: &Expr, table: &SymbolTable, method: Option<&str>) -> JmmType {
    infer_expr(expr, table, method)
}

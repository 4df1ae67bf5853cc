use crate::parser::ast::*;
use crate::span::Spanned;
use super::env::{MethodInfo, SymbolTable};
use super::types::JmmType;

/// What a bare identifier denotes, in resolution precedence order.
#[derive(Debug, Clone, PartialEq)]
pub enum IdentKind {
    /// The enclosing class's own name, used as a static qualifier.
    ClassSelf,
    /// An imported class name, used as a static qualifier.
    Import(String),
    Local(JmmType),
    Param(JmmType),
    Field(JmmType),
    Unknown,
}

impl IdentKind {
    /// Static qualifiers name a class, not a value; they put nothing on the stack.
    pub fn is_static_qualifier(&self) -> bool {
        matches!(self, IdentKind::ClassSelf | IdentKind::Import(_))
    }
}

/// Classify `name` as seen from `method` (or from any method when `None`).
/// First match wins: class name, import, local, parameter, field.
pub fn classify_ident(name: &str, table: &SymbolTable, method: Option<&str>) -> IdentKind {
    if name == table.class_name {
        return IdentKind::ClassSelf;
    }
    if let Some(import) = table.import(name) {
        return IdentKind::Import(import.binding_name().to_string());
    }
    let scoped: Vec<&MethodInfo> = match method {
        Some(m) => table.method(m).into_iter().collect(),
        None => table.methods.iter().collect(),
    };
    for m in &scoped {
        if let Some(local) = m.locals.iter().find(|l| l.name == name) {
            return IdentKind::Local(table.resolve_type_expr(&local.ty));
        }
    }
    for m in &scoped {
        if let Some(param) = m.params.iter().find(|p| p.name == name) {
            return IdentKind::Param(table.resolve_type_expr(&param.ty));
        }
    }
    if let Some(field) = table.field(name) {
        return IdentKind::Field(table.resolve_type_expr(&field.ty));
    }
    IdentKind::Unknown
}

/// Static type of `expr` inside `method`. Pure: no table or tree mutation.
pub fn infer_expr(expr: &Expr, table: &SymbolTable, method: Option<&str>) -> JmmType {
    match expr {
        Expr::IntLit(_) => JmmType::Int,
        Expr::BoolLit(_) => JmmType::Boolean,
        Expr::This => JmmType::Class(table.class_name.clone()),
        Expr::Paren { inner } => infer_expr(&inner.node, table, method),
        Expr::Ident(name) => match classify_ident(name, table, method) {
            IdentKind::ClassSelf => JmmType::Class(table.class_name.clone()),
            IdentKind::Import(binding) => JmmType::Opaque(binding),
            IdentKind::Local(t) | IdentKind::Param(t) | IdentKind::Field(t) => t,
            IdentKind::Unknown => JmmType::Unresolved,
        },
        Expr::BinOp { op, lhs, rhs } => {
            let l = infer_expr(&lhs.node, table, method);
            let r = infer_expr(&rhs.node, table, method);
            infer_binop(*op, &l, &r)
        }
        Expr::Not { operand } => {
            let t = infer_expr(&operand.node, table, method);
            if t.is_boolean() || t.is_opaque() {
                JmmType::Boolean
            } else {
                JmmType::Unresolved
            }
        }
        Expr::ArrayLit { elements } => infer_array_lit(elements, table, method),
        Expr::Index { object, index } => {
            let arr = infer_expr(&object.node, table, method);
            let idx = infer_expr(&index.node, table, method);
            if (arr.is_array() || arr.is_opaque()) && accepts(&idx, Want::Int) {
                arr.element()
            } else {
                JmmType::Unresolved
            }
        }
        Expr::NewArray { elem, size } => {
            let size_ty = infer_expr(&size.node, table, method);
            if accepts(&size_ty, Want::Int) {
                table.resolve_type_expr(elem).as_array()
            } else {
                JmmType::Unresolved
            }
        }
        Expr::Length { object } => {
            let t = infer_expr(&object.node, table, method);
            if t.is_array() || t.is_opaque() {
                JmmType::Int
            } else {
                JmmType::Unresolved
            }
        }
        Expr::NewObject { class } => {
            if class.node == table.class_name {
                JmmType::Class(class.node.clone())
            } else if let Some(import) = table.import(&class.node) {
                JmmType::Opaque(import.binding_name().to_string())
            } else {
                JmmType::Unresolved
            }
        }
        Expr::MethodCall { object, method: name, .. } => {
            let recv = infer_expr(&object.node, table, method);
            call_result(table, &recv, &name.node)
        }
        Expr::Call { name, .. } => {
            call_result(table, &JmmType::Class(table.class_name.clone()), &name.node)
        }
    }
}

#[derive(Clone, Copy)]
enum Want {
    Int,
    Boolean,
}

/// Scalar of the wanted kind, or an opaque operand that passes through.
fn accepts(t: &JmmType, want: Want) -> bool {
    if t.is_opaque() {
        return true;
    }
    if t.is_array() {
        return false;
    }
    match want {
        Want::Int => t.is_int(),
        Want::Boolean => t.is_boolean(),
    }
}

pub fn infer_binop(op: BinOp, lhs: &JmmType, rhs: &JmmType) -> JmmType {
    match op {
        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => {
            if accepts(lhs, Want::Int) && accepts(rhs, Want::Int) {
                JmmType::Int
            } else {
                JmmType::Unresolved
            }
        }
        BinOp::Lt => {
            if accepts(lhs, Want::Int) && accepts(rhs, Want::Int) {
                JmmType::Boolean
            } else {
                JmmType::Unresolved
            }
        }
        BinOp::And => {
            if accepts(lhs, Want::Boolean) && accepts(rhs, Want::Boolean) {
                JmmType::Boolean
            } else {
                JmmType::Unresolved
            }
        }
    }
}

fn infer_array_lit(elements: &[Spanned<Expr>], table: &SymbolTable, method: Option<&str>) -> JmmType {
    let Some(first) = elements.first() else {
        return JmmType::EmptyArray;
    };
    let first_ty = infer_expr(&first.node, table, method);
    if first_ty.is_unresolved() {
        return JmmType::Unresolved;
    }
    for elem in &elements[1..] {
        let t = infer_expr(&elem.node, table, method);
        if t != first_ty && !t.is_array() && !t.is_opaque() {
            return JmmType::Unresolved;
        }
    }
    first_ty.as_array()
}

/// Result type of calling `name` on a receiver of static type `recv`.
pub fn call_result(table: &SymbolTable, recv: &JmmType, name: &str) -> JmmType {
    match recv {
        JmmType::Class(class) if *class == table.class_name => match table.return_type(name) {
            Some(t) => t,
            None => inherited_call_result(table),
        },
        JmmType::Opaque(binding) => JmmType::Opaque(binding.clone()),
        _ => JmmType::Unresolved,
    }
}

/// A method the table does not know may still come from an imported superclass.
fn inherited_call_result(table: &SymbolTable) -> JmmType {
    match &table.superclass {
        Some(sup) if table.extends_import() => table.resolve_type_expr(&TypeExpr::Named(sup.clone())),
        _ => JmmType::Unresolved,
    }
}

/// The table's declaration for a call, when the receiver is the class itself.
pub fn known_callee<'t>(
    table: &'t SymbolTable,
    recv: &JmmType,
    name: &str,
) -> Option<&'t MethodInfo> {
    match recv {
        JmmType::Class(class) if *class == table.class_name => table.method(name),
        _ => None,
    }
}

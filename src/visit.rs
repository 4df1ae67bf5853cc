//! Read-only syntax tree traversal.
//!
//! Implement [`Visitor`] for an analysis pass, overriding only the methods
//! you need, and call the matching `walk_*` function inside an override to
//! keep the default recursion. Omit the walk call to prune traversal at that
//! node.
//!
//! Lowering itself does not use this: nearly every arm there has custom
//! logic, so it matches on the tree directly.

use crate::parser::ast::*;
use crate::span::Spanned;

pub trait Visitor: Sized {
    fn visit_method(&mut self, method: &Spanned<MethodDecl>) {
        walk_method(self, method);
    }

    fn visit_block(&mut self, block: &Block) {
        walk_block(self, block);
    }

    fn visit_stmt(&mut self, stmt: &Spanned<Stmt>) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Spanned<Expr>) {
        walk_expr(self, expr);
    }
}

pub fn walk_method<V: Visitor>(v: &mut V, method: &Spanned<MethodDecl>) {
    v.visit_block(&method.node.body.node);
}

pub fn walk_block<V: Visitor>(v: &mut V, block: &Block) {
    for stmt in &block.stmts {
        v.visit_stmt(stmt);
    }
}

pub fn walk_stmt<V: Visitor>(v: &mut V, stmt: &Spanned<Stmt>) {
    match &stmt.node {
        Stmt::Assign { value, .. } => v.visit_expr(value),
        Stmt::IndexAssign { object, index, value } => {
            v.visit_expr(object);
            v.visit_expr(index);
            v.visit_expr(value);
        }
        Stmt::Return(value) => {
            if let Some(value) = value {
                v.visit_expr(value);
            }
        }
        Stmt::If { condition, then_branch, else_branch } => {
            v.visit_expr(condition);
            v.visit_stmt(then_branch);
            if let Some(else_branch) = else_branch {
                v.visit_stmt(else_branch);
            }
        }
        Stmt::While { condition, body } => {
            v.visit_expr(condition);
            v.visit_stmt(body);
        }
        Stmt::Block(block) => v.visit_block(block),
        Stmt::Expr(expr) => v.visit_expr(expr),
    }
}

pub fn walk_expr<V: Visitor>(v: &mut V, expr: &Spanned<Expr>) {
    match &expr.node {
        Expr::IntLit(_) | Expr::BoolLit(_) | Expr::Ident(_) | Expr::This | Expr::NewObject { .. } => {}
        Expr::BinOp { lhs, rhs, .. } => {
            v.visit_expr(lhs);
            v.visit_expr(rhs);
        }
        Expr::Not { operand } => v.visit_expr(operand),
        Expr::Paren { inner } => v.visit_expr(inner),
        Expr::ArrayLit { elements } => {
            for elem in elements {
                v.visit_expr(elem);
            }
        }
        Expr::NewArray { size, .. } => v.visit_expr(size),
        Expr::Index { object, index } => {
            v.visit_expr(object);
            v.visit_expr(index);
        }
        Expr::Length { object } => v.visit_expr(object),
        Expr::MethodCall { object, args, .. } => {
            v.visit_expr(object);
            for arg in args {
                v.visit_expr(arg);
            }
        }
        Expr::Call { args, .. } => {
            for arg in args {
                v.visit_expr(arg);
            }
        }
    }
}

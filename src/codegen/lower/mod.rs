mod expr;

use tracing::trace;

use crate::config::BackendConfig;
use crate::diagnostics::CompileError;
use crate::parser::ast::*;
use crate::span::{Span, Spanned};
use crate::typeck::env::{MethodInfo, SymbolTable};
use crate::typeck::infer::{IdentKind, classify_ident, known_callee};
use crate::typeck::resolve;
use crate::typeck::types::JmmType;
use crate::visit::{Visitor, walk_expr};

use super::instr::{ElemKind, Instr, ReturnKind, return_kind, type_descriptor};
use super::registers::RegisterMap;
use super::stack::StackDepth;

/// Hands out label ids for one class. Ids are never repeated within a class.
#[derive(Debug, Default)]
pub struct LabelAllocator {
    next: u32,
}

impl LabelAllocator {
    pub fn fresh(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        trace!(id, "allocated label id");
        id
    }
}

/// How the enclosing construct uses an expression's value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Usage {
    /// Statement position: a produced value is popped.
    Discard,
    /// The value stays on the stack, optionally with the type the consumer expects.
    Consume(Option<JmmType>),
}

impl Usage {
    fn expecting(ty: JmmType) -> Self {
        Usage::Consume(Some(ty))
    }

    fn any_value() -> Self {
        Usage::Consume(None)
    }

    fn expected(&self) -> Option<&JmmType> {
        match self {
            Usage::Consume(ty) => ty.as_ref(),
            Usage::Discard => None,
        }
    }
}

/// A method body ready to be written out.
#[derive(Debug, Clone)]
pub struct LoweredMethod {
    pub code: Vec<Instr>,
    pub max_stack: u32,
    pub max_locals: u16,
}

struct LowerContext<'a> {
    table: &'a SymbolTable,
    method: &'a MethodInfo,
    config: &'a BackendConfig,
    labels: &'a mut LabelAllocator,
    registers: RegisterMap,
    stack: StackDepth,
    code: Vec<Instr>,
}

impl<'a> LowerContext<'a> {
    fn emit(&mut self, instr: Instr) {
        self.stack.apply(&instr);
        self.code.push(instr);
    }

    fn resolve(&self, expr: &Expr) -> JmmType {
        resolve(expr, self.table, Some(&self.method.name))
    }

    fn classify(&self, name: &str) -> IdentKind {
        classify_ident(name, self.table, Some(&self.method.name))
    }

    fn descriptor(
        &self,
        ty: &JmmType,
        what: impl FnOnce() -> String,
        span: Span,
    ) -> Result<String, CompileError> {
        type_descriptor(ty, self.table).ok_or_else(|| CompileError::unresolved(what(), span))
    }

    fn slot(&self, name: &str, span: Span) -> Result<u16, CompileError> {
        self.registers
            .slot(name)
            .ok_or_else(|| CompileError::unresolved(format!("variable '{name}' has no register"), span))
    }

    fn lower_block(&mut self, block: &Block) -> Result<(), CompileError> {
        for stmt in &block.stmts {
            self.lower_stmt(stmt)?;
        }
        Ok(())
    }

    fn lower_stmt(&mut self, stmt: &Spanned<Stmt>) -> Result<(), CompileError> {
        match &stmt.node {
            Stmt::Assign { target, value } => self.lower_assign(target, value),
            Stmt::IndexAssign { object, index, value } => self.lower_index_assign(object, index, value),
            Stmt::Return(value) => self.lower_return(value.as_ref(), stmt.span),
            Stmt::If { condition, then_branch, else_branch } => {
                self.lower_if(condition, then_branch, else_branch.as_deref())
            }
            Stmt::While { condition, body } => self.lower_while(condition, body),
            Stmt::Block(block) => self.lower_block(block),
            Stmt::Expr(expr) => self.lower_expr(expr, &Usage::Discard),
        }
    }

    fn lower_assign(&mut self, target: &Spanned<String>, value: &Spanned<Expr>) -> Result<(), CompileError> {
        let name = &target.node;
        match self.classify(name) {
            IdentKind::Local(ty) | IdentKind::Param(ty) => {
                let slot = self.slot(name, target.span)?;
                if let Some(step) = self.increment_step(name, &ty, value) {
                    self.emit(Instr::IInc(slot, step));
                    self.emit(Instr::ILoad(slot));
                    self.emit(Instr::IStore(slot));
                    return Ok(());
                }
                let store = match &ty {
                    JmmType::Unresolved => {
                        return Err(CompileError::unresolved(format!("variable '{name}'"), target.span));
                    }
                    t if t.is_primitive() => Instr::IStore(slot),
                    _ => Instr::AStore(slot),
                };
                self.lower_expr(value, &Usage::expecting(ty))?;
                self.emit(store);
                Ok(())
            }
            IdentKind::Field(ty) => {
                let desc = self.descriptor(&ty, || format!("field '{name}'"), target.span)?;
                self.emit(Instr::ALoad(0));
                self.lower_expr(value, &Usage::expecting(ty))?;
                self.emit(Instr::PutField {
                    owner: self.table.class_name.clone(),
                    name: name.clone(),
                    desc,
                });
                Ok(())
            }
            IdentKind::ClassSelf | IdentKind::Import(_) | IdentKind::Unknown => {
                Err(CompileError::unresolved(format!("assignment target '{name}'"), target.span))
            }
        }
    }

    /// `x = x + c` / `x = c + x` on an int variable, with `c` fitting a signed byte.
    fn increment_step(&self, name: &str, ty: &JmmType, value: &Spanned<Expr>) -> Option<i32> {
        if !self.config.optimize.increment || *ty != JmmType::Int {
            return None;
        }
        let Expr::BinOp { op: BinOp::Add, lhs, rhs } = value.node.unparen() else {
            return None;
        };
        let step = match (lhs.node.unparen(), rhs.node.unparen()) {
            (Expr::Ident(var), Expr::IntLit(c)) | (Expr::IntLit(c), Expr::Ident(var)) if var == name => *c,
            _ => return None,
        };
        (-128..=127).contains(&step).then_some(step)
    }

    fn lower_index_assign(
        &mut self,
        object: &Spanned<Expr>,
        index: &Spanned<Expr>,
        value: &Spanned<Expr>,
    ) -> Result<(), CompileError> {
        let mut elem = self.resolve(&object.node).element();
        if elem.is_opaque() {
            elem = self.resolve(&value.node);
        }
        let kind = ElemKind::of(&elem)
            .ok_or_else(|| CompileError::unresolved("element of assigned array", object.span))?;
        self.lower_expr(object, &Usage::any_value())?;
        self.lower_expr(index, &Usage::expecting(JmmType::Int))?;
        self.lower_expr(value, &Usage::expecting(elem))?;
        self.emit(Instr::ArrayStore(kind));
        Ok(())
    }

    fn lower_return(&mut self, value: Option<&Spanned<Expr>>, span: Span) -> Result<(), CompileError> {
        let ret = self.table.resolve_type_expr(&self.method.return_type);
        match value {
            Some(value) if ret != JmmType::Void => {
                let kind = return_kind(&ret).ok_or_else(|| {
                    CompileError::unresolved(format!("return type of '{}'", self.method.name), span)
                })?;
                self.lower_expr(value, &Usage::expecting(ret))?;
                self.emit(Instr::Return(kind));
            }
            Some(value) => {
                self.lower_expr(value, &Usage::Discard)?;
                self.emit(Instr::Return(ReturnKind::Void));
            }
            None => self.emit(Instr::Return(ReturnKind::Void)),
        }
        Ok(())
    }

    fn lower_if(
        &mut self,
        condition: &Spanned<Expr>,
        then_branch: &Spanned<Stmt>,
        else_branch: Option<&Spanned<Stmt>>,
    ) -> Result<(), CompileError> {
        let id = self.labels.fresh();
        let else_label = format!("if_{id}_else");
        let end_label = format!("if_{id}_end");

        self.lower_expr(condition, &Usage::expecting(JmmType::Boolean))?;
        self.emit(Instr::IfEq(else_label.clone()));
        self.lower_stmt(then_branch)?;
        self.emit(Instr::Goto(end_label.clone()));
        self.emit(Instr::Label(else_label));
        if let Some(else_branch) = else_branch {
            self.lower_stmt(else_branch)?;
        }
        self.emit(Instr::Label(end_label));
        Ok(())
    }

    fn lower_while(&mut self, condition: &Spanned<Expr>, body: &Spanned<Stmt>) -> Result<(), CompileError> {
        let id = self.labels.fresh();
        let head_label = format!("while_{id}");
        let end_label = format!("while_{id}_end");

        self.emit(Instr::Label(head_label.clone()));
        self.lower_expr(condition, &Usage::expecting(JmmType::Boolean))?;
        self.emit(Instr::IfEq(end_label.clone()));
        self.lower_stmt(body)?;
        self.emit(Instr::Goto(head_label));
        self.emit(Instr::Label(end_label));
        Ok(())
    }
}

/// Index of the first argument that gets packed into a fresh `int[]`, or
/// `None` when the call passes its arguments through as written.
///
/// A variadic call whose trailing arguments are exactly one array-typed
/// expression hands that array over unchanged.
pub(crate) fn vararg_split(
    table: &SymbolTable,
    scope: &str,
    callee: &MethodInfo,
    args: &[Spanned<Expr>],
) -> Option<usize> {
    if !callee.is_variadic() {
        return None;
    }
    let fixed = callee.params.len() - 1;
    match args.get(fixed..)? {
        [single] if resolve(&single.node, table, Some(scope)).is_array() => None,
        _ => Some(fixed),
    }
}

/// Counts temporary slots a method body will need: two per array literal
/// and two per packed vararg call.
struct TempSlotCounter<'a> {
    table: &'a SymbolTable,
    scope: &'a str,
    slots: u16,
}

impl TempSlotCounter<'_> {
    fn count_call(&mut self, recv: &JmmType, name: &str, args: &[Spanned<Expr>]) {
        let packs = known_callee(self.table, recv, name)
            .is_some_and(|callee| vararg_split(self.table, self.scope, callee, args).is_some());
        if packs {
            self.slots += 2;
        }
    }
}

impl Visitor for TempSlotCounter<'_> {
    fn visit_expr(&mut self, expr: &Spanned<Expr>) {
        match &expr.node {
            Expr::ArrayLit { .. } => self.slots += 2,
            Expr::MethodCall { object, method, args } => {
                let recv = resolve(&object.node, self.table, Some(self.scope));
                self.count_call(&recv, &method.node, args);
            }
            Expr::Call { name, args } => {
                let recv = JmmType::Class(self.table.class_name.clone());
                self.count_call(&recv, &name.node, args);
            }
            _ => {}
        }
        walk_expr(self, expr);
    }
}

pub fn count_temp_slots(table: &SymbolTable, method: &MethodInfo, body: &Block) -> u16 {
    let mut counter = TempSlotCounter { table, scope: &method.name, slots: 0 };
    counter.visit_block(body);
    counter.slots
}

fn ends_with_return(block: &Block) -> bool {
    matches!(block.stmts.last().map(|s| &s.node), Some(Stmt::Return(_)))
}

/// Lower one method body to instructions and compute its `.limit` values.
pub fn lower_method(
    table: &SymbolTable,
    method: &MethodInfo,
    decl: &MethodDecl,
    config: &BackendConfig,
    labels: &mut LabelAllocator,
) -> Result<LoweredMethod, CompileError> {
    let registers = RegisterMap::for_method(method);
    let declared = registers.declared();
    let mut cx = LowerContext {
        table,
        method,
        config,
        labels,
        registers,
        stack: StackDepth::new(),
        code: Vec::new(),
    };

    let body = &decl.body.node;
    cx.lower_block(body)?;
    if table.resolve_type_expr(&method.return_type) == JmmType::Void && !ends_with_return(body) {
        cx.emit(Instr::Return(ReturnKind::Void));
    }

    let temps = count_temp_slots(table, method, body);
    let max_locals = cx.registers.allocated().max(declared + temps);
    Ok(LoweredMethod {
        code: cx.code,
        max_stack: cx.stack.max(),
        max_locals,
    })
}

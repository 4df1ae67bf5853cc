use crate::diagnostics::CompileError;
use crate::parser::ast::*;
use crate::span::{Span, Spanned};
use crate::typeck::env::MethodInfo;
use crate::typeck::infer::{IdentKind, known_callee};
use crate::typeck::types::JmmType;

use super::super::instr::{ElemKind, Instr, Invoke, MethodDescriptor};
use super::{LowerContext, Usage, vararg_split};

impl LowerContext<'_> {
    /// Lower `expr` and reconcile what it left on the stack with `usage`.
    pub(super) fn lower_expr(&mut self, expr: &Spanned<Expr>, usage: &Usage) -> Result<(), CompileError> {
        let produced = self.lower_value(expr, usage)?;
        match usage {
            Usage::Discard if produced => self.emit(Instr::Pop),
            Usage::Consume(_) if !produced => {
                return Err(CompileError::unsupported(
                    format!("{} used as a value", expr.node.kind_name()),
                    expr.span,
                ));
            }
            _ => {}
        }
        Ok(())
    }

    /// Returns whether a value was pushed.
    fn lower_value(&mut self, expr: &Spanned<Expr>, usage: &Usage) -> Result<bool, CompileError> {
        match &expr.node {
            Expr::IntLit(v) => self.emit(Instr::IConst(*v)),
            Expr::BoolLit(b) => self.emit(Instr::IConst(i32::from(*b))),
            Expr::This => self.emit(Instr::ALoad(0)),
            Expr::Paren { inner } => return self.lower_value(inner, usage),
            Expr::Ident(name) => return self.lower_ident(name, expr.span),
            Expr::BinOp { op, lhs, rhs } => self.lower_binop(*op, lhs, rhs)?,
            Expr::Not { operand } => {
                self.lower_expr(operand, &Usage::expecting(JmmType::Boolean))?;
                self.emit(Instr::IConst(1));
                self.emit(Instr::IXor);
            }
            Expr::ArrayLit { elements } => self.pack_int_array(elements)?,
            Expr::NewArray { elem, size } => {
                let alloc = match self.table.resolve_type_expr(elem) {
                    JmmType::Int => Instr::NewArray(ElemKind::Int),
                    JmmType::Boolean => Instr::NewArray(ElemKind::Boolean),
                    JmmType::String => Instr::ANewArray("java/lang/String".to_string()),
                    JmmType::Class(name) | JmmType::Opaque(name) => {
                        Instr::ANewArray(self.table.internal_class_name(&name))
                    }
                    other => {
                        return Err(CompileError::unsupported(format!("array of {other}"), expr.span));
                    }
                };
                self.lower_expr(size, &Usage::expecting(JmmType::Int))?;
                self.emit(alloc);
            }
            Expr::Index { object, index } => {
                let mut elem = self.resolve(&object.node).element();
                if elem.is_opaque() {
                    elem = usage.expected().cloned().unwrap_or(elem);
                }
                let kind = ElemKind::of(&elem)
                    .ok_or_else(|| CompileError::unresolved("element of indexed array", object.span))?;
                self.lower_expr(object, &Usage::any_value())?;
                self.lower_expr(index, &Usage::expecting(JmmType::Int))?;
                self.emit(Instr::ArrayLoad(kind));
            }
            Expr::Length { object } => {
                self.lower_expr(object, &Usage::any_value())?;
                self.emit(Instr::ArrayLength);
            }
            Expr::NewObject { class } => {
                if self.resolve(&expr.node).is_unresolved() {
                    return Err(CompileError::unresolved(format!("class '{}'", class.node), class.span));
                }
                let owner = self.table.internal_class_name(&class.node);
                self.emit(Instr::New(owner.clone()));
                self.emit(Instr::Dup);
                self.emit(Instr::Invoke {
                    kind: Invoke::Special,
                    owner,
                    name: "<init>".to_string(),
                    desc: MethodDescriptor::new(Vec::new(), "V"),
                });
            }
            Expr::MethodCall { object, method, args } => {
                return self.lower_member_call(expr, object, method, args, usage);
            }
            Expr::Call { name, args } => return self.lower_plain_call(expr, name, args, usage),
        }
        Ok(true)
    }

    fn lower_ident(&mut self, name: &str, span: Span) -> Result<bool, CompileError> {
        match self.classify(name) {
            IdentKind::ClassSelf | IdentKind::Import(_) => Ok(false),
            IdentKind::Local(ty) | IdentKind::Param(ty) => {
                let slot = self.slot(name, span)?;
                let load = match &ty {
                    JmmType::Unresolved => {
                        return Err(CompileError::unresolved(format!("variable '{name}'"), span));
                    }
                    t if t.is_primitive() => Instr::ILoad(slot),
                    _ => Instr::ALoad(slot),
                };
                self.emit(load);
                Ok(true)
            }
            IdentKind::Field(ty) => {
                let desc = self.descriptor(&ty, || format!("field '{name}'"), span)?;
                self.emit(Instr::ALoad(0));
                self.emit(Instr::GetField {
                    owner: self.table.class_name.clone(),
                    name: name.to_string(),
                    desc,
                });
                Ok(true)
            }
            IdentKind::Unknown => Err(CompileError::unresolved(format!("identifier '{name}'"), span)),
        }
    }

    fn lower_binop(
        &mut self,
        op: BinOp,
        lhs: &Spanned<Expr>,
        rhs: &Spanned<Expr>,
    ) -> Result<(), CompileError> {
        if op == BinOp::Add && self.config.optimize.fold_constants {
            if let (Expr::IntLit(a), Expr::IntLit(b)) = (lhs.node.unparen(), rhs.node.unparen()) {
                self.emit(Instr::IConst(a.wrapping_add(*b)));
                return Ok(());
            }
        }

        let operand = if op == BinOp::And { JmmType::Boolean } else { JmmType::Int };
        self.lower_expr(lhs, &Usage::expecting(operand.clone()))?;
        self.lower_expr(rhs, &Usage::expecting(operand))?;
        match op {
            BinOp::Add => self.emit(Instr::IAdd),
            BinOp::Sub => self.emit(Instr::ISub),
            BinOp::Mul => self.emit(Instr::IMul),
            BinOp::Div => self.emit(Instr::IDiv),
            BinOp::And => self.emit(Instr::IAnd),
            BinOp::Lt => self.lower_less_than(),
        }
        Ok(())
    }

    /// `a < b` as `a - b < 0`, materialized to 0/1.
    fn lower_less_than(&mut self) {
        let id = self.labels.fresh();
        let true_label = format!("cmp_label_true_{id}");
        let end_label = format!("cmp_label_end_{id}");

        self.emit(Instr::ISub);
        self.emit(Instr::IfLt(true_label.clone()));
        self.emit(Instr::IConst(0));
        self.emit(Instr::Goto(end_label.clone()));
        // The true branch is entered from `iflt`, before the 0 was pushed.
        self.stack.pop(1);
        self.emit(Instr::Label(true_label));
        self.emit(Instr::IConst(1));
        self.emit(Instr::Label(end_label));
    }

    /// Evaluate `elements` left to right, then store them into a fresh `int[]`
    /// held in a temporary, leaving the array reference on the stack.
    fn pack_int_array(&mut self, elements: &[Spanned<Expr>]) -> Result<(), CompileError> {
        for elem in elements {
            self.lower_expr(elem, &Usage::expecting(JmmType::Int))?;
        }
        let array = self.registers.alloc_temps(2);
        let scratch = array + 1;

        self.emit(Instr::IConst(elements.len() as i32));
        self.emit(Instr::NewArray(ElemKind::Int));
        self.emit(Instr::AStore(array));
        for i in (0..elements.len()).rev() {
            self.emit(Instr::IStore(scratch));
            self.emit(Instr::ALoad(array));
            self.emit(Instr::IConst(i as i32));
            self.emit(Instr::ILoad(scratch));
            self.emit(Instr::ArrayStore(ElemKind::Int));
        }
        self.emit(Instr::ALoad(array));
        Ok(())
    }

    fn lower_member_call(
        &mut self,
        call: &Spanned<Expr>,
        object: &Spanned<Expr>,
        method: &Spanned<String>,
        args: &[Spanned<Expr>],
        usage: &Usage,
    ) -> Result<bool, CompileError> {
        let table = self.table;
        let name = &method.node;
        let qualifier = match object.node.unparen() {
            Expr::Ident(id) => match self.classify(id) {
                IdentKind::ClassSelf => Some(table.class_name.clone()),
                IdentKind::Import(binding) => Some(table.internal_class_name(&binding)),
                _ => None,
            },
            _ => None,
        };
        let recv = self.resolve(&object.node);
        let callee = known_callee(table, &recv, name);

        let (kind, owner) = match qualifier {
            Some(owner) => (Invoke::Static, owner),
            None => {
                let owner = match &recv {
                    JmmType::Class(class) | JmmType::Opaque(class) => table.internal_class_name(class),
                    JmmType::Unresolved => {
                        return Err(CompileError::unresolved(
                            format!("receiver of call to '{name}'"),
                            object.span,
                        ));
                    }
                    other => {
                        return Err(CompileError::unsupported(
                            format!("call to '{name}' on a value of type {other}"),
                            method.span,
                        ));
                    }
                };
                if callee.is_some_and(|m| m.is_static) {
                    self.lower_expr(object, &Usage::Discard)?;
                    (Invoke::Static, owner)
                } else {
                    self.lower_expr(object, &Usage::any_value())?;
                    (Invoke::Virtual, owner)
                }
            }
        };
        self.finish_call(call, kind, owner, method, callee, args, usage)
    }

    fn lower_plain_call(
        &mut self,
        call: &Spanned<Expr>,
        name: &Spanned<String>,
        args: &[Spanned<Expr>],
        usage: &Usage,
    ) -> Result<bool, CompileError> {
        let table = self.table;
        let own = JmmType::Class(table.class_name.clone());
        let callee = known_callee(table, &own, &name.node);
        let kind = if callee.is_some_and(|m| m.is_static) {
            Invoke::Static
        } else if self.method.is_static {
            return Err(CompileError::unsupported(
                format!("call to instance method '{}' from static method '{}'", name.node, self.method.name),
                name.span,
            ));
        } else {
            self.emit(Instr::ALoad(0));
            Invoke::Virtual
        };
        self.finish_call(call, kind, table.class_name.clone(), name, callee, args, usage)
    }

    #[allow(clippy::too_many_arguments)]
    fn finish_call(
        &mut self,
        call: &Spanned<Expr>,
        kind: Invoke,
        owner: String,
        name: &Spanned<String>,
        callee: Option<&MethodInfo>,
        args: &[Spanned<Expr>],
        usage: &Usage,
    ) -> Result<bool, CompileError> {
        // Without a declaration, only a call that resolves to an opaque type can be emitted.
        if callee.is_none() && self.resolve(&call.node).is_unresolved() {
            return Err(CompileError::unresolved(format!("call to '{}'", name.node), name.span));
        }
        let params = self.lower_args(name, callee, args)?;
        let ret = match callee {
            Some(m) => {
                let ty = self.table.resolve_type_expr(&m.return_type);
                self.descriptor(&ty, || format!("return type of '{}'", name.node), name.span)?
            }
            None => self.unmodeled_return(call, name, usage)?,
        };
        let desc = MethodDescriptor::new(params, ret);
        let produced = desc.returns_value();
        self.emit(Instr::Invoke { kind, owner, name: name.node.clone(), desc });
        Ok(produced)
    }

    /// Return descriptor of an opaque call the table has no signature for: whatever
    /// the consumer expects, or nothing when the value is discarded.
    fn unmodeled_return(
        &self,
        call: &Spanned<Expr>,
        name: &Spanned<String>,
        usage: &Usage,
    ) -> Result<String, CompileError> {
        let ty = match usage {
            Usage::Discard => return Ok("V".to_string()),
            Usage::Consume(Some(expected)) => expected.clone(),
            Usage::Consume(None) => self.resolve(&call.node),
        };
        self.descriptor(&ty, || format!("result of call to '{}'", name.node), name.span)
    }

    /// Push the arguments and return the parameter descriptors of the call.
    fn lower_args(
        &mut self,
        name: &Spanned<String>,
        callee: Option<&MethodInfo>,
        args: &[Spanned<Expr>],
    ) -> Result<Vec<String>, CompileError> {
        let Some(callee) = callee else {
            let mut descs = Vec::with_capacity(args.len());
            for (i, arg) in args.iter().enumerate() {
                let ty = self.resolve(&arg.node);
                let desc = self.descriptor(
                    &ty,
                    || format!("argument {} of call to '{}'", i + 1, name.node),
                    arg.span,
                )?;
                self.lower_expr(arg, &Usage::any_value())?;
                descs.push(desc);
            }
            return Ok(descs);
        };

        let params: Vec<JmmType> =
            callee.params.iter().map(|p| self.table.resolve_type_expr(&p.ty)).collect();
        let variadic = callee.is_variadic();
        let fixed = if variadic { params.len() - 1 } else { params.len() };
        if args.len() < fixed || (!variadic && args.len() != fixed) {
            return Err(CompileError::unsupported(
                format!(
                    "call to '{}' with {} argument(s), expected {}{}",
                    name.node,
                    args.len(),
                    fixed,
                    if variadic { " or more" } else { "" }
                ),
                name.span,
            ));
        }

        match vararg_split(self.table, &self.method.name, callee, args) {
            Some(split) => {
                for (arg, ty) in args[..split].iter().zip(&params) {
                    self.lower_expr(arg, &Usage::expecting(ty.clone()))?;
                }
                self.pack_int_array(&args[split..])?;
            }
            None => {
                for (arg, ty) in args.iter().zip(&params) {
                    self.lower_expr(arg, &Usage::expecting(ty.clone()))?;
                }
            }
        }

        params
            .iter()
            .enumerate()
            .map(|(i, ty)| {
                self.descriptor(ty, || format!("parameter {} of '{}'", i + 1, name.node), name.span)
            })
            .collect()
    }
}

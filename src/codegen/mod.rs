pub mod instr;
pub mod lower;
pub mod registers;
pub mod stack;

use tracing::debug;

use crate::config::BackendConfig;
use crate::diagnostics::CompileError;
use crate::parser::ast::*;
use crate::span::Span;
use crate::typeck::env::{MethodInfo, SymbolTable};
use crate::typeck::types::JmmType;
use instr::type_descriptor;
use lower::{LabelAllocator, LoweredMethod, lower_method};
use registers::is_entry_point;

/// `.limit` values of one emitted method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodLimits {
    pub name: String,
    pub max_stack: u32,
    pub max_locals: u16,
}

/// Jasmin text for one class plus the limits computed along the way.
#[derive(Debug, Clone)]
pub struct ClassListing {
    pub text: String,
    pub limits: Vec<MethodLimits>,
}

pub fn codegen(
    program: &Program,
    table: &SymbolTable,
    config: &BackendConfig,
) -> Result<ClassListing, CompileError> {
    let class = &program.class.node;
    let super_name = table.superclass_internal_name();
    let mut out = String::new();

    out.push_str(&format!(".class public {}\n", table.internal_class_name(&table.class_name)));
    out.push_str(&format!(".super {super_name}\n"));
    for field in &table.fields {
        let ty = table.resolve_type_expr(&field.ty);
        if ty == JmmType::Void {
            return Err(CompileError::unsupported(format!("void field '{}'", field.name), Span::dummy()));
        }
        let desc = type_descriptor(&ty, table)
            .ok_or_else(|| CompileError::unresolved(format!("field '{}'", field.name), Span::dummy()))?;
        out.push_str(&format!(".field public {} {desc}\n", field.name));
    }

    out.push('\n');
    write_constructor(&mut out, &super_name, &config.output.indent);

    // One allocator for the whole class keeps labels unique across methods.
    let mut labels = LabelAllocator::default();
    let mut limits = Vec::with_capacity(class.methods.len());
    for decl in &class.methods {
        let name = &decl.node.name.node;
        let info = table.method(name).ok_or_else(|| {
            CompileError::input(format!("method '{name}' has no symbol table entry"))
        })?;
        let lowered = lower_method(table, info, &decl.node, config, &mut labels)?;
        debug!(
            method = %name,
            stack = lowered.max_stack,
            locals = lowered.max_locals,
            "lowered method"
        );

        out.push('\n');
        write_method(&mut out, table, info, &lowered, &config.output.indent, decl.node.name.span)?;
        limits.push(MethodLimits {
            name: name.clone(),
            max_stack: lowered.max_stack,
            max_locals: lowered.max_locals,
        });
    }

    Ok(ClassListing { text: out, limits })
}

fn write_constructor(out: &mut String, super_name: &str, indent: &str) {
    out.push_str(".method public <init>()V\n");
    out.push_str(&format!("{indent}aload_0\n"));
    out.push_str(&format!("{indent}invokespecial {super_name}/<init>()V\n"));
    out.push_str(&format!("{indent}return\n"));
    out.push_str(".end method\n");
}

/// `(params)ret` for a declared method; `main` always takes `String[]`.
fn method_descriptor(table: &SymbolTable, info: &MethodInfo, span: Span) -> Result<String, CompileError> {
    let mut params = String::new();
    if is_entry_point(info) && info.params.is_empty() {
        params.push_str("[Ljava/lang/String;");
    }
    for param in &info.params {
        let ty = table.resolve_type_expr(&param.ty);
        let desc = type_descriptor(&ty, table).ok_or_else(|| {
            CompileError::unresolved(format!("parameter '{}' of '{}'", param.name, info.name), span)
        })?;
        params.push_str(&desc);
    }
    let ret = table.resolve_type_expr(&info.return_type);
    let ret = type_descriptor(&ret, table)
        .ok_or_else(|| CompileError::unresolved(format!("return type of '{}'", info.name), span))?;
    Ok(format!("({params}){ret}"))
}

fn write_method(
    out: &mut String,
    table: &SymbolTable,
    info: &MethodInfo,
    lowered: &LoweredMethod,
    indent: &str,
    span: Span,
) -> Result<(), CompileError> {
    let visibility = if info.is_public { "public" } else { "private" };
    let modifiers = if info.is_static { format!("{visibility} static") } else { visibility.to_string() };
    let desc = method_descriptor(table, info, span)?;

    out.push_str(&format!(".method {modifiers} {}{desc}\n", info.name));
    out.push_str(&format!("{indent}.limit stack {}\n", lowered.max_stack));
    out.push_str(&format!("{indent}.limit locals {}\n", lowered.max_locals));
    for instr in &lowered.code {
        if instr.is_label() {
            out.push_str(&format!("{instr}\n"));
        } else {
            out.push_str(&format!("{indent}{instr}\n"));
        }
    }
    out.push_str(".end method\n");
    Ok(())
}

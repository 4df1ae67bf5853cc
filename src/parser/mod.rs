pub mod ast;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diagnostics::CompileError;
use crate::typeck::env::SymbolTable;
use ast::Program;

/// Everything the front end hands over for one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilationUnit {
    pub program: Program,
    pub table: SymbolTable,
}

impl CompilationUnit {
    pub fn new(program: Program, table: SymbolTable) -> Self {
        Self { program, table }
    }
}

/// Deserialize a `{ "program": ..., "table": ... }` document.
pub fn parse_unit(json: &str) -> Result<CompilationUnit, CompileError> {
    let unit: CompilationUnit = serde_json::from_str(json)
        .map_err(|e| CompileError::input(format!("malformed compilation unit: {e}")))?;
    if unit.program.class.node.name.node != unit.table.class_name {
        return Err(CompileError::input(format!(
            "class '{}' does not match symbol table class '{}'",
            unit.program.class.node.name.node, unit.table.class_name
        )));
    }
    Ok(unit)
}

pub fn load_unit(path: &Path) -> Result<CompilationUnit, CompileError> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| CompileError::input(format!("could not read {}: {e}", path.display())))?;
    parse_unit(&json)
}

pub mod span;
pub mod diagnostics;
pub mod parser;
pub mod typeck;
pub mod visit;
pub mod codegen;
pub mod config;

use std::sync::OnceLock;

use codegen::{ClassListing, MethodLimits};
use config::BackendConfig;
use diagnostics::CompileError;
use parser::CompilationUnit;

/// Jasmin backend for one compilation unit. The listing is generated on the
/// first call to [`build`](Self::build) and reused afterwards.
pub struct JasminBackend {
    unit: CompilationUnit,
    config: BackendConfig,
    listing: OnceLock<ClassListing>,
}

impl JasminBackend {
    pub fn new(unit: CompilationUnit, config: BackendConfig) -> Self {
        Self { unit, config, listing: OnceLock::new() }
    }

    pub fn with_defaults(unit: CompilationUnit) -> Self {
        Self::new(unit, BackendConfig::default())
    }

    pub fn unit(&self) -> &CompilationUnit {
        &self.unit
    }

    /// Jasmin assembly text for the class.
    pub fn build(&self) -> Result<&str, CompileError> {
        Ok(&self.listing()?.text)
    }

    /// Per-method `.limit stack` / `.limit locals`, in declaration order.
    pub fn limits(&self) -> Result<&[MethodLimits], CompileError> {
        Ok(&self.listing()?.limits)
    }

    fn listing(&self) -> Result<&ClassListing, CompileError> {
        if let Some(listing) = self.listing.get() {
            return Ok(listing);
        }
        let listing = codegen::codegen(&self.unit.program, &self.unit.table, &self.config)?;
        Ok(self.listing.get_or_init(|| listing))
    }
}

/// Generate Jasmin text for a loaded unit.
pub fn compile_unit(unit: &CompilationUnit, config: &BackendConfig) -> Result<String, CompileError> {
    codegen::codegen(&unit.program, &unit.table, config).map(|listing| listing.text)
}

/// Deserialize a unit document and generate Jasmin text for it.
pub fn compile_json(json: &str, config: &BackendConfig) -> Result<String, CompileError> {
    let unit = parser::parse_unit(json)?;
    compile_unit(&unit, config)
}

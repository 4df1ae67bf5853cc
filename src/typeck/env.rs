use serde::{Deserialize, Serialize};

use crate::parser::ast::TypeExpr;
use super::types::JmmType;

/// Reserved parameter type name for "repeated int" parameters.
pub const VARARG_MARKER: &str = "_varargs";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub ty: TypeExpr,
}

impl Symbol {
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self { name: name.into(), ty }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportDecl {
    /// Dotted path split on `.`, e.g. `["java", "util", "Scanner"]`.
    pub path: Vec<String>,
}

impl ImportDecl {
    pub fn parse(dotted: &str) -> Self {
        Self { path: dotted.split('.').map(str::to_string).collect() }
    }

    pub fn binding_name(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or("")
    }

    pub fn full_path(&self) -> String {
        self.path.join(".")
    }

    /// Internal (slash-separated) class name used in descriptors.
    pub fn internal_name(&self) -> String {
        self.path.join("/")
    }

    pub fn matches(&self, name: &str) -> bool {
        self.binding_name() == name || self.full_path() == name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub name: String,
    pub return_type: TypeExpr,
    #[serde(default)]
    pub params: Vec<Symbol>,
    #[serde(default)]
    pub locals: Vec<Symbol>,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

fn default_public() -> bool {
    true
}

impl MethodInfo {
    pub fn new(name: impl Into<String>, return_type: TypeExpr) -> Self {
        Self {
            name: name.into(),
            return_type,
            params: Vec::new(),
            locals: Vec::new(),
            is_static: false,
            is_public: true,
        }
    }

    pub fn param(mut self, name: impl Into<String>, ty: TypeExpr) -> Self {
        self.params.push(Symbol::new(name, ty));
        self
    }

    /// Append the trailing vararg parameter.
    pub fn varargs(self, name: impl Into<String>) -> Self {
        self.param(name, TypeExpr::array_of(TypeExpr::named(VARARG_MARKER)))
    }

    pub fn local(mut self, name: impl Into<String>, ty: TypeExpr) -> Self {
        self.locals.push(Symbol::new(name, ty));
        self
    }

    pub fn set_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn is_variadic(&self) -> bool {
        self.params.last().is_some_and(|p| is_vararg_type(&p.ty))
    }
}

pub fn is_vararg_type(ty: &TypeExpr) -> bool {
    matches!(ty, TypeExpr::Array(inner) if **inner == TypeExpr::Named(VARARG_MARKER.to_string()))
}

/// Read-only view of the declarations the front end collected for one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolTable {
    pub class_name: String,
    #[serde(default)]
    pub superclass: Option<String>,
    #[serde(default)]
    pub imports: Vec<ImportDecl>,
    #[serde(default)]
    pub fields: Vec<Symbol>,
    #[serde(default)]
    pub methods: Vec<MethodInfo>,
}

impl SymbolTable {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            superclass: None,
            imports: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn with_superclass(mut self, name: impl Into<String>) -> Self {
        self.superclass = Some(name.into());
        self
    }

    pub fn with_import(mut self, dotted: &str) -> Self {
        self.imports.push(ImportDecl::parse(dotted));
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, ty: TypeExpr) -> Self {
        self.fields.push(Symbol::new(name, ty));
        self
    }

    pub fn with_method(mut self, method: MethodInfo) -> Self {
        self.methods.push(method);
        self
    }

    pub fn method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn import(&self, name: &str) -> Option<&ImportDecl> {
        self.imports.iter().find(|i| i.matches(name))
    }

    pub fn is_import(&self, name: &str) -> bool {
        self.import(name).is_some()
    }

    pub fn field(&self, name: &str) -> Option<&Symbol> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn return_type(&self, method: &str) -> Option<JmmType> {
        self.method(method).map(|m| self.resolve_type_expr(&m.return_type))
    }

    /// Whether the superclass is an imported (opaque) class.
    pub fn extends_import(&self) -> bool {
        self.superclass.as_deref().is_some_and(|s| self.is_import(s))
    }

    /// Map a declared type to the backend's type model.
    pub fn resolve_type_expr(&self, ty: &TypeExpr) -> JmmType {
        match ty {
            TypeExpr::Array(inner) => JmmType::array_of(self.resolve_type_expr(inner)),
            TypeExpr::Named(name) => match name.as_str() {
                "int" => JmmType::Int,
                "boolean" => JmmType::Boolean,
                "void" => JmmType::Void,
                "String" => JmmType::String,
                VARARG_MARKER => JmmType::Vararg,
                _ if *name == self.class_name => JmmType::Class(name.clone()),
                _ => match self.import(name) {
                    Some(import) => JmmType::Opaque(import.binding_name().to_string()),
                    None => JmmType::Class(name.clone()),
                },
            },
        }
    }

    /// Internal (slash-separated) name of a class referenced by simple name.
    pub fn internal_class_name(&self, name: &str) -> String {
        match self.import(name) {
            Some(import) => import.internal_name(),
            None => name.replace('.', "/"),
        }
    }

    /// `.super` target; the platform root class when none is declared.
    pub fn superclass_internal_name(&self) -> String {
        match &self.superclass {
            Some(name) => self.internal_class_name(name),
            None => "java/lang/Object".to_string(),
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::span::Spanned;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub class: Spanned<ClassDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: Spanned<String>,
    #[serde(default)]
    pub methods: Vec<Spanned<MethodDecl>>,
}

/// A method body. Its signature and locals live in the symbol table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: Spanned<String>,
    pub body: Spanned<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeExpr {
    Named(String),
    Array(Box<TypeExpr>),
}

impl TypeExpr {
    pub fn named(name: impl Into<String>) -> Self {
        TypeExpr::Named(name.into())
    }

    pub fn array_of(inner: TypeExpr) -> Self {
        TypeExpr::Array(Box::new(inner))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Block {
    pub stmts: Vec<Spanned<Stmt>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stmt {
    Assign {
        target: Spanned<String>,
        value: Spanned<Expr>,
    },
    IndexAssign {
        object: Spanned<Expr>,
        index: Spanned<Expr>,
        value: Spanned<Expr>,
    },
    Return(Option<Spanned<Expr>>),
    If {
        condition: Spanned<Expr>,
        then_branch: Box<Spanned<Stmt>>,
        #[serde(default)]
        else_branch: Option<Box<Spanned<Stmt>>>,
    },
    While {
        condition: Spanned<Expr>,
        body: Box<Spanned<Stmt>>,
    },
    Block(Block),
    Expr(Spanned<Expr>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    IntLit(i32),
    BoolLit(bool),
    Ident(String),
    BinOp {
        op: BinOp,
        lhs: Box<Spanned<Expr>>,
        rhs: Box<Spanned<Expr>>,
    },
    Not {
        operand: Box<Spanned<Expr>>,
    },
    Paren {
        inner: Box<Spanned<Expr>>,
    },
    ArrayLit {
        elements: Vec<Spanned<Expr>>,
    },
    NewArray {
        elem: TypeExpr,
        size: Box<Spanned<Expr>>,
    },
    Index {
        object: Box<Spanned<Expr>>,
        index: Box<Spanned<Expr>>,
    },
    Length {
        object: Box<Spanned<Expr>>,
    },
    NewObject {
        class: Spanned<String>,
    },
    This,
    MethodCall {
        object: Box<Spanned<Expr>>,
        method: Spanned<String>,
        #[serde(default)]
        args: Vec<Spanned<Expr>>,
    },
    Call {
        name: Spanned<String>,
        #[serde(default)]
        args: Vec<Spanned<Expr>>,
    },
}

impl Expr {
    /// Strip any number of enclosing parentheses.
    pub fn unparen(&self) -> &Expr {
        let mut e = self;
        while let Expr::Paren { inner } = e {
            e = &inner.node;
        }
        e
    }

    /// Short human-readable name of the node kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::IntLit(_) => "integer literal",
            Expr::BoolLit(_) => "boolean literal",
            Expr::Ident(_) => "variable reference",
            Expr::BinOp { .. } => "binary expression",
            Expr::Not { .. } => "not expression",
            Expr::Paren { .. } => "parenthesized expression",
            Expr::ArrayLit { .. } => "array literal",
            Expr::NewArray { .. } => "array allocation",
            Expr::Index { .. } => "array access",
            Expr::Length { .. } => "length expression",
            Expr::NewObject { .. } => "object allocation",
            Expr::This => "this",
            Expr::MethodCall { .. } => "member call",
            Expr::Call { .. } => "call",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "&&")]
    And,
}

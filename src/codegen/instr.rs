use std::fmt;

use crate::typeck::env::SymbolTable;
use crate::typeck::types::JmmType;

/// Element family of an array instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElemKind {
    Int,
    Boolean,
    Ref,
}

impl ElemKind {
    /// `None` for an unresolved element type.
    pub fn of(elem: &JmmType) -> Option<ElemKind> {
        match elem {
            JmmType::Unresolved | JmmType::Void => None,
            JmmType::Int | JmmType::Vararg => Some(ElemKind::Int),
            JmmType::Boolean => Some(ElemKind::Boolean),
            _ => Some(ElemKind::Ref),
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            ElemKind::Int => "i",
            ElemKind::Boolean => "b",
            ElemKind::Ref => "a",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    Void,
    Value,
    Ref,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invoke {
    Virtual,
    Static,
    Special,
}

/// `(params)ret` in JVM descriptor syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub params: Vec<String>,
    pub ret: String,
}

impl MethodDescriptor {
    pub fn new(params: Vec<String>, ret: impl Into<String>) -> Self {
        Self { params, ret: ret.into() }
    }

    pub fn returns_value(&self) -> bool {
        self.ret != "V"
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}){}", self.params.concat(), self.ret)
    }
}

/// One line of a method body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    /// Integer constant; rendered with the shortest encoding.
    IConst(i32),
    ILoad(u16),
    ALoad(u16),
    IStore(u16),
    AStore(u16),
    IInc(u16, i32),
    IAdd,
    ISub,
    IMul,
    IDiv,
    IAnd,
    IXor,
    IfEq(String),
    IfLt(String),
    Goto(String),
    Label(String),
    NewArray(ElemKind),
    ANewArray(String),
    ArrayLength,
    ArrayLoad(ElemKind),
    ArrayStore(ElemKind),
    New(String),
    Dup,
    Pop,
    Invoke {
        kind: Invoke,
        owner: String,
        name: String,
        desc: MethodDescriptor,
    },
    GetField {
        owner: String,
        name: String,
        desc: String,
    },
    PutField {
        owner: String,
        name: String,
        desc: String,
    },
    Return(ReturnKind),
}

impl Instr {
    /// Operand-stack effect as `(popped, pushed)` slots.
    pub fn stack_effect(&self) -> (u32, u32) {
        match self {
            Instr::IConst(_) | Instr::ILoad(_) | Instr::ALoad(_) | Instr::New(_) => (0, 1),
            Instr::IStore(_) | Instr::AStore(_) | Instr::Pop => (1, 0),
            Instr::IInc(..) | Instr::Goto(_) | Instr::Label(_) => (0, 0),
            Instr::IAdd | Instr::ISub | Instr::IMul | Instr::IDiv | Instr::IAnd | Instr::IXor => (2, 1),
            Instr::IfEq(_) | Instr::IfLt(_) => (1, 0),
            Instr::NewArray(_) | Instr::ANewArray(_) | Instr::ArrayLength => (1, 1),
            Instr::ArrayLoad(_) => (2, 1),
            Instr::ArrayStore(_) => (3, 0),
            Instr::Dup => (1, 2),
            Instr::Invoke { kind, desc, .. } => {
                let receiver = u32::from(*kind != Invoke::Static);
                let args = desc.params.len() as u32;
                (receiver + args, u32::from(desc.returns_value()))
            }
            Instr::GetField { .. } => (1, 1),
            Instr::PutField { .. } => (2, 0),
            Instr::Return(ReturnKind::Void) => (0, 0),
            Instr::Return(_) => (1, 0),
        }
    }

    /// Local slot touched by this instruction, if any.
    pub fn slot(&self) -> Option<u16> {
        match self {
            Instr::ILoad(s) | Instr::ALoad(s) | Instr::IStore(s) | Instr::AStore(s) | Instr::IInc(s, _) => Some(*s),
            _ => None,
        }
    }

    pub fn is_label(&self) -> bool {
        matches!(self, Instr::Label(_))
    }
}

fn slot_op(f: &mut fmt::Formatter<'_>, op: &str, slot: u16) -> fmt::Result {
    if slot <= 3 {
        write!(f, "{op}_{slot}")
    } else {
        write!(f, "{op} {slot}")
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::IConst(v) => match *v {
                0..=5 => write!(f, "iconst_{v}"),
                -128..=127 => write!(f, "bipush {v}"),
                -32768..=32767 => write!(f, "sipush {v}"),
                _ => write!(f, "ldc {v}"),
            },
            Instr::ILoad(s) => slot_op(f, "iload", *s),
            Instr::ALoad(s) => slot_op(f, "aload", *s),
            Instr::IStore(s) => slot_op(f, "istore", *s),
            Instr::AStore(s) => slot_op(f, "astore", *s),
            Instr::IInc(s, by) => write!(f, "iinc {s} {by}"),
            Instr::IAdd => write!(f, "iadd"),
            Instr::ISub => write!(f, "isub"),
            Instr::IMul => write!(f, "imul"),
            Instr::IDiv => write!(f, "idiv"),
            Instr::IAnd => write!(f, "iand"),
            Instr::IXor => write!(f, "ixor"),
            Instr::IfEq(l) => write!(f, "ifeq {l}"),
            Instr::IfLt(l) => write!(f, "iflt {l}"),
            Instr::Goto(l) => write!(f, "goto {l}"),
            Instr::Label(l) => write!(f, "{l}:"),
            Instr::NewArray(ElemKind::Boolean) => write!(f, "newarray boolean"),
            Instr::NewArray(_) => write!(f, "newarray int"),
            Instr::ANewArray(class) => write!(f, "anewarray {class}"),
            Instr::ArrayLength => write!(f, "arraylength"),
            Instr::ArrayLoad(k) => write!(f, "{}aload", k.prefix()),
            Instr::ArrayStore(k) => write!(f, "{}astore", k.prefix()),
            Instr::New(class) => write!(f, "new {class}"),
            Instr::Dup => write!(f, "dup"),
            Instr::Pop => write!(f, "pop"),
            Instr::Invoke { kind, owner, name, desc } => {
                let op = match kind {
                    Invoke::Virtual => "invokevirtual",
                    Invoke::Static => "invokestatic",
                    Invoke::Special => "invokespecial",
                };
                write!(f, "{op} {owner}/{name}{desc}")
            }
            Instr::GetField { owner, name, desc } => write!(f, "getfield {owner}/{name} {desc}"),
            Instr::PutField { owner, name, desc } => write!(f, "putfield {owner}/{name} {desc}"),
            Instr::Return(ReturnKind::Void) => write!(f, "return"),
            Instr::Return(ReturnKind::Value) => write!(f, "ireturn"),
            Instr::Return(ReturnKind::Ref) => write!(f, "areturn"),
        }
    }
}

/// Field/parameter descriptor of `ty`, or `None` when it is unresolved.
pub fn type_descriptor(ty: &JmmType, table: &SymbolTable) -> Option<String> {
    let desc = match ty {
        JmmType::Int | JmmType::Vararg => "I".to_string(),
        JmmType::Boolean => "Z".to_string(),
        JmmType::Void => "V".to_string(),
        JmmType::String => "Ljava/lang/String;".to_string(),
        JmmType::Class(name) | JmmType::Opaque(name) => format!("L{};", table.internal_class_name(name)),
        JmmType::Array(inner) => format!("[{}", type_descriptor(inner, table)?),
        JmmType::EmptyArray => "[I".to_string(),
        JmmType::Unresolved => return None,
    };
    Some(desc)
}

/// Return instruction family for a declared return type.
pub fn return_kind(ty: &JmmType) -> Option<ReturnKind> {
    match ty {
        JmmType::Unresolved => None,
        JmmType::Void => Some(ReturnKind::Void),
        t if t.is_primitive() => Some(ReturnKind::Value),
        _ => Some(ReturnKind::Ref),
    }
}

/// Static type of a value as seen by the backend.
///
/// `Unresolved` is the error type: it is produced whenever resolution fails
/// and is never coerced into a guess. `Opaque` names an imported class whose
/// structure the table does not model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum JmmType {
    Int,
    Boolean,
    Void,
    String,
    /// The current class, or another nominal class the table only names (e.g. a superclass).
    Class(std::string::String),
    /// An imported class, keyed by its binding name.
    Opaque(std::string::String),
    /// Element marker of a vararg parameter: "zero or more trailing ints".
    Vararg,
    Array(Box<JmmType>),
    /// Array with no known element name, produced by an empty array literal.
    EmptyArray,
    Unresolved,
}

impl JmmType {
    pub fn array_of(elem: JmmType) -> JmmType {
        JmmType::Array(Box::new(elem))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, JmmType::Array(_) | JmmType::EmptyArray)
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, JmmType::Unresolved)
    }

    /// True when the type's name is an import, array or not.
    pub fn is_opaque(&self) -> bool {
        match self {
            JmmType::Opaque(_) => true,
            JmmType::Array(inner) => inner.is_opaque(),
            _ => false,
        }
    }

    /// Scalar `int` (a vararg element counts as one).
    pub fn is_int(&self) -> bool {
        matches!(self, JmmType::Int | JmmType::Vararg)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, JmmType::Boolean)
    }

    /// Int or boolean: loaded/stored/returned with the `i` instruction family.
    pub fn is_primitive(&self) -> bool {
        matches!(self, JmmType::Int | JmmType::Boolean | JmmType::Vararg)
    }

    /// Type of one element when indexing into this type.
    pub fn element(&self) -> JmmType {
        match self {
            JmmType::Array(inner) => match inner.as_ref() {
                JmmType::Vararg => JmmType::Int,
                other => other.clone(),
            },
            JmmType::EmptyArray => JmmType::Int,
            JmmType::Opaque(name) => JmmType::Opaque(name.clone()),
            _ => JmmType::Unresolved,
        }
    }

    /// The same name with array-ness set. Arrays stay as they are.
    pub fn as_array(&self) -> JmmType {
        match self {
            JmmType::Array(_) | JmmType::EmptyArray | JmmType::Unresolved => self.clone(),
            JmmType::Void => JmmType::Unresolved,
            scalar => JmmType::array_of(scalar.clone()),
        }
    }

    /// Name comparison used by assignability; vararg elements are ints.
    fn same_name(&self, other: &JmmType) -> bool {
        match (self, other) {
            (a, b) if a.is_int() && b.is_int() => true,
            (a, b) => a == b,
        }
    }
}

/// Whether a value of type `source` may flow into a slot of type `dest`.
///
/// Non-array pairs match by name or when either side is opaque. Array pairs
/// match only by element name; an empty literal matches any array. Array and
/// non-array never mix.
pub fn is_assignable(source: &JmmType, dest: &JmmType) -> bool {
    if source.is_unresolved() || dest.is_unresolved() {
        return false;
    }
    match (source, dest) {
        (JmmType::EmptyArray, d) => d.is_array(),
        (s, JmmType::EmptyArray) => s.is_array(),
        (JmmType::Array(s), JmmType::Array(d)) => s.same_name(d),
        (s, d) if s.is_array() || d.is_array() => false,
        (s, d) => s.same_name(d) || s.is_opaque() || d.is_opaque(),
    }
}

impl std::fmt::Display for JmmType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JmmType::Int => write!(f, "int"),
            JmmType::Boolean => write!(f, "boolean"),
            JmmType::Void => write!(f, "void"),
            JmmType::String => write!(f, "String"),
            JmmType::Class(name) | JmmType::Opaque(name) => write!(f, "{name}"),
            JmmType::Vararg => write!(f, "int..."),
            JmmType::Array(inner) => write!(f, "{inner}[]"),
            JmmType::EmptyArray => write!(f, "<empty>[]"),
            JmmType::Unresolved => write!(f, "<unresolved>"),
        }
    }
}

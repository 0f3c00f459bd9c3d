/// An IL operand value. `Temp` is the only variant requiring SSA dominance
/// checking; every other variant is always available regardless of control
/// flow.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A numbered SSA result, unique per function.
    Temp(u32),
    ConstInt(i64),
    ConstFloat(f64),
    ConstBool(bool),
    ConstStr(Vec<u8>),
    ConstNull,
    /// Reference to a named global or external symbol.
    GlobalAddr(String),
}

impl Value {
    pub fn as_temp(&self) -> Option<u32> {
        match self {
            Value::Temp(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_constant(&self) -> bool {
        !matches!(self, Value::Temp(_))
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Temp(id) => write!(f, "%t{id}"),
            Value::ConstInt(v) => write!(f, "{v}"),
            Value::ConstFloat(v) => write!(f, "{v}"),
            Value::ConstBool(v) => write!(f, "{v}"),
            Value::ConstStr(bytes) => write!(f, "{:?}", String::from_utf8_lossy(bytes)),
            Value::ConstNull => write!(f, "null"),
            Value::GlobalAddr(name) => write!(f, "@{name}"),
        }
    }
}

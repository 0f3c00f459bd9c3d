//! Runtime value representation. Unlike the IL's static `Type`, the VM keeps
//! one integer variant for every integer width (spec.md §4.6.1's `regs` map
//! stores resolved values, not typed slots) — per-width wrapping is applied
//! at each operation site from `instr.ty` instead of in the representation.

use il::Value;

/// A 16-byte structured error record (spec.md §6.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ErrorRecord {
    pub kind: u16,
    pub code: u16,
    pub ip: u32,
    pub line: i32,
    pub data: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeValue {
    Int(i64),
    Float(f64),
    /// Encodes `(heap_slot, byte_offset)`; heap slot `0` is null. See
    /// `crate::memory`.
    Ptr(u64),
    /// An interned string handle. The VM owns a simple string table rather
    /// than implementing the refcounted runtime ABI (out of scope per
    /// spec.md §1); `rt_str_retain_maybe`/`rt_str_release_maybe` calls are
    /// accepted as no-op externs (see `crate::externs`).
    Str(std::rc::Rc<Vec<u8>>),
    Error(ErrorRecord),
    /// A single-use capability produced by `eh.entry`; carries the error
    /// record that was caught so `err.get`/`trap.kind.read` can read it
    /// without a separate textual `Error` value in the handler block.
    ResumeTok(ErrorRecord),
}

impl RuntimeValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            RuntimeValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            RuntimeValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_ptr(&self) -> Option<u64> {
        match self {
            RuntimeValue::Ptr(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RuntimeValue::Int(v) => Some(*v != 0),
            _ => None,
        }
    }

    /// Reads the error record carried by an `Error` or `ResumeTok` value.
    /// Accepting both is a deliberate widening of spec.md §4.6.4's textual
    /// `Type::Error` operand requirement: `eh.entry` only produces a
    /// `ResumeTok`-typed result, so `err.get`/`trap.kind.read` must be able
    /// to read the caught error directly off it (see DESIGN.md).
    pub fn as_error_record(&self) -> Option<ErrorRecord> {
        match self {
            RuntimeValue::Error(e) => Some(*e),
            RuntimeValue::ResumeTok(e) => Some(*e),
            _ => None,
        }
    }
}

/// Resolves a constant [`Value`] that does not require register lookup.
/// `Value::Temp` is handled by `Frame::read_operand` instead, since it needs
/// the current register file.
pub fn const_to_runtime(v: &Value) -> Option<RuntimeValue> {
    match v {
        Value::ConstInt(i) => Some(RuntimeValue::Int(*i)),
        Value::ConstFloat(f) => Some(RuntimeValue::Float(*f)),
        Value::ConstBool(b) => Some(RuntimeValue::Int(if *b { 1 } else { 0 })),
        Value::ConstNull => Some(RuntimeValue::Ptr(0)),
        Value::ConstStr(bytes) => Some(RuntimeValue::Str(std::rc::Rc::new(bytes.clone()))),
        Value::GlobalAddr(_) | Value::Temp(_) => None,
    }
}

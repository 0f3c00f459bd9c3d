//! Runtime trap taxonomy (spec.md §7 "Runtime traps") and the VM's own
//! internal-failure enum. `VmError` is the leaf error type returned by
//! dispatch handlers; it is distinct from `il_support::Diagnostic`, which is
//! reserved for parse/verify-time, located failures.

use thiserror::Error;

use il_support::SourceLoc;

/// The trap kinds named in spec.md §7, plus a catch-all for codes raised by
/// runtime externs the VM does not itself understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapKind {
    Overflow,
    DivideByZero,
    Bounds,
    InvalidCast,
    NullDereference,
    UnhandledError,
    AssertionFailure,
    Custom(u16),
}

impl TrapKind {
    /// Encodes the kind as the `u16` stored in an [`crate::value::ErrorRecord`].
    pub fn as_code(&self) -> u16 {
        match self {
            TrapKind::Overflow => 1,
            TrapKind::DivideByZero => 2,
            TrapKind::Bounds => 3,
            TrapKind::InvalidCast => 4,
            TrapKind::NullDereference => 5,
            TrapKind::UnhandledError => 6,
            TrapKind::AssertionFailure => 7,
            TrapKind::Custom(code) => *code,
        }
    }

    pub fn from_code(code: u16) -> Self {
        match code {
            1 => TrapKind::Overflow,
            2 => TrapKind::DivideByZero,
            3 => TrapKind::Bounds,
            4 => TrapKind::InvalidCast,
            5 => TrapKind::NullDereference,
            6 => TrapKind::UnhandledError,
            7 => TrapKind::AssertionFailure,
            other => TrapKind::Custom(other),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TrapKind::Overflow => "Overflow",
            TrapKind::DivideByZero => "DivideByZero",
            TrapKind::Bounds => "Bounds",
            TrapKind::InvalidCast => "InvalidCast",
            TrapKind::NullDereference => "NullDereference",
            TrapKind::UnhandledError => "UnhandledError",
            TrapKind::AssertionFailure => "AssertionFailure",
            TrapKind::Custom(_) => "Custom",
        }
    }
}

/// Where a trap occurred, captured at the moment it was raised so
/// [`crate::vm::Vm::last_trap_message`] can report it after the frame that
/// raised it has potentially already unwound (spec.md §4.6.7).
#[derive(Debug, Clone)]
pub struct FrameInfo {
    pub function: String,
    pub block: String,
    pub ip: usize,
    pub loc: SourceLoc,
    pub handler_installed: bool,
}

/// Internal VM failures. Most of these correspond 1:1 to a named trap kind;
/// `HandlerStackUnderflow` is the VM's defensive re-check of an invariant
/// the verifier already guarantees for well-formed input (spec.md §4.6.4).
#[derive(Debug, Error)]
pub enum VmError {
    #[error("{kind}: {message}")]
    Trap { kind: TrapKind, message: String, frame: FrameInfo },
    #[error("eh.pop: handler stack underflow in function '{function}'")]
    HandlerStackUnderflow { function: String },
    #[error("call to unknown function or extern '{name}'")]
    UnknownCallee { name: String },
    #[error("extern '{name}' invoked with {got} argument(s), expected {expected}")]
    ExternArity { name: String, expected: usize, got: usize },
    #[error("value of unexpected runtime kind encountered for operand '{role}'")]
    TypeMismatch { role: &'static str },
    #[error("resume.* executed with no active resume token in function '{function}'")]
    ResumeWithoutToken { function: String },
}

impl std::fmt::Display for TrapKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl VmError {
    pub fn trap(kind: TrapKind, message: impl Into<String>, frame: FrameInfo) -> Self {
        VmError::Trap { kind, message: message.into(), frame }
    }

    /// The trap kind this failure would carry into a caught
    /// [`crate::value::ErrorRecord`]. Internal-invariant failures that are
    /// not themselves IL-level traps (handler stack underflow, an unresolved
    /// callee, ...) still need *some* kind so a handler that catches them
    /// sees a well-formed record; `UnhandledError` is the closest named kind.
    pub fn trap_kind(&self) -> TrapKind {
        match self {
            VmError::Trap { kind, .. } => *kind,
            _ => TrapKind::UnhandledError,
        }
    }
}

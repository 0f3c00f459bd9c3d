//! Register-based virtual machine for the Viper intermediate language
//! (spec.md §4.6): executes a verified [`il::Module`] directly, with
//! exception-handler unwinding, structured traps, and optional IL/source
//! tracing and breakpoint debugging (§4.6.6).

pub mod config;
pub mod debug;
pub mod dispatch;
pub mod error;
pub mod externs;
pub mod frame;
pub mod memory;
pub mod trace;
pub mod value;
pub mod vm;

pub use config::VmConfig;
pub use error::{FrameInfo, TrapKind, VmError};
pub use externs::ExternTable;
pub use value::{ErrorRecord, RuntimeValue};
pub use vm::Vm;

//! Typed SSA intermediate language: the data model (Module, Function,
//! BasicBlock, Instruction, Value, Type) and the declarative opcode metadata
//! table that every other component in the toolchain derives its behavior
//! from.

pub mod block;
pub mod function;
pub mod instr;
pub mod module;
pub mod opcode;
pub mod types;
pub mod value;

pub use block::{BasicBlock, BlockParam};
pub use function::{Function, Param};
pub use instr::Instruction;
pub use module::{Extern, Global, GlobalInit, Module};
pub use opcode::{info, MemoryEffects, Opcode, OpcodeInfo, OperandParseKind, OperandParseSpec, ResultArity, VmDispatch, VARIADIC};
pub use types::{Type, TypeCategory};
pub use value::Value;

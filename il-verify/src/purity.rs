//! Thin semantic wrappers over opcode metadata, shared between the
//! verifier's EH-dataflow pass and `il-transform`'s LICM: "is this
//! instruction safe to hoist out of a loop" depends on the same three
//! facts — does it write memory, does it have other side effects, can it
//! trap — that the EH analysis needs to decide whether a block can fault.

use il::Instruction;

/// No observable effect other than producing its result: safe to reorder,
/// duplicate, or eliminate if its result is unused.
pub fn is_pure(instr: &Instruction) -> bool {
    let info = instr.op.info();
    !info.has_side_effects && !info.memory_effects.reads() && !info.memory_effects.writes() && !info.can_trap
}

/// Whether executing `instr` can raise a runtime trap (divide-by-zero,
/// overflow, bounds check, explicit `trap`/`trap.from_err`, ...). Blocks
/// containing a trapping instruction are exactly the blocks the EH
/// dataflow pass must cover with a postdominating resume label.
pub fn can_trap(instr: &Instruction) -> bool {
    instr.op.can_trap()
}

/// Whether `instr` may write to memory observable by another instruction
/// (a `store`, a call, or anything else metadata marks as writing).
pub fn has_memory_write(instr: &Instruction) -> bool {
    instr.op.info().memory_effects.writes()
}

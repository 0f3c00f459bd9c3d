use crate::instr::Instruction;
use crate::types::Type;

/// A block parameter: the SSA-with-arguments equivalent of a phi node. Every
/// incoming branch must supply one argument per parameter, in order, of the
/// matching type.
#[derive(Debug, Clone)]
pub struct BlockParam {
    pub id: u32,
    pub name: Option<String>,
    pub ty: Type,
}

/// Blocks are owned by their function in a plain `Vec` and referenced by
/// label; there are no owning pointers from one block to another (see
/// DESIGN.md's note on avoiding cyclic block references).
#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub label: String,
    pub params: Vec<BlockParam>,
    pub instructions: Vec<Instruction>,
    /// True iff the last instruction's opcode is a terminator. Kept in sync
    /// by [`BasicBlock::append`]; callers that directly mutate
    /// `instructions` are responsible for the invariant themselves.
    pub terminated: bool,
}

impl BasicBlock {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into(), params: Vec::new(), instructions: Vec::new(), terminated: false }
    }

    pub fn with_params(mut self, params: Vec<BlockParam>) -> Self {
        self.params = params;
        self
    }

    /// Appends `instr` to this block. Once a terminator has been appended,
    /// further appends panic: the block is sealed per spec.md §3.5.
    pub fn append(&mut self, instr: Instruction) {
        assert!(!self.terminated, "cannot append to block '{}' after its terminator", self.label);
        self.terminated = instr.is_terminator();
        self.instructions.push(instr);
    }

    pub fn terminator(&self) -> Option<&Instruction> {
        self.instructions.last().filter(|i| i.is_terminator())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::Opcode;
    use crate::value::Value;

    #[test]
    fn append_marks_block_terminated_on_terminator() {
        let mut block = BasicBlock::new("entry");
        block.append(Instruction::new(Opcode::Ret, Type::I64).with_operands(vec![Value::ConstInt(0)]));
        assert!(block.terminated);
        assert!(block.terminator().is_some());
    }

    #[test]
    #[should_panic(expected = "cannot append")]
    fn append_after_terminator_panics() {
        let mut block = BasicBlock::new("entry");
        block.append(Instruction::new(Opcode::Ret, Type::I64).with_operands(vec![Value::ConstInt(0)]));
        block.append(Instruction::new(Opcode::Ret, Type::I64).with_operands(vec![Value::ConstInt(1)]));
    }
}

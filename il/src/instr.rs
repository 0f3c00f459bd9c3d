use il_support::SourceLoc;

use crate::opcode::Opcode;
use crate::types::Type;
use crate::value::Value;

/// A single IL instruction. Field population follows the opcode's metadata:
/// `result`/`ty` only carry meaning the opcode's `result_arity`/`result_type`
/// declare, `callee` only for `call`/`call.indirect`, and `labels`/`br_args`
/// only for branch-family opcodes (paired one-for-one: `br_args[i]` is the
/// argument bundle carried to `labels[i]`).
#[derive(Debug, Clone)]
pub struct Instruction {
    pub op: Opcode,
    pub result: Option<u32>,
    pub ty: Type,
    pub operands: Vec<Value>,
    pub callee: Option<String>,
    pub labels: Vec<String>,
    pub br_args: Vec<Vec<Value>>,
    pub loc: SourceLoc,
}

impl Instruction {
    pub fn new(op: Opcode, ty: Type) -> Self {
        Self {
            op,
            result: None,
            ty,
            operands: Vec::new(),
            callee: None,
            labels: Vec::new(),
            br_args: Vec::new(),
            loc: SourceLoc::UNKNOWN,
        }
    }

    pub fn with_result(mut self, id: u32) -> Self {
        self.result = Some(id);
        self
    }

    pub fn with_operands(mut self, operands: Vec<Value>) -> Self {
        self.operands = operands;
        self
    }

    pub fn with_callee(mut self, callee: impl Into<String>) -> Self {
        self.callee = Some(callee.into());
        self
    }

    pub fn with_target(mut self, label: impl Into<String>, args: Vec<Value>) -> Self {
        self.labels.push(label.into());
        self.br_args.push(args);
        self
    }

    pub fn with_loc(mut self, loc: SourceLoc) -> Self {
        self.loc = loc;
        self
    }

    pub fn is_terminator(&self) -> bool {
        self.op.is_terminator()
    }
}

//! A function activation: its register file and the exception-handler
//! stack that `eh.push`/`eh.pop` maintain within it (spec.md §4.6.1, §4.6.4).

use hashbrown::HashMap;

use il::Value;

use crate::value::{const_to_runtime, RuntimeValue};

/// One installed handler: the block to resume into on a trap, and the
/// handler-stack depth at the time it was pushed (kept for diagnostics —
/// an `eh.pop` past the bottom of the stack is a VM-level invariant
/// violation the verifier already rules out statically).
#[derive(Debug, Clone, Copy)]
pub struct HandlerFrame {
    pub handler_block: usize,
    pub depth_on_push: usize,
}

#[derive(Debug, Default)]
pub struct Frame {
    regs: HashMap<u32, RuntimeValue>,
    pub eh_stack: Vec<HandlerFrame>,
}

impl Frame {
    pub fn new() -> Self {
        Self { regs: HashMap::new(), eh_stack: Vec::new() }
    }

    pub fn set(&mut self, id: u32, value: RuntimeValue) {
        self.regs.insert(id, value);
    }

    pub fn get(&self, id: u32) -> Option<&RuntimeValue> {
        self.regs.get(&id)
    }

    /// Resolves an operand to a runtime value: register lookup for
    /// `Value::Temp`, direct conversion for every constant form.
    pub fn read(&self, v: &Value) -> Option<RuntimeValue> {
        match v {
            Value::Temp(id) => self.regs.get(id).cloned(),
            other => const_to_runtime(other),
        }
    }

    pub fn push_handler(&mut self, handler_block: usize) {
        self.eh_stack.push(HandlerFrame { handler_block, depth_on_push: self.eh_stack.len() });
    }
}

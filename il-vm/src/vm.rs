//! The register-based virtual machine (spec.md §4.6): owns the call stack,
//! the heap, the string table, and the exception-handler protocol, and runs
//! a verified [`Module`] to completion or to an unhandled trap.
//!
//! Callers must only ever hand this a module that has already passed
//! `il_verify::verify_module` — the VM trusts SSA dominance, block
//! termination, and handler-stack balance rather than re-checking them.

use hashbrown::HashMap;
use std::rc::Rc;

use il::{Function, GlobalInit, Module, Type, Value};
use il_support::SourceManager;

use crate::config::VmConfig;
use crate::debug::DebugCtrl;
use crate::dispatch::{handler_for, ExecResult};
use crate::error::{FrameInfo, TrapKind, VmError};
use crate::externs::ExternTable;
use crate::frame::Frame;
use crate::memory::Heap;
use crate::trace::{self, TraceCache};
use crate::value::{ErrorRecord, RuntimeValue};

/// One activation record on the call stack: which function is running,
/// its register file and handler stack, and where execution currently is.
pub struct ExecState<'m> {
    pub function: &'m Function,
    pub frame: Frame,
    pub block: usize,
    pub ip: usize,
}

/// Either side of a call: the VM resolves both functions and externs
/// through one name-keyed table so `call`/`call.indirect` share the same
/// dispatch path.
enum Callee<'m> {
    Function(&'m Function),
    Extern(String),
}

/// The single-use capability `eh.entry` reifies: the error that was caught,
/// plus the two places a `resume.*` inside the handler can resume — same
/// instruction (retry) or the one after it (skip and continue). Resuming
/// across a function boundary hands control back to the caller at its
/// `call` instruction, since that's the frame whose handler fired (see
/// DESIGN.md's note on cross-frame unwinding).
pub(crate) struct PendingResume {
    pub record: ErrorRecord,
    pub resume_same: (usize, usize),
    pub resume_next: (usize, usize),
}

pub struct Vm<'m> {
    module: &'m Module,
    heap: Heap,
    strings: Vec<Rc<Vec<u8>>>,
    global_ptrs: HashMap<String, u64>,
    fn_ptr_to_name: HashMap<u64, String>,
    name_to_fn_ptr: HashMap<String, u64>,
    externs: ExternTable,
    config: VmConfig,
    debug: DebugCtrl,
    trace_cache: TraceCache,
    sources: Option<&'m SourceManager>,
    pub(crate) call_stack: Vec<ExecState<'m>>,
    pub(crate) pending_resume: Option<PendingResume>,
    last_trap_message: Option<String>,
}

impl<'m> Vm<'m> {
    pub fn new(module: &'m Module, config: VmConfig) -> Self {
        let mut heap = Heap::new();
        let mut global_ptrs = HashMap::new();
        for global in &module.globals {
            let ptr = match &global.init {
                GlobalInit::Bytes(bytes) => heap.alloc_bytes(bytes.clone()),
                GlobalInit::ZeroedOfType(ty) => heap.alloc(type_width(*ty)),
            };
            global_ptrs.insert(global.name.clone(), ptr);
        }

        let mut debug = DebugCtrl::new();
        for (path, line) in &config.breakpoints {
            debug.add_breakpoint(path, *line);
        }

        let mut vm = Self {
            module,
            heap,
            strings: Vec::new(),
            global_ptrs,
            fn_ptr_to_name: HashMap::new(),
            name_to_fn_ptr: HashMap::new(),
            externs: ExternTable::with_builtins(),
            config,
            debug,
            trace_cache: TraceCache::new(),
            sources: None,
            call_stack: Vec::new(),
            pending_resume: None,
            last_trap_message: None,
        };
        vm.assign_function_pointers();
        vm
    }

    fn assign_function_pointers(&mut self) {
        log::debug!("building dispatch table for {} function(s)", self.module.functions.len());
        for (i, f) in self.module.functions.iter().enumerate() {
            let ptr = crate::memory::encode_ptr(0xFFFF_0000 | i as u32, 0);
            self.fn_ptr_to_name.insert(ptr, f.name.clone());
            self.name_to_fn_ptr.insert(f.name.clone(), ptr);
        }
    }

    pub fn attach_sources(&mut self, sources: &'m SourceManager) {
        self.sources = Some(sources);
    }

    pub fn externs_mut(&mut self) -> &mut ExternTable {
        &mut self.externs
    }

    pub fn last_trap_message(&self) -> Option<&str> {
        self.last_trap_message.as_deref()
    }

    /// Re-arms the last-hit breakpoint so the next instruction on that line
    /// fires again (spec.md §4.6.6's `resetLastHit`), for host debuggers
    /// that single-step past a hit and want to re-break on return.
    pub fn reset_last_breakpoint_hit(&mut self) {
        self.debug.reset_last_hit();
    }

    /// Runs `entry` to completion, returning its result or the error that
    /// halted the machine (spec.md §6.1 — `ilc run`'s exit code is derived
    /// from this result by the caller).
    pub fn run(&mut self, entry: &str, args: Vec<RuntimeValue>) -> Result<RuntimeValue, VmError> {
        let func = self.module.find_function(entry).ok_or_else(|| VmError::UnknownCallee { name: entry.to_string() })?;
        self.push_function_frame(func, args);

        loop {
            let (function, block, ip) = {
                let top = self.top();
                (top.function, top.block, top.ip)
            };
            let instr = &function.blocks[block].instructions[ip];

            if self.config.trace.il {
                trace::trace_il(&function.name, &function.blocks[block].label, ip, instr.op.mnemonic());
            }
            if self.config.trace.src {
                trace::trace_src(&mut self.trace_cache, self.sources, instr.loc);
            }
            if self.debug.has_breakpoints() && self.debug.should_break(self.sources, instr.loc) {
                let path = self.sources.map(|s| s.get_path(instr.loc.file_id)).unwrap_or("");
                eprintln!("[BREAK] {path}:{}:{} fn=@{}", instr.loc.line, instr.loc.column, function.name);
            }

            let handler = handler_for(instr.op.info().vm_dispatch);
            let result = handler(self, instr);

            match result {
                ExecResult::Continue => {
                    self.top_mut().ip += 1;
                }
                ExecResult::Jump { block, args } => {
                    let top = self.top_mut();
                    top.block = block;
                    top.ip = 0;
                    let params: Vec<u32> = top.function.blocks[block].params.iter().map(|p| p.id).collect();
                    for (param_id, arg) in params.into_iter().zip(args) {
                        top.frame.set(param_id, arg);
                    }
                }
                ExecResult::Resume { block, ip } => {
                    let top = self.top_mut();
                    top.block = block;
                    top.ip = ip;
                }
                ExecResult::Called => {}
                ExecResult::Return(value) => {
                    self.call_stack.pop();
                    match self.call_stack.last_mut() {
                        None => return Ok(value.unwrap_or(RuntimeValue::Int(0))),
                        Some(caller) => {
                            let call_instr = &caller.function.blocks[caller.block].instructions[caller.ip];
                            if let Some(result_id) = call_instr.result {
                                caller.frame.set(result_id, value.expect("non-void call site requires a return value"));
                            }
                            caller.ip += 1;
                        }
                    }
                }
                ExecResult::Trap(err) => {
                    if let Some(final_err) = self.handle_trap(err) {
                        return Err(final_err);
                    }
                }
            }
        }
    }

    /// Searches the call stack, innermost frame first, for an installed
    /// handler. A frame with no handler is unwound (discarded) and the
    /// search continues in its caller — whose `ip` still points at the
    /// `call` that led here, which is exactly where `resume.same`/
    /// `resume.next` should land if that frame's handler catches it.
    /// Returns `Some(err)` only once the call stack is exhausted.
    fn handle_trap(&mut self, err: VmError) -> Option<VmError> {
        let line = match &err {
            VmError::Trap { frame, .. } => frame.loc.line as i32,
            _ => 0,
        };
        let record = ErrorRecord { kind: err.trap_kind().as_code(), code: 0, ip: self.top().ip as u32, line, data: 0 };
        loop {
            let frame_empty = self.call_stack.is_empty();
            if frame_empty {
                self.last_trap_message = Some(err.to_string());
                return Some(err);
            }
            let resume_same = (self.top().block, self.top().ip);
            let resume_next = (self.top().block, self.top().ip + 1);
            if let Some(handler) = self.top_mut().frame.eh_stack.pop() {
                self.pending_resume = Some(PendingResume { record, resume_same, resume_next });
                let top = self.top_mut();
                top.block = handler.handler_block;
                top.ip = 0;
                return None;
            }
            if self.call_stack.len() == 1 {
                self.last_trap_message = Some(err.to_string());
                return Some(err);
            }
            self.call_stack.pop();
        }
    }

    fn push_function_frame(&mut self, func: &'m Function, args: Vec<RuntimeValue>) {
        let mut frame = Frame::new();
        for (param, arg) in func.params.iter().zip(args) {
            frame.set(param.id, arg);
        }
        self.call_stack.push(ExecState { function: func, frame, block: 0, ip: 0 });
    }

    pub(crate) fn top(&self) -> &ExecState<'m> {
        self.call_stack.last().expect("dispatch only runs while a frame is active")
    }

    pub(crate) fn top_mut(&mut self) -> &mut ExecState<'m> {
        self.call_stack.last_mut().expect("dispatch only runs while a frame is active")
    }

    pub(crate) fn heap(&self) -> &Heap {
        &self.heap
    }

    pub(crate) fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    pub(crate) fn resolve_label(&self, label: &str) -> usize {
        self.top().function.block_index(label).expect("verified module guarantees labels resolve")
    }

    pub(crate) fn frame_info(&self, instr: &il::Instruction) -> FrameInfo {
        let top = self.top();
        FrameInfo {
            function: top.function.name.clone(),
            block: top.function.blocks[top.block].label.clone(),
            ip: top.ip,
            loc: instr.loc,
            handler_installed: !top.frame.eh_stack.is_empty(),
        }
    }

    /// Resolves an operand to a runtime value. `Value::GlobalAddr` is the
    /// one variant [`Frame::read`] can't handle on its own since it needs
    /// the VM-wide global table, not the current frame's registers.
    pub(crate) fn read_operand(&self, v: &Value) -> RuntimeValue {
        match v {
            Value::GlobalAddr(name) => RuntimeValue::Ptr(*self.global_ptrs.get(name).unwrap_or(&0)),
            other => self.top().frame.read(other).expect("verified module guarantees operands are defined before use"),
        }
    }

    pub(crate) fn set_result(&mut self, instr: &il::Instruction, value: RuntimeValue) {
        if let Some(id) = instr.result {
            self.top_mut().frame.set(id, value);
        }
    }

    pub(crate) fn resolve_fn_ptr(&self, ptr: u64) -> Option<String> {
        self.fn_ptr_to_name.get(&ptr).cloned()
    }

    /// Shared tail of `call`/`call.indirect`: resolves `name` against
    /// functions first, then externs, pushes a new frame or invokes the
    /// extern inline, and reports an unknown callee otherwise.
    pub(crate) fn dispatch_call(&mut self, instr: &il::Instruction, name: &str, args: Vec<RuntimeValue>) -> ExecResult {
        let callee = if let Some(f) = self.module.find_function(name) {
            Callee::Function(f)
        } else if self.module.find_extern(name).is_some() {
            Callee::Extern(name.to_string())
        } else {
            return ExecResult::Trap(VmError::trap(TrapKind::UnhandledError, format!("call to unknown function or extern '{name}'"), self.frame_info(instr)));
        };

        match callee {
            Callee::Function(f) => {
                self.push_function_frame(f, args);
                ExecResult::Called
            }
            Callee::Extern(name) => match self.externs.resolve(&name) {
                Some(f) => match f(&args) {
                    Ok(value) => {
                        if let Some(v) = value {
                            self.set_result(instr, v);
                        }
                        ExecResult::Continue
                    }
                    Err(err) => ExecResult::Trap(err),
                },
                None => ExecResult::Trap(VmError::UnknownCallee { name }),
            },
        }
    }

    /// Copies a register-held value (not already a pointer) into a fresh
    /// heap slot and returns its address, for `addr_of` on a value with no
    /// storage of its own. Materialized values always use their natural
    /// full width since there is no declared `Type` to narrow against.
    pub(crate) fn materialize(&mut self, value: &RuntimeValue) -> u64 {
        let ty = match value {
            RuntimeValue::Int(_) => Type::I64,
            RuntimeValue::Float(_) => Type::F64,
            RuntimeValue::Ptr(_) => Type::Ptr,
            RuntimeValue::Str(_) => Type::Str,
            RuntimeValue::Error(_) => Type::Error,
            RuntimeValue::ResumeTok(_) => Type::ResumeTok,
        };
        let bytes = self.value_bytes(value, ty);
        self.heap.alloc_bytes(bytes)
    }

    pub(crate) fn load_typed(&mut self, addr: u64, ty: Type) -> Result<RuntimeValue, TrapKind> {
        let width = type_width(ty);
        let bytes = self.heap.read(addr, width)?.to_vec();
        Ok(self.bytes_to_value(&bytes, ty))
    }

    pub(crate) fn store_typed(&mut self, addr: u64, ty: Type, value: &RuntimeValue) -> Result<(), TrapKind> {
        let bytes = self.value_bytes(value, ty);
        self.heap.write(addr, &bytes)
    }

    /// Encodes `value` to exactly `type_width(ty)` bytes, little-endian —
    /// the width `load_typed`/`Heap::read` will later ask for at the same
    /// address. Integers are truncated to `ty`'s width; every other variant
    /// already has one fixed on-disk width regardless of `ty`.
    fn value_bytes(&mut self, value: &RuntimeValue, ty: Type) -> Vec<u8> {
        match value {
            RuntimeValue::Int(v) => v.to_le_bytes()[..type_width(ty)].to_vec(),
            RuntimeValue::Float(v) => v.to_le_bytes().to_vec(),
            RuntimeValue::Ptr(v) => v.to_le_bytes().to_vec(),
            RuntimeValue::Str(s) => {
                let idx = self.strings.len() as u64;
                self.strings.push(s.clone());
                idx.to_le_bytes().to_vec()
            }
            RuntimeValue::Error(r) | RuntimeValue::ResumeTok(r) => {
                let mut out = Vec::with_capacity(16);
                out.extend_from_slice(&r.kind.to_le_bytes());
                out.extend_from_slice(&r.code.to_le_bytes());
                out.extend_from_slice(&r.ip.to_le_bytes());
                out.extend_from_slice(&r.line.to_le_bytes());
                out.extend_from_slice(&r.data.to_le_bytes());
                out
            }
        }
    }

    fn bytes_to_value(&self, bytes: &[u8], ty: Type) -> RuntimeValue {
        match ty {
            Type::I1 => RuntimeValue::Int((bytes[0] & 1) as i64),
            Type::I16 => RuntimeValue::Int(i16::from_le_bytes(bytes[..2].try_into().unwrap()) as i64),
            Type::I32 => RuntimeValue::Int(i32::from_le_bytes(bytes[..4].try_into().unwrap()) as i64),
            Type::I64 => RuntimeValue::Int(i64::from_le_bytes(bytes[..8].try_into().unwrap())),
            Type::F64 => RuntimeValue::Float(f64::from_le_bytes(bytes[..8].try_into().unwrap())),
            Type::Ptr => RuntimeValue::Ptr(u64::from_le_bytes(bytes[..8].try_into().unwrap())),
            Type::Str => {
                let idx = u64::from_le_bytes(bytes[..8].try_into().unwrap()) as usize;
                RuntimeValue::Str(self.strings.get(idx).cloned().unwrap_or_else(|| Rc::new(Vec::new())))
            }
            Type::Error | Type::ResumeTok => {
                let record = ErrorRecord {
                    kind: u16::from_le_bytes(bytes[0..2].try_into().unwrap()),
                    code: u16::from_le_bytes(bytes[2..4].try_into().unwrap()),
                    ip: u32::from_le_bytes(bytes[4..8].try_into().unwrap()),
                    line: i32::from_le_bytes(bytes[8..12].try_into().unwrap()),
                    data: u32::from_le_bytes(bytes[12..16].try_into().unwrap()),
                };
                if ty == Type::Error {
                    RuntimeValue::Error(record)
                } else {
                    RuntimeValue::ResumeTok(record)
                }
            }
            Type::Void => RuntimeValue::Int(0),
        }
    }
}

fn type_width(ty: Type) -> usize {
    match ty {
        Type::Void => 0,
        Type::I1 => 1,
        Type::I16 => 2,
        Type::I32 => 4,
        Type::I64 => 8,
        Type::F64 => 8,
        Type::Ptr => 8,
        Type::Str => 8,
        Type::Error => 16,
        Type::ResumeTok => 16,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use il_io::parse_module;

    fn run(src: &str) -> Result<RuntimeValue, VmError> {
        let module = parse_module(src, 1).expect("parses cleanly");
        let mut vm = Vm::new(&module, VmConfig::default());
        vm.run("main", Vec::new())
    }

    #[test]
    fn runs_trivial_arithmetic() {
        let src = "il 0.1\nfunc @main() -> i64 {\nentry:\n  %0 = add i64 40, 2\n  ret %0\n}\n";
        assert_eq!(run(src).unwrap(), RuntimeValue::Int(42));
    }

    #[test]
    fn branch_binds_block_params() {
        let src = "\
il 0.1
func @main() -> i64 {
entry:
  br ^next(41)
next(i64 %x):
  %0 = add i64 %x, 1
  ret %0
}
";
        assert_eq!(run(src).unwrap(), RuntimeValue::Int(42));
    }

    #[test]
    fn division_by_zero_traps() {
        let src = "il 0.1\nfunc @main() -> i64 {\nentry:\n  %0 = sdiv.chk0 i64 1, 0\n  ret %0\n}\n";
        let err = run(src).unwrap_err();
        assert!(matches!(err, VmError::Trap { kind: TrapKind::DivideByZero, .. }));
    }

    #[test]
    fn handler_catches_trap_and_resumes_next() {
        let src = "\
il 0.1
func @main() -> i64 {
entry:
  eh.push ^handler
  %0 = sdiv.chk0 i64 1, 0
  eh.pop
  ret %0
handler:
  %t = eh.entry
  resume.next
}
";
        assert_eq!(run(src).unwrap(), RuntimeValue::Int(0));
    }

    #[test]
    fn call_and_return_thread_value_through_caller() {
        let src = "\
il 0.1
func @add_one(i64 %x) -> i64 {
entry:
  %0 = add i64 %x, 1
  ret %0
}
func @main() -> i64 {
entry:
  %0 = call @add_one(41)
  ret %0
}
";
        assert_eq!(run(src).unwrap(), RuntimeValue::Int(42));
    }

    #[test]
    fn switch_falls_through_to_default() {
        let src = "\
il 0.1
func @main() -> i64 {
entry:
  switch.i32 7, ^def, 1 -> ^one, 2 -> ^two
one:
  ret 1
two:
  ret 2
def:
  ret 9
}
";
        assert_eq!(run(src).unwrap(), RuntimeValue::Int(9));
    }
}

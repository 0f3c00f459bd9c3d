//! Signature rules (per instruction) and control-flow rules (per function)
//! from §4.4.2. Exception-handler rules live in `eh.rs`; this module covers
//! everything else in the minimum rule set.

use hashbrown::{HashMap, HashSet};

use il::{Function, Instruction, Module, Opcode, ResultArity, Type, TypeCategory, Value, VARIADIC};
use il_support::{Diagnostic, Diagnostics};

use crate::cfg::Cfg;
use crate::dominators::{compute_dominators, dominates};

/// All rules that need only the instruction and the module's extern/function
/// signature table (call result-arity resolution).
pub fn check_signature(module: &Module, instr: &Instruction, temp_types: &HashMap<u32, Type>) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    let info = instr.op.info();
    let mnemonic = instr.op.mnemonic();

    match info.result_arity {
        ResultArity::None => {
            if instr.result.is_some() {
                out.push(
                    Diagnostic::error(format!("{mnemonic}: must not produce a result"), instr.loc).with_code("sig.unexpected-result"),
                );
            }
        }
        ResultArity::One => {
            if instr.result.is_none() {
                out.push(Diagnostic::error(format!("{mnemonic}: must produce a result"), instr.loc).with_code("sig.missing-result"));
            }
        }
        ResultArity::Optional => {
            if let Some(expects_result) = call_expects_result(module, instr) {
                if expects_result && instr.result.is_none() {
                    out.push(
                        Diagnostic::error(format!("{mnemonic}: callee returns a value but no result is bound"), instr.loc)
                            .with_code("sig.missing-result"),
                    );
                } else if !expects_result && instr.result.is_some() {
                    out.push(
                        Diagnostic::error(format!("{mnemonic}: callee is void but a result is bound"), instr.loc)
                            .with_code("sig.unexpected-result"),
                    );
                }
            }
        }
    }

    let n = instr.operands.len();
    let min = info.num_operands_min as usize;
    let within_max = info.num_operands_max == VARIADIC || n <= info.num_operands_max as usize;
    if n < min || !within_max {
        out.push(
            Diagnostic::error(format!("{mnemonic}: operand count {n} out of range for this opcode"), instr.loc)
                .with_code("sig.operand-count"),
        );
    }

    let labels_n = instr.labels.len();
    if info.num_successors == VARIADIC {
        if labels_n < 1 {
            out.push(Diagnostic::error(format!("{mnemonic}: expected at least one successor"), instr.loc).with_code("sig.successor-min"));
        }
    } else if labels_n != info.num_successors as usize {
        out.push(
            Diagnostic::error(format!("{mnemonic}: expected {} successor(s), found {labels_n}", info.num_successors), instr.loc)
                .with_code("sig.successor-exact"),
        );
    }

    if !instr.br_args.is_empty() && instr.br_args.len() != instr.labels.len() {
        let code = if info.num_successors == VARIADIC { "sig.branch-args-variadic" } else { "sig.branch-args-exact" };
        out.push(
            Diagnostic::error(format!("{mnemonic}: branch-argument bundle count does not match successor count"), instr.loc)
                .with_code(code),
        );
    }

    for (i, category) in info.operand_types.iter().enumerate() {
        if matches!(category, TypeCategory::None) {
            continue;
        }
        let Some(operand) = instr.operands.get(i) else { continue };
        let Some(actual) = value_type(operand, temp_types) else { continue };
        if !category.accepts(actual, instr.ty) {
            out.push(
                Diagnostic::error(format!("{mnemonic}: operand {i} has type '{actual}', expected {category:?}"), instr.loc)
                    .with_code("sig.type-mismatch"),
            );
        }
    }

    if !matches!(info.result_type, TypeCategory::None) && instr.result.is_some() && !info.result_type.accepts(instr.ty, instr.ty) {
        out.push(Diagnostic::error(format!("{mnemonic}: result type '{}' does not match declared result type", instr.ty), instr.loc).with_code("sig.type-mismatch"));
    }

    out
}

/// Whether `instr` (a `call`/`call.indirect`) resolves to a callee with a
/// non-`void` return type. `None` when the callee cannot be resolved (an
/// indirect call, or a name matching neither a function nor an extern) —
/// that case is reported separately, not folded into this check.
fn call_expects_result(module: &Module, instr: &Instruction) -> Option<bool> {
    if !matches!(instr.op, Opcode::Call) {
        return None;
    }
    let name = instr.callee.as_ref()?;
    if let Some(f) = module.find_function(name) {
        return Some(f.ret != Type::Void);
    }
    if let Some(e) = module.find_extern(name) {
        return Some(e.ret != Type::Void);
    }
    None
}

fn value_type(value: &Value, temp_types: &HashMap<u32, Type>) -> Option<Type> {
    match value {
        Value::Temp(id) => temp_types.get(id).copied(),
        Value::ConstFloat(_) => Some(Type::F64),
        Value::ConstBool(_) => Some(Type::I1),
        Value::ConstStr(_) => Some(Type::Str),
        Value::GlobalAddr(_) => Some(Type::Ptr),
        // Bare integer literals carry no fixed width of their own; the
        // declared operand category is trusted instead of guessing one.
        Value::ConstInt(_) | Value::ConstNull => None,
    }
}

/// Builds the SSA id -> type map used to resolve `Value::Temp` operands
/// during signature checking: every instruction result, plus every block
/// parameter.
pub fn build_temp_types(func: &Function) -> HashMap<u32, Type> {
    let mut map = HashMap::new();
    for block in &func.blocks {
        for param in &block.params {
            map.insert(param.id, param.ty);
        }
        for instr in &block.instructions {
            if let Some(id) = instr.result {
                map.insert(id, instr.ty);
            }
        }
    }
    for param in &func.params {
        map.insert(param.id, param.ty);
    }
    map
}

/// Control-flow rules that need the whole function: label resolution, block
/// termination, switch-case uniqueness, branch-argument arity against the
/// target block's parameter list, and SSA dominance.
pub fn check_control_flow(func: &Function, cfg: &Cfg) -> Diagnostics {
    let mut diags = Diagnostics::new();

    for block in &func.blocks {
        match block.terminator() {
            None => {
                let loc = block.instructions.last().map(|i| i.loc).unwrap_or_default();
                diags.push(Diagnostic::error(format!("block '{}' is not terminated", block.label), loc).with_code("flow.unterminated"));
            }
            Some(term) => {
                for label in &term.labels {
                    if func.block_index(label).is_none() {
                        diags.push(Diagnostic::error(format!("unknown block '{label}'"), term.loc).with_code("flow.unknown-block"));
                    }
                }
                for (label, args) in term.labels.iter().zip(term.br_args.iter()) {
                    if let Some(target) = func.find_block(label) {
                        if !args.is_empty() && args.len() != target.params.len() {
                            diags.push(
                                Diagnostic::error(
                                    format!("branch to '^{label}': expected {} argument(s), found {}", target.params.len(), args.len()),
                                    term.loc,
                                )
                                .with_code("flow.branch-arity"),
                            );
                        }
                    }
                }
                if matches!(term.op, Opcode::SwitchI32) {
                    let mut seen = HashSet::new();
                    for value in term.operands.iter().skip(1) {
                        if let Value::ConstInt(v) = value {
                            if !seen.insert(*v) {
                                diags.push(
                                    Diagnostic::error(format!("switch.i32: duplicate case value {v}"), term.loc)
                                        .with_code("flow.switch-duplicate-case"),
                                );
                            }
                        }
                    }
                }
            }
        }
    }

    diags.extend(check_ssa_dominance(func, cfg));
    diags
}

fn check_ssa_dominance(func: &Function, cfg: &Cfg) -> Diagnostics {
    let mut diags = Diagnostics::new();
    if func.blocks.is_empty() {
        return diags;
    }

    let idom = compute_dominators(func.blocks.len(), 0, &cfg.preds, &cfg.succs);
    let reachable = cfg.reachable_from(0);

    // Block index, and index-within-block, that a temp was defined at —
    // used so a use in the *same* block must come strictly after its def.
    let mut def_site: HashMap<u32, (usize, usize)> = HashMap::new();
    for (bi, block) in func.blocks.iter().enumerate() {
        for param in &block.params {
            def_site.insert(param.id, (bi, 0));
        }
        for (ii, instr) in block.instructions.iter().enumerate() {
            if let Some(id) = instr.result {
                def_site.insert(id, (bi, ii + 1));
            }
        }
    }

    for (bi, block) in func.blocks.iter().enumerate() {
        if !reachable[bi] {
            continue;
        }
        for (ii, instr) in block.instructions.iter().enumerate() {
            for operand in &instr.operands {
                let Value::Temp(id) = operand else { continue };
                check_temp_dominates(&mut diags, &idom, &def_site, *id, bi, ii, instr.loc);
            }
            for bundle in &instr.br_args {
                for operand in bundle {
                    let Value::Temp(id) = operand else { continue };
                    check_temp_dominates(&mut diags, &idom, &def_site, *id, bi, ii, instr.loc);
                }
            }
        }
    }
    diags
}

fn check_temp_dominates(
    diags: &mut Diagnostics,
    idom: &[Option<usize>],
    def_site: &HashMap<u32, (usize, usize)>,
    id: u32,
    use_block: usize,
    use_index: usize,
    loc: il_support::SourceLoc,
) {
    let Some(&(def_block, def_index)) = def_site.get(&id) else {
        diags.push(Diagnostic::error(format!("use of undefined temporary %{id}"), loc).with_code("flow.ssa-undefined"));
        return;
    };
    let dominates_use = if def_block == use_block { def_index <= use_index } else { dominates(idom, def_block, use_block) };
    if !dominates_use {
        diags.push(Diagnostic::error(format!("temporary %{id} used before its definition dominates this use"), loc).with_code("flow.ssa-dominance"));
    }
}

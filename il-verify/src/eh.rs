//! Exception-handler data-flow analysis (§4.4.3) and resume postdominance
//! (§4.4.4). Both are whole-function analyses, so neither fits the
//! per-instruction `Rule` shape in `rules.rs`; they run as their own pass
//! over a function and feed the same `Diagnostics` batch.

use hashbrown::{HashMap, HashSet};
use std::collections::VecDeque;

use il::{Function, Opcode};
use il_support::{Diagnostic, Diagnostics};

use crate::cfg::Cfg;
use crate::dominators::{compute_postdominators, dominates};

/// Abstract state tracked per reachable edge: which handlers are registered
/// (as block indices, innermost last) and whether a resume token is live.
type HandlerStack = Vec<usize>;

struct ResumeCheck {
    target: usize,
    handler: usize,
    instr_loc: il_support::SourceLoc,
}

pub fn check_function(func: &Function, cfg: &Cfg) -> Diagnostics {
    let mut diags = Diagnostics::new();
    if func.blocks.is_empty() {
        return diags;
    }

    let mut visited: HashSet<(usize, HandlerStack, bool)> = HashSet::new();
    let mut worklist: VecDeque<(usize, HandlerStack, bool)> = VecDeque::new();
    worklist.push_back((0, Vec::new(), false));

    // handler entry block index -> set of blocks that have been observed to
    // fault into it.
    let mut coverage: HashMap<usize, HashSet<usize>> = HashMap::new();
    let mut resume_checks: Vec<ResumeCheck> = Vec::new();

    while let Some((block_idx, handler_stack_in, resume_tok_in)) = worklist.pop_front() {
        let key = (block_idx, handler_stack_in.clone(), resume_tok_in);
        if visited.contains(&key) {
            continue;
        }
        visited.insert(key);

        let mut handler_stack = handler_stack_in;
        let mut has_resume_token = resume_tok_in;
        let block = &func.blocks[block_idx];

        for instr in &block.instructions {
            // Every potentially-faulting instruction (not just an explicit
            // `trap`/`trap.from_err`) can transfer to the innermost live
            // handler at runtime — checked arithmetic, `idx.chk`, checked
            // casts, and calls all raise traps the VM synthesizes on the
            // fly. Both the postdominance coverage set (§4.4.4) and the
            // handler's own internal push/pop/resume balance (§4.4.3) need
            // this edge walked, or a handler only ever reached through
            // checked arithmetic would never be visited at all.
            if crate::purity::can_trap(instr) && !matches!(instr.op, Opcode::Trap | Opcode::TrapFromErr) {
                if let Some(&handler) = handler_stack.last() {
                    coverage.entry(handler).or_default().insert(block_idx);
                    push(&mut worklist, &visited, handler, handler_stack.clone(), true);
                }
            }
            match instr.op {
                Opcode::EhPush => {
                    if let Some(h) = instr.labels.first().and_then(|l| func.block_index(l)) {
                        handler_stack.push(h);
                    }
                }
                Opcode::EhPop => {
                    if handler_stack.is_empty() {
                        diags.push(
                            Diagnostic::error(
                                format!("eh.pop: handler stack underflow in block '{}'", block.label),
                                instr.loc,
                            )
                            .with_code("eh.stack.underflow"),
                        );
                    } else {
                        handler_stack.pop();
                    }
                }
                Opcode::ResumeSame | Opcode::ResumeNext => {
                    if !has_resume_token {
                        diags.push(
                            Diagnostic::error(
                                format!("{}: no live resume token in block '{}'", instr.op.mnemonic(), block.label),
                                instr.loc,
                            )
                            .with_code("eh.resume.token"),
                        );
                    } else {
                        handler_stack.pop();
                        has_resume_token = false;
                    }
                }
                Opcode::ResumeLabel => {
                    if !has_resume_token {
                        diags.push(
                            Diagnostic::error(
                                format!("resume.label: no live resume token in block '{}'", block.label),
                                instr.loc,
                            )
                            .with_code("eh.resume.token"),
                        );
                    } else if let Some(&handler) = handler_stack.last() {
                        handler_stack.pop();
                        has_resume_token = false;
                        if let Some(target) = instr.labels.first().and_then(|l| func.block_index(l)) {
                            resume_checks.push(ResumeCheck { target, handler, instr_loc: instr.loc });
                            push(&mut worklist, &visited, target, handler_stack.clone(), false);
                        }
                    } else {
                        has_resume_token = false;
                    }
                }
                Opcode::Ret => {
                    if !handler_stack.is_empty() {
                        diags.push(
                            Diagnostic::error(
                                format!("unmatched eh.push depth {}; path: {}", handler_stack.len(), block.label),
                                instr.loc,
                            )
                            .with_code("eh.stack.leak"),
                        );
                    }
                }
                Opcode::Trap | Opcode::TrapFromErr => {
                    if let Some(&handler) = handler_stack.last() {
                        coverage.entry(handler).or_default().insert(block_idx);
                        push(&mut worklist, &visited, handler, handler_stack.clone(), true);
                    }
                }
                _ if instr.is_terminator() => {
                    for label in &instr.labels {
                        if let Some(target) = func.block_index(label) {
                            push(&mut worklist, &visited, target, handler_stack.clone(), has_resume_token);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    if !resume_checks.is_empty() {
        let pd = compute_postdominators(func.blocks.len(), &cfg.preds, &cfg.succs, &cfg.exits());
        for check in &resume_checks {
            let Some(faulting) = coverage.get(&check.handler) else { continue };
            for &f in faulting {
                if !dominates(&pd, check.target, f) {
                    diags.push(
                        Diagnostic::error(
                            format!(
                                "target ^{} must postdominate block {}",
                                func.blocks[check.target].label, func.blocks[f].label
                            ),
                            check.instr_loc,
                        )
                        .with_code("eh.resume.label.dominates"),
                    );
                }
            }
        }
    }

    diags
}

fn push(
    worklist: &mut VecDeque<(usize, HandlerStack, bool)>,
    visited: &HashSet<(usize, HandlerStack, bool)>,
    block: usize,
    handler_stack: HandlerStack,
    has_resume_token: bool,
) {
    let key = (block, handler_stack, has_resume_token);
    if !visited.contains(&key) {
        worklist.push_back(key);
    }
}

#[cfg(test)]
mod tests {
    use crate::verify_module;
    use il_io::parse_module;

    #[test]
    fn resume_label_target_must_postdominate_checked_arithmetic_not_just_explicit_trap() {
        // `entry` can fault via `sdiv.chk0` with no explicit `trap`
        // instruction anywhere in the function. `^bad` does not
        // postdominate `entry` (the `after` path skips it entirely), so
        // this must be rejected even though nothing here ever calls
        // `trap`/`trap.from_err` directly.
        let src = "\
il 0.1
func @main() -> i64 {
entry:
  eh.push ^handler
  %a = sdiv.chk0 i64 10, 0
  eh.pop
  br ^after
after:
  ret 0
handler:
  %tok = eh.entry
  resume.label ^bad
bad:
  ret -1
}
";
        let module = parse_module(src, 1).expect("parses cleanly");
        let err = verify_module(&module).unwrap_err();
        assert!(
            err.iter().any(|d| d.code.as_deref() == Some("eh.resume.label.dominates")),
            "expected eh.resume.label.dominates, got {:?}",
            err.iter().map(|d| d.code.clone()).collect::<Vec<_>>()
        );
    }
}

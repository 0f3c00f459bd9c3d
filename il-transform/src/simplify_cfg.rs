//! SimplifyCFG (spec.md §4.5.3, SPEC_FULL.md item 6): removes blocks
//! unreachable from the entry and fuses a block into its unique predecessor
//! when that predecessor has no other successor, as long as neither side is
//! exception-handler sensitive.

use il::{Function, Opcode};

use crate::analysis::{AnalysisManager, PreservedAnalyses};

pub fn simplify_cfg(func: &mut Function, am: &mut AnalysisManager) -> PreservedAnalyses {
    let removed_unreachable = remove_unreachable(func);
    if removed_unreachable {
        am.invalidate_all();
    }

    let mut merged_any = false;
    loop {
        let cfg = am.cfg(func).clone();
        let Some((pred, succ)) = find_mergeable_pair(func, &cfg) else { break };
        merge_blocks(func, pred, succ);
        am.invalidate_all();
        merged_any = true;
    }

    if removed_unreachable || merged_any {
        PreservedAnalyses::none()
    } else {
        PreservedAnalyses::all()
    }
}

fn remove_unreachable(func: &mut Function) -> bool {
    if func.blocks.is_empty() {
        return false;
    }
    let cfg = il_verify::Cfg::build(func);
    let reachable = cfg.reachable_from(0);
    let before = func.blocks.len();
    let mut kept = Vec::with_capacity(before);
    for (i, block) in func.blocks.drain(..).enumerate() {
        if reachable[i] {
            kept.push(block);
        }
    }
    func.blocks = kept;
    func.reindex();
    func.blocks.len() != before
}

/// A pair `(pred, succ)` is mergeable when `pred`'s only CFG successor is
/// `succ`, `succ`'s only CFG predecessor is `pred`, `succ` takes no block
/// parameters (so no phi-argument rebinding is needed), `succ` is not the
/// function's entry block, and neither block is exception-handler sensitive.
fn find_mergeable_pair(func: &Function, cfg: &il_verify::Cfg) -> Option<(usize, usize)> {
    for pred in 0..func.blocks.len() {
        let [succ] = cfg.succs[pred][..] else { continue };
        if succ == pred {
            continue;
        }
        // Block 0 is the function's entry point regardless of label; folding
        // it away as someone's sole successor would silently relocate the
        // entry to whatever block happens to end up at index 0 afterwards.
        if succ == 0 {
            continue;
        }
        if cfg.preds[succ] != [pred] {
            continue;
        }
        if !func.blocks[succ].params.is_empty() {
            continue;
        }
        if is_eh_sensitive(func, pred) || is_eh_sensitive(func, succ) {
            continue;
        }
        return Some((pred, succ));
    }
    None
}

/// A block is exception-handler sensitive if it pushes, pops, or enters a
/// handler, or ends in any `resume.*`. Folding such a block into its
/// neighbor would change which instructions observe the handler stack at
/// the fold point, so SimplifyCFG leaves it alone.
fn is_eh_sensitive(func: &Function, block: usize) -> bool {
    func.blocks[block].instructions.iter().any(|i| {
        matches!(
            i.op,
            Opcode::EhPush | Opcode::EhPop | Opcode::EhEntry | Opcode::ResumeSame | Opcode::ResumeNext | Opcode::ResumeLabel
        )
    })
}

fn merge_blocks(func: &mut Function, pred: usize, succ: usize) {
    let succ_block = func.blocks.remove(succ);
    // Removing `succ` shifts every later index down by one, so a `pred`
    // that came after `succ` must be adjusted before it's used again.
    let pred = if succ < pred { pred - 1 } else { pred };
    let pred_block = &mut func.blocks[pred];
    pred_block.instructions.pop();
    pred_block.instructions.extend(succ_block.instructions);
    func.reindex();
}

#[cfg(test)]
mod tests {
    use super::*;
    use il_io::parse_module;

    #[test]
    fn removes_unreachable_block() {
        let src = "\
il 0.1
func @f() -> i64 {
entry:
  ret 0
dead:
  ret 1
}
";
        let module = parse_module(src, 1).unwrap();
        let mut func = module.functions[0].clone();
        let mut am = AnalysisManager::new();
        simplify_cfg(&mut func, &mut am);
        assert_eq!(func.blocks.len(), 1);
        assert!(func.find_block("dead").is_none());
    }

    #[test]
    fn merges_single_successor_chain() {
        let src = "\
il 0.1
func @f() -> i64 {
entry:
  br ^mid
mid:
  br ^exit
exit:
  ret 0
}
";
        let module = parse_module(src, 1).unwrap();
        let mut func = module.functions[0].clone();
        let mut am = AnalysisManager::new();
        simplify_cfg(&mut func, &mut am);
        assert_eq!(func.blocks.len(), 1);
        assert_eq!(func.blocks[0].label, "entry");
    }

    #[test]
    fn does_not_merge_across_eh_push() {
        let src = "\
il 0.1
func @f() -> i64 {
entry:
  eh.push ^handler
  br ^mid
mid:
  eh.pop
  ret 0
handler:
  %t = eh.entry
  resume.same
}
";
        let module = parse_module(src, 1).unwrap();
        let mut func = module.functions[0].clone();
        let mut am = AnalysisManager::new();
        simplify_cfg(&mut func, &mut am);
        assert!(func.find_block("entry").is_some());
        assert!(func.find_block("mid").is_some());
    }

    #[test]
    fn does_not_merge_entry_block_into_its_sole_predecessor() {
        // `entry` has two successors (so it is never itself folded away as
        // someone's sole successor), but `loop`'s sole successor is `entry`
        // and `entry`'s sole predecessor is `loop` — exactly the shape
        // `find_mergeable_pair` looks for, except the successor is block 0.
        // Folding `entry` into `loop` would relocate the function's entry
        // point to whatever ends up at index 0 afterward, so the `succ == 0`
        // guard must block this pair.
        let src = "\
il 0.1
func @f(i1 %c) -> i64 {
entry:
  cbr %c, ^loop, ^other
other:
  ret 1
loop:
  br ^entry
}
";
        let module = parse_module(src, 1).unwrap();
        let mut func = module.functions[0].clone();
        let mut am = AnalysisManager::new();
        simplify_cfg(&mut func, &mut am);
        assert_eq!(func.blocks.len(), 3, "entry must not be folded away");
        assert_eq!(func.blocks[0].label, "entry");
    }

    #[test]
    fn does_not_merge_when_successor_has_block_params() {
        let src = "\
il 0.1
func @f() -> i64 {
entry:
  br ^next(1)
next(i64 %x):
  ret %x
}
";
        let module = parse_module(src, 1).unwrap();
        let mut func = module.functions[0].clone();
        let mut am = AnalysisManager::new();
        simplify_cfg(&mut func, &mut am);
        assert_eq!(func.blocks.len(), 2);
    }
}

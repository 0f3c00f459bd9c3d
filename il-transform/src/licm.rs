//! Loop-Invariant Code Motion (spec.md §4.5.3, detailed in SPEC_FULL.md item 5):
//! hoists side-effect-free, non-trapping instructions with only invariant
//! operands out of their loop and into a unique preheader.

use hashbrown::HashSet;

use il::{Function, Instruction, Value};
use il_verify::purity::is_pure;
use il_verify::Cfg;

use crate::analysis::{AnalysisManager, PreservedAnalyses};
use crate::loop_info::Loop;

pub fn licm(func: &mut Function, am: &mut AnalysisManager) -> PreservedAnalyses {
    if func.blocks.is_empty() {
        return PreservedAnalyses::all();
    }

    let loop_info = am.loop_info(func).clone();
    let idom = am.dominators(func).to_vec();
    let cfg = am.cfg(func).clone();
    let children = dom_tree_children(func.blocks.len(), &idom);

    for lp in &loop_info.loops {
        let Some(preheader) = find_preheader(&cfg, lp) else { continue };
        hoist_loop(func, lp, preheader, &children);
    }

    // Block structure, dominance, and loop membership are untouched by
    // moving instructions between existing blocks.
    PreservedAnalyses::preserving(&["cfg", "dominators", "loop-info"])
}

fn hoist_loop(func: &mut Function, lp: &Loop, preheader: usize, children: &[Vec<usize>]) {
    let mut invariant: HashSet<u32> = HashSet::new();
    for p in &func.params {
        invariant.insert(p.id);
    }
    for (bi, block) in func.blocks.iter().enumerate() {
        if lp.blocks.contains(&bi) {
            continue;
        }
        for param in &block.params {
            invariant.insert(param.id);
        }
        for instr in &block.instructions {
            if let Some(r) = instr.result {
                invariant.insert(r);
            }
        }
    }

    let order = dom_preorder(lp.header, children);
    let mut hoisted: Vec<Instruction> = Vec::new();

    for bi in order {
        if bi == preheader || !lp.blocks.contains(&bi) {
            continue;
        }
        let block = &mut func.blocks[bi];
        let mut keep = Vec::with_capacity(block.instructions.len());
        for instr in block.instructions.drain(..) {
            let hoistable = !instr.is_terminator() && is_pure(&instr) && operands_invariant(&instr, &invariant);
            if hoistable {
                if let Some(r) = instr.result {
                    invariant.insert(r);
                }
                hoisted.push(instr);
            } else {
                keep.push(instr);
            }
        }
        block.instructions = keep;
    }

    if hoisted.is_empty() {
        return;
    }
    let ph = &mut func.blocks[preheader];
    let terminator = ph.instructions.pop();
    ph.instructions.extend(hoisted);
    if let Some(term) = terminator {
        ph.instructions.push(term);
    }
}

fn operands_invariant(instr: &Instruction, invariant: &HashSet<u32>) -> bool {
    instr.operands.iter().all(|v| match v {
        Value::Temp(id) => invariant.contains(id),
        _ => true,
    })
}

/// The unique non-loop predecessor of `lp.header` that branches only to the
/// header. No such predecessor (the header has multiple outside
/// predecessors, or that predecessor has other successors) means the loop
/// has no preheader and is skipped, per spec.md item 5.
fn find_preheader(cfg: &Cfg, lp: &Loop) -> Option<usize> {
    let outside_preds: Vec<usize> = cfg.preds[lp.header].iter().copied().filter(|p| !lp.blocks.contains(p)).collect();
    let [candidate] = outside_preds[..] else { return None };
    if cfg.succs[candidate] == [lp.header] {
        Some(candidate)
    } else {
        None
    }
}

fn dom_tree_children(n: usize, idom: &[Option<usize>]) -> Vec<Vec<usize>> {
    let mut children = vec![Vec::new(); n];
    for node in 0..n {
        if let Some(p) = idom[node] {
            if p != node {
                children[p].push(node);
            }
        }
    }
    children
}

/// Preorder traversal of the dominator tree rooted at `entry`, used so
/// hoisting visits a loop in an order where a dominating block's
/// newly-hoisted definitions are already invariant by the time a dominated
/// block is considered.
fn dom_preorder(entry: usize, children: &[Vec<usize>]) -> Vec<usize> {
    let mut order = Vec::new();
    let mut stack = vec![entry];
    while let Some(n) = stack.pop() {
        order.push(n);
        for &c in children[n].iter().rev() {
            stack.push(c);
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use il_io::parse_module;

    #[test]
    fn hoists_loop_invariant_add_to_preheader() {
        let src = "\
il 0.1
func @f(i64 %n) -> i64 {
entry:
  br ^loop(0)
loop(i64 %i):
  %inv = add i64 1, 1
  %i1 = add i64 %i, %inv
  %done = icmp.eq i64 %i1, %n
  cbr %done, ^exit, ^loop(%i1)
exit:
  ret %i1
}
";
        let module = parse_module(src, 1).unwrap();
        let mut func = module.functions[0].clone();
        let mut am = AnalysisManager::new();
        licm(&mut func, &mut am);

        let entry = func.find_block("entry").unwrap();
        assert!(entry.instructions.iter().any(|i| i.result.is_some()), "invariant add should be hoisted into entry/preheader");
        let loop_block = func.find_block("loop").unwrap();
        assert!(
            !loop_block.instructions.iter().any(|i| matches!(i.op, il::Opcode::Add) && i.operands == vec![il::Value::ConstInt(1), il::Value::ConstInt(1)]),
            "invariant add must no longer be in the loop body"
        );
    }

    #[test]
    fn does_not_hoist_when_no_preheader() {
        // Two distinct outside predecessors branch into the header, so there
        // is no unique preheader and nothing should move.
        let src = "\
il 0.1
func @f(i64 %n, i1 %c) -> i64 {
entry:
  cbr %c, ^a, ^b
a:
  br ^loop
b:
  br ^loop
loop:
  %x = add i64 1, 1
  %done = icmp.eq i64 %x, %n
  cbr %done, ^exit, ^loop
exit:
  ret %x
}
";
        let module = parse_module(src, 1).unwrap();
        let mut func = module.functions[0].clone();
        let before = func.find_block("loop").unwrap().instructions.len();
        let mut am = AnalysisManager::new();
        licm(&mut func, &mut am);
        let after = func.find_block("loop").unwrap().instructions.len();
        assert_eq!(before, after);
    }
}

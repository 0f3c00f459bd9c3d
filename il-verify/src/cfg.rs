//! Minimal per-function control-flow graph: predecessor/successor lists
//! keyed by block index. Built once per verification pass; unlike
//! `il-transform`'s `AnalysisManager`, this is not cached across passes since
//! verification runs exactly once per module before any transform touches it.

use il::Function;

#[derive(Debug, Clone)]
pub struct Cfg {
    pub succs: Vec<Vec<usize>>,
    pub preds: Vec<Vec<usize>>,
}

impl Cfg {
    pub fn build(f: &Function) -> Self {
        let n = f.blocks.len();
        let mut succs = vec![Vec::new(); n];
        for (i, block) in f.blocks.iter().enumerate() {
            if let Some(term) = block.terminator() {
                for label in &term.labels {
                    if let Some(target) = f.block_index(label) {
                        succs[i].push(target);
                    }
                }
            }
        }
        let mut preds = vec![Vec::new(); n];
        for (i, targets) in succs.iter().enumerate() {
            for &t in targets {
                preds[t].push(i);
            }
        }
        Self { succs, preds }
    }

    /// Indices of blocks with no CFG successor (exit via `ret`, an unhandled
    /// `trap`, or any other no-successor terminator).
    pub fn exits(&self) -> Vec<usize> {
        self.succs
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_empty())
            .map(|(i, _)| i)
            .collect()
    }

    /// Blocks reachable from `entry` via a forward BFS.
    pub fn reachable_from(&self, entry: usize) -> Vec<bool> {
        let mut seen = vec![false; self.succs.len()];
        let mut stack = vec![entry];
        seen[entry] = true;
        while let Some(b) = stack.pop() {
            for &s in &self.succs[b] {
                if !seen[s] {
                    seen[s] = true;
                    stack.push(s);
                }
            }
        }
        seen
    }
}

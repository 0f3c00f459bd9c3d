//! Function-level analysis manager (spec.md §4.5.1): computes `cfg`,
//! `dominators`, and `loop-info` lazily and caches them until a pass
//! invalidates them. Each analysis is keyed implicitly by the `Function` it
//! was computed for — the manager is constructed fresh per function rather
//! than holding a `(name, function_ptr)` map, since passes in this workspace
//! run one function at a time (spec.md §4.5.2's `fn(&mut Function, ...)`
//! signature).

use std::collections::HashSet;

use il::Function;
use il_verify::dominators::compute_dominators;
use il_verify::Cfg;

use crate::loop_info::{compute_loop_info, LoopInfo};

/// What a pass declares it left intact. `all()` means "nothing changed
/// structurally"; anything not named here is invalidated by
/// [`AnalysisManager::invalidate_except`].
#[derive(Debug, Clone)]
pub struct PreservedAnalyses {
    all: bool,
    kept: HashSet<&'static str>,
}

impl PreservedAnalyses {
    pub fn none() -> Self {
        Self { all: false, kept: HashSet::new() }
    }

    pub fn all() -> Self {
        Self { all: true, kept: HashSet::new() }
    }

    pub fn preserving(names: &[&'static str]) -> Self {
        let mut s = Self::none();
        s.kept.extend(names.iter().copied());
        s
    }

    pub fn is_all(&self) -> bool {
        self.all
    }

    pub fn contains(&self, name: &str) -> bool {
        self.all || self.kept.contains(name)
    }
}

#[derive(Default)]
pub struct AnalysisManager {
    cfg: Option<Cfg>,
    dominators: Option<Vec<Option<usize>>>,
    loop_info: Option<LoopInfo>,
}

impl AnalysisManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cfg(&mut self, f: &Function) -> &Cfg {
        if self.cfg.is_none() {
            self.cfg = Some(Cfg::build(f));
        }
        self.cfg.as_ref().unwrap()
    }

    pub fn dominators(&mut self, f: &Function) -> &[Option<usize>] {
        if self.dominators.is_none() {
            let cfg = Cfg::build(f);
            let idom = if f.blocks.is_empty() {
                Vec::new()
            } else {
                compute_dominators(f.blocks.len(), 0, &cfg.preds, &cfg.succs)
            };
            self.dominators = Some(idom);
        }
        self.dominators.as_ref().unwrap()
    }

    pub fn loop_info(&mut self, f: &Function) -> &LoopInfo {
        if self.loop_info.is_none() {
            let cfg = self.cfg(f).clone();
            let idom = self.dominators(f).to_vec();
            self.loop_info = Some(compute_loop_info(&cfg, &idom));
        }
        self.loop_info.as_ref().unwrap()
    }

    pub fn invalidate_all(&mut self) {
        self.cfg = None;
        self.dominators = None;
        self.loop_info = None;
    }

    /// Drops every cached analysis not named in `preserved`.
    pub fn invalidate_except(&mut self, preserved: &PreservedAnalyses) {
        if preserved.is_all() {
            return;
        }
        if !preserved.contains("cfg") {
            self.cfg = None;
        }
        if !preserved.contains("dominators") {
            self.dominators = None;
        }
        if !preserved.contains("loop-info") {
            self.loop_info = None;
        }
    }
}

/// A pass per spec.md §4.5.2: mutates `func` in place and declares what it
/// preserved. Running it through this helper keeps the analysis cache
/// consistent automatically rather than requiring every call site to
/// remember to invalidate.
pub fn run_pass(
    func: &mut Function,
    am: &mut AnalysisManager,
    pass: impl FnOnce(&mut Function, &mut AnalysisManager) -> PreservedAnalyses,
) {
    log::debug!("running pass over @{}", func.name);
    let preserved = pass(func, am);
    am.invalidate_except(&preserved);
}

#[cfg(test)]
mod tests {
    use super::*;
    use il_io::parse_module;

    #[test]
    fn dominators_are_cached_until_invalidated() {
        let src = "il 0.1\nfunc @f() -> i64 {\nentry:\n  ret 0\n}\n";
        let module = parse_module(src, 1).unwrap();
        let f = &module.functions[0];
        let mut am = AnalysisManager::new();
        am.dominators(f);
        assert!(am.dominators.is_some());
        am.invalidate_except(&PreservedAnalyses::none());
        assert!(am.dominators.is_none());
    }

    #[test]
    fn preserved_all_skips_invalidation() {
        let src = "il 0.1\nfunc @f() -> i64 {\nentry:\n  ret 0\n}\n";
        let module = parse_module(src, 1).unwrap();
        let f = &module.functions[0];
        let mut am = AnalysisManager::new();
        am.cfg(f);
        am.invalidate_except(&PreservedAnalyses::all());
        assert!(am.cfg.is_some());
    }
}

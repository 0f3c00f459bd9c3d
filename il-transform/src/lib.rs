//! Transform pipeline for the Viper IL (spec.md §4.5): a small set of
//! analysis-preserving passes that rewrite a [`il::Function`] in place.
//! Passes never need to run on an unverified module — callers are expected
//! to have already run `il_verify::verify_module` successfully.

pub mod analysis;
pub mod licm;
pub mod loop_info;
pub mod simplify_cfg;

pub use analysis::{run_pass, AnalysisManager, PreservedAnalyses};
pub use licm::licm;
pub use simplify_cfg::simplify_cfg;

use il::Function;

/// Runs the full default pipeline (`licm` then `simplify_cfg`, each run
/// through [`run_pass`] so cached analyses stay consistent) once over
/// `func`. Order matters: LICM can turn a loop body that SimplifyCFG
/// couldn't fuse into one it can, once the hoisted instructions no longer
/// straddle the fold point.
pub fn run_default_pipeline(func: &mut Function) {
    let mut am = AnalysisManager::new();
    run_pass(func, &mut am, licm);
    run_pass(func, &mut am, simplify_cfg);
}

#[cfg(test)]
mod tests {
    use super::*;
    use il_io::parse_module;

    #[test]
    fn default_pipeline_runs_on_trivial_function() {
        let src = "il 0.1\nfunc @f() -> i64 {\nentry:\n  ret 0\n}\n";
        let module = parse_module(src, 1).unwrap();
        let mut func = module.functions[0].clone();
        run_default_pipeline(&mut func);
        assert_eq!(func.blocks.len(), 1);
    }

    #[test]
    fn default_pipeline_hoists_then_fuses() {
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
        run_default_pipeline(&mut func);
        assert!(func.find_block("entry").is_some());
        assert!(func.find_block("loop").is_some());
    }
}

//! `VmConfig` (spec.md §9 "Global state"): built once by the CLI from clap
//! args and environment variables, then read by the VM without ever being
//! mutated or re-read mid-execution.

use crate::trace::TraceConfig;

#[derive(Debug, Clone, Default)]
pub struct VmConfig {
    pub trace: TraceConfig,
    /// Source breakpoints to install before the first instruction executes,
    /// as `(path, line)` pairs handed to `DebugCtrl`.
    pub breakpoints: Vec<(String, u32)>,
}

impl VmConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(val) = std::env::var("VIPER_TRACE_IL") {
            cfg.trace.il = val != "0";
        }
        if let Ok(val) = std::env::var("VIPER_TRACE_SRC") {
            cfg.trace.src = val != "0";
        }
        cfg
    }
}

//! Source-level breakpoints (spec.md §4.6.6). Breakpoints are installed once
//! from `VmConfig` before execution starts and matched against each
//! instruction's `.loc` as it's about to run.

use il_support::{SourceLoc, SourceManager};

enum BreakpointPath {
    /// Matched against the full normalized path exactly.
    Full(String),
    /// Matched against the final path component only, so `-b foo.bas:7`
    /// hits regardless of the directory the module was loaded from.
    Basename(String),
}

impl BreakpointPath {
    fn new(path: &str) -> Self {
        if path.contains('/') || path.contains('\\') {
            BreakpointPath::Full(path.replace('\\', "/"))
        } else {
            BreakpointPath::Basename(path.to_string())
        }
    }

    fn matches(&self, candidate: &str) -> bool {
        match self {
            BreakpointPath::Full(p) => p == candidate,
            BreakpointPath::Basename(name) => {
                candidate == name || candidate.rsplit('/').next() == Some(name.as_str())
            }
        }
    }
}

struct Breakpoint {
    path: BreakpointPath,
    line: u32,
}

/// Installed breakpoints plus the last location that actually fired, so a
/// multi-opcode source line doesn't re-trigger once per opcode.
#[derive(Default)]
pub struct DebugCtrl {
    breakpoints: Vec<Breakpoint>,
    last_hit: Option<(u32, u32, u32)>,
}

impl DebugCtrl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_breakpoint(&mut self, path: &str, line: u32) {
        self.breakpoints.push(Breakpoint { path: BreakpointPath::new(path), line });
    }

    pub fn has_breakpoints(&self) -> bool {
        !self.breakpoints.is_empty()
    }

    /// Returns whether `loc` should stop execution, recording it as the
    /// last hit so repeated instructions on the same line don't re-fire
    /// until [`DebugCtrl::reset_last_hit`] is called.
    pub fn should_break(&mut self, sources: Option<&SourceManager>, loc: SourceLoc) -> bool {
        if loc.is_unknown() {
            return false;
        }
        let key = (loc.file_id, loc.line, loc.column);
        if self.last_hit == Some(key) {
            return false;
        }
        let path = sources.map(|s| s.get_path(loc.file_id)).unwrap_or("");
        let hit = self.breakpoints.iter().any(|bp| bp.line == loc.line && bp.path.matches(path));
        if hit {
            self.last_hit = Some(key);
        }
        hit
    }

    pub fn reset_last_hit(&mut self) {
        self.last_hit = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basename_breakpoint_matches_any_directory() {
        let mut ctrl = DebugCtrl::new();
        ctrl.add_breakpoint("foo.bas", 7);
        let mut sources = SourceManager::new();
        let id = sources.add_file("src/demo/foo.bas");
        assert!(ctrl.should_break(Some(&sources), SourceLoc::new(id, 7, 1)));
    }

    #[test]
    fn repeated_same_line_does_not_refire_until_reset() {
        let mut ctrl = DebugCtrl::new();
        ctrl.add_breakpoint("foo.bas", 7);
        let mut sources = SourceManager::new();
        let id = sources.add_file("foo.bas");
        let loc = SourceLoc::new(id, 7, 1);
        assert!(ctrl.should_break(Some(&sources), loc));
        assert!(!ctrl.should_break(Some(&sources), loc));
        ctrl.reset_last_hit();
        assert!(ctrl.should_break(Some(&sources), loc));
    }

    #[test]
    fn non_matching_line_does_not_break() {
        let mut ctrl = DebugCtrl::new();
        ctrl.add_breakpoint("foo.bas", 7);
        let mut sources = SourceManager::new();
        let id = sources.add_file("foo.bas");
        assert!(!ctrl.should_break(Some(&sources), SourceLoc::new(id, 8, 1)));
    }
}

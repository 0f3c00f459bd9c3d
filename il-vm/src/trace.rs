//! IL- and source-level execution tracing (spec.md §4.6.6). `[IL]` lines are
//! self-contained; `[SRC]` lines additionally echo the source line text,
//! which requires reading the backing file through a [`SourceManager`] and
//! is cached per `(file_id, line)` pair so a hot loop does not re-read its
//! own source file on every iteration.

use hashbrown::HashMap;

use il_support::{SourceLoc, SourceManager};

#[derive(Debug, Clone, Copy, Default)]
pub struct TraceConfig {
    pub il: bool,
    pub src: bool,
}

impl TraceConfig {
    pub fn any(&self) -> bool {
        self.il || self.src
    }
}

/// Caches source excerpts so `[SRC]` tracing doesn't re-read a file for
/// every instruction on the same line.
#[derive(Debug, Default)]
pub struct TraceCache {
    lines: HashMap<(u32, u32), String>,
}

impl TraceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the text of `loc`'s source line, reading and caching the
    /// whole file the first time a location in it is traced. Returns `None`
    /// if the location is unknown or the file cannot be read (a VM run
    /// against IL with no backing source file on disk should not panic).
    fn line_text(&mut self, sources: &SourceManager, loc: SourceLoc) -> Option<&str> {
        if loc.is_unknown() {
            return None;
        }
        if !self.lines.contains_key(&(loc.file_id, loc.line)) {
            let path = sources.get_path(loc.file_id);
            let contents = std::fs::read_to_string(path).ok()?;
            for (i, line) in contents.lines().enumerate() {
                self.lines.entry((loc.file_id, i as u32 + 1)).or_insert_with(|| line.to_string());
            }
        }
        self.lines.get(&(loc.file_id, loc.line)).map(|s| s.as_str())
    }
}

/// Emits a single `[IL]` trace line for the instruction about to execute.
pub fn trace_il(function: &str, block: &str, ip: usize, mnemonic: &str) {
    eprintln!("[IL] fn=@{function} blk={block} ip={ip} op={mnemonic}");
}

/// Emits a single `[SRC]` trace line, including the source excerpt when it
/// can be resolved.
pub fn trace_src(cache: &mut TraceCache, sources: Option<&SourceManager>, loc: SourceLoc) {
    if loc.is_unknown() {
        eprintln!("[SRC] <unknown>");
        return;
    }
    let path = sources.map(|s| s.get_path(loc.file_id)).unwrap_or("");
    let excerpt = sources.and_then(|s| cache.line_text(s, loc)).unwrap_or("");
    eprintln!("[SRC] {path}:{}:{} {excerpt}", loc.line, loc.column);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_config_any_is_false_by_default() {
        assert!(!TraceConfig::default().any());
    }

    #[test]
    fn cache_returns_none_for_unknown_location() {
        let mut cache = TraceCache::new();
        let sources = SourceManager::new();
        assert!(cache.line_text(&sources, SourceLoc::UNKNOWN).is_none());
    }
}

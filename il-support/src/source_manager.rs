use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Owns normalized source file paths and hands out stable `u32` file ids.
///
/// File id `0` is permanently reserved for "unknown location" and is never
/// assigned to a real path. Re-adding a path that was already registered
/// returns the same id it was given the first time. Once the `u32` id space
/// is exhausted the manager refuses further allocations and reports the
/// exhaustion exactly once.
#[derive(Debug, Default)]
pub struct SourceManager {
    files: Vec<String>,
    path_to_id: HashMap<String, u32>,
    exhausted: bool,
}

impl SourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize and register `path`, returning its file id.
    ///
    /// Returns `0` (and, the first time this happens, logs a one-time
    /// diagnostic) if the `u32` identifier space has been exhausted.
    pub fn add_file(&mut self, path: impl AsRef<Path>) -> u32 {
        let normalized = normalize(path.as_ref());
        if let Some(&id) = self.path_to_id.get(&normalized) {
            return id;
        }

        let next_index = self.files.len();
        // ids are 1-based; index 0 of `files` holds id 1.
        if next_index as u64 + 1 > u32::MAX as u64 {
            if !self.exhausted {
                self.exhausted = true;
                log::error!("source manager exhausted file identifier space");
            }
            return 0;
        }

        let id = (next_index + 1) as u32;
        self.files.push(normalized.clone());
        self.path_to_id.insert(normalized, id);
        id
    }

    /// Returns the normalized path registered under `file_id`, or an empty
    /// string if `file_id` is `0` or unknown to this manager.
    pub fn get_path(&self, file_id: u32) -> &str {
        if file_id == 0 {
            return "";
        }
        match self.files.get((file_id - 1) as usize) {
            Some(path) => path.as_str(),
            None => "",
        }
    }

    pub fn is_known(&self, file_id: u32) -> bool {
        file_id != 0 && (file_id as usize) <= self.files.len()
    }
}

/// Lexically normalizes `path` (resolving `.`/`..` components without
/// touching the filesystem) and renders it with forward slashes, matching
/// the textual form every platform's IL dumps should agree on.
fn normalize(path: &Path) -> String {
    let mut components: Vec<std::path::Component> = Vec::new();
    for component in path.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                if matches!(
                    components.last(),
                    Some(std::path::Component::Normal(_))
                ) {
                    components.pop();
                } else {
                    components.push(component);
                }
            }
            other => components.push(other),
        }
    }
    let rebuilt: PathBuf = components.iter().collect();
    rebuilt.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_id_zero_is_always_unknown() {
        let mgr = SourceManager::new();
        assert_eq!(mgr.get_path(0), "");
        assert!(!mgr.is_known(0));
    }

    #[test]
    fn re_adding_same_path_returns_same_id() {
        let mut mgr = SourceManager::new();
        let a = mgr.add_file("foo.bas");
        let b = mgr.add_file("foo.bas");
        assert_eq!(a, b);
        assert_eq!(a, 1);
    }

    #[test]
    fn distinct_paths_get_distinct_ids() {
        let mut mgr = SourceManager::new();
        let a = mgr.add_file("a.bas");
        let b = mgr.add_file("b.bas");
        assert_ne!(a, b);
    }

    #[test]
    fn get_path_round_trips_normalized_form() {
        let mut mgr = SourceManager::new();
        let id = mgr.add_file("dir/./sub/../file.bas");
        assert_eq!(mgr.get_path(id), "dir/file.bas");
    }

    #[test]
    fn unknown_id_past_end_is_empty() {
        let mgr = SourceManager::new();
        assert_eq!(mgr.get_path(999), "");
    }
}

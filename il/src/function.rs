use std::collections::HashMap;

use crate::block::BasicBlock;
use crate::types::Type;

#[derive(Debug, Clone)]
pub struct Param {
    pub id: u32,
    pub name: String,
    pub ty: Type,
}

/// A function definition: name, signature, ordered blocks (entry first, in
/// reverse-postorder per spec.md §3.5), and a debug name table mapping SSA
/// ids to source-level names for pretty-printing and tracing.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub ret: Type,
    pub params: Vec<Param>,
    pub blocks: Vec<BasicBlock>,
    pub value_names: HashMap<u32, String>,
    label_index: HashMap<String, usize>,
}

impl Function {
    pub fn new(name: impl Into<String>, ret: Type, params: Vec<Param>) -> Self {
        Self {
            name: name.into(),
            ret,
            params,
            blocks: Vec::new(),
            value_names: HashMap::new(),
            label_index: HashMap::new(),
        }
    }

    /// Appends a new block, indexing it by label for later [`Function::find_block`]
    /// lookups. Panics on a duplicate label — labels must be unique within a
    /// function (spec.md §3.3).
    pub fn add_block(&mut self, block: BasicBlock) -> usize {
        assert!(
            !self.label_index.contains_key(&block.label),
            "duplicate block label '{}' in function @{}",
            block.label,
            self.name
        );
        let index = self.blocks.len();
        self.label_index.insert(block.label.clone(), index);
        self.blocks.push(block);
        index
    }

    pub fn find_block(&self, label: &str) -> Option<&BasicBlock> {
        self.label_index.get(label).map(|&i| &self.blocks[i])
    }

    pub fn find_block_mut(&mut self, label: &str) -> Option<&mut BasicBlock> {
        let index = *self.label_index.get(label)?;
        Some(&mut self.blocks[index])
    }

    pub fn block_index(&self, label: &str) -> Option<usize> {
        self.label_index.get(label).copied()
    }

    pub fn entry_block(&self) -> Option<&BasicBlock> {
        self.blocks.first()
    }

    /// Rebuilds the internal label index. Transform passes that mutate
    /// `blocks` directly (e.g. SimplifyCFG removing unreachable blocks) must
    /// call this afterwards.
    pub fn reindex(&mut self) {
        self.label_index = self
            .blocks
            .iter()
            .enumerate()
            .map(|(i, b)| (b.label.clone(), i))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BasicBlock;

    #[test]
    fn find_block_resolves_by_label() {
        let mut f = Function::new("main", Type::I64, vec![]);
        f.add_block(BasicBlock::new("entry"));
        f.add_block(BasicBlock::new("loop"));
        assert_eq!(f.block_index("loop"), Some(1));
        assert!(f.find_block("missing").is_none());
    }

    #[test]
    #[should_panic(expected = "duplicate block label")]
    fn duplicate_label_panics() {
        let mut f = Function::new("main", Type::I64, vec![]);
        f.add_block(BasicBlock::new("entry"));
        f.add_block(BasicBlock::new("entry"));
    }
}

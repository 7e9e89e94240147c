//! Per-stop registry of named blocks
//!
//! A block is a token whose presence keeps a stop from advancing on its own.
//! Stops rarely hold more than a handful at once, so the set lives inline.

use smallvec::SmallVec;

/// Camera motion toward the stop is still running
pub const BLOCK_FLIGHT: &str = "flight";
/// The stop's wait timer has not elapsed yet
pub const BLOCK_TIMER: &str = "timer";
/// No wait time configured: only an explicit advance moves on
pub const BLOCK_MANUAL: &str = "manual";
/// The tour has been paused
pub const BLOCK_TOURPAUSED: &str = "tourpaused";

/// Prefix marking a block mirrored from the other half of a transition
pub const MIRROR_PREFIX: &str = "trans-";

/// Name of the block mirrored onto the transition pair
pub fn mirrored(block: &str) -> String {
    format!("{MIRROR_PREFIX}{block}")
}

/// Set of distinct block names, in insertion order
#[derive(Debug, Clone, Default)]
pub struct BlockRegistry {
    blocks: SmallVec<[String; 4]>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a block. Returns false if it was already present.
    pub fn insert(&mut self, block: &str) -> bool {
        if self.contains(block) {
            return false;
        }
        self.blocks.push(block.to_string());
        true
    }

    /// Remove a block. Returns false if it was not present.
    pub fn remove(&mut self, block: &str) -> bool {
        match self.blocks.iter().position(|b| b == block) {
            Some(idx) => {
                self.blocks.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, block: &str) -> bool {
        self.blocks.iter().any(|b| b == block)
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().map(String::as_str)
    }

    /// Empty the registry, handing back what was held
    pub fn drain(&mut self) -> SmallVec<[String; 4]> {
        std::mem::take(&mut self.blocks)
    }
}

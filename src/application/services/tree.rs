//! Tree service
//!
//! Builds, persists, renders and searches trees on behalf of the CLI.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{
    codec, find_first_valid_subtree, find_subtree_with_root, parse_level_order, BinaryTree,
    BlockedSet, LevelOrderBuilder, RandomTreeGenerator, ScanStrategy, SearchReport, TreeRender,
};
use crate::infrastructure::traits::FileSystem;

/// Service for tree construction, persistence and subtree search.
pub struct TreeService {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
}

impl TreeService {
    /// Create a new tree service.
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> Self {
        Self { fs, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Load a tree from a pre-order file.
    ///
    /// Nothing is returned unless the whole file parses, so a caller's
    /// current tree stays untouched on failure.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, path: &Path) -> ApplicationResult<BinaryTree> {
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read tree file", path)?;
        let tree = codec::decode(&content, self.settings.bound()?)?;
        info!(path = %path.display(), size = tree.size(), "tree loaded");
        Ok(tree)
    }

    /// Save a tree in pre-order format. Empty trees are refused.
    #[instrument(level = "debug", skip(self, tree))]
    pub fn save(&self, tree: &BinaryTree, path: &Path) -> ApplicationResult<()> {
        if tree.is_empty() {
            return Err(ApplicationError::EmptyTree);
        }
        self.fs
            .ensure_parent(path)
            .with_path_context("create directory for", path)?;
        self.fs
            .write(path, &codec::encode(tree))
            .with_path_context("write tree file", path)?;
        info!(path = %path.display(), size = tree.size(), "tree saved");
        Ok(())
    }

    /// Generate a random tree and write it to the configured autosave file.
    ///
    /// `none_probability` falls back to the configured value.
    #[instrument(level = "debug", skip(self))]
    pub fn generate(
        &self,
        node_count: usize,
        none_probability: Option<f64>,
        seed: Option<u64>,
    ) -> ApplicationResult<BinaryTree> {
        let probability = none_probability.unwrap_or(self.settings.generate.none_probability);
        let tree = RandomTreeGenerator::new(node_count, probability)?
            .with_seed(seed)
            .generate(self.settings.bound()?)?;

        if let Some(autosave) = &self.settings.generate.autosave {
            self.save(&tree, autosave)?;
        }
        Ok(tree)
    }

    /// Build a tree from a comma-separated level-order list.
    #[instrument(level = "debug", skip(self))]
    pub fn build_from_list(&self, input: &str) -> ApplicationResult<BinaryTree> {
        let values = parse_level_order(input)?;
        let tree = LevelOrderBuilder::new(self.settings.bound()?).build(&values)?;
        debug!(size = tree.size(), "tree built from list");
        Ok(tree)
    }

    /// Parse whitespace-separated blocked values, each within the value bound.
    pub fn parse_blocked(&self, input: &str) -> ApplicationResult<BlockedSet> {
        let values = input
            .split_whitespace()
            .map(|token| {
                token.parse::<i64>().map_err(|_| {
                    ApplicationError::InvalidInput(format!("not an integer: '{}'", token))
                })
            })
            .collect::<ApplicationResult<Vec<i64>>>()?;
        self.blocked_from(&values)
    }

    /// Blocked set from already parsed values, each within the value bound.
    pub fn blocked_from(&self, values: &[i64]) -> ApplicationResult<BlockedSet> {
        let bound = self.settings.bound()?;
        values
            .iter()
            .map(|&raw| -> ApplicationResult<u32> { Ok(bound.check(raw)?) })
            .collect()
    }

    pub fn find_with_root(
        &self,
        tree: &BinaryTree,
        root_value: i64,
        blocked: &BlockedSet,
    ) -> ApplicationResult<SearchReport> {
        Ok(find_subtree_with_root(tree, root_value, blocked)?)
    }

    /// First valid subtree in level order; `strategy` falls back to the configured one.
    pub fn find_first_valid(
        &self,
        tree: &BinaryTree,
        blocked: &BlockedSet,
        strategy: Option<ScanStrategy>,
    ) -> SearchReport {
        let strategy = strategy.unwrap_or(self.settings.search.strategy);
        find_first_valid_subtree(tree, blocked, strategy)
    }

    /// Render a tree for the console, refusing trees above the render limit.
    pub fn render(&self, tree: &BinaryTree) -> ApplicationResult<String> {
        let limit = self.settings.render_limit;
        if tree.size() > limit {
            return Err(ApplicationError::TooLargeToRender {
                size: tree.size(),
                limit,
            });
        }
        Ok(tree.to_display_tree().to_string())
    }
}

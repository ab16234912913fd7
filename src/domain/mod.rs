//! Domain layer: trees, construction, serialization and subtree search
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod codec;
pub mod error;
pub mod render;
pub mod search;
pub mod value;

pub use arena::{BinaryTree, Side, TreeNode};
pub use builder::{parse_level_order, LevelOrderBuilder, RandomTreeGenerator, NONE_TOKEN};
pub use error::{DomainError, DomainResult};
pub use render::TreeRender;
pub use search::{
    find_first_valid_subtree, find_subtree_with_root, BlockedSet, ScanStrategy, SearchMiss,
    SearchOutcome, SearchReport,
};
pub use value::{ValueBound, DEFAULT_MAX_VALUE};

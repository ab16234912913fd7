//! Subtree search engine
//!
//! Two strategies over a [`BinaryTree`] and a [`BlockedSet`]:
//! the subtree rooted at a given value, or the first subtree in level order
//! that holds no blocked value and is not a single leaf.
//!
//! A search that finds nothing is a regular [`SearchMiss`], not an error.
//! Only an out-of-range root value is rejected with a [`DomainError`].

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use generational_arena::Index;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::domain::arena::BinaryTree;
use crate::domain::error::{DomainError, DomainResult};

/// Values that disqualify any subtree containing them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockedSet(HashSet<u32>);

impl BlockedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, value: u32) -> bool {
        self.0.contains(&value)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Values in ascending order.
    pub fn sorted(&self) -> Vec<u32> {
        let mut values: Vec<u32> = self.0.iter().copied().collect();
        values.sort_unstable();
        values
    }
}

impl FromIterator<u32> for BlockedSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// How the first-valid-subtree scan checks candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStrategy {
    /// Independent breadth-first scan per candidate, O(n²) worst case
    #[default]
    Rescan,
    /// One post-order pass caching per-node results, then a level-order pick
    Memoized,
}

impl FromStr for ScanStrategy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rescan" => Ok(ScanStrategy::Rescan),
            "memoized" => Ok(ScanStrategy::Memoized),
            other => Err(DomainError::InvalidParameter(format!(
                "unknown scan strategy '{}' (expected rescan or memoized)",
                other
            ))),
        }
    }
}

impl fmt::Display for ScanStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanStrategy::Rescan => write!(f, "rescan"),
            ScanStrategy::Memoized => write!(f, "memoized"),
        }
    }
}

/// Why a search produced no subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMiss {
    /// No node carries the requested value
    NodeNotFound(u32),
    /// The node exists but has no children
    NodeIsLeaf(u32),
    /// The subtree contains at least one blocked value
    SubtreeBlocked(u32),
    /// The copied subtree ended up without children
    BecameLeaf(u32),
    /// The searched tree has no nodes
    EmptyTree,
    /// No node qualified during the level-order scan
    NoCandidate,
}

impl fmt::Display for SearchMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMiss::NodeNotFound(v) => write!(f, "node {} not found", v),
            SearchMiss::NodeIsLeaf(v) => write!(f, "node {} is a leaf", v),
            SearchMiss::SubtreeBlocked(v) => {
                write!(f, "subtree rooted at {} contains blocked values", v)
            }
            SearchMiss::BecameLeaf(v) => write!(f, "subtree rooted at {} became a leaf", v),
            SearchMiss::EmptyTree => write!(f, "tree is empty"),
            SearchMiss::NoCandidate => write!(f, "no valid subtree found"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Found(BinaryTree),
    Missed(SearchMiss),
}

impl SearchOutcome {
    pub fn tree(&self) -> Option<&BinaryTree> {
        match self {
            SearchOutcome::Found(tree) => Some(tree),
            SearchOutcome::Missed(_) => None,
        }
    }

    pub fn miss(&self) -> Option<SearchMiss> {
        match self {
            SearchOutcome::Found(_) => None,
            SearchOutcome::Missed(miss) => Some(*miss),
        }
    }

    pub fn into_tree(self) -> Option<BinaryTree> {
        match self {
            SearchOutcome::Found(tree) => Some(tree),
            SearchOutcome::Missed(_) => None,
        }
    }
}

/// Search outcome plus the time it took. The timing is diagnostic only.
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub outcome: SearchOutcome,
    pub elapsed: Duration,
}

impl SearchReport {
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }
}

fn finish(start: Instant, outcome: SearchOutcome) -> SearchReport {
    let elapsed = start.elapsed();
    match &outcome {
        SearchOutcome::Found(tree) => info!(
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            root = ?tree.root_value(),
            size = tree.size(),
            "subtree found"
        ),
        SearchOutcome::Missed(miss) => info!(
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "search missed: {}",
            miss
        ),
    }
    SearchReport { outcome, elapsed }
}

/// Find the subtree rooted at the pre-order-first node with `root_value`.
///
/// The subtree qualifies when the node has at least one child and no node of
/// the subtree is blocked. The result is a deep copy.
///
/// # Errors
///
/// `DomainError::ValueOutOfRange` if `root_value` lies outside the tree's bound.
#[instrument(level = "debug", skip(tree, blocked))]
pub fn find_subtree_with_root(
    tree: &BinaryTree,
    root_value: i64,
    blocked: &BlockedSet,
) -> DomainResult<SearchReport> {
    let start = Instant::now();
    let value = tree.bound().check(root_value)?;

    let outcome = match tree.find_node_by_value(value) {
        None => SearchOutcome::Missed(SearchMiss::NodeNotFound(value)),
        Some(idx) if tree.is_leaf(idx) => SearchOutcome::Missed(SearchMiss::NodeIsLeaf(value)),
        Some(idx) if !tree.is_valid_subtree(Some(idx), blocked) => {
            SearchOutcome::Missed(SearchMiss::SubtreeBlocked(value))
        }
        Some(idx) => {
            let copy = tree.copy_subtree(Some(idx));
            match copy.root() {
                Some(root) if !copy.is_leaf(root) => SearchOutcome::Found(copy),
                _ => SearchOutcome::Missed(SearchMiss::BecameLeaf(value)),
            }
        }
    };

    Ok(finish(start, outcome))
}

/// Find the first node in level order whose subtree is blocked-free and has
/// at least two nodes; return a deep copy of that subtree.
///
/// Rejected candidates do not prune their children: those are examined as
/// candidates in turn.
#[instrument(level = "debug", skip(tree, blocked))]
pub fn find_first_valid_subtree(
    tree: &BinaryTree,
    blocked: &BlockedSet,
    strategy: ScanStrategy,
) -> SearchReport {
    let start = Instant::now();
    if tree.is_empty() {
        return finish(start, SearchOutcome::Missed(SearchMiss::EmptyTree));
    }

    let hit = match strategy {
        ScanStrategy::Rescan => first_valid_by_rescan(tree, blocked),
        ScanStrategy::Memoized => first_valid_memoized(tree, blocked),
    };

    let outcome = match hit {
        Some((idx, size)) => {
            let copy = tree.copy_subtree(Some(idx));
            debug_assert_eq!(copy.size(), size);
            SearchOutcome::Found(copy)
        }
        None => SearchOutcome::Missed(SearchMiss::NoCandidate),
    };
    finish(start, outcome)
}

fn first_valid_by_rescan(tree: &BinaryTree, blocked: &BlockedSet) -> Option<(Index, usize)> {
    let mut queue: VecDeque<Index> = tree.root().into_iter().collect();

    while let Some(current) = queue.pop_front() {
        let Some(node) = tree.get_node(current) else {
            continue;
        };
        if node.is_leaf() {
            continue;
        }
        match blocked_free_size(tree, current, blocked) {
            Some(size) if size >= 2 => return Some((current, size)),
            Some(_) => {}
            None => debug!(value = node.value, "candidate blocked"),
        }
        queue.extend(node.children());
    }
    None
}

/// Size of the subtree at `start`, or `None` as soon as a blocked value shows up.
fn blocked_free_size(tree: &BinaryTree, start: Index, blocked: &BlockedSet) -> Option<usize> {
    let mut size = 0;
    for (_, node) in tree.iter_level_order_from(start) {
        if blocked.contains(node.value) {
            return None;
        }
        size += 1;
    }
    Some(size)
}

fn first_valid_memoized(tree: &BinaryTree, blocked: &BlockedSet) -> Option<(Index, usize)> {
    // None marks a subtree containing a blocked value
    let mut clean: HashMap<Index, Option<usize>> = HashMap::with_capacity(tree.size());
    for (idx, node) in tree.iter_postorder() {
        let own = if blocked.contains(node.value) { None } else { Some(1) };
        let size = node.children().fold(own, |acc, child| {
            match (acc, clean.get(&child).copied().flatten()) {
                (Some(total), Some(sub)) => Some(total + sub),
                _ => None,
            }
        });
        clean.insert(idx, size);
    }

    tree.iter_level_order()
        .filter(|(_, node)| !node.is_leaf())
        .find_map(|(idx, _)| match clean.get(&idx).copied().flatten() {
            Some(size) if size >= 2 => Some((idx, size)),
            _ => None,
        })
}

//! Flat pre-order text format for trees.
//!
//! One token per line: an integer for a node, `None` for an absent child.
//! Root 5 with a single left leaf 3 reads `5`, `3`, `None`, `None`, `None`.

use generational_arena::Index;
use itertools::Itertools;
use tracing::{instrument, warn};

use crate::domain::arena::{BinaryTree, Side};
use crate::domain::builder::NONE_TOKEN;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::value::ValueBound;

/// Serialize `tree` in pre-order, newline terminated.
pub fn encode(tree: &BinaryTree) -> String {
    let mut out = tree
        .preorder_tokens()
        .into_iter()
        .map(|token| match token {
            Some(value) => value.to_string(),
            None => NONE_TOKEN.to_string(),
        })
        .join("\n");
    out.push('\n');
    out
}

/// Parse the pre-order format.
///
/// Input that ends early leaves the remaining children absent; blank lines
/// are skipped and tokens after a complete tree are ignored.
#[instrument(level = "debug", skip(text))]
pub fn decode(text: &str, bound: ValueBound) -> DomainResult<BinaryTree> {
    let mut tree = BinaryTree::with_bound(bound);
    let mut tokens = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, token)| !token.is_empty());

    // open child slots, top of stack is filled next; None is the root slot
    let mut slots: Vec<Option<(Index, Side)>> = vec![None];

    while let Some(slot) = slots.pop() {
        let Some((line, token)) = tokens.next() else {
            break;
        };
        if token.eq_ignore_ascii_case(NONE_TOKEN) {
            continue;
        }
        let raw: i64 = token.parse().map_err(|_| DomainError::InvalidToken {
            position: line,
            token: token.to_string(),
        })?;
        let value = bound.check(raw)?;
        let idx = tree.attach(slot, value)?;
        slots.push(Some((idx, Side::Right)));
        slots.push(Some((idx, Side::Left)));
    }

    let trailing = tokens.count();
    if trailing > 0 {
        warn!(trailing, "ignoring tokens after complete tree");
    }

    tree.refresh_size();
    Ok(tree)
}

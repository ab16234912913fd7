//! Tree construction from level-order value lists and random generation.

use std::collections::VecDeque;

use generational_arena::Index;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, instrument};

use crate::domain::arena::{BinaryTree, Side};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::value::ValueBound;

/// Token marking an absent node in user-entered lists and tree files.
pub const NONE_TOKEN: &str = "None";

/// Parse a comma-separated level-order list such as `1, 2, None, 3, 4`.
///
/// `None` is matched case-insensitively. Range checks happen at build time.
pub fn parse_level_order(input: &str) -> DomainResult<Vec<Option<i64>>> {
    if input.trim().is_empty() {
        return Err(DomainError::EmptyInput);
    }
    input
        .split(',')
        .map(str::trim)
        .enumerate()
        .map(|(i, token)| {
            if token.eq_ignore_ascii_case(NONE_TOKEN) {
                Ok(None)
            } else {
                token
                    .parse::<i64>()
                    .map(Some)
                    .map_err(|_| DomainError::InvalidToken {
                        position: i + 1,
                        token: token.to_string(),
                    })
            }
        })
        .collect()
}

/// Builds a tree from a level-order list.
///
/// Each present node takes the next two list slots as its left and right
/// child; `None` slots leave the child absent and take no slots of their own.
pub struct LevelOrderBuilder {
    bound: ValueBound,
}

impl Default for LevelOrderBuilder {
    fn default() -> Self {
        Self::new(ValueBound::default())
    }
}

impl LevelOrderBuilder {
    pub fn new(bound: ValueBound) -> Self {
        Self { bound }
    }

    #[instrument(level = "debug", skip(self, values), fields(len = values.len()))]
    pub fn build(&self, values: &[Option<i64>]) -> DomainResult<BinaryTree> {
        let (first, rest) = values.split_first().ok_or(DomainError::EmptyInput)?;
        // reject the whole list before building anything
        for value in values.iter().flatten() {
            self.bound.check(*value)?;
        }
        let root_value = first.ok_or(DomainError::MissingRoot)?;

        let mut tree = BinaryTree::with_bound(self.bound);
        let root = tree.insert_root(root_value)?;
        let mut queue = VecDeque::from([root]);
        let mut slots = rest.iter();

        while let Some(current) = queue.pop_front() {
            for side in [Side::Left, Side::Right] {
                match slots.next() {
                    Some(Some(value)) => {
                        queue.push_back(tree.insert_child(current, side, *value)?)
                    }
                    Some(None) => {}
                    None => return Ok(tree),
                }
            }
        }

        debug!(size = tree.size(), "built tree from level-order list");
        Ok(tree)
    }
}

/// Random tree generator with bounded values.
///
/// Draws `node_count` level-order slots, each absent with `none_probability`;
/// the root is always present. An absent slot still occupies its two child
/// positions, so the layout matches a complete binary tree.
#[derive(Debug, Clone)]
pub struct RandomTreeGenerator {
    node_count: usize,
    none_probability: f64,
    seed: Option<u64>,
}

impl RandomTreeGenerator {
    pub fn new(node_count: usize, none_probability: f64) -> DomainResult<Self> {
        if node_count == 0 {
            return Err(DomainError::InvalidParameter(
                "node count must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&none_probability) {
            return Err(DomainError::InvalidParameter(format!(
                "none probability must be between 0 and 1, got {}",
                none_probability
            )));
        }
        Ok(Self {
            node_count,
            none_probability,
            seed: None,
        })
    }

    /// Fix the seed for reproducible trees.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    #[instrument(level = "debug", skip(self))]
    pub fn generate(&self, bound: ValueBound) -> DomainResult<BinaryTree> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut values: Vec<Option<u32>> = (0..self.node_count)
            .map(|_| {
                if rng.gen::<f64>() < self.none_probability {
                    None
                } else {
                    Some(rng.gen_range(1..=bound.max()))
                }
            })
            .collect();
        if values[0].is_none() {
            values[0] = Some(rng.gen_range(1..=bound.max()));
        }

        let mut tree = BinaryTree::with_bound(bound);
        let root = tree.insert_root(i64::from(values[0].unwrap_or(1)))?;
        let mut queue: VecDeque<Option<Index>> = VecDeque::from([Some(root)]);
        let mut index = 1;

        while index < self.node_count {
            let Some(slot) = queue.pop_front() else {
                break;
            };
            let Some(current) = slot else {
                index += 2;
                continue;
            };
            for side in [Side::Left, Side::Right] {
                if index >= self.node_count {
                    break;
                }
                let child = match values[index] {
                    Some(value) => Some(tree.insert_child(current, side, i64::from(value))?),
                    None => None,
                };
                queue.push_back(child);
                index += 1;
            }
        }

        debug!(size = tree.size(), slots = self.node_count, "generated random tree");
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_order_accepts_none_in_any_case() {
        let values = parse_level_order("1, 2, none, NONE ,3").unwrap();
        assert_eq!(values, vec![Some(1), Some(2), None, None, Some(3)]);
    }

    #[test]
    fn test_parse_level_order_reports_position_of_bad_token() {
        let err = parse_level_order("1, x, 3").unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidToken {
                position: 2,
                token: "x".to_string()
            }
        );
        assert_eq!(parse_level_order("   "), Err(DomainError::EmptyInput));
    }

    #[test]
    fn test_none_slots_are_not_enqueued() {
        // 1 -> (2, None); 2 -> (3, 4)
        let values = parse_level_order("1, 2, None, 3, 4").unwrap();
        let tree = LevelOrderBuilder::default().build(&values).unwrap();
        assert_eq!(
            tree.preorder_tokens(),
            vec![Some(1), Some(2), Some(3), None, None, Some(4), None, None, None]
        );
        assert_eq!(tree.size(), 4);
    }

    #[test]
    fn test_generator_is_deterministic_for_seed() {
        let generator = RandomTreeGenerator::new(40, 0.2).unwrap().with_seed(Some(7));
        let a = generator.generate(ValueBound::default()).unwrap();
        let b = generator.generate(ValueBound::default()).unwrap();
        assert_eq!(a, b);
        assert!(a.size() >= 1 && a.size() <= 40);
    }

    #[test]
    fn test_generator_without_gaps_fills_every_slot() {
        let generator = RandomTreeGenerator::new(15, 0.0).unwrap().with_seed(Some(1));
        let tree = generator.generate(ValueBound::new(10).unwrap()).unwrap();
        assert_eq!(tree.size(), 15);
        assert_eq!(tree.depth(), 4);
        assert!(tree.iter().all(|(_, n)| (1..=10).contains(&n.value)));
    }

    #[test]
    fn test_generator_rejects_bad_parameters() {
        assert!(RandomTreeGenerator::new(0, 0.2).is_err());
        assert!(RandomTreeGenerator::new(5, 1.5).is_err());
        assert!(RandomTreeGenerator::new(5, -0.1).is_err());
    }
}

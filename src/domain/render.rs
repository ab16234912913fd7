use std::collections::HashMap;

use generational_arena::Index;
use termtree::Tree;
use tracing::instrument;

use crate::domain::arena::BinaryTree;

/// Label used when there is nothing to draw.
pub const EMPTY_TREE_LABEL: &str = "(empty tree)";

/// Conversion into a printable `termtree` structure.
pub trait TreeRender {
    fn to_display_tree(&self) -> Tree<String>;
}

impl TreeRender for BinaryTree {
    /// Children are labelled `L:` and `R:` so a lone child keeps its side.
    #[instrument(level = "debug", skip(self))]
    fn to_display_tree(&self) -> Tree<String> {
        let mut built: HashMap<Index, Tree<String>> = HashMap::with_capacity(self.size());

        // post-order: both subtrees exist before their parent is assembled
        for (idx, node) in self.iter_postorder() {
            let mut display = Tree::new(node.value.to_string());
            for (label, child) in [("L", node.left), ("R", node.right)] {
                if let Some(mut sub) = child.and_then(|c| built.remove(&c)) {
                    sub.root = format!("{}: {}", label, sub.root);
                    display.push(sub);
                }
            }
            built.insert(idx, display);
        }

        self.root()
            .and_then(|root| built.remove(&root))
            .unwrap_or_else(|| Tree::new(EMPTY_TREE_LABEL.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::arena::Side;

    #[test]
    fn test_render_marks_sides() {
        let mut tree = BinaryTree::new();
        let root = tree.insert_root(10).unwrap();
        tree.insert_child(root, Side::Right, 20).unwrap();

        let rendered = tree.to_display_tree().to_string();
        assert!(rendered.starts_with("10\n"));
        assert!(rendered.contains("R: 20"));
        assert!(!rendered.contains("L:"));
    }

    #[test]
    fn test_render_empty_tree() {
        let rendered = BinaryTree::new().to_display_tree().to_string();
        assert_eq!(rendered.trim_end(), EMPTY_TREE_LABEL);
    }
}

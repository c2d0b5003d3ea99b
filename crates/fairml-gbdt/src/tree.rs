use std::collections::VecDeque;

use tracing::trace;

use crate::node::{Node, NodeIndex};
use crate::split::{SplitParams, find_best_split};

/// A fitted second-order regression tree.
///
/// Stored as an arena-based `Vec<Node>` whose root sits at index 0. Leaf
/// values are raw Newton steps; the booster applies shrinkage when summing.
#[derive(Debug, Clone)]
pub struct RegressionTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) n_features: usize,
}

/// Growth limits shared by every node of a tree.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GrowParams {
    pub(crate) max_depth: usize,
    pub(crate) split: SplitParams,
}

impl RegressionTree {
    /// Grow a tree on the gradient statistics of `sample_indices`.
    ///
    /// `col_features` is column-major. Inputs are assumed validated by the
    /// booster.
    pub(crate) fn grow(
        col_features: &[Vec<f64>],
        grad: &[f64],
        hess: &[f64],
        sample_indices: &[usize],
        params: &GrowParams,
    ) -> Self {
        let mut arena = Vec::new();
        build_node(
            col_features,
            grad,
            hess,
            sample_indices,
            params,
            0,
            &mut arena,
        );
        trace!(n_nodes = arena.len(), "regression tree grown");
        Self {
            nodes: arena,
            n_features: col_features.len(),
        }
    }

    /// Return the raw leaf value reached by `sample`.
    ///
    /// Traverses from the root: at each `Split`, goes left when
    /// `sample[feature] <= threshold`, right otherwise. The caller is
    /// responsible for passing `n_features` values.
    pub(crate) fn leaf_value(&self, sample: &[f64]) -> f64 {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value, .. } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if sample[feature.index()] <= *threshold {
                        left.index()
                    } else {
                        right.index()
                    };
                }
            }
        }
    }

    /// Borrow the node arena.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Return the number of features the tree was grown on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the total number of nodes (splits and leaves).
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Return the maximum depth of the tree. A lone root leaf has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        let mut max_depth = 0usize;
        let mut queue = VecDeque::from([(0usize, 0usize)]);
        while let Some((node_idx, d)) = queue.pop_front() {
            match &self.nodes[node_idx] {
                Node::Leaf { .. } => max_depth = max_depth.max(d),
                Node::Split { left, right, .. } => {
                    queue.push_back((left.index(), d + 1));
                    queue.push_back((right.index(), d + 1));
                }
            }
        }
        max_depth
    }
}

/// Recursively build the arena and return the index of the node created.
fn build_node(
    col_features: &[Vec<f64>],
    grad: &[f64],
    hess: &[f64],
    sample_indices: &[usize],
    params: &GrowParams,
    depth: usize,
    arena: &mut Vec<Node>,
) -> NodeIndex {
    let grad_sum: f64 = sample_indices.iter().map(|&si| grad[si]).sum();
    let hess_sum: f64 = sample_indices.iter().map(|&si| hess[si]).sum();

    let make_leaf = |arena: &mut Vec<Node>| -> NodeIndex {
        let idx = arena.len();
        arena.push(Node::Leaf {
            value: params.split.leaf_value(grad_sum, hess_sum),
            cover: hess_sum,
        });
        NodeIndex::new(idx)
    };

    if depth >= params.max_depth {
        return make_leaf(arena);
    }

    let Some(split) = find_best_split(col_features, grad, hess, sample_indices, &params.split)
    else {
        return make_leaf(arena);
    };

    // Reserve the slot so children get higher indices, then overwrite.
    let node_idx = arena.len();
    arena.push(Node::Leaf {
        value: 0.0,
        cover: hess_sum,
    });

    let left = build_node(
        col_features,
        grad,
        hess,
        &split.left_indices,
        params,
        depth + 1,
        arena,
    );
    let right = build_node(
        col_features,
        grad,
        hess,
        &split.right_indices,
        params,
        depth + 1,
        arena,
    );

    arena[node_idx] = Node::Split {
        feature: split.feature,
        threshold: split.threshold,
        left,
        right,
        gain: split.gain,
        cover: hess_sum,
    };

    NodeIndex::new(node_idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(max_depth: usize) -> GrowParams {
        GrowParams {
            max_depth,
            split: SplitParams {
                reg_lambda: 1.0,
                gamma: 0.0,
                min_child_weight: 0.0,
            },
        }
    }

    fn separable() -> (Vec<Vec<f64>>, Vec<f64>, Vec<f64>) {
        let col = vec![vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0]];
        let labels = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let grad = labels.iter().map(|y| 0.5 - y).collect();
        let hess = vec![0.25; 6];
        (col, grad, hess)
    }

    #[test]
    fn stump_separates_classes() {
        let (col, grad, hess) = separable();
        let indices: Vec<usize> = (0..6).collect();
        let tree = RegressionTree::grow(&col, &grad, &hess, &indices, &params(1));

        assert_eq!(tree.n_nodes(), 3);
        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.depth(), 1);
        assert!(tree.leaf_value(&[2.0]) < 0.0);
        assert!(tree.leaf_value(&[11.0]) > 0.0);
    }

    #[test]
    fn leaf_value_matches_newton_step() {
        let (col, grad, hess) = separable();
        let indices: Vec<usize> = (0..6).collect();
        let tree = RegressionTree::grow(&col, &grad, &hess, &indices, &params(1));
        // Left leaf: G = 1.5, H = 0.75, value = -1.5 / 1.75.
        let expected = -1.5 / 1.75;
        assert!((tree.leaf_value(&[1.0]) - expected).abs() < 1e-12);
    }

    #[test]
    fn root_is_index_zero_and_children_follow() {
        let (col, grad, hess) = separable();
        let indices: Vec<usize> = (0..6).collect();
        let tree = RegressionTree::grow(&col, &grad, &hess, &indices, &params(3));
        match &tree.nodes()[0] {
            Node::Split { left, right, .. } => {
                assert!(left.index() > 0);
                assert!(right.index() > left.index());
            }
            Node::Leaf { .. } => panic!("root should split"),
        }
    }

    #[test]
    fn pure_gradients_give_single_leaf() {
        let col = vec![vec![1.0, 2.0, 3.0]];
        let grad = vec![-0.5; 3];
        let hess = vec![0.25; 3];
        let tree = RegressionTree::grow(&col, &grad, &hess, &[0, 1, 2], &params(6));
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.depth(), 0);
    }
}

//! Gini classification tree

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use super::{gini, Dataset};

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        /// Fraction of training samples labelled up
        p_up: f64,
    },
    Split {
        feature: usize,
        /// Samples with `x[feature] <= threshold` go left
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn depth(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    fn n_leaves(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Split { left, right, .. } => left.n_leaves() + right.n_leaves(),
        }
    }
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

/// Growth limits shared by every tree of an ensemble
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TreeLimits {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: usize,
}

/// Binary classification tree
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationTree {
    root: Node,
}

impl ClassificationTree {
    /// Grow a tree on the rows of `dataset` named by `indices` (repeats allowed)
    pub(crate) fn grow(
        dataset: &Dataset,
        indices: &[usize],
        limits: TreeLimits,
        rng: &mut ChaCha8Rng,
    ) -> Self {
        let root = build_node(dataset, indices, 0, &limits, rng);
        Self { root }
    }

    /// Probability that the sample belongs to the up class
    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { p_up, .. } => return *p_up,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = features.get(*feature).copied().unwrap_or(f64::NAN);
                    node = if value <= *threshold { left } else { right };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    pub fn n_leaves(&self) -> usize {
        self.root.n_leaves()
    }
}

fn leaf(dataset: &Dataset, indices: &[usize]) -> Node {
    let labels = dataset.labels();
    let positives = indices.iter().filter(|&&i| labels[i]).count();
    let p_up = if indices.is_empty() {
        0.5
    } else {
        positives as f64 / indices.len() as f64
    };
    Node::Leaf { p_up }
}

fn build_node(
    dataset: &Dataset,
    indices: &[usize],
    depth: usize,
    limits: &TreeLimits,
    rng: &mut ChaCha8Rng,
) -> Node {
    let labels = dataset.labels();
    let positives = indices.iter().filter(|&&i| labels[i]).count();
    let impurity = gini(positives, indices.len());

    let depth_reached = limits.max_depth.is_some_and(|max| depth >= max);
    if depth_reached || indices.len() < limits.min_samples_split || impurity <= 0.0 {
        return leaf(dataset, indices);
    }

    match best_split(dataset, indices, impurity, limits, rng) {
        Some(split) => {
            let left = build_node(dataset, &split.left, depth + 1, limits, rng);
            let right = build_node(dataset, &split.right, depth + 1, limits, rng);
            Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left: Box::new(left),
                right: Box::new(right),
            }
        }
        None => leaf(dataset, indices),
    }
}

fn best_split(
    dataset: &Dataset,
    indices: &[usize],
    parent_impurity: f64,
    limits: &TreeLimits,
    rng: &mut ChaCha8Rng,
) -> Option<SplitCandidate> {
    let features = dataset.features();
    let labels = dataset.labels();
    let total = indices.len() as f64;

    let mut candidates: Vec<usize> = (0..dataset.n_features()).collect();
    candidates.shuffle(rng);
    candidates.truncate(limits.max_features.max(1));

    let mut best: Option<SplitCandidate> = None;

    for feature in candidates {
        let mut values: Vec<f64> = indices.iter().map(|&i| features[i][feature]).collect();
        values.sort_by(f64::total_cmp);
        values.dedup();

        for pair in values.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            let mut threshold = lo + (hi - lo) / 2.0;
            // Adjacent floats can round the midpoint up onto `hi`
            if threshold >= hi {
                threshold = lo;
            }

            let (left, right): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .partition(|&&i| features[i][feature] <= threshold);

            if left.len() < limits.min_samples_leaf || right.len() < limits.min_samples_leaf {
                continue;
            }

            let left_pos = left.iter().filter(|&&i| labels[i]).count();
            let right_pos = right.iter().filter(|&&i| labels[i]).count();
            let weighted = (left.len() as f64 * gini(left_pos, left.len())
                + right.len() as f64 * gini(right_pos, right.len()))
                / total;
            let gain = parent_impurity - weighted;

            if best.as_ref().map_or(true, |b| gain > b.gain) {
                best = Some(SplitCandidate {
                    feature,
                    threshold,
                    gain,
                    left,
                    right,
                });
            }
        }
    }

    best
}

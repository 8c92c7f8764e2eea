//! CART decision tree used by the random forest

use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;

/// Growth limits shared by every tree in a forest
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub min_samples_split: usize,
    pub n_classes: usize,
    /// Features considered per split
    pub max_features: usize,
}

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        class: usize,
    },
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

/// A single classification tree over row indices into a shared feature matrix
#[derive(Debug, Clone)]
pub(crate) struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Grow a tree over `indices` (bootstrap rows, possibly with repeats).
    pub(crate) fn fit(
        x: &Array2<f64>,
        y: &[usize],
        indices: Vec<usize>,
        config: &TreeConfig,
        rng: &mut StdRng,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(x, y, indices, 0, config, rng);
        tree
    }

    pub(crate) fn predict_row(&self, row: &ArrayView1<'_, f64>) -> usize {
        let mut node = 0;
        loop {
            match &self.nodes[node] {
                Node::Leaf { class } => return *class,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    fn grow(
        &mut self,
        x: &Array2<f64>,
        y: &[usize],
        indices: Vec<usize>,
        depth: usize,
        config: &TreeConfig,
        rng: &mut StdRng,
    ) -> usize {
        let counts = class_counts(y, &indices, config.n_classes);
        let stop = depth >= config.max_depth
            || indices.len() < config.min_samples_split
            || is_pure(&counts);

        let split = if stop {
            None
        } else {
            best_split(x, y, &indices, &counts, config, rng)
        };

        match split {
            None => self.push_leaf(majority(&counts)),
            Some(split) => {
                let (left_idx, right_idx) = partition(x, indices, split.feature, split.threshold);
                let id = self.nodes.len();
                self.nodes.push(Node::Split {
                    feature: split.feature,
                    threshold: split.threshold,
                    left: 0,
                    right: 0,
                });
                let left = self.grow(x, y, left_idx, depth + 1, config, rng);
                let right = self.grow(x, y, right_idx, depth + 1, config, rng);
                if let Node::Split {
                    left: l, right: r, ..
                } = &mut self.nodes[id]
                {
                    *l = left;
                    *r = right;
                }
                id
            }
        }
    }

    fn push_leaf(&mut self, class: usize) -> usize {
        self.nodes.push(Node::Leaf { class });
        self.nodes.len() - 1
    }
}

fn class_counts(y: &[usize], indices: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &i in indices {
        counts[y[i]] += 1;
    }
    counts
}

fn is_pure(counts: &[usize]) -> bool {
    counts.iter().filter(|&&c| c > 0).count() <= 1
}

// Lowest class wins ties.
fn majority(counts: &[usize]) -> usize {
    let mut best = 0;
    for (class, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = class;
        }
    }
    best
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

// Exhaustive threshold scan over a random feature subset: sort the node's
// samples per feature and evaluate the weighted Gini of every boundary
// between distinct values, tracking running class counts.
fn best_split(
    x: &Array2<f64>,
    y: &[usize],
    indices: &[usize],
    counts: &[usize],
    config: &TreeConfig,
    rng: &mut StdRng,
) -> Option<Split> {
    let n = indices.len();
    let parent_gini = gini(counts, n);
    if parent_gini == 0.0 {
        return None;
    }

    let n_features = x.ncols();
    let picked =
        rand::seq::index::sample(rng, n_features, config.max_features.min(n_features)).into_vec();

    let mut best: Option<Split> = None;
    let mut sorted: Vec<(f64, usize)> = Vec::with_capacity(n);

    for &feature in &picked {
        sorted.clear();
        sorted.extend(indices.iter().map(|&i| (x[[i, feature]], y[i])));
        sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut left_counts = vec![0usize; config.n_classes];
        for split_at in 1..n {
            left_counts[sorted[split_at - 1].1] += 1;

            let (prev, value) = (sorted[split_at - 1].0, sorted[split_at].0);
            if prev == value {
                continue;
            }
            if split_at < config.min_samples_leaf || n - split_at < config.min_samples_leaf {
                continue;
            }

            let right_counts: Vec<usize> = counts
                .iter()
                .zip(&left_counts)
                .map(|(&c, &l)| c - l)
                .collect();
            let weighted = (split_at as f64 * gini(&left_counts, split_at)
                + (n - split_at) as f64 * gini(&right_counts, n - split_at))
                / n as f64;

            if weighted < parent_gini
                && best.map_or(true, |b| weighted < b.impurity)
            {
                best = Some(Split {
                    feature,
                    threshold: (prev + value) / 2.0,
                    impurity: weighted,
                });
            }
        }
    }

    best
}

fn partition(
    x: &Array2<f64>,
    indices: Vec<usize>,
    feature: usize,
    threshold: f64,
) -> (Vec<usize>, Vec<usize>) {
    indices
        .into_iter()
        .partition(|&i| x[[i, feature]] <= threshold)
}

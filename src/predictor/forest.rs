use super::{check_len, Classifier};
use crate::error::{CkdError, CkdResult};
use serde::{Deserialize, Serialize};

const LEAF: i64 = -1;

/// A fitted binary decision tree stored as parallel node arrays.
///
/// Node `i` is a leaf when `children_left[i] == -1`. Otherwise samples with
/// `x[feature[i]] <= threshold[i]` go left. `value[i]` holds the class
/// weights seen at the node during fitting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub value: Vec<[f64; 2]>,
}

impl DecisionTree {
    pub fn n_nodes(&self) -> usize {
        self.feature.len()
    }

    fn validate(&self, n_features: usize) -> Result<(), String> {
        let n_nodes = self.n_nodes();
        if n_nodes == 0 {
            return Err("Decision tree has no nodes".to_string());
        }
        if [
            self.threshold.len(),
            self.children_left.len(),
            self.children_right.len(),
            self.value.len(),
        ]
        .iter()
        .any(|&len| len != n_nodes)
        {
            return Err("Decision tree node arrays have different lengths".to_string());
        }

        for node in 0..n_nodes {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == LEAF {
                if right != LEAF {
                    return Err(format!(
                        "Node {} has a right child but no left child", node
                    ));
                }
                let [w0, w1] = self.value[node];
                if !(w0 >= 0.0 && w1 >= 0.0 && w0 + w1 > 0.0) || !(w0 + w1).is_finite() {
                    return Err(format!(
                        "Leaf {} has invalid class weights {:?}", node, self.value[node]
                    ));
                }
                continue;
            }

            // Children must point forward, which rules out cycles.
            for child in [left, right] {
                if child <= node as i64 || child >= n_nodes as i64 {
                    return Err(format!(
                        "Node {} has out-of-range child {}", node, child
                    ));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature >= n_features as i64 {
                return Err(format!(
                    "Node {} splits on unknown feature {}", node, feature
                ));
            }
            if !self.threshold[node].is_finite() {
                return Err(format!(
                    "Node {} has a non-finite threshold", node
                ));
            }
        }

        Ok(())
    }

    /// Normalised class weights of the leaf reached by `features`.
    fn leaf_probabilities(&self, features: &[f64]) -> [f64; 2] {
        let mut node = 0usize;
        while self.children_left[node] != LEAF {
            let feature = self.feature[node] as usize;
            node = if features[feature] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        let [w0, w1] = self.value[node];
        let total = w0 + w1;
        [w0 / total, w1 / total]
    }
}

/// Averages leaf probabilities across trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    #[cfg(test)]
    pub fn new(n_features: usize, trees: Vec<DecisionTree>) -> CkdResult<Self> {
        let forest = Self { n_features, trees };
        forest.validate()?;
        Ok(forest)
    }

    pub fn validate(&self) -> CkdResult<()> {
        if self.trees.is_empty() {
            return Err(CkdError::Artifact("Random forest has no trees".to_string()));
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features)
                .map_err(|e| CkdError::Artifact(format!("tree {}: {}", idx, e)))?;
        }
        Ok(())
    }
}

impl Classifier for RandomForest {
    fn name(&self) -> &'static str {
        "random_forest"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn class_probabilities(&self, features: &[f64]) -> CkdResult<[f64; 2]> {
        check_len(self.n_features, features)?;
        let mut sum = [0.0, 0.0];
        for tree in &self.trees {
            let [p0, p1] = tree.leaf_probabilities(features);
            sum[0] += p0;
            sum[1] += p1;
        }
        let n = self.trees.len() as f64;
        Ok([sum[0] / n, sum[1] / n])
    }
}

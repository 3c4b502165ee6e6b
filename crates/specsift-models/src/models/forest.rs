//! Random forest built from bagged decision trees.

use std::fs::File;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use linfa::prelude::*;
use linfa::Dataset;
use linfa_trees::DecisionTree;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::models::classifier_trait::SpectrumClassifier;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        ForestParams {
            n_trees: 100,
            max_depth: None,
            seed: 42,
        }
    }
}

/// Bagging ensemble of decision trees with majority voting.
///
/// Each tree is fit on a bootstrap resample of the training set drawn
/// from a seeded generator, so runs are reproducible.
#[derive(Serialize, Deserialize)]
pub struct ForestClassifier {
    params: ForestParams,
    trees: Vec<DecisionTree<f64, usize>>,
    n_classes: usize,
}

impl ForestClassifier {
    pub fn new(params: ForestParams) -> Self {
        ForestClassifier {
            params,
            trees: Vec::new(),
            n_classes: 0,
        }
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Persist the fitted ensemble as JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer(file, self).context("serializing forest model")?;
        Ok(())
    }
}

impl SpectrumClassifier for ForestClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize]) -> Result<()> {
        anyhow::ensure!(x.nrows() == y.len(), "feature and label counts differ");
        anyhow::ensure!(x.nrows() > 0, "cannot fit a forest on an empty matrix");

        self.n_classes = y.iter().max().map(|m| m + 1).unwrap_or(0);

        let dataset = Dataset::new(x.clone(), Array1::from_vec(y.to_vec()));
        let mut rng = StdRng::seed_from_u64(self.params.seed);

        let mut trees = Vec::with_capacity(self.params.n_trees);
        for sample in dataset
            .bootstrap_samples(x.nrows(), &mut rng)
            .take(self.params.n_trees)
        {
            let tree = DecisionTree::params()
                .max_depth(self.params.max_depth)
                .fit(&sample)
                .map_err(|e| anyhow!("fitting decision tree: {e}"))?;
            trees.push(tree);
        }

        log::debug!(
            "fitted {} trees over {} classes",
            trees.len(),
            self.n_classes
        );
        self.trees = trees;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>> {
        anyhow::ensure!(self.is_fitted(), "forest predict called before fit");

        let mut votes = vec![vec![0u32; self.n_classes]; x.nrows()];
        for tree in &self.trees {
            let pred = tree.predict(x);
            for (row, &label) in pred.iter().enumerate() {
                if label < self.n_classes {
                    votes[row][label] += 1;
                }
            }
        }

        // Ties resolve to the lowest class index.
        Ok(votes
            .iter()
            .map(|row_votes| {
                row_votes
                    .iter()
                    .enumerate()
                    .max_by_key(|&(idx, &count)| (count, std::cmp::Reverse(idx)))
                    .map(|(idx, _)| idx)
                    .unwrap_or(0)
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "forest"
    }
}

//! Multi-metric grid search with a pluggable refit policy

use crate::classifier::{Classifier, FittedClassifier};
use crate::evaluate::Scoring;
use crate::model_selection::{take_labels, take_rows, StratifiedKFold};
use crate::svm::{FittedSvm, SvmClassifier, SvmParams};
use cloudclass_core::{Error, Result};
use itertools::iproduct;
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Candidate SVM configurations, grouped by kernel family
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SvmGrid {
    candidates: Vec<SvmParams>,
}

impl SvmGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every (gamma, C) combination of the rbf family
    pub fn rbf(mut self, gammas: &[f64], cs: &[f64]) -> Self {
        for (&gamma, &c) in iproduct!(gammas.iter(), cs.iter()) {
            self.candidates.push(SvmParams::rbf(gamma, c));
        }
        self
    }

    /// Add every (degree, C) combination of the polynomial family
    pub fn poly(mut self, degrees: &[u32], cs: &[f64]) -> Self {
        for (&degree, &c) in iproduct!(degrees.iter(), cs.iter()) {
            self.candidates.push(SvmParams::poly(degree, c));
        }
        self
    }

    /// Add a linear candidate per C
    pub fn linear(mut self, cs: &[f64]) -> Self {
        for &c in cs {
            self.candidates.push(SvmParams::linear(c));
        }
        self
    }

    /// Add a single explicit candidate
    pub fn candidate(mut self, params: SvmParams) -> Self {
        self.candidates.push(params);
        self
    }

    /// Broad default search space across the three kernel families
    pub fn standard() -> Self {
        let cs = [1.0, 10.0, 100.0, 1000.0];
        Self::new()
            .rbf(&[1e-3, 1e-4], &cs)
            .poly(&[1, 2, 3, 4, 5], &cs)
            .linear(&cs)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn params(&self) -> &[SvmParams] {
        &self.candidates
    }
}

/// Mean and spread of one metric across folds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreStats {
    pub mean: f64,
    pub std: f64,
}

/// Cross-validation outcome for one candidate configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScores {
    pub params: SvmParams,
    pub scores: BTreeMap<Scoring, ScoreStats>,
}

/// Picks the final configuration from the aggregated per-candidate scores.
///
/// The search component only guarantees the policy complete, correctly
/// aggregated cross-validation results; which trade-off the policy makes
/// between metrics is the caller's choice.
pub trait RefitPolicy {
    fn select(&self, candidates: &[CandidateScores]) -> Option<usize>;
}

/// Highest mean on a primary metric; ties fall back to the mean over all
/// collected metrics, then to the earliest candidate.
#[derive(Debug, Clone, Copy)]
pub struct BestMeanScore {
    pub primary: Scoring,
}

impl RefitPolicy for BestMeanScore {
    fn select(&self, candidates: &[CandidateScores]) -> Option<usize> {
        let mut best: Option<(usize, f64, f64)> = None;
        for (index, candidate) in candidates.iter().enumerate() {
            let Some(primary) = candidate.scores.get(&self.primary) else {
                continue;
            };
            let overall = candidate
                .scores
                .values()
                .map(|s| s.mean)
                .sum::<f64>()
                / candidate.scores.len() as f64;

            let better = match best {
                None => true,
                Some((_, best_primary, best_overall)) => {
                    primary.mean > best_primary
                        || (primary.mean == best_primary && overall > best_overall)
                }
            };
            if better {
                best = Some((index, primary.mean, overall));
            }
        }
        best.map(|(index, _, _)| index)
    }
}

/// Stratified k-fold, multi-metric grid search over SVM candidates
#[derive(Debug, Clone)]
pub struct GridSearch {
    pub folds: StratifiedKFold,
    pub scorings: Vec<Scoring>,
}

impl Default for GridSearch {
    fn default() -> Self {
        Self {
            folds: StratifiedKFold::new(5),
            scorings: vec![Scoring::Accuracy, Scoring::BalancedAccuracy],
        }
    }
}

/// Search outcome: every candidate's aggregated scores plus the model
/// refitted on the full training set with the selected configuration.
#[derive(Debug, Clone)]
pub struct GridSearchResult {
    pub candidates: Vec<CandidateScores>,
    pub best_index: usize,
    pub best_params: SvmParams,
    pub model: FittedSvm,
}

impl GridSearch {
    pub fn new(n_folds: usize, scorings: Vec<Scoring>) -> Self {
        Self {
            folds: StratifiedKFold::new(n_folds),
            scorings,
        }
    }

    /// Cross-validate every candidate, hand the aggregated scores to the
    /// refit policy, and fit its selection on the whole training set.
    pub fn run(
        &self,
        grid: &SvmGrid,
        x: &Array2<f64>,
        y: &Array1<usize>,
        policy: &dyn RefitPolicy,
    ) -> Result<GridSearchResult> {
        if grid.is_empty() {
            return Err(Error::EmptyGrid);
        }
        if self.scorings.is_empty() {
            return Err(Error::InvalidInput(
                "grid search needs at least one scoring metric".to_string(),
            ));
        }
        if x.nrows() != y.len() {
            return Err(Error::InvalidInput(format!(
                "{} feature rows but {} labels",
                x.nrows(),
                y.len()
            )));
        }

        let n_classes = y.iter().max().map_or(0, |&m| m + 1);
        let folds = self.folds.split(y, n_classes)?;
        log::info!(
            "grid search: {} candidates, {} folds, {} metrics",
            grid.len(),
            folds.len(),
            self.scorings.len()
        );

        let candidates: Vec<CandidateScores> = grid
            .params()
            .par_iter()
            .map(|&params| -> Result<CandidateScores> {
                let mut per_metric: BTreeMap<Scoring, Vec<f64>> = BTreeMap::new();
                for (train, test) in &folds {
                    let fitted = SvmClassifier::new(params)
                        .fit(&take_rows(x, train), &take_labels(y, train))?;
                    let y_pred = fitted.predict(&take_rows(x, test));
                    let y_test = take_labels(y, test);
                    for &scoring in &self.scorings {
                        per_metric
                            .entry(scoring)
                            .or_default()
                            .push(scoring.score(&y_test, &y_pred, n_classes)?);
                    }
                }
                let scores = per_metric
                    .into_iter()
                    .map(|(scoring, values)| (scoring, fold_stats(&values)))
                    .collect();
                log::debug!("scored candidate {:?}", params);
                Ok(CandidateScores { params, scores })
            })
            .collect::<Result<_>>()?;

        let best_index = policy
            .select(&candidates)
            .filter(|&index| index < candidates.len())
            .ok_or(Error::NoFeasibleCandidate)?;
        let best_params = candidates[best_index].params;
        log::info!("refit policy selected {:?}", best_params);

        let model = SvmClassifier::new(best_params).fit(x, y)?;
        Ok(GridSearchResult {
            candidates,
            best_index,
            best_params,
            model,
        })
    }
}

fn fold_stats(values: &[f64]) -> ScoreStats {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    ScoreStats {
        mean,
        std: var.sqrt(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    struct AlwaysFirst;

    impl RefitPolicy for AlwaysFirst {
        fn select(&self, _candidates: &[CandidateScores]) -> Option<usize> {
            Some(0)
        }
    }

    struct Never;

    impl RefitPolicy for Never {
        fn select(&self, _candidates: &[CandidateScores]) -> Option<usize> {
            None
        }
    }

    fn separable_data() -> (Array2<f64>, Array1<usize>) {
        let centers = [(0.0, 0.0), (10.0, 0.0)];
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for (class, &(cx, cy)) in centers.iter().enumerate() {
            for i in 0..10 {
                rows.extend_from_slice(&[cx + (i as f64) * 0.1, cy + ((i % 4) as f64) * 0.1]);
                labels.push(class);
            }
        }
        (
            Array2::from_shape_vec((labels.len(), 2), rows).unwrap(),
            Array1::from_vec(labels),
        )
    }

    fn scored(params: SvmParams, accuracy: f64, balanced: f64) -> CandidateScores {
        let mut scores = BTreeMap::new();
        scores.insert(
            Scoring::Accuracy,
            ScoreStats {
                mean: accuracy,
                std: 0.0,
            },
        );
        scores.insert(
            Scoring::BalancedAccuracy,
            ScoreStats {
                mean: balanced,
                std: 0.0,
            },
        );
        CandidateScores { params, scores }
    }

    #[test]
    fn test_empty_grid_rejected() {
        let (x, y) = separable_data();
        let err = GridSearch::default()
            .run(&SvmGrid::new(), &x, &y, &AlwaysFirst)
            .unwrap_err();
        assert!(matches!(err, Error::EmptyGrid));
    }

    #[test]
    fn test_single_candidate_is_selected() {
        let (x, y) = separable_data();
        let grid = SvmGrid::new().linear(&[100.0]);
        let search = GridSearch::new(2, vec![Scoring::Accuracy, Scoring::BalancedAccuracy]);

        let result = search.run(&grid, &x, &y, &AlwaysFirst).unwrap();
        assert_eq!(result.best_index, 0);
        assert_eq!(result.best_params, SvmParams::linear(100.0));
        assert_eq!(result.candidates.len(), 1);
        assert_eq!(result.candidates[0].scores.len(), 2);
    }

    #[test]
    fn test_policy_declining_is_an_error() {
        let (x, y) = separable_data();
        let grid = SvmGrid::new().linear(&[1.0]);
        let err = GridSearch::new(2, vec![Scoring::Accuracy])
            .run(&grid, &x, &y, &Never)
            .unwrap_err();
        assert!(matches!(err, Error::NoFeasibleCandidate));
    }

    #[test]
    fn test_grid_expansion_counts() {
        assert_eq!(SvmGrid::standard().len(), 2 * 4 + 5 * 4 + 4);
        assert_eq!(SvmGrid::new().rbf(&[0.1], &[1.0, 2.0]).len(), 2);
        assert!(SvmGrid::new().is_empty());
    }

    #[test]
    fn test_best_mean_score_policy() {
        let candidates = vec![
            scored(SvmParams::linear(1.0), 0.8, 0.9),
            scored(SvmParams::linear(10.0), 0.9, 0.7),
            scored(SvmParams::linear(100.0), 0.9, 0.8),
        ];
        let policy = BestMeanScore {
            primary: Scoring::Accuracy,
        };
        // 1 and 2 tie on accuracy; 2 wins on the overall mean
        assert_eq!(policy.select(&candidates), Some(2));

        let policy = BestMeanScore {
            primary: Scoring::BalancedAccuracy,
        };
        assert_eq!(policy.select(&candidates), Some(0));

        assert_eq!(policy.select(&[]), None);
    }

    #[test]
    fn test_best_mean_score_prefers_earliest_on_full_tie() {
        let candidates = vec![
            scored(SvmParams::linear(1.0), 0.9, 0.9),
            scored(SvmParams::linear(10.0), 0.9, 0.9),
        ];
        let policy = BestMeanScore {
            primary: Scoring::Accuracy,
        };
        assert_eq!(policy.select(&candidates), Some(0));
    }
}

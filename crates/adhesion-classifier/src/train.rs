use crate::error::ClassifierError;
use crate::logistic::{LogisticConfig, LogisticRegression};
use crate::split::{minority_count, stratified_kfold, stratified_split};
use ndarray::{Array2, Axis};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct TrainConfig {
    /// Fraction of each class held out for the test accuracy.
    pub test_size: f64,
    pub seed: u64,
    /// Cross-validation folds on the training part.
    pub cv_folds: usize,
    pub logistic: LogisticConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
            cv_folds: 5,
            logistic: LogisticConfig::default(),
        }
    }
}

/// Per-fold cross-validation accuracies.
#[derive(Debug, Clone, PartialEq)]
pub struct CvScores {
    pub scores: Vec<f64>,
}

impl CvScores {
    pub fn mean(&self) -> f64 {
        self.scores.iter().sum::<f64>() / self.scores.len().max(1) as f64
    }

    /// Population standard deviation.
    pub fn std(&self) -> f64 {
        let mean = self.mean();
        let var = self.scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>()
            / self.scores.len().max(1) as f64;
        var.sqrt()
    }
}

#[derive(Debug, Clone)]
pub struct TrainOutcome {
    /// Refit on every sample.
    pub model: LogisticRegression,
    pub train_size: usize,
    pub test_size: usize,
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    pub cv: Option<CvScores>,
}

fn rows(x: &Array2<f32>, y: &[u8], indices: &[usize]) -> (Array2<f32>, Vec<u8>) {
    (
        x.select(Axis(0), indices),
        indices.iter().map(|&i| y[i]).collect(),
    )
}

fn cross_validate(
    x: &Array2<f32>,
    y: &[u8],
    folds: usize,
    config: &LogisticConfig,
) -> Result<Option<CvScores>, ClassifierError> {
    let k = folds.min(minority_count(y));
    if k < 2 {
        warn!(
            "Skipping cross-validation: the smaller class has {} training samples",
            minority_count(y)
        );
        return Ok(None);
    }
    if k < folds {
        warn!("Reducing cross-validation from {} to {} folds", folds, k);
    }
    let scores = stratified_kfold(y, k)?
        .iter()
        .map(|fold| {
            let (x_train, y_train) = rows(x, y, &fold.train);
            let (x_test, y_test) = rows(x, y, &fold.test);
            LogisticRegression::fit(&x_train, &y_train, config)?.score(&x_test, &y_test)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(CvScores { scores }))
}

/// Stratified split, fit, score, cross-validate, then refit on everything.
pub fn train_classifier(
    x: &Array2<f32>,
    y: &[u8],
    config: &TrainConfig,
) -> Result<TrainOutcome, ClassifierError> {
    if x.nrows() != y.len() {
        return Err(ClassifierError::LengthMismatch {
            samples: x.nrows(),
            labels: y.len(),
        });
    }
    let split = stratified_split(y, config.test_size, config.seed)?;
    let (x_train, y_train) = rows(x, y, &split.train);
    let (x_test, y_test) = rows(x, y, &split.test);
    info!(
        "Training set size: {}, test set size: {}",
        split.train.len(),
        split.test.len()
    );

    let model = LogisticRegression::fit(&x_train, &y_train, &config.logistic)?;
    let train_accuracy = model.score(&x_train, &y_train)?;
    let test_accuracy = model.score(&x_test, &y_test)?;
    let cv = cross_validate(&x_train, &y_train, config.cv_folds, &config.logistic)?;

    info!("Fitting final model on all {} samples", y.len());
    let model = LogisticRegression::fit(x, y, &config.logistic)?;
    Ok(TrainOutcome {
        model,
        train_size: split.train.len(),
        test_size: split.test.len(),
        train_accuracy,
        test_accuracy,
        cv,
    })
}

//! # adhesion-classifier
//!
//! Logistic regression over sequence embeddings, built on candle.
//!
//! * [`LogisticRegression`] - fit / predict / predict_proba, saved as safetensors
//!   together with the embedder it was trained on.
//! * [`train_classifier`] - stratified hold-out and k-fold scoring, then a refit
//!   on all samples.
//! * [`metrics`] - confusion matrix, classification report and ROC-AUC.
//!
mod error;
mod logistic;
mod split;
mod train;

pub mod metrics;

pub use self::error::ClassifierError;
pub use self::logistic::{LogisticConfig, LogisticRegression, ModelMetadata, FORMAT_VERSION};
pub use self::metrics::{accuracy, roc_auc, ClassMetrics, ClassificationReport, ConfusionMatrix};
pub use self::split::{minority_count, stratified_kfold, stratified_split, Split};
pub use self::train::{train_classifier, CvScores, TrainConfig, TrainOutcome};

use crate::commands::predict::{load_model, resolve_embedder};
use crate::config::Defaults;
use crate::pipeline::{banner, extract, labels_for, load_labeled, EmbedArgs};
use adhesion_classifier::{accuracy, roc_auc, ClassificationReport, ConfusionMatrix};
use adhesion_plms::EmbedderKind;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Directory with positive test sequences [default: data/positive]
    #[arg(long)]
    positive: Option<PathBuf>,
    /// Directory with negative test sequences [default: data/negative]
    #[arg(long)]
    negative: Option<PathBuf>,
    /// Path to the trained model [default: models/adhesion_model_<MODEL_NAME>.safetensors]
    #[arg(long)]
    model: Option<PathBuf>,
    /// Embedding variant, must match training [default: the one recorded in the model]
    #[arg(long, value_enum)]
    model_name: Option<EmbedderKind>,
    #[command(flatten)]
    embed: EmbedArgs,
}

pub fn execute(args: EvaluateArgs, defaults: &Defaults) -> Result<()> {
    let positive = args.positive.unwrap_or_else(|| defaults.positive_dir());
    let negative = args.negative.unwrap_or_else(|| defaults.negative_dir());
    let model_path = args
        .model
        .unwrap_or_else(|| defaults.model_path(args.model_name.unwrap_or_default()));

    banner("Model Evaluation");
    let (classifier, metadata) = load_model(&model_path)?;
    let records = load_labeled(&positive, &negative, &args.embed.load_options())?;
    println!("  Total sequences: {}", records.len());

    let mut extractor = args
        .embed
        .extractor(resolve_embedder(args.model_name, &metadata));
    let embeddings = extract(&mut extractor, &records)?;
    classifier.check_dimension(embeddings.dim())?;
    let labels = labels_for(&records, &embeddings)?;

    let x = embeddings.to_array();
    let predictions = classifier.predict(&x)?;
    let scores: Vec<f32> = classifier
        .predict_proba(&x)?
        .into_iter()
        .map(|[_, p1]| p1)
        .collect();

    println!();
    banner("Results");
    println!("\nConfusion Matrix:");
    println!("{}", ConfusionMatrix::new(&labels, &predictions));
    println!("\nClassification Report:");
    println!("{}", ClassificationReport::new(&labels, &predictions));
    match roc_auc(&labels, &scores) {
        Some(auc) => println!("ROC-AUC: {:.3}", auc),
        None => println!("Could not calculate ROC-AUC (check class distribution)"),
    }
    println!("\nOverall Accuracy: {:.3}", accuracy(&labels, &predictions));
    println!("{}", "=".repeat(50));
    Ok(())
}

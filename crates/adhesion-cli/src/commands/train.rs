use crate::config::Defaults;
use crate::pipeline::{banner, extract, labels_for, load_labeled, EmbedArgs};
use adhesion_classifier::{train_classifier, TrainConfig};
use adhesion_plms::EmbedderKind;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory with positive training sequences [default: data/positive]
    #[arg(long)]
    positive: Option<PathBuf>,
    /// Directory with negative training sequences [default: data/negative]
    #[arg(long)]
    negative: Option<PathBuf>,
    /// Output path for the trained model [default: models/adhesion_model_<MODEL>.safetensors]
    #[arg(long)]
    output: Option<PathBuf>,
    /// Embedding used as classifier input
    #[arg(long, value_enum, default_value_t = EmbedderKind::default())]
    model: EmbedderKind,
    /// Proportion of data for the test set
    #[arg(long, default_value_t = 0.2)]
    test_size: f64,
    /// Seed for the train/test split
    #[arg(long, default_value_t = 42)]
    seed: u64,
    #[command(flatten)]
    embed: EmbedArgs,
}

pub fn execute(args: TrainArgs, defaults: &Defaults) -> Result<()> {
    let positive = args.positive.unwrap_or_else(|| defaults.positive_dir());
    let negative = args.negative.unwrap_or_else(|| defaults.negative_dir());
    let output = args.output.unwrap_or_else(|| defaults.model_path(args.model));

    banner("Adhesion Protein Classification - Training");
    let records = load_labeled(&positive, &negative, &args.embed.load_options())?;

    let mut extractor = args.embed.extractor(args.model);
    let embeddings = extract(&mut extractor, &records)?;
    let labels = labels_for(&records, &embeddings)?;
    let x = embeddings.to_array();

    println!("Training classifier...");
    let config = TrainConfig {
        test_size: args.test_size,
        seed: args.seed,
        ..TrainConfig::default()
    };
    let outcome = train_classifier(&x, &labels, &config)?;
    println!("  Training set size: {}", outcome.train_size);
    println!("  Test set size: {}", outcome.test_size);
    println!("  Training accuracy: {:.3}", outcome.train_accuracy);
    println!("  Test accuracy: {:.3}", outcome.test_accuracy);
    if let Some(cv) = &outcome.cv {
        println!(
            "  Cross-validation accuracy: {:.3} (+/- {:.3})",
            cv.mean(),
            cv.std() * 2.0
        );
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    outcome.model.save(&output, args.model)?;
    println!("Model saved to {}", output.display());

    banner("Training complete!");
    Ok(())
}

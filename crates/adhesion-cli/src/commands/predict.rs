use crate::config::{default_predictions_path, Defaults};
use crate::pipeline::{banner, extract, EmbedArgs};
use adhesion_classifier::{ClassifierError, LogisticRegression, ModelMetadata};
use adhesion_core::{Label, Prediction};
use adhesion_io::{find_fasta_files, load_sequences, write_predictions_csv};
use adhesion_plms::EmbedderKind;
use anyhow::{bail, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Input FASTA file or directory with FASTA files [default: data/input]
    #[arg(long)]
    input: Option<PathBuf>,
    /// Path to the trained model [default: models/adhesion_model_<MODEL_NAME>.safetensors]
    #[arg(long)]
    model: Option<PathBuf>,
    /// Embedding variant, must match training [default: the one recorded in the model]
    #[arg(long, value_enum)]
    model_name: Option<EmbedderKind>,
    /// Output CSV [default: <INPUT name>.adhesion_predict.csv in the working directory]
    #[arg(long)]
    output: Option<PathBuf>,
    /// Do not print per-sequence results
    #[arg(long)]
    silent: bool,
    /// Keep non-adhesion predictions in the output
    #[arg(long)]
    show_all: bool,
    #[command(flatten)]
    embed: EmbedArgs,
}

/// Load a saved classifier, turning a missing file into a hint to train first.
pub fn load_model(path: &Path) -> Result<(LogisticRegression, ModelMetadata)> {
    println!("Loading model from {}...", path.display());
    match LogisticRegression::load(path) {
        Ok(loaded) => Ok(loaded),
        Err(ClassifierError::ModelNotFound { path }) => bail!(
            "Model file not found at {}\nRun training first: adhesion-predict train",
            path.display()
        ),
        Err(e) => Err(e.into()),
    }
}

/// The embedder to run: the requested one, else the one the model was trained on.
pub fn resolve_embedder(requested: Option<EmbedderKind>, metadata: &ModelMetadata) -> EmbedderKind {
    match requested {
        Some(kind) if kind != metadata.embedder => {
            warn!(
                "Model was trained on {} embeddings but {} was requested",
                metadata.embedder, kind
            );
            kind
        }
        Some(kind) => kind,
        None => metadata.embedder,
    }
}

fn input_files(input: &Path) -> Result<Vec<PathBuf>> {
    let files = if input.is_file() {
        println!("Processing single file: {}", input.display());
        vec![input.to_path_buf()]
    } else if input.is_dir() {
        println!("Finding FASTA files in {}...", input.display());
        find_fasta_files(input)
    } else {
        bail!("{} is neither a file nor a directory", input.display());
    };
    if files.is_empty() {
        bail!("No FASTA files found in {}", input.display());
    }
    println!("Found {} FASTA file(s)", files.len());
    Ok(files)
}

pub fn execute(args: PredictArgs, defaults: &Defaults) -> Result<()> {
    let input = args.input.unwrap_or_else(|| defaults.input_dir());
    let model_path = args
        .model
        .unwrap_or_else(|| defaults.model_path(args.model_name.unwrap_or_default()));

    banner("Adhesion Protein Prediction");
    let (classifier, metadata) = load_model(&model_path)?;
    let kind = resolve_embedder(args.model_name, &metadata);

    let files = input_files(&input)?;
    let records = load_sequences(&files, &args.embed.load_options());
    if records.is_empty() {
        bail!("No sequences found in input files");
    }
    println!("Total sequences to predict: {}", records.len());

    let mut extractor = args.embed.extractor(kind);
    let embeddings = extract(&mut extractor, &records)?;
    classifier.check_dimension(embeddings.dim())?;

    println!("Making predictions...");
    let probabilities = classifier.predict_proba(&embeddings.to_array())?;
    let predictions: Vec<Prediction> = embeddings
        .rows()
        .iter()
        .zip(probabilities)
        .map(|(row, [_, p1])| Prediction {
            id: row.id.clone(),
            label: Label::from_index(u8::from(p1 > 0.5)),
            probability_adhesion: p1,
        })
        .collect();
    let n_adhesion = predictions.iter().filter(|p| p.is_adhesion()).count();
    let total = predictions.len();
    let reported: Vec<Prediction> = if args.show_all {
        predictions
    } else {
        predictions.into_iter().filter(Prediction::is_adhesion).collect()
    };

    if !args.silent {
        println!("\nResults:");
        println!("{}", "-".repeat(50));
        for p in &reported {
            println!("{}: {} (p={:.3})", p.id, p.label, p.probability_adhesion);
        }
    }

    let output = match args.output {
        Some(path) => path,
        None => default_predictions_path(&std::env::current_dir()?, &input),
    };
    println!("\nSaving results to {}...", output.display());
    write_predictions_csv(&output, &reported)?;
    println!("Predicted {} adhesion protein(s) out of {}", n_adhesion, total);

    banner("Prediction complete!");
    Ok(())
}

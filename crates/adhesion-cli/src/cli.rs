use super::commands;
use crate::config::Defaults;
use clap::{Parser, Subcommand};

/// Classify protein sequences as adhesion or non-adhesion proteins.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a classifier on positive and negative sequence sets
    Train(commands::train::TrainArgs),
    /// Score sequences with a trained classifier
    Predict(commands::predict::PredictArgs),
    /// Report classifier performance on labeled sequence sets
    Evaluate(commands::evaluate::EvaluateArgs),
    /// Sample ids from FASTA files, skipping ids listed in tab files
    SampleIds(commands::sample_ids::SampleIdsArgs),
    /// Keep BLAST tabular hits above a percent identity
    FilterBlast(commands::filter_blast::FilterBlastArgs),
}

impl Cli {
    pub fn execute(self) -> anyhow::Result<()> {
        let defaults = Defaults::from_env();
        match self.command {
            Commands::Train(args) => commands::train::execute(args, &defaults),
            Commands::Predict(args) => commands::predict::execute(args, &defaults),
            Commands::Evaluate(args) => commands::evaluate::execute(args, &defaults),
            Commands::SampleIds(args) => commands::sample_ids::execute(args),
            Commands::FilterBlast(args) => commands::filter_blast::execute(args),
        }
    }
}

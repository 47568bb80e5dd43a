use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Streaming anomaly-detection benchmark harness.
///
/// Removes recurring structure from each series with a variational mode
/// decomposition before handing the residual to an online detector, then
/// scores the detections against labelled anomaly windows.
#[derive(Parser, Debug)]
#[command(name = "andeped", version, about = "Streaming anomaly-detection benchmark harness")]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Prepare, stream and score every algorithm x dataset pair.
    Run(RunArgs),
    /// Score an existing run record against the labels.
    Score(ScoreArgs),
    /// Print the effective configuration as JSON.
    Config,
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Detector to benchmark; repeat for several (default: ALGORITHMS from the environment)
    #[arg(long = "algorithm", short = 'a')]
    pub algorithms: Vec<String>,

    /// Only run datasets whose name contains this string; repeat for several
    #[arg(long = "dataset", short = 'd')]
    pub datasets: Vec<String>,

    /// Worker threads for independent runs (default: one per core)
    #[arg(long, short = 'j')]
    pub jobs: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// Run record CSV produced by `andeped run`
    #[arg(long)]
    pub record: PathBuf,

    /// Data CSV whose timestamp column the labels refer to
    #[arg(long)]
    pub data: PathBuf,

    /// Offline CSV that precedes --data; labels falling in it are ignored
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Dataset name to look up in the labels file
    #[arg(long)]
    pub dataset: String,

    /// Threshold entry to use (default: the algorithm column of the record)
    #[arg(long)]
    pub algorithm: Option<String>,
}

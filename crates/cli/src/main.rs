mod cli;
mod data;
mod prepare;
mod runner;
mod score;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use andeped_core::HarnessConfig;

use crate::cli::{CliArgs, Command};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    andeped_core::config::load_dotenv();
    let config = HarnessConfig::from_env();

    match args.command {
        Command::Config => {
            let json = serde_json::to_string_pretty(&config).context("failed to encode config")?;
            println!("{json}");
        }
        Command::Run(run_args) => {
            config.log_summary();
            let summary = runner::run_all(&config, &run_args)?;
            for run in &summary.runs {
                match (&run.evaluation, &run.error) {
                    (_, Some(err)) => println!("{:<18} {:<40} FAILED  {err}", run.algorithm, run.dataset),
                    (Some(eval), None) => println!(
                        "{:<18} {:<40} P={:.3} R={:.3} F1={:.3}",
                        run.algorithm,
                        run.dataset,
                        eval.metrics.precision,
                        eval.metrics.recall,
                        eval.metrics.f1
                    ),
                    (None, None) => println!("{:<18} {:<40} done", run.algorithm, run.dataset),
                }
            }
            info!(
                summary = %runner::summary_path(&config).display(),
                "summary written"
            );
            if summary.failed > 0 {
                anyhow::bail!("{} of {} runs failed", summary.failed, summary.runs.len());
            }
        }
        Command::Score(score_args) => {
            let evaluation = score::score_command(&config, &score_args)?;
            let json =
                serde_json::to_string_pretty(&evaluation).context("failed to encode evaluation")?;
            println!("{json}");
        }
    }

    Ok(())
}

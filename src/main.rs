use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use digit_sweep::{CaseBuilder, CaseRunner, MnistLoader, ResultsSink, RunConfig};

/// Train MNIST classifiers on one case, sweeping hyperparameters.
#[derive(Parser, Debug)]
#[command(name = "digit-sweep", version, about)]
struct Cli {
    /// TOML run configuration; built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Case number to run
    #[arg(long)]
    case: Option<u32>,

    /// Directory the MNIST files are cached in
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// File the sorted results are written to
    #[arg(long)]
    results: Option<PathBuf>,

    /// Seed for weight initialization
    #[arg(long)]
    seed: Option<u64>,

    /// Run only the base hyperparameters
    #[arg(long)]
    no_grid_search: bool,
}

impl Cli {
    fn into_config(self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load_from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => RunConfig::default(),
        };
        if let Some(case) = self.case {
            config.case = case;
        }
        if let Some(data_dir) = self.data_dir {
            config.data_dir = data_dir;
        }
        if let Some(results) = self.results {
            config.results_path = results;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.no_grid_search {
            config.grid.enabled = false;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("digit_sweep=info")),
        )
        .init();

    let config = Cli::parse().into_config()?;

    let mnist = MnistLoader::new(&config.data_dir)
        .with_mirror(config.mirror.clone())
        .load()
        .context("loading MNIST")?;
    let builder = CaseBuilder::new(mnist.train, mnist.test, config.case_specs());
    let case = builder.build(config.case)?;

    let mut sink = ResultsSink::new();
    let reports = CaseRunner::new(config.seed).run(&case, &config.grid_search(), &mut sink)?;

    let passed = reports.iter().filter(|report| report.passed()).count();
    println!("Case #{}: {}/{} runs passed", case.id, passed, reports.len());

    sink.write_to(&config.results_path)?;
    Ok(())
}

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use log::{error, info};
use std::path::PathBuf;

mod config;
mod record;
mod predictor;
mod samples;
mod batch;
mod output;
mod error;

use crate::config::Config;
use crate::predictor::RiskPredictor;
use crate::record::PatientRecord;
use crate::samples::Sample;

#[derive(Parser)]
#[command(name = "ckd_risk")]
#[command(about = "Chronic kidney disease risk estimation from clinical measurements")]
struct Cli {
    /// Configuration file path (defaults to artifacts/ in the working directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the decision threshold on the at-risk probability
    #[arg(short, long, global = true)]
    threshold: Option<f64>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess a single patient
    Predict(PredictArgs),

    /// Assess every row of a CSV file
    Batch {
        /// CSV file with one patient per row and a header of field names
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print preset patient records as JSON
    Samples {
        /// Only print this preset
        #[arg(short, long, value_enum)]
        name: Option<Sample>,
    },
}

#[derive(Args)]
struct PredictArgs {
    /// JSON file holding one patient record
    #[arg(short, long, conflicts_with_all = ["sample", "field"])]
    input: Option<PathBuf>,

    /// Use a preset patient
    #[arg(short, long, value_enum, conflicts_with = "field")]
    sample: Option<Sample>,

    /// Field given as name=value, repeatable
    #[arg(short, long = "field", value_name = "NAME=VALUE")]
    field: Vec<String>,

    /// Print the prediction as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    if let Commands::Samples { name } = &cli.command {
        return print_samples(*name);
    }

    let predictor = load_predictor(&cli)?;

    match cli.command {
        Commands::Predict(args) => predict(&predictor, args),
        Commands::Batch { input, output } => run_batch(&predictor, input, output),
        Commands::Samples { .. } => Ok(()),
    }
}

fn load_predictor(cli: &Cli) -> anyhow::Result<RiskPredictor> {
    let mut config = match &cli.config {
        Some(path) => {
            let config = Config::from_file(path)
                .with_context(|| format!("failed to read configuration {:?}", path))?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => Config::default(),
    };

    if let Some(threshold) = cli.threshold {
        config = config.with_threshold(threshold)?;
    }

    let predictor = RiskPredictor::load(&config)
        .context("model artifacts are unavailable; refusing to serve predictions")?;
    info!(
        "Risk predictor ready ({}, threshold {})",
        predictor.classifier_name(),
        predictor.threshold()
    );
    Ok(predictor)
}

fn predict(predictor: &RiskPredictor, args: PredictArgs) -> anyhow::Result<()> {
    let record = if let Some(path) = &args.input {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read record {:?}", path))?;
        PatientRecord::from_json_str(&content)?
    } else if let Some(sample) = args.sample {
        sample.record()
    } else if !args.field.is_empty() {
        PatientRecord::from_pairs(&args.field)?
    } else {
        bail!("provide a patient with --input, --sample or --field");
    };

    let result = match predictor.assess(&record) {
        Ok(result) => result,
        Err(e) => {
            error!("Prediction rejected: {}", e);
            return Err(e.into());
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", output::prediction_report(record.id.as_deref(), &result));
    }
    Ok(())
}

fn run_batch(predictor: &RiskPredictor, input: PathBuf, output_dir: PathBuf) -> anyhow::Result<()> {
    let records = batch::read_records(&input)
        .with_context(|| format!("failed to read patients from {:?}", input))?;
    info!("Read {} records from {:?}", records.len(), input);

    let outcome = batch::assess_batch(predictor, records);

    std::fs::create_dir_all(&output_dir)?;
    let summary = output::save_results(&outcome, &output_dir)?;
    info!(
        "{} of {} assessed records at risk; results saved to {:?}",
        summary.n_at_risk, summary.n_assessed, output_dir
    );
    Ok(())
}

fn print_samples(name: Option<Sample>) -> anyhow::Result<()> {
    let samples: Vec<Sample> = match name {
        Some(sample) => vec![sample],
        None => Sample::ALL.to_vec(),
    };
    for sample in samples {
        println!("{}", serde_json::to_string_pretty(&sample.record())?);
    }
    Ok(())
}

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

use toothscan::{
    AnalysisConfig, CalculusPipeline, DiscolorationModel, EmptyCoverageModel, FailureReport,
    MaskDirectoryDetector, PipelineReport,
};

#[derive(Parser)]
#[command(name = "toothscan")]
#[command(about = "Estimate per-tooth calculus coverage and annotate a dental photograph")]
#[command(version)]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Directory of per-tooth instance masks (PNG) from an external segmenter;
    /// the built-in threshold detector is used when omitted
    #[arg(long, value_name = "DIR")]
    masks: Option<PathBuf>,

    /// Model producing per-tooth coverage masks
    #[arg(long, value_enum, default_value_t = ModelChoice::Discoloration)]
    coverage_model: ModelChoice,

    /// JSON configuration file; missing keys use defaults
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Save per-tooth debug images to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModelChoice {
    /// Colour heuristic flagging yellow-brown deposits
    Discoloration,
    /// Flags nothing; every tooth reports 0%
    None,
}

fn main() -> ExitCode {
    let args = Cli::parse();
    init_logging(args.verbose);

    let report = match build_pipeline(&args) {
        Ok(pipeline) => pipeline.run(&args.image_path),
        Err(e) => {
            log::error!("{e:#}");
            PipelineReport::Failure(FailureReport::new(format!("{e:#}")))
        }
    };

    match report.to_json() {
        Ok(json) => println!("{json}"),
        Err(e) => {
            log::error!("failed to serialize report: {e}");
            return ExitCode::FAILURE;
        }
    }

    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Stderr)
        .init();
}

fn build_pipeline(args: &Cli) -> anyhow::Result<CalculusPipeline> {
    let config = match &args.config {
        Some(path) => AnalysisConfig::from_json_file(path)?,
        None => AnalysisConfig::default(),
    };
    log::debug!("configuration: {config:?}");

    let mut pipeline = CalculusPipeline::new(config.clone());

    if let Some(dir) = &args.masks {
        pipeline = pipeline.with_detector(Box::new(MaskDirectoryDetector::new(dir)));
    }

    pipeline = match args.coverage_model {
        ModelChoice::Discoloration => pipeline.with_coverage_model(Box::new(
            DiscolorationModel::new(config.discoloration),
        )),
        ModelChoice::None => pipeline.with_coverage_model(Box::new(EmptyCoverageModel)),
    };

    if let Some(dir) = &args.debug_out {
        pipeline = pipeline.with_debug(dir.clone())?;
    }

    Ok(pipeline)
}

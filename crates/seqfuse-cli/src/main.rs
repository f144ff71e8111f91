//! seqfuse CLI: run YAML pipelines over JSON input.

use clap::{Parser, Subcommand};
use seqfuse_core::config::EngineConfig;
use seqfuse_core::value::Value;
use seqfuse_exec::Engine;
use seqfuse_planner::{parse_yaml_pipeline, PipelineConfig};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

#[derive(Parser)]
#[command(name = "seqfuse")]
#[command(about = "seqfuse: single-pass lazy sequence pipelines", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a pipeline from a YAML file over a JSON document
    Run {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,

        /// JSON input file, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: String,

        /// Apply every stage on its own (overrides config)
        #[arg(long)]
        no_fusion: bool,

        /// Maximum number of stages, 0 for no limit (overrides config)
        #[arg(long)]
        max_stages: Option<usize>,

        /// Print run statistics to stderr
        #[arg(long)]
        stats: bool,

        /// Pretty-print the JSON result
        #[arg(long)]
        pretty: bool,
    },

    /// Validate a pipeline YAML file (parse and build every stage)
    Validate {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,
    },

    /// Show the fusion plan for a pipeline (EXPLAIN)
    Explain {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,

        /// Explain the unfused, one-stage-at-a-time plan
        #[arg(long)]
        no_fusion: bool,
    },
}

/// Command-line overrides; highest precedence.
#[derive(Debug, Default)]
struct Overrides {
    no_fusion: bool,
    max_stages: Option<usize>,
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            pipeline,
            input,
            no_fusion,
            max_stages,
            stats,
            pretty,
        } => {
            let overrides = Overrides {
                no_fusion,
                max_stages,
            };
            if let Err(e) = run_pipeline(&pipeline, &input, &overrides, stats, pretty) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Validate { pipeline } => {
            if let Err(e) = validate_pipeline(&pipeline) {
                eprintln!("Validation failed: {}", e);
                std::process::exit(1);
            }
            println!("✓ Pipeline is valid");
        }
        Commands::Explain {
            pipeline,
            no_fusion,
        } => {
            let overrides = Overrides {
                no_fusion,
                ..Overrides::default()
            };
            if let Err(e) = explain_pipeline(&pipeline, &overrides) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

/// Structured logs to stderr; `RUST_LOG` picks the level (default: warn).
fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

fn run_pipeline(
    pipeline_path: &Path,
    input: &str,
    overrides: &Overrides,
    print_stats: bool,
    pretty: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let yaml_content = fs::read_to_string(pipeline_path)?;
    let parsed = parse_yaml_pipeline(&yaml_content)?;
    let stages = parsed.stages()?;

    let source = read_input(input)?;
    let config = resolve_config(EngineConfig::from_env(), &parsed.config, overrides);
    tracing::debug!(?config, steps = stages.len(), "running pipeline");

    let out = Engine::new(config).run_with_stats(source, &stages)?;

    let json = serde_json::Value::from(out.value);
    if pretty {
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        println!("{}", json);
    }
    if print_stats {
        eprintln!("{}", serde_json::to_string(&out.stats)?);
    }
    Ok(())
}

fn validate_pipeline(pipeline_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let yaml_content = fs::read_to_string(pipeline_path)?;
    let _ = parse_yaml_pipeline(&yaml_content)?;
    Ok(())
}

fn explain_pipeline(
    pipeline_path: &Path,
    overrides: &Overrides,
) -> Result<(), Box<dyn std::error::Error>> {
    let yaml_content = fs::read_to_string(pipeline_path)?;
    let parsed = parse_yaml_pipeline(&yaml_content)?;
    let stages = parsed.stages()?;
    let config = resolve_config(EngineConfig::from_env(), &parsed.config, overrides);
    let plan = Engine::new(config.clone()).plan(&stages)?;

    println!("Pipeline Fusion Plan");
    println!("====================");
    println!();
    println!("Stages: {}", stages.len());
    println!("Fusion: {}", if config.fusion { "on" } else { "off" });
    println!("Plan fingerprint: {}", plan.fingerprint()?.short());
    println!(
        "Segments: {} ({} fused runs, {} eager stages)",
        plan.segments.len(),
        plan.fused_runs(),
        plan.eager_stages()
    );
    println!();
    for (i, line) in plan.describe().iter().enumerate() {
        println!("  {}. {}", i + 1, line);
    }

    Ok(())
}

/// Layer configuration: environment, then the pipeline file, then flags.
fn resolve_config(base: EngineConfig, doc: &PipelineConfig, overrides: &Overrides) -> EngineConfig {
    let mut cfg = base;
    doc.apply_to(&mut cfg);
    if overrides.no_fusion {
        cfg.fusion = false;
    }
    if let Some(n) = overrides.max_stages {
        cfg.max_stages = if n == 0 { None } else { Some(n) };
    }
    cfg
}

fn read_input(input: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let text = if input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(input)?
    };
    let json: serde_json::Value = serde_json::from_str(&text)?;
    Ok(Value::from(json))
}

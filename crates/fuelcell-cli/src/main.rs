use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use fuelcell_api::{init_tracing, AppState};
use fuelcell_core::{
    model_display_name, AnalysisContext, AnalysisRequest, AnalysisResponse, ConfigManager,
    ContextBuilder, CurveAnalysis, FuelCellConfig, LoggingConfig, PreviewExtractor,
    ReportSegmenter, SegmentedReport,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_FILE: &str = ".fuelcell.toml";

#[derive(Parser)]
#[command(name = "fuelcell")]
#[command(about = "Fuel cell polarization curve analysis and narrative reports", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (default: ./.fuelcell.toml, then ~/.fuelcell/config.toml)
    #[arg(short, long, global = true, env = "FUELCELL_CONFIG")]
    config: Option<PathBuf>,

    /// Output format (pretty, json)
    #[arg(short, long, global = true, default_value = "pretty")]
    output: OutputFormat,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Pretty,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the maximum power and open circuit points of a curve
    Analyze {
        /// JSON analysis request (currents, voltages, powers, conditions)
        file: PathBuf,
    },

    /// Analyse a curve, then request a narrative report for it
    Narrate {
        /// JSON analysis request
        file: PathBuf,
    },

    /// Split a saved narrative report into its sections
    Segment {
        /// Report text file
        file: PathBuf,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration (secrets omitted)
    Show,

    /// Write a default configuration file
    Init {
        /// Destination (default: ./.fuelcell.toml)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = execute_command(&cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
    Ok(())
}

async fn execute_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Analyze { file } => {
            let config = load_config(cli)?;
            let request = read_request(file)?;
            let curve = request.curve()?;
            let analysis = curve.analyze();

            match cli.output {
                OutputFormat::Json => print_json(&serde_json::to_value(&analysis)?),
                OutputFormat::Pretty => {
                    let context = ContextBuilder::new(config.stack.clone()).build(
                        &curve,
                        &analysis,
                        &request.operating_context(),
                    );
                    print_analysis(&context);
                    Ok(())
                }
            }
        }

        Commands::Narrate { file } => {
            let config = load_config(cli)?;
            narrate(cli.output, config, file).await
        }

        Commands::Segment { file } => {
            let config = load_config(cli)?;
            let text = std::fs::read_to_string(file)
                .with_context(|| format!("Failed to read report {}", file.display()))?;
            let preview = PreviewExtractor::new(config.display.preview_chars);

            match cli.output {
                OutputFormat::Json => print_json(&segment_value(&text, &preview)),
                OutputFormat::Pretty => {
                    print_report(&text, &preview);
                    Ok(())
                }
            }
        }

        Commands::Config(ConfigCommands::Show) => {
            let config = load_config(cli)?;
            match cli.output {
                OutputFormat::Json => print_json(&serde_json::to_value(&config)?),
                OutputFormat::Pretty => {
                    println!("{}", toml::to_string_pretty(&config)?);
                    Ok(())
                }
            }
        }

        Commands::Config(ConfigCommands::Init { path, force }) => {
            let path = path
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            init_config(&path, *force)?;
            println!("{} {}", "Created".green().bold(), path.display());
            Ok(())
        }
    }
}

fn load_config(cli: &Cli) -> Result<FuelCellConfig> {
    let manager = match &cli.config {
        Some(path) => ConfigManager::load_from_path(path),
        None => ConfigManager::load(),
    }
    .context("Failed to load configuration")?;

    init_tracing(&cli_logging(&manager.config().logging, cli.verbose));

    Ok(manager.config().clone())
}

/// Configured logging, with `--verbose` raising the level and compact lines on the terminal.
fn cli_logging(config: &LoggingConfig, verbose: bool) -> LoggingConfig {
    let mut logging = config.clone();
    if verbose {
        logging.level = "debug".to_string();
    }
    if logging.format == "pretty" {
        logging.format = "compact".to_string();
    }
    logging
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists; pass --force to overwrite",
            path.display()
        );
    }
    ConfigManager::create_default_config(path)?;
    Ok(())
}

fn read_request(path: &Path) -> Result<AnalysisRequest> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid analysis request in {}", path.display()))
}

/// Numeric result first, then the narrative; a narrative failure still exits non-zero.
async fn narrate(format: OutputFormat, config: FuelCellConfig, file: &Path) -> Result<()> {
    let request = read_request(file)?;
    let curve = request.curve()?;
    let analysis = curve.analyze();

    let state = AppState::new(config)?;
    let context = state
        .context_builder
        .build(&curve, &analysis, &request.operating_context());

    if let OutputFormat::Pretty = format {
        print_analysis(&context);
        println!();
        println!("{}", "Requesting narrative...".dimmed());
    }

    let narrative = async {
        let narrator = state.narrator.clone().ok_or_else(|| {
            anyhow!("Narrative generation is not configured (set GOOGLE_API_KEY or llm.provider)")
        })?;
        let deadline = Duration::from_secs(state.config.llm.deadline_secs);
        let summary = tokio::time::timeout(deadline, narrator.request(&context))
            .await
            .map_err(|_| anyhow!("No narrative within {} seconds", deadline.as_secs()))??;
        Ok::<String, anyhow::Error>(summary)
    }
    .await;

    match (format, narrative) {
        (OutputFormat::Pretty, Ok(summary)) => {
            print_report(&summary, &state.preview);
            Ok(())
        }
        (OutputFormat::Json, Ok(summary)) => {
            print_json(&serde_json::to_value(AnalysisResponse::new(
                summary, &analysis, &request,
            ))?)
        }
        (OutputFormat::Pretty, Err(e)) => Err(e),
        (OutputFormat::Json, Err(e)) => {
            print_json(&failure_value(&analysis, &e))?;
            Err(e)
        }
    }
}

fn failure_value(analysis: &CurveAnalysis, error: &anyhow::Error) -> serde_json::Value {
    json!({
        "error": format!("{:#}", error),
        "analysis": analysis,
    })
}

fn segment_value(text: &str, preview: &PreviewExtractor) -> serde_json::Value {
    let report = ReportSegmenter::new().segment(text);
    let sections: Vec<_> = report
        .standard_sections()
        .into_iter()
        .map(|(_, view)| view)
        .collect();

    json!({
        "preview": preview.extract(text),
        "sections": sections,
        "blocks": report.blocks(),
    })
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_analysis(context: &AnalysisContext) {
    println!("{}", "Operating conditions".cyan().bold());
    println!("  {}: {}", "Model".cyan(), describe_model(&context.model_type));
    println!("  {}: {} °C", "Temperature".cyan(), context.temperature);
    println!(
        "  {}: {} L/min H2, {} L/min O2",
        "Flow".cyan(),
        context.hydrogen,
        context.oxygen
    );
    for line in context.humidity_info.lines() {
        println!("  {}", line);
    }

    println!("\n{}", "Maximum power point".cyan().bold());
    println!("  {}: {} W", "Power".cyan(), context.max_power.yellow());
    println!("  {}: {} A", "Current".cyan(), context.max_power_current.yellow());
    println!(
        "  {}: {} V ({} V per cell)",
        "Voltage".cyan(),
        context.max_power_voltage.yellow(),
        context.avg_cell_voltage_mpp
    );

    println!("\n{}", "Maximum voltage point".cyan().bold());
    println!(
        "  {}: {} V ({} V per cell)",
        "Voltage".cyan(),
        context.max_voltage.yellow(),
        context.avg_cell_ocv
    );

    println!("\n{}", "Derived metrics".cyan().bold());
    println!(
        "  {}: {} V ({}%)",
        "Voltage drop".cyan(),
        context.voltage_drop,
        context.voltage_drop_percent
    );
    println!("  {}: {} W/A", "Power density".cyan(), context.power_density);
    println!("  {}: {} V/W", "Efficiency ratio".cyan(), context.efficiency_ratio);
    println!(
        "  {}: {} cells, ranges {} A / {} V / {} W",
        "Stack".cyan(),
        context.cell_count,
        context.current_range,
        context.voltage_range,
        context.power_range
    );
}

fn describe_model(model_type: &str) -> String {
    let name = model_display_name(model_type);
    if name == model_type || model_type.is_empty() {
        name.to_string()
    } else {
        format!("{} ({})", name, model_type)
    }
}

fn print_report(text: &str, preview: &PreviewExtractor) {
    let report: SegmentedReport = ReportSegmenter::new().segment(text);

    println!("{}", "Preview".cyan().bold());
    println!("  {}", preview.extract(text).text);

    for (section, view) in report.standard_sections() {
        println!("\n{}", section.title().cyan().bold());
        if view.is_available() {
            println!("{}", view.display_text());
        } else {
            println!("{}", view.display_text().dimmed());
        }
    }
}

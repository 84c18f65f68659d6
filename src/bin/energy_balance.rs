//! Energy balance CLI
//!
//! Commands:
//! - compute: Build the daily report (or dashboard summary) from a DailyInput JSON file
//! - window: Gather a calibration window from file-backed providers and report its last day
//! - schema: Print input and output schema information

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use energy_balance::config::EngineConfig;
use energy_balance::pipeline::EnergyBalanceProcessor;
use energy_balance::providers::{fetch_daily_input, gather_window, FileProviders};
use energy_balance::types::{DailyInput, HistoricalWeights};
use energy_balance::{ComputeError, ENGINE_VERSION};

/// Default report path when none is given
const DEFAULT_OUTPUT: &str = "energy_balance_output.json";

/// Daily energy balance from food logs, wearable signals and body weight
#[derive(Parser)]
#[command(name = "energy-balance")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Estimate daily energy balance with confidence ranges", long_about = None)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the report for one day of input
    Compute {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,

        /// Engine configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Intake bias factor override
        #[arg(long)]
        bias_factor: Option<f64>,

        /// Expenditure correction factor override
        #[arg(long)]
        exp_correction: Option<f64>,

        /// Write the dashboard summary instead of the full report
        #[arg(long)]
        summary: bool,

        /// Pretty-print the output JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Gather a calibration window from JSON files and report its last day
    Window {
        /// User profile file (JSON)
        #[arg(long)]
        profile: PathBuf,

        /// Directory of per-day band files named YYYY-MM-DD.json
        #[arg(long)]
        band_dir: PathBuf,

        /// Health metric records file (JSON array)
        #[arg(long)]
        metrics: Option<PathBuf>,

        /// Last day of the window (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// User identifier passed to the providers
        #[arg(long, default_value = "local")]
        user: String,

        /// Historical weights file (JSON object of date to kg)
        #[arg(long)]
        weights: Option<PathBuf>,

        /// Engine configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,

        /// Pretty-print the output JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print
        #[arg(value_enum, default_value = "report")]
        schema_type: SchemaType,
    },
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Daily input document
    Input,
    /// Daily energy balance report
    Report,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), EnergyBalanceCliError> {
    match cli.command {
        Commands::Compute {
            input,
            output,
            config,
            bias_factor,
            exp_correction,
            summary,
            pretty,
        } => {
            let mut config = load_config(config.as_deref())?;
            if bias_factor.is_some() {
                config.bias_factor = bias_factor;
            }
            if exp_correction.is_some() {
                config.exp_correction = exp_correction;
            }
            cmd_compute(&input, &output, config, summary, pretty)
        }

        Commands::Window {
            profile,
            band_dir,
            metrics,
            date,
            user,
            weights,
            config,
            output,
            pretty,
        } => {
            let config = load_config(config.as_deref())?;
            let providers = FileProviders::new(&profile, &band_dir, metrics.as_deref());
            cmd_window(
                &providers,
                &user,
                &date,
                weights.as_deref(),
                config,
                &output,
                pretty,
            )
        }

        Commands::Schema { schema_type } => cmd_schema(schema_type),
    }
}

fn cmd_compute(
    input: &Path,
    output: &Path,
    config: EngineConfig,
    summary: bool,
    pretty: bool,
) -> Result<(), EnergyBalanceCliError> {
    let input_data = read_input(input)?;
    let daily: DailyInput = serde_json::from_str(&input_data)?;
    let processor = EnergyBalanceProcessor::with_config(config)?;

    let pretty = use_pretty(output, pretty);
    let output_data = if summary {
        encode(&processor.summarize(&daily)?, pretty)?
    } else {
        encode(&processor.process(&daily)?, pretty)?
    };

    write_output(output, &output_data)?;
    info!(date = %daily.date, output = %output.display(), "wrote daily energy balance");
    Ok(())
}

fn cmd_window(
    providers: &FileProviders,
    user: &str,
    date: &str,
    weights: Option<&Path>,
    config: EngineConfig,
    output: &Path,
    pretty: bool,
) -> Result<(), EnergyBalanceCliError> {
    let end = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| ComputeError::DateParseError(format!("{date}: {e}")))?;
    let processor = EnergyBalanceProcessor::with_config(config)?;

    let window = gather_window(providers, user, end, processor.config().calibration_window_days);
    info!(
        days = window.days.len(),
        failures = window.failures,
        "gathered calibration window"
    );

    let mut daily = fetch_daily_input(providers, providers, providers, user, end)?;
    if let Some(path) = weights {
        let series: HistoricalWeights = serde_json::from_str(&fs::read_to_string(path)?)?;
        daily.historical_weights = Some(series);
    }

    let report = processor.process(&daily)?;

    write_output(output, &encode(&report, use_pretty(output, pretty))?)?;
    info!(date = %report.date, output = %output.display(), "wrote daily energy balance");
    Ok(())
}

fn cmd_schema(schema_type: SchemaType) -> Result<(), EnergyBalanceCliError> {
    let schema = match schema_type {
        SchemaType::Input => input_json_schema(),
        SchemaType::Report => report_json_schema(),
    };
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

// Helper functions

fn load_config(path: Option<&Path>) -> Result<EngineConfig, EnergyBalanceCliError> {
    match path {
        Some(path) => Ok(EngineConfig::from_json(&fs::read_to_string(path)?)?),
        None => Ok(EngineConfig::default()),
    }
}

fn read_input(input: &Path) -> Result<String, EnergyBalanceCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn write_output(output: &Path, data: &str) -> Result<(), EnergyBalanceCliError> {
    if output.to_string_lossy() == "-" {
        println!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

/// Pretty output when asked for, or when writing to an interactive stdout
fn use_pretty(output: &Path, pretty: bool) -> bool {
    pretty || (output.to_string_lossy() == "-" && atty::is(atty::Stream::Stdout))
}

fn encode<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String, EnergyBalanceCliError> {
    if pretty {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(serde_json::to_string(value)?)
    }
}

fn input_json_schema() -> serde_json::Value {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "daily_input",
        "description": "One day of profile, wearable and health-metric data",
        "type": "object",
        "required": ["date", "profile"],
        "properties": {
            "date": { "type": "string", "format": "date" },
            "profile": {
                "type": "object",
                "properties": {
                    "weight_kg": { "type": "number" },
                    "height_cm": { "type": "number", "default": 170 },
                    "age": { "type": "number", "default": 30 },
                    "gender": { "type": "string", "default": "male" },
                    "macro_goals": { "type": "object" }
                }
            },
            "band_data": {
                "type": "object",
                "properties": {
                    "hr": { "type": "array", "items": { "type": "object" } },
                    "hrv": { "type": "array", "items": { "type": "object" } },
                    "cgm": { "type": "array", "items": { "type": "object" } },
                    "activity": { "type": "array", "items": { "type": "object" } }
                }
            },
            "health_metrics": { "type": "array", "items": { "type": "object" } },
            "historical_weights": {
                "type": "object",
                "additionalProperties": { "type": "number" }
            },
            "current_weight": { "type": "number" },
            "bias_factor": { "type": "number", "exclusiveMinimum": 0 },
            "exp_correction": { "type": "number", "exclusiveMinimum": 0 }
        }
    })
}

fn report_json_schema() -> serde_json::Value {
    let integer = serde_json::json!({ "type": "integer" });
    let number = serde_json::json!({ "type": "number" });

    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "daily_energy_balance",
        "description": "Daily energy balance report",
        "type": "object",
        "required": [
            "date", "energy_balance", "intake", "expenditure",
            "body_metrics", "calibration", "optional_metrics"
        ],
        "properties": {
            "date": { "type": "string", "format": "date" },
            "energy_balance": {
                "type": "object",
                "properties": {
                    "estimate_kcal": integer,
                    "confidence_range_kcal": {
                        "type": "array", "items": integer, "minItems": 2, "maxItems": 2
                    },
                    "trend_14d": { "enum": ["deficit", "surplus", "balance"] },
                    "risk_flags": {
                        "type": "array",
                        "items": {
                            "enum": ["food_log_missing", "wearable_HR_incomplete", "weight_history_missing"]
                        }
                    }
                }
            },
            "intake": {
                "type": "object",
                "properties": {
                    "logged_kcal": integer,
                    "bias_adjusted_kcal": integer,
                    "macros": {
                        "type": "object",
                        "properties": { "protein_g": integer, "carbs_g": integer, "fat_g": integer }
                    },
                    "confidence": number
                }
            },
            "expenditure": {
                "type": "object",
                "properties": {
                    "RMR_kcal": integer,
                    "AEE_kcal": integer,
                    "TEF_kcal": integer,
                    "TEE_kcal": integer,
                    "confidence": number
                }
            },
            "body_metrics": {
                "type": "object",
                "properties": {
                    "weight_kg": number,
                    "weight_trend_14d": number,
                    "confidence": number
                }
            },
            "calibration": {
                "type": "object",
                "properties": {
                    "intake_bias_factor": number,
                    "expenditure_correction_factor": number
                }
            },
            "optional_metrics": {
                "type": "object",
                "properties": {
                    "cgm_mean_glucose": { "type": ["integer", "null"] },
                    "cgm_variability": { "type": ["integer", "null"] },
                    "insulin_sensitivity_flag": { "enum": ["monitor", "stable"] }
                }
            }
        }
    })
}

// Error types

#[derive(Debug)]
enum EnergyBalanceCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
}

impl From<io::Error> for EnergyBalanceCliError {
    fn from(e: io::Error) -> Self {
        EnergyBalanceCliError::Io(e)
    }
}

impl From<ComputeError> for EnergyBalanceCliError {
    fn from(e: ComputeError) -> Self {
        EnergyBalanceCliError::Compute(e)
    }
}

impl From<serde_json::Error> for EnergyBalanceCliError {
    fn from(e: serde_json::Error) -> Self {
        EnergyBalanceCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<EnergyBalanceCliError> for CliError {
    fn from(e: EnergyBalanceCliError) -> Self {
        match e {
            EnergyBalanceCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            EnergyBalanceCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            EnergyBalanceCliError::Compute(e) => {
                let (code, hint) = match &e {
                    ComputeError::MissingField(_) => (
                        "MISSING_FIELD",
                        "Provide profile.weight_kg or current_weight",
                    ),
                    ComputeError::DateParseError(_) => {
                        ("DATE_ERROR", "Dates must be formatted YYYY-MM-DD")
                    }
                    ComputeError::InvalidCalibration(_) => (
                        "CALIBRATION_ERROR",
                        "Calibration factors must be positive numbers",
                    ),
                    ComputeError::Provider(_) => {
                        ("PROVIDER_ERROR", "Check the profile and band data sources")
                    }
                    ComputeError::JsonError(_) | ComputeError::ParseError(_) => {
                        ("PARSE_ERROR", "Run 'energy-balance schema input' for the expected shape")
                    }
                    ComputeError::EncodingError(_) => ("ENCODING_ERROR", "Report this as a bug"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
        }
    }
}

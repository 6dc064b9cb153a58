mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use commands::generate::{cmd_generate, GenerateArgs};
use commands::inspect::cmd_inspect;
use commands::validate::cmd_validate;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Catena device model code generator.
#[derive(Parser)]
#[command(
    name = "catena-codegen",
    version,
    about = "Catena device model code generator"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log resolution progress (debug level unless RUST_LOG says otherwise)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate, resolve and emit source code for a device model
    Generate {
        /// Path to the device.<namespace>.json|yaml file
        device_model: PathBuf,
        /// Directory the generated files are written to (default: .)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Target language (default: cpp)
        #[arg(long)]
        language: Option<String>,
        /// Namespace for the generated code instead of the one in the file name
        #[arg(long)]
        namespace: Option<String>,
        /// JSON Schema to validate against instead of the built-in one
        #[arg(long)]
        schema: Option<PathBuf>,
        /// Do not run schema validation before resolving
        #[arg(long)]
        skip_schema: bool,
        /// Config file (default: ./catena-codegen.toml when present)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check a device model against the schema and resolve it without emitting
    Validate {
        /// Path to the device.<namespace>.json|yaml file
        device_model: PathBuf,
        /// JSON Schema to validate against instead of the built-in one
        #[arg(long)]
        schema: Option<PathBuf>,
    },

    /// Print a JSON summary of the resolved model
    Inspect {
        /// Path to the device.<namespace>.json|yaml file
        device_model: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Generate {
            device_model,
            out,
            language,
            namespace,
            schema,
            skip_schema,
            config,
        } => {
            let args = GenerateArgs {
                device_model,
                out,
                language,
                namespace,
                schema,
                skip_schema,
                config,
            };
            cmd_generate(args, cli.output, cli.quiet);
        }
        Commands::Validate {
            device_model,
            schema,
        } => {
            cmd_validate(&device_model, schema.as_deref(), cli.output, cli.quiet);
        }
        Commands::Inspect { device_model } => {
            cmd_inspect(&device_model, cli.output, cli.quiet);
        }
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}

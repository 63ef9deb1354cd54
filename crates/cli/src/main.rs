// cinemerge - merge per-provider canonical movie records into one record per movie

mod exit_codes;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use cinemerge_cli::load::{read_document, resolve_input, DEFAULT_PATTERN};
use cinemerge_cli::present::Layout;
use cinemerge_cli::write::{build_document, output_filename, write_audit, write_document, DEFAULT_PREFIX};
use cinemerge_merge::{AuditEvent, MergeConfig, MergeEngine, MergeError, TracingSink};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use exit_codes::{merge_exit_code, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "cinemerge")]
#[command(about = "Merge per-provider movie records into one canonical record per movie")]
#[command(version)]
struct Cli {
    /// Log every field decision (same as RUST_LOG=debug)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge a canonical records file
    #[command(after_help = "\
Examples:
  cinemerge merge data/processed/movies_canonical_2025-11-20.json
  cinemerge merge data/processed/ --json
  cinemerge merge data/processed/movies_canonical.json --layout flat --audit merge.jsonl
  cinemerge merge canonical.json --config tv.merge.toml --output merged.json")]
    Merge {
        /// Canonical file, or a directory / missing file path to search for the newest match
        input: PathBuf,

        /// Policy tables (.merge.toml); defaults to the built-in movie tables
        #[arg(long, short = 'c', env = "CINEMERGE_CONFIG")]
        config: Option<PathBuf>,

        /// Write the merged document here instead of the dated default
        #[arg(long, short = 'o', conflicts_with = "output_dir")]
        output: Option<PathBuf>,

        /// Directory for the dated output file (default: the input's directory)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Output layout
        #[arg(long, value_enum, default_value_t = Layout::Movies)]
        layout: Layout,

        /// Write the per-field decision log as JSON Lines
        #[arg(long)]
        audit: Option<PathBuf>,

        /// Also print the merged document to stdout
        #[arg(long)]
        json: bool,

        /// Filename prefix searched for when INPUT is not an existing file
        #[arg(long, default_value = DEFAULT_PATTERN)]
        pattern: String,
    },

    /// Validate a policy config without merging
    #[command(after_help = "\
Examples:
  cinemerge validate movies.merge.toml")]
    Validate {
        /// Path to the .merge.toml config file
        config: PathBuf,
    },

    /// Print the effective policy tables
    Policies {
        /// Policy tables (.merge.toml); defaults to the built-in movie tables
        #[arg(long, short = 'c', env = "CINEMERGE_CONFIG")]
        config: Option<PathBuf>,

        /// Print as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<MergeError> for CliError {
    fn from(err: MergeError) -> Self {
        Self { code: merge_exit_code(&err), message: err.to_string(), hint: None }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("error: cannot initialize logging: {e}");
        return ExitCode::from(EXIT_ERROR);
    }

    let result = match cli.command {
        Commands::Merge { input, config, output, output_dir, layout, audit, json, pattern } => {
            cmd_merge(input, config, output, output_dir, layout, audit, json, pattern)
        }
        Commands::Validate { config } => cmd_validate(config),
        Commands::Policies { config, json } => cmd_policies(config, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn init_tracing(verbose: bool) -> Result<(), tracing_subscriber::util::TryInitError> {
    let default_filter = if verbose {
        "cinemerge=debug,cinemerge_cli=debug,cinemerge_merge=debug"
    } else {
        "cinemerge=info,cinemerge_cli=info,cinemerge_merge=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
}

/// Built-in movie tables unless a config file is given.
fn load_config(path: Option<&Path>) -> Result<MergeConfig, CliError> {
    let Some(path) = path else {
        return Ok(MergeConfig::movies());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::from(MergeError::Io(format!("cannot read config {}: {e}", path.display()))))?;
    MergeConfig::from_toml(&text)
        .map_err(|e| CliError::from(e).with_hint(format!("check {}", path.display())))
}

#[allow(clippy::too_many_arguments)]
fn cmd_merge(
    input: PathBuf,
    config_path: Option<PathBuf>,
    output: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    layout: Layout,
    audit: Option<PathBuf>,
    json_output: bool,
    pattern: String,
) -> Result<(), CliError> {
    if pattern.is_empty() {
        return Err(CliError::usage("--pattern must not be empty"));
    }

    let config = load_config(config_path.as_deref())?;
    let engine = MergeEngine::new(config)?;

    let input_path = resolve_input(&input, &pattern)?;
    info!(config = %engine.config().name, "merging canonical records from {}", input_path.display());

    let document = read_document(&input_path)?;
    let records = engine.parse_records(&document.records)?;

    let undeclared = engine
        .config()
        .undeclared_fields(records.iter().flat_map(|r| r.fields.keys().map(String::as_str)));
    if !undeclared.is_empty() {
        warn!(
            fields = %undeclared.join(", "),
            "fields without a declared policy fall back to first-non-null"
        );
    }

    let mut events: Vec<AuditEvent> = Vec::new();
    let run = {
        let mut sink = (&mut events, TracingSink);
        engine.run(&records, &mut sink)
    };

    let output_path = match output {
        Some(path) => path,
        None => {
            let dir = output_dir.unwrap_or_else(|| {
                input_path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."))
            });
            output_filename(&dir, DEFAULT_PREFIX, chrono::Local::now().date_naive())
        }
    };

    let generated_at = chrono::Local::now().to_rfc3339();
    let out_doc = build_document(&run.records, layout, &generated_at);
    write_document(&output_path, &out_doc)?;

    if let Some(ref path) = audit {
        write_audit(path, &events)?;
    }

    if json_output {
        let text = serde_json::to_string_pretty(&out_doc)
            .map_err(|e| CliError::from(MergeError::Io(format!("JSON serialization error: {e}"))))?;
        println!("{text}");
    }

    // Human summary to stderr
    let s = &run.summary;
    eprintln!(
        "merged {} records into {} entities: {} fields resolved, {} contested, {} records skipped",
        s.input_records, s.entities, s.fields_resolved, s.contested_fields, s.skipped_records,
    );
    eprintln!("wrote {}", output_path.display());

    Ok(())
}

fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(Some(&config_path))?;
    let with_priority = config.fields.values().filter(|r| r.priority.is_some()).count();
    eprintln!(
        "{}: valid ({} field rules, {} with provider priority; entity key '{}', provider key '{}')",
        config.name,
        config.fields.len(),
        with_priority,
        config.entity_key,
        config.provider_key,
    );
    Ok(())
}

fn cmd_policies(config_path: Option<PathBuf>, json_output: bool) -> Result<(), CliError> {
    let config = load_config(config_path.as_deref())?;
    let text = if json_output {
        serde_json::to_string_pretty(&config)
            .map_err(|e| CliError::from(MergeError::Io(format!("JSON serialization error: {e}"))))?
    } else {
        toml::to_string(&config)
            .map_err(|e| CliError::from(MergeError::Io(format!("TOML serialization error: {e}"))))?
    };
    println!("{text}");
    Ok(())
}

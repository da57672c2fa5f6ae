//! CLI command definitions, routing, and tracing setup.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use gameenrich_core::{
    DatasetPipeline, PipelineProgress, ResponseInterpreter, RowEnricher, RunSummary, enrich_file,
};
use gameenrich_llm::{GeminiConfig, GeminiModel, TextModel};
use gameenrich_shared::{
    AppConfig, Enrichment, EnrichmentStatus, GameEnrichError, PipelineConfig, init_config,
    load_config, load_config_from, parse_delimiter, resolve_api_key,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// gameenrich: fill in genre, description and player mode for a table of games.
#[derive(Parser)]
#[command(
    name = "gameenrich",
    version,
    about = "Enrich a table of video game titles with genre, description and player mode.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.gameenrich/gameenrich.toml.
    #[arg(long, global = true, env = "GAMEENRICH_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Enrich every row of the input table and write the output table.
    Run(RunArgs),

    /// Parse a saved model response and print the three fields.
    Parse {
        /// File holding the response text (reads stdin when omitted).
        file: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags for `run`; each overrides the config file.
#[derive(clap::Args, Debug, Default)]
pub(crate) struct RunArgs {
    /// Input table path.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output table path.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pause after every row, in milliseconds.
    #[arg(long)]
    pub pacing_ms: Option<u64>,

    /// Model identifier.
    #[arg(short, long)]
    pub model: Option<String>,

    /// Field delimiter (single character, or "\t").
    #[arg(short, long)]
    pub delimiter: Option<String>,

    /// Cut descriptions that run well past this many words.
    #[arg(long)]
    pub description_word_limit: Option<usize>,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "gameenrich=info",
        1 => "gameenrich=debug",
        _ => "gameenrich=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Run(args) => cmd_run(config_path, args).await,
        Command::Parse { file } => cmd_parse(config_path, file.as_deref()),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

fn load_app_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    })
}

/// Merge CLI flags over the config file.
fn resolve_pipeline_config(config: &AppConfig, args: &RunArgs) -> Result<PipelineConfig> {
    let mut pipeline = PipelineConfig::try_from(config)?;

    if let Some(input) = &args.input {
        pipeline.input = input.clone();
    }
    if let Some(output) = &args.output {
        pipeline.output = output.clone();
    }
    if let Some(ms) = args.pacing_ms {
        pipeline.pacing = std::time::Duration::from_millis(ms);
    }
    if let Some(delimiter) = &args.delimiter {
        pipeline.delimiter = parse_delimiter(delimiter)?;
    }
    if args.description_word_limit.is_some() {
        pipeline.description_word_limit = args.description_word_limit;
    }

    Ok(pipeline)
}

async fn cmd_run(config_path: Option<&Path>, args: RunArgs) -> Result<()> {
    let mut config = load_app_config(config_path)?;
    if let Some(model) = &args.model {
        config.model.model = model.clone();
    }

    // Credential problems are fatal before any row is read
    let api_key = resolve_api_key(&config)?;
    let pipeline_config = resolve_pipeline_config(&config, &args)?;

    let model = GeminiModel::new(GeminiConfig::from_model_config(&config.model, api_key))
        .map_err(GameEnrichError::from)?;
    info!(model = model.model_name(), "configured generative model");

    let enricher = RowEnricher::from_config(Arc::new(model), &pipeline_config);
    let pipeline = DatasetPipeline::new(enricher, &pipeline_config);

    info!(
        input = %pipeline_config.input.display(),
        output = %pipeline_config.output.display(),
        pacing_ms = pipeline.pacing().as_millis() as u64,
        "enriching table"
    );

    let reporter = CliProgress::new();
    let summary = enrich_file(&pipeline, &pipeline_config, &reporter)
        .await
        .map_err(|e| eyre!("{e}"))?;

    print_summary(&summary, &pipeline_config.output);
    match summary.aborted {
        Some(reason) => Err(eyre!("model calls stopped early: {reason}")),
        None => Ok(()),
    }
}

fn print_summary(summary: &RunSummary, output: &Path) {
    println!();
    println!("  Enrichment finished.");
    println!("  Rows:      {}", summary.total);
    println!("  Complete:  {}", summary.complete);
    println!("  Partial:   {}", summary.partial);
    println!("  Failed:    {}", summary.failed);
    println!("  Skipped:   {}", summary.skipped);
    println!("  Elapsed:   {:.1}s", summary.elapsed.as_secs_f64());
    println!("  Output:    {}", output.display());
}

fn cmd_parse(config_path: Option<&Path>, file: Option<&Path>) -> Result<()> {
    let config = load_app_config(config_path)?;
    let pipeline_config = PipelineConfig::try_from(&config)?;

    let text = match file {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| eyre!("cannot read '{}': {e}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| eyre!("cannot read stdin: {e}"))?;
            buf
        }
    };

    let enrichment = ResponseInterpreter::from_config(&pipeline_config).interpret(&text);
    println!("genre:             {}", enrichment.result.genre);
    println!("short_description: {}", enrichment.result.short_description);
    println!("player_mode:       {}", enrichment.result.player_mode);
    println!("status:            {}", enrichment.status.as_str());
    if let Some(detail) = &enrichment.detail {
        println!("detail:            {detail}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Progress display
// ---------------------------------------------------------------------------

/// Progress bar on stderr, one tick per row.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.enable_steady_tick(std::time::Duration::from_millis(120));
        Self { bar }
    }
}

impl PipelineProgress for CliProgress {
    fn row_started(&self, index: usize, total: usize, title: Option<&str>) {
        self.bar.set_length(total as u64);
        self.bar.set_message(format!(
            "Processing ({index}/{total}): {}",
            title.unwrap_or("<missing title>")
        ));
    }

    fn row_finished(&self, index: usize, _total: usize, enrichment: &Enrichment) {
        if enrichment.status == EnrichmentStatus::Failed {
            self.bar.println(format!(
                "  row {index}: failed ({})",
                enrichment.detail.as_deref().unwrap_or("unknown error")
            ));
        }
        self.bar.inc(1);
    }

    fn done(&self, _summary: &RunSummary) {
        self.bar.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Created config file: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = load_app_config(config_path)?;
    let content = toml::to_string_pretty(&config)?;
    println!("{content}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn cli_parses_run_flags() {
        let cli = Cli::try_parse_from([
            "gameenrich",
            "-v",
            "run",
            "--input",
            "games.csv",
            "--pacing-ms",
            "250",
            "--delimiter",
            ";",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.input, Some(PathBuf::from("games.csv")));
                assert_eq!(args.pacing_ms, Some(250));
                assert_eq!(args.delimiter.as_deref(), Some(";"));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn flags_override_config() {
        let config = AppConfig::default();
        let args = RunArgs {
            output: Some(PathBuf::from("out.tsv")),
            pacing_ms: Some(0),
            delimiter: Some("\\t".into()),
            description_word_limit: Some(30),
            ..RunArgs::default()
        };
        let pipeline = resolve_pipeline_config(&config, &args).unwrap();
        assert_eq!(pipeline.input, PathBuf::from("Game_Thumbnail.csv"));
        assert_eq!(pipeline.output, PathBuf::from("out.tsv"));
        assert_eq!(pipeline.pacing, Duration::ZERO);
        assert_eq!(pipeline.delimiter, b'\t');
        assert_eq!(pipeline.description_word_limit, Some(30));
    }

    #[test]
    fn bad_delimiter_flag_is_rejected() {
        let args = RunArgs {
            delimiter: Some("::".into()),
            ..RunArgs::default()
        };
        assert!(resolve_pipeline_config(&AppConfig::default(), &args).is_err());
    }
}

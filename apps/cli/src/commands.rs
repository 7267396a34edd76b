//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use termdeck_core::pipeline::{GenerateConfig, GenerateResult, ProgressReporter, generate};
use termdeck_core::provider::ConfiguredProvider;
use termdeck_shared::{AppConfig, OutputMode, ProviderKind, init_config, load_config};
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// termdeck: turn term lists into flashcard decks.
#[derive(Parser)]
#[command(
    name = "termdeck",
    version,
    about = "Turn a list of terms into a flashcard deck with generated definitions.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

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
    /// Fetch definitions for every term and write the deck.
    Generate {
        /// Term list, one term per line.
        #[arg(short, long, default_value = "terms.txt")]
        input: PathBuf,

        /// Output file (defaults to <input stem>.apkg, or <input stem>_debug.txt in debug mode).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Output mode: debug or package (defaults to config).
        #[arg(short, long)]
        mode: Option<OutputMode>,

        /// Definition source: stub or external (defaults to config).
        #[arg(short, long)]
        provider: Option<ProviderKind>,

        /// Definition cache file (defaults to config).
        #[arg(long)]
        cache: Option<PathBuf>,

        /// Deck name shown in the flashcard application.
        #[arg(long)]
        deck_name: Option<String>,
    },

    /// Manage configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
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
        0 => "termdeck=info",
        1 => "termdeck=debug",
        _ => "termdeck=trace",
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
    match cli.command {
        Command::Generate {
            input,
            out,
            mode,
            provider,
            cache,
            deck_name,
        } => {
            let args = GenerateArgs {
                input,
                out,
                mode,
                provider,
                cache,
                deck_name,
            };
            cmd_generate(args).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// generate
// ---------------------------------------------------------------------------

/// Flags of `termdeck generate`, before merging with the config file.
struct GenerateArgs {
    input: PathBuf,
    out: Option<PathBuf>,
    mode: Option<OutputMode>,
    provider: Option<ProviderKind>,
    cache: Option<PathBuf>,
    deck_name: Option<String>,
}

async fn cmd_generate(args: GenerateArgs) -> Result<()> {
    let config = load_config()?;
    let (generate_config, kind) = resolve_generate(args, &config)?;

    if kind == ProviderKind::External {
        load_dotenv();
    }
    let provider = ConfiguredProvider::from_kind(kind, &config.provider)?;

    info!(
        input = %generate_config.input.display(),
        output = %generate_config.output.display(),
        mode = %generate_config.mode,
        provider = %kind,
        "generating deck"
    );

    let reporter = CliProgress::new();
    let outcome = generate(&generate_config, provider, &reporter).await;
    reporter.finish();
    let result = outcome?;

    println!();
    println!("  Deck written successfully!");
    println!("  Output: {}", result.output.display());
    println!("  Mode:   {}", result.mode);
    println!("  Cards:  {}", result.term_count);
    println!(
        "  Cache:  {} hits, {} fetched",
        result.cache_hits, result.cache_misses
    );
    println!("  Time:   {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

/// Merge CLI flags over config values.
fn resolve_generate(
    args: GenerateArgs,
    config: &AppConfig,
) -> Result<(GenerateConfig, ProviderKind)> {
    let mode = args.mode.unwrap_or(config.defaults.mode);
    let kind = args.provider.unwrap_or(config.defaults.provider);

    let output = match args.out {
        Some(path) => path,
        None => default_output(&args.input, mode)?,
    };
    if output == args.input {
        return Err(eyre!(
            "output path {} would overwrite the input file",
            output.display()
        ));
    }

    let cache_path = args
        .cache
        .unwrap_or_else(|| PathBuf::from(&config.defaults.cache_file));

    let mut deck = config.deck.clone();
    if let Some(name) = args.deck_name {
        if name.trim().is_empty() {
            return Err(eyre!("--deck-name must not be blank"));
        }
        deck.name = name;
    }

    let generate_config = GenerateConfig {
        input: args.input,
        output,
        mode,
        cache_path,
        deck,
    };
    Ok((generate_config, kind))
}

/// `terms.txt` → `terms.apkg` (package) or `terms_debug.txt` (debug), next to the input.
fn default_output(input: &Path, mode: OutputMode) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| eyre!("cannot derive an output name from {}", input.display()))?;

    let file_name = match mode {
        OutputMode::Package => format!("{stem}.apkg"),
        OutputMode::Debug => format!("{stem}_debug.txt"),
    };
    Ok(input.with_file_name(file_name))
}

/// Load `.env` from the working directory, if present.
fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, "failed to read .env"),
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn term_fetched(&self, term: &str, current: usize, total: usize, hit: bool) {
        let source = if hit { "cached" } else { "fetched" };
        self.spinner
            .set_message(format!("[{current}/{total}] {term} ({source})"));
    }

    fn done(&self, _result: &GenerateResult) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

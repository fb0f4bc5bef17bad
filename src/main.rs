//! CLI entry point for vaultviz

use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use vaultviz::config::DEFAULT_CONFIG_FILE;
use vaultviz::{
    CancelToken, CrawlConfig, Crawler, ErrorPolicy, FileConfig, GraphConfig, GraphSink, LabelMode,
    OutputConfig, Overrides, Settings, TextFormatter, VaultClient, VizError, print_json,
    render_store, write_tree,
};

const APP: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Color output mode
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum ColorMode {
    /// Auto-detect based on terminal and environment
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Determine whether to use color output based on mode and environment.
fn should_use_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => {
            // Respect NO_COLOR environment variable (https://no-color.org/)
            if std::env::var_os("NO_COLOR").is_some() {
                return false;
            }
            if std::env::var("TERM").map(|t| t == "dumb").unwrap_or(false) {
                return false;
            }
            std::io::stdout().is_terminal()
        }
    }
}

/// What to print on stdout
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum Format {
    /// Graphviz DOT description of the keyspace
    #[default]
    Graph,
    /// One path per line
    Text,
    /// Nested JSON
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "vaultviz")]
#[command(about = "Visualize the vault keyspaces")]
#[command(
    long_about = "Walk a vault tree and present a path listing, a json blob, or a graph of all keyspaces."
)]
#[command(version)]
struct Args {
    /// Config file (default: ./.vaultviz.toml when present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Vault server address, overrides tag/datacenter/port
    #[arg(long, value_name = "URL")]
    address: Option<String>,

    /// Vault token (falls back to VAULT_TOKEN, then the config file)
    #[arg(long)]
    token: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long = "insecure", alias = "insecureMode")]
    insecure: bool,

    /// Datacenter to connect to
    #[arg(long)]
    datacenter: Option<String>,

    /// Consul tag to use
    #[arg(long)]
    tag: Option<String>,

    /// Port to use (default: 8200)
    #[arg(long)]
    port: Option<u16>,

    /// Path to crawl, without the leading slash (default: secret)
    #[arg(long)]
    path: Option<String>,

    /// Append the path listing to FILE
    #[arg(short = 'o', long = "output-file", alias = "outputFile", value_name = "FILE")]
    output_file: Option<PathBuf>,

    /// Output format on stdout
    #[arg(long, value_enum, default_value = "graph")]
    format: Format,

    /// Descend only N levels below the base path
    #[arg(short = 'L', long = "level")]
    level: Option<usize>,

    /// Skip keys matching pattern (can be used multiple times)
    #[arg(short = 'I', long = "ignore")]
    ignore: Vec<String>,

    /// Number of parallel workers for sibling branches
    /// (0 = auto-detect, 1 = sequential, N = use N workers)
    #[arg(short = 'j', long = "jobs", default_value = "1")]
    jobs: usize,

    /// What to do when listing a branch fails
    #[arg(long = "on-error", value_enum, default_value = "skip")]
    on_error: ErrorPolicy,

    /// Per-request timeout, e.g. 10s, 2m (default: 30s).
    /// Ctrl-C stops the crawl once the request in flight completes or times out
    #[arg(long, value_name = "DURATION")]
    timeout: Option<String>,

    /// Label graph nodes with their full path instead of the last segment
    #[arg(long = "full-path-labels")]
    full_path_labels: bool,

    /// Color graph nodes by depth
    #[arg(long = "color-by-depth")]
    color_by_depth: bool,

    /// Control color output: auto, always, never
    #[arg(long = "color", value_name = "WHEN", default_value = "auto")]
    color: ColorMode,

    /// Print the resolved settings and exit without contacting the server
    #[arg(long)]
    debug: bool,

    /// Log every listing call
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            config_file: self.config.clone(),
            address: self.address.clone(),
            token: self.token.clone(),
            skip_verify: self.insecure,
            tag: self.tag.clone(),
            datacenter: self.datacenter.clone(),
            port: self.port,
            path: self.path.clone(),
            timeout: self.timeout.clone(),
        }
    }

    fn output_config(&self) -> OutputConfig {
        OutputConfig {
            use_color: should_use_color(self.color),
            graph: GraphConfig {
                label_mode: if self.full_path_labels {
                    LabelMode::FullPath
                } else {
                    LabelMode::LastSegment
                },
                color_by_depth: self.color_by_depth,
            },
        }
    }
}

fn init_logging(args: &Args) {
    let level = if args.quiet {
        "warn"
    } else if args.verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}={}", APP, level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(&args);

    if let Err(e) = run(&args) {
        error!(app = APP, version = VERSION, error = %e, "vaultviz failed");
        process::exit(e.exit_code());
    }
}

fn run(args: &Args) -> Result<(), VizError> {
    let overrides = args.overrides();
    let file = match &overrides.config_file {
        Some(path) => FileConfig::load(path, true)?,
        None => FileConfig::load(Path::new(DEFAULT_CONFIG_FILE), false)?,
    };
    let settings = Settings::resolve(&overrides, &file, |key| std::env::var(key).ok())?;

    if args.debug {
        info!(app = APP, version = VERSION, "debug mode, not connecting");
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{:#?}", settings)?;
        return Ok(());
    }

    let client = VaultClient::new(settings.client_config()?)?;
    info!(address = %client.address(), "connecting");

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        warn!(error = %e, "could not install Ctrl-C handler");
    }

    let crawl_config = CrawlConfig {
        base_path: settings.base_path.clone(),
        max_depth: args.level,
        parallel_workers: args.jobs,
        on_error: args.on_error,
        ignore_patterns: args.ignore.clone(),
    };
    let crawler = Crawler::new(crawl_config, client)?.with_cancel_token(cancel);
    let store = crawler.crawl_root()?;
    let root = store
        .root()
        .ok_or_else(|| VizError::General("crawl produced no root node".to_string()))?;

    if let Some(path) = &args.output_file {
        write_tree(&store, root, path)?;
        info!(file = %path.display(), "wrote path listing");
    }

    let output_config = args.output_config();
    match args.format {
        Format::Graph => {
            let graph = render_store(&store, &output_config.graph);
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(graph.to_dot().as_bytes())?;
            stdout.flush()?;
        }
        Format::Text => TextFormatter::new(output_config).print(&store, root)?,
        Format::Json => print_json(&store)?,
    }
    Ok(())
}

/*!
 * file-sorter CLI
 *
 * Runs one routing invocation for an S3 notification event read from a file
 * or stdin, or classifies keys without touching storage.
 */

use clap::{Parser, Subcommand, ValueEnum};
use file_sorter::{
    classify::{classify_key, decode_key},
    config::{
        FileConfig, LogConfig, LogLevel, RouterConfig, RouterSection, StoreConfig,
        DESTINATION1_ENV, DESTINATION2_ENV,
    },
    error::{Result, SorterError, EXIT_SUCCESS},
    event::S3Event,
    logging,
    router::{self, Router},
};
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "file-sorter")]
#[command(version, about = "Move new S3 objects to a numeric or non-numeric bucket", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short = 'c', long = "config", value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long = "log-level", value_enum, global = true)]
    log_level: Option<LogLevelArg>,

    /// Emit logs as JSON lines
    #[arg(long = "json-logs", global = true)]
    json_logs: bool,

    /// Write logs to a file instead of stderr
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process one S3 notification event
    Route {
        /// Event JSON file, or `-` for stdin
        #[arg(short = 'e', long = "event", value_name = "PATH", default_value = "-")]
        event: String,

        /// Bucket for non-numeric filenames
        #[arg(long = "destination1", env = DESTINATION1_ENV)]
        destination1: Option<String>,

        /// Bucket for numeric filenames
        #[arg(long = "destination2", env = DESTINATION2_ENV)]
        destination2: Option<String>,

        /// AWS region
        #[arg(long = "region")]
        region: Option<String>,

        /// Custom S3 endpoint (MinIO, LocalStack)
        #[arg(long = "endpoint", value_name = "URL")]
        endpoint: Option<String>,

        /// Use path-style bucket addressing
        #[arg(long = "force-path-style")]
        force_path_style: bool,

        /// Print the planned moves without touching storage
        #[arg(long = "dry-run")]
        dry_run: bool,
    },

    /// Print the classification of URL-encoded keys
    Classify {
        /// Keys as they appear in S3 notifications
        #[arg(required = true)]
        keys: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LogLevel {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Error => LogLevel::Error,
            LogLevelArg::Warn => LogLevel::Warn,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Debug => LogLevel::Debug,
            LogLevelArg::Trace => LogLevel::Trace,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    };

    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<()> {
    let file_config = match &cli.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };

    logging::init_logging(&log_config(&cli, &file_config.logging))?;

    match cli.command {
        Command::Route {
            event,
            destination1,
            destination2,
            region,
            endpoint,
            force_path_style,
            dry_run,
        } => {
            let router_config =
                resolve_router_config(destination1, destination2, file_config.router)?;
            let event = read_event(&event)?;

            if dry_run {
                let plans = router::plan_batch(&router_config, &event.records())?;
                print_json(&plans)?;
                return Ok(());
            }

            let mut store_config = file_config.store.with_env_overrides()?;
            if region.is_some() {
                store_config.region = region;
            }
            if endpoint.is_some() {
                store_config.endpoint = endpoint;
            }
            store_config.force_path_style |= force_path_style;

            let router = build_router(&store_config, router_config).await?;
            let response = router.handle_event(&event).await?;
            print_json(&response)
        }
        Command::Classify { keys } => {
            for encoded in keys {
                let key = decode_key(&encoded).map_err(|e| SorterError::Decode {
                    bucket: "-".to_string(),
                    key: encoded.clone(),
                    reason: e.to_string(),
                })?;
                println!("{}\t{}", classify_key(&key), key);
            }
            Ok(())
        }
    }
}

fn log_config(cli: &Cli, from_file: &LogConfig) -> LogConfig {
    let mut config = from_file.clone();
    if let Some(level) = cli.log_level {
        config.level = level.into();
    }
    if cli.json_logs {
        config.json = true;
    }
    if cli.log_file.is_some() {
        config.file = cli.log_file.clone();
    }
    config
}

/// Flags and environment win over the config file; names are checked after merging
fn resolve_router_config(
    destination1: Option<String>,
    destination2: Option<String>,
    from_file: RouterSection,
) -> Result<RouterConfig> {
    RouterSection::new(destination1, destination2)
        .or(from_file)
        .into_config()
}

fn read_event(source: &str) -> Result<S3Event> {
    if source == "-" {
        let mut input = String::new();
        std::io::stdin().read_to_string(&mut input)?;
        S3Event::from_json(&input)
    } else {
        let file = std::fs::File::open(Path::new(source)).map_err(|e| {
            SorterError::InvalidEvent(format!("Cannot open event file {}: {}", source, e))
        })?;
        S3Event::from_reader(std::io::BufReader::new(file))
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| SorterError::Unexpected(format!("Failed to serialize output: {}", e)))?;
    println!("{}", json);
    Ok(())
}

#[cfg(feature = "s3-native")]
async fn build_router(store_config: &StoreConfig, router_config: RouterConfig) -> Result<Router> {
    use file_sorter::store::S3Store;
    use std::sync::Arc;

    store_config.validate()?;
    let store = S3Store::new(store_config)
        .await
        .map_err(|e| SorterError::InvalidConfig(e.to_string()))?;
    Ok(Router::new(Arc::new(store), router_config))
}

#[cfg(not(feature = "s3-native"))]
async fn build_router(_store_config: &StoreConfig, _router_config: RouterConfig) -> Result<Router> {
    Err(SorterError::InvalidConfig(
        "built without S3 support; enable the s3-native feature".to_string(),
    ))
}

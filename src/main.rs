use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use utilkit::config::{load_config, UtilConfig};
use utilkit::signals::{Registrar, Signal};
use utilkit::{fsutil, pathsep, predicate, text};

/// Small filesystem, text and signal utilities.
#[derive(Parser, Debug)]
#[command(name = "utilkit", version, about)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "utilkit.toml", global = true)]
    config: PathBuf,

    /// Extra logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a file's contents (nothing if it cannot be read)
    Read { path: PathBuf },
    /// Print a file's size in bytes (0 if it does not exist)
    Size { path: PathBuf },
    /// List every file under a directory
    List { dir: PathBuf },
    /// Copy a file, printing the number of bytes copied
    Copy { src: PathBuf, dst: PathBuf },
    /// Remove files whose names match a glob pattern
    Prune { dir: PathBuf, pattern: String },
    /// Escape XML special characters
    Escape { text: String },
    /// Collapse whitespace runs into single newlines
    Squeeze { text: String },
    /// Convert path separators
    Path {
        path: String,
        /// Convert to backslashes instead of forward slashes
        #[arg(long)]
        windows: bool,
    },
    /// Print the offset of the Nth occurrence of KEY in TEXT, or -1
    Index {
        text: String,
        key: String,
        n: usize,
        /// Count occurrences from the end
        #[arg(long, conflicts_with = "regex")]
        from_end: bool,
        /// Treat KEY as a regular expression
        #[arg(long)]
        regex: bool,
    },
    /// Compare two integers: <, >, ==, >=, <=
    CmpInt {
        #[arg(allow_negative_numbers = true)]
        left: i64,
        op: String,
        #[arg(allow_negative_numbers = true)]
        right: i64,
    },
    /// Compare two strings: ==, !=, in, not-in ("null" means empty)
    CmpStr {
        left: String,
        op: String,
        right: String,
    },
    /// Print "done" each time one of the given signals arrives
    Watch {
        /// Signals to watch (default: from config)
        signals: Vec<Signal>,
        /// Exit after this many notifications
        #[arg(long)]
        count: Option<u64>,
    },
}

fn init_logging(cli: &Cli, config_level: &str) {
    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        config_level
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_offset(offset: Option<usize>) {
    match offset {
        Some(idx) => println!("{idx}"),
        None => println!("-1"),
    }
}

async fn run(command: Command, config: &UtilConfig) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Read { path } => {
            let contents = fsutil::read_file_or_empty(&path);
            std::io::stdout().write_all(&contents)?;
        }
        Command::Size { path } => println!("{}", fsutil::file_size(&path)?),
        Command::List { dir } => {
            for file in fsutil::list_files(&dir) {
                println!("{}", file.display());
            }
        }
        Command::Copy { src, dst } => println!("{}", fsutil::copy_file(&src, &dst)?),
        Command::Prune { dir, pattern } => {
            for file in fsutil::remove_matching_files(&dir, &pattern)? {
                println!("{}", file.display());
            }
        }
        Command::Escape { text } => println!("{}", text::escape_xml(&text)),
        Command::Squeeze { text } => println!("{}", text::collapse_whitespace(&text)),
        Command::Path { path, windows } => {
            let converted = if windows {
                pathsep::to_windows(&path)
            } else {
                pathsep::to_linux(&path)
            };
            println!("{converted}");
        }
        Command::Index {
            text: haystack,
            key,
            n,
            from_end,
            regex,
        } => {
            let offset = if regex {
                text::index_nth(&haystack, &key, n)?
            } else if from_end {
                text::last_index_n(&haystack, &key, n)
            } else {
                text::index_n(&haystack, &key, n)
            };
            print_offset(offset);
        }
        Command::CmpInt { left, op, right } => {
            println!("{}", predicate::int_cond_assert(left, right, &op));
        }
        Command::CmpStr { left, op, right } => {
            println!("{}", predicate::string_cond_assert(&left, &right, &op));
        }
        Command::Watch { signals, count } => {
            let signals = if signals.is_empty() {
                config.signals.watch.clone()
            } else {
                signals
            };
            watch(&signals, count, config).await?;
        }
    }
    Ok(())
}

async fn watch(
    signals: &[Signal],
    count: Option<u64>,
    config: &UtilConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let (tx, mut rx) = mpsc::channel(config.signals.notify_capacity.max(1));
    let registrar = Registrar::spawn_os(signals, tx, config.signals.delivery_capacity)?;

    let names: Vec<_> = signals.iter().map(|s| s.name()).collect();
    tracing::info!(signals = ?names, pid = std::process::id(), "watching signals");

    let mut seen = 0u64;
    while let Some(msg) = rx.recv().await {
        println!("{msg}");
        seen += 1;
        if count.is_some_and(|limit| seen >= limit) {
            break;
        }
    }

    registrar.stop().await;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let (config, config_err) = match load_config(&cli.config) {
        Ok(config) => (config, None),
        Err(e) => (UtilConfig::default(), Some(e)),
    };

    init_logging(&cli, &config.logging.level);
    if let Some(e) = config_err {
        tracing::warn!(error = %e, "using default config");
    }
    tracing::debug!(?cli, "parsed CLI arguments");

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}

//! archivarius - size-ranked zip archiving from the command line or over HTTP

use anyhow::{Context, Result};
use archivarius_core::config::Config;
use archivarius_core::{ArchiveRequest, Compression};
use archivarius_server::AppState;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// archivarius - keep the largest files of a directory in a zip archive
#[derive(Parser)]
#[command(name = "archivarius")]
#[command(author, version, about = "Size-ranked zip archiving service", long_about = None)]
struct Cli {
    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Configuration file (defaults to the per-user config)
    #[arg(long, global = true, env = "ARCHIVARIUS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP service
    Serve {
        /// Listen address, overrides the configured one
        #[arg(long)]
        bind: Option<String>,
    },

    /// Archive the largest files of a directory
    Compress {
        /// Directory to select files from
        directory: PathBuf,

        /// Archive to create
        #[arg(short, long)]
        output: PathBuf,

        /// Glob matched against file names
        #[arg(long)]
        filter: Option<String>,

        /// Maximum number of files to keep (0 = default)
        #[arg(long)]
        limit: Option<u32>,

        /// Store entries without compression
        #[arg(long)]
        store: bool,
    },

    /// Restore the largest entries of an archive
    Extract {
        /// Archive to read
        archive: PathBuf,

        /// Output directory
        #[arg(short, long, required_unless_present = "list")]
        output: Option<PathBuf>,

        /// Glob matched against entry base names
        #[arg(long)]
        filter: Option<String>,

        /// Maximum number of files to restore (0 = all)
        #[arg(long)]
        limit: Option<u32>,

        /// List entries instead of extracting
        #[arg(long)]
        list: bool,
    },

    /// Show configuration
    Config {
        /// Show current configuration
        #[arg(long, conflicts_with_all = ["path", "init"])]
        show: bool,

        /// Show configuration file path
        #[arg(long, conflicts_with_all = ["show", "init"])]
        path: bool,

        /// Write the default configuration if the file does not exist
        #[arg(long, conflicts_with_all = ["show", "path"])]
        init: bool,
    },
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version come through here too
            let code = if e.use_stderr() { 3 } else { 0 };
            let _ = e.print();
            process::exit(code);
        }
    };

    setup_logging(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(()) => process::exit(0),
        Err(e) => {
            error!("Error: {:#}", e);
            process::exit(map_error_to_exit_code(&e));
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(Config::load_or_default()),
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve { bind } => {
            let config = load_config(cli.config.as_deref())?;
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            let addr: SocketAddr = bind
                .parse()
                .with_context(|| format!("Invalid listen address: {}", bind))?;
            let state = AppState::from_config(&config)?;

            info!(
                "Starting service (max concurrent jobs: {})",
                config.server.max_concurrent_jobs
            );
            let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;
            runtime
                .block_on(archivarius_server::serve(state, addr))
                .with_context(|| format!("Failed to serve on {}", addr))?;
        }

        Commands::Compress {
            directory,
            output,
            filter,
            limit,
            store,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let mut options = config.archive.build_options();
            if store {
                options.compression = Compression::Stored;
            }

            let mut request = ArchiveRequest::new(&output, &directory);
            request.filter = filter;
            request.limit = limit;

            info!("Compressing {:?} to {:?}", directory, output);
            let report = archivarius_core::compress(&request, &options)?;
            for name in &report.entries {
                println!("{}", name);
            }
            info!("Stored {} file(s)", report.entries.len());
        }

        Commands::Extract {
            archive,
            output,
            filter,
            limit,
            list,
        } => {
            if list {
                let entries = archivarius_core::list_entries(&archive)?;
                println!(
                    "{:<50} {:>15} {:>15} {:>10}",
                    "Name", "Size", "Compressed", "Mode"
                );
                println!("{}", "-".repeat(93));
                for entry in entries {
                    let mode = entry
                        .mode
                        .map(|m| format!("{:o}", m))
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "{:<50} {:>15} {:>15} {:>10}",
                        entry.name, entry.size, entry.compressed_size, mode
                    );
                }
                return Ok(());
            }

            let output = output.context("An output directory is required")?;
            let mut request = ArchiveRequest::new(&archive, &output);
            request.filter = filter;
            request.limit = limit;

            info!("Extracting {:?} to {:?}", archive, output);
            let report = archivarius_core::extract(&request)?;
            for name in &report.files {
                println!("{}", name);
            }
            info!("Restored {} file(s)", report.files.len());
        }

        Commands::Config { show, path, init } => {
            if show {
                let config = match cli.config.as_deref() {
                    Some(path) => load_config(Some(path))?,
                    None => Config::load()?,
                };
                println!("{}", toml::to_string_pretty(&config)?);
            } else if path {
                let config_path = match cli.config {
                    Some(path) => path,
                    None => Config::config_path()?,
                };
                println!("{}", config_path.display());
            } else if init {
                let config_path = match cli.config {
                    Some(path) => path,
                    None => Config::config_path()?,
                };
                if config_path.exists() {
                    info!("Configuration already exists: {:?}", config_path);
                } else {
                    Config::default().save_to(&config_path)?;
                    info!("Wrote default configuration to {:?}", config_path);
                }
                println!("{}", config_path.display());
            } else {
                eprintln!("Please specify --show, --path or --init");
            }
        }
    }

    Ok(())
}

fn map_error_to_exit_code(err: &anyhow::Error) -> i32 {
    if let Some(core_err) = err.downcast_ref::<archivarius_core::Error>() {
        match core_err {
            archivarius_core::Error::InputNotFound(_) => 2,
            archivarius_core::Error::Open { .. } => 2,
            archivarius_core::Error::Format { .. } => 2,
            archivarius_core::Error::InvalidFilter { .. } => 3,
            archivarius_core::Error::Create { .. } => 4,
            archivarius_core::Error::Io { .. } => 5,
            archivarius_core::Error::Config(_) => 1,
        }
    } else if err.is::<std::net::AddrParseError>() {
        3
    } else {
        1
    }
}

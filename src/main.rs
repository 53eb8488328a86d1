use anyhow::{Context, Result};
use clap::Parser;
use std::fs::{self, OpenOptions};
use std::io::IsTerminal;
use std::sync::{Arc, Mutex};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use nlcmd::api::HttpBackend;
use nlcmd::cli::{self, Command};
use nlcmd::config::{Config, HistoryConfig, Variant};
use nlcmd::controller::Controller;
use nlcmd::history::HistoryStore;
use nlcmd::tui::App;

/// nlcmd - Translate plain English into shell commands
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Translator backend base URL
    #[arg(short, long)]
    url: Option<String>,

    /// Use the PowerShell endpoints
    #[arg(short, long)]
    powershell: bool,

    /// Keep only the last ten translations, in memory
    #[arg(long)]
    simple: bool,

    /// Run a single command instead of the interactive page
    #[command(subcommand)]
    command: Option<Command>,
}

fn init_logging(level: Level, interactive: bool) -> Result<()> {
    if interactive {
        // The alternate screen owns the terminal, so log to a file
        let dir = Config::app_dir()?;
        fs::create_dir_all(&dir).context("Failed to create application directory")?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("nlcmd.log"))
            .context("Failed to open log file")?;

        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .context("Failed to set global default subscriber")?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .context("Failed to set global default subscriber")?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let interactive = args.command.is_none();

    let log_level = if args.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_logging(log_level, interactive)?;

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        Config::load_from_file(config_path)
            .with_context(|| format!("Failed to load config from {config_path}"))?
    } else {
        Config::load_default()?
    };

    if let Some(url) = args.url {
        config.backend.base_url = url;
    }
    if args.powershell {
        config.backend.variant = Variant::PowerShell;
    }
    if args.simple {
        config.history = HistoryConfig::simple();
    }

    let history = match config.history_path() {
        Some(path) => HistoryStore::open(path, config.history.limit),
        None => HistoryStore::in_memory(config.history.limit),
    };
    let backend = HttpBackend::new(&config.backend).context("Failed to create HTTP client")?;

    if let Some(command) = args.command {
        return cli::run(command, &backend, history).await;
    }

    if !std::io::stdout().is_terminal() {
        eprintln!("Error: the interactive page must be run in a terminal.");
        eprintln!("Use a subcommand such as `nlcmd translate <QUERY>` for scripts.");
        std::process::exit(1);
    }

    info!("Using history file {:?}", history.path());
    let controller = Controller::new(history, config.history.resubmit_on_reuse);
    let mut app = App::new(config, controller, Arc::new(backend));
    if let Err(e) = app.run().await {
        eprintln!("\nnlcmd encountered an error: {e}");
        eprintln!("\nIf the terminal display is corrupted, try running:");
        eprintln!("  reset");
        return Err(e);
    }

    Ok(())
}

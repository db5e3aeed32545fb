use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use steplens::config::Config;
use steplens::source::{EventSource, PlaywrightSource, ReplaySource};
use steplens::{Reporter, drive, selection};

#[derive(Debug, Parser)]
#[command(name = "steplens", version, about = "Per-test HTML reports for Playwright runs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the Playwright suite and write one report per test.
    Run {
        /// Extra arguments passed through to `playwright test`.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Build reports from a recorded NDJSON event stream (stdin when FILE is omitted).
    Replay { file: Option<PathBuf> },
    /// Write the tests selected for a client to a JSON file.
    Select {
        #[arg(long, default_value = "testConfig.json")]
        config: PathBuf,
        #[arg(long, default_value = "testsToRun.json")]
        out: PathBuf,
        #[arg(long, env = "CLIENT_NAME")]
        client: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let workspace = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = Config::load(&workspace);

    let source: Arc<dyn EventSource> = match cli.command {
        Command::Run { args } => {
            let mut all_args = config.runner_args()?;
            all_args.extend(args);
            Arc::new(PlaywrightSource::new(
                workspace.clone(),
                config.runner.command.clone(),
                all_args,
            ))
        }
        Command::Replay { file } => Arc::new(ReplaySource::new(file)),
        Command::Select {
            config: config_path,
            out,
            client,
        } => {
            let tests = selection::write_selection(&config_path, &out, client.as_deref())?;
            tracing::info!(count = tests.len(), out = %out.display(), "wrote test selection");
            return Ok(());
        }
    };

    let mut reporter = Reporter::new(&config, &workspace);
    let exit_code = drive(source, &mut reporter).await?;

    if let Some(code) = exit_code
        && code != 0
    {
        std::process::exit(code);
    }
    Ok(())
}

/// Log to stderr, or to the file named by `STEPLENS_DEBUG` when set.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_file = std::env::var("STEPLENS_DEBUG").ok().and_then(|path| {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .ok()
    });

    match log_file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}

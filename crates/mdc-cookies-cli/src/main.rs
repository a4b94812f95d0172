//! mdc-cookies entry point.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use mdc_cookies_cli::cli::{self, output, test_cmd::TestOptions};

#[derive(Parser)]
#[command(
    name = "mdc-cookies",
    about = "Check and refresh the scraper cookies in a MovieMeta config",
    version,
    after_help = "Run 'mdc-cookies <command> --help' for details on each command."
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe every domain in the [cookies] section and report which work
    Test {
        /// Config file (defaults to the first one found in the standard locations)
        config: Option<PathBuf>,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = 15)]
        timeout: u64,

        /// Pause between probes in milliseconds
        #[arg(long, default_value_t = 1000)]
        delay_ms: u64,

        /// Proxy URL for all requests
        #[arg(long)]
        proxy: Option<String>,

        /// Skip TLS certificate verification
        #[arg(long)]
        insecure: bool,
    },

    /// Interactively extract, validate, and save bootstrap cookies
    Init,

    /// List the built-in probe targets
    Targets,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   mdc-cookies completions bash > ~/.local/share/bash-completion/completions/mdc-cookies
    ///   mdc-cookies completions zsh > ~/.zfunc/_mdc-cookies
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.json {
        output::set_json();
    }
    if cli.verbose {
        output::set_verbose();
    }

    let level = if cli.verbose {
        "debug"
    } else {
        cli.log_level.as_str()
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Test {
            config,
            timeout,
            delay_ms,
            proxy,
            insecure,
        } => {
            let opts = TestOptions {
                config,
                timeout: Duration::from_secs(timeout),
                delay: Duration::from_millis(delay_ms),
                proxy,
                insecure,
            };
            cli::test_cmd::run(&opts).await
        }
        Commands::Init => cli::init_cmd::run().await,
        Commands::Targets => cli::targets_cmd::run().map(|()| true),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "mdc-cookies", &mut std::io::stdout());
            Ok(true)
        }
    };

    // 0 = success, 1 = nothing working or error
    match result {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            if output::is_json() {
                output::print_json(&serde_json::json!({
                    "error": true,
                    "message": format!("{e:#}"),
                }));
            } else {
                eprintln!("  Error: {e:#}");
            }
            std::process::exit(1);
        }
    }
}

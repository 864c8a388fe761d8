use clap::Parser;
use skelgen::cli::{run_cli, Cli};
use skelgen::logging::{init_logging_with_config, LogConfig};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    // Logging reads SKELGEN_LOG_* before settings are loaded.
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            eprintln!("Warning: failed to load .env: {err}");
        }
    }
    let _log_guard = init_logging_with_config(&LogConfig::from_env())?;
    run_cli(cli)
}

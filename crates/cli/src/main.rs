// vaultsync CLI entry point.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_code;
mod output;

use exit_code::ExitCode;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "vaultsync", about = "Keep a notes vault in sync with its git remote")]
struct Cli {
    /// Config file (defaults to $VAULTSYNC_CONFIG, then ~/.vaultsync/config.toml).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Force JSON output.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: commands::Command,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.command.default_log_level());

    let format = OutputFormat::detect(cli.json);
    let code = match commands::run(cli.command, cli.config, format) {
        Ok(code) => code,
        Err(error) => {
            let code = ExitCode::from_error(&error);
            output::print_error(format, code.label(), &format!("{error:#}"));
            code
        }
    };
    code.into()
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

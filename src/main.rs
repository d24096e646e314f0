use clap::Parser;
use parambind::cli::{run_cli, Cli};
use parambind::logging::{init_logging, LogConfig};

fn main() -> anyhow::Result<()> {
    init_logging(&LogConfig::from_env())?;
    run_cli(Cli::parse())
}

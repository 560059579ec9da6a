//! beamdrop: upload files to a beamdrop server and print their links.

mod app;
mod args;
mod config;
mod display;

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use crate::args::{Args, USAGE};

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse(std::env::args().skip(1))?;
    if args.help || args.files.is_empty() {
        println!("{USAGE}");
        return Ok(if args.help {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(2)
        });
    }

    let config = config::Config::load()?;
    tracing::debug!(?config, "configuration loaded");

    let rt = tokio::runtime::Runtime::new()?;
    let all_ok = rt.block_on(app::run(config, args))?;

    Ok(if all_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

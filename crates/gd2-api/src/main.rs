#![warn(missing_docs)]

//! `gd2ctl`: command-line front end for the GlusterD2 REST bindings.

use anyhow::Result;
use clap::Parser;
use gd2_api::cli::Cli;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    cli.run().await
}

//! tfconnect CLI and webhook entry point.
//!
//! Binary name: `tfconnect`
//!
//! Parses CLI arguments, sets up tracing, loads configuration, then
//! dispatches to the requested command.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use tfconnect_observe::tracing_setup::{
    TracingOptions, filter_for_verbosity, init_tracing, shutdown_tracing,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need config or tracing
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "tfconnect", &mut std::io::stdout());
        return Ok(());
    }

    init_tracing(&TracingOptions {
        default_filter: filter_for_verbosity(cli.verbose, cli.quiet).to_string(),
        json: cli.json,
        otel: cli.otel,
    })
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = dispatch(&cli).await;
    shutdown_tracing();
    result
}

async fn dispatch(cli: &Cli) -> anyhow::Result<()> {
    let config = cli::resolve_config(cli).await?;

    match &cli.command {
        Commands::Serve { port, host } => {
            cli::serve::serve(config, host.clone(), *port, cli.quiet).await?;
        }

        Commands::Run { event, no_report } => {
            cli::run::run(&config, event, !no_report, cli.json).await?;
        }

        Commands::Render { event, out } => {
            cli::render::render(&config, event, out, cli.json).await?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

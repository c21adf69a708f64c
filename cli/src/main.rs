//! fleetctl - discover fleet agents and dispatch lifecycle commands

use clap::Parser;
use fleet_controller::cli::Cli;
use fleet_controller::output::format_error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json = cli.json;
    if let Err(e) = cli.run().await {
        match json.then(|| format_error(&e)) {
            Some(Ok(out)) => println!("{out}"),
            _ => eprintln!("Error: {e:#}"),
        }
        std::process::exit(1);
    }
}

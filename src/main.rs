//! Package registry command-line client
//!
//! Parses arguments, sets up tracing and hands the subcommand to the
//! [`Runner`]. Any failure is printed and turned into a non-zero exit code.

use pkg_registry_client::cli::{Args, Runner};
use std::process;
use tracing_subscriber::EnvFilter;

fn setup_logging(verbose: bool) {
    let default_level = if verbose {
        "pkg_registry_client=debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let args = Args::parse_args();
    setup_logging(args.verbose);

    let runner = Runner::new(args);
    if let Err(e) = runner.run().await {
        runner.logger().error(&e.to_string());
        process::exit(e.exit_code());
    }
}

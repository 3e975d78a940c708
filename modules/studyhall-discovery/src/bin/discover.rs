//! Run one discovery from the command line and print the JSON result.
//! Useful for checking planner output and ranking without the API server.
//!
//! Usage: cargo run --bin discover -- "Photosynthesis"

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use studyhall_common::Config;
use studyhall_discovery::VideoDiscovery;

#[derive(Parser)]
#[command(about = "Find and rank learning videos for a topic")]
struct Args {
    /// Topic to plan and search for.
    topic: String,

    /// Print compact JSON instead of pretty-printed.
    #[arg(long)]
    compact: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays pipeable JSON.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("studyhall_discovery=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;
    let discovery = VideoDiscovery::from_config(&config)?;

    let result = discovery.discover(&args.topic).await?;

    let json = if args.compact {
        serde_json::to_string(&result)?
    } else {
        serde_json::to_string_pretty(&result)?
    };
    println!("{json}");

    Ok(())
}

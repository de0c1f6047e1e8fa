use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use patent_feed::{
    download, extract_links, fetch_identifiers, hash_file, ExtractConfig, FeedClient,
};

/// Command-line arguments for patent-feed
#[derive(Parser, Debug)]
#[command(name = "patent-feed")]
#[command(about = "Extract patent identifiers from CSV feeds, and other small fetch helpers")]
#[command(version)]
struct Args {
    /// Request timeout in seconds
    #[arg(long, default_value = "30", env = "PATENT_FEED_TIMEOUT_SECS", global = true)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print identifiers from a patents CSV export
    Patents {
        /// URL of the CSV export
        url: String,

        /// Stop after this many identifiers (0 = all)
        #[arg(short = 'n', long, default_value = "0", env = "PATENT_FEED_MAX_RESULTS")]
        max_results: usize,

        /// Jurisdiction code to keep
        #[arg(short, long, default_value = "US", env = "PATENT_FEED_JURISDICTION")]
        jurisdiction: String,

        /// Cap on lines parsed concurrently (0 = no cap)
        #[arg(long, default_value = "0", env = "PATENT_FEED_MAX_IN_FLIGHT")]
        max_in_flight: usize,

        /// Leading lines to skip (banner and header rows)
        #[arg(long, default_value = "0")]
        skip_lines: usize,

        /// Print a JSON array instead of one identifier per line
        #[arg(long)]
        json: bool,
    },

    /// Download a URL to a file and print its size and SHA-256
    Download {
        url: String,
        path: PathBuf,
    },

    /// Print the SHA-256 and size of a local file
    Hash {
        file: PathBuf,
    },

    /// Print same-domain links found on an HTML page
    Links {
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays pipeable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "patent_feed=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let client = FeedClient::with_timeout(Duration::from_secs(args.timeout_secs))
        .context("Failed to create HTTP client")?;

    match args.command {
        Command::Patents {
            url,
            max_results,
            jurisdiction,
            max_in_flight,
            skip_lines,
            json,
        } => {
            let config = ExtractConfig::new()
                .with_max_results(max_results)
                .with_max_in_flight(max_in_flight)
                .with_skip_lines(skip_lines);

            let ids = fetch_identifiers(&client, &url, &jurisdiction, config)
                .await
                .with_context(|| format!("Failed to extract identifiers from {}", url))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&ids)?);
            } else {
                for id in &ids {
                    println!("{}", id);
                }
            }
        }
        Command::Download { url, path } => {
            let result = download(&client, &url, &path)
                .await
                .with_context(|| format!("Failed to download {}", url))?;
            println!("{}  {}  {}", result.sha256, result.size, path.display());
        }
        Command::Hash { file } => {
            let digest = hash_file(&file)
                .with_context(|| format!("Failed to hash {}", file.display()))?;
            println!("{}  {}  {}", digest.sha256, digest.size, file.display());
        }
        Command::Links { url } => {
            let links = extract_links(&client, &url)
                .await
                .with_context(|| format!("Failed to extract links from {}", url))?;
            for link in &links {
                println!("{}", link);
            }
        }
    }

    Ok(())
}

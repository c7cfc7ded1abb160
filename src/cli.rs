use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pageloom", about = "Documentation-site crawler and HTML-to-Markdown converter")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Crawl a documentation site starting from one or more seed URLs
    Crawl {
        /// Seed URLs (comma-separated or a path to a file with one per line)
        #[arg(short, long)]
        seeds: Option<String>,

        /// Single seed URL
        #[arg(long)]
        seed: Option<String>,

        /// User-Agent string sent with every request
        #[arg(long)]
        user_agent: Option<String>,

        /// Output directory for Markdown pages and assets
        #[arg(short, long)]
        output_dir: Option<String>,

        /// Maximum crawl depth (0 = unlimited)
        #[arg(short, long)]
        max_depth: Option<u32>,

        /// Maximum pages to visit (0 = unlimited)
        #[arg(long)]
        max_pages: Option<u64>,

        /// Number of concurrent worker tasks
        #[arg(short, long)]
        workers: Option<usize>,

        /// Base per-host delay between fetches, in milliseconds
        #[arg(long)]
        base_delay_ms: Option<u64>,

        /// Random jitter added to the per-host delay, in milliseconds
        #[arg(long)]
        jitter_ms: Option<u64>,

        /// Maximum bytes read for a single image asset
        #[arg(long)]
        max_asset_bytes: Option<usize>,
    },
    /// Check whether a single URL would be allowed by its host's robots.txt
    RobotsCheck {
        /// The URL to evaluate
        url: String,

        /// User-Agent to evaluate the decision for
        #[arg(long, default_value = "pageloom")]
        user_agent: String,
    },
}

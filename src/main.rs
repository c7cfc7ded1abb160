mod cli;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use pageloom_core::AppConfig;
use pageloom_scheduler::{Scheduler, SchedulerConfig};
use pageloom_sink::TracingSink;
use tracing::{info, warn};
use url::Url;

use crate::cli::{Cli, Commands};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async_main())
}

fn load_config(path: &str) -> Result<AppConfig> {
    let config_str = std::fs::read_to_string(path).unwrap_or_else(|_| {
        warn!(path, "config file not found, using embedded defaults");
        include_str!("../config/default.toml").to_string()
    });
    Ok(toml::from_str(&config_str)?)
}

fn collect_seeds(seeds: Option<String>, seed: Option<String>) -> Result<Vec<Url>> {
    let mut raw = Vec::new();
    if let Some(s) = seed {
        raw.push(s);
    }
    if let Some(seeds_arg) = seeds {
        if std::path::Path::new(&seeds_arg).exists() {
            let content = std::fs::read_to_string(&seeds_arg)?;
            raw.extend(content.lines().map(str::trim).filter(|l| !l.is_empty()).map(String::from));
        } else {
            raw.extend(seeds_arg.split(',').map(|s| s.trim().to_string()));
        }
    }

    let mut urls = Vec::with_capacity(raw.len());
    for s in raw {
        match Url::parse(&s) {
            Ok(url) => urls.push(url),
            Err(e) => warn!(seed = %s, error = %e, "skipping unparseable seed URL"),
        }
    }
    Ok(urls)
}

async fn async_main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("PAGELOOM_LOG")
                .or_else(|_| tracing_subscriber::EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = load_config(&cli.config)?;

    match cli.command {
        Commands::Crawl {
            seeds,
            seed,
            user_agent,
            output_dir,
            max_depth,
            max_pages,
            workers,
            base_delay_ms,
            jitter_ms,
            max_asset_bytes,
        } => {
            if let Some(v) = user_agent {
                config.general.user_agent = v;
            }
            if let Some(v) = output_dir {
                config.general.output_dir = v;
            }
            if let Some(v) = max_depth {
                config.general.max_depth = v;
            }
            if let Some(v) = max_pages {
                config.general.max_pages = v;
            }
            if let Some(v) = workers {
                config.general.workers = v;
            }
            if let Some(v) = base_delay_ms {
                config.rate_limit.base_delay_ms = v;
            }
            if let Some(v) = jitter_ms {
                config.rate_limit.jitter_ms = v;
            }
            if let Some(v) = max_asset_bytes {
                config.assets.max_asset_bytes = v;
            }

            let seed_urls = collect_seeds(seeds, seed)?;
            if seed_urls.is_empty() {
                anyhow::bail!("no seed URLs provided: pass --seed or --seeds");
            }
            info!(count = seed_urls.len(), "seeds loaded");

            let scheduler_config = SchedulerConfig::from_app_config(&config);
            let scheduler = Arc::new(Scheduler::new(scheduler_config, TracingSink)?);
            let stats = scheduler.run(seed_urls).await;
            info!(
                total_pages = stats.total_pages,
                total_errors = stats.total_errors,
                total_assets = stats.total_assets,
                duration_ms = stats.duration.as_millis() as u64,
                "crawl finished"
            );
        }
        Commands::RobotsCheck { url, user_agent } => {
            let parsed = Url::parse(&url)?;
            let client = reqwest::Client::new();
            let cache = pageloom_robots::InMemoryRobotsCache::default();
            let host = parsed.host_str().unwrap_or("").to_string();
            let result = pageloom_robots::fetch_robots(&client, parsed.scheme(), &host, &user_agent, &cache).await?;
            let parsed_robots = pageloom_robots::parse(&result.body);
            let rule_set = pageloom_robots::build_rule_set(&parsed_robots, &host, &user_agent, parsed.as_str());
            let decision = pageloom_robots::decide(&parsed, &rule_set);
            println!(
                "{} {} -> allowed={} reason={:?} crawl_delay={:?}",
                user_agent, parsed, decision.allowed, decision.reason, decision.crawl_delay
            );
        }
    }

    Ok(())
}

//! Ripple-Frontier main entry point
//!
//! Loads a scheduler configuration, admits the seed URLs and reports what the
//! frontier looks like. Fetching is done by library users through
//! `ripple_frontier::crawler::Fetcher`.

use anyhow::Context;
use clap::Parser;
use ripple_frontier::config::{load_config_with_hash, Config};
use ripple_frontier::output::print_statistics;
use ripple_frontier::Scheduler;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Ripple-Frontier: a polite crawl task scheduler
///
/// Validates a scheduler configuration, builds the frontier, admits seed
/// URLs and prints admission decisions, statistics and health.
#[derive(Parser, Debug)]
#[command(name = "ripple-frontier")]
#[command(version = "1.0.0")]
#[command(about = "A polite crawl task scheduler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Additional seed URL (repeatable)
    #[arg(long = "seed", value_name = "URL")]
    seeds: Vec<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and print the effective settings without admitting anything
    #[arg(long)]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let mut seeds = config.seeds.clone();
    seeds.extend(cli.seeds.iter().cloned());

    if cli.dry_run {
        handle_dry_run(&config, &seeds);
        return Ok(());
    }

    handle_admission(&config, &seeds)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ripple_frontier=info,warn"),
            1 => EnvFilter::new("ripple_frontier=debug,info"),
            2 => EnvFilter::new("ripple_frontier=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: prints the effective configuration
fn handle_dry_run(config: &Config, seeds: &[String]) {
    let scheduler = &config.scheduler;
    println!("=== Ripple-Frontier Dry Run ===\n");

    println!("Scheduler Configuration:");
    println!("  Max concurrent tasks: {}", scheduler.max_concurrent_tasks);
    println!("  Max depth: {}", scheduler.max_depth);
    println!("  Default domain delay: {}ms", scheduler.default_domain_delay);
    println!("  Retry backoff: {:?}ms", scheduler.retry_backoff_schedule);
    println!("  Max retries: {}", scheduler.max_retries);
    println!(
        "  Queue overload threshold: {}",
        scheduler.queue_overload_threshold
    );
    println!("  High load ratio: {}", scheduler.high_load_ratio);

    if !scheduler.domain_delay_overrides.is_empty() {
        println!("\nDomain Delay Overrides:");
        let mut overrides: Vec<_> = scheduler.domain_delay_overrides.iter().collect();
        overrides.sort();
        for (domain, delay) in overrides {
            println!("  - {}: {}ms", domain, delay);
        }
    }

    let filters = &config.filters;
    println!("\nFilters:");
    println!("  Allowed domains: {:?}", filters.allowed_domains);
    println!("  Denied domains: {:?}", filters.denied_domains);
    println!("  Deny patterns: {:?}", filters.deny_patterns);
    println!("  Include patterns: {:?}", filters.include_patterns);
    if filters.max_path_segments > 0 {
        println!("  Max path segments: {}", filters.max_path_segments);
    }

    println!("\nSeeds ({}):", seeds.len());
    for seed in seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
}

/// Admits the seeds and reports the resulting frontier
fn handle_admission(config: &Config, seeds: &[String]) -> anyhow::Result<()> {
    let scheduler = Scheduler::from_config(config).context("failed to build filters")?;
    tracing::info!("Filters: {}", scheduler.filter_names().join(", "));
    scheduler.start();

    println!("=== Seed Admission ===\n");
    for seed in seeds {
        match scheduler.add_seed(seed) {
            Ok(id) => println!("✓ {} -> task {}", seed, id),
            Err(rejection) => println!("✗ {}: {}", seed, rejection),
        }
    }
    println!();

    print_statistics(&scheduler.stats());

    let health = scheduler.health_check();
    println!("=== Health ===\n");
    println!(
        "{}",
        serde_json::to_string_pretty(&health).context("failed to serialize health report")?
    );

    scheduler.shutdown();
    Ok(())
}

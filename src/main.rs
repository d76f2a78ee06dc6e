mod cli;

use reelmatch::{
    config,
    metadata::{BatchSummary, ResolutionQueue, Resolver, ResultCache},
};
use reelmatch_common::{CatalogEntry, ExternalId};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{CacheAction, Cli, Commands};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "reelmatch=debug,reelmatch_common=debug".to_string()
        } else {
            "reelmatch=info".to_string()
        }
    });

    // stdout carries results; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Resolve {
            catalog,
            output,
            concurrency,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(resolve_catalog(&catalog, output, concurrency, config_path))
        }
        Commands::Lookup {
            title,
            original_title,
            year,
            directors,
            runtime,
            media_type,
            tmdb_id,
            imdb_id,
        } => {
            let mut entry = CatalogEntry::new(title, 0).with_media_type(media_type);
            entry.year = year;
            entry.original_title = original_title;
            entry.directors = directors;
            entry.duration_minutes = runtime;
            entry.external_id = match (tmdb_id, imdb_id) {
                (Some(id), _) => Some(ExternalId::Tmdb(id)),
                (None, Some(id)) => Some(id.parse::<ExternalId>()?),
                (None, None) => None,
            };

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(lookup(entry, config_path))
        }
        Commands::Cache { action } => cache_command(action, config_path),
        Commands::CheckProviders => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(check_providers(config_path))
        }
        Commands::Validate {
            config: validate_path,
        } => {
            let path = validate_path.or_else(|| config_path.map(Path::to_path_buf));
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("reelmatch {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn build_resolver(config: &config::Config) -> Result<Resolver> {
    let cache = Arc::new(ResultCache::open(&config.cache));
    Resolver::from_config(config, cache).context("Failed to initialize metadata provider")
}

async fn resolve_catalog(
    catalog: &Path,
    output: Option<PathBuf>,
    concurrency: Option<usize>,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    let content = std::fs::read_to_string(catalog)
        .with_context(|| format!("Failed to read catalog: {:?}", catalog))?;
    let entries: Vec<CatalogEntry> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse catalog: {:?}", catalog))?;

    let resolver = Arc::new(build_resolver(&config)?);
    let cache = Arc::clone(resolver.cache());
    let workers = concurrency.unwrap_or(config.workers.concurrency);
    let queue = ResolutionQueue::new(resolver, workers);

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling outstanding resolutions");
            ctrl_c.cancel();
        }
    });

    let results = queue.resolve_all(entries, cancel).await;
    let summary = BatchSummary::from_results(&results);
    if !cache.is_empty() {
        cache.flush().context("Failed to flush result cache")?;
    }

    let json = serde_json::to_string_pretty(&results)?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("Failed to write results: {:?}", path))?;
            eprintln!("Results written to {}", path.display());
        }
        None => println!("{}", json),
    }

    eprintln!(
        "Resolved {} entries: {} matched, {} unmatched, {} cancelled",
        summary.total, summary.matched, summary.unmatched, summary.cancelled
    );
    Ok(())
}

async fn lookup(entry: CatalogEntry, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let resolver = build_resolver(&config)?;

    let result = resolver.resolve(&entry).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn cache_command(action: CacheAction, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let cache = ResultCache::open(&config.cache);

    match action {
        CacheAction::Stats => {
            let stats = cache.stats();
            println!("Cache: {}", config.cache.path.display());
            println!("  Entries:   {}", stats.total);
            println!("  Matched:   {}", stats.matched);
            println!("  Unmatched: {}", stats.unmatched);
            println!("  Expired:   {}", stats.expired);
        }
        CacheAction::Clear => {
            let removed = cache.clear()?;
            println!("Removed {} cache entries", removed);
        }
        CacheAction::Prune => {
            let removed = cache.prune_expired()?;
            println!("Pruned {} expired cache entries", removed);
        }
    }

    Ok(())
}

async fn check_providers(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    let Some(provider) = reelmatch::metadata::build_provider(&config.providers)? else {
        println!("✗ No provider credentials configured");
        println!("  Set providers.tmdb_api_key / providers.omdb_api_keys or TMDB_API_KEY / OMDB_API_KEY");
        return Ok(());
    };

    match provider.ping().await {
        Ok(()) => println!("✓ {} reachable, credentials accepted", provider.name()),
        Err(e) => {
            println!("✗ {}: {}", provider.name(), e);
            anyhow::bail!("Provider check failed");
        }
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::load_config_or_default(None)?
        }
    };

    let provider = reelmatch::metadata::select(&config.providers)
        .map(|choice| choice.name())
        .unwrap_or("none (enrichment will be skipped)");
    println!("  Provider: {}", provider);
    println!("  Threshold: {}", config.scoring.threshold);
    println!("  Workers: {}", config.workers.concurrency);
    println!(
        "  Year window: ±{} (±{} for obscure titles)",
        config.matching.year_window, config.matching.obscure_year_window
    );
    println!("  Cache: {}", config.cache.path.display());

    Ok(())
}

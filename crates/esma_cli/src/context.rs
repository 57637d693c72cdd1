//! Shared setup: logging, configuration and loader construction.

use std::path::Path;

use esma_cache::CallOptions;
use esma_config::EsmaConfig;
use esma_loader::EsmaDataLoader;
use tracing_subscriber::EnvFilter;

use crate::{CacheArgs, GlobalArgs, QueryArgs};

/// Installs the stderr log subscriber. `RUST_LOG` takes precedence over
/// `--quiet` and `--verbose`.
pub fn init_logging(global: &GlobalArgs) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(global)));
    // A subscriber may already be installed when running under a test harness.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn default_directive(global: &GlobalArgs) -> &'static str {
    if global.quiet {
        "error"
    } else if global.verbose {
        "debug"
    } else {
        "info"
    }
}

/// Loads `--config`, or `esma.toml` in the current directory, or the defaults.
pub fn load_settings(global: &GlobalArgs) -> Result<EsmaConfig, Box<dyn std::error::Error>> {
    let config = match &global.config {
        Some(path) => esma_config::load_config_file(Path::new(path))?,
        None => esma_config::load_config(&std::env::current_dir()?)?,
    };
    Ok(config)
}

/// Applies command-line query overrides on top of the configuration.
pub fn apply_query(config: &mut EsmaConfig, query: &QueryArgs) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(from) = query.from {
        config.query.creation_date_from = from;
    }
    if let Some(to) = query.to {
        config.query.creation_date_to = Some(to);
    }
    if let Some(limit) = query.limit {
        if limit == 0 {
            return Err("--limit must be positive".into());
        }
        config.query.limit = limit;
    }
    let to = config.query.date_to();
    if to < config.query.creation_date_from {
        return Err(format!(
            "query window ends ({to}) before it starts ({})",
            config.query.creation_date_from
        )
        .into());
    }
    Ok(())
}

/// Caching controls from the command line, or-ed with `[download]`.
pub fn call_options(config: &EsmaConfig, cache: &CacheArgs) -> CallOptions {
    CallOptions {
        update: cache.update || config.download.update,
        save: cache.save || config.download.save,
    }
}

/// Builds a loader for `global` with optional query overrides.
pub fn build_loader(
    global: &GlobalArgs,
    query: Option<&QueryArgs>,
) -> Result<(EsmaConfig, EsmaDataLoader), Box<dyn std::error::Error>> {
    let mut config = load_settings(global)?;
    if let Some(query) = query {
        apply_query(&mut config, query)?;
    }
    let loader = EsmaDataLoader::from_config(&config)?;
    tracing::debug!(
        root = %loader.cache().root().display(),
        from = %loader.window().creation_date_from,
        to = %loader.window().creation_date_to,
        "loader ready"
    );
    Ok((config, loader))
}

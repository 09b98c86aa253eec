use crate::config::types::{Config, ConnectionConfig, CrawlerConfig, SiteEntry, StorageConfig};
use crate::url::canonicalize;
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_connection_config(&config.connection)?;
    validate_crawler_config(&config.crawler)?;
    validate_storage_config(&config.storage)?;
    validate_sites(&config.sites)?;
    Ok(())
}

/// Validates the fetcher identity
fn validate_connection_config(config: &ConnectionConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if !config.referrer.is_empty() {
        Url::parse(&config.referrer)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid referrer: {}", e)))?;
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if let Some(pool_size) = config.pool_size {
        if pool_size < 1 {
            return Err(ConfigError::Validation(format!(
                "pool-size must be >= 1, got {}",
                pool_size
            )));
        }
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates the site list
///
/// Each root must still be a usable URL once canonicalized, and no two
/// entries may canonicalize to the same root.
fn validate_sites(sites: &[SiteEntry]) -> Result<(), ConfigError> {
    if sites.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[sites]] entry is required".to_string(),
        ));
    }

    let mut roots = HashSet::new();
    for site in sites {
        if site.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Site '{}' must have a name",
                site.url
            )));
        }

        let root = canonicalize(&site.url);
        let parsed = Url::parse(&root).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid site URL '{}': {}", site.url, e))
        })?;

        if parsed.host_str().map_or(true, |host| host == "www.") {
            return Err(ConfigError::InvalidUrl(format!(
                "Site URL '{}' has no host",
                site.url
            )));
        }

        if !roots.insert(root.clone()) {
            return Err(ConfigError::Validation(format!(
                "Site '{}' is configured twice (as {})",
                site.name, root
            )));
        }
    }

    Ok(())
}

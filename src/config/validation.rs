use crate::config::types::{Config, HttpConfig, OutputConfig, SchedulerConfig, SourceConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_http_config(&config.http)?;
    validate_output_config(&config.output)?;
    validate_scheduler_config(&config.scheduler)?;
    Ok(())
}

/// Validates listing source configuration
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.start_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid start_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "start_url must be http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.start_page < 1 {
        return Err(ConfigError::Validation(format!(
            "start_page must be >= 1, got {}",
            config.start_page
        )));
    }

    if config.concurrency < 1 || config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            config.concurrency
        )));
    }

    Ok(())
}

/// Validates HTTP client and pacing configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    validate_delay_range("request_delay_range", config.request_delay_range)?;
    validate_delay_range("page_delay_range", config.page_delay_range)?;

    if config.backoff_scale < 0.0 {
        return Err(ConfigError::Validation(format!(
            "backoff_scale must be >= 0, got {}",
            config.backoff_scale
        )));
    }

    Ok(())
}

/// Validates a (min, max) delay range in seconds
fn validate_delay_range(name: &str, range: (f64, f64)) -> Result<(), ConfigError> {
    let (min, max) = range;

    if min < 0.0 || max < 0.0 {
        return Err(ConfigError::Validation(format!(
            "{} values must be >= 0, got ({}, {})",
            name, min, max
        )));
    }

    if min > max {
        return Err(ConfigError::Validation(format!(
            "{} min must be <= max, got ({}, {})",
            name, min, max
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates scheduler configuration
fn validate_scheduler_config(config: &SchedulerConfig) -> Result<(), ConfigError> {
    if config.timezone.is_empty() {
        return Err(ConfigError::Validation(
            "timezone cannot be empty".to_string(),
        ));
    }

    Ok(())
}

use crate::config::types::{
    Config, FetchConfig, OutputConfig, PacingConfig, Placeholders, TargetConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_target_config(&config.target)?;
    validate_pacing_config(&config.pacing)?;
    validate_fetch_config(&config.fetch)?;
    validate_output_config(&config.output)?;
    validate_placeholders(&config.placeholders)?;
    Ok(())
}

/// Validates the review feed target
fn validate_target_config(config: &TargetConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid base_url '{}': {}", config.base_url, e))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' has no host",
            config.base_url
        )));
    }

    if config.rating_param.trim().is_empty() {
        return Err(ConfigError::Validation(
            "rating_param cannot be empty".to_string(),
        ));
    }

    if config.pages_per_rating < 1 {
        return Err(ConfigError::Validation(format!(
            "pages_per_rating must be >= 1, got {}",
            config.pages_per_rating
        )));
    }

    Ok(())
}

/// Validates all delay windows
fn validate_pacing_config(config: &PacingConfig) -> Result<(), ConfigError> {
    validate_window("delay", config.min_delay, config.max_delay)?;
    validate_window("detail delay", config.detail_min_delay, config.detail_max_delay)?;
    validate_window("page pause", config.page_pause_min, config.page_pause_max)?;
    Ok(())
}

/// Validates retry, timeout and identity settings
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if !config.request_timeout.is_finite() || config.request_timeout <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "request_timeout must be a positive number of seconds, got {}",
            config.request_timeout
        )));
    }

    validate_seconds("block_cooldown", config.block_cooldown)?;
    validate_seconds("timeout_cooldown", config.timeout_cooldown)?;

    if config.block_markers.iter().any(|m| m.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "block_markers cannot contain empty entries".to_string(),
        ));
    }

    if config.user_agents.is_empty() {
        return Err(ConfigError::Validation(
            "user_agents must list at least one browser signature".to_string(),
        ));
    }

    if config.user_agents.iter().any(|ua| ua.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "user_agents cannot contain empty entries".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.output_dir.is_empty() {
        return Err(ConfigError::Validation(
            "output_dir cannot be empty".to_string(),
        ));
    }

    if config.log_file.is_empty() {
        return Err(ConfigError::Validation(
            "log_file cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Placeholders stand in for missing markup, so they must never be blank
fn validate_placeholders(placeholders: &Placeholders) -> Result<(), ConfigError> {
    for (name, value) in [
        ("title", &placeholders.title),
        ("teaser", &placeholders.teaser),
        ("date", &placeholders.date),
        ("author", &placeholders.author),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "placeholder for {} cannot be empty",
                name
            )));
        }
    }

    Ok(())
}

/// Validates a [min, max] window of seconds
fn validate_window(name: &str, min: f64, max: f64) -> Result<(), ConfigError> {
    validate_seconds(name, min)?;
    validate_seconds(name, max)?;

    if min > max {
        return Err(ConfigError::Validation(format!(
            "{} window is inverted: min {}s > max {}s",
            name, min, max
        )));
    }

    Ok(())
}

fn validate_seconds(name: &str, seconds: f64) -> Result<(), ConfigError> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(ConfigError::Validation(format!(
            "{} must be a non-negative number of seconds, got {}",
            name, seconds
        )));
    }
    Ok(())
}

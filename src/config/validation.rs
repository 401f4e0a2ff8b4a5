use crate::config::types::{Config, ExtractionRules, OutputConfig, ScraperConfig, UserAgentConfig};
use crate::ConfigError;
use regex::Regex;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scraper_config(&config.scraper)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_rules(&config.rules)?;
    Ok(())
}

/// Validates run limits and request pacing
fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.start_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid start URL '{}': {}", config.start_url, e))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Start URL '{}' must use HTTP or HTTPS",
            config.start_url
        )));
    }

    if config.page_limit == Some(0) {
        return Err(ConfigError::Validation(
            "page_limit must be >= 1 when set".to_string(),
        ));
    }

    if config.time_limit == Some(0) {
        return Err(ConfigError::Validation(
            "time_limit must be >= 1 minute when set".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 || config.request_timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be between 1 and 300, got {}",
            config.request_timeout_secs
        )));
    }

    if config.retries > 10 {
        return Err(ConfigError::Validation(format!(
            "retries must be <= 10, got {}",
            config.retries
        )));
    }

    Ok(())
}

/// Validates the user agent pool
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.agents.is_empty() {
        return Err(ConfigError::Validation(
            "user agent list cannot be empty".to_string(),
        ));
    }

    if config.agents.iter().any(|agent| agent.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "user agent entries cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.csv_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "csv_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates that every selector and pattern in the rule set compiles
fn validate_rules(rules: &ExtractionRules) -> Result<(), ConfigError> {
    validate_selector("product", &rules.product)?;
    validate_selector("name", &rules.name)?;
    validate_selector("price", &rules.price)?;
    validate_selector("image", &rules.image)?;

    if let Some(next_page) = &rules.next_page {
        validate_selector("next-page", next_page)?;
    }

    if rules.image_attribute.trim().is_empty() {
        return Err(ConfigError::Validation(
            "image_attribute cannot be empty".to_string(),
        ));
    }

    if rules.follow.enabled && rules.follow.domains.is_empty() {
        return Err(ConfigError::Validation(
            "following links requires at least one domain pattern".to_string(),
        ));
    }

    for pattern in &rules.follow.domains {
        validate_domain_pattern(pattern)?;
    }

    if let Some(pattern) = &rules.follow.listing_pattern {
        Regex::new(pattern).map_err(|e| {
            ConfigError::InvalidPattern(format!("Invalid listing pattern '{}': {}", pattern, e))
        })?;
    }

    Ok(())
}

fn validate_selector(field: &str, selector: &str) -> Result<(), ConfigError> {
    if selector.trim().is_empty() {
        return Err(ConfigError::InvalidSelector(format!(
            "{} selector cannot be empty",
            field
        )));
    }

    Selector::parse(selector).map_err(|e| {
        ConfigError::InvalidSelector(format!("{} selector '{}': {:?}", field, selector, e))
    })?;

    Ok(())
}

/// Validates a follow-domain pattern: `host` or `*.host`
///
/// Patterns are compared against URL hosts, which are lowercase ASCII
/// (internationalized names arrive as punycode). Single-label hosts such as
/// `localhost` and IPv4 addresses are accepted.
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    let host = pattern.strip_prefix("*.").unwrap_or(pattern);

    if host.is_empty() {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain pattern '{}' has no host",
            pattern
        )));
    }

    if host.contains('*') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain pattern '{}': '*.' is only allowed as a prefix",
            pattern
        )));
    }

    if host.contains(':') || host.contains('/') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain pattern '{}' must be a bare host, without scheme, port or path",
            pattern
        )));
    }

    for label in host.split('.') {
        if label.is_empty() {
            return Err(ConfigError::InvalidPattern(format!(
                "Domain pattern '{}' has an empty label",
                pattern
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(ConfigError::InvalidPattern(format!(
                "Domain pattern '{}' contains invalid characters (use punycode for IDNs)",
                pattern
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(ConfigError::InvalidPattern(format!(
                "Domain pattern '{}': labels cannot start or end with '-'",
                pattern
            )));
        }
    }

    Ok(())
}

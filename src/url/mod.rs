//! URL handling module for Shop-Scraper
//!
//! This module provides URL normalization, domain wildcard matching, and the
//! link scope used when following links beyond the next-page chain.

mod matcher;
mod normalize;

use crate::config::FollowRules;
use crate::ConfigError;
use regex::Regex;
use url::Url;

// Re-export main functions
pub use matcher::{matches_any, matches_wildcard};
pub use normalize::{normalize_parsed, normalize_url};

/// Extracts the lowercase host of a URL
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Decides which discovered links belong to the shop and which are listing pages
#[derive(Debug, Clone)]
pub struct LinkScope {
    domains: Vec<String>,
    listing: Option<Regex>,
}

impl LinkScope {
    /// Builds the scope from the follow rules of the configuration
    ///
    /// # Returns
    ///
    /// * `Ok(LinkScope)` - Compiled scope
    /// * `Err(ConfigError)` - The listing pattern is not a valid regex
    pub fn from_rules(rules: &FollowRules) -> Result<Self, ConfigError> {
        let listing = rules
            .listing_pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| ConfigError::InvalidPattern(e.to_string()))?;

        Ok(Self {
            domains: rules
                .domains
                .iter()
                .map(|pattern| pattern.to_ascii_lowercase())
                .collect(),
            listing,
        })
    }

    /// Returns true if the URL's domain matches one of the scope patterns
    pub fn in_scope(&self, url: &Url) -> bool {
        extract_domain(url).is_some_and(|domain| matches_any(&self.domains, &domain))
    }

    /// Returns true if the URL matches the listing page pattern
    pub fn is_listing(&self, url: &Url) -> bool {
        self.listing
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(url.as_str()))
    }

    /// Returns true if a listing pattern is configured at all
    pub fn has_listing_pattern(&self) -> bool {
        self.listing.is_some()
    }
}

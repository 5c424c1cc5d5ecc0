// ABOUTME: Loader for the built-in site configuration embedded at compile time.
// ABOUTME: Provides load_builtin_config() used when no config file is supplied.

use crate::config::SiteConfig;

/// Embedded JSON with the default news and analysis sites.
const BUILTIN_SITES_JSON: &str = include_str!("../data/builtin_sites.json");

/// Loads the built-in site configuration.
///
/// # Panics
///
/// Panics if the embedded JSON is malformed or lists an invalid URL.
pub fn load_builtin_config() -> SiteConfig {
    SiteConfig::from_json(BUILTIN_SITES_JSON).expect("failed to parse builtin site config")
}

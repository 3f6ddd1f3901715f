//! URL syntax validation
//!
//! The server consumes a validator as a plain function value so a
//! deployment can swap the rule without touching the dispatcher.

use std::sync::LazyLock;

use regex::Regex;

/// Validator consulted for every command target
pub type UrlValidator = fn(&str) -> bool;

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://)([\w\-\.]+)(\.[a-zA-Z]{2,})(/[\w\-\.~:/?#\[\]@!$&'()*+,;=]*)?$")
        .expect("URL pattern is a valid regex")
});

/// Scheme `http`/`https`, a host with a dotted TLD, optional path
pub fn is_valid_url(url: &str) -> bool {
    URL_PATTERN.is_match(url)
}

/// Accept any non-empty target
pub fn accept_any(url: &str) -> bool {
    !url.is_empty()
}

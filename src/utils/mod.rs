//! Utility functions and helpers.

pub mod report;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
///
/// Returns `None` when the reference cannot be joined onto the base.
pub fn resolve_url(base: &Url, href: &str) -> Option<String> {
    base.join(href).ok().map(|u| u.to_string())
}

//! Size specifier parsing.
//!
//! A size specifier names the image size to request from the media registry,
//! with an optional CDN-only alternate after the first `:`:
//!
//! - `"thumbnail"`              → `thumbnail` everywhere
//! - `"large:full"`             → `large` locally, `full` behind the CDN
//! - `"medium:full?w=300&h=200"` → behind the CDN, `full` with an embedded query
//!
//! Empty parts count as absent, so `":full"` has no local size and
//! `"large:"` falls back to `large` behind the CDN.

use crate::config::RewriteConfig;
use tracing::trace;

/// A parsed `primary[:alternate]` size specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeSpec<'a> {
    pub primary: Option<&'a str>,
    pub alternate: Option<&'a str>,
}

impl<'a> SizeSpec<'a> {
    /// Split on the first `:`. Anything after it, including further colons,
    /// belongs to the alternate.
    pub fn parse(spec: &'a str) -> Self {
        let (primary, alternate) = match spec.split_once(':') {
            Some((p, a)) => (p, Some(a)),
            None => (spec, None),
        };
        Self {
            primary: Some(primary).filter(|p| !p.is_empty()),
            alternate: alternate.filter(|a| !a.is_empty()),
        }
    }

    /// The token to use: the alternate wins when a CDN is in play.
    pub fn choose(&self, cdn_enabled: bool) -> Option<&'a str> {
        if cdn_enabled {
            self.alternate.or(self.primary)
        } else {
            self.primary
        }
    }
}

/// Resolve a size specifier against the configuration.
pub fn resolve(config: &RewriteConfig, spec: &str) -> Option<String> {
    resolve_with(config, spec, |chosen, _| chosen.map(str::to_string))
}

/// Resolve a size specifier and hand `(chosen, alternate)` to `mapper`,
/// whose return value replaces the chosen token.
pub fn resolve_with<T, F>(config: &RewriteConfig, spec: &str, mapper: F) -> T
where
    F: FnOnce(Option<&str>, Option<&str>) -> T,
{
    let parsed = SizeSpec::parse(spec);
    let chosen = parsed.choose(config.cdn_host().is_some());
    trace!(spec, ?chosen, "resolved size specifier");
    mapper(chosen, parsed.alternate)
}

/// Split a resolved size token into the registry size name and the embedded
/// query, if any: `"full?w=300"` → `("full", Some("w=300"))`.
pub fn split_query(token: &str) -> (&str, Option<&str>) {
    match token.split_once('?') {
        Some((name, query)) => (name, Some(query)),
        None => (token, None),
    }
}

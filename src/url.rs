//! Delivery URL rewriting.
//!
//! [`UrlTransformer::transform`] picks exactly one strategy per URL, in this
//! order:
//!
//! | Condition | Result for `https://site.test/wp-content/uploads/a.jpg` |
//! |---|---|
//! | CDN host configured | `https://img.cdn.test/a.jpg?auto=format` |
//! | WebP on, append mode | `https://site.test/wp-content/uploads/a.jpg.webp` |
//! | WebP on, replace mode | `https://site.test/wp-content/uploads/a.webp` |
//! | otherwise | unchanged |
//!
//! Empty URLs are always returned unchanged.

use crate::config::RewriteConfig;
use crate::query::append_query;
use crate::registry::AssetSource;
use crate::srcset::Candidate;
use tracing::{debug, trace};

const WEBP_SUFFIX: &str = ".webp";

/// Rewrites asset URLs for delivery according to a [`RewriteConfig`].
#[derive(Debug, Clone, Copy)]
pub struct UrlTransformer<'a> {
    config: &'a RewriteConfig,
}

impl<'a> UrlTransformer<'a> {
    pub fn new(config: &'a RewriteConfig) -> Self {
        Self { config }
    }

    /// Produce the final delivery URL.
    pub fn transform(&self, url: &str) -> String {
        if url.is_empty() {
            return String::new();
        }
        let config = self.config;
        if config.cdn_host().is_some() {
            self.rewrite_to_cdn(url, &config.origin.upload_folder)
        } else if config.next_gen_format && !config.replace_extension {
            trace!(url, "appending webp suffix");
            format!("{url}{WEBP_SUFFIX}")
        } else if config.next_gen_format {
            trace!(url, "replacing extension with webp");
            format!("{}{WEBP_SUFFIX}", strip_extension(url))
        } else {
            url.to_string()
        }
    }

    /// Replace the origin's `{folder}` prefix with the CDN host and append the
    /// default query. Without a CDN host the URL is returned unchanged.
    pub fn rewrite_to_cdn(&self, url: &str, folder: &str) -> String {
        let Some(host) = self.config.cdn_host() else {
            return url.to_string();
        };
        let cdn_base = format!("https://{host}");
        let folder = folder.trim_matches('/');
        let origin = &self.config.origin;

        let rewritten = match origin.content_url.as_deref() {
            Some(content_url) => {
                let prefix = format!("{}/{folder}", content_url.trim_end_matches('/'));
                replace_prefix_matches(url, &prefix, &cdn_base)
            }
            None => {
                let upload_path = format!("{}/{folder}", origin.content_path.trim_end_matches('/'));
                match strip_upload_origin(url, &upload_path) {
                    Some(rest) => format!("{cdn_base}{rest}"),
                    None => url.to_string(),
                }
            }
        };
        if rewritten == url {
            debug!(url, "url is not under the upload origin; host left as is");
        }

        let query = self.config.default_query();
        let result = if query.is_empty() {
            rewritten
        } else {
            append_query(&rewritten, query)
        };
        debug!(url, cdn_url = %result, "rewrote to cdn");
        result
    }

    /// Transform the URL of a registry lookup result, keeping its dimensions.
    pub fn transform_source(&self, source: Option<AssetSource>) -> Option<AssetSource> {
        source.map(|src| AssetSource {
            url: self.transform(&src.url),
            ..src
        })
    }

    /// Transform the URL of every srcset candidate. Descriptors are untouched.
    pub fn transform_candidates(&self, candidates: &[Candidate]) -> Vec<Candidate> {
        candidates
            .iter()
            .map(|c| Candidate {
                url: self.transform(&c.url),
                descriptor: c.descriptor.clone(),
            })
            .collect()
    }
}

/// Remove the extension of the last path segment: everything from its last
/// `.` onward. A segment without a `.` is returned as is.
fn strip_extension(url: &str) -> &str {
    let segment_start = url.rfind('/').map_or(0, |i| i + 1);
    match url[segment_start..].rfind('.') {
        Some(dot) => &url[..segment_start + dot],
        None => url,
    }
}

/// A match must end a path segment: it is followed by the end of the URL,
/// `/`, `?` or `#`.
fn ends_segment(rest: &str) -> bool {
    matches!(rest.chars().next(), None | Some('/' | '?' | '#'))
}

/// Replace every occurrence of `prefix` that ends a path segment.
fn replace_prefix_matches(url: &str, prefix: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(url.len());
    let mut rest = url;
    while let Some(pos) = rest.find(prefix) {
        let after = &rest[pos + prefix.len()..];
        out.push_str(&rest[..pos]);
        if ends_segment(after) {
            out.push_str(replacement);
        } else {
            out.push_str(prefix);
        }
        rest = after;
    }
    out.push_str(rest);
    out
}

/// If `url` is `scheme://host{upload_path}/...` (or protocol-relative
/// `//host{upload_path}/...`), return the part after `upload_path`.
fn strip_upload_origin<'u>(url: &'u str, upload_path: &str) -> Option<&'u str> {
    let after_scheme = match url.find("://") {
        Some(i) => &url[i + 3..],
        None => url.strip_prefix("//")?,
    };
    let path = &after_scheme[after_scheme.find('/')?..];
    let rest = path.strip_prefix(upload_path)?;
    ends_segment(rest).then_some(rest)
}

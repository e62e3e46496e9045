//! Multi-resolution (`srcset`) candidates.
//!
//! Candidate lists come from the host's media metadata. This module rewrites
//! their URLs and converts between the list and the `srcset` attribute text:
//!
//! ```text
//! a-300x150.jpg 300w, a-768x384.jpg 768w, a.jpg 1000w
//! ```

use crate::query::append_query;
use std::fmt;
use tracing::trace;

/// One srcset entry: a URL plus its width (`300w`) or density (`2x`)
/// descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub url: String,
    pub descriptor: String,
}

impl Candidate {
    pub fn new(url: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            descriptor: descriptor.into(),
        }
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descriptor.is_empty() {
            f.write_str(&self.url)
        } else {
            write!(f, "{} {}", self.url, self.descriptor)
        }
    }
}

/// Append `query` to every candidate URL with the `?`/`&` rule.
///
/// Returns a new list of the same length; descriptors are untouched. An empty
/// query returns the candidates unchanged.
pub fn rewrite_all(candidates: &[Candidate], query: &str) -> Vec<Candidate> {
    if query.is_empty() {
        return candidates.to_vec();
    }
    trace!(count = candidates.len(), query, "rewriting srcset candidates");
    candidates
        .iter()
        .map(|c| Candidate {
            url: append_query(&c.url, query),
            descriptor: c.descriptor.clone(),
        })
        .collect()
}

/// Parse `srcset` attribute text.
///
/// Each URL runs to the next whitespace, so commas inside URLs survive as
/// long as they are not the URL's last character.
pub fn parse_srcset(srcset: &str) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    let mut rest = srcset;
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if rest.is_empty() {
            break;
        }
        let url_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let url = &rest[..url_end];
        rest = &rest[url_end..];

        if let Some(url) = url.strip_suffix(',') {
            candidates.push(Candidate::new(url, ""));
            continue;
        }
        let descriptor_end = rest.find(',').unwrap_or(rest.len());
        candidates.push(Candidate::new(url, rest[..descriptor_end].trim()));
        rest = &rest[descriptor_end..];
    }
    candidates
}

/// Render candidates as `srcset` attribute text.
pub fn format_srcset(candidates: &[Candidate]) -> String {
    candidates
        .iter()
        .map(Candidate::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Candidate> {
        vec![
            Candidate::new("https://img.cdn.test/a.jpg?auto=format", "300w"),
            Candidate::new("https://img.cdn.test/a.jpg", "1000w"),
        ]
    }

    #[test]
    fn rewrite_all_picks_separator_per_candidate() {
        let out = rewrite_all(&sample(), "w=300&h=150");
        assert_eq!(out[0].url, "https://img.cdn.test/a.jpg?auto=format&w=300&h=150");
        assert_eq!(out[1].url, "https://img.cdn.test/a.jpg?w=300&h=150");
    }

    #[test]
    fn rewrite_all_preserves_count_and_descriptors() {
        let input = sample();
        let out = rewrite_all(&input, "fit=crop");
        assert_eq!(out.len(), input.len());
        for (before, after) in input.iter().zip(&out) {
            assert_eq!(before.descriptor, after.descriptor);
        }
    }

    #[test]
    fn rewrite_all_empty_query_is_noop() {
        assert_eq!(rewrite_all(&sample(), ""), sample());
    }

    #[test]
    fn rewrite_all_empty_list() {
        assert!(rewrite_all(&[], "w=1").is_empty());
    }

    #[test]
    fn parse_srcset_basic() {
        let parsed = parse_srcset("a-300.jpg 300w, a-768.jpg 768w,a.jpg 1000w");
        assert_eq!(
            parsed,
            vec![
                Candidate::new("a-300.jpg", "300w"),
                Candidate::new("a-768.jpg", "768w"),
                Candidate::new("a.jpg", "1000w"),
            ]
        );
    }

    #[test]
    fn parse_srcset_keeps_commas_inside_urls() {
        let parsed = parse_srcset("https://img.cdn.test/a.jpg?rect=0,0,10,10 2x, b.jpg");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].url, "https://img.cdn.test/a.jpg?rect=0,0,10,10");
        assert_eq!(parsed[0].descriptor, "2x");
        assert_eq!(parsed[1], Candidate::new("b.jpg", ""));
    }

    #[test]
    fn parse_srcset_url_with_trailing_comma() {
        let parsed = parse_srcset("a.jpg, b.jpg 2x");
        assert_eq!(parsed[0], Candidate::new("a.jpg", ""));
        assert_eq!(parsed[1], Candidate::new("b.jpg", "2x"));
    }

    #[test]
    fn format_srcset_joins_candidates() {
        let text = format_srcset(&[Candidate::new("a.jpg", "300w"), Candidate::new("b.jpg", "")]);
        assert_eq!(text, "a.jpg 300w, b.jpg");
    }
}

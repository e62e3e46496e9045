//! CLI output formatting.
//!
//! Each command has a `format_*` function that returns lines, so output can
//! be tested without capturing stdout, and [`print_lines`] writes them.
//!
//! ```text
//! $ cdn-image-rewrite url https://site.test/wp-content/uploads/a.jpg
//! https://site.test/wp-content/uploads/a.jpg
//!     → https://img.cdn.test/a.jpg?auto=format
//!
//! $ cdn-image-rewrite attrs --width 1000 --height 500 --query w=300
//! 300x150
//!     srcset: suppressed
//!     crop: no
//! ```

use crate::config::RewriteConfig;
use crate::registry::AssetSource;
use crate::responsive::ResponsiveAttributes;
use crate::srcset::Candidate;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

/// One entry per input URL, with the rewritten URL on an indented line.
pub fn format_url_results(results: &[(String, String)]) -> Vec<String> {
    let mut lines = Vec::new();
    for (input, output) in results {
        lines.push(input.clone());
        if input == output {
            lines.push(format!("{}(unchanged)", indent(1)));
        } else {
            lines.push(format!("{}→ {}", indent(1), output));
        }
    }
    lines
}

/// Size specifier resolution: the chosen token split into size name and
/// embedded query.
pub fn format_size(spec: &str, name: Option<&str>, query: Option<&str>) -> Vec<String> {
    let mut lines = vec![spec.to_string()];
    match name {
        Some(name) => {
            lines.push(format!("{}size: {}", indent(1), name));
            if let Some(query) = query {
                lines.push(format!("{}query: {}", indent(1), query));
            }
        }
        None => lines.push(format!("{}size: (none)", indent(1))),
    }
    lines
}

/// Computed display attributes.
pub fn format_attributes(attrs: &ResponsiveAttributes) -> Vec<String> {
    vec![
        format!("{}x{}", attrs.width, attrs.height),
        format!(
            "{}srcset: {}",
            indent(1),
            if attrs.allow_multi_resolution {
                "allowed"
            } else {
                "suppressed"
            }
        ),
        format!("{}crop: {}", indent(1), yes_no(attrs.is_crop)),
    ]
}

/// Candidate list, one per line.
pub fn format_candidates(candidates: &[Candidate]) -> Vec<String> {
    if candidates.is_empty() {
        return vec!["(no candidates)".to_string()];
    }
    candidates.iter().map(Candidate::to_string).collect()
}

/// A resolved source with its dimensions.
pub fn format_source(source: &AssetSource) -> Vec<String> {
    vec![
        source.url.clone(),
        format!("{}{}x{}", indent(1), source.width, source.height),
    ]
}

/// Effective configuration summary.
pub fn format_config_summary(config: &RewriteConfig) -> Vec<String> {
    let mode = match (config.cdn_host(), config.next_gen_format, config.replace_extension) {
        (Some(host), _, _) => format!("cdn ({host})"),
        (None, true, true) => "webp (replace extension)".to_string(),
        (None, true, false) => "webp (append)".to_string(),
        (None, false, _) => "passthrough".to_string(),
    };
    let query = match config.default_query() {
        "" => "(none)",
        q => q,
    };
    vec![
        format!("Mode: {mode}"),
        format!("{}default query: {}", indent(1), query),
        format!("{}admin renders: {}", indent(1), yes_no(config.admin_context)),
    ]
}

/// Write lines to stdout.
pub fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{cdn_config, local_config};

    #[test]
    fn url_results_mark_unchanged() {
        let lines = format_url_results(&[
            ("a.jpg".into(), "a.webp".into()),
            ("b".into(), "b".into()),
        ]);
        assert_eq!(lines, ["a.jpg", "    → a.webp", "b", "    (unchanged)"]);
    }

    #[test]
    fn size_lines() {
        assert_eq!(
            format_size("thumb:full?w=1", Some("full"), Some("w=1")),
            ["thumb:full?w=1", "    size: full", "    query: w=1"]
        );
        assert_eq!(format_size(":x", None, None), [":x", "    size: (none)"]);
    }

    #[test]
    fn attribute_lines() {
        let attrs = ResponsiveAttributes {
            width: 300,
            height: 150,
            allow_multi_resolution: false,
            is_crop: true,
            sized_by_query: true,
        };
        assert_eq!(
            format_attributes(&attrs),
            ["300x150", "    srcset: suppressed", "    crop: yes"]
        );
    }

    #[test]
    fn empty_candidates() {
        assert_eq!(format_candidates(&[]), ["(no candidates)"]);
    }

    #[test]
    fn config_summary_modes() {
        assert_eq!(format_config_summary(&cdn_config())[0], "Mode: cdn (img.cdn.test)");
        assert_eq!(
            format_config_summary(&local_config(true, false))[0],
            "Mode: webp (append)"
        );
        assert_eq!(
            format_config_summary(&local_config(false, false))[0],
            "Mode: passthrough"
        );
    }
}

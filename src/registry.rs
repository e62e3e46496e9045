//! Host collaborator traits.
//!
//! The crate never looks up media or serializes markup itself. The host
//! supplies both through these traits:
//!
//! - [`MediaRegistry`] resolves an asset id and size name to its original URL
//!   and intrinsic dimensions, plus the srcset candidates the host would
//!   offer for it.
//! - [`MarkupRenderer`] turns a computed [`ImageTag`] into markup.
//!
//! [`StaticAsset`] and [`HtmlRenderer`] are small implementations used by the
//! CLI and by tests.

use crate::delivery::{ImageTag, SrcsetPolicy};
use crate::srcset::{Candidate, format_srcset};
use maud::html;
use tracing::warn;

/// Result of a registry lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSource {
    pub url: String,
    pub width: u32,
    pub height: u32,
    /// Whether the registry served a hard-cropped intermediate size.
    pub is_cropped: bool,
}

/// The host's media registry.
pub trait MediaRegistry {
    /// Resolve `id` at the named `size`. `None` when the asset or size is
    /// unknown.
    fn resolve_src(&self, id: &str, size: &str, icon: bool) -> Option<AssetSource>;

    /// Srcset candidates the host would generate for `id` at `size`.
    fn candidates(&self, id: &str, size: &str) -> Vec<Candidate>;
}

/// The host's markup serializer.
pub trait MarkupRenderer {
    fn render(&self, tag: &ImageTag) -> String;
}

impl<T: MediaRegistry + ?Sized> MediaRegistry for &T {
    fn resolve_src(&self, id: &str, size: &str, icon: bool) -> Option<AssetSource> {
        (**self).resolve_src(id, size, icon)
    }

    fn candidates(&self, id: &str, size: &str) -> Vec<Candidate> {
        (**self).candidates(id, size)
    }
}

/// A registry holding a single asset, returned for every id and size.
#[derive(Debug, Clone)]
pub struct StaticAsset {
    pub source: AssetSource,
    pub candidates: Vec<Candidate>,
}

impl StaticAsset {
    pub fn new(url: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            source: AssetSource {
                url: url.into(),
                width,
                height,
                is_cropped: false,
            },
            candidates: Vec::new(),
        }
    }

    pub fn with_candidates(mut self, candidates: Vec<Candidate>) -> Self {
        self.candidates = candidates;
        self
    }
}

impl MediaRegistry for StaticAsset {
    fn resolve_src(&self, _id: &str, _size: &str, _icon: bool) -> Option<AssetSource> {
        Some(self.source.clone())
    }

    fn candidates(&self, _id: &str, _size: &str) -> Vec<Candidate> {
        self.candidates.clone()
    }
}

/// Renders an `<img>` element. Attribute values are HTML-escaped; attributes
/// with unusable names are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

impl MarkupRenderer for HtmlRenderer {
    fn render(&self, tag: &ImageTag) -> String {
        let mut out = String::from("<img");
        push_attr(&mut out, "src", &tag.src);
        for (name, value) in &tag.attributes {
            if !is_attr_name(name) {
                warn!(name, "dropping attribute with invalid name");
                continue;
            }
            push_attr(&mut out, name, value);
        }
        if let SrcsetPolicy::Candidates(candidates) = &tag.srcset {
            if !candidates.is_empty() {
                push_attr(&mut out, "srcset", &format_srcset(candidates));
            }
        }
        out.push('>');
        out
    }
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    let escaped = html! { (value) }.into_string();
    out.push_str(&format!(" {name}=\"{escaped}\""));
}

fn is_attr_name(name: &str) -> bool {
    !name.is_empty()
        && name != "src"
        && name != "srcset"
        && !name.chars().any(|c| {
            c.is_whitespace() || c.is_control() || matches!(c, '"' | '\'' | '>' | '/' | '=')
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::Attributes;

    fn tag(srcset: SrcsetPolicy) -> ImageTag {
        let mut attributes = Attributes::new();
        attributes.insert("width".into(), "300".into());
        attributes.insert("alt".into(), "Fish & \"chips\"".into());
        ImageTag {
            src: "https://img.cdn.test/a.jpg?auto=format&w=300".into(),
            attributes,
            srcset,
        }
    }

    #[test]
    fn static_asset_returns_same_source_for_any_size() {
        let registry = StaticAsset::new("a.jpg", 10, 20);
        let a = registry.resolve_src("1", "thumbnail", false).unwrap();
        let b = registry.resolve_src("2", "full", true).unwrap();
        assert_eq!(a, b);
        assert_eq!((a.width, a.height), (10, 20));
    }

    #[test]
    fn html_renderer_escapes_values() {
        let html = HtmlRenderer.render(&tag(SrcsetPolicy::Suppressed));
        assert_eq!(
            html,
            "<img src=\"https://img.cdn.test/a.jpg?auto=format&amp;w=300\" width=\"300\" \
             alt=\"Fish &amp; &quot;chips&quot;\">"
        );
    }

    #[test]
    fn html_renderer_writes_srcset() {
        let html = HtmlRenderer.render(&tag(SrcsetPolicy::Candidates(vec![
            Candidate::new("a-300.jpg", "300w"),
            Candidate::new("a.jpg", "1000w"),
        ])));
        assert!(html.contains("srcset=\"a-300.jpg 300w, a.jpg 1000w\""));
    }

    #[test]
    fn html_renderer_skips_empty_srcset_and_bad_names() {
        let mut t = tag(SrcsetPolicy::Candidates(Vec::new()));
        t.attributes.insert("on click".into(), "x".into());
        let html = HtmlRenderer.render(&t);
        assert!(!html.contains("srcset"));
        assert!(!html.contains("on click"));
    }
}

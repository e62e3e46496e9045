//! Image delivery: the transforms composed for a host render.
//!
//! [`ImageDelivery`] is what a host calls while rendering. It resolves the
//! size specifier, asks the [`MediaRegistry`] for the source, and routes the
//! result through the URL transformer, the query merger and, for full
//! `<img>` tags, the responsive calculator and srcset rewriter.
//!
//! Two paths exist:
//!
//! - **Plain**: no CDN host, or no query to apply. The registry result goes
//!   through [`UrlTransformer`] and the host's own candidates are rewritten
//!   the same way.
//! - **Sized**: a CDN host and an explicit or embedded query. The merged
//!   query is appended to the transformed URL, display dimensions are
//!   recomputed, and srcset candidates are either query-rewritten or
//!   suppressed via [`SrcsetPolicy::Suppressed`].

use crate::config::{RenderContext, RewriteConfig};
use crate::query::{self, QueryParams};
use crate::registry::{AssetSource, MarkupRenderer, MediaRegistry};
use crate::responsive;
use crate::size;
use crate::srcset::{self, Candidate};
use crate::url::UrlTransformer;
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::debug;

/// Ordered HTML attributes.
pub type Attributes = IndexMap<String, String>;

/// What to do about multi-resolution candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SrcsetPolicy {
    /// Offer these candidates (possibly none).
    Candidates(Vec<Candidate>),
    /// Generate no candidates at all for this render.
    Suppressed,
}

/// A computed `<img>`: source URL, remaining attributes and srcset policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTag {
    pub src: String,
    pub attributes: Attributes,
    pub srcset: SrcsetPolicy,
}

impl ImageTag {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Candidates offered for this tag; empty when suppressed.
    pub fn candidates(&self) -> &[Candidate] {
        match &self.srcset {
            SrcsetPolicy::Candidates(c) => c,
            SrcsetPolicy::Suppressed => &[],
        }
    }
}

/// Entry point for host renders.
pub struct ImageDelivery<R> {
    config: Arc<RewriteConfig>,
    registry: R,
    context: RenderContext,
}

impl<R: MediaRegistry> ImageDelivery<R> {
    pub fn new(config: Arc<RewriteConfig>, registry: R) -> Self {
        Self {
            config,
            registry,
            context: RenderContext::Public,
        }
    }

    /// Render in the given context. Admin renders skip URL transforms unless
    /// the config enables them.
    pub fn with_context(mut self, context: RenderContext) -> Self {
        self.context = context;
        self
    }

    fn transforms_active(&self) -> bool {
        self.config.is_active(self.context)
    }

    /// Final delivery URL for a single image.
    pub fn transform_url(&self, url: &str) -> String {
        if !self.transforms_active() {
            return url.to_string();
        }
        UrlTransformer::new(&self.config).transform(url)
    }

    /// Delivery URLs for a candidate list.
    pub fn transform_srcset_candidates(&self, candidates: &[Candidate]) -> Vec<Candidate> {
        if !self.transforms_active() {
            return candidates.to_vec();
        }
        UrlTransformer::new(&self.config).transform_candidates(candidates)
    }

    /// Resolve a size specifier against this delivery's config.
    pub fn resolve_size(&self, spec: &str) -> Option<String> {
        size::resolve(&self.config, spec)
    }

    fn transform_source(&self, source: Option<AssetSource>) -> Option<AssetSource> {
        if !self.transforms_active() {
            return source;
        }
        UrlTransformer::new(&self.config).transform_source(source)
    }

    /// Resolve the size and, when a CDN host is configured, the query to
    /// apply. Returns `(size name, merged query)`; the query is `None` on the
    /// plain path.
    fn plan(
        &self,
        size_spec: &str,
        explicit: &QueryParams,
    ) -> Option<(String, Option<QueryParams>)> {
        let Some(token) = self.resolve_size(size_spec) else {
            debug!(size_spec, "size specifier resolved to nothing");
            return None;
        };
        let (name, embedded) = size::split_query(&token);
        let sized =
            self.config.cdn_host().is_some() && (!explicit.is_empty() || embedded.is_some());
        let merged = sized.then(|| query::merge(embedded, explicit));
        Some((name.to_string(), merged))
    }

    /// Source URL and dimensions for `id` at `size_spec`, with `query`
    /// applied on the CDN.
    pub fn get_src(
        &self,
        id: &str,
        size_spec: &str,
        icon: bool,
        query: &QueryParams,
    ) -> Option<AssetSource> {
        if id.is_empty() {
            return None;
        }
        let (name, merged) = self.plan(size_spec, query)?;
        let source = self.transform_source(self.registry.resolve_src(id, &name, icon))?;
        match merged {
            None => Some(source),
            Some(merged) => Some(AssetSource {
                url: merged.append_to(&source.url),
                ..source
            }),
        }
    }

    /// Full `<img>` description for `id` at `size_spec`.
    ///
    /// On the sized path, attributes are `explicit`, then the computed
    /// `width`/`height` when the query sized the image, and `src` is always
    /// the computed URL.
    pub fn get_image(
        &self,
        id: &str,
        size_spec: &str,
        icon: bool,
        explicit: &Attributes,
        query: &QueryParams,
    ) -> Option<ImageTag> {
        if id.is_empty() {
            return None;
        }
        let (name, merged) = self.plan(size_spec, query)?;
        let source = self.transform_source(self.registry.resolve_src(id, &name, icon))?;

        let mut attributes = Attributes::new();
        attributes.insert("width".into(), source.width.to_string());
        attributes.insert("height".into(), source.height.to_string());

        let Some(merged) = merged else {
            let mut src = source.url;
            for (key, value) in explicit {
                if key == "src" {
                    src = value.clone();
                } else {
                    attributes.insert(key.clone(), value.clone());
                }
            }
            let candidates = self.transform_srcset_candidates(&self.registry.candidates(id, &name));
            return Some(ImageTag {
                src,
                attributes,
                srcset: SrcsetPolicy::Candidates(candidates),
            });
        };

        let computed = responsive::compute(source.width, source.height, &merged);
        for (key, value) in explicit.iter().filter(|(k, _)| k.as_str() != "src") {
            attributes.insert(key.clone(), value.clone());
        }
        if computed.sized_by_query {
            attributes.insert("width".into(), computed.width.to_string());
            attributes.insert("height".into(), computed.height.to_string());
        }

        let serialized = merged.serialize();
        let srcset = if computed.allow_multi_resolution {
            let candidates = self.transform_srcset_candidates(&self.registry.candidates(id, &name));
            SrcsetPolicy::Candidates(srcset::rewrite_all(&candidates, &serialized))
        } else {
            debug!(id, query = %serialized, "srcset suppressed for small rendition");
            SrcsetPolicy::Suppressed
        };

        Some(ImageTag {
            src: merged.append_to(&source.url),
            attributes,
            srcset,
        })
    }

    /// [`get_image`](Self::get_image) rendered through `renderer`; empty when
    /// nothing could be resolved.
    pub fn render_image<M: MarkupRenderer>(
        &self,
        renderer: &M,
        id: &str,
        size_spec: &str,
        icon: bool,
        explicit: &Attributes,
        query: &QueryParams,
    ) -> String {
        self.get_image(id, size_spec, icon, explicit, query)
            .map(|tag| renderer.render(&tag))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::HtmlRenderer;
    use crate::test_helpers::{FakeRegistry, cdn_config, local_config};

    const ORIGIN: &str = "https://site.test/wp-content/uploads";

    fn delivery(config: RewriteConfig) -> ImageDelivery<FakeRegistry> {
        ImageDelivery::new(Arc::new(config), FakeRegistry::landscape())
    }

    fn q(query: &str) -> QueryParams {
        QueryParams::parse(query)
    }

    #[test]
    fn get_src_plain_path_transforms_url() {
        let d = delivery(cdn_config());
        let src = d.get_src("7", "thumbnail:full", false, &QueryParams::new()).unwrap();
        assert_eq!(src.url, "https://img.cdn.test/photo.jpg?auto=format");
        assert_eq!(d.registry.requested_sizes(), ["full"]);
    }

    #[test]
    fn get_src_with_embedded_and_explicit_query() {
        let d = delivery(cdn_config());
        let src = d
            .get_src("7", "thumbnail:full?w=300&h=100", false, &q("h=150&fit=crop"))
            .unwrap();
        assert_eq!(
            src.url,
            "https://img.cdn.test/photo.jpg?auto=format&w=300&h=150&fit=crop"
        );
        assert_eq!((src.width, src.height), (1000, 500));
    }

    #[test]
    fn get_src_without_cdn_ignores_query() {
        let d = delivery(local_config(true, true));
        let src = d.get_src("7", "thumbnail:full", false, &q("w=300")).unwrap();
        assert_eq!(src.url, format!("{ORIGIN}/photo-150x75.webp"));
        assert_eq!(d.registry.requested_sizes(), ["thumbnail"]);
    }

    #[test]
    fn get_src_empty_id_or_size() {
        let d = delivery(cdn_config());
        assert!(d.get_src("", "full", false, &QueryParams::new()).is_none());
        assert!(d.get_src("7", "", false, &QueryParams::new()).is_none());
        assert!(d.get_src("missing", "full", false, &QueryParams::new()).is_none());
    }

    #[test]
    fn admin_context_skips_url_transform_but_keeps_query() {
        let d = delivery(cdn_config()).with_context(RenderContext::Admin);
        let src = d.get_src("7", "full", false, &q("w=300")).unwrap();
        assert_eq!(src.url, format!("{ORIGIN}/photo.jpg?w=300"));
        assert_eq!(d.transform_url("x.jpg"), "x.jpg");
    }

    #[test]
    fn admin_context_enabled_transforms_source() {
        let mut config = cdn_config();
        config.admin_context = true;
        let d = delivery(config).with_context(RenderContext::Admin);
        let src = d.get_src("7", "full", false, &QueryParams::new()).unwrap();
        assert_eq!(src.url, "https://img.cdn.test/photo.jpg?auto=format");
        assert_eq!((src.width, src.height), (1000, 500));
    }

    #[test]
    fn get_image_sized_path_computes_dimensions_and_suppresses_srcset() {
        let d = delivery(cdn_config());
        let mut explicit = Attributes::new();
        explicit.insert("width".into(), "999".into());
        explicit.insert("alt".into(), "A photo".into());
        explicit.insert("src".into(), "ignored.jpg".into());

        let tag = d.get_image("7", "full", false, &explicit, &q("w=300")).unwrap();
        assert_eq!(tag.src, "https://img.cdn.test/photo.jpg?auto=format&w=300");
        assert_eq!(tag.attribute("width"), Some("300"));
        assert_eq!(tag.attribute("height"), Some("150"));
        assert_eq!(tag.attribute("alt"), Some("A photo"));
        assert_eq!(tag.attribute("src"), None);
        assert_eq!(tag.srcset, SrcsetPolicy::Suppressed);
        assert!(tag.candidates().is_empty());
    }

    #[test]
    fn get_image_sized_path_rewrites_candidates() {
        let d = delivery(cdn_config());
        let tag = d
            .get_image("7", "full", false, &Attributes::new(), &q("w=800&fit=max"))
            .unwrap();
        assert_eq!(tag.attribute("width"), Some("800"));
        assert_eq!(tag.attribute("height"), Some("400"));
        let candidates = tag.candidates();
        assert_eq!(candidates.len(), 2);
        assert_eq!(
            candidates[0].url,
            "https://img.cdn.test/photo-300x150.jpg?auto=format&w=800&fit=max"
        );
        assert_eq!(candidates[0].descriptor, "300w");
    }

    #[test]
    fn get_image_sized_path_keeps_explicit_dims_without_sizing_params() {
        let d = delivery(cdn_config());
        let mut explicit = Attributes::new();
        explicit.insert("width".into(), "640".into());
        let tag = d.get_image("7", "full", false, &explicit, &q("sat=-100")).unwrap();
        assert_eq!(tag.attribute("width"), Some("640"));
        assert_eq!(tag.attribute("height"), Some("500"));
        assert_eq!(tag.candidates().len(), 2);
    }

    #[test]
    fn get_image_plain_path_uses_host_candidates() {
        let d = delivery(local_config(true, false));
        let mut explicit = Attributes::new();
        explicit.insert("class".into(), "hero".into());
        let tag = d.get_image("7", "full", false, &explicit, &q("w=300")).unwrap();
        assert_eq!(tag.src, format!("{ORIGIN}/photo.jpg.webp"));
        assert_eq!(tag.attribute("width"), Some("1000"));
        assert_eq!(tag.attribute("class"), Some("hero"));
        assert_eq!(tag.candidates()[1].url, format!("{ORIGIN}/photo.jpg.webp"));
    }

    #[test]
    fn render_image_produces_markup_or_nothing() {
        let d = delivery(cdn_config());
        let html = d.render_image(
            &HtmlRenderer,
            "7",
            "full",
            false,
            &Attributes::new(),
            &q("w=300"),
        );
        assert!(
            html.starts_with("<img src=\"https://img.cdn.test/photo.jpg?auto=format&amp;w=300\"")
        );
        assert!(!html.contains("srcset"));
        assert_eq!(
            d.render_image(&HtmlRenderer, "", "full", false, &Attributes::new(), &q("w=300")),
            ""
        );
    }
}

//! # CDN Image Rewrite
//!
//! Rewrites media asset URLs and their responsive-image attributes so images
//! are served through a remote image-processing CDN, or, when no CDN is
//! configured, as statically pre-converted WebP files next to the originals.
//!
//! The crate sits between a content-management layer that knows where media
//! lives (the [`registry`] traits) and the final rendered markup. It never
//! touches image bytes: every operation is a pure function over strings and
//! integers.
//!
//! # Pipeline
//!
//! ```text
//! size spec ──► size::resolve ──► MediaRegistry::resolve_src ──► url::UrlTransformer
//!                   │                                                  │
//!                   └─ embedded ?query ──► query::merge ──► responsive::compute
//!                                                                      │
//!                                                 srcset::rewrite_all ◄┘ (or suppressed)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Layered `config.toml` + environment loading into an immutable [`RewriteConfig`] |
//! | [`url`] | CDN host rewrite, `.webp` append or extension replacement |
//! | [`size`] | `local:cdn?query` size specifier parsing and resolution |
//! | [`query`] | Ordered query parameter sets, merging and `?`/`&` appending |
//! | [`responsive`] | Display width/height and srcset eligibility from CDN sizing params |
//! | [`srcset`] | Srcset candidates: parse, format, rewrite |
//! | [`registry`] | Traits for the host's media registry and markup serializer |
//! | [`delivery`] | Composition of the above into `get_src` / `get_image` |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Explicit Composition Over Hooks
//!
//! The host calls the transforms directly on the values it already has. When
//! multi-resolution candidates must be suppressed, [`delivery::ImageTag`]
//! carries a [`delivery::SrcsetPolicy`] the host branches on; nothing is
//! registered globally and nothing has to be unregistered afterwards.
//!
//! ## Immutable Configuration
//!
//! [`RewriteConfig`] is resolved once from stock defaults, an optional file,
//! an explicit override layer and the environment. Components borrow it or
//! hold an `Arc` of it. Re-initialisation builds a whole new value, so readers
//! never see a half-updated config.
//!
//! ## Faithful Heuristics
//!
//! The responsive calculator is a heuristic, not an aspect-ratio solver. Its
//! srcset threshold compares `h`/`w` values to `"400"` as strings. See
//! [`responsive`] for the exact rule order.

pub mod config;
pub mod delivery;
pub mod output;
pub mod query;
pub mod registry;
pub mod responsive;
pub mod size;
pub mod srcset;
pub mod url;

pub use config::{RenderContext, RewriteConfig};
pub use delivery::{ImageDelivery, ImageTag, SrcsetPolicy};
pub use query::QueryParams;
pub use registry::{AssetSource, MarkupRenderer, MediaRegistry};
pub use responsive::ResponsiveAttributes;
pub use srcset::Candidate;
pub use url::UrlTransformer;

#[cfg(test)]
pub(crate) mod test_helpers;

//! Display dimensions for CDN-sized images.
//!
//! When a render asks the CDN for `w`/`h`/`fit`, the `<img>` width and height
//! attributes must describe what the CDN will return, and small renditions
//! should not offer a srcset. [`compute`] derives both from the intrinsic
//! dimensions reported by the media registry.
//!
//! Rules, in order:
//!
//! 1. Srcset stays allowed unless an `h` or `w` value sorts before `"400"`
//!    as a string (so `"300"` and `"1000"` both disable it, `"50"` does not).
//! 2. `fit=max|fillmax|min` forbids upscaling; `fit=crop` marks a crop.
//! 3. `h`/`w` are read as leading integers (`"300px"` → 300, junk → 0).
//! 4. Without upscaling, requests are clamped to the intrinsic size.
//! 5. A lone `h` derives `w` from the aspect ratio, and vice versa.
//! 6. Portrait images follow `h`, landscape images follow `w` (unless
//!    cropping); square images take both requested values verbatim.
//!
//! This is a heuristic for the three orientation cases, not a general
//! aspect-ratio solver.

use crate::query::QueryParams;
use serde::Serialize;
use tracing::trace;

/// Values of `h`/`w` sorting below this string disable srcset generation.
pub const SRCSET_THRESHOLD: &str = "400";

/// Computed `<img>` dimensions and srcset eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResponsiveAttributes {
    pub width: u32,
    pub height: u32,
    pub allow_multi_resolution: bool,
    pub is_crop: bool,
    /// Whether an `h` or `w` parameter was present at all.
    pub sized_by_query: bool,
}

/// CDN `fit` modes that matter for sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fit {
    Max,
    FillMax,
    Min,
    Crop,
    Other,
}

impl Fit {
    fn parse(value: &str) -> Self {
        match value {
            "max" => Fit::Max,
            "fillmax" => Fit::FillMax,
            "min" => Fit::Min,
            "crop" => Fit::Crop,
            _ => Fit::Other,
        }
    }

    fn allows_upscale(self) -> bool {
        !matches!(self, Fit::Max | Fit::FillMax | Fit::Min)
    }
}

/// Compute display attributes for an image of `intrinsic_width` ×
/// `intrinsic_height` served with `params`.
pub fn compute(
    intrinsic_width: u32,
    intrinsic_height: u32,
    params: &QueryParams,
) -> ResponsiveAttributes {
    let (iw, ih) = (intrinsic_width, intrinsic_height);

    let allow_multi_resolution = !["h", "w"]
        .iter()
        .filter_map(|key| params.get(key))
        .any(|v| v < SRCSET_THRESHOLD);

    let fit = params.get("fit").map_or(Fit::Other, Fit::parse);
    let scale_up = fit.allows_upscale();
    let is_crop = fit == Fit::Crop;

    let mut h = params.get("h").map_or(0, leading_int);
    let mut w = params.get("w").map_or(0, leading_int);

    if !scale_up {
        if h > ih {
            h = ih;
        }
        if w > iw {
            w = iw;
        }
    }

    if h != 0 && w == 0 {
        w = scale(h, ih, iw);
    }
    if w != 0 && h == 0 {
        h = scale(w, iw, ih);
    }

    let mut width = if w != 0 { w } else { iw };
    let mut height = if h != 0 { h } else { ih };

    if h != 0 && ih > iw && !is_crop {
        height = h;
        width = scale(h, ih, iw);
    }
    if w != 0 && iw > ih && !is_crop {
        width = w;
        height = scale(w, iw, ih);
    }
    if w != 0 && h != 0 && iw == ih {
        width = w;
        height = h;
    }

    trace!(
        iw,
        ih,
        width,
        height,
        allow_multi_resolution,
        is_crop,
        "computed responsive attributes"
    );
    ResponsiveAttributes {
        width,
        height,
        allow_multi_resolution,
        is_crop,
        sized_by_query: params.contains_key("h") || params.contains_key("w"),
    }
}

/// `value / from * to`, truncated. A zero `from` yields zero.
fn scale(value: u32, from: u32, to: u32) -> u32 {
    if from == 0 {
        return 0;
    }
    (f64::from(value) / f64::from(from) * f64::from(to)) as u32
}

/// Leading decimal integer of `raw`, after optional whitespace and `+`.
/// Negative or non-numeric input gives 0; overflow saturates.
fn leading_int(raw: &str) -> u32 {
    let trimmed = raw.trim_start();
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    digits
        .chars()
        .take_while(char::is_ascii_digit)
        .fold(0u32, |acc, d| {
            acc.saturating_mul(10)
                .saturating_add(d.to_digit(10).unwrap_or(0))
        })
}

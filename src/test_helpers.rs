//! Shared test utilities: canned configurations and an in-memory registry.

use crate::config::RewriteConfig;
use crate::registry::{AssetSource, MediaRegistry};
use crate::srcset::Candidate;
use std::sync::Mutex;

const ORIGIN: &str = "https://site.test/wp-content/uploads";

/// CDN host `img.cdn.test` with the stock default query.
pub fn cdn_config() -> RewriteConfig {
    RewriteConfig {
        cdn_host: Some("img.cdn.test".into()),
        ..Default::default()
    }
}

/// No CDN host; WebP rewriting per the two flags.
pub fn local_config(next_gen_format: bool, replace_extension: bool) -> RewriteConfig {
    RewriteConfig {
        next_gen_format,
        replace_extension,
        ..Default::default()
    }
}

/// Registry with one 1000×500 asset, id `"7"`, in `full` and `thumbnail`
/// sizes. Records every size it is asked for.
#[derive(Default)]
pub struct FakeRegistry {
    requested: Mutex<Vec<String>>,
}

impl FakeRegistry {
    pub fn landscape() -> Self {
        Self::default()
    }

    pub fn requested_sizes(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl MediaRegistry for FakeRegistry {
    fn resolve_src(&self, id: &str, size: &str, _icon: bool) -> Option<AssetSource> {
        self.requested.lock().unwrap().push(size.to_string());
        if id != "7" {
            return None;
        }
        let (file, width, height, is_cropped) = match size {
            "full" => ("photo.jpg", 1000, 500, false),
            "thumbnail" => ("photo-150x75.jpg", 150, 75, true),
            _ => return None,
        };
        Some(AssetSource {
            url: format!("{ORIGIN}/{file}"),
            width,
            height,
            is_cropped,
        })
    }

    fn candidates(&self, id: &str, _size: &str) -> Vec<Candidate> {
        if id != "7" {
            return Vec::new();
        }
        vec![
            Candidate::new(format!("{ORIGIN}/photo-300x150.jpg"), "300w"),
            Candidate::new(format!("{ORIGIN}/photo.jpg"), "1000w"),
        ]
    }
}

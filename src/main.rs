use cdn_image_rewrite::delivery::Attributes;
use cdn_image_rewrite::registry::{HtmlRenderer, MarkupRenderer, StaticAsset};
use cdn_image_rewrite::{
    ImageDelivery, QueryParams, UrlTransformer, config, output, responsive, size, srcset,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cdn-image-rewrite")]
#[command(about = "Rewrite image URLs and attributes for delivery through an image CDN")]
#[command(long_about = "\
Rewrite image URLs and attributes for delivery through an image CDN

With a CDN host, upload URLs are moved to https://<cdn_host>/... and the
default query is appended. Without one, URLs are pointed at pre-converted
.webp files instead.

Configuration layers (later wins):
  stock defaults → --config file → command-line flags → environment
  (CDN_IMAGE_ADMIN, CDN_IMAGE_HOST, CDN_IMAGE_QUERY, CDN_IMAGE_WEBP,
   CDN_IMAGE_EXT_REPLACE)

Size specifiers: 'local[:cdn][?query]', e.g. 'medium:full?w=300&fit=crop'.

Run 'cdn-image-rewrite gen-config' to generate a documented config file.")]
#[command(version)]
struct Cli {
    /// Config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// CDN host, e.g. img.example.com
    #[arg(long, global = true)]
    cdn_host: Option<String>,

    /// Query appended to every CDN URL
    #[arg(long, global = true)]
    cdn_query: Option<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rewrite one or more asset URLs
    Url {
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Resolve a size specifier
    Size { spec: String },
    /// Compute display attributes for CDN sizing parameters
    Attrs {
        /// Intrinsic width
        #[arg(long)]
        width: u32,
        /// Intrinsic height
        #[arg(long)]
        height: u32,
        /// CDN query, e.g. "w=300&fit=crop"
        #[arg(long, default_value = "")]
        query: String,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Rewrite every candidate of a srcset attribute
    Srcset {
        srcset: String,
        /// Query appended to every candidate after the URL rewrite
        #[arg(long, default_value = "")]
        query: String,
    },
    /// Render an <img> tag for a single asset
    Image {
        /// Original asset URL
        #[arg(long)]
        url: String,
        /// Intrinsic width
        #[arg(long)]
        width: u32,
        /// Intrinsic height
        #[arg(long)]
        height: u32,
        /// Size specifier
        #[arg(long, default_value = "full")]
        size: String,
        /// CDN query
        #[arg(long, default_value = "")]
        query: String,
        /// Extra attribute as name=value (repeatable)
        #[arg(long = "attr", value_parser = parse_attr)]
        attrs: Vec<(String, String)>,
        /// Host srcset to offer with the image
        #[arg(long)]
        srcset: Option<String>,
        /// Print only the resolved source URL and dimensions
        #[arg(long)]
        src_only: bool,
    },
    /// Print the effective configuration
    ShowConfig,
    /// Print a stock config file with all options documented
    GenConfig,
}

fn parse_attr(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected name=value, got {raw:?}"))
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Explicit override layer built from command-line flags.
fn cli_overrides(cli: &Cli) -> Option<toml::Value> {
    let mut table = toml::value::Table::new();
    if let Some(host) = &cli.cdn_host {
        table.insert("cdn_host".into(), toml::Value::String(host.clone()));
    }
    if let Some(query) = &cli.cdn_query {
        table.insert("default_query".into(), toml::Value::String(query.clone()));
    }
    (!table.is_empty()).then_some(toml::Value::Table(table))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let config = Arc::new(config::load_config(cli.config.as_deref(), cli_overrides(&cli))?);
    debug!(?config, "effective configuration");

    match cli.command {
        Command::Url { urls } => {
            let transformer = UrlTransformer::new(&config);
            let results: Vec<(String, String)> = urls
                .into_iter()
                .map(|url| {
                    let out = transformer.transform(&url);
                    (url, out)
                })
                .collect();
            output::print_lines(&output::format_url_results(&results));
        }
        Command::Size { spec } => {
            let token = size::resolve(&config, &spec);
            let (name, query) = match token.as_deref().map(size::split_query) {
                Some((name, query)) => (Some(name), query),
                None => (None, None),
            };
            output::print_lines(&output::format_size(&spec, name, query));
        }
        Command::Attrs {
            width,
            height,
            query,
            json,
        } => {
            let attrs = responsive::compute(width, height, &QueryParams::parse(&query));
            if json {
                println!("{}", serde_json::to_string_pretty(&attrs)?);
            } else {
                output::print_lines(&output::format_attributes(&attrs));
            }
        }
        Command::Srcset { srcset: text, query } => {
            let candidates = srcset::parse_srcset(&text);
            let rewritten = UrlTransformer::new(&config).transform_candidates(&candidates);
            let rewritten =
                srcset::rewrite_all(&rewritten, &QueryParams::parse(&query).serialize());
            output::print_lines(&output::format_candidates(&rewritten));
        }
        Command::Image {
            url,
            width,
            height,
            size,
            query,
            attrs,
            srcset: host_srcset,
            src_only,
        } => {
            let candidates = host_srcset
                .as_deref()
                .map(srcset::parse_srcset)
                .unwrap_or_default();
            let registry = StaticAsset::new(url, width, height).with_candidates(candidates);
            let delivery = ImageDelivery::new(Arc::clone(&config), registry);
            let query = QueryParams::parse(&query);
            if src_only {
                let source = delivery
                    .get_src("cli", &size, false, &query)
                    .ok_or_else(|| format!("size specifier {size:?} resolved to nothing"))?;
                output::print_lines(&output::format_source(&source));
            } else {
                let explicit: Attributes = attrs.into_iter().collect();
                let tag = delivery
                    .get_image("cli", &size, false, &explicit, &query)
                    .ok_or_else(|| format!("size specifier {size:?} resolved to nothing"))?;
                println!("{}", HtmlRenderer.render(&tag));
            }
        }
        Command::ShowConfig => {
            output::print_lines(&output::format_config_summary(&config));
            println!();
            print!("{}", toml::to_string_pretty(config.as_ref())?);
        }
        // Printed before the config was loaded
        Command::GenConfig => {}
    }

    Ok(())
}

use clap::Parser;
use reqwest::Url;

use crate::api::SampleStride;

/// Log filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "track_viewer=info,wgpu=warn,iced=warn";

/// Command line / environment configuration
#[derive(Debug, Clone, Parser)]
#[command(name = "track-viewer", version, about = "Browse recorded object tracks")]
pub struct Config {
    /// Base URL of the track service
    #[arg(
        long,
        env = "TRACK_VIEWER_SERVER",
        default_value = "http://127.0.0.1:8000/",
        value_parser = parse_server_url
    )]
    pub server: Url,

    /// Initial sample stride (1 = every frame)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub sample: u32,
}

impl Config {
    pub fn sample_stride(&self) -> SampleStride {
        SampleStride::clamped(self.sample)
    }
}

fn parse_server_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| format!("invalid URL: {}", e))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported scheme '{}', expected http or https", other)),
    }
}

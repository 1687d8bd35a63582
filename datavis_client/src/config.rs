// Command line interface
// runtime configuration (target, layout, windows, rates), layered as
// CLI > DATAVIS_* environment > --config file > built-in default
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use datavis_protocol::{ByteOrder, PacketLayout, Packing, Variant};
use serde::Deserialize;

use crate::derived::track::DEFAULT_LON_GAP_DEG;
use crate::history::{HistoryConfig, DEFAULT_BATTERY_WINDOW, DEFAULT_TRACK_WINDOW, DEFAULT_WINDOW};
use crate::net::RetryPolicy;
use crate::pipeline::{PipelineConfig, DEFAULT_RATE_SEED};
use crate::render::SinkKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    #[default]
    Attitude,
    Orbit,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub layout: PacketLayout,
    pub tick: Duration,
    pub retry: RetryPolicy,
    pub pipeline: PipelineConfig,
    pub sink: SinkKind,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "datavis_client", about = "Live CubeSat telemetry decoder")]
pub struct Cli {
    /// Telemetry server host
    pub host: Option<String>,
    #[arg(long, value_enum)]                pub layout: Option<LayoutKind>,
    /// Defaults to 12376 (attitude) or 12380 (orbit)
    #[arg(long)]                            pub port: Option<u16>,
    /// Orbit packet carries a 3x3 DCM (`--dcm=false` to override a file)
    #[arg(long, action = ArgAction::Set, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub dcm: Option<bool>,
    /// Orbit packet carries the battery field
    #[arg(long, action = ArgAction::Set, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub battery: Option<bool>,
    /// Same as `--battery=false`
    #[arg(long, conflicts_with = "battery")] pub no_battery: bool,
    #[arg(long)]                            pub packing: Option<Packing>,
    #[arg(long)]                            pub byte_order: Option<ByteOrder>,
    #[arg(long)]                            pub history_len: Option<usize>,
    #[arg(long)]                            pub battery_len: Option<usize>,
    #[arg(long)]                            pub track_len: Option<usize>,
    #[arg(long)]                            pub tick_ms: Option<u64>,
    #[arg(long)]                            pub sample_interval_s: Option<f64>,
    /// 0 retries forever
    #[arg(long)]                            pub connect_attempts: Option<u32>,
    #[arg(long)]                            pub connect_backoff_ms: Option<u64>,
    #[arg(long)]                            pub lon_gap_deg: Option<f64>,
    #[arg(long, value_enum)]                pub sink: Option<SinkKind>,
    /// TOML file with any of the keys above (snake_case)
    #[arg(long)]                            pub config: Option<PathBuf>,
}

/// File / environment layer. Every key optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub layout: Option<LayoutKind>,
    pub dcm: Option<bool>,
    pub battery: Option<bool>,
    pub packing: Option<Packing>,
    pub byte_order: Option<ByteOrder>,
    pub history_len: Option<usize>,
    pub battery_len: Option<usize>,
    pub track_len: Option<usize>,
    pub tick_ms: Option<u64>,
    pub sample_interval_s: Option<f64>,
    pub connect_attempts: Option<u32>,
    pub connect_backoff_ms: Option<u64>,
    pub lon_gap_deg: Option<f64>,
    pub sink: Option<SinkKind>,
}

impl FileConfig {
    /// `path` (if any) overlaid by `DATAVIS_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(p) = path {
            builder = builder.add_source(::config::File::from(p));
        }
        builder
            .add_source(::config::Environment::with_prefix("DATAVIS").try_parsing(true))
            .build()
            .and_then(|c| c.try_deserialize())
            .with_context(|| match path {
                Some(p) => format!("loading config from {}", p.display()),
                None => "loading config from environment".to_string(),
            })
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        ::config::Config::builder()
            .add_source(::config::File::from_str(text, ::config::FileFormat::Toml))
            .build()
            .and_then(|c| c.try_deserialize())
            .context("parsing config")
    }
}

impl Cli {
    fn battery_flag(&self) -> Option<bool> {
        if self.no_battery {
            Some(false)
        } else {
            self.battery
        }
    }

    pub fn parse_and_build_config() -> Result<Config> {
        let c = <Cli as Parser>::parse();
        let file = FileConfig::load(c.config.as_deref())?;
        build_config(c, file)
    }
}

pub fn build_config(c: Cli, f: FileConfig) -> Result<Config> {
    let Some(host) = c.host.clone().or(f.host) else {
        bail!("no telemetry host given (positional argument, `host` key or DATAVIS_HOST)");
    };

    let variant = match c.layout.or(f.layout).unwrap_or_default() {
        LayoutKind::Attitude => Variant::Attitude,
        LayoutKind::Orbit => Variant::Orbit {
            dcm: c.dcm.or(f.dcm).unwrap_or(false),
            battery: c.battery_flag().or(f.battery).unwrap_or(true),
        },
    };
    let layout = PacketLayout::new(
        variant,
        c.packing.or(f.packing).unwrap_or_default(),
        c.byte_order.or(f.byte_order).unwrap_or_default(),
    );
    let port = c.port.or(f.port).unwrap_or_else(|| variant.default_port());

    let tick_ms = c.tick_ms.or(f.tick_ms).unwrap_or(datavis_protocol::ACS_STEP_MS);
    if tick_ms == 0 {
        bail!("tick_ms must be > 0");
    }
    let sample_interval_s = c
        .sample_interval_s
        .or(f.sample_interval_s)
        .unwrap_or(tick_ms as f64 / 1000.0);
    if sample_interval_s.is_nan() || sample_interval_s <= 0.0 {
        bail!("sample_interval_s must be > 0, got {sample_interval_s}");
    }

    let history = HistoryConfig {
        window: c.history_len.or(f.history_len).unwrap_or(DEFAULT_WINDOW),
        battery: c.battery_len.or(f.battery_len).unwrap_or(DEFAULT_BATTERY_WINDOW),
        track: c.track_len.or(f.track_len).unwrap_or(DEFAULT_TRACK_WINDOW),
    };
    if history.window == 0 {
        bail!("history_len must be > 0");
    }

    let retry = RetryPolicy {
        max_attempts: NonZeroU32::new(c.connect_attempts.or(f.connect_attempts).unwrap_or(0)),
        backoff: Duration::from_millis(c.connect_backoff_ms.or(f.connect_backoff_ms).unwrap_or(0)),
    };

    Ok(Config {
        host,
        port,
        layout,
        tick: Duration::from_millis(tick_ms),
        retry,
        pipeline: PipelineConfig {
            sample_interval_s,
            lon_gap_deg: c.lon_gap_deg.or(f.lon_gap_deg).unwrap_or(DEFAULT_LON_GAP_DEG),
            history,
            rate_seed: DEFAULT_RATE_SEED,
        },
        sink: c.sink.or(f.sink).unwrap_or_default(),
    })
}

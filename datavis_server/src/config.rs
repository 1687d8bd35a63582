// Command line interface
// simulator configuration: CLI > DATAVIS_SERVER_* environment > --config file
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use datavis_protocol::{ByteOrder, PacketLayout, Packing, Variant};
use serde::Deserialize;

use crate::sim::SimParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    #[default]
    Attitude,
    Orbit,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: SocketAddr,
    pub layout: PacketLayout,
    pub step: Duration,
    pub sim: SimParams,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "datavis_server", about = "Simulated DataVis telemetry server")]
pub struct Cli {
    #[arg(long)]                            pub bind: Option<IpAddr>,
    #[arg(long)]                            pub port: Option<u16>,
    #[arg(long, value_enum)]                pub layout: Option<LayoutKind>,
    #[arg(long, action = ArgAction::Set, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub dcm: Option<bool>,
    #[arg(long, action = ArgAction::Set, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub battery: Option<bool>,
    #[arg(long, conflicts_with = "battery")] pub no_battery: bool,
    #[arg(long)]                            pub packing: Option<Packing>,
    #[arg(long)]                            pub byte_order: Option<ByteOrder>,
    /// control step period (ms)
    #[arg(long)]                            pub step_ms: Option<u64>,
    #[arg(long)]                            pub spin_hz: Option<f64>,
    /// 1-σ sensor noise, 0 disables
    #[arg(long)]                            pub noise: Option<f64>,
    #[arg(long)]                            pub seed: Option<u64>,
    /// orbit seconds simulated per control step
    #[arg(long)]                            pub time_warp: Option<f64>,
    #[arg(long)]                            pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub bind: Option<IpAddr>,
    pub port: Option<u16>,
    pub layout: Option<LayoutKind>,
    pub dcm: Option<bool>,
    pub battery: Option<bool>,
    pub packing: Option<Packing>,
    pub byte_order: Option<ByteOrder>,
    pub step_ms: Option<u64>,
    pub spin_hz: Option<f64>,
    pub noise: Option<f64>,
    pub seed: Option<u64>,
    pub time_warp: Option<f64>,
}

impl FileConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(p) = path {
            builder = builder.add_source(::config::File::from(p));
        }
        builder
            .add_source(::config::Environment::with_prefix("DATAVIS_SERVER").try_parsing(true))
            .build()
            .and_then(|c| c.try_deserialize())
            .context("loading server config")
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
    let ip = c.bind.or(f.bind).unwrap_or(IpAddr::from([0, 0, 0, 0]));
    let port = c.port.or(f.port).unwrap_or_else(|| variant.default_port());

    let step_ms = c.step_ms.or(f.step_ms).unwrap_or(datavis_protocol::ACS_STEP_MS);
    if step_ms == 0 {
        bail!("step_ms must be > 0");
    }
    let defaults = SimParams::default();
    let noise = c.noise.or(f.noise).unwrap_or(defaults.noise);
    if !noise.is_finite() || noise < 0.0 {
        bail!("noise must be >= 0, got {noise}");
    }

    Ok(Config {
        bind: SocketAddr::new(ip, port),
        layout,
        step: Duration::from_millis(step_ms),
        sim: SimParams {
            dt: step_ms as f64 / 1000.0,
            spin_hz: c.spin_hz.or(f.spin_hz).unwrap_or(defaults.spin_hz),
            noise,
            seed: c.seed.or(f.seed).unwrap_or(defaults.seed),
            time_warp: c.time_warp.or(f.time_warp).unwrap_or(defaults.time_warp),
        },
    })
}

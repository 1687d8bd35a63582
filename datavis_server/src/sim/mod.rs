// Synthetic telemetry producers standing in for the flight software.
pub mod attitude;
pub mod orbit;

pub use attitude::AttitudeSim;
pub use orbit::OrbitSim;

use anyhow::{bail, Context, Result};
use datavis_protocol::{TelemetryPacket, Variant};
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// One control step's worth of telemetry per call.
pub trait TelemetrySource: Send {
    fn next_packet(&mut self) -> TelemetryPacket;
    fn variant(&self) -> Variant;
    /// Control steps produced so far.
    fn step(&self) -> u64;
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimParams {
    /// control step (s)
    pub dt: f64,
    /// body spin about +Z (Hz)
    pub spin_hz: f64,
    /// 1-σ gaussian noise added to sensor vectors, 0 disables
    pub noise: f64,
    pub seed: u64,
    /// simulated orbit seconds per control step, orbit feed only
    pub time_warp: f64,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            dt: datavis_protocol::ACS_STEP_MS as f64 / 1000.0,
            spin_hz: 0.5,
            noise: 0.0,
            seed: 7,
            time_warp: 10.0,
        }
    }
}

pub fn build_source(variant: Variant, params: &SimParams) -> Result<Box<dyn TelemetrySource>> {
    let noise = SensorNoise::new(params.noise, params.seed)?;
    Ok(match variant {
        Variant::Attitude => Box::new(AttitudeSim::new(params, noise)),
        Variant::Orbit { dcm, battery } => Box::new(OrbitSim::new(params, noise, dcm, battery)),
    })
}

/// Seeded gaussian perturbation, a no-op at σ = 0.
#[derive(Debug, Clone)]
pub struct SensorNoise {
    rng: StdRng,
    dist: Option<Normal<f64>>,
}

impl SensorNoise {
    pub fn new(sigma: f64, seed: u64) -> Result<Self> {
        if !sigma.is_finite() || sigma < 0.0 {
            bail!("invalid noise sigma {sigma}: must be finite and >= 0");
        }
        let dist = if sigma == 0.0 {
            None
        } else {
            Some(Normal::new(0.0, sigma).with_context(|| format!("invalid noise sigma {sigma}"))?)
        };
        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            dist,
        })
    }

    pub fn none() -> Self {
        Self {
            rng: StdRng::seed_from_u64(0),
            dist: None,
        }
    }

    pub fn apply(&mut self, v: Vector3<f64>) -> Vector3<f64> {
        match &self.dist {
            Some(d) => v + Vector3::from_fn(|_, _| d.sample(&mut self.rng)),
            None => v,
        }
    }
}

pub(crate) fn narrow(v: Vector3<f64>) -> Vector3<f32> {
    v.cast::<f32>()
}

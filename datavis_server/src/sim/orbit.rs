use datavis_protocol::{OrbitPacket, TelemetryPacket, Variant};
use nalgebra::{Matrix3, Rotation3, Vector3};
use std::f64::consts::PI;

use super::{narrow, SensorNoise, SimParams, TelemetrySource};

// ===== Orbit =====
const PERIOD_S: f64 = 5_400.0;
const INCLINATION_DEG: f64 = 51.6;
const ALT_M: f64 = 400_000.0;
const ALT_SWING_M: f64 = 2_000.0;
/// deg/s
const EARTH_RATE: f64 = 360.0 / 86_164.0;
const START_LON_DEG: f64 = 170.0;

// ===== Power =====
const BATT_CAPACITY_MJ: f64 = 20.0 * 3600.0 * 1000.0;
const CHARGE_W: f64 = 6.0;
const LOAD_W: f64 = 3.5;

// ===== Thrusters =====
/// fraction of the orbit spent firing
const BURN_FRACTION: f64 = 0.05;

/// Circular inclined orbit with eclipse-driven battery.
#[derive(Debug, Clone)]
pub struct OrbitSim {
    dt_sim: f64,
    step: u64,
    dcm: bool,
    battery: bool,
    battery_mj: f64,
    noise: SensorNoise,
}

pub fn wrap_lon(deg: f64) -> f64 {
    (deg + 180.0).rem_euclid(360.0) - 180.0
}

impl OrbitSim {
    pub fn new(params: &SimParams, noise: SensorNoise, dcm: bool, battery: bool) -> Self {
        Self {
            dt_sim: params.dt * params.time_warp,
            step: 0,
            dcm,
            battery,
            battery_mj: 0.8 * BATT_CAPACITY_MJ,
            noise,
        }
    }

    /// Argument of latitude (rad) at orbit time `t`.
    fn phase(t: f64) -> f64 {
        2.0 * PI * t / PERIOD_S
    }

    pub fn in_eclipse(t: f64) -> bool {
        Self::phase(t).cos() < -0.6
    }

    pub fn ground_point(t: f64) -> (f64, f64) {
        let u = Self::phase(t);
        let inc = INCLINATION_DEG.to_radians();
        let lat = (inc.sin() * u.sin()).asin().to_degrees();
        let lon = (inc.cos() * u.sin()).atan2(u.cos()).to_degrees();
        (lat, wrap_lon(lon + START_LON_DEG - EARTH_RATE * t))
    }
}

impl TelemetrySource for OrbitSim {
    fn next_packet(&mut self) -> TelemetryPacket {
        let t = self.step as f64 * self.dt_sim;
        let u = Self::phase(t);
        let (lat, lon) = Self::ground_point(t);
        let dark = Self::in_eclipse(t);

        // tilted dipole, roughly: horizontal at the equator, vertical at the poles
        let latr = lat.to_radians();
        let b = Vector3::new(300.0 * latr.cos(), 20.0 * u.sin(), 600.0 * latr.sin());
        let w = Vector3::new(0.0005 * u.cos(), 2.0 * PI / PERIOD_S, 0.0005 * u.sin());
        let s = if dark {
            Vector3::zeros()
        } else {
            Vector3::new(u.cos(), 0.1, u.sin().abs() + 0.2).normalize()
        };
        let e = Vector3::new(0.02 * u.sin(), 0.0, -1.0).normalize();

        let firing = (u / (2.0 * PI)).fract() < BURN_FRACTION;
        let (thrust, thrust_rate) = if firing {
            (Vector3::new(0.0, 0.0, 0.01), Vector3::new(0.0005, 0.0, 0.0))
        } else {
            (Vector3::zeros(), Vector3::zeros())
        };

        let dcm = self.dcm.then(|| {
            let r = Rotation3::from_axis_angle(&Vector3::z_axis(), u);
            let m: Matrix3<f64> = r.into_inner();
            m.cast::<f32>()
        });

        let net_w = if dark { -LOAD_W } else { CHARGE_W - LOAD_W };
        let batt_level = self.battery.then_some(self.battery_mj as f32);
        self.battery_mj = (self.battery_mj + net_w * self.dt_sim * 1000.0).clamp(0.0, BATT_CAPACITY_MJ);

        self.step += 1;
        TelemetryPacket::Orbit(OrbitPacket {
            lat: lat as f32,
            lon: lon as f32,
            alt: (ALT_M + ALT_SWING_M * u.sin()) as f32,
            b: narrow(self.noise.apply(b)),
            w: narrow(self.noise.apply(w)),
            s: narrow(s),
            e: narrow(e),
            dcm,
            t: narrow(thrust),
            td: narrow(thrust_rate),
            batt_level,
        })
    }

    fn variant(&self) -> Variant {
        Variant::Orbit {
            dcm: self.dcm,
            battery: self.battery,
        }
    }

    fn step(&self) -> u64 {
        self.step
    }
}

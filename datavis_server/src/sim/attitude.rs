use datavis_protocol::{AcsMode, AttitudePacket, TelemetryPacket, Variant};
use nalgebra::Vector3;
use std::f64::consts::PI;

use super::{narrow, SensorNoise, SimParams, TelemetrySource};

/// Field in the inertial frame (mG).
const B_INERTIAL: [f64; 3] = [200.0, 0.0, 400.0];
/// Sun direction in the inertial frame.
const S_INERTIAL: [f64; 3] = [0.6, 0.0, 0.8];

/// Mode schedule, in control steps within one cycle.
const DETUMBLE_STEPS: u64 = 100;
const SUNPOINT_END: u64 = 400;
const NIGHT_END: u64 = 540;
const CYCLE_STEPS: u64 = 600;

/// Body spinning about +Z at a fixed rate in a static field.
#[derive(Debug, Clone)]
pub struct AttitudeSim {
    dt: f64,
    omega: f64,
    step: u64,
    noise: SensorNoise,
}

impl AttitudeSim {
    pub fn new(params: &SimParams, noise: SensorNoise) -> Self {
        Self {
            dt: params.dt,
            omega: 2.0 * PI * params.spin_hz,
            step: 0,
            noise,
        }
    }

    pub fn mode_at(step: u64) -> AcsMode {
        match step % CYCLE_STEPS {
            s if s < DETUMBLE_STEPS => AcsMode::Detumble,
            s if s < SUNPOINT_END => AcsMode::Sunpoint,
            s if s < NIGHT_END => AcsMode::Night,
            _ => AcsMode::Ready,
        }
    }

    /// Inertial `v` seen from a body rotated by `phi` about Z.
    fn to_body(v: [f64; 3], phi: f64) -> Vector3<f64> {
        let (s, c) = phi.sin_cos();
        Vector3::new(v[0] * c + v[1] * s, -v[0] * s + v[1] * c, v[2])
    }
}

impl TelemetrySource for AttitudeSim {
    fn next_packet(&mut self) -> TelemetryPacket {
        let step = self.step;
        let t = step as f64 * self.dt;
        let phi = self.omega * t;
        let mode = Self::mode_at(step);

        let b = Self::to_body(B_INERTIAL, phi);
        // d/dt of the body-frame field under rotation about Z
        let (s, c) = phi.sin_cos();
        let [bx, by, _] = B_INERTIAL;
        let bt = Vector3::new(
            self.omega * (-bx * s + by * c),
            self.omega * (-bx * c - by * s),
            0.0,
        );

        // residual tumble during detumble
        let wobble = if mode == AcsMode::Detumble { 0.05 } else { 0.005 };
        let w = Vector3::new(wobble * (0.3 * t).cos(), wobble * (0.3 * t).sin(), self.omega);

        let sun = if mode == AcsMode::Night {
            Vector3::zeros()
        } else {
            Self::to_body(S_INERTIAL, phi)
        };

        self.step += 1;
        TelemetryPacket::Attitude(AttitudePacket {
            mode,
            step,
            b: narrow(self.noise.apply(b)),
            bt: narrow(bt),
            w: narrow(self.noise.apply(w)),
            s: narrow(sun),
        })
    }

    fn variant(&self) -> Variant {
        Variant::Attitude
    }

    fn step(&self) -> u64 {
        self.step
    }
}

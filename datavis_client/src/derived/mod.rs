//! Physical quantities derived from one telemetry packet.
//!
//! Everything here is a pure function of the packet. Policies that need
//! memory across ticks (last-known sun angles, longitude unwrap, grow-only
//! axes) live in [`crate::pipeline`].

pub mod autoscale;
pub mod track;
pub mod vector;

pub use autoscale::{window_range, AxisRange, GrowOnlyRange};
pub use track::{millijoules_to_watt_hours, LongitudeUnwrapper, TrackPoint};
pub use vector::{angle_deg, angle_with_z_deg, normalize, Normalized, Vec3};

use chrono::{DateTime, Utc};
use datavis_protocol::{AcsMode, TelemetryPacket};
use nalgebra::{Matrix3, Vector3};
use serde::Serialize;

use crate::spectral::SpinEstimate;

fn widen(v: &Vector3<f32>) -> Vec3 {
    v.cast::<f64>()
}

// ============================ Angular rate ==================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateState {
    pub unit: Vec3,
    /// |ω| (rad/s)
    pub norm: f64,
    /// ω_z (rad/s)
    pub z: f64,
    /// polar angle from +Z (deg), 0 when |ω| = 0
    pub theta_deg: f64,
    /// azimuth in the XY plane (deg), 0 when |ω| = 0
    pub phi_deg: f64,
}

pub fn decompose_rate(w: &Vec3) -> RateState {
    let n = normalize(w);
    let (theta_deg, phi_deg) = if n.norm > 0.0 {
        (
            (w.z / n.norm).clamp(-1.0, 1.0).acos().to_degrees(),
            w.y.atan2(w.x).to_degrees(),
        )
    } else {
        (0.0, 0.0)
    };
    RateState {
        unit: n.unit,
        norm: n.norm,
        z: w.z,
        theta_deg,
        phi_deg,
    }
}

// ============================== Sun vector ==================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SunAngles {
    /// atan2(Sx, Sz) (deg)
    pub x_deg: f64,
    /// atan2(Sy, Sz) (deg)
    pub y_deg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SunPointing {
    pub vector: Normalized,
    /// nonzero norm and nonzero Z
    pub valid: bool,
    /// +1 when Sz > 0, else -1
    pub hemisphere: i8,
    /// `None` when not valid
    pub angles: Option<SunAngles>,
}

pub fn sun_pointing(s: &Vec3) -> SunPointing {
    let vector = normalize(s);
    let valid = vector.norm > 0.0 && s.z != 0.0;
    let angles = valid.then(|| SunAngles {
        x_deg: s.x.atan2(s.z).to_degrees(),
        y_deg: s.y.atan2(s.z).to_degrees(),
    });
    SunPointing {
        vector,
        valid,
        hemisphere: if s.z > 0.0 { 1 } else { -1 },
        angles,
    }
}

// =============================== Orbit ======================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BodyZAngles {
    pub rate_deg: Option<f64>,
    pub sun_deg: Option<f64>,
    pub earth_deg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrbitKinematics {
    pub lat: f64,
    pub lon: f64,
    pub alt_km: f64,
    pub earth: Normalized,
    pub thrust: Normalized,
    /// unit(Td) scaled by |Td|/|T| for drawing next to T
    pub thrust_rate_display: Vec3,
    /// |Td| (N-m)
    pub thrust_rate_norm: f64,
    pub body_z: BodyZAngles,
    pub dcm: Option<Matrix3<f64>>,
    pub battery_wh: Option<f64>,
}

pub fn thrust_rate_display(t: &Vec3, td: &Vec3) -> (Vec3, f64) {
    let t = normalize(t);
    let td = normalize(td);
    let scaled = if t.norm > 0.0 {
        td.unit * (td.norm / t.norm)
    } else {
        td.unit
    };
    (scaled, td.norm)
}

// ============================= Kinematics ===================================

/// Per-packet derived values with no cross-tick memory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kinematics {
    pub field: Normalized,
    /// dB/dt, attitude feed only
    pub field_rate: Option<Vec3>,
    pub rate: RateState,
    /// angle between ω and B (deg), `None` if either is zero
    pub rate_field_angle_deg: Option<f64>,
    pub sun: SunPointing,
    pub orbit: Option<OrbitKinematics>,
}

pub fn compute(packet: &TelemetryPacket) -> Kinematics {
    let b = widen(&packet.field());
    let w = widen(&packet.rate());
    let s = widen(&packet.sun());
    let rate = decompose_rate(&w);
    let sun = sun_pointing(&s);

    let (field_rate, orbit) = match packet {
        TelemetryPacket::Attitude(a) => (Some(widen(&a.bt)), None),
        TelemetryPacket::Orbit(o) => {
            let e = widen(&o.e);
            let (thrust_rate_display, thrust_rate_norm) =
                thrust_rate_display(&widen(&o.t), &widen(&o.td));
            let orbit = OrbitKinematics {
                lat: f64::from(o.lat),
                lon: f64::from(o.lon),
                alt_km: f64::from(o.alt) / 1000.0,
                earth: normalize(&e),
                thrust: normalize(&widen(&o.t)),
                thrust_rate_display,
                thrust_rate_norm,
                body_z: BodyZAngles {
                    rate_deg: angle_with_z_deg(&w),
                    sun_deg: angle_with_z_deg(&s),
                    earth_deg: angle_with_z_deg(&e),
                },
                dcm: o.dcm.map(|m| m.cast::<f64>()),
                battery_wh: o.batt_level.map(|mj| millijoules_to_watt_hours(f64::from(mj))),
            };
            (None, Some(orbit))
        }
    };

    Kinematics {
        field: normalize(&b),
        field_rate,
        rate,
        rate_field_angle_deg: angle_deg(&w, &b),
        sun,
        orbit,
    }
}

// ============================ Derived state =================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DisplayRanges {
    /// ω axis, grow-only
    pub rate: Option<AxisRange>,
    /// dB/dt axis, grow-only (attitude feed)
    pub field_rate: Option<AxisRange>,
    /// |FFT(B)| axis, grow-only
    pub spectrum: Option<AxisRange>,
}

/// Everything a render sink needs for one frame. Built fresh every tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedState {
    pub timestamp: DateTime<Utc>,
    /// ingested packets before this one
    pub tick: u64,
    /// time span of the history windows (s)
    pub time_window_s: (f64, f64),
    pub mode: Option<AcsMode>,
    pub step: Option<u64>,
    #[serde(flatten)]
    pub kinematics: Kinematics,
    /// last valid sun angles, held while the sun vector is invalid
    pub sun_angles: SunAngles,
    pub track: Option<TrackPoint>,
    pub spin: SpinEstimate,
    pub ranges: DisplayRanges,
}

impl DerivedState {
    pub fn battery_wh(&self) -> Option<f64> {
        self.kinematics.orbit.as_ref().and_then(|o| o.battery_wh)
    }
}

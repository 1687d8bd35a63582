use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::layout::Variant;

/// ACS state machine mode as reported in the attitude feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcsMode {
    Detumble,
    Sunpoint,
    Night,
    Ready,
    /// Byte outside the known range; kept as-is.
    Unknown(u8),
}

impl AcsMode {
    pub fn label(&self) -> &'static str {
        match self {
            AcsMode::Detumble => "Detumble",
            AcsMode::Sunpoint => "Sunpoint",
            AcsMode::Night => "Night",
            AcsMode::Ready => "Ready",
            AcsMode::Unknown(_) => "Unknown",
        }
    }
}

impl From<u8> for AcsMode {
    fn from(v: u8) -> Self {
        match v {
            0 => AcsMode::Detumble,
            1 => AcsMode::Sunpoint,
            2 => AcsMode::Night,
            3 => AcsMode::Ready,
            other => AcsMode::Unknown(other),
        }
    }
}

impl From<AcsMode> for u8 {
    fn from(m: AcsMode) -> Self {
        match m {
            AcsMode::Detumble => 0,
            AcsMode::Sunpoint => 1,
            AcsMode::Night => 2,
            AcsMode::Ready => 3,
            AcsMode::Unknown(v) => v,
        }
    }
}

impl fmt::Display for AcsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcsMode::Unknown(v) => write!(f, "Unknown({v})"),
            known => f.write_str(known.label()),
        }
    }
}

// ======================== Telemetry records =================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttitudePacket {
    pub mode: AcsMode,
    pub step: u64,
    /// magnetic field (mG)
    pub b: Vector3<f32>,
    /// dB/dt (mG/s)
    pub bt: Vector3<f32>,
    /// body rate (rad/s)
    pub w: Vector3<f32>,
    /// sun vector
    pub s: Vector3<f32>,
}

impl Default for AttitudePacket {
    fn default() -> Self {
        Self {
            mode: AcsMode::Detumble,
            step: 0,
            b: Vector3::zeros(),
            bt: Vector3::zeros(),
            w: Vector3::zeros(),
            s: Vector3::zeros(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitPacket {
    /// geodetic latitude (deg)
    pub lat: f32,
    /// geodetic longitude (deg)
    pub lon: f32,
    /// altitude (m)
    pub alt: f32,
    pub b: Vector3<f32>,
    pub w: Vector3<f32>,
    pub s: Vector3<f32>,
    /// Earth-pointing vector
    pub e: Vector3<f32>,
    pub dcm: Option<Matrix3<f32>>,
    /// thruster vector
    pub t: Vector3<f32>,
    /// thruster-rate vector
    pub td: Vector3<f32>,
    /// stored battery energy (mJ)
    pub batt_level: Option<f32>,
}

impl Default for OrbitPacket {
    fn default() -> Self {
        Self {
            lat: 0.0,
            lon: 0.0,
            alt: 0.0,
            b: Vector3::zeros(),
            w: Vector3::zeros(),
            s: Vector3::zeros(),
            e: Vector3::zeros(),
            dcm: None,
            t: Vector3::zeros(),
            td: Vector3::zeros(),
            batt_level: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum TelemetryPacket {
    Attitude(AttitudePacket),
    Orbit(OrbitPacket),
}

impl TelemetryPacket {
    /// Layout variant this record would be sent with.
    pub fn variant(&self) -> Variant {
        match self {
            TelemetryPacket::Attitude(_) => Variant::Attitude,
            TelemetryPacket::Orbit(o) => Variant::Orbit {
                dcm: o.dcm.is_some(),
                battery: o.batt_level.is_some(),
            },
        }
    }

    pub fn field(&self) -> Vector3<f32> {
        match self {
            TelemetryPacket::Attitude(a) => a.b,
            TelemetryPacket::Orbit(o) => o.b,
        }
    }

    pub fn rate(&self) -> Vector3<f32> {
        match self {
            TelemetryPacket::Attitude(a) => a.w,
            TelemetryPacket::Orbit(o) => o.w,
        }
    }

    pub fn sun(&self) -> Vector3<f32> {
        match self {
            TelemetryPacket::Attitude(a) => a.s,
            TelemetryPacket::Orbit(o) => o.s,
        }
    }

    pub fn mode(&self) -> Option<AcsMode> {
        match self {
            TelemetryPacket::Attitude(a) => Some(a.mode),
            TelemetryPacket::Orbit(_) => None,
        }
    }

    pub fn step(&self) -> Option<u64> {
        match self {
            TelemetryPacket::Attitude(a) => Some(a.step),
            TelemetryPacket::Orbit(_) => None,
        }
    }
}

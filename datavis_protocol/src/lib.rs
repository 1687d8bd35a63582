// lib.rs: DataVis wire protocol shared by the flight-side server and ground clients

pub mod codec;
pub mod layout;
pub mod packet;

pub use codec::{decode, encode, DecodeError, EncodeError};
pub use layout::{ByteOrder, Field, PacketLayout, Packing, Primitive, Slot, Variant};
pub use packet::{AcsMode, AttitudePacket, OrbitPacket, TelemetryPacket};

// =============================== Common =====================================

/// Well-known port of the attitude (ACS) telemetry feed.
pub const ATTITUDE_PORT: u16 = 12376;
/// Well-known port of the orbit/geodetic telemetry feed.
pub const ORBIT_PORT: u16 = 12380;

/// Nominal ACS control step; one packet is published per step.
pub const ACS_STEP_MS: u64 = 100;

impl Variant {
    /// Port a client connects to when none is configured.
    pub fn default_port(&self) -> u16 {
        match self {
            Variant::Attitude => ATTITUDE_PORT,
            Variant::Orbit { .. } => ORBIT_PORT,
        }
    }
}

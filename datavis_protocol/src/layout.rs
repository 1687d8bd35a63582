//! Fixed byte layouts of the DataVis packet.
//!
//! The producer sends a plain C struct with no framing, so both ends agree on
//! field order, packing and byte order up front. A [`PacketLayout`] is built
//! once from configuration and then drives both decoding and encoding.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================== Enums ======================================

/// How field offsets are derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Packing {
    /// C struct rules: each field aligned to its own size, total size rounded
    /// up to the widest alignment. This is what the flight software sends.
    #[default]
    Native,
    /// No padding between fields.
    Packed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

/// Which telemetry record the packet carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Variant {
    /// ACS feed: mode, step, B, dB/dt, ω, sun vector.
    Attitude,
    /// Geodetic feed: position, B, ω, sun, Earth, thrusters, optional DCM and battery.
    Orbit { dcm: bool, battery: bool },
}

/// Scalar primitive carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    U8,
    U64,
    F32,
}

impl Primitive {
    pub const fn size(self) -> usize {
        match self {
            Primitive::U8 => 1,
            Primitive::U64 => 8,
            Primitive::F32 => 4,
        }
    }
}

/// A named group of primitives at one offset in the packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Mode,
    Step,
    /// lat, lon, alt
    Position,
    B,
    Bt,
    W,
    S,
    E,
    /// 3×3 direction cosine matrix, row-major
    Dcm,
    T,
    Td,
    BattLevel,
}

impl Field {
    pub const fn primitive(self) -> Primitive {
        match self {
            Field::Mode => Primitive::U8,
            Field::Step => Primitive::U64,
            _ => Primitive::F32,
        }
    }

    /// Number of primitives in the field.
    pub const fn count(self) -> usize {
        match self {
            Field::Mode | Field::Step | Field::BattLevel => 1,
            Field::Dcm => 9,
            _ => 3,
        }
    }

    pub const fn width(self) -> usize {
        self.primitive().size() * self.count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub field: Field,
    pub offset: usize,
}

// ============================== Layout ======================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketLayout {
    variant: Variant,
    packing: Packing,
    byte_order: ByteOrder,
    slots: Vec<Slot>,
    size: usize,
}

impl PacketLayout {
    pub fn new(variant: Variant, packing: Packing, byte_order: ByteOrder) -> Self {
        let mut slots = Vec::new();
        let mut cursor = 0usize;
        let mut widest = 1usize;

        for field in field_order(variant) {
            let align = match packing {
                Packing::Native => field.primitive().size(),
                Packing::Packed => 1,
            };
            widest = widest.max(align);
            let offset = cursor.next_multiple_of(align);
            slots.push(Slot { field, offset });
            cursor = offset + field.width();
        }

        let size = match packing {
            Packing::Native => cursor.next_multiple_of(widest),
            Packing::Packed => cursor,
        };

        Self {
            variant,
            packing,
            byte_order,
            slots,
            size,
        }
    }

    /// Attitude feed as the flight computer sends it (native, little-endian).
    pub fn attitude() -> Self {
        Self::new(Variant::Attitude, Packing::Native, ByteOrder::Little)
    }

    pub fn orbit(dcm: bool, battery: bool) -> Self {
        Self::new(
            Variant::Orbit { dcm, battery },
            Packing::Native,
            ByteOrder::Little,
        )
    }

    /// Exact byte length of one packet.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn packing(&self) -> Packing {
        self.packing
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Fields in wire order.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn offset_of(&self, field: Field) -> Option<usize> {
        self.slots
            .iter()
            .find(|s| s.field == field)
            .map(|s| s.offset)
    }
}

fn field_order(variant: Variant) -> Vec<Field> {
    match variant {
        Variant::Attitude => vec![
            Field::Mode,
            Field::Step,
            Field::B,
            Field::Bt,
            Field::W,
            Field::S,
        ],
        Variant::Orbit { dcm, battery } => {
            let mut v = vec![Field::Position, Field::B, Field::W, Field::S, Field::E];
            if dcm {
                v.push(Field::Dcm);
            }
            v.extend([Field::T, Field::Td]);
            if battery {
                v.push(Field::BattLevel);
            }
            v
        }
    }
}

// ============================ Text forms ====================================

impl FromStr for Packing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "native" => Ok(Packing::Native),
            "packed" => Ok(Packing::Packed),
            other => Err(format!("unknown packing `{other}` (expected native|packed)")),
        }
    }
}

impl FromStr for ByteOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "little" | "le" => Ok(ByteOrder::Little),
            "big" | "be" => Ok(ByteOrder::Big),
            other => Err(format!("unknown byte order `{other}` (expected little|big)")),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Attitude => f.write_str("attitude"),
            Variant::Orbit { dcm, battery } => {
                write!(f, "orbit(dcm={dcm}, battery={battery})")
            }
        }
    }
}

// ================================ Tests =====================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attitude_native_matches_c_struct() {
        let l = PacketLayout::attitude();
        assert_eq!(l.size(), 64);
        assert_eq!(l.offset_of(Field::Mode), Some(0));
        // u64 step is pushed to the next 8-byte boundary
        assert_eq!(l.offset_of(Field::Step), Some(8));
        assert_eq!(l.offset_of(Field::B), Some(16));
        assert_eq!(l.offset_of(Field::S), Some(52));
    }

    #[test]
    fn attitude_packed_has_no_padding() {
        let l = PacketLayout::new(Variant::Attitude, Packing::Packed, ByteOrder::Little);
        assert_eq!(l.size(), 57);
        assert_eq!(l.offset_of(Field::Step), Some(1));
        assert_eq!(l.offset_of(Field::B), Some(9));
    }

    #[test]
    fn orbit_sizes() {
        assert_eq!(PacketLayout::orbit(false, true).size(), 88);
        assert_eq!(PacketLayout::orbit(true, true).size(), 124);
        assert_eq!(PacketLayout::orbit(false, false).size(), 84);

        let l = PacketLayout::orbit(true, true);
        assert_eq!(l.offset_of(Field::Dcm), Some(60));
        assert_eq!(l.offset_of(Field::T), Some(96));
        assert_eq!(l.offset_of(Field::BattLevel), Some(120));
        assert_eq!(PacketLayout::orbit(false, false).offset_of(Field::BattLevel), None);
    }

    #[test]
    fn text_forms_parse() {
        assert_eq!("Packed".parse::<Packing>(), Ok(Packing::Packed));
        assert_eq!("be".parse::<ByteOrder>(), Ok(ByteOrder::Big));
        assert!("middle".parse::<ByteOrder>().is_err());
    }

    #[test]
    fn default_ports() {
        assert_eq!(Variant::Attitude.default_port(), crate::ATTITUDE_PORT);
        assert_eq!(
            Variant::Orbit { dcm: true, battery: false }.default_port(),
            crate::ORBIT_PORT
        );
    }
}

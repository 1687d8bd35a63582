//! Byte-offset reinterpretation of a packet buffer, and its inverse.
//!
//! Decoding never validates physical ranges; a garbage field is a link or
//! sensor problem and is passed through untouched.

use nalgebra::{Matrix3, Vector3};
use thiserror::Error;

use crate::layout::{ByteOrder, Field, PacketLayout, Variant};
use crate::packet::{AcsMode, AttitudePacket, OrbitPacket, TelemetryPacket};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("size mismatch: layout expects {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("layout mismatch: layout is {layout}, packet is {packet}")]
    LayoutMismatch { layout: Variant, packet: Variant },
}

pub fn decode(buf: &[u8], layout: &PacketLayout) -> Result<TelemetryPacket, DecodeError> {
    if buf.len() != layout.size() {
        return Err(DecodeError::SizeMismatch {
            expected: layout.size(),
            actual: buf.len(),
        });
    }
    let r = Reader {
        buf,
        order: layout.byte_order(),
    };

    let packet = match layout.variant() {
        Variant::Attitude => {
            let mut p = AttitudePacket::default();
            for slot in layout.slots() {
                let at = slot.offset;
                match slot.field {
                    Field::Mode => p.mode = AcsMode::from(r.u8(at)),
                    Field::Step => p.step = r.u64(at),
                    Field::B => p.b = r.vec3(at),
                    Field::Bt => p.bt = r.vec3(at),
                    Field::W => p.w = r.vec3(at),
                    Field::S => p.s = r.vec3(at),
                    _ => {}
                }
            }
            TelemetryPacket::Attitude(p)
        }
        Variant::Orbit { .. } => {
            let mut p = OrbitPacket::default();
            for slot in layout.slots() {
                let at = slot.offset;
                match slot.field {
                    Field::Position => {
                        let pos = r.vec3(at);
                        p.lat = pos.x;
                        p.lon = pos.y;
                        p.alt = pos.z;
                    }
                    Field::B => p.b = r.vec3(at),
                    Field::W => p.w = r.vec3(at),
                    Field::S => p.s = r.vec3(at),
                    Field::E => p.e = r.vec3(at),
                    Field::Dcm => p.dcm = Some(r.mat3(at)),
                    Field::T => p.t = r.vec3(at),
                    Field::Td => p.td = r.vec3(at),
                    Field::BattLevel => p.batt_level = Some(r.f32(at)),
                    _ => {}
                }
            }
            TelemetryPacket::Orbit(p)
        }
    };
    Ok(packet)
}

/// Serialize a record into exactly `layout.size()` bytes; padding is zeroed.
pub fn encode(packet: &TelemetryPacket, layout: &PacketLayout) -> Result<Vec<u8>, EncodeError> {
    if packet.variant() != layout.variant() {
        return Err(EncodeError::LayoutMismatch {
            layout: layout.variant(),
            packet: packet.variant(),
        });
    }
    let mut w = Writer {
        buf: vec![0u8; layout.size()],
        order: layout.byte_order(),
    };

    match packet {
        TelemetryPacket::Attitude(p) => {
            for slot in layout.slots() {
                let at = slot.offset;
                match slot.field {
                    Field::Mode => w.put(at, &[u8::from(p.mode)]),
                    Field::Step => w.u64(at, p.step),
                    Field::B => w.vec3(at, &p.b),
                    Field::Bt => w.vec3(at, &p.bt),
                    Field::W => w.vec3(at, &p.w),
                    Field::S => w.vec3(at, &p.s),
                    _ => {}
                }
            }
        }
        TelemetryPacket::Orbit(p) => {
            for slot in layout.slots() {
                let at = slot.offset;
                match slot.field {
                    Field::Position => w.vec3(at, &Vector3::new(p.lat, p.lon, p.alt)),
                    Field::B => w.vec3(at, &p.b),
                    Field::W => w.vec3(at, &p.w),
                    Field::S => w.vec3(at, &p.s),
                    Field::E => w.vec3(at, &p.e),
                    Field::Dcm => {
                        if let Some(m) = &p.dcm {
                            w.mat3(at, m);
                        }
                    }
                    Field::T => w.vec3(at, &p.t),
                    Field::Td => w.vec3(at, &p.td),
                    Field::BattLevel => {
                        if let Some(v) = p.batt_level {
                            w.f32(at, v);
                        }
                    }
                    _ => {}
                }
            }
        }
    }
    Ok(w.buf)
}

// ----------------------------------------------------------------------------
// Offsets handed to Reader/Writer come from the layout, and the buffer length
// equals the layout size, so every slice below is in bounds.

struct Reader<'a> {
    buf: &'a [u8],
    order: ByteOrder,
}

impl Reader<'_> {
    fn bytes<const N: usize>(&self, at: usize) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[at..at + N]);
        out
    }

    fn u8(&self, at: usize) -> u8 {
        self.buf[at]
    }

    fn u64(&self, at: usize) -> u64 {
        let b = self.bytes::<8>(at);
        match self.order {
            ByteOrder::Little => u64::from_le_bytes(b),
            ByteOrder::Big => u64::from_be_bytes(b),
        }
    }

    fn f32(&self, at: usize) -> f32 {
        let b = self.bytes::<4>(at);
        match self.order {
            ByteOrder::Little => f32::from_le_bytes(b),
            ByteOrder::Big => f32::from_be_bytes(b),
        }
    }

    fn vec3(&self, at: usize) -> Vector3<f32> {
        Vector3::new(self.f32(at), self.f32(at + 4), self.f32(at + 8))
    }

    fn mat3(&self, at: usize) -> Matrix3<f32> {
        let mut rows = [0f32; 9];
        for (i, v) in rows.iter_mut().enumerate() {
            *v = self.f32(at + 4 * i);
        }
        Matrix3::from_row_slice(&rows)
    }
}

struct Writer {
    buf: Vec<u8>,
    order: ByteOrder,
}

impl Writer {
    fn put(&mut self, at: usize, bytes: &[u8]) {
        self.buf[at..at + bytes.len()].copy_from_slice(bytes);
    }

    fn u64(&mut self, at: usize, v: u64) {
        let b = match self.order {
            ByteOrder::Little => v.to_le_bytes(),
            ByteOrder::Big => v.to_be_bytes(),
        };
        self.put(at, &b);
    }

    fn f32(&mut self, at: usize, v: f32) {
        let b = match self.order {
            ByteOrder::Little => v.to_le_bytes(),
            ByteOrder::Big => v.to_be_bytes(),
        };
        self.put(at, &b);
    }

    fn vec3(&mut self, at: usize, v: &Vector3<f32>) {
        for i in 0..3 {
            self.f32(at + 4 * i, v[i]);
        }
    }

    fn mat3(&mut self, at: usize, m: &Matrix3<f32>) {
        for r in 0..3 {
            for c in 0..3 {
                self.f32(at + 4 * (3 * r + c), m[(r, c)]);
            }
        }
    }
}

// ================================ Tests =====================================

// Rolling per-channel history windows
pub mod ring;

pub use ring::HistoryBuffer;

use serde::{Deserialize, Serialize};

/// Default attitude window; a power of two keeps FFT bins evenly spaced.
pub const DEFAULT_WINDOW: usize = 512;
/// Ten minutes of battery samples at 10 Hz.
pub const DEFAULT_BATTERY_WINDOW: usize = 6000;
/// Ground-track trail length.
pub const DEFAULT_TRACK_WINDOW: usize = 90 * 3600;

/// Every scalar series the pipeline keeps a window of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    FieldX,
    FieldY,
    FieldZ,
    FieldRateX,
    FieldRateY,
    FieldRateZ,
    RateX,
    RateY,
    RateZ,
    /// polar angle of ω (deg)
    Theta,
    /// azimuth of ω (deg)
    Phi,
    /// angle between ω and B (deg)
    RateFieldAngle,
    SunX,
    SunY,
    SunZ,
    SunAngleX,
    SunAngleY,
    Latitude,
    /// NaN marks a date-line gap
    Longitude,
    /// W-h
    Battery,
}

impl Channel {
    pub const ALL: [Channel; 20] = [
        Channel::FieldX,
        Channel::FieldY,
        Channel::FieldZ,
        Channel::FieldRateX,
        Channel::FieldRateY,
        Channel::FieldRateZ,
        Channel::RateX,
        Channel::RateY,
        Channel::RateZ,
        Channel::Theta,
        Channel::Phi,
        Channel::RateFieldAngle,
        Channel::SunX,
        Channel::SunY,
        Channel::SunZ,
        Channel::SunAngleX,
        Channel::SunAngleY,
        Channel::Latitude,
        Channel::Longitude,
        Channel::Battery,
    ];

    pub const FIELD: [Channel; 3] = [Channel::FieldX, Channel::FieldY, Channel::FieldZ];
    pub const FIELD_RATE: [Channel; 3] =
        [Channel::FieldRateX, Channel::FieldRateY, Channel::FieldRateZ];
    pub const RATE: [Channel; 3] = [Channel::RateX, Channel::RateY, Channel::RateZ];
    pub const SUN: [Channel; 3] = [Channel::SunX, Channel::SunY, Channel::SunZ];

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    pub window: usize,
    pub battery: usize,
    pub track: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            battery: DEFAULT_BATTERY_WINDOW,
            track: DEFAULT_TRACK_WINDOW,
        }
    }
}

impl HistoryConfig {
    pub fn capacity_of(&self, ch: Channel) -> usize {
        match ch {
            Channel::Battery => self.battery,
            Channel::Latitude | Channel::Longitude => self.track,
            _ => self.window,
        }
    }

    /// Seed value. The ground track starts as NaN gaps so nothing is drawn
    /// at (0, 0) before the first fix.
    pub fn fill_of(&self, ch: Channel) -> f64 {
        match ch {
            Channel::Latitude | Channel::Longitude => f64::NAN,
            _ => 0.0,
        }
    }
}

/// One [`HistoryBuffer`] per [`Channel`], owned by the pipeline for the
/// process lifetime. Render sinks only ever see `&HistoryStore`.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    buffers: Vec<HistoryBuffer>,
}

impl HistoryStore {
    pub fn new(cfg: &HistoryConfig) -> Self {
        let buffers = Channel::ALL
            .iter()
            .map(|&ch| HistoryBuffer::filled(cfg.capacity_of(ch), cfg.fill_of(ch)))
            .collect();
        Self { buffers }
    }

    pub fn append(&mut self, ch: Channel, value: f64) {
        self.buffers[ch.index()].append(value);
    }

    /// Append x, y, z to three channels at once.
    pub fn append3(&mut self, chans: [Channel; 3], v: [f64; 3]) {
        for (ch, x) in chans.into_iter().zip(v) {
            self.append(ch, x);
        }
    }

    pub fn buffer(&self, ch: Channel) -> &HistoryBuffer {
        &self.buffers[ch.index()]
    }

    /// Window of `ch`, oldest → newest.
    pub fn sequence(&self, ch: Channel) -> impl ExactSizeIterator<Item = f64> + '_ {
        self.buffer(ch).iter()
    }

    pub fn latest(&self, ch: Channel) -> Option<f64> {
        self.buffer(ch).latest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_table_is_in_discriminant_order() {
        for (i, ch) in Channel::ALL.iter().enumerate() {
            assert_eq!(ch.index(), i);
        }
    }

    #[test]
    fn capacities_follow_channel_group() {
        let cfg = HistoryConfig {
            window: 8,
            battery: 5,
            track: 3,
        };
        let store = HistoryStore::new(&cfg);
        assert_eq!(store.buffer(Channel::FieldX).len(), 8);
        assert_eq!(store.buffer(Channel::Battery).len(), 5);
        assert_eq!(store.buffer(Channel::Longitude).len(), 3);
    }

    #[test]
    fn track_starts_empty_of_fixes() {
        let mut store = HistoryStore::new(&HistoryConfig {
            window: 4,
            battery: 2,
            track: 3,
        });
        assert!(store.sequence(Channel::Latitude).all(f64::is_nan));
        assert!(store.sequence(Channel::Longitude).all(f64::is_nan));
        assert!(store.sequence(Channel::Battery).all(|v| v == 0.0));
        assert!(store.sequence(Channel::FieldX).all(|v| v == 0.0));
        assert_eq!(store.buffer(Channel::Latitude).min(), None);

        store.append(Channel::Latitude, -5.0);
        assert_eq!(store.buffer(Channel::Latitude).min(), Some(-5.0));
        assert_eq!(store.sequence(Channel::Latitude).filter(|v| v.is_nan()).count(), 2);
    }

    #[test]
    fn append3_fans_out() {
        let mut store = HistoryStore::new(&HistoryConfig {
            window: 4,
            battery: 1,
            track: 1,
        });
        store.append3(Channel::RATE, [0.1, 0.2, 0.3]);
        assert_eq!(store.latest(Channel::RateX), Some(0.1));
        assert_eq!(store.latest(Channel::RateZ), Some(0.3));
        assert_eq!(store.sequence(Channel::RateY).collect::<Vec<_>>(), vec![0.0, 0.0, 0.0, 0.2]);
    }
}

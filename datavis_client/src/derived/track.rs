// ground track + power conversions
use serde::Serialize;

/// Consecutive longitudes further apart than this are treated as a
/// ±180° wrap, not real motion.
pub const DEFAULT_LON_GAP_DEG: f64 = 352.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
    /// `lon`, or NaN when this sample starts a new segment
    pub plotted_lon: f64,
    pub gap: bool,
    pub north_south: char,
    pub east_west: char,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LongitudeUnwrapper {
    prev: Option<f64>,
    threshold_deg: f64,
}

impl Default for LongitudeUnwrapper {
    fn default() -> Self {
        Self::new(DEFAULT_LON_GAP_DEG)
    }
}

impl LongitudeUnwrapper {
    pub fn new(threshold_deg: f64) -> Self {
        Self {
            prev: None,
            threshold_deg,
        }
    }

    pub fn push(&mut self, lat: f64, lon: f64) -> TrackPoint {
        let gap = self
            .prev
            .is_some_and(|p| (lon - p).abs() > self.threshold_deg);
        self.prev = Some(lon);
        TrackPoint {
            lat,
            lon,
            plotted_lon: if gap { f64::NAN } else { lon },
            gap,
            north_south: if lat >= 0.0 { 'N' } else { 'S' },
            east_west: if lon >= 0.0 { 'E' } else { 'W' },
        }
    }
}

pub fn millijoules_to_watt_hours(mj: f64) -> f64 {
    mj * 1e-3 / 3600.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_line_crossing_emits_gap() {
        let mut u = LongitudeUnwrapper::default();
        assert!(!u.push(0.0, 179.0).gap);
        let p = u.push(0.0, -179.5);
        assert!(p.gap);
        assert!(p.plotted_lon.is_nan());
        assert_eq!(p.lon, -179.5);
    }

    #[test]
    fn ordinary_motion_is_kept() {
        let mut u = LongitudeUnwrapper::default();
        u.push(0.0, 10.0);
        let p = u.push(-1.0, 15.0);
        assert!(!p.gap);
        assert_eq!(p.plotted_lon, 15.0);
        assert_eq!((p.north_south, p.east_west), ('S', 'E'));
    }

    #[test]
    fn first_sample_never_gaps() {
        let mut u = LongitudeUnwrapper::new(1.0);
        assert!(!u.push(0.0, -170.0).gap);
    }

    #[test]
    fn battery_conversion() {
        assert_eq!(millijoules_to_watt_hours(3_600_000.0), 1.0);
        assert_eq!(millijoules_to_watt_hours(0.0), 0.0);
    }
}

//! Per-tick state machine: one decoded packet in, one [`DerivedState`] out.
//!
//! All cross-tick memory lives in [`PipelineState`], owned by the run loop
//! and handed to [`PipelineState::ingest`] by `&mut`.

use chrono::{DateTime, Utc};
use datavis_protocol::TelemetryPacket;
use tracing::debug;

use crate::derived::{
    self, window_range, AxisRange, DerivedState, DisplayRanges, GrowOnlyRange, LongitudeUnwrapper,
    SunAngles, Vec3,
};
use crate::history::{Channel, HistoryConfig, HistoryStore};
use crate::spectral::{SpectralEstimator, SpinEstimate, Spectrum};

/// Initial angular-rate axis (rad/s) before any data widens it.
pub const DEFAULT_RATE_SEED: AxisRange = AxisRange::new(-0.25, 0.25);

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Δt between samples (s)
    pub sample_interval_s: f64,
    pub lon_gap_deg: f64,
    pub history: HistoryConfig,
    pub rate_seed: AxisRange,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_interval_s: datavis_protocol::ACS_STEP_MS as f64 / 1000.0,
            lon_gap_deg: derived::track::DEFAULT_LON_GAP_DEG,
            history: HistoryConfig::default(),
            rate_seed: DEFAULT_RATE_SEED,
        }
    }
}

#[derive(Debug)]
pub struct PipelineState {
    dt: f64,
    history: HistoryStore,
    spectral: SpectralEstimator,
    rate_range: GrowOnlyRange,
    field_rate_range: GrowOnlyRange,
    spectrum_range: GrowOnlyRange,
    unwrapper: LongitudeUnwrapper,
    last_sun: SunAngles,
    last_rate_field_angle: f64,
    step_origin: Option<u64>,
    tick: u64,
    spectra: [Spectrum; 3],
}

impl PipelineState {
    pub fn new(cfg: &PipelineConfig) -> Self {
        Self {
            dt: cfg.sample_interval_s,
            history: HistoryStore::new(&cfg.history),
            spectral: SpectralEstimator::new(cfg.history.window),
            rate_range: GrowOnlyRange::seeded(cfg.rate_seed),
            field_rate_range: GrowOnlyRange::default(),
            spectrum_range: GrowOnlyRange::default(),
            unwrapper: LongitudeUnwrapper::new(cfg.lon_gap_deg),
            last_sun: SunAngles::default(),
            last_rate_field_angle: 0.0,
            step_origin: None,
            tick: 0,
            spectra: Default::default(),
        }
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Centered |FFT| of the B_x, B_y, B_z windows from the last ingest.
    pub fn spectra(&self) -> &[Spectrum; 3] {
        &self.spectra
    }

    /// Packets ingested so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn ingest(&mut self, packet: &TelemetryPacket, now: DateTime<Utc>) -> DerivedState {
        let k = derived::compute(packet);
        let w = packet.rate().cast::<f64>();

        // ===== raw vectors =====
        self.history
            .append3(Channel::FIELD, xyz(&packet.field().cast::<f64>()));
        if let Some(bt) = &k.field_rate {
            self.history.append3(Channel::FIELD_RATE, xyz(bt));
        }
        self.history.append3(Channel::RATE, xyz(&w));
        self.history
            .append3(Channel::SUN, xyz(&packet.sun().cast::<f64>()));

        // ===== angles, held at last-known value when undefined =====
        self.history.append(Channel::Theta, k.rate.theta_deg);
        self.history.append(Channel::Phi, k.rate.phi_deg);
        if let Some(a) = k.rate_field_angle_deg {
            self.last_rate_field_angle = a;
        }
        self.history
            .append(Channel::RateFieldAngle, self.last_rate_field_angle);

        if let Some(a) = k.sun.angles {
            self.last_sun = a;
        }
        self.history.append(Channel::SunAngleX, self.last_sun.x_deg);
        self.history.append(Channel::SunAngleY, self.last_sun.y_deg);

        // ===== orbit =====
        let track = k.orbit.as_ref().map(|o| {
            let p = self.unwrapper.push(o.lat, o.lon);
            self.history.append(Channel::Latitude, p.lat);
            self.history.append(Channel::Longitude, p.plotted_lon);
            if let Some(wh) = o.battery_wh {
                self.history.append(Channel::Battery, wh);
            }
            p
        });

        // ===== spectra =====
        for (slot, ch) in self.spectra.iter_mut().zip(Channel::FIELD) {
            *slot = self.spectral.spectrum(self.history.sequence(ch), self.dt);
        }
        let spin = SpinEstimate::from_spectra(&self.spectra, self.dt);

        // ===== autoscale =====
        let rate = self
            .rate_range
            .widen(window_range(flatten(&self.history, Channel::RATE)));
        let field_rate = if k.field_rate.is_some() {
            self.field_rate_range
                .widen(window_range(flatten(&self.history, Channel::FIELD_RATE)))
        } else {
            self.field_rate_range.current()
        };
        let spectrum = self.spectrum_range.widen(window_range(
            self.spectra.iter().flat_map(|s| s.magnitude.iter().copied()),
        ));

        // ===== time axis =====
        let step = packet.step();
        if self.step_origin.is_none() {
            self.step_origin = Some(step.unwrap_or(0));
        }
        let origin = self.step_origin.unwrap_or(0) as f64;
        let n = self.history.buffer(Channel::FieldX).len() as f64;
        let t = self.tick as f64;
        let time_window_s = ((origin + t - n) * self.dt, (origin + t - 1.0) * self.dt);

        let state = DerivedState {
            timestamp: now,
            tick: self.tick,
            time_window_s,
            mode: packet.mode(),
            step,
            kinematics: k,
            sun_angles: self.last_sun,
            track,
            spin,
            ranges: DisplayRanges {
                rate,
                field_rate,
                spectrum,
            },
        };
        self.tick += 1;

        debug!(
            event = "derived",
            tick = state.tick,
            spin_x_hz = format_args!("{:.3}", spin.hz.x),
            spin_y_hz = format_args!("{:.3}", spin.hz.y),
            spin_z_hz = format_args!("{:.3}", spin.hz.z),
        );
        state
    }
}

fn xyz(v: &Vec3) -> [f64; 3] {
    [v.x, v.y, v.z]
}

fn flatten(history: &HistoryStore, chans: [Channel; 3]) -> impl Iterator<Item = f64> + '_ {
    chans.into_iter().flat_map(move |ch| history.sequence(ch))
}

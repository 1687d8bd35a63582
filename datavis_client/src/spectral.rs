//! Spin-rate estimate from the magnetic-field history.
//!
//! A body spinning in a roughly static field sees each B axis oscillate at
//! the spin frequency, so the peak of |FFT(B_axis)| is a proxy for the spin
//! rate about that axis.
//!
//! Convention matches numpy:
//! - `fft(x, norm="ortho")`: forward transform scaled by 1/√N
//! - `fftshift` / `fftfreq(N, dt)`: bin `i` of the centered spectrum is
//!   frequency `(i - N/2) / (N·dt)`

use nalgebra::Vector3;
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use serde::Serialize;
use std::f64::consts::PI;
use std::sync::Arc;

/// Centered magnitude spectrum of one window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Spectrum {
    pub freqs_hz: Vec<f64>,
    pub magnitude: Vec<f64>,
}

impl Spectrum {
    /// Frequency of the first maximum-magnitude bin at or above 0 Hz.
    /// Non-finite bins are ignored; 0 Hz when none is left.
    pub fn peak_hz(&self) -> f64 {
        let mut best: Option<(f64, f64)> = None;
        for (&f, &m) in self.freqs_hz.iter().zip(&self.magnitude) {
            if f < 0.0 || !m.is_finite() {
                continue;
            }
            match best {
                Some((_, bm)) if m <= bm => {}
                _ => best = Some((f, m)),
            }
        }
        best.map(|(f, _)| f).unwrap_or(0.0)
    }
}

/// Caches the FFT plan for the configured window length.
#[derive(Clone)]
pub struct SpectralEstimator {
    len: usize,
    fft: Arc<dyn Fft<f64>>,
}

impl std::fmt::Debug for SpectralEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectralEstimator").field("len", &self.len).finish()
    }
}

impl SpectralEstimator {
    pub fn new(len: usize) -> Self {
        let mut planner = FftPlanner::new();
        // a zero-length window never reaches the plan
        let fft = planner.plan_fft_forward(len.max(1));
        Self { len, fft }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Full centered spectrum of `samples` taken every `dt` seconds.
    pub fn spectrum<I>(&self, samples: I, dt: f64) -> Spectrum
    where
        I: IntoIterator<Item = f64>,
    {
        let mut data: Vec<Complex64> = samples
            .into_iter()
            .map(|v| Complex64::new(v, 0.0))
            .collect();
        let n = data.len();
        if n == 0 {
            return Spectrum::default();
        }

        if n == self.len {
            self.fft.process(&mut data);
        } else {
            FftPlanner::new().plan_fft_forward(n).process(&mut data);
        }

        let scale = 1.0 / (n as f64).sqrt();
        let half = n / 2;
        let mut freqs_hz = Vec::with_capacity(n);
        let mut magnitude = Vec::with_capacity(n);
        for i in 0..n {
            let k = i as isize - half as isize;
            let src = k.rem_euclid(n as isize) as usize;
            freqs_hz.push(k as f64 / (n as f64 * dt));
            magnitude.push(data[src].norm() * scale);
        }
        Spectrum {
            freqs_hz,
            magnitude,
        }
    }

    pub fn estimate_spin<I>(&self, samples: I, dt: f64) -> f64
    where
        I: IntoIterator<Item = f64>,
    {
        self.spectrum(samples, dt).peak_hz()
    }
}

/// One-shot estimate without a cached plan.
pub fn estimate_spin(samples: &[f64], dt: f64) -> f64 {
    SpectralEstimator::new(samples.len()).estimate_spin(samples.iter().copied(), dt)
}

/// Per-axis spin estimate published with every frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpinEstimate {
    pub hz: Vector3<f64>,
    pub rad_s: Vector3<f64>,
    /// upper frequency bound for the spectrum plot
    pub display_max_hz: f64,
}

impl SpinEstimate {
    pub fn from_spectra(spectra: &[Spectrum; 3], dt: f64) -> Self {
        let hz = Vector3::new(
            spectra[0].peak_hz(),
            spectra[1].peak_hz(),
            spectra[2].peak_hz(),
        );
        Self {
            hz,
            rad_s: hz * (2.0 * PI),
            display_max_hz: display_limit_hz(hz.max(), dt),
        }
    }
}

/// Snap the spectrum x-limit to 1, 2 or 4 Hz, else Nyquist.
pub fn display_limit_hz(peak_hz: f64, dt: f64) -> f64 {
    if peak_hz <= 1.0 {
        1.0
    } else if peak_hz <= 2.0 {
        2.0
    } else if peak_hz <= 4.0 {
        4.0
    } else {
        0.5 / dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(n: usize, dt: f64, f0: f64) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * f0 * i as f64 * dt).sin())
            .collect()
    }

    #[test]
    fn finds_pure_tone_within_one_bin() {
        let (n, dt, f0) = (512, 0.1, 0.5);
        let est = SpectralEstimator::new(n);
        let f = est.estimate_spin(sine(n, dt, f0), dt);
        let bin = 1.0 / (n as f64 * dt);
        assert!((f - f0).abs() <= bin, "peak {f} Hz, expected {f0} ± {bin}");
    }

    #[test]
    fn zero_window_reports_dc() {
        assert_eq!(estimate_spin(&[0.0; 512], 0.1), 0.0);
    }

    #[test]
    fn dc_offset_dominates() {
        let mut v = sine(512, 0.1, 0.5);
        v.iter_mut().for_each(|x| *x = 100.0 + 0.01 * *x);
        assert_eq!(estimate_spin(&v, 0.1), 0.0);
    }

    #[test]
    fn centered_axis_layout() {
        let s = SpectralEstimator::new(4).spectrum([1.0, 0.0, 0.0, 0.0], 0.5);
        assert_eq!(s.freqs_hz, vec![-1.0, -0.5, 0.0, 0.5]);
        // impulse: flat spectrum of height 1/√N
        assert!(s.magnitude.iter().all(|m| (m - 0.5).abs() < 1e-12));
        // tie → first non-negative bin
        assert_eq!(s.peak_hz(), 0.0);
    }

    #[test]
    fn odd_length_is_centered_on_zero() {
        let s = SpectralEstimator::new(8).spectrum([0.0; 5], 1.0);
        assert_eq!(s.freqs_hz, vec![-0.4, -0.2, 0.0, 0.2, 0.4]);
    }

    #[test]
    fn corrupt_sample_reports_dc() {
        let mut v = [0.0; 512];
        v[511] = f64::NAN;
        assert_eq!(estimate_spin(&v, 0.1), 0.0);
        v[511] = f64::INFINITY;
        assert_eq!(estimate_spin(&v, 0.1), 0.0);
    }

    #[test]
    fn non_finite_bins_are_skipped() {
        let s = Spectrum {
            freqs_hz: vec![0.0, 0.5, 1.0],
            magnitude: vec![1.0, f64::NAN, 2.0],
        };
        assert_eq!(s.peak_hz(), 1.0);
    }

    #[test]
    fn empty_window() {
        assert_eq!(estimate_spin(&[], 0.1), 0.0);
    }

    #[test]
    fn display_limits() {
        assert_eq!(display_limit_hz(0.0, 0.1), 1.0);
        assert_eq!(display_limit_hz(1.5, 0.1), 2.0);
        assert_eq!(display_limit_hz(3.0, 0.1), 4.0);
        assert_eq!(display_limit_hz(4.5, 0.1), 5.0);
    }
}

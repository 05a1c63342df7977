//! Fundamental frequency estimation.
//!
//! McLeod pitch method: the normalized square difference function (NSDF) is
//! built from an FFT autocorrelation, then the first key maximum within
//! `cutoff` of the highest one is taken as the period.

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// A detected pitch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimate {
    /// Fundamental frequency in Hz.
    pub frequency: f32,
    /// NSDF value at the chosen peak, in [0, 1]; higher is more periodic.
    pub clarity: f32,
}

/// Reusable NSDF pitch detector for fixed-size frames.
pub struct PitchDetector {
    window: usize,
    sample_rate: u32,
    min_lag: usize,
    max_lag: usize,
    cutoff: f32,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    spectrum: Vec<Complex<f32>>,
    nsdf: Vec<f32>,
}

impl std::fmt::Debug for PitchDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PitchDetector")
            .field("window", &self.window)
            .field("sample_rate", &self.sample_rate)
            .field("min_lag", &self.min_lag)
            .field("max_lag", &self.max_lag)
            .finish()
    }
}

impl PitchDetector {
    /// Creates a detector for `window`-sample frames searching
    /// `min_freq..=max_freq`.
    pub fn new(window: usize, sample_rate: u32, min_freq: f32, max_freq: f32) -> Self {
        let window = window.max(4);
        let fft_len = (2 * window).next_power_of_two();
        let mut planner = FftPlanner::<f32>::new();
        let forward = planner.plan_fft_forward(fft_len);
        let inverse = planner.plan_fft_inverse(fft_len);

        let rate = sample_rate as f32;
        let min_lag = ((rate / max_freq.max(1.0)).floor() as usize).max(2);
        let max_lag = ((rate / min_freq.max(1.0)).ceil() as usize).min(window - 2);

        Self {
            window,
            sample_rate,
            min_lag,
            max_lag,
            cutoff: 0.9,
            forward,
            inverse,
            spectrum: vec![Complex::new(0.0, 0.0); fft_len],
            nsdf: vec![0.0; window],
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Estimates the pitch of `frame`, zero-padded or cut to the window size.
    ///
    /// Returns `None` for silent or aperiodic frames.
    pub fn detect(&mut self, frame: &[f32]) -> Option<PitchEstimate> {
        let n = self.window;
        let len = frame.len().min(n);
        if len < 4 || self.min_lag >= self.max_lag {
            return None;
        }

        self.autocorrelate(&frame[..len]);

        // m(tau) = sum over the overlap of x_j^2 + x_{j+tau}^2
        let energy: f32 = frame[..len].iter().map(|x| x * x).sum();
        if energy <= f32::EPSILON {
            return None;
        }
        let sample = |i: usize| if i < len { frame[i] } else { 0.0 };
        let mut m = 2.0 * energy;
        for tau in 0..n {
            if tau > 0 {
                let a = sample(tau - 1);
                let b = sample(n - tau);
                m -= a * a + b * b;
            }
            let r = self.spectrum[tau].re;
            self.nsdf[tau] = if m > f32::EPSILON { 2.0 * r / m } else { 0.0 };
        }

        let (lag, clarity) = self.pick_peak()?;
        let frequency = self.sample_rate as f32 / lag;
        Some(PitchEstimate {
            frequency,
            clarity: clarity.clamp(0.0, 1.0),
        })
    }

    /// Leaves the autocorrelation r(tau) in `spectrum[tau].re`.
    fn autocorrelate(&mut self, frame: &[f32]) {
        let fft_len = self.spectrum.len();
        for (i, slot) in self.spectrum.iter_mut().enumerate() {
            *slot = Complex::new(frame.get(i).copied().unwrap_or(0.0), 0.0);
        }
        self.forward.process(&mut self.spectrum);
        for c in self.spectrum.iter_mut() {
            *c = Complex::new(c.norm_sqr(), 0.0);
        }
        self.inverse.process(&mut self.spectrum);
        let scale = 1.0 / fft_len as f32;
        for c in self.spectrum.iter_mut() {
            c.re *= scale;
        }
    }

    /// Returns the refined lag and NSDF value of the chosen key maximum.
    fn pick_peak(&self) -> Option<(f32, f32)> {
        let nsdf = &self.nsdf;
        let limit = (self.max_lag + 1).min(nsdf.len() - 1);

        // Skip the zero-lag lobe.
        let mut tau = 1;
        while tau < limit && nsdf[tau] > 0.0 {
            tau += 1;
        }

        let mut maxima: Vec<usize> = Vec::new();
        while tau < limit {
            while tau < limit && nsdf[tau] <= 0.0 {
                tau += 1;
            }
            let mut best: Option<usize> = None;
            while tau < limit && nsdf[tau] > 0.0 {
                if best.map_or(true, |b| nsdf[tau] > nsdf[b]) {
                    best = Some(tau);
                }
                tau += 1;
            }
            if let Some(b) = best {
                if b >= self.min_lag {
                    maxima.push(b);
                }
            }
        }

        let highest = maxima.iter().map(|&t| nsdf[t]).fold(f32::MIN, f32::max);
        if highest <= 0.0 {
            return None;
        }
        let threshold = self.cutoff * highest;
        let chosen = *maxima.iter().find(|&&t| nsdf[t] >= threshold)?;

        Some(parabolic(nsdf, chosen))
    }
}

/// Vertex of the parabola through `(t-1, t, t+1)`.
fn parabolic(values: &[f32], t: usize) -> (f32, f32) {
    if t == 0 || t + 1 >= values.len() {
        return (t as f32, values[t]);
    }
    let (a, b, c) = (values[t - 1], values[t], values[t + 1]);
    let denom = a - 2.0 * b + c;
    if denom.abs() < f32::EPSILON {
        return (t as f32, b);
    }
    let shift = 0.5 * (a - c) / denom;
    let peak = b - 0.25 * (a - c) * shift;
    (t as f32 + shift, peak)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 22_050;
    const WINDOW: usize = 2205;

    fn sine(freq: f32, amp: f32) -> Vec<f32> {
        (0..WINDOW)
            .map(|i| amp * (2.0 * std::f32::consts::PI * freq * i as f32 / RATE as f32).sin())
            .collect()
    }

    fn detector() -> PitchDetector {
        PitchDetector::new(WINDOW, RATE, 50.0, 2000.0)
    }

    #[test]
    fn test_detects_pure_tones() {
        let mut det = detector();
        for freq in [110.0f32, 185.0, 261.63, 440.0, 739.99, 1200.0] {
            let est = det.detect(&sine(freq, 0.5)).unwrap();
            let cents = 1200.0 * (est.frequency / freq).log2();
            assert!(cents.abs() < 20.0, "{} Hz detected as {} Hz", freq, est.frequency);
            assert!(est.clarity > 0.9);
        }
    }

    #[test]
    fn test_harmonics_keep_fundamental() {
        let mut det = detector();
        let f0 = 220.0f32;
        let frame: Vec<f32> = (0..WINDOW)
            .map(|i| {
                let t = i as f32 / RATE as f32;
                let w = 2.0 * std::f32::consts::PI * f0 * t;
                0.5 * w.sin() + 0.3 * (2.0 * w).sin() + 0.2 * (3.0 * w).sin()
            })
            .collect();
        let est = det.detect(&frame).unwrap();
        assert!((est.frequency - f0).abs() < 3.0, "got {}", est.frequency);
    }

    #[test]
    fn test_silence_has_no_pitch() {
        let mut det = detector();
        assert!(det.detect(&vec![0.0; WINDOW]).is_none());
        assert!(det.detect(&[]).is_none());
    }

    #[test]
    fn test_short_frame_is_padded() {
        let mut det = detector();
        let mut frame = sine(440.0, 0.5);
        frame.truncate(1500);
        let est = det.detect(&frame).unwrap();
        assert!((est.frequency - 440.0).abs() < 5.0);
    }

    #[test]
    fn test_parabolic_vertex() {
        let values = [0.0, 1.0, 0.0];
        assert_eq!(parabolic(&values, 1), (1.0, 1.0));
        let (x, _) = parabolic(&[0.5, 1.0, 0.8], 1);
        assert!(x > 1.0 && x < 1.5);
    }
}

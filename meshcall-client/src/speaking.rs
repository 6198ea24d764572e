use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

pub const DEFAULT_SPEAKING_THRESHOLD: f32 = 0.02;
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// Root-mean-square of a PCM frame, samples in [-1, 1].
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|s| s * s).sum();
    (sum / samples.len() as f32).sqrt()
}

/// Loudest frame energy seen since the last sample.
///
/// Written by the audio path, read by the detector tick. Cloning shares the
/// same level.
#[derive(Debug, Clone, Default)]
pub struct EnergyMeter {
    // f32 bits; non-negative floats order the same as their bit patterns
    peak: Arc<AtomicU32>,
}

impl EnergyMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&self, samples: &[f32]) {
        self.record(rms(samples));
    }

    pub fn record(&self, energy: f32) {
        let energy = if energy.is_finite() { energy.max(0.0) } else { 0.0 };
        self.peak.fetch_max(energy.to_bits(), Ordering::Relaxed);
    }

    /// Read and reset.
    pub fn take(&self) -> f32 {
        f32::from_bits(self.peak.swap(0, Ordering::Relaxed))
    }

    pub fn level(&self) -> f32 {
        f32::from_bits(self.peak.load(Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SpeakingDetector {
    threshold: f32,
}

impl Default for SpeakingDetector {
    fn default() -> Self {
        Self::new(DEFAULT_SPEAKING_THRESHOLD)
    }
}

impl SpeakingDetector {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn is_speaking(&self, energy: f32) -> bool {
        energy > self.threshold
    }

    /// One detector tick for one stream. No hysteresis: the previous tick has
    /// no influence.
    pub fn sample(&self, meter: &EnergyMeter) -> bool {
        self.is_speaking(meter.take())
    }
}

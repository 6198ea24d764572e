use anyhow::{Context, Result};
use bytes::Bytes;
use opus::{Application, Channels, Decoder, Encoder};
use std::sync::Arc;
use std::time::Duration;

pub const SAMPLE_RATE: u32 = 48_000;
/// 20 ms of mono audio at [`SAMPLE_RATE`].
pub const FRAME_SAMPLES: usize = 960;
pub const FRAME_DURATION: Duration = Duration::from_millis(20);

// enough room for a 120 ms packet, the longest Opus allows
const MAX_DECODED_SAMPLES: usize = SAMPLE_RATE as usize * 120 / 1000;
const MAX_PACKET_BYTES: usize = 4000;

/// Turns received Opus payloads into PCM for energy analysis.
pub trait AudioDecoder: Send {
    fn decode(&mut self, payload: &[u8]) -> Result<Vec<f32>>;
}

/// One decoder per remote track.
pub type DecoderFactory = Arc<dyn Fn() -> Result<Box<dyn AudioDecoder>> + Send + Sync>;

/// libopus decoder downmixing to mono; only the energy matters here.
pub struct OpusDecoder {
    inner: Decoder,
    buf: Vec<f32>,
}

impl OpusDecoder {
    pub fn new() -> Result<Self> {
        let inner = Decoder::new(SAMPLE_RATE, Channels::Mono).context("Opus decoder init")?;
        Ok(Self {
            inner,
            buf: vec![0.0; MAX_DECODED_SAMPLES],
        })
    }
}

impl AudioDecoder for OpusDecoder {
    fn decode(&mut self, payload: &[u8]) -> Result<Vec<f32>> {
        let samples = self
            .inner
            .decode_float(payload, &mut self.buf, false)
            .context("Opus decode")?;
        Ok(self.buf[..samples].to_vec())
    }
}

pub fn opus_decoder_factory() -> DecoderFactory {
    Arc::new(|| Ok(Box::new(OpusDecoder::new()?) as Box<dyn AudioDecoder>))
}

/// Mono voice encoder for the local track.
pub struct OpusEncoder {
    inner: Encoder,
}

impl OpusEncoder {
    pub fn new() -> Result<Self> {
        let inner = Encoder::new(SAMPLE_RATE, Channels::Mono, Application::Voip)
            .context("Opus encoder init")?;
        Ok(Self { inner })
    }

    /// Encode exactly one frame of [`FRAME_SAMPLES`] samples.
    pub fn encode(&mut self, pcm: &[f32]) -> Result<Bytes> {
        let packet = self
            .inner
            .encode_vec_float(pcm, MAX_PACKET_BYTES)
            .context("Opus encode")?;
        Ok(Bytes::from(packet))
    }
}

/// Signed 16-bit little-endian mono PCM to floats in [-1, 1).
pub fn pcm_from_s16le(raw: &[u8]) -> Vec<f32> {
    raw.chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / 32768.0)
        .collect()
}

use crate::speaking::EnergyMeter;
use crate::transport::opus_codec::{FRAME_DURATION, FRAME_SAMPLES, OpusEncoder, SAMPLE_RATE};
use anyhow::{Context, Result};
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::info;
use webrtc::api::media_engine::MIME_TYPE_OPUS;
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// The microphone stream shared by every connection of this client.
///
/// All connections send the same track, so muting here mutes the whole mesh.
#[derive(Clone)]
pub struct LocalAudio {
    track: Arc<TrackLocalStaticSample>,
    muted: Arc<AtomicBool>,
    meter: EnergyMeter,
}

impl LocalAudio {
    pub fn new(stream_id: impl Into<String>) -> Self {
        let track = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: 48000,
                channels: 2,
                ..Default::default()
            },
            "audio".to_owned(),
            stream_id.into(),
        ));

        Self {
            track,
            muted: Arc::new(AtomicBool::new(false)),
            meter: EnergyMeter::new(),
        }
    }

    pub fn track(&self) -> Arc<TrackLocalStaticSample> {
        Arc::clone(&self.track)
    }

    pub fn meter(&self) -> EnergyMeter {
        self.meter.clone()
    }

    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Relaxed);
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }

    /// Send one encoded Opus frame to every attached connection.
    ///
    /// `pcm` is the same frame before encoding; it only feeds the local meter.
    /// Frames written while muted are discarded.
    pub async fn write_frame(&self, opus: Bytes, duration: Duration, pcm: Option<&[f32]>) -> Result<()> {
        if self.is_muted() {
            return Ok(());
        }
        if let Some(pcm) = pcm {
            self.meter.feed(pcm);
        }

        self.track
            .write_sample(&Sample {
                data: opus,
                duration,
                ..Default::default()
            })
            .await
            .context("Failed to write Opus frame")?;
        Ok(())
    }

    /// Encode one frame of raw samples and send it.
    pub async fn write_pcm(&self, encoder: &mut OpusEncoder, pcm: &[f32]) -> Result<()> {
        if self.is_muted() {
            return Ok(());
        }
        let packet = encoder.encode(pcm)?;
        self.write_frame(packet, FRAME_DURATION, Some(pcm)).await
    }

    /// Play `samples` (48 kHz mono) into the call in real time.
    pub async fn stream_pcm(&self, samples: Vec<f32>) -> Result<()> {
        let mut encoder = OpusEncoder::new()?;
        let mut tick = tokio::time::interval(FRAME_DURATION);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Streaming {:.1}s of audio",
            samples.len() as f32 / SAMPLE_RATE as f32
        );
        for chunk in samples.chunks(FRAME_SAMPLES) {
            tick.tick().await;
            if chunk.len() == FRAME_SAMPLES {
                self.write_pcm(&mut encoder, chunk).await?;
            } else {
                let mut frame = chunk.to_vec();
                frame.resize(FRAME_SAMPLES, 0.0);
                self.write_pcm(&mut encoder, &frame).await?;
            }
        }
        Ok(())
    }
}

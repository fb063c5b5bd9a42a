//! Speaker playback for generated speech.
//!
//! Audio is resampled to the device rate up front and fed to the cpal callback through a
//! lock-free ring buffer. Playback can be cut short from another thread (Ctrl+C).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use parking_lot::{Condvar, Mutex, MutexGuard};
use ringbuf::{HeapProd, HeapRb};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use tracing::{debug, info, warn};

use super::resampler::resample;
use super::util::{find_best_config, get_device_name};

/// Ring buffer capacity in samples (~11 seconds at 48kHz).
const PLAYBACK_RING_SIZE: usize = 524288;

/// State shared with the audio callback.
struct Shared {
    interrupt: AtomicBool, // Output silence and stop
    done: Mutex<bool>,     // Buffer drained or interrupted
    drained: Condvar,      // Signalled when `done` flips
}

impl Shared {
    fn new() -> Self {
        Self { interrupt: AtomicBool::new(false), done: Mutex::new(true), drained: Condvar::new() }
    }
}

/// Plays mono f32 audio on the default output device.
pub struct Player {
    _stream: Stream,                            // Kept alive to maintain the audio stream
    device_sample_rate: u32,                    // Device output rate
    producer: Mutex<HeapProd<f32>>,             // Feeds the callback
    shared: Arc<Shared>,                        // Callback state
}

impl Player {
    /// Open the default output device.
    ///
    /// # Errors
    /// Returns an error if there is no output device or the stream cannot be built.
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();
        let device = host.default_output_device().context("No output device available")?;
        info!("Using output device: {}", get_device_name(&device));

        let device_sample_rate = match device.default_output_config() {
            Ok(default_config) => default_config.sample_rate(),
            Err(_) => 48000,
        };

        let supported_configs = device.supported_output_configs().context("Failed to get supported output configs")?;
        let config = find_best_config(supported_configs, device_sample_rate)?;
        let device_sample_rate = config.sample_rate();
        let channels = config.channels() as usize;
        let stream_config: StreamConfig = config.config();

        debug!("Audio playback config: {} Hz, {} channels", device_sample_rate, channels);

        let (producer, mut consumer) = HeapRb::<f32>::new(PLAYBACK_RING_SIZE).split();
        let shared = Arc::new(Shared::new());
        let callback_shared = shared.clone();

        let stream = device.build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| render(data, channels, &mut consumer, &callback_shared),
            |err| tracing::error!("Audio playback error: {}", err),
            None,
        )?;

        stream.play().context("Failed to start playback stream")?;

        Ok(Self { _stream: stream, device_sample_rate, producer: Mutex::new(producer), shared })
    }

    /// Play `samples` recorded at `sample_rate`, blocking until done.
    ///
    /// # Returns
    /// `true` if playback completed, `false` if interrupted or timed out.
    pub fn play(&self, samples: &[f32], sample_rate: u32) -> bool {
        if samples.is_empty() {
            return true;
        }

        self.shared.interrupt.store(false, Ordering::SeqCst);

        let samples = match resample(samples, sample_rate, self.device_sample_rate) {
            Ok(resampled) => resampled,
            Err(e) => {
                tracing::error!("Resampling failed: {}, playing without resampling", e);
                samples.to_vec()
            }
        };

        let (written, mut done) = enqueue(&self.shared, &self.producer, &samples);
        if written < samples.len() {
            warn!("Playback buffer overflow, dropped {} samples", samples.len() - written);
        }

        debug!("Playing {} samples at {} Hz", written, self.device_sample_rate);

        let deadline = Instant::now() + Duration::from_secs_f64(written as f64 / self.device_sample_rate as f64 + 1.0);
        while !*done {
            if Instant::now() > deadline {
                warn!("Playback timeout exceeded");
                drop(done);
                self.interrupt();
                return false;
            }
            self.shared.drained.wait_for(&mut done, Duration::from_millis(50));
        }
        drop(done);

        let interrupted = self.shared.interrupt.load(Ordering::SeqCst);
        if interrupted {
            debug!("Playback interrupted");
        }
        !interrupted
    }

    /// Stop current playback; the callback outputs silence from the next period.
    pub fn interrupt(&self) {
        self.shared.interrupt.store(true, Ordering::SeqCst);
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.interrupt();
    }
}

/// Queue samples for the callback and mark playback as pending.
///
/// `done` stays locked across the push, so the callback never sees the pending flag with an
/// empty buffer. The guard is returned for the caller to wait on.
fn enqueue<'a>(shared: &'a Shared, producer: &Mutex<HeapProd<f32>>, samples: &[f32]) -> (usize, MutexGuard<'a, bool>) {
    let mut done = shared.done.lock();
    let written = producer.lock().push_slice(samples);
    *done = written == 0;
    (written, done)
}

/// Fill one output period (mono duplicated across channels) and flag completion.
fn render<C: Consumer<Item = f32>>(data: &mut [f32], channels: usize, consumer: &mut C, shared: &Shared) {
    let interrupted = shared.interrupt.load(Ordering::Relaxed);

    for frame in data.chunks_mut(channels) {
        let sample = if interrupted { 0.0 } else { consumer.try_pop().unwrap_or(0.0) };
        frame.fill(sample);
    }

    if consumer.is_empty() || interrupted {
        let mut done = shared.done.lock();
        // Re-check under the lock; `enqueue` may have refilled the buffer meanwhile
        if !*done && (interrupted || consumer.is_empty()) {
            *done = true;
            shared.drained.notify_all();
        }
    }
}

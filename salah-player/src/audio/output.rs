//! Audio output using cpal
//!
//! Each loaded clip gets its own worker thread. The thread decodes the
//! file, resamples it to the device rate, builds a cpal stream (streams are
//! not `Send`, so the stream never leaves that thread) and then obeys
//! play/pause/stop messages from its `CpalResource`. Stopping or dropping
//! the resource ends the thread and releases the stream.

use crate::audio::decode::{decode_file, DecodedClip};
use crate::audio::resampler::Resampler;
use crate::audio::{AudioBackend, AudioResource, PlayError, ResourceId, ResourceNotifier};
use crate::error::{AudioError, Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use tracing::{debug, error, info, warn};

/// Native audio backend
#[derive(Debug, Clone)]
pub struct CpalBackend {
    device_name: Option<String>,
    volume: f32,
}

impl CpalBackend {
    /// Backend playing on `device_name` (None = default device)
    pub fn new(device_name: Option<String>) -> Self {
        Self {
            device_name,
            volume: 1.0,
        }
    }

    /// Output volume (0.0 = silent, 1.0 = full), clamped
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume.clamp(0.0, 1.0);
        self
    }

    /// List available audio output devices.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();

        let devices: Vec<String> = host
            .output_devices()
            .map_err(|e| Error::AudioOutput(format!("Failed to enumerate devices: {}", e)))?
            .filter_map(|device| device.name().ok())
            .collect();

        debug!("Found {} output devices", devices.len());
        Ok(devices)
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new(None)
    }
}

impl AudioBackend for CpalBackend {
    fn load(&self, id: ResourceId, path: &Path, notifier: ResourceNotifier) -> Box<dyn AudioResource> {
        let (control_tx, control_rx) = mpsc::channel();
        let path = path.to_path_buf();
        let device_name = self.device_name.clone();
        let volume = self.volume;
        let worker_notifier = notifier.clone();
        let worker_path = path.clone();

        let spawned = thread::Builder::new()
            .name(format!("salah-audio-{}", id.0))
            .spawn(move || run_clip(worker_path, device_name, volume, worker_notifier, control_rx));

        if let Err(e) = spawned {
            error!("Failed to spawn audio thread for {}: {}", path.display(), e);
            notifier.failed(AudioError::LoadError {
                path,
                message: format!("Failed to spawn audio thread: {}", e),
            });
        }

        Box::new(CpalResource {
            id,
            control: control_tx,
            stopped: false,
        })
    }
}

#[derive(Debug)]
enum Control {
    Play,
    Pause,
    Stop,
}

/// Handle to a clip worker thread
struct CpalResource {
    id: ResourceId,
    control: mpsc::Sender<Control>,
    stopped: bool,
}

impl AudioResource for CpalResource {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn play(&mut self) -> std::result::Result<(), PlayError> {
        // The worker only exits on its own after reporting a failure
        self.control.send(Control::Play).map_err(|_| {
            debug!("{} worker already exited", self.id);
            PlayError::Failed
        })
    }

    fn pause(&mut self) {
        let _ = self.control.send(Control::Pause);
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            let _ = self.control.send(Control::Stop);
        }
    }
}

impl Drop for CpalResource {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Worker thread body
fn run_clip(
    path: PathBuf,
    device_name: Option<String>,
    volume: f32,
    notifier: ResourceNotifier,
    control: mpsc::Receiver<Control>,
) {
    let clip = match decode_file(&path) {
        Ok(clip) => clip,
        Err(e) => {
            warn!("Failed to load {}: {}", path.display(), e);
            // Closed before reporting, so `play()` sees the failure too
            drop(control);
            notifier.failed(e);
            return;
        }
    };

    let output = match ClipOutput::open(device_name.as_deref(), clip, volume, notifier.clone()) {
        Ok(output) => output,
        Err(e) => {
            warn!("Audio output unavailable for {}: {}", path.display(), e);
            drop(control);
            notifier.failed(AudioError::PlaybackRejected { reason: e.to_string() });
            return;
        }
    };

    // Sender dropped counts as stop
    for message in control.iter() {
        match message {
            Control::Play => {
                if let Err(e) = output.play() {
                    notifier.failed(AudioError::PlaybackRejected { reason: e.to_string() });
                }
            }
            Control::Pause => output.pause(),
            Control::Stop => break,
        }
    }

    debug!("Released {} ({})", path.display(), notifier.id());
}

/// cpal stream playing one clip
struct ClipOutput {
    stream: Stream,
}

impl ClipOutput {
    fn open(device_name: Option<&str>, clip: DecodedClip, volume: f32, notifier: ResourceNotifier) -> Result<Self> {
        let device = open_device(device_name)?;
        let supported = device
            .default_output_config()
            .map_err(|e| Error::AudioOutput(format!("Failed to get default config: {}", e)))?;
        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.config();

        debug!(
            "Audio config: sample_rate={}, channels={}, format={:?}",
            config.sample_rate.0, config.channels, sample_format
        );

        let samples = Resampler::resample(
            &clip.samples,
            clip.sample_rate,
            config.sample_rate.0,
            DecodedClip::CHANNELS,
        )?;
        let renderer = ClipRenderer::new(samples, volume, notifier.clone());

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, renderer, notifier)?,
            SampleFormat::I16 => build_stream::<i16>(&device, &config, renderer, notifier)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &config, renderer, notifier)?,
            other => {
                return Err(Error::AudioOutput(format!("Unsupported sample format: {:?}", other)));
            }
        };

        // Some hosts start streams on creation; hold until told to play
        if let Err(e) = stream.pause() {
            debug!("Could not pause freshly built stream: {}", e);
        }

        Ok(Self { stream })
    }

    fn play(&self) -> Result<()> {
        self.stream
            .play()
            .map_err(|e| Error::AudioOutput(format!("Failed to start stream: {}", e)))
    }

    fn pause(&self) {
        if let Err(e) = self.stream.pause() {
            warn!("Failed to pause stream: {}", e);
        }
    }
}

/// Requested device, falling back to the default device
fn open_device(device_name: Option<&str>) -> Result<Device> {
    let host = cpal::default_host();

    if let Some(name) = device_name {
        let mut devices = host
            .output_devices()
            .map_err(|e| Error::AudioOutput(format!("Failed to enumerate devices: {}", e)))?;

        if let Some(device) = devices.find(|d| d.name().ok().as_deref() == Some(name)) {
            debug!("Found requested audio device: {}", name);
            return Ok(device);
        }
        warn!("Requested device '{}' not found, falling back to default device", name);
    }

    let device = host
        .default_output_device()
        .ok_or_else(|| Error::AudioOutput("No default output device found".to_string()))?;
    info!(
        "Using audio device: {}",
        device.name().unwrap_or_else(|_| "Unknown".to_string())
    );
    Ok(device)
}

fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    mut renderer: ClipRenderer,
    notifier: ResourceNotifier,
) -> Result<Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    let mut reported = false;

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| renderer.fill(data, channels),
            move |err| {
                error!("Audio stream error: {}", err);
                if !reported {
                    reported = true;
                    notifier.failed(AudioError::PlaybackRejected {
                        reason: format!("Audio stream error: {}", err),
                    });
                }
            },
            None,
        )
        .map_err(|e| Error::AudioOutput(format!("Failed to build stream: {}", e)))
}

/// Copies clip samples into device buffers and reports the end once
struct ClipRenderer {
    samples: Vec<f32>,
    position: usize,
    volume: f32,
    ended: bool,
    notifier: ResourceNotifier,
}

impl ClipRenderer {
    fn new(samples: Vec<f32>, volume: f32, notifier: ResourceNotifier) -> Self {
        Self {
            samples,
            position: 0,
            volume,
            ended: false,
            notifier,
        }
    }

    fn next_frame(&mut self) -> (f32, f32) {
        if self.position + 1 < self.samples.len() {
            let frame = (self.samples[self.position], self.samples[self.position + 1]);
            self.position += 2;
            frame
        } else {
            (0.0, 0.0)
        }
    }

    fn fill<T>(&mut self, data: &mut [T], channels: usize)
    where
        T: Sample + FromSample<f32>,
    {
        for frame in data.chunks_mut(channels.max(1)) {
            let (left, right) = self.next_frame();
            let left = (left * self.volume).clamp(-1.0, 1.0);
            let right = (right * self.volume).clamp(-1.0, 1.0);

            match frame.len() {
                1 => frame[0] = T::from_sample((left + right) / 2.0),
                _ => {
                    frame[0] = T::from_sample(left);
                    frame[1] = T::from_sample(right);
                    for extra in frame.iter_mut().skip(2) {
                        *extra = T::EQUILIBRIUM;
                    }
                }
            }
        }

        if !self.ended && self.position + 1 >= self.samples.len() {
            self.ended = true;
            self.notifier.ended();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::ResourceEventKind;
    use tokio::sync::mpsc as tokio_mpsc;

    fn renderer(samples: Vec<f32>, volume: f32) -> (ClipRenderer, tokio_mpsc::UnboundedReceiver<crate::audio::ResourceEvent>) {
        let (tx, rx) = tokio_mpsc::unbounded_channel();
        let notifier = ResourceNotifier::new(ResourceId(7), tx);
        (ClipRenderer::new(samples, volume, notifier), rx)
    }

    #[test]
    fn test_renderer_applies_volume_and_pads_silence() {
        let (mut renderer, _rx) = renderer(vec![1.0, -1.0], 0.5);
        let mut data = [9.0f32; 4];
        renderer.fill(&mut data, 2);
        assert_eq!(data, [0.5, -0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_renderer_reports_end_once() {
        let (mut renderer, mut rx) = renderer(vec![0.1, 0.1, 0.2, 0.2], 1.0);
        let mut data = [0.0f32; 2];

        renderer.fill(&mut data, 2);
        assert!(rx.try_recv().is_err(), "clip not finished yet");

        renderer.fill(&mut data, 2);
        renderer.fill(&mut data, 2);
        let event = rx.try_recv().unwrap();
        assert_eq!(event.id, ResourceId(7));
        assert_eq!(event.kind, ResourceEventKind::Ended);
        assert!(rx.try_recv().is_err(), "end reported once");
    }

    #[test]
    fn test_renderer_mono_device_mixes_down() {
        let (mut renderer, _rx) = renderer(vec![0.4, 0.2], 1.0);
        let mut data = [0.0f32; 1];
        renderer.fill(&mut data, 1);
        assert!((data[0] - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn test_renderer_integer_output() {
        let (mut renderer, _rx) = renderer(vec![0.0, 0.0], 1.0);
        let mut data = [5i16; 2];
        renderer.fill(&mut data, 2);
        assert_eq!(data, [0, 0]);
    }

    #[test]
    fn test_listed_devices_have_names() {
        // Hosts without audio hardware may fail to enumerate
        if let Ok(devices) = CpalBackend::list_devices() {
            assert!(devices.iter().all(|name| !name.is_empty()));
        }
    }

    #[test]
    fn test_play_after_worker_exit_defers_to_notification() {
        let (tx, mut rx) = tokio_mpsc::unbounded_channel();
        let notifier = ResourceNotifier::new(ResourceId(3), tx);
        let backend = CpalBackend::default();

        let mut resource = backend.load(ResourceId(3), Path::new("/nonexistent/mp3/english/takbir.mp3"), notifier);

        // Worker reports the missing file, then exits
        let event = rx.blocking_recv().unwrap();
        assert_eq!(event.id, ResourceId(3));
        assert!(matches!(
            event.kind,
            ResourceEventKind::Failed(AudioError::AssetNotFound { .. })
        ));

        assert_eq!(resource.play(), Err(PlayError::Failed));
        resource.stop();
    }
}

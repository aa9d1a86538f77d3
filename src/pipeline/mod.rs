//! The Frame Pipeline (C5, design spec §4.5, §5): orchestrates one capture
//! session end-to-end — capture → analyze → pose → composite → publish —
//! with bounded resource use and strict drop-not-block admission.

mod cadence;
mod executor;
mod gate;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex};

use log::warn;

use crate::analyzer::{Detector, FaceAnalyzer};
use crate::capture::{CaptureCallbacks, CaptureConfig, CaptureDriver, CapturePreset, FrameRate};
use crate::compositor::Compositor;
use crate::error::AnonCamError;
use crate::options::AnonCamOptions;
use crate::pose::PoseMapper;
use crate::ring::RingProducer;

use executor::{ProcessingExecutor, ProcessingJob};
use gate::Gate;

pub use cadence::target_fps;

/// Session lifecycle state (design spec §4.5: `Idle → Starting → Running →
/// Stopped/Errored`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Constructed, capture not yet started.
    Idle,
    /// `start()` called, capture driver configured, awaiting the first
    /// completed frame.
    Starting,
    /// At least one frame has been composited and published.
    Running,
    /// `stop()` called; in-flight work drained but not published further.
    Stopped,
    /// A fatal or configuration error ended the session (§7).
    Errored,
}

/// Explicit, typed callback struct replacing delegate-style registration
/// (design note §9): `on_preview` delivers one composited frame's pixels
/// to the UI executor; `on_status` reports a user-visible status string.
pub struct PipelineCallbacks {
    /// Invoked with `(pixels, width, height, timestamp_ns)` for every
    /// frame admitted through the UI gate.
    pub on_preview: Box<dyn FnMut(&[u8], u32, u32, u64) + Send>,
    /// Invoked with a status string (`"Face detected"`, `"No face"`,
    /// `"Error: …"`) after every processed frame or fatal transition.
    pub on_status: Box<dyn FnMut(&str) + Send>,
}

/// Error and backpressure counters, updated from both the capture thread
/// (admission drops) and the processing thread (render outcomes), without
/// ever blocking either (§4.5 cadence, §7 error taxonomy).
#[derive(Debug, Default)]
pub struct PipelineStats {
    frames_processed: AtomicU64,
    frames_with_face: AtomicU64,
    backpressure_drops: AtomicU64,
    transient_errors: AtomicU64,
}

impl PipelineStats {
    /// Total frames composited and handed to the ring publisher.
    #[must_use]
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed.load(Ordering::Relaxed)
    }

    /// Of those, how many had `observation.present == true`.
    #[must_use]
    pub fn frames_with_face(&self) -> u64 {
        self.frames_with_face.load(Ordering::Relaxed)
    }

    /// Frames dropped at admission because the processing gate was held
    /// (§7: "Backpressure drop ... counted separately").
    #[must_use]
    pub fn backpressure_drops(&self) -> u64 {
        self.backpressure_drops.load(Ordering::Relaxed)
    }

    /// Frames dropped after admission due to an analyze/render error (§7:
    /// "Transient frame error ... drop the frame, record a counter").
    #[must_use]
    pub fn transient_errors(&self) -> u64 {
        self.transient_errors.load(Ordering::Relaxed)
    }

    pub(crate) fn record_backpressure_drop(&self) {
        self.backpressure_drops.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_frame_processed(&self, had_face: bool) {
        self.frames_processed.fetch_add(1, Ordering::Relaxed);
        if had_face {
            self.frames_with_face.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_transient_error(&self) {
        self.transient_errors.fetch_add(1, Ordering::Relaxed);
    }
}

/// Orchestrates one capture session end-to-end (design spec §4.5). The
/// root of the ownership tree (§9): owns the capture driver and the
/// processing executor (which in turn owns the detector, pose mapper,
/// compositor, and ring producer). A UI shell holds a handle to this, never
/// the reverse.
///
/// The processing thread is spawned once, in [`FramePipeline::new`], and
/// lives for this value's lifetime; `start`/`stop` toggle whether the
/// capture driver is feeding it, not whether the thread exists.
pub struct FramePipeline {
    capture: Box<dyn CaptureDriver>,
    state: Arc<Mutex<PipelineState>>,
    processing_gate: Arc<Gate>,
    ui_gate: Arc<Gate>,
    stats: Arc<PipelineStats>,
    settings_input: triple_buffer::Input<AnonCamOptions>,
    #[allow(dead_code)]
    executor: ProcessingExecutor,
    job_tx: mpsc::Sender<ProcessingJob>,
    preset: CapturePreset,
    frame_rate: FrameRate,
}

impl FramePipeline {
    /// Build the full component graph (analyzer, pose mapper, compositor,
    /// ring producer) and spawn the processing executor. Capture is not
    /// started; call [`FramePipeline::start`] to begin receiving frames.
    ///
    /// # Errors
    ///
    /// Returns [`AnonCamError::Gpu`] if no GPU device is available,
    /// [`AnonCamError::Ring`] if the shared-memory ring cannot be created,
    /// or [`AnonCamError::ThreadSpawn`] if the processing thread fails to
    /// spawn.
    pub fn new(
        capture: Box<dyn CaptureDriver>,
        detector: Box<dyn Detector>,
        ring_name: &str,
        width: u32,
        height: u32,
        preset: CapturePreset,
        frame_rate: FrameRate,
        options: AnonCamOptions,
        callbacks: PipelineCallbacks,
    ) -> Result<Self, AnonCamError> {
        let analyzer = FaceAnalyzer::new(detector);
        let pose_mapper = PoseMapper::new();
        let compositor = Compositor::new(width, height)?;
        let ring = RingProducer::create(ring_name, width, height)?;

        let (settings_input, settings_output) = triple_buffer::triple_buffer(&options);

        let processing_gate = Gate::new();
        let ui_gate = Gate::new();
        let stats = Arc::new(PipelineStats::default());
        let state = Arc::new(Mutex::new(PipelineState::Idle));

        let (executor, job_tx) = ProcessingExecutor::spawn(
            analyzer,
            pose_mapper,
            compositor,
            ring,
            settings_output,
            callbacks,
            Arc::clone(&ui_gate),
            Arc::clone(&stats),
            Arc::clone(&state),
        )
        .map_err(AnonCamError::ThreadSpawn)?;

        Ok(Self {
            capture,
            state,
            processing_gate,
            ui_gate,
            stats,
            settings_input,
            executor,
            job_tx,
            preset,
            frame_rate,
        })
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> PipelineState {
        *self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Error/backpressure counters.
    #[must_use]
    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// Publish a new settings snapshot for the processing executor to pick
    /// up on its next frame (§5: atomic w.r.t. frame boundaries).
    pub fn update_options(&mut self, options: AnonCamOptions) {
        self.settings_input.write(options);
    }

    /// Configure the capture driver and transition `Idle`/`Stopped` →
    /// `Starting`. A no-op if already `Running` (§8 idempotence).
    ///
    /// # Errors
    ///
    /// Returns [`AnonCamError::Capture`] if the driver rejects the
    /// configuration (unsupported preset, missing device); the pipeline
    /// transitions to `Errored` without entering `Running` (§7).
    pub fn start(&mut self, device_id: &str) -> Result<(), AnonCamError> {
        if self.state() == PipelineState::Running {
            return Ok(());
        }
        self.set_state(PipelineState::Starting);

        let config = CaptureConfig {
            preset: self.preset,
            frame_rate: self.frame_rate,
            device_id: device_id.to_owned(),
        };
        let callbacks = self.build_capture_callbacks();

        if let Err(err) = self.capture.start(&config, callbacks) {
            self.set_state(PipelineState::Errored);
            return Err(AnonCamError::Capture(err));
        }
        Ok(())
    }

    /// Signal the capture driver to stop and transition to `Stopped`.
    /// In-flight frames already admitted to the processing executor still
    /// complete, but nothing further is published (§5 cooperative
    /// cancellation). A no-op if already `Stopped` (§8 idempotence).
    pub fn stop(&mut self) {
        if self.state() == PipelineState::Stopped {
            return;
        }
        self.capture.stop();
        self.set_state(PipelineState::Stopped);
    }

    /// Switch the active capture device. Output resolution may change
    /// starting on the next frame; the compositor resizes its internal
    /// textures and buffer pool to match (§4.5).
    ///
    /// # Errors
    ///
    /// Returns [`AnonCamError::Capture`] if `device_id` does not name a
    /// usable device.
    pub fn set_device(&mut self, device_id: &str) -> Result<(), AnonCamError> {
        self.capture.set_device(device_id).map_err(AnonCamError::Capture)
    }

    /// Toggle horizontal mirroring of delivered frames.
    pub fn set_mirrored(&mut self, mirrored: bool) {
        self.capture.set_mirrored(mirrored);
    }

    fn set_state(&self, new_state: PipelineState) {
        *self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = new_state;
    }

    /// Build the capture callback pair implementing the admission gate
    /// (§4.5): on success, copy the frame and hand it to the processing
    /// executor; on failure (gate already held), drop it and count it.
    fn build_capture_callbacks(&self) -> CaptureCallbacks {
        let gate = Arc::clone(&self.processing_gate);
        let sender = self.job_tx.clone();
        let stats_for_frame = Arc::clone(&self.stats);
        let on_frame = Box::new(move |frame: crate::frame::Frame<'_>, pts: u64| {
            if let Some(permit) = Gate::try_acquire(&gate) {
                let job = ProcessingJob {
                    pixels: frame.data.to_vec(),
                    width: frame.width,
                    height: frame.height,
                    stride: frame.stride,
                    timestamp_ns: pts,
                    permit,
                };
                if sender.send(job).is_err() {
                    warn!("processing executor gone, dropping frame");
                }
            } else {
                stats_for_frame.record_backpressure_drop();
            }
        });

        let state_for_error = Arc::clone(&self.state);
        let on_error = Box::new(move |err: &str| {
            warn!("capture driver error: {err}");
            *state_for_error
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner) = PipelineState::Errored;
        });

        CaptureCallbacks { on_frame, on_error }
    }
}

#[cfg(test)]
mod tests {
    use super::{PipelineState, PipelineStats};

    #[test]
    fn stats_start_at_zero() {
        let stats = PipelineStats::default();
        assert_eq!(stats.frames_processed(), 0);
        assert_eq!(stats.backpressure_drops(), 0);
    }

    #[test]
    fn recording_a_faceless_frame_does_not_bump_face_count() {
        let stats = PipelineStats::default();
        stats.record_frame_processed(false);
        assert_eq!(stats.frames_processed(), 1);
        assert_eq!(stats.frames_with_face(), 0);
    }

    #[test]
    fn recording_a_frame_with_face_bumps_both_counters() {
        let stats = PipelineStats::default();
        stats.record_frame_processed(true);
        assert_eq!(stats.frames_processed(), 1);
        assert_eq!(stats.frames_with_face(), 1);
    }

    #[test]
    fn pipeline_state_equality() {
        assert_eq!(PipelineState::Idle, PipelineState::Idle);
        assert_ne!(PipelineState::Idle, PipelineState::Running);
    }
}

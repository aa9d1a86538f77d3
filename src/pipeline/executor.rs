//! The processing executor: a single long-lived background thread owning
//! the detector, pose mapper, compositor, and ring producer, running
//! total-ordered analyze → pose → render → publish on each admitted frame
//! (design spec §4.5, §5).

use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use log::warn;

use crate::analyzer::FaceAnalyzer;
use crate::compositor::render_context::RenderContextError;
use crate::compositor::Compositor;
use crate::frame::Frame;
use crate::options::AnonCamOptions;
use crate::pose::PoseMapper;
use crate::ring::RingProducer;

use super::cadence::CadenceTracker;
use super::gate::{Gate, GateGuard};
use super::{PipelineCallbacks, PipelineState, PipelineStats};

/// One admitted capture frame, owned for the hop across threads. `permit`
/// is the processing gate permit taken on admission; dropping it (at the
/// end of this job's processing, on every exit path) is what lets the
/// next frame be admitted.
pub struct ProcessingJob {
    /// Copied BGRA8 pixel bytes, `stride * height` long.
    pub pixels: Vec<u8>,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Bytes between the start of consecutive rows.
    pub stride: u32,
    /// Capture timestamp, monotonic nanoseconds.
    pub timestamp_ns: u64,
    /// Held for this job's lifetime; its drop releases the processing gate.
    pub permit: GateGuard,
}

/// Owns the background thread. Spawned once for the pipeline's lifetime;
/// `start`/`stop` toggle whether the capture driver is feeding it, not
/// whether the thread exists (§9: ownership tree, not a respawned
/// worker-per-session).
pub struct ProcessingExecutor {
    thread: Option<thread::JoinHandle<()>>,
}

impl ProcessingExecutor {
    /// Spawn the processing thread and return it along with the sender
    /// capture admission hands jobs to.
    ///
    /// # Errors
    ///
    /// Returns [`std::io::Error`] if the background thread fails to spawn.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        mut analyzer: FaceAnalyzer,
        mut pose_mapper: PoseMapper,
        mut compositor: Compositor,
        mut ring: RingProducer,
        mut settings: triple_buffer::Output<AnonCamOptions>,
        mut callbacks: PipelineCallbacks,
        ui_gate: Arc<Gate>,
        stats: Arc<PipelineStats>,
        state: Arc<Mutex<PipelineState>>,
    ) -> std::io::Result<(Self, mpsc::Sender<ProcessingJob>)> {
        let (job_tx, job_rx) = mpsc::channel::<ProcessingJob>();
        let thread = thread::Builder::new()
            .name("anoncam-processing".into())
            .spawn(move || {
                run(
                    &job_rx,
                    &mut analyzer,
                    &mut pose_mapper,
                    &mut compositor,
                    &mut ring,
                    &mut settings,
                    &mut callbacks,
                    &ui_gate,
                    &stats,
                    &state,
                );
            })?;

        Ok((
            Self {
                thread: Some(thread),
            },
            job_tx,
        ))
    }

    /// Wait for the thread to drain and exit. Safe to call more than once.
    pub fn join(&mut self) {
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ProcessingExecutor {
    fn drop(&mut self) {
        self.join();
    }
}

#[allow(clippy::too_many_arguments)]
fn run(
    job_rx: &mpsc::Receiver<ProcessingJob>,
    analyzer: &mut FaceAnalyzer,
    pose_mapper: &mut PoseMapper,
    compositor: &mut Compositor,
    ring: &mut RingProducer,
    settings: &mut triple_buffer::Output<AnonCamOptions>,
    callbacks: &mut PipelineCallbacks,
    ui_gate: &Arc<Gate>,
    stats: &Arc<PipelineStats>,
    state: &Arc<Mutex<PipelineState>>,
) {
    let mut cadence = CadenceTracker::new();

    // The channel closes (and `recv` starts returning `Err`) once every
    // `Sender` clone is dropped, which is how `FramePipeline`'s own drop
    // brings this loop, and the thread, to an end.
    while let Ok(job) = job_rx.recv() {
        let ProcessingJob {
            pixels,
            width,
            height,
            stride,
            timestamp_ns,
            permit,
        } = job;
        let frame = Frame {
            data: &pixels,
            width,
            height,
            stride,
            timestamp_ns,
        };

        let _ = settings.update();
        let options = settings.output_buffer().clone();

        let observation = analyzer.analyze(&frame);
        let present = observation.present;

        let mask_geometry = (options.mask.enabled && present)
            .then(|| pose_mapper.build_mask(options.mask.style, observation));
        let aspect = if height > 0 {
            width as f32 / height as f32
        } else {
            1.0
        };
        let placement = pose_mapper.placement(options.mask.style, observation, aspect, options.mask.scale);

        match compositor.render(
            &frame,
            observation,
            mask_geometry.as_ref(),
            None,
            placement,
            &options.display,
            &options.mask,
        ) {
            Ok(composited) => {
                stats.record_frame_processed(present);
                mark_running(state);

                if ring.publish(&composited.pixels, composited.timestamp_ns).is_err() {
                    // Ring detachment / resolution mismatch is silent and
                    // best-effort (§7).
                }

                if let Some(preview_permit) = Gate::try_acquire(ui_gate) {
                    (callbacks.on_preview)(
                        &composited.pixels,
                        composited.width,
                        composited.height,
                        composited.timestamp_ns,
                    );
                    drop(preview_permit);
                }
                (callbacks.on_status)(if present { "Face detected" } else { "No face" });

                compositor.release_pixels(composited.pixels);
                cadence.record_completion();
            }
            Err(RenderContextError::DeviceLost(reason)) => {
                warn!("GPU device lost, ending session: {reason}");
                *state.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = PipelineState::Errored;
                (callbacks.on_status)(&format!("Error: GPU device lost: {reason}"));
            }
            Err(err) => {
                stats.record_transient_error();
                warn!("render error, dropping frame: {err}");
            }
        }

        drop(permit);
    }
}

/// Flip `Starting` to `Running` on the first successfully completed frame
/// (§4.5: "Upon first output callback → Running"). A no-op once already
/// `Running`, `Stopped`, or `Errored`.
fn mark_running(state: &Arc<Mutex<PipelineState>>) {
    let mut guard = state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    if *guard == PipelineState::Starting {
        *guard = PipelineState::Running;
    }
}

// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
#![deny(clippy::wildcard_imports)]
#![deny(unused_results)]
#![deny(unused_qualifications)]
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! Realtime camera anonymization pipeline.
//!
//! Acquires frames from a physical camera, locates a human face, composites
//! a privacy overlay (pixelation or a 3D mask locked to head pose), and
//! republishes the processed video stream to third-party consumers through
//! a zero-copy shared-memory ring.
//!
//! # Key entry points
//!
//! - [`pipeline::FramePipeline`] — orchestrates one capture session
//!   end-to-end: capture → analyze → pose → composite → publish.
//! - [`ring`] — the shared-memory triple-buffered ring between the
//!   producing process (this crate) and a consumer process.
//! - [`analyzer::FaceAnalyzer`] — adapts an external landmark detector into
//!   a normalized [`observation::FaceObservation`].
//! - [`pose::PoseMapper`] — head-pose reconstruction and live↔texture UV
//!   correspondence for face-replacement masks.
//! - [`compositor::Compositor`] — drives the GPU pipeline that produces the
//!   finished output frame.
//!
//! # Architecture
//!
//! The [`pipeline::FramePipeline`] is the root of an ownership tree: it
//! owns the analyzer, pose mapper, compositor, and ring producer. Capture
//! callbacks are admitted through a single-permit gate with strict
//! drop-not-block semantics (§4.5, §5 of the design spec); settings are
//! published from a UI-side handle to the processing executor through a
//! lock-free triple buffer.

pub mod analyzer;
pub mod capture;
pub mod compositor;
pub mod error;
pub mod frame;
pub mod observation;
pub mod options;
pub mod output;
pub mod pipeline;
pub mod pose;
pub mod ring;

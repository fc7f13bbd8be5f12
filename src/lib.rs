//! Fragment output conformance checks.
//!
//! A vertex grid is drawn into one or more color attachments with
//! per-vertex values chosen to fit each attachment's format and the declared
//! output precision. The GPU result is read back and compared against a
//! software rasterization of the same grid, within a tolerance derived from
//! format, precision and channel class.

pub use wgpu;

pub mod codec;
pub mod compare;
mod error;
pub mod format;
pub mod fragment_output;
pub mod gpu;
pub mod grid;
pub mod harness;
pub mod image;
pub mod output;
pub mod reference;
pub mod shader;
pub mod sync_case;
pub mod values;

pub use compare::{compare_images, compute_threshold, ComparisonResult, ComparisonThreshold};
pub use error::{Error, Result};
pub use format::{ChannelClass, PixelFormat};
pub use fragment_output::FragmentOutputCase;
pub use gpu::GpuContext;
pub use grid::VertexGrid;
pub use harness::{
    run_case, IterateResult, RunSummary, TestCase, TestRunner, TestStatus, Verdict,
};
pub use image::PixelBuffer;
pub use output::{
    AttachmentSpec, FragmentOutputDecl, FragmentOutputSpec, OutputType, Precision, ScalarKind,
};
pub use sync_case::SubmissionSyncCase;

/// Environment variable that turns a missing GPU adapter into a test failure
/// instead of a skip.
pub const REQUIRE_GPU_ENV: &str = "FRAGCHECK_REQUIRE_GPU";

/// Whether [`REQUIRE_GPU_ENV`] is set to anything other than `0` or empty.
pub fn gpu_required() -> bool {
    std::env::var(REQUIRE_GPU_ENV)
        .map(|value| !value.is_empty() && value != "0")
        .unwrap_or(false)
}

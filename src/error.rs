use crate::format::ChannelClass;

/// Errors produced while preparing, running or validating a case.
///
/// `NotSupported` is special: the harness reports it as a skip rather than a
/// failure. Every other variant ends the case as failed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("No suitable GPU adapter found")]
    AdapterNotFound,
    #[error("Failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("{context}: {message}")]
    Validation { context: String, message: String },
    #[error("Not supported: {0}")]
    NotSupported(String),
    #[error("Invalid fragment output declaration: {0}")]
    InvalidOutput(String),
    #[error("Channel class {0:?} is not supported for comparison")]
    UnsupportedChannelClass(ChannelClass),
    #[error("Image size mismatch: reference is {expected:?}, result is {actual:?}")]
    SizeMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
    #[error("Device poll failed: {0}")]
    Poll(#[from] wgpu::PollError),
    #[error("Readback failed: {0}")]
    Readback(String),
    #[error("Timed out after {0:?} waiting for GPU work to complete")]
    Timeout(std::time::Duration),
}

pub type Result<T> = std::result::Result<T, Error>;

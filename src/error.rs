use crate::{
    gpu::Gpu,
    stream::Stream,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no suitable gpu adapter found")]
    NoAdapter,

    #[error("device request failed")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("kernel error")]
    Kernel(#[from] KernelError),

    #[error("transfer error")]
    Transfer(#[from] TransferError),
}

/// Two operand arrays disagree on shape. Shapes must be identical; there is
/// no broadcasting.
#[derive(Debug, thiserror::Error)]
#[error("shape mismatch: {left:?} != {right:?}")]
pub struct ShapeMismatch {
    pub left: Vec<usize>,
    pub right: Vec<usize>,
}

impl ShapeMismatch {
    pub fn new(left: &[usize], right: &[usize]) -> Self {
        Self {
            left: left.to_vec(),
            right: right.to_vec(),
        }
    }
}

/// A host buffer's element count doesn't match the device array it is
/// transferred to or from.
#[derive(Debug, thiserror::Error)]
#[error("size mismatch: host buffer has {host} elements, device array has {device}")]
pub struct SizeMismatch {
    pub host: usize,
    pub device: usize,
}

/// Two operand arrays are bound to distinct streams. There is no implicit
/// cross-stream synchronization.
#[derive(Debug, thiserror::Error)]
#[error("stream mismatch: {} != {}", .first.label(), .second.label())]
pub struct StreamMismatch {
    pub first: Stream,
    pub second: Stream,
}

/// Two operand arrays live on different gpus.
#[derive(Debug, thiserror::Error)]
#[error("arrays live on different gpus: {} != {}", .first.name(), .second.name())]
pub struct GpuMismatch {
    pub first: Gpu,
    pub second: Gpu,
}

#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    #[error(transparent)]
    ShapeMismatch(#[from] ShapeMismatch),

    #[error(transparent)]
    StreamMismatch(#[from] StreamMismatch),

    #[error(transparent)]
    GpuMismatch(#[from] GpuMismatch),
}

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error(transparent)]
    SizeMismatch(#[from] SizeMismatch),

    #[error("buffer readback failed")]
    BufferAsync(#[from] wgpu::BufferAsyncError),
}

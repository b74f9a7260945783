pub(crate) mod buffer;

use std::{
    marker::PhantomData,
    mem::size_of,
};

use bytemuck::Zeroable;
use derivative::Derivative;
use wgpu::{
    util::align_to,
    CommandEncoderDescriptor,
    COPY_BUFFER_ALIGNMENT,
};

use self::buffer::{
    ArrayBuffer,
    ArrayBufferUsage,
};
use crate::{
    element::Element,
    error::{
        KernelError,
        SizeMismatch,
        TransferError,
    },
    gpu::Gpu,
    stream::ExecutionContext,
};

/// A flat, shaped array resident in device memory.
///
/// The device allocation is sized from `product(shape)` elements at
/// construction, owned exclusively by this instance and released on drop.
/// Transfers work for any [`Element`]; the arithmetic kernels exist on
/// `GpuArray<f32>` only. All operations besides [`set`](Self::set) leave the
/// array untouched and return freshly allocated outputs.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct GpuArray<T: Element> {
    #[derivative(Debug = "ignore")]
    pub(crate) gpu: Gpu,

    #[derivative(Debug = "ignore")]
    pub(crate) buffer: ArrayBuffer,

    shape: Vec<usize>,
    size: usize,
    context: ExecutionContext,

    _element: PhantomData<T>,
}

impl<T: Element> GpuArray<T> {
    /// Allocate a device array on the default queue. Contents are
    /// uninitialized.
    pub fn new(gpu: &Gpu, shape: impl Into<Vec<usize>>) -> Self {
        Self::with_context(gpu, shape, ExecutionContext::Default)
    }

    /// Allocate a device array whose transfers and kernels are enqueued on
    /// `context`. Contents are uninitialized.
    pub fn with_context(
        gpu: &Gpu,
        shape: impl Into<Vec<usize>>,
        context: ExecutionContext,
    ) -> Self {
        let shape = shape.into();
        let size = shape.iter().product();

        let buffer = ArrayBuffer::allocate(
            gpu,
            size * size_of::<T>(),
            ArrayBufferUsage::Compute,
            "GpuArray::allocate",
        );

        Self {
            gpu: gpu.clone(),
            buffer,
            shape,
            size,
            context,
            _element: PhantomData,
        }
    }

    /// Allocate an array shaped like `shape` and upload `data` into it.
    pub fn from_slice(
        gpu: &Gpu,
        shape: impl Into<Vec<usize>>,
        data: &[T],
    ) -> Result<Self, TransferError> {
        let array = Self::new(gpu, shape);
        array.set(data)?;
        Ok(array)
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn gpu(&self) -> &Gpu {
        &self.gpu
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    fn check_size(&self, host_len: usize) -> Result<(), SizeMismatch> {
        if host_len == self.size {
            Ok(())
        }
        else {
            Err(SizeMismatch {
                host: host_len,
                device: self.size,
            })
        }
    }

    /// Copy `data` from host to device. This is a non-blocking enqueue;
    /// ordering relative to kernels on the same array comes from the queue.
    pub fn set(&self, data: &[T]) -> Result<(), TransferError> {
        self.check_size(data.len())?;

        if data.is_empty() {
            return Ok(());
        }

        self.gpu
            .queue()
            .write_buffer(self.buffer.buffer(), 0, bytemuck::cast_slice(data));

        Ok(())
    }

    /// Copy the array device to host into a new vector, waiting for prior work
    /// on the array's queue to finish.
    pub async fn get(&self) -> Result<Vec<T>, TransferError> {
        let mut out = vec![T::zeroed(); self.size];
        self.get_into(&mut out).await?;
        Ok(out)
    }

    /// Copy the array device to host into `out`, which must have exactly
    /// [`size`](Self::size) elements.
    pub async fn get_into(&self, out: &mut [T]) -> Result<(), TransferError> {
        self.check_size(out.len())?;

        if out.is_empty() {
            return Ok(());
        }

        // readback goes through a mappable staging buffer; storage buffers
        // themselves can't be mapped
        let staging = ArrayBuffer::allocate(
            &self.gpu,
            self.size * size_of::<T>(),
            ArrayBufferUsage::CopyToHost,
            "GpuArray::get",
        );

        self.copy_to_buffer(&staging).await;

        let mapped = staging.map().await?;
        let view = mapped.view();
        out.copy_from_slice(bytemuck::cast_slice(&view[..self.size * size_of::<T>()]));

        Ok(())
    }

    async fn copy_to_buffer(&self, destination: &ArrayBuffer) {
        assert_eq!(destination.usage(), ArrayBufferUsage::CopyToHost);

        let copy_size = (self.size * size_of::<T>()).try_into().unwrap();
        assert!(copy_size <= destination.size());
        let copy_size = align_to(copy_size, COPY_BUFFER_ALIGNMENT);

        let mut encoder = self
            .gpu
            .device()
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("GpuArray::copy_to_buffer"),
            });

        encoder.copy_buffer_to_buffer(
            self.buffer.buffer(),
            0,
            destination.buffer(),
            0,
            copy_size,
        );

        self.gpu.queue().submit([encoder.finish()]).await;
    }
}

impl GpuArray<f32> {
    /// Allocate an array whose every element is zero.
    pub async fn zeros(gpu: &Gpu, shape: impl Into<Vec<usize>>) -> Result<Self, KernelError> {
        Self::new(gpu, shape).fill(0.).await
    }
}

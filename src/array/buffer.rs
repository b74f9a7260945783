use std::{
    ops::Deref,
    sync::{
        atomic::{
            AtomicUsize,
            Ordering,
        },
        Arc,
    },
};

use ouroboros::self_referencing;
use wgpu::{
    BindingResource,
    BufferAddress,
    BufferAsyncError,
    BufferDescriptor,
    BufferUsages,
    BufferView,
    MapMode,
};
use wgpu_async::{
    AsyncBuffer,
    AsyncBufferSlice,
};

use crate::gpu::Gpu;

#[derive(Debug)]
struct ArrayBufferInner {
    buffer: AsyncBuffer,
    usage: ArrayBufferUsage,
    map_count: AtomicUsize,
}

impl Drop for ArrayBufferInner {
    fn drop(&mut self) {
        self.buffer.destroy();
    }
}

/// Device allocation backing a [`GpuArray`]. The allocation is exclusively
/// owned by its array and released when the array is dropped; its capacity
/// never changes after construction.
///
/// [`GpuArray`]: crate::GpuArray
#[derive(Clone, Debug)]
pub(crate) struct ArrayBuffer {
    inner: Arc<ArrayBufferInner>,
}

impl ArrayBuffer {
    /// Allocate `size` bytes of device memory, uninitialized.
    pub fn allocate(gpu: &Gpu, size: usize, usage: ArrayBufferUsage, label: &str) -> Self {
        let unpadded_size: BufferAddress = size.try_into().unwrap();
        // Valid vulkan usage is
        // 1. buffer size must be a multiple of COPY_BUFFER_ALIGNMENT.
        // 2. buffer size must be greater than 0.
        // Therefore we round the value up to the nearest multiple, and ensure it's at
        // least COPY_BUFFER_ALIGNMENT. Empty arrays still get a bindable buffer.
        let align_mask = wgpu::COPY_BUFFER_ALIGNMENT - 1;
        let padded_size =
            ((unpadded_size + align_mask) & !align_mask).max(wgpu::COPY_BUFFER_ALIGNMENT);

        let buffer = gpu.device().create_buffer(&BufferDescriptor {
            label: Some(label),
            size: padded_size,
            usage: usage.into(),
            mapped_at_creation: false,
        });

        Self {
            inner: Arc::new(ArrayBufferInner {
                buffer,
                usage,
                map_count: AtomicUsize::new(0),
            }),
        }
    }

    pub fn buffer(&self) -> &AsyncBuffer {
        &self.inner.buffer
    }

    pub fn as_binding(&self) -> BindingResource {
        if self.inner.usage != ArrayBufferUsage::Compute {
            panic!(
                "can't bind array buffer to kernel. usage={:?}",
                self.inner.usage
            );
        }
        self.inner.buffer.as_entire_binding()
    }

    pub fn usage(&self) -> ArrayBufferUsage {
        self.inner.usage
    }

    pub fn size(&self) -> BufferAddress {
        self.inner.buffer.size()
    }

    /// Map the buffer into host memory for reading.
    pub async fn map(&self) -> Result<MappedArrayBuffer, BufferAsyncError> {
        if self.inner.usage != ArrayBufferUsage::CopyToHost {
            panic!("can't map array buffer. usage={:?}", self.inner.usage);
        }

        let inner = MappedArrayBufferInnerAsyncTryBuilder {
            buffer: self.clone(),
            slice_builder: move |buffer: &ArrayBuffer| {
                Box::pin(async move {
                    let slice = buffer.inner.buffer.slice(..);
                    // we always tell wgpu to map the buffer. otherwise there could be a race
                    // condition between mapping and get_mapped_range.
                    slice.map_async(MapMode::Read).await?;
                    Ok::<_, BufferAsyncError>(slice)
                })
            },
        }
        .try_build()
        .await?;

        self.inner.map_count.fetch_add(1, Ordering::Relaxed);

        Ok(MappedArrayBuffer { inner })
    }
}

/// helper struct to hold the buffer and the things referencing it.
/// we also need a separate struct, so we can define our own Drop impl for
/// `MappedArrayBuffer`
#[self_referencing]
struct MappedArrayBufferInner {
    buffer: ArrayBuffer,

    #[borrows(buffer)]
    #[covariant]
    slice: AsyncBufferSlice<'this>,
}

pub(crate) struct MappedArrayBuffer {
    inner: MappedArrayBufferInner,
}

impl MappedArrayBuffer {
    pub fn view<'a>(&'a self) -> MappedArrayBufferView<'a> {
        let buffer_view = self.inner.borrow_slice().get_mapped_range();
        MappedArrayBufferView { buffer_view }
    }
}

impl Drop for MappedArrayBuffer {
    fn drop(&mut self) {
        let buffer = self.inner.borrow_buffer();
        if buffer.inner.map_count.fetch_sub(1, Ordering::Relaxed) == 1 {
            tracing::debug!("unmapping array buffer");
            buffer.inner.buffer.unmap()
        }
    }
}

pub(crate) struct MappedArrayBufferView<'a> {
    buffer_view: BufferView<'a>,
}

impl<'a> Deref for MappedArrayBufferView<'a> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.buffer_view
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ArrayBufferUsage {
    Compute,
    CopyToHost,
}

impl Default for ArrayBufferUsage {
    fn default() -> Self {
        Self::Compute
    }
}

impl From<ArrayBufferUsage> for BufferUsages {
    fn from(value: ArrayBufferUsage) -> Self {
        match value {
            ArrayBufferUsage::Compute => {
                BufferUsages::STORAGE | BufferUsages::COPY_SRC | BufferUsages::COPY_DST
            }
            ArrayBufferUsage::CopyToHost => BufferUsages::MAP_READ | BufferUsages::COPY_DST,
        }
    }
}

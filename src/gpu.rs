use std::sync::Arc;

use wgpu::{
    util::initialize_adapter_from_env_or_default,
    Adapter,
    DeviceDescriptor,
    Instance,
    Limits,
};
use wgpu_async::{
    AsyncDevice,
    AsyncQueue,
};

use crate::{
    array::buffer::ArrayBuffer,
    error::{
        Error,
        GpuMismatch,
        KernelError,
    },
    kernel::{
        executor::{
            KernelExecutor,
            KernelParams,
        },
        Kernel,
    },
    splay::LaunchShape,
    stream::{
        ExecutionContext,
        Stream,
    },
};

#[derive(Debug)]
struct Inner {
    adapter: Adapter,
    device: AsyncDevice,
    queue: AsyncQueue,
    executor: KernelExecutor,
    limits: Limits,
}

/// Handle to a gpu device. Cheap to clone; all clones share the same
/// underlying device, queue and pipeline cache.
#[derive(Debug, Clone)]
pub struct Gpu {
    inner: Arc<Inner>,
}

impl Gpu {
    pub async fn new() -> Result<Self, Error> {
        let instance = Instance::default();
        let adapter = initialize_adapter_from_env_or_default(&instance, None)
            .await
            .ok_or(Error::NoAdapter)?;
        Self::from_adapter(adapter).await
    }

    pub async fn from_adapter(adapter: Adapter) -> Result<Self, Error> {
        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    label: None,
                    required_features: Default::default(),
                    required_limits: Default::default(),
                },
                None,
            )
            .await?;

        let (device, queue) = wgpu_async::wrap(Arc::new(device), Arc::new(queue));

        let executor = KernelExecutor::new();

        Ok(Self {
            inner: Arc::new(Inner {
                adapter,
                device,
                queue,
                executor,
                limits: Limits::default(),
            }),
        })
    }

    pub(crate) fn device(&self) -> &AsyncDevice {
        &self.inner.device
    }

    pub(crate) fn queue(&self) -> &AsyncQueue {
        &self.inner.queue
    }

    pub(crate) fn limits(&self) -> &Limits {
        &self.inner.limits
    }

    /// Create a new execution stream. Work enqueued on the same stream
    /// executes in enqueue order.
    pub fn create_stream(&self, label: impl Into<String>) -> Stream {
        Stream::new(label)
    }

    pub fn is_same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn check_same(&self, other: &Self) -> Result<(), GpuMismatch> {
        if self.is_same(other) {
            Ok(())
        }
        else {
            Err(GpuMismatch {
                first: self.clone(),
                second: other.clone(),
            })
        }
    }

    pub(crate) async fn run_kernel<K: Kernel>(
        &self,
        params: KernelParams,
        buffers: &[&ArrayBuffer],
        launch: LaunchShape,
        context: &ExecutionContext,
    ) -> Result<(), KernelError> {
        self.inner
            .executor
            .run_kernel::<K>(self, params, buffers, launch, context)
            .await
    }

    pub fn name(&self) -> String {
        self.inner.adapter.get_info().name
    }
}

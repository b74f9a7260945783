use std::{
    any::{
        type_name,
        TypeId,
    },
    collections::HashMap,
    mem::size_of,
    sync::Arc,
};

use async_lock::Mutex;
use wgpu::{
    BindGroupDescriptor,
    BindGroupEntry,
    BufferDescriptor,
    BufferUsages,
    CommandEncoderDescriptor,
    ComputePassDescriptor,
    ComputePipeline,
};

use super::Kernel;
use crate::{
    array::buffer::ArrayBuffer,
    error::KernelError,
    gpu::Gpu,
    splay::LaunchShape,
    stream::ExecutionContext,
};

/// Scalar arguments shared by every elementwise kernel. Layout matches the
/// `Params` uniform in the shader template, padded to 16 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct KernelParams {
    pub a: f32,
    pub b: f32,
    pub n: u32,
    pub _pad: u32,
}

impl KernelParams {
    pub fn new(a: f32, b: f32, n: usize) -> Self {
        Self {
            a,
            b,
            n: n.try_into().expect("array too large for kernel dispatch"),
            _pad: 0,
        }
    }
}

/// Process-wide cache from kernel identity to compiled compute pipeline.
///
/// Compilation is memoized per `(kernel, workgroup width)` pair: the
/// workgroup size is baked into the rendered shader source, so each distinct
/// source text compiles exactly once and is reused forever after.
#[derive(Debug)]
pub(crate) struct KernelExecutor {
    compute_pipelines: Mutex<HashMap<(TypeId, u32), Arc<ComputePipeline>>>,
}

impl KernelExecutor {
    pub fn new() -> Self {
        Self {
            compute_pipelines: Mutex::new(HashMap::new()),
        }
    }

    pub async fn run_kernel<K: Kernel>(
        &self,
        gpu: &Gpu,
        params: KernelParams,
        buffers: &[&ArrayBuffer],
        launch: LaunchShape,
        context: &ExecutionContext,
    ) -> Result<(), KernelError> {
        let kernel_id = TypeId::of::<K>();

        // fetch from cache or create compute pipeline
        // we only lock the cache for a short period to get the compute pipeline, which
        // we clone then.
        let compute_pipeline = {
            let mut compute_pipelines = self.compute_pipelines.lock().await;
            let compute_pipeline = compute_pipelines
                .entry((kernel_id, launch.threads_per_group))
                .or_insert_with(|| {
                    Arc::new(K::create_compute_pipeline(gpu, launch.threads_per_group))
                });
            compute_pipeline.clone()
        };

        // upload scalar arguments
        let param_buffer = gpu.device().create_buffer(&BufferDescriptor {
            label: Some("kernel params"),
            size: size_of::<KernelParams>() as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        gpu.queue()
            .write_buffer(&param_buffer, 0, bytemuck::bytes_of(&params));

        // create bind group: storage buffers in declaration order, params last
        let bind_group_layout = compute_pipeline.get_bind_group_layout(0);
        let mut entries = Vec::with_capacity(buffers.len() + 1);
        for (index, buffer) in buffers.iter().enumerate() {
            entries.push(BindGroupEntry {
                binding: index as u32,
                resource: buffer.as_binding(),
            });
        }
        entries.push(BindGroupEntry {
            binding: buffers.len() as u32,
            resource: param_buffer.as_entire_binding(),
        });
        let bind_group = gpu.device().create_bind_group(&BindGroupDescriptor {
            label: Some(type_name::<K>()),
            layout: &bind_group_layout,
            entries: &entries,
        });

        tracing::trace!(
            kernel = K::LABEL,
            groups = launch.group_count,
            threads = launch.threads_per_group,
            stream = context.stream().map(|s| s.label()).unwrap_or("default"),
            "dispatching kernel"
        );

        let mut encoder = gpu
            .device()
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some(type_name::<K>()),
            });

        {
            let mut compute_pass = encoder.begin_compute_pass(&ComputePassDescriptor {
                label: Some(type_name::<K>()),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&compute_pipeline);
            compute_pass.set_bind_group(0, &bind_group, &[]);
            compute_pass.dispatch_workgroups(launch.group_count, 1, 1);
        }

        gpu.queue().submit([encoder.finish()]).await;

        Ok(())
    }
}

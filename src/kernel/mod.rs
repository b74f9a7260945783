pub(crate) mod elementwise;
pub(crate) mod executor;

use askama::Template;
use wgpu::{
    ComputePipeline,
    ComputePipelineDescriptor,
    ShaderModuleDescriptor,
    ShaderSource,
};

use crate::gpu::Gpu;

/// Storage binding of an elementwise kernel, in binding-index order. The
/// scalar `params` uniform always follows the storage bindings.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BindingDeclaration {
    pub name: &'static str,
    pub read_write: bool,
}

impl BindingDeclaration {
    pub const fn read_only(name: &'static str) -> Self {
        Self {
            name,
            read_write: false,
        }
    }

    pub const fn read_write(name: &'static str) -> Self {
        Self {
            name,
            read_write: true,
        }
    }
}

/// An elementwise compute kernel. The shared template provides the strided
/// loop over `[0, n)`; implementors supply the per-element statement and the
/// buffers it reads and writes.
pub(crate) trait Kernel: 'static {
    const LABEL: &'static str;
    const BODY: &'static str;
    const BINDINGS: &'static [BindingDeclaration];

    fn source(workgroup_size: u32) -> String {
        let template = ElementwiseTemplate {
            label: Self::LABEL,
            workgroup_size,
            bindings: Self::BINDINGS,
            body: Self::BODY,
        };

        template.render().expect("kernel render failed")
    }

    fn create_compute_pipeline(gpu: &Gpu, workgroup_size: u32) -> ComputePipeline {
        debug_assert!(workgroup_size <= gpu.limits().max_compute_workgroup_size_x);

        let source = Self::source(workgroup_size);

        tracing::debug!("shader source for {}", Self::LABEL);
        tracing::debug!("{source}");

        let module = gpu.device().create_shader_module(ShaderModuleDescriptor {
            label: Some(&format!("shader module: {}", Self::LABEL)),
            source: ShaderSource::Wgsl(source.into()),
        });

        let pipeline = gpu
            .device()
            .create_compute_pipeline(&ComputePipelineDescriptor {
                label: Some(&format!("compute pipeline: {}", Self::LABEL)),
                layout: None,
                module: &module,
                entry_point: "main",
            });

        pipeline
    }
}

#[derive(Debug, Template)]
#[template(path = "elementwise.wgsl", escape = "none")]
struct ElementwiseTemplate {
    label: &'static str,
    workgroup_size: u32,
    bindings: &'static [BindingDeclaration],
    body: &'static str,
}

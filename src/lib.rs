pub mod array;
pub mod element;
pub mod error;
pub mod gpu;
pub(crate) mod kernel;
pub mod splay;
pub mod stream;

pub use crate::{
    array::GpuArray,
    gpu::Gpu,
    splay::{
        splay,
        LaunchShape,
    },
    stream::{
        ExecutionContext,
        Stream,
    },
};

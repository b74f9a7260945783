use std::fmt::{
    Debug,
    Display,
};

use bytemuck::Pod;

/// Scalar type of an element on the device side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WgslType {
    I32,
    U32,
    F32,
}

impl Display for WgslType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WgslType::I32 => "i32",
            WgslType::U32 => "u32",
            WgslType::F32 => "f32",
        };
        write!(f, "{s}")
    }
}

/// Element type of a [`GpuArray`]. Any `Element` can be transferred between
/// host and device; arithmetic kernels are implemented for `f32` only.
///
/// [`GpuArray`]: crate::GpuArray
pub trait Element: Copy + Debug + Pod {
    const WGSL_TYPE: WgslType;
}

impl Element for f32 {
    const WGSL_TYPE: WgslType = WgslType::F32;
}

impl Element for i32 {
    const WGSL_TYPE: WgslType = WgslType::I32;
}

impl Element for u32 {
    const WGSL_TYPE: WgslType = WgslType::U32;
}

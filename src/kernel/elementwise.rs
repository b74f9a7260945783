use super::{
    executor::KernelParams,
    BindingDeclaration,
    Kernel,
};
use crate::{
    array::GpuArray,
    error::{
        KernelError,
        ShapeMismatch,
    },
    splay::LaunchShape,
};

/// `z[i] = a*x[i] + b*y[i]`, the fused kernel behind `add` and `sub`.
pub(crate) struct ScaledCombine;

impl Kernel for ScaledCombine {
    const LABEL: &'static str = "scaled_combine";
    const BODY: &'static str = "z[i] = params.a * x[i] + params.b * y[i];";
    const BINDINGS: &'static [BindingDeclaration] = &[
        BindingDeclaration::read_only("x"),
        BindingDeclaration::read_only("y"),
        BindingDeclaration::read_write("z"),
    ];
}

/// `y[i] = a*x[i]`.
pub(crate) struct Scale;

impl Kernel for Scale {
    const LABEL: &'static str = "scale";
    const BODY: &'static str = "y[i] = params.a * x[i];";
    const BINDINGS: &'static [BindingDeclaration] = &[
        BindingDeclaration::read_only("x"),
        BindingDeclaration::read_write("y"),
    ];
}

/// `x[i] = a`.
pub(crate) struct Fill;

impl Kernel for Fill {
    const LABEL: &'static str = "fill";
    const BODY: &'static str = "x[i] = params.a;";
    const BINDINGS: &'static [BindingDeclaration] = &[BindingDeclaration::read_write("x")];
}

impl GpuArray<f32> {
    async fn scaled_combine(
        &self,
        self_factor: f32,
        other: &Self,
        other_factor: f32,
    ) -> Result<Self, KernelError> {
        self.gpu.check_same(other.gpu())?;

        if self.shape() != other.shape() {
            return Err(ShapeMismatch::new(self.shape(), other.shape()).into());
        }

        let context = self.context().join(other.context())?;

        let result = Self::with_context(self.gpu(), self.shape().to_vec(), context.clone());
        let launch = LaunchShape::for_size(self.size());

        self.gpu
            .run_kernel::<ScaledCombine>(
                KernelParams::new(self_factor, other_factor, self.size()),
                &[&self.buffer, &other.buffer, &result.buffer],
                launch,
                &context,
            )
            .await?;

        Ok(result)
    }

    /// Elementwise sum into a freshly allocated array.
    ///
    /// Both operands must have identical shapes; there is no broadcasting. If
    /// both are bound to streams, the streams must be the same stream.
    pub async fn add(&self, other: &Self) -> Result<Self, KernelError> {
        self.scaled_combine(1., other, 1.).await
    }

    /// Elementwise difference into a freshly allocated array. Same
    /// preconditions as [`add`](Self::add).
    pub async fn sub(&self, other: &Self) -> Result<Self, KernelError> {
        self.scaled_combine(1., other, -1.).await
    }

    /// Multiply every element by `factor`, into a freshly allocated array.
    pub async fn scale(&self, factor: f32) -> Result<Self, KernelError> {
        let context = self.context().clone();

        let result = Self::with_context(self.gpu(), self.shape().to_vec(), context.clone());
        let launch = LaunchShape::for_size(self.size());

        self.gpu
            .run_kernel::<Scale>(
                KernelParams::new(factor, 0., self.size()),
                &[&self.buffer, &result.buffer],
                launch,
                &context,
            )
            .await?;

        Ok(result)
    }

    pub async fn neg(&self) -> Result<Self, KernelError> {
        self.scale(-1.).await
    }

    /// Write `value` into every slot of a freshly allocated array of the same
    /// shape, and return that array. The receiver's own storage is left
    /// untouched.
    pub async fn fill(&self, value: f32) -> Result<Self, KernelError> {
        let context = self.context().clone();

        let result = Self::with_context(self.gpu(), self.shape().to_vec(), context.clone());
        let launch = LaunchShape::for_size(self.size());

        self.gpu
            .run_kernel::<Fill>(
                KernelParams::new(value, 0., self.size()),
                &[&result.buffer],
                launch,
                &context,
            )
            .await?;

        Ok(result)
    }
}

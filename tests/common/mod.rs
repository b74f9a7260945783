use gpuarray::Gpu;
use tokio::sync::OnceCell;

static GPU: OnceCell<Gpu> = OnceCell::const_new();

pub async fn gpu() -> Gpu {
    let gpu = GPU
        .get_or_init(|| async { Gpu::new().await.unwrap() })
        .await;
    gpu.clone()
}

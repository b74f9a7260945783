#![allow(dead_code)]

mod common;

use common::gpu;
use gpuarray::{
    error::KernelError,
    ExecutionContext,
    GpuArray,
};
use pretty_assertions::assert_eq;

const X: [f32; 4] = [1., 2., 3., 4.];
const Y: [f32; 4] = [10., 20., 30., 40.];

fn cpu_binary_elementwise(d1: &[f32], d2: &[f32], mut f: impl FnMut(f32, f32) -> f32) -> Vec<f32> {
    d1.iter().zip(d2).map(|(&a, &b)| f(a, b)).collect()
}

#[tokio::test]
async fn it_adds_elementwise() {
    let gpu = gpu().await;

    let x = GpuArray::from_slice(&gpu, [4], &X).unwrap();
    let y = GpuArray::from_slice(&gpu, [4], &Y).unwrap();

    let z = x.add(&y).await.unwrap();

    assert_eq!(z.get().await.unwrap(), [11., 22., 33., 44.]);
}

#[tokio::test]
async fn it_subtracts_elementwise() {
    let gpu = gpu().await;

    let x = GpuArray::from_slice(&gpu, [4], &X).unwrap();
    let y = GpuArray::from_slice(&gpu, [4], &Y).unwrap();

    let z = y.sub(&x).await.unwrap();

    assert_eq!(z.get().await.unwrap(), [9., 18., 27., 36.]);
}

#[tokio::test]
async fn it_scales_by_a_factor() {
    let gpu = gpu().await;

    let x = GpuArray::from_slice(&gpu, [4], &X).unwrap();

    let y = x.scale(2.).await.unwrap();

    assert_eq!(y.get().await.unwrap(), [2., 4., 6., 8.]);
}

#[tokio::test]
async fn it_negates() {
    let gpu = gpu().await;

    let x = GpuArray::from_slice(&gpu, [4], &X).unwrap();

    let y = x.neg().await.unwrap();

    assert_eq!(y.get().await.unwrap(), [-1., -2., -3., -4.]);
}

#[tokio::test]
async fn fill_returns_a_new_array_and_leaves_the_receiver_alone() {
    let gpu = gpu().await;

    let x = GpuArray::from_slice(&gpu, [4], &X).unwrap();

    let filled = x.fill(7.).await.unwrap();

    assert_eq!(filled.get().await.unwrap(), [7., 7., 7., 7.]);
    assert_eq!(x.get().await.unwrap(), X);
}

#[tokio::test]
async fn zeros_reads_back_as_zero() {
    let gpu = gpu().await;

    let z = GpuArray::zeros(&gpu, [3, 5]).await.unwrap();

    assert_eq!(z.get().await.unwrap(), vec![0.0f32; 15]);
}

#[tokio::test]
async fn results_chain() {
    let gpu = gpu().await;

    let x = GpuArray::from_slice(&gpu, [4], &X).unwrap();
    let y = GpuArray::from_slice(&gpu, [4], &Y).unwrap();

    // (x + y) * 2 - y
    let z = x.add(&y).await.unwrap();
    let z = z.scale(2.).await.unwrap();
    let z = z.sub(&y).await.unwrap();

    assert_eq!(z.get().await.unwrap(), [12., 24., 36., 48.]);
}

/// A size deep in the strided regime, where each thread covers several
/// elements.
#[tokio::test]
async fn it_adds_large_arrays() {
    let gpu = gpu().await;

    let n = 33_333;
    let d1: Vec<f32> = (0..n).map(|i| i as f32).collect();
    let d2: Vec<f32> = (0..n).map(|i| (2 * i) as f32).collect();

    let x = GpuArray::from_slice(&gpu, [n], &d1).unwrap();
    let y = GpuArray::from_slice(&gpu, [n], &d2).unwrap();

    let z = x.add(&y).await.unwrap();

    assert_eq!(
        z.get().await.unwrap(),
        cpu_binary_elementwise(&d1, &d2, |a, b| a + b)
    );
}

#[tokio::test]
async fn empty_arrays_dispatch_without_crashing() {
    let gpu = gpu().await;

    let x = GpuArray::<f32>::from_slice(&gpu, [0], &[]).unwrap();
    let y = GpuArray::<f32>::from_slice(&gpu, [0], &[]).unwrap();

    let z = x.add(&y).await.unwrap();

    assert_eq!(z.get().await.unwrap(), Vec::<f32>::new());
}

#[tokio::test]
async fn mismatched_shapes_are_rejected() {
    let gpu = gpu().await;

    let x = GpuArray::from_slice(&gpu, [4], &X).unwrap();
    let y = GpuArray::from_slice(&gpu, [5], &[1., 2., 3., 4., 5.]).unwrap();

    let result = x.add(&y).await;

    assert!(matches!(result, Err(KernelError::ShapeMismatch(_))));
}

#[tokio::test]
async fn same_stream_operands_combine() {
    let gpu = gpu().await;
    let stream = gpu.create_stream("worker");

    let x = GpuArray::with_context(&gpu, [4], ExecutionContext::Stream(stream.clone()));
    let y = GpuArray::with_context(&gpu, [4], ExecutionContext::Stream(stream.clone()));
    x.set(&X).unwrap();
    y.set(&Y).unwrap();

    let z = x.add(&y).await.unwrap();

    assert!(z.context().stream().unwrap().is_same(&stream));
    assert_eq!(z.get().await.unwrap(), [11., 22., 33., 44.]);
}

#[tokio::test]
async fn streamless_operand_joins_the_streamed_one() {
    let gpu = gpu().await;
    let stream = gpu.create_stream("worker");

    let x = GpuArray::with_context(&gpu, [4], ExecutionContext::Stream(stream.clone()));
    let y = GpuArray::from_slice(&gpu, [4], &Y).unwrap();
    x.set(&X).unwrap();

    let z = x.add(&y).await.unwrap();

    assert!(z.context().stream().unwrap().is_same(&stream));
}

#[tokio::test]
async fn distinct_streams_are_rejected() {
    let gpu = gpu().await;

    let x = GpuArray::with_context(&gpu, [4], ExecutionContext::Stream(gpu.create_stream("a")));
    let y = GpuArray::with_context(&gpu, [4], ExecutionContext::Stream(gpu.create_stream("b")));
    x.set(&X).unwrap();
    y.set(&Y).unwrap();

    let result = x.add(&y).await;

    assert!(matches!(result, Err(KernelError::StreamMismatch(_))));
}

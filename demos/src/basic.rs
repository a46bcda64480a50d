use deferral_backends::cpu::CpuBackend;
use deferral_core::{Layout, LazyTensor, Operand, Runnable, Tensor};
use deferral_ops::{LazyOps, Softmax};
use deferral_storage::cpu::CpuStorage;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let input = LazyTensor::from(Tensor::new(
        Layout::new(vec![2, 2, 2]),
        CpuStorage {
            data: vec![1.0f32, 2.0, -3.0, -4.0, 5.0, 6.0, -7.0, -8.0],
        },
    ));
    let weights = LazyTensor::from(Tensor::new(
        Layout::new(vec![2, 3]),
        CpuStorage {
            data: vec![0.5f32, -1.0, 0.25, 1.0, 0.0, -0.5],
        },
    ));

    let hidden = input
        .sum::<CpuBackend>(2, false)?
        .relu::<CpuBackend>()?
        .matmul::<CpuBackend>(&weights)?
        .add::<CpuBackend>(Operand::scalar(1.0))?;
    let probs = hidden.softmax::<CpuBackend>()?;

    info!(
        "Built graph: shape {:?}, dtype {}, device {}",
        probs.shape(),
        probs.dtype(),
        probs.device()
    );

    let result = probs.run()?;
    info!("Result: {:?}", result.to_vec());

    Ok(())
}

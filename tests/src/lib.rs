#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use deferral_backends::cpu::{
        CpuBackend,
        ops::{
            CpuAdd, CpuDivide, CpuMatmul, CpuMaximum, CpuMinimum, CpuMultiply, CpuPow,
            CpuRemainder, CpuSubtract, CpuTruncDivide,
        },
    };
    use deferral_core::{
        DType, Device, Kwargs, LazyError, LazyFunction, LazyTensor, Operand, Result, Runnable,
        Storage, Tensor, TensorMeta, backends::broadcast::BroadcastFunc, lift,
    };
    use deferral_ops::{LazyOps, functions};
    use deferral_storage::cpu::{CpuDtype, CpuStorage};

    type B = CpuBackend;
    type S = CpuStorage<f64>;

    type BinaryFn<S> = fn(Operand<S>, Operand<S>) -> Result<LazyTensor<S>>;
    type BinaryCase<S> = (&'static str, BinaryFn<S>, &'static dyn BroadcastFunc<S>);

    fn iota(shape: &[usize]) -> Tensor<S> {
        let count = shape.iter().product::<usize>();
        let data = (0..count).map(|i| i as f64 * 0.5 - 1.0).collect();
        Tensor::from_vec(shape.to_vec(), data).unwrap()
    }

    /// A delayed node whose value is `tensor`.
    fn deferred<T: Storage>(tensor: Tensor<T>) -> LazyTensor<T> {
        functions::positive(tensor).unwrap()
    }

    fn binary_cases<U: CpuDtype>() -> [BinaryCase<CpuStorage<U>>; 9] {
        [
            ("add", |a, b| functions::add::<B, _>(a, b), &CpuAdd),
            ("sub", |a, b| functions::sub::<B, _>(a, b), &CpuSubtract),
            ("mul", |a, b| functions::mul::<B, _>(a, b), &CpuMultiply),
            ("div", |a, b| functions::div::<B, _>(a, b), &CpuDivide),
            ("div_trunc", |a, b| functions::div_trunc::<B, _>(a, b), &CpuTruncDivide),
            ("remainder", |a, b| functions::remainder::<B, _>(a, b), &CpuRemainder),
            ("pow", |a, b| functions::pow::<B, _>(a, b), &CpuPow),
            ("maximum", |a, b| functions::maximum::<B, _>(a, b), &CpuMaximum),
            ("minimum", |a, b| functions::minimum::<B, _>(a, b), &CpuMinimum),
        ]
    }

    /// The four concrete/deferred pairings of two tensors.
    fn pairings<T: Storage>(a: &Tensor<T>, b: &Tensor<T>) -> Vec<(Operand<T>, Operand<T>)> {
        let concrete = |t: &Tensor<T>| Operand::from(t.clone());
        let lazy = |t: &Tensor<T>| Operand::from(deferred(t.clone()));
        vec![
            (concrete(a), concrete(b)),
            (concrete(a), lazy(b)),
            (lazy(a), concrete(b)),
            (lazy(a), lazy(b)),
        ]
    }

    fn check_composition<U: CpuDtype>(a: Tensor<CpuStorage<U>>, b: Tensor<CpuStorage<U>>) {
        for (name, op, kernel) in binary_cases::<U>() {
            let expected = a.broadcast(&b, kernel).unwrap().to_vec();
            for (lhs, rhs) in pairings(&a, &b) {
                let node = op(lhs, rhs).unwrap();
                assert!(node.is_delayed(), "{name} must defer");
                assert_eq!(node.to_vec().unwrap(), expected, "{name}");
            }
        }
    }

    #[test]
    fn test_composition_equivalence_integers() {
        let a = Tensor::<CpuStorage<i64>>::scalar(4);
        let b = Tensor::<CpuStorage<i64>>::scalar(3);
        check_composition(a.clone(), b.clone());

        for (lhs, rhs) in pairings(&a, &b) {
            assert_eq!(functions::add::<B, _>(lhs, rhs).unwrap().item().unwrap(), 7);
        }
    }

    #[test]
    fn test_composition_equivalence_floats() {
        let a = Tensor::<S>::from_vec(vec![2, 3], vec![0.5, 1.0, 1.5, 2.0, 2.5, 3.0]).unwrap();
        let b = Tensor::<S>::from_vec(vec![3], vec![1.5, -2.0, 4.0]).unwrap();
        check_composition(a, b);

        let a = Tensor::<S>::scalar(4.0);
        let b = Tensor::<S>::scalar(3.0);
        for (lhs, rhs) in pairings(&a, &b) {
            let quotient = functions::div::<B, _>(lhs, rhs).unwrap();
            assert!((quotient.to_f64().unwrap() - (4.0 / 3.0)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_evaluation_transparency() {
        let tensor = Arc::new(iota(&[2, 2]));
        let lifted = lift(Operand::from(Arc::clone(&tensor))).unwrap();
        let value = lifted.run().unwrap();
        assert!(Arc::ptr_eq(&value, &tensor));
        assert_eq!(lifted.meta(), tensor.meta());

        let scalar = lift(Operand::<S>::scalar(2.5)).unwrap();
        assert_eq!(scalar.item().unwrap(), 2.5);

        let array = lift(Operand::<S>::array(vec![3], vec![1.0, 2.0, 3.0])).unwrap();
        assert_eq!(array.run().unwrap().to_vec(), vec![1.0, 2.0, 3.0]);

        let node = deferred(iota(&[3]));
        assert_eq!(lift(Operand::from(&node)).unwrap(), node);
    }

    #[test]
    fn test_no_structural_deduplication() {
        let a = Tensor::<S>::scalar(1.0);
        let first = functions::add::<B, _>(a.clone(), Operand::scalar(2.0)).unwrap();
        let second = functions::add::<B, _>(a, Operand::scalar(2.0)).unwrap();

        assert_ne!(first.id(), second.id());
        assert_ne!(first, second);
        assert_eq!(first.item().unwrap(), second.item().unwrap());

        let nodes: HashSet<_> = [first.clone(), second, first].into_iter().collect();
        assert_eq!(nodes.len(), 2);
    }

    fn counting_identity(calls: &Arc<AtomicUsize>) -> LazyFunction<S> {
        let counter = Arc::clone(calls);
        LazyFunction::from_fn(
            "counted",
            move |args: &[Arc<Tensor<S>>], _: &Kwargs<Arc<Tensor<S>>>| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(args[0].as_ref().clone())
            },
            |args: &[Operand<S>], _: &Kwargs<Operand<S>>| args[0].meta(),
        )
    }

    #[test]
    fn test_metadata_without_evaluation() -> anyhow::Result<()> {
        let calls = Arc::new(AtomicUsize::new(0));
        let node = counting_identity(&calls).call([Operand::from(iota(&[2, 5]))])?;

        assert_eq!(node.shape(), &[2, 5]);
        assert_eq!(node.size(-1)?, 5);
        assert_eq!(node.dtype(), DType::F64);
        assert_eq!(node.device(), Device::Cpu);
        assert_eq!(node.meta().num_elements(), 10);

        let parent = node.sum::<B>(0, false)?;
        let grandparent = parent.mul::<B>(&node)?;
        assert!(grandparent.is_delayed());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // Both paths to the counted node are evaluated; nothing is cached.
        grandparent.run()?;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        Ok(())
    }

    #[test]
    fn test_unsupported_operation_signal() {
        let a = deferred(Tensor::<CpuStorage<i64>>::scalar(1));
        let b = deferred(Tensor::<CpuStorage<i64>>::scalar(2));

        let err = functions::floor_div(&a, &b).unwrap_err();
        assert!(err.is_unsupported());
        assert!(a.floor_div(&b).unwrap_err().is_unsupported());

        let truncated = a.div_trunc::<B>(&b).unwrap();
        assert_eq!(truncated.item().unwrap(), 0);
    }

    fn assert_kernel_error<T: Storage>(node: Result<LazyTensor<T>>) {
        let node = node.expect("overflow is only visible at evaluation");
        assert!(node.is_delayed());
        match node.run() {
            Err(LazyError::Kernel(_)) => {}
            other => panic!("expected a kernel error, got {other:?}"),
        }
    }

    #[test]
    fn test_integer_overflow_is_a_kernel_error() {
        type I32 = CpuStorage<i32>;
        let max = Tensor::<I32>::scalar(i32::MAX);
        let min = deferred(Tensor::<I32>::scalar(i32::MIN));

        assert_kernel_error(functions::add::<B, _>(max.clone(), Operand::scalar(1)));
        assert_kernel_error(functions::mul::<B, _>(max.clone(), Operand::scalar(2)));
        assert_kernel_error(functions::sub::<B, _>(&min, Operand::scalar(1)));
        assert_kernel_error(min.neg::<B>());
        assert_kernel_error(min.abs::<B>());

        let pair = Tensor::<I32>::from_vec(vec![2], vec![i32::MAX, 1]).unwrap();
        assert_kernel_error(functions::sum::<B, _>(pair.clone(), 0, false));
        let ones = Tensor::<I32>::from_vec(vec![2], vec![1, 1]).unwrap();
        assert_kernel_error(functions::matmul::<B, _>(pair, ones));

        // The failure surfaces through every parent that depends on it.
        let overflowed = functions::add::<B, _>(max, Operand::scalar(1)).unwrap();
        assert_kernel_error(overflowed.maximum::<B>(Operand::scalar(0)));

        let within_range = functions::add::<B, _>(&min, Operand::scalar(1)).unwrap();
        assert_eq!(within_range.item().unwrap(), i32::MIN + 1);
    }

    #[test]
    fn test_chained_graph() -> anyhow::Result<()> {
        let a = iota(&[2, 2]);
        let b = Tensor::<S>::from_vec(vec![2], vec![10.0, 20.0])?;
        let c = Tensor::<S>::from_vec(vec![2, 1], vec![2.0, -1.0])?;

        let lazy = functions::mul::<B, _>(functions::add::<B, _>(a.clone(), b.clone())?, c.clone())?;
        let direct = a.broadcast(&b, &CpuAdd)?.broadcast(&c, &CpuMultiply)?;

        assert_eq!(lazy.shape(), direct.shape());
        assert_eq!(lazy.to_vec()?, direct.to_vec());
        Ok(())
    }

    #[test]
    fn test_binding_equivalence() {
        let x = deferred(iota(&[3]));
        let y = iota(&[3]);

        let adapter = functions::broadcast_fn::<S>(Arc::new(CpuSubtract));
        let direct = adapter
            .call([Operand::from(&x), Operand::from(y.clone())])
            .unwrap();
        let bound = adapter.bind(&x).call([Operand::from(y.clone())]).unwrap();
        let method = x.sub::<B>(y).unwrap();

        assert_eq!(direct.meta(), bound.meta());
        assert_eq!(direct.meta(), method.meta());
        assert_eq!(direct.to_vec().unwrap(), bound.to_vec().unwrap());
        assert_eq!(direct.to_vec().unwrap(), method.to_vec().unwrap());
    }

    #[test]
    fn test_named_children_are_evaluated() {
        let x = iota(&[4]);
        let upper = deferred(Tensor::<S>::scalar(0.25));
        let clamped = functions::clamp::<B, _>(x, None, Some(Operand::from(&upper))).unwrap();

        let LazyTensor::Delayed(node) = &clamped else {
            panic!("clamp must defer");
        };
        assert_eq!(node.kwargs().get("max"), Some(&upper));
        assert_eq!(clamped.to_vec().unwrap(), vec![-1.0, -0.5, 0.0, 0.25]);
    }

    #[test]
    fn test_combine_partials_along_rows() -> anyhow::Result<()> {
        let a = iota(&[4, 3]);
        let b = iota(&[3, 2]);
        let node = functions::matmul::<B, _>(a.clone(), b.clone())?;
        let LazyTensor::Delayed(delayed) = &node else {
            panic!("matmul must defer");
        };

        let rows = a.to_vec();
        let partials = rows
            .chunks(6)
            .map(|chunk| Tensor::<S>::from_vec(vec![2, 3], chunk.to_vec())?.matmul(&b, &CpuMatmul))
            .collect::<Result<Vec<_>>>()?;

        let combined = delayed.combine_partials(0, partials)?;
        assert_eq!(combined.to_vec(), node.to_vec()?);

        let short = delayed.combine_partials(0, vec![iota(&[2, 3]).matmul(&b, &CpuMatmul)?]);
        assert!(matches!(short, Err(LazyError::ShapeMismatch { .. })));

        let summed = node.sum::<B>(-1, false)?;
        let LazyTensor::Delayed(summed) = &summed else {
            panic!("sum must defer");
        };
        assert!(summed.reducer(0).is_none());
        assert!(summed.combine_partials(0, Vec::new()).unwrap_err().is_unsupported());
        Ok(())
    }

    #[test]
    fn test_shape_mismatch_detection() {
        let lying = LazyFunction::<S>::from_fn(
            "lying",
            |args: &[Arc<Tensor<S>>], _: &Kwargs<Arc<Tensor<S>>>| Ok(args[0].as_ref().clone()),
            |_: &[Operand<S>], _: &Kwargs<Operand<S>>| {
                Ok(TensorMeta::new(vec![7], DType::F64, Device::Cpu))
            },
        );
        let node = lying.call([Operand::from(iota(&[2]))]).unwrap();
        assert_eq!(node.shape(), &[7]);

        let parent = node.exp::<B>().unwrap();
        match parent.run() {
            Err(LazyError::ShapeMismatch { op, expected, found }) => {
                assert_eq!(op, "lying");
                assert_eq!(expected, vec![7]);
                assert_eq!(found, vec![2]);
            }
            other => panic!("expected a shape mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_descriptor_agreement_across_operator_set() {
        let x = deferred(iota(&[2, 3]));
        let nodes = vec![
            x.neg::<B>(),
            x.abs::<B>(),
            x.exp::<B>(),
            x.sin::<B>(),
            x.cos::<B>(),
            x.tanh::<B>(),
            x.relu::<B>(),
            x.positive(),
            x.add::<B>(iota(&[3])),
            x.mul::<B>(iota(&[2, 1])),
            x.maximum::<B>(Operand::scalar(0.0)),
            x.sum::<B>(0, false),
            x.sum::<B>(-1, true),
            x.matmul::<B>(iota(&[3, 4])),
            x.matmul::<B>(iota(&[3])),
            x.reshape(vec![3, 2]),
            x.clamp::<B>(Some(Operand::scalar(-0.5)), None),
        ];
        for node in nodes {
            let node = node.unwrap();
            let value = node.run().unwrap();
            assert_eq!(node.shape(), value.shape());
            assert_eq!(node.dtype(), value.dtype());
        }
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        fn broadcast_pair() -> impl Strategy<Value = (Vec<usize>, Vec<usize>)> {
            prop::collection::vec((1usize..4, any::<bool>()), 0..4).prop_flat_map(|dims| {
                let lhs = dims.iter().map(|(d, _)| *d).collect::<Vec<_>>();
                let rhs = dims
                    .iter()
                    .map(|(d, squeeze)| if *squeeze { 1 } else { *d })
                    .collect::<Vec<_>>();
                let len = rhs.len();
                (Just(lhs), (0..=len).prop_map(move |skip| rhs[skip..].to_vec()))
            })
        }

        proptest! {
            #[test]
            fn prop_broadcast_descriptor_agrees((lhs, rhs) in broadcast_pair(), swap in any::<bool>()) {
                let (lhs, rhs) = if swap { (rhs, lhs) } else { (lhs, rhs) };
                let node = functions::add::<B, _>(deferred(iota(&lhs)), iota(&rhs)).unwrap();
                let value = node.run().unwrap();
                prop_assert_eq!(node.shape(), value.shape());
            }

            #[test]
            fn prop_matmul_descriptor_agrees(
                batch in 0usize..3,
                m in 1usize..4,
                k in 1usize..4,
                n in 1usize..4,
                vector_lhs in any::<bool>(),
            ) {
                let lhs = if vector_lhs { vec![k] } else { vec![m, k] };
                let mut rhs = vec![k, n];
                if batch > 0 {
                    rhs.insert(0, batch);
                }
                let node = functions::matmul::<B, _>(iota(&lhs), deferred(iota(&rhs))).unwrap();
                let value = node.run().unwrap();
                prop_assert_eq!(node.shape(), value.shape());
            }

            #[test]
            fn prop_sum_descriptor_agrees(
                shape in prop::collection::vec(1usize..4, 1..4),
                dim in any::<prop::sample::Index>(),
                keepdim in any::<bool>(),
            ) {
                let dim = dim.index(shape.len()) as i32;
                let node = functions::sum::<B, _>(deferred(iota(&shape)), dim, keepdim).unwrap();
                let value = node.run().unwrap();
                prop_assert_eq!(node.shape(), value.shape());
                prop_assert_eq!(node.shape().len(), if keepdim { shape.len() } else { shape.len() - 1 });
            }
        }
    }
}

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::assert_panic;
use crate::errors::TensorError;
use crate::tensor::Tensor;

#[test]
fn test_new_and_try_new() {
    let tensor = Tensor::new(&[1., 2., 3., 4., 5., 6.], &[2, 3]);
    assert_eq!(tensor.shape(), &[2, 3]);
    assert_eq!(tensor.get(&[1, 0]), 4.);

    assert_eq!(
        Tensor::try_new(&[1., 2., 3.], &[2, 2]),
        Err(TensorError::DataShapeMismatch {
            data_len: 3,
            shape: vec![2, 2],
        })
    );
    assert_panic!(Tensor::new(&[1., 2., 3.], &[2, 2]));
}

#[test]
fn test_constant_constructors() {
    assert_eq!(Tensor::zeros(&[2, 2]).to_vec(), vec![0.; 4]);
    assert_eq!(Tensor::ones(&[3]).to_vec(), vec![1.; 3]);
    assert_eq!(Tensor::filled(0.5, &[1, 2]).to_vec(), vec![0.5, 0.5]);
    assert_eq!(Tensor::scalar(7.).number(), Some(7.));

    let like = Tensor::new(&[1., 2., 3., 4., 5., 6.], &[3, 2]);
    assert_eq!(Tensor::zeros_like(&like).shape(), &[3, 2]);
}

#[test]
fn test_new_random_stays_in_range() {
    let mut rng = StdRng::seed_from_u64(42);
    let tensor = Tensor::new_random(-0.5, 0.5, &[10, 10], &mut rng);
    assert_eq!(tensor.size(), 100);
    assert!(tensor.to_vec().iter().all(|x| (-0.5..=0.5).contains(x)));
}

#[test]
fn test_new_normal_is_seeded_and_centered() {
    let a = Tensor::new_normal(0., 1., &[1000], &mut StdRng::seed_from_u64(7));
    let b = Tensor::new_normal(0., 1., &[1000], &mut StdRng::seed_from_u64(7));
    assert_eq!(a, b);
    assert!(a.mean().abs() < 0.15);
    assert!(a.to_vec().iter().all(|x| x.is_finite()));
}

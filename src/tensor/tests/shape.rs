use crate::assert_panic;
use crate::errors::TensorError;
use crate::tensor::Tensor;

#[test]
fn test_reshape_and_transpose() {
    let t = Tensor::new(&[1., 2., 3., 4., 5., 6.], &[2, 3]);
    assert_eq!(t.reshape(&[3, 2]).shape(), &[3, 2]);
    assert_eq!(t.reshape(&[6]).to_vec(), t.to_vec());
    assert_panic!(t.reshape(&[4, 2]));

    let transposed = t.transpose();
    assert_eq!(transposed.shape(), &[3, 2]);
    assert_eq!(transposed.to_vec(), vec![1., 4., 2., 5., 3., 6.]);
}

#[test]
fn test_concat_and_split() {
    let a = Tensor::new(&[1., 2., 3., 4.], &[2, 2]);
    let b = Tensor::new(&[5., 6.], &[2, 1]);
    let joined = Tensor::concat(&[&a, &b], 1).unwrap();
    assert_eq!(joined.shape(), &[2, 3]);
    assert_eq!(joined.to_vec(), vec![1., 2., 5., 3., 4., 6.]);

    let parts = joined.split(1, &[2, 1]).unwrap();
    assert_eq!(parts, vec![a.clone(), b.clone()]);
}

#[test]
fn test_concat_and_split_errors() {
    let a = Tensor::new(&[1., 2., 3., 4.], &[2, 2]);
    let b = Tensor::new(&[5., 6., 7.], &[3, 1]);
    assert!(matches!(
        Tensor::concat(&[&a, &b], 1),
        Err(TensorError::OperatorError { .. })
    ));
    assert_eq!(Tensor::concat(&[], 0), Err(TensorError::EmptyList));
    assert_eq!(
        Tensor::concat(&[&a], 2),
        Err(TensorError::AxisOutOfRange { axis: 2, rank: 2 })
    );
    assert_eq!(a.split(0, &[1, 2]), Err(TensorError::IncompatibleShape));
}

#[test]
fn test_slice_batch() {
    let t = Tensor::new(&[1., 2., 3., 4., 5., 6.], &[3, 2]);
    assert_eq!(t.slice_batch(1, 3).to_vec(), vec![3., 4., 5., 6.]);
    // 末端越界时截断
    assert_eq!(t.slice_batch(2, 10).shape(), &[1, 2]);
}

use crate::assert_panic;
use crate::tensor::Tensor;

#[test]
fn test_tensor_with_tensor() {
    let a = Tensor::new(&[1., 2., 3., 4.], &[2, 2]);
    let b = Tensor::new(&[4., 3., 2., 1.], &[2, 2]);
    assert_eq!((&a + &b).to_vec(), vec![5., 5., 5., 5.]);
    assert_eq!((&a - &b).to_vec(), vec![-3., -1., 1., 3.]);
    assert_eq!((&a * &b).to_vec(), vec![4., 6., 6., 4.]);
    assert_eq!((&a / &b).to_vec(), vec![0.25, 2. / 3., 1.5, 4.]);
    // 所有权版本与引用版本结果一致
    assert_eq!(a.clone() + b.clone(), &a + &b);
    assert_eq!(a.clone() * &b, &a * b.clone());
}

#[test]
fn test_tensor_with_number() {
    let a = Tensor::new(&[1., 2.], &[2]);
    assert_eq!((&a + 1.).to_vec(), vec![2., 3.]);
    assert_eq!((1. - &a).to_vec(), vec![0., -1.]);
    assert_eq!((a.clone() * 2.).to_vec(), vec![2., 4.]);
    assert_eq!((2. / a.clone()).to_vec(), vec![2., 1.]);
    assert_eq!((-&a).to_vec(), vec![-1., -2.]);
}

#[test]
fn test_broadcast() {
    let matrix = Tensor::new(&[1., 2., 3., 4., 5., 6.], &[2, 3]);
    let row = Tensor::new(&[10., 20., 30.], &[3]);
    let result = &matrix + &row;
    assert_eq!(result.shape(), &[2, 3]);
    assert_eq!(result.to_vec(), vec![11., 22., 33., 14., 25., 36.]);
}

#[test]
fn test_incompatible_shapes_panic() {
    let a = Tensor::new(&[1., 2., 3.], &[3]);
    let b = Tensor::new(&[1., 2.], &[2]);
    assert_panic!(&a + &b);
}

#[test]
fn test_mat_mul() {
    let a = Tensor::new(&[1., 2., 3., 4., 5., 6.], &[2, 3]);
    let b = Tensor::new(&[1., 0., 0., 1., 1., 1.], &[3, 2]);
    let product = a.mat_mul(&b);
    assert_eq!(product.shape(), &[2, 2]);
    assert_eq!(product.to_vec(), vec![4., 5., 10., 11.]);
    assert_panic!(a.mat_mul(&a));
}

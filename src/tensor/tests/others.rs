use approx::assert_abs_diff_eq;

use crate::tensor::Tensor;

#[test]
fn test_elementwise_functions() {
    let t = Tensor::new(&[-4., 0., 9.], &[3]);
    assert_eq!(t.abs().to_vec(), vec![4., 0., 9.]);
    assert_eq!(t.sign().to_vec(), vec![-1., 0., 1.]);
    assert_eq!(t.square().to_vec(), vec![16., 0., 81.]);
    assert_eq!(t.abs().sqrt().to_vec(), vec![2., 0., 3.]);
    assert_eq!(t.clip(-1., 1.).to_vec(), vec![-1., 0., 1.]);
    assert_eq!(t.relu().to_vec(), vec![0., 0., 9.]);
    assert_eq!(t.powi(3).to_vec(), vec![-64., 0., 729.]);
}

#[test]
fn test_where_and_maximum() {
    let condition = Tensor::new(&[1., 0., 1.], &[3]);
    let a = Tensor::new(&[1., 2., 3.], &[3]);
    let b = Tensor::new(&[-1., -2., -3.], &[3]);
    assert_eq!(Tensor::where_(&condition, &a, &b).to_vec(), vec![1., -2., 3.]);
    assert_eq!(a.maximum(&Tensor::new(&[0., 5., 0.], &[3])).to_vec(), vec![1., 5., 3.]);
}

#[test]
fn test_reductions() {
    let t = Tensor::new(&[1., 2., 3., 4., 5., 6.], &[2, 3]);
    assert_eq!(t.sum(), 21.);
    assert_eq!(t.mean(), 3.5);
    assert_eq!(t.sum_axis(0).to_vec(), vec![5., 7., 9.]);
    assert_eq!(t.sum_axis(1).to_vec(), vec![6., 15.]);
}

#[test]
fn test_activations() {
    let t = Tensor::new(&[0., 1., 2., 0.], &[2, 2]);
    assert_abs_diff_eq!(t.sigmoid().get(&[0, 0]), 0.5, epsilon = 1e-6);
    assert_abs_diff_eq!(t.tanh().get(&[0, 1]), 1f32.tanh(), epsilon = 1e-6);

    let softmax = t.softmax();
    // 每行之和为1
    assert_abs_diff_eq!(softmax.sum_axis(1).get(&[0]), 1., epsilon = 1e-6);
    assert_abs_diff_eq!(softmax.sum_axis(1).get(&[1]), 1., epsilon = 1e-6);
    assert!(softmax.get(&[0, 1]) > softmax.get(&[0, 0]));
}

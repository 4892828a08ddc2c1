use approx::assert_abs_diff_eq;

use crate::assert_err;
use crate::nn::layer::{ActivationFn, Concatenate, Dense, Dropout, Elementwise, Input, Layer};
use crate::nn::{Connection, ErrorFunction, GraphError, Item, join, parallel, sequential};
use crate::tensor::Tensor;

fn input(shape: &[usize]) -> Layer {
    Layer::new(Input::new(shape))
}

/// 逐元素扰动每个参数，用中心差分验证`gradients`
fn check_gradients(conn: &mut Connection, inputs: &[Tensor], targets: &[Tensor], error: ErrorFunction) {
    const DELTA: f32 = 1e-2;
    let analytic = conn.gradients(inputs, targets, error).unwrap();
    let names = conn
        .parameters()
        .map(|(_, p)| p.name().to_string())
        .collect::<Vec<_>>();
    assert_eq!(analytic.len(), names.len());

    for name in names {
        let original = conn.parameter(&name).unwrap().value().clone();
        let grad = analytic.get(&name).unwrap().to_vec();
        for (i, expected) in grad.into_iter().enumerate() {
            let mut shifted = original.to_vec();
            shifted[i] += DELTA;
            let plus = Tensor::new(&shifted, original.shape());
            shifted[i] -= 2. * DELTA;
            let minus = Tensor::new(&shifted, original.shape());

            conn.parameter_mut(&name).unwrap().set_value(plus);
            let e_plus = conn.gradients(inputs, targets, error).unwrap().error();
            conn.parameter_mut(&name).unwrap().set_value(minus);
            let e_minus = conn.gradients(inputs, targets, error).unwrap().error();
            conn.parameter_mut(&name).unwrap().set_value(original.clone());

            let numeric = (e_plus - e_minus) / (2. * DELTA);
            assert_abs_diff_eq!(numeric, expected, epsilon = 2e-3);
        }
    }
}

#[test]
fn test_output_requires_initialization() {
    let conn = sequential(input(&[2]), Layer::new(Dense::new(1).unwrap())).unwrap();
    assert!(!conn.is_initialized());
    assert_err!(conn.output(&[Tensor::ones(&[1, 2])]), GraphError::NotInitialized(_));

    let conn = sequential(Layer::new(Dense::new(1).unwrap()), Layer::new(Dense::new(1).unwrap()));
    let mut conn = conn.unwrap();
    assert_err!(conn.initialize(), GraphError::UnknownShape(_));
    assert!(!conn.is_initialized());
}

#[test]
fn test_initialize_is_idempotent_and_seeded() {
    let build = || {
        join(vec![
            input(&[3]).into(),
            Layer::named("h", Dense::new(4).unwrap()).into(),
        ])
        .unwrap()
    };
    let mut a = build();
    let mut b = build();
    a.initialize_with_seed(1).unwrap();
    b.initialize_with_seed(1).unwrap();
    assert_eq!(a.parameter("h/weight"), b.parameter("h/weight"));
    assert_eq!(a.parameter_count(), 3 * 4 + 4);

    let before = a.parameter("h/weight").unwrap().clone();
    a.initialize_with_seed(2).unwrap();
    assert_eq!(a.parameter("h/weight"), Some(&before));
    assert!(a.is_initialized());
}

#[test]
fn test_single_tensor_is_shared_by_all_inputs() {
    let conn = parallel(vec![input(&[2]).into(), input(&[2]).into()]).unwrap();
    let x = Tensor::new(&[1., 2.], &[1, 2]);
    let outputs = conn.output(&[x.clone()]).unwrap();
    assert_eq!(outputs, vec![x.clone(), x]);
}

#[test]
fn test_input_count_mismatch() {
    let conn = parallel(vec![
        input(&[2]).into(),
        input(&[2]).into(),
        input(&[2]).into(),
    ])
    .unwrap();
    let x = Tensor::ones(&[1, 2]);
    assert_err!(conn.output(&[x.clone(), x.clone()]), GraphError::InputCount(3, 2));
    assert_eq!(conn.output(&[x.clone(), x.clone(), x]).unwrap().len(), 3);
}

#[test]
fn test_input_shape_is_checked() {
    let conn = Connection::from(input(&[3]));
    assert_err!(conn.output(&[Tensor::ones(&[1, 4])]), GraphError::ShapeMismatch(_));
}

#[test]
fn test_forward_through_merge() {
    let mut conn = join(vec![
        input(&[2]).into(),
        Item::Parallel(vec![vec![], vec![]]),
        Layer::new(Concatenate::new()).into(),
    ])
    .unwrap();
    conn.initialize().unwrap();
    let y = conn.output(&[Tensor::new(&[1., 2.], &[1, 2])]).unwrap();
    assert_eq!(y[0].to_vec(), vec![1., 2., 1., 2.]);

    let trace = conn.propagate(&[Tensor::new(&[1., 2.], &[1, 2])]).unwrap();
    let last = conn.output_layers()[0].id();
    assert_eq!(trace.value(last), Some(&y[0]));
}

#[test]
fn test_gradients_of_dense_network() {
    let mut conn = join(vec![
        input(&[3]).into(),
        Layer::new(Dense::with_activation(4, ActivationFn::Tanh).unwrap()).into(),
        Layer::new(Dense::with_activation(2, ActivationFn::Sigmoid).unwrap()).into(),
    ])
    .unwrap();
    conn.initialize_with_seed(3).unwrap();
    let x = Tensor::new(&[0.5, -1., 2., 1., 0., -0.5], &[2, 3]);
    let y = Tensor::new(&[1., 0., 0., 1.], &[2, 2]);
    check_gradients(&mut conn, &[x.clone()], &[y.clone()], ErrorFunction::Mse);
    check_gradients(&mut conn, &[x], &[y], ErrorFunction::BinaryCrossentropy);
}

#[test]
fn test_gradients_accumulate_over_fan_out() {
    let mut conn = join(vec![
        input(&[2]).into(),
        Layer::new(Dense::new(2).unwrap()).into(),
        Item::Parallel(vec![vec![], vec![Layer::new(Dense::new(2).unwrap()).into()]]),
        Layer::new(Elementwise::add()).into(),
    ])
    .unwrap();
    conn.initialize_with_seed(5).unwrap();
    let x = Tensor::new(&[1., -1., 0.5, 2.], &[2, 2]);
    let y = Tensor::new(&[0., 1., 1., 0.], &[2, 2]);
    check_gradients(&mut conn, &[x], &[y], ErrorFunction::Mse);
}

#[test]
fn test_gradients_target_count() {
    let mut conn = sequential(input(&[2]), Layer::new(Dense::new(1).unwrap())).unwrap();
    conn.initialize().unwrap();
    let x = Tensor::ones(&[1, 2]);
    assert_err!(
        conn.gradients(&[x.clone()], &[], ErrorFunction::Mse),
        GraphError::InputCount(1, 0)
    );
    assert_err!(
        conn.gradients(&[x], &[Tensor::ones(&[1, 2])], ErrorFunction::Mse),
        GraphError::ShapeMismatch(_)
    );
}

#[test]
fn test_dropout_is_identity_without_training() {
    let mut conn = sequential(input(&[50]), Layer::new(Dropout::new(0.9).unwrap())).unwrap();
    let x = Tensor::ones(&[2, 50]);
    let y = conn.without_training(|conn| conn.output(&[x.clone()])).unwrap();
    assert_eq!(y[0], x);
}

#[test]
fn test_dropout_gradient_reaches_zero_inputs() {
    let mut conn = join(vec![
        input(&[2]).into(),
        Layer::named("pre", Dense::new(32).unwrap()).into(),
        Layer::new(Dropout::new(0.5).unwrap()).into(),
        Layer::named("post", Dense::new(1).unwrap()).into(),
    ])
    .unwrap();
    conn.initialize_with_seed(3).unwrap();
    // `pre`输出全为0，被保留的单元仍应把梯度传回`pre/bias`
    conn.parameter_mut("pre/weight")
        .unwrap()
        .set_value(Tensor::zeros(&[2, 32]));
    let x = vec![Tensor::ones(&[4, 2])];
    let y = vec![Tensor::ones(&[4, 1])];
    let grads = conn.gradients(&x, &y, ErrorFunction::Mse).unwrap();
    let bias_grad = grads.get("pre/bias").unwrap().to_vec();
    assert!(bias_grad.iter().any(|&g| g != 0.));
}

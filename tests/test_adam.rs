/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : Adam端到端测试 - 线性可分的二分类玩具数据
 *                 网络结构：Input(2) -> Dense(4, tanh) -> Dense(1, sigmoid)
 */
use graph_descent::nn::layer::{ActivationFn, Dense, Input, Layer};
use graph_descent::nn::optimizer::{Adam, AdamConfig, GradientDescent};
use graph_descent::nn::{GraphError, join};
use graph_descent::tensor::Tensor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 在[-1, 1]²内随机取点，x0 + x1 > 0 为正类
fn separable_data(n: usize, seed: u64) -> (Tensor, Tensor) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut features = Vec::with_capacity(n * 2);
    let mut labels = Vec::with_capacity(n);
    for _ in 0..n {
        let (x0, x1) = (rng.gen_range(-1.0..1.0f32), rng.gen_range(-1.0..1.0f32));
        features.extend([x0, x1]);
        labels.push(if x0 + x1 > 0. { 1. } else { 0. });
    }
    (Tensor::new(&features, &[n, 2]), Tensor::new(&labels, &[n, 1]))
}

#[test]
fn test_adam_decreases_validation_error() -> Result<(), GraphError> {
    let mut network = join(vec![
        Layer::new(Input::new(&[2])).into(),
        Layer::named("hidden", Dense::with_activation(4, ActivationFn::Tanh)?).into(),
        Layer::named("output", Dense::with_activation(1, ActivationFn::Sigmoid)?).into(),
    ])?;
    network.initialize_with_seed(42)?;

    let (train_x, train_y) = separable_data(40, 1);
    let (valid_x, valid_y) = separable_data(20, 2);
    let (train_x, train_y) = (vec![train_x], vec![train_y]);
    let (valid_x, valid_y) = (vec![valid_x], vec![valid_y]);

    let mut optimizer = Adam::new(AdamConfig {
        step: 10.,
        beta2: 0.99,
        epsilon: 1e-4,
        ..Default::default()
    })?;

    let initial_error = optimizer.prediction_error(&mut network, &valid_x, &valid_y)?;
    for epoch in 1..=200 {
        let train_error = optimizer.train_epoch(&mut network, &train_x, &train_y, None)?;
        if epoch % 50 == 0 {
            println!("epoch {epoch}: 训练误差 = {train_error:.6}");
        }
    }
    let final_error = optimizer.prediction_error(&mut network, &valid_x, &valid_y)?;
    println!("验证误差: {initial_error:.6} -> {final_error:.6}");

    assert!(final_error < initial_error);
    assert_eq!(optimizer.epoch(), 201);
    assert!(network.training_state());
    Ok(())
}

use approx::assert_abs_diff_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::*;
use crate::assert_err;

fn rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

/// 给单独的层喂入已知形状，解析后初始化
fn resolved(kind: impl Into<LayerKind>, input_shape: &[usize]) -> Layer {
    let mut layer = Layer::new(kind);
    layer.resolve_shapes(vec![Some(input_shape.to_vec())]).unwrap();
    layer.initialize(&mut rng()).unwrap();
    layer
}

#[test]
fn test_default_names_and_ids() {
    let a = Layer::new(Identity::new());
    let b = Layer::new(Identity::new());
    assert_ne!(a.id(), b.id());
    assert_eq!(a.name(), format!("identity-{}", a.id().0));
    assert_eq!(a.to_string(), format!("identity({})", a.name()));

    let named = Layer::named("hidden", Dense::new(3).unwrap());
    assert_eq!(named.name(), "hidden");
    assert!(named.training_state());
}

#[test]
fn test_input_layer_declares_shape() {
    let input = Layer::new(Input::new(&[3, 8, 8]));
    assert_eq!(input.input_shapes(), &[Some(vec![3, 8, 8])]);
    assert_eq!(input.output_shape(), Some(&vec![3, 8, 8]));

    let mut input = Layer::new(Input::new(&[10]));
    assert_err!(
        input.resolve_shapes(vec![Some(vec![20])]),
        GraphError::ShapeMismatch(msg) if msg.contains(input.name())
    );
    // 出错后形状保持不变
    assert_eq!(input.output_shape(), Some(&vec![10]));
}

#[test]
fn test_dense_shapes_and_parameters() {
    assert_err!(Dense::new(0), GraphError::Configuration { option: "units", .. });

    let layer = Layer::named("fc", Dense::new(4).unwrap());
    // 输入未知时输出形状仍由units决定
    assert_eq!(layer.output_shape(), Some(&vec![4]));
    assert_err!(layer.check_initializable(), GraphError::UnknownShape(_));

    let layer = resolved(Dense::new(4).unwrap(), &[3]);
    let names = layer.parameters().iter().map(|p| p.name().to_string()).collect::<Vec<_>>();
    assert!(names[0].ends_with("/weight") && names[1].ends_with("/bias"));
    assert_eq!(layer.parameters()[0].shape(), &[3, 4]);
    assert_eq!(layer.parameters()[1].shape(), &[4]);
    assert_eq!(layer.parameter_count(), 16);

    let mut bad = Layer::new(Dense::new(4).unwrap());
    assert_err!(bad.resolve_shapes(vec![Some(vec![3, 2])]), GraphError::ShapeMismatch(_));
}

#[test]
fn test_dense_initialize_is_idempotent() {
    let mut layer = resolved(Dense::new(2).unwrap(), &[3]);
    let before = layer.parameters()[0].value().clone();
    layer.initialize(&mut StdRng::seed_from_u64(7)).unwrap();
    assert_eq!(layer.parameters()[0].value(), &before);
}

#[test]
fn test_dense_forward_backward() {
    let mut layer = resolved(Dense::new(2).unwrap(), &[2]);
    for p in layer.parameters_mut() {
        let value = if p.name().ends_with("weight") {
            Tensor::new(&[1., 2., 3., 4.], &[2, 2])
        } else {
            Tensor::new(&[0.5, -0.5], &[2])
        };
        p.set_value(value);
    }
    let x = Tensor::new(&[1., 1.], &[1, 2]);
    let y = layer.forward(&[&x]).unwrap();
    assert_eq!(y.to_vec(), vec![4.5, 5.5]);

    let grad = Tensor::new(&[1., 1.], &[1, 2]);
    let grads = layer.backward(&[&x], &y, &grad).unwrap();
    assert_eq!(grads.inputs[0].to_vec(), vec![3., 7.]);
    assert_eq!(grads.parameters[0].to_vec(), vec![1., 1., 1., 1.]);
    assert_eq!(grads.parameters[1].to_vec(), vec![1., 1.]);
}

#[test]
fn test_uninitialized_dense_forward_fails() {
    let layer = Layer::new(Dense::new(2).unwrap());
    let x = Tensor::ones(&[1, 3]);
    assert_err!(layer.forward(&[&x]), GraphError::NotInitialized(_));
}

#[test]
fn test_activation_derivatives() {
    let y = Tensor::new(&[0.5, 0.25], &[1, 2]);
    let grad = Tensor::ones(&[1, 2]);
    assert_eq!(ActivationFn::Sigmoid.derivative(&y, &grad).to_vec(), vec![0.25, 0.1875]);
    assert_eq!(ActivationFn::Tanh.derivative(&y, &grad).to_vec(), vec![0.75, 0.9375]);
    assert_eq!(ActivationFn::Linear.derivative(&y, &grad), grad);

    // softmax输出对均匀梯度的导数为0
    let y = Tensor::new(&[0.2, 0.3, 0.5], &[1, 3]);
    let dx = ActivationFn::Softmax.derivative(&y, &Tensor::ones(&[1, 3]));
    assert_abs_diff_eq!(dx.abs().sum(), 0., epsilon = 1e-6);

    assert_eq!(Layer::new(Activation::relu()).kind().kind_name(), "relu");
}

#[test]
fn test_conv_output_shape() {
    let conv = Conv2d::new(11, (5, 5)).unwrap();
    assert_eq!(
        conv.output_shape(&[Some(vec![3, 8, 8])]).unwrap(),
        Some(vec![11, 4, 4])
    );
    let padded = Conv2d::new(2, (3, 3)).unwrap().with_padding((1, 1));
    assert_eq!(
        padded.output_shape(&[Some(vec![1, 5, 5])]).unwrap(),
        Some(vec![2, 5, 5])
    );
    let strided = Conv2d::new(2, (3, 3)).unwrap().with_stride((2, 2)).unwrap();
    assert_eq!(
        strided.output_shape(&[Some(vec![1, 7, 7])]).unwrap(),
        Some(vec![2, 3, 3])
    );
    assert_eq!(conv.output_shape(&[None]).unwrap(), None);
    assert_err!(conv.output_shape(&[Some(vec![3, 4, 4])]), GraphError::ShapeMismatch(_));
    assert_err!(conv.output_shape(&[Some(vec![64])]), GraphError::ShapeMismatch(_));
    assert_err!(Conv2d::new(1, (0, 3)), GraphError::Configuration { .. });
}

#[test]
fn test_conv_forward_backward() {
    let mut layer = resolved(Conv2d::new(1, (2, 2)).unwrap(), &[1, 3, 3]);
    assert_eq!(layer.parameters()[0].shape(), &[1, 1, 2, 2]);
    for p in layer.parameters_mut() {
        let value = if p.name().ends_with("weight") {
            Tensor::ones(&[1, 1, 2, 2])
        } else {
            Tensor::new(&[1.], &[1])
        };
        p.set_value(value);
    }
    let x = Tensor::new(&[1., 2., 3., 4., 5., 6., 7., 8., 9.], &[1, 1, 3, 3]);
    let y = layer.forward(&[&x]).unwrap();
    assert_eq!(y.shape(), &[1, 1, 2, 2]);
    assert_eq!(y.to_vec(), vec![13., 17., 25., 29.]);

    let grads = layer.backward(&[&x], &y, &Tensor::ones(&[1, 1, 2, 2])).unwrap();
    // 中心元素被4个窗口覆盖
    assert_eq!(grads.inputs[0].to_vec(), vec![1., 2., 1., 2., 4., 2., 1., 2., 1.]);
    assert_eq!(grads.parameters[0].to_vec(), vec![12., 16., 24., 28.]);
    assert_eq!(grads.parameters[1].to_vec(), vec![4.]);
}

#[test]
fn test_pooling() {
    let pool = MaxPool2d::new((2, 2)).unwrap();
    assert_eq!(
        pool.output_shape(&[Some(vec![16, 4, 4])]).unwrap(),
        Some(vec![16, 2, 2])
    );
    // 奇数尺寸向下取整
    assert_eq!(
        pool.output_shape(&[Some(vec![1, 5, 5])]).unwrap(),
        Some(vec![1, 2, 2])
    );

    let x = Tensor::new(&[1., 5., 3., 2.], &[1, 1, 2, 2]);
    let layer = Layer::new(pool);
    let y = layer.forward(&[&x]).unwrap();
    assert_eq!(y.to_vec(), vec![5.]);
    let grads = layer.backward(&[&x], &y, &Tensor::new(&[2.], &[1, 1, 1, 1])).unwrap();
    assert_eq!(grads.inputs[0].to_vec(), vec![0., 2., 0., 0.]);

    let layer = Layer::new(AvgPool2d::new((2, 2)).unwrap());
    let y = layer.forward(&[&x]).unwrap();
    assert_eq!(y.to_vec(), vec![2.75]);
    let grads = layer.backward(&[&x], &y, &Tensor::new(&[4.], &[1, 1, 1, 1])).unwrap();
    assert_eq!(grads.inputs[0].to_vec(), vec![1.; 4]);
}

#[test]
fn test_concatenate_shapes() {
    let concat = Concatenate::new();
    assert_eq!(
        concat
            .output_shape(&[Some(vec![11, 4, 4]), Some(vec![5, 4, 4])])
            .unwrap(),
        Some(vec![16, 4, 4])
    );
    assert_eq!(concat.output_shape(&[Some(vec![10]), None]).unwrap(), None);
    assert_err!(
        concat.output_shape(&[Some(vec![11, 4, 4]), Some(vec![5, 3, 3])]),
        GraphError::ShapeMismatch(_)
    );

    let a = Tensor::new(&[1., 2.], &[1, 2]);
    let b = Tensor::new(&[3.], &[1, 1]);
    let layer = Layer::new(concat);
    let y = layer.forward(&[&a, &b]).unwrap();
    assert_eq!(y.to_vec(), vec![1., 2., 3.]);
    let grads = layer.backward(&[&a, &b], &y, &Tensor::new(&[4., 5., 6.], &[1, 3])).unwrap();
    assert_eq!(grads.inputs, vec![Tensor::new(&[4., 5.], &[1, 2]), Tensor::new(&[6.], &[1, 1])]);
}

#[test]
fn test_elementwise() {
    let add = Elementwise::add();
    assert_eq!(
        add.output_shape(&[Some(vec![10, 8, 8]), Some(vec![10, 8, 8])]).unwrap(),
        Some(vec![10, 8, 8])
    );
    assert_err!(
        add.output_shape(&[Some(vec![10]), Some(vec![5])]),
        GraphError::ShapeMismatch(_)
    );

    let a = Tensor::new(&[1., 2.], &[1, 2]);
    let b = Tensor::new(&[3., 4.], &[1, 2]);
    let layer = Layer::new(Elementwise::multiply());
    let y = layer.forward(&[&a, &b]).unwrap();
    assert_eq!(y.to_vec(), vec![3., 8.]);
    let grads = layer.backward(&[&a, &b], &y, &Tensor::ones(&[1, 2])).unwrap();
    assert_eq!(grads.inputs, vec![b.clone(), a.clone()]);
}

#[test]
fn test_reshape() {
    let flatten = Reshape::flatten();
    assert_eq!(flatten.output_shape(&[Some(vec![16, 2, 2])]).unwrap(), Some(vec![64]));
    assert_err!(
        Reshape::new(&[3, 3]).output_shape(&[Some(vec![8])]),
        GraphError::ShapeMismatch(_)
    );
    let layer = Layer::new(flatten);
    let x = Tensor::zeros(&[2, 3, 2, 2]);
    let y = layer.forward(&[&x]).unwrap();
    assert_eq!(y.shape(), &[2, 12]);
    let grads = layer.backward(&[&x], &y, &y).unwrap();
    assert_eq!(grads.inputs[0].shape(), &[2, 3, 2, 2]);
}

#[test]
fn test_dropout() {
    assert_err!(Dropout::new(1.), GraphError::Configuration { option: "proportion", .. });
    assert_err!(Dropout::new(-0.1), GraphError::Configuration { .. });

    let mut layer = Layer::new(Dropout::new(0.5).unwrap());
    let x = Tensor::ones(&[4, 25]);
    let y = layer.forward(&[&x]).unwrap();
    // 训练状态下元素要么为0，要么被放大为2
    assert!(y.to_vec().iter().all(|&v| v == 0. || v == 2.));

    layer.set_training_state(false);
    assert_eq!(layer.forward(&[&x]).unwrap(), x);
}

#[test]
fn test_dropout_backward_uses_forward_mask() {
    let layer = Layer::new(Dropout::new(0.5).unwrap());
    // 输入全为0时，输出无法区分保留与丢弃，只能依靠前向留下的掩码
    let x = Tensor::zeros(&[4, 25]);
    let (y, mask) = layer.forward_cached(&[&x]).unwrap();
    assert_eq!(y, x);
    let mask = mask.unwrap();
    assert!(mask.to_vec().iter().all(|&v| v == 0. || v == 2.));
    assert!(mask.to_vec().contains(&2.));

    let grads = layer
        .backward_cached(&[&x], &y, Some(&mask), &Tensor::ones(&[4, 25]))
        .unwrap();
    assert_eq!(grads.inputs[0], mask);
}

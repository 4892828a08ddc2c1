/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : Dense (全连接) 层：output = activation(x @ W + b)
 *
 * 输入/输出形状：
 * - 输入：[batch_size, in_features]
 * - 输出：[batch_size, units]
 *
 * 参数：
 * - `<层名>/weight`：[in_features, units]，Xavier正态初始化
 * - `<层名>/bias`：[units]，初始化为0
 */

use rand::rngs::StdRng;

use super::{
    ActivationFn, LayerGradients, Parameter, Shape, TraitLayer, positive, single_input,
    single_shape, xavier_normal,
};
use crate::nn::GraphError;
use crate::tensor::Tensor;

#[derive(Debug, Clone)]
pub struct Dense {
    units: usize,
    activation: ActivationFn,
    weight: Option<Parameter>,
    bias: Option<Parameter>,
}

impl Dense {
    /// 线性（无激活）全连接层，`units`须大于0
    pub fn new(units: usize) -> Result<Self, GraphError> {
        Self::with_activation(units, ActivationFn::Linear)
    }

    pub fn with_activation(units: usize, activation: ActivationFn) -> Result<Self, GraphError> {
        Ok(Self {
            units: positive("units", units)?,
            activation,
            weight: None,
            bias: None,
        })
    }

    pub const fn units(&self) -> usize {
        self.units
    }

    pub const fn activation(&self) -> ActivationFn {
        self.activation
    }

    fn weights(&self) -> Result<(&Tensor, &Tensor), GraphError> {
        match (&self.weight, &self.bias) {
            (Some(w), Some(b)) => Ok((w.value(), b.value())),
            _ => Err(GraphError::NotInitialized(format!("Dense({})", self.units))),
        }
    }
}

impl TraitLayer for Dense {
    fn kind_name(&self) -> &'static str {
        "dense"
    }

    fn output_shape(&self, input_shapes: &[Option<Shape>]) -> Result<Option<Shape>, GraphError> {
        match single_shape("Dense", input_shapes)? {
            Some(shape) if shape.len() != 1 => Err(GraphError::ShapeMismatch(format!(
                "Dense只接受1维特征输入，实际形状为{shape:?}"
            ))),
            // 输出形状只取决于units，即使输入未知
            _ => Ok(Some(vec![self.units])),
        }
    }

    fn requires_input_shape(&self) -> bool {
        true
    }

    fn initialize(
        &mut self,
        layer_name: &str,
        input_shapes: &[Shape],
        rng: &mut StdRng,
    ) -> Result<(), GraphError> {
        let in_features = match input_shapes {
            [shape] if shape.len() == 1 => shape[0],
            _ => {
                return Err(GraphError::ShapeMismatch(format!(
                    "Dense无法由输入形状{input_shapes:?}初始化"
                )));
            }
        };
        let weight = xavier_normal(in_features, self.units, &[in_features, self.units], rng);
        self.weight = Some(Parameter::new(format!("{layer_name}/weight"), weight));
        self.bias = Some(Parameter::new(
            format!("{layer_name}/bias"),
            Tensor::zeros(&[self.units]),
        ));
        Ok(())
    }

    fn forward(&self, inputs: &[&Tensor], _training: bool) -> Result<Tensor, GraphError> {
        let x = single_input("Dense", inputs)?;
        let (w, b) = self.weights()?;
        if x.dimension() != 2 || x.shape()[1] != w.shape()[0] {
            return Err(GraphError::ShapeMismatch(format!(
                "Dense期望输入形状为[batch, {}]，实际为{:?}",
                w.shape()[0],
                x.shape()
            )));
        }
        Ok(self.activation.apply(&(x.mat_mul(w) + b)))
    }

    fn backward(
        &self,
        inputs: &[&Tensor],
        output: &Tensor,
        grad_output: &Tensor,
        _training: bool,
    ) -> Result<LayerGradients, GraphError> {
        let x = single_input("Dense", inputs)?;
        let (w, _) = self.weights()?;
        let grad_z = self.activation.derivative(output, grad_output);
        Ok(LayerGradients {
            inputs: vec![grad_z.mat_mul(&w.transpose())],
            parameters: vec![x.transpose().mat_mul(&grad_z), grad_z.sum_axis(0)],
        })
    }

    fn parameters(&self) -> Vec<&Parameter> {
        self.weight.iter().chain(self.bias.iter()).collect()
    }

    fn parameters_mut(&mut self) -> Vec<&mut Parameter> {
        self.weight.iter_mut().chain(self.bias.iter_mut()).collect()
    }
}

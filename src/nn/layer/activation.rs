/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 激活函数，既可单独作为层使用，也被`Dense`内嵌。
 *                 反向传播只依赖前向的输出y，因此无需缓存输入。
 */

use serde::{Deserialize, Serialize};

use super::{LayerGradients, Shape, TraitLayer, single_input, single_shape};
use crate::nn::GraphError;
use crate::tensor::Tensor;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationFn {
    #[default]
    Linear,
    Sigmoid,
    Tanh,
    Relu,
    /// 沿最后一维
    Softmax,
}

impl ActivationFn {
    pub fn apply(self, x: &Tensor) -> Tensor {
        match self {
            Self::Linear => x.clone(),
            Self::Sigmoid => x.sigmoid(),
            Self::Tanh => x.tanh(),
            Self::Relu => x.relu(),
            Self::Softmax => x.softmax(),
        }
    }

    /// 由输出`y`和输出梯度`grad`求输入梯度
    pub fn derivative(self, y: &Tensor, grad: &Tensor) -> Tensor {
        match self {
            Self::Linear => grad.clone(),
            Self::Sigmoid => grad * (y * (1. - y)),
            Self::Tanh => grad * (1. - y.square()),
            Self::Relu => grad * y.sign(),
            Self::Softmax => {
                // dx = y * (g - sum(g * y, 最后一维))
                let last_axis = y.dimension().saturating_sub(1);
                let dot = (grad * y).sum_axis(last_axis);
                let mut keep_dims = y.shape().to_vec();
                if let Some(last) = keep_dims.last_mut() {
                    *last = 1;
                }
                y * (grad - dot.reshape(&keep_dims))
            }
        }
    }
}

/// 独立的激活层
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    function: ActivationFn,
}

impl Activation {
    pub const fn new(function: ActivationFn) -> Self {
        Self { function }
    }

    pub const fn sigmoid() -> Self {
        Self::new(ActivationFn::Sigmoid)
    }

    pub const fn tanh() -> Self {
        Self::new(ActivationFn::Tanh)
    }

    pub const fn relu() -> Self {
        Self::new(ActivationFn::Relu)
    }

    pub const fn softmax() -> Self {
        Self::new(ActivationFn::Softmax)
    }

    pub const fn function(&self) -> ActivationFn {
        self.function
    }
}

impl TraitLayer for Activation {
    fn kind_name(&self) -> &'static str {
        match self.function {
            ActivationFn::Linear => "linear",
            ActivationFn::Sigmoid => "sigmoid",
            ActivationFn::Tanh => "tanh",
            ActivationFn::Relu => "relu",
            ActivationFn::Softmax => "softmax",
        }
    }

    fn output_shape(&self, input_shapes: &[Option<Shape>]) -> Result<Option<Shape>, GraphError> {
        Ok(single_shape("Activation", input_shapes)?.cloned())
    }

    fn forward(&self, inputs: &[&Tensor], _training: bool) -> Result<Tensor, GraphError> {
        Ok(self.function.apply(single_input("Activation", inputs)?))
    }

    fn backward(
        &self,
        _inputs: &[&Tensor],
        output: &Tensor,
        grad_output: &Tensor,
        _training: bool,
    ) -> Result<LayerGradients, GraphError> {
        Ok(LayerGradients::inputs_only(vec![
            self.function.derivative(output, grad_output),
        ]))
    }
}

/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : Input 层 - 声明连接入口处的输入形状，前向时原样透传
 */

use super::{LayerGradients, Shape, TraitLayer, expect_input_shape, single_input, single_shape};
use crate::nn::GraphError;
use crate::tensor::Tensor;

#[derive(Debug, Clone, PartialEq)]
pub struct Input {
    shape: Shape,
}

impl Input {
    /// `shape`不含batch维度，如全连接输入`[n_features]`，图像输入`[C, H, W]`
    pub fn new(shape: &[usize]) -> Self {
        Self {
            shape: shape.to_vec(),
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }
}

impl TraitLayer for Input {
    fn kind_name(&self) -> &'static str {
        "input"
    }

    fn declared_input_shape(&self) -> Option<Shape> {
        Some(self.shape.clone())
    }

    fn output_shape(&self, input_shapes: &[Option<Shape>]) -> Result<Option<Shape>, GraphError> {
        match single_shape("Input", input_shapes)? {
            Some(incoming) if *incoming != self.shape => Err(GraphError::ShapeMismatch(format!(
                "Input声明的形状为{:?}，但收到了形状{incoming:?}",
                self.shape
            ))),
            _ => Ok(Some(self.shape.clone())),
        }
    }

    fn forward(&self, inputs: &[&Tensor], _training: bool) -> Result<Tensor, GraphError> {
        let input = single_input("Input", inputs)?;
        expect_input_shape("Input", input, &self.shape)?;
        Ok(input.clone())
    }

    fn backward(
        &self,
        _inputs: &[&Tensor],
        _output: &Tensor,
        grad_output: &Tensor,
        _training: bool,
    ) -> Result<LayerGradients, GraphError> {
        Ok(LayerGradients::inputs_only(vec![grad_output.clone()]))
    }
}

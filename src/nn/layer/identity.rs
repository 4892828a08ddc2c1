/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : Identity 层 - 原样透传，也是并行连接中“空分支”的占位层（残差连接的捷径）
 */

use super::{LayerGradients, Shape, TraitLayer, single_input, single_shape};
use crate::nn::GraphError;
use crate::tensor::Tensor;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity;

impl Identity {
    pub const fn new() -> Self {
        Self
    }
}

impl TraitLayer for Identity {
    fn kind_name(&self) -> &'static str {
        "identity"
    }

    fn output_shape(&self, input_shapes: &[Option<Shape>]) -> Result<Option<Shape>, GraphError> {
        Ok(single_shape("Identity", input_shapes)?.cloned())
    }

    fn forward(&self, inputs: &[&Tensor], _training: bool) -> Result<Tensor, GraphError> {
        Ok(single_input("Identity", inputs)?.clone())
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

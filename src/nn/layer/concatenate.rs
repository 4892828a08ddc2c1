/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : Concatenate 合并层 - 沿特征维拼接所有输入
 *
 * 特征维（`axis`）以不含batch的形状计，缺省为0：对全连接特征是唯一的那一维，
 * 对[C, H, W]图像是通道维。输出形状在该维上为各输入之和，其余维度必须完全一致。
 */

use super::{Arity, LayerGradients, Shape, TraitLayer};
use crate::nn::GraphError;
use crate::tensor::Tensor;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Concatenate {
    axis: usize,
}

impl Concatenate {
    pub const fn new() -> Self {
        Self { axis: 0 }
    }

    pub const fn along(axis: usize) -> Self {
        Self { axis }
    }

    pub const fn axis(&self) -> usize {
        self.axis
    }
}

impl TraitLayer for Concatenate {
    fn kind_name(&self) -> &'static str {
        "concatenate"
    }

    fn arity(&self) -> Arity {
        Arity::Many
    }

    fn output_shape(&self, input_shapes: &[Option<Shape>]) -> Result<Option<Shape>, GraphError> {
        if input_shapes.iter().any(Option::is_none) {
            return Ok(None);
        }
        let shapes = input_shapes.iter().flatten().collect::<Vec<_>>();
        let Some(first) = shapes.first() else {
            return Ok(None);
        };
        if self.axis >= first.len() {
            return Err(GraphError::ShapeMismatch(format!(
                "Concatenate的拼接维{}超出了输入形状{first:?}的维数",
                self.axis
            )));
        }
        let without_axis = |shape: &Shape| {
            let mut shape = shape.clone();
            shape.remove(self.axis);
            shape
        };
        let reference = without_axis(first);
        if let Some(bad) = shapes
            .iter()
            .find(|s| s.len() != first.len() || without_axis(s) != reference)
        {
            return Err(GraphError::ShapeMismatch(format!(
                "Concatenate除第{}维外其余维度必须一致：{first:?} vs {bad:?}",
                self.axis
            )));
        }
        let mut output = (*first).clone();
        output[self.axis] = shapes.iter().map(|s| s[self.axis]).sum();
        Ok(Some(output))
    }

    fn forward(&self, inputs: &[&Tensor], _training: bool) -> Result<Tensor, GraphError> {
        Ok(Tensor::concat(inputs, self.axis + 1)?)
    }

    fn backward(
        &self,
        inputs: &[&Tensor],
        _output: &Tensor,
        grad_output: &Tensor,
        _training: bool,
    ) -> Result<LayerGradients, GraphError> {
        let sizes = inputs
            .iter()
            .map(|t| t.shape()[self.axis + 1])
            .collect::<Vec<_>>();
        Ok(LayerGradients::inputs_only(
            grad_output.split(self.axis + 1, &sizes)?,
        ))
    }
}

/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : Elementwise 合并层 - 对形状完全一致的输入逐元素相加/相乘（如残差连接的汇合点）
 */

use serde::{Deserialize, Serialize};

use super::{Arity, LayerGradients, Shape, TraitLayer};
use crate::nn::GraphError;
use crate::tensor::Tensor;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeOp {
    #[default]
    Add,
    Multiply,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Elementwise {
    op: MergeOp,
}

impl Elementwise {
    pub const fn new(op: MergeOp) -> Self {
        Self { op }
    }

    pub const fn add() -> Self {
        Self::new(MergeOp::Add)
    }

    pub const fn multiply() -> Self {
        Self::new(MergeOp::Multiply)
    }

    pub const fn op(&self) -> MergeOp {
        self.op
    }
}

impl TraitLayer for Elementwise {
    fn kind_name(&self) -> &'static str {
        match self.op {
            MergeOp::Add => "elementwise-add",
            MergeOp::Multiply => "elementwise-multiply",
        }
    }

    fn arity(&self) -> Arity {
        Arity::Many
    }

    fn output_shape(&self, input_shapes: &[Option<Shape>]) -> Result<Option<Shape>, GraphError> {
        let known = input_shapes.iter().flatten().collect::<Vec<_>>();
        if let Some(bad) = known.iter().find(|s| **s != known[0]) {
            return Err(GraphError::ShapeMismatch(format!(
                "Elementwise要求所有输入形状一致：{:?} vs {bad:?}",
                known[0]
            )));
        }
        if known.len() < input_shapes.len() {
            return Ok(None);
        }
        Ok(known.first().map(|s| (*s).clone()))
    }

    fn forward(&self, inputs: &[&Tensor], _training: bool) -> Result<Tensor, GraphError> {
        let (first, rest) = inputs
            .split_first()
            .ok_or_else(|| GraphError::InvalidOperation("Elementwise没有输入".to_string()))?;
        if let Some(bad) = rest.iter().find(|t| !t.is_same_shape(first)) {
            return Err(GraphError::ShapeMismatch(format!(
                "Elementwise要求所有输入形状一致：{:?} vs {:?}",
                first.shape(),
                bad.shape()
            )));
        }
        Ok(rest.iter().fold((*first).clone(), |acc, t| match self.op {
            MergeOp::Add => acc + *t,
            MergeOp::Multiply => acc * *t,
        }))
    }

    fn backward(
        &self,
        inputs: &[&Tensor],
        _output: &Tensor,
        grad_output: &Tensor,
        _training: bool,
    ) -> Result<LayerGradients, GraphError> {
        let grads = match self.op {
            MergeOp::Add => vec![grad_output.clone(); inputs.len()],
            // 对第i个输入的梯度 = grad * 其余输入之积
            MergeOp::Multiply => (0..inputs.len())
                .map(|i| {
                    inputs
                        .iter()
                        .enumerate()
                        .filter(|(j, _)| *j != i)
                        .fold(grad_output.clone(), |acc, (_, t)| acc * *t)
                })
                .collect(),
        };
        Ok(LayerGradients::inputs_only(grads))
    }
}

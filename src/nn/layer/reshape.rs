/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : Reshape 层 - 改变（不含batch的）形状，目标为None时展平为1维
 */

use super::{LayerGradients, Shape, TraitLayer, single_input, single_shape, split_batch};
use crate::nn::GraphError;
use crate::tensor::Tensor;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reshape {
    target: Option<Shape>,
}

impl Reshape {
    pub fn new(target: &[usize]) -> Self {
        Self {
            target: Some(target.to_vec()),
        }
    }

    /// 展平为`[元素总数]`，常用在卷积与全连接之间
    pub const fn flatten() -> Self {
        Self { target: None }
    }

    fn target_for(&self, shape: &[usize]) -> Result<Shape, GraphError> {
        let size = shape.iter().product::<usize>();
        match &self.target {
            None => Ok(vec![size]),
            Some(target) if target.iter().product::<usize>() == size => Ok(target.clone()),
            Some(target) => Err(GraphError::ShapeMismatch(format!(
                "无法将形状{shape:?}变为{target:?}：元素个数不同"
            ))),
        }
    }
}

impl TraitLayer for Reshape {
    fn kind_name(&self) -> &'static str {
        "reshape"
    }

    fn output_shape(&self, input_shapes: &[Option<Shape>]) -> Result<Option<Shape>, GraphError> {
        single_shape("Reshape", input_shapes)?
            .map(|shape| self.target_for(shape))
            .transpose()
    }

    fn forward(&self, inputs: &[&Tensor], _training: bool) -> Result<Tensor, GraphError> {
        let x = single_input("Reshape", inputs)?;
        let (batch, shape) = split_batch(x);
        let mut full = vec![batch];
        full.extend(self.target_for(shape)?);
        Ok(x.reshape(&full))
    }

    fn backward(
        &self,
        inputs: &[&Tensor],
        _output: &Tensor,
        grad_output: &Tensor,
        _training: bool,
    ) -> Result<LayerGradients, GraphError> {
        let x = single_input("Reshape", inputs)?;
        Ok(LayerGradients::inputs_only(vec![
            grad_output.reshape(x.shape()),
        ]))
    }
}

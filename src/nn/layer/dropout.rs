/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : Dropout 层 - 唯一读取训练状态标记的层
 *
 * 训练状态下以概率`proportion`将元素置0，其余元素除以(1 - proportion)，
 * 所用掩码随前向结果一起返回，供反向使用；
 * 关闭训练状态（如`prediction_error`期间）时原样透传。
 */

use rand::Rng;

use super::{LayerGradients, Shape, TraitLayer, single_input, single_shape};
use crate::nn::GraphError;
use crate::tensor::Tensor;

#[derive(Debug, Clone, PartialEq)]
pub struct Dropout {
    proportion: f32,
}

impl Dropout {
    /// `proportion`为丢弃比例，取值须在[0, 1)
    pub fn new(proportion: f32) -> Result<Self, GraphError> {
        if !(0. ..1.).contains(&proportion) {
            return Err(GraphError::Configuration {
                option: "proportion",
                value: proportion.to_string(),
                reason: "取值须在[0, 1)".to_string(),
            });
        }
        Ok(Self { proportion })
    }

    pub const fn proportion(&self) -> f32 {
        self.proportion
    }

    fn keep(&self) -> f32 {
        1. - self.proportion
    }
}

impl TraitLayer for Dropout {
    fn kind_name(&self) -> &'static str {
        "dropout"
    }

    fn output_shape(&self, input_shapes: &[Option<Shape>]) -> Result<Option<Shape>, GraphError> {
        Ok(single_shape("Dropout", input_shapes)?.cloned())
    }

    fn forward(&self, inputs: &[&Tensor], training: bool) -> Result<Tensor, GraphError> {
        Ok(self.forward_cached(inputs, training)?.0)
    }

    /// 缓存的掩码在被保留的位置为1/(1 - proportion)，被丢弃的位置为0
    fn forward_cached(
        &self,
        inputs: &[&Tensor],
        training: bool,
    ) -> Result<(Tensor, Option<Tensor>), GraphError> {
        let x = single_input("Dropout", inputs)?;
        if !training || self.proportion == 0. {
            return Ok((x.clone(), None));
        }
        let mut rng = rand::thread_rng();
        let keep = self.keep();
        let mask = Tensor::zeros_like(x)
            .map(|_| if rng.r#gen::<f32>() < keep { 1. / keep } else { 0. });
        Ok((x * &mask, Some(mask)))
    }

    /// 没有掩码时以“输出非0”还原被保留的位置，输入恰为0的保留位置会被当作丢弃
    fn backward(
        &self,
        inputs: &[&Tensor],
        output: &Tensor,
        grad_output: &Tensor,
        training: bool,
    ) -> Result<LayerGradients, GraphError> {
        self.backward_cached(inputs, output, None, grad_output, training)
    }

    fn backward_cached(
        &self,
        _inputs: &[&Tensor],
        output: &Tensor,
        cache: Option<&Tensor>,
        grad_output: &Tensor,
        training: bool,
    ) -> Result<LayerGradients, GraphError> {
        if !training || self.proportion == 0. {
            return Ok(LayerGradients::inputs_only(vec![grad_output.clone()]));
        }
        let grad = match cache {
            Some(mask) => grad_output * mask,
            None => grad_output * output.map(|v| if v != 0. { 1. / self.keep() } else { 0. }),
        };
        Ok(LayerGradients::inputs_only(vec![grad]))
    }
}

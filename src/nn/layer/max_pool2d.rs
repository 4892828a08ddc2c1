/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : MaxPool2d (2D 最大池化) 层
 *
 * 输入/输出形状（不含batch）：
 * - 输入：[C, H, W]
 * - 输出：[C, H', W']，H' = (H - kernel_h) / stride_h + 1（向下取整）
 *
 * 步长缺省等于窗口大小。反向传播时梯度只流向窗口内第一个最大值所在位置。
 */

use ndarray::{Array4, ArrayView4};

use super::conv2d::{as_4d, sliding_output_len};
use super::{LayerGradients, Shape, TraitLayer, positive, single_input, single_shape};
use crate::nn::GraphError;
use crate::tensor::Tensor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaxPool2d {
    kernel_size: (usize, usize),
    stride: (usize, usize),
}

impl MaxPool2d {
    pub fn new(kernel_size: (usize, usize)) -> Result<Self, GraphError> {
        let kernel_size = (
            positive("kernel_size", kernel_size.0)?,
            positive("kernel_size", kernel_size.1)?,
        );
        Ok(Self {
            kernel_size,
            stride: kernel_size,
        })
    }

    pub fn with_stride(mut self, stride: (usize, usize)) -> Result<Self, GraphError> {
        self.stride = (positive("stride", stride.0)?, positive("stride", stride.1)?);
        Ok(self)
    }

    pub const fn kernel_size(&self) -> (usize, usize) {
        self.kernel_size
    }

    /// 窗口(i, j)内最大值的坐标（并列时取第一个）
    fn argmax(&self, x: &ArrayView4<f32>, b: usize, c: usize, i: usize, j: usize) -> (usize, usize) {
        let (kh, kw) = self.kernel_size;
        let (r0, s0) = (i * self.stride.0, j * self.stride.1);
        let mut best = (r0, s0);
        for r in r0..r0 + kh {
            for s in s0..s0 + kw {
                if x[[b, c, r, s]] > x[[b, c, best.0, best.1]] {
                    best = (r, s);
                }
            }
        }
        best
    }
}

impl TraitLayer for MaxPool2d {
    fn kind_name(&self) -> &'static str {
        "max-pooling"
    }

    fn output_shape(&self, input_shapes: &[Option<Shape>]) -> Result<Option<Shape>, GraphError> {
        pooled_shape("MaxPool2d", self.kernel_size, self.stride, input_shapes)
    }

    fn forward(&self, inputs: &[&Tensor], _training: bool) -> Result<Tensor, GraphError> {
        let x = as_4d("MaxPool2d", single_input("MaxPool2d", inputs)?)?;
        let (n, c, oh, ow) = pooled_dim("MaxPool2d", self.kernel_size, self.stride, x.dim())?;
        let out = Array4::from_shape_fn((n, c, oh, ow), |(b, ch, i, j)| {
            let (r, s) = self.argmax(&x, b, ch, i, j);
            x[[b, ch, r, s]]
        });
        Ok(Tensor::from_array(out.into_dyn()))
    }

    fn backward(
        &self,
        inputs: &[&Tensor],
        _output: &Tensor,
        grad_output: &Tensor,
        _training: bool,
    ) -> Result<LayerGradients, GraphError> {
        let x = as_4d("MaxPool2d", single_input("MaxPool2d", inputs)?)?;
        let grad = as_4d("MaxPool2d", grad_output)?;
        let mut grad_x = Array4::<f32>::zeros(x.raw_dim());
        for ((b, ch, i, j), &g) in grad.indexed_iter() {
            let (r, s) = self.argmax(&x, b, ch, i, j);
            grad_x[[b, ch, r, s]] += g;
        }
        Ok(LayerGradients::inputs_only(vec![Tensor::from_array(
            grad_x.into_dyn(),
        )]))
    }
}

/// 池化层（无填充）的输出形状推断，`AvgPool2d`共用
pub(super) fn pooled_shape(
    kind: &str,
    kernel_size: (usize, usize),
    stride: (usize, usize),
    input_shapes: &[Option<Shape>],
) -> Result<Option<Shape>, GraphError> {
    let Some(shape) = single_shape(kind, input_shapes)? else {
        return Ok(None);
    };
    let &[c, h, w] = shape.as_slice() else {
        return Err(GraphError::ShapeMismatch(format!(
            "{kind}期望输入形状为[C, H, W]，实际为{shape:?}"
        )));
    };
    let (_, _, oh, ow) = pooled_dim(kind, kernel_size, stride, (1, c, h, w))?;
    Ok(Some(vec![c, oh, ow]))
}

pub(super) fn pooled_dim(
    kind: &str,
    kernel_size: (usize, usize),
    stride: (usize, usize),
    (n, c, h, w): (usize, usize, usize, usize),
) -> Result<(usize, usize, usize, usize), GraphError> {
    let oh = sliding_output_len(h, kernel_size.0, stride.0, 0);
    let ow = sliding_output_len(w, kernel_size.1, stride.1, 0);
    match (oh, ow) {
        (Some(oh), Some(ow)) => Ok((n, c, oh, ow)),
        _ => Err(GraphError::ShapeMismatch(format!(
            "{kind}的窗口{kernel_size:?}大于输入尺寸({h}, {w})"
        ))),
    }
}

/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : AvgPool2d (2D 平均池化) 层，形状规则同`MaxPool2d`
 */

use ndarray::{Array4, s};

use super::conv2d::as_4d;
use super::max_pool2d::{pooled_dim, pooled_shape};
use super::{LayerGradients, Shape, TraitLayer, positive, single_input};
use crate::nn::GraphError;
use crate::tensor::Tensor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvgPool2d {
    kernel_size: (usize, usize),
    stride: (usize, usize),
}

impl AvgPool2d {
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

    fn window_area(&self) -> f32 {
        (self.kernel_size.0 * self.kernel_size.1) as f32
    }
}

impl TraitLayer for AvgPool2d {
    fn kind_name(&self) -> &'static str {
        "average-pooling"
    }

    fn output_shape(&self, input_shapes: &[Option<Shape>]) -> Result<Option<Shape>, GraphError> {
        pooled_shape("AvgPool2d", self.kernel_size, self.stride, input_shapes)
    }

    fn forward(&self, inputs: &[&Tensor], _training: bool) -> Result<Tensor, GraphError> {
        let x = as_4d("AvgPool2d", single_input("AvgPool2d", inputs)?)?;
        let (n, c, oh, ow) = pooled_dim("AvgPool2d", self.kernel_size, self.stride, x.dim())?;
        let (kh, kw) = self.kernel_size;
        let out = Array4::from_shape_fn((n, c, oh, ow), |(b, ch, i, j)| {
            let (r0, c0) = (i * self.stride.0, j * self.stride.1);
            x.slice(s![b, ch, r0..r0 + kh, c0..c0 + kw]).sum() / self.window_area()
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
        let x = as_4d("AvgPool2d", single_input("AvgPool2d", inputs)?)?;
        let grad = as_4d("AvgPool2d", grad_output)?;
        let (kh, kw) = self.kernel_size;
        let mut grad_x = Array4::<f32>::zeros(x.raw_dim());
        for ((b, ch, i, j), &g) in grad.indexed_iter() {
            let (r0, c0) = (i * self.stride.0, j * self.stride.1);
            grad_x
                .slice_mut(s![b, ch, r0..r0 + kh, c0..c0 + kw])
                .mapv_inplace(|v| v + g / self.window_area());
        }
        Ok(LayerGradients::inputs_only(vec![Tensor::from_array(
            grad_x.into_dyn(),
        )]))
    }
}

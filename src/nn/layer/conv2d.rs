/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : Conv2d (2D 卷积) 层
 *
 * 输入/输出形状（不含batch）：
 * - 输入：[in_channels, H, W]
 * - 输出：[filters, H', W']
 *
 * 输出尺寸计算：
 * H' = (H + 2*padding_h - kernel_h) / stride_h + 1
 * W' = (W + 2*padding_w - kernel_w) / stride_w + 1
 *
 * 参数：
 * - `<层名>/weight`：[filters, in_channels, kernel_h, kernel_w]
 * - `<层名>/bias`：[filters]
 */

use ndarray::{Array1, Array4, ArrayView4, Ix4};
use rand::rngs::StdRng;

use super::{
    LayerGradients, Parameter, Shape, TraitLayer, positive, single_input, single_shape,
    xavier_normal,
};
use crate::nn::GraphError;
use crate::tensor::Tensor;

#[derive(Debug, Clone)]
pub struct Conv2d {
    filters: usize,
    kernel_size: (usize, usize),
    stride: (usize, usize),
    padding: (usize, usize),
    weight: Option<Parameter>,
    bias: Option<Parameter>,
}

impl Conv2d {
    /// 步长为1、无填充的卷积层
    pub fn new(filters: usize, kernel_size: (usize, usize)) -> Result<Self, GraphError> {
        Ok(Self {
            filters: positive("filters", filters)?,
            kernel_size: (
                positive("kernel_size", kernel_size.0)?,
                positive("kernel_size", kernel_size.1)?,
            ),
            stride: (1, 1),
            padding: (0, 0),
            weight: None,
            bias: None,
        })
    }

    pub fn with_stride(mut self, stride: (usize, usize)) -> Result<Self, GraphError> {
        self.stride = (positive("stride", stride.0)?, positive("stride", stride.1)?);
        Ok(self)
    }

    pub const fn with_padding(mut self, padding: (usize, usize)) -> Self {
        self.padding = padding;
        self
    }

    pub const fn filters(&self) -> usize {
        self.filters
    }

    pub const fn kernel_size(&self) -> (usize, usize) {
        self.kernel_size
    }

    fn weights(&self) -> Result<(&Tensor, &Tensor), GraphError> {
        match (&self.weight, &self.bias) {
            (Some(w), Some(b)) => Ok((w.value(), b.value())),
            _ => Err(GraphError::NotInitialized(format!("Conv2d({})", self.filters))),
        }
    }

    fn geometry(&self, height: usize, width: usize) -> Option<(usize, usize)> {
        let oh = sliding_output_len(height, self.kernel_size.0, self.stride.0, self.padding.0)?;
        let ow = sliding_output_len(width, self.kernel_size.1, self.stride.1, self.padding.1)?;
        Some((oh, ow))
    }

    /// 对输出位置(i, j)、卷积核位置(ki, kj)给出输入中的坐标，落在填充区则为None
    fn source(&self, i: usize, j: usize, ki: usize, kj: usize, h: usize, w: usize) -> Option<(usize, usize)> {
        let r = (i * self.stride.0 + ki).checked_sub(self.padding.0)?;
        let s = (j * self.stride.1 + kj).checked_sub(self.padding.1)?;
        (r < h && s < w).then_some((r, s))
    }
}

impl TraitLayer for Conv2d {
    fn kind_name(&self) -> &'static str {
        "conv"
    }

    fn output_shape(&self, input_shapes: &[Option<Shape>]) -> Result<Option<Shape>, GraphError> {
        let Some(shape) = single_shape("Conv2d", input_shapes)? else {
            return Ok(None);
        };
        let &[_, h, w] = shape.as_slice() else {
            return Err(GraphError::ShapeMismatch(format!(
                "Conv2d期望输入形状为[C, H, W]，实际为{shape:?}"
            )));
        };
        let (oh, ow) = self.geometry(h, w).ok_or_else(|| {
            GraphError::ShapeMismatch(format!(
                "Conv2d的卷积核{:?}大于（填充后的）输入{shape:?}",
                self.kernel_size
            ))
        })?;
        Ok(Some(vec![self.filters, oh, ow]))
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
        let channels = match input_shapes {
            [shape] if shape.len() == 3 => shape[0],
            _ => {
                return Err(GraphError::ShapeMismatch(format!(
                    "Conv2d无法由输入形状{input_shapes:?}初始化"
                )));
            }
        };
        let (kh, kw) = self.kernel_size;
        let weight = xavier_normal(
            channels * kh * kw,
            self.filters * kh * kw,
            &[self.filters, channels, kh, kw],
            rng,
        );
        self.weight = Some(Parameter::new(format!("{layer_name}/weight"), weight));
        self.bias = Some(Parameter::new(
            format!("{layer_name}/bias"),
            Tensor::zeros(&[self.filters]),
        ));
        Ok(())
    }

    fn forward(&self, inputs: &[&Tensor], _training: bool) -> Result<Tensor, GraphError> {
        let (w, b) = self.weights()?;
        let x = as_4d("Conv2d", single_input("Conv2d", inputs)?)?;
        let kernel = as_4d("Conv2d", w)?;
        let (n, c, h, wd) = x.dim();
        let (f, kc, kh, kw) = kernel.dim();
        if c != kc {
            return Err(GraphError::ShapeMismatch(format!(
                "Conv2d期望{kc}个输入通道，实际为{c}"
            )));
        }
        let (oh, ow) = self.geometry(h, wd).ok_or_else(|| {
            GraphError::ShapeMismatch(format!("Conv2d的输入尺寸({h}, {wd})小于卷积核"))
        })?;

        let mut out = Array4::<f32>::zeros((n, f, oh, ow));
        for ((bi, o, i, j), value) in out.indexed_iter_mut() {
            let mut acc = b.get(&[o]);
            for ch in 0..c {
                for ki in 0..kh {
                    for kj in 0..kw {
                        if let Some((r, s)) = self.source(i, j, ki, kj, h, wd) {
                            acc += x[[bi, ch, r, s]] * kernel[[o, ch, ki, kj]];
                        }
                    }
                }
            }
            *value = acc;
        }
        Ok(Tensor::from_array(out.into_dyn()))
    }

    fn backward(
        &self,
        inputs: &[&Tensor],
        _output: &Tensor,
        grad_output: &Tensor,
        _training: bool,
    ) -> Result<LayerGradients, GraphError> {
        let (w, _) = self.weights()?;
        let x = as_4d("Conv2d", single_input("Conv2d", inputs)?)?;
        let kernel = as_4d("Conv2d", w)?;
        let grad = as_4d("Conv2d", grad_output)?;
        let (_, c, h, wd) = x.dim();
        let (f, _, kh, kw) = kernel.dim();

        let mut grad_x = Array4::<f32>::zeros(x.raw_dim());
        let mut grad_w = Array4::<f32>::zeros(kernel.raw_dim());
        let mut grad_b = Array1::<f32>::zeros(f);
        for ((bi, o, i, j), &g) in grad.indexed_iter() {
            grad_b[o] += g;
            for ch in 0..c {
                for ki in 0..kh {
                    for kj in 0..kw {
                        if let Some((r, s)) = self.source(i, j, ki, kj, h, wd) {
                            grad_x[[bi, ch, r, s]] += g * kernel[[o, ch, ki, kj]];
                            grad_w[[o, ch, ki, kj]] += g * x[[bi, ch, r, s]];
                        }
                    }
                }
            }
        }
        Ok(LayerGradients {
            inputs: vec![Tensor::from_array(grad_x.into_dyn())],
            parameters: vec![
                Tensor::from_array(grad_w.into_dyn()),
                Tensor::from_array(grad_b.into_dyn()),
            ],
        })
    }

    fn parameters(&self) -> Vec<&Parameter> {
        self.weight.iter().chain(self.bias.iter()).collect()
    }

    fn parameters_mut(&mut self) -> Vec<&mut Parameter> {
        self.weight.iter_mut().chain(self.bias.iter_mut()).collect()
    }
}

/// 滑动窗口的输出长度；窗口比（填充后的）输入还大时为None
pub(super) fn sliding_output_len(
    input: usize,
    kernel: usize,
    stride: usize,
    padding: usize,
) -> Option<usize> {
    let padded = input + 2 * padding;
    (padded >= kernel).then(|| (padded - kernel) / stride + 1)
}

/// 以`[N, C, H, W]`视图访问张量
pub(super) fn as_4d<'a>(kind: &str, tensor: &'a Tensor) -> Result<ArrayView4<'a, f32>, GraphError> {
    tensor
        .array()
        .view()
        .into_dimensionality::<Ix4>()
        .map_err(|_| {
            GraphError::ShapeMismatch(format!(
                "{kind}期望形状为[N, C, H, W]的输入，实际为{:?}",
                tensor.shape()
            ))
        })
}

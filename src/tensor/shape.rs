/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 与形状相关的变换：reshape、转置、沿某维拼接/切分
 */

use super::Tensor;
use crate::errors::{Operator, TensorError};
use ndarray::{Axis, IxDyn, Slice};

impl Tensor {
    /// 改变形状（元素总数须一致，否则panic）
    pub fn reshape(&self, shape: &[usize]) -> Tensor {
        let data = self
            .array()
            .as_standard_layout()
            .into_owned()
            .into_shape(IxDyn(shape));
        match data {
            Ok(data) => Tensor::from_array(data),
            Err(_) => panic!(
                "{}",
                TensorError::DataShapeMismatch {
                    data_len: self.size(),
                    shape: shape.to_vec(),
                }
            ),
        }
    }

    /// 矩阵转置（对更高阶张量则反转全部维度）
    pub fn transpose(&self) -> Tensor {
        Tensor::from_array(self.array().t().as_standard_layout().into_owned())
    }

    /// 沿`axis`拼接若干张量，除`axis`外其余维度须一致
    pub fn concat(tensors: &[&Tensor], axis: usize) -> Result<Tensor, TensorError> {
        let first = tensors.first().ok_or(TensorError::EmptyList)?;
        if axis >= first.dimension() {
            return Err(TensorError::AxisOutOfRange {
                axis,
                rank: first.dimension(),
            });
        }
        let views = tensors.iter().map(|t| t.array().view()).collect::<Vec<_>>();
        ndarray::concatenate(Axis(axis), &views)
            .map(Tensor::from_array)
            .map_err(|_| TensorError::OperatorError {
                operator: Operator::Concat,
                tensor1_shape: first.shape().to_vec(),
                tensor2_shape: tensors
                    .iter()
                    .map(|t| t.shape().to_vec())
                    .find(|s| s.len() != first.dimension() || s != first.shape())
                    .unwrap_or_default(),
            })
    }

    /// 沿`axis`按`sizes`依次切分，`sizes`之和须等于该维长度
    pub fn split(&self, axis: usize, sizes: &[usize]) -> Result<Vec<Tensor>, TensorError> {
        if axis >= self.dimension() {
            return Err(TensorError::AxisOutOfRange {
                axis,
                rank: self.dimension(),
            });
        }
        if sizes.iter().sum::<usize>() != self.shape()[axis] {
            return Err(TensorError::IncompatibleShape);
        }
        let mut start = 0;
        let mut parts = Vec::with_capacity(sizes.len());
        for &size in sizes {
            let part = self
                .array()
                .slice_axis(Axis(axis), Slice::from(start..start + size))
                .to_owned();
            parts.push(Tensor::from_array(part));
            start += size;
        }
        Ok(parts)
    }

    /// 取第0维（batch）上`[start, end)`的一段
    pub fn slice_batch(&self, start: usize, end: usize) -> Tensor {
        let end = end.min(self.shape()[0]);
        Tensor::from_array(
            self.array()
                .slice_axis(Axis(0), Slice::from(start..end))
                .to_owned(),
        )
    }
}

/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 误差函数（训练误差 = f(预测, 目标)）及其对预测的导数
 *
 * 除分类交叉熵按样本（batch维）取平均外，其余误差都对全部元素取平均。
 */

use serde::{Deserialize, Serialize};

use super::GraphError;
use crate::tensor::Tensor;

/// 交叉熵里对预测值的裁剪，避免ln(0)
const CLIP_EPSILON: f32 = 1e-7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorFunction {
    /// 均方误差
    #[default]
    Mse,
    /// 均方根误差
    Rmse,
    /// 平均绝对误差
    Mae,
    /// 二分类交叉熵，预测值须在(0, 1)内（如sigmoid输出）
    BinaryCrossentropy,
    /// 多分类交叉熵，预测值为每个样本的概率分布（如softmax输出）
    CategoricalCrossentropy,
}

impl ErrorFunction {
    pub fn value(self, prediction: &Tensor, target: &Tensor) -> Result<f32, GraphError> {
        check_shapes(prediction, target)?;
        let n = prediction.size().max(1) as f32;
        let value = match self {
            Self::Mse => (prediction - target).square().mean(),
            Self::Rmse => (prediction - target).square().mean().sqrt(),
            Self::Mae => (prediction - target).abs().mean(),
            Self::BinaryCrossentropy => {
                let p = prediction.clip(CLIP_EPSILON, 1. - CLIP_EPSILON);
                -(target * p.ln() + (1. - target) * (1. - &p).ln()).sum() / n
            }
            Self::CategoricalCrossentropy => {
                let p = prediction.clip(CLIP_EPSILON, 1.);
                -(target * p.ln()).sum() / batch_size(prediction)
            }
        };
        Ok(value)
    }

    /// 误差对预测值的导数，形状同`prediction`
    pub fn gradient(self, prediction: &Tensor, target: &Tensor) -> Result<Tensor, GraphError> {
        check_shapes(prediction, target)?;
        let n = prediction.size().max(1) as f32;
        let diff = prediction - target;
        let gradient = match self {
            Self::Mse => diff * (2. / n),
            Self::Rmse => {
                let rmse = diff.square().mean().sqrt();
                if rmse == 0. {
                    Tensor::zeros_like(prediction)
                } else {
                    diff / (n * rmse)
                }
            }
            Self::Mae => diff.sign() / n,
            Self::BinaryCrossentropy => {
                let p = prediction.clip(CLIP_EPSILON, 1. - CLIP_EPSILON);
                ((1. - target) / (1. - &p) - target / &p) / n
            }
            Self::CategoricalCrossentropy => {
                let p = prediction.clip(CLIP_EPSILON, 1.);
                -(target / p) / batch_size(prediction)
            }
        };
        Ok(gradient)
    }
}

fn check_shapes(prediction: &Tensor, target: &Tensor) -> Result<(), GraphError> {
    if !prediction.is_same_shape(target) {
        return Err(GraphError::ShapeMismatch(format!(
            "预测值形状{:?}与目标值形状{:?}不一致",
            prediction.shape(),
            target.shape()
        )));
    }
    Ok(())
}

fn batch_size(prediction: &Tensor) -> f32 {
    prediction.shape().first().copied().unwrap_or(1).max(1) as f32
}

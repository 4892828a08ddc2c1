/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 逐元素数学函数、选择（where）、裁剪（clip）、归约与激活函数。
 *                 优化器的更新规则只依赖这里的纯函数，不会就地修改任何张量。
 */

use crate::tensor::Tensor;
use ndarray::{Axis, Zip};

impl Tensor {
    /// 对每个元素应用`f`，返回新张量
    pub fn map<F: FnMut(f32) -> f32>(&self, f: F) -> Tensor {
        Tensor::from_array(self.array().mapv(f))
    }

    pub fn sqrt(&self) -> Tensor {
        self.map(f32::sqrt)
    }

    pub fn abs(&self) -> Tensor {
        self.map(f32::abs)
    }

    pub fn square(&self) -> Tensor {
        self.map(|x| x * x)
    }

    pub fn powi(&self, n: i32) -> Tensor {
        self.map(|x| x.powi(n))
    }

    pub fn exp(&self) -> Tensor {
        self.map(f32::exp)
    }

    pub fn ln(&self) -> Tensor {
        self.map(f32::ln)
    }

    /// 符号函数：正数为1，负数为-1，0仍为0
    pub fn sign(&self) -> Tensor {
        self.map(|x| if x > 0. { 1. } else if x < 0. { -1. } else { 0. })
    }

    /// 将每个元素裁剪到[min, max]闭区间内
    pub fn clip(&self, min: f32, max: f32) -> Tensor {
        self.map(|x| x.clamp(min, max))
    }

    /// 逐元素取两个张量的较大值（形状须严格一致）
    pub fn maximum(&self, other: &Tensor) -> Tensor {
        assert!(
            self.is_same_shape(other),
            "maximum要求形状一致：{:?} vs {:?}",
            self.shape(),
            other.shape()
        );
        let mut data = self.array().clone();
        Zip::from(&mut data)
            .and(other.array())
            .for_each(|a, &b| *a = a.max(b));
        Tensor::from_array(data)
    }

    /// 按条件逐元素选择：`condition`中非0的位置取`on_true`，否则取`on_false`。
    /// 三者形状须严格一致。
    pub fn where_(condition: &Tensor, on_true: &Tensor, on_false: &Tensor) -> Tensor {
        assert!(
            condition.is_same_shape(on_true) && condition.is_same_shape(on_false),
            "where_要求三个张量形状一致：{:?}, {:?}, {:?}",
            condition.shape(),
            on_true.shape(),
            on_false.shape()
        );
        let mut data = on_false.array().clone();
        Zip::from(&mut data)
            .and(condition.array())
            .and(on_true.array())
            .for_each(|out, &c, &t| {
                if c != 0. {
                    *out = t;
                }
            });
        Tensor::from_array(data)
    }

    /// 对张量中的所有元素求和
    pub fn sum(&self) -> f32 {
        self.array().sum()
    }

    /// 所有元素的均值（空张量返回0）
    pub fn mean(&self) -> f32 {
        let size = self.size();
        if size == 0 { 0. } else { self.sum() / size as f32 }
    }

    /// 沿`axis`求和并去掉该维度
    pub fn sum_axis(&self, axis: usize) -> Tensor {
        Tensor::from_array(self.array().sum_axis(Axis(axis)))
    }

    /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓激活函数↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
    pub fn sigmoid(&self) -> Tensor {
        self.map(|x| 1. / (1. + (-x).exp()))
    }

    pub fn tanh(&self) -> Tensor {
        self.map(f32::tanh)
    }

    pub fn relu(&self) -> Tensor {
        self.map(|x| x.max(0.))
    }

    /// 沿最后一维做数值稳定的softmax
    pub fn softmax(&self) -> Tensor {
        let last_axis = Axis(self.dimension().saturating_sub(1));
        let mut data = self.array().clone();
        for mut lane in data.lanes_mut(last_axis) {
            let max = lane.fold(f32::NEG_INFINITY, |m, &x| m.max(x));
            lane.mapv_inplace(|x| (x - max).exp());
            let total = lane.sum();
            lane.mapv_inplace(|x| x / total);
        }
        Tensor::from_array(data)
    }
    /*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑激活函数↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/
}

/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 本类仅包含一些属性方法，不包含任何运算方法，所以不会需要用到mut
 */

use super::Tensor;
use approx::AbsDiffEq;
use ndarray::IxDyn;

impl Tensor {
    /// 若为向量，`shape`可以是[n]、[1,n]、[n,1]；
    /// 若为矩阵，`shape`可以是[n,m]；
    /// 若为更高维度的数组，`shape`可以是[c,n,m,...]。
    pub fn shape(&self) -> &[usize] {
        self.array().shape()
    }

    /// 张量的维（dim）数、阶（rank）数
    pub fn dimension(&self) -> usize {
        self.array().ndim()
    }

    /// 计算张量中所有元素的数量
    pub fn size(&self) -> usize {
        self.array().len()
    }

    /// 判断两个张量的形状是否严格一致。如：形状为 [1, 4]，[1, 4]和[4]是不一致的，会返回false
    pub fn is_same_shape(&self, other: &Self) -> bool {
        self.shape() == other.shape()
    }

    /// 判断张量是否为标量
    pub fn is_scalar(&self) -> bool {
        self.size() == 1
    }

    /// 转化为纯数（number）。若为标量，则返回Some(number)，否则返回None
    pub fn number(&self) -> Option<f32> {
        if self.is_scalar() {
            self.array().iter().next().copied()
        } else {
            None
        }
    }

    /// 按多维下标取单个元素，下标越界则panic
    pub fn get(&self, index: &[usize]) -> f32 {
        self.array()[IxDyn(index)]
    }

    /// 按行优先顺序拷贝出全部数据
    pub fn to_vec(&self) -> Vec<f32> {
        self.array().iter().copied().collect()
    }

    /// 两个张量能否按 NumPy 规则广播
    pub fn can_broadcast_with(&self, other: &Self) -> bool {
        self.shape()
            .iter()
            .rev()
            .zip(other.shape().iter().rev())
            .all(|(&a, &b)| a == b || a == 1 || b == 1)
    }

    /// 形状一致且每个元素之差的绝对值都不超过`epsilon`
    pub fn allclose(&self, other: &Self, epsilon: f32) -> bool {
        self.is_same_shape(other)
            && self
                .array()
                .iter()
                .zip(other.array().iter())
                .all(|(a, b)| a.abs_diff_eq(b, epsilon))
    }
}

/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 张量的四则运算，实现了两个张量“逐元素”（或张量与纯数）加减乘除的运算，并返回一个新的张量。
 *                 该运算支持以下情况：
 *                 1. 其中一个操作数为纯数而另一个为张量：则返回的张量形状与该张量相同。
 *                 2. 两个操作数均为张量：支持 NumPy 风格的广播（broadcasting）。
 *                 所有带/不带引用的组合均由`impl_tensor_arith!`宏统一生成。
 */

use crate::errors::{Operator, TensorError};
use crate::tensor::Tensor;
use paste::paste;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// 两个张量逐元素运算，支持 NumPy 风格广播（broadcasting）
///
/// # 广播规则
/// - 从右向左对齐维度
/// - 每个维度必须相等，或其中一个为 1
/// - 维度数不同时，较短的形状前面补 1
///
/// # Panics
/// 如果形状不兼容（无法广播）
fn broadcast_within_tensors(tensor_1: &Tensor, tensor_2: &Tensor, operator: Operator) -> Tensor {
    assert!(
        tensor_1.can_broadcast_with(tensor_2),
        "{}",
        TensorError::OperatorError {
            operator,
            tensor1_shape: tensor_1.shape().to_vec(),
            tensor2_shape: tensor_2.shape().to_vec(),
        }
    );
    let (a, b) = (tensor_1.array(), tensor_2.array());
    let data = match operator {
        Operator::Add => a + b,
        Operator::Sub => a - b,
        Operator::Mul => a * b,
        Operator::Div => a / b,
        Operator::MatMul | Operator::Concat => {
            unreachable!("{operator}不是逐元素运算")
        }
    };
    Tensor::from_array(data)
}

macro_rules! impl_tensor_arith {
    ($trait:ident) => {
        paste! {
            /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓（不）带引用的张量 ⊕（不）带引用的张量↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
            impl $trait for Tensor {
                type Output = Tensor;

                fn [<$trait:lower>](self, other: Tensor) -> Tensor {
                    broadcast_within_tensors(&self, &other, Operator::$trait)
                }
            }

            impl<'a> $trait<&'a Tensor> for Tensor {
                type Output = Tensor;

                fn [<$trait:lower>](self, other: &'a Tensor) -> Tensor {
                    broadcast_within_tensors(&self, other, Operator::$trait)
                }
            }

            impl $trait<Tensor> for &Tensor {
                type Output = Tensor;

                fn [<$trait:lower>](self, other: Tensor) -> Tensor {
                    broadcast_within_tensors(self, &other, Operator::$trait)
                }
            }

            impl<'b> $trait<&'b Tensor> for &Tensor {
                type Output = Tensor;

                fn [<$trait:lower>](self, other: &'b Tensor) -> Tensor {
                    broadcast_within_tensors(self, other, Operator::$trait)
                }
            }

            /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓（不）带引用的张量 ⊕ f32↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
            impl $trait<f32> for Tensor {
                type Output = Tensor;

                fn [<$trait:lower>](self, scalar: f32) -> Tensor {
                    Tensor::from_array($trait::[<$trait:lower>](self.array(), scalar))
                }
            }

            impl $trait<f32> for &Tensor {
                type Output = Tensor;

                fn [<$trait:lower>](self, scalar: f32) -> Tensor {
                    Tensor::from_array($trait::[<$trait:lower>](self.array(), scalar))
                }
            }

            /*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓f32 ⊕（不）带引用的张量↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
            impl $trait<Tensor> for f32 {
                type Output = Tensor;

                fn [<$trait:lower>](self, tensor: Tensor) -> Tensor {
                    Tensor::from_array($trait::[<$trait:lower>](self, tensor.array()))
                }
            }

            impl<'a> $trait<&'a Tensor> for f32 {
                type Output = Tensor;

                fn [<$trait:lower>](self, tensor: &'a Tensor) -> Tensor {
                    Tensor::from_array($trait::[<$trait:lower>](self, tensor.array()))
                }
            }
        }
    };
}

impl_tensor_arith!(Add);
impl_tensor_arith!(Sub);
impl_tensor_arith!(Mul);
impl_tensor_arith!(Div);

impl Neg for Tensor {
    type Output = Tensor;

    fn neg(self) -> Tensor {
        Tensor::from_array(-self.array())
    }
}

impl Neg for &Tensor {
    type Output = Tensor;

    fn neg(self) -> Tensor {
        Tensor::from_array(-self.array())
    }
}

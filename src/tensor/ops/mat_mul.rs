use crate::errors::{Operator, TensorError};
use crate::tensor::Tensor;
use ndarray::Ix2;

impl Tensor {
    /// 二阶张量（矩阵）乘法：`[n, k] @ [k, m] = [n, m]`
    ///
    /// # Panics
    /// 任一操作数不是矩阵，或内侧维度不相等
    pub fn mat_mul(&self, other: &Tensor) -> Tensor {
        let shape_error = || TensorError::OperatorError {
            operator: Operator::MatMul,
            tensor1_shape: self.shape().to_vec(),
            tensor2_shape: other.shape().to_vec(),
        };
        let (Ok(a), Ok(b)) = (
            self.array().view().into_dimensionality::<Ix2>(),
            other.array().view().into_dimensionality::<Ix2>(),
        ) else {
            panic!("{}", shape_error());
        };
        assert!(a.ncols() == b.nrows(), "{}", shape_error());
        Tensor::from_array(a.dot(&b).into_dyn())
    }
}

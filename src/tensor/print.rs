/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 张量的文本展示：按最外层维度逐层嵌套方括号，末尾附上形状
 */

use std::fmt;

use ndarray::{ArrayViewD, Axis};

use super::Tensor;

/// 把`view`写成嵌套列表；`depth`只用来决定换行后的缩进
fn write_nested(f: &mut fmt::Formatter<'_>, view: ArrayViewD<'_, f32>, depth: usize) -> fmt::Result {
    if view.ndim() == 0 {
        return write!(f, "{:8.4}", view.iter().next().copied().unwrap_or_default());
    }
    write!(f, "[")?;
    let len = view.len_of(Axis(0));
    for (i, sub) in view.axis_iter(Axis(0)).enumerate() {
        let is_scalar = sub.ndim() == 0;
        write_nested(f, sub, depth + 1)?;
        if i + 1 < len {
            write!(f, ",")?;
            if is_scalar {
                write!(f, " ")?;
            } else {
                write!(f, "\n{}", " ".repeat(depth + 1))?;
            }
        }
    }
    write!(f, "]")
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_nested(f, self.array().view(), 0)?;
        write!(f, "\n形状: {:?}", self.shape())
    }
}

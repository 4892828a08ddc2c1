/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : Graph 模块：层连接图的核心实现
 *
 * 公开 API：
 * - `Connection`: 层组成的有向无环图（组合、形状推断、初始化、前向/反向）
 * - `join`/`sequential`/`parallel`: 组合函数
 * - `TrainingStateGuard`: 训练状态的作用域守卫
 * - `GraphError`: 错误类型
 */

mod connection;
mod describe;
mod error;
mod join;
mod mode;
mod propagate;

pub use connection::{Connection, Shapes};
pub use error::GraphError;
pub use join::{Item, join, parallel, sequential};
pub use mode::TrainingStateGuard;
pub use propagate::{ForwardTrace, Gradients};

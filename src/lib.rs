//! # Graph Descent
//!
//! `graph_descent`用纯rust实现了一个小型的神经网络训练库：
//! 由层组成的连接图（顺序、并行分支、多对多合并、残差），
//! 以及一族梯度下降优化器（SGD、Adadelta、Adam、Momentum、Quickprop）。
//!

pub mod errors;
pub mod nn;
pub mod tensor;
pub mod utils;

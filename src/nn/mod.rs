/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 负责神经网络（neural network）的构建与训练：层、层连接图、误差函数与优化器
 */

pub mod criterion;
mod graph;
pub mod layer;
pub mod optimizer;

pub use criterion::ErrorFunction;
pub use graph::{
    Connection, ForwardTrace, GraphError, Gradients, Item, Shapes, TrainingStateGuard, join,
    parallel, sequential,
};
pub use layer::{Layer, LayerId, Parameter, Shape};

#[cfg(test)]
mod tests;

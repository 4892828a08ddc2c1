/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 优化器模块，实现梯度下降族的参数更新规则
 *
 * 每个优化器只负责“由梯度算出更新”：梯度来自`Connection::gradients`，
 * 辅助状态存放在优化器自己的`OptimizerState`中，以参数名为键。
 */

mod adadelta;
mod adam;
mod base;
mod config;
mod momentum;
mod quickprop;
mod sgd;
mod state;

pub use adadelta::{Adadelta, MEAN_SQUARED_DX, MEAN_SQUARED_GRAD};
pub use adam::{Adam, FIRST_MOMENT, SECOND_MOMENT};
pub use base::{
    GradientDescent, GradientDescentBase, ParamGrad, TrainingVariables, Update, Variable,
    iter_params_and_grads,
};
pub use config::{
    AdadeltaConfig, AdamConfig, MomentumConfig, OptimizerConfig, QuickpropConfig, SgdConfig,
};
pub use momentum::{Momentum, VELOCITY};
pub use quickprop::{PREV_DELTA, PREV_GRADIENT, Quickprop};
pub use sgd::Sgd;
pub use state::OptimizerState;

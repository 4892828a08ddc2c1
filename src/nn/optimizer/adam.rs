/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : Adam优化器
 *
 * m     = beta1 * prev_m + (1 - beta1) * grad
 * v     = beta2 * prev_v + (1 - beta2) * grad²
 * m_hat = m / (1 - beta1^epoch)
 * v_hat = v / (1 - beta2^epoch)
 * delta = m_hat * sqrt(v_hat + eps)
 * param = param - step * delta
 *
 * 注意delta是乘以而非除以sqrt(v_hat + eps)，与常见写法不同，这里保持原样。
 * 两个偏差修正系数对所有参数相同，所以在`init_train_updates`里每步只算一次。
 */

use super::base::{
    GradientDescent, GradientDescentBase, ParamGrad, Update, iter_params_and_grads,
};
use super::config::AdamConfig;
use crate::nn::GraphError;
use crate::nn::graph::{Connection, Gradients};

pub const FIRST_MOMENT: &str = "prev-first-moment";
pub const SECOND_MOMENT: &str = "prev-second-moment";

#[derive(Debug, Clone)]
pub struct Adam {
    base: GradientDescentBase,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
}

/// 当前epoch下的偏差修正系数(1 - beta1^epoch, 1 - beta2^epoch)
#[derive(Debug, Clone, Copy)]
struct BiasCorrection {
    first: f32,
    second: f32,
}

impl Adam {
    pub fn new(config: AdamConfig) -> Result<Self, GraphError> {
        config.validate()?;
        Ok(Self {
            base: GradientDescentBase::new(config.step, config.error),
            beta1: config.beta1,
            beta2: config.beta2,
            epsilon: config.epsilon,
        })
    }

    pub const fn beta1(&self) -> f32 {
        self.beta1
    }

    pub const fn beta2(&self) -> f32 {
        self.beta2
    }

    pub const fn epsilon(&self) -> f32 {
        self.epsilon
    }

    fn bias_correction(&self) -> BiasCorrection {
        let epoch = i32::try_from(self.epoch()).unwrap_or(i32::MAX);
        BiasCorrection {
            first: 1. - self.beta1.powi(epoch),
            second: 1. - self.beta2.powi(epoch),
        }
    }

    fn updates_with(&self, param: &ParamGrad<'_>, correction: BiasCorrection) -> Vec<Update> {
        let (name, value, grad) = (param.name(), param.value(), &*param.gradient);
        let state = &self.base.state;
        let prev_m = state.get_or_zeros(name, FIRST_MOMENT, value);
        let prev_v = state.get_or_zeros(name, SECOND_MOMENT, value);

        let m = &*prev_m * self.beta1 + grad * (1. - self.beta1);
        let v = &*prev_v * self.beta2 + grad.square() * (1. - self.beta2);
        let m_hat = &m / correction.first;
        let v_hat = &v / correction.second;
        let delta = m_hat * (v_hat + self.epsilon).sqrt();

        vec![
            Update::state(name, FIRST_MOMENT, m),
            Update::state(name, SECOND_MOMENT, v),
            Update::parameter(name, value - delta * self.step()),
        ]
    }
}

impl GradientDescent for Adam {
    fn base(&self) -> &GradientDescentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut GradientDescentBase {
        &mut self.base
    }

    fn name(&self) -> &'static str {
        "adam"
    }

    fn init_param_updates(&self, param: &ParamGrad<'_>) -> Result<Vec<Update>, GraphError> {
        Ok(self.updates_with(param, self.bias_correction()))
    }

    fn init_train_updates(
        &self,
        connection: &Connection,
        gradients: &Gradients,
    ) -> Result<Vec<Update>, GraphError> {
        let correction = self.bias_correction();
        Ok(iter_params_and_grads(connection, gradients)
            .flat_map(|param| self.updates_with(&param, correction))
            .collect())
    }
}

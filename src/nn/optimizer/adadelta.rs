/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : Adadelta优化器
 *
 * mean_sq_grad = decay * prev_mean_sq_grad + (1 - decay) * grad²
 * delta        = grad * sqrt(prev_mean_sq_dx + eps) / sqrt(mean_sq_grad + eps)
 * mean_sq_dx   = decay * prev_mean_sq_dx + (1 - decay) * delta²
 * param        = param - step * delta
 */

use super::base::{GradientDescent, GradientDescentBase, ParamGrad, Update};
use super::config::AdadeltaConfig;
use crate::nn::GraphError;

pub const MEAN_SQUARED_GRAD: &str = "prev-mean-squared-grad";
pub const MEAN_SQUARED_DX: &str = "prev-mean-squared-dx";

#[derive(Debug, Clone)]
pub struct Adadelta {
    base: GradientDescentBase,
    decay: f32,
    epsilon: f32,
}

impl Adadelta {
    pub fn new(config: AdadeltaConfig) -> Result<Self, GraphError> {
        config.validate()?;
        Ok(Self {
            base: GradientDescentBase::new(config.step, config.error),
            decay: config.decay,
            epsilon: config.epsilon,
        })
    }

    pub const fn decay(&self) -> f32 {
        self.decay
    }

    pub const fn epsilon(&self) -> f32 {
        self.epsilon
    }
}

impl GradientDescent for Adadelta {
    fn base(&self) -> &GradientDescentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut GradientDescentBase {
        &mut self.base
    }

    fn name(&self) -> &'static str {
        "adadelta"
    }

    fn init_param_updates(&self, param: &ParamGrad<'_>) -> Result<Vec<Update>, GraphError> {
        let (name, value, grad) = (param.name(), param.value(), &*param.gradient);
        let state = &self.base.state;
        let prev_mean_sq_grad = state.get_or_zeros(name, MEAN_SQUARED_GRAD, value);
        let prev_mean_sq_dx = state.get_or_zeros(name, MEAN_SQUARED_DX, value);

        let mean_sq_grad = &*prev_mean_sq_grad * self.decay + grad.square() * (1. - self.decay);
        let delta = grad * (&*prev_mean_sq_dx + self.epsilon).sqrt()
            / (&mean_sq_grad + self.epsilon).sqrt();
        let mean_sq_dx = &*prev_mean_sq_dx * self.decay + delta.square() * (1. - self.decay);

        Ok(vec![
            Update::state(name, MEAN_SQUARED_GRAD, mean_sq_grad),
            Update::state(name, MEAN_SQUARED_DX, mean_sq_dx),
            Update::parameter(name, value - delta * self.step()),
        ])
    }
}

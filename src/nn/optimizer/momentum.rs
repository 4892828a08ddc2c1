/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 带动量的梯度下降
 *
 * velocity = momentum * prev_velocity - step * grad
 * nesterov时再做一次：velocity = momentum * velocity - step * grad
 * param    = param + velocity
 */

use super::base::{GradientDescent, GradientDescentBase, ParamGrad, Update};
use super::config::MomentumConfig;
use crate::nn::GraphError;

pub const VELOCITY: &str = "previous-velocity";

#[derive(Debug, Clone)]
pub struct Momentum {
    base: GradientDescentBase,
    momentum: f32,
    nesterov: bool,
}

impl Momentum {
    pub fn new(config: MomentumConfig) -> Result<Self, GraphError> {
        config.validate()?;
        Ok(Self {
            base: GradientDescentBase::new(config.step, config.error),
            momentum: config.momentum,
            nesterov: config.nesterov,
        })
    }

    pub const fn momentum(&self) -> f32 {
        self.momentum
    }

    pub const fn nesterov(&self) -> bool {
        self.nesterov
    }
}

impl GradientDescent for Momentum {
    fn base(&self) -> &GradientDescentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut GradientDescentBase {
        &mut self.base
    }

    fn name(&self) -> &'static str {
        "momentum"
    }

    fn init_param_updates(&self, param: &ParamGrad<'_>) -> Result<Vec<Update>, GraphError> {
        let (name, value, grad) = (param.name(), param.value(), &*param.gradient);
        let step = self.step();
        let prev_velocity = self.base.state.get_or_zeros(name, VELOCITY, value);

        let mut velocity = &*prev_velocity * self.momentum - grad * step;
        if self.nesterov {
            velocity = velocity * self.momentum - grad * step;
        }

        Ok(vec![
            Update::parameter(name, value + &velocity),
            Update::state(name, VELOCITY, velocity),
        ])
    }
}

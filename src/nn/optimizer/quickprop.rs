/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : Quickprop优化器
 *
 * grad_delta = |prev_gradient - grad|
 * epoch == 1 时：delta = grad
 * 否则：        delta = clip(|prev_delta| * grad / grad_delta, -upper_bound, upper_bound)
 * param      = param - step * delta
 */

use super::base::{GradientDescent, GradientDescentBase, ParamGrad, Update};
use super::config::QuickpropConfig;
use crate::nn::GraphError;

pub const PREV_DELTA: &str = "prev-delta";
pub const PREV_GRADIENT: &str = "prev-grad";

#[derive(Debug, Clone)]
pub struct Quickprop {
    base: GradientDescentBase,
    upper_bound: f32,
}

impl Quickprop {
    pub fn new(config: QuickpropConfig) -> Result<Self, GraphError> {
        config.validate()?;
        Ok(Self {
            base: GradientDescentBase::new(config.step, config.error),
            upper_bound: config.upper_bound,
        })
    }

    pub const fn upper_bound(&self) -> f32 {
        self.upper_bound
    }
}

impl GradientDescent for Quickprop {
    fn base(&self) -> &GradientDescentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut GradientDescentBase {
        &mut self.base
    }

    fn name(&self) -> &'static str {
        "quickprop"
    }

    fn init_param_updates(&self, param: &ParamGrad<'_>) -> Result<Vec<Update>, GraphError> {
        let (name, value, grad) = (param.name(), param.value(), &*param.gradient);
        let state = &self.base.state;

        let delta = if self.epoch() == 1 {
            grad.clone()
        } else {
            let prev_delta = state.get_or_zeros(name, PREV_DELTA, value);
            let prev_gradient = state.get_or_zeros(name, PREV_GRADIENT, value);
            let grad_delta = (&*prev_gradient - grad).abs();
            let raw = prev_delta.abs() * grad / &grad_delta;
            // 0/0（梯度与上一步相同且上一步增量为0）得NaN，按0处理
            raw.map(|x| if x.is_nan() { 0. } else { x })
                .clip(-self.upper_bound, self.upper_bound)
        };

        Ok(vec![
            Update::parameter(name, value - &delta * self.step()),
            Update::state(name, PREV_DELTA, delta),
            Update::state(name, PREV_GRADIENT, grad.clone()),
        ])
    }
}

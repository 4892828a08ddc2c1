/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 最朴素的梯度下降：param = param - step * grad，没有辅助状态
 */

use super::base::{GradientDescent, GradientDescentBase, ParamGrad, Update};
use super::config::SgdConfig;
use crate::nn::GraphError;

#[derive(Debug, Clone)]
pub struct Sgd {
    base: GradientDescentBase,
}

impl Sgd {
    pub fn new(config: SgdConfig) -> Result<Self, GraphError> {
        config.validate()?;
        Ok(Self {
            base: GradientDescentBase::new(config.step, config.error),
        })
    }
}

impl GradientDescent for Sgd {
    fn base(&self) -> &GradientDescentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut GradientDescentBase {
        &mut self.base
    }

    fn name(&self) -> &'static str {
        "sgd"
    }

    fn init_param_updates(&self, param: &ParamGrad<'_>) -> Result<Vec<Update>, GraphError> {
        let step = self.step();
        Ok(vec![Update::parameter(
            param.name(),
            param.value() - &*param.gradient * step,
        )])
    }
}

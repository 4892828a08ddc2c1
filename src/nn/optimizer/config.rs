/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 优化器配置：不可变的配置结构体，构造优化器时统一校验
 *
 * 所有配置都可由JSON反序列化，缺省字段取`Default`中的值：
 * ```json
 * {"algorithm": "adam", "step": 10.0, "beta2": 0.99, "epsilon": 1e-4}
 * ```
 */

use serde::{Deserialize, Serialize};

use super::{Adadelta, Adam, GradientDescent, Momentum, Quickprop, Sgd};
use crate::nn::GraphError;
use crate::nn::criterion::ErrorFunction;

/*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓取值范围校验↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
fn invalid(option: &'static str, value: f32, reason: &str) -> GraphError {
    GraphError::Configuration {
        option,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// ≥0（NaN不合法）
pub(crate) fn non_negative(option: &'static str, value: f32) -> Result<f32, GraphError> {
    if value >= 0. {
        Ok(value)
    } else {
        Err(invalid(option, value, "必须≥0"))
    }
}

/// >0
fn positive(option: &'static str, value: f32) -> Result<f32, GraphError> {
    if value > 0. {
        Ok(value)
    } else {
        Err(invalid(option, value, "必须>0"))
    }
}

/// [0, 1]
fn proper_fraction(option: &'static str, value: f32) -> Result<f32, GraphError> {
    if (0. ..=1.).contains(&value) {
        Ok(value)
    } else {
        Err(invalid(option, value, "取值须在[0, 1]"))
    }
}

/// [0, 1)
fn half_open_fraction(option: &'static str, value: f32) -> Result<f32, GraphError> {
    if (0. ..1.).contains(&value) {
        Ok(value)
    } else {
        Err(invalid(option, value, "取值须在[0, 1)"))
    }
}
/*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑取值范围校验↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SgdConfig {
    pub step: f32,
    pub error: ErrorFunction,
}

impl Default for SgdConfig {
    fn default() -> Self {
        Self {
            step: 0.1,
            error: ErrorFunction::Mse,
        }
    }
}

impl SgdConfig {
    pub fn validate(&self) -> Result<(), GraphError> {
        non_negative("step", self.step)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdadeltaConfig {
    pub step: f32,
    /// 滑动平均的衰减率，[0, 1]
    pub decay: f32,
    pub epsilon: f32,
    pub error: ErrorFunction,
}

impl Default for AdadeltaConfig {
    fn default() -> Self {
        Self {
            step: 0.1,
            decay: 0.95,
            epsilon: 1e-5,
            error: ErrorFunction::Mse,
        }
    }
}

impl AdadeltaConfig {
    pub fn validate(&self) -> Result<(), GraphError> {
        non_negative("step", self.step)?;
        proper_fraction("decay", self.decay)?;
        non_negative("epsilon", self.epsilon)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdamConfig {
    pub step: f32,
    /// 一阶矩的衰减率，[0, 1)
    pub beta1: f32,
    /// 二阶矩的衰减率，[0, 1)
    pub beta2: f32,
    pub epsilon: f32,
    pub error: ErrorFunction,
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            step: 0.001,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            error: ErrorFunction::Mse,
        }
    }
}

impl AdamConfig {
    pub fn validate(&self) -> Result<(), GraphError> {
        non_negative("step", self.step)?;
        half_open_fraction("beta1", self.beta1)?;
        half_open_fraction("beta2", self.beta2)?;
        non_negative("epsilon", self.epsilon)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumConfig {
    pub step: f32,
    /// [0, 1]
    pub momentum: f32,
    /// 为true时使用Nesterov式的二次速度更新
    pub nesterov: bool,
    pub error: ErrorFunction,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            step: 0.1,
            momentum: 0.9,
            nesterov: false,
            error: ErrorFunction::Mse,
        }
    }
}

impl MomentumConfig {
    pub fn validate(&self) -> Result<(), GraphError> {
        non_negative("step", self.step)?;
        proper_fraction("momentum", self.momentum)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuickpropConfig {
    pub step: f32,
    /// 单步增量绝对值的上界，>0
    pub upper_bound: f32,
    pub error: ErrorFunction,
}

impl Default for QuickpropConfig {
    fn default() -> Self {
        Self {
            step: 0.1,
            upper_bound: 1.,
            error: ErrorFunction::Mse,
        }
    }
}

impl QuickpropConfig {
    pub fn validate(&self) -> Result<(), GraphError> {
        non_negative("step", self.step)?;
        positive("upper_bound", self.upper_bound)?;
        Ok(())
    }
}

/// 任一优化器的配置，以`algorithm`字段区分
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum OptimizerConfig {
    Sgd(SgdConfig),
    Adadelta(AdadeltaConfig),
    Adam(AdamConfig),
    Momentum(MomentumConfig),
    Quickprop(QuickpropConfig),
}

impl OptimizerConfig {
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        serde_json::from_str(json).map_err(|e| GraphError::Serialization(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, GraphError> {
        serde_json::to_string_pretty(self).map_err(|e| GraphError::Serialization(e.to_string()))
    }

    /// 校验并构造对应的优化器
    pub fn build(self) -> Result<Box<dyn GradientDescent>, GraphError> {
        let optimizer: Box<dyn GradientDescent> = match self {
            Self::Sgd(config) => Box::new(Sgd::new(config)?),
            Self::Adadelta(config) => Box::new(Adadelta::new(config)?),
            Self::Adam(config) => Box::new(Adam::new(config)?),
            Self::Momentum(config) => Box::new(Momentum::new(config)?),
            Self::Quickprop(config) => Box::new(Quickprop::new(config)?),
        };
        Ok(optimizer)
    }
}

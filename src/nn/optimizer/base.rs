/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 梯度下降族优化器的基础trait和辅助结构
 *
 * 一次训练步：
 * 1. 连接计算训练误差及每个参数的梯度（`Connection::gradients`）；
 * 2. 优化器由“更新前”的参数值、梯度与辅助状态算出全部`(变量, 新值)`对；
 * 3. 校验全部更新后一次性赋值，任何一步失败都不会修改参数或辅助状态。
 */

use std::borrow::Cow;

use super::OptimizerState;
use crate::nn::criterion::ErrorFunction;
use crate::nn::graph::{Connection, Gradients};
use crate::nn::layer::{Layer, Parameter};
use crate::nn::GraphError;
use crate::tensor::Tensor;

/// 优化器共享的训练计数器
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingVariables {
    /// 学习率
    pub(crate) step: f32,
    /// 从1开始，每完成一轮（epoch）加1
    pub(crate) epoch: usize,
}

impl TrainingVariables {
    pub(crate) const fn new(step: f32) -> Self {
        Self { step, epoch: 1 }
    }

    pub const fn step(&self) -> f32 {
        self.step
    }

    pub const fn epoch(&self) -> usize {
        self.epoch
    }
}

/// 一次更新的目标：参数本身，或某个参数的某个辅助状态槽位
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Variable {
    Parameter(String),
    State { parameter: String, slot: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub variable: Variable,
    pub value: Tensor,
}

impl Update {
    pub fn parameter(name: &str, value: Tensor) -> Self {
        Self {
            variable: Variable::Parameter(name.to_string()),
            value,
        }
    }

    pub fn state(parameter: &str, slot: &'static str, value: Tensor) -> Self {
        Self {
            variable: Variable::State {
                parameter: parameter.to_string(),
                slot,
            },
            value,
        }
    }
}

/// (层, 参数, 梯度)三元组
#[derive(Debug, Clone)]
pub struct ParamGrad<'a> {
    pub layer: &'a Layer,
    pub parameter: &'a Parameter,
    pub gradient: Cow<'a, Tensor>,
}

impl ParamGrad<'_> {
    pub fn name(&self) -> &str {
        self.parameter.name()
    }

    pub fn value(&self) -> &Tensor {
        self.parameter.value()
    }
}

/// 按执行顺序惰性地给出每个可训练参数及其梯度；与误差无关的参数梯度为0
pub fn iter_params_and_grads<'a>(
    connection: &'a Connection,
    gradients: &'a Gradients,
) -> impl Iterator<Item = ParamGrad<'a>> + 'a {
    connection.parameters().map(|(layer, parameter)| ParamGrad {
        layer,
        parameter,
        gradient: gradients.get(parameter.name()).map_or_else(
            || Cow::Owned(Tensor::zeros_like(parameter.value())),
            Cow::Borrowed,
        ),
    })
}

/// 各优化器共用的状态
#[derive(Debug, Clone)]
pub struct GradientDescentBase {
    pub(crate) variables: TrainingVariables,
    pub(crate) state: OptimizerState,
    pub(crate) error: ErrorFunction,
}

impl GradientDescentBase {
    pub(crate) fn new(step: f32, error: ErrorFunction) -> Self {
        Self {
            variables: TrainingVariables::new(step),
            state: OptimizerState::new(),
            error,
        }
    }
}

/// 梯度下降族优化器
pub trait GradientDescent {
    fn base(&self) -> &GradientDescentBase;

    fn base_mut(&mut self) -> &mut GradientDescentBase;

    fn name(&self) -> &'static str;

    /// 单个参数的更新规则：返回参数及其辅助状态的新值。
    /// 只读取更新前的值，不修改任何状态。
    fn init_param_updates(&self, param: &ParamGrad<'_>) -> Result<Vec<Update>, GraphError>;

    /// 整个连接的更新：缺省为逐参数拼接`init_param_updates`的结果
    fn init_train_updates(
        &self,
        connection: &Connection,
        gradients: &Gradients,
    ) -> Result<Vec<Update>, GraphError> {
        let mut updates = Vec::new();
        for param in iter_params_and_grads(connection, gradients) {
            updates.extend(self.init_param_updates(&param)?);
        }
        Ok(updates)
    }

    /// 一次训练步，返回更新前的训练误差
    fn train_step(
        &mut self,
        connection: &mut Connection,
        inputs: &[Tensor],
        targets: &[Tensor],
    ) -> Result<f32, GraphError> {
        let gradients = connection.gradients(inputs, targets, self.base().error)?;
        let updates = self.init_train_updates(connection, &gradients)?;
        apply_updates(connection, &mut self.base_mut().state, updates)?;
        Ok(gradients.error())
    }

    /// 按`batch_size`切分小批量训练一轮（None为全批量），结束后epoch加1。
    /// 返回各小批量误差按样本数加权的平均值。
    fn train_epoch(
        &mut self,
        connection: &mut Connection,
        inputs: &[Tensor],
        targets: &[Tensor],
        batch_size: Option<usize>,
    ) -> Result<f32, GraphError> {
        let n_samples = sample_count(inputs, targets)?;
        let batch_size = match batch_size {
            Some(0) => {
                return Err(GraphError::Configuration {
                    option: "batch_size",
                    value: "0".to_string(),
                    reason: "必须大于0".to_string(),
                });
            }
            Some(size) => size,
            None => n_samples,
        };

        let mut total_error = 0.;
        let mut start = 0;
        while start < n_samples {
            let end = (start + batch_size).min(n_samples);
            let batch_inputs = slice_all(inputs, start, end);
            let batch_targets = slice_all(targets, start, end);
            let error = self.train_step(connection, &batch_inputs, &batch_targets)?;
            total_error += error * (end - start) as f32;
            start = end;
        }
        self.base_mut().variables.epoch += 1;
        Ok(total_error / n_samples as f32)
    }

    /// 关闭训练状态后计算的误差（如Dropout不生效），不修改任何参数
    fn prediction_error(
        &self,
        connection: &mut Connection,
        inputs: &[Tensor],
        targets: &[Tensor],
    ) -> Result<f32, GraphError> {
        let error_function = self.base().error;
        connection.without_training(|connection| {
            let outputs = connection.output(inputs)?;
            if outputs.len() != targets.len() {
                return Err(GraphError::InputCount {
                    expected: outputs.len(),
                    got: targets.len(),
                });
            }
            outputs
                .iter()
                .zip(targets)
                .map(|(prediction, target)| error_function.value(prediction, target))
                .sum()
        })
    }

    fn step(&self) -> f32 {
        self.base().variables.step
    }

    /// 外部调整学习率（如退火）
    fn set_step(&mut self, step: f32) -> Result<(), GraphError> {
        self.base_mut().variables.step = super::config::non_negative("step", step)?;
        Ok(())
    }

    fn epoch(&self) -> usize {
        self.base().variables.epoch
    }

    fn error_function(&self) -> ErrorFunction {
        self.base().error
    }

    fn state(&self) -> &OptimizerState {
        &self.base().state
    }

    /// 用先前保存的辅助状态替换当前状态
    fn load_state(&mut self, state: OptimizerState) {
        self.base_mut().state = state;
    }

    /// 清空辅助状态并把epoch复位为1
    fn reset(&mut self) {
        let base = self.base_mut();
        base.state.clear();
        base.variables.epoch = 1;
    }
}

/// 校验全部更新后一次性赋值
pub(crate) fn apply_updates(
    connection: &mut Connection,
    state: &mut OptimizerState,
    updates: Vec<Update>,
) -> Result<(), GraphError> {
    for update in &updates {
        let name = match &update.variable {
            Variable::Parameter(name) | Variable::State { parameter: name, .. } => name,
        };
        let parameter = connection
            .parameter(name)
            .ok_or_else(|| GraphError::InvalidOperation(format!("连接中不存在参数`{name}`")))?;
        if parameter.shape() != update.value.shape() {
            return Err(GraphError::ShapeMismatch(format!(
                "参数`{name}`的形状为{:?}，更新值的形状为{:?}",
                parameter.shape(),
                update.value.shape()
            )));
        }
    }
    for Update { variable, value } in updates {
        match variable {
            Variable::Parameter(name) => {
                if let Some(parameter) = connection.parameter_mut(&name) {
                    parameter.set_value(value);
                }
            }
            Variable::State { parameter, slot } => state.assign(&parameter, slot, value),
        }
    }
    Ok(())
}

fn sample_count(inputs: &[Tensor], targets: &[Tensor]) -> Result<usize, GraphError> {
    let first = inputs
        .first()
        .ok_or(GraphError::InputCount { expected: 1, got: 0 })?;
    let n_samples = first.shape().first().copied().unwrap_or(1);
    if let Some(bad) = inputs
        .iter()
        .chain(targets)
        .find(|t| t.shape().first().copied().unwrap_or(1) != n_samples)
    {
        return Err(GraphError::ShapeMismatch(format!(
            "所有输入/目标的样本数须一致：{n_samples} vs {:?}",
            bad.shape()
        )));
    }
    if n_samples == 0 {
        return Err(GraphError::ShapeMismatch("训练数据中没有样本".to_string()));
    }
    Ok(n_samples)
}

fn slice_all(tensors: &[Tensor], start: usize, end: usize) -> Vec<Tensor> {
    tensors.iter().map(|t| t.slice_batch(start, end)).collect()
}

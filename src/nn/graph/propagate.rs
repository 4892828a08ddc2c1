/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : Connection 的前向传播与反向求梯度
 *
 * 前向：按拓扑序执行，每个层在其所有前驱执行完后才执行。
 * 反向：按拓扑序的逆序，把各层的输出梯度沿入边分发回前驱（扇出处累加）。
 */

use std::collections::HashMap;

use super::{Connection, GraphError};
use crate::nn::criterion::ErrorFunction;
use crate::nn::layer::{Layer, LayerId, TraitLayer};
use crate::tensor::Tensor;

/// 一次前向传播中每个层的输出，以及入口层收到的外部输入
#[derive(Debug, Clone)]
pub struct ForwardTrace {
    values: HashMap<LayerId, Tensor>,
    fed: HashMap<LayerId, Tensor>,
    /// 层在前向时留给反向的中间量（如dropout掩码）
    caches: HashMap<LayerId, Tensor>,
}

impl ForwardTrace {
    pub fn value(&self, id: LayerId) -> Option<&Tensor> {
        self.values.get(&id)
    }
}

/// 训练误差以及它对每个参数的梯度（以参数名为键）
#[derive(Debug, Clone)]
pub struct Gradients {
    error: f32,
    by_parameter: HashMap<String, Tensor>,
}

impl Gradients {
    pub const fn error(&self) -> f32 {
        self.error
    }

    pub fn get(&self, parameter_name: &str) -> Option<&Tensor> {
        self.by_parameter.get(parameter_name)
    }

    pub fn len(&self) -> usize {
        self.by_parameter.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_parameter.is_empty()
    }
}

impl Connection {
    /// 前向传播，按出口层顺序返回每个出口的输出。
    /// 只给1个张量时它会被送给所有入口层，否则张量个数必须等于入口个数。
    pub fn output(&self, inputs: &[Tensor]) -> Result<Vec<Tensor>, GraphError> {
        let trace = self.propagate(inputs)?;
        self.output_layers
            .iter()
            .map(|id| {
                trace.values.get(id).cloned().ok_or_else(|| {
                    GraphError::InvalidOperation(format!("出口层{id}没有产生输出"))
                })
            })
            .collect()
    }

    /// 前向传播并记录每个层的输出
    pub fn propagate(&self, inputs: &[Tensor]) -> Result<ForwardTrace, GraphError> {
        let fed = self.feed(inputs)?;
        let mut values = HashMap::with_capacity(self.order.len());
        let mut caches = HashMap::new();
        for &id in &self.order {
            let layer = self.layer_ref(id)?;
            if !layer.is_initialized() && layer.kind().requires_input_shape() {
                return Err(GraphError::NotInitialized(format!("层`{}`", layer.name())));
            }
            let layer_inputs = self.layer_inputs(id, &values, &fed)?;
            let (output, cache) = layer.forward_cached(&layer_inputs)?;
            values.insert(id, output);
            if let Some(cache) = cache {
                caches.insert(id, cache);
            }
        }
        Ok(ForwardTrace {
            values,
            fed,
            caches,
        })
    }

    /// 计算`error_function(输出, 目标)`以及它对所有参数的梯度。
    /// 多出口时误差为各出口误差之和，`targets`须与出口一一对应。
    pub fn gradients(
        &self,
        inputs: &[Tensor],
        targets: &[Tensor],
        error_function: ErrorFunction,
    ) -> Result<Gradients, GraphError> {
        if targets.len() != self.output_layers.len() {
            return Err(GraphError::InputCount {
                expected: self.output_layers.len(),
                got: targets.len(),
            });
        }
        let trace = self.propagate(inputs)?;

        let mut error = 0.;
        let mut upstream: HashMap<LayerId, Tensor> = HashMap::new();
        for (id, target) in self.output_layers.iter().zip(targets) {
            let prediction = trace
                .value(*id)
                .ok_or_else(|| GraphError::InvalidOperation(format!("出口层{id}没有产生输出")))?;
            error += error_function.value(prediction, target)?;
            accumulate(&mut upstream, *id, error_function.gradient(prediction, target)?);
        }

        let mut by_parameter = HashMap::new();
        for &id in self.order.iter().rev() {
            // 与误差无关的层（不通向任何出口）没有梯度
            let Some(grad_output) = upstream.remove(&id) else {
                continue;
            };
            let layer = self.layer_ref(id)?;
            let output = trace
                .value(id)
                .ok_or_else(|| GraphError::InvalidOperation(format!("层`{}`没有前向输出", layer.name())))?;
            let layer_inputs = self.layer_inputs(id, &trace.values, &trace.fed)?;
            let grads = layer.backward_cached(
                &layer_inputs,
                output,
                trace.caches.get(&id),
                &grad_output,
            )?;

            for (parameter, grad) in layer.parameters().into_iter().zip(grads.parameters) {
                by_parameter.insert(parameter.name().to_string(), grad);
            }
            for (&predecessor, grad) in self.predecessors(id).iter().zip(grads.inputs) {
                accumulate(&mut upstream, predecessor, grad);
            }
        }
        Ok(Gradients {
            error,
            by_parameter,
        })
    }

    /// 将外部输入分配给各入口层
    fn feed(&self, inputs: &[Tensor]) -> Result<HashMap<LayerId, Tensor>, GraphError> {
        match inputs {
            [shared] => Ok(self
                .input_layers
                .iter()
                .map(|&id| (id, shared.clone()))
                .collect()),
            _ if inputs.len() == self.input_layers.len() => Ok(self
                .input_layers
                .iter()
                .copied()
                .zip(inputs.iter().cloned())
                .collect()),
            _ => Err(GraphError::InputCount {
                expected: self.input_layers.len(),
                got: inputs.len(),
            }),
        }
    }

    /// 某层的输入：入口层取外部输入，否则按入边顺序取各前驱的输出
    fn layer_inputs<'a>(
        &self,
        id: LayerId,
        values: &'a HashMap<LayerId, Tensor>,
        fed: &'a HashMap<LayerId, Tensor>,
    ) -> Result<Vec<&'a Tensor>, GraphError> {
        let predecessors = self.predecessors(id);
        if predecessors.is_empty() {
            return fed
                .get(&id)
                .map(|tensor| vec![tensor])
                .ok_or_else(|| GraphError::InvalidOperation(format!("入口层{id}没有收到输入")));
        }
        predecessors
            .iter()
            .map(|pred| {
                values
                    .get(pred)
                    .ok_or_else(|| GraphError::InvalidOperation(format!("层{pred}尚未执行")))
            })
            .collect()
    }

    fn layer_ref(&self, id: LayerId) -> Result<&Layer, GraphError> {
        self.layers
            .get(&id)
            .ok_or_else(|| GraphError::InvalidOperation(format!("连接中不存在层{id}")))
    }
}

fn accumulate(upstream: &mut HashMap<LayerId, Tensor>, id: LayerId, grad: Tensor) {
    match upstream.remove(&id) {
        Some(existing) => upstream.insert(id, existing + grad),
        None => upstream.insert(id, grad),
    };
}

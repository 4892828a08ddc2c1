/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : Layer 模块 - 连接图中的节点
 *
 * 一个`Layer`由两部分组成：
 * - 通用部分（`Layer`结构体）：身份（id/名称）、已解析的输入/输出形状、初始化标记、训练状态标记；
 * - 具体种类（`LayerKind`）：形状推断规则、前向/反向计算与参数，经`enum_dispatch`静态分发到各具体类型。
 *
 * 约定：层的“形状”不含batch维度，而张量的第0维永远是batch。
 */

mod activation;
mod avg_pool2d;
mod concatenate;
mod conv2d;
mod dense;
mod dropout;
mod elementwise;
mod identity;
mod input;
mod max_pool2d;
mod reshape;

pub use activation::{Activation, ActivationFn};
pub use avg_pool2d::AvgPool2d;
pub use concatenate::Concatenate;
pub use conv2d::Conv2d;
pub use dense::Dense;
pub use dropout::Dropout;
pub use elementwise::{Elementwise, MergeOp};
pub use identity::Identity;
pub use input::Input;
pub use max_pool2d::MaxPool2d;
pub use reshape::Reshape;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use enum_dispatch::enum_dispatch;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::nn::GraphError;
use crate::tensor::Tensor;

/// 不含batch维度的形状
pub type Shape = Vec<usize>;

/// 层的唯一标识（进程内全局递增，所以来自不同连接的层合并后也不会冲突）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub(crate) u64);

static NEXT_LAYER_ID: AtomicU64 = AtomicU64::new(1);

impl LayerId {
    fn generate() -> Self {
        Self(NEXT_LAYER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 层能接收的入边数量
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// 恰好一个输入
    Single,
    /// 合并层：任意多个（≥1）输入，按入边顺序排列
    Many,
}

/// 层拥有的可训练参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    name: String,
    value: Tensor,
}

impl Parameter {
    pub(crate) fn new(name: String, value: Tensor) -> Self {
        Self { name, value }
    }

    /// 形如`<层名>/<参数名>`，在整个连接内唯一
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Tensor {
        &self.value
    }

    pub fn shape(&self) -> &[usize] {
        self.value.shape()
    }

    pub(crate) fn set_value(&mut self, value: Tensor) {
        self.value = value;
    }
}

/// 单个层反向传播的结果
#[derive(Debug, Clone)]
pub struct LayerGradients {
    /// 对每个输入的梯度，顺序同入边
    pub inputs: Vec<Tensor>,
    /// 对每个参数的梯度，顺序同`parameters()`
    pub parameters: Vec<Tensor>,
}

impl LayerGradients {
    pub(crate) fn inputs_only(inputs: Vec<Tensor>) -> Self {
        Self {
            inputs,
            parameters: Vec::new(),
        }
    }
}

#[enum_dispatch]
#[derive(Debug, Clone)]
pub enum LayerKind {
    Input(Input),
    Identity(Identity),
    Dense(Dense),
    Activation(Activation),
    Conv2d(Conv2d),
    MaxPool2d(MaxPool2d),
    AvgPool2d(AvgPool2d),
    Concatenate(Concatenate),
    Elementwise(Elementwise),
    Reshape(Reshape),
    Dropout(Dropout),
}

#[enum_dispatch(LayerKind)]
pub trait TraitLayer {
    /// 种类名，同时用作默认层名前缀
    fn kind_name(&self) -> &'static str;

    fn arity(&self) -> Arity {
        Arity::Single
    }

    /// 作为连接的入口（没有前驱）时自身声明的输入形状，只有`Input`有
    fn declared_input_shape(&self) -> Option<Shape> {
        None
    }

    /// 由输入形状推断输出形状；输入形状未知时一般返回`Ok(None)`，
    /// 输入形状已知但不合法时返回`ShapeMismatch`
    fn output_shape(&self, input_shapes: &[Option<Shape>]) -> Result<Option<Shape>, GraphError>;

    /// 初始化是否依赖已知的输入形状（有参数的层才需要）
    fn requires_input_shape(&self) -> bool {
        false
    }

    /// 一次性分配参数，`input_shapes`在`requires_input_shape()`为真时保证全部已知
    fn initialize(
        &mut self,
        _layer_name: &str,
        _input_shapes: &[Shape],
        _rng: &mut StdRng,
    ) -> Result<(), GraphError> {
        Ok(())
    }

    /// 纯函数式的前向计算
    fn forward(&self, inputs: &[&Tensor], training: bool) -> Result<Tensor, GraphError>;

    /// 给定前向的输入/输出与输出梯度，计算对各输入、各参数的梯度
    fn backward(
        &self,
        inputs: &[&Tensor],
        output: &Tensor,
        grad_output: &Tensor,
        training: bool,
    ) -> Result<LayerGradients, GraphError>;

    /// 前向计算，同时返回反向需要但无法由输入/输出还原的中间量（如dropout的掩码）
    fn forward_cached(
        &self,
        inputs: &[&Tensor],
        training: bool,
    ) -> Result<(Tensor, Option<Tensor>), GraphError> {
        Ok((self.forward(inputs, training)?, None))
    }

    /// 带前向缓存的反向计算，`cache`为`forward_cached`返回的中间量
    fn backward_cached(
        &self,
        inputs: &[&Tensor],
        output: &Tensor,
        _cache: Option<&Tensor>,
        grad_output: &Tensor,
        training: bool,
    ) -> Result<LayerGradients, GraphError> {
        self.backward(inputs, output, grad_output, training)
    }

    fn parameters(&self) -> Vec<&Parameter> {
        Vec::new()
    }

    fn parameters_mut(&mut self) -> Vec<&mut Parameter> {
        Vec::new()
    }
}

/// 连接图中的一个节点
#[derive(Debug, Clone)]
pub struct Layer {
    id: LayerId,
    name: String,
    training: bool,
    initialized: bool,
    input_shapes: Vec<Option<Shape>>,
    output_shape: Option<Shape>,
    kind: LayerKind,
}

impl Layer {
    /// 以默认名称（`<种类>-<id>`）创建层
    pub fn new(kind: impl Into<LayerKind>) -> Self {
        let kind = kind.into();
        let id = LayerId::generate();
        let name = format!("{}-{}", kind.kind_name(), id.0);
        Self::build(id, name, kind)
    }

    /// 以指定名称创建层，参数名由该名称派生，便于保存/恢复优化器状态
    pub fn named(name: &str, kind: impl Into<LayerKind>) -> Self {
        Self::build(LayerId::generate(), name.to_string(), kind.into())
    }

    fn build(id: LayerId, name: String, kind: LayerKind) -> Self {
        let mut layer = Self {
            id,
            name,
            training: true,
            initialized: false,
            input_shapes: vec![None],
            output_shape: None,
            kind,
        };
        // 单独存在时，入口层的形状只取决于自身声明
        let declared = layer.kind.declared_input_shape();
        if let Ok(output_shape) = layer.kind.output_shape(&[declared.clone()]) {
            layer.input_shapes = vec![declared];
            layer.output_shape = output_shape;
        }
        layer
    }

    pub const fn id(&self) -> LayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn kind(&self) -> &LayerKind {
        &self.kind
    }

    pub const fn training_state(&self) -> bool {
        self.training
    }

    pub fn set_training_state(&mut self, training: bool) {
        self.training = training;
    }

    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// 每条入边对应一个形状，入口层则只有一个（来自外部输入）
    pub fn input_shapes(&self) -> &[Option<Shape>] {
        &self.input_shapes
    }

    pub const fn output_shape(&self) -> Option<&Shape> {
        self.output_shape.as_ref()
    }

    /// 作为入口层时自身声明的输入形状
    pub(crate) fn declared_input_shape(&self) -> Option<Shape> {
        self.kind.declared_input_shape()
    }

    pub fn parameters(&self) -> Vec<&Parameter> {
        self.kind.parameters()
    }

    pub(crate) fn parameters_mut(&mut self) -> Vec<&mut Parameter> {
        self.kind.parameters_mut()
    }

    /// 参数个数（所有参数张量的元素总数）
    pub fn parameter_count(&self) -> usize {
        self.parameters().iter().map(|p| p.value().size()).sum()
    }

    /// 重新解析形状；出错时不修改自身
    pub(crate) fn resolve_shapes(&mut self, input_shapes: Vec<Option<Shape>>) -> Result<(), GraphError> {
        let output_shape = self
            .kind
            .output_shape(&input_shapes)
            .map_err(|e| match e {
                GraphError::ShapeMismatch(msg) => {
                    GraphError::ShapeMismatch(format!("层`{}`：{msg}", self.name))
                }
                other => other,
            })?;
        self.input_shapes = input_shapes;
        self.output_shape = output_shape;
        Ok(())
    }

    /// 检查能否初始化（不修改任何状态）
    pub(crate) fn check_initializable(&self) -> Result<(), GraphError> {
        if !self.initialized
            && self.kind.requires_input_shape()
            && self.input_shapes.iter().any(Option::is_none)
        {
            return Err(GraphError::UnknownShape(format!("层`{}`", self.name)));
        }
        Ok(())
    }

    /// 一次性初始化；已初始化则什么也不做
    pub(crate) fn initialize(&mut self, rng: &mut StdRng) -> Result<(), GraphError> {
        if self.initialized {
            return Ok(());
        }
        self.check_initializable()?;
        let shapes = self.input_shapes.iter().flatten().cloned().collect::<Vec<_>>();
        self.kind.initialize(&self.name, &shapes, rng)?;
        self.initialized = true;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn forward(&self, inputs: &[&Tensor]) -> Result<Tensor, GraphError> {
        self.kind.forward(inputs, self.training)
    }

    pub(crate) fn forward_cached(
        &self,
        inputs: &[&Tensor],
    ) -> Result<(Tensor, Option<Tensor>), GraphError> {
        self.kind.forward_cached(inputs, self.training)
    }

    #[cfg(test)]
    pub(crate) fn backward(
        &self,
        inputs: &[&Tensor],
        output: &Tensor,
        grad_output: &Tensor,
    ) -> Result<LayerGradients, GraphError> {
        self.kind.backward(inputs, output, grad_output, self.training)
    }

    pub(crate) fn backward_cached(
        &self,
        inputs: &[&Tensor],
        output: &Tensor,
        cache: Option<&Tensor>,
        grad_output: &Tensor,
    ) -> Result<LayerGradients, GraphError> {
        self.kind
            .backward_cached(inputs, output, cache, grad_output, self.training)
    }
}

macro_rules! impl_layer_from_kind {
    ($($kind:ident),* $(,)?) => {
        $(
            impl From<$kind> for Layer {
                fn from(kind: $kind) -> Self {
                    Layer::new(kind)
                }
            }
        )*
    };
}

impl_layer_from_kind!(
    Input,
    Identity,
    Dense,
    Activation,
    Conv2d,
    MaxPool2d,
    AvgPool2d,
    Concatenate,
    Elementwise,
    Reshape,
    Dropout,
);

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind.kind_name(), self.name)
    }
}

/*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓各层共用的小工具↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/

/// 要求恰好一个输入形状，并返回它（可能未知）
pub(crate) fn single_shape<'a>(
    kind: &str,
    input_shapes: &'a [Option<Shape>],
) -> Result<Option<&'a Shape>, GraphError> {
    match input_shapes {
        [shape] => Ok(shape.as_ref()),
        _ => Err(GraphError::ShapeMismatch(format!(
            "{kind}只接受1个输入，实际有{}个",
            input_shapes.len()
        ))),
    }
}

/// 要求恰好一个输入张量
pub(crate) fn single_input<'a>(kind: &str, inputs: &[&'a Tensor]) -> Result<&'a Tensor, GraphError> {
    match inputs {
        [input] => Ok(input),
        _ => Err(GraphError::InvalidOperation(format!(
            "{kind}只接受1个输入张量，实际有{}个",
            inputs.len()
        ))),
    }
}

/// 将张量形状拆成(batch, 不含batch的形状)
pub(crate) fn split_batch(tensor: &Tensor) -> (usize, &[usize]) {
    match tensor.shape() {
        [] => (1, &[]),
        [batch, rest @ ..] => (*batch, rest),
    }
}

/// 检查输入张量（去掉batch维）与期望形状一致
pub(crate) fn expect_input_shape(kind: &str, tensor: &Tensor, expected: &[usize]) -> Result<(), GraphError> {
    let (_, actual) = split_batch(tensor);
    if actual != expected {
        return Err(GraphError::ShapeMismatch(format!(
            "{kind}期望输入形状为{expected:?}，实际为{actual:?}"
        )));
    }
    Ok(())
}
/// Xavier（Glorot）正态初始化：std = sqrt(2 / (fan_in + fan_out))
pub(crate) fn xavier_normal(fan_in: usize, fan_out: usize, shape: &[usize], rng: &mut StdRng) -> Tensor {
    let std_dev = (2. / (fan_in + fan_out).max(1) as f32).sqrt();
    Tensor::new_normal(0., std_dev, shape, rng)
}

/// 校验一个正整数配置项
pub(crate) fn positive(option: &'static str, value: usize) -> Result<usize, GraphError> {
    if value == 0 {
        return Err(GraphError::Configuration {
            option,
            value: value.to_string(),
            reason: "必须大于0".to_string(),
        });
    }
    Ok(value)
}
/*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑各层共用的小工具↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

#[cfg(test)]
mod tests;

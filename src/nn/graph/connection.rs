/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : Connection：由层组成的有向无环图
 *
 * - `forward_graph`：层 → 有序的后继层列表
 * - `backward_graph`：层 → 有序的前驱层列表（顺序即该层各输入的顺序）
 * - `order`：拓扑序，也是前向执行和迭代的顺序
 *
 * 连接只在组合（join）期间被修改；组合完成后只有参数值与训练状态标记会变化。
 */

use std::collections::HashMap;

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::GraphError;
use crate::nn::layer::{Layer, LayerId, Parameter, Shape};

/// 单个或多个形状：只有一个入口/出口时为`Single`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shapes {
    Single(Option<Shape>),
    Multiple(Vec<Option<Shape>>),
}

impl Shapes {
    fn from_vec(mut shapes: Vec<Option<Shape>>) -> Self {
        if shapes.len() == 1 {
            Self::Single(shapes.remove(0))
        } else {
            Self::Multiple(shapes)
        }
    }

    /// 统一成列表形式
    pub fn to_vec(&self) -> Vec<Option<Shape>> {
        match self {
            Self::Single(shape) => vec![shape.clone()],
            Self::Multiple(shapes) => shapes.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Connection {
    pub(super) layers: HashMap<LayerId, Layer>,
    pub(super) forward_graph: HashMap<LayerId, Vec<LayerId>>,
    pub(super) backward_graph: HashMap<LayerId, Vec<LayerId>>,
    pub(super) input_layers: Vec<LayerId>,
    pub(super) output_layers: Vec<LayerId>,
    pub(super) order: Vec<LayerId>,
}

impl From<Layer> for Connection {
    fn from(layer: Layer) -> Self {
        let id = layer.id();
        Self {
            layers: HashMap::from([(id, layer)]),
            forward_graph: HashMap::from([(id, Vec::new())]),
            backward_graph: HashMap::from([(id, Vec::new())]),
            input_layers: vec![id],
            output_layers: vec![id],
            order: vec![id],
        }
    }
}

impl Connection {
    // ========== 拓扑与层访问 ==========

    /// 连接中的层数
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// 连接至少含一个层
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// 按执行顺序遍历所有层
    pub fn layers(&self) -> impl Iterator<Item = &Layer> + '_ {
        self.order.iter().filter_map(|id| self.layers.get(id))
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(&id)
    }

    pub fn layer_by_name(&self, name: &str) -> Option<&Layer> {
        self.layers().find(|layer| layer.name() == name)
    }

    /// 入口层（没有前驱），顺序即`output`所需输入张量的顺序
    pub fn input_layers(&self) -> Vec<&Layer> {
        self.input_layers.iter().filter_map(|id| self.layers.get(id)).collect()
    }

    /// 出口层（没有后继），顺序即`output`返回张量的顺序
    pub fn output_layers(&self) -> Vec<&Layer> {
        self.output_layers.iter().filter_map(|id| self.layers.get(id)).collect()
    }

    pub fn successors(&self, id: LayerId) -> &[LayerId] {
        self.forward_graph.get(&id).map_or(&[], Vec::as_slice)
    }

    pub fn predecessors(&self, id: LayerId) -> &[LayerId] {
        self.backward_graph.get(&id).map_or(&[], Vec::as_slice)
    }

    // ========== 形状 ==========

    pub fn input_shapes(&self) -> Vec<Option<Shape>> {
        self.input_layers()
            .iter()
            .map(|layer| layer.input_shapes().first().cloned().flatten())
            .collect()
    }

    pub fn output_shapes(&self) -> Vec<Option<Shape>> {
        self.output_layers()
            .iter()
            .map(|layer| layer.output_shape().cloned())
            .collect()
    }

    pub fn input_shape(&self) -> Shapes {
        Shapes::from_vec(self.input_shapes())
    }

    pub fn output_shape(&self) -> Shapes {
        Shapes::from_vec(self.output_shapes())
    }

    /// 按拓扑序重新推断每个层的输入/输出形状，任一层不合法则整体失败
    pub(super) fn resolve_shapes(&mut self) -> Result<(), GraphError> {
        for &id in &self.order {
            let input_shapes = match self.backward_graph.get(&id) {
                Some(preds) if !preds.is_empty() => preds
                    .iter()
                    .map(|pred| self.layers.get(pred).and_then(|l| l.output_shape().cloned()))
                    .collect(),
                _ => vec![
                    self.layers
                        .get(&id)
                        .and_then(Layer::declared_input_shape),
                ],
            };
            if let Some(layer) = self.layers.get_mut(&id) {
                layer.resolve_shapes(input_shapes)?;
            }
        }
        Ok(())
    }

    // ========== 参数 ==========

    /// 按执行顺序列出所有(层, 参数)
    pub fn parameters(&self) -> impl Iterator<Item = (&Layer, &Parameter)> + '_ {
        self.layers()
            .flat_map(|layer| layer.parameters().into_iter().map(move |p| (layer, p)))
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters().map(|(_, p)| p).find(|p| p.name() == name)
    }

    pub(crate) fn parameter_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.layers
            .values_mut()
            .flat_map(Layer::parameters_mut)
            .find(|p| p.name() == name)
    }

    /// 参数元素总数
    pub fn parameter_count(&self) -> usize {
        self.layers().map(Layer::parameter_count).sum()
    }

    // ========== 初始化 ==========

    /// 以系统熵为种子初始化所有层
    pub fn initialize(&mut self) -> Result<(), GraphError> {
        self.initialize_with_rng(&mut StdRng::from_entropy())
    }

    /// 以固定种子初始化，结果可复现
    pub fn initialize_with_seed(&mut self, seed: u64) -> Result<(), GraphError> {
        self.initialize_with_rng(&mut StdRng::seed_from_u64(seed))
    }

    /// 按拓扑序对每个层调用一次初始化；已初始化的层保持不变。
    /// 任一层失败时连接整体不变。
    fn initialize_with_rng(&mut self, rng: &mut StdRng) -> Result<(), GraphError> {
        for layer in self.layers() {
            layer.check_initializable()?;
        }
        let mut layers = self.layers.clone();
        for id in &self.order {
            if let Some(layer) = layers.get_mut(id) {
                layer.initialize(rng)?;
            }
        }
        self.layers = layers;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.layers().all(Layer::is_initialized)
    }
}

impl<'a> IntoIterator for &'a Connection {
    type Item = &'a Layer;
    type IntoIter = Box<dyn Iterator<Item = &'a Layer> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.layers())
    }
}

/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 连接的组合（join）：顺序连接、并行分支、多对多合并
 *
 * 把左侧A（k个出口）接到右侧B（m个入口）上时，依次尝试：
 * 1. k == 1：扇出，A的唯一出口接到B的每个入口；
 * 2. B的入口全是合并层：完全交叉，A的每个出口按顺序接到B的每个入口；
 * 3. k == m：按位置一一配对；
 * 4. 否则报`ShapeMismatch`，错误消息中给出k和m。
 * 每次组合后都按拓扑序重新推断形状，不合法的形状会让这次组合立即失败。
 */

use std::collections::HashSet;

use super::{Connection, GraphError};
use crate::nn::layer::{Arity, Identity, Layer, LayerId, TraitLayer};

/// `join`的组成单元
#[derive(Debug, Clone)]
pub enum Item {
    Layer(Layer),
    Connection(Connection),
    /// 并行分支，每个分支本身是一串顺序连接的单元；空分支等价于`Identity`
    Parallel(Vec<Vec<Item>>),
}

impl From<Layer> for Item {
    fn from(layer: Layer) -> Self {
        Self::Layer(layer)
    }
}

impl From<Connection> for Item {
    fn from(connection: Connection) -> Self {
        Self::Connection(connection)
    }
}

impl From<Vec<Vec<Item>>> for Item {
    fn from(branches: Vec<Vec<Item>>) -> Self {
        Self::Parallel(branches)
    }
}

impl Item {
    fn into_connection(self) -> Result<Connection, GraphError> {
        match self {
            Self::Layer(layer) => Ok(Connection::from(layer)),
            Self::Connection(connection) => Ok(connection),
            Self::Parallel(branches) => parallel(
                branches
                    .into_iter()
                    .map(|branch| {
                        if branch.is_empty() {
                            Ok(Connection::from(Layer::new(Identity::new())))
                        } else {
                            join(branch)
                        }
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        }
    }
}

/// 依次顺序连接所有单元
pub fn join(items: Vec<Item>) -> Result<Connection, GraphError> {
    let mut items = items.into_iter();
    let first = items
        .next()
        .ok_or_else(|| GraphError::InvalidOperation("join至少需要一个单元".to_string()))?
        .into_connection()?;
    items.try_fold(first, |left, item| sequential(left, item.into_connection()?))
}

/// 把`right`接在`left`之后
pub fn sequential(
    left: impl Into<Connection>,
    right: impl Into<Connection>,
) -> Result<Connection, GraphError> {
    let (left, right) = (left.into(), right.into());
    let edges = plan_edges(&left, &right)?;
    let mut merged = merge(left, right)?;
    for (from, to) in edges {
        if let Some(successors) = merged.forward_graph.get_mut(&from) {
            successors.push(to);
        }
        if let Some(predecessors) = merged.backward_graph.get_mut(&to) {
            predecessors.push(from);
        }
    }
    // 入口/出口只看有无前驱/后继
    merged.input_layers.retain(|id| {
        merged
            .backward_graph
            .get(id)
            .is_none_or(|predecessors| predecessors.is_empty())
    });
    merged.output_layers.retain(|id| {
        merged
            .forward_graph
            .get(id)
            .is_none_or(|successors| successors.is_empty())
    });
    merged.resolve_shapes()?;
    Ok(merged)
}

/// 并行组合若干彼此独立的分支：入口/出口依分支顺序排列
pub fn parallel(branches: Vec<Connection>) -> Result<Connection, GraphError> {
    let mut branches = branches.into_iter();
    let first = branches
        .next()
        .ok_or_else(|| GraphError::InvalidOperation("parallel至少需要一个分支".to_string()))?;
    branches.try_fold(first, merge)
}

/// 按组合规则给出要新增的边(A的出口, B的入口)
fn plan_edges(left: &Connection, right: &Connection) -> Result<Vec<(LayerId, LayerId)>, GraphError> {
    let outputs = &left.output_layers;
    let inputs = &right.input_layers;
    let is_merge = |id: &LayerId| {
        right
            .layers
            .get(id)
            .is_some_and(|layer| layer.kind().arity() == Arity::Many)
    };

    let edges = if outputs.len() == 1 {
        inputs.iter().map(|&to| (outputs[0], to)).collect()
    } else if inputs.iter().all(is_merge) {
        inputs
            .iter()
            .flat_map(|&to| outputs.iter().map(move |&from| (from, to)))
            .collect()
    } else if outputs.len() == inputs.len() {
        outputs.iter().copied().zip(inputs.iter().copied()).collect()
    } else {
        return Err(GraphError::arity_mismatch(outputs.len(), inputs.len()));
    };
    Ok(edges)
}

/// 把两个连接的层与邻接表并在一起（尚未连边），层名不得重复
fn merge(mut left: Connection, right: Connection) -> Result<Connection, GraphError> {
    let names = left.layers().map(Layer::name).collect::<HashSet<_>>();
    if let Some(duplicate) = right.layers().find(|layer| names.contains(layer.name())) {
        return Err(GraphError::DuplicateName(format!(
            "层`{}`在连接中出现了不止一次",
            duplicate.name()
        )));
    }
    left.layers.extend(right.layers);
    left.forward_graph.extend(right.forward_graph);
    left.backward_graph.extend(right.backward_graph);
    left.input_layers.extend(right.input_layers);
    left.output_layers.extend(right.output_layers);
    left.order.extend(right.order);
    Ok(left)
}

/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 优化器的辅助状态表（动量、速度、上一步的梯度/增量等）
 *
 * 以“参数名 → 槽位名 → 张量”组织，槽位首次被读取时视为与参数同形的全零张量，
 * 只在一次训练步的原子更新中被赋值。用`BTreeMap`保证序列化结果稳定。
 */

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::nn::GraphError;
use crate::tensor::Tensor;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizerState {
    slots: BTreeMap<String, BTreeMap<String, Tensor>>,
}

impl OptimizerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, parameter: &str, slot: &str) -> Option<&Tensor> {
        self.slots.get(parameter)?.get(slot)
    }

    /// 读取槽位；尚未分配时返回与`like`同形的全零张量（不分配）
    pub fn get_or_zeros<'a>(&'a self, parameter: &str, slot: &str, like: &Tensor) -> Cow<'a, Tensor> {
        self.get(parameter, slot)
            .map_or_else(|| Cow::Owned(Tensor::zeros_like(like)), Cow::Borrowed)
    }

    pub fn assign(&mut self, parameter: &str, slot: &str, value: Tensor) {
        self.slots
            .entry(parameter.to_string())
            .or_default()
            .insert(slot.to_string(), value);
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// 已分配的槽位（张量）总数
    pub fn len(&self) -> usize {
        self.slots.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 拥有辅助状态的参数名
    pub fn parameters(&self) -> impl Iterator<Item = &str> + '_ {
        self.slots.keys().map(String::as_str)
    }

    /// 用bincode保存到本地文件
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), GraphError> {
        let file = File::create(path.as_ref())
            .map_err(|e| GraphError::Serialization(format!("无法创建文件{:?}：{e}", path.as_ref())))?;
        bincode::serialize_into(BufWriter::new(file), self)
            .map_err(|e| GraphError::Serialization(e.to_string()))
    }

    /// 从`save`写出的文件恢复
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GraphError> {
        let file = File::open(path.as_ref())
            .map_err(|e| GraphError::Serialization(format!("无法打开文件{:?}：{e}", path.as_ref())))?;
        bincode::deserialize_from(BufReader::new(file))
            .map_err(|e| GraphError::Serialization(e.to_string()))
    }
}

/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : Connection 训练状态标记的作用域式切换
 *
 * `disable_training_state`返回一个守卫，守卫存活期间所有层的训练标记为false；
 * 守卫被drop时（正常结束、`?`提前返回或panic展开）逐层恢复进入前的值。
 */

use std::ops::{Deref, DerefMut};

use super::Connection;
use crate::nn::layer::LayerId;

pub struct TrainingStateGuard<'a> {
    connection: &'a mut Connection,
    saved: Vec<(LayerId, bool)>,
}

impl Connection {
    /// 所有层都处于训练状态时为true
    pub fn training_state(&self) -> bool {
        self.layers().all(|layer| layer.training_state())
    }

    pub fn set_training_state(&mut self, training: bool) {
        for layer in self.layers.values_mut() {
            layer.set_training_state(training);
        }
    }

    /// 关闭所有层的训练状态，直到返回的守卫被drop
    pub fn disable_training_state(&mut self) -> TrainingStateGuard<'_> {
        let saved = self
            .layers
            .iter()
            .map(|(&id, layer)| (id, layer.training_state()))
            .collect();
        self.set_training_state(false);
        TrainingStateGuard {
            connection: self,
            saved,
        }
    }

    /// 在关闭训练状态的上下文中执行`f`
    pub fn without_training<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        let mut guard = self.disable_training_state();
        f(&mut *guard)
    }
}

impl Deref for TrainingStateGuard<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.connection
    }
}

impl DerefMut for TrainingStateGuard<'_> {
    fn deref_mut(&mut self) -> &mut Connection {
        self.connection
    }
}

impl Drop for TrainingStateGuard<'_> {
    fn drop(&mut self) {
        for &(id, training) in &self.saved {
            if let Some(layer) = self.connection.layers.get_mut(&id) {
                layer.set_training_state(training);
            }
        }
    }
}

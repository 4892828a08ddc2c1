/*
 * @Author       : 老董
 * @Date         : 2026-10-16
 * @Description  : 层连接图、层、损失函数与优化器共用的错误类型
 *
 * 所有错误都是致命的：调用方同步得到Err，不做任何自动重试，
 * 也不会留下“做了一半”的状态（连接/更新要么整体成功，要么整体失败）。
 */

use thiserror::Error;

use crate::errors::TensorError;

#[derive(Error, Debug, PartialEq)]
pub enum GraphError {
    /// 连接/合并时元数（arity）或形状不兼容
    #[error("形状不匹配：{0}")]
    ShapeMismatch(String),
    /// `output`收到的输入张量个数与连接的输入元数不一致
    #[error("输入个数错误：连接需要{expected}个输入张量，实际收到{got}个")]
    InputCount { expected: usize, got: usize },
    /// 配置项超出取值范围
    #[error("配置错误：`{option}`={value}不合法，{reason}")]
    Configuration {
        option: &'static str,
        value: String,
        reason: String,
    },
    #[error("名称重复：{0}")]
    DuplicateName(String),
    /// 层尚未`initialize`就参与了计算
    #[error("{0}尚未初始化")]
    NotInitialized(String),
    /// 需要输入形状的操作遇到了未知形状
    #[error("{0}的输入形状未知，无法推断")]
    UnknownShape(String),
    #[error("非法操作：{0}")]
    InvalidOperation(String),
    #[error("(反)序列化失败：{0}")]
    Serialization(String),
    #[error(transparent)]
    Tensor(#[from] TensorError),
}

impl GraphError {
    /// 连接时元数不兼容，错误消息中同时给出两侧的元数
    pub(crate) fn arity_mismatch(left_outputs: usize, right_inputs: usize) -> Self {
        Self::ShapeMismatch(format!(
            "左侧连接有{left_outputs}个输出，右侧连接有{right_inputs}个输入，无法连接"
        ))
    }
}

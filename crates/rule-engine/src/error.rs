//! 规则引擎错误类型

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("无效的操作符: {0}")]
    UnknownOperator(String),

    #[error("操作数 '{operand}' 之后缺少比较操作符")]
    MissingComparison { operand: String },

    #[error("操作符 '{operator}' 缺少操作数")]
    MissingOperand { operator: String },

    #[error("意外的标记: {0}")]
    UnexpectedToken(String),

    #[error("空的括号分组")]
    EmptyGroup,

    #[error("规则名称不能为空")]
    EmptyName,

    #[error("规则未找到: {0}")]
    RuleNotFound(String),

    #[error("JSON 序列化错误: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RuleError>;

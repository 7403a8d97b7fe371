//! 规则操作符定义

use crate::error::RuleError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 表达式操作符
///
/// 比较操作符构成叶子表达式，逻辑操作符组合两个子表达式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    // 比较
    Equal,
    NotEqual,
    LowerThan,
    LowerThanEqual,
    GreaterThan,
    GreaterThanEqual,

    // 逻辑组合
    LogicalAnd,
    LogicalOr,
}

impl Operator {
    /// 源码中的符号形式（`equal` 统一输出为 `==`）
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::LowerThan => "<",
            Self::LowerThanEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanEqual => ">=",
            Self::LogicalAnd => "&&",
            Self::LogicalOr => "||",
        }
    }

    pub fn is_comparison(&self) -> bool {
        !self.is_logical()
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, Self::LogicalAnd | Self::LogicalOr)
    }
}

impl FromStr for Operator {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" | "==" => Ok(Self::Equal),
            "!=" => Ok(Self::NotEqual),
            "<" => Ok(Self::LowerThan),
            "<=" => Ok(Self::LowerThanEqual),
            ">" => Ok(Self::GreaterThan),
            ">=" => Ok(Self::GreaterThanEqual),
            "&&" => Ok(Self::LogicalAnd),
            "||" => Ok(Self::LogicalOr),
            other => Err(RuleError::UnknownOperator(other.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

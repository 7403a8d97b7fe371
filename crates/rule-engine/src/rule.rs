//! 规则
//!
//! 持有不可变的表达式树。空树表示“恒为真”的规则：没有规则就不过滤任何东西。

use crate::error::Result;
use crate::evaluator::ExpressionEvaluator;
use crate::models::{Node, RuleContext};
use crate::value::{ComparisonMode, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    ast: Option<Node>,
}

impl Rule {
    /// 恒为真的规则
    pub fn always_true() -> Self {
        Self { ast: None }
    }

    /// 使用预先构建的表达式树
    pub fn from_ast(ast: Option<Node>) -> Self {
        Self { ast }
    }

    /// 从 JSON 表达式树构建，`null` 表示恒为真
    pub fn from_ast_json(json: &str) -> Result<Self> {
        let ast: Option<Node> = serde_json::from_str(json)?;
        Ok(Self { ast })
    }

    pub fn ast(&self) -> Option<&Node> {
        self.ast.as_ref()
    }

    pub fn is_always_true(&self) -> bool {
        self.ast.is_none()
    }

    /// 使用宽松比较语义评估规则
    pub fn evaluate(&self, context: &RuleContext) -> Value {
        self.evaluate_with(context, ComparisonMode::Loose)
    }

    pub fn evaluate_with(&self, context: &RuleContext, mode: ComparisonMode) -> Value {
        match &self.ast {
            None => Value::Bool(true),
            Some(node) => ExpressionEvaluator::evaluate(node, context, mode),
        }
    }

    /// 规则引用的所有标识符（即评估时需要的上下文字段）
    pub fn required_fields(&self) -> BTreeSet<&str> {
        let mut names = Vec::new();
        if let Some(node) = &self.ast {
            node.collect_identifiers(&mut names);
        }
        names.into_iter().collect()
    }
}

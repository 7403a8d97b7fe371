//! 规则引擎领域模型

use crate::error::Result;
use crate::operators::Operator;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// 表达式树节点
///
/// 每个子节点由父节点独占；表达式节点总是同时持有左右两个子节点。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// 标识符，评估时从上下文中解析
    Identifier { value: String },
    /// 字面量，类型在解析时确定
    Raw { value: Value },
    /// 二元表达式
    Expression {
        operator: Operator,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    pub fn identifier(name: impl Into<String>) -> Self {
        Self::Identifier { value: name.into() }
    }

    pub fn raw(value: impl Into<Value>) -> Self {
        Self::Raw {
            value: value.into(),
        }
    }

    pub fn expression(operator: Operator, left: Node, right: Node) -> Self {
        Self::Expression {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// 按从左到右的顺序收集表达式中引用的标识符
    pub fn collect_identifiers<'a>(&'a self, names: &mut Vec<&'a str>) {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Self::Identifier { value } => names.push(value),
                Self::Raw { .. } => {}
                Self::Expression { left, right, .. } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
    }
}

/// 逐层拆下子表达式再释放，长链不会在析构时递归过深
impl Drop for Node {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        detach_subexpressions(self, &mut pending);

        while let Some(mut node) = pending.pop() {
            detach_subexpressions(&mut node, &mut pending);
        }
    }
}

fn detach_subexpressions(node: &mut Node, pending: &mut Vec<Node>) {
    if let Node::Expression { left, right, .. } = node {
        for child in [left, right] {
            if matches!(**child, Node::Expression { .. }) {
                pending.push(std::mem::replace(&mut **child, Node::raw(Value::Null)));
            }
        }
    }
}

/// 输出为可以重新解析的规则文本，子表达式一律加括号
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier { value } => write!(f, "{}", value),
            Self::Raw {
                value: Value::String(s),
            } => {
                if s.contains('\'') {
                    write!(f, "\"{}\"", s)
                } else {
                    write!(f, "'{}'", s)
                }
            }
            Self::Raw { value } => write!(f, "{}", value),
            Self::Expression {
                operator,
                left,
                right,
            } => {
                write_operand(f, left)?;
                write!(f, " {} ", operator)?;
                write_operand(f, right)
            }
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, node: &Node) -> fmt::Result {
    if matches!(node, Node::Expression { .. }) {
        write!(f, "({})", node)
    } else {
        write!(f, "{}", node)
    }
}

/// 评估上下文 - 标识符到原始值的映射
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleContext {
    values: HashMap<String, Value>,
}

impl RuleContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JSON 对象创建，值必须是原始类型
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// 链式添加字段
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// 获取字段值
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for RuleContext
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut context = Self::new();
        for (key, value) in iter {
            context.insert(key, value);
        }
        context
    }
}

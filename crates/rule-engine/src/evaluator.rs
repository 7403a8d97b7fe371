//! 表达式评估器
//!
//! 在上下文上遍历表达式树，得到一个原始值。逻辑操作不短路：
//! 左右两侧总是先全部评估，再组合结果。

use crate::models::{Node, RuleContext};
use crate::operators::Operator;
use crate::value::{ComparisonMode, Value};
use std::cmp::Ordering;

/// 表达式评估器
pub struct ExpressionEvaluator;

impl ExpressionEvaluator {
    /// 评估节点
    ///
    /// 标识符在上下文中不存在时，返回标识符自身的名称作为字符串值。
    /// 右侧链在循环中展开，递归深度只随左侧嵌套（即括号分组）增长。
    pub fn evaluate(node: &Node, context: &RuleContext, mode: ComparisonMode) -> Value {
        let mut pending = Vec::new();
        let mut current = node;

        let mut value = loop {
            match current {
                Node::Raw { value } => break value.clone(),
                Node::Identifier { value } => break Self::resolve(value, context),
                Node::Expression {
                    operator,
                    left,
                    right,
                } => {
                    pending.push((*operator, Self::evaluate(left, context, mode)));
                    current = right;
                }
            }
        };

        while let Some((operator, left)) = pending.pop() {
            value = Self::apply(operator, &left, &value, mode);
        }

        value
    }

    /// 解析标识符
    pub fn resolve(name: &str, context: &RuleContext) -> Value {
        context
            .get(name)
            .cloned()
            .unwrap_or_else(|| Value::String(name.to_string()))
    }

    /// 对两个已评估的值应用操作符，结果总是布尔值
    pub fn apply(operator: Operator, left: &Value, right: &Value, mode: ComparisonMode) -> Value {
        let result = match operator {
            Operator::Equal => mode.equals(left, right),
            Operator::NotEqual => !mode.equals(left, right),
            Operator::LowerThan => Self::ordered(mode.compare(left, right), |o| o.is_lt()),
            Operator::LowerThanEqual => Self::ordered(mode.compare(left, right), |o| o.is_le()),
            Operator::GreaterThan => Self::ordered(mode.compare(left, right), |o| o.is_gt()),
            Operator::GreaterThanEqual => Self::ordered(mode.compare(left, right), |o| o.is_ge()),
            Operator::LogicalAnd => left.is_truthy() && right.is_truthy(),
            Operator::LogicalOr => left.is_truthy() || right.is_truthy(),
        };

        Value::Bool(result)
    }

    /// 不可比较（NaN 或严格模式下类型不同）时所有排序比较均为 false
    fn ordered<F>(ordering: Option<Ordering>, check: F) -> bool
    where
        F: Fn(Ordering) -> bool,
    {
        ordering.is_some_and(check)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(node: &Node, context: &RuleContext) -> Value {
        ExpressionEvaluator::evaluate(node, context, ComparisonMode::Loose)
    }

    fn compare(op: Operator, left: impl Into<Value>, right: impl Into<Value>) -> Value {
        ExpressionEvaluator::apply(op, &left.into(), &right.into(), ComparisonMode::Loose)
    }

    #[test]
    fn test_raw_evaluates_to_itself() {
        let ctx = RuleContext::new();
        assert_eq!(eval(&Node::raw(42), &ctx), Value::Number(42.0));
        assert_eq!(eval(&Node::raw("x"), &ctx), Value::from("x"));
    }

    #[test]
    fn test_identifier_lookup() {
        let ctx = RuleContext::new().with("camera", "dslr");
        assert_eq!(eval(&Node::identifier("camera"), &ctx), Value::from("dslr"));
    }

    #[test]
    fn test_missing_identifier_falls_back_to_name() {
        let ctx = RuleContext::new();
        assert_eq!(
            eval(&Node::identifier("missingKey"), &ctx),
            Value::from("missingKey")
        );
    }

    #[test]
    fn test_equality_operators() {
        assert_eq!(compare(Operator::Equal, 1, 1), Value::Bool(true));
        assert_eq!(compare(Operator::Equal, 1, "1"), Value::Bool(true));
        assert_eq!(compare(Operator::NotEqual, "a", "b"), Value::Bool(true));
        assert_eq!(compare(Operator::NotEqual, true, 1), Value::Bool(false));
    }

    #[test]
    fn test_ordering_operators() {
        assert_eq!(compare(Operator::LowerThan, 1, 2), Value::Bool(true));
        assert_eq!(compare(Operator::LowerThanEqual, 2, 2), Value::Bool(true));
        assert_eq!(compare(Operator::GreaterThan, "10", 9), Value::Bool(true));
        assert_eq!(compare(Operator::GreaterThan, "10", "9"), Value::Bool(false));
        assert_eq!(compare(Operator::GreaterThanEqual, 1, 2), Value::Bool(false));
    }

    #[test]
    fn test_ordering_with_nan_is_false() {
        for op in [
            Operator::LowerThan,
            Operator::LowerThanEqual,
            Operator::GreaterThan,
            Operator::GreaterThanEqual,
        ] {
            assert_eq!(compare(op, "abc", 1), Value::Bool(false));
        }
    }

    #[test]
    fn test_logical_operators_use_truthiness() {
        assert_eq!(compare(Operator::LogicalAnd, "x", 1), Value::Bool(true));
        assert_eq!(compare(Operator::LogicalAnd, "x", 0), Value::Bool(false));
        assert_eq!(compare(Operator::LogicalOr, "", 0), Value::Bool(false));
        assert_eq!(compare(Operator::LogicalOr, "", "y"), Value::Bool(true));
    }

    #[test]
    fn test_strict_mode() {
        let strict = |op, l: Value, r: Value| {
            ExpressionEvaluator::apply(op, &l, &r, ComparisonMode::Strict)
        };

        assert_eq!(
            strict(Operator::Equal, Value::Number(1.0), Value::from("1")),
            Value::Bool(false)
        );
        assert_eq!(
            strict(Operator::NotEqual, Value::Number(1.0), Value::from("1")),
            Value::Bool(true)
        );
        assert_eq!(
            strict(Operator::GreaterThan, Value::from("10"), Value::Number(9.0)),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_nested_expression() {
        // (mode == 'print') && (copies > 0)
        let node = Node::expression(
            Operator::LogicalAnd,
            Node::expression(Operator::Equal, Node::identifier("mode"), Node::raw("print")),
            Node::expression(Operator::GreaterThan, Node::identifier("copies"), Node::raw(0)),
        );

        let ctx = RuleContext::new().with("mode", "print").with("copies", 2);
        assert_eq!(eval(&node, &ctx), Value::Bool(true));

        let ctx = RuleContext::new().with("mode", "print").with("copies", 0);
        assert_eq!(eval(&node, &ctx), Value::Bool(false));
    }

    /// 构建 `f0 = 0 op (f1 = 1 op (...))` 的右倾链
    fn chain(op: Operator, size: usize) -> Node {
        let mut node = Node::expression(
            Operator::Equal,
            Node::identifier(format!("f{}", size - 1)),
            Node::raw((size - 1) as f64),
        );
        for i in (0..size - 1).rev() {
            let comparison = Node::expression(
                Operator::Equal,
                Node::identifier(format!("f{}", i)),
                Node::raw(i as f64),
            );
            node = Node::expression(op, comparison, node);
        }
        node
    }

    #[test]
    fn test_long_right_chain() {
        let size = 10_000;
        let node = chain(Operator::LogicalAnd, size);

        let ctx: RuleContext = (0..size)
            .map(|i| (format!("f{}", i), Value::Number(i as f64)))
            .collect();
        assert_eq!(eval(&node, &ctx), Value::Bool(true));

        let ctx = ctx.with("f9999", 0);
        assert_eq!(eval(&node, &ctx), Value::Bool(false));

        let node = chain(Operator::LogicalOr, size);
        let ctx = RuleContext::new().with("f9999", 9999);
        assert_eq!(eval(&node, &ctx), Value::Bool(true));
    }
}

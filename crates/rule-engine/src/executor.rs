//! 规则执行器
//!
//! 评估编译后的规则，返回结果值和可选的评估追踪信息。
//! 逻辑组合不短路，追踪中会出现所有子表达式。

use crate::compiler::CompiledRule;
use crate::evaluator::ExpressionEvaluator;
use crate::models::{Node, RuleContext};
use crate::value::{ComparisonMode, Value};
use photobooth_shared::observability::metrics;
use serde::Serialize;
use std::time::Instant;

/// 评估结果
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResult {
    pub rule_name: String,
    /// 评估得到的原始值
    pub value: Value,
    /// 结果的真值
    pub matched: bool,
    pub evaluation_trace: Vec<String>,
    pub evaluation_time_us: u64,
}

impl EvaluationResult {
    pub fn new(rule_name: String) -> Self {
        Self {
            rule_name,
            value: Value::Bool(true),
            matched: true,
            evaluation_trace: Vec::new(),
            evaluation_time_us: 0,
        }
    }
}

/// 规则执行器
#[derive(Debug, Clone)]
pub struct RuleExecutor {
    /// 是否记录详细评估追踪
    trace_enabled: bool,
    comparison: ComparisonMode,
}

impl RuleExecutor {
    pub fn new() -> Self {
        Self {
            trace_enabled: false,
            comparison: ComparisonMode::Loose,
        }
    }

    /// 启用评估追踪
    pub fn with_trace(mut self) -> Self {
        self.trace_enabled = true;
        self
    }

    /// 设置比较语义
    pub fn with_comparison(mut self, comparison: ComparisonMode) -> Self {
        self.comparison = comparison;
        self
    }

    /// 执行规则评估
    pub fn execute(&self, rule: &CompiledRule, context: &RuleContext) -> EvaluationResult {
        let start = Instant::now();

        let mut result = EvaluationResult::new(rule.name().to_string());

        match rule.rule().ast() {
            Some(node) if self.trace_enabled => {
                result.value = self.evaluate_node(node, context, &mut result, "root");
            }
            Some(_) => {
                result.value = rule.rule().evaluate_with(context, self.comparison);
            }
            None => {
                if self.trace_enabled {
                    result
                        .evaluation_trace
                        .push("root: 空规则，恒为真".to_string());
                }
                result.value = Value::Bool(true);
            }
        }

        let elapsed = start.elapsed();
        result.matched = result.value.is_truthy();
        result.evaluation_time_us = elapsed.as_micros() as u64;

        metrics::record_rule_evaluation(rule.name(), result.matched, elapsed.as_secs_f64());

        result
    }

    /// 递归评估节点并记录追踪，递归深度等于树的深度
    fn evaluate_node(
        &self,
        node: &Node,
        context: &RuleContext,
        result: &mut EvaluationResult,
        path: &str,
    ) -> Value {
        match node {
            Node::Raw { value } => value.clone(),
            Node::Identifier { value: name } => {
                let value = ExpressionEvaluator::resolve(name, context);
                if self.trace_enabled && context.get(name).is_none() {
                    result
                        .evaluation_trace
                        .push(format!("{}: 字段 {} 不存在，使用名称本身", path, name));
                }
                value
            }
            Node::Expression {
                operator,
                left,
                right,
            } => {
                let left_path = format!("{}.left", path);
                let right_path = format!("{}.right", path);
                let left = self.evaluate_node(left, context, result, &left_path);
                let right = self.evaluate_node(right, context, result, &right_path);

                let value = ExpressionEvaluator::apply(*operator, &left, &right, self.comparison);

                if self.trace_enabled {
                    result.evaluation_trace.push(format!(
                        "{}: {} {} {} => {}",
                        path,
                        describe(&left),
                        operator,
                        describe(&right),
                        if value.is_truthy() { "MATCHED" } else { "NOT_MATCHED" }
                    ));
                }

                value
            }
        }
    }
}

impl Default for RuleExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// 字符串加引号，便于在追踪中区分类型
fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{:?}", s),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::RuleCompiler;

    fn compile_rule(source: &str) -> CompiledRule {
        let mut compiler = RuleCompiler::new();
        compiler.compile("test", source).unwrap()
    }

    fn create_test_context() -> RuleContext {
        RuleContext::new()
            .with("mode", "print")
            .with("copies", 2)
            .with("camera", "dslr")
            .with("countdown", "5")
    }

    #[test]
    fn test_simple_match() {
        let rule = compile_rule("mode = 'print'");
        let result = RuleExecutor::new().execute(&rule, &create_test_context());

        assert!(result.matched);
        assert_eq!(result.value, Value::Bool(true));
        assert_eq!(result.rule_name, "test");
        assert!(result.evaluation_trace.is_empty());
    }

    #[test]
    fn test_simple_not_match() {
        let rule = compile_rule("mode = 'video'");
        let result = RuleExecutor::new().execute(&rule, &create_test_context());

        assert!(!result.matched);
    }

    #[test]
    fn test_trace_covers_both_sides_without_short_circuit() {
        let rule = compile_rule("mode = 'video' && copies > 1");
        let result = RuleExecutor::new()
            .with_trace()
            .execute(&rule, &create_test_context());

        assert!(!result.matched);
        assert_eq!(result.evaluation_trace.len(), 3);
        assert!(result.evaluation_trace[0].starts_with("root.left:"));
        assert!(result.evaluation_trace[0].ends_with("NOT_MATCHED"));
        assert!(result.evaluation_trace[1].starts_with("root.right:"));
        assert!(result.evaluation_trace[1].ends_with("=> MATCHED"));
        assert!(result.evaluation_trace[2].starts_with("root:"));
    }

    #[test]
    fn test_trace_reports_missing_fields() {
        let rule = compile_rule("flash = 'on'");
        let result = RuleExecutor::new()
            .with_trace()
            .execute(&rule, &RuleContext::new());

        assert!(!result.matched);
        assert!(result.evaluation_trace.iter().any(|t| t.contains("flash")));
    }

    #[test]
    fn test_comparison_mode() {
        let rule = compile_rule("countdown = 5");
        let context = create_test_context();

        assert!(RuleExecutor::new().execute(&rule, &context).matched);
        assert!(
            !RuleExecutor::new()
                .with_comparison(ComparisonMode::Strict)
                .execute(&rule, &context)
                .matched
        );
    }

    #[test]
    fn test_always_true_rule() {
        let rule = compile_rule("   ");
        let result = RuleExecutor::new().with_trace().execute(&rule, &RuleContext::new());

        assert!(result.matched);
        assert_eq!(result.evaluation_trace.len(), 1);
    }

    #[test]
    fn test_long_chain_without_trace() {
        let source = (0..5_000)
            .map(|i| format!("f{} >= 0", i))
            .collect::<Vec<_>>()
            .join(" && ");
        let rule = compile_rule(&source);

        let result = RuleExecutor::new().execute(&rule, &RuleContext::new().with("f0", 1));

        // 其余字段回退为名称字符串，转为数值是 NaN，比较为 false
        assert!(!result.matched);
        assert!(result.evaluation_trace.is_empty());
    }
}

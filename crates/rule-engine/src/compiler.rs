//! 规则编译器
//!
//! 将规则文本经过词法、语法分析编译为表达式树。
//! [`parse_rule`] 是宽松入口：任何解析错误都会被记录并降级为恒为真的规则；
//! [`RuleCompiler`] 是严格入口，向调用方返回错误，供规则存储使用。

use crate::error::{Result, RuleError};
use crate::lexer::tokenize;
use crate::models::{Node, RuleContext};
use crate::parser::Parser;
use crate::rule::Rule;
use crate::value::Value;
use chrono::{DateTime, Utc};
use photobooth_shared::observability::metrics;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// 将规则文本解析为表达式树，空白输入返回 `None`
pub fn parse_ast(source: &str) -> Result<Option<Node>> {
    let tokens = tokenize(source)?;
    Parser::parse(&tokens)
}

/// 解析规则
///
/// 不会失败：无效的规则文本等同于“没有规则”，得到恒为真的规则。
pub fn parse_rule(source: &str) -> Rule {
    match parse_ast(source) {
        Ok(ast) => {
            debug!(rule = %source, always_true = ast.is_none(), "规则解析完成");
            Rule::from_ast(ast)
        }
        Err(e) => {
            warn!(rule = %source, error = %e, "规则解析失败，按恒为真处理");
            metrics::record_rule_parse_failure();
            Rule::always_true()
        }
    }
}

/// 编译后的规则
#[derive(Debug, Clone)]
pub struct CompiledRule {
    /// 规则名称
    pub name: String,
    /// 规则原文
    pub source: String,
    pub rule: Rule,
    /// 规则中使用的所有上下文字段
    pub required_fields: BTreeSet<String>,
    /// 编译版本号（用于缓存失效）
    pub compile_version: u64,
    pub compiled_at: DateTime<Utc>,
}

impl CompiledRule {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn evaluate(&self, context: &RuleContext) -> Value {
        self.rule.evaluate(context)
    }
}

/// 规则编译器
pub struct RuleCompiler {
    compile_version: u64,
}

impl RuleCompiler {
    pub fn new() -> Self {
        Self { compile_version: 0 }
    }

    /// 编译规则，解析错误直接返回
    pub fn compile(
        &mut self,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<CompiledRule> {
        let name = name.into();
        let source = source.into();

        if name.trim().is_empty() {
            return Err(RuleError::EmptyName);
        }

        let rule = Rule::from_ast(parse_ast(&source)?);
        let required_fields = rule
            .required_fields()
            .into_iter()
            .map(str::to_string)
            .collect();

        self.compile_version += 1;

        Ok(CompiledRule {
            name,
            source,
            rule,
            required_fields,
            compile_version: self.compile_version,
            compiled_at: Utc::now(),
        })
    }
}

impl Default for RuleCompiler {
    fn default() -> Self {
        Self::new()
    }
}

//! 照相亭规则引擎
//!
//! 解析并评估用于功能开关、相机/流程分支的规则表达式，支持：
//! - 比较操作符 `= == != < <= > >=` 与逻辑组合 `&& ||`
//! - 括号分组，无优先级表
//! - 标识符在评估时从上下文解析
//! - 命名规则的编译和缓存
//!
//! ```
//! use rule_engine::{parse_rule, RuleContext, Value};
//!
//! let rule = parse_rule("(mode = 'print' && copies > 0) || admin = true");
//! let context = RuleContext::new().with("mode", "print").with("copies", 2);
//! assert_eq!(rule.evaluate(&context), Value::Bool(true));
//! ```

pub mod compiler;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod lexer;
pub mod models;
pub mod operand;
pub mod operators;
pub mod parser;
pub mod rule;
pub mod store;
pub mod value;

pub use compiler::{parse_ast, parse_rule, CompiledRule, RuleCompiler};
pub use error::{Result, RuleError};
pub use evaluator::ExpressionEvaluator;
pub use executor::{EvaluationResult, RuleExecutor};
pub use lexer::{tokenize, Token};
pub use models::{Node, RuleContext};
pub use operand::classify_operand;
pub use operators::Operator;
pub use parser::Parser;
pub use rule::Rule;
pub use store::{RuleStore, RuleStoreStats};
pub use value::{ComparisonMode, Value};

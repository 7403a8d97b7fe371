//! 操作数分类
//!
//! 判断单个标记是字面量还是标识符。带引号的内容永远是字符串，
//! 不再做类型推断：`"42"` 是字符串，`42` 是数值。

use crate::models::Node;
use crate::value::Value;
use regex::Regex;
use std::sync::LazyLock;

/// JSON 数值语法
static JSON_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?$")
        .expect("number pattern is valid")
});

/// 将标记文本分类为字面量节点或标识符节点
pub fn classify_operand(token: &str) -> Node {
    if let Some(content) = strip_quotes(token) {
        return Node::raw(content);
    }

    if let Some(value) = parse_literal(token) {
        return Node::Raw { value };
    }

    Node::identifier(token)
}

fn strip_quotes(token: &str) -> Option<&str> {
    ['"', '\''].into_iter().find_map(|quote| {
        token
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
    })
}

/// 按 JSON 字面量语法解析数值、布尔值和 null
///
/// 超出 f64 范围的数值按正负无穷处理。
fn parse_literal(token: &str) -> Option<Value> {
    match serde_json::from_str::<serde_json::Value>(token) {
        Ok(serde_json::Value::Null) => Some(Value::Null),
        Ok(serde_json::Value::Bool(b)) => Some(Value::Bool(b)),
        Ok(serde_json::Value::Number(n)) => n.as_f64().map(Value::Number),
        Ok(_) => None,
        Err(_) if JSON_NUMBER.is_match(token) => token.parse().ok().map(Value::Number),
        Err(_) => None,
    }
}

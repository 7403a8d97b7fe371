//! 规则值模型
//!
//! 规则中的字面量和上下文中的字段值都是原始类型：null、布尔、数值、字符串。
//! 默认比较语义为宽松比较（与 JavaScript 的 `==` / `<` 一致），
//! 需要严格类型比较时使用 [`ComparisonMode::Strict`]。

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// 原始值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl Value {
    /// 获取值的类型名称
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
        }
    }

    /// 真值判断：`false`、`0`、`NaN`、空字符串和 `null` 为假
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
        }
    }

    /// 转换为数值，无法解析的字符串得到 NaN
    pub fn to_number(&self) -> f64 {
        match self {
            Self::Null => 0.0,
            Self::Bool(true) => 1.0,
            Self::Bool(false) => 0.0,
            Self::Number(n) => *n,
            Self::String(s) => parse_numeric_string(s),
        }
    }

    /// 宽松相等
    ///
    /// 布尔值先转为数值；数值与字符串比较时字符串转为数值；
    /// `null` 只与 `null` 相等；NaN 与任何值都不相等。
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Null, _) | (_, Self::Null) => false,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Bool(_), _) => Self::Number(self.to_number()).loose_eq(other),
            (_, Self::Bool(_)) => self.loose_eq(&Self::Number(other.to_number())),
            (Self::Number(a), Self::String(_)) => *a == other.to_number(),
            (Self::String(_), Self::Number(b)) => self.to_number() == *b,
        }
    }

    /// 严格相等：类型不同即不相等
    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            _ => false,
        }
    }

    /// 宽松排序
    ///
    /// 两个字符串按 UTF-16 码元逐个比较，其余情况双方转为数值比较。
    /// 任一侧为 NaN 时返回 `None`，此时所有排序比较结果均为 false。
    pub fn loose_cmp(&self, other: &Value) -> Option<Ordering> {
        if let (Self::String(a), Self::String(b)) = (self, other) {
            return Some(a.encode_utf16().cmp(b.encode_utf16()));
        }
        self.to_number().partial_cmp(&other.to_number())
    }

    /// 严格排序：仅数值与数值、字符串与字符串之间可比较
    pub fn strict_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.partial_cmp(b),
            (Self::String(a), Self::String(b)) => Some(a.encode_utf16().cmp(b.encode_utf16())),
            _ => None,
        }
    }
}

/// 字符串转数值
///
/// 去除首尾空白后：空串为 0；支持 `Infinity`、`0x`/`0o`/`0b` 前缀和十进制/科学计数法；
/// 其他内容为 NaN。
fn parse_numeric_string(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    let radix = match trimmed.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&trimmed[2..], radix)
            .map(|n| n as f64)
            .unwrap_or(f64::NAN);
    }

    // f64::from_str 还接受 "inf"、"nan" 等写法，这里先限定字符集
    let decimal_only = trimmed
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !decimal_only {
        return f64::NAN;
    }

    trimmed.parse().unwrap_or(f64::NAN)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) if n.is_nan() => write!(f, "NaN"),
            Self::Number(n) if n.is_infinite() => {
                write!(f, "{}", if *n > 0.0 { "Infinity" } else { "-Infinity" })
            }
            // -0 输出为 0
            Self::Number(n) if *n == 0.0 => write!(f, "0"),
            Self::Number(n) => write!(f, "{}", n),
            Self::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

/// 比较语义
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMode {
    /// 宽松比较（默认）
    #[default]
    Loose,
    /// 严格类型比较
    Strict,
}

impl ComparisonMode {
    pub fn equals(&self, left: &Value, right: &Value) -> bool {
        match self {
            Self::Loose => left.loose_eq(right),
            Self::Strict => left.strict_eq(right),
        }
    }

    pub fn compare(&self, left: &Value, right: &Value) -> Option<Ordering> {
        match self {
            Self::Loose => left.loose_cmp(right),
            Self::Strict => left.strict_cmp(right),
        }
    }
}

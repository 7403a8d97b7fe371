//! 规则词法分析
//!
//! 将规则文本切分为有序的标记序列。空白和无法识别的字符作为分隔符丢弃，
//! 括号是否配对由解析器负责。

use crate::error::Result;
use crate::operators::Operator;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// 双字符操作符必须排在单字符操作符之前
static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[A-Za-z0-9_]+|"[^"]*"|'[^']*'|==|!=|<=|>=|&&|\|\||[=<>()]"#)
        .expect("token pattern is valid")
});

/// 词法标记
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// 单词：标识符、数字或 true/false/null
    Word(String),
    /// 带引号的字符串，保留引号
    Quoted(String),
    Operator(Operator),
    LParen,
    RParen,
}

impl Token {
    /// 作为比较操作数时的原始文本
    pub fn as_operand(&self) -> Option<&str> {
        match self {
            Self::Word(text) | Self::Quoted(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word(text) | Self::Quoted(text) => write!(f, "{}", text),
            Self::Operator(op) => write!(f, "{}", op),
            Self::LParen => write!(f, "("),
            Self::RParen => write!(f, ")"),
        }
    }
}

/// 切分规则文本
///
/// 空字符串或纯空白输入返回空序列。
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    TOKEN_PATTERN
        .find_iter(source)
        .map(|m| classify_token(m.as_str()))
        .collect()
}

fn classify_token(text: &str) -> Result<Token> {
    match text {
        "(" => Ok(Token::LParen),
        ")" => Ok(Token::RParen),
        _ if text.starts_with('"') || text.starts_with('\'') => {
            Ok(Token::Quoted(text.to_string()))
        }
        _ if text
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_') =>
        {
            Ok(Token::Word(text.to_string()))
        }
        _ => Ok(Token::Operator(text.parse()?)),
    }
}

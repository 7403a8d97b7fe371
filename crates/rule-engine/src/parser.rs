//! 规则语法分析
//!
//! 递归下降解析标记序列，构建二元表达式树。没有优先级表，
//! 分组完全由括号决定；同一层的逻辑组合向右结合：
//! `a = 1 && b = 2 || c = 3` 解析为 `a = 1 && (b = 2 || c = 3)`。
//! 单个比较外加括号不改变结合方式。
//!
//! 同一层的链在循环中收集，只有 `(` 才会递归，递归深度只随括号嵌套增长。
//!
//! 括号的宽松处理：
//! - 未闭合的 `(` 在输入结束处隐式闭合；
//! - 没有匹配 `(` 的 `)` 结束解析，之后的标记全部被忽略。

use crate::error::{Result, RuleError};
use crate::lexer::Token;
use crate::models::Node;
use crate::operand::classify_operand;
use crate::operators::Operator;

/// 语法分析器
///
/// 以游标顺序消费标记；括号分组在独立的子切片上解析。
pub struct Parser<'a> {
    tokens: &'a [Token],
    position: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// 解析完整的标记序列，空序列返回 `None`
    pub fn parse(tokens: &[Token]) -> Result<Option<Node>> {
        Parser::new(tokens).parse_expression()
    }

    fn next_token(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.position)?;
        self.position += 1;
        Some(token)
    }

    /// 解析一层的 `项 (逻辑操作符 项)*`
    fn parse_expression(&mut self) -> Result<Option<Node>> {
        let mut chain = Chain::default();

        while let Some(token) = self.next_token() {
            match token {
                Token::RParen => break,
                Token::Operator(op) if op.is_logical() => chain.combine(*op)?,
                Token::Operator(op) => return Err(RuleError::UnexpectedToken(op.to_string())),
                Token::LParen => {
                    let group = self.parse_group()?;
                    chain.push(group)?;
                }
                Token::Word(_) | Token::Quoted(_) => {
                    let comparison = self.parse_comparison(token)?;
                    chain.push(comparison)?;
                }
            }
        }

        chain.finish()
    }

    /// 解析括号分组，游标位于 `(` 之后
    fn parse_group(&mut self) -> Result<Node> {
        let start = self.position;
        // 找不到匹配的 `)` 时分组延伸到输入末尾
        let end = self.matching_paren(start).unwrap_or(self.tokens.len());

        let group = Parser::new(&self.tokens[start..end]).parse_expression()?;
        self.position = (end + 1).min(self.tokens.len());

        group.ok_or(RuleError::EmptyGroup)
    }

    fn matching_paren(&self, start: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (offset, token) in self.tokens[start..].iter().enumerate() {
            match token {
                Token::LParen => depth += 1,
                Token::RParen if depth == 0 => return Some(start + offset),
                Token::RParen => depth -= 1,
                _ => {}
            }
        }
        None
    }

    /// 解析 `操作数 比较符 操作数`，第一个操作数已被消费
    fn parse_comparison(&mut self, operand: &Token) -> Result<Node> {
        let left = operand.to_string();

        let operator = match self.next_token() {
            Some(Token::Operator(op)) if op.is_comparison() => *op,
            Some(other) => return Err(RuleError::UnknownOperator(other.to_string())),
            None => return Err(RuleError::MissingComparison { operand: left }),
        };

        let right = self
            .next_token()
            .and_then(Token::as_operand)
            .ok_or_else(|| RuleError::MissingOperand {
                operator: operator.to_string(),
            })?;

        Ok(Node::expression(
            operator,
            classify_operand(&left),
            classify_operand(right),
        ))
    }
}

/// 同一层的项和逻辑操作符，交替出现
#[derive(Default)]
struct Chain {
    terms: Vec<Node>,
    operators: Vec<Operator>,
}

impl Chain {
    /// 项只能出现在链首或逻辑操作符之后
    fn push(&mut self, node: Node) -> Result<()> {
        if self.terms.len() > self.operators.len() {
            return Err(RuleError::UnexpectedToken(node.to_string()));
        }
        self.terms.push(node);
        Ok(())
    }

    /// 逻辑操作符必须跟在项之后
    fn combine(&mut self, operator: Operator) -> Result<()> {
        if self.terms.len() == self.operators.len() {
            return Err(RuleError::MissingOperand {
                operator: operator.to_string(),
            });
        }
        self.operators.push(operator);
        Ok(())
    }

    /// 从右向左折叠：`t0 op0 (t1 op1 (... tn))`
    fn finish(mut self) -> Result<Option<Node>> {
        if let Some(&operator) = self.operators.last() {
            if self.terms.len() == self.operators.len() {
                return Err(RuleError::MissingOperand {
                    operator: operator.to_string(),
                });
            }
        }

        let Some(mut node) = self.terms.pop() else {
            return Ok(None);
        };
        while let (Some(left), Some(operator)) = (self.terms.pop(), self.operators.pop()) {
            node = Node::expression(operator, left, node);
        }

        Ok(Some(node))
    }
}

use crate::Tokenizer;
use crate::tokenizer::{Associativity, Token, TokenSubType, TokenType, TokenizerError};

use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{self, Display};

/// Parse failure with the byte offset it was detected at, when known.
#[derive(Debug, Clone, PartialEq)]
pub struct ParserError {
    pub message: String,
    pub position: Option<usize>,
}

impl Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(at) => write!(f, "ParserError: {} (at byte {at})", self.message),
            None => write!(f, "ParserError: {}", self.message),
        }
    }
}

impl Error for ParserError {}

impl From<TokenizerError> for ParserError {
    fn from(err: TokenizerError) -> Self {
        Self {
            message: err.message,
            position: Some(err.pos),
        }
    }
}

/// Expression tree node kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum ASTNodeType {
    Number(f64),
    /// A bare name: a formula variable, the row index `i` or a constant.
    Variable(String),
    UnaryOp {
        op: String,
        expr: Box<ASTNode>,
    },
    BinaryOp {
        op: String,
        left: Box<ASTNode>,
        right: Box<ASTNode>,
    },
    Function {
        name: String,
        args: Vec<ASTNode>,
    },
}

impl Display for ASTNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ASTNodeType::Number(value) => write!(f, "Number({value})"),
            ASTNodeType::Variable(name) => write!(f, "Variable({name})"),
            ASTNodeType::UnaryOp { op, expr } => write!(f, "UnaryOp({op}, {expr})"),
            ASTNodeType::BinaryOp { op, left, right } => {
                write!(f, "BinaryOp({op}, {left}, {right})")
            }
            ASTNodeType::Function { name, args } => {
                write!(f, "Function({name}")?;
                for arg in args {
                    write!(f, ", {arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A node plus the token it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct ASTNode {
    pub node_type: ASTNodeType,
    pub source_token: Option<Token>,
}

impl ASTNode {
    pub fn new(node_type: ASTNodeType, source_token: Option<Token>) -> Self {
        ASTNode {
            node_type,
            source_token,
        }
    }

    /// Every bare name referenced by the expression, sorted.
    pub fn variables(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match &self.node_type {
            ASTNodeType::Number(_) => {}
            ASTNodeType::Variable(name) => {
                out.insert(name.as_str());
            }
            ASTNodeType::UnaryOp { expr, .. } => expr.collect_variables(out),
            ASTNodeType::BinaryOp { left, right, .. } => {
                left.collect_variables(out);
                right.collect_variables(out);
            }
            ASTNodeType::Function { args, .. } => {
                for arg in args {
                    arg.collect_variables(out);
                }
            }
        }
    }

    /// Whether some call in the tree has a name matching `pred`.
    pub fn any_function(&self, pred: &dyn Fn(&str) -> bool) -> bool {
        match &self.node_type {
            ASTNodeType::Number(_) | ASTNodeType::Variable(_) => false,
            ASTNodeType::UnaryOp { expr, .. } => expr.any_function(pred),
            ASTNodeType::BinaryOp { left, right, .. } => {
                left.any_function(pred) || right.any_function(pred)
            }
            ASTNodeType::Function { name, args } => {
                pred(name) || args.iter().any(|a| a.any_function(pred))
            }
        }
    }
}

impl Display for ASTNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.node_type)
    }
}

/// Precedence-climbing parser over a token stream.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            position: 0,
        }
    }

    /// Consume the whole stream as one expression.
    pub fn parse(&mut self) -> Result<ASTNode, ParserError> {
        if self.peek().is_none() {
            return Err(ParserError {
                message: "empty expression".to_string(),
                position: None,
            });
        }
        let root = self.expression(0)?;
        match self.peek() {
            None => Ok(root),
            Some(extra) => Err(ParserError {
                message: format!("trailing input {extra}"),
                position: Some(extra.start),
            }),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn at(&self, token_type: TokenType, subtype: TokenSubType) -> bool {
        self.peek()
            .is_some_and(|t| t.token_type == token_type && t.subtype == subtype)
    }

    fn error_here(&self, message: impl Into<String>) -> ParserError {
        let at = match self.peek() {
            Some(t) => t.start,
            None => self.tokens.last().map_or(0, |t| t.end),
        };
        ParserError {
            message: message.into(),
            position: Some(at),
        }
    }

    /// Parse operands joined by infix operators binding at least as tightly
    /// as `floor`.
    fn expression(&mut self, floor: u8) -> Result<ASTNode, ParserError> {
        let mut lhs = self.prefixed()?;
        loop {
            let Some((power, assoc)) = self
                .peek()
                .filter(|t| t.token_type == TokenType::OpInfix)
                .and_then(Token::binding_power)
            else {
                break;
            };
            if power < floor {
                break;
            }
            let Some(op) = self.advance() else { break };
            let next_floor = match assoc {
                Associativity::Left => power + 1,
                Associativity::Right => power,
            };
            let rhs = self.expression(next_floor)?;
            lhs = ASTNode::new(
                ASTNodeType::BinaryOp {
                    op: op.value.clone(),
                    left: Box::new(lhs),
                    right: Box::new(rhs),
                },
                Some(op),
            );
        }
        Ok(lhs)
    }

    fn prefixed(&mut self) -> Result<ASTNode, ParserError> {
        if !self.peek().is_some_and(|t| t.token_type == TokenType::OpPrefix) {
            return self.primary();
        }
        let Some(op) = self.advance() else {
            return Err(self.error_here("missing operand"));
        };
        let (power, _) = op.binding_power().unwrap_or((0, Associativity::Right));
        // binds looser than '^': -x^2 == -(x^2)
        let operand = self.expression(power)?;
        Ok(ASTNode::new(
            ASTNodeType::UnaryOp {
                op: op.value.clone(),
                expr: Box::new(operand),
            },
            Some(op),
        ))
    }

    fn primary(&mut self) -> Result<ASTNode, ParserError> {
        let Some(token) = self.peek() else {
            return Err(self.error_here("expression ends early"));
        };
        match (token.token_type, token.subtype) {
            (TokenType::Operand, TokenSubType::Number) => {
                let Some(token) = self.advance() else {
                    return Err(self.error_here("expression ends early"));
                };
                let value = token.value.parse::<f64>().map_err(|_| ParserError {
                    message: format!("bad number literal {}", token.value),
                    position: Some(token.start),
                })?;
                Ok(ASTNode::new(ASTNodeType::Number(value), Some(token)))
            }
            (TokenType::Operand, _) => {
                let Some(token) = self.advance() else {
                    return Err(self.error_here("expression ends early"));
                };
                Ok(ASTNode::new(
                    ASTNodeType::Variable(token.value.clone()),
                    Some(token),
                ))
            }
            (TokenType::Func, TokenSubType::Open) => {
                let Some(call) = self.advance() else {
                    return Err(self.error_here("expression ends early"));
                };
                let args = self.call_arguments()?;
                Ok(ASTNode::new(
                    ASTNodeType::Function {
                        name: call.value.clone(),
                        args,
                    },
                    Some(call),
                ))
            }
            (TokenType::Paren, TokenSubType::Open) => {
                self.position += 1;
                let inner = self.expression(0)?;
                if !self.at(TokenType::Paren, TokenSubType::Close) {
                    return Err(self.error_here("missing ')'"));
                }
                self.position += 1;
                Ok(inner)
            }
            _ => Err(self.error_here(format!("unexpected {token}"))),
        }
    }

    /// Arguments of a call whose opener was just consumed, through the
    /// closing parenthesis.
    fn call_arguments(&mut self) -> Result<Vec<ASTNode>, ParserError> {
        let mut args = Vec::new();
        if self.at(TokenType::Func, TokenSubType::Close) {
            self.position += 1;
            return Ok(args);
        }
        loop {
            args.push(self.expression(0)?);
            if self.at(TokenType::Sep, TokenSubType::Arg) {
                self.position += 1;
            } else if self.at(TokenType::Func, TokenSubType::Close) {
                self.position += 1;
                return Ok(args);
            } else {
                return Err(match self.peek() {
                    Some(t) => self.error_here(format!("expected ',' or ')' but found {t}")),
                    None => self.error_here("call is not closed"),
                });
            }
        }
    }
}

/// Tokenize and parse `expression` in one step.
pub fn parse(expression: impl AsRef<str>) -> Result<ASTNode, ParserError> {
    let tokenizer = Tokenizer::new(expression.as_ref())?;
    Parser::new(tokenizer.items).parse()
}

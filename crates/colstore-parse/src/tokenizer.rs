use std::error::Error;
use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
}

/// Lexing failure at byte offset `pos`.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizerError {
    pub message: String,
    pub pos: usize,
}

impl Display for TokenizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenizerError: {} (at byte {})", self.message, self.pos)
    }
}

impl Error for TokenizerError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    Operand,
    Func,
    Paren,
    Sep,
    OpPrefix,
    OpInfix,
}

impl Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenSubType {
    None,
    Number,
    Name,
    Open,
    Close,
    Arg,
}

impl Display for TokenSubType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A token in a column formula expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub value: String,
    pub token_type: TokenType,
    pub subtype: TokenSubType,
    pub start: usize,
    pub end: usize,
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' ({}/{})", self.value, self.token_type, self.subtype)
    }
}

impl Token {
    fn from_slice(
        source: &str,
        token_type: TokenType,
        subtype: TokenSubType,
        start: usize,
        end: usize,
    ) -> Self {
        Token {
            value: source[start..end].to_owned(),
            token_type,
            subtype,
            start,
            end,
        }
    }

    pub fn is_operator(&self) -> bool {
        matches!(self.token_type, TokenType::OpPrefix | TokenType::OpInfix)
    }

    /// Binding power and associativity of an operator token; prefix
    /// signs sit between `^` and the multiplicative operators.
    pub fn binding_power(&self) -> Option<(u8, Associativity)> {
        match (self.token_type, self.value.as_str()) {
            (TokenType::OpPrefix, _) => Some((4, Associativity::Right)),
            (TokenType::OpInfix, "^") => Some((5, Associativity::Right)),
            (TokenType::OpInfix, "*" | "/") => Some((3, Associativity::Left)),
            (TokenType::OpInfix, "+" | "-") => Some((2, Associativity::Left)),
            _ => None,
        }
    }
}

/// Splits an expression such as `2*sin(x)+cell(i-1, y)` into tokens.
///
/// Whitespace is dropped. Identifiers directly followed by `(` become
/// [`TokenType::Func`] openers whose closing parenthesis is also tagged
/// `Func`, so the parser can tell call arguments from grouping.
pub struct Tokenizer {
    formula: String,
    pub items: Vec<Token>,
    open_groups: Vec<TokenType>,
    offset: usize,
}

impl Tokenizer {
    /// Lex `formula` completely; the tokens end up in `items`.
    pub fn new(formula: &str) -> Result<Self, TokenizerError> {
        let mut lexer = Tokenizer {
            formula: formula.to_owned(),
            items: Vec::new(),
            open_groups: Vec::new(),
            offset: 0,
        };
        lexer.tokenize()?;
        Ok(lexer)
    }

    pub fn formula(&self) -> &str {
        &self.formula
    }

    #[inline]
    fn current_byte(&self) -> Option<u8> {
        self.byte_at(self.offset)
    }

    #[inline]
    fn byte_at(&self, pos: usize) -> Option<u8> {
        self.formula.as_bytes().get(pos).copied()
    }

    /// True when a `+`/`-` at the current position starts an operand.
    fn expects_operand(&self) -> bool {
        match self.items.last() {
            None => true,
            Some(t) => {
                t.is_operator()
                    || t.token_type == TokenType::Sep
                    || (matches!(t.token_type, TokenType::Paren | TokenType::Func)
                        && t.subtype == TokenSubType::Open)
            }
        }
    }

    fn tokenize(&mut self) -> Result<(), TokenizerError> {
        while let Some(c) = self.current_byte() {
            let start = self.offset;
            match c {
                b' ' | b'\t' | b'\n' | b'\r' => {
                    self.offset += 1;
                }
                b'0'..=b'9' | b'.' => self.read_number()?,
                b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.read_name(),
                b'(' => {
                    self.offset += 1;
                    self.push(TokenType::Paren, TokenSubType::Open, start);
                    self.open_groups.push(TokenType::Paren);
                }
                b')' => {
                    self.offset += 1;
                    let opener = self.open_groups.pop().ok_or_else(|| TokenizerError {
                        message: "')' without matching '('".to_string(),
                        pos: start,
                    })?;
                    self.push(opener, TokenSubType::Close, start);
                }
                b',' => {
                    if self.open_groups.last() != Some(&TokenType::Func) {
                        return Err(TokenizerError {
                            message: "',' outside of a call".to_string(),
                            pos: start,
                        });
                    }
                    self.offset += 1;
                    self.push(TokenType::Sep, TokenSubType::Arg, start);
                }
                b'+' | b'-' => {
                    self.offset += 1;
                    let token_type = if self.expects_operand() {
                        TokenType::OpPrefix
                    } else {
                        TokenType::OpInfix
                    };
                    self.push(token_type, TokenSubType::None, start);
                }
                b'*' | b'/' | b'^' => {
                    self.offset += 1;
                    self.push(TokenType::OpInfix, TokenSubType::None, start);
                }
                _ => {
                    return Err(TokenizerError {
                        message: format!("unexpected character '{}'", char::from(c)),
                        pos: start,
                    });
                }
            }
        }

        if self.open_groups.is_empty() {
            Ok(())
        } else {
            Err(TokenizerError {
                message: "unclosed '('".to_string(),
                pos: self.offset,
            })
        }
    }

    fn push(&mut self, token_type: TokenType, subtype: TokenSubType, start: usize) {
        let token = Token::from_slice(&self.formula, token_type, subtype, start, self.offset);
        self.items.push(token);
    }

    fn read_number(&mut self) -> Result<(), TokenizerError> {
        let start = self.offset;
        let mut seen_dot = false;
        while let Some(c) = self.current_byte() {
            match c {
                b'0'..=b'9' => self.offset += 1,
                b'.' if !seen_dot => {
                    seen_dot = true;
                    self.offset += 1;
                }
                b'e' | b'E' => {
                    // exponent only if digits follow (optionally signed)
                    let mut look = self.offset + 1;
                    if matches!(self.byte_at(look), Some(b'+' | b'-')) {
                        look += 1;
                    }
                    if !matches!(self.byte_at(look), Some(b'0'..=b'9')) {
                        break;
                    }
                    self.offset = look;
                    while matches!(self.current_byte(), Some(b'0'..=b'9')) {
                        self.offset += 1;
                    }
                    break;
                }
                _ => break,
            }
        }
        if self.formula[start..self.offset].parse::<f64>().is_err() {
            return Err(TokenizerError {
                message: format!("bad number literal '{}'", &self.formula[start..self.offset]),
                pos: start,
            });
        }
        self.push(TokenType::Operand, TokenSubType::Number, start);
        Ok(())
    }

    fn read_name(&mut self) {
        let start = self.offset;
        while matches!(
            self.current_byte(),
            Some(b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_')
        ) {
            self.offset += 1;
        }
        // a name directly followed by '(' (whitespace allowed) is a call
        let mut look = self.offset;
        while matches!(self.byte_at(look), Some(b' ' | b'\t')) {
            look += 1;
        }
        if self.byte_at(look) == Some(b'(') {
            let name_end = self.offset;
            self.offset = look + 1;
            self.items.push(Token {
                value: self.formula[start..name_end].to_string(),
                token_type: TokenType::Func,
                subtype: TokenSubType::Open,
                start,
                end: self.offset,
            });
            self.open_groups.push(TokenType::Func);
        } else {
            self.push(TokenType::Operand, TokenSubType::Name, start);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(formula: &str) -> Vec<(TokenType, String)> {
        Tokenizer::new(formula)
            .unwrap()
            .items
            .into_iter()
            .map(|t| (t.token_type, t.value))
            .collect()
    }

    #[test]
    fn test_prefix_and_infix_minus() {
        let toks = kinds("-x - -2");
        assert_eq!(
            toks,
            vec![
                (TokenType::OpPrefix, "-".to_string()),
                (TokenType::Operand, "x".to_string()),
                (TokenType::OpInfix, "-".to_string()),
                (TokenType::OpPrefix, "-".to_string()),
                (TokenType::Operand, "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_function_call_tokens() {
        let toks = Tokenizer::new("sma(3, x)").unwrap().items;
        assert_eq!(toks[0].token_type, TokenType::Func);
        assert_eq!(toks[0].value, "sma");
        assert_eq!(toks[2].token_type, TokenType::Sep);
        assert_eq!(toks[4].token_type, TokenType::Func);
        assert_eq!(toks[4].subtype, TokenSubType::Close);
    }

    #[test]
    fn test_number_forms() {
        let toks = kinds("1.5e3 + .25 + 2E-2");
        assert_eq!(toks[0].1, "1.5e3");
        assert_eq!(toks[2].1, ".25");
        assert_eq!(toks[4].1, "2E-2");
        // 'e' without digits is a name, not an exponent
        let toks = kinds("2*e");
        assert_eq!(toks.len(), 3);
    }

    #[test]
    fn test_errors_carry_position() {
        let err = Tokenizer::new("x + $").err().unwrap();
        assert_eq!(err.pos, 4);
        assert!(Tokenizer::new("(x").is_err());
        assert!(Tokenizer::new("x)").is_err());
        assert!(Tokenizer::new("x, y").is_err());
    }
}

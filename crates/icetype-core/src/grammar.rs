//! Tokenizer and recursive-descent parser for field and relation strings.
//!
//! Field strings: `base [ '(' params ')' ] [ '[]' ] [ ! | ? | # ] [ '=' default ]`.
//! Relation strings: `[ -> | <- | ~> | <~ ] Target [ ! | ? | # ] [ '.' inverse ] [ '[]' ]`.

use crate::error::{ParseError, ParseErrorCode};
use crate::schema::{DefaultValue, Modifier, RelationOperator};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Number(String),
    Str(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Modifier(Modifier),
    Equals,
    Minus,
    Operator(RelationOperator),
}

impl TokenKind {
    fn describe(&self) -> String {
        match self {
            TokenKind::Ident(value) => format!("identifier '{value}'"),
            TokenKind::Number(value) => format!("number '{value}'"),
            TokenKind::Str(value) => format!("string {value:?}"),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
            TokenKind::LBracket => "'['".to_string(),
            TokenKind::RBracket => "']'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Dot => "'.'".to_string(),
            TokenKind::Modifier(modifier) => format!("modifier '{}'", modifier.as_str()),
            TokenKind::Equals => "'='".to_string(),
            TokenKind::Minus => "'-'".to_string(),
            TokenKind::Operator(op) => format!("operator '{}'", op.as_str()),
        }
    }
}

/// Token with its character span in the source string.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    /// 1-based column of the first character.
    pub fn column(&self) -> usize {
        self.start + 1
    }
}

/// Parsed field string.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldTypeAst {
    pub base: String,
    pub params: Vec<u32>,
    pub is_array: bool,
    pub modifier: Modifier,
    pub default: Option<DefaultValue>,
}

/// Parsed relation string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationAst {
    pub operator: RelationOperator,
    pub target: String,
    pub modifier: Modifier,
    pub inverse: Option<String>,
    pub is_array: bool,
}

/// Returns true when `input` starts with a relation operator.
pub fn is_relation_string(input: &str) -> bool {
    let trimmed = input.trim_start();
    ["->", "<-", "~>", "<~"]
        .iter()
        .any(|op| trimmed.starts_with(op))
}

/// Split a field-type or relation string into tokens.
///
/// Whitespace is skipped. Columns in errors are 1-based character offsets.
pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        let start = i;

        if ch.is_whitespace() {
            i += 1;
            continue;
        }

        let kind = if ch.is_ascii_alphabetic() || ch == '_' {
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            TokenKind::Ident(chars[start..i].iter().collect())
        } else if ch.is_ascii_digit() {
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            if i + 1 < chars.len() && chars[i] == '.' && chars[i + 1].is_ascii_digit() {
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
            }
            TokenKind::Number(chars[start..i].iter().collect())
        } else if ch == '"' || ch == '\'' {
            let (value, next) = scan_string(&chars, start)?;
            i = next;
            TokenKind::Str(value)
        } else {
            let next = chars.get(i + 1).copied();
            let (kind, width) = match (ch, next) {
                ('-', Some('>')) => (TokenKind::Operator(RelationOperator::Forward), 2),
                ('<', Some('-')) => (TokenKind::Operator(RelationOperator::Backward), 2),
                ('~', Some('>')) => (TokenKind::Operator(RelationOperator::FuzzyForward), 2),
                ('<', Some('~')) => (TokenKind::Operator(RelationOperator::FuzzyBackward), 2),
                ('-', _) => (TokenKind::Minus, 1),
                ('(', _) => (TokenKind::LParen, 1),
                (')', _) => (TokenKind::RParen, 1),
                ('[', _) => (TokenKind::LBracket, 1),
                (']', _) => (TokenKind::RBracket, 1),
                (',', _) => (TokenKind::Comma, 1),
                ('.', _) => (TokenKind::Dot, 1),
                ('=', _) => (TokenKind::Equals, 1),
                _ => match Modifier::from_char(ch) {
                    Some(modifier) => (TokenKind::Modifier(modifier), 1),
                    None => {
                        return Err(ParseError::at_column(
                            ParseErrorCode::UnexpectedToken,
                            start + 1,
                            format!("unexpected character '{ch}'"),
                        ));
                    }
                },
            };
            i += width;
            kind
        };

        tokens.push(Token {
            kind,
            start,
            end: i,
        });
    }

    Ok(tokens)
}

fn scan_string(chars: &[char], start: usize) -> Result<(String, usize), ParseError> {
    let quote = chars[start];
    let mut value = String::new();
    let mut i = start + 1;

    while i < chars.len() {
        match chars[i] {
            '\\' => {
                let escaped = chars.get(i + 1).copied().ok_or_else(|| {
                    ParseError::at_column(
                        ParseErrorCode::UnterminatedString,
                        start + 1,
                        "unterminated string literal",
                    )
                })?;
                value.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    other => other,
                });
                i += 2;
            }
            ch if ch == quote => return Ok((value, i + 1)),
            ch => {
                value.push(ch);
                i += 1;
            }
        }
    }

    Err(ParseError::at_column(
        ParseErrorCode::UnterminatedString,
        start + 1,
        "unterminated string literal",
    ))
}

/// Parse a field string such as `decimal(10,2)!` or `timestamp = now()`.
pub fn parse_field_type(input: &str) -> Result<FieldTypeAst, ParseError> {
    let mut parser = Parser::new(input)?;
    let ast = parser.field_type()?;
    parser.expect_end()?;
    Ok(ast)
}

/// Parse a relation string such as `<- Post.author[]`. A missing operator is
/// read as forward.
pub fn parse_relation(input: &str) -> Result<RelationAst, ParseError> {
    let mut parser = Parser::new(input)?;
    let ast = parser.relation()?;
    parser.expect_end()?;
    Ok(ast)
}

struct Parser {
    source: Vec<char>,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Result<Self, ParseError> {
        Ok(Self {
            source: input.chars().collect(),
            tokens: tokenize(input)?,
            pos: 0,
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|token| &token.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek_kind() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn end_column(&self) -> usize {
        self.source.len() + 1
    }

    fn unexpected(&self, token: &Token, expected: &str) -> ParseError {
        ParseError::at_column(
            ParseErrorCode::UnexpectedToken,
            token.column(),
            format!("expected {expected}, found {}", token.kind.describe()),
        )
    }

    fn unexpected_end(&self, expected: &str) -> ParseError {
        ParseError::at_column(
            ParseErrorCode::UnexpectedEnd,
            self.end_column(),
            format!("expected {expected}, found end of input"),
        )
    }

    fn expect_end(&self) -> Result<(), ParseError> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(self.unexpected(token, "end of input")),
        }
    }

    fn expect_ident(&mut self, expected: &str) -> Result<String, ParseError> {
        match self.advance() {
            Some(Token {
                kind: TokenKind::Ident(name),
                ..
            }) => Ok(name),
            Some(token) => Err(self.unexpected(&token, expected)),
            None => Err(self.unexpected_end(expected)),
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, ParseError> {
        match self.advance() {
            Some(token) if token.kind == kind => Ok(token),
            Some(token) => Err(self.unexpected(&token, expected)),
            None => Err(self.unexpected_end(expected)),
        }
    }

    fn modifier(&mut self) -> Modifier {
        match self.peek_kind() {
            Some(TokenKind::Modifier(modifier)) => {
                let modifier = *modifier;
                self.pos += 1;
                modifier
            }
            _ => Modifier::None,
        }
    }

    fn array_suffix(&mut self) -> Result<bool, ParseError> {
        if self.eat(&TokenKind::LBracket) {
            self.expect(TokenKind::RBracket, "']'")?;
            return Ok(true);
        }
        Ok(false)
    }

    fn field_type(&mut self) -> Result<FieldTypeAst, ParseError> {
        let base = self.expect_ident("type name")?;
        let params = if self.peek_kind() == Some(&TokenKind::LParen) {
            self.params(&base)?
        } else {
            Vec::new()
        };
        let is_array = self.array_suffix()?;
        let modifier = self.modifier();
        let default = if self.eat(&TokenKind::Equals) {
            Some(self.default_value()?)
        } else {
            None
        };

        Ok(FieldTypeAst {
            base,
            params,
            is_array,
            modifier,
            default,
        })
    }

    fn params(&mut self, base: &str) -> Result<Vec<u32>, ParseError> {
        let open = self.expect(TokenKind::LParen, "'('")?;
        let mut params = Vec::new();

        loop {
            match self.advance() {
                Some(Token {
                    kind: TokenKind::Number(raw),
                    start,
                    ..
                }) => {
                    let value = raw.parse::<u32>().map_err(|_| {
                        ParseError::at_column(
                            ParseErrorCode::InvalidParams,
                            start + 1,
                            format!("parameter '{raw}' of '{base}' must be a non-negative integer"),
                        )
                    })?;
                    params.push(value);
                }
                Some(token) => {
                    return Err(ParseError::at_column(
                        ParseErrorCode::InvalidParams,
                        token.column(),
                        format!(
                            "expected integer parameter for '{base}', found {}",
                            token.kind.describe()
                        ),
                    ));
                }
                None => {
                    return Err(ParseError::at_column(
                        ParseErrorCode::InvalidParams,
                        open.column(),
                        format!("unclosed parameter list for '{base}'"),
                    ));
                }
            }

            match self.advance() {
                Some(Token {
                    kind: TokenKind::Comma,
                    ..
                }) => continue,
                Some(Token {
                    kind: TokenKind::RParen,
                    ..
                }) => return Ok(params),
                Some(token) => return Err(self.unexpected(&token, "',' or ')'")),
                None => {
                    return Err(ParseError::at_column(
                        ParseErrorCode::InvalidParams,
                        open.column(),
                        format!("unclosed parameter list for '{base}'"),
                    ));
                }
            }
        }
    }

    fn default_value(&mut self) -> Result<DefaultValue, ParseError> {
        let Some(token) = self.advance() else {
            return Err(ParseError::at_column(
                ParseErrorCode::InvalidDefault,
                self.end_column(),
                "missing default value after '='",
            ));
        };

        let column = token.column();
        let start = token.start;
        match token.kind {
            TokenKind::Str(value) => Ok(DefaultValue::String(value)),
            TokenKind::Number(raw) => number_default(&raw, false, column),
            TokenKind::Minus => match self.advance() {
                Some(Token {
                    kind: TokenKind::Number(raw),
                    ..
                }) => number_default(&raw, true, column),
                _ => Err(ParseError::at_column(
                    ParseErrorCode::InvalidDefault,
                    column,
                    "'-' must be followed by a number",
                )),
            },
            TokenKind::Ident(name) => match name.as_str() {
                "true" => Ok(DefaultValue::Boolean(true)),
                "false" => Ok(DefaultValue::Boolean(false)),
                _ if self.peek_kind() == Some(&TokenKind::LParen) => {
                    let end = self.balanced_parens()?;
                    let raw: String = self.source[start..end].iter().collect();
                    Ok(DefaultValue::Expression(raw))
                }
                _ => Err(ParseError::at_column(
                    ParseErrorCode::InvalidDefault,
                    column,
                    format!(
                        "default '{name}' must be a string, number, boolean or call expression"
                    ),
                )),
            },
            other => Err(ParseError::at_column(
                ParseErrorCode::InvalidDefault,
                column,
                format!("unexpected {} in default value", other.describe()),
            )),
        }
    }

    /// Consume a parenthesized group, returning the end offset of the closing paren.
    fn balanced_parens(&mut self) -> Result<usize, ParseError> {
        let open = self.expect(TokenKind::LParen, "'('")?;
        let mut depth = 1usize;

        while let Some(token) = self.advance() {
            match token.kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(token.end);
                    }
                }
                _ => {}
            }
        }

        Err(ParseError::at_column(
            ParseErrorCode::InvalidDefault,
            open.column(),
            "unbalanced parentheses in default expression",
        ))
    }

    fn relation(&mut self) -> Result<RelationAst, ParseError> {
        let operator = match self.peek_kind() {
            Some(TokenKind::Operator(op)) => {
                let op = *op;
                self.pos += 1;
                op
            }
            _ => RelationOperator::Forward,
        };
        let target = self.expect_ident("target type name")?;
        let modifier = self.modifier();
        let inverse = if self.eat(&TokenKind::Dot) {
            Some(self.expect_ident("inverse field name")?)
        } else {
            None
        };
        let is_array = self.array_suffix()?;

        Ok(RelationAst {
            operator,
            target,
            modifier,
            inverse,
            is_array,
        })
    }
}

fn number_default(raw: &str, negative: bool, column: usize) -> Result<DefaultValue, ParseError> {
    let literal = if negative {
        format!("-{raw}")
    } else {
        raw.to_string()
    };
    let invalid = || {
        ParseError::at_column(
            ParseErrorCode::InvalidDefault,
            column,
            format!("numeric default '{literal}' is out of range"),
        )
    };

    if raw.contains('.') {
        match literal.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(DefaultValue::Float(value)),
            _ => Err(invalid()),
        }
    } else {
        literal
            .parse::<i64>()
            .map(DefaultValue::Integer)
            .map_err(|_| invalid())
    }
}

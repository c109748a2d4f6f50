//! Parser for filter expressions.
//!
//! A precedence-climbing recursive descent over the token stream, lowest
//! binding first:
//!
//! ```text
//! pipe        := comma ( `|` comma )*
//! comma       := alternative ( `,` alternative )*
//! alternative := comparison ( `//` comparison )*
//! comparison  := additive ( (`==`|`!=`|`<`|`<=`|`>`|`>=`) additive )*
//! additive    := multiplicative ( (`+`|`-`) multiplicative )*
//! multiplicative := postfix ( (`*`|`/`|`%`) postfix )*
//! postfix     := primary ( postfix_op )*
//! primary     := literal | identity-form | `(` pipe `)` | array-ctor
//!              | object-ctor | function-call | `-` postfix | `not` postfix | `..`
//! ```
//!
//! Postfix operations chain onto any base expression through `Pipe` nodes,
//! so `.a.b` parses as `Pipe(Field("a"), Field("b"))`. The parser accepts
//! the full surface grammar; the compiler decides which of it is
//! executable. Parsing halts on the first error.

use core::fmt;

use crate::lexer::{Token, TokenKind};
use crate::value::Value;

/// A parsed filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    /// A literal value: `42`, `"text"`, `true`, `false`, `null`
    Literal(Value),

    /// Identity: `.`
    Identity,

    /// Field access: `.foo`
    Field(String),

    /// Index access with an arbitrary index expression: `.[0]`, `.["key"]`
    Index(Box<Ast>),

    /// Slice: `.[1:3]`
    Slice { start: Box<Ast>, end: Box<Ast> },

    /// Iterate all elements: `.[]`
    Iterator,

    /// Recursive descent: `..`
    RecursiveDescent,

    /// Pipe: `left | right`
    Pipe(Box<Ast>, Box<Ast>),

    /// Comma: `.a, .b` (two or more children)
    Comma(Vec<Ast>),

    /// Binary operation: `.a + 1`, `.a == .b`
    BinaryOp {
        op: BinOp,
        left: Box<Ast>,
        right: Box<Ast>,
    },

    /// Unary operation: `-.a`, `not .a`
    UnaryOp { op: UnOp, expr: Box<Ast> },

    /// Alternative: `.a // .b`
    Alternative(Box<Ast>, Box<Ast>),

    /// Function call: `length`, `f(.a; .b)`
    FunctionCall { name: String, args: Vec<Ast> },

    /// Array constructor: `[ expr ]` or `[]`
    ArrayConstruct(Option<Box<Ast>>),

    /// Object constructor: `{key: expr, ...}` with key expressions
    ObjectConstruct(Vec<(Ast, Ast)>),

    /// If-then-else. Carried in the tree for completeness; no surface
    /// syntax produces it in this revision.
    Conditional {
        cond: Box<Ast>,
        then_branch: Box<Ast>,
        else_branch: Box<Ast>,
    },
}

impl Ast {
    fn pipe(left: Ast, right: Ast) -> Ast {
        Ast::Pipe(Box::new(left), Box::new(right))
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinOp {
    /// Source spelling of the operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

/// Error that occurs during parsing. Parsing halts at the first one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    /// Line number of the offending token (1-indexed)
    pub line: usize,
}

impl ParseError {
    fn new(message: impl Into<String>, line: usize) -> Self {
        ParseError {
            message: message.into(),
            line,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ParseError {}

/// Parse a token stream (as produced by [`crate::lexer::Lexer::tokenize`])
/// into an AST.
pub fn parse(tokens: Vec<Token>) -> Result<Ast, ParseError> {
    Parser::new(tokens).parse()
}

/// Parser state over a token stream.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut parser = Parser { tokens, pos: 0 };
        // tokenize() always terminates the stream with EndOfInput; keep
        // that invariant for hand-built streams too.
        if !matches!(
            parser.tokens.last(),
            Some(t) if t.kind == TokenKind::EndOfInput
        ) {
            parser.tokens.push(Token {
                kind: TokenKind::EndOfInput,
                text: String::new(),
                line: 0,
                column: 0,
            });
        }
        parser
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn kind(&self) -> TokenKind {
        self.current().kind
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), ParseError> {
        if self.kind() != kind {
            return Err(ParseError::new(
                format!("Expected token type at line {}", self.current().line),
                self.current().line,
            ));
        }
        self.advance();
        Ok(())
    }

    /// Parse the whole stream as a single filter expression.
    pub fn parse(&mut self) -> Result<Ast, ParseError> {
        let result = self.parse_pipe()?;
        if self.kind() != TokenKind::EndOfInput {
            return Err(ParseError::new(
                "Unexpected token after expression",
                self.current().line,
            ));
        }
        Ok(result)
    }

    // pipe := comma ( `|` comma )*
    fn parse_pipe(&mut self) -> Result<Ast, ParseError> {
        let mut left = self.parse_comma()?;
        while self.kind() == TokenKind::Pipe {
            self.advance();
            let right = self.parse_comma()?;
            left = Ast::pipe(left, right);
        }
        Ok(left)
    }

    // comma := alternative ( `,` alternative )*
    fn parse_comma(&mut self) -> Result<Ast, ParseError> {
        let left = self.parse_alternative()?;
        if self.kind() != TokenKind::Comma {
            return Ok(left);
        }
        let mut children = vec![left];
        while self.kind() == TokenKind::Comma {
            self.advance();
            children.push(self.parse_alternative()?);
        }
        Ok(Ast::Comma(children))
    }

    // alternative := comparison ( `//` comparison )*
    fn parse_alternative(&mut self) -> Result<Ast, ParseError> {
        let mut left = self.parse_comparison()?;
        while self.kind() == TokenKind::DoubleSlash {
            self.advance();
            let right = self.parse_comparison()?;
            left = Ast::Alternative(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    // comparison := additive ( cmp-op additive )*
    fn parse_comparison(&mut self) -> Result<Ast, ParseError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.kind() {
                TokenKind::Eq => BinOp::Eq,
                TokenKind::Ne => BinOp::Ne,
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Le => BinOp::Le,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::Ge => BinOp::Ge,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = Ast::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    // additive := multiplicative ( (`+`|`-`) multiplicative )*
    fn parse_additive(&mut self) -> Result<Ast, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Ast::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    // multiplicative := postfix ( (`*`|`/`|`%`) postfix )*
    fn parse_multiplicative(&mut self) -> Result<Ast, ParseError> {
        let mut left = self.parse_postfix()?;
        loop {
            let op = match self.kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_postfix()?;
            left = Ast::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    // postfix := primary ( `.` IDENT | `.` `[`…`]` | `[`…`]` )*
    //
    // Each postfix operation pipes the preceding base into the new access,
    // so `.users[0].name` is Pipe(Pipe(Field, Index), Field).
    fn parse_postfix(&mut self) -> Result<Ast, ParseError> {
        let mut base = self.parse_primary()?;
        loop {
            match self.kind() {
                TokenKind::Dot => {
                    self.advance();
                    match self.kind() {
                        TokenKind::Identifier => {
                            let field = Ast::Field(self.current().text.clone());
                            self.advance();
                            base = Ast::pipe(base, field);
                        }
                        TokenKind::LBracket => {
                            let op = self.parse_bracket_suffix()?;
                            base = Ast::pipe(base, op);
                        }
                        // A trailing `.` pipes into identity.
                        _ => base = Ast::pipe(base, Ast::Identity),
                    }
                }
                TokenKind::LBracket => {
                    let op = self.parse_bracket_suffix()?;
                    base = Ast::pipe(base, op);
                }
                _ => break,
            }
        }
        Ok(base)
    }

    /// Parse `[ ]`, `[ expr ]`, or `[ expr : expr ]` starting at the `[`.
    /// Used for both `.`-prefixed and bare postfix brackets, and for the
    /// no-base identity forms.
    fn parse_bracket_suffix(&mut self) -> Result<Ast, ParseError> {
        self.expect(TokenKind::LBracket)?;
        if self.kind() == TokenKind::RBracket {
            self.advance();
            return Ok(Ast::Iterator);
        }
        let first = self.parse_pipe()?;
        if self.kind() == TokenKind::Colon {
            self.advance();
            let end = self.parse_pipe()?;
            self.expect(TokenKind::RBracket)?;
            return Ok(Ast::Slice {
                start: Box::new(first),
                end: Box::new(end),
            });
        }
        self.expect(TokenKind::RBracket)?;
        Ok(Ast::Index(Box::new(first)))
    }

    fn parse_primary(&mut self) -> Result<Ast, ParseError> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Number => {
                self.advance();
                let n: f64 = token.text.parse().map_err(|_| {
                    ParseError::new(
                        format!("Invalid number literal: {}", token.text),
                        token.line,
                    )
                })?;
                Ok(Ast::Literal(Value::Number(n)))
            }
            TokenKind::String => {
                self.advance();
                Ok(Ast::Literal(Value::String(token.text)))
            }
            TokenKind::True => {
                self.advance();
                Ok(Ast::Literal(Value::Bool(true)))
            }
            TokenKind::False => {
                self.advance();
                Ok(Ast::Literal(Value::Bool(false)))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Ast::Literal(Value::Null))
            }
            // Identity forms: `.`, `.ident`, `.[...]`
            TokenKind::Dot => {
                self.advance();
                match self.kind() {
                    TokenKind::Identifier => {
                        let field = Ast::Field(self.current().text.clone());
                        self.advance();
                        Ok(field)
                    }
                    TokenKind::LBracket => self.parse_bracket_suffix(),
                    _ => Ok(Ast::Identity),
                }
            }
            TokenKind::Recursive => {
                self.advance();
                Ok(Ast::RecursiveDescent)
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_pipe()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::LBracket => self.parse_array(),
            TokenKind::LBrace => self.parse_object(),
            TokenKind::Identifier => {
                let name = token.text;
                self.advance();
                if self.kind() == TokenKind::LParen {
                    return self.parse_function_call(name);
                }
                // A bare identifier is a zero-argument call.
                Ok(Ast::FunctionCall {
                    name,
                    args: Vec::new(),
                })
            }
            TokenKind::Minus => {
                self.advance();
                let expr = self.parse_postfix()?;
                Ok(Ast::UnaryOp {
                    op: UnOp::Neg,
                    expr: Box::new(expr),
                })
            }
            TokenKind::Not => {
                self.advance();
                let expr = self.parse_postfix()?;
                Ok(Ast::UnaryOp {
                    op: UnOp::Not,
                    expr: Box::new(expr),
                })
            }
            _ => Err(ParseError::new(
                format!("Unexpected token in primary: {}", token.text),
                token.line,
            )),
        }
    }

    // array-ctor := `[` pipe? `]`
    fn parse_array(&mut self) -> Result<Ast, ParseError> {
        self.expect(TokenKind::LBracket)?;
        if self.kind() == TokenKind::RBracket {
            self.advance();
            return Ok(Ast::ArrayConstruct(None));
        }
        let inner = self.parse_pipe()?;
        self.expect(TokenKind::RBracket)?;
        Ok(Ast::ArrayConstruct(Some(Box::new(inner))))
    }

    // object-ctor := `{` ( key `:` value ( `,` key `:` value )* )? `}`
    //
    // Keys are string literals, bare identifiers, or parenthesized
    // expressions. Values parse one level below `,` so the comma separates
    // entries.
    fn parse_object(&mut self) -> Result<Ast, ParseError> {
        self.expect(TokenKind::LBrace)?;
        let mut entries = Vec::new();
        while self.kind() != TokenKind::RBrace && self.kind() != TokenKind::EndOfInput {
            let key = match self.kind() {
                TokenKind::String | TokenKind::Identifier => {
                    let key = Ast::Literal(Value::String(self.current().text.clone()));
                    self.advance();
                    key
                }
                TokenKind::LParen => {
                    self.advance();
                    let key = self.parse_pipe()?;
                    self.expect(TokenKind::RParen)?;
                    key
                }
                _ => break,
            };
            self.expect(TokenKind::Colon)?;
            let value = self.parse_alternative()?;
            entries.push((key, value));
            if self.kind() == TokenKind::Comma {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Ast::ObjectConstruct(entries))
    }

    // function-call := IDENT `(` pipe ( `;` pipe )* `)`
    fn parse_function_call(&mut self, name: String) -> Result<Ast, ParseError> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        if self.kind() != TokenKind::RParen {
            args.push(self.parse_pipe()?);
            while self.kind() == TokenKind::Semicolon {
                self.advance();
                args.push(self.parse_pipe()?);
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(Ast::FunctionCall { name, args })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse_str(input: &str) -> Result<Ast, ParseError> {
        let tokens = Lexer::new(input).tokenize().expect("lex failed");
        parse(tokens)
    }

    fn field(name: &str) -> Ast {
        Ast::Field(name.to_string())
    }

    #[test]
    fn test_identity() {
        assert_eq!(parse_str(".").unwrap(), Ast::Identity);
        assert_eq!(parse_str(" . ").unwrap(), Ast::Identity);
    }

    #[test]
    fn test_field_access() {
        assert_eq!(parse_str(".foo").unwrap(), field("foo"));
        assert_eq!(parse_str("._private").unwrap(), field("_private"));
    }

    #[test]
    fn test_chained_fields_pipe_shape() {
        // .a.b is Pipe(Field(a), Field(b))
        assert_eq!(
            parse_str(".a.b").unwrap(),
            Ast::pipe(field("a"), field("b"))
        );
    }

    #[test]
    fn test_postfix_chain() {
        // .users[0].name is Pipe(Pipe(Field, Index), Field)
        assert_eq!(
            parse_str(".users[0].name").unwrap(),
            Ast::pipe(
                Ast::pipe(
                    field("users"),
                    Ast::Index(Box::new(Ast::Literal(Value::Number(0.0)))),
                ),
                field("name"),
            )
        );
    }

    #[test]
    fn test_iterator_forms() {
        assert_eq!(parse_str(".[]").unwrap(), Ast::Iterator);
        assert_eq!(
            parse_str(".items[]").unwrap(),
            Ast::pipe(field("items"), Ast::Iterator)
        );
    }

    #[test]
    fn test_index_forms() {
        assert_eq!(
            parse_str(".[0]").unwrap(),
            Ast::Index(Box::new(Ast::Literal(Value::Number(0.0))))
        );
        assert_eq!(
            parse_str(r#".["key"]"#).unwrap(),
            Ast::Index(Box::new(Ast::Literal(Value::string("key"))))
        );
    }

    #[test]
    fn test_slice_forms() {
        let slice = Ast::Slice {
            start: Box::new(Ast::Literal(Value::Number(1.0))),
            end: Box::new(Ast::Literal(Value::Number(3.0))),
        };
        assert_eq!(parse_str(".[1:3]").unwrap(), slice);
        assert_eq!(
            parse_str(".items[1:3]").unwrap(),
            Ast::pipe(field("items"), slice)
        );
    }

    #[test]
    fn test_pipe() {
        assert_eq!(
            parse_str(".a | .b").unwrap(),
            Ast::pipe(field("a"), field("b"))
        );
    }

    #[test]
    fn test_comma() {
        assert_eq!(
            parse_str(".a, .b, .c").unwrap(),
            Ast::Comma(vec![field("a"), field("b"), field("c")])
        );
    }

    #[test]
    fn test_precedence_pipe_lowest() {
        // `.a, .b | .c` groups as Pipe(Comma(a, b), c)
        assert_eq!(
            parse_str(".a, .b | .c").unwrap(),
            Ast::pipe(Ast::Comma(vec![field("a"), field("b")]), field("c"))
        );
    }

    #[test]
    fn test_arithmetic_precedence() {
        // `.a + .b * .c` groups the multiplication first
        assert_eq!(
            parse_str(".a + .b * .c").unwrap(),
            Ast::BinaryOp {
                op: BinOp::Add,
                left: Box::new(field("a")),
                right: Box::new(Ast::BinaryOp {
                    op: BinOp::Mul,
                    left: Box::new(field("b")),
                    right: Box::new(field("c")),
                }),
            }
        );
    }

    #[test]
    fn test_comparison() {
        assert_eq!(
            parse_str(".a == 1").unwrap(),
            Ast::BinaryOp {
                op: BinOp::Eq,
                left: Box::new(field("a")),
                right: Box::new(Ast::Literal(Value::Number(1.0))),
            }
        );
    }

    #[test]
    fn test_alternative() {
        assert_eq!(
            parse_str(r#".a // "default""#).unwrap(),
            Ast::Alternative(
                Box::new(field("a")),
                Box::new(Ast::Literal(Value::string("default"))),
            )
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(parse_str("42").unwrap(), Ast::Literal(Value::Number(42.0)));
        assert_eq!(parse_str("true").unwrap(), Ast::Literal(Value::Bool(true)));
        assert_eq!(parse_str("null").unwrap(), Ast::Literal(Value::Null));
        assert_eq!(
            parse_str(r#""hi""#).unwrap(),
            Ast::Literal(Value::string("hi"))
        );
    }

    #[test]
    fn test_parenthesized() {
        assert_eq!(
            parse_str("(.a | .b)").unwrap(),
            Ast::pipe(field("a"), field("b"))
        );
    }

    #[test]
    fn test_array_constructor() {
        assert_eq!(parse_str("[]").unwrap(), Ast::ArrayConstruct(None));
        assert_eq!(
            parse_str("[.a]").unwrap(),
            Ast::ArrayConstruct(Some(Box::new(field("a"))))
        );
    }

    #[test]
    fn test_object_constructor() {
        assert_eq!(
            parse_str("{name: .n, age: .a}").unwrap(),
            Ast::ObjectConstruct(vec![
                (Ast::Literal(Value::string("name")), field("n")),
                (Ast::Literal(Value::string("age")), field("a")),
            ])
        );
    }

    #[test]
    fn test_function_calls() {
        assert_eq!(
            parse_str("length").unwrap(),
            Ast::FunctionCall {
                name: "length".to_string(),
                args: Vec::new(),
            }
        );
        assert_eq!(
            parse_str("map(.a; .b)").unwrap(),
            Ast::FunctionCall {
                name: "map".to_string(),
                args: vec![field("a"), field("b")],
            }
        );
    }

    #[test]
    fn test_unary() {
        assert_eq!(
            parse_str("-.a").unwrap(),
            Ast::UnaryOp {
                op: UnOp::Neg,
                expr: Box::new(field("a")),
            }
        );
        assert_eq!(
            parse_str("not .a").unwrap(),
            Ast::UnaryOp {
                op: UnOp::Not,
                expr: Box::new(field("a")),
            }
        );
    }

    #[test]
    fn test_recursive_descent() {
        assert_eq!(parse_str("..").unwrap(), Ast::RecursiveDescent);
    }

    #[test]
    fn test_error_unexpected_primary() {
        let err = parse_str("|").unwrap_err();
        assert_eq!(err.message, "Unexpected token in primary: |");
    }

    #[test]
    fn test_error_trailing_token() {
        let err = parse_str(".a )").unwrap_err();
        assert_eq!(err.message, "Unexpected token after expression");
    }

    #[test]
    fn test_error_expected_token() {
        let err = parse_str("(.a").unwrap_err();
        assert_eq!(err.message, "Expected token type at line 1");
    }

    #[test]
    fn test_empty_input_is_error() {
        let err = parse_str("").unwrap_err();
        assert_eq!(err.message, "Unexpected token in primary: ");
    }
}

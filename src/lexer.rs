//! Lexer for filter text.
//!
//! Turns a filter string into a flat token stream for the parser. Rules:
//!
//! - Whitespace between tokens is ignored; `#` starts a comment running to
//!   end of line.
//! - Numbers: optional leading `-`, digits, optional fraction, optional
//!   decimal exponent. A `-` not followed by a digit is the `Minus` token.
//! - Strings: double-quoted with `\" \\ \/ \n \t \r \b \f` escapes; any
//!   other escaped character passes through literally. Unterminated strings
//!   produce an `Error` token.
//! - Identifiers: `[A-Za-z_$][A-Za-z0-9_$]*`, with the keywords `true`,
//!   `false`, `null`, `and`, `or`, `not` recognized first.
//! - Two-character operators (`==` `!=` `<=` `>=` `|=` `+=` `//` `..`) are
//!   matched greedily before their single-character prefixes.
//!
//! Line and column (both 1-indexed) are tracked for diagnostics.

use core::fmt;

/// The kind of a lexed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Literals
    Number,
    String,
    True,
    False,
    Null,

    // Identifiers
    Identifier,

    // Operators
    Dot,       // .
    Pipe,      // |
    Comma,     // ,
    Semicolon, // ;
    Colon,     // :

    // Arithmetic
    Plus,    // +
    Minus,   // -
    Star,    // *
    Slash,   // /
    Percent, // %

    // Comparison
    Eq, // ==
    Ne, // !=
    Lt, // <
    Le, // <=
    Gt, // >
    Ge, // >=

    // Logic
    And, // and
    Or,  // or
    Not, // not

    // Assignment
    Assign,     // =
    Update,     // |=
    PlusAssign, // +=

    // Delimiters
    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]
    LBrace,   // {
    RBrace,   // }

    // Special
    Question,    // ?
    DoubleSlash, // //
    Recursive,   // ..

    // End
    EndOfInput,
    Error,
}

/// A single lexed token: kind, text, and source position.
///
/// For `String` tokens `text` holds the unescaped contents; for every other
/// kind it is the raw source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, line: usize, column: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            line,
            column,
        }
    }
}

/// Error surfaced when tokenization stops on an `Error` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    /// A character no rule recognizes.
    UnexpectedCharacter {
        /// The offending character
        ch: char,
        /// Line number (1-indexed)
        line: usize,
        /// Column number (1-indexed)
        column: usize,
    },

    /// A string literal with no closing quote before end of input.
    UnterminatedString {
        /// Line of the opening quote
        line: usize,
        /// Column of the opening quote
        column: usize,
    },
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::UnexpectedCharacter { ch, line, column } => {
                write!(
                    f,
                    "Unexpected character '{}' at line {}, column {}",
                    ch, line, column
                )
            }
            LexError::UnterminatedString { line, column } => {
                write!(f, "Unterminated string at line {}, column {}", line, column)
            }
        }
    }
}

impl std::error::Error for LexError {}

/// The filter lexer. Construct with [`Lexer::new`], then either pull tokens
/// one at a time with [`Lexer::next_token`] or collect the whole stream
/// with [`Lexer::tokenize`].
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn current(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.current() {
            self.pos += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.current(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn skip_comment(&mut self) {
        while !matches!(self.current(), Some('\n') | None) {
            self.advance();
        }
    }

    fn read_number(&mut self) -> Token {
        let start = self.pos;
        let start_line = self.line;
        let start_column = self.column;

        if self.current() == Some('-') {
            self.advance();
        }
        while matches!(self.current(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }
        if self.current() == Some('.') && matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
            while matches!(self.current(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
        }
        if matches!(self.current(), Some('e') | Some('E')) {
            self.advance();
            if matches!(self.current(), Some('+') | Some('-')) {
                self.advance();
            }
            while matches!(self.current(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
        }

        Token::new(
            TokenKind::Number,
            &self.input[start..self.pos],
            start_line,
            start_column,
        )
    }

    fn read_string(&mut self) -> Token {
        let start = self.pos;
        let start_line = self.line;
        let start_column = self.column;
        self.advance(); // skip opening quote

        let mut text = String::new();
        loop {
            match self.current() {
                None => {
                    // Unterminated: hand back the raw text from the opening
                    // quote so tokenize() can classify the error.
                    return Token::new(
                        TokenKind::Error,
                        &self.input[start..self.pos],
                        start_line,
                        start_column,
                    );
                }
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.current() {
                        None => {
                            return Token::new(
                                TokenKind::Error,
                                &self.input[start..self.pos],
                                start_line,
                                start_column,
                            );
                        }
                        Some('n') => text.push('\n'),
                        Some('t') => text.push('\t'),
                        Some('r') => text.push('\r'),
                        Some('b') => text.push('\u{0008}'),
                        Some('f') => text.push('\u{000c}'),
                        Some(c) => text.push(c), // covers \" \\ \/ and the rest
                    }
                    self.advance();
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
            }
        }

        Token::new(TokenKind::String, text, start_line, start_column)
    }

    fn read_identifier(&mut self) -> Token {
        let start = self.pos;
        let start_line = self.line;
        let start_column = self.column;

        while matches!(self.current(), Some(c) if c.is_ascii_alphanumeric() || c == '_' || c == '$')
        {
            self.advance();
        }

        let text = &self.input[start..self.pos];
        let kind = match text {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            _ => TokenKind::Identifier,
        };
        Token::new(kind, text, start_line, start_column)
    }

    /// Produce the next token.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        while self.current() == Some('#') {
            self.skip_comment();
            self.skip_whitespace();
        }

        let line = self.line;
        let column = self.column;
        let ch = match self.current() {
            None => return Token::new(TokenKind::EndOfInput, "", line, column),
            Some(c) => c,
        };

        if ch.is_ascii_digit()
            || (ch == '-' && matches!(self.peek(), Some(c) if c.is_ascii_digit()))
        {
            return self.read_number();
        }

        if ch == '"' {
            return self.read_string();
        }

        if ch.is_ascii_alphabetic() || ch == '_' || ch == '$' {
            return self.read_identifier();
        }

        // Two-character operators before their single-character prefixes.
        let two = |lexer: &mut Self, kind, text| {
            lexer.advance();
            lexer.advance();
            Token::new(kind, text, line, column)
        };
        match (ch, self.peek()) {
            ('=', Some('=')) => return two(self, TokenKind::Eq, "=="),
            ('!', Some('=')) => return two(self, TokenKind::Ne, "!="),
            ('<', Some('=')) => return two(self, TokenKind::Le, "<="),
            ('>', Some('=')) => return two(self, TokenKind::Ge, ">="),
            ('|', Some('=')) => return two(self, TokenKind::Update, "|="),
            ('+', Some('=')) => return two(self, TokenKind::PlusAssign, "+="),
            ('/', Some('/')) => return two(self, TokenKind::DoubleSlash, "//"),
            ('.', Some('.')) => return two(self, TokenKind::Recursive, ".."),
            _ => {}
        }

        self.advance();
        let kind = match ch {
            '.' => TokenKind::Dot,
            '|' => TokenKind::Pipe,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '=' => TokenKind::Assign,
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '?' => TokenKind::Question,
            _ => TokenKind::Error,
        };
        Token::new(kind, ch.to_string(), line, column)
    }

    /// Tokenize the whole input.
    ///
    /// The returned stream always ends with an `EndOfInput` token. If the
    /// lexer hits an unrecognized character or an unterminated string it
    /// stops and returns the corresponding [`LexError`] instead.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            match token.kind {
                TokenKind::EndOfInput => {
                    tokens.push(token);
                    return Ok(tokens);
                }
                TokenKind::Error => {
                    // Error tokens from read_string start with the opening
                    // quote; everything else is a stray character.
                    return Err(if token.text.starts_with('"') {
                        LexError::UnterminatedString {
                            line: token.line,
                            column: token.column,
                        }
                    } else {
                        LexError::UnexpectedCharacter {
                            ch: token.text.chars().next().unwrap_or('\0'),
                            line: token.line,
                            column: token.column,
                        }
                    });
                }
                _ => tokens.push(token),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokenize()
            .expect("tokenize failed")
            .iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_identity_and_fields() {
        assert_eq!(
            kinds(".foo"),
            [TokenKind::Dot, TokenKind::Identifier, TokenKind::EndOfInput]
        );
        assert_eq!(kinds("."), [TokenKind::Dot, TokenKind::EndOfInput]);
    }

    #[test]
    fn test_numbers() {
        let tokens = Lexer::new("3 -2.5 1e6 2E-3").tokenize().unwrap();
        let texts: Vec<&str> = tokens[..4].iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["3", "-2.5", "1e6", "2E-3"]);
        assert!(tokens[..4].iter().all(|t| t.kind == TokenKind::Number));
    }

    #[test]
    fn test_minus_before_non_digit() {
        assert_eq!(
            kinds("-."),
            [TokenKind::Minus, TokenKind::Dot, TokenKind::EndOfInput]
        );
    }

    #[test]
    fn test_string_escapes() {
        let tokens = Lexer::new(r#""a\nb\"c""#).tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text, "a\nb\"c");
    }

    #[test]
    fn test_unknown_escape_passes_through() {
        let tokens = Lexer::new(r#""a\qb""#).tokenize().unwrap();
        assert_eq!(tokens[0].text, "aqb");
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds("true false null and or not foo"),
            [
                TokenKind::True,
                TokenKind::False,
                TokenKind::Null,
                TokenKind::And,
                TokenKind::Or,
                TokenKind::Not,
                TokenKind::Identifier,
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_two_char_operators() {
        assert_eq!(
            kinds("== != <= >= |= += // .."),
            [
                TokenKind::Eq,
                TokenKind::Ne,
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::Update,
                TokenKind::PlusAssign,
                TokenKind::DoubleSlash,
                TokenKind::Recursive,
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_single_char_prefixes() {
        assert_eq!(
            kinds("= < > | + /"),
            [
                TokenKind::Assign,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::Pipe,
                TokenKind::Plus,
                TokenKind::Slash,
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            kinds(".a # trailing comment\n | .b"),
            [
                TokenKind::Dot,
                TokenKind::Identifier,
                TokenKind::Pipe,
                TokenKind::Dot,
                TokenKind::Identifier,
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_positions() {
        let tokens = Lexer::new(".a\n| .b").tokenize().unwrap();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[2].line, tokens[2].column), (2, 1));
        assert_eq!((tokens[3].line, tokens[3].column), (2, 3));
    }

    #[test]
    fn test_unexpected_character() {
        let err = Lexer::new(".a @").tokenize().unwrap_err();
        assert_eq!(
            err,
            LexError::UnexpectedCharacter {
                ch: '@',
                line: 1,
                column: 4
            }
        );
        assert_eq!(err.to_string(), "Unexpected character '@' at line 1, column 4");
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new(r#"."open"#).tokenize().unwrap_err();
        assert_eq!(err, LexError::UnterminatedString { line: 1, column: 2 });
        assert_eq!(err.to_string(), "Unterminated string at line 1, column 2");
    }

    #[test]
    fn test_dollar_identifiers() {
        let tokens = Lexer::new("$var").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].text, "$var");
    }
}

//! JSON text → [`Value`] reader for the input side of the engine.
//!
//! A small recursive-descent reader that builds the owned value tree the
//! executor runs against. Objects preserve key order as written; string
//! escapes (including `\uXXXX` with surrogate pairs) are decoded; numbers
//! accept the full JSON grammar including exponents. Line and column are
//! tracked for diagnostics.

use core::fmt;

use indexmap::IndexMap;

use crate::value::Value;

/// Error produced while reading JSON input text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonError {
    pub message: String,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl JsonError {
    fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        JsonError {
            message: message.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for JsonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at line {}, column {}",
            self.message, self.line, self.column
        )
    }
}

impl std::error::Error for JsonError {}

/// Parse a complete JSON document into a [`Value`].
///
/// Trailing non-whitespace after the top-level value is an error.
pub fn parse(text: &str) -> Result<Value, JsonError> {
    let mut reader = Reader::new(text);
    let value = reader.parse_value()?;
    reader.skip_ws();
    if !reader.is_eof() {
        return Err(reader.error("trailing data after JSON value"));
    }
    Ok(value)
}

struct Reader<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Reader<'a> {
    fn new(input: &'a str) -> Self {
        Reader {
            input,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn error(&self, message: impl Into<String>) -> JsonError {
        JsonError::new(message, self.line, self.column)
    }

    fn parse_value(&mut self) -> Result<Value, JsonError> {
        self.skip_ws();
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some('{') => self.parse_object(),
            Some('[') => self.parse_array(),
            Some('"') => self.parse_string().map(Value::String),
            Some('t') | Some('f') | Some('n') => self.parse_literal(),
            Some(c) if c == '-' || c.is_ascii_digit() => self.parse_number(),
            Some(c) => Err(self.error(format!("unexpected character '{}'", c))),
        }
    }

    fn parse_object(&mut self) -> Result<Value, JsonError> {
        self.advance(); // consume '{'
        self.skip_ws();
        let mut map = IndexMap::new();
        if self.peek() == Some('}') {
            self.advance();
            return Ok(Value::Object(map));
        }
        loop {
            self.skip_ws();
            if self.peek() != Some('"') {
                return Err(self.error("expected '\"' for object key"));
            }
            let key = self.parse_string()?;
            self.skip_ws();
            if self.peek() != Some(':') {
                return Err(self.error("expected ':' after object key"));
            }
            self.advance();
            let value = self.parse_value()?;
            map.insert(key, value);
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.advance();
                }
                Some('}') => {
                    self.advance();
                    break;
                }
                _ => return Err(self.error("expected ',' or '}' in object")),
            }
        }
        Ok(Value::Object(map))
    }

    fn parse_array(&mut self) -> Result<Value, JsonError> {
        self.advance(); // consume '['
        self.skip_ws();
        let mut items = Vec::new();
        if self.peek() == Some(']') {
            self.advance();
            return Ok(Value::Array(items));
        }
        loop {
            items.push(self.parse_value()?);
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.advance();
                }
                Some(']') => {
                    self.advance();
                    break;
                }
                _ => return Err(self.error("expected ',' or ']' in array")),
            }
        }
        Ok(Value::Array(items))
    }

    fn parse_string(&mut self) -> Result<String, JsonError> {
        let start_line = self.line;
        let start_column = self.column;
        self.advance(); // consume opening quote
        let mut collected = String::new();
        loop {
            match self.advance() {
                None => {
                    return Err(JsonError::new(
                        "unterminated string",
                        start_line,
                        start_column,
                    ));
                }
                Some('"') => break,
                Some('\\') => match self.advance() {
                    None => {
                        return Err(JsonError::new(
                            "unfinished escape in string",
                            start_line,
                            start_column,
                        ));
                    }
                    Some('"') => collected.push('"'),
                    Some('\\') => collected.push('\\'),
                    Some('/') => collected.push('/'),
                    Some('b') => collected.push('\u{0008}'),
                    Some('f') => collected.push('\u{000c}'),
                    Some('n') => collected.push('\n'),
                    Some('r') => collected.push('\r'),
                    Some('t') => collected.push('\t'),
                    Some('u') => {
                        let c = self.parse_unicode_escape()?;
                        collected.push(c);
                    }
                    Some(other) => collected.push(other),
                },
                Some(c) => collected.push(c),
            }
        }
        Ok(collected)
    }

    fn parse_hex4(&mut self) -> Result<u32, JsonError> {
        let mut code = 0u32;
        for _ in 0..4 {
            let c = self
                .advance()
                .ok_or_else(|| self.error("unfinished \\u escape"))?;
            let digit = c
                .to_digit(16)
                .ok_or_else(|| self.error(format!("invalid hex digit '{}' in \\u escape", c)))?;
            code = code * 16 + digit;
        }
        Ok(code)
    }

    fn parse_unicode_escape(&mut self) -> Result<char, JsonError> {
        let code = self.parse_hex4()?;
        // High surrogate: must be followed by \uXXXX with a low surrogate.
        if (0xD800..0xDC00).contains(&code) {
            if self.peek() == Some('\\') {
                self.advance();
                if self.advance() != Some('u') {
                    return Err(self.error("expected low surrogate after high surrogate"));
                }
                let low = self.parse_hex4()?;
                if !(0xDC00..0xE000).contains(&low) {
                    return Err(self.error("invalid low surrogate in \\u escape"));
                }
                let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                return char::from_u32(combined)
                    .ok_or_else(|| self.error("invalid \\u escape"));
            }
            return Err(self.error("unpaired high surrogate in \\u escape"));
        }
        char::from_u32(code).ok_or_else(|| self.error("invalid \\u escape"))
    }

    fn parse_number(&mut self) -> Result<Value, JsonError> {
        let start = self.pos;
        let start_line = self.line;
        let start_column = self.column;
        if self.peek() == Some('-') {
            self.advance();
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek() == Some('.') {
            self.advance();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            self.advance();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.advance();
            }
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
        }
        self.input[start..self.pos]
            .parse::<f64>()
            .map(Value::Number)
            .map_err(|_| JsonError::new("invalid number", start_line, start_column))
    }

    fn parse_literal(&mut self) -> Result<Value, JsonError> {
        let rest = &self.input[self.pos..];
        let (value, len) = if rest.starts_with("true") {
            (Value::Bool(true), 4)
        } else if rest.starts_with("false") {
            (Value::Bool(false), 5)
        } else if rest.starts_with("null") {
            (Value::Null, 4)
        } else {
            return Err(self.error("invalid literal"));
        };
        for _ in 0..len {
            self.advance();
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars() {
        assert_eq!(parse("null").unwrap(), Value::Null);
        assert_eq!(parse("true").unwrap(), Value::Bool(true));
        assert_eq!(parse("false").unwrap(), Value::Bool(false));
        assert_eq!(parse("42").unwrap(), Value::Number(42.0));
        assert_eq!(parse("-2.5").unwrap(), Value::Number(-2.5));
        assert_eq!(parse("1e3").unwrap(), Value::Number(1000.0));
        assert_eq!(parse("\"hi\"").unwrap(), Value::string("hi"));
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(parse(r#""a\nb""#).unwrap(), Value::string("a\nb"));
        assert_eq!(parse(r#""q\"q""#).unwrap(), Value::string("q\"q"));
        assert_eq!(parse(r#""\u0041""#).unwrap(), Value::string("A"));
        // Surrogate pair: U+1F600
        assert_eq!(
            parse(r#""\ud83d\ude00""#).unwrap(),
            Value::string("\u{1F600}")
        );
    }

    #[test]
    fn test_array_and_object_order() {
        assert_eq!(
            parse("[1, 2, 3]").unwrap(),
            Value::from(vec![1i64, 2, 3])
        );
        let v = parse(r#"{"b": 2, "a": 1}"#).unwrap();
        let keys: Vec<&str> = v.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, ["b", "a"]);
    }

    #[test]
    fn test_nested() {
        let v = parse(r#"{"users": [{"name": "Alice"}, {"name": "Bob"}]}"#).unwrap();
        let users = v.get_field("users").unwrap();
        assert_eq!(users.length(), 2);
        assert_eq!(
            users.get_index(1).unwrap().get_field("name"),
            Some(&Value::string("Bob"))
        );
    }

    #[test]
    fn test_whitespace() {
        assert_eq!(
            parse(" \n\t{ \"a\" : [ ] } ").unwrap(),
            Value::object_from([("a".to_string(), Value::array())])
        );
    }

    #[test]
    fn test_errors() {
        let err = parse("").unwrap_err();
        assert_eq!(err.message, "unexpected end of input");

        let err = parse("{\"a\" 1}").unwrap_err();
        assert_eq!(err.message, "expected ':' after object key");

        let err = parse("[1 2]").unwrap_err();
        assert_eq!(err.message, "expected ',' or ']' in array");

        let err = parse("\"open").unwrap_err();
        assert_eq!(err.message, "unterminated string");

        let err = parse("nul").unwrap_err();
        assert_eq!(err.message, "invalid literal");

        let err = parse("1 2").unwrap_err();
        assert_eq!(err.message, "trailing data after JSON value");

        let err = parse("@").unwrap_err();
        assert_eq!(err.message, "unexpected character '@'");
    }

    #[test]
    fn test_error_position() {
        let err = parse("{\n  \"a\": @\n}").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 8);
    }

    #[test]
    fn test_duplicate_key_keeps_first_position() {
        let v = parse(r#"{"a": 1, "b": 2, "a": 3}"#).unwrap();
        let obj = v.as_object().unwrap();
        let keys: Vec<&str> = obj.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(obj["a"], Value::Number(3.0));
    }
}

//! Crate-level error type.
//!
//! Each pipeline stage has its own error; [`Error`] wraps them so the
//! engine facade can surface a single message naming the failing stage.
//! Errors are never caught inside the engine: the first failing stage
//! returns its error straight up through the facade.

use core::fmt;

use crate::builtins::RuntimeError;
use crate::compiler::CompileError;
use crate::json::JsonError;
use crate::lexer::LexError;
use crate::parser::ParseError;

/// Any failure from the engine facade.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Tokenization failed.
    Lex(LexError),
    /// The token stream did not parse.
    Parse(ParseError),
    /// The AST contains constructs outside the executable subset, or the
    /// lowered program failed validation.
    Compile(CompileError),
    /// The JSON input text did not parse.
    Input(JsonError),
    /// A builtin failed or was not registered.
    Runtime(RuntimeError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Lex(err) => err.fmt(f),
            Error::Parse(err) => err.fmt(f),
            Error::Compile(err) => err.fmt(f),
            Error::Input(err) => write!(f, "Invalid JSON input: {}", err),
            Error::Runtime(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Lex(err) => Some(err),
            Error::Parse(err) => Some(err),
            Error::Compile(err) => Some(err),
            Error::Input(err) => Some(err),
            Error::Runtime(err) => Some(err),
        }
    }
}

impl From<LexError> for Error {
    fn from(err: LexError) -> Self {
        Error::Lex(err)
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::Parse(err)
    }
}

impl From<CompileError> for Error {
    fn from(err: CompileError) -> Self {
        Error::Compile(err)
    }
}

impl From<JsonError> for Error {
    fn from(err: JsonError) -> Self {
        Error::Input(err)
    }
}

impl From<RuntimeError> for Error {
    fn from(err: RuntimeError) -> Self {
        Error::Runtime(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_prefix() {
        let err = Error::Input(crate::json::parse("nope").unwrap_err());
        assert_eq!(
            err.to_string(),
            "Invalid JSON input: invalid literal at line 1, column 1"
        );
    }

    #[test]
    fn test_compile_error_passthrough() {
        let err = Error::Compile(CompileError::UnsupportedBinaryOp);
        assert_eq!(err.to_string(), "Unsupported binary op");
    }
}

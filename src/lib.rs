//! # Sifter
//!
//! A bytecode-compiled jq-style JSON query engine.
//!
//! Sifter takes a textual filter expression and a JSON input and produces a
//! stream of JSON outputs. Filters run through a staged pipeline (lexer,
//! parser, compiler, and a constant-pooled bytecode executor, with a
//! process-wide builtin registry alongside), and a compiled [`Program`] can
//! be retained and re-executed against any number of inputs.
//!
//! ## Supported filter surface
//!
//! | Expression | Meaning |
//! |------------|---------|
//! | `.` | Identity (return the whole document) |
//! | `.foo` | Access field "foo" of an object |
//! | `.foo.bar` | Chained field access |
//! | `.[0]` | Access an array element by literal index |
//! | `.["key"]` | Access an object field by literal string |
//! | `.[]` | Iterate all elements of an array |
//! | `.a \| .b` | Pipe the output of one filter into another |
//! | `.a + 5` | Add a number literal to the current value |
//! | `keys`, `length`, … | Call a builtin by its bare name |
//!
//! The parser accepts a larger grammar (comparisons, comma, alternatives,
//! constructors, slices, `..`); everything outside the table compiles to a
//! precise "unsupported" error rather than silently misbehaving.
//!
//! ## Quick Start
//!
//! ```
//! use sifter::{run, run_streaming};
//!
//! let doc = r#"{"users": [{"name": "Alice"}, {"name": "Bob"}]}"#;
//!
//! // First output only
//! assert_eq!(run(".users[0].name", doc).unwrap(), "\"Alice\"");
//!
//! // Full output stream
//! let outputs = run_streaming(".users | length", doc).unwrap();
//! assert_eq!(outputs, ["2"]);
//! ```
//!
//! Custom builtins plug into the same registry the standard set lives in:
//!
//! ```
//! use sifter::{register_builtin, run, Value};
//!
//! register_builtin("first", |input, outputs| {
//!     if let Value::Array(items) = input {
//!         outputs.extend(items.first().cloned());
//!     }
//!     Ok(())
//! });
//! assert_eq!(run("first", "[10, 20]").unwrap(), "10");
//! ```

pub mod builtins;
pub mod bytecode;
pub mod compiler;
pub mod engine;
pub mod error;
pub mod executor;
pub mod json;
pub mod lexer;
pub mod parser;
pub mod value;

pub use builtins::{BuiltinFn, RuntimeError};
pub use bytecode::{ConstantPool, Instruction, OpCode, Program, ValidateError};
pub use compiler::CompileError;
pub use engine::{compile, register_builtin, run, run_streaming};
pub use error::Error;
pub use json::JsonError;
pub use lexer::{LexError, Lexer, Token, TokenKind};
pub use parser::{Ast, BinOp, ParseError, UnOp};
pub use value::Value;

//! The engine facade: filter text in, JSON text out.
//!
//! Ties the pipeline together. [`compile`] runs lex → parse → lower →
//! validate and hands back a reusable [`Program`]; [`run_streaming`]
//! additionally parses the JSON input, executes, and serializes every
//! output; [`run`] is the single-output convenience over the same path.
//!
//! Streaming is the canonical form: a filter like `.[]` emits one output
//! per array element, and `run` truncates that stream to its first entry.

use crate::builtins::{self, RuntimeError};
use crate::bytecode::Program;
use crate::compiler;
use crate::error::Error;
use crate::executor;
use crate::json;
use crate::lexer::Lexer;
use crate::parser;
use crate::value::Value;

/// Compile a filter string to a validated [`Program`].
///
/// Succeeds iff lexing, parsing, lowering, and validation all succeed; the
/// error names the failing stage.
pub fn compile(filter: &str) -> Result<Program, Error> {
    let tokens = Lexer::new(filter).tokenize()?;
    let ast = parser::parse(tokens)?;
    let program = compiler::compile(&ast)?;
    Ok(program)
}

/// Run a filter against a JSON document, returning every output in order,
/// each serialized as compact JSON text.
pub fn run_streaming(filter: &str, json_in: &str) -> Result<Vec<String>, Error> {
    let program = compile(filter)?;
    let input = json::parse(json_in)?;
    let outputs = executor::execute(&program, &input)?;
    Ok(outputs.iter().map(Value::to_json).collect())
}

/// Run a filter against a JSON document, returning the first output as
/// JSON text, or the literal `null` when the stream is empty.
pub fn run(filter: &str, json_in: &str) -> Result<String, Error> {
    let outputs = run_streaming(filter, json_in)?;
    Ok(outputs
        .into_iter()
        .next()
        .unwrap_or_else(|| "null".to_string()))
}

/// Install or replace a builtin under the given name.
///
/// Register custom builtins during initialization, before issuing
/// concurrent executions; the registry is process-wide.
pub fn register_builtin<F>(name: impl Into<String>, f: F)
where
    F: Fn(&Value, &mut Vec<Value>) -> Result<(), RuntimeError> + Send + Sync + 'static,
{
    builtins::register(name, f);
}

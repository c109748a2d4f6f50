//! The bytecode executor.
//!
//! Runs a validated [`Program`] against one input value and collects the
//! output stream. Execution holds exactly one "current value" register,
//! walks the instruction sequence linearly from index 0, and appends the
//! current value to the output on reaching the end. `Iterate` ends the walk
//! early after streaming its own outputs; `BuiltinCall` may contribute
//! several.
//!
//! Missing fields, absent keys, out-of-range indices, and wrong receiver
//! types all coerce to null rather than failing; the only runtime failures
//! are builtin failures and unknown builtin names. A failure discards any
//! outputs accumulated so far.

use crate::builtins::{self, RuntimeError};
use crate::bytecode::{OpCode, Program};
use crate::value::Value;

/// Execute `program` against `input`, returning the output stream in
/// emission order.
///
/// The program is revalidated on entry so that pool operands are in
/// bounds even for hand-assembled programs; the validation failure is
/// surfaced as a runtime error.
pub fn execute(program: &Program, input: &Value) -> Result<Vec<Value>, RuntimeError> {
    program
        .validate()
        .map_err(|err| RuntimeError::new(err.to_string()))?;

    let mut outputs = Vec::new();
    let mut current = input.clone();

    for ins in &program.code {
        match ins.op {
            OpCode::Nop => {}

            OpCode::LoadIdentity => {}

            OpCode::GetField | OpCode::GetIndexStr => {
                let key = &program.pool.strings[ins.a as usize];
                current = current.get_field(key).cloned().unwrap_or(Value::Null);
            }

            OpCode::GetIndexNum => {
                let index = program.pool.numbers[ins.a as usize].floor();
                current = if index >= 0.0 {
                    current
                        .get_index(index as usize)
                        .cloned()
                        .unwrap_or(Value::Null)
                } else {
                    Value::Null
                };
            }

            OpCode::Iterate => {
                // Arrays stream their elements; everything else passes
                // through as a single output. Either way the walk ends here
                // with no trailing emit.
                match current {
                    Value::Array(items) => outputs.extend(items),
                    other => outputs.push(other),
                }
                return Ok(outputs);
            }

            OpCode::AddConst => {
                let k = program.pool.numbers[ins.a as usize];
                current = match current {
                    Value::Number(n) => Value::Number(n + k),
                    _ => Value::Null,
                };
            }

            OpCode::Length => {
                current = Value::Number(current.length() as f64);
            }

            OpCode::BuiltinCall => {
                let name = &program.pool.strings[ins.a as usize];
                let mut builtin_outputs = Vec::new();
                builtins::call(name, &current, &mut builtin_outputs)?;
                // First output becomes the new current value; the rest go
                // straight to the output stream.
                let mut rest = builtin_outputs.into_iter();
                match rest.next() {
                    Some(first) => {
                        current = first;
                        outputs.extend(rest);
                    }
                    None => current = Value::Null,
                }
            }
        }
    }

    outputs.push(current);
    Ok(outputs)
}

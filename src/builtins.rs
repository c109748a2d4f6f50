//! The builtin registry and the standard builtins.
//!
//! A process-wide map from name to function, lazily initialized with the
//! standard set on first touch. Builtins receive the executor's current
//! value and append zero or more outputs; succeeding with an empty buffer
//! is legal (`empty` does exactly that) and failing attaches a
//! human-readable message.
//!
//! Callers should register custom builtins during initialization, before
//! issuing concurrent executions; registration replaces any prior entry
//! under the same name.

use core::fmt;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use crate::value::Value;

/// Error raised by a builtin (or by looking up a name no builtin has).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    pub message: String,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>) -> Self {
        RuntimeError {
            message: message.into(),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RuntimeError {}

/// A registered builtin: reads the current value, appends outputs.
pub type BuiltinFn =
    Arc<dyn Fn(&Value, &mut Vec<Value>) -> Result<(), RuntimeError> + Send + Sync>;

static REGISTRY: OnceLock<RwLock<HashMap<String, BuiltinFn>>> = OnceLock::new();

fn registry() -> &'static RwLock<HashMap<String, BuiltinFn>> {
    REGISTRY.get_or_init(|| RwLock::new(standard_builtins()))
}

fn standard_builtins() -> HashMap<String, BuiltinFn> {
    type Entry = (
        &'static str,
        fn(&Value, &mut Vec<Value>) -> Result<(), RuntimeError>,
    );
    let entries: [Entry; 8] = [
        ("keys", keys),
        ("values", values),
        ("type", type_of),
        ("length", length),
        ("empty", empty),
        ("reverse", reverse),
        ("sort", sort),
        ("to_entries", to_entries),
    ];
    entries
        .into_iter()
        .map(|(name, f)| (name.to_string(), Arc::new(f) as BuiltinFn))
        .collect()
}

/// Install or replace a builtin under the given name.
pub fn register<F>(name: impl Into<String>, f: F)
where
    F: Fn(&Value, &mut Vec<Value>) -> Result<(), RuntimeError> + Send + Sync + 'static,
{
    let mut map = registry()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    map.insert(name.into(), Arc::new(f));
}

/// Whether a builtin is registered under the given name.
pub fn has_builtin(name: &str) -> bool {
    registry()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .contains_key(name)
}

/// Look up a builtin, cloning its handle so the call happens outside the
/// registry lock.
pub fn lookup(name: &str) -> Option<BuiltinFn> {
    registry()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .get(name)
        .cloned()
}

/// Invoke the named builtin on `input`, appending its outputs.
pub fn call(name: &str, input: &Value, outputs: &mut Vec<Value>) -> Result<(), RuntimeError> {
    let f = lookup(name).ok_or_else(|| RuntimeError::new(format!("Unknown builtin: {}", name)))?;
    f(input, outputs)
}

// ================= Standard builtins =================

/// `keys`: object keys or array indices, as a single array output.
fn keys(input: &Value, outputs: &mut Vec<Value>) -> Result<(), RuntimeError> {
    match input {
        Value::Object(map) => {
            let items = map.keys().map(|k| Value::string(k.clone())).collect();
            outputs.push(Value::Array(items));
            Ok(())
        }
        Value::Array(items) => {
            let indices = (0..items.len()).map(|i| Value::Number(i as f64)).collect();
            outputs.push(Value::Array(indices));
            Ok(())
        }
        _ => Err(RuntimeError::new("keys: input must be object or array")),
    }
}

/// `values`: each object value or array element as a separate output.
fn values(input: &Value, outputs: &mut Vec<Value>) -> Result<(), RuntimeError> {
    match input {
        Value::Object(map) => {
            outputs.extend(map.values().cloned());
            Ok(())
        }
        Value::Array(items) => {
            outputs.extend(items.iter().cloned());
            Ok(())
        }
        _ => Err(RuntimeError::new("values: input must be object or array")),
    }
}

/// `type`: the type name as a single string output.
fn type_of(input: &Value, outputs: &mut Vec<Value>) -> Result<(), RuntimeError> {
    outputs.push(Value::string(input.type_name()));
    Ok(())
}

/// `length`: see [`Value::length`]; never fails.
fn length(input: &Value, outputs: &mut Vec<Value>) -> Result<(), RuntimeError> {
    outputs.push(Value::Number(input.length() as f64));
    Ok(())
}

/// `empty`: no outputs, succeeds.
fn empty(_input: &Value, _outputs: &mut Vec<Value>) -> Result<(), RuntimeError> {
    Ok(())
}

/// `reverse`: reversed string or array.
fn reverse(input: &Value, outputs: &mut Vec<Value>) -> Result<(), RuntimeError> {
    match input {
        Value::String(s) => {
            outputs.push(Value::String(s.chars().rev().collect()));
            Ok(())
        }
        Value::Array(items) => {
            outputs.push(Value::Array(items.iter().rev().cloned().collect()));
            Ok(())
        }
        _ => Err(RuntimeError::new("reverse: input must be string or array")),
    }
}

/// `sort`: the array sorted by [`Value::total_cmp`].
fn sort(input: &Value, outputs: &mut Vec<Value>) -> Result<(), RuntimeError> {
    match input {
        Value::Array(items) => {
            let mut sorted = items.clone();
            sorted.sort_by(|a, b| a.total_cmp(b));
            outputs.push(Value::Array(sorted));
            Ok(())
        }
        _ => Err(RuntimeError::new("sort: input must be array")),
    }
}

/// `to_entries`: `{"key": k, "value": v}` objects in iteration order.
fn to_entries(input: &Value, outputs: &mut Vec<Value>) -> Result<(), RuntimeError> {
    match input {
        Value::Object(map) => {
            let entries = map
                .iter()
                .map(|(k, v)| {
                    Value::object_from([
                        ("key".to_string(), Value::string(k.clone())),
                        ("value".to_string(), v.clone()),
                    ])
                })
                .collect();
            outputs.push(Value::Array(entries));
            Ok(())
        }
        _ => Err(RuntimeError::new("to_entries: input must be object")),
    }
}

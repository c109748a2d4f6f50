//! Lowering from AST to bytecode.
//!
//! The parser accepts the full surface grammar; this stage decides the
//! executable subset: identity, field access, iteration, indexing with a
//! literal number or string, pipe, `+ <number literal>` (lowered to
//! `AddConst`), and zero-argument builtin calls. Every other node is
//! rejected with a precise error at the first unsupported position.

use core::fmt;

use crate::bytecode::{Instruction, OpCode, Program, ValidateError};
use crate::parser::{Ast, BinOp};
use crate::value::Value;

/// Error that occurs while lowering an AST to a [`Program`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// An index expression that is not a number or string literal.
    UnsupportedIndex,
    /// A binary operation other than `+ <number literal>`.
    UnsupportedBinaryOp,
    /// A node kind with no lowering in this revision.
    UnsupportedNode { kind: &'static str },
    /// Post-lowering validation failed.
    Validate(ValidateError),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::UnsupportedIndex => f.write_str("Unsupported index expression"),
            CompileError::UnsupportedBinaryOp => f.write_str("Unsupported binary op"),
            CompileError::UnsupportedNode { kind } => {
                write!(f, "Unsupported AST node type: {}", kind)
            }
            CompileError::Validate(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<ValidateError> for CompileError {
    fn from(err: ValidateError) -> Self {
        CompileError::Validate(err)
    }
}

/// Lower an AST to a validated [`Program`].
pub fn compile(ast: &Ast) -> Result<Program, CompileError> {
    let mut program = Program::default();
    emit_node(ast, &mut program)?;
    program.validate()?;
    Ok(program)
}

fn emit_node(node: &Ast, prog: &mut Program) -> Result<(), CompileError> {
    match node {
        Ast::Identity => {
            prog.code.push(Instruction::new(OpCode::LoadIdentity));
            Ok(())
        }
        Ast::Field(name) => {
            let sid = prog.pool.add_string(name.clone());
            prog.code.push(Instruction::with_operand(OpCode::GetField, sid));
            Ok(())
        }
        Ast::Iterator => {
            prog.code.push(Instruction::new(OpCode::Iterate));
            Ok(())
        }
        Ast::Index(child) => match child.as_ref() {
            Ast::Literal(Value::Number(n)) => {
                let nid = prog.pool.add_number(*n);
                prog.code
                    .push(Instruction::with_operand(OpCode::GetIndexNum, nid));
                Ok(())
            }
            Ast::Literal(Value::String(s)) => {
                let sid = prog.pool.add_string(s.clone());
                prog.code
                    .push(Instruction::with_operand(OpCode::GetIndexStr, sid));
                Ok(())
            }
            _ => Err(CompileError::UnsupportedIndex),
        },
        Ast::Pipe(left, right) => {
            emit_node(left, prog)?;
            emit_node(right, prog)
        }
        Ast::BinaryOp { op, left, right } => {
            // Only `<expr> + <number literal>` lowers, as AddConst.
            if *op == BinOp::Add {
                if let Ast::Literal(Value::Number(k)) = right.as_ref() {
                    emit_node(left, prog)?;
                    let nid = prog.pool.add_number(*k);
                    prog.code
                        .push(Instruction::with_operand(OpCode::AddConst, nid));
                    return Ok(());
                }
            }
            Err(CompileError::UnsupportedBinaryOp)
        }
        Ast::FunctionCall { name, args } => {
            if !args.is_empty() {
                return Err(CompileError::UnsupportedNode {
                    kind: "function call with arguments",
                });
            }
            let sid = prog.pool.add_string(name.clone());
            prog.code
                .push(Instruction::with_operand(OpCode::BuiltinCall, sid));
            Ok(())
        }
        Ast::Literal(_) => Err(CompileError::UnsupportedNode { kind: "literal" }),
        Ast::Slice { .. } => Err(CompileError::UnsupportedNode { kind: "slice" }),
        Ast::RecursiveDescent => Err(CompileError::UnsupportedNode {
            kind: "recursive descent",
        }),
        Ast::Comma(_) => Err(CompileError::UnsupportedNode { kind: "comma" }),
        Ast::UnaryOp { .. } => Err(CompileError::UnsupportedNode { kind: "unary op" }),
        Ast::Alternative(_, _) => Err(CompileError::UnsupportedNode {
            kind: "alternative",
        }),
        Ast::ArrayConstruct(_) => Err(CompileError::UnsupportedNode {
            kind: "array constructor",
        }),
        Ast::ObjectConstruct(_) => Err(CompileError::UnsupportedNode {
            kind: "object constructor",
        }),
        Ast::Conditional { .. } => Err(CompileError::UnsupportedNode {
            kind: "conditional",
        }),
    }
}

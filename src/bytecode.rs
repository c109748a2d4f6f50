//! Bytecode representation of compiled filters.
//!
//! A [`Program`] is a linear instruction sequence plus a constant pool.
//! String and number constants live in two parallel tables indexed by the
//! instruction's `a` operand; [`Program::validate`] checks every pool
//! operand before a program may execute. The `Display` impl renders a full
//! disassembly listing for debugging.

use core::fmt;

/// Canonical opcodes (subset). Extend as needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
pub enum OpCode {
    /// No effect.
    Nop = 0,
    /// Leave the current value unchanged.
    LoadIdentity,
    /// Replace the current value with the named object field, or null.
    GetField,
    /// Replace the current value with the array element at a pooled
    /// numeric index, or null.
    GetIndexNum,
    /// Same as `GetField`; emitted when the index expression was a string
    /// literal.
    GetIndexStr,
    /// Stream array elements into the output and stop the linear walk.
    Iterate,
    /// Add a pooled number to the current value, or null it out.
    AddConst,
    /// Replace the current value with its length.
    Length,
    /// Invoke a registered builtin on the current value.
    BuiltinCall,
}

/// One bytecode instruction: an opcode and up to two signed operands.
///
/// `a` is the pool index for opcodes that take one; `b` is reserved.
/// Unused operands are `-1`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instruction {
    pub op: OpCode,
    pub a: i32,
    pub b: i32,
}

impl Instruction {
    /// An instruction with no operands.
    pub fn new(op: OpCode) -> Self {
        Instruction { op, a: -1, b: -1 }
    }

    /// An instruction with a single pool operand.
    pub fn with_operand(op: OpCode, a: i32) -> Self {
        Instruction { op, a, b: -1 }
    }
}

/// Constant pool: parallel string and number tables.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstantPool {
    pub strings: Vec<String>,
    pub numbers: Vec<f64>,
}

impl ConstantPool {
    /// Append a string constant, returning its index.
    pub fn add_string(&mut self, s: impl Into<String>) -> i32 {
        self.strings.push(s.into());
        (self.strings.len() - 1) as i32
    }

    /// Append a number constant, returning its index.
    pub fn add_number(&mut self, n: f64) -> i32 {
        self.numbers.push(n);
        (self.numbers.len() - 1) as i32
    }

    fn string(&self, index: i32) -> Option<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.strings.get(i))
            .map(|s| s.as_str())
    }

    fn number(&self, index: i32) -> Option<f64> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.numbers.get(i))
            .copied()
    }
}

/// Validation failure: a pool operand outside its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidateError {
    /// A string-table operand out of bounds at the given program counter.
    StringPool { pc: usize },
    /// A number-table operand out of bounds at the given program counter.
    NumberPool { pc: usize },
}

impl fmt::Display for ValidateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidateError::StringPool { pc } => {
                write!(f, "Invalid string pool index in instruction at pc={}", pc)
            }
            ValidateError::NumberPool { pc } => {
                write!(f, "Invalid number pool index in instruction at pc={}", pc)
            }
        }
    }
}

impl std::error::Error for ValidateError {}

/// A compiled filter: instruction sequence plus constant pool.
///
/// Programs are immutable once compiled and may be re-executed against any
/// number of inputs.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Program {
    pub code: Vec<Instruction>,
    pub pool: ConstantPool,
}

impl Program {
    /// Check that every pool operand lies within its table.
    ///
    /// String-operand opcodes: `GetField`, `GetIndexStr`, `BuiltinCall`.
    /// Number-operand opcodes: `GetIndexNum`, `AddConst`.
    pub fn validate(&self) -> Result<(), ValidateError> {
        for (pc, ins) in self.code.iter().enumerate() {
            match ins.op {
                OpCode::GetField | OpCode::GetIndexStr | OpCode::BuiltinCall => {
                    if self.pool.string(ins.a).is_none() {
                        return Err(ValidateError::StringPool { pc });
                    }
                }
                OpCode::GetIndexNum | OpCode::AddConst => {
                    if self.pool.number(ins.a).is_none() {
                        return Err(ValidateError::NumberPool { pc });
                    }
                }
                OpCode::Nop | OpCode::LoadIdentity | OpCode::Iterate | OpCode::Length => {}
            }
        }
        Ok(())
    }

    /// Render a single instruction with its pool constant resolved.
    pub fn instruction_to_string(&self, ins: &Instruction) -> String {
        match ins.op {
            OpCode::Nop => "NOP".to_string(),
            OpCode::LoadIdentity => "LOAD_IDENTITY".to_string(),
            OpCode::GetField => match self.pool.string(ins.a) {
                Some(s) => format!("GET_FIELD \"{}\"", s),
                None => "GET_FIELD".to_string(),
            },
            OpCode::GetIndexNum => match self.pool.number(ins.a) {
                Some(n) => format!("GET_INDEX_NUM {}", n),
                None => "GET_INDEX_NUM".to_string(),
            },
            OpCode::GetIndexStr => match self.pool.string(ins.a) {
                Some(s) => format!("GET_INDEX_STR \"{}\"", s),
                None => "GET_INDEX_STR".to_string(),
            },
            OpCode::Iterate => "ITERATE".to_string(),
            OpCode::AddConst => match self.pool.number(ins.a) {
                Some(n) => format!("ADD_CONST {}", n),
                None => "ADD_CONST".to_string(),
            },
            OpCode::Length => "LENGTH".to_string(),
            OpCode::BuiltinCall => match self.pool.string(ins.a) {
                Some(s) => format!("BUILTIN_CALL \"{}\"", s),
                None => "BUILTIN_CALL".to_string(),
            },
        }
    }
}

/// Disassembly listing: constant pool then numbered instructions.
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Program Disassembly ===")?;
        writeln!(f, "Constant Pool:")?;
        writeln!(f, "  Strings:")?;
        for (i, s) in self.pool.strings.iter().enumerate() {
            writeln!(f, "    [{}] \"{}\"", i, s)?;
        }
        writeln!(f, "  Numbers:")?;
        for (i, n) in self.pool.numbers.iter().enumerate() {
            writeln!(f, "    [{}] {}", i, n)?;
        }
        writeln!(f, "Instructions:")?;
        for (pc, ins) in self.code.iter().enumerate() {
            writeln!(f, "  [{}] {}", pc, self.instruction_to_string(ins))?;
        }
        Ok(())
    }
}

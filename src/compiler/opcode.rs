use thiserror::Error;

use super::{Chunk, ConstRef, IncompleteChunk};
use crate::lexer::Span;
use crate::string::StringHeap;
use std::fmt::Write;

const WRITE_FMT_MSG: &'static str =
    "Encountered an error while attempting to write format string to buffer.";

#[derive(Debug, Error, Clone)]
pub enum DecodeError {
    #[error("Encountered invalid opcode {value}.")]
    InvalidOpcode { value: u8 },
    #[error("Incomplete operand for opcode {opcode:?}.")]
    IncompleteOperand { opcode: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Opcode {
    Return,
    Const(ConstRef),
    Nil,
    True,
    False,
    Pop,
    GetGlobal(ConstRef),
    DefineGlobal(ConstRef),
    SetGlobal(ConstRef),
    Equal,
    Greater,
    Less,
    Add,
    Subtract,
    Multiply,
    Divide,
    Negate,
    Not,
    Print,
}

impl Opcode {
    // Opcode table
    pub const C_RETURN: u8 = 0x01;
    pub const C_CONST: u8 = 0x02;
    pub const C_NIL: u8 = 0x03;
    pub const C_TRUE: u8 = 0x04;
    pub const C_FALSE: u8 = 0x05;
    pub const C_POP: u8 = 0x06;
    pub const C_GET_GLOBAL: u8 = 0x07;
    pub const C_DEFINE_GLOBAL: u8 = 0x08;
    pub const C_SET_GLOBAL: u8 = 0x09;
    pub const C_EQUAL: u8 = 0x0A;
    pub const C_GREATER: u8 = 0x0B;
    pub const C_LESS: u8 = 0x0C;
    pub const C_ADD: u8 = 0x0D;
    pub const C_SUBTRACT: u8 = 0x0E;
    pub const C_MULTIPLY: u8 = 0x0F;
    pub const C_DIVIDE: u8 = 0x10;
    pub const C_NEGATE: u8 = 0x11;
    pub const C_NOT: u8 = 0x12;
    pub const C_PRINT: u8 = 0x13;

    /// Decodes the instruction starting at `index`. Returns the opcode and
    /// the offset of the next instruction, or `None` at the end of the code.
    pub fn decode_at(data: &[u8], index: usize) -> Result<Option<(Opcode, usize)>, DecodeError> {
        let Some(first) = data.get(index) else {
            return Ok(None);
        };

        let parse_u8 = |code: u8| -> Result<u8, DecodeError> {
            data.get(index + 1)
                .copied()
                .ok_or(DecodeError::IncompleteOperand { opcode: code })
        };

        let (opcode, rest) = match *first {
            Opcode::C_CONST => {
                let handle = parse_u8(Opcode::C_CONST)?;
                (Opcode::Const(ConstRef(handle)), index + 2)
            }
            Opcode::C_GET_GLOBAL => {
                let handle = parse_u8(Opcode::C_GET_GLOBAL)?;
                (Opcode::GetGlobal(ConstRef(handle)), index + 2)
            }
            Opcode::C_DEFINE_GLOBAL => {
                let handle = parse_u8(Opcode::C_DEFINE_GLOBAL)?;
                (Opcode::DefineGlobal(ConstRef(handle)), index + 2)
            }
            Opcode::C_SET_GLOBAL => {
                let handle = parse_u8(Opcode::C_SET_GLOBAL)?;
                (Opcode::SetGlobal(ConstRef(handle)), index + 2)
            }
            Opcode::C_RETURN => (Opcode::Return, index + 1),
            Opcode::C_NIL => (Opcode::Nil, index + 1),
            Opcode::C_TRUE => (Opcode::True, index + 1),
            Opcode::C_FALSE => (Opcode::False, index + 1),
            Opcode::C_POP => (Opcode::Pop, index + 1),
            Opcode::C_EQUAL => (Opcode::Equal, index + 1),
            Opcode::C_GREATER => (Opcode::Greater, index + 1),
            Opcode::C_LESS => (Opcode::Less, index + 1),
            Opcode::C_ADD => (Opcode::Add, index + 1),
            Opcode::C_SUBTRACT => (Opcode::Subtract, index + 1),
            Opcode::C_MULTIPLY => (Opcode::Multiply, index + 1),
            Opcode::C_DIVIDE => (Opcode::Divide, index + 1),
            Opcode::C_NEGATE => (Opcode::Negate, index + 1),
            Opcode::C_NOT => (Opcode::Not, index + 1),
            Opcode::C_PRINT => (Opcode::Print, index + 1),
            opcode => {
                return Err(DecodeError::InvalidOpcode { value: opcode });
            }
        };
        Ok(Some((opcode, rest)))
    }

    pub fn encode(&self, chunk: &mut IncompleteChunk, span: Span) {
        match self {
            Opcode::Const(handle) => {
                chunk.push_byte(Opcode::C_CONST, span);
                chunk.push_byte(handle.0, span);
            }
            Opcode::GetGlobal(handle) => {
                chunk.push_byte(Opcode::C_GET_GLOBAL, span);
                chunk.push_byte(handle.0, span);
            }
            Opcode::DefineGlobal(handle) => {
                chunk.push_byte(Opcode::C_DEFINE_GLOBAL, span);
                chunk.push_byte(handle.0, span);
            }
            Opcode::SetGlobal(handle) => {
                chunk.push_byte(Opcode::C_SET_GLOBAL, span);
                chunk.push_byte(handle.0, span);
            }
            Opcode::Return => chunk.push_byte(Opcode::C_RETURN, span),
            Opcode::Nil => chunk.push_byte(Opcode::C_NIL, span),
            Opcode::True => chunk.push_byte(Opcode::C_TRUE, span),
            Opcode::False => chunk.push_byte(Opcode::C_FALSE, span),
            Opcode::Pop => chunk.push_byte(Opcode::C_POP, span),
            Opcode::Equal => chunk.push_byte(Opcode::C_EQUAL, span),
            Opcode::Greater => chunk.push_byte(Opcode::C_GREATER, span),
            Opcode::Less => chunk.push_byte(Opcode::C_LESS, span),
            Opcode::Add => chunk.push_byte(Opcode::C_ADD, span),
            Opcode::Subtract => chunk.push_byte(Opcode::C_SUBTRACT, span),
            Opcode::Multiply => chunk.push_byte(Opcode::C_MULTIPLY, span),
            Opcode::Divide => chunk.push_byte(Opcode::C_DIVIDE, span),
            Opcode::Negate => chunk.push_byte(Opcode::C_NEGATE, span),
            Opcode::Not => chunk.push_byte(Opcode::C_NOT, span),
            Opcode::Print => chunk.push_byte(Opcode::C_PRINT, span),
        }
    }

    pub fn format(&self, buffer: &mut String, chunk: &Chunk, heap: &StringHeap) {
        let constant = |buffer: &mut String, mnemonic: &str, handle: &ConstRef| {
            buffer.push_str(mnemonic);
            write!(buffer, " {:<width$}${} = ", " ", handle.0, width = 4).expect(WRITE_FMT_MSG);
            chunk.constants().format_constant(*handle, buffer, heap);
        };
        match self {
            Opcode::Const(handle) => constant(buffer, "ldc", handle),
            Opcode::GetGlobal(handle) => constant(buffer, "ggl", handle),
            Opcode::DefineGlobal(handle) => constant(buffer, "dgl", handle),
            Opcode::SetGlobal(handle) => constant(buffer, "sgl", handle),
            Opcode::Return => buffer.push_str("ret"),
            Opcode::Nil => buffer.push_str("nil"),
            Opcode::True => buffer.push_str("true"),
            Opcode::False => buffer.push_str("false"),
            Opcode::Pop => buffer.push_str("pop"),
            Opcode::Equal => buffer.push_str("eq"),
            Opcode::Greater => buffer.push_str("gt"),
            Opcode::Less => buffer.push_str("lt"),
            Opcode::Add => buffer.push_str("add"),
            Opcode::Subtract => buffer.push_str("sub"),
            Opcode::Multiply => buffer.push_str("mul"),
            Opcode::Divide => buffer.push_str("div"),
            Opcode::Negate => buffer.push_str("neg"),
            Opcode::Not => buffer.push_str("not"),
            Opcode::Print => buffer.push_str("print"),
        }
    }
}

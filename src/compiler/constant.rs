use crate::machine::Value;
use crate::string::StringHeap;
use std::fmt::Write;

const WRITE_FMT_MSG: &'static str =
    "Encountered an error while attempting to write format string to buffer.";

/// A one-byte index into a chunk's constant pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstRef(pub u8);

/// The pool is addressed by a single operand byte, so it holds at most 256
/// constants; pushing an equal value reuses its slot.
#[derive(Debug)]
pub struct ConstantPool {
    data: Vec<Value>,
}

impl ConstantPool {
    pub const MAX_CONSTANTS: usize = u8::MAX as usize + 1;

    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn get(&self, handle: ConstRef) -> Option<&Value> {
        self.data.get(handle.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `None` once the pool is full and the value is not already in
    /// it. The caller reports that as a compile error.
    pub fn push_constant(&mut self, value: Value) -> Option<ConstRef> {
        if let Some(index) = self.data.iter().position(|v| v == &value) {
            return Some(ConstRef(index as u8));
        }
        if self.data.len() >= Self::MAX_CONSTANTS {
            return None;
        }
        self.data.push(value);
        Some(ConstRef((self.data.len() - 1) as u8))
    }

    pub fn format_constant(&self, handle: ConstRef, buffer: &mut String, heap: &StringHeap) {
        let Some(value) = self.get(handle) else {
            buffer.push_str("INVALID_CONSTANT_HANDLE");
            return;
        };
        match value {
            Value::String(handle) => {
                write!(buffer, "\"{}\"", heap.get(*handle)).expect(WRITE_FMT_MSG);
            }
            value => {
                write!(buffer, "{value}").expect(WRITE_FMT_MSG);
            }
        }
    }
}

impl Default for ConstantPool {
    fn default() -> Self {
        Self::new()
    }
}

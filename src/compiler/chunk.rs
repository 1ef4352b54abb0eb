use super::constant::{ConstRef, ConstantPool};
use super::opcode::{DecodeError, Opcode};
use crate::lexer::{LineBreaks, Span};
use crate::machine::Value;
use crate::string::StringHeap;
use compact_str::CompactString;
use std::fmt::Write;
use std::sync::Arc;

const WRITE_FMT_MSG: &'static str =
    "Encountered an error while attempting to write format string to buffer.";

/// A chunk under construction. The compiler appends code and constants here
/// and freezes the result with [`IncompleteChunk::finish`].
pub struct IncompleteChunk<'src> {
    name: CompactString,
    text: &'src str,
    line_breaks: LineBreaks,
    data: Vec<u8>,
    // One span per code byte, so any offset maps back to its source token.
    spans: Vec<Span>,
    constants: ConstantPool,
}

impl<'src> IncompleteChunk<'src> {
    pub fn new(name: &str, text: &'src str) -> Self {
        let line_breaks = LineBreaks::new(text);
        Self {
            name: name.into(),
            text,
            line_breaks,
            data: Vec::new(),
            spans: Vec::new(),
            constants: ConstantPool::new(),
        }
    }

    pub fn push_byte(&mut self, byte: u8, span: Span) {
        self.data.push(byte);
        self.spans.push(span);
    }

    pub fn emit(&mut self, opcode: Opcode, span: Span) {
        opcode.encode(self, span);
    }

    pub fn push_constant(&mut self, value: Value) -> Option<ConstRef> {
        self.constants.push_constant(value)
    }

    pub fn finish(self) -> Chunk<'src> {
        Chunk {
            name: self.name,
            data: self.data.into(),
            spans: self.spans.into(),
            constants: self.constants,
            text: self.text,
            line_breaks: self.line_breaks,
        }
    }
}

/// A compiled unit of bytecode: frozen code, its constant pool and the
/// span map used for diagnostics.
pub struct Chunk<'src> {
    name: CompactString,
    text: &'src str,
    line_breaks: LineBreaks,
    data: Arc<[u8]>,
    spans: Arc<[Span]>,
    constants: ConstantPool,
}

/// Walks the decoded instructions of a well-formed chunk. Ends at the end
/// of the code, or early at the first undecodable byte; callers that need
/// to see the failure itself use [`Chunk::decode_at`], as the disassembler
/// does.
pub struct OpcodeIterator<'a> {
    data: &'a [u8],
    index: usize,
}

impl<'a> std::iter::Iterator for OpcodeIterator<'a> {
    type Item = (usize, Opcode);

    fn next(&mut self) -> Option<Self::Item> {
        let (opcode, next_index) = Opcode::decode_at(self.data, self.index).ok()??;
        let offset = self.index;
        self.index = next_index;
        Some((offset, opcode))
    }
}

impl<'src> Chunk<'src> {
    pub fn iter(&self) -> OpcodeIterator<'_> {
        OpcodeIterator {
            data: &self.data,
            index: 0,
        }
    }

    pub fn decode_at(&self, index: usize) -> Result<Option<(Opcode, usize)>, DecodeError> {
        Opcode::decode_at(&self.data, index)
    }

    pub fn get_constant(&self, handle: ConstRef) -> Option<&Value> {
        self.constants.get(handle)
    }

    pub fn constants(&self) -> &ConstantPool {
        &self.constants
    }

    pub fn code_len(&self) -> usize {
        self.data.len()
    }

    /// The source span that emitted the byte at `offset`.
    pub fn span_at(&self, offset: usize) -> Span {
        *self
            .spans
            .get(offset)
            .expect("Every code byte records the span that emitted it.")
    }

    /// The 1-based source line of the byte at `offset`.
    pub fn line_of(&self, offset: usize) -> u32 {
        self.line_breaks.get_line_from_span(self.span_at(offset))
    }

    pub fn get_line_breaks(&self) -> LineBreaks {
        self.line_breaks.clone()
    }

    pub fn get_source(&self) -> &'src str {
        self.text
    }

    pub fn disassemble(&self, heap: &StringHeap) -> String {
        const INDENT: &'static str = "  ";
        let max_line = self.line_breaks.get_max_line();
        let num_digits = 4usize.max((max_line.checked_ilog10().unwrap_or(0) + 1) as usize);

        let mut buffer = String::new();
        write!(buffer, "Chunk <{}>:\n", self.name).expect(WRITE_FMT_MSG);
        let mut previous_line_number: Option<u32> = None;
        let mut offset = 0;
        loop {
            let (opcode, next_offset) = match self.decode_at(offset) {
                Ok(Some(decoded)) => decoded,
                Ok(None) => break,
                // A chunk that does not decode is still listed up to the
                // bad byte, with the failure at its offset.
                Err(error) => {
                    write!(buffer, "{INDENT}{offset:04x}: <{error}>").expect(WRITE_FMT_MSG);
                    buffer.push('\n');
                    break;
                }
            };
            let line_number = self.line_of(offset);
            write!(buffer, "{INDENT}{offset:04x}:").expect(WRITE_FMT_MSG);

            let same = match previous_line_number {
                Some(previous) => previous == line_number,
                None => false,
            };
            if same {
                write!(buffer, "{:>width$}| ", " ", width = num_digits).expect(WRITE_FMT_MSG);
            } else {
                write!(buffer, "{:>width$}{line_number} ", "L", width = num_digits)
                    .expect(WRITE_FMT_MSG);
            }
            opcode.format(&mut buffer, self, heap);
            buffer.push('\n');

            previous_line_number = Some(line_number);
            offset = next_offset;
        }
        buffer
    }
}

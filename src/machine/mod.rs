mod context;
pub mod error;
pub mod formatter;
mod value;

pub use context::{BufferedContext, StdioContext};
pub use value::Value;

use crate::compiler::{Chunk, Compiler, ConstRef, Opcode};
use crate::lexer::Span;
use crate::string::{StringHeap, StringRef};
use crate::table::Table;
use compact_str::ToCompactString;
use error::{ExecutionError, RuntimeError, RuntimeErrorKind};

/// The operand stack holds at most this many values. The compiler cannot
/// overrun it from straight-line expression code unless nesting is extreme,
/// at which point execution stops with a runtime error.
pub const STACK_MAX: usize = 256;

/// Where a program's `print` output goes.
pub trait SystemContext {
    fn writeln(&mut self, text: &str);
}

/// The bytecode interpreter. Globals, interned strings and the heap survive
/// across `interpret` calls, which is what gives a REPL its memory; the
/// operand stack does not.
pub struct VirtualMachine<C: SystemContext> {
    ip: usize,
    stack: Vec<Value>,
    globals: Table<StringRef, Value>,
    heap: StringHeap,
    context: C,
}

impl<C> VirtualMachine<C>
where
    C: SystemContext,
{
    pub fn new(context: C) -> Self {
        Self {
            ip: 0,
            stack: Vec::with_capacity(STACK_MAX),
            globals: Table::new(),
            heap: StringHeap::new(),
            context,
        }
    }

    /// Compiles and runs one source buffer to completion.
    pub fn interpret(&mut self, name: &str, source: &str) -> Result<(), ExecutionError> {
        let chunk = Compiler::new(name, source, &mut self.heap)
            .compile()
            .map_err(ExecutionError::Compile)?;
        self.run(&chunk).map_err(|error| {
            // No partial results: a runtime error throws away the operands.
            self.stack.clear();
            ExecutionError::Runtime(error)
        })
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn into_context(self) -> C {
        self.context
    }

    pub fn heap(&self) -> &StringHeap {
        &self.heap
    }

    /// The printed form of a value, with string handles resolved.
    pub fn stringify(&self, value: &Value) -> String {
        match value {
            Value::String(handle) => self.heap.get(*handle).to_string(),
            value => value.to_string(),
        }
    }
}

impl<C> VirtualMachine<C>
where
    C: SystemContext,
{
    fn run(&mut self, chunk: &Chunk) -> Result<(), RuntimeError> {
        self.ip = 0;
        loop {
            let offset = self.ip;
            let (instruction, next) = chunk
                .decode_at(offset)
                .expect("Compiled chunks only contain valid instructions.")
                .expect("Compiled chunks always end with a return instruction.");
            self.ip = next;
            let span = chunk.span_at(offset);

            match instruction {
                Opcode::Return => {
                    return Ok(());
                }
                Opcode::Const(handle) => {
                    let value = *chunk
                        .get_constant(handle)
                        .expect("Compiled chunks should have valid constant handles.");
                    self.push(value, span)?;
                }
                Opcode::Nil => self.push(Value::Nil, span)?,
                Opcode::True => self.push(Value::Bool(true), span)?,
                Opcode::False => self.push(Value::Bool(false), span)?,
                Opcode::Pop => {
                    self.pop();
                }
                Opcode::GetGlobal(handle) => {
                    let name = self.constant_name(chunk, handle);
                    match self.globals.get(&name).copied() {
                        Some(value) => self.push(value, span)?,
                        None => return Err(self.undefined_variable(name, span)),
                    }
                }
                Opcode::DefineGlobal(handle) => {
                    let name = self.constant_name(chunk, handle);
                    let value = self.pop();
                    self.globals.set(name, value);
                }
                Opcode::SetGlobal(handle) => {
                    let name = self.constant_name(chunk, handle);
                    // Assignment is an expression, so the value stays on the
                    // stack.
                    let value = self.peek();
                    if !self.globals.set_existing(name, value) {
                        return Err(self.undefined_variable(name, span));
                    }
                }
                Opcode::Equal => {
                    let rhs = self.pop();
                    let lhs = self.pop();
                    self.push(Value::Bool(lhs.is_equal(&rhs)), span)?;
                }
                Opcode::Greater => self.binary_operation(Value::greater_than, span)?,
                Opcode::Less => self.binary_operation(Value::less_than, span)?,
                Opcode::Add => {
                    let rhs = self.pop();
                    let lhs = self.pop();
                    let result = match (lhs, rhs) {
                        (Value::Number(lhs), Value::Number(rhs)) => Value::Number(lhs + rhs),
                        (Value::String(lhs), Value::String(rhs)) => {
                            Value::String(self.heap.concatenate(lhs, rhs))
                        }
                        (lhs, rhs) => {
                            return Err(RuntimeError {
                                kind: RuntimeErrorKind::NonAddable(lhs, rhs),
                                span,
                            });
                        }
                    };
                    self.push(result, span)?;
                }
                Opcode::Subtract => self.binary_operation(Value::subtract, span)?,
                Opcode::Multiply => self.binary_operation(Value::multiply, span)?,
                Opcode::Divide => self.binary_operation(Value::divide, span)?,
                Opcode::Negate => {
                    let operand = self.pop();
                    let result = operand
                        .numeric_negate()
                        .map_err(|kind| RuntimeError { kind, span })?;
                    self.push(result, span)?;
                }
                Opcode::Not => {
                    let operand = self.pop();
                    self.push(Value::Bool(operand.logical_not()), span)?;
                }
                Opcode::Print => {
                    let value = self.pop();
                    let text = self.stringify(&value);
                    self.context.writeln(&text);
                }
            }
        }
    }

    fn binary_operation(
        &mut self,
        operation: fn(&Value, &Value) -> Result<Value, RuntimeErrorKind>,
        span: Span,
    ) -> Result<(), RuntimeError> {
        let rhs = self.pop();
        let lhs = self.pop();
        let result = operation(&lhs, &rhs).map_err(|kind| RuntimeError { kind, span })?;
        self.push(result, span)
    }

    fn push(&mut self, value: Value, span: Span) -> Result<(), RuntimeError> {
        if self.stack.len() >= STACK_MAX {
            return Err(RuntimeError {
                kind: RuntimeErrorKind::StackOverflow,
                span,
            });
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Value {
        self.stack
            .pop()
            .expect("The compiler never emits code that underflows the stack.")
    }

    fn peek(&self) -> Value {
        *self
            .stack
            .last()
            .expect("The compiler never emits code that underflows the stack.")
    }

    fn constant_name(&self, chunk: &Chunk, handle: ConstRef) -> StringRef {
        match chunk.get_constant(handle) {
            Some(Value::String(name)) => *name,
            _ => unreachable!("Global access opcodes always name a string constant."),
        }
    }

    fn undefined_variable(&self, name: StringRef, span: Span) -> RuntimeError {
        RuntimeError {
            kind: RuntimeErrorKind::UndefinedVariable(self.heap.get(name).to_compact_string()),
            span,
        }
    }
}

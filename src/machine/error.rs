use super::value::Value;
use crate::compiler::error::CompileError;
use crate::lexer::Span;
use compact_str::CompactString;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum RuntimeErrorKind {
    #[error("Operand must be a number.")]
    NonNumeric(Value),
    #[error("Operands must be numbers.")]
    NonNumerics(Value, Value),
    #[error("Operands must be two numbers or two strings.")]
    NonAddable(Value, Value),
    #[error("Undefined variable: '{0}'")]
    UndefinedVariable(CompactString),
    #[error("Division by zero.")]
    DivisionByZero,
    #[error("Stack overflow")]
    StackOverflow,
}

#[derive(Debug, Error, Clone)]
#[error("{kind}")]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub span: Span,
}

impl RuntimeError {
    pub fn code(&self) -> &'static str {
        type Kind = RuntimeErrorKind;
        match self.kind {
            Kind::NonNumeric(_) => "RT001",
            Kind::NonNumerics(_, _) => "RT002",
            Kind::NonAddable(_, _) => "RT003",
            Kind::UndefinedVariable(_) => "RT004",
            Kind::DivisionByZero => "RT005",
            Kind::StackOverflow => "RT006",
        }
    }
}

/// What `interpret` can return: every compile diagnostic of the run, or the
/// single runtime error that aborted execution.
#[derive(Debug, Error, Clone)]
pub enum ExecutionError {
    #[error("Compilation failed with {} error(s).", .0.len())]
    Compile(Vec<CompileError>),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

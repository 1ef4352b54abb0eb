mod chunk;
mod constant;
pub mod error;
pub mod formatter;
mod opcode;

pub use chunk::{Chunk, IncompleteChunk, OpcodeIterator};
pub use constant::{ConstRef, ConstantPool};
pub use opcode::{DecodeError, Opcode};

use crate::lexer::{Lexer, Span, Token, TokenKind};
use crate::machine::Value;
use crate::string::StringHeap;
use error::{CompileError, ParseError, ParseErrorKind};

/// The precedence ladder, lowest to highest. Each infix token parses its
/// right operand at one level above its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    None,
    Assignment,
    Or,
    And,
    Equality,
    Comparison,
    Term,
    Factor,
    Unary,
    Call,
    Primary,
}

impl Precedence {
    fn next(self) -> Self {
        match self {
            Precedence::None => Precedence::Assignment,
            Precedence::Assignment => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Equality,
            Precedence::Equality => Precedence::Comparison,
            Precedence::Comparison => Precedence::Term,
            Precedence::Term => Precedence::Factor,
            Precedence::Factor => Precedence::Unary,
            Precedence::Unary => Precedence::Call,
            Precedence::Call => Precedence::Primary,
            Precedence::Primary => Precedence::Primary,
        }
    }
}

type ParseFn<'src, 'heap> = fn(&mut Compiler<'src, 'heap>, bool);

struct ParseRule<'src, 'heap> {
    prefix: Option<ParseFn<'src, 'heap>>,
    infix: Option<ParseFn<'src, 'heap>>,
    precedence: Precedence,
}

/// The row of the rule table for one token kind: how it parses as a prefix,
/// how it parses as an infix, and how tightly it binds.
fn get_rule<'src, 'heap>(kind: TokenKind) -> ParseRule<'src, 'heap> {
    fn rule<'src, 'heap>(
        prefix: Option<ParseFn<'src, 'heap>>,
        infix: Option<ParseFn<'src, 'heap>>,
        precedence: Precedence,
    ) -> ParseRule<'src, 'heap> {
        ParseRule {
            prefix,
            infix,
            precedence,
        }
    }
    match kind {
        TokenKind::LeftParenthesis => rule(Some(Compiler::grouping), None, Precedence::None),
        TokenKind::Minus => rule(
            Some(Compiler::unary),
            Some(Compiler::binary),
            Precedence::Term,
        ),
        TokenKind::Plus => rule(None, Some(Compiler::binary), Precedence::Term),
        TokenKind::Star | TokenKind::Slash => rule(None, Some(Compiler::binary), Precedence::Factor),
        TokenKind::Bang => rule(Some(Compiler::unary), None, Precedence::None),
        TokenKind::BangEqual | TokenKind::EqualEqual => {
            rule(None, Some(Compiler::binary), Precedence::Equality)
        }
        TokenKind::LessThan
        | TokenKind::LessThanEqual
        | TokenKind::GreaterThan
        | TokenKind::GreaterThanEqual => rule(None, Some(Compiler::binary), Precedence::Comparison),
        TokenKind::NumericLiteral => rule(Some(Compiler::number), None, Precedence::None),
        TokenKind::StringLiteral => rule(Some(Compiler::string), None, Precedence::None),
        TokenKind::Ident => rule(Some(Compiler::variable), None, Precedence::None),
        TokenKind::KeywordNil | TokenKind::KeywordTrue | TokenKind::KeywordFalse => {
            rule(Some(Compiler::literal), None, Precedence::None)
        }
        _ => rule(None, None, Precedence::None),
    }
}

/// A single-pass compiler: a Pratt parser that emits bytecode into its chunk
/// as it goes, with no syntax tree in between.
///
/// String literals and global names are interned into the machine's heap at
/// compile time, so the emitted constants are ordinary runtime values.
pub struct Compiler<'src, 'heap> {
    lexer: Lexer<'src>,
    heap: &'heap mut StringHeap,
    chunk: IncompleteChunk<'src>,
    current: Token,
    previous: Token,
    errors: Vec<CompileError>,
    panic_mode: bool,
}

impl<'src, 'heap> Compiler<'src, 'heap> {
    pub fn new(name: &str, source: &'src str, heap: &'heap mut StringHeap) -> Self {
        let placeholder = Token {
            kind: TokenKind::Eof,
            span: Span {
                start: 0.into(),
                length: 1.into(),
            },
        };
        Self {
            lexer: Lexer::new_without_file(source),
            heap,
            chunk: IncompleteChunk::new(name, source),
            current: placeholder,
            previous: placeholder,
            errors: Vec::new(),
            panic_mode: false,
        }
    }

    /// Compiles the whole source buffer. All diagnostics of the run are
    /// collected; the chunk is returned only if there were none.
    pub fn compile(mut self) -> Result<Chunk<'src>, Vec<CompileError>> {
        self.advance();
        while !self.matches(TokenKind::Eof) {
            self.declaration();
        }
        self.emit(Opcode::Return);

        if self.errors.is_empty() {
            Ok(self.chunk.finish())
        } else {
            Err(self.errors)
        }
    }
}

// Token plumbing
impl<'src, 'heap> Compiler<'src, 'heap> {
    fn advance(&mut self) {
        self.previous = self.current;
        loop {
            match self.lexer.next_token() {
                Ok(token) => {
                    self.current = token;
                    break;
                }
                Err(error) => {
                    self.report(CompileError::Lexical(error));
                }
            }
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, on_missing: ParseErrorKind) {
        if self.check(kind) {
            self.advance();
        } else {
            self.report_at(on_missing, self.current);
        }
    }

    fn report(&mut self, error: CompileError) {
        // Panic mode swallows everything until the parser resynchronizes.
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        self.errors.push(error);
    }

    fn report_at(&mut self, kind: ParseErrorKind, token: Token) {
        self.report(CompileError::Parse(ParseError {
            kind,
            span: token.span,
            found: token.kind,
        }));
    }

    fn lexeme(&self, token: &Token) -> &'src str {
        self.lexer
            .get_lexeme(&token.span)
            .expect("Tokens always carry a span inside the source.")
    }
}

// Bytecode plumbing
impl<'src, 'heap> Compiler<'src, 'heap> {
    fn emit(&mut self, opcode: Opcode) {
        self.chunk.emit(opcode, self.previous.span);
    }

    fn emit_at(&mut self, opcode: Opcode, span: Span) {
        self.chunk.emit(opcode, span);
    }

    fn make_constant(&mut self, value: Value, token: Token) -> Option<ConstRef> {
        let handle = self.chunk.push_constant(value);
        if handle.is_none() {
            self.report_at(ParseErrorKind::TooManyConstants, token);
        }
        handle
    }

    fn emit_constant(&mut self, value: Value, token: Token) {
        if let Some(handle) = self.make_constant(value, token) {
            self.emit_at(Opcode::Const(handle), token.span);
        }
    }

    /// Interns an identifier and stores it in the constant pool, for the
    /// global access opcodes that name their variable through an operand.
    fn identifier_constant(&mut self, token: Token) -> Option<ConstRef> {
        let text = self.lexeme(&token);
        let name = self.heap.intern(text);
        self.make_constant(Value::String(name), token)
    }
}

// Statements
impl<'src, 'heap> Compiler<'src, 'heap> {
    fn declaration(&mut self) {
        if self.matches(TokenKind::KeywordVar) {
            self.var_declaration();
        } else {
            self.statement();
        }

        if self.panic_mode {
            self.synchronize();
        }
    }

    fn var_declaration(&mut self) {
        if !self.matches(TokenKind::Ident) {
            self.report_at(ParseErrorKind::ExpectVariableName, self.current);
            return;
        }
        let name = self.previous;
        let Some(global) = self.identifier_constant(name) else {
            return;
        };

        if self.matches(TokenKind::Equal) {
            self.expression();
        } else {
            // Declaring without an initializer binds to nil.
            self.emit_at(Opcode::Nil, name.span);
        }
        self.consume(
            TokenKind::Semicolon,
            ParseErrorKind::MissingSemicolonAfterVarDeclaration,
        );
        self.emit_at(Opcode::DefineGlobal(global), name.span);
    }

    fn statement(&mut self) {
        if self.matches(TokenKind::KeywordPrint) {
            self.print_statement();
        } else {
            self.expression_statement();
        }
    }

    fn print_statement(&mut self) {
        let keyword = self.previous;
        self.expression();
        self.consume(
            TokenKind::Semicolon,
            ParseErrorKind::MissingSemicolonAfterValue,
        );
        self.emit_at(Opcode::Print, keyword.span);
    }

    fn expression_statement(&mut self) {
        self.expression();
        self.consume(
            TokenKind::Semicolon,
            ParseErrorKind::MissingSemicolonAfterExpression,
        );
        self.emit(Opcode::Pop);
    }

    /// Skips to the next statement boundary so one parse error does not
    /// cascade into a pile of spurious ones.
    fn synchronize(&mut self) {
        self.panic_mode = false;
        while self.current.kind != TokenKind::Eof {
            if self.previous.kind == TokenKind::Semicolon {
                return;
            }
            if self.current.kind.starts_statement() {
                return;
            }
            self.advance();
        }
    }
}

// Expressions
impl<'src, 'heap> Compiler<'src, 'heap> {
    fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    fn parse_precedence(&mut self, precedence: Precedence) {
        self.advance();
        let Some(prefix) = get_rule(self.previous.kind).prefix else {
            self.report_at(ParseErrorKind::ExpectExpression, self.previous);
            return;
        };

        // Assignment binds loosest of all, so any rule that consumed tokens
        // at a tighter level must refuse to treat a trailing `=` as its own.
        let can_assign = precedence <= Precedence::Assignment;
        prefix(self, can_assign);

        while precedence <= get_rule(self.current.kind).precedence {
            self.advance();
            let infix = get_rule(self.previous.kind)
                .infix
                .expect("Tokens with a non-trivial precedence have an infix rule.");
            infix(self, can_assign);
        }

        if can_assign && self.matches(TokenKind::Equal) {
            self.report_at(ParseErrorKind::InvalidAssignmentTarget, self.previous);
        }
    }

    fn grouping(&mut self, _can_assign: bool) {
        self.expression();
        self.consume(
            TokenKind::RightParenthesis,
            ParseErrorKind::UnclosedParenthesis,
        );
    }

    fn number(&mut self, _can_assign: bool) {
        let token = self.previous;
        let value: f64 = self
            .lexeme(&token)
            .parse()
            .expect("Numeric literals are guaranteed to be parseable into f64.");
        self.emit_constant(Value::Number(value), token);
    }

    fn string(&mut self, _can_assign: bool) {
        let token = self.previous;
        let lexeme = self.lexeme(&token);
        // Strip the surrounding quotes.
        let handle = self.heap.intern(&lexeme[1..lexeme.len() - 1]);
        self.emit_constant(Value::String(handle), token);
    }

    fn literal(&mut self, _can_assign: bool) {
        match self.previous.kind {
            TokenKind::KeywordNil => self.emit(Opcode::Nil),
            TokenKind::KeywordTrue => self.emit(Opcode::True),
            TokenKind::KeywordFalse => self.emit(Opcode::False),
            kind => unreachable!("No literal rule exists for {kind:?}."),
        }
    }

    fn variable(&mut self, can_assign: bool) {
        let name = self.previous;
        let Some(global) = self.identifier_constant(name) else {
            return;
        };

        if can_assign && self.matches(TokenKind::Equal) {
            self.expression();
            self.emit_at(Opcode::SetGlobal(global), name.span);
        } else {
            self.emit_at(Opcode::GetGlobal(global), name.span);
        }
    }

    fn unary(&mut self, _can_assign: bool) {
        let operator = self.previous;
        self.parse_precedence(Precedence::Unary);
        match operator.kind {
            TokenKind::Minus => self.emit_at(Opcode::Negate, operator.span),
            TokenKind::Bang => self.emit_at(Opcode::Not, operator.span),
            kind => unreachable!("No unary rule exists for {kind:?}."),
        }
    }

    fn binary(&mut self, _can_assign: bool) {
        let operator = self.previous;
        let rule = get_rule(operator.kind);
        self.parse_precedence(rule.precedence.next());

        let span = operator.span;
        match operator.kind {
            TokenKind::Plus => self.emit_at(Opcode::Add, span),
            TokenKind::Minus => self.emit_at(Opcode::Subtract, span),
            TokenKind::Star => self.emit_at(Opcode::Multiply, span),
            TokenKind::Slash => self.emit_at(Opcode::Divide, span),
            TokenKind::EqualEqual => self.emit_at(Opcode::Equal, span),
            TokenKind::LessThan => self.emit_at(Opcode::Less, span),
            TokenKind::GreaterThan => self.emit_at(Opcode::Greater, span),
            // The remaining comparisons are compiled as negations of the
            // opposite comparison.
            TokenKind::BangEqual => {
                self.emit_at(Opcode::Equal, span);
                self.emit_at(Opcode::Not, span);
            }
            TokenKind::LessThanEqual => {
                self.emit_at(Opcode::Greater, span);
                self.emit_at(Opcode::Not, span);
            }
            TokenKind::GreaterThanEqual => {
                self.emit_at(Opcode::Less, span);
                self.emit_at(Opcode::Not, span);
            }
            kind => unreachable!("No binary rule exists for {kind:?}."),
        }
    }
}

use super::{LexicalError, LexicalErrorKind, Lexer, LineBreaks, Token, TokenKind};
use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use std::path::Path;

/// Interface for creating new token formatters.
pub trait TokenFormatter {
    /// Formats a token into a string.
    fn format(&self, token: &Token) -> String;
    /// Formats a lexer error into a string.
    fn format_lexical_error(&self, error: &LexicalError) -> String;
}

pub trait ToFormatter<F>
where
    F: TokenFormatter,
{
    fn create_formatter(&self) -> F;
}

pub struct BasicFormatter<'src> {
    text: &'src str,
    line_breaks: LineBreaks,
}

impl<'src> BasicFormatter<'src> {
    pub fn new(text: &'src str) -> Self {
        let line_breaks = LineBreaks::new(text);
        Self { text, line_breaks }
    }
}

impl<'src> ToFormatter<BasicFormatter<'src>> for Lexer<'src> {
    fn create_formatter(&self) -> BasicFormatter<'src> {
        BasicFormatter {
            text: self.get_source(),
            line_breaks: self.get_line_breaks(),
        }
    }
}

impl<'src> TokenFormatter for BasicFormatter<'src> {
    fn format(&self, token: &Token) -> String {
        match token.kind {
            TokenKind::LeftParenthesis => "LEFT_PAREN ( null".into(),
            TokenKind::RightParenthesis => "RIGHT_PAREN ) null".into(),
            TokenKind::LeftBrace => "LEFT_BRACE { null".into(),
            TokenKind::RightBrace => "RIGHT_BRACE } null".into(),
            TokenKind::Comma => "COMMA , null".into(),
            TokenKind::Dot => "DOT . null".into(),
            TokenKind::Minus => "MINUS - null".into(),
            TokenKind::Plus => "PLUS + null".into(),
            TokenKind::Semicolon => "SEMICOLON ; null".into(),
            TokenKind::Star => "STAR * null".into(),
            TokenKind::Bang => "BANG ! null".into(),
            TokenKind::BangEqual => "BANG_EQUAL != null".into(),
            TokenKind::Equal => "EQUAL = null".into(),
            TokenKind::EqualEqual => "EQUAL_EQUAL == null".into(),
            TokenKind::LessThan => "LESS < null".into(),
            TokenKind::LessThanEqual => "LESS_EQUAL <= null".into(),
            TokenKind::GreaterThan => "GREATER > null".into(),
            TokenKind::GreaterThanEqual => "GREATER_EQUAL >= null".into(),
            TokenKind::Slash => "SLASH / null".into(),
            TokenKind::Eof => "EOF  null".into(),
            TokenKind::NumericLiteral => {
                let lexeme = &self.text[token.span.range()];
                let value: f64 = lexeme
                    .parse()
                    .expect("Numeric literals are guaranteed to be parseable into f64.");
                format!("NUMBER {lexeme} {value:?}")
            }
            TokenKind::StringLiteral => {
                let lexeme = &self.text[token.span.range()];
                let value = &lexeme[1..lexeme.len() - 1];
                format!("STRING {lexeme} {value}")
            }
            TokenKind::Ident => {
                let lexeme = &self.text[token.span.range()];
                format!("IDENTIFIER {lexeme} null")
            }
            TokenKind::KeywordAnd => "AND and null".into(),
            TokenKind::KeywordClass => "CLASS class null".into(),
            TokenKind::KeywordElse => "ELSE else null".into(),
            TokenKind::KeywordFalse => "FALSE false null".into(),
            TokenKind::KeywordFor => "FOR for null".into(),
            TokenKind::KeywordFun => "FUN fun null".into(),
            TokenKind::KeywordIf => "IF if null".into(),
            TokenKind::KeywordNil => "NIL nil null".into(),
            TokenKind::KeywordOr => "OR or null".into(),
            TokenKind::KeywordPrint => "PRINT print null".into(),
            TokenKind::KeywordReturn => "RETURN return null".into(),
            TokenKind::KeywordSuper => "SUPER super null".into(),
            TokenKind::KeywordThis => "THIS this null".into(),
            TokenKind::KeywordTrue => "TRUE true null".into(),
            TokenKind::KeywordVar => "VAR var null".into(),
            TokenKind::KeywordWhile => "WHILE while null".into(),
        }
    }

    fn format_lexical_error(&self, error: &LexicalError) -> String {
        let line = self.line_breaks.get_line_from_span(error.span);
        format!("[line {line}] Error: {}", error.kind)
    }
}

pub struct DebugFormatter;

impl TokenFormatter for DebugFormatter {
    fn format(&self, token: &Token) -> String {
        format!("{token:?}")
    }

    fn format_lexical_error(&self, error: &LexicalError) -> String {
        format!("{error:?}")
    }
}

impl<'src> ToFormatter<DebugFormatter> for Lexer<'src> {
    fn create_formatter(&self) -> DebugFormatter {
        DebugFormatter
    }
}

/// Like [`BasicFormatter`] but every record is prefixed with its line number.
pub struct LineFormatter<'src> {
    basic: BasicFormatter<'src>,
    line_breaks: LineBreaks,
}

impl<'src> LineFormatter<'src> {
    pub fn new(text: &'src str) -> Self {
        Self {
            basic: BasicFormatter::new(text),
            line_breaks: LineBreaks::new(text),
        }
    }
}

impl<'src> ToFormatter<LineFormatter<'src>> for Lexer<'src> {
    fn create_formatter(&self) -> LineFormatter<'src> {
        LineFormatter {
            basic: self.create_formatter(),
            line_breaks: self.get_line_breaks(),
        }
    }
}

impl<'src> TokenFormatter for LineFormatter<'src> {
    fn format(&self, token: &Token) -> String {
        let line = self.line_breaks.get_line_from_span(token.span);
        format!("({line}) {}", self.basic.format(token))
    }

    fn format_lexical_error(&self, error: &LexicalError) -> String {
        let line = self.line_breaks.get_line_from_span(error.span);
        format!("({line}) ERROR {}", error.kind)
    }
}

pub struct PrettyFormatter<'src> {
    basic: BasicFormatter<'src>,
    text: &'src str,
    path: &'src Path,
}

impl<'src> PrettyFormatter<'src> {
    pub fn new(text: &'src str, path: &'src Path) -> Self {
        Self {
            basic: BasicFormatter::new(text),
            text,
            path,
        }
    }
}

impl<'src> ToFormatter<PrettyFormatter<'src>> for Lexer<'src> {
    fn create_formatter(&self) -> PrettyFormatter<'src> {
        PrettyFormatter {
            basic: self.create_formatter(),
            text: self.get_source(),
            path: self.get_path(),
        }
    }
}

impl<'src> TokenFormatter for PrettyFormatter<'src> {
    fn format(&self, token: &Token) -> String {
        self.basic.format(token)
    }

    fn format_lexical_error(&self, error: &LexicalError) -> String {
        let path = self
            .path
            .to_str()
            .expect("Non-UTF8 paths are not supported!");
        let mut output = std::io::Cursor::new(Vec::new());
        match error.kind {
            LexicalErrorKind::Unrecognized(c) => {
                Report::build(ReportKind::Error, (path, error.span.range()))
                    .with_code(error.code())
                    .with_message("Encountered an unrecognized character during lexing")
                    .with_label(
                        Label::new((path, error.span.range()))
                            .with_message(format!(
                                "Unrecognized character {}",
                                c.fg(Color::BrightRed)
                            ))
                            .with_color(Color::BrightRed),
                    )
                    .finish()
                    .write((path, Source::from(self.text)), &mut output)
                    .expect("Write into buffer should not fail.");
            }
            LexicalErrorKind::UnclosedString => {
                Report::build(ReportKind::Error, (path, error.span.range()))
                    .with_code(error.code())
                    .with_message("Encountered non-terminated string during lexing")
                    .with_label(
                        Label::new((path, error.span.split_left(1.into()).range()))
                            .with_message("String starts here...".to_string())
                            .with_color(Color::BrightRed),
                    )
                    .with_label(
                        Label::new((path, error.span.last_byte().range()))
                            .with_message("and is not closed".to_string())
                            .with_color(Color::BrightCyan),
                    )
                    .finish()
                    .write((path, Source::from(self.text)), &mut output)
                    .expect("Write into buffer should not fail.");
            }
        }
        String::from_utf8(output.into_inner()).expect("Ariadne produces valid utf-8 strings.")
    }
}

use super::error::CompileError;
use crate::lexer::{LineBreaks, TokenKind};
use ariadne::{Color, Label, Report, ReportKind, Source};
use std::ops::Range;
use std::path::Path;

/// Interface for rendering compile diagnostics.
pub trait CompileErrorFormatter {
    fn format(&self, error: &CompileError) -> String;
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

impl<'src> CompileErrorFormatter for BasicFormatter<'src> {
    fn format(&self, error: &CompileError) -> String {
        let line = self.line_breaks.get_line_from_span(error.span());
        match error {
            CompileError::Lexical(e) => {
                format!("[line {line}] Error: {}", e.kind)
            }
            CompileError::Parse(e) if e.found == TokenKind::Eof => {
                format!("[line {line}] Error at end: {}", e.kind)
            }
            CompileError::Parse(e) => {
                let lexeme = &self.text[e.span.range()];
                format!("[line {line}] Error at '{lexeme}': {}", e.kind)
            }
        }
    }
}

pub struct DebugFormatter;

impl CompileErrorFormatter for DebugFormatter {
    fn format(&self, error: &CompileError) -> String {
        format!("{error:?}")
    }
}

pub struct PrettyFormatter<'src> {
    text: &'src str,
    path: &'src Path,
}

impl<'src> PrettyFormatter<'src> {
    pub fn new(text: &'src str, path: &'src Path) -> Self {
        Self { text, path }
    }

    // An `Eof` token points one past the end of the source, which a report
    // label cannot, so errors at the end anchor to the last byte instead.
    fn label_range(&self, error: &CompileError) -> Range<usize> {
        let range = error.span().range();
        if range.end > self.text.len() {
            self.text.len().saturating_sub(1)..self.text.len()
        } else {
            range
        }
    }
}

impl<'src> CompileErrorFormatter for PrettyFormatter<'src> {
    fn format(&self, error: &CompileError) -> String {
        let path = self
            .path
            .to_str()
            .expect("Non-UTF8 paths are not supported!");
        let range = self.label_range(error);
        let mut output = std::io::Cursor::new(Vec::new());
        Report::build(ReportKind::Error, (path, range.clone()))
            .with_code(error.code())
            .with_message("Failed to compile script")
            .with_label(
                Label::new((path, range))
                    .with_message(format!("{error}"))
                    .with_color(Color::BrightRed),
            )
            .finish()
            .write((path, Source::from(self.text)), &mut output)
            .expect("Write into buffer should not fail.");
        String::from_utf8(output.into_inner()).expect("Ariadne produces valid utf-8 strings.")
    }
}

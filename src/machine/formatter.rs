use super::error::RuntimeError;
use crate::lexer::LineBreaks;
use ariadne::{Color, Label, Report, ReportKind, Source};
use std::path::Path;

/// Interface for rendering runtime diagnostics.
pub trait RuntimeErrorFormatter {
    fn format(&self, error: &RuntimeError) -> String;
}

pub struct BasicFormatter {
    line_breaks: LineBreaks,
}

impl BasicFormatter {
    pub fn new(text: &str) -> Self {
        Self {
            line_breaks: LineBreaks::new(text),
        }
    }
}

impl RuntimeErrorFormatter for BasicFormatter {
    fn format(&self, error: &RuntimeError) -> String {
        let line = self.line_breaks.get_line_from_span(error.span);
        format!("{}\n[line {line}] in script", error.kind)
    }
}

pub struct DebugFormatter;

impl RuntimeErrorFormatter for DebugFormatter {
    fn format(&self, error: &RuntimeError) -> String {
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
}

impl<'src> RuntimeErrorFormatter for PrettyFormatter<'src> {
    fn format(&self, error: &RuntimeError) -> String {
        let path = self
            .path
            .to_str()
            .expect("Non-UTF8 paths are not supported!");
        let mut output = std::io::Cursor::new(Vec::new());
        Report::build(ReportKind::Error, (path, error.span.range()))
            .with_code(error.code())
            .with_message("Execution aborted")
            .with_label(
                Label::new((path, error.span.range()))
                    .with_message(format!("{}", error.kind))
                    .with_color(Color::BrightRed),
            )
            .finish()
            .write((path, Source::from(self.text)), &mut output)
            .expect("Write into buffer should not fail.");
        String::from_utf8(output.into_inner()).expect("Ariadne produces valid utf-8 strings.")
    }
}

use super::cursor::SourceChar;
use super::token::{Span, SpanIndex, Token, TokenKind, KEYWORD_HASHMAP};
use super::{LexicalError, LexicalErrorKind};

#[derive(Debug)]
pub enum LexerStateTransition {
    Stay,
    ChangeState(LexerState),
    ChangeStateAndEmit {
        new_state: LexerState,
        token_or_error: Result<Token, LexicalError>,
    },
    ChangeStateAndEmitAndPutBack {
        new_state: LexerState,
        token_or_error: Result<Token, LexicalError>,
        put_back: SourceChar,
    },
    ChangeStateAndEmitAndPutBackTwo {
        new_state: LexerState,
        token_or_error: Result<Token, LexicalError>,
        put_back: (SourceChar, SourceChar),
    },
}

pub trait LexerStateExecutor {
    fn execute(&self, source: &str, next_char: Option<SourceChar>) -> LexerStateTransition;
}

#[derive(Debug)]
pub enum LexerState {
    Normal(NormalState),
    Ident(IdentState),
    String(StringState),
    // Integer part of number
    Integer(IntegerState),
    // Period after integer
    Period(PeriodState),
    // Decimal part of number
    Decimal(DecimalState),
    // One of ! = < > waiting for a possible =
    Operator(OperatorState),
    // A / that may open a line comment
    Slash(SlashState),
    Comment(CommentState),
}

impl LexerState {
    pub fn execute(&self, source: &str, next_char: Option<SourceChar>) -> LexerStateTransition {
        match self {
            LexerState::Normal(s) => s.execute(source, next_char),
            LexerState::Ident(s) => s.execute(source, next_char),
            LexerState::String(s) => s.execute(source, next_char),
            LexerState::Integer(s) => s.execute(source, next_char),
            LexerState::Period(s) => s.execute(source, next_char),
            LexerState::Decimal(s) => s.execute(source, next_char),
            LexerState::Operator(s) => s.execute(source, next_char),
            LexerState::Slash(s) => s.execute(source, next_char),
            LexerState::Comment(s) => s.execute(source, next_char),
        }
    }
}

impl std::default::Default for LexerState {
    fn default() -> Self {
        Self::Normal(NormalState)
    }
}

#[derive(Debug)]
pub struct NormalState;

impl LexerStateExecutor for NormalState {
    fn execute(&self, source: &str, next_char: Option<SourceChar>) -> LexerStateTransition {
        let Some(c) = next_char else {
            return LexerStateTransition::ChangeStateAndEmit {
                new_state: LexerState::Normal(NormalState),
                token_or_error: Ok(Token {
                    kind: TokenKind::Eof,
                    span: Span {
                        start: source.len().into(),
                        length: 1.into(),
                    },
                }),
            };
        };

        let start = c.offset;
        let just = move |kind: TokenKind| LexerStateTransition::ChangeStateAndEmit {
            new_state: LexerState::Normal(NormalState),
            token_or_error: Ok(Token {
                kind,
                span: Span {
                    start,
                    length: c.value.len_utf8().into(),
                },
            }),
        };
        let operator = move |single: TokenKind, paired: TokenKind| {
            LexerStateTransition::ChangeState(LexerState::Operator(OperatorState {
                start,
                single,
                paired,
            }))
        };

        match c.value {
            // Single character tokens
            '(' => just(TokenKind::LeftParenthesis),
            ')' => just(TokenKind::RightParenthesis),
            '{' => just(TokenKind::LeftBrace),
            '}' => just(TokenKind::RightBrace),
            ',' => just(TokenKind::Comma),
            '.' => just(TokenKind::Dot),
            '-' => just(TokenKind::Minus),
            '+' => just(TokenKind::Plus),
            ';' => just(TokenKind::Semicolon),
            '*' => just(TokenKind::Star),
            // One or two character tokens
            '!' => operator(TokenKind::Bang, TokenKind::BangEqual),
            '=' => operator(TokenKind::Equal, TokenKind::EqualEqual),
            '<' => operator(TokenKind::LessThan, TokenKind::LessThanEqual),
            '>' => operator(TokenKind::GreaterThan, TokenKind::GreaterThanEqual),
            // Division or line comment
            '/' => LexerStateTransition::ChangeState(LexerState::Slash(SlashState { start })),
            // Identifier/keyword token
            'a'..='z' | 'A'..='Z' | '_' => {
                LexerStateTransition::ChangeState(LexerState::Ident(IdentState { start }))
            }
            // String literal
            '"' => LexerStateTransition::ChangeState(LexerState::String(StringState { start })),
            // Numeric literal
            '0'..='9' => {
                LexerStateTransition::ChangeState(LexerState::Integer(IntegerState { start }))
            }
            _ => {
                if c.value.is_ascii_whitespace() {
                    LexerStateTransition::Stay
                } else {
                    LexerStateTransition::ChangeStateAndEmit {
                        new_state: LexerState::Normal(NormalState),
                        token_or_error: Err(LexicalError {
                            kind: LexicalErrorKind::Unrecognized(c.value),
                            span: Span {
                                start,
                                length: c.value.len_utf8().into(),
                            },
                        }),
                    }
                }
            }
        }
    }
}

#[derive(Debug)]
pub struct IdentState {
    start: SpanIndex,
}

impl IdentState {
    fn lex_ident_or_keyword(&self, source: &str, offset: SpanIndex) -> Token {
        let span = Span {
            start: self.start,
            length: offset - self.start,
        };
        let lexeme = &source[span.range()];
        Token {
            kind: KEYWORD_HASHMAP
                .get(lexeme)
                .cloned()
                .unwrap_or(TokenKind::Ident),
            span,
        }
    }
}

impl LexerStateExecutor for IdentState {
    fn execute(&self, source: &str, next_char: Option<SourceChar>) -> LexerStateTransition {
        let Some(c) = next_char else {
            let token = self.lex_ident_or_keyword(source, source.len().into());
            return LexerStateTransition::ChangeStateAndEmit {
                new_state: LexerState::Normal(NormalState),
                token_or_error: Ok(token),
            };
        };

        if c.value.is_ascii_alphanumeric() || c.value == '_' {
            LexerStateTransition::Stay
        } else {
            let token = self.lex_ident_or_keyword(source, c.offset);
            LexerStateTransition::ChangeStateAndEmitAndPutBack {
                new_state: LexerState::Normal(NormalState),
                token_or_error: Ok(token),
                put_back: c,
            }
        }
    }
}

#[derive(Debug)]
pub struct StringState {
    start: SpanIndex,
}

impl LexerStateExecutor for StringState {
    fn execute(&self, source: &str, next_char: Option<SourceChar>) -> LexerStateTransition {
        let Some(c) = next_char else {
            return LexerStateTransition::ChangeStateAndEmit {
                new_state: LexerState::Normal(NormalState),
                token_or_error: Err(LexicalError {
                    kind: LexicalErrorKind::UnclosedString,
                    span: Span {
                        start: self.start,
                        length: source.len() - self.start,
                    },
                }),
            };
        };

        match c.value {
            // The span covers both quotes.
            '"' => LexerStateTransition::ChangeStateAndEmit {
                new_state: LexerState::Normal(NormalState),
                token_or_error: Ok(Token {
                    kind: TokenKind::StringLiteral,
                    span: Span {
                        start: self.start,
                        length: c.next_offset() - self.start,
                    },
                }),
            },
            // String literals are single-line.
            '\n' => LexerStateTransition::ChangeStateAndEmit {
                new_state: LexerState::Normal(NormalState),
                token_or_error: Err(LexicalError {
                    kind: LexicalErrorKind::UnclosedString,
                    span: Span {
                        start: self.start,
                        length: c.offset - self.start,
                    },
                }),
            },
            _ => LexerStateTransition::Stay,
        }
    }
}

#[derive(Debug)]
pub struct IntegerState {
    start: SpanIndex,
}

impl LexerStateExecutor for IntegerState {
    fn execute(&self, source: &str, next_char: Option<SourceChar>) -> LexerStateTransition {
        let Some(c) = next_char else {
            return LexerStateTransition::ChangeStateAndEmit {
                new_state: LexerState::Normal(NormalState),
                token_or_error: Ok(Token {
                    kind: TokenKind::NumericLiteral,
                    span: Span {
                        start: self.start,
                        length: source.len() - self.start,
                    },
                }),
            };
        };

        if c.value.is_ascii_digit() {
            LexerStateTransition::Stay
        } else if c.value == '.' {
            LexerStateTransition::ChangeState(LexerState::Period(PeriodState {
                start: self.start,
                dot: c.offset,
            }))
        } else {
            LexerStateTransition::ChangeStateAndEmitAndPutBack {
                new_state: LexerState::Normal(NormalState),
                token_or_error: Ok(Token {
                    kind: TokenKind::NumericLiteral,
                    span: Span {
                        start: self.start,
                        length: c.offset - self.start,
                    },
                }),
                put_back: c,
            }
        }
    }
}

#[derive(Debug)]
pub struct PeriodState {
    start: SpanIndex,
    dot: SpanIndex,
}

impl PeriodState {
    fn integer_token(&self) -> Token {
        Token {
            kind: TokenKind::NumericLiteral,
            span: Span {
                start: self.start,
                length: self.dot - self.start,
            },
        }
    }

    fn dot_char(&self) -> SourceChar {
        SourceChar {
            value: '.',
            offset: self.dot,
        }
    }
}

impl LexerStateExecutor for PeriodState {
    fn execute(&self, _source: &str, next_char: Option<SourceChar>) -> LexerStateTransition {
        let Some(c) = next_char else {
            // The period does not belong to the number after all.
            return LexerStateTransition::ChangeStateAndEmitAndPutBack {
                new_state: LexerState::Normal(NormalState),
                token_or_error: Ok(self.integer_token()),
                put_back: self.dot_char(),
            };
        };

        if c.value.is_ascii_digit() {
            LexerStateTransition::ChangeState(LexerState::Decimal(DecimalState {
                start: self.start,
            }))
        } else {
            LexerStateTransition::ChangeStateAndEmitAndPutBackTwo {
                new_state: LexerState::Normal(NormalState),
                token_or_error: Ok(self.integer_token()),
                put_back: (self.dot_char(), c),
            }
        }
    }
}

#[derive(Debug)]
pub struct DecimalState {
    start: SpanIndex,
}

impl LexerStateExecutor for DecimalState {
    fn execute(&self, source: &str, next_char: Option<SourceChar>) -> LexerStateTransition {
        let Some(c) = next_char else {
            return LexerStateTransition::ChangeStateAndEmit {
                new_state: LexerState::Normal(NormalState),
                token_or_error: Ok(Token {
                    kind: TokenKind::NumericLiteral,
                    span: Span {
                        start: self.start,
                        length: source.len() - self.start,
                    },
                }),
            };
        };

        if c.value.is_ascii_digit() {
            LexerStateTransition::Stay
        } else {
            LexerStateTransition::ChangeStateAndEmitAndPutBack {
                new_state: LexerState::Normal(NormalState),
                token_or_error: Ok(Token {
                    kind: TokenKind::NumericLiteral,
                    span: Span {
                        start: self.start,
                        length: c.offset - self.start,
                    },
                }),
                put_back: c,
            }
        }
    }
}

#[derive(Debug)]
pub struct OperatorState {
    start: SpanIndex,
    single: TokenKind,
    paired: TokenKind,
}

impl OperatorState {
    fn single_token(&self) -> Token {
        Token {
            kind: self.single,
            span: Span {
                start: self.start,
                length: 1.into(),
            },
        }
    }
}

impl LexerStateExecutor for OperatorState {
    fn execute(&self, _source: &str, next_char: Option<SourceChar>) -> LexerStateTransition {
        let Some(c) = next_char else {
            return LexerStateTransition::ChangeStateAndEmit {
                new_state: LexerState::Normal(NormalState),
                token_or_error: Ok(self.single_token()),
            };
        };

        if c.value == '=' {
            LexerStateTransition::ChangeStateAndEmit {
                new_state: LexerState::Normal(NormalState),
                token_or_error: Ok(Token {
                    kind: self.paired,
                    span: Span {
                        start: self.start,
                        length: c.next_offset() - self.start,
                    },
                }),
            }
        } else {
            LexerStateTransition::ChangeStateAndEmitAndPutBack {
                new_state: LexerState::Normal(NormalState),
                token_or_error: Ok(self.single_token()),
                put_back: c,
            }
        }
    }
}

#[derive(Debug)]
pub struct SlashState {
    start: SpanIndex,
}

impl LexerStateExecutor for SlashState {
    fn execute(&self, _source: &str, next_char: Option<SourceChar>) -> LexerStateTransition {
        let slash_token = Token {
            kind: TokenKind::Slash,
            span: Span {
                start: self.start,
                length: 1.into(),
            },
        };
        let Some(c) = next_char else {
            return LexerStateTransition::ChangeStateAndEmit {
                new_state: LexerState::Normal(NormalState),
                token_or_error: Ok(slash_token),
            };
        };

        if c.value == '/' {
            LexerStateTransition::ChangeState(LexerState::Comment(CommentState))
        } else {
            LexerStateTransition::ChangeStateAndEmitAndPutBack {
                new_state: LexerState::Normal(NormalState),
                token_or_error: Ok(slash_token),
                put_back: c,
            }
        }
    }
}

#[derive(Debug)]
pub struct CommentState;

impl LexerStateExecutor for CommentState {
    fn execute(&self, _source: &str, next_char: Option<SourceChar>) -> LexerStateTransition {
        match next_char {
            Some(c) if c.value != '\n' => LexerStateTransition::Stay,
            _ => LexerStateTransition::ChangeState(LexerState::Normal(NormalState)),
        }
    }
}

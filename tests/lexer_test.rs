use proptest::prelude::*;

use ferrox::lexer::{
    formatter::{BasicFormatter, ToFormatter, TokenFormatter},
    Lexer, Token, TokenKind,
};

fn check(input: &str, expected: &str, test_name: &str) {
    let mut scanner = Lexer::new_without_file(input);
    let formatter: BasicFormatter = scanner.create_formatter();
    let mut buffer = String::new();
    loop {
        match scanner.next_token() {
            Ok(token) => {
                buffer.push_str(&formatter.format(&token));
                if matches!(token.kind, TokenKind::Eof) {
                    break;
                }
            }
            Err(error) => {
                buffer.push_str(&formatter.format_lexical_error(&error));
            }
        }
        buffer.push('\n');
    }

    assert_eq!(buffer, expected, "Failed the test {test_name}");
}

#[test]
fn smoke_test() {
    check("", "EOF  null", "smoke");
}

#[test]
fn punctuation() {
    check(
        "(){};,.",
        "LEFT_PAREN ( null\n\
         RIGHT_PAREN ) null\n\
         LEFT_BRACE { null\n\
         RIGHT_BRACE } null\n\
         SEMICOLON ; null\n\
         COMMA , null\n\
         DOT . null\n\
         EOF  null",
        "punctuation",
    );
}

#[test]
fn one_and_two_character_operators() {
    check(
        "! != = == < <= > >= - + * /",
        "BANG ! null\n\
         BANG_EQUAL != null\n\
         EQUAL = null\n\
         EQUAL_EQUAL == null\n\
         LESS < null\n\
         LESS_EQUAL <= null\n\
         GREATER > null\n\
         GREATER_EQUAL >= null\n\
         MINUS - null\n\
         PLUS + null\n\
         STAR * null\n\
         SLASH / null\n\
         EOF  null",
        "operators",
    );
}

#[test]
fn operator_at_end_of_input() {
    check("=", "EQUAL = null\nEOF  null", "trailing_equal");
    check("==", "EQUAL_EQUAL == null\nEOF  null", "trailing_equal_equal");
    check("<", "LESS < null\nEOF  null", "trailing_less");
}

#[test]
fn numbers() {
    check("123", "NUMBER 123 123.0\nEOF  null", "integer");
    check("1.5", "NUMBER 1.5 1.5\nEOF  null", "decimal");
    check(
        "1 2.5",
        "NUMBER 1 1.0\nNUMBER 2.5 2.5\nEOF  null",
        "two_numbers",
    );
}

#[test]
fn trailing_period_is_not_part_of_the_number() {
    check(
        "123.",
        "NUMBER 123 123.0\nDOT . null\nEOF  null",
        "trailing_period",
    );
    check(
        "1.+2",
        "NUMBER 1 1.0\nDOT . null\nPLUS + null\nNUMBER 2 2.0\nEOF  null",
        "period_then_operator",
    );
}

#[test]
fn strings() {
    check(
        "\"hello\"",
        "STRING \"hello\" hello\nEOF  null",
        "simple_string",
    );
    check("\"\"", "STRING \"\" \nEOF  null", "empty_string");
}

#[test]
fn unterminated_string() {
    check(
        "\"abc",
        "[line 1] Error: Unterminated string.\nEOF  null",
        "unterminated_string",
    );
}

#[test]
fn string_may_not_contain_a_newline() {
    check(
        "\"abc\ndef\"",
        "[line 1] Error: Unterminated string.\n\
         IDENTIFIER def null\n\
         [line 2] Error: Unterminated string.\n\
         EOF  null",
        "newline_in_string",
    );
}

#[test]
fn comments_are_skipped() {
    check("// just a comment", "EOF  null", "only_comment");
    check(
        "1 // trailing comment\n2",
        "NUMBER 1 1.0\nNUMBER 2 2.0\nEOF  null",
        "comment_between_numbers",
    );
    check(
        "1 / 2 // comment with / inside",
        "NUMBER 1 1.0\nSLASH / null\nNUMBER 2 2.0\nEOF  null",
        "division_not_comment",
    );
}

#[test]
fn keywords_and_identifiers() {
    check(
        "var x = nil;",
        "VAR var null\n\
         IDENTIFIER x null\n\
         EQUAL = null\n\
         NIL nil null\n\
         SEMICOLON ; null\n\
         EOF  null",
        "var_declaration",
    );
    check(
        "variable printer",
        "IDENTIFIER variable null\nIDENTIFIER printer null\nEOF  null",
        "keyword_prefixes",
    );
    check("_under_score1", "IDENTIFIER _under_score1 null\nEOF  null", "underscore");
}

#[test]
fn unexpected_character() {
    check(
        "1 @ 2",
        "NUMBER 1 1.0\n\
         [line 1] Error: Unexpected character: @\n\
         NUMBER 2 2.0\n\
         EOF  null",
        "unexpected_character",
    );
}

// Property-based tests

fn symbol_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("(".to_string()),
        Just(")".to_string()),
        Just("{".to_string()),
        Just("}".to_string()),
        Just(",".to_string()),
        Just(".".to_string()),
        Just("-".to_string()),
        Just("+".to_string()),
        Just(";".to_string()),
        Just("*".to_string()),
        Just("!".to_string()),
        Just("!=".to_string()),
        Just("=".to_string()),
        Just("==".to_string()),
        Just("<".to_string()),
        Just("<=".to_string()),
        Just(">".to_string()),
        Just(">=".to_string()),
        Just("/".to_string()),
    ]
}

fn numeric_literal_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9]+".prop_map(|s| s),          // Integer literals
        "[0-9]+\\.[0-9]+".prop_map(|s| s)  // Decimal literals
    ]
}

fn string_literal_strategy() -> impl Strategy<Value = String> {
    "[^\"\n]*".prop_map(|s: String| format!("\"{}\"", s))
}

fn identifier_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9_]*".prop_map(|s: String| s)
}

fn keyword_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("and".to_string()),
        Just("class".to_string()),
        Just("else".to_string()),
        Just("false".to_string()),
        Just("for".to_string()),
        Just("fun".to_string()),
        Just("if".to_string()),
        Just("nil".to_string()),
        Just("or".to_string()),
        Just("print".to_string()),
        Just("return".to_string()),
        Just("super".to_string()),
        Just("this".to_string()),
        Just("true".to_string()),
        Just("var".to_string()),
        Just("while".to_string()),
    ]
}

fn comment_strategy() -> impl Strategy<Value = String> {
    "[^\n]*".prop_map(|s: String| format!("//{}\n", s))
}

fn token_sequence_with_comments_strategy() -> impl Strategy<Value = String> {
    const MIN_TOKEN_COUNT: usize = 1;
    const MAX_TOKEN_COUNT: usize = 100;
    prop::collection::vec(
        prop_oneof![
            symbol_strategy(),
            numeric_literal_strategy(),
            string_literal_strategy(),
            identifier_strategy(),
            keyword_strategy(),
            comment_strategy(),
        ],
        MIN_TOKEN_COUNT..MAX_TOKEN_COUNT,
    )
    .prop_map(|tokens| tokens.join(" "))
}

fn token_sequence_without_comments_strategy() -> impl Strategy<Value = Vec<String>> {
    const MIN_TOKEN_COUNT: usize = 1;
    const MAX_TOKEN_COUNT: usize = 100;
    prop::collection::vec(
        prop_oneof![
            symbol_strategy(),
            numeric_literal_strategy(),
            string_literal_strategy(),
            identifier_strategy(),
            keyword_strategy(),
        ],
        MIN_TOKEN_COUNT..MAX_TOKEN_COUNT,
    )
}

proptest! {
    #[test]
    fn lexer_handles_valid_tokens_without_comments(input in token_sequence_without_comments_strategy()) {
        // Add 1 to include EOF token
        let expected_num_tokens = input.len() + 1;
        let input = input.join(" ");
        let mut scanner = Lexer::new_without_file(&input);
        let mut num_tokens = 0;
        loop {
            num_tokens += 1;
            match scanner.next_token() {
                Ok(Token {kind: TokenKind::Eof, ..}) => {
                    break;
                },
                token => {
                    prop_assert!(token.is_ok());
                }
            }
        }
        prop_assert_eq!(num_tokens, expected_num_tokens);
    }

    #[test]
    fn lexer_handles_valid_tokens_with_comments(input in token_sequence_with_comments_strategy()) {
        let mut scanner = Lexer::new_without_file(&input);
        loop {
            match scanner.next_token() {
                Ok(Token {kind: TokenKind::Eof, ..}) => {
                    break;
                },
                token => {
                    prop_assert!(token.is_ok());
                }
            }
        }
    }

    #[test]
    fn lexeme_spans_reproduce_the_source(input in token_sequence_without_comments_strategy()) {
        let input = input.join(" ");
        let mut scanner = Lexer::new_without_file(&input);
        loop {
            match scanner.next_token() {
                Ok(Token { kind: TokenKind::Eof, .. }) => break,
                Ok(token) => {
                    let lexeme = scanner.get_lexeme(&token.span);
                    prop_assert!(lexeme.is_some());
                }
                Err(error) => {
                    prop_assert!(false, "Unexpected lexical error: {error:?}");
                }
            }
        }
    }
}

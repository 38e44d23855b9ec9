//! Text to parser tree.
//!
//! ```text
//! number  : /-?[0-9.]+/
//! symbol  : /[a-zA-Z0-9_+\-*\/\\=<>!&%^]+/
//! sexpr   : '(' <expr>* ')' | '{' <expr>* '}'
//! expr    : <number> | <symbol> | <sexpr> | '\'' <expr>
//! program : /^/ <expr>* /$/
//! ```
//!
//! Numbers are tried before symbols, so `-5` is a number and `-` a symbol.
//! `'x` is shorthand for `(quote x)`. Whitespace separates tokens and `;`
//! starts a comment running to the end of the line.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0, one_of},
    combinator::{cut, opt, recognize},
    error::ErrorKind,
    multi::many0,
    sequence::{pair, preceded},
};

use crate::Error;
use crate::MAX_PARSE_DEPTH;
use crate::evaluator::QUOTE;
use crate::reader::Node;

const NUMBER_TAG: &str = "expr|number|regex";
const SYMBOL_TAG: &str = "expr|symbol|regex";
const SEXPR_TAG: &str = "expr|sexpr|>";
const CHAR_TAG: &str = "char";

/// Characters allowed in a symbol besides ASCII letters and digits
pub const SYMBOL_SPECIAL_CHARS: &str = "_+-*/\\=<>!&%^";

/// Grammar options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParseConfig {
    /// Treat `;` to end of line as a comment
    pub handle_comments: bool,
}

impl Default for ParseConfig {
    fn default() -> Self {
        ParseConfig {
            handle_comments: true,
        }
    }
}

fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || SYMBOL_SPECIAL_CHARS.contains(c)
}

/// Convert nom parsing errors to user-friendly messages
fn parse_error_to_message(input: &str, error: nom::Err<nom::error::Error<&str>>) -> String {
    match error {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let position = input.len().saturating_sub(e.input.len());
            match e.code {
                ErrorKind::Char if e.input.is_empty() => {
                    format!("Unexpected end of input, unclosed expression at position {position}")
                }
                ErrorKind::Char => format!("Expected closing bracket at position {position}"),
                ErrorKind::TooLarge => {
                    format!("Expression too deeply nested (max depth: {MAX_PARSE_DEPTH})")
                }
                _ => {
                    let remaining_chars: String = e.input.chars().take(10).collect();
                    format!("Invalid syntax near '{remaining_chars}'")
                }
            }
        }
        nom::Err::Incomplete(_) => "Incomplete input".into(),
    }
}

/// Skip whitespace and, when enabled, comments
fn parse_ignored(input: &str, config: ParseConfig) -> IResult<&str, ()> {
    let (mut input, _) = multispace0.parse(input)?;
    while config.handle_comments && input.starts_with(';') {
        let (rest, _) = preceded(char(';'), take_while(|c: char| c != '\n')).parse(input)?;
        (input, _) = multispace0.parse(rest)?;
    }
    Ok((input, ()))
}

/// Parse a number literal; the reader decides between integer and float
fn parse_number(input: &str) -> IResult<&str, Node> {
    let (input, text) = recognize(pair(
        opt(char('-')),
        take_while1(|c: char| c.is_ascii_digit() || c == '.'),
    ))
    .parse(input)?;
    Ok((input, Node::leaf(NUMBER_TAG, text)))
}

/// Parse a symbol (identifier)
fn parse_symbol(input: &str) -> IResult<&str, Node> {
    let (input, name) = take_while1(is_symbol_char).parse(input)?;
    Ok((input, Node::leaf(SYMBOL_TAG, name)))
}

/// Parse a bracketed S-expression, keeping the brackets as `char` nodes
fn parse_sexpr(input: &str, config: ParseConfig, depth: usize) -> IResult<&str, Node> {
    let (input, open) = one_of("({").parse(input)?;
    let close = if open == '(' { ')' } else { '}' };

    let (input, elements) = many0(|input| parse_expr(input, config, depth + 1)).parse(input)?;
    let (input, _) = parse_ignored(input, config)?;
    let (input, _) = cut(char(close)).parse(input)?;

    let mut children = Vec::with_capacity(elements.len() + 2);
    children.push(Node::leaf(CHAR_TAG, open.to_string()));
    children.extend(elements);
    children.push(Node::leaf(CHAR_TAG, close.to_string()));
    Ok((input, Node::branch(SEXPR_TAG, children)))
}

/// Parse quoted expression ('expr -> (quote expr))
fn parse_quote(input: &str, config: ParseConfig, depth: usize) -> IResult<&str, Node> {
    let (input, _) = char('\'').parse(input)?;
    let (input, expr) = cut(|input| parse_expr(input, config, depth + 1)).parse(input)?;
    Ok((
        input,
        Node::branch(SEXPR_TAG, vec![Node::leaf(SYMBOL_TAG, QUOTE), expr]),
    ))
}

/// Parse one expression, skipping whitespace and comments before it
fn parse_expr(input: &str, config: ParseConfig, depth: usize) -> IResult<&str, Node> {
    if depth >= MAX_PARSE_DEPTH {
        return Err(nom::Err::Failure(nom::error::Error::new(
            input,
            ErrorKind::TooLarge,
        )));
    }
    preceded(
        |input| parse_ignored(input, config),
        alt((
            |input| parse_quote(input, config, depth),
            |input| parse_sexpr(input, config, depth),
            parse_number,
            parse_symbol,
        )),
    )
    .parse(input)
}

/// Parse a whole program with the default configuration.
pub fn parse_program(input: &str) -> Result<Node, Error> {
    parse_program_with_config(input, ParseConfig::default())
}

/// Parse a whole program into a root node holding its top-level expressions.
pub fn parse_program_with_config(input: &str, config: ParseConfig) -> Result<Node, Error> {
    let parsed = many0(|input| parse_expr(input, config, 0))
        .parse(input)
        .and_then(|(rest, exprs)| {
            let (rest, _) = parse_ignored(rest, config)?;
            Ok((rest, exprs))
        });

    match parsed {
        Ok(("", exprs)) => Ok(Node::root(exprs)),
        Ok((remaining, _)) => {
            let position = input.len() - remaining.len();
            let remaining_chars: String = remaining.chars().take(10).collect();
            Err(Error::Parse(format!(
                "Unexpected input at position {position}: '{remaining_chars}'"
            )))
        }
        Err(e) => Err(Error::Parse(parse_error_to_message(input, e))),
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ast::{Value, nil, sym, val};
    use crate::reader::read;
    use pretty_assertions::assert_eq;

    /// Test result variants for comprehensive parsing tests
    #[derive(Debug)]
    enum ParseTestResult {
        Success(Value),              // Parses, and reads to this value
        SpecificError(&'static str), // Parsing should fail with error containing this string
        Failure,                     // Parsing should fail (any error)
    }
    use ParseTestResult::*;

    fn success<T: Into<Value>>(value: T) -> ParseTestResult {
        Success(value.into())
    }

    /// Parse then read, checking that the printed result parses back to itself
    fn run_parse_tests(test_cases: Vec<(&str, ParseTestResult)>) {
        for (i, (input, expected)) in test_cases.into_iter().enumerate() {
            let test_id = format!("Parse test #{} ({input:?})", i + 1);

            match (parse_program(input), expected) {
                (Ok(tree), Success(expected)) => {
                    let actual = read(&tree);
                    assert_eq!(actual, expected, "{test_id}: value mismatch");

                    // Round trip: display -> parse -> read gives the same value
                    let displayed = format!("{actual}");
                    let reparsed = parse_program(&displayed).unwrap_or_else(|e| {
                        panic!("{test_id}: round-trip parse failed for '{displayed}': {e}")
                    });
                    let reread = read(&reparsed);
                    assert_eq!(
                        format!("{reread}"),
                        format!("({displayed})"),
                        "{test_id}: round-trip display mismatch"
                    );
                }
                (Err(_), Failure) => {}
                (Err(err), SpecificError(text)) => {
                    let message = format!("{err}");
                    assert!(
                        message.contains(text),
                        "{test_id}: error '{message}' should contain '{text}'"
                    );
                }
                (Ok(tree), Failure | SpecificError(_)) => {
                    panic!("{test_id}: expected error, got {:?}", read(&tree));
                }
                (Err(err), Success(_)) => {
                    panic!("{test_id}: expected success, got error {err}");
                }
            }
        }
    }

    #[test]
    fn test_parser_comprehensive() {
        let deep_ok = format!("{}1{}", "(".repeat(60), ")".repeat(60));
        let deep_expected = (0..60).fold(val(1), |inner, _| val(vec![inner]));

        let too_deep = format!("{}1{}", "(".repeat(70), ")".repeat(70));

        let test_cases = vec![
            // ===== NUMBERS =====
            ("42", success([42])),
            ("-5", success([-5])),
            ("0", success([0])),
            ("2.5", success([2.5])),
            ("-0.125", success([-0.125])),
            // ===== SYMBOLS =====
            ("foo", success(vec![sym("foo")])),
            ("-", success(vec![sym("-")])),
            ("-abc", success(vec![sym("-abc")])),
            (">=", success(vec![sym(">=")])),
            ("&", success(vec![sym("&")])),
            ("a_b+c*d/e\\f=g<h>i!j&k%l^m", success(vec![sym("a_b+c*d/e\\f=g<h>i!j&k%l^m")])),
            ("var123", success(vec![sym("var123")])),
            // ===== S-EXPRESSIONS =====
            ("()", success(vec![nil()])),
            ("{}", success(vec![nil()])),
            ("(+ 1 2)", success(vec![val(vec![sym("+"), val(1), val(2)])])),
            ("{+ 1 2}", success(vec![val(vec![sym("+"), val(1), val(2)])])),
            ("+ 1 2", success(vec![sym("+"), val(1), val(2)])),
            (
                "(list (1 2) {3})",
                success(vec![val(vec![sym("list"), val([1, 2]), val([3])])]),
            ),
            ("  ( car   '(1) )  ", success(vec![val(vec![
                sym("car"),
                val(vec![sym("quote"), val([1])]),
            ])])),
            ("(+ 1 2)(* 3 4)", success(vec![
                val(vec![sym("+"), val(1), val(2)]),
                val(vec![sym("*"), val(3), val(4)]),
            ])),
            // ===== QUOTE SHORTHAND =====
            ("'x", success(vec![val(vec![sym("quote"), sym("x")])])),
            ("'()", success(vec![val(vec![sym("quote"), nil()])])),
            (
                "''x",
                success(vec![val(vec![sym("quote"), val(vec![sym("quote"), sym("x")])])]),
            ),
            // ===== COMMENTS AND WHITESPACE =====
            ("", success(nil())),
            ("   \n\t ", success(nil())),
            ("; nothing here", success(nil())),
            ("(+ 1 ; one\n 2) ; done", success(vec![val(vec![sym("+"), val(1), val(2)])])),
            // ===== NESTING =====
            (deep_ok.as_str(), Success(val(vec![deep_expected]))),
            (too_deep.as_str(), SpecificError("too deeply nested")),
            // ===== ERRORS =====
            ("(+ 1 2", SpecificError("unclosed expression")),
            ("(+ 1 2}", SpecificError("Expected closing bracket")),
            (")", SpecificError("Unexpected input at position 0")),
            ("(1))", SpecificError("Unexpected input at position 3")),
            ("'", Failure),
            ("\"string\"", Failure),
            ("#t", Failure),
            ("a@b", SpecificError("Unexpected input at position 1")),
        ];

        run_parse_tests(test_cases);
    }

    #[test]
    fn test_tree_shape() {
        let tree = parse_program("(+ 1 x)").unwrap();
        assert_eq!(tree.tag, ">");
        assert_eq!(tree.children.len(), 3);
        assert_eq!(tree.children[0].tag, "regex");
        assert_eq!(tree.children[2].tag, "regex");

        let sexpr = &tree.children[1];
        assert_eq!(sexpr.tag, SEXPR_TAG);
        let contents: Vec<_> = sexpr
            .children
            .iter()
            .map(|child| (child.tag.as_str(), child.contents.as_str()))
            .collect();
        assert_eq!(
            contents,
            vec![
                (CHAR_TAG, "("),
                (SYMBOL_TAG, "+"),
                (NUMBER_TAG, "1"),
                (SYMBOL_TAG, "x"),
                (CHAR_TAG, ")"),
            ]
        );
    }

    #[test]
    fn test_malformed_numbers_reach_the_reader() {
        // The grammar accepts any run of digits and dots; the reader judges it
        let tree = parse_program("1.2.3").unwrap();
        assert!(matches!(read(&tree), Value::List(items) if matches!(
            items.as_slice(),
            [Value::Err(Error::InvalidNumber(_))]
        )));
    }

    #[test]
    fn test_comments_can_be_disabled() {
        let config = ParseConfig {
            handle_comments: false,
        };
        assert!(parse_program_with_config("; comment", config).is_err());
        assert!(parse_program_with_config("(+ 1 2)", config).is_ok());
        assert!(parse_program_with_config("; comment", ParseConfig::default()).is_ok());
    }
}

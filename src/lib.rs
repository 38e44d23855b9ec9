//! MyLisp - a small tree-walking Lisp evaluator
//!
//! This crate implements the interpreter core of a toy Lisp: dynamically
//! tagged values, lexically scoped environments with a parent chain,
//! first-class closures with currying and variadic formals, and a fixed
//! table of builtin operations.
//!
//! ```text
//! (+ 1 2.5)                                   ; 3.500000
//! (set 'add (lambda '(x y) '(+ x y)))         ; ()
//! ((add 3) 4)                                 ; 7
//! ((lambda '(x & rest) '(list x rest)) 1 2 3) ; (1 (2 3))
//! (if 0 (exit) 'safe)                         ; safe
//! ```
//!
//! ## Errors are values
//!
//! Evaluation never panics on bad input. Unbound symbols, arity and type
//! violations, division by zero and the like are reported as
//! [`ast::Value::Err`], which propagates through evaluation like any other
//! value: the first error found while evaluating a list, left to right,
//! becomes the result of that list.
//!
//! ## Modules
//!
//! - `ast`: the runtime [`ast::Value`] and its list operations
//! - `reader`: converts the parser's tagged tree into values
//! - `evaluator`: environments, evaluation and the closure call protocol
//! - `builtinops`: the builtin function table
//! - `grammar`: text to tagged tree (feature `parser`)

use std::fmt;

use thiserror::Error;

/// Maximum nesting accepted by the grammar before it gives up on the input
pub const MAX_PARSE_DEPTH: usize = 64;

/// Every failure the interpreter can report.
///
/// Errors travel through evaluation as [`ast::Value::Err`]; the `Display`
/// text is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("Unbound symbol: '{0}'")]
    UnboundSymbol(String),

    #[error("S-Expression does not start with a function, got {0}")]
    NotAFunction(&'static str),

    #[error("Function '{func}' passed incorrect number of arguments. Got {got}. Expected {expected}.")]
    WrongArgCount {
        func: &'static str,
        got: usize,
        expected: builtinops::Arity,
    },

    #[error("Function '{func}' passed incorrect type. Got {got}. Expected {expected}.")]
    WrongArgType {
        func: &'static str,
        got: &'static str,
        expected: &'static str,
    },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Function format invalid. Symbol '&' not followed by a single symbol.")]
    MalformedVarargs,

    #[error("Function passed too many arguments. Got {got}. Expected {expected}.")]
    TooManyArguments { got: usize, expected: usize },

    #[error("Unrecognized operator: '{0}'")]
    UnknownOperator(String),

    #[error("Index {index} out of range for list of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Function '{0}' passed ()")]
    EmptyList(&'static str),

    #[error("Number out of range: {0}")]
    NumberOutOfRange(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Integer overflow in {0}")]
    IntegerOverflow(&'static str),

    #[error("AST tag '{0}' did not match any of number, symbol, root, sexpr")]
    UnknownNode(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl Error {
    /// Shorthand for an arity violation of a builtin
    pub(crate) fn arg_count(func: &'static str, got: usize, expected: builtinops::Arity) -> Self {
        Error::WrongArgCount {
            func,
            got,
            expected,
        }
    }

    /// Shorthand for a type violation of a builtin
    pub(crate) fn arg_type(func: &'static str, got: &ast::Value, expected: &'static str) -> Self {
        Error::WrongArgType {
            func,
            got: got.type_name(),
            expected,
        }
    }
}

impl fmt::Display for builtinops::Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            builtinops::Arity::Exact(n) => write!(f, "{n}"),
            builtinops::Arity::AtLeast(n) => write!(f, "at least {n}"),
            builtinops::Arity::Range(min, max) => write!(f, "{min} to {max}"),
            builtinops::Arity::Any => write!(f, "any number"),
        }
    }
}

pub mod ast;
pub mod builtinops;
pub mod evaluator;
pub mod reader;

#[cfg(feature = "parser")]
pub mod grammar;

/// Parse, read and evaluate one line of source text.
///
/// A grammar failure is returned as [`ast::Value::Err`] just like an
/// evaluation failure, so the caller only ever has a value to print.
#[cfg(feature = "parser")]
pub fn interpret(source: &str, env: &mut evaluator::Environment) -> ast::Value {
    match grammar::parse_program(source) {
        Ok(tree) => evaluator::eval(reader::read(&tree), env),
        Err(err) => ast::Value::Err(err),
    }
}
